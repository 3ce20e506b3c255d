//! Main Broker task implementation

use std::collections::HashMap;

use eyre::Result;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::store::DataStore;

use super::config::BrokerConfig;
use super::handle::ClientHandle;
use super::messages::{BrokerMetrics, BrokerRequest, Envelope, MessageError, Reply, ReplyResult, Request};

/// The Broker owns the store and mediates all client access to it.
///
/// One task, one channel: requests are processed strictly in arrival order,
/// each to completion before the next, so the store needs no locking and
/// per-client reply ordering matches request ordering.
pub struct Broker {
    config: BrokerConfig,
    tx: mpsc::Sender<BrokerRequest>,
    rx: mpsc::Receiver<BrokerRequest>,
    /// Authoritative in-memory state, owned exclusively by the run loop
    store: DataStore,
}

impl Broker {
    /// Create a new Broker with the given configuration
    pub fn new(config: BrokerConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.channel_buffer);
        Self {
            config,
            tx,
            rx,
            store: DataStore::new(),
        }
    }

    /// Get a sender for creating handles
    pub fn sender(&self) -> mpsc::Sender<BrokerRequest> {
        self.tx.clone()
    }

    /// Attach a client context and return its handle.
    ///
    /// This registers a reply channel for the client with the Broker; replies
    /// to the client's read requests are delivered only on that channel.
    pub async fn attach(&self, client_id: &str) -> Result<ClientHandle> {
        let (reply_tx, reply_rx) = mpsc::channel(self.config.client_channel_buffer);

        self.tx
            .send(BrokerRequest::Attach {
                client_id: client_id.to_string(),
                tx: reply_tx,
            })
            .await
            .map_err(|_| eyre::eyre!("Broker channel closed"))?;

        Ok(ClientHandle::new(self.tx.clone(), reply_rx, client_id.to_string()))
    }

    /// Detach a client context
    pub async fn detach(&self, client_id: &str) -> Result<()> {
        self.tx
            .send(BrokerRequest::Detach {
                client_id: client_id.to_string(),
            })
            .await
            .map_err(|_| eyre::eyre!("Broker channel closed"))?;

        Ok(())
    }

    /// Request shutdown of the Broker
    pub async fn shutdown(&self) -> Result<()> {
        self.tx
            .send(BrokerRequest::Shutdown)
            .await
            .map_err(|_| eyre::eyre!("Broker channel closed"))?;

        Ok(())
    }

    /// Run the Broker task
    ///
    /// This consumes the Broker and runs until shutdown is requested. A bad
    /// message is logged and dropped; it never terminates the loop or earns
    /// a reply, so the broker stays available for every later message.
    pub async fn run(mut self) {
        let mut registry: HashMap<String, mpsc::Sender<Reply>> = HashMap::new();
        let mut metrics = BrokerMetrics::default();

        info!("Broker started");

        while let Some(req) = self.rx.recv().await {
            match req {
                BrokerRequest::Attach { client_id, tx } => {
                    debug!(client_id = %client_id, "Attaching client");
                    registry.insert(client_id, tx);
                    metrics.attached_clients = registry.len();
                }

                BrokerRequest::Detach { client_id } => {
                    debug!(client_id = %client_id, "Detaching client");
                    registry.remove(&client_id);
                    metrics.attached_clients = registry.len();
                }

                BrokerRequest::Deliver { client_id, payload } => {
                    metrics.messages_received += 1;

                    match dispatch(&mut self.store, &payload) {
                        Ok(Some(reply)) => {
                            // Targeted reply: only the sender's channel, never broadcast
                            if let Some(tx) = registry.get(&client_id) {
                                if tx.send(reply).await.is_ok() {
                                    metrics.replies_sent += 1;
                                } else {
                                    debug!(client_id = %client_id, "Reply channel closed, dropping reply");
                                }
                            } else {
                                debug!(client_id = %client_id, "Dropping reply for unattached client");
                            }
                        }

                        Ok(None) => {}

                        Err(MessageError::UnknownMethod(method)) => {
                            warn!(client_id = %client_id, %method, "Unrecognized operation");
                            metrics.unknown_methods += 1;
                        }

                        Err(e) => {
                            warn!(client_id = %client_id, error = %e, "Rejected malformed message");
                            metrics.invalid_messages += 1;
                        }
                    }
                }

                BrokerRequest::GetMetrics { reply_tx } => {
                    metrics.store_entries = self.store.len();
                    let _ = reply_tx.send(metrics.clone());
                }

                BrokerRequest::Shutdown => {
                    info!("Broker shutting down");
                    break;
                }
            }
        }

        info!("Broker stopped");
    }
}

/// Validate one inbound payload and apply it to the store.
///
/// Returns the reply for read operations, `None` for mutations. Errors are
/// the caller's to log; no store mutation happens before validation passes.
fn dispatch(store: &mut DataStore, payload: &Value) -> Result<Option<Reply>, MessageError> {
    let envelope = Envelope::parse(payload)?;

    match Request::from_envelope(&envelope)? {
        Request::Set { name, value } => {
            debug!(name = %name, "set");
            store.set(name, value);
            Ok(None)
        }

        Request::Get { name } => {
            debug!(name = %name, "get");
            let value = store.get(&name).cloned().unwrap_or(Value::Null);
            Ok(Some(Reply {
                id: envelope.id,
                result: ReplyResult { name, value },
            }))
        }

        Request::Has { name } => {
            debug!(name = %name, "has");
            let value = Value::Bool(store.has(&name));
            Ok(Some(Reply {
                id: envelope.id,
                result: ReplyResult { name, value },
            }))
        }

        Request::Delete { name } => {
            debug!(name = %name, "delete");
            store.delete(&name);
            Ok(None)
        }
    }
}
