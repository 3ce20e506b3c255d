//! ClientHandle - client-context interface to the Broker

use std::collections::VecDeque;
use std::sync::Arc;

use eyre::{Result, eyre};
use serde_json::{Value, json};
use tokio::sync::{Mutex, mpsc, oneshot};
use tracing::debug;
use uuid::Uuid;

use super::messages::{BrokerMetrics, BrokerRequest, Reply};

/// Handle for a client context (tab/window) to talk to the Broker
///
/// This handle is cloneable. Replies are addressed to the client, not to a
/// particular clone, so clones share the reply receiver behind a mutex.
#[derive(Clone)]
pub struct ClientHandle {
    /// Sender to the Broker task
    tx: mpsc::Sender<BrokerRequest>,

    /// Receiver for replies from the Broker, shared across clones
    rx: Arc<Mutex<mpsc::Receiver<Reply>>>,

    /// Replies taken off the channel while a typed request was waiting for
    /// its own correlation id. Drained by `recv`/`try_recv` before the
    /// channel, so no delivered reply is ever lost.
    pending: Arc<Mutex<VecDeque<Reply>>>,

    /// This handle's client ID
    client_id: String,
}

impl ClientHandle {
    /// Create a new handle for an attached client
    pub(crate) fn new(tx: mpsc::Sender<BrokerRequest>, rx: mpsc::Receiver<Reply>, client_id: String) -> Self {
        debug!(%client_id, "ClientHandle::new: called");
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
            pending: Arc::new(Mutex::new(VecDeque::new())),
            client_id,
        }
    }

    /// Get this handle's client ID
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Post a raw, untyped message to the Broker.
    ///
    /// This is the wire surface: no shape checking happens on this side, the
    /// Broker's validation gate decides what to do with the payload.
    pub async fn post(&self, payload: Value) -> Result<()> {
        debug!(client_id = %self.client_id, "ClientHandle::post: called");
        self.tx
            .send(BrokerRequest::Deliver {
                client_id: self.client_id.clone(),
                payload,
            })
            .await
            .map_err(|_| eyre!("Broker channel closed"))?;

        debug!("ClientHandle::post: sent");
        Ok(())
    }

    /// Store a value under `name`. Fire-and-forget; no reply is sent.
    pub async fn set(&self, name: &str, value: Value) -> Result<()> {
        debug!(client_id = %self.client_id, %name, "ClientHandle::set: called");
        self.post(json!({
            "method": "set",
            "id": Uuid::now_v7().to_string(),
            "params": { "name": name, "value": value },
        }))
        .await
    }

    /// Remove the entry for `name`. Fire-and-forget; no-op when absent.
    pub async fn delete(&self, name: &str) -> Result<()> {
        debug!(client_id = %self.client_id, %name, "ClientHandle::delete: called");
        self.post(json!({
            "method": "delete",
            "id": Uuid::now_v7().to_string(),
            "params": { "name": name },
        }))
        .await
    }

    /// Fetch the value for `name`, awaiting the Broker's reply.
    ///
    /// Returns `None` when no entry exists (the wire value is `null`).
    pub async fn get(&self, name: &str) -> Result<Option<Value>> {
        debug!(client_id = %self.client_id, %name, "ClientHandle::get: called");
        match self.request("get", name).await? {
            Value::Null => Ok(None),
            value => Ok(Some(value)),
        }
    }

    /// Check whether an entry exists for `name`, awaiting the Broker's reply.
    pub async fn has(&self, name: &str) -> Result<bool> {
        debug!(client_id = %self.client_id, %name, "ClientHandle::has: called");
        match self.request("has", name).await? {
            Value::Bool(exists) => Ok(exists),
            other => Err(eyre!("has reply was not a boolean: {other}")),
        }
    }

    /// Send a read request and wait for the reply carrying its correlation id
    async fn request(&self, method: &str, name: &str) -> Result<Value> {
        let id = Uuid::now_v7().to_string();
        self.post(json!({
            "method": method,
            "id": id,
            "params": { "name": name },
        }))
        .await?;

        debug!(client_id = %self.client_id, %id, "ClientHandle::request: waiting for reply");
        let mut rx = self.rx.lock().await;
        while let Some(reply) = rx.recv().await {
            if reply.id.as_str() == Some(id.as_str()) {
                return Ok(reply.result.value);
            }
            // Reply for an earlier raw post or a concurrent clone; keep it
            // for recv/try_recv instead of dropping it on the floor
            debug!(client_id = %self.client_id, "ClientHandle::request: buffering unrelated reply");
            self.pending.lock().await.push_back(reply);
        }

        Err(eyre!("Broker shutdown before reply"))
    }

    /// Receive the next reply addressed to this client
    ///
    /// Replies set aside by an intervening typed `get`/`has` are returned
    /// first, in delivery order.
    pub async fn recv(&self) -> Option<Reply> {
        debug!(client_id = %self.client_id, "ClientHandle::recv: called");
        {
            let mut pending = self.pending.lock().await;
            if let Some(reply) = pending.pop_front() {
                debug!("ClientHandle::recv: returning buffered reply");
                return Some(reply);
            }
        }
        let mut rx = self.rx.lock().await;
        rx.recv().await
    }

    /// Try to receive a reply without blocking
    pub fn try_recv(&self) -> Option<Reply> {
        debug!(client_id = %self.client_id, "ClientHandle::try_recv: called");
        if let Ok(mut pending) = self.pending.try_lock() {
            if let Some(reply) = pending.pop_front() {
                debug!("ClientHandle::try_recv: returning buffered reply");
                return Some(reply);
            }
        }
        let mut rx = self.rx.try_lock().ok()?;
        rx.try_recv().ok()
    }

    /// Get current broker metrics
    pub async fn metrics(&self) -> Result<BrokerMetrics> {
        debug!(client_id = %self.client_id, "ClientHandle::metrics: called");
        let (reply_tx, reply_rx) = oneshot::channel();

        self.tx
            .send(BrokerRequest::GetMetrics { reply_tx })
            .await
            .map_err(|_| eyre!("Broker channel closed"))?;

        reply_rx.await.map_err(|_| eyre!("Broker shutdown before reply"))
    }
}
