//! Message types for the Broker
//!
//! Inbound messages arrive untyped (`serde_json::Value`) and pass a single
//! validation gate: [`Envelope::parse`] checks the shape contract, then
//! [`Request::from_envelope`] dispatches on the method name. A field that is
//! absent and a field that is explicitly `null` are rejected alike.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

/// Why an inbound message was rejected at the validation gate
#[derive(Debug, Error, PartialEq)]
pub enum MessageError {
    #[error("message must be an object")]
    NotAnObject,

    #[error("message must have '{0}'")]
    MissingField(&'static str),

    #[error("params.name must be a string")]
    InvalidName,

    #[error("unrecognized method {0}")]
    UnknownMethod(String),
}

/// A structurally valid inbound message, prior to method dispatch.
///
/// `method` and `id` stay untyped here: the correlation id is opaque by
/// contract, and a non-string method falls through to the unknown-method
/// path rather than being treated as malformed.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub method: Value,
    pub id: Value,
    pub params: Value,
}

impl Envelope {
    /// Validate the shape contract for an inbound payload.
    ///
    /// The payload must be an object carrying `method`, `id`, and `params`,
    /// each present and non-null. Nothing is applied to the store before
    /// this check passes.
    pub fn parse(payload: &Value) -> Result<Self, MessageError> {
        let obj = payload.as_object().ok_or(MessageError::NotAnObject)?;

        let field = |name: &'static str| match obj.get(name) {
            None | Some(Value::Null) => Err(MessageError::MissingField(name)),
            Some(value) => Ok(value.clone()),
        };

        Ok(Self {
            method: field("method")?,
            id: field("id")?,
            params: field("params")?,
        })
    }
}

/// A recognized store operation parsed from an envelope
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Insert or replace an entry (no reply)
    Set { name: String, value: Value },
    /// Read an entry (reply to sender)
    Get { name: String },
    /// Existence check (reply to sender)
    Has { name: String },
    /// Remove an entry (no reply)
    Delete { name: String },
}

impl Request {
    /// Dispatch an envelope on its method name
    pub fn from_envelope(envelope: &Envelope) -> Result<Self, MessageError> {
        let method = envelope
            .method
            .as_str()
            .ok_or_else(|| MessageError::UnknownMethod(envelope.method.to_string()))?;

        let name = || {
            envelope
                .params
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or(MessageError::InvalidName)
        };

        match method {
            "set" => Ok(Request::Set {
                name: name()?,
                // A request without params.value stores an explicit null
                value: envelope.params.get("value").cloned().unwrap_or(Value::Null),
            }),
            "get" => Ok(Request::Get { name: name()? }),
            "has" => Ok(Request::Has { name: name()? }),
            "delete" => Ok(Request::Delete { name: name()? }),
            other => Err(MessageError::UnknownMethod(other.to_string())),
        }
    }
}

/// Reply sent back to the requesting client for `get` and `has`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    /// Correlation token echoed verbatim from the request
    pub id: Value,
    pub result: ReplyResult,
}

/// Result body of a reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyResult {
    /// Key the request asked about
    pub name: String,
    /// Stored value for `get` (`null` when absent), boolean for `has`
    pub value: Value,
}

/// Internal requests to the Broker task
#[derive(Debug)]
pub enum BrokerRequest {
    /// Register a client context's reply channel
    Attach {
        client_id: String,
        tx: mpsc::Sender<Reply>,
    },

    /// Remove a client context's reply channel
    Detach { client_id: String },

    /// An untyped message from a client context
    Deliver { client_id: String, payload: Value },

    /// Get current metrics
    GetMetrics {
        reply_tx: oneshot::Sender<BrokerMetrics>,
    },

    /// Shutdown the broker
    Shutdown,
}

/// Broker metrics for observability
#[derive(Debug, Clone, Default)]
pub struct BrokerMetrics {
    pub attached_clients: usize,
    pub messages_received: u64,
    pub replies_sent: u64,
    pub invalid_messages: u64,
    pub unknown_methods: u64,
    pub store_entries: usize,
}
