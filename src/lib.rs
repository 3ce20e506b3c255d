//! TabStore - shared key/value state for multi-client sessions
//!
//! A long-lived broker task owns an in-memory key/value store on behalf of
//! many client contexts (tabs, windows, panes). Clients talk to it over an
//! untyped message channel: `set` and `delete` are fire-and-forget, while
//! `get` and `has` earn a reply addressed only to the requesting client.
//!
//! # Core guarantees
//!
//! - **Single Writer**: the broker task is the sole owner of the store, so
//!   requests apply strictly in arrival order with no locking
//! - **Validation Gate**: messages are parsed once at the boundary; malformed
//!   or unrecognized messages are logged and dropped, never answered and
//!   never fatal to the broker
//! - **Targeted Replies**: read replies echo the request's correlation id
//!   and go only to the sender's channel
//!
//! # Modules
//!
//! - [`store`] - the in-memory map owned by the broker
//! - [`broker`] - the broker task, wire types, config, and client handles

pub mod broker;
pub mod store;

// Re-export commonly used types
pub use broker::{
    Broker, BrokerConfig, BrokerMetrics, BrokerRequest, ClientHandle, Envelope, MessageError, Reply, ReplyResult,
    Request,
};
pub use store::DataStore;
