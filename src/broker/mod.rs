//! Broker for client access to the shared store
//!
//! The Broker mediates all store access via four operations:
//! - **set:** insert or replace a value (no reply)
//! - **get:** read a value (targeted reply)
//! - **has:** existence check (targeted reply)
//! - **delete:** remove a value (no reply)

mod config;
mod core;
mod handle;
mod messages;

pub use config::BrokerConfig;
pub use core::Broker;
pub use handle::ClientHandle;
pub use messages::{BrokerMetrics, BrokerRequest, Envelope, MessageError, Reply, ReplyResult, Request};
