use crate::message::Message;
use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
pub enum SubscriptionError {
    /// The driver hit a one-off hiccup it expects to recover from; the
    /// Consumer logs it, backs off briefly, and keeps calling `receive`.
    #[error("transient driver error: {0}")]
    Transient(#[source] anyhow::Error),
    /// The driver has declared the subscription unrecoverable (connection
    /// permanently lost, credentials revoked, ...) and will not serve
    /// another message. The Consumer stops calling `receive` and exits.
    #[error("fatal driver error: {0}")]
    Fatal(#[source] anyhow::Error),
}

/// Outcome of one `Subscription::receive` call, distinguishing "the driver
/// has nothing right now" from "a message arrived" without overloading
/// `Option` at every call site.
#[derive(Debug)]
pub enum Received {
    Message(Message),
    /// Driver signals an empty queue; caller should back off briefly.
    Empty,
    /// The passed-in cancellation token fired before a message arrived.
    Cancelled,
}

/// Thin interface over heterogeneous queue drivers. The core depends only
/// on this trait; concrete drivers (SQS, Pub/Sub, RabbitMQ, NATS, Kafka)
/// are out of scope except for the in-process `Memory` driver this crate
/// ships for tests and the `Memory` queue kind.
#[async_trait]
pub trait Subscription: Send + Sync {
    /// Blocks until a message, a driver error, or `cancel` fires.
    async fn receive(&self, cancel: &CancellationToken) -> Result<Received, SubscriptionError>;

    async fn close(&self);
}
