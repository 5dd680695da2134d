use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Driver-side behavior behind `Message::ack`/`nack`. Each concrete queue
/// driver (SQS, Kafka, ...) implements this; the core never depends on a
/// specific driver.
#[async_trait]
pub trait Acker: Send + Sync {
    async fn ack(&self);
    async fn nack(&self);
    /// Whether this delivery supports an explicit Nack. Drivers without
    /// negative-acknowledgement (the message simply times out and is
    /// redelivered) report `false`; the Consumer must not call `nack` on
    /// them and must not emit a second Ack either.
    fn nackable(&self) -> bool;
}

/// A single delivery from a `Subscription`.
pub struct Message {
    /// Stable per-delivery identifier; the key into the `RetryLedger`.
    pub loggable_id: String,
    /// Possibly base64-wrapped raw bytes.
    pub body: Vec<u8>,
    pub metadata: HashMap<String, String>,
    acker: Arc<dyn Acker>,
}

impl Message {
    pub fn new(
        loggable_id: impl Into<String>,
        body: Vec<u8>,
        metadata: HashMap<String, String>,
        acker: Arc<dyn Acker>,
    ) -> Self {
        Self {
            loggable_id: loggable_id.into(),
            body,
            metadata,
            acker,
        }
    }

    pub async fn ack(&self) {
        self.acker.ack().await;
    }

    pub async fn nack(&self) {
        self.acker.nack().await;
    }

    pub fn nackable(&self) -> bool {
        self.acker.nackable()
    }
}

impl std::fmt::Debug for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Message")
            .field("loggable_id", &self.loggable_id)
            .field("body_len", &self.body.len())
            .field("metadata", &self.metadata)
            .finish()
    }
}
