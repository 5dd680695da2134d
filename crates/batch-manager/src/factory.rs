use async_trait::async_trait;
use batch_consumer::{Consumer, ConsumerCallbacks, ConsumerStats};
use batch_core::{TriggerConfig, TriggerKey};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("opening subscription: {0}")]
    Subscription(#[from] anyhow::Error),
}

/// Builds a ready-to-run `Consumer` for a validated `TriggerConfig`. This
/// is the seam the ConsumerManager uses instead of depending directly on
/// a concrete queue driver, workload client, or renderer stack.
#[async_trait]
pub trait ConsumerFactory: Send + Sync {
    async fn build(
        &self,
        key: &TriggerKey,
        config: &TriggerConfig,
        stats: Arc<ConsumerStats>,
        callbacks: Arc<dyn ConsumerCallbacks>,
    ) -> Result<Consumer, BuildError>;
}
