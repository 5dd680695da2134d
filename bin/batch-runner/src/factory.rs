use crate::client::LoggingWorkloadClient;
use async_trait::async_trait;
use batch_consumer::{Consumer, ConsumerCallbacks, ConsumerStats};
use batch_core::{QueueSource, TriggerConfig, TriggerKey};
use batch_dispatch::{Dispatcher, ProcessShellRunner};
use batch_manager::{BuildError, ConsumerFactory};
use batch_render::{MessageRenderer, MinijinjaTemplater};
use batch_retry::RetryLedger;
use batch_subscription::MemoryBroker;
use std::sync::Arc;

/// The only driver wired end to end here is `QueueSource::Memory`; a
/// trigger naming any other queue kind fails to build with
/// `BuildError::Subscription`.
pub struct MemoryConsumerFactory {
    broker: Arc<MemoryBroker>,
    client: Arc<LoggingWorkloadClient>,
    runner: Arc<ProcessShellRunner>,
}

impl MemoryConsumerFactory {
    pub fn new(broker: Arc<MemoryBroker>) -> Self {
        Self {
            broker,
            client: Arc::new(LoggingWorkloadClient),
            runner: Arc::new(ProcessShellRunner),
        }
    }
}

#[async_trait]
impl ConsumerFactory for MemoryConsumerFactory {
    async fn build(
        &self,
        _key: &TriggerKey,
        config: &TriggerConfig,
        stats: Arc<ConsumerStats>,
        callbacks: Arc<dyn ConsumerCallbacks>,
    ) -> Result<Consumer, BuildError> {
        let QueueSource::Memory(memory) = &config.queue else {
            return Err(BuildError::Subscription(anyhow::anyhow!(
                "queue kind {} has no implemented driver",
                config.queue
            )));
        };

        let subscription = Arc::new(self.broker.subscribe(&memory.queue_name));
        let renderer = Arc::new(MessageRenderer::new(Arc::new(MinijinjaTemplater::new())));
        let dispatcher = Arc::new(Dispatcher::new(
            self.client.clone(),
            self.runner.clone(),
            Arc::new(RetryLedger::new()),
        ));

        Ok(Consumer::new(
            subscription,
            renderer,
            dispatcher,
            Arc::new(RetryLedger::new()),
            config.workload.clone(),
            stats,
            callbacks,
        ))
    }
}
