use crate::callbacks::ConsumerCallbacks;
use crate::sleep::cancellable_sleep;
use crate::stats::ConsumerStats;
use batch_core::{ConnectionState, Workload};
use batch_dispatch::{Dispatcher, Outcome};
use batch_render::MessageRenderer;
use batch_retry::RetryLedger;
use batch_subscription::{Received, Subscription, SubscriptionError};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, trace, warn};

const TRANSIENT_RECEIVE_BACKOFF: Duration = Duration::from_secs(5);
const EMPTY_RECEIVE_BACKOFF: Duration = Duration::from_secs(3);

/// Why `Consumer::run` stopped. The Manager inspects this to decide the
/// `ConnectionState` transition: a cancelled loop goes `Disconnected`, a
/// fatal one goes `Error` with the error recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopExit {
    /// `cancel` fired, or the subscription reported a clean cancellation.
    Cancelled,
    /// The subscription declared itself permanently broken; the loop
    /// exited without being asked to.
    Fatal(String),
}

/// One long-running receive → render → dispatch → acknowledge pipeline
/// for a single `BatchTrigger`. Strictly sequential: a Consumer processes
/// one message at a time, so FIFO ordering on the underlying queue is
/// preserved end to end.
pub struct Consumer {
    subscription: Arc<dyn Subscription>,
    renderer: Arc<MessageRenderer>,
    dispatcher: Arc<Dispatcher>,
    retry_ledger: Arc<RetryLedger>,
    workload: Workload,
    stats: Arc<ConsumerStats>,
    callbacks: Arc<dyn ConsumerCallbacks>,
}

impl Consumer {
    pub fn new(
        subscription: Arc<dyn Subscription>,
        renderer: Arc<MessageRenderer>,
        dispatcher: Arc<Dispatcher>,
        retry_ledger: Arc<RetryLedger>,
        workload: Workload,
        stats: Arc<ConsumerStats>,
        callbacks: Arc<dyn ConsumerCallbacks>,
    ) -> Self {
        Self {
            subscription,
            renderer,
            dispatcher,
            retry_ledger,
            workload,
            stats,
            callbacks,
        }
    }

    pub fn stats(&self) -> Arc<ConsumerStats> {
        self.stats.clone()
    }

    /// Runs until `cancel` fires or the subscription reports a fatal
    /// error. The subscription was already opened by the caller, so this
    /// only needs to flip the lifecycle from `Starting` to `Connected`
    /// before entering the receive loop. Only transitions to
    /// `Disconnected` itself on a clean, cancelled exit — the Manager
    /// writes the `Error` transition on a `Fatal` one.
    pub async fn run(&self, cancel: CancellationToken) -> LoopExit {
        if let Ok(pretty) = serde_yaml::to_string(&self.workload) {
            trace!(workload = %pretty, "consumer starting");
        }
        self.transition(ConnectionState::Connected);

        let exit = loop {
            if cancel.is_cancelled() {
                break LoopExit::Cancelled;
            }

            match self.subscription.receive(&cancel).await {
                Ok(Received::Cancelled) => break LoopExit::Cancelled,
                Err(SubscriptionError::Transient(err)) => {
                    warn!(error = %err, "transient receive error");
                    if !cancellable_sleep(TRANSIENT_RECEIVE_BACKOFF, &cancel).await {
                        break LoopExit::Cancelled;
                    }
                }
                Err(SubscriptionError::Fatal(err)) => {
                    error!(error = %err, "fatal receive error, consumer exiting");
                    break LoopExit::Fatal(err.to_string());
                }
                Ok(Received::Empty) => {
                    if !cancellable_sleep(EMPTY_RECEIVE_BACKOFF, &cancel).await {
                        break LoopExit::Cancelled;
                    }
                }
                Ok(Received::Message(message)) => {
                    if !self.handle_message(message, &cancel).await {
                        break LoopExit::Cancelled;
                    }
                }
            }
        };

        self.subscription.close().await;
        if exit == LoopExit::Cancelled {
            self.transition(ConnectionState::Disconnected);
        }
        exit
    }

    /// Processes one message to completion. Returns `false` if
    /// cancellation cut short a retry-backoff sleep, signalling the
    /// caller to stop the loop.
    async fn handle_message(
        &self,
        message: batch_subscription::Message,
        cancel: &CancellationToken,
    ) -> bool {
        let rendered =
            self.renderer
                .render(&message.body, &message.loggable_id, &message.metadata, &self.workload);

        let workload = match rendered {
            Ok(workload) => workload,
            Err(err) => {
                error!(error = %err, id = %message.loggable_id, "render failure, terminal");
                message.ack().await;
                self.stats.record_failed(err.to_string());
                self.callbacks.on_failed(&err.to_string());
                return true;
            }
        };

        let outcome = self.dispatcher.dispatch(&message.loggable_id, &workload).await;

        match outcome {
            Outcome::Success => {
                message.ack().await;
                self.retry_ledger.remove(&message.loggable_id);
                self.stats.record_processed();
                self.callbacks.on_processed();
                true
            }
            Outcome::RetryAfter(delay) => {
                if message.nackable() {
                    message.nack().await;
                }
                self.stats.record_retried();
                self.callbacks.on_retried();
                cancellable_sleep(delay, cancel).await
            }
            Outcome::Terminal(err) => {
                message.ack().await;
                self.stats.record_failed(err.clone());
                self.callbacks.on_failed(&err);
                true
            }
        }
    }

    fn transition(&self, state: ConnectionState) {
        self.stats.set_state(state);
        self.callbacks.on_connection_change(state);
    }
}

impl std::fmt::Debug for Consumer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Consumer").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::NoopCallbacks;
    use async_trait::async_trait;
    use batch_core::WorkloadDocument;
    use batch_dispatch::{ProcessShellRunner, WorkloadClient};
    use batch_render::MinijinjaTemplater;
    use batch_subscription::MemoryBroker;
    use serde_json::json;
    use std::collections::HashMap;

    struct AlwaysSucceeds;

    #[async_trait]
    impl WorkloadClient for AlwaysSucceeds {
        async fn create_pod(
            &self,
            _namespace: &str,
            pod: &WorkloadDocument,
        ) -> Result<WorkloadDocument, batch_classify::WorkloadError> {
            Ok(pod.clone())
        }

        async fn create_job(
            &self,
            _namespace: &str,
            job: &WorkloadDocument,
        ) -> Result<WorkloadDocument, batch_classify::WorkloadError> {
            Ok(job.clone())
        }
    }

    fn harness(workload: Workload) -> (Consumer, MemoryBroker) {
        let broker = MemoryBroker::new();
        let subscription = Arc::new(broker.subscribe("q1"));
        let renderer = Arc::new(MessageRenderer::new(Arc::new(MinijinjaTemplater::new())));
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::new(AlwaysSucceeds),
            Arc::new(ProcessShellRunner),
            Arc::new(RetryLedger::new()),
        ));
        let consumer = Consumer::new(
            subscription,
            renderer,
            dispatcher,
            Arc::new(RetryLedger::new()),
            workload,
            Arc::new(ConsumerStats::new()),
            Arc::new(NoopCallbacks),
        );
        (consumer, broker)
    }

    #[tokio::test]
    async fn processes_a_single_message_and_exits_on_cancellation() {
        let workload = Workload::Pod(WorkloadDocument(json!({
            "metadata": {"name": "batch-{{.a}}", "namespace": "default"}
        })));
        let (consumer, broker) = harness(workload);
        broker.publish("q1", br#"{"a": "first"}"#.to_vec(), HashMap::new());

        let cancel = CancellationToken::new();
        let stats = consumer.stats();
        let cancel_for_task = cancel.clone();
        let run = tokio::spawn(async move { consumer.run(cancel_for_task).await });

        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
        let exit = run.await.unwrap();

        assert_eq!(exit, LoopExit::Cancelled);
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.messages_processed, 1);
        assert_eq!(snapshot.connection_state, ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn render_failure_acks_and_counts_as_failed() {
        let workload = Workload::Pod(WorkloadDocument(json!({
            "metadata": {"name": "{{.missing.deeply.nested", "namespace": "default"}
        })));
        let (consumer, broker) = harness(workload);
        broker.publish("q1", b"{}".to_vec(), HashMap::new());

        let cancel = CancellationToken::new();
        let stats = consumer.stats();
        let cancel_for_task = cancel.clone();
        let run = tokio::spawn(async move { consumer.run(cancel_for_task).await });

        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
        run.await.unwrap();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.messages_failed, 1);
        assert_eq!(snapshot.messages_processed, 0);
    }

    struct FatalSubscription;

    #[async_trait]
    impl Subscription for FatalSubscription {
        async fn receive(&self, _cancel: &CancellationToken) -> Result<Received, SubscriptionError> {
            Err(SubscriptionError::Fatal(anyhow::anyhow!("connection permanently lost")))
        }

        async fn close(&self) {}
    }

    #[tokio::test]
    async fn fatal_receive_error_exits_without_transitioning_to_disconnected() {
        let renderer = Arc::new(MessageRenderer::new(Arc::new(MinijinjaTemplater::new())));
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::new(AlwaysSucceeds),
            Arc::new(ProcessShellRunner),
            Arc::new(RetryLedger::new()),
        ));
        let consumer = Consumer::new(
            Arc::new(FatalSubscription),
            renderer,
            dispatcher,
            Arc::new(RetryLedger::new()),
            Workload::Pod(WorkloadDocument(json!({
                "metadata": {"name": "batch", "namespace": "default"}
            }))),
            Arc::new(ConsumerStats::new()),
            Arc::new(NoopCallbacks),
        );

        let exit = consumer.run(CancellationToken::new()).await;
        assert_eq!(exit, LoopExit::Fatal("connection permanently lost".to_string()));

        // The Consumer itself never writes `Error`; that's the Manager's job
        // once it observes this `LoopExit`.
        assert_eq!(
            consumer.stats().snapshot().connection_state,
            ConnectionState::Connected
        );
    }
}
