use batch_core::ConnectionState;
use batch_consumer::ConsumerCallbacks;
use metrics::Counter;
use metrics_derive::Metrics;

/// Process-wide Prometheus counters, distinct from the per-trigger
/// `ConsumerStats` the Reconciler reads synchronously for status write-back.
#[derive(Metrics, Clone)]
#[metrics(scope = "batch_runner")]
pub struct Metrics {
    #[metric(describe = "Messages successfully dispatched")]
    pub messages_processed: Counter,

    #[metric(describe = "Messages that ended in a Terminal outcome")]
    pub messages_failed: Counter,

    #[metric(describe = "Messages that were nacked for a retry")]
    pub messages_retried: Counter,

    #[metric(describe = "Consumer connection transitions, by resulting state")]
    pub connection_changes: Counter,
}

/// Bridges `Consumer` decision points to the `Metrics` counters above.
pub struct MetricsCallbacks {
    metrics: Metrics,
}

impl MetricsCallbacks {
    pub fn new(metrics: Metrics) -> Self {
        Self { metrics }
    }
}

impl ConsumerCallbacks for MetricsCallbacks {
    fn on_processed(&self) {
        self.metrics.messages_processed.increment(1);
    }

    fn on_failed(&self, _err: &str) {
        self.metrics.messages_failed.increment(1);
    }

    fn on_retried(&self) {
        self.metrics.messages_retried.increment(1);
    }

    fn on_connection_change(&self, _state: ConnectionState) {
        self.metrics.connection_changes.increment(1);
    }
}

impl std::fmt::Debug for MetricsCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsCallbacks").finish_non_exhaustive()
    }
}
