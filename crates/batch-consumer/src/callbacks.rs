use batch_core::ConnectionState;

/// Invoked synchronously at each Consumer decision point. Implementations
/// must be non-blocking — they exist to update stats, not to do I/O.
pub trait ConsumerCallbacks: Send + Sync {
    fn on_processed(&self) {}
    fn on_failed(&self, _err: &str) {}
    fn on_retried(&self) {}
    fn on_connection_change(&self, _state: ConnectionState) {}
}

/// Callback set that does nothing; the default for a Consumer that only
/// needs its `ConsumerStats`, which are updated independently of callbacks.
#[derive(Debug, Default)]
pub struct NoopCallbacks;

impl ConsumerCallbacks for NoopCallbacks {}
