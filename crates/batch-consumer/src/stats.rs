use batch_core::ConnectionState;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Snapshot copy handed to the Manager/Reconciler; never aliases the live
/// counters so a reader can't observe a torn cross-field update.
#[derive(Debug, Clone)]
pub struct StatsSnapshot {
    pub connection_state: ConnectionState,
    pub messages_processed: u64,
    pub messages_failed: u64,
    pub messages_retried: u64,
    pub last_error: Option<String>,
    pub last_error_time: Option<DateTime<Utc>>,
}

struct ErrorState {
    last_error: Option<String>,
    last_error_time: Option<DateTime<Utc>>,
}

/// Per-Consumer counters and connection state. Mutated only by the owning
/// Consumer, except for the `Error` transition the Manager writes when the
/// Consumer's task exits unexpectedly. Counters are individually atomic;
/// `state`/`error` share one mutex so a snapshot reads them consistently.
pub struct ConsumerStats {
    processed: AtomicU64,
    failed: AtomicU64,
    retried: AtomicU64,
    state: Mutex<ConnectionState>,
    error: Mutex<ErrorState>,
}

impl Default for ConsumerStats {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsumerStats {
    pub fn new() -> Self {
        Self {
            processed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            retried: AtomicU64::new(0),
            state: Mutex::new(ConnectionState::Starting),
            error: Mutex::new(ErrorState {
                last_error: None,
                last_error_time: None,
            }),
        }
    }

    pub fn record_processed(&self) {
        self.processed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_retried(&self) {
        self.retried.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_failed(&self, err: impl Into<String>) {
        self.failed.fetch_add(1, Ordering::SeqCst);
        self.record_error(err);
    }

    /// Records an error without bumping the failure counter, for
    /// connection-level faults (e.g. a failed Subscribe) that aren't a
    /// per-message failure.
    pub fn record_error(&self, err: impl Into<String>) {
        let mut error = self.error.lock().expect("stats lock poisoned");
        error.last_error = Some(err.into());
        error.last_error_time = Some(Utc::now());
    }

    pub fn set_state(&self, state: ConnectionState) {
        *self.state.lock().expect("stats lock poisoned") = state;
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let state = *self.state.lock().expect("stats lock poisoned");
        let error = self.error.lock().expect("stats lock poisoned");
        StatsSnapshot {
            connection_state: state,
            messages_processed: self.processed.load(Ordering::SeqCst),
            messages_failed: self.failed.load(Ordering::SeqCst),
            messages_retried: self.retried.load(Ordering::SeqCst),
            last_error: error.last_error.clone(),
            last_error_time: error.last_error_time,
        }
    }
}

impl std::fmt::Debug for ConsumerStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("ConsumerStats")
            .field("connection_state", &snapshot.connection_state)
            .field("messages_processed", &snapshot.messages_processed)
            .field("messages_failed", &snapshot.messages_failed)
            .field("messages_retried", &snapshot.messages_retried)
            .finish()
    }
}
