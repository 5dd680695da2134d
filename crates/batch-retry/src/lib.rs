//! `RetryLedger`: per-message attempt tracking shared across every
//! Consumer in a process, with bounded memory via TTL eviction.

use batch_core::RetryPolicy;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

struct RetryEntry {
    count: u32,
    last_attempt: Instant,
}

/// Tracks attempts per `messageID` and decides whether a failed message
/// should be retried after a delay or treated as terminal. Shared by every
/// Consumer that dispatches through it; all operations lock a single
/// mutex, so they are atomic per call but serialize across messages.
pub struct RetryLedger {
    entries: Mutex<HashMap<String, RetryEntry>>,
    ttl: Duration,
}

impl Default for RetryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryLedger {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl: DEFAULT_TTL,
        }
    }

    #[cfg(test)]
    fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Records one attempt at delivering `message_id`. Returns the delay to
    /// wait before redelivery, or `None` once `policy.attempts` has been
    /// exhausted (the entry is removed and the caller should treat the
    /// message as terminal).
    pub fn backoff(&self, message_id: &str, policy: &RetryPolicy) -> Option<Duration> {
        let mut entries = self.entries.lock().expect("retry ledger lock poisoned");
        self.evict_expired(&mut entries);

        let now = Instant::now();
        match entries.get_mut(message_id) {
            None => {
                entries.insert(
                    message_id.to_string(),
                    RetryEntry {
                        count: 1,
                        last_attempt: now,
                    },
                );
                Some(policy.delay())
            }
            Some(entry) => {
                entry.count += 1;
                entry.last_attempt = now;
                if entry.count > policy.attempts {
                    entries.remove(message_id);
                    None
                } else {
                    Some(policy.delay())
                }
            }
        }
    }

    /// Clears any retry history for `message_id`. Called on a successful
    /// Ack so a later redelivery under the same id starts fresh.
    pub fn remove(&self, message_id: &str) {
        let mut entries = self.entries.lock().expect("retry ledger lock poisoned");
        entries.remove(message_id);
    }

    fn evict_expired(&self, entries: &mut HashMap<String, RetryEntry>) {
        let ttl = self.ttl;
        let now = Instant::now();
        entries.retain(|_, entry| now.duration_since(entry.last_attempt) < ttl);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    fn policy(attempts: u32, delay_seconds: u64) -> RetryPolicy {
        RetryPolicy {
            attempts,
            delay_seconds,
        }
    }

    #[test]
    fn first_observation_inserts_and_returns_configured_delay() {
        let ledger = RetryLedger::new();
        let delay = ledger.backoff("msg-1", &policy(3, 30)).unwrap();
        assert_eq!(delay, Duration::from_secs(30));
    }

    #[test]
    fn exhausts_after_configured_attempts_then_terminal() {
        let ledger = RetryLedger::new();
        let policy = policy(3, 1);

        assert!(ledger.backoff("msg-1", &policy).is_some());
        assert!(ledger.backoff("msg-1", &policy).is_some());
        assert!(ledger.backoff("msg-1", &policy).is_some());
        assert!(ledger.backoff("msg-1", &policy).is_none());
    }

    #[test]
    fn delay_is_constant_across_attempts() {
        let ledger = RetryLedger::new();
        let policy = policy(5, 7);

        let first = ledger.backoff("msg-1", &policy).unwrap();
        let second = ledger.backoff("msg-1", &policy).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, Duration::from_secs(7));
    }

    #[test]
    fn remove_clears_history_for_a_fresh_start() {
        let ledger = RetryLedger::new();
        let policy = policy(1, 1);

        assert!(ledger.backoff("msg-1", &policy).is_some());
        assert!(ledger.backoff("msg-1", &policy).is_none());

        ledger.remove("msg-1");
        assert!(ledger.backoff("msg-1", &policy).is_some());
    }

    #[test]
    fn entries_are_tracked_independently_per_message() {
        let ledger = RetryLedger::new();
        let policy = policy(1, 1);

        assert!(ledger.backoff("a", &policy).is_some());
        assert!(ledger.backoff("b", &policy).is_some());
        assert!(ledger.backoff("a", &policy).is_none());
        assert!(ledger.backoff("b", &policy).is_none());
    }

    #[test]
    fn expired_entries_are_evicted_and_restart_the_count() {
        let ledger = RetryLedger::with_ttl(Duration::from_millis(20));
        let policy = policy(1, 1);

        assert!(ledger.backoff("msg-1", &policy).is_some());
        assert!(ledger.backoff("msg-1", &policy).is_none());

        sleep(Duration::from_millis(40));

        assert!(ledger.backoff("msg-1", &policy).is_some());
    }
}
