//! Classifies errors returned by a workload-creation call (Pod/Job dispatch)
//! into permanent failures and retryable ones, per the fixed error taxonomy
//! the Dispatcher relies on.

use std::time::Duration;
use thiserror::Error;

/// Baseline backoff for a retryable workload error that doesn't carry its
/// own suggested delay. Distinct from the user-configured `RetryPolicy`
/// used for `Exec` dispatch.
pub const DEFAULT_RETRYABLE_DELAY: Duration = Duration::from_secs(5);

/// An error surfaced by the workload client when creating a Pod or Job.
/// `suggested_delay` mirrors a server's explicit "retry after" hint, when
/// the transport exposed one.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct WorkloadError {
    pub kind: WorkloadErrorKind,
    pub message: String,
    pub suggested_delay: Option<Duration>,
}

impl WorkloadError {
    pub fn new(kind: WorkloadErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            suggested_delay: None,
        }
    }

    pub const fn with_suggested_delay(mut self, delay: Duration) -> Self {
        self.suggested_delay = Some(delay);
        self
    }
}

/// Fixed taxonomy of workload-creation failures. Values the classifier has
/// never seen fall back to `Unknown`, which is treated as permanent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadErrorKind {
    InvalidInput,
    NotAcceptable,
    Forbidden,
    Unauthorized,
    RequestEntityTooLarge,
    HandlerTimeout,
    ServerClosed,
    ConnectionRefused,
    ConnectionReset,
    ProbableEof,
    NetworkTimeout,
    Unknown,
}

impl std::fmt::Display for WorkloadErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::InvalidInput => "invalid input",
            Self::NotAcceptable => "not acceptable",
            Self::Forbidden => "forbidden",
            Self::Unauthorized => "unauthorized",
            Self::RequestEntityTooLarge => "request entity too large",
            Self::HandlerTimeout => "handler timeout",
            Self::ServerClosed => "server closed",
            Self::ConnectionRefused => "connection refused",
            Self::ConnectionReset => "connection reset",
            Self::ProbableEof => "probable EOF",
            Self::NetworkTimeout => "network timeout",
            Self::Unknown => "unknown error",
        };
        f.write_str(s)
    }
}

impl WorkloadErrorKind {
    const fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::HandlerTimeout
                | Self::ServerClosed
                | Self::ConnectionRefused
                | Self::ConnectionReset
                | Self::ProbableEof
                | Self::NetworkTimeout
        )
    }
}

/// Result of classifying a `WorkloadError`.
#[derive(Debug)]
pub enum Classified {
    /// Ack the message and record a failure; redelivering would not help.
    Permanent,
    /// Nack (if supported) and resume after `delay`.
    Retryable { delay: Duration },
}

/// Classifies a workload-creation error per the fixed permanent/retryable
/// taxonomy. Unrecognized kinds default to permanent: an opaque bug should
/// not cause a redelivery storm.
pub fn classify(err: &WorkloadError) -> Classified {
    if err.kind.is_retryable() {
        Classified::Retryable {
            delay: err.suggested_delay.unwrap_or(DEFAULT_RETRYABLE_DELAY),
        }
    } else {
        Classified::Permanent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permanent_kinds_ack_without_retry() {
        for kind in [
            WorkloadErrorKind::InvalidInput,
            WorkloadErrorKind::NotAcceptable,
            WorkloadErrorKind::Forbidden,
            WorkloadErrorKind::Unauthorized,
            WorkloadErrorKind::RequestEntityTooLarge,
        ] {
            let err = WorkloadError::new(kind, "boom");
            assert!(matches!(classify(&err), Classified::Permanent));
        }
    }

    #[test]
    fn retryable_kinds_use_the_default_delay_absent_a_hint() {
        for kind in [
            WorkloadErrorKind::HandlerTimeout,
            WorkloadErrorKind::ServerClosed,
            WorkloadErrorKind::ConnectionRefused,
            WorkloadErrorKind::ConnectionReset,
            WorkloadErrorKind::ProbableEof,
            WorkloadErrorKind::NetworkTimeout,
        ] {
            let err = WorkloadError::new(kind, "boom");
            match classify(&err) {
                Classified::Retryable { delay } => assert_eq!(delay, DEFAULT_RETRYABLE_DELAY),
                Classified::Permanent => panic!("{kind} should be retryable"),
            }
        }
    }

    #[test]
    fn a_suggested_delay_overrides_the_default() {
        let err = WorkloadError::new(WorkloadErrorKind::ServerClosed, "boom")
            .with_suggested_delay(Duration::from_secs(42));
        match classify(&err) {
            Classified::Retryable { delay } => assert_eq!(delay, Duration::from_secs(42)),
            Classified::Permanent => panic!("expected retryable"),
        }
    }

    #[test]
    fn unknown_defaults_to_permanent() {
        let err = WorkloadError::new(WorkloadErrorKind::Unknown, "mystery");
        assert!(matches!(classify(&err), Classified::Permanent));
    }
}
