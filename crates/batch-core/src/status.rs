use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Consumer connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ConnectionState {
    Starting,
    Connected,
    Disconnected,
    Error,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Starting => "Starting",
            ConnectionState::Connected => "Connected",
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::Error => "Error",
        };
        write!(f, "{s}")
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        ConnectionState::Disconnected
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionType {
    Ready,
    Progressing,
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "type")]
    pub kind: ConditionType,
    pub status: bool,
    pub observed_generation: u64,
    pub last_transition_time: DateTime<Utc>,
    pub reason: String,
    pub message: String,
}

/// Observed state, projected back onto the `BatchTrigger` by the
/// Reconciler from a `ConsumerStats` snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerStatus {
    pub connection_state: ConnectionState,
    pub messages_processed: u64,
    pub messages_failed: u64,
    pub messages_retried: u64,
    #[serde(default)]
    pub last_error: Option<String>,
    #[serde(default)]
    pub last_error_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl TriggerStatus {
    /// Insert-or-update a condition by type, mirroring
    /// `meta.SetStatusCondition` from the original.
    pub fn set_condition(
        &mut self,
        kind: ConditionType,
        status: bool,
        reason: impl Into<String>,
        message: impl Into<String>,
        generation: u64,
        now: DateTime<Utc>,
    ) {
        let reason = reason.into();
        let message = message.into();
        if let Some(existing) = self.conditions.iter_mut().find(|c| c.kind == kind) {
            if existing.status != status {
                existing.last_transition_time = now;
            }
            existing.status = status;
            existing.observed_generation = generation;
            existing.reason = reason;
            existing.message = message;
        } else {
            self.conditions.push(Condition {
                kind,
                status,
                observed_generation: generation,
                last_transition_time: now,
                reason,
                message,
            });
        }
    }
}
