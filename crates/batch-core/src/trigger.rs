use crate::config::RawTriggerConfig;
use crate::key::TriggerKey;
use crate::status::TriggerStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Desired-state record, persisted externally. `spec` is the unvalidated
/// wire form: the Reconciler is what turns it into a `TriggerConfig`, so
/// an ambiguous or incomplete spec is representable right up to the
/// point it would be used to start a Consumer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchTrigger {
    #[serde(flatten)]
    pub key: TriggerKey,
    #[serde(default)]
    pub generation: u64,
    pub spec: RawTriggerConfig,
    #[serde(default)]
    pub status: TriggerStatus,
    #[serde(default)]
    pub deletion_timestamp: Option<DateTime<Utc>>,
}

impl BatchTrigger {
    pub fn is_deleting(&self) -> bool {
        self.deletion_timestamp.is_some()
    }
}
