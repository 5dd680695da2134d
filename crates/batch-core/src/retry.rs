use serde::{Deserialize, Serialize};
use std::time::Duration;

/// User-configured retry policy, carried on `ExecAction` and consulted
/// by the Dispatcher for `Exec` workloads. Default mirrors the original
/// `{attempts: 3, delay: 30}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay_seconds: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay_seconds: 30,
        }
    }
}

impl RetryPolicy {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_seconds)
    }
}
