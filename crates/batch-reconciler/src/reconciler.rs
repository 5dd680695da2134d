use crate::store::TriggerStore;
use batch_core::{ConditionType, ConnectionState, TriggerConfig, TriggerKey, TriggerStatus};
use batch_manager::ConsumerManager;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Status refreshes on a fixed cadence even absent a new event, so a
/// Consumer that silently drifted into `Error` is still surfaced.
pub const REQUEUE_INTERVAL: Duration = Duration::from_secs(30);

/// What the caller (a poll loop, or a real controller-runtime work queue)
/// should do after one `reconcile` call.
#[derive(Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The trigger is gone or being deleted; nothing more to do for it.
    Done,
    /// Reconcile again after the given delay.
    RequeueAfter(Duration),
}

/// Projects `BatchTrigger` desired state onto a `ConsumerManager` and
/// writes the observed `ConsumerStats` back as status.
pub struct Reconciler {
    store: Arc<dyn TriggerStore>,
    manager: Arc<ConsumerManager>,
}

impl Reconciler {
    pub fn new(store: Arc<dyn TriggerStore>, manager: Arc<ConsumerManager>) -> Self {
        Self { store, manager }
    }

    pub async fn reconcile(&self, key: &TriggerKey) -> ReconcileOutcome {
        let Some(trigger) = self.store.fetch(key).await else {
            self.manager.stop(key);
            return ReconcileOutcome::Done;
        };

        if trigger.is_deleting() {
            self.manager.stop(key);
            return ReconcileOutcome::Done;
        }

        let config = match TriggerConfig::try_from(trigger.spec) {
            Ok(config) => config,
            Err(err) => {
                warn!(%key, error = %err, "invalid trigger config");
                let mut status = trigger.status;
                status.set_condition(
                    ConditionType::Degraded,
                    true,
                    "InvalidConfig",
                    err.to_string(),
                    trigger.generation,
                    Utc::now(),
                );
                self.store.patch_status(key, status).await;
                return ReconcileOutcome::RequeueAfter(REQUEUE_INTERVAL);
            }
        };

        let start_result = if self.manager.is_running(key) {
            self.manager.update_config(key.clone(), config).await
        } else {
            self.manager.start(key.clone(), config).await
        };

        let mut status = trigger.status;
        if let Err(err) = start_result {
            warn!(%key, error = %err, "failed to start or update consumer");
            status.set_condition(
                ConditionType::Degraded,
                true,
                "StartFailed",
                err.to_string(),
                trigger.generation,
                Utc::now(),
            );
            self.store.patch_status(key, status).await;
            return ReconcileOutcome::RequeueAfter(REQUEUE_INTERVAL);
        }

        let snapshot = self.manager.get_stats(key);
        status.connection_state = snapshot.connection_state;
        status.messages_processed = snapshot.messages_processed;
        status.messages_failed = snapshot.messages_failed;
        status.messages_retried = snapshot.messages_retried;
        status.last_error = snapshot.last_error;
        status.last_error_time = snapshot.last_error_time;

        project_conditions(&mut status, trigger.generation);

        info!(%key, state = %status.connection_state, "reconciled");
        self.store.patch_status(key, status).await;
        ReconcileOutcome::RequeueAfter(REQUEUE_INTERVAL)
    }
}

/// The fixed 4-state → 3-condition mapping.
fn project_conditions(status: &mut TriggerStatus, generation: u64) {
    let now = Utc::now();
    let (ready, ready_reason, progressing, progressing_reason, degraded, degraded_reason) =
        match status.connection_state {
            ConnectionState::Connected => (true, "Connected", false, "Stable", false, "Healthy"),
            ConnectionState::Starting => (false, "Starting", true, "Starting", false, "Healthy"),
            ConnectionState::Error => (false, "Error", false, "Stopped", true, "Error"),
            ConnectionState::Disconnected => {
                (false, "Disconnected", false, "Stopped", false, "Stopped")
            }
        };

    status.set_condition(ConditionType::Ready, ready, ready_reason, "", generation, now);
    status.set_condition(
        ConditionType::Progressing,
        progressing,
        progressing_reason,
        "",
        generation,
        now,
    );
    status.set_condition(
        ConditionType::Degraded,
        degraded,
        degraded_reason,
        "",
        generation,
        now,
    );
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler").finish_non_exhaustive()
    }
}
