use crate::factory::{BuildError, ConsumerFactory};
use batch_consumer::{ConsumerCallbacks, ConsumerStats, LoopExit, NoopCallbacks, StatsSnapshot};
use batch_core::{ConnectionState, TriggerConfig, TriggerKey};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error(transparent)]
    Build(#[from] BuildError),
}

struct ManagedConsumer {
    comparable: String,
    cancel: CancellationToken,
    stats: Arc<ConsumerStats>,
    started_at: DateTime<Utc>,
    /// Kept so `ConsumerManager::stop_all` can be certain every task has
    /// been spawned; the task itself runs detached once inserted.
    _handle: JoinHandle<()>,
}

/// Registry of `(TriggerKey → running Consumer)`. A single RW mutex
/// guards membership; each Consumer mutates only its own `ConsumerStats`,
/// so reads never contend with a running pipeline beyond the map lookup.
pub struct ConsumerManager {
    registry: RwLock<HashMap<TriggerKey, ManagedConsumer>>,
    factory: Arc<dyn ConsumerFactory>,
    callbacks: Arc<dyn ConsumerCallbacks>,
    next_epoch: AtomicU64,
}

impl ConsumerManager {
    pub fn new(factory: Arc<dyn ConsumerFactory>) -> Self {
        Self::with_callbacks(factory, Arc::new(NoopCallbacks))
    }

    /// Same as `new`, but every spawned Consumer shares `callbacks`
    /// instead of the default no-op set — used by the binary to wire
    /// `batch-telemetry`'s Prometheus counters.
    pub fn with_callbacks(factory: Arc<dyn ConsumerFactory>, callbacks: Arc<dyn ConsumerCallbacks>) -> Self {
        Self {
            registry: RwLock::new(HashMap::new()),
            factory,
            callbacks,
            next_epoch: AtomicU64::new(0),
        }
    }

    /// Idempotent: a second `start` for a key that already has a running
    /// Consumer is a no-op success.
    pub async fn start(&self, key: TriggerKey, config: TriggerConfig) -> Result<(), ManagerError> {
        if self.is_running(&key) {
            return Ok(());
        }
        self.spawn(key, config).await
    }

    /// `None` is treated as absent-equivalent-to-Start; `Some` compares
    /// the new config's comparable string form against the running one
    /// and only restarts on a real change, so status-only churn never
    /// tears down a healthy Consumer.
    pub async fn update_config(
        &self,
        key: TriggerKey,
        config: TriggerConfig,
    ) -> Result<(), ManagerError> {
        let unchanged = self
            .registry
            .read()
            .expect("manager registry lock poisoned")
            .get(&key)
            .is_some_and(|managed| managed.comparable == config.comparable());

        if unchanged {
            return Ok(());
        }

        self.stop(&key);
        self.spawn(key, config).await
    }

    async fn spawn(&self, key: TriggerKey, config: TriggerConfig) -> Result<(), ManagerError> {
        let comparable = config.comparable();
        let stats = Arc::new(ConsumerStats::new());

        let consumer = self
            .factory
            .build(&key, &config, stats.clone(), self.callbacks.clone())
            .await?;

        let cancel = CancellationToken::new();
        let epoch = self.next_epoch.fetch_add(1, Ordering::SeqCst);
        let run_cancel = cancel.clone();
        let log_key = key.clone();
        let task_stats = stats.clone();
        let _handle = tokio::spawn(async move {
            match consumer.run(run_cancel).await {
                LoopExit::Cancelled => {
                    info!(key = %log_key, epoch, "consumer task exited");
                }
                LoopExit::Fatal(err) => {
                    task_stats.set_state(ConnectionState::Error);
                    task_stats.record_error(err.clone());
                    error!(key = %log_key, epoch, error = %err, "consumer task exited with a fatal error");
                }
            }
        });

        let managed = ManagedConsumer {
            comparable,
            cancel,
            stats,
            started_at: Utc::now(),
            _handle,
        };

        self.registry
            .write()
            .expect("manager registry lock poisoned")
            .insert(key, managed);
        Ok(())
    }

    /// No-op if `key` is absent. Does not wait for the Consumer task to
    /// observe cancellation; a subsequent `start` for the same key is safe
    /// immediately because the new entry gets its own `ConsumerStats`, so
    /// the outgoing task's final state write (if any) lands on a detached
    /// copy instead of clobbering the replacement.
    pub fn stop(&self, key: &TriggerKey) {
        let removed = self
            .registry
            .write()
            .expect("manager registry lock poisoned")
            .remove(key);
        if let Some(managed) = removed {
            managed.cancel.cancel();
        }
    }

    pub fn stop_all(&self) {
        let mut registry = self.registry.write().expect("manager registry lock poisoned");
        for (_, managed) in registry.drain() {
            managed.cancel.cancel();
        }
    }

    pub fn is_running(&self, key: &TriggerKey) -> bool {
        self.registry
            .read()
            .expect("manager registry lock poisoned")
            .contains_key(key)
    }

    pub fn get_stats(&self, key: &TriggerKey) -> StatsSnapshot {
        self.registry
            .read()
            .expect("manager registry lock poisoned")
            .get(key)
            .map(|managed| managed.stats.snapshot())
            .unwrap_or(StatsSnapshot {
                connection_state: ConnectionState::Disconnected,
                messages_processed: 0,
                messages_failed: 0,
                messages_retried: 0,
                last_error: None,
                last_error_time: None,
            })
    }

    pub fn started_at(&self, key: &TriggerKey) -> Option<DateTime<Utc>> {
        self.registry
            .read()
            .expect("manager registry lock poisoned")
            .get(key)
            .map(|managed| managed.started_at)
    }
}

impl std::fmt::Debug for ConsumerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self
            .registry
            .read()
            .expect("manager registry lock poisoned")
            .len();
        f.debug_struct("ConsumerManager")
            .field("running", &count)
            .finish()
    }
}

impl Drop for ConsumerManager {
    fn drop(&mut self) {
        if let Ok(registry) = self.registry.read() {
            if !registry.is_empty() {
                error!(count = registry.len(), "manager dropped with consumers still registered");
            }
        }
    }
}
