use async_trait::async_trait;
use batch_core::{BatchTrigger, TriggerKey, TriggerStatus};
use batch_reconciler::TriggerStore;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::info;

/// `TriggerStore` backed by the config files passed on the command line,
/// standing in for the real Kubernetes watch/patch client the original
/// controller uses. Desired state never changes after load; `patch_status`
/// only updates the in-memory copy and logs it, since there is no external
/// API server to write back to.
pub struct FileTriggerStore {
    triggers: RwLock<HashMap<TriggerKey, BatchTrigger>>,
}

impl FileTriggerStore {
    /// Parses each file as a single `BatchTrigger` YAML document, matching
    /// the original's one-config-file-per-consumer invocation.
    pub fn load(paths: &[String]) -> anyhow::Result<Self> {
        let mut triggers = HashMap::new();
        for path in paths {
            let data = std::fs::read_to_string(path)
                .map_err(|err| anyhow::anyhow!("reading {path}: {err}"))?;
            let trigger: BatchTrigger = serde_yaml::from_str(&data)
                .map_err(|err| anyhow::anyhow!("parsing {path}: {err}"))?;
            info!(path, key = %trigger.key, "loaded trigger config");
            triggers.insert(trigger.key.clone(), trigger);
        }
        Ok(Self {
            triggers: RwLock::new(triggers),
        })
    }

    pub fn keys(&self) -> Vec<TriggerKey> {
        self.triggers
            .read()
            .expect("trigger store lock poisoned")
            .keys()
            .cloned()
            .collect()
    }
}

#[async_trait]
impl TriggerStore for FileTriggerStore {
    async fn fetch(&self, key: &TriggerKey) -> Option<BatchTrigger> {
        self.triggers
            .read()
            .expect("trigger store lock poisoned")
            .get(key)
            .cloned()
    }

    async fn patch_status(&self, key: &TriggerKey, status: TriggerStatus) {
        let mut triggers = self.triggers.write().expect("trigger store lock poisoned");
        if let Some(trigger) = triggers.get_mut(key) {
            info!(%key, state = %status.connection_state, "status updated");
            trigger.status = status;
        }
    }
}
