use async_trait::async_trait;
use batch_core::{BatchTrigger, TriggerKey, TriggerStatus};

/// External desired-state collaborator the Reconciler reads `BatchTrigger`
/// resources from and writes observed `TriggerStatus` back to. A real
/// deployment backs this with a Kubernetes watch/patch client; the binary
/// ships a file-backed implementation.
#[async_trait]
pub trait TriggerStore: Send + Sync {
    async fn fetch(&self, key: &TriggerKey) -> Option<BatchTrigger>;

    async fn patch_status(&self, key: &TriggerKey, status: TriggerStatus);
}
