use async_trait::async_trait;
use batch_classify::WorkloadError;
use batch_core::WorkloadDocument;
use batch_dispatch::WorkloadClient;
use tracing::info;

/// Stands in for the real Kubernetes Job/Pod API, out of scope for this
/// binary. Logs the document it would have submitted and reports success,
/// so the Pod/Job path is exercisable end to end without a cluster.
#[derive(Debug, Default)]
pub struct LoggingWorkloadClient;

#[async_trait]
impl WorkloadClient for LoggingWorkloadClient {
    async fn create_pod(
        &self,
        namespace: &str,
        pod: &WorkloadDocument,
    ) -> Result<WorkloadDocument, WorkloadError> {
        info!(namespace, pod = %pod, "would create pod");
        Ok(pod.deep_clone())
    }

    async fn create_job(
        &self,
        namespace: &str,
        job: &WorkloadDocument,
    ) -> Result<WorkloadDocument, WorkloadError> {
        info!(namespace, job = %job, "would create job");
        Ok(job.deep_clone())
    }
}
