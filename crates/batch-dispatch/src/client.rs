use async_trait::async_trait;
use batch_classify::WorkloadError;
use batch_core::WorkloadDocument;

/// External Pod/Job API the Dispatcher creates workloads through. Errors
/// must carry enough structure (`batch_classify::WorkloadError`) for the
/// classifier to tell permanent and retryable failures apart.
#[async_trait]
pub trait WorkloadClient: Send + Sync {
    async fn create_pod(
        &self,
        namespace: &str,
        pod: &WorkloadDocument,
    ) -> Result<WorkloadDocument, WorkloadError>;

    async fn create_job(
        &self,
        namespace: &str,
        job: &WorkloadDocument,
    ) -> Result<WorkloadDocument, WorkloadError>;
}
