use crate::client::WorkloadClient;
use crate::runner::ShellRunner;
use batch_classify::{classify, Classified, WorkloadError};
use batch_core::Workload;
use batch_retry::RetryLedger;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// What the Consumer should do after one dispatch attempt.
#[derive(Debug)]
pub enum Outcome {
    Success,
    RetryAfter(Duration),
    Terminal(String),
}

/// Creates Pods/Jobs through a `WorkloadClient` or runs `Exec` scripts
/// through a `ShellRunner`, translating the result into an `Outcome` the
/// Consumer applies uniformly regardless of workload kind.
pub struct Dispatcher {
    client: Arc<dyn WorkloadClient>,
    runner: Arc<dyn ShellRunner>,
    exec_retries: Arc<RetryLedger>,
}

impl Dispatcher {
    pub fn new(
        client: Arc<dyn WorkloadClient>,
        runner: Arc<dyn ShellRunner>,
        exec_retries: Arc<RetryLedger>,
    ) -> Self {
        Self {
            client,
            runner,
            exec_retries,
        }
    }

    pub async fn dispatch(&self, message_id: &str, workload: &Workload) -> Outcome {
        match workload {
            Workload::Pod(doc) => {
                let namespace = doc.namespace().to_string();
                match self.client.create_pod(&namespace, doc).await {
                    Ok(created) => {
                        info!(name = %created, "created pod");
                        Outcome::Success
                    }
                    Err(err) => self.classify_workload_error(&namespace, doc.name(), err),
                }
            }
            Workload::Job(doc) => {
                let namespace = doc.namespace().to_string();
                match self.client.create_job(&namespace, doc).await {
                    Ok(created) => {
                        info!(name = %created, "created job");
                        Outcome::Success
                    }
                    Err(err) => self.classify_workload_error(&namespace, doc.name(), err),
                }
            }
            Workload::Exec(action) => self.dispatch_exec(message_id, workload, action).await,
        }
    }

    fn classify_workload_error(&self, namespace: &str, name: &str, err: WorkloadError) -> Outcome {
        match classify(&err) {
            Classified::Retryable { delay } => {
                error!(%namespace, %name, error = %err, "retryable workload error");
                Outcome::RetryAfter(delay)
            }
            Classified::Permanent => {
                error!(%namespace, %name, error = %err, "permanent workload error");
                Outcome::Terminal(err.to_string())
            }
        }
    }

    async fn dispatch_exec(
        &self,
        message_id: &str,
        workload: &Workload,
        action: &batch_core::ExecAction,
    ) -> Outcome {
        let outcome = self.runner.run(action).await;
        let failure = match &outcome {
            Ok(run) if run.succeeded() => {
                info!(script = %action.script, "exec succeeded");
                return Outcome::Success;
            }
            Ok(run) => format!(
                "script returned non-zero exit code {}: {}",
                run.exit_code, run.stderr
            ),
            Err(err) => format!("runner error: {err}"),
        };

        let policy = workload.exec_retry().unwrap_or_default();
        match self.exec_retries.backoff(message_id, &policy) {
            Some(delay) => {
                error!(error = %failure, "exec failed, retrying");
                Outcome::RetryAfter(delay)
            }
            None => {
                error!(error = %failure, "exec retries exhausted");
                Outcome::Terminal(failure)
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::RunOutcome;
    use async_trait::async_trait;
    use batch_classify::WorkloadErrorKind;
    use batch_core::{EnvVar, ExecAction, RetryPolicy, WorkloadDocument};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubClient {
        pod_result: Result<(), WorkloadError>,
    }

    #[async_trait]
    impl WorkloadClient for StubClient {
        async fn create_pod(
            &self,
            _namespace: &str,
            pod: &WorkloadDocument,
        ) -> Result<WorkloadDocument, WorkloadError> {
            match &self.pod_result {
                Ok(()) => Ok(pod.clone()),
                Err(err) => Err(WorkloadError::new(err.kind, err.message.clone())),
            }
        }

        async fn create_job(
            &self,
            namespace: &str,
            job: &WorkloadDocument,
        ) -> Result<WorkloadDocument, WorkloadError> {
            self.create_pod(namespace, job).await
        }
    }

    struct StubRunner {
        exit_code: i32,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ShellRunner for StubRunner {
        async fn run(&self, _action: &ExecAction) -> Result<RunOutcome, std::io::Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(RunOutcome {
                exit_code: self.exit_code,
                stdout: String::new(),
                stderr: "boom".to_string(),
            })
        }
    }

    fn pod() -> Workload {
        Workload::Pod(WorkloadDocument(json!({
            "metadata": {"name": "p", "namespace": "default"}
        })))
    }

    #[tokio::test]
    async fn successful_pod_creation_yields_success() {
        let dispatcher = Dispatcher::new(
            Arc::new(StubClient { pod_result: Ok(()) }),
            Arc::new(StubRunner {
                exit_code: 0,
                calls: AtomicUsize::new(0),
            }),
            Arc::new(RetryLedger::new()),
        );

        let outcome = dispatcher.dispatch("msg-1", &pod()).await;
        assert!(matches!(outcome, Outcome::Success));
    }

    #[tokio::test]
    async fn retryable_pod_error_yields_retry_after() {
        let dispatcher = Dispatcher::new(
            Arc::new(StubClient {
                pod_result: Err(WorkloadError::new(WorkloadErrorKind::ServerClosed, "down")),
            }),
            Arc::new(StubRunner {
                exit_code: 0,
                calls: AtomicUsize::new(0),
            }),
            Arc::new(RetryLedger::new()),
        );

        let outcome = dispatcher.dispatch("msg-1", &pod()).await;
        assert!(matches!(outcome, Outcome::RetryAfter(_)));
    }

    #[tokio::test]
    async fn permanent_pod_error_yields_terminal() {
        let dispatcher = Dispatcher::new(
            Arc::new(StubClient {
                pod_result: Err(WorkloadError::new(WorkloadErrorKind::Forbidden, "nope")),
            }),
            Arc::new(StubRunner {
                exit_code: 0,
                calls: AtomicUsize::new(0),
            }),
            Arc::new(RetryLedger::new()),
        );

        let outcome = dispatcher.dispatch("msg-1", &pod()).await;
        assert!(matches!(outcome, Outcome::Terminal(_)));
    }

    #[tokio::test]
    async fn exec_retries_exhaust_then_go_terminal() {
        let dispatcher = Dispatcher::new(
            Arc::new(StubClient { pod_result: Ok(()) }),
            Arc::new(StubRunner {
                exit_code: 1,
                calls: AtomicUsize::new(0),
            }),
            Arc::new(RetryLedger::new()),
        );
        let exec = Workload::Exec(ExecAction {
            script: "exit 1".to_string(),
            env: vec![EnvVar {
                name: "X".to_string(),
                value: "1".to_string(),
            }],
            connections: json!(null),
            artifacts: vec![],
            checkout: None,
            retry: Some(RetryPolicy {
                attempts: 3,
                delay_seconds: 1,
            }),
        });

        assert!(matches!(
            dispatcher.dispatch("msg-1", &exec).await,
            Outcome::RetryAfter(_)
        ));
        assert!(matches!(
            dispatcher.dispatch("msg-1", &exec).await,
            Outcome::RetryAfter(_)
        ));
        assert!(matches!(
            dispatcher.dispatch("msg-1", &exec).await,
            Outcome::RetryAfter(_)
        ));
        assert!(matches!(
            dispatcher.dispatch("msg-1", &exec).await,
            Outcome::Terminal(_)
        ));
    }
}
