use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// An opaque, structured workload document (a Pod or Job spec) that the
/// core never interprets beyond reading `metadata.namespace`/`metadata.name`
/// for logging and template targeting. Everything else is forwarded to the
/// `WorkloadClient` verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkloadDocument(pub Value);

impl WorkloadDocument {
    pub fn namespace(&self) -> &str {
        self.0
            .pointer("/metadata/namespace")
            .and_then(Value::as_str)
            .unwrap_or("default")
    }

    pub fn name(&self) -> &str {
        self.0
            .pointer("/metadata/name")
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    /// Deep-clone of the underlying document, used before every template
    /// walk so concurrent renderings of the same `BatchTrigger.spec` never
    /// race on shared state.
    pub fn deep_clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl fmt::Display for WorkloadDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace(), self.name())
    }
}

/// A single environment variable passed to an `Exec` workload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

/// Shell-script workload. `connections`, `artifacts` and `checkout` are
/// opaque documents the shell runner interprets; the core only templates
/// their string fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecAction {
    pub script: String,
    #[serde(default)]
    pub env: Vec<EnvVar>,
    #[serde(default)]
    pub connections: Value,
    #[serde(default)]
    pub artifacts: Vec<Value>,
    #[serde(default)]
    pub checkout: Option<Value>,
    #[serde(default)]
    pub retry: Option<RetryPolicy>,
}

impl fmt::Display for ExecAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.script)
    }
}

/// Exactly one of these is set on a valid `TriggerConfig`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Workload {
    Pod(WorkloadDocument),
    Job(WorkloadDocument),
    Exec(ExecAction),
}

impl Workload {
    /// Effective retry policy used when dispatching; only consulted for
    /// `Exec`, where it comes from `ExecAction.retry` (falling back to the
    /// default when unset). Pod/Job outcomes go through the
    /// `ErrorClassifier` instead.
    pub fn exec_retry(&self) -> Option<RetryPolicy> {
        match self {
            Workload::Exec(action) => Some(action.retry.unwrap_or_default()),
            _ => None,
        }
    }
}

impl fmt::Display for Workload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Workload::Pod(doc) => write!(f, "pod:{doc}"),
            Workload::Job(doc) => write!(f, "job:{doc}"),
            Workload::Exec(exec) => write!(f, "exec:{exec}"),
        }
    }
}
