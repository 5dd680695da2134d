use crate::queue::{KafkaConfig, MemoryConfig, NatsConfig, PubSubConfig, QueueSource, RabbitConfig, SqsConfig};
use crate::workload::{ExecAction, Workload, WorkloadDocument};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Wire format for `TriggerConfig`: a flat struct with one optional field
/// per workload/queue variant, matching how the original is deserialized
/// from a CRD's `spec`. `TriggerConfig::try_from` is the validated
/// constructor that enforces "exactly one workload, exactly one queue".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawTriggerConfig {
    #[serde(default)]
    pub log_level: Option<String>,
    #[serde(default)]
    pub pod: Option<WorkloadDocument>,
    #[serde(default)]
    pub job: Option<WorkloadDocument>,
    #[serde(default)]
    pub exec: Option<ExecAction>,
    #[serde(default)]
    pub sqs: Option<SqsConfig>,
    #[serde(default)]
    pub pubsub: Option<PubSubConfig>,
    #[serde(default)]
    pub rabbitmq: Option<RabbitConfig>,
    #[serde(default)]
    pub nats: Option<NatsConfig>,
    #[serde(default)]
    pub kafka: Option<KafkaConfig>,
    #[serde(default)]
    pub memory: Option<MemoryConfig>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("exactly one of pod/job/exec must be set, found {0}")]
    WorkloadCount(usize),
    #[error("exactly one of sqs/pubsub/rabbitmq/nats/kafka/memory must be set, found {0}")]
    QueueCount(usize),
}

/// Validated, immutable configuration copied into a Consumer at Start.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerConfig {
    pub log_level: Option<String>,
    pub workload: Workload,
    pub queue: QueueSource,
}

impl TryFrom<RawTriggerConfig> for TriggerConfig {
    type Error = ConfigError;

    fn try_from(raw: RawTriggerConfig) -> Result<Self, Self::Error> {
        let mut workloads = Vec::new();
        if let Some(pod) = raw.pod {
            workloads.push(Workload::Pod(pod));
        }
        if let Some(job) = raw.job {
            workloads.push(Workload::Job(job));
        }
        if let Some(exec) = raw.exec {
            workloads.push(Workload::Exec(exec));
        }
        if workloads.len() != 1 {
            return Err(ConfigError::WorkloadCount(workloads.len()));
        }

        let mut queues = Vec::new();
        if let Some(mut sqs) = raw.sqs {
            if sqs.wait_time_seconds == 0 {
                sqs.wait_time_seconds = 5;
            }
            queues.push(QueueSource::Sqs(sqs));
        }
        if let Some(pubsub) = raw.pubsub {
            queues.push(QueueSource::PubSub(pubsub));
        }
        if let Some(rabbitmq) = raw.rabbitmq {
            queues.push(QueueSource::RabbitMq(rabbitmq));
        }
        if let Some(nats) = raw.nats {
            queues.push(QueueSource::Nats(nats));
        }
        if let Some(kafka) = raw.kafka {
            queues.push(QueueSource::Kafka(kafka));
        }
        if let Some(memory) = raw.memory {
            queues.push(QueueSource::Memory(memory));
        }
        if queues.len() != 1 {
            return Err(ConfigError::QueueCount(queues.len()));
        }

        Ok(Self {
            log_level: raw.log_level,
            workload: workloads.remove(0),
            queue: queues.remove(0),
        })
    }
}

impl TriggerConfig {
    /// Coarse string-equality comparison used by `UpdateConfig` to decide
    /// whether a running Consumer must be restarted. Deliberately
    /// conservative (key order / whitespace can trigger a false positive) —
    /// preserved from the original for fidelity, see DESIGN.md.
    pub fn comparable(&self) -> String {
        format!("{} -> {}", self.queue, self.workload)
    }
}

impl fmt::Display for TriggerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.queue, self.workload)
    }
}
