use serde::{Deserialize, Serialize};
use std::fmt;

/// Connection endpoint shared by the NATS and RabbitMQ variants, mirroring
/// the original's inline `URL` value type used to build connection strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnUrl {
    pub host: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl fmt::Display for ConnUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.username.is_empty() {
            write!(f, "{}:{}", self.host, self.port)
        } else {
            write!(f, "{}@{}:{}", self.username, self.host, self.port)
        }
    }
}

fn default_sqs_wait_time() -> u32 {
    5
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqsConfig {
    pub queue_arn: String,
    #[serde(default)]
    pub raw_delivery: bool,
    /// Long-poll wait time in seconds; 0 in the wire format means "unset"
    /// and is normalized to the default at validation time.
    #[serde(default = "default_sqs_wait_time")]
    pub wait_time_seconds: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PubSubConfig {
    pub project_id: String,
    pub subscription: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RabbitConfig {
    #[serde(flatten)]
    pub url: ConnUrl,
    pub queue: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NatsConfig {
    #[serde(flatten)]
    pub url: ConnUrl,
    pub subject: String,
    #[serde(default)]
    pub queue: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KafkaConfig {
    pub brokers: Vec<String>,
    pub topic: String,
    pub group: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryConfig {
    pub queue_name: String,
}

/// Exactly one variant is set on a valid `TriggerConfig`. Only `Memory`
/// is wired to a real driver — the rest exist so desired-state
/// documents round-trip and so the Reconciler can validate and log them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum QueueSource {
    Sqs(SqsConfig),
    PubSub(PubSubConfig),
    RabbitMq(RabbitConfig),
    Nats(NatsConfig),
    Kafka(KafkaConfig),
    Memory(MemoryConfig),
}

impl fmt::Display for QueueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueSource::Sqs(c) => write!(f, "sqs:{}", c.queue_arn),
            QueueSource::PubSub(c) => write!(f, "pubsub:{}/{}", c.project_id, c.subscription),
            QueueSource::RabbitMq(c) => write!(f, "rabbitmq:{}/{}", c.url, c.queue),
            QueueSource::Nats(c) => write!(f, "nats:{}/{}", c.url, c.subject),
            QueueSource::Kafka(c) => write!(f, "kafka:{}/{}", c.brokers.join(","), c.topic),
            QueueSource::Memory(c) => write!(f, "memory:{}", c.queue_name),
        }
    }
}
