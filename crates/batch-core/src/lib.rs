//! Shared data model for the batch-runner consumer-manager subsystem:
//! the `BatchTrigger` desired-state record, its validated `TriggerConfig`,
//! and the observed `TriggerStatus` the Reconciler writes back.

mod config;
mod key;
mod queue;
mod retry;
mod status;
mod trigger;
mod workload;

pub use config::{ConfigError, RawTriggerConfig, TriggerConfig};
pub use key::TriggerKey;
pub use queue::{
    ConnUrl, KafkaConfig, MemoryConfig, NatsConfig, PubSubConfig, QueueSource, RabbitConfig,
    SqsConfig,
};
pub use retry::RetryPolicy;
pub use status::{Condition, ConditionType, ConnectionState, TriggerStatus};
pub use trigger::BatchTrigger;
pub use workload::{EnvVar, ExecAction, Workload, WorkloadDocument};
