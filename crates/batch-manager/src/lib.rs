//! `ConsumerManager`: the registry of running per-trigger Consumers, with
//! `Start`/`Stop`/`UpdateConfig`/`StopAll` and a `ConsumerFactory` seam
//! decoupling the registry from any concrete queue driver or workload client.

mod factory;
mod manager;

pub use factory::{BuildError, ConsumerFactory};
pub use manager::{ConsumerManager, ManagerError};
