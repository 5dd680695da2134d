//! Queue abstraction consumed by `batch-consumer`: the `Subscription`
//! trait, its `Message`/`Acker` contract, and an in-process `Memory`
//! driver used by tests and by triggers configured with `queue: memory`.

mod memory;
mod message;
mod subscription;

pub use memory::{MemoryBroker, MemorySubscription};
pub use message::{Acker, Message};
pub use subscription::{Received, Subscription, SubscriptionError};
