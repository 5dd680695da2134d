//! Dispatches a templated `Workload` to its destination: Pod/Job creation
//! through a `WorkloadClient`, or an `Exec` script through a `ShellRunner`.

mod client;
mod dispatcher;
mod runner;

pub use client::WorkloadClient;
pub use dispatcher::{Dispatcher, Outcome};
pub use runner::{ProcessShellRunner, RunOutcome, ShellRunner};
