//! `Reconciler`: turns a `BatchTrigger`'s desired state into Manager
//! calls and projects Consumer stats back into a 3-condition status
//! (`Ready`/`Progressing`/`Degraded`).

mod reconciler;
mod store;

pub use reconciler::{ReconcileOutcome, Reconciler, REQUEUE_INTERVAL};
pub use store::TriggerStore;
