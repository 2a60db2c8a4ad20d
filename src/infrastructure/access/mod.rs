//! ACL propagation onto shared resources

mod propagator;
mod reconciler;

pub use propagator::{AccessPropagator, PropagationOp, PropagationReport, PropagationResult};
pub use reconciler::{Reconciler, TeamReconciliation, RECONCILER_ACTOR};
