//! Reconciliation with the remote service.

mod orchestrator;
mod scheduler;
mod session;
mod state;

pub use orchestrator::SyncOrchestrator;
pub use scheduler::{SchedulerHandle, SyncScheduler};
pub use session::{Lifecycle, SessionContext};
pub use state::SyncState;
