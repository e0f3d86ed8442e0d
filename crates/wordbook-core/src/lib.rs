//! wordbook-core - offline-first vocabulary engine
//!
//! Entries live in a per-user libSQL database. Every local mutation is also
//! queued as an operation that the sync orchestrator replays to the remote
//! service once the device is online, while the translation backfill enriches
//! entries that were created without a translation.

pub mod config;
pub mod connectivity;
pub mod db;
pub mod error;
pub mod models;
pub mod notify;
pub mod read_guard;
pub mod remote;
pub mod store;
pub mod sync;
pub mod translation;
pub mod util;

#[cfg(test)]
mod test_support;

pub use config::EngineConfig;
pub use connectivity::{ConnectivityMonitor, ConnectivityTransition, NetworkReport};
pub use error::{Error, Result};
pub use models::{Entry, EntryId, EntryPatch, NewEntry, Operation, OperationKind};
pub use notify::{EventNotifier, Subscription};
pub use read_guard::{ReadGuard, ReadToken};
pub use store::{EntryStore, PendingWork};
pub use sync::{SessionContext, SyncOrchestrator, SyncScheduler, SyncState};
pub use translation::TranslationBackfill;
