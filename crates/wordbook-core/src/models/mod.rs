//! Data models for Wordbook

mod entry;
mod operation;

pub use entry::{Entry, EntryId, EntryPatch, NewEntry, SourceMeanings};
pub use operation::{DeletePayload, EntryPayload, Operation, OperationKind};
