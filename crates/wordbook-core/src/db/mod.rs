//! Database layer for Wordbook

mod connection;
mod entry_repository;
mod meta_repository;
mod migrations;
mod operation_repository;

pub use connection::{user_database_file_name, Database};
pub use entry_repository::{EntryRepository, LibSqlEntryRepository};
pub use meta_repository::{LibSqlMetaRepository, MetaRepository, DEVICE_ID, LAST_SYNC_TIMESTAMP};
pub use operation_repository::{LibSqlOperationRepository, NewOperation, OperationRepository};
