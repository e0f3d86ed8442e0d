pub mod add;
pub mod common;
pub mod delete;
pub mod edit;
pub mod list;
pub mod reset;
pub mod search;
pub mod show;
pub mod status;
pub mod sync;
pub mod translate;
