//! The registration indexer: materializes the name tables from canonical
//! blocks and unwinds them across reorganizations.

mod indexer;
pub mod tracker;

pub use indexer::{ApplyResult, DiscardReason, NameState, RegistrationIndexer};
pub use tracker::ConfirmationTracker;
