//! Journal engine - entries, lines, posting templates.

mod journal_errors;
mod journal_model;
mod journal_service;
mod journal_traits;


pub use journal_errors::JournalError;
pub use journal_model::{Actor, EntryStatus, EntryType, JournalEntry, JournalLine, LineBasis};
pub use journal_service::JournalService;
pub use journal_traits::{JournalRepositoryTrait, JournalServiceTrait, PostingOptions};
