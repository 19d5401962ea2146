//! Ledgerfolio Core - double-entry accounting for an investment portfolio.
//!
//! Brokerage transactions come in; balanced journal entries, FIFO cost
//! basis, and incremental mark-to-market adjustments come out. The crate
//! is storage-agnostic: services depend on repository traits, and the
//! bundled [`storage::MemoryLedgerStore`] implements them with
//! single-writer-per-portfolio semantics.

pub mod accounts;
pub mod constants;
pub mod errors;
pub mod fx;
pub mod imports;
pub mod journal;
pub mod ledger;
pub mod lots;
pub mod portfolio;
pub mod storage;
pub mod transactions;
pub mod valuation;

// Re-export error types
pub use errors::Error;
pub use errors::Result;

// Re-export the main service surface
pub use accounts::{AccountService, AccountServiceTrait};
pub use fx::{Currency, FxService, FxServiceTrait};
pub use journal::{JournalService, JournalServiceTrait, PostingOptions};
pub use ledger::{LedgerService, LedgerServiceTrait};
pub use lots::{LotService, LotServiceTrait};
pub use storage::MemoryLedgerStore;
pub use transactions::{Transaction, TransactionType};
pub use valuation::{ValuationService, ValuationServiceTrait};
