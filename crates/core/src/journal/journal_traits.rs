use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use super::journal_model::{Actor, JournalEntry, JournalLine};
use crate::errors::Result;
use crate::transactions::Transaction;

/// Trait defining the contract for journal storage.
pub trait JournalRepositoryTrait: Send + Sync {
    /// The per-portfolio posting lock. Everything that claims an entry
    /// number and writes ledger state must run while holding it; this is
    /// what makes the numbering scheme gap-free and the ledger
    /// single-writer per portfolio.
    fn posting_lock(&self, portfolio_id: &str) -> Arc<Mutex<()>>;

    /// Claims the next entry number from the portfolio's sequence.
    /// Call only while holding the posting lock.
    fn next_entry_number(&self, portfolio_id: &str) -> Result<i64>;

    /// Persists a fully assembled entry (header and lines together).
    /// The store re-checks the balance invariant before accepting.
    fn insert_entry(&self, entry: JournalEntry) -> Result<JournalEntry>;

    fn get_entry(&self, entry_id: &str) -> Result<JournalEntry>;

    fn entries_for_portfolio(&self, portfolio_id: &str) -> Result<Vec<JournalEntry>>;

    /// Lines of `Posted` entries touching an account, with entry dates in
    /// `(from, to]`; `from = None` means since inception.
    fn posted_lines_for_account(
        &self,
        account_id: &str,
        from: Option<NaiveDate>,
        to: NaiveDate,
    ) -> Result<Vec<JournalLine>>;
}

/// Options for posting a transaction.
#[derive(Debug, Clone)]
pub struct PostingOptions {
    /// Explicit override: sell more than the open lots cover, booking the
    /// uncovered quantity at zero cost basis. Off by default; without it
    /// an oversell fails atomically.
    pub allow_negative_holding: bool,
    /// Who is posting. Defaults to the system actor.
    pub actor: Actor,
}

impl Default for PostingOptions {
    fn default() -> Self {
        Self {
            allow_negative_holding: false,
            actor: Actor::System,
        }
    }
}

/// Trait defining the contract for the journal engine.
pub trait JournalServiceTrait: Send + Sync {
    /// Posts one validated transaction as one balanced journal entry.
    fn post_transaction(&self, transaction: &Transaction) -> Result<JournalEntry>;

    fn post_transaction_with_options(
        &self,
        transaction: &Transaction,
        options: PostingOptions,
    ) -> Result<JournalEntry>;
}
