use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by the journal engine.
#[derive(Error, Debug)]
pub enum JournalError {
    /// The defensive balance check before commit failed. Reaching this
    /// means a posting template is wrong; the entry is discarded.
    #[error("Journal entry {entry_number} is not balanced: DR={debits}, CR={credits}")]
    Unbalanced {
        entry_number: i64,
        debits: Decimal,
        credits: Decimal,
    },

    #[error("Invalid journal line: {0}")]
    InvalidLine(String),

    #[error("Transaction {transaction_id} cannot be posted: {reason}")]
    InvalidTransaction {
        transaction_id: String,
        reason: String,
    },
}
