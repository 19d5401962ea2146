//! Core error types for the accounting engine.
//!
//! Module-specific errors (FX, journal, lots, valuation, imports) are
//! defined next to their domain and folded into the root [`Error`] here.
//! Storage-specific failures surface as [`Error::Storage`] strings so the
//! core stays storage-agnostic.

use chrono::ParseError as ChronoParseError;
use thiserror::Error;

use crate::fx::FxError;
use crate::imports::ImportError;
use crate::journal::JournalError;
use crate::lots::LotError;
use crate::valuation::ValuationError;
use ledgerfolio_market_data::MarketDataError;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the accounting core.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Account with code '{code}' not found in portfolio {portfolio_id}")]
    AccountNotFound { portfolio_id: String, code: String },

    #[error("Portfolio '{0}' not found")]
    PortfolioNotFound(String),

    #[error("Fx error: {0}")]
    Fx(#[from] FxError),

    #[error("Journal error: {0}")]
    Journal(#[from] JournalError),

    #[error("Lot tracking error: {0}")]
    Lot(#[from] LotError),

    #[error("Valuation error: {0}")]
    Valuation(#[from] ValuationError),

    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    #[error("Market data error: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage operation failed: {0}")]
    Storage(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Validation errors for user input and data parsing.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid currency code: '{0}'")]
    InvalidCurrencyCode(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Failed to parse decimal number: {0}")]
    DecimalParse(#[from] rust_decimal::Error),

    #[error("Failed to parse date/time: {0}")]
    DateTimeParse(#[from] ChronoParseError),
}

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Validation(ValidationError::DecimalParse(err))
    }
}

impl From<ChronoParseError> for Error {
    fn from(err: ChronoParseError) -> Self {
        Error::Validation(ValidationError::DateTimeParse(err))
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}
