use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by the lot tracker.
#[derive(Error, Debug)]
pub enum LotError {
    /// The open lots cannot cover the requested sale quantity. The whole
    /// allocation fails; no lot is touched.
    #[error("Insufficient open lots for {ticker}: selling {requested}, only {available} available")]
    InsufficientLots {
        ticker: String,
        requested: Decimal,
        available: Decimal,
    },

    #[error("Lot '{0}' not found")]
    LotNotFound(String),

    #[error("Invalid split ratio: {0}")]
    InvalidSplitRatio(Decimal),
}
