use thiserror::Error;

/// Errors raised by the currency conversion gateway.
#[derive(Error, Debug)]
pub enum FxError {
    /// No rate exists for the pair on or before the requested date.
    /// Never defaulted to 1.0; posting a foreign amount without a rate
    /// would corrupt the balance invariant.
    #[error("Exchange rate not found: {0}")]
    RateNotFound(String),

    #[error("Invalid exchange rate: {0}")]
    InvalidRate(String),

    #[error("Rate cache error: {0}")]
    CacheError(String),
}
