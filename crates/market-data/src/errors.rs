use thiserror::Error;

/// Errors raised by market data providers.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// No price is known for the symbol on or before the requested date.
    #[error("No price available for '{symbol}' on or before {date}")]
    PriceUnavailable { symbol: String, date: chrono::NaiveDate },

    /// The provider itself failed (transport, auth, decode).
    #[error("Market data provider error: {0}")]
    ProviderError(String),
}
