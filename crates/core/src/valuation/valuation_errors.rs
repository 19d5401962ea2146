use thiserror::Error;

/// Errors raised by the mark-to-market engine.
#[derive(Error, Debug)]
pub enum ValuationError {
    /// Open positions exist but not a single one could be priced; running
    /// the adjustment would silently diff against nothing.
    #[error("No prices available for any open position in portfolio {portfolio_id}")]
    NoPricesAvailable { portfolio_id: String },
}
