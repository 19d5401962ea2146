use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Origin of a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataSource {
    /// Entered by hand or seeded by a test fixture.
    #[default]
    Manual,
    /// Pulled from an external feed.
    Feed,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Manual => "MANUAL",
            DataSource::Feed => "FEED",
        }
    }
}

/// A single end-of-day price observation for a symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    /// Price per unit in `currency`.
    pub price: Decimal,
    /// Listing currency of the symbol.
    pub currency: String,
    pub as_of: NaiveDate,
    pub source: DataSource,
}
