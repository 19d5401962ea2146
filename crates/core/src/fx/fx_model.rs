use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::currency::Currency;

/// One observed exchange rate for a currency pair on a date.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRate {
    pub id: String,
    pub from_currency: Currency,
    pub to_currency: Currency,
    /// Units of `to_currency` per one unit of `from_currency`.
    pub rate: Decimal,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl ExchangeRate {
    pub fn new(from: Currency, to: Currency, rate: Decimal, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            from_currency: from,
            to_currency: to,
            rate,
            date,
            created_at: Utc::now(),
        }
    }
}

/// Input model for registering a rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExchangeRate {
    pub from_currency: Currency,
    pub to_currency: Currency,
    pub rate: Decimal,
    pub date: NaiveDate,
}
