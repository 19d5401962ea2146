use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::currency::Currency;
use super::fx_model::{ExchangeRate, NewExchangeRate};
use crate::errors::Result;

/// Trait defining the contract for FX rate storage.
pub trait FxRepositoryTrait: Send + Sync {
    fn get_all_rates(&self) -> Result<Vec<ExchangeRate>>;
    fn insert_rate(&self, rate: ExchangeRate) -> Result<ExchangeRate>;
}

/// Trait defining the contract for the currency conversion gateway.
pub trait FxServiceTrait: Send + Sync {
    /// Rebuilds the in-memory rate series from the repository.
    fn initialize(&self) -> Result<()>;

    /// Registers a rate and refreshes the converter.
    fn add_rate(&self, new_rate: NewExchangeRate) -> Result<ExchangeRate>;

    /// Rate for the pair as of `date` (most recent on or before).
    fn get_rate_for_date(&self, from: &Currency, to: &Currency, date: NaiveDate)
        -> Result<Decimal>;

    /// Converts an amount between currencies as of `date`.
    fn convert_for_date(
        &self,
        amount: Decimal,
        from: &Currency,
        to: &Currency,
        date: NaiveDate,
    ) -> Result<Decimal>;
}
