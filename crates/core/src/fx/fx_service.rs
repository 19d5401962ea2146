use std::sync::{Arc, RwLock};

use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;

use super::currency::Currency;
use super::currency_converter::CurrencyConverter;
use super::fx_errors::FxError;
use super::fx_model::{ExchangeRate, NewExchangeRate};
use super::fx_traits::{FxRepositoryTrait, FxServiceTrait};
use crate::errors::Result;

/// Currency conversion gateway backed by a rate repository.
///
/// Rates are loaded into a [`CurrencyConverter`] on first use and rebuilt
/// whenever a rate is registered. Lookups never fall back to 1.0; a
/// missing pair propagates [`FxError::RateNotFound`].
pub struct FxService {
    repository: Arc<dyn FxRepositoryTrait>,
    converter: RwLock<Option<CurrencyConverter>>,
}

impl FxService {
    pub fn new(repository: Arc<dyn FxRepositoryTrait>) -> Self {
        Self {
            repository,
            converter: RwLock::new(None),
        }
    }

    fn rebuild_converter(&self) -> Result<()> {
        let rates = self.repository.get_all_rates()?;
        debug!("Rebuilding currency converter from {} rates", rates.len());

        let mut guard = self
            .converter
            .write()
            .map_err(|e| FxError::CacheError(e.to_string()))?;
        *guard = Some(CurrencyConverter::new(rates));
        Ok(())
    }

    fn with_converter<T>(
        &self,
        f: impl FnOnce(&CurrencyConverter) -> std::result::Result<T, FxError>,
    ) -> Result<T> {
        {
            let guard = self
                .converter
                .read()
                .map_err(|e| FxError::CacheError(e.to_string()))?;
            if let Some(converter) = guard.as_ref() {
                return Ok(f(converter)?);
            }
        }

        self.rebuild_converter()?;
        let guard = self
            .converter
            .read()
            .map_err(|e| FxError::CacheError(e.to_string()))?;
        let converter = guard
            .as_ref()
            .ok_or_else(|| FxError::CacheError("converter not initialized".to_string()))?;
        Ok(f(converter)?)
    }
}

impl FxServiceTrait for FxService {
    fn initialize(&self) -> Result<()> {
        self.rebuild_converter()
    }

    fn add_rate(&self, new_rate: NewExchangeRate) -> Result<ExchangeRate> {
        if new_rate.rate <= Decimal::ZERO {
            return Err(FxError::InvalidRate(format!(
                "Rate {}/{} on {} must be positive, got {}",
                new_rate.from_currency, new_rate.to_currency, new_rate.date, new_rate.rate
            ))
            .into());
        }

        let rate = ExchangeRate::new(
            new_rate.from_currency,
            new_rate.to_currency,
            new_rate.rate,
            new_rate.date,
        );
        let stored = self.repository.insert_rate(rate)?;
        self.rebuild_converter()?;
        Ok(stored)
    }

    fn get_rate_for_date(
        &self,
        from: &Currency,
        to: &Currency,
        date: NaiveDate,
    ) -> Result<Decimal> {
        if from == to {
            return Ok(Decimal::ONE);
        }
        self.with_converter(|c| c.get_rate(from, to, date))
    }

    fn convert_for_date(
        &self,
        amount: Decimal,
        from: &Currency,
        to: &Currency,
        date: NaiveDate,
    ) -> Result<Decimal> {
        if from == to {
            return Ok(amount);
        }
        self.with_converter(|c| c.convert_amount(amount, from, to, date))
    }
}
