use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::currency::Currency;
use super::fx_errors::FxError;
use super::fx_model::ExchangeRate;

/// Rate lookup over independent per-pair time series.
///
/// Each pair keeps a date-ordered history, so a lookup resolves to the
/// exact rate when one exists and otherwise falls back to the most recent
/// rate on or before the requested date. A pair with no usable history at
/// all fails loudly; rates are never defaulted.
pub struct CurrencyConverter {
    /// Key: (from, to). Value: date-ordered rate history.
    rates: HashMap<(Currency, Currency), BTreeMap<NaiveDate, Decimal>>,
}

impl CurrencyConverter {
    pub fn new(exchange_rates: Vec<ExchangeRate>) -> Self {
        let mut converter = CurrencyConverter {
            rates: HashMap::new(),
        };
        converter.add_rates(exchange_rates);
        converter
    }

    /// Adds historical rates, storing the inverse of each observation so
    /// both directions of a pair resolve.
    pub fn add_rates(&mut self, rates: Vec<ExchangeRate>) {
        for rate in rates {
            if rate.from_currency == rate.to_currency || rate.rate.is_zero() {
                continue;
            }

            let forward = (rate.from_currency.clone(), rate.to_currency.clone());
            let inverse = (rate.to_currency, rate.from_currency);

            self.rates
                .entry(forward)
                .or_default()
                .insert(rate.date, rate.rate);
            self.rates
                .entry(inverse)
                .or_default()
                .insert(rate.date, Decimal::ONE / rate.rate);
        }
    }

    /// The most recent rate on or before `date`, if any.
    fn rate_on_or_before(&self, from: &Currency, to: &Currency, date: NaiveDate) -> Option<Decimal> {
        let key = (from.clone(), to.clone());
        self.rates
            .get(&key)
            .and_then(|history| history.range(..=date).next_back())
            .map(|(_, rate)| *rate)
    }

    /// Resolves a rate for the pair as of `date`. Self-rate is always 1.
    pub fn get_rate(&self, from: &Currency, to: &Currency, date: NaiveDate) -> Result<Decimal, FxError> {
        if from == to {
            return Ok(Decimal::ONE);
        }

        self.rate_on_or_before(from, to, date).ok_or_else(|| {
            FxError::RateNotFound(format!(
                "No rate for {}/{} on or before {}",
                from, to, date
            ))
        })
    }

    /// Converts an amount between currencies as of `date`.
    pub fn convert_amount(
        &self,
        amount: Decimal,
        from: &Currency,
        to: &Currency,
        date: NaiveDate,
    ) -> Result<Decimal, FxError> {
        if from == to {
            return Ok(amount);
        }
        let rate = self.get_rate(from, to, date)?;
        Ok(amount * rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ccy(code: &str) -> Currency {
        Currency::new(code).unwrap()
    }

    fn make_rate(from: &str, to: &str, rate: Decimal, y: i32, m: u32, d: u32) -> ExchangeRate {
        ExchangeRate::new(
            ccy(from),
            ccy(to),
            rate,
            NaiveDate::from_ymd_opt(y, m, d).unwrap(),
        )
    }

    #[test]
    fn exact_date_match() {
        let converter = CurrencyConverter::new(vec![make_rate("USD", "EUR", dec!(0.90), 2023, 10, 25)]);
        let date = NaiveDate::from_ymd_opt(2023, 10, 25).unwrap();

        assert_eq!(converter.get_rate(&ccy("USD"), &ccy("EUR"), date).unwrap(), dec!(0.90));
    }

    #[test]
    fn falls_back_to_most_recent_prior_rate() {
        let converter = CurrencyConverter::new(vec![
            make_rate("USD", "EUR", dec!(0.90), 2023, 10, 20),
            make_rate("USD", "EUR", dec!(0.95), 2023, 10, 30),
        ]);
        let date = NaiveDate::from_ymd_opt(2023, 10, 27).unwrap();

        // 10-30 is closer but in the future; only on-or-before counts.
        assert_eq!(converter.get_rate(&ccy("USD"), &ccy("EUR"), date).unwrap(), dec!(0.90));
    }

    #[test]
    fn future_only_history_fails() {
        let converter = CurrencyConverter::new(vec![make_rate("USD", "EUR", dec!(0.90), 2023, 10, 20)]);
        let date = NaiveDate::from_ymd_opt(2023, 10, 10).unwrap();

        assert!(matches!(
            converter.get_rate(&ccy("USD"), &ccy("EUR"), date),
            Err(FxError::RateNotFound(_))
        ));
    }

    #[test]
    fn inverse_rate_is_derived() {
        let converter = CurrencyConverter::new(vec![make_rate("USD", "EUR", dec!(0.80), 2023, 10, 20)]);
        let date = NaiveDate::from_ymd_opt(2023, 10, 21).unwrap();

        assert_eq!(converter.get_rate(&ccy("EUR"), &ccy("USD"), date).unwrap(), dec!(1.25));
    }

    #[test]
    fn self_rate_is_one_without_history() {
        let converter = CurrencyConverter::new(vec![]);
        let date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();

        assert_eq!(converter.get_rate(&ccy("EUR"), &ccy("EUR"), date).unwrap(), Decimal::ONE);
        assert_eq!(
            converter.convert_amount(dec!(42), &ccy("EUR"), &ccy("EUR"), date).unwrap(),
            dec!(42)
        );
    }

    #[test]
    fn unknown_pair_fails_loudly() {
        let converter = CurrencyConverter::new(vec![make_rate("USD", "EUR", dec!(0.90), 2023, 10, 20)]);
        let date = NaiveDate::from_ymd_opt(2023, 10, 25).unwrap();

        assert!(converter.get_rate(&ccy("GBP"), &ccy("EUR"), date).is_err());
    }
}
