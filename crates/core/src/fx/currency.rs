//! Currency value type and minor-unit rounding.

use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// A validated ISO-4217-style currency code.
///
/// Construction is the only validation point; once a `Currency` exists it
/// is a well-formed three-letter uppercase code everywhere downstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    pub fn new(code: &str) -> Result<Self, ValidationError> {
        let trimmed = code.trim();
        if trimmed.len() != 3 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::InvalidCurrencyCode(code.to_string()));
        }
        Ok(Currency(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Currency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::new(s)
    }
}

impl TryFrom<String> for Currency {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Currency::new(&value)
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.0
    }
}

impl AsRef<str> for Currency {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Number of minor-unit decimal places for a currency.
pub fn minor_units(currency: &Currency) -> u32 {
    match currency.as_str() {
        // Zero-decimal currencies
        "JPY" | "KRW" | "VND" | "CLP" | "ISK" => 0,
        _ => 2,
    }
}

/// Rounds a monetary amount to the currency's minor-unit precision.
///
/// Midpoints round away from zero, the usual convention for ledgers.
pub fn round_to_minor_units(amount: Decimal, currency: &Currency) -> Decimal {
    amount.round_dp_with_strategy(minor_units(currency), RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn valid_codes_normalize_to_uppercase() {
        assert_eq!(Currency::new("usd").unwrap().as_str(), "USD");
        assert_eq!(Currency::new(" EUR ").unwrap().as_str(), "EUR");
    }

    #[test]
    fn invalid_codes_are_rejected() {
        assert!(Currency::new("").is_err());
        assert!(Currency::new("EU").is_err());
        assert!(Currency::new("EURO").is_err());
        assert!(Currency::new("E1R").is_err());
    }

    #[test]
    fn rounding_respects_minor_units() {
        let eur = Currency::new("EUR").unwrap();
        let jpy = Currency::new("JPY").unwrap();

        assert_eq!(round_to_minor_units(dec!(1.005), &eur), dec!(1.01));
        assert_eq!(round_to_minor_units(dec!(-1.005), &eur), dec!(-1.01));
        assert_eq!(round_to_minor_units(dec!(100.4), &jpy), dec!(100));
    }
}
