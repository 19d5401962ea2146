//! Validated broker transaction model.
//!
//! Transactions arrive from the import layer already deduplicated; this
//! model re-validates the fields each posting template relies on so the
//! journal engine never has to guess.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{Result, ValidationError};
use crate::fx::Currency;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Buy,
    Sell,
    Dividend,
    Interest,
    Deposit,
    Withdrawal,
    Conversion,
    Fee,
    Tax,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Buy => "BUY",
            TransactionType::Sell => "SELL",
            TransactionType::Dividend => "DIVIDEND",
            TransactionType::Interest => "INTEREST",
            TransactionType::Deposit => "DEPOSIT",
            TransactionType::Withdrawal => "WITHDRAWAL",
            TransactionType::Conversion => "CONVERSION",
            TransactionType::Fee => "FEE",
            TransactionType::Tax => "TAX",
        }
    }
}

impl FromStr for TransactionType {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(TransactionType::Buy),
            "SELL" => Ok(TransactionType::Sell),
            "DIVIDEND" => Ok(TransactionType::Dividend),
            "INTEREST" => Ok(TransactionType::Interest),
            "DEPOSIT" => Ok(TransactionType::Deposit),
            "WITHDRAWAL" => Ok(TransactionType::Withdrawal),
            "CONVERSION" => Ok(TransactionType::Conversion),
            "FEE" => Ok(TransactionType::Fee),
            "TAX" => Ok(TransactionType::Tax),
            other => Err(ValidationError::InvalidInput(format!(
                "Unknown transaction type '{}'",
                other
            ))),
        }
    }
}

/// One validated brokerage transaction.
///
/// `amount` is the total in `currency`, always positive; direction comes
/// from the type. For CONVERSION, `amount`/`currency` describe the money
/// received and `conversion_from_*` the money paid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub portfolio_id: String,
    pub transaction_type: TransactionType,
    pub date: NaiveDate,

    /// Security ticker for BUY/SELL/DIVIDEND.
    pub ticker: Option<String>,
    pub quantity: Option<Decimal>,
    pub price: Option<Decimal>,

    pub amount: Decimal,
    pub currency: Currency,

    pub fees: Option<Decimal>,
    /// Withholding tax on a DIVIDEND, in transaction currency.
    pub tax_withheld: Option<Decimal>,

    pub conversion_from_amount: Option<Decimal>,
    pub conversion_from_currency: Option<Currency>,

    pub broker_reference: Option<String>,
    pub import_batch_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Minimal constructor used by the import layer and tests; callers fill
    /// optional fields afterwards.
    pub fn new(
        portfolio_id: &str,
        transaction_type: TransactionType,
        date: NaiveDate,
        amount: Decimal,
        currency: Currency,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            portfolio_id: portfolio_id.to_string(),
            transaction_type,
            date,
            ticker: None,
            quantity: None,
            price: None,
            amount,
            currency,
            fees: None,
            tax_withheld: None,
            conversion_from_amount: None,
            conversion_from_currency: None,
            broker_reference: None,
            import_batch_id: None,
            notes: None,
            created_at: Utc::now(),
        }
    }

    pub fn fees_or_zero(&self) -> Decimal {
        self.fees.unwrap_or(Decimal::ZERO)
    }

    pub fn tax_withheld_or_zero(&self) -> Decimal {
        self.tax_withheld.unwrap_or(Decimal::ZERO)
    }

    fn require_positive(value: Option<Decimal>, field: &str, id: &str) -> Result<Decimal> {
        match value {
            Some(v) if v > Decimal::ZERO => Ok(v),
            Some(v) => Err(ValidationError::InvalidInput(format!(
                "Transaction {}: field '{}' must be positive, got {}",
                id, field, v
            ))
            .into()),
            None => Err(ValidationError::MissingField(format!("{} ({})", field, id)).into()),
        }
    }

    /// Returns (ticker, quantity, price) after validating a security trade.
    pub fn security_fields(&self) -> Result<(&str, Decimal, Decimal)> {
        let ticker = self
            .ticker
            .as_deref()
            .ok_or_else(|| ValidationError::MissingField(format!("ticker ({})", self.id)))?;
        let quantity = Self::require_positive(self.quantity, "quantity", &self.id)?;
        let price = Self::require_positive(self.price, "price", &self.id)?;
        Ok((ticker, quantity, price))
    }

    /// Returns (source amount, source currency) after validating a conversion.
    pub fn conversion_fields(&self) -> Result<(Decimal, &Currency)> {
        let from_amount =
            Self::require_positive(self.conversion_from_amount, "conversionFromAmount", &self.id)?;
        let from_currency = self.conversion_from_currency.as_ref().ok_or_else(|| {
            ValidationError::MissingField(format!("conversionFromCurrency ({})", self.id))
        })?;
        Ok((from_amount, from_currency))
    }

    /// Structural validation shared by every posting path.
    pub fn validate(&self) -> Result<()> {
        if self.amount <= Decimal::ZERO {
            return Err(ValidationError::InvalidInput(format!(
                "Transaction {}: amount must be positive, got {}",
                self.id, self.amount
            ))
            .into());
        }
        if self.fees_or_zero() < Decimal::ZERO {
            return Err(ValidationError::InvalidInput(format!(
                "Transaction {}: fees may not be negative",
                self.id
            ))
            .into());
        }
        if self.tax_withheld_or_zero() < Decimal::ZERO {
            return Err(ValidationError::InvalidInput(format!(
                "Transaction {}: tax withheld may not be negative",
                self.id
            ))
            .into());
        }

        match self.transaction_type {
            TransactionType::Buy | TransactionType::Sell => {
                self.security_fields().map(|_| ())
            }
            TransactionType::Dividend => {
                if self.tax_withheld_or_zero() > self.amount {
                    return Err(ValidationError::InvalidInput(format!(
                        "Transaction {}: withheld tax exceeds gross dividend",
                        self.id
                    ))
                    .into());
                }
                Ok(())
            }
            TransactionType::Conversion => {
                let (_, from_currency) = self.conversion_fields()?;
                if from_currency == &self.currency {
                    return Err(ValidationError::InvalidInput(format!(
                        "Transaction {}: conversion between identical currencies",
                        self.id
                    ))
                    .into());
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ccy(code: &str) -> Currency {
        Currency::new(code).unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn type_round_trips_through_str() {
        for t in [
            TransactionType::Buy,
            TransactionType::Sell,
            TransactionType::Dividend,
            TransactionType::Interest,
            TransactionType::Deposit,
            TransactionType::Withdrawal,
            TransactionType::Conversion,
            TransactionType::Fee,
            TransactionType::Tax,
        ] {
            assert_eq!(TransactionType::from_str(t.as_str()).unwrap(), t);
        }
        assert!(TransactionType::from_str("SHORT_SELL").is_err());
    }

    #[test]
    fn buy_requires_security_fields() {
        let mut txn = Transaction::new(
            "p1",
            TransactionType::Buy,
            date(),
            dec!(1000),
            ccy("USD"),
        );
        assert!(txn.validate().is_err());

        txn.ticker = Some("AAPL".to_string());
        txn.quantity = Some(dec!(10));
        txn.price = Some(dec!(100));
        assert!(txn.validate().is_ok());
    }

    #[test]
    fn conversion_rejects_same_currency() {
        let mut txn = Transaction::new(
            "p1",
            TransactionType::Conversion,
            date(),
            dec!(110),
            ccy("USD"),
        );
        txn.conversion_from_amount = Some(dec!(100));
        txn.conversion_from_currency = Some(ccy("USD"));
        assert!(txn.validate().is_err());

        txn.conversion_from_currency = Some(ccy("EUR"));
        assert!(txn.validate().is_ok());
    }

    #[test]
    fn dividend_tax_cannot_exceed_gross() {
        let mut txn = Transaction::new(
            "p1",
            TransactionType::Dividend,
            date(),
            dec!(100),
            ccy("USD"),
        );
        txn.tax_withheld = Some(dec!(130));
        assert!(txn.validate().is_err());

        txn.tax_withheld = Some(dec!(15));
        assert!(txn.validate().is_ok());
    }
}
