//! Journal entry and line domain models.
//!
//! A journal entry is a header plus an ordered set of lines whose debits
//! and credits must net to zero in the portfolio's base currency. Balance
//! is verified at assembly time and again by the store, so an unbalanced
//! entry can never reach `Posted`.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::journal_errors::JournalError;
use crate::fx::Currency;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryType {
    /// Posting of an imported brokerage transaction.
    Transaction,
    /// Mark-to-market or other system adjustment.
    Adjustment,
    /// Period-end closing entry.
    Closing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryStatus {
    Draft,
    Posted,
    Reversed,
}

/// Who created an entry. Adjustment entries are always [`Actor::System`];
/// audit queries can tell automated postings from manual ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Actor {
    System,
    User(String),
}

/// Currency basis of a line's amounts.
///
/// A pure base-currency line has no foreign leg at all; a foreign line
/// keeps the original amount, its currency, and the exchange rate that
/// produced the base amount, even when that rate is 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineBasis {
    BaseOnly,
    Foreign {
        amount: Decimal,
        currency: Currency,
        rate: Decimal,
    },
}

/// One debit or credit against an account.
///
/// Exactly one of `debit_amount`/`credit_amount` is non-zero; both are in
/// the entry's base currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalLine {
    pub id: String,
    pub entry_id: String,
    pub line_number: u32,
    pub account_id: String,
    pub debit_amount: Decimal,
    pub credit_amount: Decimal,
    /// Base currency of the amounts above.
    pub currency: Currency,
    pub basis: LineBasis,
    /// Security this line is scoped to, when any (investments, fair-value
    /// adjustment, realized/unrealized gain lines).
    pub asset_id: Option<String>,
    pub description: Option<String>,
}

impl JournalLine {
    pub fn debit(account_id: &str, amount: Decimal, currency: Currency) -> Self {
        Self::new(account_id, amount, Decimal::ZERO, currency)
    }

    pub fn credit(account_id: &str, amount: Decimal, currency: Currency) -> Self {
        Self::new(account_id, Decimal::ZERO, amount, currency)
    }

    fn new(account_id: &str, debit: Decimal, credit: Decimal, currency: Currency) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            entry_id: String::new(),
            line_number: 0,
            account_id: account_id.to_string(),
            debit_amount: debit,
            credit_amount: credit,
            currency,
            basis: LineBasis::BaseOnly,
            asset_id: None,
            description: None,
        }
    }

    pub fn with_basis(mut self, basis: LineBasis) -> Self {
        self.basis = basis;
        self
    }

    pub fn with_asset(mut self, asset_id: &str) -> Self {
        self.asset_id = Some(asset_id.to_string());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// The line amount regardless of side, always non-negative.
    pub fn amount(&self) -> Decimal {
        if self.debit_amount > Decimal::ZERO {
            self.debit_amount
        } else {
            self.credit_amount
        }
    }

    pub fn is_debit(&self) -> bool {
        self.debit_amount > Decimal::ZERO
    }

    /// Signed base amount: debits positive, credits negative.
    pub fn signed_base_amount(&self) -> Decimal {
        self.debit_amount - self.credit_amount
    }

    /// Signed foreign amount for foreign-basis lines, zero otherwise.
    pub fn signed_foreign_amount(&self) -> Decimal {
        match &self.basis {
            LineBasis::Foreign { amount, .. } => {
                if self.is_debit() {
                    *amount
                } else {
                    -*amount
                }
            }
            LineBasis::BaseOnly => Decimal::ZERO,
        }
    }

    fn validate(&self) -> Result<(), JournalError> {
        if self.debit_amount < Decimal::ZERO || self.credit_amount < Decimal::ZERO {
            return Err(JournalError::InvalidLine(format!(
                "Line on account {} has a negative amount",
                self.account_id
            )));
        }
        let debit_set = self.debit_amount > Decimal::ZERO;
        let credit_set = self.credit_amount > Decimal::ZERO;
        if debit_set == credit_set {
            return Err(JournalError::InvalidLine(format!(
                "Line on account {} must have exactly one of debit/credit set (DR={}, CR={})",
                self.account_id, self.debit_amount, self.credit_amount
            )));
        }
        Ok(())
    }
}

/// Journal entry header owning its lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: String,
    pub portfolio_id: String,
    /// Monotonically increasing per portfolio; claimed from the store's
    /// sequence under the portfolio posting lock.
    pub entry_number: i64,
    pub entry_date: NaiveDate,
    pub posting_date: Option<NaiveDate>,
    pub entry_type: EntryType,
    pub status: EntryStatus,
    pub description: String,
    /// Source transaction id for TRANSACTION entries.
    pub reference: Option<String>,
    pub created_by: Actor,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<JournalLine>,
}

impl JournalEntry {
    /// Assembles a complete, validated entry from prepared lines.
    ///
    /// Line numbers and the owning entry id are assigned here; an entry
    /// with fewer than two lines, an invalid line, or unbalanced totals
    /// never comes into existence.
    #[allow(clippy::too_many_arguments)]
    pub fn assemble(
        portfolio_id: &str,
        entry_number: i64,
        entry_date: NaiveDate,
        entry_type: EntryType,
        description: &str,
        reference: Option<String>,
        created_by: Actor,
        mut lines: Vec<JournalLine>,
    ) -> Result<JournalEntry, JournalError> {
        if lines.len() < 2 {
            return Err(JournalError::InvalidLine(format!(
                "Entry '{}' needs at least two lines, got {}",
                description,
                lines.len()
            )));
        }

        let entry_id = Uuid::new_v4().to_string();
        for (index, line) in lines.iter_mut().enumerate() {
            line.validate()?;
            line.entry_id = entry_id.clone();
            line.line_number = (index + 1) as u32;
        }

        let entry = JournalEntry {
            id: entry_id,
            portfolio_id: portfolio_id.to_string(),
            entry_number,
            entry_date,
            posting_date: Some(entry_date),
            entry_type,
            status: EntryStatus::Posted,
            description: description.to_string(),
            reference,
            created_by,
            created_at: Utc::now(),
            lines,
        };
        entry.ensure_balanced()?;
        Ok(entry)
    }

    pub fn total_debits(&self) -> Decimal {
        self.lines.iter().map(|l| l.debit_amount).sum()
    }

    pub fn total_credits(&self) -> Decimal {
        self.lines.iter().map(|l| l.credit_amount).sum()
    }

    pub fn is_balanced(&self) -> bool {
        self.total_debits() == self.total_credits()
    }

    pub fn ensure_balanced(&self) -> Result<(), JournalError> {
        if !self.is_balanced() {
            return Err(JournalError::Unbalanced {
                entry_number: self.entry_number,
                debits: self.total_debits(),
                credits: self.total_credits(),
            });
        }
        Ok(())
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
        NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()
    }

    #[test]
    fn assemble_assigns_line_numbers_and_balances() {
        let entry = JournalEntry::assemble(
            "p1",
            7,
            date(),
            EntryType::Transaction,
            "test entry",
            None,
            Actor::System,
            vec![
                JournalLine::debit("a1", dec!(100), ccy("EUR")),
                JournalLine::credit("a2", dec!(100), ccy("EUR")),
            ],
        )
        .unwrap();

        assert_eq!(entry.entry_number, 7);
        assert_eq!(entry.status, EntryStatus::Posted);
        assert_eq!(entry.lines[0].line_number, 1);
        assert_eq!(entry.lines[1].line_number, 2);
        assert!(entry.lines.iter().all(|l| l.entry_id == entry.id));
        assert!(entry.is_balanced());
    }

    #[test]
    fn unbalanced_entry_never_assembles() {
        let result = JournalEntry::assemble(
            "p1",
            1,
            date(),
            EntryType::Transaction,
            "bad entry",
            None,
            Actor::System,
            vec![
                JournalLine::debit("a1", dec!(100), ccy("EUR")),
                JournalLine::credit("a2", dec!(99.99), ccy("EUR")),
            ],
        );
        assert!(matches!(result, Err(JournalError::Unbalanced { .. })));
    }

    #[test]
    fn line_with_both_sides_is_rejected() {
        let mut line = JournalLine::debit("a1", dec!(10), ccy("EUR"));
        line.credit_amount = dec!(10);
        let result = JournalEntry::assemble(
            "p1",
            1,
            date(),
            EntryType::Transaction,
            "bad line",
            None,
            Actor::System,
            vec![line, JournalLine::credit("a2", dec!(10), ccy("EUR"))],
        );
        assert!(matches!(result, Err(JournalError::InvalidLine(_))));
    }

    #[test]
    fn single_line_entry_is_rejected() {
        let result = JournalEntry::assemble(
            "p1",
            1,
            date(),
            EntryType::Transaction,
            "lonely",
            None,
            Actor::System,
            vec![JournalLine::debit("a1", dec!(10), ccy("EUR"))],
        );
        assert!(matches!(result, Err(JournalError::InvalidLine(_))));
    }

    #[test]
    fn signed_foreign_amount_follows_side() {
        let basis = LineBasis::Foreign {
            amount: dec!(110),
            currency: ccy("USD"),
            rate: dec!(0.9),
        };
        let debit = JournalLine::debit("a1", dec!(99), ccy("EUR")).with_basis(basis.clone());
        let credit = JournalLine::credit("a1", dec!(99), ccy("EUR")).with_basis(basis);

        assert_eq!(debit.signed_foreign_amount(), dec!(110));
        assert_eq!(credit.signed_foreign_amount(), dec!(-110));
    }
}
