//! Chart of accounts domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::fx::Currency;

/// Standard account types following the accounting equation.
///
/// Assets = Liabilities + Equity + (Revenue - Expenses)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountKind {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

impl AccountKind {
    /// The side on which this kind of account normally carries a balance.
    pub fn normal_balance(&self) -> NormalBalance {
        match self {
            AccountKind::Asset | AccountKind::Expense => NormalBalance::Debit,
            AccountKind::Liability | AccountKind::Equity | AccountKind::Revenue => {
                NormalBalance::Credit
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Asset => "ASSET",
            AccountKind::Liability => "LIABILITY",
            AccountKind::Equity => "EQUITY",
            AccountKind::Revenue => "REVENUE",
            AccountKind::Expense => "EXPENSE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NormalBalance {
    Debit,
    Credit,
}

/// One entry in a portfolio's chart of accounts.
///
/// Codes are stable short identifiers ("1000") and unique per portfolio;
/// every posting must reference an account that already exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartAccount {
    pub id: String,
    pub portfolio_id: String,
    pub code: String,
    pub name: String,
    pub kind: AccountKind,
    pub normal_balance: NormalBalance,
    pub currency: Currency,
    /// System accounts are created by `ensure_initialized` and cannot be
    /// removed.
    pub is_system: bool,
    pub created_at: DateTime<Utc>,
}

impl ChartAccount {
    pub fn new(
        portfolio_id: &str,
        code: &str,
        name: &str,
        kind: AccountKind,
        currency: Currency,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            portfolio_id: portfolio_id.to_string(),
            code: code.to_string(),
            name: name.to_string(),
            kind,
            normal_balance: kind.normal_balance(),
            currency,
            is_system: true,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_balance_follows_kind() {
        assert_eq!(AccountKind::Asset.normal_balance(), NormalBalance::Debit);
        assert_eq!(AccountKind::Expense.normal_balance(), NormalBalance::Debit);
        assert_eq!(AccountKind::Liability.normal_balance(), NormalBalance::Credit);
        assert_eq!(AccountKind::Equity.normal_balance(), NormalBalance::Credit);
        assert_eq!(AccountKind::Revenue.normal_balance(), NormalBalance::Credit);
    }
}
