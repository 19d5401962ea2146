//! Read-side report models.

use chrono::NaiveDate;
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::accounts::{AccountKind, NormalBalance};
use crate::fx::Currency;

/// One account row in a trial balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialBalanceRow {
    pub account_code: String,
    pub account_name: String,
    pub kind: AccountKind,
    pub normal_balance: NormalBalance,
    pub debits: Decimal,
    pub credits: Decimal,
    /// Balance on the account's normal side.
    pub balance: Decimal,
}

/// Trial balance over `Posted` entries as of a date.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialBalance {
    pub portfolio_id: String,
    pub as_of: NaiveDate,
    pub rows: Vec<TrialBalanceRow>,
    pub total_debits: Decimal,
    pub total_credits: Decimal,
}

impl TrialBalance {
    pub fn is_balanced(&self) -> bool {
        self.total_debits == self.total_credits
    }
}

/// One line of a balance sheet or income statement section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportLine {
    pub account_code: String,
    pub account_name: String,
    pub amount: Decimal,
    /// Share of the section total, for display.
    pub weight_pct: Option<f64>,
}

impl ReportLine {
    pub fn new(code: &str, name: &str, amount: Decimal) -> Self {
        Self {
            account_code: code.to_string(),
            account_name: name.to_string(),
            amount,
            weight_pct: None,
        }
    }

    pub fn with_weight(mut self, total: Decimal) -> Self {
        if !total.is_zero() {
            self.weight_pct = (self.amount * Decimal::ONE_HUNDRED / total).to_f64();
        }
        self
    }
}

/// Balance sheet as of a date. Income-statement accounts are not closed,
/// so the current-period result appears as `net_income` on the equity
/// side of the equation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSheet {
    pub portfolio_id: String,
    pub as_of: NaiveDate,
    pub assets: Vec<ReportLine>,
    pub liabilities: Vec<ReportLine>,
    pub equity: Vec<ReportLine>,
    pub total_assets: Decimal,
    pub total_liabilities: Decimal,
    pub total_equity: Decimal,
    pub net_income: Decimal,
}

impl BalanceSheet {
    /// Assets minus (liabilities + equity + net income); zero when the
    /// ledger is consistent.
    pub fn equation_gap(&self) -> Decimal {
        self.total_assets - (self.total_liabilities + self.total_equity + self.net_income)
    }
}

/// Income statement over a period.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeStatement {
    pub portfolio_id: String,
    pub from: Option<NaiveDate>,
    pub to: NaiveDate,
    pub revenue: Vec<ReportLine>,
    pub expenses: Vec<ReportLine>,
    pub total_revenue: Decimal,
    pub total_expenses: Decimal,
    pub net_income: Decimal,
}

/// Net position and book value of one foreign-currency cash holding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignCashPosition {
    pub currency: Currency,
    /// Net units of the foreign currency held, from signed cash lines.
    pub net_foreign: Decimal,
    /// Cumulative base-currency value recorded for those lines, including
    /// prior revaluation adjustments.
    pub book_base: Decimal,
}
