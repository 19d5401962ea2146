use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::ledger_model::{BalanceSheet, ForeignCashPosition, IncomeStatement, TrialBalance};
use crate::errors::Result;
use crate::fx::Currency;

/// Trait defining the contract for read-side ledger queries.
///
/// Every query reflects `Posted` entries only.
pub trait LedgerServiceTrait: Send + Sync {
    /// Balance on the account's normal side as of a date.
    fn account_balance(&self, account_id: &str, as_of: NaiveDate) -> Result<Decimal>;

    /// Raw debit-signed balance (debits minus credits) as of a date.
    fn debit_balance(&self, account_id: &str, as_of: NaiveDate) -> Result<Decimal>;

    /// Debit-signed balance per asset for lines carrying an asset tag.
    /// Lets the mark-to-market engine diff the fair-value adjustment per
    /// security without per-security sub-accounts.
    fn asset_debit_balances(
        &self,
        account_id: &str,
        as_of: NaiveDate,
    ) -> Result<HashMap<String, Decimal>>;

    /// Net foreign units and cumulative book base value for each foreign
    /// currency with cash activity.
    fn foreign_cash_positions(
        &self,
        portfolio_id: &str,
        as_of: NaiveDate,
    ) -> Result<HashMap<Currency, ForeignCashPosition>>;

    fn trial_balance(&self, portfolio_id: &str, as_of: NaiveDate) -> Result<TrialBalance>;

    fn balance_sheet(&self, portfolio_id: &str, as_of: NaiveDate) -> Result<BalanceSheet>;

    fn income_statement(
        &self,
        portfolio_id: &str,
        from: Option<NaiveDate>,
        to: NaiveDate,
    ) -> Result<IncomeStatement>;
}
