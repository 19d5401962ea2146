use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::ledger_model::{
    BalanceSheet, ForeignCashPosition, IncomeStatement, ReportLine, TrialBalance, TrialBalanceRow,
};
use super::ledger_traits::LedgerServiceTrait;
use crate::accounts::{accounts_constants as codes, AccountKind, AccountRepositoryTrait, NormalBalance};
use crate::errors::{Error, Result};
use crate::fx::Currency;
use crate::journal::{JournalRepositoryTrait, LineBasis};

/// Read-side aggregation over posted journal lines.
pub struct LedgerService {
    accounts: Arc<dyn AccountRepositoryTrait>,
    journal: Arc<dyn JournalRepositoryTrait>,
}

impl LedgerService {
    pub fn new(
        accounts: Arc<dyn AccountRepositoryTrait>,
        journal: Arc<dyn JournalRepositoryTrait>,
    ) -> Self {
        Self { accounts, journal }
    }

    /// (debits, credits) for an account over `(from, to]`.
    fn sums(
        &self,
        account_id: &str,
        from: Option<NaiveDate>,
        to: NaiveDate,
    ) -> Result<(Decimal, Decimal)> {
        let lines = self.journal.posted_lines_for_account(account_id, from, to)?;
        let debits = lines.iter().map(|l| l.debit_amount).sum();
        let credits = lines.iter().map(|l| l.credit_amount).sum();
        Ok((debits, credits))
    }
}

impl LedgerServiceTrait for LedgerService {
    fn account_balance(&self, account_id: &str, as_of: NaiveDate) -> Result<Decimal> {
        let account = self.accounts.get_by_id(account_id)?;
        let (debits, credits) = self.sums(account_id, None, as_of)?;
        Ok(match account.normal_balance {
            NormalBalance::Debit => debits - credits,
            NormalBalance::Credit => credits - debits,
        })
    }

    fn debit_balance(&self, account_id: &str, as_of: NaiveDate) -> Result<Decimal> {
        let (debits, credits) = self.sums(account_id, None, as_of)?;
        Ok(debits - credits)
    }

    fn asset_debit_balances(
        &self,
        account_id: &str,
        as_of: NaiveDate,
    ) -> Result<HashMap<String, Decimal>> {
        let lines = self.journal.posted_lines_for_account(account_id, None, as_of)?;
        let mut balances: HashMap<String, Decimal> = HashMap::new();
        for line in lines {
            if let Some(asset_id) = &line.asset_id {
                *balances.entry(asset_id.clone()).or_insert(Decimal::ZERO) +=
                    line.signed_base_amount();
            }
        }
        Ok(balances)
    }

    fn foreign_cash_positions(
        &self,
        portfolio_id: &str,
        as_of: NaiveDate,
    ) -> Result<HashMap<Currency, ForeignCashPosition>> {
        let cash = self
            .accounts
            .find_by_code(portfolio_id, codes::CASH)?
            .ok_or_else(|| Error::AccountNotFound {
                portfolio_id: portfolio_id.to_string(),
                code: codes::CASH.to_string(),
            })?;

        let lines = self.journal.posted_lines_for_account(&cash.id, None, as_of)?;
        let mut positions: HashMap<Currency, ForeignCashPosition> = HashMap::new();

        for line in lines {
            let currency = match &line.basis {
                LineBasis::Foreign { currency, .. } => currency.clone(),
                LineBasis::BaseOnly => continue,
            };
            let position = positions
                .entry(currency.clone())
                .or_insert_with(|| ForeignCashPosition {
                    currency,
                    net_foreign: Decimal::ZERO,
                    book_base: Decimal::ZERO,
                });
            position.net_foreign += line.signed_foreign_amount();
            position.book_base += line.signed_base_amount();
        }

        Ok(positions)
    }

    fn trial_balance(&self, portfolio_id: &str, as_of: NaiveDate) -> Result<TrialBalance> {
        let accounts = self.accounts.list_for_portfolio(portfolio_id)?;
        let mut rows = Vec::new();
        let mut total_debits = Decimal::ZERO;
        let mut total_credits = Decimal::ZERO;

        for account in accounts {
            let (debits, credits) = self.sums(&account.id, None, as_of)?;
            if debits.is_zero() && credits.is_zero() {
                continue;
            }
            total_debits += debits;
            total_credits += credits;
            let balance = match account.normal_balance {
                NormalBalance::Debit => debits - credits,
                NormalBalance::Credit => credits - debits,
            };
            rows.push(TrialBalanceRow {
                account_code: account.code,
                account_name: account.name,
                kind: account.kind,
                normal_balance: account.normal_balance,
                debits,
                credits,
                balance,
            });
        }
        rows.sort_by(|a, b| a.account_code.cmp(&b.account_code));

        Ok(TrialBalance {
            portfolio_id: portfolio_id.to_string(),
            as_of,
            rows,
            total_debits,
            total_credits,
        })
    }

    fn balance_sheet(&self, portfolio_id: &str, as_of: NaiveDate) -> Result<BalanceSheet> {
        let accounts = self.accounts.list_for_portfolio(portfolio_id)?;

        let mut assets = Vec::new();
        let mut liabilities = Vec::new();
        let mut equity = Vec::new();
        let mut total_assets = Decimal::ZERO;
        let mut total_liabilities = Decimal::ZERO;
        let mut total_equity = Decimal::ZERO;
        let mut net_income = Decimal::ZERO;

        for account in &accounts {
            let (debits, credits) = self.sums(&account.id, None, as_of)?;
            if debits.is_zero() && credits.is_zero() {
                continue;
            }
            let balance = match account.normal_balance {
                NormalBalance::Debit => debits - credits,
                NormalBalance::Credit => credits - debits,
            };
            let line = ReportLine::new(&account.code, &account.name, balance);
            match account.kind {
                AccountKind::Asset => {
                    total_assets += balance;
                    assets.push(line);
                }
                AccountKind::Liability => {
                    total_liabilities += balance;
                    liabilities.push(line);
                }
                AccountKind::Equity => {
                    total_equity += balance;
                    equity.push(line);
                }
                AccountKind::Revenue => net_income += balance,
                AccountKind::Expense => net_income -= balance,
            }
        }

        let assets = assets
            .into_iter()
            .map(|l| l.with_weight(total_assets))
            .collect();

        Ok(BalanceSheet {
            portfolio_id: portfolio_id.to_string(),
            as_of,
            assets,
            liabilities,
            equity,
            total_assets,
            total_liabilities,
            total_equity,
            net_income,
        })
    }

    fn income_statement(
        &self,
        portfolio_id: &str,
        from: Option<NaiveDate>,
        to: NaiveDate,
    ) -> Result<IncomeStatement> {
        let accounts = self.accounts.list_for_portfolio(portfolio_id)?;

        let mut revenue = Vec::new();
        let mut expenses = Vec::new();
        let mut total_revenue = Decimal::ZERO;
        let mut total_expenses = Decimal::ZERO;

        for account in &accounts {
            let (debits, credits) = self.sums(&account.id, from, to)?;
            if debits.is_zero() && credits.is_zero() {
                continue;
            }
            match account.kind {
                AccountKind::Revenue => {
                    let amount = credits - debits;
                    total_revenue += amount;
                    revenue.push(ReportLine::new(&account.code, &account.name, amount));
                }
                AccountKind::Expense => {
                    let amount = debits - credits;
                    total_expenses += amount;
                    expenses.push(ReportLine::new(&account.code, &account.name, amount));
                }
                _ => {}
            }
        }

        Ok(IncomeStatement {
            portfolio_id: portfolio_id.to_string(),
            from,
            to,
            revenue,
            expenses,
            total_revenue,
            total_expenses,
            net_income: total_revenue - total_expenses,
        })
    }
}
