//! Ledger query layer - trial balance, balances, statements.

mod ledger_model;
mod ledger_service;
mod ledger_traits;

#[cfg(test)]
mod ledger_service_tests;

pub use ledger_model::{
    BalanceSheet, ForeignCashPosition, IncomeStatement, ReportLine, TrialBalance, TrialBalanceRow,
};
pub use ledger_service::LedgerService;
pub use ledger_traits::LedgerServiceTrait;
