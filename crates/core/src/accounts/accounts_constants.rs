//! Canonical account codes.
//!
//! The posting templates and the mark-to-market engine address accounts by
//! these codes; `ensure_initialized` creates the full set for a portfolio.

pub const CASH: &str = "1000";
pub const INVESTMENTS_AT_COST: &str = "1200";
pub const FAIR_VALUE_ADJUSTMENT: &str = "1210";
pub const CURRENCY_EXCHANGE_CLEARING: &str = "1300";
pub const OWNERS_CAPITAL: &str = "3000";
pub const RETAINED_EARNINGS: &str = "3100";
pub const DIVIDEND_INCOME: &str = "4000";
pub const INTEREST_INCOME: &str = "4100";
pub const REALIZED_GAIN_LOSS: &str = "4200";
pub const UNREALIZED_GAIN_LOSS: &str = "4300";
pub const FX_GAIN_LOSS: &str = "4400";
pub const FEES_AND_COMMISSIONS: &str = "5000";
pub const TAX_EXPENSE: &str = "5100";

use super::accounts_model::AccountKind;

/// (code, name, kind) for every canonical account.
pub const CANONICAL_ACCOUNTS: &[(&str, &str, AccountKind)] = &[
    (CASH, "Cash", AccountKind::Asset),
    (INVESTMENTS_AT_COST, "Investments at Cost", AccountKind::Asset),
    (FAIR_VALUE_ADJUSTMENT, "Fair Value Adjustment", AccountKind::Asset),
    (
        CURRENCY_EXCHANGE_CLEARING,
        "Currency Exchange Clearing",
        AccountKind::Asset,
    ),
    (OWNERS_CAPITAL, "Owner's Capital", AccountKind::Equity),
    (RETAINED_EARNINGS, "Retained Earnings", AccountKind::Equity),
    (DIVIDEND_INCOME, "Dividend Income", AccountKind::Revenue),
    (INTEREST_INCOME, "Interest Income", AccountKind::Revenue),
    (REALIZED_GAIN_LOSS, "Realized Gains/Losses", AccountKind::Revenue),
    (UNREALIZED_GAIN_LOSS, "Unrealized Gains/Losses", AccountKind::Revenue),
    (FX_GAIN_LOSS, "Foreign Exchange Gain/Loss", AccountKind::Revenue),
    (FEES_AND_COMMISSIONS, "Fees and Commissions", AccountKind::Expense),
    (TAX_EXPENSE, "Tax Expense", AccountKind::Expense),
];
