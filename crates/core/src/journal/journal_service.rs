use std::sync::Arc;

use log::debug;
use rust_decimal::Decimal;

use super::journal_errors::JournalError;
use super::journal_model::{EntryType, JournalEntry, JournalLine, LineBasis};
use super::journal_traits::{JournalRepositoryTrait, JournalServiceTrait, PostingOptions};
use crate::accounts::{accounts_constants as codes, AccountServiceTrait};
use crate::errors::{Error, Result};
use crate::fx::{round_to_minor_units, Currency, FxServiceTrait};
use crate::lots::LotServiceTrait;
use crate::portfolio::PortfolioRepositoryTrait;
use crate::transactions::{Transaction, TransactionType};

/// The journal engine: maps one validated transaction into one balanced
/// journal entry using a fixed posting template per transaction type.
///
/// Every foreign amount is converted at the transaction's own date and the
/// original amount, currency, and rate stay on the line. SELL templates
/// take their cost basis from the lot tracker's FIFO plan; the engine
/// never guesses cost basis itself.
pub struct JournalService {
    accounts: Arc<dyn AccountServiceTrait>,
    fx: Arc<dyn FxServiceTrait>,
    lots: Arc<dyn LotServiceTrait>,
    repository: Arc<dyn JournalRepositoryTrait>,
    portfolios: Arc<dyn PortfolioRepositoryTrait>,
}

/// Amounts for one leg of a template, pre-converted to base currency.
struct Leg {
    base: Decimal,
    basis: LineBasis,
}

impl JournalService {
    pub fn new(
        accounts: Arc<dyn AccountServiceTrait>,
        fx: Arc<dyn FxServiceTrait>,
        lots: Arc<dyn LotServiceTrait>,
        repository: Arc<dyn JournalRepositoryTrait>,
        portfolios: Arc<dyn PortfolioRepositoryTrait>,
    ) -> Self {
        Self {
            accounts,
            fx,
            lots,
            repository,
            portfolios,
        }
    }

    /// Converts a foreign amount to a rounded base amount plus the line
    /// basis that records where it came from.
    fn leg(
        &self,
        amount: Decimal,
        currency: &Currency,
        rate: Decimal,
        base: &Currency,
    ) -> Leg {
        let basis = if currency == base {
            LineBasis::BaseOnly
        } else {
            LineBasis::Foreign {
                amount,
                currency: currency.clone(),
                rate,
            }
        };
        Leg {
            base: round_to_minor_units(amount * rate, base),
            basis,
        }
    }

    fn account_id(&self, portfolio_id: &str, code: &str) -> Result<String> {
        Ok(self.accounts.resolve(portfolio_id, code)?.id)
    }

    /// Builds the template lines for a transaction. Returns the lines plus
    /// a deferred lot action to run after the entry is persisted.
    fn build_lines(
        &self,
        txn: &Transaction,
        base: &Currency,
        rate: Decimal,
        options: &PostingOptions,
    ) -> Result<(Vec<JournalLine>, LotAction)> {
        let pid = &txn.portfolio_id;
        let cash = self.account_id(pid, codes::CASH)?;
        let mut lines = Vec::new();
        let mut lot_action = LotAction::None;

        match txn.transaction_type {
            TransactionType::Buy => {
                let (ticker, quantity, price) = txn.security_fields()?;
                let investments = self.account_id(pid, codes::INVESTMENTS_AT_COST)?;
                let gross = quantity * price + txn.fees_or_zero();
                let leg = self.leg(gross, &txn.currency, rate, base);

                lines.push(
                    JournalLine::debit(&investments, leg.base, base.clone())
                        .with_basis(leg.basis.clone())
                        .with_asset(ticker)
                        .with_description(&format!("Buy {} shares of {}", quantity, ticker)),
                );
                lines.push(
                    JournalLine::credit(&cash, leg.base, base.clone())
                        .with_basis(leg.basis)
                        .with_description("Cash payment for purchase"),
                );
                lot_action = LotAction::Open {
                    total_cost_base: leg.base,
                    rate,
                };
            }

            TransactionType::Sell => {
                let (ticker, quantity, price) = txn.security_fields()?;
                let investments = self.account_id(pid, codes::INVESTMENTS_AT_COST)?;
                let realized = self.account_id(pid, codes::REALIZED_GAIN_LOSS)?;

                let net = quantity * price - txn.fees_or_zero();
                if net <= Decimal::ZERO {
                    return Err(JournalError::InvalidTransaction {
                        transaction_id: txn.id.clone(),
                        reason: format!("sale proceeds are not positive ({})", net),
                    }
                    .into());
                }
                let leg = self.leg(net, &txn.currency, rate, base);

                let plan = self.lots.plan_fifo(
                    pid,
                    ticker,
                    quantity,
                    base,
                    options.allow_negative_holding,
                )?;
                let cost_basis = plan.total_cost_basis_base;
                let gain = leg.base - cost_basis;

                lines.push(
                    JournalLine::debit(&cash, leg.base, base.clone())
                        .with_basis(leg.basis)
                        .with_description(&format!(
                            "Proceeds from sale of {} shares of {}",
                            quantity, ticker
                        )),
                );
                if cost_basis > Decimal::ZERO {
                    lines.push(
                        JournalLine::credit(&investments, cost_basis, base.clone())
                            .with_asset(ticker)
                            .with_description("Release cost basis of sold lots"),
                    );
                }
                if gain > Decimal::ZERO {
                    lines.push(
                        JournalLine::credit(&realized, gain, base.clone())
                            .with_asset(ticker)
                            .with_description("Realized gain on sale"),
                    );
                } else if gain < Decimal::ZERO {
                    lines.push(
                        JournalLine::debit(&realized, -gain, base.clone())
                            .with_asset(ticker)
                            .with_description("Realized loss on sale"),
                    );
                }
                lot_action = LotAction::Commit {
                    plan,
                    proceeds_base: leg.base,
                };
            }

            TransactionType::Dividend => {
                let income = self.account_id(pid, codes::DIVIDEND_INCOME)?;
                let gross_leg = self.leg(txn.amount, &txn.currency, rate, base);
                let tax_foreign = txn.tax_withheld_or_zero();
                let tax_leg = self.leg(tax_foreign, &txn.currency, rate, base);
                // Net derived from the rounded legs so the entry stays exact.
                let net_base = gross_leg.base - tax_leg.base;
                let net_leg = self.leg(txn.amount - tax_foreign, &txn.currency, rate, base);

                // A fully withheld dividend leaves no cash leg.
                if net_base > Decimal::ZERO {
                    lines.push(
                        JournalLine::debit(&cash, net_base, base.clone())
                            .with_basis(net_leg.basis)
                            .with_description("Dividend received (net of tax)"),
                    );
                }

                if tax_leg.base > Decimal::ZERO {
                    let taxes = self.account_id(pid, codes::TAX_EXPENSE)?;
                    lines.push(
                        JournalLine::debit(&taxes, tax_leg.base, base.clone())
                            .with_basis(tax_leg.basis)
                            .with_description("Withholding tax on dividend"),
                    );
                }

                let mut income_line = JournalLine::credit(&income, gross_leg.base, base.clone())
                    .with_basis(gross_leg.basis)
                    .with_description("Dividend income (gross)");
                if let Some(ticker) = txn.ticker.as_deref() {
                    income_line = income_line.with_asset(ticker);
                }
                lines.push(income_line);
            }

            TransactionType::Interest => {
                let income = self.account_id(pid, codes::INTEREST_INCOME)?;
                let leg = self.leg(txn.amount, &txn.currency, rate, base);
                lines.push(
                    JournalLine::debit(&cash, leg.base, base.clone())
                        .with_basis(leg.basis.clone())
                        .with_description("Interest received"),
                );
                lines.push(
                    JournalLine::credit(&income, leg.base, base.clone())
                        .with_basis(leg.basis)
                        .with_description("Interest income"),
                );
            }

            TransactionType::Deposit => {
                let capital = self.account_id(pid, codes::OWNERS_CAPITAL)?;
                let leg = self.leg(txn.amount, &txn.currency, rate, base);
                lines.push(
                    JournalLine::debit(&cash, leg.base, base.clone())
                        .with_basis(leg.basis.clone())
                        .with_description("Deposit to account"),
                );
                lines.push(
                    JournalLine::credit(&capital, leg.base, base.clone())
                        .with_basis(leg.basis)
                        .with_description("Capital contribution"),
                );
            }

            TransactionType::Withdrawal => {
                let capital = self.account_id(pid, codes::OWNERS_CAPITAL)?;
                let leg = self.leg(txn.amount, &txn.currency, rate, base);
                lines.push(
                    JournalLine::debit(&capital, leg.base, base.clone())
                        .with_basis(leg.basis.clone())
                        .with_description("Withdrawal from account"),
                );
                lines.push(
                    JournalLine::credit(&cash, leg.base, base.clone())
                        .with_basis(leg.basis)
                        .with_description("Cash withdrawal"),
                );
            }

            TransactionType::Fee => {
                let fees = self.account_id(pid, codes::FEES_AND_COMMISSIONS)?;
                let leg = self.leg(txn.amount, &txn.currency, rate, base);
                lines.push(
                    JournalLine::debit(&fees, leg.base, base.clone())
                        .with_basis(leg.basis.clone())
                        .with_description("Fee charged"),
                );
                lines.push(
                    JournalLine::credit(&cash, leg.base, base.clone())
                        .with_basis(leg.basis)
                        .with_description("Cash payment for fee"),
                );
            }

            TransactionType::Tax => {
                let taxes = self.account_id(pid, codes::TAX_EXPENSE)?;
                let leg = self.leg(txn.amount, &txn.currency, rate, base);
                lines.push(
                    JournalLine::debit(&taxes, leg.base, base.clone())
                        .with_basis(leg.basis.clone())
                        .with_description("Tax payment"),
                );
                lines.push(
                    JournalLine::credit(&cash, leg.base, base.clone())
                        .with_basis(leg.basis)
                        .with_description("Cash payment for tax"),
                );
            }

            TransactionType::Conversion => {
                let clearing = self.account_id(pid, codes::CURRENCY_EXCHANGE_CLEARING)?;
                let (from_amount, from_currency) = txn.conversion_fields()?;
                let from_rate = self.fx.get_rate_for_date(from_currency, base, txn.date)?;

                let target = self.leg(txn.amount, &txn.currency, rate, base);
                let source = self.leg(from_amount, from_currency, from_rate, base);

                lines.push(
                    JournalLine::debit(&cash, target.base, base.clone())
                        .with_basis(target.basis)
                        .with_description(&format!("Receive {} {}", txn.amount, txn.currency)),
                );
                lines.push(
                    JournalLine::credit(&cash, source.base, base.clone())
                        .with_basis(source.basis)
                        .with_description(&format!("Deliver {} {}", from_amount, from_currency)),
                );

                // Both legs are converted independently; the spread between
                // them parks in the clearing account until the currency
                // revaluation sweeps it into FX gain/loss.
                let residual = source.base - target.base;
                if residual > Decimal::ZERO {
                    lines.push(
                        JournalLine::debit(&clearing, residual, base.clone())
                            .with_description("Conversion spread"),
                    );
                } else if residual < Decimal::ZERO {
                    lines.push(
                        JournalLine::credit(&clearing, -residual, base.clone())
                            .with_description("Conversion spread"),
                    );
                }
            }
        }

        Ok((lines, lot_action))
    }
}

/// Lot work deferred until the journal entry is safely persisted.
enum LotAction {
    None,
    Open {
        total_cost_base: Decimal,
        rate: Decimal,
    },
    Commit {
        plan: crate::lots::AllocationPlan,
        proceeds_base: Decimal,
    },
}

impl JournalServiceTrait for JournalService {
    fn post_transaction(&self, transaction: &Transaction) -> Result<JournalEntry> {
        self.post_transaction_with_options(transaction, PostingOptions::default())
    }

    fn post_transaction_with_options(
        &self,
        txn: &Transaction,
        options: PostingOptions,
    ) -> Result<JournalEntry> {
        txn.validate()?;

        let portfolio = self.portfolios.get_by_id(&txn.portfolio_id)?;
        let base = portfolio.base_currency;
        let rate = self.fx.get_rate_for_date(&txn.currency, &base, txn.date)?;

        // Single writer per portfolio: template evaluation reads lot state,
        // and the entry number claim + persist must not interleave.
        let lock = self.repository.posting_lock(&txn.portfolio_id);
        let _guard = lock
            .lock()
            .map_err(|e| Error::Unexpected(format!("posting lock poisoned: {}", e)))?;

        let (lines, lot_action) = self.build_lines(txn, &base, rate, &options)?;

        let entry_number = self.repository.next_entry_number(&txn.portfolio_id)?;
        let description = match (txn.ticker.as_deref(), txn.notes.as_deref()) {
            (_, Some(notes)) => format!("{}: {}", txn.transaction_type.as_str(), notes),
            (Some(ticker), None) => format!("{}: {}", txn.transaction_type.as_str(), ticker),
            (None, None) => txn.transaction_type.as_str().to_string(),
        };
        let entry = JournalEntry::assemble(
            &txn.portfolio_id,
            entry_number,
            txn.date,
            EntryType::Transaction,
            &description,
            Some(txn.id.clone()),
            options.actor,
            lines,
        )?;

        let entry = self.repository.insert_entry(entry)?;
        debug!(
            "Posted entry #{} for transaction {} ({})",
            entry.entry_number,
            txn.id,
            txn.transaction_type.as_str()
        );

        match lot_action {
            LotAction::None => {}
            LotAction::Open {
                total_cost_base,
                rate,
            } => {
                self.lots.open_lot(txn, total_cost_base, rate)?;
            }
            LotAction::Commit {
                plan,
                proceeds_base,
            } => {
                self.lots
                    .commit_plan(&plan, &txn.id, proceeds_base, &base)?;
            }
        }

        Ok(entry)
    }
}
