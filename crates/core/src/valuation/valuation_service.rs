use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, info, warn};
use rust_decimal::Decimal;

use super::valuation_errors::ValuationError;
use super::valuation_model::{RevaluationRun, RunPhase, SecurityValuation};
use super::valuation_traits::ValuationServiceTrait;
use crate::accounts::{accounts_constants as codes, AccountServiceTrait};
use crate::constants::{MATERIALITY_THRESHOLD, PRICE_FETCH_CONCURRENCY};
use crate::errors::{Error, Result};
use crate::fx::{round_to_minor_units, Currency, FxServiceTrait};
use crate::journal::{
    Actor, EntryType, JournalEntry, JournalLine, JournalRepositoryTrait, LineBasis,
};
use crate::ledger::LedgerServiceTrait;
use crate::lots::{LotRepositoryTrait, SecurityLot};
use crate::portfolio::PortfolioRepositoryTrait;
use ledgerfolio_market_data::{fetch_quotes, MarketDataProvider};

/// Mark-to-market engine.
///
/// Both procedures share one pattern: compute the target valuation, diff
/// it against what has already been posted, and post only the delta as a
/// single ADJUSTMENT entry. Prices are prefetched before the portfolio
/// lock is taken; only the diff-and-post phase runs under it.
pub struct ValuationService {
    accounts: Arc<dyn AccountServiceTrait>,
    fx: Arc<dyn FxServiceTrait>,
    journal: Arc<dyn JournalRepositoryTrait>,
    lots: Arc<dyn LotRepositoryTrait>,
    ledger: Arc<dyn LedgerServiceTrait>,
    portfolios: Arc<dyn PortfolioRepositoryTrait>,
    market_data: Arc<dyn MarketDataProvider>,
}

impl ValuationService {
    pub fn new(
        accounts: Arc<dyn AccountServiceTrait>,
        fx: Arc<dyn FxServiceTrait>,
        journal: Arc<dyn JournalRepositoryTrait>,
        lots: Arc<dyn LotRepositoryTrait>,
        ledger: Arc<dyn LedgerServiceTrait>,
        portfolios: Arc<dyn PortfolioRepositoryTrait>,
        market_data: Arc<dyn MarketDataProvider>,
    ) -> Self {
        Self {
            accounts,
            fx,
            journal,
            lots,
            ledger,
            portfolios,
            market_data,
        }
    }

    fn materiality() -> Decimal {
        // The constant is a valid literal; parsing cannot fail.
        Decimal::from_str(MATERIALITY_THRESHOLD).unwrap_or(Decimal::ZERO)
    }

    fn post_adjustment(
        &self,
        portfolio_id: &str,
        as_of: NaiveDate,
        description: &str,
        lines: Vec<JournalLine>,
    ) -> Result<JournalEntry> {
        let entry_number = self.journal.next_entry_number(portfolio_id)?;
        let entry = JournalEntry::assemble(
            portfolio_id,
            entry_number,
            as_of,
            EntryType::Adjustment,
            description,
            None,
            Actor::System,
            lines,
        )?;
        self.journal.insert_entry(entry)
    }
}

#[async_trait]
impl ValuationServiceTrait for ValuationService {
    async fn revalue_securities(
        &self,
        portfolio_id: &str,
        as_of: NaiveDate,
    ) -> Result<Option<JournalEntry>> {
        let mut run = RevaluationRun::new(portfolio_id, as_of);
        run.advance(RunPhase::Computing);

        let portfolio = self.portfolios.get_by_id(portfolio_id)?;
        let base = portfolio.base_currency;
        let fva = self
            .accounts
            .resolve(portfolio_id, codes::FAIR_VALUE_ADJUSTMENT)?;
        let unrealized = self
            .accounts
            .resolve(portfolio_id, codes::UNREALIZED_GAIN_LOSS)?;

        let mut lots_by_ticker: BTreeMap<String, Vec<SecurityLot>> = BTreeMap::new();
        for lot in self.lots.open_lots_for_portfolio(portfolio_id)? {
            lots_by_ticker.entry(lot.ticker.clone()).or_default().push(lot);
        }
        let open_tickers: Vec<String> = lots_by_ticker.keys().cloned().collect();

        // Slow external reads happen here, before any lock is taken.
        let quotes = fetch_quotes(
            Arc::clone(&self.market_data),
            &open_tickers,
            as_of,
            PRICE_FETCH_CONCURRENCY,
        )
        .await;
        if !open_tickers.is_empty() && quotes.is_empty() {
            return Err(ValuationError::NoPricesAvailable {
                portfolio_id: portfolio_id.to_string(),
            }
            .into());
        }

        let lock = self.journal.posting_lock(portfolio_id);
        let _guard = lock
            .lock()
            .map_err(|e| Error::Unexpected(format!("posting lock poisoned: {}", e)))?;

        run.advance(RunPhase::Diffing);
        let prior_adjustments = self.ledger.asset_debit_balances(&fva.id, as_of)?;

        // Securities that still hold lots, plus those whose adjustment
        // balance must unwind to zero after a full disposal.
        let mut tickers: BTreeSet<String> = lots_by_ticker.keys().cloned().collect();
        for (ticker, balance) in &prior_adjustments {
            if !balance.is_zero() {
                tickers.insert(ticker.clone());
            }
        }

        let materiality = Self::materiality();
        let mut lines = Vec::new();

        for ticker in tickers {
            // Diff at full precision; only the posted amount is rounded.
            // Rounding first would promote sub-threshold deltas into
            // postable ones.
            let (open_quantity, cost_basis, target_value) = match lots_by_ticker.get(&ticker) {
                Some(lots) => {
                    let Some(quote) = quotes.get(&ticker) else {
                        warn!(
                            "No price for open position {} as of {}; leaving its adjustment unchanged",
                            ticker, as_of
                        );
                        continue;
                    };
                    let quote_currency = Currency::new(&quote.currency)?;
                    let fx_rate = self.fx.get_rate_for_date(&quote_currency, &base, as_of)?;

                    let open_quantity: Decimal =
                        lots.iter().map(|l| l.remaining_quantity).sum();
                    let cost_basis: Decimal =
                        lots.iter().map(|l| l.remaining_cost_basis_base()).sum();
                    let target_value = open_quantity * quote.price * fx_rate;
                    (open_quantity, cost_basis, target_value)
                }
                // Fully disposed: the stale adjustment unwinds to zero.
                None => (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO),
            };

            let prior = prior_adjustments
                .get(&ticker)
                .copied()
                .unwrap_or(Decimal::ZERO);
            let valuation = SecurityValuation {
                ticker: ticker.clone(),
                open_quantity,
                cost_basis_base: cost_basis,
                target_value_base: target_value,
                target_unrealized: target_value - cost_basis,
                prior_adjustment: prior,
                delta: (target_value - cost_basis) - prior,
            };
            debug!(
                "Valuation {}: qty={} cost={} fair={} unrealized={} delta={}",
                valuation.ticker,
                valuation.open_quantity,
                valuation.cost_basis_base,
                valuation.target_value_base,
                valuation.target_unrealized,
                valuation.delta
            );

            let delta = valuation.delta;
            if delta.abs() < materiality {
                debug!(
                    "Skipping {}: delta {} below materiality threshold",
                    ticker, delta
                );
                continue;
            }

            let posted = round_to_minor_units(delta.abs(), &base);
            if delta > Decimal::ZERO {
                lines.push(
                    JournalLine::debit(&fva.id, posted, base.clone())
                        .with_asset(&ticker)
                        .with_description("Fair value increase"),
                );
                lines.push(
                    JournalLine::credit(&unrealized.id, posted, base.clone())
                        .with_asset(&ticker)
                        .with_description("Unrealized gain on investments"),
                );
            } else {
                lines.push(
                    JournalLine::credit(&fva.id, posted, base.clone())
                        .with_asset(&ticker)
                        .with_description("Fair value decrease"),
                );
                lines.push(
                    JournalLine::debit(&unrealized.id, posted, base.clone())
                        .with_asset(&ticker)
                        .with_description("Unrealized loss on investments"),
                );
            }
        }

        run.advance(RunPhase::Posting);
        if lines.is_empty() {
            info!(
                "Securities revaluation for portfolio {} as of {}: nothing to post",
                portfolio_id, as_of
            );
            run.advance(RunPhase::Done);
            return Ok(None);
        }

        let entry = self.post_adjustment(
            portfolio_id,
            as_of,
            "Mark securities to market",
            lines,
        )?;
        run.advance(RunPhase::Done);
        Ok(Some(entry))
    }

    fn revalue_currency(
        &self,
        portfolio_id: &str,
        as_of: NaiveDate,
    ) -> Result<Option<JournalEntry>> {
        let mut run = RevaluationRun::new(portfolio_id, as_of);
        run.advance(RunPhase::Computing);

        let portfolio = self.portfolios.get_by_id(portfolio_id)?;
        let base = portfolio.base_currency;
        let cash = self.accounts.resolve(portfolio_id, codes::CASH)?;
        let clearing = self
            .accounts
            .resolve(portfolio_id, codes::CURRENCY_EXCHANGE_CLEARING)?;
        let fx_gain_loss = self.accounts.resolve(portfolio_id, codes::FX_GAIN_LOSS)?;

        let lock = self.journal.posting_lock(portfolio_id);
        let _guard = lock
            .lock()
            .map_err(|e| Error::Unexpected(format!("posting lock poisoned: {}", e)))?;

        run.advance(RunPhase::Diffing);
        let positions = self.ledger.foreign_cash_positions(portfolio_id, as_of)?;
        let mut ordered: Vec<_> = positions.into_values().collect();
        ordered.sort_by(|a, b| a.currency.cmp(&b.currency));

        let materiality = Self::materiality();
        let mut lines = Vec::new();

        for position in ordered {
            let rate = self
                .fx
                .get_rate_for_date(&position.currency, &base, as_of)?;
            let current_base = position.net_foreign * rate;
            let delta = current_base - position.book_base;
            if delta.abs() < materiality {
                debug!(
                    "Skipping {} cash: delta {} below materiality threshold",
                    position.currency, delta
                );
                continue;
            }

            // A zero foreign amount keeps the net position unchanged while
            // the base value moves; the next run diffs to zero.
            let basis = LineBasis::Foreign {
                amount: Decimal::ZERO,
                currency: position.currency.clone(),
                rate,
            };
            let posted = round_to_minor_units(delta.abs(), &base);
            if delta > Decimal::ZERO {
                lines.push(
                    JournalLine::debit(&cash.id, posted, base.clone())
                        .with_basis(basis)
                        .with_description(&format!("Revalue {} cash", position.currency)),
                );
                lines.push(
                    JournalLine::credit(&fx_gain_loss.id, posted, base.clone())
                        .with_description(&format!(
                            "Unrealized FX gain on {} cash",
                            position.currency
                        )),
                );
            } else {
                lines.push(
                    JournalLine::debit(&fx_gain_loss.id, posted, base.clone())
                        .with_description(&format!(
                            "Unrealized FX loss on {} cash",
                            position.currency
                        )),
                );
                lines.push(
                    JournalLine::credit(&cash.id, posted, base.clone())
                        .with_basis(basis)
                        .with_description(&format!("Revalue {} cash", position.currency)),
                );
            }
        }

        // Sweep accumulated conversion spread into FX gain/loss.
        let clearing_balance = self.ledger.debit_balance(&clearing.id, as_of)?;
        if clearing_balance.abs() >= materiality {
            if clearing_balance > Decimal::ZERO {
                lines.push(
                    JournalLine::debit(&fx_gain_loss.id, clearing_balance, base.clone())
                        .with_description("Realized FX loss on conversion spread"),
                );
                lines.push(
                    JournalLine::credit(&clearing.id, clearing_balance, base.clone())
                        .with_description("Clear conversion spread"),
                );
            } else {
                lines.push(
                    JournalLine::debit(&clearing.id, -clearing_balance, base.clone())
                        .with_description("Clear conversion spread"),
                );
                lines.push(
                    JournalLine::credit(&fx_gain_loss.id, -clearing_balance, base.clone())
                        .with_description("Realized FX gain on conversion spread"),
                );
            }
        }

        run.advance(RunPhase::Posting);
        if lines.is_empty() {
            info!(
                "Currency revaluation for portfolio {} as of {}: nothing to post",
                portfolio_id, as_of
            );
            run.advance(RunPhase::Done);
            return Ok(None);
        }

        let entry = self.post_adjustment(
            portfolio_id,
            as_of,
            "Mark foreign currency cash to market",
            lines,
        )?;
        run.advance(RunPhase::Done);
        Ok(Some(entry))
    }
}
