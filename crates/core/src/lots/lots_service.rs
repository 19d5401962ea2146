use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use log::{debug, info};
use rust_decimal::Decimal;

use super::lots_errors::LotError;
use super::lots_model::{AllocationPlan, PlannedSlice, SecurityAllocation, SecurityLot};
use super::lots_traits::{LotRepositoryTrait, LotServiceTrait};
use crate::constants::QUANTITY_EPSILON;
use crate::errors::Result;
use crate::fx::{round_to_minor_units, Currency};
use crate::transactions::Transaction;

/// FIFO lot tracker.
pub struct LotService {
    repository: Arc<dyn LotRepositoryTrait>,
}

impl LotService {
    pub fn new(repository: Arc<dyn LotRepositoryTrait>) -> Self {
        Self { repository }
    }

    fn quantity_epsilon() -> Decimal {
        // The constant is a valid literal; parsing cannot fail.
        Decimal::from_str(QUANTITY_EPSILON).unwrap_or(Decimal::ZERO)
    }
}

impl LotServiceTrait for LotService {
    fn open_lot(
        &self,
        transaction: &Transaction,
        total_cost_base: Decimal,
        exchange_rate: Decimal,
    ) -> Result<SecurityLot> {
        let (ticker, quantity, price) = transaction.security_fields()?;
        let total_cost_foreign = quantity * price + transaction.fees_or_zero();

        let lot = SecurityLot::new(
            &transaction.portfolio_id,
            ticker,
            &transaction.id,
            transaction.date,
            quantity,
            total_cost_foreign / quantity,
            total_cost_base / quantity,
            transaction.currency.clone(),
            exchange_rate,
        );
        debug!(
            "Opening lot for {} x{} @ {} {} (base cost {})",
            ticker, quantity, price, transaction.currency, total_cost_base
        );
        self.repository.insert_lot(lot)
    }

    fn plan_fifo(
        &self,
        portfolio_id: &str,
        ticker: &str,
        quantity: Decimal,
        base_currency: &Currency,
        allow_negative_holding: bool,
    ) -> Result<AllocationPlan> {
        let epsilon = Self::quantity_epsilon();
        let open_lots = self.repository.open_lots(portfolio_id, ticker)?;

        let mut slices = Vec::new();
        let mut total_cost = Decimal::ZERO;
        let mut remaining_to_sell = quantity;

        for lot in &open_lots {
            if remaining_to_sell <= epsilon {
                break;
            }
            let take = remaining_to_sell.min(lot.remaining_quantity);
            let cost = round_to_minor_units(take * lot.cost_per_share_base, base_currency);
            slices.push(PlannedSlice {
                lot_id: lot.id.clone(),
                quantity: take,
                cost_basis_base: cost,
            });
            total_cost += cost;
            remaining_to_sell -= take;
        }

        if remaining_to_sell > epsilon && !allow_negative_holding {
            let available = quantity - remaining_to_sell;
            return Err(LotError::InsufficientLots {
                ticker: ticker.to_string(),
                requested: quantity,
                available,
            }
            .into());
        }

        let uncovered = if remaining_to_sell > epsilon {
            info!(
                "Negative holding allowed for {}: {} of {} uncovered, booked at zero cost",
                ticker, remaining_to_sell, quantity
            );
            remaining_to_sell
        } else {
            Decimal::ZERO
        };

        Ok(AllocationPlan {
            portfolio_id: portfolio_id.to_string(),
            ticker: ticker.to_string(),
            quantity_requested: quantity,
            slices,
            total_cost_basis_base: total_cost,
            uncovered_quantity: uncovered,
        })
    }

    fn commit_plan(
        &self,
        plan: &AllocationPlan,
        sell_transaction_id: &str,
        proceeds_base: Decimal,
        base_currency: &Currency,
    ) -> Result<Vec<SecurityAllocation>> {
        let epsilon = Self::quantity_epsilon();
        let covered_quantity = plan.quantity_requested - plan.uncovered_quantity;
        // Proceeds attributable to lot-covered shares; the uncovered
        // remainder is pure gain and carries no allocation record.
        let covered_proceeds = if plan.uncovered_quantity > Decimal::ZERO {
            round_to_minor_units(
                proceeds_base * covered_quantity / plan.quantity_requested,
                base_currency,
            )
        } else {
            proceeds_base
        };

        let mut allocations = Vec::with_capacity(plan.slices.len());
        let mut proceeds_assigned = Decimal::ZERO;

        for (index, slice) in plan.slices.iter().enumerate() {
            let lot = self.repository.get_lot(&slice.lot_id)?;
            let mut new_remaining = lot.remaining_quantity - slice.quantity;
            let closed = new_remaining <= epsilon;
            if closed {
                new_remaining = Decimal::ZERO;
            }
            self.repository.reduce_lot(&slice.lot_id, new_remaining, closed)?;

            // Last slice takes the rounding residual so slice proceeds sum
            // exactly to the covered proceeds.
            let slice_proceeds = if index == plan.slices.len() - 1 {
                covered_proceeds - proceeds_assigned
            } else {
                round_to_minor_units(
                    covered_proceeds * slice.quantity / covered_quantity,
                    base_currency,
                )
            };
            proceeds_assigned += slice_proceeds;

            let allocation = SecurityAllocation::new(
                &slice.lot_id,
                sell_transaction_id,
                slice.quantity,
                slice.cost_basis_base,
                slice_proceeds,
            );
            allocations.push(self.repository.insert_allocation(allocation)?);
        }

        debug!(
            "Committed FIFO allocation for {} ({} slices, cost basis {})",
            plan.ticker,
            allocations.len(),
            plan.total_cost_basis_base
        );
        Ok(allocations)
    }

    fn open_quantity(&self, portfolio_id: &str, ticker: &str) -> Result<Decimal> {
        let lots = self.repository.open_lots(portfolio_id, ticker)?;
        Ok(lots.iter().map(|l| l.remaining_quantity).sum())
    }

    fn apply_split(
        &self,
        portfolio_id: &str,
        ticker: &str,
        ratio: Decimal,
        split_date: NaiveDate,
    ) -> Result<usize> {
        if ratio <= Decimal::ZERO {
            return Err(LotError::InvalidSplitRatio(ratio).into());
        }

        let lots = self.repository.lots_for_ticker(portfolio_id, ticker)?;
        let mut adjusted = 0usize;

        for lot in lots {
            if lot.purchase_date >= split_date {
                continue;
            }
            self.repository.apply_split_to_lot(
                &lot.id,
                lot.original_quantity * ratio,
                lot.remaining_quantity * ratio,
                lot.cost_per_share_foreign / ratio,
                lot.cost_per_share_base / ratio,
            )?;
            adjusted += 1;
        }

        if adjusted > 0 {
            info!(
                "Applied {}:1 split to {} lots of {} effective {}",
                ratio, adjusted, ticker, split_date
            );
        }
        Ok(adjusted)
    }
}
