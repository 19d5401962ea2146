//! Security lot and FIFO allocation domain models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::fx::Currency;

/// One BUY's remaining cost basis.
///
/// Created exactly once per BUY and never deleted; later SELLs reduce
/// `remaining_quantity` (monotonically) and flip `closed` when it reaches
/// zero. Split adjustments rescale quantity and per-share cost together,
/// leaving total cost unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityLot {
    pub id: String,
    pub portfolio_id: String,
    pub ticker: String,
    pub source_transaction_id: String,
    pub purchase_date: NaiveDate,
    pub original_quantity: Decimal,
    pub remaining_quantity: Decimal,
    /// Cost per share in the purchase currency, fees included.
    pub cost_per_share_foreign: Decimal,
    /// Cost per share in the portfolio base currency, at the purchase rate.
    pub cost_per_share_base: Decimal,
    pub currency: Currency,
    pub exchange_rate_at_purchase: Decimal,
    pub closed: bool,
    pub created_at: DateTime<Utc>,
}

impl SecurityLot {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        portfolio_id: &str,
        ticker: &str,
        source_transaction_id: &str,
        purchase_date: NaiveDate,
        quantity: Decimal,
        cost_per_share_foreign: Decimal,
        cost_per_share_base: Decimal,
        currency: Currency,
        exchange_rate_at_purchase: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            portfolio_id: portfolio_id.to_string(),
            ticker: ticker.to_string(),
            source_transaction_id: source_transaction_id.to_string(),
            purchase_date,
            original_quantity: quantity,
            remaining_quantity: quantity,
            cost_per_share_foreign,
            cost_per_share_base,
            currency,
            exchange_rate_at_purchase,
            closed: false,
            created_at: Utc::now(),
        }
    }

    pub fn is_open(&self) -> bool {
        !self.closed && self.remaining_quantity > Decimal::ZERO
    }

    /// Cost basis of the remaining shares in base currency, unrounded.
    pub fn remaining_cost_basis_base(&self) -> Decimal {
        self.remaining_quantity * self.cost_per_share_base
    }
}

/// The FIFO matching record produced by a SELL. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityAllocation {
    pub id: String,
    pub lot_id: String,
    pub sell_transaction_id: String,
    pub quantity_allocated: Decimal,
    pub cost_basis_base: Decimal,
    pub proceeds_base: Decimal,
    pub realized_gain_loss_base: Decimal,
    pub created_at: DateTime<Utc>,
}

impl SecurityAllocation {
    pub fn new(
        lot_id: &str,
        sell_transaction_id: &str,
        quantity_allocated: Decimal,
        cost_basis_base: Decimal,
        proceeds_base: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            lot_id: lot_id.to_string(),
            sell_transaction_id: sell_transaction_id.to_string(),
            quantity_allocated,
            cost_basis_base,
            proceeds_base,
            realized_gain_loss_base: proceeds_base - cost_basis_base,
            created_at: Utc::now(),
        }
    }
}

/// One lot's share of a planned FIFO allocation.
#[derive(Debug, Clone)]
pub struct PlannedSlice {
    pub lot_id: String,
    pub quantity: Decimal,
    /// Rounded to base-currency minor units; slice costs sum to the
    /// plan total exactly.
    pub cost_basis_base: Decimal,
}

/// A computed FIFO allocation that has not touched any lot yet.
///
/// Planning and committing are separate so a failed sale leaves the lot
/// table untouched; the journal engine commits the plan only after the
/// sell entry has been persisted.
#[derive(Debug, Clone)]
pub struct AllocationPlan {
    pub portfolio_id: String,
    pub ticker: String,
    pub quantity_requested: Decimal,
    pub slices: Vec<PlannedSlice>,
    pub total_cost_basis_base: Decimal,
    /// Quantity not covered by any open lot. Non-zero only on the
    /// explicitly flagged negative-holding path; booked at zero cost.
    pub uncovered_quantity: Decimal,
}
