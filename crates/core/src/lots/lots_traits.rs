use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::lots_model::{AllocationPlan, SecurityAllocation, SecurityLot};
use crate::errors::Result;
use crate::fx::Currency;
use crate::transactions::Transaction;

/// Trait defining the contract for lot storage.
///
/// Lots are insert-only apart from the two sanctioned mutations:
/// consumption (`reduce_lot`) and split rescaling (`apply_split_to_lot`).
pub trait LotRepositoryTrait: Send + Sync {
    fn insert_lot(&self, lot: SecurityLot) -> Result<SecurityLot>;
    fn insert_allocation(&self, allocation: SecurityAllocation) -> Result<SecurityAllocation>;
    fn get_lot(&self, lot_id: &str) -> Result<SecurityLot>;

    /// Open lots for one holding in FIFO order: purchase date, then
    /// insertion order.
    fn open_lots(&self, portfolio_id: &str, ticker: &str) -> Result<Vec<SecurityLot>>;

    /// All open lots in a portfolio, FIFO-ordered within each ticker.
    fn open_lots_for_portfolio(&self, portfolio_id: &str) -> Result<Vec<SecurityLot>>;

    /// Every lot (open or closed) for a holding.
    fn lots_for_ticker(&self, portfolio_id: &str, ticker: &str) -> Result<Vec<SecurityLot>>;

    fn allocations_for_sell(&self, sell_transaction_id: &str) -> Result<Vec<SecurityAllocation>>;

    /// Reduces a lot's remaining quantity. The store rejects increases.
    fn reduce_lot(&self, lot_id: &str, new_remaining: Decimal, closed: bool) -> Result<()>;

    /// Rescales a lot for a stock split; total cost is unchanged.
    fn apply_split_to_lot(
        &self,
        lot_id: &str,
        original_quantity: Decimal,
        remaining_quantity: Decimal,
        cost_per_share_foreign: Decimal,
        cost_per_share_base: Decimal,
    ) -> Result<()>;
}

/// Trait defining the contract for lot tracking operations.
pub trait LotServiceTrait: Send + Sync {
    /// Creates a new lot from a BUY. `total_cost_base` is the rounded
    /// base-currency cost the journal entry debits, fees included.
    fn open_lot(
        &self,
        transaction: &Transaction,
        total_cost_base: Decimal,
        exchange_rate: Decimal,
    ) -> Result<SecurityLot>;

    /// Computes a FIFO allocation without mutating anything. Slice cost
    /// bases are rounded to the base currency's minor units. Fails with
    /// `InsufficientLots` unless `allow_negative_holding` is set, in which
    /// case the shortfall is carried as `uncovered_quantity`.
    fn plan_fifo(
        &self,
        portfolio_id: &str,
        ticker: &str,
        quantity: Decimal,
        base_currency: &Currency,
        allow_negative_holding: bool,
    ) -> Result<AllocationPlan>;

    /// Applies a plan: reduces lots, closes the emptied ones, and records
    /// one allocation per consumed slice with proceeds pro-rated so slice
    /// gains sum exactly to total proceeds minus total cost basis.
    fn commit_plan(
        &self,
        plan: &AllocationPlan,
        sell_transaction_id: &str,
        proceeds_base: Decimal,
        base_currency: &Currency,
    ) -> Result<Vec<SecurityAllocation>>;

    /// Total open quantity for a holding.
    fn open_quantity(&self, portfolio_id: &str, ticker: &str) -> Result<Decimal>;

    /// Applies a stock split to every lot purchased before `split_date`.
    /// Returns the number of lots adjusted.
    fn apply_split(
        &self,
        portfolio_id: &str,
        ticker: &str,
        ratio: Decimal,
        split_date: NaiveDate,
    ) -> Result<usize>;
}
