use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::Result;
use crate::journal::JournalEntry;

/// Trait defining the contract for mark-to-market operations.
///
/// Both operations are idempotent: re-running with unchanged inputs finds
/// a zero delta and posts nothing.
#[async_trait]
pub trait ValuationServiceTrait: Send + Sync {
    /// Marks open security positions to market, posting only the
    /// incremental fair-value delta per security. Returns the adjustment
    /// entry, or `None` when every delta is below materiality.
    async fn revalue_securities(
        &self,
        portfolio_id: &str,
        as_of: NaiveDate,
    ) -> Result<Option<JournalEntry>>;

    /// Remeasures foreign-currency cash at current rates and sweeps the
    /// accumulated conversion spread into FX gain/loss.
    fn revalue_currency(
        &self,
        portfolio_id: &str,
        as_of: NaiveDate,
    ) -> Result<Option<JournalEntry>>;
}
