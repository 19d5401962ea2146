//! Revaluation run descriptor and per-security valuation snapshot.

use chrono::{DateTime, NaiveDate, Utc};
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Phases of a revaluation run. Nothing is externally visible before
/// `Posting`; a crash earlier leaves the ledger unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunPhase {
    Pending,
    Computing,
    Diffing,
    Posting,
    Done,
}

impl RunPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunPhase::Pending => "PENDING",
            RunPhase::Computing => "COMPUTING",
            RunPhase::Diffing => "DIFFING",
            RunPhase::Posting => "POSTING",
            RunPhase::Done => "DONE",
        }
    }
}

/// One mark-to-market run over a portfolio.
#[derive(Debug, Clone)]
pub struct RevaluationRun {
    pub id: String,
    pub portfolio_id: String,
    pub as_of: NaiveDate,
    pub phase: RunPhase,
    pub started_at: DateTime<Utc>,
}

impl RevaluationRun {
    pub fn new(portfolio_id: &str, as_of: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            portfolio_id: portfolio_id.to_string(),
            as_of,
            phase: RunPhase::Pending,
            started_at: Utc::now(),
        }
    }

    pub fn advance(&mut self, phase: RunPhase) {
        debug!(
            "Revaluation run {} for portfolio {}: {} -> {}",
            self.id,
            self.portfolio_id,
            self.phase.as_str(),
            phase.as_str()
        );
        self.phase = phase;
    }
}

/// The diff computed for one security during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityValuation {
    pub ticker: String,
    pub open_quantity: Decimal,
    pub cost_basis_base: Decimal,
    pub target_value_base: Decimal,
    /// Fair value minus cost basis for the open position.
    pub target_unrealized: Decimal,
    /// Fair-value adjustment already posted for this security.
    pub prior_adjustment: Decimal,
    /// What this run posts: `target_unrealized - prior_adjustment`.
    pub delta: Decimal,
}
