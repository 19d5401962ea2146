//! Import batch metadata.
//!
//! One batch per broker-statement import. The batch record itself uses
//! optimistic concurrency: every update presents the version it read, and
//! a mismatch is a retryable conflict rather than a silent overwrite.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportBatchStatus {
    #[default]
    Running,
    Applied,
    Failed,
    Cancelled,
}

/// Metadata for one import run into a portfolio.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportBatch {
    pub id: String,
    pub portfolio_id: String,
    /// Source system, e.g. a broker or bank name.
    pub source: String,
    pub status: ImportBatchStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Incremented on every update; stale writers are rejected.
    pub version: u64,
    /// Free-form JSON metadata (row counts, file names, warnings).
    pub meta: Option<String>,
}

impl ImportBatch {
    pub fn new(portfolio_id: &str, source: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            portfolio_id: portfolio_id.to_string(),
            source: source.to_string(),
            status: ImportBatchStatus::Running,
            started_at: Utc::now(),
            completed_at: None,
            version: 1,
            meta: None,
        }
    }

    pub fn mark_applied(&mut self) {
        self.status = ImportBatchStatus::Applied;
        self.completed_at = Some(Utc::now());
    }

    pub fn mark_failed(&mut self) {
        self.status = ImportBatchStatus::Failed;
        self.completed_at = Some(Utc::now());
    }

    pub fn mark_cancelled(&mut self) {
        self.status = ImportBatchStatus::Cancelled;
        self.completed_at = Some(Utc::now());
    }

    /// Parses the meta JSON, if present and well-formed.
    pub fn meta_value(&self) -> Option<Value> {
        self.meta
            .as_ref()
            .filter(|s| !s.is_empty())
            .and_then(|s| serde_json::from_str(s).ok())
    }

    pub fn set_meta(&mut self, value: &Value) {
        self.meta = serde_json::to_string(value).ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn meta_round_trips_through_json() {
        let mut batch = ImportBatch::new("p1", "testbank");
        assert!(batch.meta_value().is_none());

        batch.set_meta(&json!({"rows": 42, "file": "statement.csv"}));
        let meta = batch.meta_value().unwrap();
        assert_eq!(meta["rows"], 42);
        assert_eq!(meta["file"], "statement.csv");
    }

    #[test]
    fn status_transitions_stamp_completion() {
        let mut batch = ImportBatch::new("p1", "testbank");
        assert_eq!(batch.status, ImportBatchStatus::Running);
        assert!(batch.completed_at.is_none());

        batch.mark_applied();
        assert_eq!(batch.status, ImportBatchStatus::Applied);
        assert!(batch.completed_at.is_some());
    }
}
