use super::imports_model::ImportBatch;
use crate::errors::Result;

/// Trait defining the contract for import batch storage.
pub trait ImportRepositoryTrait: Send + Sync {
    fn insert_batch(&self, batch: ImportBatch) -> Result<ImportBatch>;

    fn get_batch(&self, batch_id: &str) -> Result<ImportBatch>;

    /// Persists an updated batch if and only if the stored version equals
    /// `expected_version`; bumps the version on success. A mismatch is
    /// `ImportError::StaleVersion`.
    fn update_batch(&self, batch: ImportBatch, expected_version: u64) -> Result<ImportBatch>;

    fn batches_for_portfolio(&self, portfolio_id: &str) -> Result<Vec<ImportBatch>>;
}
