use thiserror::Error;

/// Errors raised around import batch metadata.
#[derive(Error, Debug)]
pub enum ImportError {
    /// Another writer updated the batch since it was read. Retryable:
    /// re-read, re-apply, re-submit.
    #[error("Import batch {batch_id} was modified concurrently (expected version {expected}, found {actual})")]
    StaleVersion {
        batch_id: String,
        expected: u64,
        actual: u64,
    },

    #[error("Import batch '{0}' not found")]
    BatchNotFound(String),
}
