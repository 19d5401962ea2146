//! Import batch metadata with optimistic concurrency.

mod imports_errors;
mod imports_model;
mod imports_traits;

pub use imports_errors::ImportError;
pub use imports_model::{ImportBatch, ImportBatchStatus};
pub use imports_traits::ImportRepositoryTrait;
