use super::portfolio_model::Portfolio;
use crate::errors::Result;

/// Trait defining the contract for portfolio storage.
pub trait PortfolioRepositoryTrait: Send + Sync {
    fn insert(&self, portfolio: Portfolio) -> Result<Portfolio>;

    /// Fails with `PortfolioNotFound` when the id is unknown.
    fn get_by_id(&self, portfolio_id: &str) -> Result<Portfolio>;

    fn list(&self) -> Result<Vec<Portfolio>>;
}
