use super::accounts_model::ChartAccount;
use crate::errors::Result;

/// Trait defining the contract for chart-of-accounts storage.
pub trait AccountRepositoryTrait: Send + Sync {
    fn insert(&self, account: ChartAccount) -> Result<ChartAccount>;
    fn find_by_code(&self, portfolio_id: &str, code: &str) -> Result<Option<ChartAccount>>;
    fn get_by_id(&self, account_id: &str) -> Result<ChartAccount>;
    fn list_for_portfolio(&self, portfolio_id: &str) -> Result<Vec<ChartAccount>>;
}

/// Trait defining the contract for chart-of-accounts operations.
pub trait AccountServiceTrait: Send + Sync {
    /// Idempotently creates the canonical account set for a portfolio.
    /// Accounts that already exist are left untouched.
    fn ensure_initialized(&self, portfolio_id: &str) -> Result<()>;

    /// Resolves an account by code. A missing account is
    /// `Error::AccountNotFound`, never a silently created default.
    fn resolve(&self, portfolio_id: &str, code: &str) -> Result<ChartAccount>;

    fn get(&self, account_id: &str) -> Result<ChartAccount>;

    fn list(&self, portfolio_id: &str) -> Result<Vec<ChartAccount>>;
}
