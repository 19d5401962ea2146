use std::sync::Arc;

use log::{debug, info};

use super::accounts_constants::CANONICAL_ACCOUNTS;
use super::accounts_model::ChartAccount;
use super::accounts_traits::{AccountRepositoryTrait, AccountServiceTrait};
use crate::errors::{Error, Result};
use crate::portfolio::PortfolioRepositoryTrait;

/// Service for managing the chart of accounts.
pub struct AccountService {
    repository: Arc<dyn AccountRepositoryTrait>,
    portfolios: Arc<dyn PortfolioRepositoryTrait>,
}

impl AccountService {
    pub fn new(
        repository: Arc<dyn AccountRepositoryTrait>,
        portfolios: Arc<dyn PortfolioRepositoryTrait>,
    ) -> Self {
        Self {
            repository,
            portfolios,
        }
    }
}

impl AccountServiceTrait for AccountService {
    fn ensure_initialized(&self, portfolio_id: &str) -> Result<()> {
        let portfolio = self.portfolios.get_by_id(portfolio_id)?;
        let mut created = 0usize;

        for (code, name, kind) in CANONICAL_ACCOUNTS {
            if self.repository.find_by_code(portfolio_id, code)?.is_some() {
                continue;
            }
            let account = ChartAccount::new(
                portfolio_id,
                code,
                name,
                *kind,
                portfolio.base_currency.clone(),
            );
            self.repository.insert(account)?;
            created += 1;
        }

        if created > 0 {
            info!(
                "Initialized chart of accounts for portfolio {}: {} accounts created",
                portfolio_id, created
            );
        } else {
            debug!(
                "Chart of accounts for portfolio {} already initialized",
                portfolio_id
            );
        }
        Ok(())
    }

    fn resolve(&self, portfolio_id: &str, code: &str) -> Result<ChartAccount> {
        self.repository
            .find_by_code(portfolio_id, code)?
            .ok_or_else(|| Error::AccountNotFound {
                portfolio_id: portfolio_id.to_string(),
                code: code.to_string(),
            })
    }

    fn get(&self, account_id: &str) -> Result<ChartAccount> {
        self.repository.get_by_id(account_id)
    }

    fn list(&self, portfolio_id: &str) -> Result<Vec<ChartAccount>> {
        self.repository.list_for_portfolio(portfolio_id)
    }
}
