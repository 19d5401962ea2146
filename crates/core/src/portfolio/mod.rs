//! Portfolio domain model.

mod portfolio_model;
mod portfolio_traits;

pub use portfolio_model::Portfolio;
pub use portfolio_traits::PortfolioRepositoryTrait;
