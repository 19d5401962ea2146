//! Chart of accounts - models, canonical set, service.

pub mod accounts_constants;
mod accounts_model;
mod accounts_service;
mod accounts_traits;

#[cfg(test)]
mod accounts_service_tests;

pub use accounts_model::{AccountKind, ChartAccount, NormalBalance};
pub use accounts_service::AccountService;
pub use accounts_traits::{AccountRepositoryTrait, AccountServiceTrait};
