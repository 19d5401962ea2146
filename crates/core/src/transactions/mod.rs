//! Broker transaction input model.

mod transactions_model;

pub use transactions_model::{Transaction, TransactionType};
