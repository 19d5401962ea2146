//! FX (Foreign Exchange) module - currency type, rate lookup, gateway service.

pub mod currency;
pub mod currency_converter;
mod fx_errors;
mod fx_model;
mod fx_service;
mod fx_traits;

pub use currency::{minor_units, round_to_minor_units, Currency};
pub use currency_converter::CurrencyConverter;
pub use fx_errors::FxError;
pub use fx_model::{ExchangeRate, NewExchangeRate};
pub use fx_service::FxService;
pub use fx_traits::{FxRepositoryTrait, FxServiceTrait};
