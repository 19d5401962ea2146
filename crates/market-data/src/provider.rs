use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use log::warn;
use rust_decimal::Decimal;

use crate::errors::MarketDataError;
use crate::model::{DataSource, Quote};

/// Contract every price source implements.
///
/// Lookups are as-of a date: the provider returns the latest quote on or
/// before `as_of`, or [`MarketDataError::PriceUnavailable`].
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn get_current_price(
        &self,
        symbol: &str,
        as_of: NaiveDate,
    ) -> Result<Quote, MarketDataError>;
}

/// In-memory provider backed by manually seeded quotes.
///
/// Quotes are stored per symbol as a date-ordered series, so as-of lookups
/// are a range query. Safe to share across tasks.
#[derive(Default)]
pub struct ManualQuoteProvider {
    quotes: DashMap<String, BTreeMap<NaiveDate, Quote>>,
}

impl ManualQuoteProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a quote, replacing any previous quote for the same day.
    pub fn set_price(&self, symbol: &str, date: NaiveDate, price: Decimal, currency: &str) {
        let quote = Quote {
            symbol: symbol.to_string(),
            price,
            currency: currency.to_string(),
            as_of: date,
            source: DataSource::Manual,
        };
        self.quotes
            .entry(symbol.to_string())
            .or_default()
            .insert(date, quote);
    }
}

#[async_trait]
impl MarketDataProvider for ManualQuoteProvider {
    async fn get_current_price(
        &self,
        symbol: &str,
        as_of: NaiveDate,
    ) -> Result<Quote, MarketDataError> {
        let unavailable = || MarketDataError::PriceUnavailable {
            symbol: symbol.to_string(),
            date: as_of,
        };

        let series = self.quotes.get(symbol).ok_or_else(unavailable)?;
        let quote = series
            .range(..=as_of)
            .next_back()
            .map(|(_, q)| q.clone())
            .ok_or_else(unavailable)?;
        Ok(quote)
    }
}

/// Fetches quotes for a batch of symbols with bounded parallelism.
///
/// Symbols without a price are logged and omitted from the result; the
/// caller decides whether a hole is fatal. Fetching happens before any
/// ledger write, so this can run without holding portfolio locks.
pub async fn fetch_quotes(
    provider: Arc<dyn MarketDataProvider>,
    symbols: &[String],
    as_of: NaiveDate,
    max_concurrency: usize,
) -> HashMap<String, Quote> {
    let results: Vec<(String, Result<Quote, MarketDataError>)> = stream::iter(
        symbols.iter().cloned().map(|symbol| {
            let provider = Arc::clone(&provider);
            async move {
                let result = provider.get_current_price(&symbol, as_of).await;
                (symbol, result)
            }
        }),
    )
    .buffer_unordered(max_concurrency.max(1))
    .collect()
    .await;

    let mut quotes = HashMap::with_capacity(results.len());
    for (symbol, result) in results {
        match result {
            Ok(quote) => {
                quotes.insert(symbol, quote);
            }
            Err(e) => {
                warn!("Skipping '{}' in price prefetch: {}", symbol, e);
            }
        }
    }
    quotes
}
