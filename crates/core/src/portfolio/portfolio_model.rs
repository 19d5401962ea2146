use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::fx::Currency;

/// A portfolio: one ledger, one base currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    pub id: String,
    pub name: String,
    pub base_currency: Currency,
    pub created_at: DateTime<Utc>,
}

impl Portfolio {
    pub fn new(name: &str, base_currency: Currency) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            base_currency,
            created_at: Utc::now(),
        }
    }
}
