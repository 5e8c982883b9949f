//! Exchange rate tables and the providers that resolve them

use crate::core::cost::Currency;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use tracing::{debug, warn};

/// Multipliers relative to USD, keyed by currency code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateTable(BTreeMap<String, f64>);

impl RateTable {
    /// Rates used whenever no external source is configured or reachable.
    pub fn builtin() -> Self {
        [
            (Currency::Usd, 1.0),
            (Currency::Ils, 3.4),
            (Currency::Eur, 0.7),
            (Currency::Gbp, 0.6),
        ]
        .into_iter()
        .map(|(c, r)| (c.code().to_string(), r))
        .collect()
    }

    /// Looks up `currency` by its code, then by any legacy alias.
    pub fn rate(&self, currency: Currency) -> Option<f64> {
        self.0
            .get(currency.code())
            .or_else(|| currency.aliases().iter().find_map(|a| self.0.get(*a)))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for RateTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FromIterator<(String, f64)> for RateTable {
    fn from_iter<T: IntoIterator<Item = (String, f64)>>(iter: T) -> Self {
        RateTable(iter.into_iter().collect())
    }
}

/// Why a provider handed back the built-in table.
#[derive(Debug, Clone, PartialEq)]
pub enum FallbackReason {
    NotConfigured,
    Request(String),
    Status(u16),
    Malformed(String),
}

impl Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FallbackReason::NotConfigured => write!(f, "no exchange rate source configured"),
            FallbackReason::Request(e) => write!(f, "request failed: {e}"),
            FallbackReason::Status(code) => write!(f, "unexpected HTTP status {code}"),
            FallbackReason::Malformed(e) => write!(f, "malformed rate table: {e}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RateResolution {
    Fetched(RateTable),
    UsedDefault(FallbackReason),
}

impl RateResolution {
    /// The table to convert with, logging when it is the built-in one.
    pub fn into_table(self) -> RateTable {
        match self {
            RateResolution::Fetched(table) => {
                if table.is_empty() {
                    warn!("Fetched exchange rate table is empty, every currency converts at 1");
                } else {
                    debug!(currencies = table.len(), "Using fetched exchange rates");
                }
                table
            }
            RateResolution::UsedDefault(FallbackReason::NotConfigured) => {
                debug!("No exchange rate source configured, using default rates");
                RateTable::builtin()
            }
            RateResolution::UsedDefault(reason) => {
                warn!(%reason, "Exchange rate fetch failed, using default rates");
                RateTable::builtin()
            }
        }
    }
}

#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Never fails: a source that cannot be used is reported as
    /// [`RateResolution::UsedDefault`].
    async fn resolve_rates(&self) -> RateResolution;
}
