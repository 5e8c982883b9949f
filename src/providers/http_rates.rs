use crate::core::currency::{FallbackReason, RateProvider, RateResolution, RateTable};
use crate::core::settings::SettingsSource;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Fetches the rate table from the URL stored in the user's settings.
///
/// The URL is looked up again on every call so a changed setting takes effect
/// on the next report. One request per call, no retries.
pub struct HttpRateProvider {
    settings: Arc<dyn SettingsSource>,
    client: reqwest::Client,
}

impl HttpRateProvider {
    pub fn new(settings: Arc<dyn SettingsSource>) -> Self {
        Self {
            settings,
            client: reqwest::Client::builder()
                .user_agent(concat!("costbook/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_default(),
        }
    }

    async fn fetch(&self, url: &str) -> Result<RateTable, FallbackReason> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FallbackReason::Request(e.to_string()))?;

        debug!(status = %response.status(), "Received rate source response");
        if response.status() != StatusCode::OK {
            return Err(FallbackReason::Status(response.status().as_u16()));
        }

        let text = response
            .text()
            .await
            .map_err(|e| FallbackReason::Request(e.to_string()))?;
        let rates: BTreeMap<String, f64> =
            serde_json::from_str(&text).map_err(|e| FallbackReason::Malformed(e.to_string()))?;

        Ok(rates.into_iter().collect())
    }
}

#[async_trait]
impl RateProvider for HttpRateProvider {
    #[instrument(name = "RateFetch", skip(self))]
    async fn resolve_rates(&self) -> RateResolution {
        let Some(url) = self.settings.exchange_rates_url() else {
            return RateResolution::UsedDefault(FallbackReason::NotConfigured);
        };

        debug!("Requesting exchange rates from {}", url);
        match self.fetch(&url).await {
            Ok(table) => RateResolution::Fetched(table),
            Err(reason) => RateResolution::UsedDefault(reason),
        }
    }
}
