//! PageSpeed Insights collector.
//!
//! Calls the PageSpeed Insights v5 API, which runs Lighthouse on the
//! provider side, and extracts category scores and metric audits.

use super::{AuditCollector, AuditData, Outcome};
use crate::config::{AuditConfig, Strategy};
use crate::models::Category;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Top-level PageSpeed Insights response. Only the Lighthouse payload is used.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageSpeedResponse {
    lighthouse_result: AuditData,
}

/// Parse a PageSpeed Insights response body.
pub fn parse_response(body: &str) -> serde_json::Result<AuditData> {
    serde_json::from_str::<PageSpeedResponse>(body).map(|r| r.lighthouse_result)
}

/// [`AuditCollector`] for the PageSpeed Insights API.
#[derive(Debug, Clone)]
pub struct PageSpeedCollector {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    strategy: Strategy,
    timeout_seconds: u64,
}

impl PageSpeedCollector {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        strategy: Strategy,
        timeout_seconds: u64,
    ) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.into(),
            strategy,
            timeout_seconds,
        })
    }

    /// Build a collector from configuration. Returns `Ok(None)` when no
    /// API key is configured.
    pub fn from_config(config: &AuditConfig) -> reqwest::Result<Option<Self>> {
        match config.credentials() {
            Some(key) => Self::new(
                config.api_url.clone(),
                key,
                config.strategy,
                config.timeout_seconds,
            )
            .map(Some),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl AuditCollector for PageSpeedCollector {
    async fn collect(&self, url: &str, categories: &[Category]) -> Outcome<AuditData> {
        info!(
            "Requesting {} audit for {}",
            self.strategy.as_str(),
            url
        );

        let mut request = self.client.get(&self.api_url).query(&[
            ("url", url),
            ("key", self.api_key.as_str()),
            ("strategy", self.strategy.as_str()),
        ]);
        for category in categories {
            request = request.query(&[("category", category.api_name())]);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                if e.is_timeout() {
                    warn!("Audit API timed out after {}s", self.timeout_seconds);
                } else if e.is_connect() {
                    warn!("Cannot connect to audit API at {}", self.api_url);
                } else {
                    warn!("Audit API request failed: {}", e);
                }
                return Outcome::Failed;
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Audit API error {}: {}", status, body);
            return Outcome::Failed;
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!("Failed to read audit API response: {}", e);
                return Outcome::Failed;
            }
        };

        match parse_response(&body) {
            Ok(data) => {
                debug!("Audit API returned {} audits", data.audits.len());
                Outcome::Succeeded(data)
            }
            Err(e) => {
                warn!("Failed to parse audit API response: {}", e);
                Outcome::Failed
            }
        }
    }
}
