//! Security header probe.
//!
//! Issues a single HEAD request against the target and records which of the
//! tracked security headers the response carries.

use super::HeaderProbe;
use crate::config::ProbeConfig;
use crate::models::SecurityHeaderSet;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

/// [`HeaderProbe`] backed by a reqwest client.
#[derive(Debug, Clone)]
pub struct HttpHeaderProbe {
    client: reqwest::Client,
}

impl HttpHeaderProbe {
    /// Create a probe with its own timeout and user agent.
    pub fn new(timeout: Duration, user_agent: &str) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self { client })
    }

    pub fn from_config(config: &ProbeConfig) -> reqwest::Result<Self> {
        Self::new(
            Duration::from_secs(config.timeout_seconds),
            &config.user_agent,
        )
    }
}

#[async_trait]
impl HeaderProbe for HttpHeaderProbe {
    async fn probe(&self, url: &str) -> SecurityHeaderSet {
        let response = match self.client.head(url).send().await {
            Ok(response) => response,
            Err(e) => {
                if e.is_timeout() {
                    warn!("Header probe timed out for {}", url);
                } else if e.is_connect() {
                    warn!("Header probe cannot connect to {}", url);
                } else {
                    warn!("Header probe failed for {}: {}", url, e);
                }
                return SecurityHeaderSet::empty();
            }
        };

        // Status is informational only; error pages still carry headers.
        debug!("Header probe {} answered {}", url, response.status());

        let mut headers = SecurityHeaderSet::empty();
        for (name, value) in response.headers() {
            headers.insert(
                name.as_str(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            );
        }

        debug!(
            "Header probe found {} of 5 security headers",
            5 - headers.missing().len()
        );
        headers
    }
}
