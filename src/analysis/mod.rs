//! Website analysis.
//!
//! [`Analyzer::analyze`] is the single entry point: it validates the URL,
//! fans out to the collectors and aggregates whatever came back into an
//! [`AnalysisReport`], substituting a fallback report when no audit data
//! is available.

pub mod aggregator;
pub mod coordinator;
pub mod fallback;

pub use aggregator::{aggregate, build_report, security_score};
pub use coordinator::{CollectedSignals, Coordinator};
pub use fallback::{generate_fallback, generate_fallback_with};

use crate::collectors::{HttpHeaderProbe, PageSpeedCollector};
use crate::config::Config;
use crate::error::AnalyzeError;
use crate::models::AnalysisReport;
use reqwest::Url;
use std::sync::Arc;
use tracing::info;

/// Validate and normalize an analysis target.
///
/// A value without a scheme is treated as an https host. Only http and
/// https URLs with a host are accepted.
pub fn normalize_url(input: &str) -> Result<Url, AnalyzeError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AnalyzeError::MissingUrl);
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let invalid = |reason: String| AnalyzeError::InvalidUrl {
        url: trimmed.to_string(),
        reason,
    };

    let url = Url::parse(&candidate).map_err(|e| invalid(e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }

    Ok(url)
}

/// Runs health analyses.
///
/// Without a coordinator (no audit credentials configured) every analysis
/// yields a fallback report and no network calls are made.
#[derive(Clone)]
pub struct Analyzer {
    coordinator: Option<Coordinator>,
}

impl Analyzer {
    pub fn new(coordinator: Coordinator) -> Self {
        Self {
            coordinator: Some(coordinator),
        }
    }

    /// An analyzer with no audit credentials.
    pub fn unconfigured() -> Self {
        Self { coordinator: None }
    }

    /// Build the HTTP-backed collectors described by `config`.
    pub fn from_config(config: &Config) -> reqwest::Result<Self> {
        let Some(audit) = PageSpeedCollector::from_config(&config.audit)? else {
            info!("No audit API key configured; reports will be synthetic");
            return Ok(Self::unconfigured());
        };
        let probe = HttpHeaderProbe::from_config(&config.probe)?;

        let coordinator = Coordinator::new(Arc::new(probe), Arc::new(audit))
            .with_categories(config.audit.categories.clone());
        Ok(Self::new(coordinator))
    }

    pub fn is_configured(&self) -> bool {
        self.coordinator.is_some()
    }

    /// Analyze `url`. Only a missing or malformed URL is an error.
    pub async fn analyze(&self, url: &str) -> Result<AnalysisReport, AnalyzeError> {
        let url = normalize_url(url)?;

        let Some(ref coordinator) = self.coordinator else {
            info!("Generating fallback report for {}", url);
            return Ok(generate_fallback());
        };

        info!("Analyzing {}", url);
        let signals = coordinator.collect(url.as_str()).await;
        let report = aggregate(signals.audit, signals.headers);

        info!(
            "Analysis of {} complete: overall {}",
            url,
            report.scores().overall()
        );
        Ok(report)
    }
}
