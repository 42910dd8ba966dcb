//! Concurrent signal collection.
//!
//! Runs the header probe and the audit collector as independent tasks and
//! waits for both to settle. One task failing, panicking or running slowly
//! never cancels the other.

use crate::collectors::{AuditCollector, AuditData, HeaderProbe, Outcome};
use crate::models::{Category, SecurityHeaderSet};
use futures::future;
use std::sync::Arc;
use tracing::{debug, warn};

/// Settled outcome of both collectors for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedSignals {
    pub headers: Outcome<SecurityHeaderSet>,
    pub audit: Outcome<AuditData>,
}

/// Fans a request out to the injected collectors.
#[derive(Clone)]
pub struct Coordinator {
    probe: Arc<dyn HeaderProbe>,
    audit: Arc<dyn AuditCollector>,
    categories: Vec<Category>,
}

impl Coordinator {
    pub fn new(probe: Arc<dyn HeaderProbe>, audit: Arc<dyn AuditCollector>) -> Self {
        Self {
            probe,
            audit,
            categories: Category::AUDITED.to_vec(),
        }
    }

    /// Restrict the categories requested from the audit collector.
    ///
    /// Categories the audit API does not score are dropped.
    pub fn with_categories(mut self, categories: Vec<Category>) -> Self {
        let (audited, skipped): (Vec<_>, Vec<_>) = categories
            .into_iter()
            .partition(|c| Category::AUDITED.contains(c));
        if !skipped.is_empty() {
            warn!("Ignoring categories the audit API does not score: {:?}", skipped);
        }
        self.categories = audited;
        self
    }

    /// Run both collectors concurrently and wait for both to finish.
    pub async fn collect(&self, url: &str) -> CollectedSignals {
        let probe = Arc::clone(&self.probe);
        let probe_url = url.to_string();
        let header_task = tokio::spawn(async move { probe.probe(&probe_url).await });

        let audit = Arc::clone(&self.audit);
        let audit_url = url.to_string();
        let categories = self.categories.clone();
        let audit_task =
            tokio::spawn(async move { audit.collect(&audit_url, &categories).await });

        let (headers, audit) = future::join(header_task, audit_task).await;

        let headers = match headers {
            Ok(set) => Outcome::Succeeded(set),
            Err(e) => {
                warn!("Header probe task did not complete: {}", e);
                Outcome::Failed
            }
        };
        let audit = match audit {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Audit task did not complete: {}", e);
                Outcome::Failed
            }
        };

        debug!(
            "Signals settled for {} (headers: {}, audit: {})",
            url,
            headers.is_succeeded(),
            audit.is_succeeded()
        );

        CollectedSignals { headers, audit }
    }
}
