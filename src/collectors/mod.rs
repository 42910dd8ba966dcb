//! Signal collectors.
//!
//! Each collector talks to one unreliable source and never returns an
//! error: failures become [`Outcome::Failed`] (audit API) or an empty
//! [`SecurityHeaderSet`] (header probe).

pub mod headers;
pub mod pagespeed;

pub use headers::HttpHeaderProbe;
pub use pagespeed::PageSpeedCollector;

use crate::models::{Category, SecurityHeaderSet};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Settled result of one collector task.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Succeeded(T),
    Failed,
}

impl<T> Outcome<T> {
    pub fn is_succeeded(&self) -> bool {
        matches!(self, Outcome::Succeeded(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Outcome::Succeeded(value) => Some(value),
            Outcome::Failed => None,
        }
    }
}

/// Reads the security headers a site serves.
#[async_trait]
pub trait HeaderProbe: Send + Sync {
    /// Issue one request to `url`. Transport failures yield an empty set.
    async fn probe(&self, url: &str) -> SecurityHeaderSet;
}

/// Fetches Lighthouse category scores and metric audits for a URL.
#[async_trait]
pub trait AuditCollector: Send + Sync {
    async fn collect(&self, url: &str, categories: &[Category]) -> Outcome<AuditData>;
}

/// Score of one Lighthouse category, in [0, 1].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditCategories {
    pub performance: Option<CategoryScore>,
    pub seo: Option<CategoryScore>,
    pub accessibility: Option<CategoryScore>,
}

/// One Lighthouse audit result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub display_value: Option<String>,
}

/// Raw data returned by the audit provider (the `lighthouseResult` object).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditData {
    #[serde(default)]
    pub categories: AuditCategories,
    #[serde(default)]
    pub audits: HashMap<String, AuditEntry>,
}

impl AuditData {
    /// Provider score for a category, if reported.
    pub fn category_score(&self, category: Category) -> Option<f64> {
        let entry = match category {
            Category::Performance => self.categories.performance.as_ref(),
            Category::Seo => self.categories.seo.as_ref(),
            Category::Accessibility => self.categories.accessibility.as_ref(),
            Category::Security => None,
        };
        entry.and_then(|c| c.score)
    }

    pub fn audit_score(&self, id: &str) -> Option<f64> {
        self.audits.get(id).and_then(|a| a.score)
    }

    pub fn display_value(&self, id: &str) -> Option<&str> {
        self.audits.get(id).and_then(|a| a.display_value.as_deref())
    }
}
