//! Data models for the website health engine.
//!
//! This module contains the report, header and snapshot structures shared by
//! the collectors, the aggregator and the snapshot store. Field names are
//! serialized in camelCase; they are the JSON contract with the host system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Clamp an arbitrary integer into the 0-100 score range.
pub fn clamp_score(value: i64) -> u8 {
    value.clamp(0, 100) as u8
}

/// Scale a provider score in [0, 1] to a 0-100 integer score.
pub fn scale_provider_score(score: f64) -> u8 {
    if !score.is_finite() {
        return 0;
    }
    clamp_score((score * 100.0).round() as i64)
}

/// Category of a health score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Performance,
    Seo,
    Accessibility,
    Security,
}

impl Category {
    /// Categories served by the external audit API.
    pub const AUDITED: [Category; 3] = [
        Category::Performance,
        Category::Seo,
        Category::Accessibility,
    ];

    /// Query-parameter name used by the audit API.
    pub fn api_name(&self) -> &'static str {
        match self {
            Category::Performance => "PERFORMANCE",
            Category::Seo => "SEO",
            Category::Accessibility => "ACCESSIBILITY",
            Category::Security => "SECURITY",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Performance => write!(f, "Performance"),
            Category::Seo => write!(f, "SEO"),
            Category::Accessibility => write!(f, "Accessibility"),
            Category::Security => write!(f, "Security"),
        }
    }
}

/// Core web vital display values. Missing values are `"N/A"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub fcp: String,
    pub lcp: String,
    pub cls: String,
    pub fid: String,
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self {
            fcp: NOT_AVAILABLE.to_string(),
            lcp: NOT_AVAILABLE.to_string(),
            cls: NOT_AVAILABLE.to_string(),
            fid: NOT_AVAILABLE.to_string(),
        }
    }
}

/// Placeholder for a metric the provider did not return.
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub score: u8,
    pub metrics: PerformanceMetrics,
}

/// Score plus the findings derived for it (SEO and accessibility).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryReport {
    pub score: u8,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityReport {
    pub score: u8,
    pub headers: SecurityHeaderSet,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

/// The complete health report for one URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub performance: PerformanceReport,
    pub seo: CategoryReport,
    pub accessibility: CategoryReport,
    pub security: SecurityReport,
    #[serde(default)]
    pub suggestions: Vec<String>,
    pub summary: String,
}

impl AnalysisReport {
    /// The four category scores in canonical order.
    pub fn scores(&self) -> CategoryScores {
        CategoryScores {
            performance: self.performance.score,
            seo: self.seo.score,
            accessibility: self.accessibility.score,
            security: self.security.score,
        }
    }

    /// Total number of issues across all categories.
    pub fn issue_count(&self) -> usize {
        self.seo.issues.len() + self.accessibility.issues.len() + self.security.issues.len()
    }
}

/// The four normalized category scores of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryScores {
    pub performance: u8,
    pub seo: u8,
    pub accessibility: u8,
    pub security: u8,
}

impl CategoryScores {
    /// Integer mean of the four scores, rounded down.
    pub fn overall(&self) -> u8 {
        (self.sum() / 4) as u8
    }

    /// Mean of the four scores, rounded to nearest.
    pub fn rounded_mean(&self) -> u8 {
        (self.sum() as f64 / 4.0).round() as u8
    }

    fn sum(&self) -> u32 {
        self.performance as u32 + self.seo as u32 + self.accessibility as u32 + self.security as u32
    }
}

/// Security header tracked by the probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SecurityHeader {
    StrictTransportSecurity,
    ContentSecurityPolicy,
    XFrameOptions,
    XContentTypeOptions,
    ReferrerPolicy,
}

impl SecurityHeader {
    /// All tracked headers, in scoring order.
    pub const ALL: [SecurityHeader; 5] = [
        SecurityHeader::StrictTransportSecurity,
        SecurityHeader::ContentSecurityPolicy,
        SecurityHeader::XFrameOptions,
        SecurityHeader::XContentTypeOptions,
        SecurityHeader::ReferrerPolicy,
    ];

    /// Lower-case wire name of the header.
    pub fn name(&self) -> &'static str {
        match self {
            SecurityHeader::StrictTransportSecurity => "strict-transport-security",
            SecurityHeader::ContentSecurityPolicy => "content-security-policy",
            SecurityHeader::XFrameOptions => "x-frame-options",
            SecurityHeader::XContentTypeOptions => "x-content-type-options",
            SecurityHeader::ReferrerPolicy => "referrer-policy",
        }
    }

    /// Points awarded when the header is present. The five values sum to 100.
    pub fn points(&self) -> u8 {
        match self {
            SecurityHeader::StrictTransportSecurity => 25,
            SecurityHeader::ContentSecurityPolicy => 25,
            SecurityHeader::XFrameOptions => 20,
            SecurityHeader::XContentTypeOptions => 15,
            SecurityHeader::ReferrerPolicy => 15,
        }
    }
}

impl fmt::Display for SecurityHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Observed values of the tracked security headers.
///
/// Serializes as a map with every tracked header present as a key and
/// `null` for headers the response did not carry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Option<String>>", into = "BTreeMap<String, Option<String>>")]
pub struct SecurityHeaderSet {
    values: BTreeMap<SecurityHeader, String>,
}

impl SecurityHeaderSet {
    /// An empty set: every header absent.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Record a header value. Names outside the tracked set are ignored.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        if let Some(header) = SecurityHeader::ALL
            .iter()
            .find(|h| h.name().eq_ignore_ascii_case(name.trim()))
        {
            self.values.insert(*header, value.into());
        }
    }

    pub fn get(&self, header: SecurityHeader) -> Option<&str> {
        self.values.get(&header).map(String::as_str)
    }

    pub fn is_present(&self, header: SecurityHeader) -> bool {
        self.values.contains_key(&header)
    }

    /// Tracked headers the response did not carry, in scoring order.
    pub fn missing(&self) -> Vec<SecurityHeader> {
        SecurityHeader::ALL
            .iter()
            .copied()
            .filter(|h| !self.is_present(*h))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<BTreeMap<String, Option<String>>> for SecurityHeaderSet {
    fn from(map: BTreeMap<String, Option<String>>) -> Self {
        let mut set = SecurityHeaderSet::empty();
        for (name, value) in map {
            if let Some(value) = value {
                set.insert(&name, value);
            }
        }
        set
    }
}

impl From<SecurityHeaderSet> for BTreeMap<String, Option<String>> {
    fn from(set: SecurityHeaderSet) -> Self {
        SecurityHeader::ALL
            .iter()
            .map(|h| (h.name().to_string(), set.get(*h).map(String::from)))
            .collect()
    }
}

/// Signed per-category difference between a snapshot and its predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreDelta {
    pub performance_score_delta: i32,
    pub seo_score_delta: i32,
    pub accessibility_score_delta: i32,
    pub security_score_delta: i32,
    pub overall_score_delta: i32,
}

impl ScoreDelta {
    /// Compute `current - previous` for every score.
    pub fn between(current: &Snapshot, previous: &Snapshot) -> Self {
        let diff = |c: u8, p: u8| c as i32 - p as i32;
        Self {
            performance_score_delta: diff(current.performance_score, previous.performance_score),
            seo_score_delta: diff(current.seo_score, previous.seo_score),
            accessibility_score_delta: diff(
                current.accessibility_score,
                previous.accessibility_score,
            ),
            security_score_delta: diff(current.security_score, previous.security_score),
            overall_score_delta: diff(current.overall_score, previous.overall_score),
        }
    }
}

/// Report highlights frozen into a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotInsights {
    pub summary: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
    pub issue_count: usize,
}

impl From<&AnalysisReport> for SnapshotInsights {
    fn from(report: &AnalysisReport) -> Self {
        Self {
            summary: report.summary.clone(),
            suggestions: report.suggestions.clone(),
            issue_count: report.issue_count(),
        }
    }
}

/// One persisted, immutable analysis result for a website.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub id: String,
    pub website_id: String,
    pub snapshot_date: DateTime<Utc>,
    pub performance_score: u8,
    pub seo_score: u8,
    pub accessibility_score: u8,
    pub security_score: u8,
    pub overall_score: u8,
    pub change_from_previous: Option<ScoreDelta>,
    pub insights: SnapshotInsights,
    pub created_at: DateTime<Utc>,
}
