//! Score aggregation and issue derivation.
//!
//! This module turns raw collector output into the four category scores
//! and the issue, recommendation and suggestion lists of a report.

use super::fallback::generate_fallback;
use crate::collectors::{AuditData, Outcome};
use crate::models::{
    clamp_score, scale_provider_score, AnalysisReport, Category, CategoryReport, CategoryScores,
    PerformanceMetrics, PerformanceReport, SecurityHeader, SecurityHeaderSet, SecurityReport,
    NOT_AVAILABLE,
};
use tracing::{debug, warn};

/// A Lighthouse audit whose literal zero score produces a named finding.
struct AuditRule {
    audit_id: &'static str,
    issue: &'static str,
    recommendation: &'static str,
}

const SEO_RULES: &[AuditRule] = &[
    AuditRule {
        audit_id: "meta-description",
        issue: "Missing or inadequate meta description",
        recommendation: "Add a unique meta description of 150-160 characters to every page",
    },
    AuditRule {
        audit_id: "document-title",
        issue: "Missing or inadequate page title",
        recommendation: "Give every page a unique, descriptive <title> element",
    },
    AuditRule {
        audit_id: "link-text",
        issue: "Links do not have descriptive text",
        recommendation: "Replace generic link text such as \"click here\" with descriptive text",
    },
    AuditRule {
        audit_id: "crawlable-anchors",
        issue: "Links are not crawlable",
        recommendation: "Use <a> elements with resolvable href attributes for navigation",
    },
    AuditRule {
        audit_id: "is-crawlable",
        issue: "Page is blocked from indexing",
        recommendation: "Remove noindex directives and robots.txt rules blocking this page",
    },
    AuditRule {
        audit_id: "hreflang",
        issue: "Invalid hreflang attributes",
        recommendation: "Use valid language codes in hreflang link elements",
    },
    AuditRule {
        audit_id: "canonical",
        issue: "Invalid canonical URL",
        recommendation: "Point rel=canonical at a valid, indexable URL",
    },
];

const ACCESSIBILITY_RULES: &[AuditRule] = &[
    AuditRule {
        audit_id: "image-alt",
        issue: "Images missing alt text",
        recommendation: "Add descriptive alt attributes to all informative images",
    },
    AuditRule {
        audit_id: "color-contrast",
        issue: "Insufficient color contrast",
        recommendation: "Raise text contrast to at least 4.5:1 against its background",
    },
    AuditRule {
        audit_id: "label",
        issue: "Form elements missing labels",
        recommendation: "Associate a <label> with every form control",
    },
    AuditRule {
        audit_id: "button-name",
        issue: "Buttons missing accessible names",
        recommendation: "Give every button visible text or an aria-label",
    },
    AuditRule {
        audit_id: "html-has-lang",
        issue: "Page missing lang attribute",
        recommendation: "Declare the page language with a lang attribute on <html>",
    },
    AuditRule {
        audit_id: "link-name",
        issue: "Links missing discernible names",
        recommendation: "Ensure every link has text or an accessible name",
    },
];

/// Named issue and recommendation for a missing security header.
pub fn header_finding(header: SecurityHeader) -> (&'static str, &'static str) {
    match header {
        SecurityHeader::StrictTransportSecurity => (
            "Missing Strict-Transport-Security header",
            "Add an HSTS header to force HTTPS connections",
        ),
        SecurityHeader::ContentSecurityPolicy => (
            "Missing Content-Security-Policy header",
            "Implement a Content Security Policy to mitigate XSS attacks",
        ),
        SecurityHeader::XFrameOptions => (
            "Missing X-Frame-Options header",
            "Add X-Frame-Options: DENY or SAMEORIGIN to prevent clickjacking",
        ),
        SecurityHeader::XContentTypeOptions => (
            "Missing X-Content-Type-Options header",
            "Add X-Content-Type-Options: nosniff to prevent MIME sniffing",
        ),
        SecurityHeader::ReferrerPolicy => (
            "Missing Referrer-Policy header",
            "Set a Referrer-Policy to limit referrer information leakage",
        ),
    }
}

/// Category thresholds below which a pair of generic suggestions applies.
const SUGGESTION_RULES: &[(Category, u8, [&str; 2])] = &[
    (
        Category::Performance,
        80,
        [
            "Optimize images and serve them in modern formats such as WebP or AVIF",
            "Reduce render-blocking JavaScript and CSS",
        ],
    ),
    (
        Category::Seo,
        85,
        [
            "Improve meta descriptions and page titles for better search visibility",
            "Add structured data to help search engines understand your content",
        ],
    ),
    (
        Category::Accessibility,
        80,
        [
            "Ensure all images have descriptive alt text",
            "Improve color contrast and keyboard navigation",
        ],
    ),
    (
        Category::Security,
        70,
        [
            "Configure the essential security headers on your web server",
            "Enforce HTTPS across the entire site",
        ],
    ),
];

/// Build a report from whatever the collectors returned.
///
/// A failed audit collector hands the whole report to the fallback
/// generator; a failed header probe counts as an empty header set.
pub fn aggregate(audit: Outcome<AuditData>, headers: Outcome<SecurityHeaderSet>) -> AnalysisReport {
    let Outcome::Succeeded(audit) = audit else {
        warn!("Audit data unavailable, generating fallback report");
        return generate_fallback();
    };

    let headers = headers.into_option().unwrap_or_default();
    build_report(&audit, &headers)
}

/// Build a report from real audit data and an observed header set.
pub fn build_report(audit: &AuditData, headers: &SecurityHeaderSet) -> AnalysisReport {
    let performance = PerformanceReport {
        score: provider_score(audit, Category::Performance),
        metrics: extract_metrics(audit),
    };

    let seo = category_report(
        provider_score(audit, Category::Seo),
        audit,
        SEO_RULES,
    );
    let accessibility = category_report(
        provider_score(audit, Category::Accessibility),
        audit,
        ACCESSIBILITY_RULES,
    );
    let security = security_report(headers);

    let scores = CategoryScores {
        performance: performance.score,
        seo: seo.score,
        accessibility: accessibility.score,
        security: security.score,
    };
    debug!("Aggregated scores: {:?}", scores);

    AnalysisReport {
        performance,
        seo,
        accessibility,
        security,
        suggestions: suggestions_for(&scores),
        summary: summary_for(&scores).to_string(),
    }
}

/// Scaled provider score; a category the provider did not score counts as 0.
fn provider_score(audit: &AuditData, category: Category) -> u8 {
    match audit.category_score(category) {
        Some(score) => scale_provider_score(score),
        None => {
            debug!("No {} score in audit data", category);
            0
        }
    }
}

/// Metric display values, verbatim, or "N/A".
pub fn extract_metrics(audit: &AuditData) -> PerformanceMetrics {
    let metric = |id: &str| {
        audit
            .display_value(id)
            .map(String::from)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    };

    PerformanceMetrics {
        fcp: metric("first-contentful-paint"),
        lcp: metric("largest-contentful-paint"),
        cls: metric("cumulative-layout-shift"),
        fid: metric("max-potential-fid"),
    }
}

fn category_report(score: u8, audit: &AuditData, rules: &[AuditRule]) -> CategoryReport {
    let mut report = CategoryReport {
        score,
        issues: Vec::new(),
        recommendations: Vec::new(),
    };

    for rule in rules {
        if audit.audit_score(rule.audit_id) == Some(0.0) {
            report.issues.push(rule.issue.to_string());
            report.recommendations.push(rule.recommendation.to_string());
        }
    }

    report
}

/// Security score from the fixed header point allocation, clamped to 0-100.
pub fn security_score(headers: &SecurityHeaderSet) -> u8 {
    let points: i64 = SecurityHeader::ALL
        .iter()
        .filter(|h| headers.is_present(**h))
        .map(|h| h.points() as i64)
        .sum();
    clamp_score(points)
}

/// Security section: one issue and one recommendation per missing header.
pub fn security_report(headers: &SecurityHeaderSet) -> SecurityReport {
    let (issues, recommendations): (Vec<String>, Vec<String>) = headers
        .missing()
        .into_iter()
        .map(|h| {
            let (issue, recommendation) = header_finding(h);
            (issue.to_string(), recommendation.to_string())
        })
        .unzip();

    SecurityReport {
        score: security_score(headers),
        headers: headers.clone(),
        issues,
        recommendations,
    }
}

/// Cross-category suggestions for every category under its threshold.
pub fn suggestions_for(scores: &CategoryScores) -> Vec<String> {
    SUGGESTION_RULES
        .iter()
        .filter(|(category, threshold, _)| score_of(scores, *category) < *threshold)
        .flat_map(|(_, _, pair)| pair.iter().map(|s| s.to_string()))
        .collect()
}

fn score_of(scores: &CategoryScores, category: Category) -> u8 {
    match category {
        Category::Performance => scores.performance,
        Category::Seo => scores.seo,
        Category::Accessibility => scores.accessibility,
        Category::Security => scores.security,
    }
}

/// One-line summary chosen from the rounded mean of the four scores.
pub fn summary_for(scores: &CategoryScores) -> &'static str {
    match scores.rounded_mean() {
        90..=u8::MAX => {
            "Excellent! Your website performs exceptionally well across all categories."
        }
        75..=89 => "Good overall health, with some room for improvement.",
        60..=74 => "Moderate health. Several areas need attention to improve the user experience.",
        _ => "Your website needs significant improvement across multiple categories.",
    }
}
