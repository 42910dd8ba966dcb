//! Markdown and JSON report generation.
//!
//! Renders a single [`AnalysisReport`] (optionally with the snapshot it was
//! recorded as) and the snapshot history of a website.

use crate::models::{
    AnalysisReport, CategoryReport, PerformanceMetrics, ScoreDelta, SecurityHeader,
    SecurityReport, Snapshot,
};
use anyhow::Result;
use chrono::Utc;
use serde::Serialize;

/// Generate a complete Markdown health report for `url`.
pub fn generate_markdown_report(
    url: &str,
    report: &AnalysisReport,
    snapshot: Option<&Snapshot>,
) -> String {
    let mut output = String::new();

    output.push_str("# Website Health Report\n\n");
    output.push_str(&generate_metadata_section(url, snapshot));
    output.push_str(&generate_scores_section(report));

    if let Some(delta) = snapshot.and_then(|s| s.change_from_previous.as_ref()) {
        output.push_str(&generate_change_section(delta));
    }

    output.push_str(&generate_metrics_section(&report.performance.metrics));
    output.push_str(&generate_category_section("SEO", &report.seo));
    output.push_str(&generate_category_section(
        "Accessibility",
        &report.accessibility,
    ));
    output.push_str(&generate_security_section(&report.security));
    output.push_str(&generate_suggestions_section(&report.suggestions));
    output.push_str(&generate_footer());

    output
}

fn generate_metadata_section(url: &str, snapshot: Option<&Snapshot>) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **URL:** {}\n", url));

    match snapshot {
        Some(snapshot) => {
            section.push_str(&format!("- **Website:** `{}`\n", snapshot.website_id));
            section.push_str(&format!(
                "- **Snapshot Date:** {}\n",
                snapshot.snapshot_date.format("%Y-%m-%d %H:%M:%S UTC")
            ));
            section.push_str(&format!("- **Snapshot ID:** `{}`\n", snapshot.id));
        }
        None => {
            section.push_str(&format!(
                "- **Analysis Date:** {}\n",
                Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
            ));
        }
    }
    section.push('\n');

    section
}

fn generate_scores_section(report: &AnalysisReport) -> String {
    let scores = report.scores();
    let mut section = String::new();

    section.push_str("## Scores\n\n");
    section.push_str("| Performance | SEO | Accessibility | Security | **Overall** |\n");
    section.push_str("|:---:|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} | **{}** |\n\n",
        scores.performance,
        scores.seo,
        scores.accessibility,
        scores.security,
        scores.overall()
    ));
    section.push_str(&format!("{}\n\n", report.summary));

    section
}

fn generate_change_section(delta: &ScoreDelta) -> String {
    let mut section = String::new();

    section.push_str("## Change from Previous\n\n");
    section.push_str("| Performance | SEO | Accessibility | Security | **Overall** |\n");
    section.push_str("|:---:|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} | **{}** |\n\n",
        signed(delta.performance_score_delta),
        signed(delta.seo_score_delta),
        signed(delta.accessibility_score_delta),
        signed(delta.security_score_delta),
        signed(delta.overall_score_delta)
    ));

    section
}

fn generate_metrics_section(metrics: &PerformanceMetrics) -> String {
    let mut section = String::new();

    section.push_str("## Performance Metrics\n\n");
    section.push_str("| Metric | Value |\n");
    section.push_str("|:---|:---:|\n");
    section.push_str(&format!("| First Contentful Paint | {} |\n", metrics.fcp));
    section.push_str(&format!("| Largest Contentful Paint | {} |\n", metrics.lcp));
    section.push_str(&format!("| Cumulative Layout Shift | {} |\n", metrics.cls));
    section.push_str(&format!("| Max Potential First Input Delay | {} |\n", metrics.fid));
    section.push('\n');

    section
}

fn generate_category_section(title: &str, category: &CategoryReport) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {} ({}/100)\n\n", title, category.score));
    section.push_str(&generate_findings(&category.issues, &category.recommendations));

    section
}

fn generate_security_section(security: &SecurityReport) -> String {
    let mut section = String::new();

    section.push_str(&format!("## Security ({}/100)\n\n", security.score));
    section.push_str("| Header | Status |\n");
    section.push_str("|:---|:---|\n");
    for header in SecurityHeader::ALL {
        let status = match security.headers.get(header) {
            Some(value) => format!("✅ `{}`", value),
            None => "❌ missing".to_string(),
        };
        section.push_str(&format!("| `{}` | {} |\n", header.name(), status));
    }
    section.push('\n');
    section.push_str(&generate_findings(&security.issues, &security.recommendations));

    section
}

/// Issues paired with their recommendation.
fn generate_findings(issues: &[String], recommendations: &[String]) -> String {
    if issues.is_empty() {
        return "No issues found. 🎉\n\n".to_string();
    }

    let mut block = String::new();
    for (i, issue) in issues.iter().enumerate() {
        block.push_str(&format!("- **{}**\n", issue));
        if let Some(rec) = recommendations.get(i) {
            block.push_str(&format!("  > 💡 {}\n", rec));
        }
    }
    block.push('\n');

    block
}

fn generate_suggestions_section(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Suggestions\n\n");
    for (i, suggestion) in suggestions.iter().enumerate() {
        section.push_str(&format!("{}. {}\n", i + 1, suggestion));
    }
    section.push('\n');

    section
}

fn generate_footer() -> String {
    format!(
        "---\n\n*Report generated by sitehealth v{}*\n",
        env!("CARGO_PKG_VERSION")
    )
}

/// Generate a Markdown table of a website's snapshots, newest first.
pub fn generate_history_markdown(website_id: &str, snapshots: &[Snapshot]) -> String {
    let mut output = String::new();

    output.push_str(&format!("# Health History: `{}`\n\n", website_id));

    if snapshots.is_empty() {
        output.push_str("No snapshots recorded yet.\n");
        return output;
    }

    output.push_str(&format!("{} snapshot(s), newest first.\n\n", snapshots.len()));
    output.push_str(
        "| Date | Performance | SEO | Accessibility | Security | Overall | Change | Issues |\n",
    );
    output.push_str("|:---|:---:|:---:|:---:|:---:|:---:|:---:|:---:|\n");

    for snapshot in snapshots {
        let change = snapshot
            .change_from_previous
            .map(|d| signed(d.overall_score_delta))
            .unwrap_or_else(|| "-".to_string());
        output.push_str(&format!(
            "| {} | {} | {} | {} | {} | **{}** | {} | {} |\n",
            snapshot.snapshot_date.format("%Y-%m-%d %H:%M"),
            snapshot.performance_score,
            snapshot.seo_score,
            snapshot.accessibility_score,
            snapshot.security_score,
            snapshot.overall_score,
            change,
            snapshot.insights.issue_count
        ));
    }
    output.push('\n');

    output
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportDocument<'a> {
    url: &'a str,
    report: &'a AnalysisReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    snapshot: Option<&'a Snapshot>,
}

/// Generate a JSON report.
pub fn generate_json_report(
    url: &str,
    report: &AnalysisReport,
    snapshot: Option<&Snapshot>,
) -> Result<String> {
    let document = ReportDocument {
        url,
        report,
        snapshot,
    };
    serde_json::to_string_pretty(&document).map_err(Into::into)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryDocument<'a> {
    website_id: &'a str,
    snapshots: &'a [Snapshot],
}

/// Generate the JSON form of a website's history.
pub fn generate_history_json(website_id: &str, snapshots: &[Snapshot]) -> Result<String> {
    let document = HistoryDocument {
        website_id,
        snapshots,
    };
    serde_json::to_string_pretty(&document).map_err(Into::into)
}

fn signed(value: i32) -> String {
    if value > 0 {
        format!("+{}", value)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        CategoryReport, PerformanceReport, SecurityHeaderSet, SnapshotInsights,
    };
    use chrono::TimeZone;

    fn create_test_report() -> AnalysisReport {
        let mut headers = SecurityHeaderSet::empty();
        headers.insert("strict-transport-security", "max-age=63072000");

        AnalysisReport {
            performance: PerformanceReport {
                score: 82,
                metrics: PerformanceMetrics {
                    fcp: "1.2 s".to_string(),
                    lcp: "2.9 s".to_string(),
                    ..Default::default()
                },
            },
            seo: CategoryReport {
                score: 91,
                issues: vec!["Missing or inadequate meta description".to_string()],
                recommendations: vec!["Add a meta description".to_string()],
            },
            accessibility: CategoryReport {
                score: 88,
                issues: vec![],
                recommendations: vec![],
            },
            security: SecurityReport {
                score: 25,
                headers,
                issues: vec!["Missing Content-Security-Policy header".to_string()],
                recommendations: vec!["Define a Content-Security-Policy".to_string()],
            },
            suggestions: vec!["Configure the essential security headers".to_string()],
            summary: "Moderate health".to_string(),
        }
    }

    fn create_test_snapshot(delta: Option<ScoreDelta>) -> Snapshot {
        Snapshot {
            id: "3f1c2a9e-0000-4000-8000-000000000001".to_string(),
            website_id: "example".to_string(),
            snapshot_date: Utc.with_ymd_and_hms(2024, 6, 1, 9, 15, 0).unwrap(),
            performance_score: 82,
            seo_score: 91,
            accessibility_score: 88,
            security_score: 25,
            overall_score: 71,
            change_from_previous: delta,
            insights: SnapshotInsights {
                summary: "Moderate health".to_string(),
                suggestions: vec![],
                issue_count: 2,
            },
            created_at: Utc.with_ymd_and_hms(2024, 6, 1, 9, 15, 0).unwrap(),
        }
    }

    fn delta(overall: i32) -> ScoreDelta {
        ScoreDelta {
            performance_score_delta: 4,
            seo_score_delta: 0,
            accessibility_score_delta: -2,
            security_score_delta: 25,
            overall_score_delta: overall,
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report();
        let markdown = generate_markdown_report("https://example.com/", &report, None);

        assert!(markdown.contains("# Website Health Report"));
        assert!(markdown.contains("https://example.com/"));
        assert!(markdown.contains("| 82 | 91 | 88 | 25 | **71** |"));
        assert!(markdown.contains("| Largest Contentful Paint | 2.9 s |"));
        assert!(markdown.contains("| Cumulative Layout Shift | N/A |"));
        assert!(markdown.contains("Missing or inadequate meta description"));
        assert!(markdown.contains("## Accessibility (88/100)\n\nNo issues found."));
        assert!(!markdown.contains("Change from Previous"));
    }

    #[test]
    fn test_security_section_lists_every_header() {
        let section = generate_security_section(&create_test_report().security);

        assert!(section.contains("| `strict-transport-security` | ✅ `max-age=63072000` |"));
        assert!(section.contains("| `referrer-policy` | ❌ missing |"));
        assert_eq!(section.matches("| `").count(), 5);
    }

    #[test]
    fn test_markdown_includes_change_section() {
        let report = create_test_report();
        let snapshot = create_test_snapshot(Some(delta(6)));
        let markdown = generate_markdown_report("https://example.com/", &report, Some(&snapshot));

        assert!(markdown.contains("- **Website:** `example`"));
        assert!(markdown.contains("## Change from Previous"));
        assert!(markdown.contains("| +4 | 0 | -2 | +25 | **+6** |"));
    }

    #[test]
    fn test_generate_history_markdown() {
        let snapshots = vec![
            create_test_snapshot(Some(delta(-3))),
            create_test_snapshot(None),
        ];
        let markdown = generate_history_markdown("example", &snapshots);

        assert!(markdown.contains("# Health History: `example`"));
        assert!(markdown.contains("2 snapshot(s)"));
        assert!(markdown.contains("| 2024-06-01 09:15 | 82 | 91 | 88 | 25 | **71** | -3 | 2 |"));
        assert!(markdown.contains("| **71** | - | 2 |"));

        let empty = generate_history_markdown("nobody", &[]);
        assert!(empty.contains("No snapshots recorded yet."));
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = generate_json_report("https://example.com/", &report, None).unwrap();

        assert!(json.contains("\"report\""));
        assert!(json.contains("\"suggestions\""));
        assert!(!json.contains("\"snapshot\""));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["report"]["performance"]["score"], 82);
        assert!(value["report"]["security"]["headers"]["x-frame-options"].is_null());
    }

    #[test]
    fn test_generate_history_json() {
        let snapshots = vec![create_test_snapshot(Some(delta(5)))];
        let json = generate_history_json("example", &snapshots).unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["websiteId"], "example");
        assert_eq!(
            value["snapshots"][0]["changeFromPrevious"]["overallScoreDelta"],
            5
        );
    }

    #[test]
    fn test_signed() {
        assert_eq!(signed(7), "+7");
        assert_eq!(signed(0), "0");
        assert_eq!(signed(-4), "-4");
    }
}
