//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::config::Strategy;
use clap::Parser;
use std::path::PathBuf;

/// SiteHealth - website health analysis with historical tracking
///
/// Scores a website's performance, SEO, accessibility and security,
/// and keeps a snapshot history so changes between runs are visible.
///
/// Examples:
///   sitehealth --url https://example.com
///   sitehealth --url example.com --website example --format json
///   sitehealth --website example --history
///   sitehealth --url https://example.com --fail-below 70
///   sitehealth --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Website URL to analyze
    ///
    /// A bare host such as `example.com` is analyzed over https.
    /// Not required with --history or --init-config.
    #[arg(
        short,
        long,
        value_name = "URL",
        required_unless_present_any = ["init_config", "history"]
    )]
    pub url: Option<String>,

    /// Website identifier to record the result under
    ///
    /// When set, the report is stored as a snapshot and the change
    /// from the previous snapshot is included in the output.
    #[arg(short, long, value_name = "ID")]
    pub website: Option<String>,

    /// Print the snapshot history of --website instead of analyzing
    #[arg(long, requires = "website")]
    pub history: bool,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// PageSpeed Insights API key
    ///
    /// Without a key, a synthetic report is produced.
    #[arg(long, env = "PAGESPEED_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Device strategy for the audit (mobile, desktop)
    #[arg(long, value_name = "STRATEGY")]
    pub strategy: Option<Strategy>,

    /// Audit API request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// SQLite database holding the snapshot history
    #[arg(long, value_name = "FILE", env = "SITEHEALTH_DATABASE")]
    pub database: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .sitehealth.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Fail if the overall score is below this value
    ///
    /// Useful for CI pipelines. Exit code 2 when the threshold is missed.
    #[arg(long, value_name = "SCORE")]
    pub fail_below: Option<u8>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .sitehealth.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.history {
            if self.website.as_deref().map_or(true, |w| w.trim().is_empty()) {
                return Err("--history requires a non-empty --website".to_string());
            }
        } else if self.url.as_deref().map_or(true, |u| u.trim().is_empty()) {
            return Err("A URL is required (use --url)".to_string());
        }

        if let Some(ref website) = self.website {
            if website.trim().is_empty() {
                return Err("Website identifier must not be empty".to_string());
            }
        }

        if let Some(threshold) = self.fail_below {
            if threshold > 100 {
                return Err("--fail-below must be between 0 and 100".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        Ok(())
    }
}
