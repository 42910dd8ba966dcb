//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.sitehealth.toml` files.

use crate::models::Category;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = ".sitehealth.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Audit API settings.
    #[serde(default)]
    pub audit: AuditConfig,

    /// Security header probe settings.
    #[serde(default)]
    pub probe: ProbeConfig,

    /// Snapshot store settings.
    #[serde(default)]
    pub store: StoreConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "sitehealth_report.md".to_string()
}

/// Device profile the audit API emulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Mobile,
    Desktop,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Mobile => "mobile",
            Strategy::Desktop => "desktop",
        }
    }
}

/// Performance-audit API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// PageSpeed Insights endpoint.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// API key. Without one, analysis falls back to synthetic reports.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Device strategy.
    #[serde(default)]
    pub strategy: Strategy,

    /// Request timeout in seconds.
    #[serde(default = "default_audit_timeout")]
    pub timeout_seconds: u64,

    /// Categories requested from the API.
    #[serde(default = "default_categories")]
    pub categories: Vec<Category>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: None,
            strategy: Strategy::default(),
            timeout_seconds: default_audit_timeout(),
            categories: default_categories(),
        }
    }
}

impl AuditConfig {
    /// The API key, if one is set and non-blank.
    pub fn credentials(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

fn default_api_url() -> String {
    "https://www.googleapis.com/pagespeedonline/v5/runPagespeed".to_string()
}

fn default_audit_timeout() -> u64 {
    60 // Lighthouse runs on the provider side routinely take 20-40s
}

fn default_categories() -> Vec<Category> {
    Category::AUDITED.to_vec()
}

/// Security header probe settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Request timeout in seconds.
    #[serde(default = "default_probe_timeout")]
    pub timeout_seconds: u64,

    /// User agent sent with the probe request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_probe_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_probe_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("sitehealth/{}", env!("CARGO_PKG_VERSION"))
}

/// Snapshot store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database path.
    #[serde(default = "default_database")]
    pub database: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
        }
    }
}

fn default_database() -> PathBuf {
    PathBuf::from("sitehealth.db")
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Check settings that parse but cannot be used.
    pub fn validate(&self) -> Result<()> {
        if let Some(category) = self
            .audit
            .categories
            .iter()
            .find(|c| !Category::AUDITED.contains(c))
        {
            bail!(
                "audit.categories: '{}' is not scored by the audit API",
                category.to_string().to_lowercase()
            );
        }
        Ok(())
    }

    /// Log level after merging with CLI arguments. `--quiet` always wins.
    pub fn log_level(&self, quiet: bool) -> tracing::Level {
        if quiet {
            tracing::Level::ERROR
        } else if self.general.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref key) = args.api_key {
            self.audit.api_key = Some(key.clone());
        }
        if let Some(strategy) = args.strategy {
            self.audit.strategy = strategy;
        }
        if let Some(timeout) = args.timeout {
            self.audit.timeout_seconds = timeout;
        }

        if let Some(ref database) = args.database {
            self.store.database = database.clone();
        }

        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Args;
    use clap::Parser;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.audit.strategy, Strategy::Mobile);
        assert_eq!(config.audit.categories.len(), 3);
        assert!(config.audit.credentials().is_none());
        assert_eq!(config.probe.timeout_seconds, 10);
        assert_eq!(config.store.database, PathBuf::from("sitehealth.db"));
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "health.md"
verbose = true

[audit]
api_key = "abc123"
strategy = "desktop"
categories = ["performance", "seo"]

[probe]
timeout_seconds = 3
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output, "health.md");
        assert!(config.general.verbose);
        assert_eq!(config.audit.credentials(), Some("abc123"));
        assert_eq!(config.audit.strategy, Strategy::Desktop);
        assert_eq!(
            config.audit.categories,
            vec![Category::Performance, Category::Seo]
        );
        assert_eq!(config.audit.timeout_seconds, 60);
        assert_eq!(config.probe.timeout_seconds, 3);
    }

    #[test]
    fn test_blank_api_key_is_no_credentials() {
        let mut config = Config::default();
        config.audit.api_key = Some("   ".to_string());
        assert!(config.audit.credentials().is_none());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[audit]"));
        assert!(toml_str.contains("[probe]"));
        assert!(toml_str.contains("[store]"));
    }

    #[test]
    fn test_verbose_setting_controls_log_level() {
        let mut config: Config = toml::from_str("[general]\nverbose = true\n").unwrap();
        let args = Args::try_parse_from(["sitehealth", "--url", "example.com"]).unwrap();
        config.merge_with_args(&args);

        assert_eq!(config.log_level(args.quiet), tracing::Level::DEBUG);
        assert_eq!(config.log_level(true), tracing::Level::ERROR);
        assert_eq!(Config::default().log_level(false), tracing::Level::INFO);
    }

    #[test]
    fn test_verbose_flag_overrides_file() {
        let mut config = Config::default();
        let args =
            Args::try_parse_from(["sitehealth", "--url", "example.com", "--verbose"]).unwrap();
        config.merge_with_args(&args);

        assert_eq!(config.log_level(args.quiet), tracing::Level::DEBUG);
    }

    #[test]
    fn test_security_category_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[audit]\ncategories = [\"performance\", \"security\"]\n")
            .unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("'security'"));

        let config: Config = toml::from_str("[audit]\ncategories = [\"seo\"]\n").unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[store]\ndatabase = \"history.db\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.store.database, PathBuf::from("history.db"));
        assert_eq!(config.general.output, "sitehealth_report.md");
    }
}
