//! SiteHealth - website health analysis with historical tracking
//!
//! A CLI tool that scores a website's performance, SEO, accessibility
//! and security, and records each run as a snapshot so changes over
//! time can be tracked.
//!
//! Exit codes:
//!   0 - Success (overall score at or above --fail-below, or no threshold set)
//!   1 - Runtime error (invalid URL, config, database failure, etc.)
//!   2 - Overall score below the --fail-below threshold

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use sitehealth::analysis::normalize_url;
use sitehealth::cli::{Args, OutputFormat};
use sitehealth::config::{Config, CONFIG_FILE_NAME};
use sitehealth::models::{AnalysisReport, Snapshot};
use sitehealth::{report, Analyzer, SnapshotStore};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Config is loaded first so `[general] verbose` can set the log level
    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(config.log_level(args.quiet));

    info!("SiteHealth v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    let result = if args.history {
        run_history(&args, &config)
    } else {
        run_analysis(&args, &config).await
    };

    match result {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .sitehealth.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Add your PageSpeed Insights API key under [audit].");
    Ok(())
}

fn init_logging(level: Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Analyze a URL, optionally record it, and write the report. Returns the exit code.
async fn run_analysis(args: &Args, config: &Config) -> Result<i32> {
    let start_time = Instant::now();

    let raw_url = args.url.as_deref().unwrap_or_default();
    let url = normalize_url(raw_url)?.to_string();

    let analyzer = Analyzer::from_config(config).context("Failed to build HTTP clients")?;

    if !args.quiet {
        println!("🔬 Analyzing {}", url);
        if analyzer.is_configured() {
            println!(
                "   Strategy: {} | Timeout: {}s",
                config.audit.strategy.as_str(),
                config.audit.timeout_seconds
            );
        } else {
            println!("   ⚠️  No PageSpeed API key configured: scores will be synthetic");
        }
    }

    let spinner = progress_spinner(args.quiet);
    let analysis = analyzer.analyze(&url).await;
    spinner.finish_and_clear();
    let report = analysis?;

    let snapshot = match args.website {
        Some(ref website_id) => Some(record(&config.store.database, website_id, &report)?),
        None => None,
    };

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&url, &report, snapshot.as_ref())?,
        OutputFormat::Markdown => {
            report::generate_markdown_report(&url, &report, snapshot.as_ref())
        }
    };

    let output_path = PathBuf::from(&config.general.output);
    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    let overall = report.scores().overall();
    if !args.quiet {
        print_summary(&report, snapshot.as_ref(), start_time.elapsed());
        println!(
            "\n✅ Analysis complete! Report saved to: {}",
            output_path.display()
        );
    }

    if let Some(threshold) = args.fail_below {
        if overall < threshold {
            eprintln!(
                "\n⛔ Overall score {} is below {}. Failing (exit code 2).",
                overall, threshold
            );
            return Ok(2);
        }
    }

    Ok(0)
}

/// Print or write the snapshot history of --website.
fn run_history(args: &Args, config: &Config) -> Result<i32> {
    let website_id = args.website.as_deref().unwrap_or_default();

    let store = open_store(&config.store.database)?;
    let snapshots = store
        .get_history(website_id)
        .with_context(|| format!("Failed to read history for '{}'", website_id))?;
    info!("Found {} snapshot(s) for {}", snapshots.len(), website_id);

    let output = match args.format {
        OutputFormat::Json => report::generate_history_json(website_id, &snapshots)?,
        OutputFormat::Markdown => report::generate_history_markdown(website_id, &snapshots),
    };

    match args.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write history to {}", path.display()))?;
            if !args.quiet {
                println!("✅ History saved to: {}", path.display());
            }
        }
        None => println!("{}", output),
    }

    Ok(0)
}

fn record(database: &Path, website_id: &str, report: &AnalysisReport) -> Result<Snapshot> {
    let store = open_store(database)?;
    store
        .record_snapshot(website_id, report)
        .with_context(|| format!("Failed to record snapshot for '{}'", website_id))
}

fn open_store(database: &Path) -> Result<SnapshotStore> {
    SnapshotStore::open(database)
        .with_context(|| format!("Failed to open snapshot database {}", database.display()))
}

fn progress_spinner(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} [{elapsed}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.set_message("Collecting audit and security header signals...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn print_summary(report: &AnalysisReport, snapshot: Option<&Snapshot>, elapsed: Duration) {
    let scores = report.scores();

    println!("\n📊 Health Summary:");
    println!(
        "   Performance: {} | SEO: {} | Accessibility: {} | Security: {}",
        scores.performance, scores.seo, scores.accessibility, scores.security
    );
    println!("   Overall: {}", scores.overall());
    println!("   Issues: {}", report.issue_count());
    println!("   {}", report.summary);

    if let Some(snapshot) = snapshot {
        match snapshot.change_from_previous {
            Some(delta) => println!(
                "   Change from previous: {:+} overall (snapshot {})",
                delta.overall_score_delta, snapshot.id
            ),
            None => println!("   First snapshot for '{}'", snapshot.website_id),
        }
    }

    println!("   Duration: {:.1}s", elapsed.as_secs_f64());
}

/// Load configuration from file or use defaults, then apply CLI overrides.
///
/// Runs before logging is installed, so problems go straight to stderr.
fn load_config(args: &Args) -> Result<Config> {
    let mut config = if let Some(ref config_path) = args.config {
        Config::load(config_path)?
    } else {
        match Config::load_default() {
            Ok(Some(config)) => config,
            Ok(None) => Config::default(),
            Err(e) => {
                eprintln!("⚠️  Ignoring {}: {:#}", CONFIG_FILE_NAME, e);
                Config::default()
            }
        }
    };

    config.merge_with_args(args);
    Ok(config)
}
