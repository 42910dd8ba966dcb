//! SiteHealth - website health analysis with historical tracking.
//!
//! Scores a website's performance, SEO, accessibility and security from
//! a Lighthouse audit (via the PageSpeed Insights API) and a probe of its
//! security headers, then records the result as a dated snapshot so the
//! change between runs can be tracked.
//!
//! ```no_run
//! # async fn demo() -> anyhow::Result<()> {
//! use sitehealth::{Analyzer, Config, SnapshotStore};
//!
//! let config = Config::default();
//! let analyzer = Analyzer::from_config(&config)?;
//! let report = analyzer.analyze("https://example.com").await?;
//!
//! let store = SnapshotStore::open(&config.store.database)?;
//! let snapshot = store.record_snapshot("example", &report)?;
//! println!("overall {}", snapshot.overall_score);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod cli;
pub mod collectors;
pub mod config;
pub mod error;
pub mod models;
pub mod report;
pub mod store;

pub use analysis::Analyzer;
pub use config::Config;
pub use error::{AnalyzeError, StoreError};
pub use models::{AnalysisReport, ScoreDelta, Snapshot};
pub use store::{SnapshotRepository, SnapshotStore, SqliteSnapshotRepository};
