//! Snapshot persistence.
//!
//! [`SnapshotStore`] turns analysis reports into immutable, dated snapshots
//! and computes each snapshot's change from the one before it. Storage sits
//! behind [`SnapshotRepository`]; [`SqliteSnapshotRepository`] is the
//! shipped backend.

pub mod sqlite;

pub use sqlite::SqliteSnapshotRepository;

use crate::error::StoreResult;
use crate::models::{AnalysisReport, ScoreDelta, Snapshot, SnapshotInsights};
use chrono::{DateTime, SubsecRound, Utc};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Storage backend for snapshots.
///
/// Listing and "latest" lookups order by snapshot date, newest first, with
/// later insertions winning ties.
pub trait SnapshotRepository: Send + Sync {
    fn insert(&self, snapshot: &Snapshot) -> StoreResult<()>;

    fn latest_for_website(&self, website_id: &str) -> StoreResult<Option<Snapshot>>;

    /// Newest snapshot of `website_id` dated at or before `at`.
    fn latest_before(&self, website_id: &str, at: DateTime<Utc>)
        -> StoreResult<Option<Snapshot>>;

    fn list_for_website(&self, website_id: &str) -> StoreResult<Vec<Snapshot>>;
}

/// Records and reads website history.
#[derive(Clone)]
pub struct SnapshotStore {
    repo: Arc<dyn SnapshotRepository>,
}

impl SnapshotStore {
    pub fn new(repo: Arc<dyn SnapshotRepository>) -> Self {
        Self { repo }
    }

    /// Open (or create) a SQLite-backed store at `path`.
    pub fn open(path: &Path) -> StoreResult<Self> {
        Ok(Self::new(Arc::new(SqliteSnapshotRepository::open(path)?)))
    }

    pub fn in_memory() -> StoreResult<Self> {
        Ok(Self::new(Arc::new(SqliteSnapshotRepository::in_memory()?)))
    }

    /// Persist `report` as a snapshot dated now.
    pub fn create_snapshot(
        &self,
        website_id: &str,
        report: &AnalysisReport,
    ) -> StoreResult<Snapshot> {
        self.create_snapshot_at(website_id, report, Utc::now())
    }

    /// Persist `report` as a snapshot dated `snapshot_date`.
    ///
    /// The delta is taken against the newest existing snapshot dated at or
    /// before `snapshot_date`. Timestamps are kept at millisecond precision.
    pub fn create_snapshot_at(
        &self,
        website_id: &str,
        report: &AnalysisReport,
        snapshot_date: DateTime<Utc>,
    ) -> StoreResult<Snapshot> {
        let snapshot_date = snapshot_date.trunc_subsecs(3);
        let scores = report.scores();

        let mut snapshot = Snapshot {
            id: uuid::Uuid::new_v4().to_string(),
            website_id: website_id.to_string(),
            snapshot_date,
            performance_score: scores.performance,
            seo_score: scores.seo,
            accessibility_score: scores.accessibility,
            security_score: scores.security,
            overall_score: scores.overall(),
            change_from_previous: None,
            insights: SnapshotInsights::from(report),
            created_at: Utc::now().trunc_subsecs(3),
        };

        if let Some(previous) = self.repo.latest_before(website_id, snapshot_date)? {
            debug!("Previous snapshot for {} is {}", website_id, previous.id);
            snapshot.change_from_previous = Some(ScoreDelta::between(&snapshot, &previous));
        }

        self.repo.insert(&snapshot)?;

        info!(
            "Recorded snapshot {} for {} (overall {})",
            snapshot.id, website_id, snapshot.overall_score
        );
        Ok(snapshot)
    }

    /// All snapshots for `website_id`, newest first.
    pub fn list_snapshots(&self, website_id: &str) -> StoreResult<Vec<Snapshot>> {
        self.repo.list_for_website(website_id)
    }

    pub fn latest_snapshot(&self, website_id: &str) -> StoreResult<Option<Snapshot>> {
        self.repo.latest_for_website(website_id)
    }

    /// Same as [`SnapshotStore::create_snapshot`].
    pub fn record_snapshot(
        &self,
        website_id: &str,
        report: &AnalysisReport,
    ) -> StoreResult<Snapshot> {
        self.create_snapshot(website_id, report)
    }

    /// Same as [`SnapshotStore::list_snapshots`].
    pub fn get_history(&self, website_id: &str) -> StoreResult<Vec<Snapshot>> {
        self.list_snapshots(website_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::generate_fallback_with;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// A report whose four scores are all `score`.
    fn uniform_report(score: u8) -> AnalysisReport {
        let mut report = generate_fallback_with(&mut StdRng::seed_from_u64(1));
        report.performance.score = score;
        report.seo.score = score;
        report.accessibility.score = score;
        report.security.score = score;
        report
    }

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_first_snapshot_has_no_delta() {
        let store = SnapshotStore::in_memory().unwrap();
        let report = uniform_report(80);

        let snapshot = store.create_snapshot("site-1", &report).unwrap();

        assert_eq!(snapshot.website_id, "site-1");
        assert_eq!(snapshot.overall_score, 80);
        assert!(snapshot.change_from_previous.is_none());
        assert_eq!(snapshot.insights.summary, report.summary);
        assert_eq!(snapshot.insights.issue_count, report.issue_count());
        assert!(uuid::Uuid::parse_str(&snapshot.id).is_ok());

        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json["changeFromPrevious"].is_null());
        assert!(json["insights"]["issueCount"].is_u64());
    }

    #[test]
    fn test_second_snapshot_records_delta() {
        let store = SnapshotStore::in_memory().unwrap();

        let mut first = uniform_report(70);
        first.security.score = 60;
        store.create_snapshot_at("site-1", &first, day(1)).unwrap();

        let mut second = uniform_report(85);
        second.security.score = 90;
        let snapshot = store.create_snapshot_at("site-1", &second, day(2)).unwrap();

        let delta = snapshot.change_from_previous.expect("delta expected");
        assert_eq!(delta.performance_score_delta, 15);
        assert_eq!(delta.seo_score_delta, 15);
        assert_eq!(delta.accessibility_score_delta, 15);
        assert_eq!(delta.security_score_delta, 30);
        // overall: floor(270 / 4) = 67, then floor(345 / 4) = 86
        assert_eq!(delta.overall_score_delta, 19);
    }

    #[test]
    fn test_overall_delta_from_70_to_85() {
        let store = SnapshotStore::in_memory().unwrap();
        store
            .create_snapshot_at("site-1", &uniform_report(70), day(1))
            .unwrap();
        let snapshot = store
            .create_snapshot_at("site-1", &uniform_report(85), day(2))
            .unwrap();

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["changeFromPrevious"]["overallScoreDelta"], 15);
    }

    #[test]
    fn test_negative_delta() {
        let store = SnapshotStore::in_memory().unwrap();
        store.record_snapshot("site-1", &uniform_report(90)).unwrap();
        let snapshot = store.record_snapshot("site-1", &uniform_report(72)).unwrap();

        assert_eq!(
            snapshot.change_from_previous.map(|d| d.overall_score_delta),
            Some(-18)
        );
    }

    #[test]
    fn test_history_is_newest_first() {
        let store = SnapshotStore::in_memory().unwrap();
        store
            .create_snapshot_at("site-1", &uniform_report(70), day(2))
            .unwrap();
        store
            .create_snapshot_at("site-1", &uniform_report(60), day(1))
            .unwrap();
        store
            .create_snapshot_at("site-1", &uniform_report(80), day(3))
            .unwrap();

        let history = store.get_history("site-1").unwrap();
        let dates: Vec<_> = history.iter().map(|s| s.snapshot_date).collect();
        assert_eq!(dates, vec![day(3), day(2), day(1)]);

        let latest = store.latest_snapshot("site-1").unwrap().unwrap();
        assert_eq!(latest.overall_score, 80);
        assert_eq!(latest, history[0]);
    }

    #[test]
    fn test_backfilled_snapshot_compares_with_earlier_date() {
        let store = SnapshotStore::in_memory().unwrap();
        store
            .create_snapshot_at("site-1", &uniform_report(60), day(1))
            .unwrap();
        store
            .create_snapshot_at("site-1", &uniform_report(90), day(5))
            .unwrap();

        let backfilled = store
            .create_snapshot_at("site-1", &uniform_report(70), day(3))
            .unwrap();
        assert_eq!(
            backfilled.change_from_previous.map(|d| d.overall_score_delta),
            Some(10)
        );
    }

    #[test]
    fn test_same_date_ties_use_insertion_order() {
        let store = SnapshotStore::in_memory().unwrap();
        store
            .create_snapshot_at("site-1", &uniform_report(70), day(1))
            .unwrap();
        let second = store
            .create_snapshot_at("site-1", &uniform_report(75), day(1))
            .unwrap();
        let third = store
            .create_snapshot_at("site-1", &uniform_report(78), day(1))
            .unwrap();

        assert_eq!(third.change_from_previous.map(|d| d.overall_score_delta), Some(3));
        assert_eq!(store.latest_snapshot("site-1").unwrap().unwrap().id, third.id);
        assert_eq!(store.list_snapshots("site-1").unwrap()[1].id, second.id);
    }

    #[test]
    fn test_websites_are_isolated() {
        let store = SnapshotStore::in_memory().unwrap();
        store.record_snapshot("site-1", &uniform_report(90)).unwrap();

        let other = store.record_snapshot("site-2", &uniform_report(50)).unwrap();
        assert!(other.change_from_previous.is_none());
        assert_eq!(store.get_history("site-1").unwrap().len(), 1);
        assert_eq!(store.get_history("site-2").unwrap().len(), 1);
        assert!(store.latest_snapshot("site-3").unwrap().is_none());
        assert!(store.get_history("site-3").unwrap().is_empty());
    }
}
