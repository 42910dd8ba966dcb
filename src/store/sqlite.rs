//! SQLite-backed snapshot repository.

use super::SnapshotRepository;
use crate::error::{StoreError, StoreResult};
use crate::models::{ScoreDelta, Snapshot, SnapshotInsights};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS snapshots (
    seq                 INTEGER PRIMARY KEY AUTOINCREMENT,
    id                  TEXT NOT NULL UNIQUE,
    website_id          TEXT NOT NULL,
    snapshot_date       INTEGER NOT NULL,
    performance_score   INTEGER NOT NULL,
    seo_score           INTEGER NOT NULL,
    accessibility_score INTEGER NOT NULL,
    security_score      INTEGER NOT NULL,
    overall_score       INTEGER NOT NULL,
    change_from_previous TEXT,
    insights            TEXT NOT NULL,
    created_at          INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_snapshots_website_date
    ON snapshots (website_id, snapshot_date);
";

const SELECT_COLUMNS: &str = "SELECT id, website_id, snapshot_date, performance_score, seo_score,
        accessibility_score, security_score, overall_score, change_from_previous,
        insights, created_at
    FROM snapshots";

/// Snapshot repository over a single SQLite connection.
#[derive(Debug)]
pub struct SqliteSnapshotRepository {
    conn: Mutex<Connection>,
}

impl SqliteSnapshotRepository {
    /// Open (or create) a database file at `path`.
    pub fn open(path: &Path) -> StoreResult<Self> {
        debug!("Opening snapshot database {}", path.display());
        Self::with_connection(Connection::open(path)?)
    }

    /// Open a private in-memory database.
    pub fn in_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        // In-memory databases stay in "memory" mode.
        if let Err(e) = conn.execute_batch("PRAGMA journal_mode = WAL;") {
            debug!("WAL journal mode unavailable: {}", e);
        }
        conn.execute_batch(SCHEMA_SQL)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    fn query_one(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> StoreResult<Option<Snapshot>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(sql, params, SnapshotRow::from_row)
            .optional()?;
        row.map(Snapshot::try_from).transpose()
    }
}

impl SnapshotRepository for SqliteSnapshotRepository {
    fn insert(&self, snapshot: &Snapshot) -> StoreResult<()> {
        let change = snapshot
            .change_from_previous
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let insights = serde_json::to_string(&snapshot.insights)?;

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO snapshots (id, website_id, snapshot_date, performance_score, seo_score,
                accessibility_score, security_score, overall_score, change_from_previous,
                insights, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                snapshot.id,
                snapshot.website_id,
                snapshot.snapshot_date.timestamp_millis(),
                snapshot.performance_score,
                snapshot.seo_score,
                snapshot.accessibility_score,
                snapshot.security_score,
                snapshot.overall_score,
                change,
                insights,
                snapshot.created_at.timestamp_millis(),
            ],
        )?;
        Ok(())
    }

    fn latest_for_website(&self, website_id: &str) -> StoreResult<Option<Snapshot>> {
        let sql = format!(
            "{} WHERE website_id = ?1 ORDER BY snapshot_date DESC, seq DESC LIMIT 1",
            SELECT_COLUMNS
        );
        self.query_one(&sql, params![website_id])
    }

    fn latest_before(
        &self,
        website_id: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<Snapshot>> {
        let sql = format!(
            "{} WHERE website_id = ?1 AND snapshot_date <= ?2
             ORDER BY snapshot_date DESC, seq DESC LIMIT 1",
            SELECT_COLUMNS
        );
        self.query_one(&sql, params![website_id, at.timestamp_millis()])
    }

    fn list_for_website(&self, website_id: &str) -> StoreResult<Vec<Snapshot>> {
        let sql = format!(
            "{} WHERE website_id = ?1 ORDER BY snapshot_date DESC, seq DESC",
            SELECT_COLUMNS
        );

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![website_id], SnapshotRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter().map(Snapshot::try_from).collect()
    }
}

/// A snapshot row as stored, before decoding.
struct SnapshotRow {
    id: String,
    website_id: String,
    snapshot_date: i64,
    performance_score: i64,
    seo_score: i64,
    accessibility_score: i64,
    security_score: i64,
    overall_score: i64,
    change_from_previous: Option<String>,
    insights: String,
    created_at: i64,
}

impl SnapshotRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            website_id: row.get(1)?,
            snapshot_date: row.get(2)?,
            performance_score: row.get(3)?,
            seo_score: row.get(4)?,
            accessibility_score: row.get(5)?,
            security_score: row.get(6)?,
            overall_score: row.get(7)?,
            change_from_previous: row.get(8)?,
            insights: row.get(9)?,
            created_at: row.get(10)?,
        })
    }
}

impl TryFrom<SnapshotRow> for Snapshot {
    type Error = StoreError;

    fn try_from(row: SnapshotRow) -> StoreResult<Self> {
        let corrupt = |reason: String| StoreError::Corrupt {
            id: row.id.clone(),
            reason,
        };
        let score = |name: &str, value: i64| {
            u8::try_from(value)
                .ok()
                .filter(|v| *v <= 100)
                .ok_or_else(|| corrupt(format!("{} out of range: {}", name, value)))
        };
        let timestamp = |name: &str, millis: i64| {
            DateTime::<Utc>::from_timestamp_millis(millis)
                .ok_or_else(|| corrupt(format!("invalid {}: {}", name, millis)))
        };

        let change_from_previous = row
            .change_from_previous
            .as_deref()
            .map(serde_json::from_str::<ScoreDelta>)
            .transpose()?;
        let insights: SnapshotInsights = serde_json::from_str(&row.insights)?;

        Ok(Snapshot {
            snapshot_date: timestamp("snapshot_date", row.snapshot_date)?,
            performance_score: score("performance_score", row.performance_score)?,
            seo_score: score("seo_score", row.seo_score)?,
            accessibility_score: score("accessibility_score", row.accessibility_score)?,
            security_score: score("security_score", row.security_score)?,
            overall_score: score("overall_score", row.overall_score)?,
            change_from_previous,
            insights,
            created_at: timestamp("created_at", row.created_at)?,
            id: row.id.clone(),
            website_id: row.website_id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SnapshotStore;
    use chrono::TimeZone;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn snapshot(id: &str, website_id: &str, day: u32, overall: u8) -> Snapshot {
        Snapshot {
            id: id.to_string(),
            website_id: website_id.to_string(),
            snapshot_date: Utc.with_ymd_and_hms(2024, 5, day, 8, 30, 0).unwrap(),
            performance_score: overall,
            seo_score: overall,
            accessibility_score: overall,
            security_score: overall,
            overall_score: overall,
            change_from_previous: None,
            insights: SnapshotInsights {
                summary: "Good overall health".to_string(),
                suggestions: vec!["Compress images".to_string()],
                issue_count: 2,
            },
            created_at: Utc.with_ymd_and_hms(2024, 5, day, 8, 30, 1).unwrap(),
        }
    }

    #[test]
    fn test_insert_and_read_back() {
        let repo = SqliteSnapshotRepository::in_memory().unwrap();
        let mut stored = snapshot("a", "site", 1, 77);
        stored.change_from_previous = Some(ScoreDelta {
            performance_score_delta: -3,
            seo_score_delta: 0,
            accessibility_score_delta: 4,
            security_score_delta: 10,
            overall_score_delta: 2,
        });
        repo.insert(&stored).unwrap();

        assert_eq!(repo.latest_for_website("site").unwrap(), Some(stored));
    }

    #[test]
    fn test_latest_before_excludes_later_dates() {
        let repo = SqliteSnapshotRepository::in_memory().unwrap();
        repo.insert(&snapshot("a", "site", 1, 60)).unwrap();
        repo.insert(&snapshot("b", "site", 9, 90)).unwrap();

        let at = Utc.with_ymd_and_hms(2024, 5, 4, 0, 0, 0).unwrap();
        let found = repo.latest_before("site", at).unwrap().unwrap();
        assert_eq!(found.id, "a");

        let early = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
        assert!(repo.latest_before("site", early).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let repo = SqliteSnapshotRepository::in_memory().unwrap();
        repo.insert(&snapshot("a", "site", 1, 60)).unwrap();

        let err = repo.insert(&snapshot("a", "site", 2, 70)).unwrap_err();
        assert!(matches!(err, StoreError::Sqlite(_)));
    }

    #[test]
    fn test_corrupt_score_is_reported() {
        let repo = SqliteSnapshotRepository::in_memory().unwrap();
        repo.insert(&snapshot("a", "site", 1, 60)).unwrap();
        repo.conn()
            .unwrap()
            .execute("UPDATE snapshots SET seo_score = 250 WHERE id = 'a'", [])
            .unwrap();

        let err = repo.list_for_website("site").unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { ref id, .. } if id == "a"));
    }

    #[test]
    fn test_file_database_uses_wal() {
        let dir = TempDir::new().unwrap();
        let repo = SqliteSnapshotRepository::open(&dir.path().join("wal.db")).unwrap();

        let mode: String = repo
            .conn()
            .unwrap()
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[test]
    fn test_file_database_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.db");

        {
            let store = SnapshotStore::new(Arc::new(SqliteSnapshotRepository::open(&path).unwrap()));
            let report = crate::analysis::generate_fallback();
            store.record_snapshot("site", &report).unwrap();
            store.record_snapshot("site", &report).unwrap();
        }

        let reopened = SnapshotStore::open(&path).unwrap();
        let history = reopened.get_history("site").unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[1].change_from_previous.is_none());
        assert_eq!(
            history[0].change_from_previous.map(|d| d.overall_score_delta),
            Some(0)
        );
    }
}
