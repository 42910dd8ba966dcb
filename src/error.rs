//! Error types surfaced by the engine.
//!
//! Collector failures never appear here: they are recovered into
//! [`crate::collectors::Outcome::Failed`] or an empty header set. Only input
//! errors and persistence errors reach callers.

use thiserror::Error;

/// Rejection of a malformed analysis request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalyzeError {
    #[error("URL is required")]
    MissingUrl,

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Failure of the snapshot persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to (de)serialize snapshot data: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt snapshot row {id}: {reason}")]
    Corrupt { id: String, reason: String },

    #[error("Snapshot store lock poisoned")]
    Poisoned,
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
