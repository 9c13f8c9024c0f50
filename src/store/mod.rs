//! Result storage.
//!
//! The ranking, relay and scoring code only ever sees rows; everything that
//! touches the database goes through [`ResultStore`].

pub mod sqlite;

pub use sqlite::SqliteStore;

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::results::{NewResult, ResultFilter, ResultPatch, ResultRow};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to open results database at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Result {id} not found")]
    NotFound { id: i64 },

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Distinct athletes and rows per event (leaderboard index).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventSummary {
    pub event: String,
    pub athletes: u64,
    pub results: u64,
}

/// Distinct athletes and rows per team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamSummary {
    pub team: String,
    pub athletes: u64,
    pub results: u64,
}

pub trait ResultStore {
    /// Identifies the underlying database. Derived caches are keyed by it.
    fn location(&self) -> &str;

    /// Rows matching the filter, ordered by date then id.
    fn query(&self, filter: &ResultFilter) -> Result<Vec<ResultRow>, StoreError>;

    fn get(&self, id: i64) -> Result<ResultRow, StoreError>;

    fn insert(&self, new: &NewResult) -> Result<ResultRow, StoreError>;

    /// An existing row with exactly the same fields, if any.
    fn find_duplicate(&self, new: &NewResult) -> Result<Option<ResultRow>, StoreError>;

    /// Apply a correction. Returns the row before and after the change.
    fn update(&self, id: i64, patch: &ResultPatch) -> Result<(ResultRow, ResultRow), StoreError>;

    /// Replace the result text of several rows at once. Either every row is
    /// rewritten or none is.
    fn rewrite_results(&self, changes: &[(i64, String)]) -> Result<(), StoreError>;

    /// Delete a row, returning what was removed.
    fn delete(&self, id: i64) -> Result<ResultRow, StoreError>;

    /// Rename every row of a meet. Returns the number of rows changed.
    fn rename_meet(&self, from: &str, to: &str) -> Result<usize, StoreError>;

    fn event_summaries(&self) -> Result<Vec<EventSummary>, StoreError>;

    fn team_summaries(&self) -> Result<Vec<TeamSummary>, StoreError>;

    /// Most recent rows first.
    fn recent(&self, limit: usize) -> Result<Vec<ResultRow>, StoreError>;

    /// Team on the athlete's most recent result.
    fn latest_team(&self, athlete: &str) -> Result<Option<String>, StoreError>;

    /// Meet of the most recently inserted row.
    fn last_meet(&self) -> Result<Option<String>, StoreError>;

    fn all(&self) -> Result<Vec<ResultRow>, StoreError> {
        self.query(&ResultFilter::default())
    }
}
