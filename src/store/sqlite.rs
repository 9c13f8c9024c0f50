//! SQLite-backed result store.
//!
//! Tables:
//! - results: one row per performance, names stored as entered

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{EventSummary, ResultStore, StoreError, TeamSummary};
use crate::results::{NewResult, ResultFilter, ResultPatch, ResultRow};

const COLUMNS: &str = "id, date, athlete, meet, event, result, team";

static MEMORY_STORES: AtomicU64 = AtomicU64::new(0);

/// Owns one connection for the lifetime of a command. Dropping the store
/// closes the connection on every exit path.
pub struct SqliteStore {
    conn: Connection,
    location: String,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let location = path
            .canonicalize()
            .unwrap_or_else(|_| path.to_path_buf())
            .display()
            .to_string();
        let store = Self { conn, location };
        store.create_tables()?;
        tracing::debug!(path = %path.display(), "opened results database");
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        // Every in-memory database is distinct.
        let n = MEMORY_STORES.fetch_add(1, Ordering::Relaxed);
        let store = Self {
            conn: Connection::open_in_memory()?,
            location: format!(":memory:{}", n),
        };
        store.create_tables()?;
        Ok(store)
    }

    fn create_tables(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                athlete TEXT NOT NULL,
                meet TEXT NOT NULL,
                event TEXT NOT NULL,
                result TEXT NOT NULL,
                team TEXT NOT NULL DEFAULT ''
            );
            CREATE INDEX IF NOT EXISTS idx_results_event ON results(event);
            CREATE INDEX IF NOT EXISTS idx_results_athlete ON results(athlete);
            CREATE INDEX IF NOT EXISTS idx_results_meet ON results(meet);
            "#,
        )?;
        Ok(())
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<ResultRow> {
        Ok(ResultRow {
            id: row.get(0)?,
            date: row.get(1)?,
            athlete: row.get(2)?,
            meet: row.get(3)?,
            event: row.get(4)?,
            result: row.get(5)?,
            team: row.get(6)?,
        })
    }

    fn select(&self, sql: &str, values: &[Value]) -> Result<Vec<ResultRow>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), Self::map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

fn date_text(date: chrono::NaiveDate) -> Value {
    Value::Text(date.format("%Y-%m-%d").to_string())
}

/// Build the WHERE clause and bound values for a filter.
fn where_clause(filter: &ResultFilter) -> (String, Vec<Value>) {
    let mut clauses = Vec::new();
    let mut values = Vec::new();

    let exact = [
        ("event", &filter.event),
        ("athlete", &filter.athlete),
        ("team", &filter.team),
        ("meet", &filter.meet),
    ];
    for (column, value) in exact {
        if let Some(v) = value {
            clauses.push(format!("{} = ?", column));
            values.push(text(v));
        }
    }

    if let Some(events) = &filter.events {
        if events.is_empty() {
            clauses.push("0".to_string());
        } else {
            let marks = vec!["?"; events.len()].join(", ");
            clauses.push(format!("event IN ({})", marks));
            values.extend(events.iter().map(|e| text(e)));
        }
    }
    if let Some(needle) = &filter.athlete_like {
        clauses.push("athlete LIKE ?".to_string());
        values.push(Value::Text(format!("%{}%", needle)));
    }
    if let Some(from) = filter.from {
        clauses.push("date >= ?".to_string());
        values.push(date_text(from));
    }
    if let Some(to) = filter.to {
        clauses.push("date <= ?".to_string());
        values.push(date_text(to));
    }

    if clauses.is_empty() {
        (String::new(), values)
    } else {
        (format!("WHERE {}", clauses.join(" AND ")), values)
    }
}

impl ResultStore for SqliteStore {
    fn location(&self) -> &str {
        &self.location
    }

    fn query(&self, filter: &ResultFilter) -> Result<Vec<ResultRow>, StoreError> {
        let (clause, values) = where_clause(filter);
        let sql = format!(
            "SELECT {} FROM results {} ORDER BY date ASC, id ASC",
            COLUMNS, clause
        );
        self.select(&sql, &values)
    }

    fn get(&self, id: i64) -> Result<ResultRow, StoreError> {
        let sql = format!("SELECT {} FROM results WHERE id = ?", COLUMNS);
        self.conn
            .query_row(&sql, params![id], Self::map_row)
            .optional()?
            .ok_or(StoreError::NotFound { id })
    }

    fn insert(&self, new: &NewResult) -> Result<ResultRow, StoreError> {
        self.conn.execute(
            "INSERT INTO results (date, athlete, meet, event, result, team)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![new.date, new.athlete, new.meet, new.event, new.result, new.team],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::debug!(id, meet = %new.meet, event = %new.event, "inserted result");
        self.get(id)
    }

    fn find_duplicate(&self, new: &NewResult) -> Result<Option<ResultRow>, StoreError> {
        let sql = format!(
            "SELECT {} FROM results
             WHERE date = ? AND athlete = ? AND meet = ? AND event = ? AND result = ? AND team = ?
             LIMIT 1",
            COLUMNS
        );
        let row = self
            .conn
            .query_row(
                &sql,
                params![new.date, new.athlete, new.meet, new.event, new.result, new.team],
                Self::map_row,
            )
            .optional()?;
        Ok(row)
    }

    fn update(&self, id: i64, patch: &ResultPatch) -> Result<(ResultRow, ResultRow), StoreError> {
        let before = self.get(id)?;
        if patch.is_empty() {
            return Ok((before.clone(), before));
        }

        let mut sets = Vec::new();
        let mut values = Vec::new();
        if let Some(date) = patch.date {
            sets.push("date = ?");
            values.push(date_text(date));
        }
        let fields = [
            ("athlete = ?", &patch.athlete),
            ("meet = ?", &patch.meet),
            ("event = ?", &patch.event),
            ("result = ?", &patch.result),
            ("team = ?", &patch.team),
        ];
        for (set, value) in fields {
            if let Some(v) = value {
                sets.push(set);
                values.push(text(v));
            }
        }
        values.push(Value::Integer(id));

        let sql = format!("UPDATE results SET {} WHERE id = ?", sets.join(", "));
        self.conn.execute(&sql, params_from_iter(values.iter()))?;

        let after = self.get(id)?;
        Ok((before, after))
    }

    fn rewrite_results(&self, changes: &[(i64, String)]) -> Result<(), StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        for (id, result) in changes {
            let changed = tx.execute(
                "UPDATE results SET result = ? WHERE id = ?",
                params![result, id],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound { id: *id });
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn delete(&self, id: i64) -> Result<ResultRow, StoreError> {
        let row = self.get(id)?;
        self.conn
            .execute("DELETE FROM results WHERE id = ?", params![id])?;
        Ok(row)
    }

    fn rename_meet(&self, from: &str, to: &str) -> Result<usize, StoreError> {
        let changed = self.conn.execute(
            "UPDATE results SET meet = ? WHERE meet = ?",
            params![to, from],
        )?;
        Ok(changed)
    }

    fn event_summaries(&self) -> Result<Vec<EventSummary>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT event, COUNT(DISTINCT athlete), COUNT(*) FROM results
             GROUP BY event ORDER BY event ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(EventSummary {
                    event: row.get(0)?,
                    athletes: row.get::<_, i64>(1)? as u64,
                    results: row.get::<_, i64>(2)? as u64,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn team_summaries(&self) -> Result<Vec<TeamSummary>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT team, COUNT(DISTINCT athlete), COUNT(*) FROM results
             GROUP BY team ORDER BY team ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(TeamSummary {
                    team: row.get(0)?,
                    athletes: row.get::<_, i64>(1)? as u64,
                    results: row.get::<_, i64>(2)? as u64,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn recent(&self, limit: usize) -> Result<Vec<ResultRow>, StoreError> {
        let sql = format!(
            "SELECT {} FROM results ORDER BY date DESC, id DESC LIMIT ?",
            COLUMNS
        );
        self.select(&sql, &[Value::Integer(limit as i64)])
    }

    fn latest_team(&self, athlete: &str) -> Result<Option<String>, StoreError> {
        let team = self
            .conn
            .query_row(
                "SELECT team FROM results WHERE athlete = ? ORDER BY date DESC, id DESC LIMIT 1",
                params![athlete],
                |row| row.get(0),
            )
            .optional()?;
        Ok(team)
    }

    fn last_meet(&self) -> Result<Option<String>, StoreError> {
        let meet = self
            .conn
            .query_row(
                "SELECT meet FROM results ORDER BY id DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(meet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_result(athlete: &str, event: &str, result: &str, date: &str) -> NewResult {
        NewResult {
            date: date.parse().unwrap(),
            athlete: athlete.to_string(),
            meet: "County Champs".to_string(),
            event: event.to_string(),
            result: result.to_string(),
            team: "Harriers".to_string(),
        }
    }

    fn seeded() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert(&new_result("Ana", "100m", "12.10", "2024-04-01")).unwrap();
        store.insert(&new_result("Bea", "100m", "12.40", "2024-04-01")).unwrap();
        store.insert(&new_result("Ana", "200m", "25.02", "2024-05-01")).unwrap();
        store
    }

    #[test]
    fn test_create_tables_idempotent() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.create_tables().unwrap();
    }

    #[test]
    fn test_insert_and_get() {
        let store = SqliteStore::open_in_memory().unwrap();
        let row = store.insert(&new_result("Ana", "100m", "12.10", "2024-04-01")).unwrap();
        assert_eq!(row.athlete, "Ana");
        assert_eq!(row.date.to_string(), "2024-04-01");
        assert_eq!(store.get(row.id).unwrap(), row);
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(matches!(store.get(42), Err(StoreError::NotFound { id: 42 })));
    }

    #[test]
    fn test_query_filters() {
        let store = seeded();
        assert_eq!(store.query(&ResultFilter::event("100m")).unwrap().len(), 2);
        assert_eq!(store.query(&ResultFilter::athlete("Ana")).unwrap().len(), 2);

        let filter = ResultFilter {
            from: Some("2024-04-15".parse().unwrap()),
            ..Default::default()
        };
        let rows = store.query(&filter).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].event, "200m");
    }

    #[test]
    fn test_query_events_any_of() {
        let store = seeded();
        let filter = ResultFilter {
            events: Some(vec!["200m".to_string(), "400m".to_string()]),
            ..Default::default()
        };
        assert_eq!(store.query(&filter).unwrap().len(), 1);

        let none = ResultFilter {
            events: Some(vec![]),
            ..Default::default()
        };
        assert!(store.query(&none).unwrap().is_empty());
    }

    #[test]
    fn test_query_athlete_like() {
        let store = seeded();
        let filter = ResultFilter {
            athlete_like: Some("an".to_string()),
            ..Default::default()
        };
        let rows = store.query(&filter).unwrap();
        assert!(rows.iter().all(|r| r.athlete == "Ana"));
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_names_are_not_folded() {
        let store = seeded();
        store.insert(&new_result("ana", "100m", "11.90", "2024-04-02")).unwrap();
        store.insert(&new_result("Ana ", "100m", "11.80", "2024-04-03")).unwrap();
        assert_eq!(store.query(&ResultFilter::athlete("Ana")).unwrap().len(), 2);
        assert_eq!(store.latest_team("ana").unwrap(), Some("Harriers".to_string()));
    }

    #[test]
    fn test_find_duplicate() {
        let store = seeded();
        let dup = new_result("Ana", "100m", "12.10", "2024-04-01");
        assert!(store.find_duplicate(&dup).unwrap().is_some());
        let fresh = new_result("Ana", "100m", "12.09", "2024-04-01");
        assert!(store.find_duplicate(&fresh).unwrap().is_none());
    }

    #[test]
    fn test_update_returns_before_and_after() {
        let store = seeded();
        let patch = ResultPatch {
            result: Some("12.05".to_string()),
            meet: Some("Regionals".to_string()),
            ..Default::default()
        };
        let (before, after) = store.update(1, &patch).unwrap();
        assert_eq!(before.result, "12.10");
        assert_eq!(after.result, "12.05");
        assert_eq!(after.meet, "Regionals");
        assert_eq!(after.athlete, "Ana");
    }

    #[test]
    fn test_delete() {
        let store = seeded();
        let removed = store.delete(2).unwrap();
        assert_eq!(removed.athlete, "Bea");
        assert!(matches!(store.delete(2), Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn test_rename_meet() {
        let store = seeded();
        assert_eq!(store.rename_meet("County Champs", "County Championships").unwrap(), 3);
        assert!(store.query(&ResultFilter::meet("County Champs")).unwrap().is_empty());
    }

    #[test]
    fn test_summaries() {
        let store = seeded();
        let events = store.event_summaries().unwrap();
        assert_eq!(events[0], EventSummary { event: "100m".to_string(), athletes: 2, results: 2 });
        let teams = store.team_summaries().unwrap();
        assert_eq!(teams[0], TeamSummary { team: "Harriers".to_string(), athletes: 2, results: 3 });
    }

    #[test]
    fn test_recent_and_last_meet() {
        let store = seeded();
        let recent = store.recent(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].event, "200m");
        assert_eq!(store.last_meet().unwrap(), Some("County Champs".to_string()));
    }

    #[test]
    fn test_open_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.insert(&new_result("Ana", "100m", "12.10", "2024-04-01")).unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.all().unwrap().len(), 1);

        let again = SqliteStore::open(&path).unwrap();
        assert_eq!(store.location(), again.location());
        let other = SqliteStore::open(&dir.path().join("other.db")).unwrap();
        assert_ne!(store.location(), other.location());
    }

    #[test]
    fn test_in_memory_stores_have_distinct_locations() {
        let a = SqliteStore::open_in_memory().unwrap();
        let b = SqliteStore::open_in_memory().unwrap();
        assert_ne!(a.location(), b.location());
    }

    #[test]
    fn test_rewrite_results() {
        let store = seeded();
        let ids: Vec<i64> = store.all().unwrap().iter().map(|r| r.id).collect();
        let changes = [(ids[0], "1:00.00".to_string()), (ids[1], "2:00.00".to_string())];
        store.rewrite_results(&changes).unwrap();
        assert_eq!(store.get(ids[0]).unwrap().result, "1:00.00");
        assert_eq!(store.get(ids[1]).unwrap().result, "2:00.00");
    }

    #[test]
    fn test_rewrite_results_is_all_or_nothing() {
        let store = seeded();
        let first = store.all().unwrap()[0].clone();
        let changes = [(first.id, "9:99.99".to_string()), (9999, "1:00.00".to_string())];
        let err = store.rewrite_results(&changes).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { id: 9999 }));
        assert_eq!(store.get(first.id).unwrap().result, first.result);
    }
}
