//! Tracker database handle
//!
//! Owns the SQLite connection, applies the embedded schema idempotently,
//! and seeds the bootstrap super-admin. Column conversion helpers keep
//! enum and date parsing at the data-access boundary: a malformed stored
//! value surfaces as a typed error, never a panic.

use crate::config::TrackerConfig;
use crate::errors::{Result, TrackerError};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::ErrorCode;
use rusqlite::{Connection, Row, params};
use std::path::Path;
use std::time::Duration;

/// Embedded schema SQL from schema.sql
const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Stored date format for date-only columns
const DATE_FMT: &str = "%Y-%m-%d";

/// Tracker database wrapper
pub struct Db {
    conn: Connection,
}

impl Db {
    /// Connect to the tracker database and initialize schema
    ///
    /// Creates the database file if it doesn't exist.
    pub fn connect_and_init(cfg: &TrackerConfig) -> Result<Self> {
        let path = cfg.resolved_db_path();
        Self::connect_and_init_at_path(&path)
    }

    /// Connect to a specific database path
    pub fn connect_and_init_at_path(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                TrackerError::storage_with_source(
                    format!("failed to create db directory: {}", parent.display()),
                    e,
                )
            })?;
        }

        let conn = Connection::open(path).map_err(|e| {
            TrackerError::storage_with_source(format!("failed to open db at {}", path.display()), e)
        })?;

        Self::apply_pragmas(&conn)?;
        Self::apply_schema(&conn)?;

        tracing::debug!(path = %path.display(), "tracker db initialized");

        Ok(Self { conn })
    }

    /// Connect to an in-memory database (for testing and throwaway runs)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| TrackerError::storage_with_source("failed to open in-memory db", e))?;

        Self::apply_pragmas(&conn)?;
        Self::apply_schema(&conn)?;

        Ok(Self { conn })
    }

    fn apply_pragmas(conn: &Connection) -> Result<()> {
        // WAL/synchronous tuning is best-effort; an in-memory db rejects WAL.
        conn.pragma_update(None, "journal_mode", "WAL").ok();
        conn.pragma_update(None, "synchronous", "NORMAL").ok();

        conn.busy_timeout(Duration::from_secs(5))
            .map_err(|e| TrackerError::storage_with_source("failed to set busy timeout", e))?;

        // Cascades depend on this; never optional.
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| TrackerError::storage_with_source("failed to enable foreign keys", e))?;

        Ok(())
    }

    /// Apply the schema to the database
    fn apply_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| TrackerError::storage_with_source("failed to apply schema", e))?;
        Ok(())
    }

    /// Insert the bootstrap super-admin if that username is absent.
    ///
    /// One-time seed, not a reset: re-running never duplicates the row or
    /// overwrites a rotated password. Returns whether a row was inserted.
    pub fn seed_super_admin(&self, username: &str, password_hash: &str) -> Result<bool> {
        let inserted = self
            .conn
            .execute(
                r#"
                INSERT INTO super_admins (username, password_hash)
                SELECT ?1, ?2
                WHERE NOT EXISTS (SELECT 1 FROM super_admins WHERE username = ?1)
                "#,
                params![username, password_hash],
            )
            .map_err(|e| TrackerError::storage_with_source("failed to seed super admin", e))?;

        if inserted > 0 {
            tracing::info!(username, "seeded bootstrap super admin");
        }

        Ok(inserted > 0)
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

/// Translate an insert failure: unique-constraint violations become the
/// caller-supplied DuplicateKey error, anything else is a storage error.
/// The constraint is the final authority behind any optimistic pre-check.
pub(crate) fn map_insert_conflict(
    err: rusqlite::Error,
    duplicate: impl Into<String>,
    context: &str,
) -> TrackerError {
    if is_constraint_violation(&err) {
        return TrackerError::duplicate_key(duplicate);
    }
    TrackerError::storage_with_source(context.to_string(), err)
}

pub(crate) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(code, message) => {
            code.code == ErrorCode::ConstraintViolation
                || message.as_deref().is_some_and(|value| {
                    value.contains("UNIQUE constraint failed")
                        || value.contains("PRIMARY KEY constraint failed")
                })
        }
        _ => false,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Column conversion helpers
// ─────────────────────────────────────────────────────────────────────────────

fn conversion_failure(idx: usize, detail: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, detail.into())
}

/// Format a date for storage
pub(crate) fn date_to_sql(date: NaiveDate) -> String {
    date.format(DATE_FMT).to_string()
}

/// Read a required date column
pub(crate) fn date_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, DATE_FMT)
        .map_err(|e| conversion_failure(idx, format!("bad date {raw:?}: {e}")))
}

/// Read a nullable date column
pub(crate) fn opt_date_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(raw) => NaiveDate::parse_from_str(&raw, DATE_FMT)
            .map(Some)
            .map_err(|e| conversion_failure(idx, format!("bad date {raw:?}: {e}"))),
        None => Ok(None),
    }
}

/// Read a required RFC 3339 timestamp column
pub(crate) fn datetime_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_failure(idx, format!("bad timestamp {raw:?}: {e}")))
}

/// Read an enum-backed text column, rejecting unknown values
pub(crate) fn enum_col<T>(
    row: &Row<'_>,
    idx: usize,
    what: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    parse(&raw).ok_or_else(|| conversion_failure(idx, format!("unknown {what}: {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_is_idempotent() {
        let db = Db::open_in_memory().expect("open");
        // Second application must not error or drop data.
        db.conn()
            .execute(
                "INSERT INTO super_admins (username, password_hash) VALUES ('a', 'h')",
                [],
            )
            .expect("insert");
        Db::apply_schema(db.conn()).expect("re-apply");
        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM super_admins", [], |r| r.get(0))
            .expect("count");
        assert_eq!(count, 1);
    }

    #[test]
    fn seed_super_admin_is_one_time() {
        let db = Db::open_in_memory().expect("open");
        assert!(db.seed_super_admin("admin", "hash-one").expect("seed"));
        assert!(!db.seed_super_admin("admin", "hash-two").expect("reseed"));

        let (count, hash): (i64, String) = db
            .conn()
            .query_row(
                "SELECT COUNT(*), MAX(password_hash) FROM super_admins",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .expect("row");
        assert_eq!(count, 1);
        // The original hash survives a reseed attempt.
        assert_eq!(hash, "hash-one");
    }

    #[test]
    fn unique_violation_is_detected() {
        let db = Db::open_in_memory().expect("open");
        db.conn()
            .execute(
                "INSERT INTO projects (name, description) VALUES ('Alpha', 'd')",
                [],
            )
            .expect("first insert");
        let err = db
            .conn()
            .execute(
                "INSERT INTO projects (name, description) VALUES ('Alpha', 'other')",
                [],
            )
            .expect_err("duplicate must fail");
        assert!(is_constraint_violation(&err));

        let mapped = map_insert_conflict(err, "project exists", "insert project");
        assert!(matches!(mapped, TrackerError::DuplicateKey { .. }));
    }

    #[test]
    fn cascade_runs_with_foreign_keys_on() {
        let db = Db::open_in_memory().expect("open");
        db.conn()
            .execute(
                "INSERT INTO projects (name, description) VALUES ('Alpha', 'd')",
                [],
            )
            .expect("project");
        db.conn()
            .execute(
                "INSERT INTO requirements (project_id, title, description) VALUES (1, 't', 'd')",
                [],
            )
            .expect("requirement");
        db.conn()
            .execute("DELETE FROM projects WHERE id = 1", [])
            .expect("delete");
        let left: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM requirements", [], |r| r.get(0))
            .expect("count");
        assert_eq!(left, 0);
    }
}
