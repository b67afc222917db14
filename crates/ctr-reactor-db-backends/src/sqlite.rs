//! SQLite database backend using `rusqlite`.
//!
//! [`SqliteBackend`] holds one connection behind an async mutex and runs every
//! statement on the blocking pool, so writes are serialized per process.
//!
//! - WAL mode for file databases
//! - In-memory databases via the `:memory:` path
//! - Timestamps are stored as fixed-width RFC 3339 UTC text so that string
//!   comparison in SQL orders them correctly

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::SecondsFormat;
use ctr_reactor_core::ReactorError;
use ctr_reactor_db::{Row, Value};
use rusqlite::ErrorCode;
use tokio::sync::Mutex;

use crate::base::DatabaseBackend;

/// A SQLite database backend.
pub struct SqliteBackend {
    path: PathBuf,
    conn: Arc<Mutex<rusqlite::Connection>>,
}

impl SqliteBackend {
    /// Opens the database at the given path, creating the file if needed.
    ///
    /// If the path is `:memory:`, an in-memory database is created.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ReactorError> {
        let path = path.into();
        let conn = if path.to_str() == Some(":memory:") {
            rusqlite::Connection::open_in_memory()
        } else {
            rusqlite::Connection::open(&path)
        }
        .map_err(|e| ReactorError::OperationalError(format!("SQLite open failed: {e}")))?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .map_err(|e| ReactorError::OperationalError(format!("Failed to set pragmas: {e}")))?;
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(|e| ReactorError::OperationalError(format!("Failed to set busy timeout: {e}")))?;

        tracing::debug!(path = %path.display(), "opened sqlite database");

        Ok(Self {
            path,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens an in-memory database.
    pub fn memory() -> Result<Self, ReactorError> {
        Self::open(":memory:")
    }

    /// Returns the database file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn bind_params(
        stmt: &mut rusqlite::Statement<'_>,
        params: &[Value],
    ) -> Result<(), ReactorError> {
        for (i, param) in params.iter().enumerate() {
            let idx = i + 1;
            match param {
                Value::Null => stmt.raw_bind_parameter(idx, rusqlite::types::Null),
                Value::Bool(b) => stmt.raw_bind_parameter(idx, b),
                Value::Int(v) => stmt.raw_bind_parameter(idx, v),
                Value::String(s) => stmt.raw_bind_parameter(idx, s.as_str()),
                Value::Uuid(u) => stmt.raw_bind_parameter(idx, u.to_string()),
                Value::DateTimeTz(dt) => stmt.raw_bind_parameter(
                    idx,
                    dt.to_rfc3339_opts(SecondsFormat::Micros, true),
                ),
            }
            .map_err(|e| ReactorError::DatabaseError(format!("Bind error: {e}")))?;
        }
        Ok(())
    }

    fn convert_row(sqlite_row: &rusqlite::Row<'_>, column_names: &[String]) -> Row {
        use rusqlite::types::ValueRef;

        let values: Vec<Value> = (0..column_names.len())
            .map(|i| match sqlite_row.get_ref(i).unwrap_or(ValueRef::Null) {
                ValueRef::Null | ValueRef::Real(_) | ValueRef::Blob(_) => Value::Null,
                ValueRef::Integer(v) => Value::Int(v),
                ValueRef::Text(b) => Value::String(String::from_utf8_lossy(b).to_string()),
            })
            .collect();

        Row::new(column_names.to_vec(), values)
    }
}

/// Maps a `rusqlite` error onto the storage error variants.
fn map_sqlite_error(e: &rusqlite::Error) -> ReactorError {
    match e.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => ReactorError::IntegrityError(e.to_string()),
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked | ErrorCode::CannotOpen) => {
            ReactorError::OperationalError(e.to_string())
        }
        _ => ReactorError::DatabaseError(e.to_string()),
    }
}

#[async_trait::async_trait]
impl DatabaseBackend for SqliteBackend {
    fn vendor(&self) -> &'static str {
        "sqlite"
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64, ReactorError> {
        let conn = self.conn.clone();
        let sql = sql.to_string();
        let params = params.to_vec();

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let mut stmt = conn.prepare(&sql).map_err(|e| map_sqlite_error(&e))?;
            Self::bind_params(&mut stmt, &params)?;
            let count = stmt.raw_execute().map_err(|e| map_sqlite_error(&e))?;
            Ok(count as u64)
        })
        .await
        .map_err(|e| ReactorError::DatabaseError(format!("Task join error: {e}")))?
    }

    async fn execute_batch(&self, sql: &str) -> Result<(), ReactorError> {
        let conn = self.conn.clone();
        let sql = sql.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            conn.execute_batch(&sql).map_err(|e| map_sqlite_error(&e))
        })
        .await
        .map_err(|e| ReactorError::DatabaseError(format!("Task join error: {e}")))?
    }

    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, ReactorError> {
        let conn = self.conn.clone();
        let sql = sql.to_string();
        let params = params.to_vec();

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let mut stmt = conn.prepare(&sql).map_err(|e| map_sqlite_error(&e))?;

            let column_names: Vec<String> = stmt
                .column_names()
                .into_iter()
                .map(String::from)
                .collect();

            Self::bind_params(&mut stmt, &params)?;

            let mut raw_rows = stmt.raw_query();
            let mut rows = Vec::new();
            while let Some(row) = raw_rows.next().map_err(|e| map_sqlite_error(&e))? {
                rows.push(Self::convert_row(row, &column_names));
            }

            Ok(rows)
        })
        .await
        .map_err(|e| ReactorError::DatabaseError(format!("Task join error: {e}")))?
    }
}
