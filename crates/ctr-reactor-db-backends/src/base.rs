//! Base database backend trait.

use ctr_reactor_core::ReactorError;
use ctr_reactor_db::{Row, Value};

/// The core trait for database backends.
///
/// All methods are async because database operations are I/O-bound. Backends
/// built on synchronous drivers (like `rusqlite`) run their work inside
/// `spawn_blocking` to keep the async interface.
///
/// Unique-constraint violations are reported as
/// [`ReactorError::IntegrityError`]; connection and pool failures as
/// [`ReactorError::OperationalError`]; anything else as
/// [`ReactorError::DatabaseError`].
#[async_trait::async_trait]
pub trait DatabaseBackend: Send + Sync {
    /// Returns the vendor name ("postgresql" or "sqlite").
    fn vendor(&self) -> &'static str;

    /// Executes a SQL statement that does not return rows.
    ///
    /// Returns the number of rows affected.
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64, ReactorError>;

    /// Executes several `;`-separated statements without parameters.
    async fn execute_batch(&self, sql: &str) -> Result<(), ReactorError>;

    /// Executes a SQL query and returns all result rows.
    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, ReactorError>;

    /// Executes a SQL query and returns the first row, if any.
    async fn query_opt(&self, sql: &str, params: &[Value]) -> Result<Option<Row>, ReactorError> {
        Ok(self.query(sql, params).await?.into_iter().next())
    }

    /// Executes a SQL query that must return a row.
    ///
    /// Returns [`ReactorError::DoesNotExist`] if no rows are returned.
    async fn query_one(&self, sql: &str, params: &[Value]) -> Result<Row, ReactorError> {
        self.query_opt(sql, params)
            .await?
            .ok_or_else(|| ReactorError::DoesNotExist("No rows returned".to_string()))
    }

    /// Checks that the database answers a trivial query.
    async fn ping(&self) -> Result<(), ReactorError> {
        self.query("SELECT 1", &[]).await.map(|_| ())
    }
}
