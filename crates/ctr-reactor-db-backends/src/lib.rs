//! # ctr-reactor-db-backends
//!
//! Database backend implementations behind the [`DatabaseBackend`](base::DatabaseBackend)
//! trait.
//!
//! Supported backends:
//! - `PostgreSQL` (feature `postgres`), pooled with `deadpool-postgres`
//! - `SQLite` (feature `sqlite`), a single `rusqlite` connection

pub mod base;
#[cfg(feature = "postgres")]
pub mod postgresql;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use base::DatabaseBackend;
#[cfg(feature = "postgres")]
pub use postgresql::PostgresBackend;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteBackend;
