//! # ctr-reactor
//!
//! Authentication and session core for a small web service.
//!
//! This is the facade crate that re-exports the workspace crates. Depend on
//! it for everything, or on individual crates for finer-grained control.

/// Error taxonomy, settings, logging and HMAC signing.
pub use ctr_reactor_core as core;

/// Backend-agnostic values and rows.
pub use ctr_reactor_db as db;

/// `SQLite` and `PostgreSQL` backends.
pub use ctr_reactor_db_backends as db_backends;

/// Credential hashing, tokens, user stores, sessions and the admin gate.
pub use ctr_reactor_auth as auth;

/// Axum router, auth endpoints and admin routes.
pub use ctr_reactor_http as http;

/// Management commands.
#[cfg(feature = "cli")]
pub use ctr_reactor_cli as cli;

/// In-process test client and test stack.
#[cfg(feature = "testing")]
pub use ctr_reactor_test as test;

pub use ctr_reactor_auth::{SessionManager, UserStore};
pub use ctr_reactor_core::{ReactorError, ReactorResult, Settings};
pub use ctr_reactor_http::ReactorApp;
