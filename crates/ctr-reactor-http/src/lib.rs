//! # ctr-reactor-http
//!
//! The HTTP surface of ctr-reactor, built on axum.
//!
//! ## Routes
//!
//! - `POST /signup`, `POST /login`, `POST /logout`, `GET /me` ([`auth`])
//! - `GET /admin-access/{secret}`, `GET /admin-access?key=`, `POST /admin/logout`
//!   and the `/admin` request filter ([`admin`])
//! - `GET /health` ([`health`])
//!
//! Every error body is `{"message": ...}` ([`error::ApiError`]).

pub mod admin;
pub mod auth;
pub mod cookies;
pub mod error;
pub mod health;
pub mod server;

pub use error::ApiError;
pub use server::{AppState, ReactorApp};
