//! # ctr-reactor-test
//!
//! Testing tools for ctr-reactor: an in-process HTTP client with a cookie
//! jar, and a test stack over an in-memory `SQLite` store.

pub mod client;
pub mod stack;

pub use client::{SetCookie, TestClient, TestResponse};
pub use stack::{cheap_hasher, test_settings, TestStack};
