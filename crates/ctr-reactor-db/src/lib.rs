//! # ctr-reactor-db
//!
//! Backend-agnostic value and row types shared by the database backends
//! and the user stores.
//!
//! - [`value`] - The [`Value`](value::Value) enum used for query parameters and results
//! - [`row`] - [`Row`](row::Row) and the [`FromValue`](row::FromValue) conversion trait

pub mod row;
pub mod value;

pub use row::{FromValue, Row};
pub use value::Value;
