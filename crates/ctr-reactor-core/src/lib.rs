//! # ctr-reactor-core
//!
//! Core types shared by every ctr-reactor crate. This crate has no
//! database or HTTP dependencies.
//!
//! ## Modules
//!
//! - [`error`] - The authentication error taxonomy and result alias
//! - [`settings`] - Immutable process configuration
//! - [`settings_loader`] - Loading settings from TOML files and the environment
//! - [`logging`] - Tracing subscriber setup
//! - [`signing`] - HMAC-SHA256 timestamp signing

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;
pub mod signing;

// Re-export the most commonly used types at the crate root.
pub use error::{ReactorError, ReactorResult, ValidationError};
pub use settings::Settings;
