//! Settings loading from configuration files and the environment.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML file (overriding defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `CTR_REACTOR_DEBUG` | `debug` |
//! | `CTR_REACTOR_SECRET_KEY` | `secret_key` |
//! | `CTR_REACTOR_LOG_LEVEL` | `log_level` |
//! | `CTR_REACTOR_BIND` | `bind_address` |
//! | `CTR_REACTOR_DATABASE_URL` | `database.url` |
//! | `CTR_REACTOR_SQLITE_PATH` | `database.sqlite_path` |
//! | `CTR_REACTOR_SESSION_MAX_AGE` | `session.max_age_secs` |
//! | `CTR_REACTOR_ADMIN_SECRETS` | `admin.secrets` (comma-separated) |
//! | `CTR_REACTOR_ADMIN_ALLOWED_IPS` | `admin.allowed_ips` (comma-separated) |
//! | `CTR_REACTOR_ADMIN_PASSWORD` | `admin.password` |
//! | `CTR_REACTOR_ADMIN_REQUIRE_SESSION` | `admin.require_session` |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use ctr_reactor_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file_with_env("reactor.toml").unwrap();
//! ```

use std::path::{Path, PathBuf};

use crate::error::ReactorError;
use crate::settings::Settings;

/// Loads settings from a TOML string.
///
/// Fields not present in the TOML keep their default values.
///
/// # Errors
///
/// Returns an error if the TOML is malformed or cannot be deserialized.
pub fn from_toml_str(toml_str: &str) -> Result<Settings, ReactorError> {
    // Merge through JSON so partial tables keep their defaults.
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| ReactorError::ConfigurationError(format!("Failed to parse TOML: {e}")))?;

    let json_value = toml_to_json(toml_value);
    let default_json = serde_json::to_value(Settings::default()).map_err(|e| {
        ReactorError::ConfigurationError(format!("Failed to serialize default settings: {e}"))
    })?;

    let merged = merge_json(default_json, json_value);
    serde_json::from_value(merged).map_err(|e| {
        ReactorError::ConfigurationError(format!("Failed to deserialize settings from TOML: {e}"))
    })
}

/// Loads settings from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Settings, ReactorError> {
    let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
        ReactorError::ConfigurationError(format!(
            "Failed to read TOML file '{}': {e}",
            path.as_ref().display()
        ))
    })?;
    from_toml_str(&content)
}

/// Loads settings from a TOML file and then applies environment variable overrides.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<Settings, ReactorError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from just environment variables (starting from defaults).
pub fn from_env() -> Settings {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies `CTR_REACTOR_*` environment variable overrides.
///
/// Unparsable numeric values are ignored and leave the current value in place.
pub fn apply_env_overrides(settings: &mut Settings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

/// Applies overrides from an arbitrary lookup. Split out so the mapping can be
/// tested without touching the process environment.
fn apply_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(val) = lookup("CTR_REACTOR_DEBUG") {
        settings.debug = parse_bool(&val);
    }

    if let Some(val) = lookup("CTR_REACTOR_SECRET_KEY") {
        settings.secret_key = val;
    }

    if let Some(val) = lookup("CTR_REACTOR_LOG_LEVEL") {
        settings.log_level = val;
    }

    if let Some(val) = lookup("CTR_REACTOR_BIND") {
        settings.bind_address = val;
    }

    if let Some(val) = lookup("CTR_REACTOR_DATABASE_URL") {
        let val = val.trim().to_string();
        settings.database.url = if val.is_empty() { None } else { Some(val) };
    }

    if let Some(val) = lookup("CTR_REACTOR_SQLITE_PATH") {
        settings.database.sqlite_path = PathBuf::from(val);
    }

    if let Some(val) = lookup("CTR_REACTOR_SESSION_MAX_AGE") {
        if let Ok(secs) = val.trim().parse::<u64>() {
            settings.session.max_age_secs = secs;
        }
    }

    if let Some(val) = lookup("CTR_REACTOR_ADMIN_SECRETS") {
        settings.admin.secrets = split_list(&val);
    }

    if let Some(val) = lookup("CTR_REACTOR_ADMIN_ALLOWED_IPS") {
        settings.admin.allowed_ips = split_list(&val);
    }

    if let Some(val) = lookup("CTR_REACTOR_ADMIN_PASSWORD") {
        settings.admin.password = if val.is_empty() { None } else { Some(val) };
    }

    if let Some(val) = lookup("CTR_REACTOR_ADMIN_REQUIRE_SESSION") {
        settings.admin.require_session = parse_bool(&val);
    }
}

// ============================================================
// Helpers
// ============================================================

fn parse_bool(val: &str) -> bool {
    matches!(val.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}

fn split_list(val: &str) -> Vec<String> {
    val.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Converts a TOML value to a `serde_json::Value`.
fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => {
            let map: serde_json::Map<String, serde_json::Value> = table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect();
            serde_json::Value::Object(map)
        }
    }
}

/// Deep-merges two JSON values. The `override_val` takes precedence.
fn merge_json(base: serde_json::Value, override_val: serde_json::Value) -> serde_json::Value {
    match (base, override_val) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(override_map)) => {
            for (key, override_v) in override_map {
                let merged = if let Some(base_v) = base_map.remove(&key) {
                    merge_json(base_v, override_v)
                } else {
                    override_v
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, override_val) => override_val,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    // ── TOML loading ────────────────────────────────────────────────

    #[test]
    fn test_from_toml_str_basic() {
        let toml = r#"
            secret_key = "my-secret-key"
            debug = true
        "#;

        let settings = from_toml_str(toml).unwrap();
        assert_eq!(settings.secret_key, "my-secret-key");
        assert!(settings.debug);
        // Defaults preserved
        assert_eq!(settings.session.cookie_name, "session_token");
    }

    #[test]
    fn test_from_toml_str_partial_table() {
        let toml = r#"
            [admin]
            secrets = ["s3cret"]
            allowed_ips = ["203.0.113.7"]
        "#;

        let settings = from_toml_str(toml).unwrap();
        assert_eq!(settings.admin.secrets, vec!["s3cret".to_string()]);
        assert_eq!(settings.admin.allowed_ips.len(), 1);
        assert_eq!(settings.admin.cookie_name, "is_admin");
        assert_eq!(settings.admin.cookie_max_age_secs, 3_600);
    }

    #[test]
    fn test_from_toml_str_database() {
        let toml = r#"
            [database]
            url = "postgres://reactor:pw@localhost/reactor"
            pool_size = 4
        "#;

        let settings = from_toml_str(toml).unwrap();
        assert_eq!(
            settings.database.url.as_deref(),
            Some("postgres://reactor:pw@localhost/reactor")
        );
        assert_eq!(settings.database.pool_size, 4);
        assert_eq!(
            settings.database.sqlite_path,
            PathBuf::from("ctr-reactor.sqlite3")
        );
    }

    #[test]
    fn test_from_toml_str_empty() {
        let settings = from_toml_str("").unwrap();
        assert!(!settings.debug);
        assert!(settings.secret_key.is_empty());
    }

    #[test]
    fn test_from_toml_str_invalid() {
        let result = from_toml_str("this is not [valid toml");
        assert!(matches!(result, Err(ReactorError::ConfigurationError(_))));
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bind_address = \"0.0.0.0:8080\"").unwrap();
        let settings = from_toml_file(file.path()).unwrap();
        assert_eq!(settings.bind_address, "0.0.0.0:8080");
    }

    #[test]
    fn test_from_toml_file_missing() {
        let result = from_toml_file("/nonexistent/reactor.toml");
        assert!(matches!(result, Err(ReactorError::ConfigurationError(_))));
    }

    // ── Environment overrides ───────────────────────────────────────

    #[test]
    fn test_overrides_scalars() {
        let mut settings = Settings::default();
        apply_overrides(
            &mut settings,
            lookup_from(&[
                ("CTR_REACTOR_DEBUG", "1"),
                ("CTR_REACTOR_SECRET_KEY", "env-key"),
                ("CTR_REACTOR_BIND", "0.0.0.0:9000"),
                ("CTR_REACTOR_SESSION_MAX_AGE", "60"),
            ]),
        );
        assert!(settings.debug);
        assert_eq!(settings.secret_key, "env-key");
        assert_eq!(settings.bind_address, "0.0.0.0:9000");
        assert_eq!(settings.session.max_age_secs, 60);
    }

    #[test]
    fn test_overrides_lists() {
        let mut settings = Settings::default();
        apply_overrides(
            &mut settings,
            lookup_from(&[
                ("CTR_REACTOR_ADMIN_SECRETS", "alpha, beta,,"),
                ("CTR_REACTOR_ADMIN_ALLOWED_IPS", "127.0.0.1"),
            ]),
        );
        assert_eq!(settings.admin.secrets, vec!["alpha", "beta"]);
        assert_eq!(settings.admin.allowed_ips, vec!["127.0.0.1"]);
    }

    #[test]
    fn test_overrides_empty_database_url_means_none() {
        let mut settings = Settings::default();
        settings.database.url = Some("postgres://x".to_string());
        apply_overrides(&mut settings, lookup_from(&[("CTR_REACTOR_DATABASE_URL", "  ")]));
        assert!(settings.database.url.is_none());
    }

    #[test]
    fn test_overrides_invalid_max_age_ignored() {
        let mut settings = Settings::default();
        apply_overrides(
            &mut settings,
            lookup_from(&[("CTR_REACTOR_SESSION_MAX_AGE", "soon")]),
        );
        assert_eq!(settings.session.max_age_secs, 604_800);
    }

    #[test]
    fn test_overrides_admin_password() {
        let mut settings = Settings::default();
        apply_overrides(
            &mut settings,
            lookup_from(&[
                ("CTR_REACTOR_ADMIN_PASSWORD", "hunter2"),
                ("CTR_REACTOR_ADMIN_REQUIRE_SESSION", "yes"),
            ]),
        );
        assert_eq!(settings.admin.password.as_deref(), Some("hunter2"));
        assert!(settings.admin.require_session);
    }

    // ── Helpers ─────────────────────────────────────────────────────

    #[test]
    fn test_merge_json_nested() {
        let base = serde_json::json!({"a": {"b": 1, "c": 2}});
        let over = serde_json::json!({"a": {"c": 3}});
        assert_eq!(merge_json(base, over), serde_json::json!({"a": {"b": 1, "c": 3}}));
    }

    #[test]
    fn test_merge_json_array_override() {
        let base = serde_json::json!({"a": [1, 2]});
        let over = serde_json::json!({"a": [3]});
        assert_eq!(merge_json(base, over), serde_json::json!({"a": [3]}));
    }
}
