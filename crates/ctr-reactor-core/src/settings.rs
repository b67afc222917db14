//! Process configuration for ctr-reactor.
//!
//! [`Settings`] is built once at startup (see
//! [`settings_loader`](crate::settings_loader)) and then passed by reference
//! or inside an `Arc`. Nothing reads the environment after startup.

use std::net::IpAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// User store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Managed Postgres connection URL. When unset or unreachable the
    /// embedded `SQLite` file is used.
    pub url: Option<String>,
    /// Path of the embedded `SQLite` database file (`:memory:` for tests).
    pub sqlite_path: PathBuf,
    /// Maximum size of the Postgres connection pool.
    pub pool_size: usize,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            sqlite_path: PathBuf::from("ctr-reactor.sqlite3"),
            pool_size: 16,
        }
    }
}

/// Upper bound for any configured lifetime: ten years, in seconds.
pub const MAX_AGE_LIMIT_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// User session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Name of the cookie carrying the raw session token.
    pub cookie_name: String,
    /// Session lifetime in seconds.
    pub max_age_secs: u64,
    /// Minimum accepted password length at signup.
    pub min_password_length: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            cookie_name: "session_token".to_string(),
            max_age_secs: 604_800, // 7 days
            min_password_length: 8,
        }
    }
}

/// Admin gate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminSettings {
    /// Accepted shared secrets. Empty disables the gate.
    pub secrets: Vec<String>,
    /// Allowed client addresses. Empty allows every address.
    pub allowed_ips: Vec<String>,
    /// Optional static password expected in the `x-admin-password` header.
    pub password: Option<String>,
    /// Name of the admin cookie.
    pub cookie_name: String,
    /// Admin cookie lifetime in seconds.
    pub cookie_max_age_secs: u64,
    /// Take the client address from the right-most `X-Forwarded-For` hop.
    /// Only safe behind a proxy that appends it.
    pub trust_forwarded_for: bool,
    /// Also require a valid user session on `/admin/*`.
    pub require_session: bool,
}

impl Default for AdminSettings {
    fn default() -> Self {
        Self {
            secrets: Vec::new(),
            allowed_ips: Vec::new(),
            password: None,
            cookie_name: "is_admin".to_string(),
            cookie_max_age_secs: 3_600,
            trust_forwarded_for: false,
            require_session: false,
        }
    }
}

/// All ctr-reactor configuration.
///
/// # Examples
///
/// ```
/// use ctr_reactor_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(!settings.debug);
/// assert_eq!(settings.session.max_age_secs, 604_800);
/// assert_eq!(settings.admin.cookie_name, "is_admin");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Debug mode: pretty logs and non-`Secure` cookies.
    pub debug: bool,
    /// Key for HMAC signing of the admin cookie.
    pub secret_key: String,
    /// Tracing filter directive (e.g. "info", "ctr_reactor_auth=debug").
    pub log_level: String,
    /// Address the HTTP server binds to.
    pub bind_address: String,
    /// User store configuration.
    pub database: DatabaseSettings,
    /// User session configuration.
    pub session: SessionSettings,
    /// Admin gate configuration.
    pub admin: AdminSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            secret_key: String::new(),
            log_level: "info".to_string(),
            bind_address: "127.0.0.1:3000".to_string(),
            database: DatabaseSettings::default(),
            session: SessionSettings::default(),
            admin: AdminSettings::default(),
        }
    }
}

impl Settings {
    /// Whether cookies carry the `Secure` attribute.
    pub const fn secure_cookies(&self) -> bool {
        !self.debug
    }

    /// Reports configuration problems, one message per problem.
    ///
    /// An empty result means the settings are usable.
    pub fn check(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.secret_key.is_empty() && !self.debug {
            problems.push("secret_key must be set outside debug mode".to_string());
        }
        if self.session.max_age_secs == 0 {
            problems.push("session.max_age_secs must be greater than zero".to_string());
        }
        if self.session.max_age_secs > MAX_AGE_LIMIT_SECS {
            problems.push(format!(
                "session.max_age_secs must not exceed {MAX_AGE_LIMIT_SECS}"
            ));
        }
        if self.session.cookie_name.is_empty() || self.admin.cookie_name.is_empty() {
            problems.push("cookie names must not be empty".to_string());
        }
        if self.admin.cookie_max_age_secs == 0 {
            problems.push("admin.cookie_max_age_secs must be greater than zero".to_string());
        }
        if self.admin.cookie_max_age_secs > MAX_AGE_LIMIT_SECS {
            problems.push(format!(
                "admin.cookie_max_age_secs must not exceed {MAX_AGE_LIMIT_SECS}"
            ));
        }
        for ip in &self.admin.allowed_ips {
            if ip.parse::<IpAddr>().is_err() {
                problems.push(format!("admin.allowed_ips contains an invalid address: {ip}"));
            }
        }
        if self.admin.secrets.iter().any(String::is_empty) {
            problems.push("admin.secrets must not contain empty values".to_string());
        }
        if self.database.pool_size == 0 {
            problems.push("database.pool_size must be greater than zero".to_string());
        }

        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(!settings.debug);
        assert!(settings.secure_cookies());
        assert_eq!(settings.session.cookie_name, "session_token");
        assert_eq!(settings.session.max_age_secs, 7 * 24 * 60 * 60);
        assert_eq!(settings.admin.cookie_name, "is_admin");
        assert!(settings.admin.secrets.is_empty());
        assert!(!settings.admin.trust_forwarded_for);
        assert!(settings.database.url.is_none());
    }

    #[test]
    fn test_debug_disables_secure_cookies() {
        let settings = Settings {
            debug: true,
            ..Settings::default()
        };
        assert!(!settings.secure_cookies());
    }

    #[test]
    fn test_check_requires_secret_key_in_production() {
        let settings = Settings::default();
        assert!(settings
            .check()
            .iter()
            .any(|p| p.contains("secret_key")));

        let settings = Settings {
            secret_key: "k".to_string(),
            ..Settings::default()
        };
        assert!(settings.check().is_empty());
    }

    #[test]
    fn test_check_rejects_bad_ip() {
        let mut settings = Settings {
            secret_key: "k".to_string(),
            ..Settings::default()
        };
        settings.admin.allowed_ips = vec!["10.0.0.1".to_string(), "not-an-ip".to_string()];
        let problems = settings.check();
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("not-an-ip"));
    }

    #[test]
    fn test_check_rejects_zero_max_age() {
        let mut settings = Settings {
            debug: true,
            ..Settings::default()
        };
        settings.session.max_age_secs = 0;
        assert_eq!(settings.check().len(), 1);
    }

    #[test]
    fn test_check_rejects_unbounded_max_age() {
        let mut settings = Settings {
            debug: true,
            ..Settings::default()
        };
        settings.session.max_age_secs = 1_000_000_000_000_000;
        settings.admin.cookie_max_age_secs = MAX_AGE_LIMIT_SECS + 1;
        let problems = settings.check();
        assert_eq!(problems.len(), 2);
        assert!(problems[0].contains("session.max_age_secs"));

        settings.session.max_age_secs = MAX_AGE_LIMIT_SECS;
        settings.admin.cookie_max_age_secs = MAX_AGE_LIMIT_SECS;
        assert!(settings.check().is_empty());
    }

    #[test]
    fn test_serde_roundtrip_keeps_defaults_for_missing_fields() {
        let settings: Settings = serde_json::from_str(r#"{"debug": true}"#).unwrap();
        assert!(settings.debug);
        assert_eq!(settings.bind_address, "127.0.0.1:3000");
        assert_eq!(settings.session.min_password_length, 8);
    }
}
