//! The `check` command.
//!
//! Validates settings and reports which backend would be selected.

use async_trait::async_trait;
use ctr_reactor_auth::{connect_store, AdminGate};
use ctr_reactor_core::{ReactorError, Settings};

use crate::command::ManagementCommand;

/// Runs configuration checks.
pub struct CheckCommand;

/// The result of a single check.
#[derive(Debug, Clone)]
pub struct CheckMessage {
    /// Severity.
    pub level: CheckLevel,
    /// What is wrong.
    pub msg: String,
    /// Stable identifier, e.g. "security.W001".
    pub id: String,
}

/// Severity of a check result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CheckLevel {
    /// Worth knowing about.
    Warning,
    /// Prevents correct operation.
    Error,
}

impl std::fmt::Display for CheckLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// Runs every check against the settings.
pub fn run_checks(settings: &Settings) -> Vec<CheckMessage> {
    let mut messages: Vec<CheckMessage> = settings
        .check()
        .into_iter()
        .enumerate()
        .map(|(i, msg)| CheckMessage {
            level: CheckLevel::Error,
            msg,
            id: format!("settings.E{:03}", i + 1),
        })
        .collect();

    if settings.debug {
        messages.push(CheckMessage {
            level: CheckLevel::Warning,
            msg: "debug is enabled: cookies are sent without Secure".to_string(),
            id: "security.W001".to_string(),
        });
    }

    if settings.admin.secrets.is_empty() {
        messages.push(CheckMessage {
            level: CheckLevel::Warning,
            msg: "no admin secrets configured: the admin gate is disabled".to_string(),
            id: "admin.W001".to_string(),
        });
    } else if settings.admin.secrets.iter().any(|s| s.len() < 16) {
        messages.push(CheckMessage {
            level: CheckLevel::Warning,
            msg: "an admin secret is shorter than 16 characters".to_string(),
            id: "admin.W002".to_string(),
        });
    }

    if settings.admin.trust_forwarded_for && !settings.admin.allowed_ips.is_empty() {
        messages.push(CheckMessage {
            level: CheckLevel::Warning,
            msg: "IP allowlist trusts X-Forwarded-For; only safe behind a proxy that sets it"
                .to_string(),
            id: "admin.W003".to_string(),
        });
    }

    if let Err(e) = AdminGate::from_settings(settings) {
        messages.push(CheckMessage {
            level: CheckLevel::Error,
            msg: e.to_string(),
            id: "admin.E001".to_string(),
        });
    }

    messages
}

#[async_trait]
impl ManagementCommand for CheckCommand {
    fn name(&self) -> &'static str {
        "check"
    }

    fn help(&self) -> &'static str {
        "Validates settings and reports the selected backend"
    }

    async fn handle(
        &self,
        _matches: &clap::ArgMatches,
        settings: &Settings,
    ) -> Result<(), ReactorError> {
        let messages = run_checks(settings);
        for msg in &messages {
            tracing::warn!("{} ({}): {}", msg.level, msg.id, msg.msg);
        }

        match connect_store(&settings.database).await {
            Ok(store) => tracing::info!(backend = store.vendor(), "user store reachable"),
            Err(e) => tracing::error!(error = %e, "no user store reachable"),
        }

        let errors = messages
            .iter()
            .filter(|m| m.level == CheckLevel::Error)
            .count();
        tracing::info!(
            "Check identified {} issue(s) ({} error(s))",
            messages.len(),
            errors
        );

        if errors > 0 {
            return Err(ReactorError::ConfigurationError(format!(
                "Check found {errors} error(s)"
            )));
        }
        Ok(())
    }
}
