//! Admin gate: shared secret, IP allowlist, password header and signed cookie.
//!
//! The gate is independent of user sessions. A request that presents an
//! accepted secret from an allowed address (and the admin password, when one
//! is configured) receives a signed `is_admin` cookie. The cookie is what the
//! `/admin` request filter checks afterwards.

use std::net::IpAddr;

use ctr_reactor_core::Settings;
use ctr_reactor_core::signing::{constant_time_eq, TimestampSigner};
use ctr_reactor_core::{ReactorError, ReactorResult};

const COOKIE_SALT: &str = "ctr_reactor.admin.cookie";
const COOKIE_VALUE: &str = "admin";

/// What an access attempt presents to the gate.
#[derive(Debug, Clone, Default)]
pub struct AdminRequest<'a> {
    /// Secret from the path segment or `key` query parameter.
    pub secret: Option<&'a str>,
    /// Client address as resolved by the transport layer.
    pub client_ip: Option<IpAddr>,
    /// Value of the `x-admin-password` header.
    pub password: Option<&'a str>,
}

/// Decides admin access and issues and verifies the admin cookie.
#[derive(Clone)]
pub struct AdminGate {
    secrets: Vec<String>,
    allowed_ips: Vec<IpAddr>,
    password: Option<String>,
    signer: TimestampSigner,
    cookie_name: String,
    cookie_max_age_secs: u64,
    trust_forwarded_for: bool,
    require_session: bool,
}

impl AdminGate {
    /// Builds the gate from settings.
    ///
    /// Unparseable allowlist entries are a configuration error, and so is an
    /// enabled gate without a `secret_key` outside debug mode.
    pub fn from_settings(settings: &Settings) -> ReactorResult<Self> {
        let admin = &settings.admin;
        let secrets: Vec<String> = admin
            .secrets
            .iter()
            .filter(|s| !s.is_empty())
            .cloned()
            .collect();
        if !secrets.is_empty() && settings.secret_key.is_empty() && !settings.debug {
            return Err(ReactorError::ConfigurationError(
                "the admin gate needs a secret_key outside debug mode".to_string(),
            ));
        }

        let allowed_ips = admin
            .allowed_ips
            .iter()
            .map(|ip| {
                ip.trim().parse::<IpAddr>().map(|ip| ip.to_canonical()).map_err(|_| {
                    ReactorError::ConfigurationError(format!("invalid admin allowed IP: {ip}"))
                })
            })
            .collect::<ReactorResult<Vec<_>>>()?;

        Ok(Self {
            secrets,
            allowed_ips,
            password: admin.password.clone().filter(|p| !p.is_empty()),
            signer: TimestampSigner::new(settings.secret_key.as_str()).with_salt(COOKIE_SALT),
            cookie_name: admin.cookie_name.clone(),
            cookie_max_age_secs: admin.cookie_max_age_secs,
            trust_forwarded_for: admin.trust_forwarded_for,
            require_session: admin.require_session,
        })
    }

    /// Whether at least one secret is configured.
    pub fn is_enabled(&self) -> bool {
        !self.secrets.is_empty()
    }

    /// Name of the admin cookie.
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Admin cookie lifetime in seconds.
    pub const fn cookie_max_age_secs(&self) -> u64 {
        self.cookie_max_age_secs
    }

    /// Whether the client address comes from `X-Forwarded-For`.
    pub const fn trust_forwarded_for(&self) -> bool {
        self.trust_forwarded_for
    }

    /// Whether `/admin/*` also requires a user session.
    pub const fn require_session(&self) -> bool {
        self.require_session
    }

    /// Compares a presented secret against every configured secret.
    pub fn check_secret(&self, presented: Option<&str>) -> bool {
        let Some(presented) = presented.filter(|s| !s.is_empty()) else {
            return false;
        };
        // Every candidate is compared so the match position does not leak.
        self.secrets
            .iter()
            .fold(false, |acc, secret| constant_time_eq(secret, presented) | acc)
    }

    /// An empty allowlist admits every address. A missing address is admitted
    /// only by an empty allowlist.
    pub fn check_ip(&self, client_ip: Option<IpAddr>) -> bool {
        if self.allowed_ips.is_empty() {
            return true;
        }
        client_ip.is_some_and(|ip| self.allowed_ips.contains(&ip.to_canonical()))
    }

    /// Checks the `x-admin-password` header when a password is configured.
    pub fn check_password(&self, presented: Option<&str>) -> ReactorResult<()> {
        let Some(expected) = self.password.as_deref() else {
            return Ok(());
        };
        match presented {
            None | Some("") => Err(ReactorError::Unauthenticated),
            Some(p) if constant_time_eq(expected, p) => Ok(()),
            Some(_) => Err(ReactorError::Forbidden("admin password mismatch".to_string())),
        }
    }

    /// Runs every check and returns the cookie value to set on success.
    ///
    /// Secret and address failures are `NotFound`, a missing password is
    /// `Unauthenticated` and a wrong password is `Forbidden`.
    pub fn authorize(&self, request: &AdminRequest<'_>) -> ReactorResult<String> {
        if !self.check_secret(request.secret) {
            tracing::warn!(client_ip = ?request.client_ip, "admin access denied: secret");
            return Err(ReactorError::NotFound);
        }
        if !self.check_ip(request.client_ip) {
            tracing::warn!(client_ip = ?request.client_ip, "admin access denied: address");
            return Err(ReactorError::NotFound);
        }
        if let Err(e) = self.check_password(request.password) {
            tracing::warn!(client_ip = ?request.client_ip, "admin access denied: password");
            return Err(e);
        }

        tracing::info!(client_ip = ?request.client_ip, "admin access granted");
        Ok(self.issue_cookie_value())
    }

    /// Signs a fresh admin cookie value.
    pub fn issue_cookie_value(&self) -> String {
        self.signer.sign(COOKIE_VALUE)
    }

    /// Verifies an admin cookie value, including its age.
    ///
    /// A disabled gate accepts no cookie at all.
    pub fn verify_cookie(&self, value: Option<&str>) -> bool {
        let Some(value) = value.filter(|v| !v.is_empty() && self.is_enabled()) else {
            return false;
        };
        match self.signer.unsign(value, Some(self.cookie_max_age_secs)) {
            Ok(inner) => inner == COOKIE_VALUE,
            Err(e) => {
                tracing::debug!(error = %e, "admin cookie rejected");
                false
            }
        }
    }
}
