//! HMAC-SHA256 timestamp signing.
//!
//! The admin gate uses [`TimestampSigner`] for the `is_admin` cookie so the
//! cookie cannot be forged by a client and goes stale server-side.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::ReactorError;

type HmacSha256 = Hmac<Sha256>;

const SEP: char = ':';
const DEFAULT_SALT: &str = "ctr_reactor.signing";

/// Signs values together with the time they were signed.
///
/// Signed values look like `"value:timestamp:signature"`, where the
/// timestamp is in Unix seconds and the signature is an unpadded URL-safe
/// base64 HMAC over `"value:timestamp"`.
///
/// # Examples
///
/// ```
/// use ctr_reactor_core::signing::TimestampSigner;
///
/// let signer = TimestampSigner::new("my-secret-key");
/// let signed = signer.sign("admin");
/// assert_eq!(signer.unsign(&signed, Some(60)).unwrap(), "admin");
/// ```
#[derive(Clone)]
pub struct TimestampSigner {
    key: String,
    salt: String,
}

impl TimestampSigner {
    /// Creates a signer with the given secret key and the default salt.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            salt: DEFAULT_SALT.to_string(),
        }
    }

    /// Sets the salt. Values signed under one salt never verify under another.
    #[must_use]
    pub fn with_salt(mut self, salt: impl Into<String>) -> Self {
        self.salt = salt.into();
        self
    }

    fn signature(&self, payload: &str) -> String {
        let salted_key = format!("{}{SEP}{}", self.salt, self.key);
        let mut mac =
            HmacSha256::new_from_slice(salted_key.as_bytes()).expect("HMAC accepts any key size");
        mac.update(payload.as_bytes());
        URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
    }

    /// Signs a value stamped with the current time.
    pub fn sign(&self, value: &str) -> String {
        self.sign_at(value, Utc::now())
    }

    /// Signs a value stamped with the given time.
    pub fn sign_at(&self, value: &str, at: DateTime<Utc>) -> String {
        let payload = format!("{value}{SEP}{}", at.timestamp().max(0));
        let signature = self.signature(&payload);
        format!("{payload}{SEP}{signature}")
    }

    /// Verifies a signed value against the current time.
    ///
    /// With `max_age = Some(seconds)`, values older than that are rejected.
    pub fn unsign(&self, signed_value: &str, max_age: Option<u64>) -> Result<String, ReactorError> {
        self.unsign_at(signed_value, max_age, Utc::now())
    }

    /// Verifies a signed value against the given time.
    pub fn unsign_at(
        &self,
        signed_value: &str,
        max_age: Option<u64>,
        now: DateTime<Utc>,
    ) -> Result<String, ReactorError> {
        let (payload, signature) = signed_value
            .rsplit_once(SEP)
            .ok_or_else(|| ReactorError::BadSignature("no signature".to_string()))?;
        if !constant_time_eq(signature, &self.signature(payload)) {
            return Err(ReactorError::BadSignature(
                "signature verification failed".to_string(),
            ));
        }

        let (value, timestamp) = payload
            .rsplit_once(SEP)
            .ok_or_else(|| ReactorError::BadSignature("no timestamp".to_string()))?;
        let signed_at: i64 = timestamp
            .parse()
            .map_err(|_| ReactorError::BadSignature("invalid timestamp".to_string()))?;

        if let Some(max_age) = max_age {
            let age = u64::try_from(now.timestamp().saturating_sub(signed_at)).unwrap_or(0);
            if age > max_age {
                return Err(ReactorError::BadSignature("signature has expired".to_string()));
            }
        }

        Ok(value.to_string())
    }
}

/// Constant-time string comparison.
///
/// Runs in time dependent only on the lengths of the inputs.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_sign_unsign() {
        let signer = TimestampSigner::new("test-secret");
        let signed = signer.sign("admin");
        assert_eq!(signer.unsign(&signed, Some(60)).unwrap(), "admin");
        assert_eq!(signer.unsign(&signed, None).unwrap(), "admin");
    }

    #[test]
    fn test_value_with_separator() {
        let signer = TimestampSigner::new("k");
        let signed = signer.sign("a:b:c");
        assert_eq!(signer.unsign(&signed, None).unwrap(), "a:b:c");
    }

    #[test]
    fn test_tampered_value() {
        let signer = TimestampSigner::new("test-secret");
        let signed = signer.sign("admin");
        let tampered = signed.replacen("admin", "root", 1);
        assert!(signer.unsign(&tampered, None).is_err());
    }

    #[test]
    fn test_tampered_timestamp() {
        let signer = TimestampSigner::new("test-secret");
        let issued = Utc::now() - Duration::seconds(120);
        let signed = signer.sign_at("admin", issued);
        let (payload, sig) = signed.rsplit_once(':').unwrap();
        let (value, _) = payload.rsplit_once(':').unwrap();
        let refreshed = format!("{value}:{}:{sig}", Utc::now().timestamp());
        assert!(signer.unsign(&refreshed, Some(60)).is_err());
    }

    #[test]
    fn test_wrong_key() {
        let signed = TimestampSigner::new("key-a").sign("admin");
        assert!(TimestampSigner::new("key-b").unsign(&signed, None).is_err());
    }

    #[test]
    fn test_salt_separates_signers() {
        let signed = TimestampSigner::new("key").with_salt("salt1").sign("hello");
        let other = TimestampSigner::new("key").with_salt("salt2");
        assert!(other.unsign(&signed, None).is_err());
    }

    #[test]
    fn test_expired() {
        let signer = TimestampSigner::new("test-secret");
        let signed = signer.sign_at("admin", Utc::now() - Duration::seconds(120));
        assert!(signer.unsign(&signed, Some(60)).is_err());
        assert!(signer.unsign(&signed, None).is_ok());
    }

    #[test]
    fn test_expiry_boundary() {
        let signer = TimestampSigner::new("test-secret");
        let issued = Utc::now();
        let signed = signer.sign_at("admin", issued);
        let at_limit = issued + Duration::seconds(60);
        assert!(signer.unsign_at(&signed, Some(60), at_limit).is_ok());
        let past_limit = issued + Duration::seconds(61);
        assert!(signer.unsign_at(&signed, Some(60), past_limit).is_err());
    }

    #[test]
    fn test_forged_plain_values() {
        let signer = TimestampSigner::new("key");
        for forged in ["true", "admin", "admin:1:", ":", ""] {
            let err = signer.unsign(forged, Some(60)).unwrap_err();
            assert!(matches!(err, ReactorError::BadSignature(_)), "{forged}");
        }
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("abc", "abc"));
        assert!(!constant_time_eq("abc", "abd"));
        assert!(!constant_time_eq("abc", "ab"));
        assert!(constant_time_eq("", ""));
    }
}
