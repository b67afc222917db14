//! Credential hashing.
//!
//! [`Argon2Hasher`] derives Argon2id hashes encoded as PHC strings, e.g.
//! `$argon2id$v=19$m=19456,t=2,p=1$<salt>$<hash>`. The string carries the
//! algorithm, parameters and salt, so verification needs nothing else.
//!
//! Hashing and verification run on the blocking pool.

use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};
use async_trait::async_trait;
use ctr_reactor_core::{ReactorError, ValidationError};

/// Trait for credential hashing backends.
#[async_trait]
pub trait CredentialHasher: Send + Sync {
    /// Returns the algorithm identifier (e.g. "argon2id").
    fn algorithm(&self) -> &str;

    /// Hashes a plaintext password with a fresh random salt.
    ///
    /// Fails with a validation error on an empty password.
    async fn hash(&self, password: &str) -> Result<String, ReactorError>;

    /// Verifies a plaintext password against a stored hash.
    ///
    /// Returns `false` for a wrong password and for a malformed stored hash;
    /// the latter is logged as a corrupt record.
    async fn verify(&self, password: &str, hash: &str) -> bool;

    /// Returns `true` if the hash was produced with a different algorithm or
    /// cost than this hasher uses today.
    fn must_update(&self, hash: &str) -> bool;
}

/// Argon2id credential hasher.
///
/// The default cost is 19 MiB of memory, 2 iterations, parallelism 1 and a
/// 32-byte output.
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl Argon2Hasher {
    /// Memory cost in KiB of the default parameters.
    pub const DEFAULT_MEMORY_KIB: u32 = Params::DEFAULT_M_COST;
    /// Iteration count of the default parameters.
    pub const DEFAULT_ITERATIONS: u32 = Params::DEFAULT_T_COST;
    /// Degree of parallelism of the default parameters.
    pub const DEFAULT_PARALLELISM: u32 = Params::DEFAULT_P_COST;

    /// Creates a hasher with explicit cost parameters.
    pub fn with_params(
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
    ) -> Result<Self, ReactorError> {
        let params = Params::new(memory_kib, iterations, parallelism, Some(Params::DEFAULT_OUTPUT_LEN))
            .map_err(|e| ReactorError::ConfigurationError(format!("Invalid Argon2 parameters: {e}")))?;
        Ok(Self { params })
    }

    fn argon2(params: Params) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    }
}

#[async_trait]
impl CredentialHasher for Argon2Hasher {
    fn algorithm(&self) -> &'static str {
        "argon2id"
    }

    async fn hash(&self, password: &str) -> Result<String, ReactorError> {
        if password.is_empty() {
            return Err(ValidationError::new("Password must not be empty.", "invalid_input")
                .for_field("password")
                .into());
        }

        let password = password.to_string();
        let params = self.params.clone();
        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            Self::argon2(params)
                .hash_password(password.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| ReactorError::InternalServerError(format!("Argon2 hash error: {e}")))
        })
        .await
        .map_err(|e| ReactorError::InternalServerError(format!("Task join error: {e}")))?
    }

    async fn verify(&self, password: &str, hash: &str) -> bool {
        let password = password.to_string();
        let hash = hash.to_string();
        let result = tokio::task::spawn_blocking(move || {
            let parsed = match PasswordHash::new(&hash) {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::warn!(error = %e, "stored credential hash is malformed");
                    return false;
                }
            };
            // Parameters come from the parsed hash, not from this instance.
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .await;

        result.unwrap_or_else(|e| {
            tracing::error!(error = %e, "credential verification task failed");
            false
        })
    }

    fn must_update(&self, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return true;
        };
        if parsed.algorithm.as_str() != "argon2id" {
            return true;
        }
        match Params::try_from(&parsed) {
            Ok(stored) => {
                stored.m_cost() != self.params.m_cost()
                    || stored.t_cost() != self.params.t_cost()
                    || stored.p_cost() != self.params.p_cost()
            }
            Err(_) => true,
        }
    }
}
