//! Session bearer tokens.
//!
//! A token is 32 bytes from the OS CSPRNG, hex-encoded. Only its SHA-256
//! hash is persisted; the raw token goes to the client once.

use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Number of random bytes in a session token.
pub const TOKEN_BYTES: usize = 32;

/// Generates a new random session token (64 lowercase hex characters).
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Returns the lookup hash of a token: SHA-256, lowercase hex.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
