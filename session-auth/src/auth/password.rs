//! Password hashing and opaque token helpers.
//!
//! Passwords use Argon2id with a per-hash random salt. Refresh secrets are
//! already high-entropy random values, so they only get a SHA-256 digest.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};

use crate::{Error, Result};

/// Length in bytes of every derived password key.
pub const KEY_LENGTH: usize = 64;

/// Default size of a refresh secret in bytes (384 bits).
pub const REFRESH_TOKEN_BYTES: usize = 48;

fn hasher() -> Result<Argon2<'static>> {
    // OWASP recommended parameters: m=19456 (19 MiB), t=2, p=1
    let params = Params::new(19456, 2, 1, Some(KEY_LENGTH))
        .map_err(|e| Error::Other(format!("Invalid Argon2 params: {}", e)))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a password into a PHC string carrying the salt and the derived key.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| Error::Other(format!("Password hashing failed: {}", e)))?
        .to_string();
    Ok(hash)
}

/// Check `password` against a stored hash.
///
/// Never fails: an empty, malformed or wrong-length hash is simply a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    if hash.is_empty() {
        return false;
    }
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    if parsed.hash.as_ref().map(|h| h.len()) != Some(KEY_LENGTH) {
        return false;
    }
    let Ok(argon2) = hasher() else {
        return false;
    };
    // Params embedded in the hash take precedence; the output comparison is constant-time.
    argon2.verify_password(password.as_bytes(), &parsed).is_ok()
}

/// `len` bytes from a CSPRNG, base64url-encoded without padding.
pub fn generate_random_token(len: usize) -> String {
    let bytes: Vec<u8> = (0..len).map(|_| rand::random::<u8>()).collect();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hex SHA-256 of a token. Deterministic, used as the lookup key for sessions.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// First characters of a token hash, safe to put in logs.
pub fn hash_prefix(token_hash: &str) -> &str {
    const PREFIX_LEN: usize = 10;
    let end = std::cmp::min(PREFIX_LEN, token_hash.len());
    &token_hash[..end]
}
