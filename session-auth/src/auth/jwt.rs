//! Access token issuing and verification.
//!
//! Access tokens are HS256 JWTs. The server keeps no record of them; a token is
//! valid while its signature checks out and its `exp` is in the future.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::store::models::{Role, UserRecord};

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// User ID (subject)
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub name: String,
    /// Expiration timestamp (Unix seconds)
    pub exp: i64,
    /// Issued at timestamp (Unix seconds)
    pub iat: i64,
}

/// Token error types. None of them carry the token itself.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token generation failed: {0}")]
    Generation(String),
    #[error("Malformed token")]
    Malformed,
    #[error("Invalid token signature")]
    InvalidSignature,
    #[error("Token expired")]
    Expired,
}

/// A freshly signed token and the instant it stops being valid.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// JWT service for token generation and validation.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_secs: u64,
}

impl JwtService {
    /// Create a new JWT service.
    ///
    /// # Arguments
    /// * `secret` - The shared HMAC secret
    /// * `expiration_secs` - Lifetime of issued tokens in seconds
    pub fn new(secret: &str, expiration_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiration_secs,
        }
    }

    /// Sign an access token for `user`, valid from `now` for the configured lifetime.
    pub fn issue_access_token(
        &self,
        user: &UserRecord,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        let iat = now.timestamp();
        let exp = iat + self.expiration_secs as i64;

        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            name: user.name.clone(),
            exp,
            iat,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Generation(e.to_string()))?;
        let expires_at = DateTime::from_timestamp(exp, 0)
            .ok_or_else(|| TokenError::Generation(format!("expiry {} out of range", exp)))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Check the signature of `token` and return its claims.
    ///
    /// A token whose `exp` is at or before `now` is rejected.
    pub fn verify_token(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked below against the caller's clock, without leeway.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            })?;

        if claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("expiration_secs", &self.expiration_secs)
            .finish()
    }
}
