//! Session manager: login, session lookup, refresh-token rotation and logout.
//!
//! Refresh sessions move Issued -> Rotated | Revoked | Expired, and every terminal
//! state is represented by deleting the record. Expired records are swept before
//! each session-sensitive operation, so lookups only ever see live sessions.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::store::models::{SessionRecord, UserRecord};
use crate::store::repositories::{SessionRepository, UserRepository};
use crate::store::time::Clock;

use super::jwt::{JwtService, TokenError};
use super::password::{self, REFRESH_TOKEN_BYTES};

/// Shortest access token lifetime accepted.
pub const MIN_ACCESS_TOKEN_TTL_SECS: u64 = 60;
/// Shortest refresh session lifetime accepted.
pub const MIN_REFRESH_TOKEN_TTL_SECS: u64 = 24 * 60 * 60;

/// Authentication configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Access token lifetime in seconds (default: 1200 = 20 minutes)
    pub access_token_ttl_secs: u64,
    /// Refresh session lifetime in seconds (default: 1209600 = 14 days)
    pub refresh_token_ttl_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token_ttl_secs: 20 * 60,
            refresh_token_ttl_secs: 14 * 24 * 60 * 60,
        }
    }
}

impl AuthConfig {
    /// Build from the configured minutes/days, clamping each to its floor.
    pub fn from_ttls(access_minutes: i64, refresh_days: i64) -> Self {
        let access = access_minutes.saturating_mul(60).max(0) as u64;
        let refresh = refresh_days.saturating_mul(24 * 60 * 60).max(0) as u64;
        Self {
            access_token_ttl_secs: access.max(MIN_ACCESS_TOKEN_TTL_SECS),
            refresh_token_ttl_secs: refresh.max(MIN_REFRESH_TOKEN_TTL_SECS),
        }
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::seconds(self.refresh_token_ttl_secs as i64)
    }
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Unknown email or wrong password; the two are never told apart.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("No active session")]
    NoActiveSession,

    #[error("Storage error: {0}")]
    Storage(#[from] crate::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        AuthError::Internal(e.to_string())
    }
}

/// Result of a successful login, refresh or session check.
#[derive(Debug, Clone)]
pub struct AuthResponse {
    pub user: UserRecord,
    /// Signed JWT access token
    pub access_token: String,
    pub access_token_expires_at: DateTime<Utc>,
    /// Plaintext refresh secret; only its hash is stored
    pub refresh_token: String,
    pub refresh_token_expires_at: DateTime<Utc>,
}

/// A live refresh session together with its owner and the secret that found it.
#[derive(Debug, Clone)]
pub struct ResolvedSession {
    pub user: UserRecord,
    pub session: SessionRecord,
    pub refresh_token: String,
}

/// Authentication service for managing logins and refresh sessions.
pub struct AuthService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    jwt_service: Arc<JwtService>,
    clock: Arc<dyn Clock>,
    config: AuthConfig,
}

impl AuthService {
    /// Create a new AuthService.
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        jwt_service: Arc<JwtService>,
        clock: Arc<dyn Clock>,
        config: AuthConfig,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            jwt_service,
            clock,
            config,
        }
    }

    pub fn jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }

    /// Current time according to the service clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Authenticate with email and password and open a new refresh session.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        let email = email.trim();
        debug!(email = %email, "Login attempt");

        let Some(user) = self.user_repo.find_by_email(email).await? else {
            warn!(email = %email, "Login failed: invalid credentials");
            return Err(AuthError::InvalidCredentials);
        };

        if !password::verify_password(password, &user.password_hash) {
            warn!(user_id = %user.id, email = %email, "Login failed: invalid credentials");
            return Err(AuthError::InvalidCredentials);
        }

        let now = self.clock.now();
        self.sweep_at(now).await?;

        let access = self.jwt_service.issue_access_token(&user, now)?;
        let (refresh_token, session) = self.mint_session(&user, now).await?;

        info!(
            user_id = %user.id,
            session_id = %session.id,
            refresh_expires_at = %session.expires_at,
            "Login successful (refresh session issued)"
        );

        Ok(AuthResponse {
            user,
            access_token: access.token,
            access_token_expires_at: access.expires_at,
            refresh_token,
            refresh_token_expires_at: session.expires_at,
        })
    }

    /// Find the live session behind a refresh secret.
    ///
    /// A session whose owner no longer exists is deleted and treated as absent.
    pub async fn resolve_session(&self, refresh_token: &str) -> Result<ResolvedSession, AuthError> {
        let now = self.clock.now();
        self.sweep_at(now).await?;

        let refresh_token = refresh_token.trim();
        if refresh_token.is_empty() {
            return Err(AuthError::NoActiveSession);
        }

        let token_hash = password::hash_token(refresh_token);
        let token_hash_prefix = password::hash_prefix(&token_hash);

        let Some(session) = self.session_repo.find_by_token_hash(&token_hash).await? else {
            debug!(token_hash_prefix = %token_hash_prefix, "Refresh session not found");
            return Err(AuthError::NoActiveSession);
        };

        if !session.is_live(now) {
            self.session_repo.remove(&session.id).await?;
            debug!(
                session_id = %session.id,
                token_hash_prefix = %token_hash_prefix,
                "Expired refresh session presented"
            );
            return Err(AuthError::NoActiveSession);
        }

        let Some(user) = self.user_repo.find_by_id(&session.user_id).await? else {
            self.session_repo.remove(&session.id).await?;
            warn!(
                user_id = %session.user_id,
                session_id = %session.id,
                "Refresh session owner missing; orphan session removed"
            );
            return Err(AuthError::NoActiveSession);
        };

        Ok(ResolvedSession {
            user,
            session,
            refresh_token: refresh_token.to_string(),
        })
    }

    /// Resolve the session and issue a fresh access token for its owner.
    ///
    /// The refresh secret is not rotated.
    pub async fn current_session(&self, refresh_token: &str) -> Result<AuthResponse, AuthError> {
        let resolved = self.resolve_session(refresh_token).await?;
        let access = self
            .jwt_service
            .issue_access_token(&resolved.user, self.clock.now())?;

        debug!(
            user_id = %resolved.user.id,
            session_id = %resolved.session.id,
            "Session restored"
        );

        Ok(AuthResponse {
            user: resolved.user,
            access_token: access.token,
            access_token_expires_at: access.expires_at,
            refresh_token: resolved.refresh_token,
            refresh_token_expires_at: resolved.session.expires_at,
        })
    }

    /// Rotate a refresh secret: the old session is deleted and a new one minted.
    ///
    /// Only the caller whose delete actually removed the old record gets new
    /// tokens, so a secret can be redeemed once.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthResponse, AuthError> {
        let resolved = self.resolve_session(refresh_token).await?;
        let old_session = resolved.session;
        let user = resolved.user;

        if !self.session_repo.remove(&old_session.id).await? {
            warn!(
                user_id = %user.id,
                session_id = %old_session.id,
                token_hash_prefix = %password::hash_prefix(&old_session.refresh_token_hash),
                "Refresh session already redeemed by a concurrent request"
            );
            return Err(AuthError::NoActiveSession);
        }

        let now = self.clock.now();
        let (new_refresh_token, new_session) = self.mint_session(&user, now).await?;
        let access = self.jwt_service.issue_access_token(&user, now)?;

        info!(
            user_id = %user.id,
            old_session_id = %old_session.id,
            new_session_id = %new_session.id,
            refresh_expires_at = %new_session.expires_at,
            "Token refresh succeeded (refresh session rotated)"
        );

        Ok(AuthResponse {
            user,
            access_token: access.token,
            access_token_expires_at: access.expires_at,
            refresh_token: new_refresh_token,
            refresh_token_expires_at: new_session.expires_at,
        })
    }

    /// End the session behind `refresh_token`, if there is one.
    ///
    /// Returns whether a session was removed. Missing or unknown secrets are not errors.
    pub async fn logout(&self, refresh_token: Option<&str>) -> Result<bool, AuthError> {
        let Some(refresh_token) = refresh_token else {
            self.sweep_expired().await?;
            return Ok(false);
        };

        match self.resolve_session(refresh_token).await {
            Ok(resolved) => {
                let removed = self.session_repo.remove(&resolved.session.id).await?;
                info!(
                    user_id = %resolved.user.id,
                    session_id = %resolved.session.id,
                    "Logout (refresh session revoked)"
                );
                Ok(removed)
            }
            Err(AuthError::NoActiveSession) => {
                debug!("Logout without an active session");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Delete every session that is no longer live. Returns the number deleted.
    pub async fn sweep_expired(&self) -> Result<u64, AuthError> {
        self.sweep_at(self.clock.now()).await
    }

    async fn sweep_at(&self, now: DateTime<Utc>) -> Result<u64, AuthError> {
        let removed = self.session_repo.clear_expired(now).await?;
        if removed > 0 {
            debug!(removed = removed, "Expired refresh sessions swept");
        }
        Ok(removed)
    }

    /// Generate a refresh secret and persist the session that stores its hash.
    async fn mint_session(
        &self,
        user: &UserRecord,
        now: DateTime<Utc>,
    ) -> Result<(String, SessionRecord), AuthError> {
        let refresh_token = password::generate_random_token(REFRESH_TOKEN_BYTES);
        let session = SessionRecord::new(
            &user.id,
            password::hash_token(&refresh_token),
            now,
            self.config.refresh_ttl(),
        );
        self.session_repo.create(&session).await?;
        Ok((refresh_token, session))
    }
}
