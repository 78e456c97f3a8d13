//! Refresh-session record.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::store::time::iso_millis;

/// One outstanding refresh-token grant.
/// Only the SHA-256 hash of the refresh secret is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Unique identifier (UUID)
    pub id: String,
    /// Owning user id
    pub user_id: String,
    /// Hex SHA-256 of the refresh secret
    pub refresh_token_hash: String,
    #[serde(with = "iso_millis")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "iso_millis")]
    pub expires_at: DateTime<Utc>,
    #[serde(default, with = "iso_millis::option")]
    pub revoked_at: Option<DateTime<Utc>>,
}

impl SessionRecord {
    /// Create a live session that expires `ttl` after `now`.
    pub fn new(
        user_id: impl Into<String>,
        refresh_token_hash: impl Into<String>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            refresh_token_hash: refresh_token_hash.into(),
            created_at: now,
            expires_at: now + ttl,
            revoked_at: None,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// Live iff not revoked and `expires_at` is strictly after `now`.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        !self.is_revoked() && !self.is_expired(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, h, 0, 0).unwrap()
    }

    #[test]
    fn test_new_session_is_live() {
        let session = SessionRecord::new("user-1", "hash", at(0), Duration::hours(2));
        assert_eq!(session.expires_at, at(2));
        assert!(session.is_live(at(1)));
        assert!(!session.is_revoked());
    }

    #[test]
    fn test_session_dead_at_exact_expiry() {
        let session = SessionRecord::new("user-1", "hash", at(0), Duration::hours(2));
        assert!(session.is_expired(at(2)));
        assert!(!session.is_live(at(2)));
    }

    #[test]
    fn test_revoked_session_is_not_live() {
        let mut session = SessionRecord::new("user-1", "hash", at(0), Duration::hours(2));
        session.revoked_at = Some(at(1));
        assert!(!session.is_live(at(1)));
    }

    #[test]
    fn test_session_json_round_trip_keeps_shape() {
        let session = SessionRecord::new("user-1", "abc", at(0), Duration::hours(1));
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["userId"], "user-1");
        assert_eq!(json["refreshTokenHash"], "abc");
        assert_eq!(json["expiresAt"], "2025-01-01T01:00:00.000Z");
        assert!(json["revokedAt"].is_null());

        let back: SessionRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, session);
    }

    #[test]
    fn test_missing_revoked_at_defaults_to_none() {
        let json = r#"{
            "id": "s1",
            "userId": "u1",
            "refreshTokenHash": "h",
            "createdAt": "2025-01-01T00:00:00.000Z",
            "expiresAt": "2025-01-15T00:00:00.000Z"
        }"#;
        let session: SessionRecord = serde_json::from_str(json).unwrap();
        assert!(session.revoked_at.is_none());
    }
}
