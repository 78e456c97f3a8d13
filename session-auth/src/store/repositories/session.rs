//! Refresh-session repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::Result;
use crate::store::models::SessionRecord;
use crate::store::snapshot::{Change, JsonCollection};

/// Session repository trait for refresh-session data access operations.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Append a new session.
    async fn create(&self, session: &SessionRecord) -> Result<()>;

    /// First unrevoked session (in insertion order) whose secret hash matches.
    /// Expiry is not checked here.
    async fn find_by_token_hash(&self, hash: &str) -> Result<Option<SessionRecord>>;

    /// Delete a session by id. Returns whether a record was removed; removing an
    /// absent id is not an error.
    async fn remove(&self, id: &str) -> Result<bool>;

    /// Delete every session that is not live at `now` in a single write.
    /// Returns the number of sessions deleted.
    async fn clear_expired(&self, now: DateTime<Utc>) -> Result<u64>;

    /// Count stored sessions, live or not.
    async fn count(&self) -> Result<usize>;
}

/// JSON-file implementation of SessionRepository.
pub struct JsonSessionRepository {
    sessions: JsonCollection<SessionRecord>,
}

impl JsonSessionRepository {
    pub fn new(sessions: JsonCollection<SessionRecord>) -> Self {
        Self { sessions }
    }
}

#[async_trait]
impl SessionRepository for JsonSessionRepository {
    async fn create(&self, session: &SessionRecord) -> Result<()> {
        self.sessions
            .mutate(|all| {
                all.push(session.clone());
                Change::Commit(())
            })
            .await
    }

    async fn find_by_token_hash(&self, hash: &str) -> Result<Option<SessionRecord>> {
        Ok(self
            .sessions
            .snapshot()
            .iter()
            .find(|s| s.refresh_token_hash == hash && !s.is_revoked())
            .cloned())
    }

    async fn remove(&self, id: &str) -> Result<bool> {
        self.sessions
            .mutate(|all| {
                let before = all.len();
                all.retain(|s| s.id != id);
                if all.len() == before {
                    Change::Skip(false)
                } else {
                    Change::Commit(true)
                }
            })
            .await
    }

    async fn clear_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        self.sessions
            .mutate(|all| {
                let before = all.len();
                all.retain(|s| s.is_live(now));
                let removed = (before - all.len()) as u64;
                if removed == 0 {
                    Change::Skip(0)
                } else {
                    Change::Commit(removed)
                }
            })
            .await
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.sessions.snapshot().len())
    }
}
