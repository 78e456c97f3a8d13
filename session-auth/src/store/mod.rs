//! Credential store: user accounts and refresh sessions persisted as JSON files.
//!
//! Each collection lives in its own file under the data directory and is cached
//! in memory for the lifetime of the process. See [`snapshot`] for the write
//! discipline.

pub mod models;
pub mod repositories;
pub mod seed;
pub mod snapshot;
pub mod time;

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::Result;
use repositories::{JsonSessionRepository, JsonUserRepository, SessionRepository, UserRepository};
use snapshot::JsonCollection;

pub const USERS_FILE: &str = "users.json";
pub const SESSIONS_FILE: &str = "sessions.json";

/// Both repositories backed by one data directory.
#[derive(Clone)]
pub struct CredentialStore {
    users: Arc<JsonUserRepository>,
    sessions: Arc<JsonSessionRepository>,
}

impl CredentialStore {
    /// Load (or create) `users.json` and `sessions.json` under `data_dir`.
    pub async fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        let users = JsonCollection::load("users", data_dir.join(USERS_FILE)).await?;
        let sessions = JsonCollection::load("sessions", data_dir.join(SESSIONS_FILE)).await?;

        info!(
            data_dir = %data_dir.display(),
            users = users.snapshot().len(),
            sessions = sessions.snapshot().len(),
            "Credential store opened"
        );

        Ok(Self {
            users: Arc::new(JsonUserRepository::new(users)),
            sessions: Arc::new(JsonSessionRepository::new(sessions)),
        })
    }

    pub fn users(&self) -> Arc<dyn UserRepository> {
        self.users.clone()
    }

    pub fn sessions(&self) -> Arc<dyn SessionRepository> {
        self.sessions.clone()
    }
}
