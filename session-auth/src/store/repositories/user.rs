//! User repository.

use async_trait::async_trait;

use crate::Result;
use crate::store::models::UserRecord;
use crate::store::snapshot::{Change, JsonCollection};

/// User repository trait for user data access operations.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by email, ignoring case.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>>;

    /// Find a user by their unique ID.
    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>>;

    /// Insert `user` unless another user already has the same email.
    /// Returns whether the user was inserted.
    async fn create_if_absent(&self, user: &UserRecord) -> Result<bool>;

    /// Count total number of users.
    async fn count(&self) -> Result<usize>;
}

/// JSON-file implementation of UserRepository.
pub struct JsonUserRepository {
    users: JsonCollection<UserRecord>,
}

impl JsonUserRepository {
    pub fn new(users: JsonCollection<UserRecord>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl UserRepository for JsonUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let email = email.to_lowercase();
        Ok(self
            .users
            .snapshot()
            .iter()
            .find(|u| u.email.to_lowercase() == email)
            .cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>> {
        Ok(self.users.snapshot().iter().find(|u| u.id == id).cloned())
    }

    async fn create_if_absent(&self, user: &UserRecord) -> Result<bool> {
        self.users
            .mutate(|all| {
                if all.iter().any(|u| u.has_email(&user.email)) {
                    Change::Skip(false)
                } else {
                    all.push(user.clone());
                    Change::Commit(true)
                }
            })
            .await
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.users.snapshot().len())
    }
}
