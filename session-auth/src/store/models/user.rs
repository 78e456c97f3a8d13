//! User account record.

use serde::{Deserialize, Serialize};

/// Account role. A single scalar; there is no role hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[serde(alias = "cliente")]
    Customer,
    #[serde(alias = "local")]
    Merchant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Merchant => "merchant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User account record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Unique identifier (UUID)
    pub id: String,
    /// Login email, unique ignoring case
    pub email: String,
    /// Display name
    pub name: String,
    pub role: Role,
    /// Argon2id PHC string (salt and derived key)
    pub password_hash: String,
}

impl UserRecord {
    /// Create a new user. The password must already be hashed.
    pub fn new(
        email: impl Into<String>,
        name: impl Into<String>,
        role: Role,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.into(),
            name: name.into(),
            role,
            password_hash: password_hash.into(),
        }
    }

    /// Case-insensitive email comparison used for lookups and seeding.
    pub fn has_email(&self, email: &str) -> bool {
        self.email.to_lowercase() == email.to_lowercase()
    }
}
