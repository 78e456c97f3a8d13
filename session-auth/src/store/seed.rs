//! Default account seeding.

use tracing::{debug, info};

use crate::Result;
use crate::auth::password;
use crate::store::models::{Role, UserRecord};
use crate::store::repositories::UserRepository;

/// Password given to every seeded account.
pub const DEFAULT_PASSWORD: &str = "1234";

/// Accounts created on first start: (email, display name, role).
pub const DEFAULT_USERS: &[(&str, &str, Role)] = &[
    ("prueba@usuario.com", "Cliente de Prueba", Role::Customer),
    ("local@comercio.com", "Comercio de Prueba", Role::Merchant),
];

/// Create each default account whose email is not taken yet.
///
/// Safe to run on every start; returns how many accounts were created.
pub async fn seed_default_users(users: &dyn UserRepository) -> Result<usize> {
    let mut created = 0;
    for (email, name, role) in DEFAULT_USERS {
        if users.find_by_email(email).await?.is_some() {
            debug!(email = %email, "Seed user already present");
            continue;
        }

        let hash = password::hash_password(DEFAULT_PASSWORD)?;
        let user = UserRecord::new(*email, *name, *role, hash);
        if users.create_if_absent(&user).await? {
            info!(user_id = %user.id, email = %email, role = %role, "Seeded default user");
            created += 1;
        }
    }
    Ok(created)
}
