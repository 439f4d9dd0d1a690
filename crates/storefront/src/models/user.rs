//! User domain types.

use chrono::{DateTime, Utc};

use petlandia_core::{Email, UserId};

/// A storefront account.
///
/// The password hash never leaves the repository layer; see
/// [`crate::db::UserRepository::get_with_password_hash`].
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    /// Unique login name.
    pub username: String,
    /// Unique email address.
    pub email: Email,
    /// Administrators manage the catalog.
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}
