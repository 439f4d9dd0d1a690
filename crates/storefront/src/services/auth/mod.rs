//! Authentication service.
//!
//! Password login against Argon2id hashes, user creation for the CLI, the
//! default-administrator bootstrap, and the administrator guard.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::SqlitePool;
use tracing::instrument;

use petlandia_core::Email;

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::{CurrentUser, User};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum username length.
const MAX_USERNAME_LENGTH: usize = 80;

/// Username of the bootstrap administrator.
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// Email of the bootstrap administrator.
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@petlandia.com";

/// Well-known bootstrap password. Insecure; change it after first login.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Login with username and password.
    ///
    /// The username must match exactly.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the user doesn't exist or
    /// the password is wrong.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let (user, password_hash) = self
            .users
            .get_with_password_hash(username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(user)
    }

    /// Create a user with a hashed password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidUsername` if the username is empty, too long
    /// or contains whitespace.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password is too short.
    /// Returns `AuthError::UserAlreadyExists` if the username or email is taken.
    #[instrument(skip(self, password))]
    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
        is_admin: bool,
    ) -> Result<User, AuthError> {
        let username = validate_username(username)?;
        let email = Email::parse(email)?;
        validate_password(password)?;

        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create(username, &email, &password_hash, is_admin)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, is_admin, "User created");
        Ok(user)
    }

    /// Create the default administrator unless a user with that name exists.
    ///
    /// # Returns
    ///
    /// The new administrator, or `None` if it already existed.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` if the password is too short, or a
    /// repository error.
    pub async fn bootstrap_admin(&self, password: &str) -> Result<Option<User>, AuthError> {
        if self
            .users
            .get_by_username(DEFAULT_ADMIN_USERNAME)
            .await?
            .is_some()
        {
            tracing::debug!("Administrator account already present");
            return Ok(None);
        }

        if password == DEFAULT_ADMIN_PASSWORD {
            tracing::warn!(
                username = DEFAULT_ADMIN_USERNAME,
                "Seeding administrator with the well-known default password; change it"
            );
        }

        let user = self
            .create_user(DEFAULT_ADMIN_USERNAME, DEFAULT_ADMIN_EMAIL, password, true)
            .await?;
        Ok(Some(user))
    }
}

/// Require that the identity belongs to an administrator.
///
/// # Errors
///
/// Returns `AuthError::Forbidden` if the administrator flag is not set.
pub fn require_admin(identity: &CurrentUser) -> Result<(), AuthError> {
    if identity.is_admin {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}

fn validate_username(username: &str) -> Result<&str, AuthError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AuthError::InvalidUsername("username is required".to_owned()));
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(AuthError::InvalidUsername(format!(
            "username must be at most {MAX_USERNAME_LENGTH} characters"
        )));
    }
    if username.chars().any(char::is_whitespace) {
        return Err(AuthError::InvalidUsername(
            "username must not contain whitespace".to_owned(),
        ));
    }
    Ok(username)
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id with a random salt.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored PHC hash string.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use petlandia_core::UserId;

    use super::*;

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("eightchr").is_ok());
    }

    #[test]
    fn test_validate_username() {
        assert_eq!(validate_username("  alice ").unwrap(), "alice");
        assert!(validate_username("   ").is_err());
        assert!(validate_username("two words").is_err());
        assert!(validate_username(&"x".repeat(81)).is_err());
    }

    #[test]
    fn test_require_admin() {
        let mut identity = CurrentUser {
            id: UserId::new(1),
            username: "alice".to_owned(),
            is_admin: false,
        };
        assert!(matches!(require_admin(&identity), Err(AuthError::Forbidden)));

        identity.is_admin = true;
        assert!(require_admin(&identity).is_ok());
    }
}
