//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] petlandia_core::EmailError),

    /// Unknown username or wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// No authenticated session.
    #[error("not logged in")]
    Unauthenticated,

    /// Authenticated, but not an administrator.
    #[error("administrator access required")]
    Forbidden,

    /// Username or email already taken.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Username empty or otherwise unusable.
    #[error("invalid username: {0}")]
    InvalidUsername(String),

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
