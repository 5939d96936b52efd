//! Error types for identity operations.

use surge_core::error::StoreError;
use surge_core::types::UserId;
use thiserror::Error;

// ============================================================================
// AuthError
// ============================================================================

/// Errors from registration, login, and token verification.
///
/// Credential failures are deliberately uniform: a wrong password and an
/// unknown email both surface as [`AuthError::InvalidCredentials`], so the
/// response does not reveal which accounts exist.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Email or password did not match a known account.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Registration attempted with an email that is already taken.
    #[error("email is already registered")]
    EmailTaken,

    /// Email failed basic shape validation.
    #[error("invalid email address")]
    InvalidEmail,

    /// Password shorter than the minimum length.
    #[error("password must be at least {minimum} characters")]
    WeakPassword {
        /// The enforced minimum length.
        minimum: usize,
    },

    /// No user with the given id.
    #[error("user not found: {0}")]
    NotFound(UserId),

    /// Bearer token was missing, malformed, expired, or badly signed.
    #[error("invalid or expired token")]
    InvalidToken,

    /// The backing store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

// ============================================================================
// RegistryError
// ============================================================================

/// Errors appending to the user registry.
///
/// [`RegistryError::EmailTaken`] is the storage-level uniqueness verdict,
/// raised by the unique index on `users.email` even when two registrations
/// race past any pre-check.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Another user already holds this email.
    #[error("email is already registered")]
    EmailTaken,

    /// The backing store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<RegistryError> for AuthError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::EmailTaken => Self::EmailTaken,
            RegistryError::Store(store) => Self::Store(store),
        }
    }
}
