//! User records and roles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surge_core::types::UserId;

// ============================================================================
// Role
// ============================================================================

/// Authorization role attached to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular buyer.
    #[default]
    User,
    /// Operator with access to catalog and schedule mutations.
    Admin,
}

impl Role {
    /// Stable string form, matching the `users.role` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    /// Parse the column form back. Returns `None` for unknown strings.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// User
// ============================================================================

/// A full user record, including credential material.
///
/// Never serialize this directly into a response; use [`UserProfile`] via
/// [`User::profile`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// User identifier.
    pub id: UserId,
    /// Login email, unique across the registry.
    pub email: String,
    /// Base64 SHA-256 digest of salt plus password.
    pub password_hash: String,
    /// Base64 per-user random salt.
    pub password_salt: String,
    /// Authorization role.
    pub role: Role,
    /// Record creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last edit timestamp.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// The hash-free view safe to expose.
    #[must_use]
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email.clone(),
            role: self.role,
            created_at: self.created_at,
        }
    }
}

/// The outward-facing view of a user: no credential material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User identifier.
    pub id: UserId,
    /// Login email.
    pub email: String,
    /// Authorization role.
    pub role: Role,
    /// Record creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Basic shape check for login emails.
///
/// One `@` with non-empty local and domain parts, and a dot somewhere in the
/// domain. Deliberately shallow; the registry's unique index is the real
/// gatekeeper.
#[must_use]
pub fn email_is_valid(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_roundtrips_through_its_column_form() {
        assert_eq!(Role::parse("user"), Some(Role::User));
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("superuser"), None);
        assert_eq!(Role::Admin.as_str(), "admin");
    }

    #[test]
    fn email_shape_validation() {
        assert!(email_is_valid("buyer@example.com"));
        assert!(!email_is_valid("no-at-sign"));
        assert!(!email_is_valid("@example.com"));
        assert!(!email_is_valid("buyer@nodot"));
        assert!(!email_is_valid("buyer@.com"));
    }
}
