//! Register/login orchestration.

use crate::error::AuthError;
use crate::password::{MIN_PASSWORD_LENGTH, generate_salt, hash_password, verify_password};
use crate::store::UserStore;
use crate::token::{Claims, TokenSigner};
use crate::user::{Role, User, email_is_valid};
use std::sync::Arc;
use surge_core::Clock;
use surge_core::types::UserId;

/// Identity service: registration, login, token verification, and user
/// administration over a [`UserStore`].
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    signer: TokenSigner,
    clock: Arc<dyn Clock>,
}

impl AuthService {
    /// Create a service over the given store and signer.
    #[must_use]
    pub fn new(store: Arc<dyn UserStore>, signer: TokenSigner, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            signer,
            clock,
        }
    }

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidEmail`] or [`AuthError::WeakPassword`]
    /// on validation failure, [`AuthError::EmailTaken`] if the email is
    /// already registered, or [`AuthError::Store`] on storage failure.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<User, AuthError> {
        if !email_is_valid(email) {
            return Err(AuthError::InvalidEmail);
        }
        if password.len() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::WeakPassword {
                minimum: MIN_PASSWORD_LENGTH,
            });
        }

        let now = self.clock.now();
        let salt = generate_salt();
        let user = User {
            id: UserId::new(),
            email: email.to_lowercase(),
            password_hash: hash_password(password, &salt),
            password_salt: salt,
            role,
            created_at: now,
            updated_at: now,
        };

        self.store.insert(user.clone()).await?;

        tracing::info!(user_id = %user.id, role = %user.role, "user registered");
        metrics::counter!("auth.user_registered").increment(1);
        Ok(user)
    }

    /// Log a user in, returning a signed session token and the user record.
    ///
    /// Unknown email and wrong password produce the same
    /// [`AuthError::InvalidCredentials`].
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] on a failed login or
    /// [`AuthError::Store`] on storage failure.
    pub async fn login(&self, email: &str, password: &str) -> Result<(String, User), AuthError> {
        let found = self.store.find_by_email(&email.to_lowercase()).await?;
        let Some(user) = found else {
            metrics::counter!("auth.login_rejected").increment(1);
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, &user.password_hash, &user.password_salt) {
            tracing::warn!(user_id = %user.id, "login rejected: bad password");
            metrics::counter!("auth.login_rejected").increment(1);
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.signer.issue(&user, self.clock.now())?;
        tracing::info!(user_id = %user.id, "login succeeded");
        metrics::counter!("auth.login_succeeded").increment(1);
        Ok((token, user))
    }

    /// Verify a bearer token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] for bad or expired tokens.
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.signer.verify(token)
    }

    /// Fetch a user by id.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotFound`] if no such user exists, or
    /// [`AuthError::Store`] on storage failure.
    pub async fn get_user(&self, id: UserId) -> Result<User, AuthError> {
        self.store
            .get(id)
            .await?
            .ok_or(AuthError::NotFound(id))
    }

    /// List users by creation time, 1-based `page`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Store`] on storage failure.
    pub async fn list_users(&self, page: u32, page_size: u32) -> Result<Vec<User>, AuthError> {
        Ok(self.store.list(page, page_size).await?)
    }

    /// Delete a user.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotFound`] if no such user exists, or
    /// [`AuthError::Store`] on storage failure.
    pub async fn delete_user(&self, id: UserId) -> Result<(), AuthError> {
        if self.store.delete(id).await? {
            tracing::info!(user_id = %id, "user deleted");
            Ok(())
        } else {
            Err(AuthError::NotFound(id))
        }
    }

    /// Ensure an admin account exists. Safe to call on every startup; an
    /// already-registered email is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] on validation or storage failure.
    pub async fn seed_admin(&self, email: &str, password: &str) -> Result<(), AuthError> {
        match self.register(email, password, Role::Admin).await {
            Ok(_) => Ok(()),
            Err(AuthError::EmailTaken) => {
                tracing::debug!("admin account already present");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
