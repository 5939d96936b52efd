//! Storage trait for the user registry.

use crate::error::RegistryError;
use crate::user::User;
use std::future::Future;
use std::pin::Pin;
use surge_core::error::StoreError;
use surge_core::types::UserId;

/// Persistence for user records.
///
/// Email uniqueness belongs to the store: `insert` must fail with
/// [`RegistryError::EmailTaken`] when the email is already held, even when
/// two registrations race.
pub trait UserStore: Send + Sync {
    /// Persist a new user.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::EmailTaken`] if the email is already
    /// registered, or [`RegistryError::Store`] if the insert fails.
    fn insert(
        &self,
        user: User,
    ) -> Pin<Box<dyn Future<Output = Result<(), RegistryError>> + Send + '_>>;

    /// Point lookup by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    fn get(
        &self,
        id: UserId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<User>, StoreError>> + Send + '_>>;

    /// Lookup by email, for login.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    fn find_by_email(
        &self,
        email: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<User>, StoreError>> + Send + '_>>;

    /// Paginated listing by creation time, 1-based `page`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    fn list(
        &self,
        page: u32,
        page_size: u32,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<User>, StoreError>> + Send + '_>>;

    /// Delete a user. Returns whether a record existed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the delete fails.
    fn delete(
        &self,
        id: UserId,
    ) -> Pin<Box<dyn Future<Output = Result<bool, StoreError>> + Send + '_>>;
}
