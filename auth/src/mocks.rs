//! In-memory user store for tests.

use crate::error::RegistryError;
use crate::store::UserStore;
use crate::user::User;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use surge_core::error::StoreError;
use surge_core::types::UserId;

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// [`UserStore`] over a mutex-guarded map.
///
/// Email uniqueness is checked inside the lock, matching the atomicity the
/// real store gets from its unique constraint.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<UserId, User>>,
}

impl MemoryUserStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    ///
    /// # Panics
    ///
    /// Does not panic; a poisoned lock is recovered.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.users).len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl UserStore for MemoryUserStore {
    fn insert(
        &self,
        user: User,
    ) -> Pin<Box<dyn Future<Output = Result<(), RegistryError>> + Send + '_>> {
        Box::pin(async move {
            let mut users = lock(&self.users);
            if users.values().any(|u| u.email == user.email) {
                return Err(RegistryError::EmailTaken);
            }
            users.insert(user.id, user);
            Ok(())
        })
    }

    fn get(
        &self,
        id: UserId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<User>, StoreError>> + Send + '_>> {
        Box::pin(async move { Ok(lock(&self.users).get(&id).cloned()) })
    }

    fn find_by_email(
        &self,
        email: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<User>, StoreError>> + Send + '_>> {
        let email = email.to_string();
        Box::pin(async move {
            Ok(lock(&self.users)
                .values()
                .find(|u| u.email == email)
                .cloned())
        })
    }

    fn list(
        &self,
        page: u32,
        page_size: u32,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<User>, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let mut users: Vec<User> = lock(&self.users).values().cloned().collect();
            users.sort_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()))
            });
            let start = (page.max(1) - 1) as usize * page_size as usize;
            Ok(users
                .into_iter()
                .skip(start)
                .take(page_size as usize)
                .collect())
        })
    }

    fn delete(
        &self,
        id: UserId,
    ) -> Pin<Box<dyn Future<Output = Result<bool, StoreError>> + Send + '_>> {
        Box::pin(async move { Ok(lock(&self.users).remove(&id).is_some()) })
    }
}
