//! User registry backed by `PostgreSQL`.

use crate::error::RegistryError;
use crate::store::UserStore;
use crate::user::{Role, User};
use sqlx::{PgPool, Row, postgres::PgRow};
use std::future::Future;
use std::pin::Pin;
use surge_core::error::StoreError;
use surge_core::types::UserId;

/// Postgres error code for unique constraint violations.
const UNIQUE_VIOLATION: &str = "23505";

/// `PostgreSQL`-backed [`UserStore`].
///
/// Email uniqueness rides on the `users.email` unique constraint, so a
/// racing registration fails on the insert itself.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Create a store over the given connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str =
    "id, email, password_hash, password_salt, role, created_at, updated_at";

fn row_to_user(row: &PgRow) -> Result<User, StoreError> {
    let role_text: String = row.get("role");
    let role = Role::parse(&role_text)
        .ok_or_else(|| StoreError::Database(format!("unknown role: {role_text}")))?;
    Ok(User {
        id: UserId::from_uuid(row.get("id")),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        password_salt: row.get("password_salt"),
        role,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn db_err(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

fn insert_err(e: sqlx::Error) -> RegistryError {
    match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            RegistryError::EmailTaken
        }
        _ => RegistryError::Store(db_err(e)),
    }
}

impl UserStore for PgUserStore {
    fn insert(
        &self,
        user: User,
    ) -> Pin<Box<dyn Future<Output = Result<(), RegistryError>> + Send + '_>> {
        Box::pin(async move {
            sqlx::query(
                r"
                INSERT INTO users (id, email, password_hash, password_salt, role, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ",
            )
            .bind(user.id.as_uuid())
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.password_salt)
            .bind(user.role.as_str())
            .bind(user.created_at)
            .bind(user.updated_at)
            .execute(&self.pool)
            .await
            .map_err(insert_err)?;
            Ok(())
        })
    }

    fn get(
        &self,
        id: UserId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<User>, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;
            row.as_ref().map(row_to_user).transpose()
        })
    }

    fn find_by_email(
        &self,
        email: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<User>, StoreError>> + Send + '_>> {
        let email = email.to_string();
        Box::pin(async move {
            let row = sqlx::query(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
            ))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
            row.as_ref().map(row_to_user).transpose()
        })
    }

    fn list(
        &self,
        page: u32,
        page_size: u32,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<User>, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let offset = i64::from(page.max(1) - 1) * i64::from(page_size);
            let rows = sqlx::query(&format!(
                r"
                SELECT {USER_COLUMNS} FROM users
                ORDER BY created_at ASC, id ASC
                LIMIT $1 OFFSET $2
                ",
            ))
            .bind(i64::from(page_size))
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
            rows.iter().map(row_to_user).collect()
        })
    }

    fn delete(
        &self,
        id: UserId,
    ) -> Pin<Box<dyn Future<Output = Result<bool, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM users WHERE id = $1")
                .bind(id.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(db_err)?;
            Ok(result.rows_affected() > 0)
        })
    }
}
