//! User registration, login, and administration.

use crate::error::{AppError, parse_uuid};
use crate::extractors::{AdminUser, AuthUser};
use crate::handlers::Pagination;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use surge_auth::{Role, UserProfile};
use surge_core::types::UserId;

const DEFAULT_PAGE_SIZE: u32 = 20;

/// Body for `POST /api/users/register` and `POST /api/users/login`.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    /// Login email.
    pub email: String,
    /// Plaintext password; hashed before storage.
    pub password: String,
}

/// Response for a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Bearer token for subsequent requests.
    pub token: String,
    /// The logged-in user.
    pub user: UserProfile,
}

/// `POST /api/users/register`
///
/// # Errors
///
/// 422 on validation failure, 409 if the email is taken.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<Credentials>,
) -> Result<(StatusCode, Json<UserProfile>), AppError> {
    let user = state
        .auth
        .register(&body.email, &body.password, Role::User)
        .await?;
    Ok((StatusCode::CREATED, Json(user.profile())))
}

/// `POST /api/users/login`
///
/// # Errors
///
/// 401 on bad credentials.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<Credentials>,
) -> Result<Json<LoginResponse>, AppError> {
    let (token, user) = state.auth.login(&body.email, &body.password).await?;
    Ok(Json(LoginResponse {
        token,
        user: user.profile(),
    }))
}

/// `GET /api/users/:id` (authenticated)
///
/// # Errors
///
/// 401 without a valid token, 422 on a garbage id, 404 if unknown.
pub async fn get_user(
    State(state): State<AppState>,
    _caller: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<UserProfile>, AppError> {
    let id = UserId::from_uuid(parse_uuid(&id)?);
    let user = state.auth.get_user(id).await?;
    Ok(Json(user.profile()))
}

/// `GET /api/users` (admin)
///
/// # Errors
///
/// 401/403 without an admin token.
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Vec<UserProfile>>, AppError> {
    let (page, page_size) = pagination.resolve(DEFAULT_PAGE_SIZE);
    let users = state.auth.list_users(page, page_size).await?;
    Ok(Json(users.iter().map(surge_auth::User::profile).collect()))
}

/// `DELETE /api/users/:id` (admin)
///
/// # Errors
///
/// 401/403 without an admin token, 404 if unknown.
pub async fn delete_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = UserId::from_uuid(parse_uuid(&id)?);
    state.auth.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
