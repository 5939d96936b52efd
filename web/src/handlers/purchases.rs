//! Purchase attempts and ledger reads.

use crate::error::{AppError, parse_uuid};
use crate::extractors::{AdminUser, AuthUser};
use crate::handlers::Pagination;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use surge_core::types::{Purchase, PurchaseId, SaleWindowId};
use uuid::Uuid;

const DEFAULT_PAGE_SIZE: u32 = 20;

/// Body for `POST /api/purchases`. The buyer comes from the bearer token,
/// never from the body.
#[derive(Debug, Deserialize)]
pub struct CreatePurchase {
    /// Window to buy from.
    pub sale_window_id: Uuid,
    /// Units requested, 1 through the per-transaction limit.
    pub quantity: u32,
}

/// `POST /api/purchases` (authenticated)
///
/// The race-free purchase path. Statuses follow the rejection kind: 422
/// for a bad quantity, 404 for an unknown window, 403 outside the
/// schedule, 409 for duplicates and stock misses.
///
/// # Errors
///
/// Any mapped [`surge_core::error::PurchaseError`].
pub async fn create_purchase(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(body): Json<CreatePurchase>,
) -> Result<(StatusCode, Json<Purchase>), AppError> {
    let purchase = state
        .engine
        .purchase(
            claims.sub,
            SaleWindowId::from_uuid(body.sale_window_id),
            body.quantity,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(purchase)))
}

/// `GET /api/purchases` (admin), newest first.
///
/// # Errors
///
/// 401/403 without an admin token.
pub async fn list_purchases(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Vec<Purchase>>, AppError> {
    let (page, page_size) = pagination.resolve(DEFAULT_PAGE_SIZE);
    Ok(Json(state.ledger.list(page, page_size).await?))
}

/// `GET /api/purchases/leaderboard`
///
/// Every purchase in purchase-time order; earliest buyers first.
///
/// # Errors
///
/// 500 on storage failure.
pub async fn leaderboard(
    State(state): State<AppState>,
) -> Result<Json<Vec<Purchase>>, AppError> {
    Ok(Json(state.ledger.leaderboard().await?))
}

/// `GET /api/purchases/:id` (authenticated)
///
/// # Errors
///
/// 401 without a valid token, 422 on a garbage id, 404 if unknown.
pub async fn get_purchase(
    State(state): State<AppState>,
    _caller: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Purchase>, AppError> {
    let id = PurchaseId::from_uuid(parse_uuid(&id)?);
    state
        .ledger
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Purchase", id))
}

/// `DELETE /api/purchases/:id` (admin)
///
/// Removes a ledger record. Stock is not restored; returns are an
/// operational concern outside this system.
///
/// # Errors
///
/// 401/403 without an admin token, 422 on a garbage id, 404 if unknown.
pub async fn delete_purchase(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = PurchaseId::from_uuid(parse_uuid(&id)?);
    if state.ledger.delete(id).await? {
        tracing::info!(purchase_id = %id, "Purchase deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Purchase", id))
    }
}
