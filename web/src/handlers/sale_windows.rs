//! Sale window scheduling and listing.
//!
//! Responses carry the derived [`SaleState`] alongside the stored fields,
//! evaluated at the engine's offset-adjusted now. Stock numbers are the
//! stored truth; state is never persisted.

use crate::error::{AppError, parse_uuid};
use crate::extractors::AdminUser;
use crate::handlers::Pagination;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surge_core::types::{SaleState, SaleWindow, SaleWindowId, SchedulePatch};
use uuid::Uuid;

const DEFAULT_PAGE_SIZE: u32 = 10;

/// Body for `POST /api/sale-windows`.
#[derive(Debug, Deserialize)]
pub struct CreateSaleWindow {
    /// Product on sale.
    pub product_id: Uuid,
    /// Total units for the window.
    pub allocated_units: u32,
    /// Schedule start.
    pub sale_start: DateTime<Utc>,
    /// Schedule end.
    pub sale_end: DateTime<Utc>,
}

/// Body for `PUT /api/sale-windows/:id`. Only the schedule is editable;
/// allocation and remaining stock never change through this endpoint.
#[derive(Debug, Deserialize)]
pub struct UpdateSaleWindow {
    /// New start, if changing.
    pub sale_start: Option<DateTime<Utc>>,
    /// New end, if changing.
    pub sale_end: Option<DateTime<Utc>>,
}

/// A sale window with its derived state.
#[derive(Debug, Serialize)]
pub struct SaleWindowView {
    /// The stored window.
    #[serde(flatten)]
    pub window: SaleWindow,
    /// Derived state at the evaluation instant.
    pub state: SaleState,
}

fn view(state: &AppState, window: SaleWindow) -> SaleWindowView {
    let now = state.engine.adjusted_now();
    SaleWindowView {
        state: window.state(now),
        window,
    }
}

/// `POST /api/sale-windows` (admin)
///
/// # Errors
///
/// 401/403 without an admin token, 422 on a bad schedule, allocation, or
/// unknown product, 409 on an overlapping window for the same product.
pub async fn create_sale_window(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(body): Json<CreateSaleWindow>,
) -> Result<(StatusCode, Json<SaleWindowView>), AppError> {
    let window = state
        .engine
        .create_sale_window(
            surge_core::types::ProductId::from_uuid(body.product_id),
            body.allocated_units,
            body.sale_start,
            body.sale_end,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(view(&state, window))))
}

/// `GET /api/sale-windows/active`
///
/// Windows currently inside their schedule, sold-out ones included.
///
/// # Errors
///
/// 500 on storage failure.
pub async fn list_active(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Vec<SaleWindowView>>, AppError> {
    let (page, page_size) = pagination.resolve(DEFAULT_PAGE_SIZE);
    let windows = state.engine.list_active_sale_windows(page, page_size).await?;
    Ok(Json(
        windows.into_iter().map(|w| view(&state, w)).collect(),
    ))
}

/// `GET /api/sale-windows/:id`
///
/// # Errors
///
/// 422 on a garbage id, 404 if unknown.
pub async fn get_sale_window(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SaleWindowView>, AppError> {
    let id = SaleWindowId::from_uuid(parse_uuid(&id)?);
    let window = state.engine.get_sale_window(id).await?;
    Ok(Json(view(&state, window)))
}

/// `PUT /api/sale-windows/:id` (admin)
///
/// # Errors
///
/// 401/403 without an admin token, 422 on a garbage id or an inverted
/// schedule, 404 if unknown.
pub async fn update_sale_window(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Json(body): Json<UpdateSaleWindow>,
) -> Result<Json<SaleWindowView>, AppError> {
    let id = SaleWindowId::from_uuid(parse_uuid(&id)?);
    let patch = SchedulePatch {
        sale_start: body.sale_start,
        sale_end: body.sale_end,
    };
    let window = state.engine.update_sale_window(id, patch).await?;
    Ok(Json(view(&state, window)))
}

/// `DELETE /api/sale-windows/:id` (admin)
///
/// # Errors
///
/// 401/403 without an admin token, 422 on a garbage id, 404 if unknown.
pub async fn delete_sale_window(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = SaleWindowId::from_uuid(parse_uuid(&id)?);
    state.engine.delete_sale_window(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
