//! Product catalog CRUD. Reads are public; mutations are admin-gated.

use crate::error::{AppError, parse_uuid};
use crate::extractors::AdminUser;
use crate::handlers::Pagination;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::Deserialize;
use surge_core::types::{PriceCents, Product, ProductId, ProductPatch};

const DEFAULT_PAGE_SIZE: u32 = 20;

/// Body for `POST /api/products`.
#[derive(Debug, Deserialize)]
pub struct CreateProduct {
    /// Display name.
    pub name: String,
    /// Description shown on listings.
    pub description: String,
    /// Unit price in cents.
    pub price_cents: u64,
}

/// Body for `PUT /api/products/:id`. Absent fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateProduct {
    /// New name, if changing.
    pub name: Option<String>,
    /// New description, if changing.
    pub description: Option<String>,
    /// New unit price in cents, if changing.
    pub price_cents: Option<u64>,
}

/// `POST /api/products` (admin)
///
/// # Errors
///
/// 401/403 without an admin token, 422 on an empty name.
pub async fn create_product(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(body): Json<CreateProduct>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    if body.name.trim().is_empty() {
        return Err(AppError::validation("product name must not be empty"));
    }
    let now = Utc::now();
    let product = Product {
        id: ProductId::new(),
        name: body.name,
        description: body.description,
        price: PriceCents::from_cents(body.price_cents),
        created_at: now,
        updated_at: now,
    };
    state.catalog.insert(product.clone()).await?;
    tracing::info!(product_id = %product.id, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// `GET /api/products/:id`
///
/// # Errors
///
/// 422 on a garbage id, 404 if unknown.
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, AppError> {
    let id = ProductId::from_uuid(parse_uuid(&id)?);
    state
        .catalog
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Product", id))
}

/// `GET /api/products`
///
/// # Errors
///
/// 500 on storage failure.
pub async fn list_products(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Vec<Product>>, AppError> {
    let (page, page_size) = pagination.resolve(DEFAULT_PAGE_SIZE);
    Ok(Json(state.catalog.list(page, page_size).await?))
}

/// `PUT /api/products/:id` (admin)
///
/// # Errors
///
/// 401/403 without an admin token, 422 on a garbage id, 404 if unknown.
pub async fn update_product(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Json(body): Json<UpdateProduct>,
) -> Result<Json<Product>, AppError> {
    let id = ProductId::from_uuid(parse_uuid(&id)?);
    let patch = ProductPatch {
        name: body.name,
        description: body.description,
        price: body.price_cents.map(PriceCents::from_cents),
    };
    state
        .catalog
        .update(id, patch, Utc::now())
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Product", id))
}

/// `DELETE /api/products/:id` (admin)
///
/// # Errors
///
/// 401/403 without an admin token, 422 on a garbage id, 404 if unknown.
pub async fn delete_product(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = ProductId::from_uuid(parse_uuid(&id)?);
    if state.catalog.delete(id).await? {
        tracing::info!(product_id = %id, "Product deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Product", id))
    }
}
