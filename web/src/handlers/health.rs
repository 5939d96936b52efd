//! Health check endpoint.
//!
//! Used by load balancers and monitoring to verify the service is up. Does
//! not check dependencies.

use axum::{Json, http::StatusCode};
use serde_json::{Value, json};

/// Simple liveness check.
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}
