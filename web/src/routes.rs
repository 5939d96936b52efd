//! Route table.

use crate::handlers::{health, products, purchases, sale_windows, users};
use crate::state::AppState;
use axum::{
    Router,
    routing::{delete, get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the full application router.
#[must_use]
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/users/register", post(users::register))
        .route("/users/login", post(users::login))
        .route("/users", get(users::list_users))
        .route("/users/:id", get(users::get_user))
        .route("/users/:id", delete(users::delete_user))
        .route("/products", post(products::create_product))
        .route("/products", get(products::list_products))
        .route("/products/:id", get(products::get_product))
        .route("/products/:id", put(products::update_product))
        .route("/products/:id", delete(products::delete_product))
        .route("/sale-windows", post(sale_windows::create_sale_window))
        .route("/sale-windows/active", get(sale_windows::list_active))
        .route("/sale-windows/:id", get(sale_windows::get_sale_window))
        .route("/sale-windows/:id", put(sale_windows::update_sale_window))
        .route("/sale-windows/:id", delete(sale_windows::delete_sale_window))
        .route("/purchases", post(purchases::create_purchase))
        .route("/purchases", get(purchases::list_purchases))
        .route("/purchases/leaderboard", get(purchases::leaderboard))
        .route("/purchases/:id", get(purchases::get_purchase))
        .route("/purchases/:id", delete(purchases::delete_purchase));

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
