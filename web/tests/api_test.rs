//! End-to-end HTTP tests over in-memory stores.
//!
//! Exercises the status mapping: every rejection kind must answer with its
//! documented code, auth-gated routes must refuse bad tokens, and garbage
//! ids must come back 422 rather than 404 or 500.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use axum_test::TestServer;
use chrono::Duration;
use http::StatusCode;
use serde_json::{Value, json};
use std::sync::Arc;
use surge_auth::mocks::MemoryUserStore;
use surge_auth::{AuthService, TokenSigner};
use surge_core::ClockOffset;
use surge_core::store::{ProductCatalog, SaleWindowStore};
use surge_core::types::{Product, SaleWindow};
use surge_testing::fixtures;
use surge_testing::mocks::{FixedClock, MemoryStores};
use surge_web::{AppState, router};

struct Harness {
    server: TestServer,
    stores: MemoryStores,
    clock: Arc<FixedClock>,
    auth: AuthService,
}

impl Harness {
    /// Clock starts mid-window: [`fixtures::t0`] plus 30 minutes.
    fn new() -> Self {
        let stores = MemoryStores::new();
        let users = Arc::new(MemoryUserStore::new());
        let clock = Arc::new(FixedClock::new(fixtures::t0() + Duration::minutes(30)));

        let engine = Arc::new(stores.engine(clock.clone(), ClockOffset::ZERO));
        let auth = AuthService::new(
            users,
            TokenSigner::new(b"test-secret"),
            clock.clone(),
        );
        let state = AppState::new(
            engine,
            auth.clone(),
            stores.ledger.clone(),
            stores.catalog.clone(),
        );
        let server = TestServer::new(router(state)).expect("router should build");

        Self {
            server,
            stores,
            clock,
            auth,
        }
    }

    async fn seed_sale(&self, allocated: u32) -> (Product, SaleWindow) {
        let product = fixtures::product();
        self.stores
            .catalog
            .insert(product.clone())
            .await
            .expect("seed product");
        let window = fixtures::one_hour_window(&product, allocated);
        self.stores
            .windows
            .insert(window.clone())
            .await
            .expect("seed window");
        (product, window)
    }

    async fn buyer_token(&self, email: &str) -> String {
        self.auth
            .register(email, "hunter2hunter2", surge_auth::Role::User)
            .await
            .expect("register buyer");
        let (token, _user) = self
            .auth
            .login(email, "hunter2hunter2")
            .await
            .expect("login buyer");
        token
    }

    async fn admin_token(&self) -> String {
        self.auth
            .seed_admin("admin@example.com", "admin-password")
            .await
            .expect("seed admin");
        let (token, _user) = self
            .auth
            .login("admin@example.com", "admin-password")
            .await
            .expect("login admin");
        token
    }
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

#[tokio::test]
async fn health_answers_ok() {
    let h = Harness::new();
    let response = h.server.get("/health").await;
    response.assert_status(StatusCode::OK);
}

#[tokio::test]
async fn register_login_and_fetch_profile() {
    let h = Harness::new();

    let created = h
        .server
        .post("/api/users/register")
        .json(&json!({ "email": "buyer@example.com", "password": "hunter2hunter2" }))
        .await;
    created.assert_status(StatusCode::CREATED);
    let profile: Value = created.json();
    assert_eq!(profile["email"], "buyer@example.com");
    assert!(
        profile.get("password_hash").is_none(),
        "Profiles never expose credential material"
    );

    let login = h
        .server
        .post("/api/users/login")
        .json(&json!({ "email": "buyer@example.com", "password": "hunter2hunter2" }))
        .await;
    login.assert_status(StatusCode::OK);
    let body: Value = login.json();
    let token = body["token"].as_str().expect("token in login body");

    let user_id = profile["id"].as_str().expect("id in profile");
    let fetched = h
        .server
        .get(&format!("/api/users/{user_id}"))
        .add_header("authorization", bearer(token))
        .await;
    fetched.assert_status(StatusCode::OK);
}

#[tokio::test]
async fn registration_validation_statuses() {
    let h = Harness::new();

    let bad_email = h
        .server
        .post("/api/users/register")
        .json(&json!({ "email": "not-an-email", "password": "hunter2hunter2" }))
        .await;
    bad_email.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let weak = h
        .server
        .post("/api/users/register")
        .json(&json!({ "email": "buyer@example.com", "password": "short" }))
        .await;
    weak.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    h.server
        .post("/api/users/register")
        .json(&json!({ "email": "buyer@example.com", "password": "hunter2hunter2" }))
        .await
        .assert_status(StatusCode::CREATED);
    let duplicate = h
        .server
        .post("/api/users/register")
        .json(&json!({ "email": "buyer@example.com", "password": "hunter2hunter2" }))
        .await;
    duplicate.assert_status(StatusCode::CONFLICT);

    let bad_login = h
        .server
        .post("/api/users/login")
        .json(&json!({ "email": "buyer@example.com", "password": "wrong-password" }))
        .await;
    bad_login.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn purchase_path_statuses() {
    let h = Harness::new();
    let (_product, window) = h.seed_sale(3).await;
    let token = h.buyer_token("buyer@example.com").await;

    let granted = h
        .server
        .post("/api/purchases")
        .add_header("authorization", bearer(&token))
        .json(&json!({ "sale_window_id": window.id, "quantity": 2 }))
        .await;
    granted.assert_status(StatusCode::CREATED);
    let purchase: Value = granted.json();
    assert_eq!(purchase["quantity"], 2);

    // One purchase per user per window.
    let duplicate = h
        .server
        .post("/api/purchases")
        .add_header("authorization", bearer(&token))
        .json(&json!({ "sale_window_id": window.id, "quantity": 1 }))
        .await;
    duplicate.assert_status(StatusCode::CONFLICT);

    // Fresh buyers for the remaining cases.
    let second = h.buyer_token("second@example.com").await;

    let oversized = h
        .server
        .post("/api/purchases")
        .add_header("authorization", bearer(&second))
        .json(&json!({ "sale_window_id": window.id, "quantity": 6 }))
        .await;
    oversized.assert_status(StatusCode::CONFLICT);

    let zero = h
        .server
        .post("/api/purchases")
        .add_header("authorization", bearer(&second))
        .json(&json!({ "sale_window_id": window.id, "quantity": 0 }))
        .await;
    zero.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let unknown = h
        .server
        .post("/api/purchases")
        .add_header("authorization", bearer(&second))
        .json(&json!({ "sale_window_id": uuid::Uuid::new_v4(), "quantity": 1 }))
        .await;
    unknown.assert_status(StatusCode::NOT_FOUND);

    // More than remains (1 left after the first grant of 2).
    let starved = h
        .server
        .post("/api/purchases")
        .add_header("authorization", bearer(&second))
        .json(&json!({ "sale_window_id": window.id, "quantity": 3 }))
        .await;
    starved.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn time_gates_answer_forbidden() {
    let h = Harness::new();
    let (_product, window) = h.seed_sale(5).await;
    let token = h.buyer_token("early@example.com").await;

    // Before the window opens.
    h.clock.set(fixtures::t0() - Duration::minutes(5));
    let early = h
        .server
        .post("/api/purchases")
        .add_header("authorization", bearer(&token))
        .json(&json!({ "sale_window_id": window.id, "quantity": 1 }))
        .await;
    early.assert_status(StatusCode::FORBIDDEN);

    // After it closes.
    h.clock.set(fixtures::t0() + Duration::hours(2));
    let late = h
        .server
        .post("/api/purchases")
        .add_header("authorization", bearer(&token))
        .json(&json!({ "sale_window_id": window.id, "quantity": 1 }))
        .await;
    late.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn auth_gates_reject_bad_tokens() {
    let h = Harness::new();
    let (_product, window) = h.seed_sale(5).await;

    let missing = h
        .server
        .post("/api/purchases")
        .json(&json!({ "sale_window_id": window.id, "quantity": 1 }))
        .await;
    missing.assert_status(StatusCode::UNAUTHORIZED);

    let garbage = h
        .server
        .post("/api/purchases")
        .add_header("authorization", "Bearer not.a.token")
        .json(&json!({ "sale_window_id": window.id, "quantity": 1 }))
        .await;
    garbage.assert_status(StatusCode::UNAUTHORIZED);

    // Admin routes refuse regular users.
    let buyer = h.buyer_token("buyer@example.com").await;
    let forbidden = h
        .server
        .get("/api/users")
        .add_header("authorization", bearer(&buyer))
        .await;
    forbidden.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn garbage_ids_answer_invalid_reference() {
    let h = Harness::new();
    let token = h.buyer_token("buyer@example.com").await;

    let response = h
        .server
        .get("/api/users/not-a-uuid")
        .add_header("authorization", bearer(&token))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_REFERENCE");

    let product = h.server.get("/api/products/not-a-uuid").await;
    product.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn admin_sale_window_lifecycle() {
    let h = Harness::new();
    let admin = h.admin_token().await;

    let product = fixtures::product();
    h.stores
        .catalog
        .insert(product.clone())
        .await
        .expect("seed product");

    let start = fixtures::t0() + Duration::hours(2);
    let end = fixtures::t0() + Duration::hours(3);
    let created = h
        .server
        .post("/api/sale-windows")
        .add_header("authorization", bearer(&admin))
        .json(&json!({
            "product_id": product.id,
            "allocated_units": 10,
            "sale_start": start,
            "sale_end": end,
        }))
        .await;
    created.assert_status(StatusCode::CREATED);
    let body: Value = created.json();
    assert_eq!(body["state"], "scheduled");
    let window_id = body["id"].as_str().expect("window id").to_string();

    // A touching window for the same product conflicts.
    let touching = h
        .server
        .post("/api/sale-windows")
        .add_header("authorization", bearer(&admin))
        .json(&json!({
            "product_id": product.id,
            "allocated_units": 5,
            "sale_start": end,
            "sale_end": end + Duration::hours(1),
        }))
        .await;
    touching.assert_status(StatusCode::CONFLICT);

    // Inverted schedule patch is a validation error.
    let inverted = h
        .server
        .put(&format!("/api/sale-windows/{window_id}"))
        .add_header("authorization", bearer(&admin))
        .json(&json!({ "sale_end": start - Duration::hours(1) }))
        .await;
    inverted.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let moved = h
        .server
        .put(&format!("/api/sale-windows/{window_id}"))
        .add_header("authorization", bearer(&admin))
        .json(&json!({ "sale_end": end + Duration::hours(1) }))
        .await;
    moved.assert_status(StatusCode::OK);

    // Mutations without the admin role are forbidden.
    let buyer = h.buyer_token("buyer@example.com").await;
    let refused = h
        .server
        .delete(&format!("/api/sale-windows/{window_id}"))
        .add_header("authorization", bearer(&buyer))
        .await;
    refused.assert_status(StatusCode::FORBIDDEN);

    h.server
        .delete(&format!("/api/sale-windows/{window_id}"))
        .add_header("authorization", bearer(&admin))
        .await
        .assert_status(StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn active_listing_reports_sold_out_windows() {
    let h = Harness::new();
    let (_product, window) = h.seed_sale(1).await;
    let token = h.buyer_token("buyer@example.com").await;

    h.server
        .post("/api/purchases")
        .add_header("authorization", bearer(&token))
        .json(&json!({ "sale_window_id": window.id, "quantity": 1 }))
        .await
        .assert_status(StatusCode::CREATED);

    let listed = h.server.get("/api/sale-windows/active").await;
    listed.assert_status(StatusCode::OK);
    let body: Value = listed.json();
    let windows = body.as_array().expect("array body");
    assert_eq!(windows.len(), 1, "Sold-out windows still appear");
    assert_eq!(windows[0]["state"], "sold_out");
    assert_eq!(windows[0]["remaining_units"], 0);
}

#[tokio::test]
async fn leaderboard_is_public_and_ordered() {
    let h = Harness::new();
    let (_product, window) = h.seed_sale(10).await;

    for (minutes, email) in [(10, "a@example.com"), (20, "b@example.com")] {
        // Distinct purchase times so the ordering is deterministic.
        h.clock.set(fixtures::t0() + Duration::minutes(minutes));
        let token = h.buyer_token(email).await;
        h.server
            .post("/api/purchases")
            .add_header("authorization", bearer(&token))
            .json(&json!({ "sale_window_id": window.id, "quantity": 1 }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let board = h.server.get("/api/purchases/leaderboard").await;
    board.assert_status(StatusCode::OK);
    let body: Value = board.json();
    let entries = body.as_array().expect("array body");
    assert_eq!(entries.len(), 2);
    let first = entries[0]["purchase_time"].as_str().expect("time");
    let second = entries[1]["purchase_time"].as_str().expect("time");
    assert!(first < second, "Earliest purchase leads the board");
}
