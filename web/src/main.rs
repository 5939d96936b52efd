//! Surge HTTP server.
//!
//! Flash-sale backend: race-free inventory decrements over `PostgreSQL`,
//! JWT-authenticated buyers, admin-gated scheduling.

use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use surge_auth::{AuthService, PgUserStore, TokenSigner};
use surge_core::{ClockOffset, PurchaseEngine, SystemClock};
use surge_postgres::{PgProductCatalog, PgPurchaseLedger, PgSaleWindowStore};
use surge_web::{AppState, Config, router};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "surge=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Surge HTTP server");

    let config = Config::from_env();
    info!(
        database_url = %config.database_url,
        clock_offset_minutes = config.clock_offset_minutes,
        "Configuration loaded"
    );

    // Database
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;
    surge_postgres::migrate(&pool).await?;
    info!("Database connected and migrated");

    // Stores
    let windows = Arc::new(PgSaleWindowStore::new(pool.clone()));
    let ledger = Arc::new(PgPurchaseLedger::new(pool.clone()));
    let catalog = Arc::new(PgProductCatalog::new(pool.clone()));
    let users = Arc::new(PgUserStore::new(pool));

    // Services
    let clock = Arc::new(SystemClock);
    let engine = Arc::new(PurchaseEngine::new(
        windows,
        ledger.clone(),
        catalog.clone(),
        clock.clone(),
        ClockOffset::from_minutes(config.clock_offset_minutes),
    ));
    let auth = AuthService::new(users, TokenSigner::new(config.jwt_secret.as_bytes()), clock);

    if let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) {
        auth.seed_admin(email, password).await?;
        info!("Admin account ensured");
    } else {
        warn!("No admin credentials configured; admin endpoints are unreachable");
    }

    let app = router(AppState::new(engine, auth, ledger, catalog));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Graceful shutdown signal handler.
///
/// Waits for Ctrl+C (SIGINT) or SIGTERM.
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully");
        },
        () = terminate => {
            info!("Received SIGTERM, shutting down gracefully");
        },
    }
}
