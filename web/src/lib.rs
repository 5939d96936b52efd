//! # Surge Web
//!
//! Axum HTTP surface for the flash-sale backend.
//!
//! Handlers stay thin: they parse input, call the engine or a collaborator
//! service, and map domain errors onto HTTP statuses through [`AppError`].
//! All business decisions live below this crate.

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::Config;
pub use error::AppError;
pub use routes::router;
pub use state::AppState;
