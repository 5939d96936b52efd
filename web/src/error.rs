//! Error types for web handlers.
//!
//! [`AppError`] bridges domain errors and HTTP responses. Business
//! rejections carry their own message verbatim; infrastructure failures
//! are logged and answered with an opaque body.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;
use surge_auth::AuthError;
use surge_core::error::{PurchaseError, SaleWindowError, StoreError};
use uuid::Uuid;

/// Application error type for web handlers.
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: String,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: String) -> Self {
        Self {
            status,
            message,
            code,
            source: None,
        }
    }

    /// Attach a source error for logging.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// The HTTP status this error answers with.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Create a 401 Unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            message.into(),
            "UNAUTHORIZED".to_string(),
        )
    }

    /// Create a 403 Forbidden error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            message.into(),
            "FORBIDDEN".to_string(),
        )
    }

    /// Create a 404 Not Found error.
    #[must_use]
    pub fn not_found(resource: impl fmt::Display, id: impl fmt::Display) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            format!("{resource} with id {id} not found"),
            "NOT_FOUND".to_string(),
        )
    }

    /// Create a 409 Conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::CONFLICT,
            message.into(),
            "CONFLICT".to_string(),
        )
    }

    /// Create a 422 Unprocessable Entity error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            message.into(),
            "VALIDATION_ERROR".to_string(),
        )
    }

    /// Create a 422 error for an id that is not a valid UUID.
    #[must_use]
    pub fn invalid_reference(raw: &str) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("not a valid identifier: {raw}"),
            "INVALID_REFERENCE".to_string(),
        )
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message.into(),
            "INTERNAL_SERVER_ERROR".to_string(),
        )
    }

    /// Create a 503 Service Unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            message.into(),
            "SERVICE_UNAVAILABLE".to_string(),
        )
    }
}

/// Parse a path segment as a UUID, answering 422 on garbage.
///
/// # Errors
///
/// Returns a 422 `INVALID_REFERENCE` error if `raw` is not a UUID.
pub fn parse_uuid(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::invalid_reference(raw))
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: String,
    /// Human-readable error message.
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    error = %source,
                    "Internal server error"
                );
            } else {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    "Internal server error"
                );
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(_) => {
                Self::internal("An internal error occurred").with_source(err.into())
            }
            StoreError::Unavailable => Self::unavailable("Storage temporarily unavailable"),
        }
    }
}

/// Purchase rejections map by kind: validation to 422, missing window to
/// 404, time gates to 403, contention outcomes to 409. Post-commit faults
/// and store failures stay opaque 5xx.
impl From<PurchaseError> for AppError {
    fn from(err: PurchaseError) -> Self {
        match &err {
            PurchaseError::InvalidQuantity { .. } => Self::validation(err.to_string()),
            PurchaseError::WindowNotFound(id) => Self::not_found("Sale window", id),
            PurchaseError::NotStarted | PurchaseError::Ended => Self::forbidden(err.to_string()),
            PurchaseError::DuplicatePurchase
            | PurchaseError::ExceedsPerTransactionLimit
            | PurchaseError::InsufficientStock
            | PurchaseError::StockExhausted => Self::conflict(err.to_string()),
            PurchaseError::PostCommitFault { .. } => {
                Self::internal("An internal error occurred").with_source(err.into())
            }
            PurchaseError::Store(store) => store.clone().into(),
        }
    }
}

impl From<SaleWindowError> for AppError {
    fn from(err: SaleWindowError) -> Self {
        match &err {
            SaleWindowError::ProductNotFound(_)
            | SaleWindowError::InvalidSchedule
            | SaleWindowError::InvalidAllocation => Self::validation(err.to_string()),
            SaleWindowError::OverlappingWindow => Self::conflict(err.to_string()),
            SaleWindowError::NotFound(id) => Self::not_found("Sale window", id),
            SaleWindowError::Store(store) => store.clone().into(),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match &err {
            AuthError::InvalidCredentials | AuthError::InvalidToken => {
                Self::unauthorized(err.to_string())
            }
            AuthError::EmailTaken => Self::conflict(err.to_string()),
            AuthError::InvalidEmail | AuthError::WeakPassword { .. } => {
                Self::validation(err.to_string())
            }
            AuthError::NotFound(id) => Self::not_found("User", id),
            AuthError::Store(store) => store.clone().into(),
        }
    }
}
