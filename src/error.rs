//! Diagnostic-controller error types

use crate::source::SourceError;
use crate::state::{StateStoreError, StoredFailure};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Identifying message for a lost exception reference.
///
/// Upstream error pages match on this to show "your session expired"
/// instead of a generic failure.
pub const NOSTATE: &str = "NOSTATE";

/// Result type for diagnostic operations
pub type DiagResult<T> = Result<T, DiagError>;

/// Diagnostic-controller errors
#[derive(Debug, Error)]
pub enum DiagError {
    /// The supplied exception reference does not resolve in the store
    #[error("{}", NOSTATE)]
    MissingState,

    /// A failure captured before the identity-provider hand-off, re-raised
    /// verbatim on return
    #[error(transparent)]
    Recovered(#[from] StoredFailure),

    /// Unknown or unregistered authentication source
    #[error("Unknown authentication source: {0}")]
    UnknownSource(String),

    /// Authentication source failure
    #[error("Authentication source error: {0}")]
    Source(#[from] SourceError),

    /// Exception-state store failure
    #[error("State store error: {0}")]
    State(#[from] StateStoreError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for DiagError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            DiagError::MissingState => (StatusCode::BAD_REQUEST, "state_lost"),
            DiagError::Recovered(_) => (StatusCode::BAD_GATEWAY, "login_failed"),
            DiagError::UnknownSource(_) => (StatusCode::NOT_FOUND, "unknown_source"),
            DiagError::Source(_) => (StatusCode::INTERNAL_SERVER_ERROR, "source_error"),
            DiagError::State(_) => (StatusCode::INTERNAL_SERVER_ERROR, "state_store_error"),
            DiagError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let message = match &self {
            DiagError::Source(e) => {
                tracing::error!(error = %e, "Authentication source failure");
                "An authentication source error occurred".to_string()
            }
            DiagError::State(e) => {
                tracing::error!(error = %e, "Exception-state store failure");
                "A state storage error occurred".to_string()
            }
            DiagError::Internal(msg) => {
                tracing::error!("Diagnostic internal error: {}", msg);
                "An internal error occurred".to_string()
            }
            // Safe user-facing messages
            DiagError::MissingState | DiagError::Recovered(_) | DiagError::UnknownSource(_) => {
                self.to_string()
            }
        };

        let body = ErrorResponse {
            error: error_code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}
