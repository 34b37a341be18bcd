//! Error types for the HTTP layer.
//!
//! ID generation cannot fail once the generator exists. Requests fail on
//! malformed inputs, or if the blocking task running the generator is lost.
//! `ServiceError` converts into an axum response carrying the matching status
//! code and a JSON body.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

pub type Result<T> = core::result::Result<T, ServiceError>;

/// Unified error type for request handling.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum ServiceError {
    /// The client request was invalid or exceeded constraints.
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// The blocking task that runs the generator panicked or was cancelled.
    #[error("Generation task failed: {context}")]
    GenerationTask { context: String },
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            Self::GenerationTask { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<tokio::task::JoinError> for ServiceError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::GenerationTask {
            context: err.to_string(),
        }
    }
}
