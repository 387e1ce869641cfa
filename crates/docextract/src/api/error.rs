//! API error handling.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::error::DocextractError;
use crate::failure::{Failure, FailureKind};

use super::types::ErrorResponse;

/// Error returned by API handlers.
///
/// Converts into a JSON [`ErrorResponse`] with the status code of the
/// underlying failure kind.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    fn from_kind(kind: FailureKind, source: Option<String>, message: String) -> Self {
        let status = StatusCode::from_u16(kind.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self {
            status,
            body: ErrorResponse {
                error_type: kind.to_string(),
                message,
                source,
                status_code: status.as_u16(),
            },
        }
    }

    /// 404 for requests that don't address an extraction operation.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::from_kind(FailureKind::NotFound, None, message.into())
    }

    /// 500 for service-level errors.
    pub fn internal(error: DocextractError) -> Self {
        Self::from_kind(FailureKind::InternalFault, None, error.to_string())
    }
}

impl From<Failure> for ApiError {
    fn from(failure: Failure) -> Self {
        Self::from_kind(failure.kind, Some(failure.source_id), failure.message)
    }
}

impl From<DocextractError> for ApiError {
    fn from(error: DocextractError) -> Self {
        match error {
            DocextractError::Validation { message, .. } => Self::not_found(message),
            other => Self::internal(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
