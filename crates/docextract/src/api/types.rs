//! API request and response types.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::orchestrator::Orchestrator;

/// API server size limit configuration.
///
/// # Default Values
///
/// - `max_request_body_bytes`: 100 MB (104,857,600 bytes)
///
/// # Configuration via Environment Variables
///
/// ```bash
/// export DOCEXTRACT_MAX_REQUEST_BODY_BYTES=104857600  # 100 MB
/// ```
///
/// # Examples
///
/// ```
/// use docextract::api::ApiSizeLimits;
///
/// let limits = ApiSizeLimits::default();
/// assert_eq!(limits.max_request_body_bytes, 100 * 1024 * 1024);
///
/// let limits = ApiSizeLimits::from_mb(50);
/// assert_eq!(limits.max_request_body_bytes, 50 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ApiSizeLimits {
    /// Maximum size of an uploaded document in bytes.
    ///
    /// Larger bodies are rejected with HTTP 413 before extraction starts.
    pub max_request_body_bytes: usize,
}

impl Default for ApiSizeLimits {
    fn default() -> Self {
        Self {
            max_request_body_bytes: 100 * 1024 * 1024,
        }
    }
}

impl ApiSizeLimits {
    pub fn new(max_request_body_bytes: usize) -> Self {
        Self { max_request_body_bytes }
    }

    pub fn from_mb(max_request_body_mb: usize) -> Self {
        Self {
            max_request_body_bytes: max_request_body_mb * 1024 * 1024,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Health status
    pub status: String,
    /// API version
    pub version: String,
}

/// Server information response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfoResponse {
    /// API version
    pub version: String,
    /// Name of the parsing engine behind the server
    pub parser: String,
    /// Supported operation selectors
    pub operations: Vec<String>,
}

/// Error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Failure kind name
    pub error_type: String,
    /// Error message
    pub message: String,
    /// Source the failure refers to, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// HTTP status code
    pub status_code: u16,
}

/// API server state.
#[derive(Debug, Clone)]
pub struct ApiState {
    pub orchestrator: Arc<Orchestrator>,
}
