//! API request handlers.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
};

use crate::core::orchestrator::ExtractionResponse;
use crate::request::{CONTENT_LENGTH_HEADER, ExtractionRequest, FILE_NAME_HEADER, RequestHints};
use crate::types::Operation;

use super::{
    error::ApiError,
    types::{ApiState, HealthResponse, InfoResponse},
};

/// Upload extraction handler.
///
/// PUT /{opkey}
///
/// The request body is the document. Recognized headers:
/// - `Content-Type`: declared type; overrides sniffing unless it is `application/octet-stream`
/// - `File-Name`: reported as `resourceName` and used as a detection hint
/// - `Content-Length`: reported as `Content-Length`
///
/// Size limits are enforced at the router layer; oversized bodies get HTTP 413.
pub async fn put_handler(
    State(state): State<ApiState>,
    Path(opkey): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let operation = parse_operation(&opkey)?;
    let request = ExtractionRequest::upload(operation, body.to_vec(), hints_from_headers(&headers));

    let response = state.orchestrator.respond(request).await?;
    Ok(json_response(response))
}

/// Path-based extraction handler.
///
/// GET /{opkey}/{pathkey}/{*resource}
///
/// `pathkey` selects a configured base location; `resource` (plus the raw
/// query string, if any) is appended to it verbatim.
pub async fn get_handler(
    State(state): State<ApiState>,
    Path((opkey, pathkey, resource)): Path<(String, String, String)>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let operation = parse_operation(&opkey)?;

    let mut resource = resource.strip_prefix('/').unwrap_or(&resource).to_string();
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        resource.push('?');
        resource.push_str(&query);
    }

    let request = ExtractionRequest::path(operation, pathkey, resource, hints_from_headers(&headers));

    let response = state.orchestrator.respond(request).await?;
    Ok(json_response(response))
}

/// Health check endpoint handler.
///
/// GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Server info endpoint handler.
///
/// GET /info
pub async fn info_handler(State(state): State<ApiState>) -> Json<InfoResponse> {
    Json(InfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        parser: state.orchestrator.parser_name().to_string(),
        operations: [Operation::Metadata, Operation::Text, Operation::FullData]
            .iter()
            .map(|op| op.as_str().to_string())
            .collect(),
    })
}

fn parse_operation(opkey: &str) -> Result<Operation, ApiError> {
    opkey.parse::<Operation>().map_err(|e| {
        tracing::debug!(opkey = opkey, "Unknown operation requested");
        ApiError::from(e)
    })
}

fn hints_from_headers(headers: &HeaderMap) -> RequestHints {
    let value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    RequestHints {
        content_type: value(header::CONTENT_TYPE.as_str()),
        file_name: value(FILE_NAME_HEADER),
        content_length: value(CONTENT_LENGTH_HEADER),
    }
}

fn json_response(response: ExtractionResponse) -> Response {
    ([(header::CONTENT_TYPE, response.content_type())], response.body).into_response()
}
