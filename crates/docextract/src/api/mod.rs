//! REST API server for docextract.
//!
//! This module provides an Axum-based HTTP server exposing the extraction
//! operations over two request styles.
//!
//! # Endpoints
//!
//! - `PUT /{opkey}` - Extract from the uploaded request body
//! - `GET /{opkey}/{pathkey}/{*resource}` - Extract from a resource under a configured base location
//! - `GET /health` - Health check endpoint
//! - `GET /info` - Server information
//!
//! `opkey` is one of `metadata`, `text` or `fulldata` (case-insensitive).
//! Successful responses are `application/json` in the charset reported by
//! the parser. Failures map to 404 (source not found or unknown
//! operation), 415 (unsupported type), 422 (corrupt, encrypted or legacy
//! document) and 500.
//!
//! # Examples
//!
//! ## Starting the server
//!
//! ```no_run
//! use docextract::api::serve_default;
//!
//! #[tokio::main]
//! async fn main() -> docextract::Result<()> {
//!     serve_default().await
//! }
//! ```
//!
//! ## Embedding the router in your app
//!
//! ```no_run
//! use docextract::api::create_router;
//! use docextract::core::{Orchestrator, ServerConfig};
//! use axum::Router;
//!
//! # fn main() -> docextract::Result<()> {
//! let orchestrator = Orchestrator::from_config(&ServerConfig::default())?;
//! let app: Router = Router::new().nest("/extract", create_router(orchestrator));
//! # Ok(())
//! # }
//! ```
//!
//! # cURL Examples
//!
//! ```bash
//! # Metadata of an uploaded file
//! curl -T report.pdf -H "File-Name: report.pdf" http://localhost:8000/metadata
//!
//! # Text with an explicit content type
//! curl -T notes.txt -H "Content-Type: text/plain; charset=ISO-8859-1" http://localhost:8000/text
//!
//! # Metadata and text of /srv/docs/q1/report.pdf, with [paths] docs = "/srv/docs/"
//! curl http://localhost:8000/fulldata/docs/q1/report.pdf
//!
//! # Health check
//! curl http://localhost:8000/health
//! ```

mod error;
mod handlers;
mod server;
mod types;

pub use error::ApiError;
pub use server::{CORS_ORIGINS_ENV, create_router, create_router_with_limits, serve, serve_default};
pub use types::{ApiSizeLimits, ApiState, ErrorResponse, HealthResponse, InfoResponse};
