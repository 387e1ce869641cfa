//! Core extraction orchestration module.
//!
//! # Architecture
//!
//! - **Orchestrator**: Drives a request through seeding, detection, source
//!   resolution, parsing and failure classification
//! - **Source**: Resolves path-based requests to local files or URLs and
//!   fetches remote content
//! - **MIME**: Extension tables and media type classification
//! - **Configuration**: Loading and managing server configuration
//!
//! # Example
//!
//! ```rust,no_run
//! use docextract::core::config::ServerConfig;
//! use docextract::core::orchestrator::Orchestrator;
//! use docextract::request::{ExtractionRequest, RequestHints};
//! use docextract::Operation;
//!
//! # async fn example() -> docextract::Result<()> {
//! let orchestrator = Orchestrator::from_config(&ServerConfig::default())?;
//! let request = ExtractionRequest::upload(Operation::Text, b"hello world".to_vec(), RequestHints::default());
//!
//! match orchestrator.respond(request).await {
//!     Ok(response) => println!("{}", String::from_utf8_lossy(&response.body)),
//!     Err(failure) => eprintln!("{} -> HTTP {}", failure, failure.kind.status_code()),
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod mime;
pub mod orchestrator;
pub mod source;

pub use config::{FetchConfig, LimitsConfig, ServerConfig, TextConfig};
pub use orchestrator::{ExtractionResponse, Orchestrator, Outcome, encode_body, output_encoding, render_body};
pub use source::{FetchedDocument, HttpFetcher, InputSource, SourceFetcher, resolve_source};
