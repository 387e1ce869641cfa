//! docextract - document metadata and text extraction over HTTP
//!
//! docextract accepts a document either as an upload or as a reference to a
//! resource under a configured base location, runs it through a parsing
//! engine and returns its metadata, its text, or both as JSON.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use docextract::core::{Orchestrator, ServerConfig};
//! use docextract::request::{ExtractionRequest, RequestHints};
//! use docextract::Operation;
//!
//! # async fn example() -> docextract::Result<()> {
//! let orchestrator = Orchestrator::from_config(&ServerConfig::default())?;
//! let request = ExtractionRequest::upload(
//!     Operation::FullData,
//!     std::fs::read("notes.txt")?,
//!     RequestHints::new().with_file_name("notes.txt"),
//! );
//!
//! match orchestrator.respond(request).await {
//!     Ok(response) => println!("{}", String::from_utf8_lossy(&response.body)),
//!     Err(failure) => eprintln!("extraction failed with HTTP {}", failure.kind.status_code()),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Core Module** (`core`): Request orchestration, source resolution, MIME tables, config loading
//! - **Parser** (`parser`): The `DocumentParser` interface and the built-in engine (text family, PDF)
//! - **Serialization** (`serialize`): Metadata to JSON with numeric inference
//! - **Failure classification** (`failure`): Parser faults to HTTP-facing failure kinds
//! - **API** (`api`, feature `api`): Axum router and server

#![deny(unsafe_code)]

pub mod core;
pub mod detection;
pub mod error;
pub mod failure;
pub mod parser;
pub mod request;
pub mod resolver;
pub mod serialize;
pub mod types;

#[cfg(feature = "api")]
pub mod api;

pub use error::{DocextractError, ParseFault, Result};
pub use types::*;

pub use core::config::ServerConfig;
pub use core::orchestrator::{ExtractionResponse, Orchestrator, Outcome};
pub use detection::DetectionStrategy;
pub use failure::{Failure, FailureKind, classify};
pub use parser::{BuiltinParser, ContentSink, DocumentParser};
pub use request::{ExtractionRequest, RequestHints, RequestSource, seed_metadata};
pub use resolver::{PathResolver, StaticPathResolver};
pub use serialize::{MetadataSerializer, NumberLocale, serialize_metadata, serialize_scalar};
