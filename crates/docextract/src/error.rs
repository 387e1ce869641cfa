//! Error types for docextract.
//!
//! Two error families live in this crate:
//!
//! - [`DocextractError`] covers the service itself: configuration loading,
//!   socket binding, I/O while resolving sources, and so on.
//! - [`ParseFault`] is the tagged error returned by a
//!   [`DocumentParser`](crate::parser::DocumentParser). The orchestrator never
//!   lets a `ParseFault` escape; it is always classified into a
//!   [`FailureKind`](crate::failure::FailureKind) first.
//!
//! # Example
//!
//! ```rust
//! use docextract::{DocextractError, Result};
//!
//! fn read_config(path: &str) -> Result<String> {
//!     let content = std::fs::read_to_string(path)?;
//!
//!     if content.trim().is_empty() {
//!         return Err(DocextractError::config(format!("Config file is empty: {}", path)));
//!     }
//!
//!     Ok(content)
//! }
//! ```
use thiserror::Error;

use crate::failure::FailureKind;

/// Result type alias using `DocextractError`.
pub type Result<T> = std::result::Result<T, DocextractError>;

/// Main error type for service-level operations.
///
/// # Variants
///
/// - `Io` - File system and socket errors (always bubble up)
/// - `Validation` - Invalid parameters (host address, operation selector, ...)
/// - `Config` - Configuration file could not be read or parsed
/// - `Other` - Catch-all for uncommon errors
#[derive(Debug, Error)]
pub enum DocextractError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("{0}")]
    Other(String),
}

macro_rules! error_constructor {
    ($name:ident, $variant:ident) => {
        pastey::paste! {
            #[doc = "Create a " $variant " error"]
            pub fn $name<S: Into<String>>(message: S) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: None,
                }
            }

            #[doc = "Create a " $variant " error with source"]
            pub fn [<$name _with_source>]<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
                message: S,
                source: E,
            ) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: Some(Box::new(source)),
                }
            }
        }
    };
}

impl DocextractError {
    error_constructor!(validation, Validation);
    error_constructor!(config, Config);
}

/// Fault raised by a parsing engine.
///
/// Each variant names the failure mode directly so callers classify with a
/// single `match` instead of walking `source()` chains.
#[derive(Debug, Error)]
pub enum ParseFault {
    /// The content handler rejected output (e.g. write limit exceeded).
    #[error("Content handler fault: {0}")]
    ContentHandler(String),

    /// The document is in a state the parser cannot continue from
    /// (corrupt structure, wrong declared type).
    #[error("Illegal document state: {0}")]
    IllegalState(String),

    /// The document is password-protected or encrypted.
    #[error("Encrypted document: {0}")]
    Encrypted(String),

    /// The document uses a legacy binary sub-format that is not supported.
    #[error("Legacy format not supported: {0}")]
    LegacyFormat(String),

    /// The fallback parser rejected the document outright; the carried kind
    /// is re-surfaced unchanged at the boundary.
    #[error("Rejected ({kind}): {message}")]
    Rejected { kind: FailureKind, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl ParseFault {
    /// Rejection produced when no parser handles the content type.
    pub fn unsupported(mime_type: impl AsRef<str>) -> Self {
        ParseFault::Rejected {
            kind: FailureKind::UnsupportedType,
            message: format!("No parser available for {}", mime_type.as_ref()),
        }
    }
}
