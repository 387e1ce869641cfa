//! Failure classification.
//!
//! Maps faults raised by the parsing collaborator onto the small set of
//! outcomes the HTTP boundary distinguishes.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ParseFault;

/// Terminal failure categories of an extraction request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The source could not be resolved (unknown path key, missing file, bad URL).
    NotFound,
    /// No parser is available for the content type.
    UnsupportedType,
    /// The document was rejected as corrupt, encrypted, or in a legacy format.
    MalformedOrProtected,
    /// The content handler failed while receiving output.
    SerializationFault,
    /// Anything else.
    InternalFault,
}

impl FailureKind {
    /// HTTP status code surfaced for this kind.
    pub fn status_code(&self) -> u16 {
        match self {
            FailureKind::NotFound => 404,
            FailureKind::UnsupportedType => 415,
            FailureKind::MalformedOrProtected => 422,
            FailureKind::SerializationFault | FailureKind::InternalFault => 500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::NotFound => "NotFound",
            FailureKind::UnsupportedType => "UnsupportedType",
            FailureKind::MalformedOrProtected => "MalformedOrProtected",
            FailureKind::SerializationFault => "SerializationFault",
            FailureKind::InternalFault => "InternalFault",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified extraction failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: FailureKind,
    /// Identifier of the source that failed (path, URL, or upload file name).
    pub source_id: String,
    pub message: String,
}

impl Failure {
    pub fn new(kind: FailureKind, source_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            source_id: source_id.into(),
            message: message.into(),
        }
    }

    pub fn not_found(source_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(FailureKind::NotFound, source_id, message)
    }

    pub fn internal(source_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(FailureKind::InternalFault, source_id, message)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.kind, self.source_id, self.message)
    }
}

impl std::error::Error for Failure {}

/// Classify a parser fault.
pub fn classify(fault: &ParseFault) -> FailureKind {
    match fault {
        ParseFault::ContentHandler(_) => FailureKind::SerializationFault,
        ParseFault::IllegalState(_) | ParseFault::Encrypted(_) | ParseFault::LegacyFormat(_) => {
            FailureKind::MalformedOrProtected
        }
        ParseFault::Rejected { kind, .. } => *kind,
        ParseFault::Io(_) | ParseFault::Other(_) => FailureKind::InternalFault,
    }
}

/// Log `fault` against `source_id` and turn it into a [`Failure`].
pub fn classify_fault(source_id: &str, fault: ParseFault) -> Failure {
    let kind = classify(&fault);
    tracing::warn!(source = source_id, kind = %kind, status = kind.status_code(), error = %fault, "Text extraction failed");
    Failure::new(kind, source_id, fault.to_string())
}
