//! Extraction requests and request-derived metadata.

use crate::detection::is_generic_binary;
use crate::types::{CONTENT_LENGTH, CONTENT_TYPE, MetadataMap, Operation, RESOURCE_NAME};

/// HTTP header carrying the client-declared file name.
pub const FILE_NAME_HEADER: &str = "File-Name";
/// HTTP header carrying the declared upload length.
pub const CONTENT_LENGTH_HEADER: &str = "Content-Length";

/// Client-supplied hints about the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestHints {
    pub content_type: Option<String>,
    pub file_name: Option<String>,
    pub content_length: Option<String>,
}

impl RequestHints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn with_content_length(mut self, content_length: impl Into<String>) -> Self {
        self.content_length = Some(content_length.into());
        self
    }
}

/// Where the document bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestSource {
    /// Bytes uploaded in the request body.
    Upload(Vec<u8>),
    /// A resource under a configured base location.
    Path { key: String, resource: String },
}

/// A single extraction request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    pub operation: Operation,
    pub source: RequestSource,
    pub hints: RequestHints,
}

impl ExtractionRequest {
    pub fn upload(operation: Operation, body: impl Into<Vec<u8>>, hints: RequestHints) -> Self {
        Self {
            operation,
            source: RequestSource::Upload(body.into()),
            hints,
        }
    }

    pub fn path(
        operation: Operation,
        key: impl Into<String>,
        resource: impl Into<String>,
        hints: RequestHints,
    ) -> Self {
        Self {
            operation,
            source: RequestSource::Path {
                key: key.into(),
                resource: resource.into(),
            },
            hints,
        }
    }

    /// Identifier used in logs and failure reports.
    pub fn source_id(&self) -> String {
        match &self.source {
            RequestSource::Upload(_) => self
                .hints
                .file_name
                .clone()
                .unwrap_or_else(|| "<upload>".to_string()),
            RequestSource::Path { key, resource } => format!("{}/{}", key, resource),
        }
    }
}

/// Copy request hints into `metadata` before parsing.
///
/// Absent hints leave the map untouched. A declared content type is added
/// (not set) so that a parser-detected type can sit next to it; the generic
/// `application/octet-stream` marker is skipped.
pub fn seed_metadata(metadata: &mut MetadataMap, hints: &RequestHints) {
    if let Some(length) = hints.content_length.as_deref() {
        metadata.set(CONTENT_LENGTH, length);
    }

    if let Some(name) = hints.file_name.as_deref() {
        metadata.set(RESOURCE_NAME, name);
    }

    if let Some(content_type) = hints.content_type.as_deref().map(str::trim)
        && !content_type.is_empty()
        && !is_generic_binary(content_type)
    {
        metadata.add(CONTENT_TYPE, content_type);
    }
}
