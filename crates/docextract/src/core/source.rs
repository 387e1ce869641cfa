//! Source resolution for path-based requests.
//!
//! A candidate location is the configured base joined with the requested
//! resource by plain concatenation. An existing local file wins; otherwise
//! the candidate is parsed as a URL. Anything that cannot be reached is
//! reported as [`FailureKind::NotFound`](crate::failure::FailureKind::NotFound).

use std::io::{self, Cursor, Read};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;

use crate::failure::Failure;
use crate::request::RequestHints;
use crate::{DocextractError, Result};

/// A resolved document location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// Bytes already in memory.
    Bytes(Vec<u8>),
    /// A local file, opened on the blocking worker.
    File(PathBuf),
    /// A remote document fetched over HTTP(S).
    Url(String),
}

impl InputSource {
    pub fn describe(&self) -> String {
        match self {
            InputSource::Bytes(bytes) => format!("<{} bytes>", bytes.len()),
            InputSource::File(path) => path.display().to_string(),
            InputSource::Url(url) => url.clone(),
        }
    }

    /// File name implied by the location: the last path segment of a file
    /// or URL. `None` for in-memory bytes.
    pub fn resource_name(&self) -> Option<String> {
        match self {
            InputSource::Bytes(_) => None,
            InputSource::File(path) => path.file_name().map(|name| name.to_string_lossy().into_owned()),
            InputSource::Url(url) => Url::parse(url)
                .ok()?
                .path_segments()?
                .next_back()
                .filter(|segment| !segment.is_empty())
                .map(str::to_string),
        }
    }
}

/// Resolve `resource` against `base`.
///
/// # Errors
///
/// Returns a `NotFound` failure when the candidate is neither an existing
/// file nor a URL with a supported scheme, or when the resource tries to
/// climb out of its base with `..`.
pub fn resolve_source(base: &str, resource: &str) -> std::result::Result<InputSource, Failure> {
    let candidate = format!("{}{}", base, resource);

    if escapes_base(resource) {
        return Err(Failure::not_found(candidate, "Resource path may not contain '..' segments"));
    }

    if Path::new(&candidate).is_file() {
        return Ok(InputSource::File(PathBuf::from(candidate)));
    }

    let url = Url::parse(&candidate)
        .map_err(|e| Failure::not_found(candidate.clone(), format!("Resource is neither a file nor a URL: {}", e)))?;

    let scheme = url.scheme().to_ascii_lowercase();
    match scheme.as_str() {
        "http" | "https" => Ok(InputSource::Url(url.to_string())),
        "file" => match url.to_file_path() {
            Ok(path) if path.is_file() => Ok(InputSource::File(path)),
            _ => Err(Failure::not_found(candidate, "File does not exist")),
        },
        other => Err(Failure::not_found(candidate, format!("Unsupported URL scheme: {}", other))),
    }
}

fn escapes_base(resource: &str) -> bool {
    Path::new(resource)
        .components()
        .any(|component| matches!(component, Component::ParentDir))
}

/// A remote document and the headers that describe it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedDocument {
    pub content: Vec<u8>,
    /// The origin server's `Content-Type`, if it sent one.
    pub content_type: Option<String>,
}

impl FetchedDocument {
    pub fn new(content: impl Into<Vec<u8>>) -> Self {
        Self {
            content: content.into(),
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Retrieves remote documents.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Fetch the full body of `url`.
    async fn fetch(&self, url: &str) -> Result<FetchedDocument>;
}

/// [`SourceFetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DocextractError::Io(io::Error::other(format!("Failed to create HTTP client: {}", e))))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl SourceFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedDocument> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DocextractError::Io(io::Error::other(format!("Request to {} failed: {}", url, e))))?;

        if !response.status().is_success() {
            return Err(DocextractError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} returned status: {}", url, response.status()),
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DocextractError::Io(io::Error::other(format!("Failed to read body of {}: {}", url, e))))?;

        Ok(FetchedDocument {
            content: bytes.to_vec(),
            content_type,
        })
    }
}

/// A source ready to be handed to the blocking parse worker.
#[derive(Debug)]
pub(crate) enum PreparedSource {
    Bytes(Vec<u8>),
    File(PathBuf),
}

impl PreparedSource {
    /// Open a reader. Must be called on the blocking worker.
    pub(crate) fn open(self) -> io::Result<Box<dyn Read + Send>> {
        match self {
            PreparedSource::Bytes(bytes) => Ok(Box::new(Cursor::new(bytes))),
            PreparedSource::File(path) => Ok(Box::new(io::BufReader::new(std::fs::File::open(path)?))),
        }
    }
}

/// Turn an [`InputSource`] into something the parse worker can open,
/// fetching remote content first.
///
/// Hints the client left out are filled from the source: the size of a
/// local file or fetched body, and the remote server's content type.
pub(crate) async fn prepare(
    source: InputSource,
    fetcher: &dyn SourceFetcher,
    hints: &mut RequestHints,
) -> std::result::Result<PreparedSource, Failure> {
    match source {
        InputSource::Bytes(bytes) => Ok(PreparedSource::Bytes(bytes)),
        InputSource::File(path) => {
            if hints.content_length.is_none()
                && let Ok(meta) = tokio::fs::metadata(&path).await
            {
                hints.content_length = Some(meta.len().to_string());
            }
            Ok(PreparedSource::File(path))
        }
        InputSource::Url(url) => match fetcher.fetch(&url).await {
            Ok(fetched) => {
                if hints.content_length.is_none() {
                    hints.content_length = Some(fetched.content.len().to_string());
                }
                if hints.content_type.is_none() {
                    hints.content_type = fetched.content_type;
                }
                Ok(PreparedSource::Bytes(fetched.content))
            }
            Err(e) => {
                tracing::warn!(source = %url, error = %e, "Failed to fetch remote document");
                Err(Failure::not_found(url, e.to_string()))
            }
        },
    }
}
