//! Request orchestration.
//!
//! The [`Orchestrator`] drives one extraction request from start to finish:
//!
//! 1. Resolve the source (upload bytes, local file, or fetched URL),
//!    filling hints the client left out
//! 2. Seed the metadata map from the hints
//! 3. Resolve the detection strategy from the declared content type
//! 4. Run the parser on the blocking pool
//! 5. Classify any fault, or pick the output encoding on success
//!
//! [`Orchestrator::respond`] additionally renders and encodes the response
//! body for the chosen operation.

use std::sync::Arc;
use std::time::Duration;

use encoding_rs::{Encoding, UTF_8};

use crate::core::config::ServerConfig;
use crate::core::source::{self, HttpFetcher, InputSource, SourceFetcher, resolve_source};
use crate::detection::DetectionStrategy;
use crate::failure::{Failure, classify_fault};
use crate::parser::{BuiltinParser, ContentSink, DocumentParser};
use crate::request::{ExtractionRequest, RequestSource, seed_metadata};
use crate::resolver::{PathResolver, StaticPathResolver};
use crate::serialize::{MetadataSerializer, serialize_scalar};
use crate::types::{CONTENT_ENCODING, CONTENT_TYPE, ExtractionResult, MetadataMap, Operation};

/// Encoding used when the parser reports none.
pub const DEFAULT_ENCODING: &str = "UTF-8";

/// Result of handling one request.
pub type Outcome = std::result::Result<ExtractionResult, Failure>;

/// A rendered response body and the charset it is encoded in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResponse {
    pub body: Vec<u8>,
    pub charset: String,
}

impl ExtractionResponse {
    /// Value for the `Content-Type` response header.
    pub fn content_type(&self) -> String {
        format!("application/json; charset={}", self.charset)
    }
}

/// Drives extraction requests through source resolution and parsing.
///
/// Cheap to share: all collaborators are held behind `Arc`.
#[derive(Clone)]
pub struct Orchestrator {
    parser: Arc<dyn DocumentParser>,
    resolver: Arc<dyn PathResolver>,
    fetcher: Arc<dyn SourceFetcher>,
    serializer: MetadataSerializer,
    write_limit: Option<usize>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("parser", &self.parser.name())
            .field("serializer", &self.serializer)
            .field("write_limit", &self.write_limit)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    pub fn new(
        parser: Arc<dyn DocumentParser>,
        resolver: Arc<dyn PathResolver>,
        fetcher: Arc<dyn SourceFetcher>,
    ) -> Self {
        Self {
            parser,
            resolver,
            fetcher,
            serializer: MetadataSerializer::default(),
            write_limit: None,
        }
    }

    /// Build an orchestrator with the built-in parser, the configured path
    /// table and an HTTP fetcher.
    pub fn from_config(config: &ServerConfig) -> crate::Result<Self> {
        let resolver = StaticPathResolver::new(config.paths.clone());
        let fetcher = HttpFetcher::new(Duration::from_secs(config.fetch.timeout_secs))?;

        Ok(Self::new(Arc::new(BuiltinParser::new()), Arc::new(resolver), Arc::new(fetcher))
            .with_serializer(MetadataSerializer::new(config.serialization))
            .with_write_limit(config.text.write_limit))
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn SourceFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_serializer(mut self, serializer: MetadataSerializer) -> Self {
        self.serializer = serializer;
        self
    }

    pub fn with_write_limit(mut self, write_limit: Option<usize>) -> Self {
        self.write_limit = write_limit;
        self
    }

    pub fn parser_name(&self) -> &str {
        self.parser.name()
    }

    pub fn serializer(&self) -> &MetadataSerializer {
        &self.serializer
    }

    /// Run one request to completion.
    ///
    /// Metadata is always collected; body text only for operations that
    /// need it. Every failure has been logged by the time this returns.
    pub async fn handle(&self, request: ExtractionRequest) -> Outcome {
        let source_id = request.source_id();
        let ExtractionRequest {
            operation,
            source,
            mut hints,
        } = request;

        let input = match source {
            RequestSource::Upload(bytes) => InputSource::Bytes(bytes),
            RequestSource::Path { key, resource } => self.resolve_path(&source_id, &key, &resource)?,
        };
        if hints.file_name.is_none() {
            hints.file_name = input.resource_name();
        }
        tracing::debug!(
            source = %source_id,
            operation = %operation,
            input = %input.describe(),
            "Resolved document source"
        );

        let prepared = source::prepare(input, self.fetcher.as_ref(), &mut hints).await?;

        let mut metadata = MetadataMap::new();
        seed_metadata(&mut metadata, &hints);
        let detection = DetectionStrategy::resolve(hints.content_type.as_deref());

        let sink = if operation.collects_text() {
            ContentSink::buffer(self.write_limit)
        } else {
            ContentSink::discard()
        };

        let parser = Arc::clone(&self.parser);
        let task_source = source_id.clone();
        let joined = tokio::task::spawn_blocking(move || -> std::result::Result<(MetadataMap, String), Failure> {
            let mut metadata = metadata;
            let mut sink = sink;

            let mut reader = prepared.open().map_err(|e| open_failure(&task_source, e))?;
            parser
                .parse(&mut *reader, &mut sink, &mut metadata, &detection)
                .map_err(|fault| classify_fault(&task_source, fault))?;

            Ok((metadata, sink.into_text()))
        })
        .await;

        let (metadata, text) = match joined {
            Ok(parsed) => parsed?,
            Err(e) => {
                tracing::warn!(source = %source_id, error = %e, "Parser task failed");
                return Err(Failure::internal(source_id, format!("Parser task failed: {}", e)));
            }
        };

        let encoding = output_encoding(&metadata);
        Ok(ExtractionResult {
            metadata,
            text,
            encoding,
        })
    }

    /// Handle `request` and render the response body for its operation.
    pub async fn respond(&self, request: ExtractionRequest) -> std::result::Result<ExtractionResponse, Failure> {
        let operation = request.operation;
        let result = self.handle(request).await?;

        let body = render_body(&result, operation, &self.serializer);
        let (body, charset) = encode_body(&body, &result.encoding);
        Ok(ExtractionResponse { body, charset })
    }

    fn resolve_path(&self, source_id: &str, key: &str, resource: &str) -> std::result::Result<InputSource, Failure> {
        let Some(base) = self.resolver.resolve(key) else {
            tracing::warn!(source = source_id, key = key, "Unknown path key");
            return Err(Failure::not_found(source_id, format!("Unknown path key: {}", key)));
        };

        resolve_source(&base, resource).inspect_err(|failure| {
            tracing::warn!(source = %failure.source_id, error = %failure.message, "Source could not be resolved");
        })
    }
}

fn open_failure(source_id: &str, error: std::io::Error) -> Failure {
    tracing::warn!(source = source_id, error = %error, "Failed to open document");
    if error.kind() == std::io::ErrorKind::NotFound {
        Failure::not_found(source_id, error.to_string())
    } else {
        Failure::internal(source_id, error.to_string())
    }
}

/// Response encoding for a parsed document.
///
/// `UTF-8` unless the parser recorded a content type, in which case the
/// parser's `Content-Encoding` (if any) is used.
pub fn output_encoding(metadata: &MetadataMap) -> String {
    if metadata.get(CONTENT_TYPE).is_none() {
        return DEFAULT_ENCODING.to_string();
    }

    metadata
        .get(CONTENT_ENCODING)
        .filter(|encoding| !encoding.trim().is_empty())
        .unwrap_or(DEFAULT_ENCODING)
        .to_string()
}

/// Assemble the JSON body for `operation`.
pub fn render_body(result: &ExtractionResult, operation: Operation, serializer: &MetadataSerializer) -> String {
    match operation {
        Operation::Metadata => format!("{{\"metadata\":{}}}", serializer.serialize(&result.metadata)),
        Operation::Text => format!("{{ \"text\":{} }}", serialize_scalar(&result.text)),
        Operation::FullData => format!(
            "{{ \"metadata\":{}, \"text\":{} }}",
            serializer.serialize(&result.metadata),
            serialize_scalar(&result.text)
        ),
    }
}

/// Encode `body` using the encoding named by `label`.
///
/// Returns the bytes and the name of the encoding actually used, which
/// differs from `label` for unknown labels (UTF-8 fallback) and for
/// encodings that can't be produced on output (UTF-16 encodes as UTF-8).
pub fn encode_body(body: &str, label: &str) -> (Vec<u8>, String) {
    let encoding = Encoding::for_label(label.trim().as_bytes()).unwrap_or_else(|| {
        tracing::warn!(encoding = label, "Unknown output encoding, falling back to UTF-8");
        UTF_8
    });

    let (bytes, used, had_unmappable) = encoding.encode(body);
    if had_unmappable {
        tracing::debug!(encoding = used.name(), "Unmappable characters replaced with numeric references");
    }

    (bytes.into_owned(), used.name().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::source::FetchedDocument;
    use crate::error::ParseFault;
    use crate::failure::FailureKind;
    use crate::request::RequestHints;
    use crate::types::{CONTENT_LENGTH, RESOURCE_NAME};
    use async_trait::async_trait;
    use std::io::Read;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Writes the uploaded bytes back as text and records the resolved type.
    #[derive(Default)]
    struct EchoParser {
        calls: AtomicUsize,
    }

    impl DocumentParser for EchoParser {
        fn detect(&self, _content: &[u8], _metadata: &MetadataMap) -> String {
            "text/plain".to_string()
        }

        fn parse(
            &self,
            reader: &mut dyn Read,
            sink: &mut ContentSink,
            metadata: &mut MetadataMap,
            detection: &DetectionStrategy,
        ) -> Result<(), ParseFault> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut content = String::new();
            reader.read_to_string(&mut content)?;
            let content_type = detection.detect(self, content.as_bytes(), metadata);
            if !metadata.contains_value(CONTENT_TYPE, &content_type) {
                metadata.add(CONTENT_TYPE, content_type);
            }
            metadata.set("Pages", "42");
            sink.write_str(&content)
        }
    }

    struct FaultingParser(fn() -> ParseFault);

    impl DocumentParser for FaultingParser {
        fn detect(&self, _content: &[u8], _metadata: &MetadataMap) -> String {
            "application/pdf".to_string()
        }

        fn parse(
            &self,
            _reader: &mut dyn Read,
            _sink: &mut ContentSink,
            _metadata: &mut MetadataMap,
            _detection: &DetectionStrategy,
        ) -> Result<(), ParseFault> {
            Err((self.0)())
        }
    }

    struct PanickingParser;

    impl DocumentParser for PanickingParser {
        fn detect(&self, _content: &[u8], _metadata: &MetadataMap) -> String {
            String::new()
        }

        fn parse(
            &self,
            _reader: &mut dyn Read,
            _sink: &mut ContentSink,
            _metadata: &mut MetadataMap,
            _detection: &DetectionStrategy,
        ) -> Result<(), ParseFault> {
            panic!("parser bug");
        }
    }

    struct StaticFetcher(&'static [u8]);

    #[async_trait]
    impl SourceFetcher for StaticFetcher {
        async fn fetch(&self, _url: &str) -> crate::Result<FetchedDocument> {
            Ok(FetchedDocument::new(self.0).with_content_type("text/csv"))
        }
    }

    fn orchestrator(parser: Arc<dyn DocumentParser>, resolver: StaticPathResolver) -> Orchestrator {
        Orchestrator::new(parser, Arc::new(resolver), Arc::new(StaticFetcher(b"remote body")))
    }

    #[tokio::test]
    async fn test_text_operation_returns_text_only() {
        let orch = orchestrator(Arc::new(EchoParser::default()), StaticPathResolver::default());
        let request = ExtractionRequest::upload(Operation::Text, b"hello world".to_vec(), RequestHints::default());

        let response = orch.respond(request).await.unwrap();
        assert_eq!(String::from_utf8(response.body).unwrap(), r#"{ "text":"hello world" }"#);
        assert_eq!(response.charset, "UTF-8");
    }

    #[tokio::test]
    async fn test_text_operation_still_collects_metadata() {
        let orch = orchestrator(Arc::new(EchoParser::default()), StaticPathResolver::default());
        let request = ExtractionRequest::upload(Operation::Text, b"hello world".to_vec(), RequestHints::default());

        let result = orch.handle(request).await.unwrap();
        assert_eq!(result.metadata.get("Pages"), Some("42"));
        assert_eq!(result.metadata.get(CONTENT_TYPE), Some("text/plain"));

        let body = render_body(&result, Operation::Text, orch.serializer());
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert!(value.get("metadata").is_none());
        assert_eq!(value["text"], "hello world");
    }

    #[tokio::test]
    async fn test_metadata_operation_discards_text() {
        let orch = orchestrator(Arc::new(EchoParser::default()), StaticPathResolver::default());
        let request = ExtractionRequest::upload(
            Operation::Metadata,
            b"hello world".to_vec(),
            RequestHints::new().with_file_name("hello.txt"),
        );

        let result = orch.handle(request).await.unwrap();
        assert_eq!(result.text, "");
        assert_eq!(result.metadata.get(RESOURCE_NAME), Some("hello.txt"));

        let body = render_body(&result, Operation::Metadata, orch.serializer());
        assert_eq!(
            body,
            r#"{"metadata":{ "Content-Type":"text/plain", "Pages":42, "resourceName":"hello.txt" }}"#
        );
    }

    #[tokio::test]
    async fn test_fulldata_contains_both() {
        let orch = orchestrator(Arc::new(EchoParser::default()), StaticPathResolver::default());
        let request = ExtractionRequest::upload(Operation::FullData, b"hi".to_vec(), RequestHints::default());

        let response = orch.respond(request).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(value["text"], "hi");
        assert_eq!(value["metadata"]["Pages"], 42);
    }

    #[tokio::test]
    async fn test_declared_type_reaches_parser() {
        let orch = orchestrator(Arc::new(EchoParser::default()), StaticPathResolver::default());
        let request = ExtractionRequest::upload(
            Operation::Metadata,
            b"plain old text".to_vec(),
            RequestHints::new().with_content_type("application/pdf"),
        );

        let result = orch.handle(request).await.unwrap();
        assert_eq!(result.metadata.get(CONTENT_TYPE), Some("application/pdf"));
        assert!(!result.metadata.is_multi_valued(CONTENT_TYPE));
    }

    #[tokio::test]
    async fn test_encrypted_fault_is_malformed_or_protected() {
        let parser = FaultingParser(|| ParseFault::Encrypted("PDF is password-protected".to_string()));
        let orch = orchestrator(Arc::new(parser), StaticPathResolver::default());
        let request = ExtractionRequest::upload(Operation::Text, b"%PDF-1.7".to_vec(), RequestHints::default());

        let failure = orch.handle(request).await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::MalformedOrProtected);
        assert_eq!(failure.kind.status_code(), 422);
    }

    #[tokio::test]
    async fn test_unsupported_type_is_415() {
        let parser = FaultingParser(|| ParseFault::unsupported("image/png"));
        let orch = orchestrator(Arc::new(parser), StaticPathResolver::default());
        let request = ExtractionRequest::upload(Operation::Text, vec![0u8; 4], RequestHints::default());

        let failure = orch.handle(request).await.unwrap_err();
        assert_eq!(failure.kind.status_code(), 415);
    }

    #[tokio::test]
    async fn test_parser_panic_is_internal_fault() {
        let orch = orchestrator(Arc::new(PanickingParser), StaticPathResolver::default());
        let request = ExtractionRequest::upload(Operation::Text, b"x".to_vec(), RequestHints::default());

        let failure = orch.handle(request).await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::InternalFault);
    }

    #[tokio::test]
    async fn test_unknown_path_key_is_not_found_without_parsing() {
        let parser = Arc::new(EchoParser::default());
        let orch = orchestrator(parser.clone(), StaticPathResolver::default());
        let request = ExtractionRequest::path(Operation::Text, "missing", "a.txt", RequestHints::default());

        let failure = orch.handle(request).await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::NotFound);
        assert_eq!(parser.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unresolvable_candidate_is_not_found() {
        let resolver = StaticPathResolver::default().with_base("docs", "/definitely/not/here/");
        let orch = orchestrator(Arc::new(EchoParser::default()), resolver);
        let request = ExtractionRequest::path(Operation::Text, "docs", "nothing.pdf", RequestHints::default());

        let failure = orch.handle(request).await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::NotFound);
    }

    #[tokio::test]
    async fn test_local_file_source() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("note.txt"), "from disk").unwrap();
        let resolver = StaticPathResolver::default().with_base("docs", format!("{}/", dir.path().display()));
        let orch = orchestrator(Arc::new(EchoParser::default()), resolver);
        let request = ExtractionRequest::path(Operation::Text, "docs", "note.txt", RequestHints::default());

        let result = orch.handle(request).await.unwrap();
        assert_eq!(result.text, "from disk");
        assert_eq!(result.metadata.get(RESOURCE_NAME), Some("note.txt"));
        assert_eq!(result.metadata.get(CONTENT_LENGTH), Some("9"));
    }

    #[tokio::test]
    async fn test_url_source_uses_fetcher() {
        let resolver = StaticPathResolver::default().with_base("web", "https://example.com/files/");
        let orch = orchestrator(Arc::new(EchoParser::default()), resolver);
        let request = ExtractionRequest::path(Operation::Text, "web", "a.txt", RequestHints::default());

        let result = orch.handle(request).await.unwrap();
        assert_eq!(result.text, "remote body");
        assert_eq!(result.metadata.get(CONTENT_TYPE), Some("text/csv"));
        assert_eq!(result.metadata.get(CONTENT_LENGTH), Some("11"));
        assert_eq!(result.metadata.get(RESOURCE_NAME), Some("a.txt"));
    }

    #[tokio::test]
    async fn test_write_limit_is_serialization_fault() {
        let orch = orchestrator(Arc::new(EchoParser::default()), StaticPathResolver::default()).with_write_limit(Some(3));
        let request = ExtractionRequest::upload(Operation::Text, b"too long".to_vec(), RequestHints::default());

        let failure = orch.handle(request).await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::SerializationFault);
    }

    #[test]
    fn test_output_encoding() {
        let mut metadata = MetadataMap::new();
        metadata.set(CONTENT_ENCODING, "ISO-8859-1");
        assert_eq!(output_encoding(&metadata), "UTF-8", "no content type means UTF-8");

        metadata.set(CONTENT_TYPE, "text/plain");
        assert_eq!(output_encoding(&metadata), "ISO-8859-1");

        let mut without_encoding = MetadataMap::new();
        without_encoding.set(CONTENT_TYPE, "application/pdf");
        assert_eq!(output_encoding(&without_encoding), "UTF-8");
    }

    #[test]
    fn test_render_body_shapes() {
        let mut metadata = MetadataMap::new();
        metadata.set("a", "1");
        let result = ExtractionResult {
            metadata,
            text: "t".to_string(),
            encoding: DEFAULT_ENCODING.to_string(),
        };
        let serializer = MetadataSerializer::default();

        assert_eq!(render_body(&result, Operation::Metadata, &serializer), r#"{"metadata":{ "a":1 }}"#);
        assert_eq!(render_body(&result, Operation::Text, &serializer), r#"{ "text":"t" }"#);
        assert_eq!(
            render_body(&result, Operation::FullData, &serializer),
            r#"{ "metadata":{ "a":1 }, "text":"t" }"#
        );
    }

    #[test]
    fn test_encode_body() {
        let (bytes, charset) = encode_body("café", "ISO-8859-1");
        assert_eq!(bytes, vec![b'c', b'a', b'f', 0xE9]);
        assert_eq!(charset, "windows-1252");

        let (bytes, charset) = encode_body("café", "no-such-charset");
        assert_eq!(bytes, "café".as_bytes());
        assert_eq!(charset, "UTF-8");

        let (_, charset) = encode_body("x", "UTF-16LE");
        assert_eq!(charset, "UTF-8");
    }
}
