//! Built-in parsing engine.

use std::io::Read;

use crate::core::mime::{self, OLE2_MIME_TYPE, PDF_MIME_TYPE, PLAIN_TEXT_MIME_TYPE};
use crate::detection::{DetectionStrategy, OCTET_STREAM, media_type_essence};
use crate::error::ParseFault;
use crate::types::{MetadataMap, RESOURCE_NAME};

use super::{ContentSink, DocumentParser, record_content_type, text};

/// OLE2 compound document signature (legacy `.doc`, `.xls`, `.ppt`, `.msg`).
const OLE2_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Bytes inspected by the text heuristic.
const TEXT_SNIFF_LEN: usize = 8192;

/// Small reference engine covering text formats and PDF.
///
/// Detection order: magic bytes (`infer`), the declared `resourceName`
/// extension, then a plain-text heuristic. Content types with no handler go
/// to the fallback parser, which rejects them as unsupported.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinParser;

impl BuiltinParser {
    pub fn new() -> Self {
        Self
    }

    fn fallback(&self, content_type: &str) -> Result<(), ParseFault> {
        Err(ParseFault::unsupported(content_type))
    }
}

impl DocumentParser for BuiltinParser {
    fn name(&self) -> &str {
        "builtin"
    }

    fn detect(&self, content: &[u8], metadata: &MetadataMap) -> String {
        let by_name = metadata.get(RESOURCE_NAME).and_then(mime::mime_from_name);

        if content.starts_with(&OLE2_SIGNATURE) {
            return by_name
                .filter(|name_type| mime::is_legacy_office_type(name_type))
                .unwrap_or_else(|| OLE2_MIME_TYPE.to_string());
        }

        if let Some(kind) = infer::get(content) {
            return kind.mime_type().to_string();
        }

        if let Some(name_type) = by_name {
            return name_type;
        }

        if looks_like_text(content) {
            return PLAIN_TEXT_MIME_TYPE.to_string();
        }

        OCTET_STREAM.to_string()
    }

    fn parse(
        &self,
        reader: &mut dyn Read,
        sink: &mut ContentSink,
        metadata: &mut MetadataMap,
        detection: &DetectionStrategy,
    ) -> Result<(), ParseFault> {
        let mut content = Vec::new();
        reader.read_to_end(&mut content)?;

        let content_type = detection.detect(self, &content, metadata);
        let essence = media_type_essence(&content_type).to_ascii_lowercase();
        tracing::debug!(
            content_type = %content_type,
            declared = detection.is_declared(),
            size_bytes = content.len(),
            "Dispatching document"
        );

        if mime::is_text_type(&essence) {
            return text::parse_text(&content, &content_type, sink, metadata);
        }

        if essence == PDF_MIME_TYPE {
            record_content_type(metadata, PDF_MIME_TYPE);
            #[cfg(feature = "pdf")]
            return super::pdf::parse_pdf(&content, sink, metadata);
            #[cfg(not(feature = "pdf"))]
            return self.fallback(&essence);
        }

        if mime::is_legacy_office_type(&essence) {
            record_content_type(metadata, &essence);
            return Err(ParseFault::LegacyFormat(format!(
                "{} documents use a legacy binary format",
                essence
            )));
        }

        record_content_type(metadata, &essence);
        self.fallback(&essence)
    }
}

/// No NUL bytes and few control characters in the leading sample.
fn looks_like_text(content: &[u8]) -> bool {
    let sample = &content[..content.len().min(TEXT_SNIFF_LEN)];
    if sample.contains(&0) {
        return false;
    }

    let control = sample
        .iter()
        .filter(|&&b| b < 0x20 && !matches!(b, b'\t' | b'\n' | b'\r' | 0x0C | 0x1B))
        .count();

    control * 10 <= sample.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CONTENT_TYPE;

    fn run(
        content: &[u8],
        detection: DetectionStrategy,
        sink: ContentSink,
    ) -> (Result<(), ParseFault>, MetadataMap, String) {
        let mut metadata = MetadataMap::new();
        let mut sink = sink;
        let mut reader = content;
        let result = BuiltinParser.parse(&mut reader, &mut sink, &mut metadata, &detection);
        (result, metadata, sink.into_text())
    }

    #[test]
    fn test_detect_plain_text() {
        assert_eq!(BuiltinParser.detect(b"hello world", &MetadataMap::new()), "text/plain");
    }

    #[test]
    fn test_detect_png_magic() {
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        assert_eq!(BuiltinParser.detect(&png, &MetadataMap::new()), "image/png");
    }

    #[test]
    fn test_detect_uses_resource_name() {
        let mut metadata = MetadataMap::new();
        metadata.set(RESOURCE_NAME, "data.csv");
        assert_eq!(BuiltinParser.detect(b"a,b\n1,2", &metadata), "text/csv");
    }

    #[test]
    fn test_detect_ole2_container() {
        let mut content = OLE2_SIGNATURE.to_vec();
        content.extend_from_slice(&[0u8; 32]);
        let detected = BuiltinParser.detect(&content, &MetadataMap::new());
        assert!(mime::is_legacy_office_type(&detected), "got {detected}");
    }

    #[test]
    fn test_detect_binary_defaults_to_octet_stream() {
        let content = [0u8, 1, 2, 3, 4, 5, 6, 7];
        assert_eq!(BuiltinParser.detect(&content, &MetadataMap::new()), OCTET_STREAM);
    }

    #[test]
    fn test_parse_plain_text() {
        let (result, metadata, text) = run(b"hello world\n", DetectionStrategy::Sniff, ContentSink::buffer(None));
        result.unwrap();
        assert_eq!(text, "hello world");
        assert_eq!(metadata.get(CONTENT_TYPE), Some("text/plain; charset=UTF-8"));
    }

    #[test]
    fn test_parse_unsupported_type_is_rejected() {
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        let (result, metadata, _) = run(&png, DetectionStrategy::Sniff, ContentSink::buffer(None));
        match result.unwrap_err() {
            ParseFault::Rejected { kind, .. } => assert_eq!(kind, crate::failure::FailureKind::UnsupportedType),
            other => panic!("unexpected fault: {other:?}"),
        }
        assert_eq!(metadata.get(CONTENT_TYPE), Some("image/png"));
    }

    #[test]
    fn test_declared_unsupported_type_is_reported_by_essence() {
        let (result, metadata, _) = run(
            b"\x00\x00\x00\x18ftypmp42",
            DetectionStrategy::Declared("Video/MP4; codecs=avc1".to_string()),
            ContentSink::buffer(None),
        );
        match result.unwrap_err() {
            ParseFault::Rejected { message, .. } => assert_eq!(message, "No parser available for video/mp4"),
            other => panic!("unexpected fault: {other:?}"),
        }
        assert_eq!(metadata.get(CONTENT_TYPE), Some("video/mp4"));
    }

    #[test]
    fn test_parse_legacy_office_is_legacy_format() {
        let mut content = OLE2_SIGNATURE.to_vec();
        content.extend_from_slice(&[0u8; 64]);
        let (result, _, _) = run(
            &content,
            DetectionStrategy::Declared("application/msword".to_string()),
            ContentSink::buffer(None),
        );
        assert!(matches!(result.unwrap_err(), ParseFault::LegacyFormat(_)));
    }

    #[test]
    fn test_declared_type_routes_parsing() {
        let (result, _, _) = run(
            b"just text",
            DetectionStrategy::Declared("video/mp4".to_string()),
            ContentSink::buffer(None),
        );
        assert!(matches!(result.unwrap_err(), ParseFault::Rejected { .. }));
    }

    #[test]
    fn test_looks_like_text() {
        assert!(looks_like_text(b""));
        assert!(looks_like_text("tab\tseparated\nlines ü".as_bytes()));
        assert!(!looks_like_text(b"bin\0ary"));
        assert!(!looks_like_text(&[1, 2, 3, 4, 5, 6]));
    }
}
