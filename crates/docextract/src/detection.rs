//! Per-request content-type detection strategy.

use crate::parser::DocumentParser;
use crate::types::MetadataMap;

/// Generic "unspecified binary" marker that never overrides sniffing.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// How the content type of a request's document is determined.
///
/// Resolved once per request from the declared `Content-Type` and handed to
/// the parser by value; it never changes while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionStrategy {
    /// Always report the client-declared type, ignoring the bytes.
    Declared(String),
    /// Delegate to the parser's own sniffing.
    Sniff,
}

impl DetectionStrategy {
    /// Build the strategy from an optional declared content type.
    pub fn resolve(declared: Option<&str>) -> Self {
        match declared.map(str::trim) {
            Some(content_type) if !content_type.is_empty() && !is_generic_binary(content_type) => {
                DetectionStrategy::Declared(content_type.to_string())
            }
            _ => DetectionStrategy::Sniff,
        }
    }

    /// Determine the content type of `content`.
    pub fn detect(&self, parser: &dyn DocumentParser, content: &[u8], metadata: &MetadataMap) -> String {
        match self {
            DetectionStrategy::Declared(content_type) => content_type.clone(),
            DetectionStrategy::Sniff => parser.detect(content, metadata),
        }
    }

    pub fn is_declared(&self) -> bool {
        matches!(self, DetectionStrategy::Declared(_))
    }
}

/// Whether `content_type` is `application/octet-stream`, ignoring case and parameters.
pub fn is_generic_binary(content_type: &str) -> bool {
    media_type_essence(content_type).eq_ignore_ascii_case(OCTET_STREAM)
}

/// `type/subtype` portion of a media type, without parameters.
pub fn media_type_essence(content_type: &str) -> &str {
    content_type.split(';').next().unwrap_or_default().trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseFault;
    use crate::parser::ContentSink;

    struct TextSniffer;

    impl DocumentParser for TextSniffer {
        fn detect(&self, _content: &[u8], _metadata: &MetadataMap) -> String {
            "text/plain".to_string()
        }

        fn parse(
            &self,
            _reader: &mut dyn std::io::Read,
            _sink: &mut ContentSink,
            _metadata: &mut MetadataMap,
            _detection: &DetectionStrategy,
        ) -> Result<(), ParseFault> {
            Ok(())
        }
    }

    #[test]
    fn test_absent_type_sniffs() {
        assert_eq!(DetectionStrategy::resolve(None), DetectionStrategy::Sniff);
        assert_eq!(DetectionStrategy::resolve(Some("  ")), DetectionStrategy::Sniff);
    }

    #[test]
    fn test_octet_stream_sniffs() {
        assert_eq!(
            DetectionStrategy::resolve(Some("application/octet-stream")),
            DetectionStrategy::Sniff
        );
        assert_eq!(
            DetectionStrategy::resolve(Some("Application/Octet-Stream; q=1")),
            DetectionStrategy::Sniff
        );
    }

    #[test]
    fn test_declared_type_wins_over_sniffing() {
        let strategy = DetectionStrategy::resolve(Some("application/pdf"));
        assert!(strategy.is_declared());

        let detected = strategy.detect(&TextSniffer, b"plain old text", &MetadataMap::new());
        assert_eq!(detected, "application/pdf");
    }

    #[test]
    fn test_sniff_delegates_to_parser() {
        let detected = DetectionStrategy::Sniff.detect(&TextSniffer, b"plain old text", &MetadataMap::new());
        assert_eq!(detected, "text/plain");
    }

    #[test]
    fn test_media_type_essence() {
        assert_eq!(media_type_essence("text/plain; charset=UTF-8"), "text/plain");
        assert_eq!(media_type_essence("application/pdf"), "application/pdf");
    }
}
