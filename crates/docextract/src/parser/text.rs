//! Plain text family parsing.
//!
//! Decodes the raw bytes using, in order: the `charset` parameter of the
//! content type, a byte order mark, strict UTF-8, and finally `chardetng`
//! detection. The chosen encoding is recorded as `Content-Encoding`, which
//! later decides the response body charset.

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};

use crate::core::mime;
use crate::detection::media_type_essence;
use crate::error::ParseFault;
use crate::types::{CONTENT_ENCODING, MetadataMap};

use super::{ContentSink, record_content_type};

pub(crate) const LINE_COUNT: &str = "text:lineCount";
pub(crate) const WORD_COUNT: &str = "text:wordCount";
pub(crate) const CHARACTER_COUNT: &str = "text:characterCount";

pub(crate) fn parse_text(
    content: &[u8],
    content_type: &str,
    sink: &mut ContentSink,
    metadata: &mut MetadataMap,
) -> Result<(), ParseFault> {
    let encoding = detect_encoding(content, mime::charset_param(content_type));
    let (decoded, _, had_errors) = encoding.decode(content);
    if had_errors {
        tracing::debug!(encoding = encoding.name(), "Replaced malformed sequences while decoding");
    }

    let essence = media_type_essence(content_type).to_ascii_lowercase();
    metadata.set(CONTENT_ENCODING, encoding.name());
    record_content_type(metadata, &format!("{}; charset={}", essence, encoding.name()));

    let mut line_count = 0usize;
    let mut word_count = 0usize;
    for line in decoded.lines() {
        line_count += 1;
        word_count += line.split_whitespace().count();
    }
    metadata.set(LINE_COUNT, line_count.to_string());
    metadata.set(WORD_COUNT, word_count.to_string());
    metadata.set(CHARACTER_COUNT, decoded.chars().count().to_string());

    if sink.is_discarding() {
        return Ok(());
    }

    let body = decoded.trim_start_matches('\u{FEFF}').trim_end_matches(['\n', '\r']);
    sink.write_str(body)
}

fn detect_encoding(content: &[u8], declared_charset: Option<&str>) -> &'static Encoding {
    if let Some(label) = declared_charset
        && let Some(encoding) = Encoding::for_label(label.as_bytes())
    {
        return encoding;
    }

    if let Some((encoding, _)) = Encoding::for_bom(content) {
        return encoding;
    }

    if std::str::from_utf8(content).is_ok() {
        return UTF_8;
    }

    let mut detector = EncodingDetector::new();
    detector.feed(content, true);
    detector.guess(None, true)
}
