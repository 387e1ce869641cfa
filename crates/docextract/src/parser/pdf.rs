//! PDF parsing backed by `lopdf`.

use lopdf::{Dictionary, Document, Object};

use crate::error::ParseFault;
use crate::types::MetadataMap;

use super::ContentSink;

const PDF_HEADER: &[u8] = b"%PDF-";
const TRAILER_KEYWORD: &[u8] = b"trailer";
const XREF_TYPE: &[u8] = b"/Type /XRef";
const ENCRYPT_KEY: &[u8] = b"/Encrypt";

/// Info dictionary entries and the metadata keys they are reported under.
const INFO_KEYS: &[(&[u8], &str)] = &[
    (b"Title", "title"),
    (b"Author", "Author"),
    (b"Subject", "subject"),
    (b"Keywords", "Keywords"),
    (b"Creator", "xmp:CreatorTool"),
    (b"Producer", "producer"),
    (b"CreationDate", "created"),
    (b"ModDate", "Last-Modified"),
];

pub(crate) fn parse_pdf(content: &[u8], sink: &mut ContentSink, metadata: &mut MetadataMap) -> Result<(), ParseFault> {
    if find(content, PDF_HEADER).is_none() {
        return Err(ParseFault::IllegalState("Missing %PDF- header".to_string()));
    }

    let document = Document::load_mem(content).map_err(|e| {
        if trailer_declares_encryption(content) {
            return ParseFault::Encrypted(format!("PDF is password-protected: {}", e));
        }
        match e {
            lopdf::Error::IO(io_err) => ParseFault::Io(io_err),
            other => ParseFault::IllegalState(format!("Invalid PDF: {}", other)),
        }
    })?;

    if document.trailer.has(b"Encrypt") {
        return Err(ParseFault::Encrypted("PDF is password-protected".to_string()));
    }

    let pages = document.get_pages();
    metadata.set("pdf:PDFVersion", document.version.clone());
    metadata.set("xmpTPg:NPages", pages.len().to_string());

    if let Some(info) = info_dictionary(&document) {
        for (pdf_key, metadata_key) in INFO_KEYS {
            let Some(value) = info.get(pdf_key).ok().and_then(|obj| text_value(&document, obj)) else {
                continue;
            };
            let value = if pdf_key.ends_with(b"Date") {
                normalize_date(&value)
            } else {
                value
            };
            metadata.set(*metadata_key, value);
        }
    }

    if sink.is_discarding() {
        return Ok(());
    }

    let page_numbers: Vec<u32> = pages.keys().copied().collect();
    let text = document
        .extract_text(&page_numbers)
        .map_err(|e| ParseFault::IllegalState(format!("Text extraction failed: {}", e)))?;

    sink.write_str(text.trim_end_matches(['\n', '\r']))
}

fn info_dictionary(document: &Document) -> Option<&Dictionary> {
    let info = document.trailer.get(b"Info").ok()?;
    let (_, resolved) = document.dereference(info).ok()?;
    resolved.as_dict().ok()
}

fn text_value(document: &Document, object: &Object) -> Option<String> {
    let (_, resolved) = document.dereference(object).ok()?;
    let bytes = resolved.as_str().ok()?;
    let decoded = decode_pdf_string(bytes);
    let trimmed = decoded.trim_end_matches('\0').trim();
    if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}

/// Text strings are UTF-16BE when they carry a byte order mark, otherwise
/// PDFDocEncoding, which agrees with Latin-1 for printable characters.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }

    bytes.iter().map(|&b| b as char).collect()
}

/// Convert `D:YYYYMMDDHHmmSS[Z|+HH'mm']` into ISO 8601, leaving anything
/// else untouched.
fn normalize_date(raw: &str) -> String {
    let value = raw.strip_prefix("D:").unwrap_or(raw);
    let digits: String = value.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.len() < 8 {
        return raw.to_string();
    }

    let part = |start: usize, default: &'static str| -> String {
        digits.get(start..start + 2).map(str::to_string).unwrap_or_else(|| default.to_string())
    };

    let mut iso = format!(
        "{}-{}-{}T{}:{}:{}",
        &digits[0..4],
        part(4, "01"),
        part(6, "01"),
        part(8, "00"),
        part(10, "00"),
        part(12, "00"),
    );

    let zone: Vec<char> = value[digits.len()..].chars().filter(|c| *c != '\'').collect();
    match zone.as_slice() {
        [] => {}
        ['Z', ..] => iso.push('Z'),
        [sign @ ('+' | '-'), h1, h2, m1, m2, ..] if [h1, h2, m1, m2].iter().all(|c| c.is_ascii_digit()) => {
            iso.extend([*sign, *h1, *h2, ':', *m1, *m2]);
        }
        [sign @ ('+' | '-'), h1, h2] if h1.is_ascii_digit() && h2.is_ascii_digit() => {
            iso.extend([*sign, *h1, *h2, ':', '0', '0']);
        }
        _ => return raw.to_string(),
    }

    iso
}

/// Whether a `trailer` dictionary or cross-reference stream dictionary in
/// the raw file carries an `/Encrypt` entry. Only consulted when lopdf can't
/// load the file, so text inside content streams never counts.
fn trailer_declares_encryption(content: &[u8]) -> bool {
    let mut offset = 0;
    while let Some(pos) = find(&content[offset..], TRAILER_KEYWORD) {
        let start = offset + pos + TRAILER_KEYWORD.len();
        let end = find(&content[start..], b">>").map_or(content.len(), |p| start + p);
        if find(&content[start..end], ENCRYPT_KEY).is_some() {
            return true;
        }
        offset = start;
    }

    let mut offset = 0;
    while let Some(pos) = find(&content[offset..], XREF_TYPE) {
        let at = offset + pos;
        let start = rfind(&content[..at], b"obj").map_or(0, |p| p + 3);
        let end = find(&content[at..], b"stream").map_or(content.len(), |p| at + p);
        if find(&content[start..end], ENCRYPT_KEY).is_some() {
            return true;
        }
        offset = at + XREF_TYPE.len();
    }

    false
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}

fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).rposition(|window| window == needle)
}
