//! MIME type constants and name-based lookup.
//!
//! Byte sniffing lives in the built-in parser; this module only covers the
//! tables used when a client supplies a file name, plus classification helpers.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::Path;

pub const HTML_MIME_TYPE: &str = "text/html";
pub const MARKDOWN_MIME_TYPE: &str = "text/markdown";
pub const PDF_MIME_TYPE: &str = "application/pdf";
pub const PLAIN_TEXT_MIME_TYPE: &str = "text/plain";
pub const JSON_MIME_TYPE: &str = "application/json";
pub const YAML_MIME_TYPE: &str = "application/x-yaml";
pub const TOML_MIME_TYPE: &str = "application/toml";
pub const XML_MIME_TYPE: &str = "application/xml";
pub const SVG_MIME_TYPE: &str = "image/svg+xml";

pub const LEGACY_WORD_MIME_TYPE: &str = "application/msword";
pub const LEGACY_EXCEL_MIME_TYPE: &str = "application/vnd.ms-excel";
pub const LEGACY_POWERPOINT_MIME_TYPE: &str = "application/vnd.ms-powerpoint";
pub const LEGACY_OUTLOOK_MIME_TYPE: &str = "application/vnd.ms-outlook";
/// Generic OLE2 compound document whose application could not be identified.
pub const OLE2_MIME_TYPE: &str = "application/x-tika-msoffice";

/// Extension to MIME type mapping, consulted before `mime_guess`.
static EXT_TO_MIME: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();

    m.insert("txt", PLAIN_TEXT_MIME_TYPE);
    m.insert("text", PLAIN_TEXT_MIME_TYPE);
    m.insert("log", PLAIN_TEXT_MIME_TYPE);
    m.insert("md", MARKDOWN_MIME_TYPE);
    m.insert("markdown", MARKDOWN_MIME_TYPE);
    m.insert("html", HTML_MIME_TYPE);
    m.insert("htm", HTML_MIME_TYPE);
    m.insert("csv", "text/csv");
    m.insert("tsv", "text/tab-separated-values");
    m.insert("rst", "text/x-rst");
    m.insert("org", "text/x-org");

    m.insert("json", JSON_MIME_TYPE);
    m.insert("yaml", YAML_MIME_TYPE);
    m.insert("yml", YAML_MIME_TYPE);
    m.insert("toml", TOML_MIME_TYPE);
    m.insert("xml", XML_MIME_TYPE);
    m.insert("svg", SVG_MIME_TYPE);

    m.insert("pdf", PDF_MIME_TYPE);

    m.insert("doc", LEGACY_WORD_MIME_TYPE);
    m.insert("dot", LEGACY_WORD_MIME_TYPE);
    m.insert("xls", LEGACY_EXCEL_MIME_TYPE);
    m.insert("xlt", LEGACY_EXCEL_MIME_TYPE);
    m.insert("ppt", LEGACY_POWERPOINT_MIME_TYPE);
    m.insert("pps", LEGACY_POWERPOINT_MIME_TYPE);
    m.insert("msg", LEGACY_OUTLOOK_MIME_TYPE);

    m
});

/// Look up a MIME type from a file name's extension.
pub fn mime_from_name(name: &str) -> Option<String> {
    let extension = Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())?;

    if let Some(mime_type) = EXT_TO_MIME.get(extension.as_str()) {
        return Some(mime_type.to_string());
    }

    mime_guess::from_ext(&extension).first().map(|mime| mime.to_string())
}

/// Whether the built-in text parser handles `essence` (a parameter-free media type).
pub fn is_text_type(essence: &str) -> bool {
    essence.starts_with("text/")
        || matches!(
            essence,
            JSON_MIME_TYPE
                | YAML_MIME_TYPE
                | "application/yaml"
                | TOML_MIME_TYPE
                | XML_MIME_TYPE
                | SVG_MIME_TYPE
                | "application/javascript"
                | "application/x-sh"
        )
}

/// Whether `essence` names an OLE2-era binary Office format.
pub fn is_legacy_office_type(essence: &str) -> bool {
    matches!(
        essence,
        LEGACY_WORD_MIME_TYPE
            | LEGACY_EXCEL_MIME_TYPE
            | LEGACY_POWERPOINT_MIME_TYPE
            | LEGACY_OUTLOOK_MIME_TYPE
            | OLE2_MIME_TYPE
    )
}

/// Value of the `charset` parameter of a media type, if present.
pub fn charset_param(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if name.trim().eq_ignore_ascii_case("charset") {
            Some(value.trim().trim_matches('"'))
        } else {
            None
        }
    })
}
