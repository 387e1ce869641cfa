//! Metadata to JSON serialization.
//!
//! The output is built by hand rather than through `serde` so that scalar
//! values which look like numbers can be emitted as JSON numbers, keys stay in
//! lexicographic order, and empty values disappear from the object.
//!
//! # Example
//!
//! ```rust
//! use docextract::{MetadataMap, serialize_metadata};
//!
//! let mut metadata = MetadataMap::new();
//! metadata.set("Author", "Jane");
//! metadata.set("Pages", "42");
//! metadata.set_values("Keywords", vec!["a".to_string(), "b".to_string()]);
//!
//! assert_eq!(
//!     serialize_metadata(&metadata),
//!     r#"{ "Author":"Jane", "Keywords":["a","b"], "Pages":42 }"#
//! );
//! ```

use serde::{Deserialize, Serialize};

use crate::types::{MetadataMap, MetadataValue};

/// Largest magnitude below which every integral `f64` is exact.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Separators used when deciding whether a scalar is numeric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberLocale {
    #[serde(default = "default_grouping_separator")]
    pub grouping_separator: char,
    #[serde(default = "default_decimal_separator")]
    pub decimal_separator: char,
}

fn default_grouping_separator() -> char {
    ','
}

fn default_decimal_separator() -> char {
    '.'
}

impl Default for NumberLocale {
    fn default() -> Self {
        Self {
            grouping_separator: default_grouping_separator(),
            decimal_separator: default_decimal_separator(),
        }
    }
}

impl NumberLocale {
    pub fn new(grouping_separator: char, decimal_separator: char) -> Self {
        Self {
            grouping_separator,
            decimal_separator,
        }
    }

    /// Parse `value` as a number, consuming the whole string.
    ///
    /// Returns the canonical JSON rendering (`"1,234"` becomes `1234`,
    /// `"2.50"` becomes `2.5`, `"1.5E3"` becomes `1500`) or `None` if any
    /// character is left unparsed. Exponents use an uppercase `E` with an
    /// optional `-`; `e`, `E+` and infinite results are not numbers.
    pub fn parse_number(&self, value: &str) -> Option<String> {
        let (negative, rest) = match value.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, value),
        };

        let (rest, exponent) = match rest.split_once('E') {
            Some((mantissa, exponent)) => {
                let digits = exponent.strip_prefix('-').unwrap_or(exponent);
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                (mantissa, Some(exponent))
            }
            None => (rest, None),
        };

        let (int_part, frac_part) = match rest.split_once(self.decimal_separator) {
            Some((int_part, frac_part)) => (int_part, Some(frac_part)),
            None => (rest, None),
        };

        let mut int_digits = String::with_capacity(int_part.len());
        if !int_part.is_empty() {
            for group in int_part.split(self.grouping_separator) {
                if group.is_empty() || !group.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                int_digits.push_str(group);
            }
        }

        let frac_digits = frac_part.unwrap_or("");
        if !frac_digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if int_digits.is_empty() && frac_digits.is_empty() {
            return None;
        }

        let sign = if negative { "-" } else { "" };

        if let Some(exponent) = exponent {
            let literal = format!(
                "{sign}{}.{}e{exponent}",
                if int_digits.is_empty() { "0" } else { int_digits.as_str() },
                if frac_digits.is_empty() { "0" } else { frac_digits }
            );
            let float = literal.parse::<f64>().ok().filter(|f| f.is_finite())?;
            if float.fract() == 0.0 && float.abs() < MAX_EXACT_INTEGER {
                return Some((float as i64).to_string());
            }
            return serde_json::Number::from_f64(float).map(|n| n.to_string());
        }

        if frac_digits.bytes().all(|b| b == b'0') {
            let digits = if int_digits.is_empty() { "0" } else { int_digits.as_str() };
            if let Ok(integer) = format!("{sign}{digits}").parse::<i64>() {
                return Some(integer.to_string());
            }
        }

        let literal = format!(
            "{sign}{}.{}",
            if int_digits.is_empty() { "0" } else { int_digits.as_str() },
            if frac_digits.is_empty() { "0" } else { frac_digits }
        );
        let float = literal.parse::<f64>().ok()?;
        serde_json::Number::from_f64(float).map(|n| n.to_string())
    }

    /// Whether `value` parses as a number with nothing left over.
    pub fn is_numeric(&self, value: &str) -> bool {
        self.parse_number(value).is_some()
    }
}

/// Renders metadata maps as JSON objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataSerializer {
    locale: NumberLocale,
}

impl MetadataSerializer {
    pub fn new(locale: NumberLocale) -> Self {
        Self { locale }
    }

    pub fn locale(&self) -> NumberLocale {
        self.locale
    }

    /// Serialize `metadata` into a JSON object string.
    pub fn serialize(&self, metadata: &MetadataMap) -> String {
        let mut out = String::from("{");
        let mut emitted = 0usize;

        for (name, value) in metadata.iter() {
            let Some(rendered) = self.render_value(value) else {
                continue;
            };

            if emitted > 0 {
                out.push(',');
            }
            out.push(' ');
            out.push_str(&serialize_scalar(name));
            out.push(':');
            out.push_str(&rendered);
            emitted += 1;
        }

        out.push_str(" }");
        out
    }

    /// Render a single entry, or `None` when it should be left out.
    fn render_value(&self, value: &MetadataValue) -> Option<String> {
        let rendered = match value {
            MetadataValue::Single(scalar) => {
                if scalar.trim().is_empty() {
                    return None;
                }
                self.render_scalar(scalar)
            }
            // Array elements are never treated as numbers.
            MetadataValue::Multi(values) => serde_json::Value::Array(
                values.iter().cloned().map(serde_json::Value::String).collect(),
            )
            .to_string(),
        };

        if rendered.trim().is_empty() {
            None
        } else {
            Some(rendered)
        }
    }

    fn render_scalar(&self, value: &str) -> String {
        self.locale
            .parse_number(value)
            .unwrap_or_else(|| serialize_scalar(value))
    }
}

/// Serialize `metadata` with the default number locale.
pub fn serialize_metadata(metadata: &MetadataMap) -> String {
    MetadataSerializer::default().serialize(metadata)
}

/// Render `value` as an escaped JSON string literal.
pub fn serialize_scalar(value: &str) -> String {
    serde_json::Value::String(value.to_owned()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> serde_json::Value {
        serde_json::from_str(json).expect("serializer output must be valid JSON")
    }

    #[test]
    fn test_scenario_mixed_values() {
        let mut metadata = MetadataMap::new();
        metadata.set("Author", "Jane");
        metadata.set("Pages", "42");
        metadata.set_values("Keywords", vec!["a".to_string(), "b".to_string()]);

        let json = serialize_metadata(&metadata);
        let author = json.find(r#""Author":"Jane""#).unwrap();
        let keywords = json.find(r#""Keywords":["a","b"]"#).unwrap();
        let pages = json.find(r#""Pages":42"#).unwrap();
        assert!(author < keywords && keywords < pages);
        assert!(parse(&json).is_object());
    }

    #[test]
    fn test_empty_value_is_omitted() {
        let mut metadata = MetadataMap::new();
        metadata.set("Title", "");
        assert_eq!(serialize_metadata(&metadata), "{ }");

        metadata.set("Subject", "   ");
        assert_eq!(serialize_metadata(&metadata), "{ }");
        assert_eq!(metadata.len(), 2, "suppression must not mutate the map");
    }

    #[test]
    fn test_no_trailing_comma_when_last_key_suppressed() {
        let mut metadata = MetadataMap::new();
        metadata.set("a", "1");
        metadata.set("z", "");
        let json = serialize_metadata(&metadata);
        assert_eq!(json, r#"{ "a":1 }"#);
        assert!(parse(&json).is_object());
    }

    #[test]
    fn test_numeric_inference() {
        let mut metadata = MetadataMap::new();
        metadata.set("int", "123");
        metadata.set("float", "3.14");
        metadata.set("grouped", "1,234");
        metadata.set("suffix", "123abc");
        metadata.set("negative", "-7");

        let value = parse(&serialize_metadata(&metadata));
        assert_eq!(value["int"], serde_json::json!(123));
        assert_eq!(value["float"], serde_json::json!(3.14));
        assert_eq!(value["grouped"], serde_json::json!(1234));
        assert_eq!(value["suffix"], serde_json::json!("123abc"));
        assert_eq!(value["negative"], serde_json::json!(-7));
    }

    #[test]
    fn test_multi_values_are_never_numbers() {
        let mut metadata = MetadataMap::new();
        metadata.set_values("pages", vec!["1".to_string(), "2".to_string()]);
        assert_eq!(serialize_metadata(&metadata), r#"{ "pages":["1","2"] }"#);
    }

    #[test]
    fn test_keys_strictly_ascending() {
        let mut metadata = MetadataMap::new();
        for key in ["zeta", "Alpha", "beta", "alpha", "_x"] {
            metadata.set(key, "v");
        }
        let json = serialize_metadata(&metadata);
        let value: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(value.len(), 5);

        let positions: Vec<usize> = ["Alpha", "_x", "alpha", "beta", "zeta"]
            .iter()
            .map(|k| json.find(&format!("\"{k}\"")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_serialization_is_idempotent() {
        let mut metadata = MetadataMap::new();
        metadata.set("Author", "Jane \"JD\" Doe");
        metadata.set("Pages", "42");
        metadata.add("Content-Type", "text/plain");
        metadata.add("Content-Type", "text/plain; charset=UTF-8");
        assert_eq!(serialize_metadata(&metadata), serialize_metadata(&metadata));
    }

    #[test]
    fn test_keys_and_values_are_escaped() {
        let mut metadata = MetadataMap::new();
        metadata.set("quote\"key", "line\nbreak");
        let value = parse(&serialize_metadata(&metadata));
        assert_eq!(value["quote\"key"], "line\nbreak");
    }

    #[test]
    fn test_parse_number_edge_cases() {
        let locale = NumberLocale::default();
        assert_eq!(locale.parse_number("42").as_deref(), Some("42"));
        assert_eq!(locale.parse_number("1.0").as_deref(), Some("1"));
        assert_eq!(locale.parse_number("2.50").as_deref(), Some("2.5"));
        assert_eq!(locale.parse_number(".5").as_deref(), Some("0.5"));
        assert_eq!(locale.parse_number("12,345,678").as_deref(), Some("12345678"));
        assert!(locale.parse_number("").is_none());
        assert!(locale.parse_number("-").is_none());
        assert!(locale.parse_number("42abc").is_none());
        assert!(locale.parse_number(" 42").is_none());
        assert!(locale.parse_number("1,").is_none());
        assert!(locale.parse_number("1.2.3").is_none());
        assert!(locale.parse_number("+5").is_none());
        assert!(locale.parse_number("1e5").is_none());
    }

    #[test]
    fn test_parse_number_uppercase_exponent() {
        let locale = NumberLocale::default();
        assert_eq!(locale.parse_number("1E5").as_deref(), Some("100000"));
        assert_eq!(locale.parse_number("-1.5E3").as_deref(), Some("-1500"));
        assert_eq!(locale.parse_number("25E-2").as_deref(), Some("0.25"));
        assert!(locale.parse_number("1E").is_none());
        assert!(locale.parse_number("1E+5").is_none());
        assert!(locale.parse_number("1E5E2").is_none());
        assert!(locale.parse_number("1E999").is_none());
    }

    #[test]
    fn test_parse_number_large_integer_falls_back_to_float() {
        let locale = NumberLocale::default();
        let rendered = locale.parse_number("123456789012345678901234").unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert!(value.is_f64());
    }

    #[test]
    fn test_german_locale() {
        let serializer = MetadataSerializer::new(NumberLocale::new('.', ','));
        let mut metadata = MetadataMap::new();
        metadata.set("amount", "1.234,5");
        metadata.set("english", "1,234.5");
        let value = parse(&serializer.serialize(&metadata));
        assert_eq!(value["amount"], serde_json::json!(1234.5));
        assert_eq!(value["english"], serde_json::json!("1,234.5"));
    }

    #[test]
    fn test_serialize_scalar_escapes() {
        assert_eq!(serialize_scalar("hello world"), r#""hello world""#);
        assert_eq!(serialize_scalar("a\"b\\c"), r#""a\"b\\c""#);
        assert_eq!(serialize_scalar(""), r#""""#);
    }
}
