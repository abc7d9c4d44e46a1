//! Body classification.
//!
//! # Precedence
//! 1. Form content types (`application/x-www-form-urlencoded`,
//!    `multipart/form-data`) are decoded into `form` (and `files` for
//!    multipart). The payload is consumed by the form decoder, so `json` and
//!    `raw` stay unset.
//! 2. Otherwise a JSON decode is attempted regardless of the declared type.
//! 3. On JSON failure the body becomes `raw` text, lossily decoded. A body
//!    that is declared non-textual and is not valid UTF-8 is reported as an
//!    opaque `[Binary data: N bytes]` marker instead.
//!
//! Every step is best-effort. Malformed input degrades to an absent or empty
//! field; classification never fails.

use std::borrow::Cow;

use mime::Mime;
use serde::Serialize;
use url::form_urlencoded;

use crate::capture::fields::FieldMap;

/// Classified interpretation(s) of a request body.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BodyView {
    pub json: Option<serde_json::Value>,
    pub raw: Option<String>,
    pub form: Option<FieldMap>,
    pub files: Option<FieldMap>,
    /// Set when `raw` contains U+FFFD replacements for invalid UTF-8.
    #[serde(skip)]
    pub raw_lossy: bool,
}

impl BodyView {
    /// A multipart body without file parts reports as [`BodyKind::Form`].
    pub fn kind(&self) -> BodyKind {
        if self.files.is_some() {
            BodyKind::Multipart
        } else if self.form.is_some() {
            BodyKind::Form
        } else if self.json.is_some() {
            BodyKind::Json
        } else if self.raw.as_deref().is_some_and(is_binary_marker) {
            BodyKind::Binary
        } else if self.raw.is_some() {
            BodyKind::Text
        } else {
            BodyKind::Empty
        }
    }
}

/// Coarse label of how a body was interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Empty,
    Json,
    Text,
    Binary,
    Form,
    Multipart,
}

impl BodyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BodyKind::Empty => "empty",
            BodyKind::Json => "json",
            BodyKind::Text => "text",
            BodyKind::Binary => "binary",
            BodyKind::Form => "form",
            BodyKind::Multipart => "multipart",
        }
    }
}

/// Placeholder used in place of bodies that are not valid UTF-8.
pub fn binary_marker(len: usize) -> String {
    format!("[Binary data: {} bytes]", len)
}

fn is_binary_marker(raw: &str) -> bool {
    raw.starts_with("[Binary data: ") && raw.ends_with(" bytes]")
}

/// Classify `raw_body` according to `content_type`.
pub fn classify(raw_body: &[u8], content_type: Option<&str>) -> BodyView {
    if raw_body.is_empty() {
        return BodyView::default();
    }

    let mime = content_type.and_then(|ct| ct.trim().parse::<Mime>().ok());

    if let Some(m) = &mime {
        if m.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str() {
            return BodyView {
                form: Some(parse_urlencoded(raw_body)),
                ..BodyView::default()
            };
        }
        if m.essence_str() == mime::MULTIPART_FORM_DATA.essence_str() {
            let (form, files) = match m.get_param(mime::BOUNDARY) {
                Some(boundary) => parse_multipart(raw_body, boundary.as_str().trim_matches('"')),
                None => {
                    tracing::debug!("multipart body without boundary parameter");
                    (FieldMap::new(), FieldMap::new())
                }
            };
            return BodyView {
                form: Some(form),
                files: (!files.is_empty()).then_some(files),
                ..BodyView::default()
            };
        }
    }

    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(raw_body) {
        return BodyView {
            json: Some(value),
            ..BodyView::default()
        };
    }

    let declared_binary = content_type.is_some() && !mime.as_ref().is_some_and(is_textual);
    if declared_binary && std::str::from_utf8(raw_body).is_err() {
        return BodyView {
            raw: Some(binary_marker(raw_body.len())),
            ..BodyView::default()
        };
    }

    let (raw, raw_lossy) = decode_lossy(raw_body);
    BodyView {
        raw: Some(raw),
        raw_lossy,
        ..BodyView::default()
    }
}

/// Whether the declared media type is human-readable text.
pub fn is_textual(m: &Mime) -> bool {
    if m.type_() == mime::TEXT {
        return true;
    }
    if let Some(suffix) = m.suffix() {
        if suffix == mime::JSON || suffix == mime::XML {
            return true;
        }
    }
    m.type_() == mime::APPLICATION
        && matches!(
            m.subtype().as_str(),
            "json" | "xml" | "javascript" | "x-www-form-urlencoded" | "graphql" | "x-ndjson"
        )
}

/// Whether the declared media type is JSON (`application/json` or `*/*+json`).
pub fn is_json(m: &Mime) -> bool {
    (m.type_() == mime::APPLICATION && m.subtype() == mime::JSON)
        || m.suffix().is_some_and(|s| s == mime::JSON)
}

/// UTF-8 decode with U+FFFD replacement; the flag reports whether any
/// replacement happened.
pub fn decode_lossy(bytes: &[u8]) -> (String, bool) {
    match String::from_utf8_lossy(bytes) {
        Cow::Borrowed(text) => (text.to_string(), false),
        Cow::Owned(text) => (text, true),
    }
}

fn parse_urlencoded(body: &[u8]) -> FieldMap {
    form_urlencoded::parse(body).into_owned().collect()
}

/// Split a multipart body into text fields and file names.
///
/// A delimiter only counts at the start of the body or at the start of a
/// line, so part content may contain the boundary text mid-line. Parts that
/// cannot be parsed are skipped; a body without any recognizable delimiter
/// yields empty maps.
fn parse_multipart(body: &[u8], boundary: &str) -> (FieldMap, FieldMap) {
    let mut form = FieldMap::new();
    let mut files = FieldMap::new();

    let line_delimiter = format!("\n--{}", boundary);
    let line_delimiter = line_delimiter.as_bytes();
    let delimiter = &line_delimiter[1..];

    let first = if body.starts_with(delimiter) {
        0
    } else {
        match find(body, line_delimiter) {
            Some(at) => at + 1,
            None => return (form, files),
        }
    };
    let mut cursor = first + delimiter.len();

    loop {
        let rest = &body[cursor..];
        if rest.starts_with(b"--") {
            break;
        }
        let rest = rest
            .strip_prefix(b"\r\n")
            .or_else(|| rest.strip_prefix(b"\n"))
            .unwrap_or(rest);
        let part_start = body.len() - rest.len();

        let Some(next) = find(rest, line_delimiter) else {
            break;
        };
        let part = trim_line_end(&rest[..=next]);
        cursor = part_start + next + line_delimiter.len();

        if let Some(field) = parse_part(part) {
            match field.filename {
                Some(filename) => files.insert(field.name, filename),
                None => form.insert(field.name, decode_lossy(field.content).0),
            }
        }
    }

    (form, files)
}

struct MultipartField<'a> {
    name: String,
    filename: Option<String>,
    content: &'a [u8],
}

fn parse_part(part: &[u8]) -> Option<MultipartField<'_>> {
    let mut headers = [httparse::EMPTY_HEADER; 16];
    let (offset, headers) = match httparse::parse_headers(part, &mut headers) {
        Ok(httparse::Status::Complete((offset, headers))) => (offset, headers),
        Ok(httparse::Status::Partial) | Err(_) => return None,
    };

    let disposition = headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case("content-disposition"))
        .map(|h| String::from_utf8_lossy(h.value).into_owned())?;

    let mut name = None;
    let mut filename = None;
    for (key, value) in disposition_params(&disposition) {
        match key.to_ascii_lowercase().as_str() {
            "name" => name = Some(value),
            "filename" => filename = Some(value),
            _ => {}
        }
    }

    Some(MultipartField {
        name: name?,
        filename,
        content: &part[offset..],
    })
}

/// Parse `form-data; name="a"; filename="b"` parameters, honouring quotes.
fn disposition_params(value: &str) -> Vec<(String, String)> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    for c in value.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                current.push(c);
            }
            ';' if !quoted => segments.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    segments.push(current);

    segments
        .iter()
        .skip(1)
        .filter_map(|segment| {
            let (key, value) = segment.split_once('=')?;
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            Some((key.trim().to_string(), value.to_string()))
        })
        .collect()
}

fn trim_line_end(part: &[u8]) -> &[u8] {
    part.strip_suffix(b"\r\n")
        .or_else(|| part.strip_suffix(b"\n"))
        .unwrap_or(part)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    const BOUNDARY: &str = "----inspector1234";

    fn json_value() -> impl Strategy<Value = serde_json::Value> {
        let leaf = prop_oneof![
            Just(serde_json::Value::Null),
            any::<bool>().prop_map(serde_json::Value::Bool),
            any::<i64>().prop_map(serde_json::Value::from),
            "[a-zA-Z0-9 \"\\\\]{0,16}".prop_map(serde_json::Value::from),
        ];
        leaf.prop_recursive(3, 32, 4, |inner| {
            prop_oneof![
                proptest::collection::vec(inner.clone(), 0..4).prop_map(serde_json::Value::Array),
                proptest::collection::btree_map("[a-z]{1,8}", inner, 0..4)
                    .prop_map(|m| serde_json::Value::Object(m.into_iter().collect())),
            ]
        })
    }

    fn multipart_body() -> Vec<u8> {
        format!(
            "--{b}\r\n\
             Content-Disposition: form-data; name=\"name\"\r\n\
             \r\n\
             foo\r\n\
             --{b}\r\n\
             Content-Disposition: form-data; name=\"upload\"; filename=\"x.png\"\r\n\
             Content-Type: image/png\r\n\
             \r\n\
             \u{89}PNG\r\n\
             --{b}--\r\n",
            b = BOUNDARY
        )
        .into_bytes()
    }

    #[test]
    fn test_empty_body_leaves_everything_unset() {
        let view = classify(b"", Some("application/json"));
        assert_eq!(view, BodyView::default());
        assert_eq!(view.kind(), BodyKind::Empty);
    }

    #[test]
    fn test_json_body() {
        let view = classify(br#"{"a":1}"#, Some("application/json"));
        assert_eq!(view.json, Some(json!({"a": 1})));
        assert!(view.raw.is_none());
        assert_eq!(view.kind(), BodyKind::Json);
    }

    #[test]
    fn test_json_decoded_regardless_of_declared_type() {
        let view = classify(b"[1,2,3]", Some("text/plain"));
        assert_eq!(view.json, Some(json!([1, 2, 3])));
    }

    #[test]
    fn test_malformed_json_falls_back_to_raw() {
        let view = classify(br#"{"a":"#, Some("application/json"));
        assert!(view.json.is_none());
        assert_eq!(view.raw.as_deref(), Some(r#"{"a":"#));
        assert!(!view.raw_lossy);
        assert_eq!(view.kind(), BodyKind::Text);
    }

    #[test]
    fn test_invalid_utf8_without_declared_type_is_lossy_text() {
        let view = classify(&[b'o', b'k', 0xff, 0xfe], None);
        let raw = view.raw.unwrap();
        assert!(raw.starts_with("ok"));
        assert!(raw.contains('\u{FFFD}'));
        assert!(view.raw_lossy);
    }

    #[test]
    fn test_binary_declared_body_becomes_marker() {
        let bytes = [0x89, b'P', b'N', b'G', 0x00, 0xff];
        let view = classify(&bytes, Some("application/octet-stream"));
        assert_eq!(view.raw.as_deref(), Some("[Binary data: 6 bytes]"));
        assert!(view.json.is_none());
        assert_eq!(view.kind(), BodyKind::Binary);
    }

    #[test]
    fn test_binary_declared_but_valid_utf8_is_shown_as_text() {
        let view = classify(b"hello", Some("application/octet-stream"));
        assert_eq!(view.raw.as_deref(), Some("hello"));
    }

    #[test]
    fn test_urlencoded_form() {
        let view = classify(
            b"name=foo&tags=a&tags=b&space=a+b%21",
            Some("application/x-www-form-urlencoded"),
        );
        let form = view.form.unwrap();
        assert_eq!(form.get("name"), Some("foo"));
        assert_eq!(form.get("tags"), Some("b"));
        assert_eq!(form.get("space"), Some("a b!"));
        assert!(view.files.is_none());
        assert!(view.json.is_none());
        assert!(view.raw.is_none());
    }

    #[test]
    fn test_multipart_text_field_and_file() {
        let content_type = format!("multipart/form-data; boundary={}", BOUNDARY);
        let view = classify(&multipart_body(), Some(&content_type));

        let form = view.form.clone().unwrap();
        let files = view.files.clone().unwrap();
        assert_eq!(form.len(), 1);
        assert_eq!(form.get("name"), Some("foo"));
        assert_eq!(files.len(), 1);
        assert_eq!(files.get("upload"), Some("x.png"));
        assert!(view.json.is_none());
        assert!(view.raw.is_none());
        assert_eq!(view.kind(), BodyKind::Multipart);
    }

    #[test]
    fn test_multipart_quoted_boundary_and_semicolon_in_filename() {
        let body = "--abc\r\n\
                    Content-Disposition: form-data; name=\"doc\"; filename=\"a;b.txt\"\r\n\
                    \r\n\
                    data\r\n\
                    --abc--\r\n";
        let view = classify(body.as_bytes(), Some("multipart/form-data; boundary=\"abc\""));
        assert_eq!(view.files.unwrap().get("doc"), Some("a;b.txt"));
        assert!(view.form.unwrap().is_empty());
    }

    #[test]
    fn test_multipart_boundary_text_inside_value_is_kept() {
        let body = b"--b\r\n\
Content-Disposition: form-data; name=\"a\"\r\n\
\r\n\
x--by\r\n\
--b\r\n\
Content-Disposition: form-data; name=\"c\"\r\n\
\r\n\
tail --b\r\n\
--b--\r\n";
        let view = classify(body, Some("multipart/form-data; boundary=b"));
        let form = view.form.unwrap();
        assert_eq!(form.get("a"), Some("x--by"));
        assert_eq!(form.get("c"), Some("tail --b"));
        assert_eq!(view.files, None);
    }

    #[test]
    fn test_multipart_garbage_yields_empty_maps() {
        let view = classify(b"not multipart at all", Some("multipart/form-data; boundary=zzz"));
        assert_eq!(view.form, Some(FieldMap::new()));
        assert_eq!(view.files, None);

        let view = classify(b"--zzz\r\nbroken", Some("multipart/form-data"));
        assert_eq!(view.form, Some(FieldMap::new()));
    }

    #[test]
    fn test_json_detection() {
        let cases = [
            ("application/json", true),
            ("application/json; charset=utf-8", true),
            ("application/vnd.api+json", true),
            ("text/json", false),
            ("text/plain", false),
        ];
        for (ct, expected) in cases {
            let m: Mime = ct.parse().unwrap();
            assert_eq!(is_json(&m), expected, "{}", ct);
        }
    }

    proptest! {
        #[test]
        fn prop_lossy_decode_never_fails(bytes in proptest::collection::vec(any::<u8>(), 1..256)) {
            let view = classify(&bytes, None);
            prop_assert!(view.json.is_some() || view.raw.is_some());
            if let Some(raw) = view.raw {
                let valid = std::str::from_utf8(&bytes).is_ok();
                prop_assert_eq!(view.raw_lossy, !valid);
                if !valid {
                    prop_assert!(raw.contains(char::REPLACEMENT_CHARACTER));
                    // Replacement never drops input: each invalid run of at
                    // most three bytes becomes one three-byte U+FFFD.
                    prop_assert!(raw.len() >= bytes.len());
                    prop_assert!(raw.chars().count() <= bytes.len());
                    let valid_up_to = std::str::from_utf8(&bytes)
                        .map_err(|e| e.valid_up_to())
                        .unwrap_err();
                    prop_assert!(raw.as_bytes().starts_with(&bytes[..valid_up_to]));
                }
            }
        }

        #[test]
        fn prop_json_bodies_decode_to_the_same_value(value in json_value()) {
            let bytes = serde_json::to_vec(&value).unwrap();
            let view = classify(&bytes, Some("application/json"));
            prop_assert_eq!(view.json, Some(value));
            prop_assert!(view.raw.is_none());
        }

        #[test]
        fn prop_text_bodies_round_trip_as_raw(text in "x[a-zA-Z ]{0,63}") {
            let view = classify(text.as_bytes(), Some("text/plain"));
            prop_assert!(view.json.is_none());
            prop_assert_eq!(view.raw.as_deref(), Some(text.as_str()));
        }
    }
}
