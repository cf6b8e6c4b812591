//! # JSON Pointer — Location Newtype
//!
//! `JsonPointer` locates a value inside a JSON document, for both schema
//! locations (`#/properties/name`) and data locations (`#/items/0`). The
//! textual form always carries the leading `#`, so a pointer printed in an
//! error report doubles as a URI fragment.
//!
//! Segment escaping follows RFC 6901: `~` becomes `~0` and `/` becomes `~1`.
//! URI fragments are percent-decoded before parsing.

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SchemataError;

/// A JSON Pointer in `#`-prefixed fragment form.
///
/// # Invariants
///
/// - The inner string is `#` or starts with `#/`.
/// - Every segment is escaped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JsonPointer(String);

impl JsonPointer {
    /// The pointer to the document root: `#`.
    pub fn root() -> Self {
        Self("#".to_string())
    }

    /// Parse a pointer from `#`, `#/a/b`, `/a/b` or the empty string.
    ///
    /// # Errors
    ///
    /// Returns `SchemataError::InvalidPointer` if the text is neither empty
    /// nor starts with `/` after an optional `#`, or contains a dangling `~`.
    pub fn parse(text: &str) -> Result<Self, SchemataError> {
        let body = text.strip_prefix('#').unwrap_or(text);
        if body.is_empty() {
            return Ok(Self::root());
        }
        if !body.starts_with('/') {
            return Err(SchemataError::InvalidPointer {
                pointer: text.to_string(),
                reason: "must be empty or start with '/'".to_string(),
            });
        }
        for segment in body[1..].split('/') {
            validate_escapes(segment).map_err(|reason| SchemataError::InvalidPointer {
                pointer: text.to_string(),
                reason,
            })?;
        }
        Ok(Self(format!("#{body}")))
    }

    /// Parse a percent-encoded URI fragment (without the leading `#`).
    ///
    /// # Errors
    ///
    /// Returns `SchemataError::InvalidPointer` if the decoded fragment is not
    /// a JSON pointer.
    pub fn from_fragment(fragment: &str) -> Result<Self, SchemataError> {
        let decoded = percent_decode_str(fragment).decode_utf8_lossy();
        Self::parse(&decoded)
    }

    /// Append an object key segment.
    pub fn join(&self, segment: &str) -> Self {
        let escaped = segment.replace('~', "~0").replace('/', "~1");
        Self(format!("{}/{escaped}", self.0))
    }

    /// Append an array index segment.
    pub fn join_index(&self, index: usize) -> Self {
        Self(format!("{}/{index}", self.0))
    }

    /// Append several already-unescaped segments.
    pub fn join_all<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Self {
        segments
            .into_iter()
            .fold(self.clone(), |pointer, segment| pointer.join(segment))
    }

    /// Returns true for `#`.
    pub fn is_root(&self) -> bool {
        self.0 == "#"
    }

    /// The unescaped segments, outermost first.
    pub fn segments(&self) -> Vec<String> {
        if self.is_root() {
            return Vec::new();
        }
        self.0[2..]
            .split('/')
            .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
            .collect()
    }

    /// The pointer one level up, or `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        let cut = self.0.rfind('/')?;
        if cut <= 1 {
            Some(Self::root())
        } else {
            Some(Self(self.0[..cut].to_string()))
        }
    }

    /// The last unescaped segment, or `None` at the root.
    pub fn last_segment(&self) -> Option<String> {
        self.segments().pop()
    }

    /// Resolve this pointer inside `value`.
    pub fn resolve<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        self.segments()
            .iter()
            .try_fold(value, |current, segment| match current {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => parse_index(segment).and_then(|i| items.get(i)),
                _ => None,
            })
    }

    /// The pointer text, including the leading `#`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The pointer text without the leading `#` (RFC 6901 string form).
    pub fn as_rfc6901(&self) -> &str {
        &self.0[1..]
    }
}

impl Default for JsonPointer {
    fn default() -> Self {
        Self::root()
    }
}

impl std::fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for JsonPointer {
    type Error = SchemataError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<JsonPointer> for String {
    fn from(pointer: JsonPointer) -> Self {
        pointer.0
    }
}

/// Array indices are plain decimal without leading zeros.
fn parse_index(segment: &str) -> Option<usize> {
    if segment.len() > 1 && segment.starts_with('0') {
        return None;
    }
    segment.parse().ok()
}

fn validate_escapes(segment: &str) -> Result<(), String> {
    let mut chars = segment.chars();
    while let Some(c) = chars.next() {
        if c == '~' && !matches!(chars.next(), Some('0') | Some('1')) {
            return Err(format!("dangling '~' in segment {segment:?}"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_root_forms() {
        assert!(JsonPointer::parse("").unwrap().is_root());
        assert!(JsonPointer::parse("#").unwrap().is_root());
        assert_eq!(JsonPointer::root().as_str(), "#");
    }

    #[test]
    fn test_parse_with_and_without_hash() {
        assert_eq!(JsonPointer::parse("/a/b").unwrap().as_str(), "#/a/b");
        assert_eq!(JsonPointer::parse("#/a/b").unwrap().as_str(), "#/a/b");
    }

    #[test]
    fn test_parse_rejects_relative() {
        assert!(JsonPointer::parse("a/b").is_err());
        assert!(JsonPointer::parse("#a").is_err());
    }

    #[test]
    fn test_parse_rejects_dangling_tilde() {
        assert!(JsonPointer::parse("/a~2").is_err());
        assert!(JsonPointer::parse("/a~").is_err());
    }

    #[test]
    fn test_join_escapes_segments() {
        let pointer = JsonPointer::root().join("a/b").join("c~d");
        assert_eq!(pointer.as_str(), "#/a~1b/c~0d");
        assert_eq!(pointer.segments(), vec!["a/b".to_string(), "c~d".to_string()]);
    }

    #[test]
    fn test_join_index() {
        assert_eq!(JsonPointer::root().join("items").join_index(3).as_str(), "#/items/3");
    }

    #[test]
    fn test_parent() {
        let pointer = JsonPointer::parse("#/a/b").unwrap();
        assert_eq!(pointer.parent().unwrap().as_str(), "#/a");
        assert!(pointer.parent().unwrap().parent().unwrap().is_root());
        assert!(JsonPointer::root().parent().is_none());
    }

    #[test]
    fn test_resolve() {
        let doc = json!({"definitions": {"a/b": {"type": "string"}}, "list": [1, {"x": 2}]});
        let pointer = JsonPointer::parse("#/definitions/a~1b/type").unwrap();
        assert_eq!(pointer.resolve(&doc), Some(&json!("string")));
        let pointer = JsonPointer::parse("#/list/1/x").unwrap();
        assert_eq!(pointer.resolve(&doc), Some(&json!(2)));
        assert!(JsonPointer::parse("#/list/01").unwrap().resolve(&doc).is_none());
        assert!(JsonPointer::parse("#/missing").unwrap().resolve(&doc).is_none());
    }

    #[test]
    fn test_from_fragment_percent_decodes() {
        let pointer = JsonPointer::from_fragment("/definitions/percent%25field").unwrap();
        assert_eq!(pointer.segments(), vec!["definitions", "percent%field"]);
    }

    #[test]
    fn test_serde_roundtrip() {
        let pointer = JsonPointer::parse("#/a/0").unwrap();
        let json = serde_json::to_string(&pointer).unwrap();
        assert_eq!(json, "\"#/a/0\"");
        let back: JsonPointer = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pointer);
    }
}
