//! # JSON Schema Drafts — Single Source of Truth
//!
//! Defines the `Draft` enum with every supported dialect. This is the ONE
//! definition used across the engine. Every `match` on `Draft` must be
//! exhaustive, so adding a dialect forces every consumer to decide how
//! it behaves.
//!
//! Drafts are ordered: `Draft4 < Draft6 < Draft7 < Draft2019_09 <
//! Draft2020_12`, so "draft ≥ 2019-09" checks read as comparisons.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::SchemataError;

/// All JSON Schema dialects understood by the engine.
///
/// | Draft | `$schema` URI | `$ref` beside siblings |
/// |-------|---------------|------------------------|
/// | 4 | `http://json-schema.org/draft-04/schema#` | replaces |
/// | 6 | `http://json-schema.org/draft-06/schema#` | replaces |
/// | 7 | `http://json-schema.org/draft-07/schema#` | replaces |
/// | 2019-09 | `https://json-schema.org/draft/2019-09/schema` | merges |
/// | 2020-12 | `https://json-schema.org/draft/2020-12/schema` | merges |
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Draft {
    /// Draft 4 (`id`, boolean `exclusiveMaximum`).
    #[serde(rename = "draft4")]
    Draft4,
    /// Draft 6 (`$id`, `const`, `contains`, `propertyNames`).
    #[serde(rename = "draft6")]
    Draft6,
    /// Draft 7 (`if`/`then`/`else`).
    #[serde(rename = "draft7")]
    Draft7,
    /// Draft 2019-09 (`$anchor`, `$recursiveRef`, `unevaluated*`).
    #[serde(rename = "2019-09")]
    Draft2019_09,
    /// Draft 2020-12 (`prefixItems`, `$dynamicRef`).
    #[serde(rename = "2020-12")]
    Draft2020_12,
}

/// Total number of supported drafts.
pub const DRAFT_COUNT: usize = 5;

impl Draft {
    /// Returns all drafts, oldest first.
    pub fn all_drafts() -> &'static [Draft] {
        &[
            Self::Draft4,
            Self::Draft6,
            Self::Draft7,
            Self::Draft2019_09,
            Self::Draft2020_12,
        ]
    }

    /// Returns the short identifier used in configuration and serde.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft4 => "draft4",
            Self::Draft6 => "draft6",
            Self::Draft7 => "draft7",
            Self::Draft2019_09 => "2019-09",
            Self::Draft2020_12 => "2020-12",
        }
    }

    /// Returns the canonical meta-schema URI for this draft.
    pub fn meta_schema_uri(&self) -> &'static str {
        match self {
            Self::Draft4 => "http://json-schema.org/draft-04/schema#",
            Self::Draft6 => "http://json-schema.org/draft-06/schema#",
            Self::Draft7 => "http://json-schema.org/draft-07/schema#",
            Self::Draft2019_09 => "https://json-schema.org/draft/2019-09/schema",
            Self::Draft2020_12 => "https://json-schema.org/draft/2020-12/schema",
        }
    }

    /// Detect the draft declared by a `$schema` URI.
    ///
    /// Scheme (`http`/`https`) and a trailing `#` are ignored.
    pub fn from_schema_uri(uri: &str) -> Option<Self> {
        let trimmed = uri.trim().trim_end_matches('#');
        let without_scheme = trimmed
            .strip_prefix("https://")
            .or_else(|| trimmed.strip_prefix("http://"))
            .unwrap_or(trimmed);
        match without_scheme {
            "json-schema.org/draft-04/schema" => Some(Self::Draft4),
            "json-schema.org/draft-06/schema" => Some(Self::Draft6),
            "json-schema.org/draft-07/schema" => Some(Self::Draft7),
            "json-schema.org/draft/2019-09/schema" => Some(Self::Draft2019_09),
            "json-schema.org/draft/2020-12/schema" => Some(Self::Draft2020_12),
            _ => None,
        }
    }

    /// Whether `$ref` merges with its sibling keywords instead of replacing
    /// the whole schema object.
    pub fn ref_merges_siblings(&self) -> bool {
        match self {
            Self::Draft4 | Self::Draft6 | Self::Draft7 => false,
            Self::Draft2019_09 | Self::Draft2020_12 => true,
        }
    }

    /// The keyword carrying a schema resource identifier.
    pub fn id_keyword(&self) -> &'static str {
        match self {
            Self::Draft4 => "id",
            Self::Draft6 | Self::Draft7 | Self::Draft2019_09 | Self::Draft2020_12 => "$id",
        }
    }
}

impl Default for Draft {
    fn default() -> Self {
        Self::Draft2020_12
    }
}

impl std::fmt::Display for Draft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Draft {
    type Err = SchemataError;

    /// Parse a draft from its short identifier or its `$schema` URI.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft4" | "4" => Ok(Self::Draft4),
            "draft6" | "6" => Ok(Self::Draft6),
            "draft7" | "7" => Ok(Self::Draft7),
            "2019-09" | "draft2019-09" => Ok(Self::Draft2019_09),
            "2020-12" | "draft2020-12" => Ok(Self::Draft2020_12),
            other => {
                Self::from_schema_uri(other).ok_or_else(|| SchemataError::UnknownDraft(other.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_drafts_count() {
        assert_eq!(Draft::all_drafts().len(), DRAFT_COUNT);
    }

    #[test]
    fn test_drafts_are_ordered() {
        let drafts = Draft::all_drafts();
        for pair in drafts.windows(2) {
            assert!(pair[0] < pair[1], "{} should precede {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_as_str_roundtrip() {
        for draft in Draft::all_drafts() {
            let parsed: Draft = draft.as_str().parse().unwrap();
            assert_eq!(*draft, parsed);
        }
    }

    #[test]
    fn test_meta_schema_uri_roundtrip() {
        for draft in Draft::all_drafts() {
            assert_eq!(Draft::from_schema_uri(draft.meta_schema_uri()), Some(*draft));
        }
    }

    #[test]
    fn test_schema_uri_scheme_and_fragment_ignored() {
        assert_eq!(
            Draft::from_schema_uri("https://json-schema.org/draft-07/schema"),
            Some(Draft::Draft7)
        );
        assert_eq!(
            Draft::from_schema_uri("http://json-schema.org/draft/2020-12/schema#"),
            Some(Draft::Draft2020_12)
        );
        assert_eq!(Draft::from_schema_uri("http://example.com/schema"), None);
    }

    #[test]
    fn test_from_str_invalid() {
        assert!("draft3".parse::<Draft>().is_err());
        assert!("".parse::<Draft>().is_err());
    }

    #[test]
    fn test_ref_semantics_split_at_2019() {
        assert!(!Draft::Draft7.ref_merges_siblings());
        assert!(Draft::Draft2019_09.ref_merges_siblings());
        assert!(Draft::Draft2020_12.ref_merges_siblings());
    }

    #[test]
    fn test_serde_format_matches_as_str() {
        for draft in Draft::all_drafts() {
            let json = serde_json::to_string(draft).unwrap();
            assert_eq!(json, format!("\"{}\"", draft.as_str()));
        }
    }

    #[test]
    fn test_id_keyword() {
        assert_eq!(Draft::Draft4.id_keyword(), "id");
        assert_eq!(Draft::Draft6.id_keyword(), "$id");
    }
}
