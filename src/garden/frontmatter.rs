//! Front-matter splitting and parsing.
//!
//! A document may open with a `---` line; everything up to the next `---`
//! line is YAML. A block that never closes, or that is not a YAML mapping,
//! counts as no metadata at all and the whole text stays body.

use serde::{Deserialize, Deserializer};
use serde_yaml::Value;
use std::collections::BTreeMap;

const DELIMITER: &str = "---";

/// Parsed front-matter.
///
/// Only the keys below are interpreted; everything else lands in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Metadata {
    #[serde(deserialize_with = "scalar")]
    pub title: Option<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub collection: Vec<String>,
    #[serde(deserialize_with = "scalar")]
    pub summary: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub date: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub lang: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub slug: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub changefreq: Option<String>,
    pub toc: Option<bool>,
    pub raw: Option<bool>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Result of splitting a document into metadata and body.
#[derive(Debug)]
pub struct Split<'a> {
    pub metadata: Metadata,
    pub body: &'a str,
    /// Opening delimiter found but the block was unusable.
    pub malformed: bool,
}

/// Split `text` into front-matter and body.
pub fn split(text: &str) -> Split<'_> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let unparsed = || Split {
        metadata: Metadata::default(),
        body: text,
        malformed: false,
    };

    let Some((first, mut rest)) = next_line(text) else {
        return unparsed();
    };
    if first.trim_end() != DELIMITER {
        return unparsed();
    }

    let block_start = text.len() - rest.len();
    while let Some((line, after)) = next_line(rest) {
        if line.trim_end() == DELIMITER {
            let block_end = text.len() - rest.len();
            let block = &text[block_start..block_end];
            return match parse_block(block) {
                Some(metadata) => Split {
                    metadata,
                    body: after,
                    malformed: false,
                },
                None => Split {
                    malformed: true,
                    ..unparsed()
                },
            };
        }
        rest = after;
    }

    Split {
        malformed: true,
        ..unparsed()
    }
}

fn parse_block(block: &str) -> Option<Metadata> {
    if block.trim().is_empty() {
        return Some(Metadata::default());
    }
    serde_yaml::from_str(block).ok()
}

/// Split off the first line (without its terminator).
fn next_line(text: &str) -> Option<(&str, &str)> {
    if text.is_empty() {
        return None;
    }
    Some(match text.find('\n') {
        Some(pos) => (text[..pos].trim_end_matches('\r'), &text[pos + 1..]),
        None => (text, ""),
    })
}

// ============================================================================
// Field Deserializers
// ============================================================================

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(scalar_to_string))
}

/// Accept a missing value, a single scalar, or a list of scalars.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Sequence(items)) => items.into_iter().filter_map(scalar_to_string).collect(),
        Some(value) => scalar_to_string(value).into_iter().collect(),
        None => Vec::new(),
    })
}

/// Strip leading `#` markers, drop empties, keep first occurrence order.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().trim_start_matches('#').trim();
        if !tag.is_empty() && !normalized.iter().any(|t| t == tag) {
            normalized.push(tag.to_owned());
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_without_front_matter() {
        let split = split("# Hello\n\nBody");
        assert_eq!(split.metadata, Metadata::default());
        assert_eq!(split.body, "# Hello\n\nBody");
        assert!(!split.malformed);
    }

    #[test]
    fn test_split_with_front_matter() {
        let split = split("---\ntitle: Ownership\ntags: [public, rust]\n---\nBody\n");
        assert_eq!(split.metadata.title.as_deref(), Some("Ownership"));
        assert_eq!(split.metadata.tags, vec!["public", "rust"]);
        assert_eq!(split.body, "Body\n");
    }

    #[test]
    fn test_split_crlf_and_bom() {
        let split = split("\u{feff}---\r\ntags: public\r\n---\r\nBody");
        assert_eq!(split.metadata.tags, vec!["public"]);
        assert_eq!(split.body, "Body");
    }

    #[test]
    fn test_split_unclosed_block_is_body() {
        let text = "---\ntags: public\nno closing line";
        let split = split(text);
        assert!(split.malformed);
        assert!(split.metadata.tags.is_empty());
        assert_eq!(split.body, text);
    }

    #[test]
    fn test_split_invalid_yaml_is_body() {
        let text = "---\n: : [\n---\nBody";
        let split = split(text);
        assert!(split.malformed);
        assert_eq!(split.body, text);
    }

    #[test]
    fn test_split_empty_block() {
        let split = split("---\n---\nBody");
        assert!(!split.malformed);
        assert_eq!(split.body, "Body");
    }

    #[test]
    fn test_delimiter_must_be_first_line() {
        let split = split("intro\n---\ntags: public\n---\n");
        assert!(split.metadata.tags.is_empty());
    }

    #[test]
    fn test_scalar_fields_accept_numbers() {
        let split = split("---\ntitle: 1984\ndate: 2024-05-01\ntoc: true\n---\n");
        assert_eq!(split.metadata.title.as_deref(), Some("1984"));
        assert_eq!(split.metadata.date.as_deref(), Some("2024-05-01"));
        assert_eq!(split.metadata.toc, Some(true));
    }

    #[test]
    fn test_unknown_keys_go_to_extra() {
        let split = split("---\ncover: cover.png\n---\n");
        assert!(split.metadata.extra.contains_key("cover"));
    }

    #[test]
    fn test_collection_scalar_or_list() {
        let one = split("---\ncollection: post\n---\n");
        let many = split("---\ncollection: [post, featured]\n---\n");
        assert_eq!(one.metadata.collection, vec!["post"]);
        assert_eq!(many.metadata.collection, vec!["post", "featured"]);
    }

    #[test]
    fn test_normalize_tags() {
        let tags = vec![
            "#public".to_owned(),
            "public".to_owned(),
            " ##rust ".to_owned(),
            "#".to_owned(),
        ];
        assert_eq!(normalize_tags(&tags), vec!["public", "rust"]);
    }
}
