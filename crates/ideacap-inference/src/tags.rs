//! Tag extraction from free-form model output.
//!
//! Models are asked for `{"tags": [...]}` but regularly wrap it in prose or
//! return a bare list. [`extract_tags`] tries, in order:
//!
//! 1. the whole string as `{"tags": [...]}`
//! 2. the first brace-delimited object mentioning `"tags"` (no nested braces)
//! 3. the first non-empty bracket list, split on commas with quotes and
//!    stray brackets trimmed
//!
//! and otherwise yields an empty list. It never fails.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use crate::types::TagsResponse;

static TAGS_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\{[^}]*"tags"[^}]*\}"#).expect("tags object regex is valid"));

static BRACKET_LIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]").expect("bracket list regex is valid"));

/// Decode a tag list from raw model output.
pub fn extract_tags(raw: &str) -> Vec<String> {
    if let Some(tags) = parse_strict(raw) {
        trace!(strategy = "strict", count = tags.len(), "Parsed tags");
        return tags;
    }

    if let Some(tags) = TAGS_OBJECT.find(raw).and_then(|m| parse_strict(m.as_str())) {
        trace!(strategy = "embedded_object", count = tags.len(), "Parsed tags");
        return tags;
    }

    if let Some(caps) = BRACKET_LIST.captures(raw) {
        let tags = split_list(&caps[1]);
        trace!(strategy = "bracket_list", count = tags.len(), "Parsed tags");
        return tags;
    }

    trace!("No tags found in model output");
    Vec::new()
}

fn parse_strict(s: &str) -> Option<Vec<String>> {
    serde_json::from_str::<TagsResponse>(s).ok().map(|r| r.tags)
}

fn split_list(inner: &str) -> Vec<String> {
    inner
        .split(',')
        .map(|item| {
            item.trim_matches(|c: char| c.is_whitespace() || matches!(c, '"' | '\'' | '[' | ']'))
        })
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
