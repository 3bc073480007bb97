//! Change-list parser.
//!
//! Extracts a JSON array of operations from the model's raw text,
//! tolerant of code fences and surrounding prose. Mirrors the
//! fallback-ladder shape this codebase's own tool-calling
//! parsers use elsewhere (`llms/providers/utils`'s JSON tool-call
//! extraction, the LiteLLM response normalizer): try a strict parse
//! first, then peel back formatting, then fall back to the most
//! permissive extraction.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::change_list::RawChangeList;
use crate::error::ParseError;

fn fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)^\s*```(?:json)?\s*(.*?)\s*```\s*$").unwrap())
}

fn bracket_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\[.*\]").unwrap())
}

/// Parse a change list out of raw LLM output text.
///
/// Steps, in order:
/// 1. Attempt `serde_json::from_str`; if it yields an array, return it.
/// 2. Strip markdown code fences at start/end and retry.
/// 3. Regex-extract the longest `[` … `]` substring (greedy) and parse that.
/// 4. Otherwise fail with [`ParseError::NoJsonArrayFound`].
pub fn parse_change_list(text: &str) -> Result<RawChangeList, ParseError> {
    if let Some(list) = try_parse_array(text) {
        return Ok(list);
    }

    if let Some(caps) = fence_re().captures(text) {
        if let Some(inner) = caps.get(1) {
            if let Some(list) = try_parse_array(inner.as_str()) {
                return Ok(list);
            }
        }
    }

    if let Some(m) = bracket_re().find(text) {
        if let Some(list) = try_parse_array(m.as_str()) {
            return Ok(list);
        }
    }

    Err(ParseError::NoJsonArrayFound)
}

fn try_parse_array(text: &str) -> Option<RawChangeList> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(Value::Array(items)) => Some(items),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json_array() {
        let text = r#"[{"op":"delete","nodeId":"5"}]"#;
        let list = parse_change_list(text).unwrap();
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn parses_fenced_json() {
        let text = "```json\n[{\"op\":\"delete\",\"nodeId\":\"5\"}]\n```";
        let list = parse_change_list(text).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["op"], "delete");
    }

    #[test]
    fn parses_fenced_json_without_language_tag() {
        let text = "```\n[{\"op\":\"delete\",\"nodeId\":\"5\"}]\n```";
        let list = parse_change_list(text).unwrap();
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn extracts_array_embedded_in_prose() {
        let text = "Sure, here's the change list:\n[{\"op\":\"delete\",\"nodeId\":\"5\"}]\nLet me know if you need more.";
        let list = parse_change_list(text).unwrap();
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn fails_on_non_json_prose() {
        let text = "I can't help with that.";
        let result = parse_change_list(text);
        assert!(result.is_err());
    }

    #[test]
    fn empty_array_parses_to_empty_list() {
        let list = parse_change_list("[]").unwrap();
        assert!(list.is_empty());
    }
}
