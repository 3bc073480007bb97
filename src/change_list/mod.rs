//! Change-list wire types.
//!
//! A change list is a JSON array of tagged-variant operations,
//! order-preserving; unknown fields on a known op are ignored by the
//! mutator but round-trip through `extra` so failure reports can echo the
//! original op verbatim.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Where to insert new content relative to a parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Prepend,
    Append,
    Before,
    After,
}

/// A single change-list operation.
///
/// Implemented as a discriminated union keyed on the string `op` field;
/// variants don't share fields via inheritance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum ChangeOp {
    Update {
        #[serde(rename = "nodeId")]
        node_id: String,
        html: String,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
    Replace {
        #[serde(rename = "nodeId")]
        node_id: String,
        html: String,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
    Delete {
        #[serde(rename = "nodeId")]
        node_id: String,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
    Insert {
        #[serde(rename = "parentId")]
        parent_id: String,
        position: Position,
        html: String,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
    #[serde(rename = "style-element")]
    StyleElement {
        #[serde(rename = "nodeId")]
        node_id: String,
        style: String,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
}

impl ChangeOp {
    /// The bare op name, as it would appear in a failure report.
    pub fn kind(&self) -> &'static str {
        match self {
            ChangeOp::Update { .. } => "update",
            ChangeOp::Replace { .. } => "replace",
            ChangeOp::Delete { .. } => "delete",
            ChangeOp::Insert { .. } => "insert",
            ChangeOp::StyleElement { .. } => "style-element",
        }
    }
}

/// An ordered, finite sequence of change operations. Order is significant
/// and preserved end to end.
pub type ChangeList = Vec<ChangeOp>;

/// The parser's output: an ordered array of raw JSON op objects.
///
/// The change-list parser only extracts a JSON array; it does not
/// validate individual operation shapes. The mutator is responsible for
/// typing each entry into a [`ChangeOp`], treating a shape it cannot
/// recognize as [`crate::error::CoreError::UnknownOp`] — a genuinely
/// thrown, fatal condition, not a [`FailedOp`].
pub type RawChangeList = Vec<Value>;

/// Try to type a single raw op object into a [`ChangeOp`].
///
/// Returns the bare `op` string (or `"<missing>"`) on failure so callers
/// can build an `UnknownOp` error with a useful message.
pub fn parse_op(raw: &Value) -> Result<ChangeOp, String> {
    serde_json::from_value(raw.clone()).map_err(|_| {
        raw.get("op")
            .and_then(|v| v.as_str())
            .unwrap_or("<missing>")
            .to_string()
    })
}

/// A change-list entry the mutator could not apply.
///
/// `op` is kept as a raw [`Value`] (not the typed [`ChangeOp`]) so that
/// operations the parser accepted syntactically but which reference an
/// unknown variant can still be captured in reports fed back to the
/// repair round-trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedOp {
    pub op: Value,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_round_trips() {
        let json = r#"{"op":"update","nodeId":"3","html":"<b>hi</b>"}"#;
        let op: ChangeOp = serde_json::from_str(json).unwrap();
        assert_eq!(op.kind(), "update");
        match &op {
            ChangeOp::Update { node_id, html, .. } => {
                assert_eq!(node_id, "3");
                assert_eq!(html, "<b>hi</b>");
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn insert_parses_position() {
        let json = r#"{"op":"insert","parentId":"0","position":"after","html":"<p>x</p>"}"#;
        let op: ChangeOp = serde_json::from_str(json).unwrap();
        match op {
            ChangeOp::Insert { position, .. } => assert_eq!(position, Position::After),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn unknown_op_fails_to_parse_as_known_variant() {
        let json = r#"{"op":"frobnicate","nodeId":"1"}"#;
        let result: Result<ChangeOp, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn parse_op_reports_the_unrecognized_op_name() {
        let raw: Value = serde_json::from_str(r#"{"op":"frobnicate","nodeId":"1"}"#).unwrap();
        let err = parse_op(&raw).unwrap_err();
        assert_eq!(err, "frobnicate");
    }

    #[test]
    fn extra_fields_preserved() {
        let json = r#"{"op":"delete","nodeId":"5","comment":"why not"}"#;
        let op: ChangeOp = serde_json::from_str(json).unwrap();
        match op {
            ChangeOp::Delete { extra, .. } => {
                assert_eq!(extra.get("comment").unwrap(), "why not");
            }
            _ => panic!("wrong variant"),
        }
    }
}
