//! DOM Mutator.
//!
//! Applies a change list to annotated HTML, collecting failures as data
//! instead of aborting — failure collection over exception control flow.
//! Only an unrecognized `op` is a genuine thrown error ([`CoreError::UnknownOp`]);
//! everything else (missing node/parent, locked target) becomes a
//! [`FailedOp`]. An unrecognized `position` value fails to deserialize as
//! part of the same `op` typing step, so it surfaces as `UnknownOp` too —
//! there is no separate "unknown position" error path.

use crate::change_list::{parse_op, ChangeOp, FailedOp, Position, RawChangeList};
use crate::dom::{self, DomHandle};
use crate::error::CoreError;

const CHAT_MESSAGES_ID: &str = "chatMessages";
const THOUGHTS_ID: &str = "thoughts";

/// Result of applying a change list: the mutated, still-annotated HTML,
/// the ops that failed, and the count that succeeded.
pub struct MutationOutcome {
    pub html: String,
    pub failed_ops: Vec<FailedOp>,
    pub applied_count: usize,
}

/// Apply `changes` to `annotated_html` in list order.
///
/// Returns even when `changes` is empty (a no-op). An unrecognized `op`
/// (including one with an unrecognized `position`) is thrown as
/// [`CoreError::UnknownOp`] — a malformed LLM response the parser
/// accepted syntactically but the mutator cannot make sense of.
pub fn apply_change_list(
    annotated_html: &str,
    changes: &RawChangeList,
) -> Result<MutationOutcome, CoreError> {
    let rcdom = dom::parse_document(annotated_html);
    let root = rcdom.document.clone();

    let mut failed_ops = Vec::new();
    let mut applied_count = 0usize;

    for raw in changes {
        let op = parse_op(raw).map_err(CoreError::UnknownOp)?;
        match apply_one(&root, &op) {
            Ok(()) => applied_count += 1,
            Err(reason) => failed_ops.push(FailedOp {
                op: raw.clone(),
                reason,
            }),
        }
    }

    let html = dom::serialize_document(&rcdom)?;
    Ok(MutationOutcome {
        html,
        failed_ops,
        applied_count,
    })
}

/// Apply a single typed op against the live tree. `Err` carries the
/// human-readable failure reason to record in a [`FailedOp`]; it is never
/// propagated past [`apply_change_list`].
fn apply_one(root: &DomHandle, op: &ChangeOp) -> Result<(), String> {
    match op {
        ChangeOp::Update { node_id, html, .. } => {
            let target = find_node(root, node_id)?;
            if is_locked(&target) && !is_chat_exception(&target) {
                return Err("target is locked".to_string());
            }
            let fragment = dom::parse_fragment(html);
            dom::replace_children(&target, fragment);
            Ok(())
        }
        ChangeOp::Replace { node_id, html, .. } => {
            let target = find_node(root, node_id)?;
            if is_locked(&target) {
                return Err("target is locked".to_string());
            }
            let fragment = dom::parse_fragment(html);
            dom::replace_node(&target, fragment).map_err(|e| e.to_string())
        }
        ChangeOp::Delete { node_id, .. } => {
            let target = find_node(root, node_id)?;
            if is_locked(&target) {
                return Err("target is locked".to_string());
            }
            dom::detach(&target);
            Ok(())
        }
        ChangeOp::Insert {
            parent_id,
            position,
            html,
            ..
        } => {
            let anchor = find_node_as(root, parent_id, "parent")?;
            let fragment = dom::parse_fragment(html);
            match position {
                Position::Prepend => dom::prepend_children(&anchor, fragment),
                Position::Append => dom::append_children(&anchor, fragment),
                Position::Before => {
                    dom::insert_before(&anchor, fragment).map_err(|e| e.to_string())?
                }
                Position::After => {
                    dom::insert_after(&anchor, fragment).map_err(|e| e.to_string())?
                }
            }
            Ok(())
        }
        ChangeOp::StyleElement { node_id, style, .. } => {
            let target = find_node(root, node_id)?;
            if is_locked(&target) {
                return Err("target is locked".to_string());
            }
            dom::set_attr(&target, "style", style);
            Ok(())
        }
    }
}

fn find_node(root: &DomHandle, node_id: &str) -> Result<DomHandle, String> {
    find_node_as(root, node_id, "node")
}

fn find_node_as(root: &DomHandle, node_id: &str, noun: &str) -> Result<DomHandle, String> {
    dom::find_by_attr(root, "data-node-id", node_id)
        .ok_or_else(|| format!("{} {} not found", noun, node_id))
}

fn is_locked(node: &DomHandle) -> bool {
    dom::has_attr(node, "data-locked")
}

/// `#chatMessages` and `#thoughts` may have their inner HTML updated even
/// while locked.
fn is_chat_exception(node: &DomHandle) -> bool {
    matches!(dom::get_attr(node, "id").as_deref(), Some(CHAT_MESSAGES_ID) | Some(THOUGHTS_ID))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotator::assign_node_ids;
    use serde_json::json;

    fn annotated(html: &str) -> String {
        assign_node_ids(html).unwrap().0
    }

    fn node_id_of(html: &str, needle: &str) -> String {
        let dom = dom::parse_document(html);
        let mut found = None;
        dom::walk_elements(&dom.document, &mut |n| {
            if found.is_none() {
                if let Some(tag) = dom::tag_name(n) {
                    if needle == tag {
                        found = Some(dom::get_attr(n, "data-node-id").unwrap());
                    }
                }
            }
        });
        found.unwrap()
    }

    #[test]
    fn simple_update_applies() {
        let html = annotated(r#"<html><body><p id="x">Old</p></body></html>"#);
        let id = node_id_of(&html, "p");
        let changes = vec![json!({"op": "update", "nodeId": id, "html": "New"})];
        let outcome = apply_change_list(&html, &changes).unwrap();
        assert_eq!(outcome.applied_count, 1);
        assert!(outcome.failed_ops.is_empty());
        assert!(outcome.html.contains("New"));
        assert!(!outcome.html.contains("Old"));
    }

    #[test]
    fn locked_element_resists_delete() {
        let html = annotated(r#"<html><body><p data-locked="true">keep</p></body></html>"#);
        let id = node_id_of(&html, "p");
        let changes = vec![json!({"op": "delete", "nodeId": id})];
        let outcome = apply_change_list(&html, &changes).unwrap();
        assert_eq!(outcome.applied_count, 0);
        assert_eq!(outcome.failed_ops.len(), 1);
        assert!(outcome.failed_ops[0].reason.contains("locked"));
        assert!(outcome.html.contains("keep"));
    }

    #[test]
    fn unlocked_child_of_locked_parent_can_be_replaced() {
        let html = annotated(r#"<html><body><div data-locked="true"><p>inner</p></div></body></html>"#);
        let id = node_id_of(&html, "p");
        let changes = vec![json!({"op": "replace", "nodeId": id, "html": "<span>swapped</span>"})];
        let outcome = apply_change_list(&html, &changes).unwrap();
        assert_eq!(outcome.applied_count, 1);
        assert!(outcome.html.contains("swapped"));
        assert!(outcome.html.contains("data-locked"));
    }

    #[test]
    fn chat_messages_container_update_bypasses_lock() {
        let html = annotated(
            r#"<html><body><div id="chatMessages" data-locked="true">old</div></body></html>"#,
        );
        let id = node_id_of(&html, "div");
        let changes = vec![json!({"op": "update", "nodeId": id, "html": "new message"})];
        let outcome = apply_change_list(&html, &changes).unwrap();
        assert_eq!(outcome.applied_count, 1);
        assert!(outcome.html.contains("new message"));
    }

    #[test]
    fn missing_node_is_recorded_as_failed_op_not_thrown() {
        let html = annotated("<html><body><p>a</p></body></html>");
        let changes = vec![json!({"op": "delete", "nodeId": "999"})];
        let outcome = apply_change_list(&html, &changes).unwrap();
        assert_eq!(outcome.applied_count, 0);
        assert_eq!(outcome.failed_ops.len(), 1);
        assert!(outcome.failed_ops[0].reason.contains("not found"));
    }

    #[test]
    fn unknown_op_is_thrown_not_collected() {
        let html = annotated("<html><body><p>a</p></body></html>");
        let changes = vec![json!({"op": "frobnicate", "nodeId": "0"})];
        let result = apply_change_list(&html, &changes);
        assert!(matches!(result, Err(CoreError::UnknownOp(_))));
    }

    #[test]
    fn empty_change_list_is_a_no_op() {
        let html = annotated("<html><body><p>a</p></body></html>");
        let outcome = apply_change_list(&html, &Vec::new()).unwrap();
        assert_eq!(outcome.applied_count, 0);
        assert!(outcome.failed_ops.is_empty());
    }

    #[test]
    fn insert_append_does_not_require_position_to_be_locked_aware() {
        let html = annotated(r#"<html><body><div data-locked="true" id="box"></div></body></html>"#);
        let id = node_id_of(&html, "div");
        let changes = vec![json!({"op": "insert", "parentId": id, "position": "append", "html": "<p>new</p>"})];
        let outcome = apply_change_list(&html, &changes).unwrap();
        assert_eq!(outcome.applied_count, 1);
        assert!(outcome.html.contains("new"));
    }
}
