//! Error injection.
//!
//! On any uncaught pipeline failure, the core produces the stripped
//! original source with a single `<script id="error"
//! type="application/json">` block appended as the last child of
//! `<body>`. Any pre-existing error block is removed first so at most
//! one ever exists.

use serde::Serialize;

use crate::dom;
use crate::error::CoreError;

#[derive(Serialize)]
struct ErrorPayload<'a> {
    message: &'a str,
    details: &'a str,
}

/// Append a fresh error block to `source`, removing any existing one
/// first. `source` is expected to already have node IDs stripped.
pub fn inject_error(source: &str, message: &str, details: &str) -> Result<String, CoreError> {
    let rcdom = dom::parse_document(source);
    let root = rcdom.document.clone();

    if let Some(existing) = dom::find_by_attr(&root, "id", "error") {
        if dom::tag_name(&existing).as_deref() == Some("script") {
            dom::detach(&existing);
        }
    }

    let body = find_body(&root)
        .ok_or_else(|| CoreError::Html("no <body> element to inject error into".to_string()))?;

    let payload = serde_json::to_string(&ErrorPayload { message, details })
        .map_err(|e| CoreError::Html(e.to_string()))?;

    let script = build_error_script(&payload);
    dom::append_children(&body, vec![script]);

    dom::serialize_document(&rcdom)
}

fn find_body(root: &dom::DomHandle) -> Option<dom::DomHandle> {
    let mut found = None;
    dom::walk_elements(root, &mut |node| {
        if found.is_none() && dom::tag_name(node).as_deref() == Some("body") {
            found = Some(node.clone());
        }
    });
    found
}

fn build_error_script(payload_json: &str) -> dom::DomHandle {
    let fragment = dom::parse_fragment(&format!(
        r#"<script id="error" type="application/json">{}</script>"#,
        payload_json
    ));
    fragment
        .into_iter()
        .find(|n| dom::tag_name(n).as_deref() == Some("script"))
        .expect("fragment parse of a literal <script> tag always yields a script element")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_error_block_as_last_child_of_body() {
        let html = "<html><body><p>hi</p></body></html>";
        let out = inject_error(html, "Something went wrong", "boom").unwrap();
        assert!(out.contains(r#"id="error""#));
        assert!(out.contains(r#"type="application/json""#));
        assert!(out.contains("Something went wrong"));
        assert!(out.contains("boom"));
        let body_end = out.find("</body>").unwrap();
        let script_pos = out.find(r#"id="error""#).unwrap();
        assert!(script_pos < body_end);
    }

    #[test]
    fn replaces_any_pre_existing_error_block() {
        let html = r#"<html><body><script id="error" type="application/json">{"message":"old","details":"old"}</script></body></html>"#;
        let out = inject_error(html, "new message", "new details").unwrap();
        assert_eq!(out.matches(r#"id="error""#).count(), 1);
        assert!(out.contains("new message"));
        assert!(!out.contains("\"old\""));
    }
}
