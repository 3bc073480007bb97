//! Node-ID annotation.
//!
//! Assigns a zero-based, per-pass `data-node-id` to every element in
//! document order (depth-first pre-order; text/comment/doctype nodes are
//! skipped), and strips those attributes back out once the mutator is
//! done with them.

use crate::dom;
use crate::error::CoreError;

/// Parse `html`, write a `data-node-id` counter on every element in
/// document order, and serialize back.
///
/// Returns the annotated HTML plus the number of elements touched.
/// Script and style elements are annotated like any other element —
/// they are frequent mutation targets.
pub fn assign_node_ids(html: &str) -> Result<(String, usize), CoreError> {
    let dom = dom::parse_document(html);
    let mut count = 0usize;
    dom::walk_elements(&dom.document, &mut |node| {
        dom::set_attr(node, "data-node-id", &count.to_string());
        count += 1;
    });
    let annotated = dom::serialize_document(&dom)?;
    Ok((annotated, count))
}

/// Parse `html` and remove every `data-node-id` attribute, serializing
/// back. Idempotent: a document with no such attributes round-trips
/// through the parser/serializer unchanged.
pub fn strip_node_ids(html: &str) -> Result<String, CoreError> {
    let dom = dom::parse_document(html);
    dom::walk_elements(&dom.document, &mut |node| {
        dom::remove_attr(node, "data-node-id");
    });
    dom::serialize_document(&dom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assigns_sequential_ids_in_document_order() {
        let html = "<html><body><div><p>a</p><p>b</p></div></body></html>";
        let (annotated, count) = assign_node_ids(html).unwrap();
        assert_eq!(count, 6); // html, head (implied), body, div, p, p
        assert!(annotated.contains(r#"data-node-id="0""#));
    }

    #[test]
    fn script_and_style_elements_are_annotated() {
        let html = "<html><head><style>.a{}</style></head><body><script>1;</script></body></html>";
        let (annotated, _count) = assign_node_ids(html).unwrap();
        assert!(annotated.contains("style") && annotated.contains("data-node-id"));
        assert!(annotated.contains("script"));
    }

    #[test]
    fn strip_removes_all_node_id_attributes() {
        let html = "<html><body><div><p>a</p></div></body></html>";
        let (annotated, _) = assign_node_ids(html).unwrap();
        let stripped = strip_node_ids(&annotated).unwrap();
        assert!(!stripped.contains("data-node-id"));
    }

    #[test]
    fn ids_form_a_contiguous_range_from_zero() {
        let html = "<html><body><div><p>a</p><p>b</p><p>c</p></div></body></html>";
        let (annotated, count) = assign_node_ids(&html).unwrap();
        for i in 0..count {
            assert!(annotated.contains(&format!(r#"data-node-id="{}""#, i)));
        }
    }

    #[test]
    fn assign_then_strip_preserves_non_id_attributes() {
        let html = r#"<html><body><div class="card" id="x">hi</div></body></html>"#;
        let (annotated, _) = assign_node_ids(html).unwrap();
        let stripped = strip_node_ids(&annotated).unwrap();
        assert!(stripped.contains(r#"class="card""#));
        assert!(stripped.contains(r#"id="x""#));
    }
}
