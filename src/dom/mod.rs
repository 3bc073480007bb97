//! Shared mutable-HTML-tree plumbing used by the annotator, mutator, dedup
//! and error-injection modules.
//!
//! Built on `html5ever` (the same tokenizer/tree-builder this codebase
//! reaches for elsewhere when it needs a standards-compliant HTML parse)
//! plus `markup5ever_rcdom`'s `Rc<RefCell<_>>` tree, which is mutable in
//! the way a browser DOM is: attributes can be rewritten in place, nodes
//! can be detached, and fragments can be spliced in at an arbitrary
//! position. `scraper`'s read-only `Selector`/`ElementRef` API (used
//! elsewhere in this codebase for page scraping) isn't enough here — the
//! mutator needs to splice subtrees, not just query them.

use std::cell::RefCell;
use std::rc::Rc;

use html5ever::driver::ParseOpts;
use html5ever::serialize::{serialize, SerializeOpts};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::{Attribute, LocalName, QualName};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom, SerializableHandle};

use crate::error::CoreError;

pub type DomHandle = Handle;

fn html_ns() -> html5ever::Namespace {
    html5ever::Namespace::from("http://www.w3.org/1999/xhtml")
}

pub fn qualname(local: &str) -> QualName {
    QualName::new(None, html_ns(), LocalName::from(local))
}

/// Parse a full document. Always succeeds per the HTML5 spec's error
/// recovery rules (html5ever never rejects input); malformed shells are
/// tolerated, never restored.
pub fn parse_document(html: &str) -> RcDom {
    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            drop_doctype: false,
            ..Default::default()
        },
        ..Default::default()
    };
    html5ever::parse_document(RcDom::default(), opts).one(html)
}

/// Parse a fragment (used for `update`/`replace`/`insert` op payloads).
/// The fragment is parsed in a `<body>` context; the returned handles are
/// the fragment's actual top-level nodes.
///
/// html5ever's fragment-parsing algorithm always wraps the result in a
/// synthetic, attribute-less `<html>` element as the document's sole
/// child (`create_root` in its tree builder) — the parsed content is
/// nested one level inside *that*, not at `dom.document`'s own children.
/// Unwrap that synthetic wrapper so callers see the real fragment nodes.
pub fn parse_fragment(html: &str) -> Vec<DomHandle> {
    let opts = ParseOpts::default();
    let dom = html5ever::parse_fragment(RcDom::default(), opts, qualname("body"), Vec::new()).one(html);
    let root_children = dom.document.children.borrow();
    match root_children.first() {
        Some(synthetic_html) => synthetic_html.children.borrow().clone(),
        None => Vec::new(),
    }
}

/// Serialize a document back to a full HTML string.
pub fn serialize_document(dom: &RcDom) -> Result<String, CoreError> {
    let handle: SerializableHandle = dom.document.clone().into();
    let mut buf = Vec::new();
    serialize(&mut buf, &handle, SerializeOpts::default())
        .map_err(|e| CoreError::Html(e.to_string()))?;
    String::from_utf8(buf).map_err(|e| CoreError::Html(e.to_string()))
}

pub fn is_element(handle: &DomHandle) -> bool {
    matches!(handle.data, NodeData::Element { .. })
}

/// Lower-cased tag name, if this is an element node.
pub fn tag_name(handle: &DomHandle) -> Option<String> {
    match &handle.data {
        NodeData::Element { name, .. } => Some(name.local.to_string()),
        _ => None,
    }
}

pub fn get_attr(handle: &DomHandle, name: &str) -> Option<String> {
    match &handle.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| a.name.local.as_ref() == name)
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

pub fn has_attr(handle: &DomHandle, name: &str) -> bool {
    match &handle.data {
        NodeData::Element { attrs, .. } => {
            attrs.borrow().iter().any(|a| a.name.local.as_ref() == name)
        }
        _ => false,
    }
}

/// Set (insert or overwrite) an attribute on an element. No-op on
/// non-element nodes.
pub fn set_attr(handle: &DomHandle, name: &str, value: &str) {
    if let NodeData::Element { attrs, .. } = &handle.data {
        let mut attrs = attrs.borrow_mut();
        let tendril: StrTendril = value.into();
        if let Some(existing) = attrs.iter_mut().find(|a| a.name.local.as_ref() == name) {
            existing.value = tendril;
        } else {
            attrs.push(Attribute {
                name: qualname(name),
                value: tendril,
            });
        }
    }
}

/// Remove an attribute from an element, if present.
pub fn remove_attr(handle: &DomHandle, name: &str) {
    if let NodeData::Element { attrs, .. } = &handle.data {
        attrs.borrow_mut().retain(|a| a.name.local.as_ref() != name);
    }
}

pub fn children(handle: &DomHandle) -> Vec<DomHandle> {
    handle.children.borrow().clone()
}

/// Depth-first pre-order traversal of element nodes (text/comment/doctype
/// nodes are skipped). The N-th element visited is the one that receives
/// node-id N-1 when the annotator walks the same tree.
pub fn walk_elements(root: &DomHandle, visit: &mut impl FnMut(&DomHandle)) {
    if is_element(root) {
        visit(root);
    }
    for child in root.children.borrow().iter() {
        walk_elements(child, visit);
    }
}

/// Find the single element in `root`'s subtree carrying `attr="value"`.
pub fn find_by_attr(root: &DomHandle, attr: &str, value: &str) -> Option<DomHandle> {
    let mut found = None;
    walk_elements(root, &mut |h| {
        if found.is_none() && get_attr(h, attr).as_deref() == Some(value) {
            found = Some(h.clone());
        }
    });
    found
}

/// Find the single element carrying `id="value"`.
pub fn find_by_id(root: &DomHandle, value: &str) -> Option<DomHandle> {
    find_by_attr(root, "id", value)
}

/// Detach `node` from its current parent, if any.
pub fn detach(node: &DomHandle) {
    let parent_weak = node.parent.take();
    if let Some(parent_weak) = parent_weak {
        if let Some(parent) = parent_weak.upgrade() {
            parent
                .children
                .borrow_mut()
                .retain(|c| !Rc::ptr_eq(c, node));
        }
    }
}

/// Remove all existing children of `node` and reparent `new_children` in
/// their place (used by `update`: replace inner HTML).
pub fn replace_children(node: &DomHandle, new_children: Vec<DomHandle>) {
    for old in node.children.borrow().iter() {
        old.parent.set(None);
    }
    node.children.borrow_mut().clear();
    append_children(node, new_children);
}

fn set_parent(child: &DomHandle, parent: &DomHandle) {
    child.parent.set(Some(Rc::downgrade(parent)));
}

/// Peek at a node's parent handle without disturbing the `Cell`.
fn parent_of(node: &DomHandle) -> Option<DomHandle> {
    let weak = node.parent.take();
    let parent = weak.as_ref().and_then(|w| w.upgrade());
    node.parent.set(weak);
    parent
}

pub fn append_children(parent: &DomHandle, new_children: Vec<DomHandle>) {
    for child in &new_children {
        detach(child);
        set_parent(child, parent);
    }
    parent.children.borrow_mut().extend(new_children);
}

pub fn prepend_children(parent: &DomHandle, new_children: Vec<DomHandle>) {
    for child in &new_children {
        detach(child);
        set_parent(child, parent);
    }
    let mut kids = parent.children.borrow_mut();
    let mut combined = new_children;
    combined.extend(kids.drain(..));
    *kids = combined;
}

/// Insert `new_siblings` immediately before `anchor` in `anchor`'s parent.
pub fn insert_before(anchor: &DomHandle, new_siblings: Vec<DomHandle>) -> Result<(), CoreError> {
    let parent = parent_of(anchor)
        .ok_or_else(|| CoreError::Html("anchor has no parent".to_string()))?;
    splice_relative(&parent, anchor, new_siblings, 0)
}

/// Insert `new_siblings` immediately after `anchor` in `anchor`'s parent.
pub fn insert_after(anchor: &DomHandle, new_siblings: Vec<DomHandle>) -> Result<(), CoreError> {
    let parent = parent_of(anchor)
        .ok_or_else(|| CoreError::Html("anchor has no parent".to_string()))?;
    splice_relative(&parent, anchor, new_siblings, 1)
}

fn splice_relative(
    parent: &DomHandle,
    anchor: &DomHandle,
    new_siblings: Vec<DomHandle>,
    offset: usize,
) -> Result<(), CoreError> {
    for child in &new_siblings {
        detach(child);
        set_parent(child, parent);
    }
    let mut kids = parent.children.borrow_mut();
    let idx = kids
        .iter()
        .position(|c| Rc::ptr_eq(c, anchor))
        .ok_or_else(|| CoreError::Html("anchor not found among parent's children".to_string()))?;
    for (i, new_child) in new_siblings.into_iter().enumerate() {
        kids.insert(idx + offset + i, new_child);
    }
    Ok(())
}

/// Replace `target` with `replacements` at the same position in its
/// parent (used by `replace`: substitute outer HTML).
pub fn replace_node(target: &DomHandle, replacements: Vec<DomHandle>) -> Result<(), CoreError> {
    let parent =
        parent_of(target).ok_or_else(|| CoreError::Html("target has no parent".to_string()))?;
    for child in &replacements {
        detach(child);
        set_parent(child, &parent);
    }
    let mut kids = parent.children.borrow_mut();
    let idx = kids
        .iter()
        .position(|c| Rc::ptr_eq(c, target))
        .ok_or_else(|| CoreError::Html("target not found among parent's children".to_string()))?;
    kids.remove(idx);
    for (i, new_child) in replacements.into_iter().enumerate() {
        kids.insert(idx + i, new_child);
    }
    Ok(())
}

/// Construct a bare text node (used when error-injection needs to build
/// script contents programmatically rather than via `parse_fragment`).
pub fn text_node(text: &str) -> DomHandle {
    Node::new(NodeData::Text {
        contents: RefCell::new(text.into()),
    })
}
