//! Post-processor: inline script deduplication.
//!
//! Operates on the stripped final HTML. Two passes: exact duplicates by
//! `id` (last wins), then a conservative declaration-overlap heuristic
//! for id-less scripts the LLM frequently re-emits as a revised copy
//! instead of an edit to the original.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::dom::{self, DomHandle};
use crate::error::CoreError;

const RESERVED_IDS: &[&str] = &["page-info", "page-helpers", "page-script", "error"];
const MIN_DECLS: usize = 2;
const OVERLAP_THRESHOLD: f64 = 0.6;

fn decl_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*(?:let|const|var|function|class)\s+([A-Za-z_$][A-Za-z0-9_$]*)")
            .unwrap()
    })
}

/// Remove duplicate inline `<script>` elements from `html` using the
/// two-pass heuristic above.
pub fn deduplicate_inline_scripts(html: &str) -> Result<String, CoreError> {
    let rcdom = dom::parse_document(html);
    let root = rcdom.document.clone();

    let mut scripts = Vec::new();
    dom::walk_elements(&root, &mut |node| {
        if dom::tag_name(node).as_deref() == Some("script") && !dom::has_attr(node, "src") {
            scripts.push(node.clone());
        }
    });

    let to_remove = scripts_to_remove(&scripts);
    for node in &to_remove {
        dom::detach(node);
    }

    dom::serialize_document(&rcdom)
}

fn scripts_to_remove(scripts: &[DomHandle]) -> Vec<DomHandle> {
    let mut remove = Vec::new();
    remove.extend(by_id_duplicates(scripts));
    remove.extend(by_declaration_overlap(scripts));
    remove
}

/// Pass 1: group by `id` (skipping reserved system ids and scripts with
/// no id); within each group of >=2, keep the last, drop the rest.
fn by_id_duplicates(scripts: &[DomHandle]) -> Vec<DomHandle> {
    let mut by_id: std::collections::HashMap<String, Vec<DomHandle>> = std::collections::HashMap::new();
    for node in scripts {
        if let Some(id) = dom::get_attr(node, "id") {
            if RESERVED_IDS.contains(&id.as_str()) {
                continue;
            }
            by_id.entry(id).or_default().push(node.clone());
        }
    }

    let mut remove = Vec::new();
    for group in by_id.values() {
        if group.len() >= 2 {
            remove.extend(group[..group.len() - 1].iter().cloned());
        }
    }
    remove
}

/// Pass 2: id-less, non-`application/json`-typed scripts compared
/// pairwise by top-level declaration overlap.
fn by_declaration_overlap(scripts: &[DomHandle]) -> Vec<DomHandle> {
    let candidates: Vec<&DomHandle> = scripts
        .iter()
        .filter(|n| {
            dom::get_attr(n, "id").is_none()
                && !dom::has_attr(n, "src")
                && dom::get_attr(n, "type").as_deref() != Some("application/json")
        })
        .collect();

    let decl_sets: Vec<HashSet<String>> = candidates.iter().map(|n| declarations_of(n)).collect();

    let mut marked = vec![false; candidates.len()];
    for i in 0..candidates.len() {
        if marked[i] {
            continue;
        }
        for j in (i + 1)..candidates.len() {
            let (a, b) = (&decl_sets[i], &decl_sets[j]);
            if a.len() < MIN_DECLS || b.len() < MIN_DECLS {
                continue;
            }
            let overlap = a.intersection(b).count();
            let denom = a.len().min(b.len()) as f64;
            if overlap as f64 / denom >= OVERLAP_THRESHOLD {
                marked[i] = true;
                break;
            }
        }
    }

    candidates
        .into_iter()
        .zip(marked)
        .filter_map(|(n, m)| if m { Some(n.clone()) } else { None })
        .collect()
}

fn declarations_of(node: &DomHandle) -> HashSet<String> {
    let text = script_text(node);
    decl_re()
        .captures_iter(&text)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

fn script_text(node: &DomHandle) -> String {
    let mut text = String::new();
    for child in dom::children(node) {
        if let markup5ever_rcdom::NodeData::Text { contents } = &child.data {
            text.push_str(&contents.borrow());
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_scripts_leaves_html_unchanged_modulo_parsing() {
        let html = "<html><head></head><body><p>hi</p></body></html>";
        let out = deduplicate_inline_scripts(html).unwrap();
        assert!(out.contains("<p>hi</p>"));
        assert!(!out.contains("<script"));
    }

    #[test]
    fn dedup_by_id_keeps_last() {
        let html = r#"<html><body>
            <script id="logic">const a = 1;</script>
            <script id="logic">const a = 2;</script>
        </body></html>"#;
        let out = deduplicate_inline_scripts(html).unwrap();
        let count = out.matches("id=\"logic\"").count();
        assert_eq!(count, 1);
        assert!(out.contains("const a = 2"));
        assert!(!out.contains("const a = 1"));
    }

    #[test]
    fn reserved_ids_are_never_deduplicated() {
        let html = r#"<html><body>
            <script id="error">{"message":"a"}</script>
            <script id="error">{"message":"b"}</script>
        </body></html>"#;
        let out = deduplicate_inline_scripts(html).unwrap();
        let count = out.matches("id=\"error\"").count();
        assert_eq!(count, 2);
    }

    #[test]
    fn dedup_by_declaration_overlap_keeps_newer_copy() {
        let html = r#"<html><body>
            <script>
                let count = 0;
                let name = "a";
                function init() {}
                function render() {}
                function oldHelper() {}
            </script>
            <script>
                let count = 0;
                let name = "b";
                function init() {}
                function render() {}
                function newHelper() {}
            </script>
        </body></html>"#;
        let out = deduplicate_inline_scripts(html).unwrap();
        assert!(out.contains("newHelper"));
        assert!(!out.contains("oldHelper"));
    }

    #[test]
    fn dissimilar_scripts_are_both_kept() {
        let html = r#"<html><body>
            <script>let x = 1;</script>
            <script>function totallyDifferent() {}</script>
        </body></html>"#;
        let out = deduplicate_inline_scripts(html).unwrap();
        assert!(out.contains("let x = 1"));
        assert!(out.contains("totallyDifferent"));
    }
}
