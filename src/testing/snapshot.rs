//! Snapshot helpers.
//!
//! Print a [`MemoryTarget`] subtree as indented markup suitable for
//! `insta::assert_snapshot!` and plain string assertions.

use super::memory::{MemNodeId, MemoryTarget};
use crate::render::Target;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Print `node` and its descendants, two spaces of indent per level.
///
/// Attributes print in insertion order, followed by the inline style as a
/// `style` attribute. A node without children prints on one line with its
/// text; otherwise the text comes first inside the element.
pub fn tree_to_string(target: &MemoryTarget, node: &MemNodeId) -> String {
    let mut lines = Vec::new();
    write_node(target, node, 0, &mut lines);
    lines.join("\n")
}

/// The opening tag of a single node, e.g. `<input type="text">`.
pub fn open_tag(target: &MemoryTarget, node: &MemNodeId) -> String {
    let mut tag = format!("<{}", target.tag_name(node));
    for (name, value) in target.attributes(node) {
        tag.push_str(&format!(" {name}=\"{value}\""));
    }
    let style = target.style(node);
    if !style.is_empty() {
        let css: Vec<String> = style.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        tag.push_str(&format!(" style=\"{}\"", css.join("; ")));
    }
    tag.push('>');
    tag
}

fn write_node(target: &MemoryTarget, node: &MemNodeId, depth: usize, lines: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    let open = open_tag(target, node);
    let close = format!("</{}>", target.tag_name(node));
    let text = target.text(node).unwrap_or_default();
    let children = target.children(node);

    if children.is_empty() {
        lines.push(format!("{indent}{open}{text}{close}"));
        return;
    }
    lines.push(format!("{indent}{open}"));
    if !text.is_empty() {
        lines.push(format!("{indent}  {text}"));
    }
    for child in &children {
        write_node(target, child, depth + 1, lines);
    }
    lines.push(format!("{indent}{close}"));
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn prints_nested_markup() {
        let mut t = MemoryTarget::new();
        let host = t.add_host("app", "div");
        let p = t.create_node("p", None);
        t.append_child(&host, &p);
        t.set_text(&p, "hi");
        t.set_attribute(&p, "class", &Value::from("x"));
        t.set_attribute(&p, "style", &Value::from("color: red"));
        assert_eq!(
            tree_to_string(&t, &host),
            "<div id=\"app\">\n  <p class=\"x\" style=\"color: red\">hi</p>\n</div>"
        );
    }

    #[test]
    fn empty_node_prints_on_one_line() {
        let mut t = MemoryTarget::new();
        let host = t.add_host("root", "main");
        assert_eq!(tree_to_string(&t, &host), "<main id=\"root\"></main>");
    }
}
