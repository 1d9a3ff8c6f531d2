//! Serialization of a [`Document`] back to HTML text.
//!
//! Text and attribute values were stored as written, so they are emitted
//! verbatim; only double quotes inside attribute values are escaped. The
//! `style` attribute is regenerated from the element's inline declarations.

use crate::dom::{Document, NodeData, NodeId, VOID_ELEMENTS};

/// Serialize the whole document.
pub fn to_html(doc: &Document) -> String {
    node_to_html(doc, doc.root())
}

/// Serialize a single node and its subtree.
pub fn node_to_html(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    write_tree(doc, node, &mut out);
    out
}

enum Step {
    Open(NodeId),
    Close(NodeId),
}

fn write_tree(doc: &Document, node: NodeId, out: &mut String) {
    let mut stack = vec![Step::Open(node)];
    while let Some(step) = stack.pop() {
        let node = match step {
            Step::Open(node) => node,
            Step::Close(node) => {
                if let Some(el) = doc.element(node) {
                    out.push_str("</");
                    out.push_str(&el.tag);
                    out.push('>');
                }
                continue;
            }
        };

        match doc.data(node) {
            NodeData::Document => {}
            NodeData::Doctype(text) => {
                out.push_str("<!");
                out.push_str(text);
                out.push('>');
                continue;
            }
            NodeData::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
                continue;
            }
            NodeData::Text(text) => {
                out.push_str(text);
                continue;
            }
            NodeData::Element(el) => {
                out.push('<');
                out.push_str(&el.tag);
                for (name, value) in &el.attrs {
                    write_attribute(out, name, value);
                }
                if !el.style.is_empty() {
                    write_style(out, &el.style_text());
                }
                out.push('>');

                if VOID_ELEMENTS.contains(&el.tag.as_str()) {
                    continue;
                }
                stack.push(Step::Close(node));
            }
        }
        stack.extend(doc.child_nodes(node).iter().rev().map(|c| Step::Open(*c)));
    }
}

fn write_attribute(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    if value.is_empty() {
        return;
    }
    out.push_str("=\"");
    out.push_str(&value.replace('"', "&quot;"));
    out.push('"');
}

/// Single quotes keep quoted CSS strings readable by the next parse, which
/// does not decode `&quot;`.
fn write_style(out: &mut String, text: &str) {
    if text.contains('"') && !text.contains('\'') {
        out.push_str(" style='");
        out.push_str(text);
        out.push('\'');
    } else {
        write_attribute(out, "style", text);
    }
}
