//! HTML serialization of document subtrees.

use super::arena::{Document, NodeData, NodeId};

/// Elements that never have an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Elements whose text children are emitted without escaping.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

impl Document {
    /// Serialize `id` and its subtree as HTML (like `outerHTML`).
    pub fn to_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    /// Serialize only the children of `id` (like `innerHTML`).
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(id) {
            self.write_node(child, &mut out);
        }
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        let mut stack = vec![Step::Open(id)];

        while let Some(step) = stack.pop() {
            let id = match step {
                Step::Open(id) => id,
                Step::Close(tag) => {
                    out.push_str("</");
                    out.push_str(tag);
                    out.push('>');
                    continue;
                }
            };
            let Some(node) = self.get(id) else {
                continue;
            };

            match &node.data {
                NodeData::Document => self.push_children(id, &mut stack),
                NodeData::Doctype { name, .. } => {
                    out.push_str("<!DOCTYPE ");
                    out.push_str(name);
                    out.push('>');
                }
                NodeData::Comment(text) => {
                    out.push_str("<!--");
                    out.push_str(text);
                    out.push_str("-->");
                }
                NodeData::Text(text) => {
                    let raw = self
                        .parent(id)
                        .and_then(|p| self.element_name(p))
                        .is_some_and(|n| RAW_TEXT_ELEMENTS.contains(&n.as_ref()));
                    if raw {
                        out.push_str(text);
                    } else {
                        out.push_str(&escape_text(text));
                    }
                }
                NodeData::Element { name, attrs, .. } => {
                    let tag = name.local.as_ref();
                    out.push('<');
                    out.push_str(tag);
                    for attr in attrs {
                        out.push(' ');
                        out.push_str(attr.name.local.as_ref());
                        out.push_str("=\"");
                        out.push_str(&escape_attr(&attr.value));
                        out.push('"');
                    }
                    out.push('>');

                    if !VOID_ELEMENTS.contains(&tag) {
                        stack.push(Step::Close(tag));
                        self.push_children(id, &mut stack);
                    }
                }
            }
        }
    }

    /// Queue the children of `id` so they pop in document order.
    fn push_children<'a>(&'a self, id: NodeId, stack: &mut Vec<Step<'a>>) {
        let mark = stack.len();
        stack.extend(self.children(id).map(Step::Open));
        stack[mark..].reverse();
    }
}

/// Pending serialization work: a node to write, or an end tag owed.
enum Step<'a> {
    Open(NodeId),
    Close(&'a str),
}

/// Escape text content.
pub fn escape_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '\u{a0}' => result.push_str("&nbsp;"),
            _ => result.push(c),
        }
    }
    result
}

/// Escape a double-quoted attribute value.
pub fn escape_attr(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '\u{a0}' => result.push_str("&nbsp;"),
            _ => result.push(c),
        }
    }
    result
}
