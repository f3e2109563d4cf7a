//! HTML document model.
//!
//! Pages are parsed with html5ever into an arena [`Document`]. Everything the
//! extractor needs from a live page goes through this module: tree walks,
//! text gathering, CSS selector queries and subtree cloning.

mod arena;
mod select;
mod serialize;
mod tree_sink;

pub use arena::{Ancestors, Attribute, Children, Descendants, Document, Node, NodeData, NodeId};
pub use arena::collapse_whitespace;
pub use select::{ElementRef, ReadSelectors, SelectorGroup};
pub use serialize::{escape_attr, escape_text};
pub use tree_sink::DocumentSink;

use html5ever::ParseOpts;
use html5ever::tendril::TendrilSink;

use crate::util::{decode_text, sniff_meta_charset};

/// Parse an HTML string into a [`Document`].
///
/// Parsing never fails; malformed markup is repaired the way browsers do.
pub fn parse_html(html: &str) -> Document {
    let sink = html5ever::parse_document(DocumentSink::new(), ParseOpts::default())
        .from_utf8()
        .one(html.as_bytes());
    sink.into_document()
}

/// Parse raw HTML bytes, detecting the encoding first.
pub fn parse_html_bytes(bytes: &[u8]) -> Document {
    let text = decode_text(bytes, sniff_meta_charset(bytes));
    parse_html(&text)
}

/// Text of `node` and everything after it, up to the end of the body.
///
/// Walks the node itself, then the following siblings of the node and of
/// each ancestor below `<body>`. Every piece is trimmed, empty pieces are
/// dropped, and the rest are joined with single spaces.
pub fn text_from(doc: &Document, node: NodeId) -> String {
    let body = doc.body();
    let mut pieces = Vec::new();

    let mut push = |id: NodeId| {
        let text = doc.text_content(id);
        let text = text.trim();
        if !text.is_empty() {
            pieces.push(text.to_string());
        }
    };

    push(node);

    let mut current = node;
    loop {
        if Some(current) == body || current == doc.document() {
            break;
        }
        let mut sibling = doc.next_sibling(current);
        while let Some(s) = sibling {
            push(s);
            sibling = doc.next_sibling(s);
        }
        match doc.parent(current) {
            Some(parent) => current = parent,
            None => break,
        }
    }

    pieces.join(" ")
}
