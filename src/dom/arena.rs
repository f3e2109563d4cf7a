//! Arena-based HTML document.
//!
//! Nodes live in one contiguous vector and link to each other by index, which
//! keeps traversal cheap and lets the extractor hand out `NodeId` handles
//! without borrowing the tree.

use std::collections::HashMap;

use html5ever::{LocalName, Namespace, QualName};

/// Unique identifier for a node in a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Sentinel value for no node.
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check if this is a valid node ID.
    pub fn is_some(&self) -> bool {
        self.0 != u32::MAX
    }

    /// Check if this is the sentinel value.
    pub fn is_none(&self) -> bool {
        self.0 == u32::MAX
    }
}

/// Node payload.
#[derive(Debug, Clone)]
pub enum NodeData {
    /// Document root.
    Document,
    /// Element with name and attributes.
    Element {
        name: QualName,
        attrs: Vec<Attribute>,
        /// Pre-extracted id for fast matching.
        id: Option<String>,
        /// Pre-extracted classes for fast matching.
        classes: Vec<String>,
    },
    /// Text content.
    Text(String),
    /// Comment (kept so serialization round-trips).
    Comment(String),
    /// Document type declaration.
    Doctype {
        name: String,
        public_id: String,
        system_id: String,
    },
}

/// HTML attribute.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: QualName,
    pub value: String,
}

/// A node in the arena.
#[derive(Debug, Clone)]
pub struct Node {
    pub data: NodeData,
    pub parent: NodeId,
    pub first_child: NodeId,
    pub last_child: NodeId,
    pub prev_sibling: NodeId,
    pub next_sibling: NodeId,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
        }
    }
}

/// Elements whose text is never part of the readable text.
const NON_TEXT_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Arena-allocated HTML document.
///
/// Parsing produces one of these for the live page; extraction results own
/// separate documents built with [`Document::clone_subtree`], so nothing the
/// extractor returns aliases the source tree.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    id_map: HashMap<String, NodeId>,
}

impl Document {
    /// Create a new empty document containing only the root node.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId::NONE,
            id_map: HashMap::new(),
        };
        doc.root = doc.alloc(Node::new(NodeData::Document));
        doc
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// The document root (not an element).
    pub fn document(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get_mut(id.0 as usize)
    }

    /// Create a detached element node.
    pub fn create_element(&mut self, name: QualName, attrs: Vec<Attribute>) -> NodeId {
        let mut id = None;
        let mut classes = Vec::new();

        for attr in &attrs {
            match attr.name.local.as_ref() {
                "id" => id = Some(attr.value.clone()),
                "class" => {
                    classes = attr
                        .value
                        .split_whitespace()
                        .map(str::to_string)
                        .collect();
                }
                _ => {}
            }
        }

        let node_id = self.alloc(Node::new(NodeData::Element {
            name,
            attrs,
            id: id.clone(),
            classes,
        }));

        // First element with a given id wins, as in getElementById.
        if let Some(id_str) = id {
            self.id_map.entry(id_str).or_insert(node_id);
        }

        node_id
    }

    /// Create a detached HTML element with no attributes.
    pub fn create_html_element(&mut self, tag: &str) -> NodeId {
        self.create_element(
            QualName::new(None, html5ever::ns!(html), LocalName::from(tag)),
            Vec::new(),
        )
    }

    pub fn create_text(&mut self, text: String) -> NodeId {
        self.alloc(Node::new(NodeData::Text(text)))
    }

    pub fn create_comment(&mut self, text: String) -> NodeId {
        self.alloc(Node::new(NodeData::Comment(text)))
    }

    pub fn create_doctype(&mut self, name: String, public_id: String, system_id: String) -> NodeId {
        self.alloc(Node::new(NodeData::Doctype {
            name,
            public_id,
            system_id,
        }))
    }

    /// Append `child` as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        let last_child = self
            .get(parent)
            .map(|n| n.last_child)
            .unwrap_or(NodeId::NONE);

        if let Some(child_node) = self.get_mut(child) {
            child_node.parent = parent;
            child_node.prev_sibling = last_child;
            child_node.next_sibling = NodeId::NONE;
        }

        if let Some(last_node) = self.get_mut(last_child) {
            last_node.next_sibling = child;
        }

        if let Some(parent_node) = self.get_mut(parent) {
            if parent_node.first_child.is_none() {
                parent_node.first_child = child;
            }
            parent_node.last_child = child;
        }
    }

    /// Insert `new_node` immediately before `sibling`.
    pub fn insert_before(&mut self, sibling: NodeId, new_node: NodeId) {
        let (parent, prev) = match self.get(sibling) {
            Some(n) => (n.parent, n.prev_sibling),
            None => return,
        };

        if let Some(new) = self.get_mut(new_node) {
            new.parent = parent;
            new.prev_sibling = prev;
            new.next_sibling = sibling;
        }

        if let Some(sib) = self.get_mut(sibling) {
            sib.prev_sibling = new_node;
        }

        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = new_node;
            }
        } else if let Some(par) = self.get_mut(parent) {
            par.first_child = new_node;
        }
    }

    /// Unlink a node from its parent and siblings.
    pub fn detach(&mut self, target: NodeId) {
        let (parent, prev, next) = match self.get(target) {
            Some(n) => (n.parent, n.prev_sibling, n.next_sibling),
            None => return,
        };

        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = next;
            }
        } else if let Some(p) = self.get_mut(parent) {
            p.first_child = next;
        }

        if next.is_some() {
            if let Some(n) = self.get_mut(next) {
                n.prev_sibling = prev;
            }
        } else if let Some(p) = self.get_mut(parent) {
            p.last_child = prev;
        }

        if let Some(node) = self.get_mut(target) {
            node.parent = NodeId::NONE;
            node.prev_sibling = NodeId::NONE;
            node.next_sibling = NodeId::NONE;
        }
    }

    /// Append text, merging into a trailing text node when possible.
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        let last_child = self
            .get(parent)
            .map(|n| n.last_child)
            .unwrap_or(NodeId::NONE);

        if let Some(last) = self.get_mut(last_child)
            && let NodeData::Text(existing) = &mut last.data
        {
            existing.push_str(text);
            return;
        }

        let text_node = self.create_text(text.to_string());
        self.append(parent, text_node);
    }

    /// Look up an element by its id attribute.
    pub fn get_by_id(&self, id: &str) -> Option<NodeId> {
        self.id_map.get(id).copied()
    }

    /// Number of allocated nodes (including detached ones).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the document holds nothing but its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn children(&self, parent: NodeId) -> Children<'_> {
        let first = self
            .get(parent)
            .map(|n| n.first_child)
            .unwrap_or(NodeId::NONE);
        Children {
            doc: self,
            current: first,
        }
    }

    /// Child elements only, skipping text and comments.
    pub fn child_elements(&self, parent: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(parent).filter(|&c| self.is_element(c))
    }

    /// All descendants of `id` in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.children(id).collect();
        stack.reverse();
        Descendants { doc: self, stack }
    }

    /// Parent chain of `id`, nearest first, ending at the document root.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        let current = self.get(id).map(|n| n.parent).unwrap_or(NodeId::NONE);
        Ancestors { doc: self, current }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(|n| n.parent).filter(NodeId::is_some)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(|n| n.next_sibling).filter(NodeId::is_some)
    }

    /// Find the first node matching a predicate (pre-order from the root).
    pub fn find<F>(&self, predicate: F) -> Option<NodeId>
    where
        F: Fn(&Node) -> bool,
    {
        std::iter::once(self.root)
            .chain(self.descendants(self.root))
            .find(|&id| self.get(id).is_some_and(&predicate))
    }

    /// Find the first element with the given tag name.
    pub fn find_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.find(|node| {
            matches!(&node.data, NodeData::Element { name, .. } if name.local.as_ref() == tag)
        })
    }

    /// The `<html>` element.
    pub fn html_element(&self) -> Option<NodeId> {
        self.child_elements(self.root)
            .find(|&c| self.has_tag(c, "html"))
            .or_else(|| self.child_elements(self.root).next())
    }

    /// The `<head>` element.
    pub fn head(&self) -> Option<NodeId> {
        let html = self.html_element()?;
        self.child_elements(html).find(|&c| self.has_tag(c, "head"))
    }

    /// The `<body>` element.
    pub fn body(&self) -> Option<NodeId> {
        let html = self.html_element()?;
        self.child_elements(html).find(|&c| self.has_tag(c, "body"))
    }

    /// First element child of the root; for extracted documents this is the
    /// content element itself.
    pub fn root_element(&self) -> Option<NodeId> {
        self.child_elements(self.root).next()
    }

    /// Text of the `<title>` element, whitespace-collapsed.
    pub fn title(&self) -> Option<String> {
        let title = self.find_by_tag("title")?;
        let text = collapse_whitespace(&self.text_content(title));
        (!text.is_empty()).then_some(text)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over children of a node.
pub struct Children<'a> {
    doc: &'a Document,
    current: NodeId,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current.is_none() {
            return None;
        }
        let id = self.current;
        self.current = self
            .doc
            .get(id)
            .map(|n| n.next_sibling)
            .unwrap_or(NodeId::NONE);
        Some(id)
    }
}

/// Pre-order iterator over a subtree.
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let mark = self.stack.len();
        self.stack.extend(self.doc.children(id));
        self.stack[mark..].reverse();
        Some(id)
    }
}

/// Iterator walking up the parent chain.
pub struct Ancestors<'a> {
    doc: &'a Document,
    current: NodeId,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current.is_none() {
            return None;
        }
        let id = self.current;
        self.current = self
            .doc
            .get(id)
            .map(|n| n.parent)
            .unwrap_or(NodeId::NONE);
        Some(id)
    }
}

/// Element accessors.
impl Document {
    /// Element's local name (tag).
    pub fn element_name(&self, id: NodeId) -> Option<&LocalName> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Element { name, .. } => Some(&name.local),
            _ => None,
        })
    }

    pub fn element_namespace(&self, id: NodeId) -> Option<&Namespace> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Element { name, .. } => Some(&name.ns),
            _ => None,
        })
    }

    /// Check the element's tag name (ASCII case-insensitive).
    pub fn has_tag(&self, id: NodeId, tag: &str) -> bool {
        self.element_name(id)
            .is_some_and(|n| n.as_ref().eq_ignore_ascii_case(tag))
    }

    pub fn get_attr(&self, id: NodeId, attr_name: &str) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|a| a.name.local.as_ref() == attr_name)
                .map(|a| a.value.as_str()),
            _ => None,
        })
    }

    pub fn element_id(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Element { id, .. } => id.as_deref(),
            _ => None,
        })
    }

    pub fn element_classes(&self, id: NodeId) -> &[String] {
        static EMPTY: &[String] = &[];
        self.get(id)
            .and_then(|n| match &n.data {
                NodeData::Element { classes, .. } => Some(classes.as_slice()),
                _ => None,
            })
            .unwrap_or(EMPTY)
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.get(id)
            .is_some_and(|n| matches!(n.data, NodeData::Element { .. }))
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        self.get(id)
            .is_some_and(|n| matches!(n.data, NodeData::Text(_)))
    }

    /// Contents of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Concatenated descendant text, like DOM `textContent`, except that
    /// script, style, noscript and template contents are skipped.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(t) = self.text(id) {
            out.push_str(t);
            return out;
        }
        if self
            .element_name(id)
            .is_some_and(|n| NON_TEXT_ELEMENTS.contains(&n.as_ref()))
        {
            return out;
        }

        let mut stack: Vec<NodeId> = self.children(id).collect();
        stack.reverse();
        while let Some(current) = stack.pop() {
            let Some(node) = self.get(current) else {
                continue;
            };
            match &node.data {
                NodeData::Text(t) => out.push_str(t),
                NodeData::Element { name, .. }
                    if NON_TEXT_ELEMENTS.contains(&name.local.as_ref()) => {}
                NodeData::Element { .. } | NodeData::Document => {
                    let mark = stack.len();
                    stack.extend(self.children(current));
                    stack[mark..].reverse();
                }
                _ => {}
            }
        }
        out
    }

    /// Text of the direct text children of `id`.
    ///
    /// Unlike [`text_content`](Self::text_content) this reads raw-text
    /// elements such as `<script>` and `<style>`.
    pub fn child_text(&self, id: NodeId) -> String {
        self.children(id).filter_map(|c| self.text(c)).collect()
    }

    /// Trimmed length of [`text_content`](Self::text_content) in characters.
    pub fn text_len(&self, id: NodeId) -> usize {
        self.text_content(id).trim().chars().count()
    }
}

/// Cloning.
impl Document {
    /// Deep-copy the subtree rooted at `id` into a new document.
    ///
    /// The copy becomes the only child of the new document's root.
    pub fn clone_subtree(&self, id: NodeId) -> Document {
        let mut out = Document::new();
        let root = out.document();
        out.import(self, id, root);
        out
    }

    /// Deep-copy `src_id` from `src` and append it under `parent`.
    ///
    /// Returns the id of the copy. Importing a document root copies its
    /// children instead and returns `parent`.
    pub fn import(&mut self, src: &Document, src_id: NodeId, parent: NodeId) -> NodeId {
        let mut stack = vec![(src_id, parent)];
        let mut top = NodeId::NONE;

        while let Some((from, into)) = stack.pop() {
            let Some(node) = src.get(from) else {
                continue;
            };
            let copy = match &node.data {
                NodeData::Document => into,
                NodeData::Element { name, attrs, .. } => {
                    self.create_element(name.clone(), attrs.clone())
                }
                NodeData::Text(t) => self.create_text(t.clone()),
                NodeData::Comment(c) => self.create_comment(c.clone()),
                NodeData::Doctype {
                    name,
                    public_id,
                    system_id,
                } => self.create_doctype(name.clone(), public_id.clone(), system_id.clone()),
            };
            if copy != into {
                self.append(into, copy);
            }
            if top.is_none() {
                top = copy;
            }

            let mark = stack.len();
            stack.extend(src.children(from).map(|c| (c, copy)));
            stack[mark..].reverse();
        }

        top
    }
}

/// Collapse runs of whitespace to single spaces and trim.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
