//! html5ever TreeSink that builds a [`Document`].

use std::borrow::Cow;
use std::cell::RefCell;

use html5ever::tendril::StrTendril;
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{Attribute as Html5Attribute, QualName};

use super::arena::{Attribute, Document, NodeData, NodeId};

/// Handle used by the tree builder to reference nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeHandle(pub NodeId);

impl Default for NodeHandle {
    fn default() -> Self {
        NodeHandle(NodeId::NONE)
    }
}

/// Sink that parses into an arena [`Document`].
///
/// html5ever's TreeSink takes `&self` everywhere, so the document sits
/// behind a RefCell.
pub struct DocumentSink {
    doc: RefCell<Document>,
}

impl Default for DocumentSink {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentSink {
    pub fn new() -> Self {
        Self {
            doc: RefCell::new(Document::new()),
        }
    }

    /// Consume the sink and return the parsed document.
    pub fn into_document(self) -> Document {
        self.doc.into_inner()
    }

    fn append_to(&self, parent: NodeId, child: NodeOrText<NodeHandle>) {
        let mut doc = self.doc.borrow_mut();
        match child {
            NodeOrText::AppendNode(node) => doc.append(parent, node.0),
            NodeOrText::AppendText(text) => doc.append_text(parent, &text),
        }
    }
}

impl TreeSink for DocumentSink {
    type Handle = NodeHandle;
    type Output = Self;
    type ElemName<'a>
        = &'a QualName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        self
    }

    fn parse_error(&self, msg: Cow<'static, str>) {
        tracing::trace!(%msg, "html parse error");
    }

    fn get_document(&self) -> Self::Handle {
        NodeHandle(self.doc.borrow().document())
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        static EMPTY: QualName = QualName {
            prefix: None,
            ns: html5ever::ns!(),
            local: html5ever::local_name!(""),
        };

        let doc = self.doc.borrow();
        match doc.get(target.0).map(|n| &n.data) {
            Some(NodeData::Element { name, .. }) => {
                // SAFETY: the tree builder reads the name immediately, before
                // it asks the sink for any new node, so the arena is not
                // reallocated while the reference is alive.
                unsafe { std::mem::transmute::<&QualName, &'a QualName>(name) }
            }
            _ => &EMPTY,
        }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Html5Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        let attrs = attrs
            .into_iter()
            .map(|a| Attribute {
                name: a.name,
                value: a.value.to_string(),
            })
            .collect();
        NodeHandle(self.doc.borrow_mut().create_element(name, attrs))
    }

    fn create_comment(&self, text: StrTendril) -> Self::Handle {
        NodeHandle(self.doc.borrow_mut().create_comment(text.to_string()))
    }

    fn create_pi(&self, target: StrTendril, _data: StrTendril) -> Self::Handle {
        // Processing instructions only occur in foreign content; keep a
        // placeholder so the handle stays valid.
        NodeHandle(self.doc.borrow_mut().create_comment(format!("?{target}")))
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        self.append_to(parent.0, child);
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        let parent = self.doc.borrow().parent(element.0);
        match parent {
            Some(parent) => self.append_to(parent, child),
            None => self.append_to(prev_element.0, child),
        }
    }

    fn append_doctype_to_document(
        &self,
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    ) {
        let mut doc = self.doc.borrow_mut();
        let root = doc.document();
        let doctype = doc.create_doctype(
            name.to_string(),
            public_id.to_string(),
            system_id.to_string(),
        );
        doc.append(root, doctype);
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        // Template contents stay inline; text extraction skips templates anyway.
        *target
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        x.0 == y.0
    }

    fn set_quirks_mode(&self, mode: QuirksMode) {
        // Layout is estimated, so quirks make no difference.
        tracing::trace!(?mode, "document quirks mode");
    }

    fn append_before_sibling(&self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        let mut doc = self.doc.borrow_mut();
        match new_node {
            NodeOrText::AppendNode(node) => doc.insert_before(sibling.0, node.0),
            NodeOrText::AppendText(text) => {
                let text_node = doc.create_text(text.to_string());
                doc.insert_before(sibling.0, text_node);
            }
        }
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Html5Attribute>) {
        let mut doc = self.doc.borrow_mut();
        if let Some(node) = doc.get_mut(target.0)
            && let NodeData::Element {
                attrs: existing, ..
            } = &mut node.data
        {
            for attr in attrs {
                if !existing.iter().any(|a| a.name == attr.name) {
                    existing.push(Attribute {
                        name: attr.name,
                        value: attr.value.to_string(),
                    });
                }
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        self.doc.borrow_mut().detach(target.0);
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let mut doc = self.doc.borrow_mut();
        let children: Vec<_> = doc.children(node.0).collect();
        for child in children {
            doc.detach(child);
            doc.append(new_parent.0, child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::parse_html;

    #[test]
    fn test_basic_parse() {
        let doc = parse_html("<html><body><p>Hello</p></body></html>");

        // document + html + head + body + p + text
        assert!(doc.len() > 3);

        let p = doc.find_by_tag("p").expect("should find p");
        let text = doc.children(p).next().expect("p should have child");
        assert_eq!(doc.text(text), Some("Hello"));
    }

    #[test]
    fn test_attributes() {
        let doc = parse_html(r#"<div id="main" class="container header">Content</div>"#);

        let div = doc.find_by_tag("div").expect("should find div");
        assert_eq!(doc.element_id(div), Some("main"));

        let classes = doc.element_classes(div);
        assert!(classes.contains(&"container".to_string()));
        assert!(classes.contains(&"header".to_string()));
    }

    #[test]
    fn test_implied_structure() {
        let doc = parse_html("<title>T</title><p>One<p>Two");

        assert!(doc.head().is_some());
        let body = doc.body().expect("body is implied");
        let paragraphs: Vec<_> = doc
            .child_elements(body)
            .filter(|&c| doc.has_tag(c, "p"))
            .collect();
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(doc.title().as_deref(), Some("T"));
    }

    #[test]
    fn test_misnested_table_text_is_kept() {
        // Foster parenting goes through append_before_sibling.
        let doc = parse_html("<table>stray<tr><td>cell</td></tr></table>");
        let body = doc.body().unwrap();
        let text = doc.text_content(body);
        assert!(text.contains("stray"));
        assert!(text.contains("cell"));
    }
}
