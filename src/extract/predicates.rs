//! Ancestor-chain predicates used to discard page chrome.

use crate::dom::{Document, NodeId};

/// One kind of page chrome, matched against an element and its ancestors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    tag: &'static str,
    id: &'static str,
    class_fragments: &'static [&'static str],
}

pub const HEADER: Region = Region {
    tag: "header",
    id: "header",
    class_fragments: &["header"],
};

pub const FOOTER: Region = Region {
    tag: "footer",
    id: "footer",
    class_fragments: &["footer"],
};

pub const SIDEBAR: Region = Region {
    tag: "aside",
    id: "sidebar",
    class_fragments: &["sidebar", "side-bar"],
};

impl Region {
    /// Does the element itself look like this region?
    ///
    /// Tag and id compare exactly; the class attribute matches on substring,
    /// so `site-header-inner` counts as a header.
    pub fn matches(&self, doc: &Document, id: NodeId) -> bool {
        if doc.has_tag(id, self.tag) || doc.element_id(id) == Some(self.id) {
            return true;
        }
        doc.get_attr(id, "class")
            .is_some_and(|class| self.class_fragments.iter().any(|f| class.contains(f)))
    }

    /// Is `id`, or any ancestor below `<body>`, this region?
    pub fn contains(&self, doc: &Document, id: NodeId) -> bool {
        ancestor_chain(doc, id).any(|node| self.matches(doc, node))
    }
}

/// `id` followed by its element ancestors, stopping before `<body>`.
pub fn ancestor_chain(doc: &Document, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
    let body = doc.body();
    std::iter::once(id)
        .chain(doc.ancestors(id))
        .take_while(move |&node| Some(node) != body)
        .filter(move |&node| doc.is_element(node))
}

/// Is the element inside page chrome (header, footer or sidebar)?
pub fn in_page_chrome(doc: &Document, id: NodeId) -> bool {
    [HEADER, FOOTER, SIDEBAR]
        .iter()
        .any(|region| region.contains(doc, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    fn node(doc: &Document, id: &str) -> NodeId {
        doc.get_by_id(id).unwrap()
    }

    #[test]
    fn test_header_by_tag_id_and_class() {
        let doc = parse_html(
            "<header><p id=a>x</p></header>\
             <div id=header><p id=b>x</p></div>\
             <div class='site-header-inner'><p id=c>x</p></div>\
             <div><p id=d>x</p></div>",
        );
        assert!(HEADER.contains(&doc, node(&doc, "a")));
        assert!(HEADER.contains(&doc, node(&doc, "b")));
        assert!(HEADER.contains(&doc, node(&doc, "c")));
        assert!(!HEADER.contains(&doc, node(&doc, "d")));
    }

    #[test]
    fn test_sidebar_variants() {
        let doc = parse_html(
            "<aside><p id=a>x</p></aside><div class=side-bar><p id=b>x</p></div>\
             <div id=sidebar-extra><p id=c>x</p></div>",
        );
        assert!(SIDEBAR.contains(&doc, node(&doc, "a")));
        assert!(SIDEBAR.contains(&doc, node(&doc, "b")));
        // Ids must match exactly.
        assert!(!SIDEBAR.contains(&doc, node(&doc, "c")));
    }

    #[test]
    fn test_walk_stops_at_body() {
        let doc = parse_html("<body class=page-footer><p id=p>x</p></body>");
        assert!(!FOOTER.contains(&doc, node(&doc, "p")));
    }

    #[test]
    fn test_in_page_chrome() {
        let doc = parse_html("<footer><div><p id=f>x</p></div></footer><main><p id=m>x</p></main>");
        assert!(in_page_chrome(&doc, node(&doc, "f")));
        assert!(!in_page_chrome(&doc, node(&doc, "m")));
    }
}
