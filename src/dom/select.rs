//! CSS selector matching against [`Document`] via the `selectors` crate.

use std::fmt;

use html5ever::{LocalName, Namespace};
use selectors::attr::{AttrSelectorOperation, CaseSensitivity, NamespaceConstraint};
use selectors::context::{MatchingContext, SelectorCaches};
use selectors::matching::ElementSelectorFlags;
use selectors::parser::{ParseRelative, Selector, SelectorParseErrorKind};
use selectors::{OpaqueElement, SelectorImpl};

use super::arena::{Document, Node, NodeData, NodeId};

/// Selector implementation for the `selectors` crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadSelectors;

/// Identifier string type.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub struct IdentStr(pub String);

impl precomputed_hash::PrecomputedHash for IdentStr {
    fn precomputed_hash(&self) -> u32 {
        let mut h: u32 = 0;
        for byte in self.0.bytes() {
            h = h.wrapping_mul(31).wrapping_add(byte as u32);
        }
        h
    }
}

impl AsRef<str> for IdentStr {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'a> From<&'a str> for IdentStr {
    fn from(s: &'a str) -> Self {
        Self(s.to_string())
    }
}

impl cssparser::ToCss for IdentStr {
    fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
        dest.write_str(&self.0)
    }
}

/// LocalName wrapper implementing ToCss.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CssLocalName(pub LocalName);

impl precomputed_hash::PrecomputedHash for CssLocalName {
    fn precomputed_hash(&self) -> u32 {
        self.0.precomputed_hash()
    }
}

impl cssparser::ToCss for CssLocalName {
    fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
        dest.write_str(self.0.as_ref())
    }
}

impl<'a> From<&'a str> for CssLocalName {
    fn from(s: &'a str) -> Self {
        Self(LocalName::from(s))
    }
}

/// Namespace wrapper implementing ToCss.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CssNamespace(pub Namespace);

impl precomputed_hash::PrecomputedHash for CssNamespace {
    fn precomputed_hash(&self) -> u32 {
        self.0.precomputed_hash()
    }
}

impl cssparser::ToCss for CssNamespace {
    fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
        dest.write_str(self.0.as_ref())
    }
}

impl<'i> selectors::parser::Parser<'i> for ReadSelectors {
    type Impl = ReadSelectors;
    type Error = SelectorParseErrorKind<'i>;
}

/// Pseudo-elements never match in a static document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PseudoElement {}

impl cssparser::ToCss for PseudoElement {
    fn to_css<W: fmt::Write>(&self, _dest: &mut W) -> fmt::Result {
        match *self {}
    }
}

impl selectors::parser::PseudoElement for PseudoElement {
    type Impl = ReadSelectors;

    fn accepts_state_pseudo_classes(&self) -> bool {
        false
    }

    fn valid_after_slotted(&self) -> bool {
        false
    }
}

/// No pseudo-classes are parsed, so state selectors like `:hover` are
/// rejected and the group drops them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NonTSPseudoClass {}

impl selectors::parser::NonTSPseudoClass for NonTSPseudoClass {
    type Impl = ReadSelectors;

    fn is_active_or_hover(&self) -> bool {
        match *self {}
    }

    fn is_user_action_state(&self) -> bool {
        match *self {}
    }
}

impl cssparser::ToCss for NonTSPseudoClass {
    fn to_css<W: fmt::Write>(&self, _dest: &mut W) -> fmt::Result {
        match *self {}
    }
}

impl SelectorImpl for ReadSelectors {
    type ExtraMatchingData<'a> = ();
    type AttrValue = IdentStr;
    type Identifier = IdentStr;
    type LocalName = CssLocalName;
    type NamespaceUrl = CssNamespace;
    type NamespacePrefix = IdentStr;
    type BorrowedLocalName = CssLocalName;
    type BorrowedNamespaceUrl = CssNamespace;
    type NonTSPseudoClass = NonTSPseudoClass;
    type PseudoElement = PseudoElement;
}

/// Reference to an element for selector matching.
#[derive(Clone, Copy)]
pub struct ElementRef<'a> {
    pub doc: &'a Document,
    pub id: NodeId,
}

impl<'a> ElementRef<'a> {
    pub fn new(doc: &'a Document, id: NodeId) -> Self {
        Self { doc, id }
    }

    /// Nearest element reached by repeatedly following `step`.
    fn sibling_element(&self, step: impl Fn(&Node) -> NodeId) -> Option<Self> {
        let mut current = step(self.doc.get(self.id)?);
        while current.is_some() {
            if self.doc.is_element(current) {
                return Some(Self::new(self.doc, current));
            }
            current = step(self.doc.get(current)?);
        }
        None
    }
}

impl fmt::Debug for ElementRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementRef")
            .field("id", &self.id)
            .field("name", &self.doc.element_name(self.id))
            .finish()
    }
}

impl selectors::Element for ElementRef<'_> {
    type Impl = ReadSelectors;

    fn opaque(&self) -> OpaqueElement {
        OpaqueElement::new(self)
    }

    fn parent_element(&self) -> Option<Self> {
        let parent = self.doc.parent(self.id)?;
        self.doc
            .is_element(parent)
            .then(|| Self::new(self.doc, parent))
    }

    fn parent_node_is_shadow_root(&self) -> bool {
        false
    }

    fn containing_shadow_host(&self) -> Option<Self> {
        None
    }

    fn is_pseudo_element(&self) -> bool {
        false
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        self.sibling_element(|n| n.prev_sibling)
    }

    fn next_sibling_element(&self) -> Option<Self> {
        self.sibling_element(|n| n.next_sibling)
    }

    fn first_element_child(&self) -> Option<Self> {
        self.doc
            .child_elements(self.id)
            .next()
            .map(|c| Self::new(self.doc, c))
    }

    fn is_html_element_in_html_document(&self) -> bool {
        true
    }

    fn has_local_name(&self, name: &CssLocalName) -> bool {
        self.doc.element_name(self.id).is_some_and(|n| n == &name.0)
    }

    fn has_namespace(&self, ns: &CssNamespace) -> bool {
        self.doc
            .element_namespace(self.id)
            .is_some_and(|n| n == &ns.0)
    }

    fn is_same_type(&self, other: &Self) -> bool {
        self.doc.element_name(self.id) == other.doc.element_name(other.id)
    }

    fn attr_matches(
        &self,
        ns: &NamespaceConstraint<&CssNamespace>,
        local_name: &CssLocalName,
        operation: &AttrSelectorOperation<&IdentStr>,
    ) -> bool {
        let Some(NodeData::Element { attrs, .. }) = self.doc.get(self.id).map(|n| &n.data) else {
            return false;
        };

        attrs
            .iter()
            .filter(|attr| match ns {
                NamespaceConstraint::Any => true,
                NamespaceConstraint::Specific(ns) => attr.name.ns == ns.0,
            })
            .find(|attr| attr.name.local == local_name.0)
            .is_some_and(|attr| operation.eval_str(&attr.value))
    }

    fn match_non_ts_pseudo_class(
        &self,
        pc: &NonTSPseudoClass,
        _context: &mut MatchingContext<'_, Self::Impl>,
    ) -> bool {
        match *pc {}
    }

    fn match_pseudo_element(
        &self,
        _pe: &PseudoElement,
        _context: &mut MatchingContext<'_, Self::Impl>,
    ) -> bool {
        false
    }

    fn is_link(&self) -> bool {
        self.doc.has_tag(self.id, "a") && self.doc.get_attr(self.id, "href").is_some()
    }

    fn is_html_slot_element(&self) -> bool {
        false
    }

    fn has_id(&self, id: &IdentStr, case_sensitivity: CaseSensitivity) -> bool {
        self.doc
            .element_id(self.id)
            .is_some_and(|elem_id| case_sensitivity.eq(elem_id.as_bytes(), id.0.as_bytes()))
    }

    fn has_class(&self, name: &IdentStr, case_sensitivity: CaseSensitivity) -> bool {
        self.doc
            .element_classes(self.id)
            .iter()
            .any(|c| case_sensitivity.eq(c.as_bytes(), name.0.as_bytes()))
    }

    fn imported_part(&self, _name: &IdentStr) -> Option<IdentStr> {
        None
    }

    fn is_part(&self, _name: &IdentStr) -> bool {
        false
    }

    fn is_empty(&self) -> bool {
        self.doc.children(self.id).all(|child| match self.doc.get(child).map(|n| &n.data) {
            Some(NodeData::Element { .. }) => false,
            Some(NodeData::Text(t)) => t.trim().is_empty(),
            _ => true,
        })
    }

    fn is_root(&self) -> bool {
        self.doc
            .parent(self.id)
            .and_then(|p| self.doc.get(p))
            .is_some_and(|p| matches!(p.data, NodeData::Document))
    }

    fn apply_selector_flags(&self, _flags: ElementSelectorFlags) {}

    fn add_element_unique_hashes(&self, _filter: &mut selectors::bloom::BloomFilter) -> bool {
        false
    }

    fn has_custom_state(&self, _name: &IdentStr) -> bool {
        false
    }
}

/// A parsed, comma-separated group of selectors.
///
/// Parsing is lenient: each comma-separated part is parsed on its own and
/// invalid parts are dropped, so one bad selector never disables the rest.
#[derive(Debug, Clone, Default)]
pub struct SelectorGroup {
    selectors: Vec<Selector<ReadSelectors>>,
}

impl SelectorGroup {
    pub fn parse(source: &str) -> Self {
        let selectors = source
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .filter_map(|part| {
                let mut input = cssparser::ParserInput::new(part);
                let mut parser = cssparser::Parser::new(&mut input);
                let list = selectors::parser::SelectorList::parse(
                    &ReadSelectors,
                    &mut parser,
                    ParseRelative::No,
                );
                match list {
                    Ok(list) => Some(list.slice().to_vec()),
                    Err(_) => {
                        tracing::debug!(selector = part, "ignoring unparseable selector");
                        None
                    }
                }
            })
            .flatten()
            .collect();
        Self { selectors }
    }

    /// Build from selectors already parsed elsewhere (e.g. a stylesheet).
    pub fn from_selectors(selectors: Vec<Selector<ReadSelectors>>) -> Self {
        Self { selectors }
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    pub fn selectors(&self) -> &[Selector<ReadSelectors>] {
        &self.selectors
    }

    /// Check whether `id` matches any selector of the group.
    pub fn matches(&self, doc: &Document, id: NodeId) -> bool {
        if !doc.is_element(id) {
            return false;
        }
        let elem = ElementRef::new(doc, id);
        let mut caches = SelectorCaches::default();
        let mut context = MatchingContext::new(
            selectors::matching::MatchingMode::Normal,
            None,
            &mut caches,
            selectors::context::QuirksMode::NoQuirks,
            selectors::matching::NeedsSelectorFlags::No,
            selectors::matching::MatchingForInvalidation::No,
        );
        self.selectors.iter().any(|selector| {
            selectors::matching::matches_selector(selector, 0, None, &elem, &mut context)
        })
    }
}

/// Query helpers, in the spirit of `querySelectorAll`.
impl Document {
    /// All elements under `scope` (exclusive) matching `group`, in document order.
    pub fn select_within(&self, scope: NodeId, group: &SelectorGroup) -> Vec<NodeId> {
        self.descendants(scope)
            .filter(|&id| group.matches(self, id))
            .collect()
    }

    /// All matching elements in the document, in document order.
    pub fn select(&self, group: &SelectorGroup) -> Vec<NodeId> {
        self.select_within(self.document(), group)
    }

    /// First matching element in document order.
    pub fn select_first(&self, group: &SelectorGroup) -> Option<NodeId> {
        self.descendants(self.document())
            .find(|&id| group.matches(self, id))
    }

    /// Count matches under `scope` without collecting them.
    pub fn count_within(&self, scope: NodeId, group: &SelectorGroup) -> usize {
        self.descendants(scope)
            .filter(|&id| group.matches(self, id))
            .count()
    }
}
