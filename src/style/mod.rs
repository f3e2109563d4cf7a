//! Computed visibility.
//!
//! A small cascade over the user-agent defaults, every `<style>` element of
//! the page, and inline `style` attributes. Only `display`, `visibility` and
//! `opacity` are computed; that is all the extractor and the flow layout
//! need to decide whether something is rendered.

mod stylesheet;

pub use stylesheet::{
    CssRule, Declaration, Display, Origin, Specificity, Stylesheet, USER_AGENT_CSS, Visibility,
    parse_inline_style,
};

use std::cell::RefCell;
use std::collections::HashMap;

use crate::dom::{Document, NodeData, NodeId};

/// Style values computed for one element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComputedStyle {
    pub display: Display,
    pub visibility: Visibility,
    pub opacity: f32,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: Display::Inline,
            visibility: Visibility::Visible,
            opacity: 1.0,
        }
    }
}

impl ComputedStyle {
    /// True when the element itself paints nothing: `display: none`,
    /// `visibility: hidden|collapse`, or `opacity: 0`.
    pub fn is_hidden(&self) -> bool {
        self.display == Display::None
            || self.visibility != Visibility::Visible
            || self.opacity <= 0.0
    }

    pub fn is_block(&self) -> bool {
        matches!(self.display, Display::Block | Display::ListItem)
    }

    fn inherit_from(parent: &ComputedStyle) -> Self {
        Self {
            visibility: parent.visibility,
            ..Self::default()
        }
    }
}

#[derive(Debug)]
struct MatchedRule<'a> {
    declaration: &'a Declaration,
    origin: Origin,
    specificity: Specificity,
    order: usize,
    important: bool,
}

/// Resolves [`ComputedStyle`]s for elements of one document.
///
/// Results are memoized per node, so the resolver must not outlive changes
/// to the document it was built for.
pub struct StyleResolver {
    stylesheets: Vec<(Stylesheet, Origin)>,
    cache: RefCell<HashMap<NodeId, ComputedStyle>>,
}

impl StyleResolver {
    /// Collect the page's stylesheets.
    pub fn new(doc: &Document) -> Self {
        let mut stylesheets = vec![(Stylesheet::parse(USER_AGENT_CSS), Origin::UserAgent)];

        for id in doc.descendants(doc.document()) {
            if !doc.has_tag(id, "style") {
                continue;
            }
            let css = doc.child_text(id);
            let sheet = Stylesheet::parse(&css);
            if !sheet.is_empty() {
                stylesheets.push((sheet, Origin::Author));
            }
        }

        tracing::trace!(sheets = stylesheets.len(), "collected stylesheets");
        Self {
            stylesheets,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// A resolver that only knows the user-agent defaults and inline styles.
    pub fn defaults() -> Self {
        Self {
            stylesheets: vec![(Stylesheet::parse(USER_AGENT_CSS), Origin::UserAgent)],
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Add an author stylesheet (for hosts that fetched linked CSS).
    pub fn add_stylesheet(&mut self, sheet: Stylesheet) {
        self.stylesheets.push((sheet, Origin::Author));
        self.cache.get_mut().clear();
    }

    /// Computed style of `id`. Non-element nodes get their parent's style.
    pub fn computed(&self, doc: &Document, id: NodeId) -> ComputedStyle {
        if let Some(style) = self.cache.borrow().get(&id) {
            return *style;
        }

        // Climb to the nearest resolved element, then cascade back down so
        // every parent is computed before its children.
        let mut pending = vec![id];
        let mut inherited = None;
        for ancestor in doc.ancestors(id).take_while(|&a| doc.is_element(a)) {
            if let Some(style) = self.cache.borrow().get(&ancestor) {
                inherited = Some(*style);
                break;
            }
            pending.push(ancestor);
        }

        for &node in pending.iter().rev() {
            let style = match doc.get(node).map(|n| &n.data) {
                Some(NodeData::Element { .. }) => self.cascade(doc, node, inherited.as_ref()),
                _ => inherited.unwrap_or_default(),
            };
            self.cache.borrow_mut().insert(node, style);
            inherited = Some(style);
        }
        inherited.unwrap_or_default()
    }

    /// True when neither `id` nor any ancestor has `display: none`.
    pub fn is_rendered(&self, doc: &Document, id: NodeId) -> bool {
        std::iter::once(id)
            .chain(doc.ancestors(id))
            .filter(|&a| doc.is_element(a))
            .all(|a| self.computed(doc, a).display != Display::None)
    }

    fn cascade(
        &self,
        doc: &Document,
        id: NodeId,
        parent_style: Option<&ComputedStyle>,
    ) -> ComputedStyle {
        let mut matched: Vec<MatchedRule> = Vec::with_capacity(8);
        let mut order = 0;

        for (sheet, origin) in &self.stylesheets {
            for rule in &sheet.rules {
                if !rule.selectors.matches(doc, id) {
                    continue;
                }
                push_declarations(&mut matched, rule, *origin, &mut order);
            }
        }

        let inline = doc.get_attr(id, "style").map(parse_inline_style);
        if let Some((normal, forced)) = &inline {
            for (decls, important) in [(normal, false), (forced, true)] {
                for declaration in decls {
                    matched.push(MatchedRule {
                        declaration,
                        origin: Origin::Author,
                        specificity: Specificity::INLINE,
                        order,
                        important,
                    });
                    order += 1;
                }
            }
        }

        // Ascending precedence: the last applied declaration wins.
        matched.sort_by(|a, b| {
            a.important
                .cmp(&b.important)
                .then_with(|| {
                    if a.important {
                        b.origin.cmp(&a.origin)
                    } else {
                        a.origin.cmp(&b.origin)
                    }
                })
                .then(a.specificity.cmp(&b.specificity))
                .then(a.order.cmp(&b.order))
        });

        let mut style = parent_style
            .map(ComputedStyle::inherit_from)
            .unwrap_or_default();
        for rule in &matched {
            apply_declaration(&mut style, rule.declaration, parent_style);
        }
        style
    }
}

fn push_declarations<'a>(
    matched: &mut Vec<MatchedRule<'a>>,
    rule: &'a CssRule,
    origin: Origin,
    order: &mut usize,
) {
    for (decls, important) in [
        (&rule.declarations, false),
        (&rule.important_declarations, true),
    ] {
        for declaration in decls {
            matched.push(MatchedRule {
                declaration,
                origin,
                specificity: rule.specificity,
                order: *order,
                important,
            });
            *order += 1;
        }
    }
}

fn apply_declaration(
    style: &mut ComputedStyle,
    decl: &Declaration,
    parent_style: Option<&ComputedStyle>,
) {
    match *decl {
        Declaration::Display(d) => style.display = d,
        Declaration::Visibility(v) => style.visibility = v,
        Declaration::Opacity(o) => style.opacity = o,
        Declaration::InheritVisibility => {
            style.visibility = parent_style.map(|p| p.visibility).unwrap_or_default();
        }
    }
}
