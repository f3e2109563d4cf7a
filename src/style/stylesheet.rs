//! Stylesheet parsing restricted to the properties that affect visibility.

use std::cmp::Ordering;

use cssparser::{
    AtRuleParser, DeclarationParser, ParseError, Parser, ParserInput, QualifiedRuleParser,
    RuleBodyItemParser, RuleBodyParser, StyleSheetParser, Token,
};
use selectors::parser::Selector;

use crate::dom::{ReadSelectors, SelectorGroup};

/// Value of the `display` property, reduced to what layout and visibility use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Display {
    #[default]
    Inline,
    Block,
    ListItem,
    None,
}

/// Value of the `visibility` property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
    Collapse,
}

/// A declaration the cascade understands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Declaration {
    Display(Display),
    Visibility(Visibility),
    Opacity(f32),
    /// `inherit` on `visibility`; the other properties do not inherit.
    InheritVisibility,
}

/// A CSS rule with selectors and the declarations we kept.
#[derive(Debug, Clone)]
pub struct CssRule {
    pub selectors: SelectorGroup,
    pub declarations: Vec<Declaration>,
    pub important_declarations: Vec<Declaration>,
    pub specificity: Specificity,
}

/// CSS specificity for cascade ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Specificity {
    pub ids: u16,
    pub classes: u16,
    pub elements: u16,
}

impl Specificity {
    /// Specificity of inline `style` attributes, above any selector.
    pub const INLINE: Specificity = Specificity {
        ids: u16::MAX,
        classes: 0,
        elements: 0,
    };

    pub fn from_selector(selector: &Selector<ReadSelectors>) -> Self {
        let spec = selector.specificity();
        // Packed as (id << 20) | (class << 10) | elements.
        Self {
            ids: ((spec >> 20) & 0x3FF) as u16,
            classes: ((spec >> 10) & 0x3FF) as u16,
            elements: (spec & 0x3FF) as u16,
        }
    }
}

impl Ord for Specificity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ids
            .cmp(&other.ids)
            .then(self.classes.cmp(&other.classes))
            .then(self.elements.cmp(&other.elements))
    }
}

impl PartialOrd for Specificity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Origin of a style (for cascade ordering).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Origin {
    UserAgent = 0,
    Author = 1,
}

/// Browser defaults that matter for deciding what is rendered.
pub const USER_AGENT_CSS: &str = r#"
head, script, style, noscript, template, title, meta, link, base { display: none; }
[hidden] { display: none; }
address, article, aside, blockquote, body, center, dd, details, dialog, div, dl, dt,
fieldset, figcaption, figure, footer, form, h1, h2, h3, h4, h5, h6, header, hgroup,
hr, html, main, menu, nav, ol, p, pre, section, summary, table, ul { display: block; }
li { display: list-item; }
"#;

/// A parsed CSS stylesheet.
#[derive(Debug, Default, Clone)]
pub struct Stylesheet {
    pub rules: Vec<CssRule>,
}

impl Stylesheet {
    /// Parse a stylesheet. Unknown at-rules, bad selectors and unsupported
    /// properties are skipped.
    pub fn parse(css: &str) -> Self {
        let mut input = ParserInput::new(css);
        let mut parser = Parser::new(&mut input);
        let mut rules = Vec::new();

        let mut rule_parser = TopLevelRuleParser { rules: &mut rules };
        for result in StyleSheetParser::new(&mut parser, &mut rule_parser) {
            if let Err((_, slice)) = result {
                tracing::trace!(rule = slice, "skipping unsupported css rule");
            }
        }

        Self { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Parse the declarations of an inline `style` attribute.
///
/// Returns `(normal, important)` declarations in source order.
pub fn parse_inline_style(style_attr: &str) -> (Vec<Declaration>, Vec<Declaration>) {
    let mut input = ParserInput::new(style_attr);
    let mut parser = Parser::new(&mut input);
    let mut block = DeclarationBlock::default();
    for result in RuleBodyParser::new(&mut parser, &mut block) {
        let _ = result;
    }
    (block.declarations, block.important_declarations)
}

struct TopLevelRuleParser<'a> {
    rules: &'a mut Vec<CssRule>,
}

impl<'i> AtRuleParser<'i> for TopLevelRuleParser<'_> {
    type Prelude = ();
    type AtRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        _name: cssparser::CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }
}

impl<'i> QualifiedRuleParser<'i> for TopLevelRuleParser<'_> {
    type Prelude = Vec<Selector<ReadSelectors>>;
    type QualifiedRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        let location = input.current_source_location();
        let list = selectors::parser::SelectorList::parse(
            &ReadSelectors,
            input,
            selectors::parser::ParseRelative::No,
        )
        .map_err(|_| location.new_custom_error(()))?;
        Ok(list.slice().to_vec())
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        _start: &cssparser::ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::QualifiedRule, ParseError<'i, Self::Error>> {
        let mut block = DeclarationBlock::default();
        for result in RuleBodyParser::new(input, &mut block) {
            let _ = result;
        }
        if block.declarations.is_empty() && block.important_declarations.is_empty() {
            return Ok(());
        }

        // One rule per selector so each keeps its own specificity.
        for selector in prelude {
            self.rules.push(CssRule {
                specificity: Specificity::from_selector(&selector),
                selectors: SelectorGroup::from_selectors(vec![selector]),
                declarations: block.declarations.clone(),
                important_declarations: block.important_declarations.clone(),
            });
        }
        Ok(())
    }
}

#[derive(Default)]
struct DeclarationBlock {
    declarations: Vec<Declaration>,
    important_declarations: Vec<Declaration>,
}

impl<'i> AtRuleParser<'i> for DeclarationBlock {
    type Prelude = ();
    type AtRule = ();
    type Error = ();
}

impl<'i> QualifiedRuleParser<'i> for DeclarationBlock {
    type Prelude = ();
    type QualifiedRule = ();
    type Error = ();
}

impl<'i> DeclarationParser<'i> for DeclarationBlock {
    type Declaration = ();
    type Error = ();

    fn parse_value<'t>(
        &mut self,
        name: cssparser::CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
        _start: &cssparser::ParserState,
    ) -> Result<Self::Declaration, ParseError<'i, Self::Error>> {
        let value = parse_property_value(&name.to_ascii_lowercase(), input);
        let important = input.try_parse(cssparser::parse_important).is_ok();
        // Swallow anything left over, e.g. `display: flex !important` variants.
        while input.next().is_ok() {}

        if let Some(decl) = value {
            if important {
                self.important_declarations.push(decl);
            } else {
                self.declarations.push(decl);
            }
        }
        Ok(())
    }
}

impl<'i> RuleBodyItemParser<'i, (), ()> for DeclarationBlock {
    fn parse_declarations(&self) -> bool {
        true
    }
    fn parse_qualified(&self) -> bool {
        false
    }
}

fn parse_property_value(property: &str, input: &mut Parser<'_, '_>) -> Option<Declaration> {
    match property {
        "display" => parse_display(input),
        "visibility" => parse_visibility(input),
        "opacity" => parse_opacity(input),
        _ => None,
    }
}

fn parse_display(input: &mut Parser<'_, '_>) -> Option<Declaration> {
    let token = input.expect_ident_cloned().ok()?;
    let display = match token.to_ascii_lowercase().as_str() {
        "none" => Display::None,
        "inline" | "inline-block" | "inline-flex" | "inline-grid" | "contents" => {
            Display::Inline
        }
        "list-item" => Display::ListItem,
        "block" | "flex" | "grid" | "flow-root" | "table" | "table-row" | "table-cell"
        | "table-row-group" | "table-caption" => Display::Block,
        _ => return None,
    };
    Some(Declaration::Display(display))
}

fn parse_visibility(input: &mut Parser<'_, '_>) -> Option<Declaration> {
    let token = input.expect_ident_cloned().ok()?;
    let visibility = match token.to_ascii_lowercase().as_str() {
        "visible" => Visibility::Visible,
        "hidden" => Visibility::Hidden,
        "collapse" => Visibility::Collapse,
        "inherit" => return Some(Declaration::InheritVisibility),
        _ => return None,
    };
    Some(Declaration::Visibility(visibility))
}

fn parse_opacity(input: &mut Parser<'_, '_>) -> Option<Declaration> {
    let value = match input.next().ok()? {
        Token::Number { value, .. } => *value,
        Token::Percentage { unit_value, .. } => *unit_value,
        _ => return None,
    };
    Some(Declaration::Opacity(value.clamp(0.0, 1.0)))
}
