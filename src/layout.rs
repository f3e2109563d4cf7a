//! Element geometry.
//!
//! Extraction only needs coarse boxes: whether a paragraph has any height,
//! and whether two paragraphs sit close together in one column. Hosts with a
//! real layout engine supply their own rectangles through [`FixedGeometry`];
//! everyone else gets [`FlowLayout`], a deterministic single-column estimate.

use std::collections::HashMap;

use crate::dom::{Document, NodeData, NodeId, collapse_whitespace};
use crate::style::{Display, StyleResolver};

/// Axis-aligned box in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// True when the horizontal extents intersect or touch.
    pub fn overlaps_horizontally(&self, other: &Rect) -> bool {
        self.left() <= other.right() && other.left() <= self.right()
    }
}

/// Source of bounding boxes for elements.
pub trait Geometry {
    /// Box of `id`, or `None` when the element has no known geometry.
    fn rect(&self, id: NodeId) -> Option<Rect>;
}

/// Rectangles supplied by the host.
#[derive(Debug, Clone, Default)]
pub struct FixedGeometry {
    rects: HashMap<NodeId, Rect>,
}

impl FixedGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: NodeId, rect: Rect) {
        self.rects.insert(id, rect);
    }

    pub fn with(mut self, id: NodeId, rect: Rect) -> Self {
        self.insert(id, rect);
        self
    }
}

impl Geometry for FixedGeometry {
    fn rect(&self, id: NodeId) -> Option<Rect> {
        self.rects.get(&id).copied()
    }
}

/// Tunables for [`FlowLayout`].
#[derive(Debug, Clone, Copy)]
pub struct FlowOptions {
    /// Viewport width.
    pub width: f32,
    pub line_height: f32,
    /// Average glyph advance, which sets characters per line.
    pub char_width: f32,
    /// Vertical gap after every block.
    pub block_margin: f32,
    /// Left indent of blockquotes and list items.
    pub indent: f32,
    /// Height of images without a `height` attribute.
    pub image_height: f32,
}

impl Default for FlowOptions {
    fn default() -> Self {
        Self {
            width: 800.0,
            line_height: 24.0,
            char_width: 8.0,
            block_margin: 16.0,
            indent: 40.0,
            image_height: 200.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlowKind {
    /// Not rendered; the whole subtree collapses to zero height.
    Hidden,
    Block,
    /// Replaced element with its own height (images, video).
    Replaced,
    Break,
    Inline,
    Text,
    /// Comments, doctypes.
    Ignored,
}

/// Single-column block-flow estimate.
///
/// Blocks stack vertically; the height of a run of inline content is the
/// number of lines its characters wrap to. Inline elements share the box of
/// their containing block. Elements with `display: none` and all their
/// descendants get zero-height boxes.
#[derive(Debug, Clone, Default)]
pub struct FlowLayout {
    rects: HashMap<NodeId, Rect>,
}

impl FlowLayout {
    /// Lay out `doc` with default options.
    pub fn compute(doc: &Document, styles: &StyleResolver) -> Self {
        Self::compute_with(doc, styles, FlowOptions::default())
    }

    pub fn compute_with(doc: &Document, styles: &StyleResolver, options: FlowOptions) -> Self {
        let mut engine = FlowEngine {
            doc,
            styles,
            options,
            rects: HashMap::new(),
        };
        engine.layout(doc.document());
        tracing::trace!(boxes = engine.rects.len(), "flow layout complete");
        Self {
            rects: engine.rects,
        }
    }
}

impl Geometry for FlowLayout {
    fn rect(&self, id: NodeId) -> Option<Rect> {
        self.rects.get(&id).copied()
    }
}

/// A block whose children are still being placed.
struct BlockFrame {
    id: NodeId,
    x: f32,
    y: f32,
    width: f32,
    cpl: usize,
    cursor: f32,
    run_chars: usize,
    run_lines: usize,
    children: Vec<NodeId>,
    next: usize,
    inline_elements: Vec<NodeId>,
}

struct FlowEngine<'a> {
    doc: &'a Document,
    styles: &'a StyleResolver,
    options: FlowOptions,
    rects: HashMap<NodeId, Rect>,
}

impl FlowEngine<'_> {
    fn kind(&self, id: NodeId) -> FlowKind {
        let Some(node) = self.doc.get(id) else {
            return FlowKind::Ignored;
        };
        match &node.data {
            NodeData::Text(_) => FlowKind::Text,
            NodeData::Document => FlowKind::Block,
            NodeData::Comment(_) | NodeData::Doctype { .. } => FlowKind::Ignored,
            NodeData::Element { name, .. } => {
                let style = self.styles.computed(self.doc, id);
                match (style.display, name.local.as_ref()) {
                    (Display::None, _) => FlowKind::Hidden,
                    (_, "img" | "video" | "canvas" | "svg" | "iframe") => FlowKind::Replaced,
                    (Display::Block | Display::ListItem, _) => FlowKind::Block,
                    (_, "br") => FlowKind::Break,
                    _ if self.has_block_descendant(id) => FlowKind::Block,
                    _ => FlowKind::Inline,
                }
            }
        }
    }

    fn has_block_descendant(&self, id: NodeId) -> bool {
        self.doc.descendants(id).any(|d| {
            self.doc.is_element(d) && self.styles.computed(self.doc, d).is_block()
        })
    }

    fn indent_for(&self, id: NodeId) -> f32 {
        if self.doc.has_tag(id, "blockquote") || self.doc.has_tag(id, "li") {
            self.options.indent
        } else {
            0.0
        }
    }

    fn chars_per_line(&self, width: f32) -> usize {
        ((width / self.options.char_width).floor() as usize).max(1)
    }

    /// Lay out the subtree under `root`.
    ///
    /// Nested blocks are kept on an explicit stack, so arbitrarily deep
    /// markup cannot exhaust the call stack.
    fn layout(&mut self, root: NodeId) {
        let mut stack = vec![self.open_block(root, 0.0, 0.0, self.options.width)];

        while let Some(frame) = stack.last_mut() {
            if let Some(child) = frame.children.get(frame.next).copied() {
                frame.next += 1;
                if let Some(nested) = self.place_child(frame, child) {
                    stack.push(nested);
                }
                continue;
            }

            let Some(mut done) = stack.pop() else {
                break;
            };
            let height = self.close_block(&mut done);
            if let Some(parent) = stack.last_mut() {
                parent.cursor += height + self.options.block_margin;
            }
        }
    }

    fn open_block(&self, id: NodeId, x: f32, y: f32, width: f32) -> BlockFrame {
        BlockFrame {
            id,
            x,
            y,
            width,
            cpl: self.chars_per_line(width),
            cursor: y,
            run_chars: 0,
            run_lines: 0,
            children: self.doc.children(id).collect(),
            next: 0,
            inline_elements: Vec::new(),
        }
    }

    /// Place one child of `frame`. A block child is returned as a new frame
    /// for the caller to descend into.
    fn place_child(&mut self, frame: &mut BlockFrame, child: NodeId) -> Option<BlockFrame> {
        match self.kind(child) {
            FlowKind::Ignored => {}
            FlowKind::Text => {
                let text = self.doc.text(child).unwrap_or_default();
                frame.run_chars += inline_chars(text);
            }
            FlowKind::Inline => {
                frame.run_chars += inline_chars(&self.doc.text_content(child));
                frame.inline_elements.push(child);
            }
            FlowKind::Break => {
                frame.run_lines += frame.run_chars.div_ceil(frame.cpl).max(1);
                frame.run_chars = 0;
                frame.inline_elements.push(child);
            }
            FlowKind::Hidden => {
                let flushed = self.flush(frame);
                frame.cursor += flushed;
                self.collapse(child, frame.x, frame.cursor, frame.width);
            }
            FlowKind::Replaced => {
                let flushed = self.flush(frame);
                frame.cursor += flushed;
                let height = self.replaced_height(child);
                self.rects
                    .insert(child, Rect::new(frame.x, frame.cursor, frame.width, height));
                frame.cursor += height;
            }
            FlowKind::Block => {
                let flushed = self.flush(frame);
                frame.cursor += flushed;
                let indent = self.indent_for(child);
                return Some(self.open_block(
                    child,
                    frame.x + indent,
                    frame.cursor,
                    (frame.width - indent).max(0.0),
                ));
            }
        }
        None
    }

    /// Record the finished block's box; returns its height.
    fn close_block(&mut self, frame: &mut BlockFrame) -> f32 {
        let flushed = self.flush(frame);
        frame.cursor += flushed;
        let rect = Rect::new(frame.x, frame.y, frame.width, frame.cursor - frame.y);
        self.rects.insert(frame.id, rect);
        for inline in std::mem::take(&mut frame.inline_elements) {
            self.share_rect(inline, rect);
        }
        rect.height
    }

    fn flush(&self, frame: &mut BlockFrame) -> f32 {
        let lines = frame.run_lines + frame.run_chars.div_ceil(frame.cpl);
        frame.run_chars = 0;
        frame.run_lines = 0;
        lines as f32 * self.options.line_height
    }

    fn replaced_height(&self, id: NodeId) -> f32 {
        self.doc
            .get_attr(id, "height")
            .and_then(|h| h.trim().trim_end_matches("px").parse::<f32>().ok())
            .filter(|h| h.is_finite() && *h >= 0.0)
            .unwrap_or(self.options.image_height)
    }

    /// Give an inline element and everything inside it the block's box.
    fn share_rect(&mut self, id: NodeId, rect: Rect) {
        self.rects.insert(id, rect);
        let inside: Vec<NodeId> = self.doc.descendants(id).collect();
        for d in inside {
            if self.doc.is_element(d) {
                self.rects.insert(d, rect);
            }
        }
    }

    /// Zero-height boxes for a non-rendered subtree.
    fn collapse(&mut self, id: NodeId, x: f32, y: f32, width: f32) {
        let rect = Rect::new(x, y, width, 0.0);
        self.rects.insert(id, rect);
        let inside: Vec<NodeId> = self.doc.descendants(id).collect();
        for d in inside {
            if self.doc.is_element(d) {
                self.rects.insert(d, rect);
            }
        }
    }
}

/// Characters an inline run contributes once whitespace collapses, plus one
/// for the gap to its neighbour.
fn inline_chars(text: &str) -> usize {
    let collapsed = collapse_whitespace(text);
    if collapsed.is_empty() {
        0
    } else {
        collapsed.chars().count() + 1
    }
}
