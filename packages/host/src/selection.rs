//! # Selection Types
//!
//! The engine-side selection (points into the document tree) and the
//! DOM-side native-selection snapshot the embedder reports.
//!
//! Engine selection queries always run against a committed document
//! snapshot, inside a read boundary; none of them mutate anything.

use scribe_common::dom::ElementId;
use scribe_common::geometry::Rect;
use scribe_doc::{Block, BlockKind, Document, InlineNode, InlineStyle, NodeKey};
use serde::{Deserialize, Serialize};

/// One end of a range selection: a position inside a block's inline content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextPoint {
    pub block: NodeKey,
    /// Index into the block's inline children
    pub child: usize,
    /// Character offset within that child's text content
    pub offset: usize,
}

impl TextPoint {
    pub fn new(block: NodeKey, child: usize, offset: usize) -> Self {
        Self {
            block,
            child,
            offset,
        }
    }
}

/// A text-range selection between two points
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeSelection {
    pub anchor: TextPoint,
    pub focus: TextPoint,
}

impl RangeSelection {
    pub fn new(anchor: TextPoint, focus: TextPoint) -> Self {
        Self { anchor, focus }
    }

    /// Caret: anchor and focus coincide
    pub fn caret(block: NodeKey, child: usize, offset: usize) -> Self {
        let point = TextPoint::new(block, child, offset);
        Self::new(point, point)
    }

    /// Range within a single block
    pub fn within_block(
        block: NodeKey,
        start_child: usize,
        start_offset: usize,
        end_child: usize,
        end_offset: usize,
    ) -> Self {
        Self::new(
            TextPoint::new(block, start_child, start_offset),
            TextPoint::new(block, end_child, end_offset),
        )
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// Anchor and focus ordered by document position
    fn ordered(&self, doc: &Document) -> (TextPoint, TextPoint) {
        let a_block = doc.index_of(self.anchor.block);
        let f_block = doc.index_of(self.focus.block);
        let a = (a_block, self.anchor.child, self.anchor.offset);
        let f = (f_block, self.focus.child, self.focus.offset);
        if a <= f {
            (self.anchor, self.focus)
        } else {
            (self.focus, self.anchor)
        }
    }

    /// Character offset of a point within its block's flattened text
    fn flat_offset(block: &Block, point: &TextPoint) -> usize {
        let mut total = 0;
        for (index, child) in block.children().iter().enumerate() {
            let len = child.text_content().chars().count();
            if index == point.child {
                return total + point.offset.min(len);
            }
            total += len;
        }
        total
    }

    /// Text covered by the selection; blocks joined with line breaks
    pub fn text_content(&self, doc: &Document) -> String {
        if self.is_collapsed() {
            return String::new();
        }
        let (start, end) = self.ordered(doc);
        let (Some(start_index), Some(end_index)) =
            (doc.index_of(start.block), doc.index_of(end.block))
        else {
            return String::new();
        };

        let slice = |block: &Block, from: usize, to: usize| -> String {
            block
                .text_content()
                .chars()
                .skip(from)
                .take(to.saturating_sub(from))
                .collect()
        };

        if start_index == end_index {
            let block = &doc.blocks[start_index];
            let from = Self::flat_offset(block, &start);
            let to = Self::flat_offset(block, &end);
            return slice(block, from, to);
        }

        let mut parts = Vec::new();
        for index in start_index..=end_index {
            let block = &doc.blocks[index];
            let text = block.text_content();
            let len = text.chars().count();
            if index == start_index {
                parts.push(slice(block, Self::flat_offset(block, &start), len));
            } else if index == end_index {
                parts.push(slice(block, 0, Self::flat_offset(block, &end)));
            } else {
                parts.push(text);
            }
        }
        parts.join("\n")
    }

    /// Indices of the inline children a point range touches within `block`
    pub(crate) fn covered_children(&self, doc: &Document, block: &Block) -> std::ops::Range<usize> {
        let (start, end) = self.ordered(doc);
        let child_count = block.children().len();
        let from = if start.block == block.key() {
            start.child.min(child_count)
        } else {
            0
        };
        let to = if end.block == block.key() {
            (end.child + 1).min(child_count)
        } else {
            child_count
        };
        from..to.max(from)
    }

    /// Marks active across every run the selection touches.
    ///
    /// For a caret this is the style of the run under it, which is what the
    /// next keystroke would inherit.
    pub fn shared_style(&self, doc: &Document) -> InlineStyle {
        let style_of = |node: &InlineNode| -> Vec<InlineStyle> {
            match node {
                InlineNode::Text(run) => vec![run.style],
                InlineNode::Link(link) => link.children.iter().map(|r| r.style).collect(),
            }
        };

        let mut styles = Vec::new();
        let (start, end) = self.ordered(doc);
        let (Some(start_index), Some(end_index)) =
            (doc.index_of(start.block), doc.index_of(end.block))
        else {
            return InlineStyle::default();
        };

        if self.is_collapsed() {
            if let Some(node) = doc.blocks[start_index].children().get(start.child) {
                return style_of(node)
                    .into_iter()
                    .next()
                    .unwrap_or_default();
            }
            return InlineStyle::default();
        }

        for index in start_index..=end_index {
            let block = &doc.blocks[index];
            let range = self.covered_children(doc, block);
            for node in &block.children()[range] {
                styles.extend(style_of(node));
            }
        }

        let mut styles = styles.into_iter();
        let first = styles.next().unwrap_or_default();
        styles.fold(first, |acc, s| acc.intersect(&s))
    }

    /// URL of the link containing the selection, if either endpoint sits in
    /// one (the node or its parent, in DOM terms)
    pub fn containing_link_url(&self, doc: &Document) -> Option<String> {
        for point in [&self.anchor, &self.focus] {
            let block = doc.block(point.block)?;
            if let Some(InlineNode::Link(link)) = block.children().get(point.child) {
                return Some(link.url.clone());
            }
        }
        None
    }

    pub fn anchor_block_kind(&self, doc: &Document) -> Option<BlockKind> {
        doc.block(self.anchor.block).and_then(Block::kind)
    }

    /// Whether the anchor sits in ordinary text content (not an embed)
    pub fn is_text_anchor(&self, doc: &Document) -> bool {
        matches!(doc.block(self.anchor.block), Some(Block::Text { .. }))
    }
}

/// The committed engine selection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Selection {
    Range(RangeSelection),
    Node(NodeKey),
    #[default]
    None,
}

impl Selection {
    pub fn as_range(&self) -> Option<&RangeSelection> {
        match self {
            Selection::Range(range) => Some(range),
            _ => None,
        }
    }

    pub fn is_range(&self) -> bool {
        matches!(self, Selection::Range(_))
    }

    pub fn is_node(&self) -> bool {
        matches!(self, Selection::Node(_))
    }
}

/// DOM-side snapshot of the native selection, fed in by the embedder.
///
/// Rect lookups can fail after a re-render; a missing rect or an anchor
/// outside the editable root degrades to "no active selection" downstream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NativeSelection {
    pub anchor_element: Option<ElementId>,
    pub rect: Option<Rect>,
    pub collapsed: bool,
}
