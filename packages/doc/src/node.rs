//! # Document Tree
//!
//! Block-level nodes containing inline runs, plus embedded widgets.
//!
//! The tree is a flat sequence of blocks; inline content is a sequence of
//! text runs, optionally wrapped in a link. Keys are assigned at creation
//! and never reused, so a key outliving its node simply stops resolving.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::poll::PollNode;
use crate::style::InlineStyle;

static NEXT_KEY: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a block node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeKey(pub u64);

impl NodeKey {
    /// Fresh, never-reused key
    pub fn next() -> Self {
        NodeKey(NEXT_KEY.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingTag {
    H2,
    H3,
    H4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListTag {
    Ul,
    Ol,
}

/// Block-level formatting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Paragraph,
    Heading(HeadingTag),
    Quote,
    Code,
    List(ListTag),
}

impl BlockKind {
    pub fn is_heading(&self) -> bool {
        matches!(self, BlockKind::Heading(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, BlockKind::List(_))
    }

    pub fn is_code(&self) -> bool {
        matches!(self, BlockKind::Code)
    }

    /// Display name for the block-options menu
    pub fn display_name(&self) -> &'static str {
        match self {
            BlockKind::Paragraph => "Text",
            BlockKind::Heading(HeadingTag::H2) => "Large Heading",
            BlockKind::Heading(HeadingTag::H3) => "Small Heading",
            BlockKind::Heading(HeadingTag::H4) => "Heading",
            BlockKind::Quote => "Quote",
            BlockKind::Code => "Code Block",
            BlockKind::List(ListTag::Ul) => "Bulleted List",
            BlockKind::List(ListTag::Ol) => "Numbered List",
        }
    }
}

/// A styled run of text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    #[serde(default)]
    pub style: InlineStyle,
}

impl TextRun {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: InlineStyle::default(),
        }
    }

    pub fn styled(text: impl Into<String>, style: InlineStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

/// Runs wrapped in a hyperlink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkNode {
    pub url: String,
    pub children: Vec<TextRun>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InlineNode {
    Text(TextRun),
    Link(LinkNode),
}

impl InlineNode {
    pub fn is_link(&self) -> bool {
        matches!(self, InlineNode::Link(_))
    }

    pub fn text_content(&self) -> String {
        match self {
            InlineNode::Text(run) => run.text.clone(),
            InlineNode::Link(link) => link.children.iter().map(|r| r.text.as_str()).collect(),
        }
    }
}

/// A block node: inline text content or an embedded widget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Block {
    Text {
        key: NodeKey,
        kind: BlockKind,
        children: Vec<InlineNode>,
    },
    Poll {
        key: NodeKey,
        poll: PollNode,
    },
}

impl Block {
    pub fn paragraph(children: Vec<InlineNode>) -> Self {
        Block::Text {
            key: NodeKey::next(),
            kind: BlockKind::Paragraph,
            children,
        }
    }

    pub fn poll(poll: PollNode) -> Self {
        Block::Poll {
            key: NodeKey::next(),
            poll,
        }
    }

    pub fn key(&self) -> NodeKey {
        match self {
            Block::Text { key, .. } | Block::Poll { key, .. } => *key,
        }
    }

    pub fn kind(&self) -> Option<BlockKind> {
        match self {
            Block::Text { kind, .. } => Some(*kind),
            Block::Poll { .. } => None,
        }
    }

    pub fn children(&self) -> &[InlineNode] {
        match self {
            Block::Text { children, .. } => children,
            Block::Poll { .. } => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<InlineNode>> {
        match self {
            Block::Text { children, .. } => Some(children),
            Block::Poll { .. } => None,
        }
    }

    pub fn as_poll(&self) -> Option<&PollNode> {
        match self {
            Block::Poll { poll, .. } => Some(poll),
            Block::Text { .. } => None,
        }
    }

    pub fn as_poll_mut(&mut self) -> Option<&mut PollNode> {
        match self {
            Block::Poll { poll, .. } => Some(poll),
            Block::Text { .. } => None,
        }
    }

    pub fn text_content(&self) -> String {
        self.children()
            .iter()
            .map(|n| n.text_content())
            .collect::<Vec<_>>()
            .join("")
    }
}

/// The committed document tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block(&self, key: NodeKey) -> Option<&Block> {
        self.blocks.iter().find(|b| b.key() == key)
    }

    pub fn block_mut(&mut self, key: NodeKey) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|b| b.key() == key)
    }

    pub fn index_of(&self, key: NodeKey) -> Option<usize> {
        self.blocks.iter().position(|b| b.key() == key)
    }

    /// Remove a block and all its content. Unknown keys are a no-op.
    pub fn remove_block(&mut self, key: NodeKey) -> Option<Block> {
        let index = self.index_of(key)?;
        Some(self.blocks.remove(index))
    }

    pub fn poll(&self, key: NodeKey) -> Option<&PollNode> {
        self.block(key).and_then(Block::as_poll)
    }

    pub fn poll_mut(&mut self, key: NodeKey) -> Option<&mut PollNode> {
        self.block_mut(key).and_then(Block::as_poll_mut)
    }
}
