//! # Document Mutations
//!
//! Range-scoped edits the engine applies for dispatched commands: inline
//! format toggles, link wrapping/unwrapping, block-kind changes.
//!
//! Every mutation validates before touching the tree and works at run
//! granularity: a run the range touches is restyled whole. Callers reach
//! these only through an update scope, so the transactional discipline is
//! enforced upstream.

use scribe_doc::{
    Block, BlockKind, Document, InlineNode, LinkNode, ListTag, NodeKey, TextFormat, TextRun,
};
use thiserror::Error;

use crate::selection::RangeSelection;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Block not found: {0:?}")]
    BlockNotFound(NodeKey),

    #[error("Block {0:?} has no inline content")]
    NotATextBlock(NodeKey),
}

fn require_text_block(doc: &Document, key: NodeKey) -> Result<(), MutationError> {
    match doc.block(key) {
        None => Err(MutationError::BlockNotFound(key)),
        Some(Block::Poll { .. }) => Err(MutationError::NotATextBlock(key)),
        Some(Block::Text { .. }) => Ok(()),
    }
}

fn for_each_covered_run(
    doc: &mut Document,
    range: &RangeSelection,
    mut apply: impl FnMut(&mut TextRun),
) {
    let keys: Vec<NodeKey> = doc.blocks.iter().map(|b| b.key()).collect();
    for key in keys {
        let covered = {
            let Some(block) = doc.block(key) else { continue };
            if block.children().is_empty() {
                continue;
            }
            range.covered_children(doc, block)
        };
        if covered.is_empty() {
            continue;
        }
        // Skip blocks entirely outside the selection
        if range.anchor.block != key
            && range.focus.block != key
            && !block_between(doc, range, key)
        {
            continue;
        }
        if let Some(children) = doc.block_mut(key).and_then(Block::children_mut) {
            for node in &mut children[covered] {
                match node {
                    InlineNode::Text(run) => apply(run),
                    InlineNode::Link(link) => {
                        for run in &mut link.children {
                            apply(run);
                        }
                    }
                }
            }
        }
    }
}

fn block_between(doc: &Document, range: &RangeSelection, key: NodeKey) -> bool {
    let (Some(a), Some(f), Some(b)) = (
        doc.index_of(range.anchor.block),
        doc.index_of(range.focus.block),
        doc.index_of(key),
    ) else {
        return false;
    };
    let (lo, hi) = if a <= f { (a, f) } else { (f, a) };
    lo < b && b < hi
}

/// Toggle an inline mark over the selection: if every touched run already
/// carries it, remove it everywhere; otherwise add it everywhere.
pub fn toggle_format(
    doc: &mut Document,
    range: &RangeSelection,
    format: TextFormat,
) -> Result<(), MutationError> {
    require_text_block(doc, range.anchor.block)?;
    let all_have = range.shared_style(doc).has(format);
    for_each_covered_run(doc, range, |run| {
        if run.style.has(format) == all_have {
            run.style.toggle(format);
        }
    });
    Ok(())
}

/// Toggle a link over the selection.
///
/// `Some(url)` retargets the containing link when there is one, otherwise
/// wraps the covered runs of the anchor block. `None` unwraps any link the
/// selection touches back into plain runs.
pub fn toggle_link(
    doc: &mut Document,
    range: &RangeSelection,
    url: Option<String>,
) -> Result<(), MutationError> {
    require_text_block(doc, range.anchor.block)?;

    match url {
        Some(url) => {
            // Retarget the containing link when either endpoint is in one
            for point in [&range.anchor, &range.focus] {
                if let Some(children) = doc.block_mut(point.block).and_then(Block::children_mut) {
                    if let Some(InlineNode::Link(link)) = children.get_mut(point.child) {
                        link.url = url;
                        return Ok(());
                    }
                }
            }
            wrap_in_link(doc, range, url)
        }
        None => {
            unwrap_links(doc, range);
            Ok(())
        }
    }
}

fn wrap_in_link(
    doc: &mut Document,
    range: &RangeSelection,
    url: String,
) -> Result<(), MutationError> {
    let key = range.anchor.block;
    let covered = {
        let block = doc
            .block(key)
            .ok_or(MutationError::BlockNotFound(key))?;
        range.covered_children(doc, block)
    };
    let children = doc
        .block_mut(key)
        .and_then(Block::children_mut)
        .ok_or(MutationError::NotATextBlock(key))?;
    if covered.is_empty() {
        return Ok(());
    }

    let mut runs = Vec::new();
    for node in children.drain(covered.clone()) {
        match node {
            InlineNode::Text(run) => runs.push(run),
            InlineNode::Link(link) => runs.extend(link.children),
        }
    }
    children.insert(covered.start, InlineNode::Link(LinkNode { url, children: runs }));
    Ok(())
}

fn unwrap_links(doc: &mut Document, range: &RangeSelection) {
    for point in [&range.anchor, &range.focus] {
        let Some(children) = doc.block_mut(point.block).and_then(Block::children_mut) else {
            continue;
        };
        if let Some(InlineNode::Link(_)) = children.get(point.child) {
            let InlineNode::Link(link) = children.remove(point.child) else {
                unreachable!()
            };
            let at = point.child;
            for (offset, run) in link.children.into_iter().enumerate() {
                children.insert(at + offset, InlineNode::Text(run));
            }
            return;
        }
    }
}

/// Change the block kind of every text block the selection touches
pub fn set_block_kind(
    doc: &mut Document,
    range: &RangeSelection,
    kind: BlockKind,
) -> Result<(), MutationError> {
    require_text_block(doc, range.anchor.block)?;
    let (Some(a), Some(f)) = (
        doc.index_of(range.anchor.block),
        doc.index_of(range.focus.block),
    ) else {
        return Err(MutationError::BlockNotFound(range.anchor.block));
    };
    let (lo, hi) = if a <= f { (a, f) } else { (f, a) };
    for block in &mut doc.blocks[lo..=hi] {
        if let Block::Text { kind: slot, .. } = block {
            *slot = kind;
        }
    }
    Ok(())
}

pub fn insert_list(
    doc: &mut Document,
    range: &RangeSelection,
    tag: ListTag,
) -> Result<(), MutationError> {
    set_block_kind(doc, range, BlockKind::List(tag))
}

pub fn remove_list(doc: &mut Document, range: &RangeSelection) -> Result<(), MutationError> {
    set_block_kind(doc, range, BlockKind::Paragraph)
}
