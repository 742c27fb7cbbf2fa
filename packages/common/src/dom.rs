//! # Rendering-Surface Abstraction
//!
//! The overlay subsystem never touches a real DOM. Geometry consumes the
//! [`Measurable`] capability, and structural queries (outside-click
//! containment, element-under-pointer) go through an [`ElementTree`] the
//! embedder keeps in sync with its render tree.
//!
//! `FixedBox` is the in-crate stand-in for tests and headless embedders,
//! living next to the trait the same way a mock filesystem lives next to
//! the real one.

use std::collections::HashMap;

use crate::geometry::Rect;

/// Something with a measurable box: a rendered element, or a stand-in
pub trait Measurable {
    fn bounding_rect(&self) -> Rect;

    fn offset_width(&self) -> f64 {
        self.bounding_rect().width
    }

    fn offset_height(&self) -> f64 {
        self.bounding_rect().height
    }
}

/// Fixed-size measurable for tests and headless embedders
#[derive(Debug, Clone, Copy)]
pub struct FixedBox {
    pub rect: Rect,
}

impl FixedBox {
    pub fn new(rect: Rect) -> Self {
        Self { rect }
    }

    pub fn sized(width: f64, height: f64) -> Self {
        Self {
            rect: Rect::new(0.0, 0.0, width, height),
        }
    }
}

impl Measurable for FixedBox {
    fn bounding_rect(&self) -> Rect {
        self.rect
    }
}

/// Opaque handle to a rendered element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

/// Parent-pointer registry of rendered elements.
///
/// Containment is an ancestry walk, which is how outside-click detection
/// is specified: a click counts as "inside" an overlay when its target is
/// the overlay root or any descendant, never by coordinate comparison.
#[derive(Debug, Default)]
pub struct ElementTree {
    parents: HashMap<ElementId, ElementId>,
    rects: HashMap<ElementId, Rect>,
    order: Vec<ElementId>,
    next_id: u64,
}

impl ElementTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a root element (no parent)
    pub fn insert_root(&mut self, rect: Rect) -> ElementId {
        self.insert_inner(None, rect)
    }

    /// Register an element under `parent`
    pub fn insert(&mut self, parent: ElementId, rect: Rect) -> ElementId {
        self.insert_inner(Some(parent), rect)
    }

    fn insert_inner(&mut self, parent: Option<ElementId>, rect: Rect) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        if let Some(parent) = parent {
            self.parents.insert(id, parent);
        }
        self.rects.insert(id, rect);
        self.order.push(id);
        id
    }

    pub fn remove(&mut self, id: ElementId) {
        self.parents.remove(&id);
        self.rects.remove(&id);
        self.order.retain(|e| *e != id);
    }

    pub fn set_rect(&mut self, id: ElementId, rect: Rect) {
        if let Some(slot) = self.rects.get_mut(&id) {
            *slot = rect;
        }
    }

    /// Rect lookups can fail for stale handles; callers treat that as
    /// "not ready", not as an error.
    pub fn rect(&self, id: ElementId) -> Option<Rect> {
        self.rects.get(&id).copied()
    }

    /// True when `node` is `ancestor` or a descendant of it
    pub fn contains(&self, ancestor: ElementId, node: ElementId) -> bool {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.parents.get(&id).copied();
        }
        false
    }

    /// Topmost element whose box covers the point, if any.
    ///
    /// "Topmost" is most-recently registered, matching paint order for the
    /// flat overlay layers this subsystem cares about.
    pub fn element_at(&self, x: f64, y: f64) -> Option<ElementId> {
        self.order
            .iter()
            .rev()
            .find(|id| {
                self.rects
                    .get(id)
                    .map(|r| r.contains_point(x, y))
                    .unwrap_or(false)
            })
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn containment_walks_ancestry() {
        let mut tree = ElementTree::new();
        let root = tree.insert_root(Rect::new(0.0, 0.0, 800.0, 600.0));
        let child = tree.insert(root, Rect::new(10.0, 10.0, 100.0, 20.0));
        let grandchild = tree.insert(child, Rect::new(12.0, 12.0, 10.0, 10.0));
        let sibling = tree.insert_root(Rect::new(0.0, 0.0, 50.0, 50.0));

        assert!(tree.contains(root, grandchild));
        assert!(tree.contains(child, child));
        assert!(!tree.contains(child, sibling));
        assert!(!tree.contains(grandchild, root));
    }

    #[test]
    fn stale_handle_has_no_rect() {
        let mut tree = ElementTree::new();
        let el = tree.insert_root(Rect::new(0.0, 0.0, 10.0, 10.0));
        tree.remove(el);
        assert_eq!(tree.rect(el), None);
    }

    #[test]
    fn element_at_prefers_topmost() {
        let mut tree = ElementTree::new();
        let below = tree.insert_root(Rect::new(0.0, 0.0, 100.0, 100.0));
        let above = tree.insert_root(Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(tree.element_at(50.0, 50.0), Some(above));
        tree.remove(above);
        assert_eq!(tree.element_at(50.0, 50.0), Some(below));
        assert_eq!(tree.element_at(500.0, 500.0), None);
    }
}
