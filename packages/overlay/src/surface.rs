//! # Overlay Surface
//!
//! The seam between overlay controllers and whatever actually renders
//! them. Controllers only ever ask for box measurements, push positions,
//! and flip pointer capture; a real embedder backs this with its render
//! tree, tests back it with a recording stub.

use scribe_common::dom::{ElementId, FixedBox};
use scribe_common::geometry::{OverlayPosition, Rect};

/// Per-overlay rendering capabilities an embedder provides.
///
/// `None` measurements mean "not mounted yet / mid re-render"; controllers
/// treat that as not-ready and silently skip the positioning cycle.
pub trait OverlaySurface {
    /// Current box of the floating element itself
    fn overlay_box(&self) -> Option<FixedBox>;

    /// Box of the anchor container the overlay is clamped into
    fn container_box(&self) -> Option<FixedBox>;

    /// Root element of the overlay in the embedder's element tree, for
    /// containment-based outside-click checks
    fn overlay_root(&self) -> Option<ElementId>;

    /// Move/show/park the overlay element
    fn apply_position(&mut self, position: OverlayPosition);

    /// Enable or suspend pointer-event capture on the overlay element
    fn set_pointer_capture(&mut self, enabled: bool);

    /// Move input focus into the overlay's text field, if it has one
    fn focus_input(&mut self) {}
}

/// Recording stub surface for tests and headless use
pub struct RecordingSurface {
    pub overlay_rect: Option<Rect>,
    pub container_rect: Option<Rect>,
    pub root: Option<ElementId>,
    pub applied: Vec<OverlayPosition>,
    pub pointer_capture: bool,
    pub focus_requests: usize,
}

impl RecordingSurface {
    pub fn new(overlay_rect: Rect, container_rect: Rect) -> Self {
        Self {
            overlay_rect: Some(overlay_rect),
            container_rect: Some(container_rect),
            root: None,
            applied: Vec::new(),
            pointer_capture: true,
            focus_requests: 0,
        }
    }

    /// Surface with no measurements, as during mount
    pub fn unmounted() -> Self {
        Self {
            overlay_rect: None,
            container_rect: None,
            root: None,
            applied: Vec::new(),
            pointer_capture: true,
            focus_requests: 0,
        }
    }

    pub fn last_position(&self) -> Option<OverlayPosition> {
        self.applied.last().copied()
    }
}

impl OverlaySurface for RecordingSurface {
    fn overlay_box(&self) -> Option<FixedBox> {
        self.overlay_rect.map(FixedBox::new)
    }

    fn container_box(&self) -> Option<FixedBox> {
        self.container_rect.map(FixedBox::new)
    }

    fn overlay_root(&self) -> Option<ElementId> {
        self.root
    }

    fn apply_position(&mut self, position: OverlayPosition) {
        self.applied.push(position);
    }

    fn set_pointer_capture(&mut self, enabled: bool) {
        self.pointer_capture = enabled;
    }

    fn focus_input(&mut self) {
        self.focus_requests += 1;
    }
}
