//! # Overlay Positioning
//!
//! Pure geometry: a target rect (usually the native selection's bounding
//! box) plus measurements of the overlay and its anchor container go in, a
//! clamped viewport position comes out.
//!
//! No hidden state anywhere — the same inputs always produce the same
//! output, which is what the positioning-stability tests lean on. A `None`
//! target parks the overlay off-screen instead of unmounting it.

use scribe_common::dom::Measurable;
use scribe_common::geometry::{OverlayPosition, Rect};

/// Gap between the target rect and the overlay
pub const VERTICAL_GAP: f64 = 10.0;
/// Horizontal breathing room against container edges
pub const HORIZONTAL_OFFSET: f64 = 5.0;
/// How far below its trigger box the block-options dropdown sits
pub const DROPDOWN_GAP: f64 = 40.0;

fn clamp_to_container(top: f64, left: f64, overlay: Rect, container: Rect) -> (f64, f64) {
    let mut left = left;
    let mut top = top;
    if left + overlay.width > container.right() {
        left = container.right() - overlay.width - HORIZONTAL_OFFSET;
    }
    if left < container.left {
        left = container.left + HORIZONTAL_OFFSET;
    }
    if top + overlay.height > container.bottom() {
        top = container.bottom() - overlay.height - VERTICAL_GAP;
    }
    if top < container.top {
        top = container.top + VERTICAL_GAP;
    }
    (top, left)
}

/// Position a floating overlay against a selection rect.
///
/// Centered horizontally on the target and placed above it with a fixed
/// gap; flips below when that would cross the container's top edge, then
/// clamps so the overlay never extends past the container (edge clamping,
/// not scaling).
pub fn float_position(
    target: Option<Rect>,
    overlay: &dyn Measurable,
    container: &dyn Measurable,
) -> OverlayPosition {
    let Some(target) = target else {
        return OverlayPosition::PARKED;
    };
    let overlay_rect = overlay.bounding_rect();
    let container_rect = container.bounding_rect();

    let mut top = target.top - overlay_rect.height - VERTICAL_GAP;
    let left = target.center_x() - overlay.offset_width() / 2.0;

    if top < container_rect.top {
        top += overlay_rect.height + target.height + VERTICAL_GAP * 2.0;
    }

    let (top, left) = clamp_to_container(top, left, overlay_rect, container_rect);
    OverlayPosition::visible(top, left)
}

/// Position the link editor against a selection rect.
///
/// Same contract as [`float_position`], but the link editor sits below the
/// target (flipping above when it would cross the container's bottom).
pub fn link_editor_position(
    target: Option<Rect>,
    overlay: &dyn Measurable,
    container: &dyn Measurable,
) -> OverlayPosition {
    let Some(target) = target else {
        return OverlayPosition::PARKED;
    };
    let overlay_rect = overlay.bounding_rect();
    let container_rect = container.bounding_rect();

    let mut top = target.bottom() + VERTICAL_GAP;
    let left = target.center_x() - overlay.offset_width() / 2.0;

    if top + overlay_rect.height > container_rect.bottom() {
        top -= overlay_rect.height + target.height + VERTICAL_GAP * 2.0;
    }

    let (top, left) = clamp_to_container(top, left, overlay_rect, container_rect);
    OverlayPosition::visible(top, left)
}

/// Position the block-options dropdown relative to the toolbar's own box,
/// not the text selection.
pub fn dropdown_position(
    toolbar: Option<Rect>,
    dropdown: &dyn Measurable,
    container: &dyn Measurable,
) -> OverlayPosition {
    let Some(toolbar) = toolbar else {
        return OverlayPosition::PARKED;
    };
    let dropdown_rect = dropdown.bounding_rect();
    let container_rect = container.bounding_rect();

    let top = toolbar.top + DROPDOWN_GAP;
    let left = toolbar.left;
    let (top, left) = clamp_to_container(top, left, dropdown_rect, container_rect);
    OverlayPosition::visible(top, left)
}
