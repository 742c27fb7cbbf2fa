//! # Geometry Value Types
//!
//! Viewport-coordinate rectangles and the overlay positioning output.
//!
//! All types here are immutable value types: every computation produces a
//! fresh value, nothing is adjusted in place. This is what makes the
//! positioning code re-derivable for the same inputs.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in viewport coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.left + self.width / 2.0
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.left && x <= self.right() && y >= self.top && y <= self.bottom()
    }
}

/// Where an absolutely-positioned overlay element should go
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayPosition {
    pub top: f64,
    pub left: f64,
    pub opacity: f64,
}

impl OverlayPosition {
    /// Off-screen parked position. Overlays are never unmounted, only
    /// parked, so reappearing does not re-run mount side effects.
    pub const PARKED: OverlayPosition = OverlayPosition {
        top: -10000.0,
        left: -10000.0,
        opacity: 0.0,
    };

    pub fn visible(top: f64, left: f64) -> Self {
        Self {
            top,
            left,
            opacity: 1.0,
        }
    }

    pub fn is_parked(&self) -> bool {
        self.opacity == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_edges() {
        let r = Rect::new(10.0, 20.0, 100.0, 50.0);
        assert_eq!(r.right(), 120.0);
        assert_eq!(r.bottom(), 60.0);
        assert_eq!(r.center_x(), 70.0);
    }

    #[test]
    fn parked_position_is_invisible() {
        assert!(OverlayPosition::PARKED.is_parked());
        assert!(!OverlayPosition::visible(0.0, 0.0).is_parked());
    }
}
