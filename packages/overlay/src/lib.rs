//! # Scribe Overlay
//!
//! Selection-synchronized floating UI for the scribe editor: the
//! text-format toolbar, the link editor, and the geometry that keeps
//! them glued to the native selection.
//!
//! Design notes:
//!
//! - Positioning is pure ([`position`]); controllers feed it fresh
//!   measurements from an [`OverlaySurface`] every refresh.
//! - All controllers consume the same [`SelectionDescriptor`] produced
//!   by the [`SelectionObserver`]; none of them read engine state
//!   directly outside a read scope.
//! - Overlays are parked off-screen when inactive, never unmounted, so
//!   reappearing costs no layout.
//! - Command handlers capture controller state weakly; dropping a
//!   controller tears down all of its bus registrations.

pub mod descriptor;
pub mod link_editor;
pub mod position;
pub mod surface;
pub mod toolbar;
pub mod url;

pub use descriptor::{
    RefreshTrigger, SelectionDescriptor, SelectionKind, SelectionObserver, Subscription,
};
pub use link_editor::{LinkEditor, LinkEditorMode};
pub use position::{dropdown_position, float_position, link_editor_position};
pub use surface::{OverlaySurface, RecordingSurface};
pub use toolbar::{FormatToolbar, SUPPORTED_BLOCK_TYPES};
pub use url::{sanitize_url, BLANK_URL};
