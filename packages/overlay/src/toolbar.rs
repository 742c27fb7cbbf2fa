//! # Floating Text-Format Toolbar
//!
//! Shows above a non-collapsed text selection and fronts the format,
//! link, and block-type mutations. Owns two extra pieces of UI state the
//! descriptor doesn't carry: the block-options dropdown and the
//! pointer-capture suspension used while a drag-selection sweeps across
//! the toolbar.

use std::cell::RefCell;
use std::rc::Rc;

use scribe_common::dom::{ElementId, Measurable};
use scribe_common::geometry::OverlayPosition;
use scribe_doc::{BlockKind, HeadingTag, InlineStyle, ListTag, TextFormat};
use scribe_host::{
    ClickEvent, CommandKind, CommandPayload, CommandPriority, Editor, Registrations,
};
use tracing::debug;

use crate::descriptor::{SelectionDescriptor, SelectionKind, SelectionObserver, Subscription};
use crate::position::{dropdown_position, float_position};
use crate::surface::OverlaySurface;
use crate::url::sanitize_url;

/// Block types the dropdown offers, in menu order
pub const SUPPORTED_BLOCK_TYPES: [BlockKind; 7] = [
    BlockKind::Paragraph,
    BlockKind::Heading(HeadingTag::H2),
    BlockKind::Heading(HeadingTag::H3),
    BlockKind::Quote,
    BlockKind::Code,
    BlockKind::List(ListTag::Ul),
    BlockKind::List(ListTag::Ol),
];

/// Seed target for the link button when no link is active yet
const DEFAULT_LINK_URL: &str = "https://google.com";

type SharedSurface = Rc<RefCell<dyn OverlaySurface>>;

struct ToolbarState {
    surface: SharedSurface,
    descriptor: SelectionDescriptor,
    visible: bool,
    dropdown_open: bool,
    dropdown_root: Option<ElementId>,
    capture_suspended: bool,
}

/// Floating toolbar controller
pub struct FormatToolbar {
    editor: Editor,
    state: Rc<RefCell<ToolbarState>>,
    _subscription: Subscription,
    _registrations: Registrations,
}

impl FormatToolbar {
    pub fn attach(editor: &Editor, observer: &SelectionObserver, surface: SharedSurface) -> Self {
        let state = Rc::new(RefCell::new(ToolbarState {
            surface,
            descriptor: SelectionDescriptor::none(),
            visible: false,
            dropdown_open: false,
            dropdown_root: None,
            capture_suspended: false,
        }));

        let subscription = observer.subscribe({
            let state = Rc::clone(&state);
            move |descriptor| Self::sync(&state, descriptor)
        });

        // Outside clicks close the dropdown but are never consumed
        let mut registrations = Registrations::new();
        registrations.push(editor.register_command(
            CommandKind::Click,
            CommandPriority::Low,
            Rc::new({
                let weak = Rc::downgrade(&state);
                move |editor, payload| {
                    let CommandPayload::Click(click) = payload else {
                        return false;
                    };
                    if let Some(state) = weak.upgrade() {
                        Self::handle_click(&state, editor, click);
                    }
                    false
                }
            }),
        ));

        let toolbar = Self {
            editor: editor.clone(),
            state,
            _subscription: subscription,
            _registrations: registrations,
        };
        Self::sync(&toolbar.state, &observer.descriptor());
        toolbar
    }

    /// The toolbar shows only for a non-collapsed selection anchored in
    /// plain text: no link under the caret, not inside a code block, and
    /// selected text that isn't just line breaks.
    fn should_show(descriptor: &SelectionDescriptor) -> bool {
        descriptor.kind == SelectionKind::Range
            && descriptor.is_text
            && descriptor.containing_link_url.is_none()
            && descriptor.block_type.map_or(false, |kind| !kind.is_code())
            && !descriptor.stripped_text().is_empty()
    }

    fn sync(state: &Rc<RefCell<ToolbarState>>, descriptor: &SelectionDescriptor) {
        let mut s = state.borrow_mut();
        let visible = Self::should_show(descriptor);
        if !visible && s.dropdown_open {
            s.dropdown_open = false;
        }
        s.visible = visible;
        s.descriptor = descriptor.clone();

        let target = if visible { descriptor.anchor_rect } else { None };
        let surface = Rc::clone(&s.surface);
        drop(s);

        let mut surface = surface.borrow_mut();
        let (Some(overlay), Some(container)) = (surface.overlay_box(), surface.container_box())
        else {
            return;
        };
        surface.apply_position(float_position(target, &overlay, &container));
    }

    fn handle_click(state: &Rc<RefCell<ToolbarState>>, editor: &Editor, click: &ClickEvent) {
        let mut s = state.borrow_mut();
        if !s.dropdown_open {
            return;
        }
        let inside = click.target.map_or(false, |target| {
            let elements = editor.elements();
            let elements = elements.borrow();
            let in_dropdown = s
                .dropdown_root
                .map_or(false, |root| elements.contains(root, target));
            let in_toolbar = s
                .surface
                .borrow()
                .overlay_root()
                .map_or(false, |root| elements.contains(root, target));
            in_dropdown || in_toolbar
        });
        if !inside {
            debug!("dropdown dismissed by outside click");
            s.dropdown_open = false;
        }
    }

    // --- Rendered state ---

    pub fn visible(&self) -> bool {
        self.state.borrow().visible
    }

    /// Marks shared by every selected run, for button highlighting
    pub fn active_style(&self) -> InlineStyle {
        self.state.borrow().descriptor.active_style
    }

    pub fn block_type(&self) -> Option<BlockKind> {
        self.state.borrow().descriptor.block_type
    }

    pub fn link_active(&self) -> bool {
        self.state
            .borrow()
            .descriptor
            .containing_link_url
            .is_some()
    }

    // --- Button actions ---

    pub fn toggle_format(&self, format: TextFormat) {
        self.editor
            .dispatch(CommandKind::FormatText, &CommandPayload::Format(format));
    }

    /// Link button: wraps the selection in a placeholder link, or removes
    /// the active link when there already is one
    pub fn toggle_link(&self) {
        let payload = if self.link_active() {
            CommandPayload::Link(None)
        } else {
            CommandPayload::Link(Some(sanitize_url(DEFAULT_LINK_URL)))
        };
        self.editor.dispatch(CommandKind::ToggleLink, &payload);
    }

    // --- Block-options dropdown ---

    pub fn dropdown_open(&self) -> bool {
        self.state.borrow().dropdown_open
    }

    pub fn toggle_dropdown(&self) -> bool {
        let mut s = self.state.borrow_mut();
        s.dropdown_open = s.visible && !s.dropdown_open;
        s.dropdown_open
    }

    /// Element backing the dropdown menu, for outside-click containment
    pub fn set_dropdown_root(&self, root: Option<ElementId>) {
        self.state.borrow_mut().dropdown_root = root;
    }

    /// Where to place the dropdown: hung off the toolbar's own box, not
    /// the text selection
    pub fn dropdown_box_position(&self, dropdown: &dyn Measurable) -> Option<OverlayPosition> {
        let s = self.state.borrow();
        let surface = s.surface.borrow();
        let (Some(overlay), Some(container)) = (surface.overlay_box(), surface.container_box())
        else {
            return None;
        };
        let toolbar_rect = s.dropdown_open.then(|| overlay.bounding_rect());
        Some(dropdown_position(toolbar_rect, dropdown, &container))
    }

    /// Pick a block type from the dropdown. Re-picking the active list
    /// type unwraps it; re-picking any other active type is a no-op. The
    /// dropdown closes either way.
    pub fn apply_block(&self, kind: BlockKind) {
        let current = {
            let mut s = self.state.borrow_mut();
            s.dropdown_open = false;
            s.descriptor.block_type
        };
        match kind {
            BlockKind::List(tag) => {
                if current == Some(kind) {
                    self.editor
                        .dispatch(CommandKind::RemoveList, &CommandPayload::None);
                } else {
                    self.editor
                        .dispatch(CommandKind::InsertList, &CommandPayload::List(tag));
                }
            }
            _ => {
                if current != Some(kind) {
                    self.editor
                        .dispatch(CommandKind::SetBlock, &CommandPayload::Block(kind));
                }
            }
        }
    }

    // --- Drag-selection pointer handling ---

    /// Pointer moved with buttons held. A primary-button drag that isn't
    /// over the toolbar is a text selection sweep; suspend pointer capture
    /// so the toolbar doesn't swallow it.
    pub fn on_pointer_move(&self, buttons: u8, x: f64, y: f64) {
        if buttons & 1 == 0 {
            return;
        }
        let mut s = self.state.borrow_mut();
        if s.capture_suspended {
            return;
        }
        let over_toolbar = match s.surface.borrow().overlay_root() {
            Some(root) => {
                let elements = self.editor.elements();
                let hit = elements.borrow().element_at(x, y);
                hit.map_or(false, |element| elements.borrow().contains(root, element))
            }
            None => false,
        };
        if !over_toolbar {
            s.capture_suspended = true;
            let surface = Rc::clone(&s.surface);
            drop(s);
            surface.borrow_mut().set_pointer_capture(false);
        }
    }

    /// Pointer released: restore capture if a drag suspended it
    pub fn on_pointer_up(&self) {
        let mut s = self.state.borrow_mut();
        if !s.capture_suspended {
            return;
        }
        s.capture_suspended = false;
        let surface = Rc::clone(&s.surface);
        drop(s);
        surface.borrow_mut().set_pointer_capture(true);
    }
}
