//! # Floating Link Editor
//!
//! Per-selection overlay for viewing and editing the link under the
//! caret. Drives a small state machine:
//!
//! ```text
//! closed → view → edit → view
//!            ↑______________|   (Enter commits, Escape discards)
//! ```
//!
//! The draft URL is independent of the committed one until Enter; the
//! commit itself is a link-toggle mutation through the host's update
//! boundary. The overlay element is parked off-screen, never unmounted.

use std::cell::RefCell;
use std::rc::Rc;

use scribe_common::geometry::Rect;
use scribe_host::{
    ClickEvent, CommandKind, CommandPayload, CommandPriority, Editor, Registrations,
};
use tracing::debug;

use crate::descriptor::{SelectionDescriptor, SelectionObserver, Subscription};
use crate::position::link_editor_position;
use crate::surface::OverlaySurface;
use crate::url::sanitize_url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEditorMode {
    Closed,
    View,
    Edit,
}

type SharedSurface = Rc<RefCell<dyn OverlaySurface>>;

struct LinkState {
    surface: SharedSurface,
    mode: LinkEditorMode,
    committed_url: String,
    draft: String,
    anchor_rect: Option<Rect>,
}

/// Floating link-editor controller
pub struct LinkEditor {
    editor: Editor,
    state: Rc<RefCell<LinkState>>,
    _subscription: Subscription,
    _registrations: Registrations,
}

impl LinkEditor {
    /// Wire the link editor to the selection observer and the command bus.
    ///
    /// Escape is claimed at high priority so an open editor takes the key
    /// before document-level shortcuts; clicks are watched at low priority
    /// for outside-click dismissal.
    pub fn attach(editor: &Editor, observer: &SelectionObserver, surface: SharedSurface) -> Self {
        let state = Rc::new(RefCell::new(LinkState {
            surface,
            mode: LinkEditorMode::Closed,
            committed_url: String::new(),
            draft: String::new(),
            anchor_rect: None,
        }));

        let subscription = observer.subscribe({
            let state = Rc::clone(&state);
            move |descriptor| Self::sync(&state, descriptor)
        });

        let mut registrations = Registrations::new();
        registrations.push(editor.register_command(
            CommandKind::KeyEscape,
            CommandPriority::High,
            Rc::new({
                let weak = Rc::downgrade(&state);
                move |_editor, _payload| {
                    let Some(state) = weak.upgrade() else {
                        return false;
                    };
                    Self::handle_escape(&state)
                }
            }),
        ));
        registrations.push(editor.register_command(
            CommandKind::Click,
            CommandPriority::Low,
            Rc::new({
                let weak = Rc::downgrade(&state);
                move |editor, payload| {
                    let CommandPayload::Click(click) = payload else {
                        return false;
                    };
                    let Some(state) = weak.upgrade() else {
                        return false;
                    };
                    Self::handle_click(&state, editor, click);
                    false
                }
            }),
        ));

        let link_editor = Self {
            editor: editor.clone(),
            state,
            _subscription: subscription,
            _registrations: registrations,
        };
        Self::sync(&link_editor.state, &observer.descriptor());
        link_editor
    }

    /// Fold a fresh selection descriptor into the state machine
    fn sync(state: &Rc<RefCell<LinkState>>, descriptor: &SelectionDescriptor) {
        let mut s = state.borrow_mut();
        match (&descriptor.containing_link_url, s.mode) {
            (Some(url), LinkEditorMode::Closed) => {
                s.mode = LinkEditorMode::View;
                s.committed_url = url.clone();
            }
            (Some(url), _) => {
                s.committed_url = url.clone();
            }
            (None, LinkEditorMode::View) => {
                s.mode = LinkEditorMode::Closed;
                s.committed_url.clear();
            }
            (None, LinkEditorMode::Closed) => {
                s.committed_url.clear();
            }
            // While the draft input holds focus the native selection may
            // leave the root; keep editing until Enter/Escape/outside click
            (None, LinkEditorMode::Edit) => {}
        }
        s.anchor_rect = descriptor.anchor_rect;

        let target = if s.mode == LinkEditorMode::Closed {
            None
        } else {
            s.anchor_rect
        };
        let surface = Rc::clone(&s.surface);
        drop(s);
        Self::apply(&surface, target);
    }

    fn handle_escape(state: &Rc<RefCell<LinkState>>) -> bool {
        let mut s = state.borrow_mut();
        match s.mode {
            LinkEditorMode::Closed => false,
            LinkEditorMode::Edit => {
                // Discard the draft, no mutation
                s.draft.clear();
                s.mode = LinkEditorMode::View;
                true
            }
            LinkEditorMode::View => {
                s.mode = LinkEditorMode::Closed;
                let surface = Rc::clone(&s.surface);
                drop(s);
                Self::apply(&surface, None);
                true
            }
        }
    }

    fn handle_click(state: &Rc<RefCell<LinkState>>, editor: &Editor, click: &ClickEvent) {
        let mut s = state.borrow_mut();
        if s.mode == LinkEditorMode::Closed {
            return;
        }
        let inside = match (s.surface.borrow().overlay_root(), click.target) {
            (Some(root), Some(target)) => editor.elements().borrow().contains(root, target),
            _ => false,
        };
        if inside {
            return;
        }
        // Outside click closes without mutation
        debug!("link editor dismissed by outside click");
        s.mode = LinkEditorMode::Closed;
        s.draft.clear();
        let surface = Rc::clone(&s.surface);
        drop(s);
        Self::apply(&surface, None);
    }

    fn apply(surface: &SharedSurface, target: Option<Rect>) {
        let mut surface = surface.borrow_mut();
        let (Some(overlay), Some(container)) = (surface.overlay_box(), surface.container_box())
        else {
            // Not mounted yet; skip this cycle
            return;
        };
        let position = link_editor_position(target, &overlay, &container);
        surface.apply_position(position);
    }

    // --- UI entry points ---

    pub fn mode(&self) -> LinkEditorMode {
        self.state.borrow().mode
    }

    pub fn is_open(&self) -> bool {
        self.mode() != LinkEditorMode::Closed
    }

    /// Committed URL shown in view mode
    pub fn url(&self) -> String {
        self.state.borrow().committed_url.clone()
    }

    /// Draft being typed in edit mode
    pub fn draft(&self) -> String {
        self.state.borrow().draft.clone()
    }

    /// Edit button: always reseeds the draft from the committed URL,
    /// dropping any earlier unsaved draft
    pub fn open_edit(&self) {
        let mut s = self.state.borrow_mut();
        if s.mode != LinkEditorMode::View {
            return;
        }
        s.draft = s.committed_url.clone();
        s.mode = LinkEditorMode::Edit;
        let surface = Rc::clone(&s.surface);
        drop(s);
        surface.borrow_mut().focus_input();
    }

    pub fn set_draft(&self, draft: impl Into<String>) {
        self.state.borrow_mut().draft = draft.into();
    }

    /// Enter: commit a non-empty draft through the link-toggle mutation,
    /// then return to view mode. An empty draft commits nothing.
    pub fn submit(&self) {
        let draft = {
            let mut s = self.state.borrow_mut();
            if s.mode != LinkEditorMode::Edit {
                return;
            }
            s.mode = LinkEditorMode::View;
            std::mem::take(&mut s.draft)
        };
        if draft.trim().is_empty() {
            return;
        }
        let url = sanitize_url(&draft);
        self.editor
            .dispatch(CommandKind::ToggleLink, &CommandPayload::Link(Some(url)));
    }

    /// Cancel button in edit mode: same as Escape
    pub fn cancel_edit(&self) {
        let mut s = self.state.borrow_mut();
        if s.mode == LinkEditorMode::Edit {
            s.draft.clear();
            s.mode = LinkEditorMode::View;
        }
    }

    /// Trash button in view mode: link-removal mutation, regardless of any
    /// draft state
    pub fn remove_link(&self) {
        self.editor
            .dispatch(CommandKind::ToggleLink, &CommandPayload::Link(None));
    }
}
