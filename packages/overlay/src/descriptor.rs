//! # Selection Observer
//!
//! Recomputes a normalized selection descriptor — the one input every
//! overlay state machine works from — whenever anything relevant moves:
//! committed updates, selection-change commands, resize, or scrolling of
//! the anchor's scroller.
//!
//! The descriptor is a fresh snapshot each time, never mutated in place.
//! Degenerate situations (anchor outside the editable root, stale rect
//! lookup, engine mid-composition) are "no active selection", not errors.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use scribe_common::geometry::Rect;
use scribe_doc::{BlockKind, InlineStyle};
use scribe_host::{
    CommandHandle, CommandKind, CommandPriority, Editor, ListenerHandle, Selection,
};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionKind {
    Collapsed,
    Range,
    Node,
    #[default]
    None,
}

/// Read-only snapshot of everything the overlays need to know about the
/// current selection
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectionDescriptor {
    pub kind: SelectionKind,
    pub anchor_rect: Option<Rect>,
    pub containing_link_url: Option<String>,
    pub active_style: InlineStyle,
    pub block_type: Option<BlockKind>,
    /// Anchor sits in ordinary text content rather than an embed
    pub is_text: bool,
    pub text_content: String,
}

impl SelectionDescriptor {
    pub fn none() -> Self {
        Self::default()
    }

    /// Selected text with line breaks stripped; the toolbar's visibility
    /// rule checks this against empty
    pub fn stripped_text(&self) -> String {
        self.text_content.replace('\n', "")
    }
}

/// What caused a descriptor recomputation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    /// Host engine committed a mutation
    UpdateNotification,
    /// Selection-change command came over the bus
    SelectionChange,
    /// Window resize
    Resize,
    /// Scroll on the anchor's nearest scrollable ancestor
    Scroll,
}

type Subscriber = Rc<dyn Fn(&SelectionDescriptor)>;

struct ObserverInner {
    editor: Editor,
    descriptor: RefCell<SelectionDescriptor>,
    subscribers: RefCell<Vec<(u64, Subscriber)>>,
    next_subscriber: Cell<u64>,
}

/// Watches the editor and keeps [`SelectionDescriptor`] current
pub struct SelectionObserver {
    inner: Rc<ObserverInner>,
    _update_listener: ListenerHandle,
    _selection_command: CommandHandle,
}

impl SelectionObserver {
    /// Wire an observer to the editor's update listener and its
    /// selection-change command. Resize/scroll events are forwarded by the
    /// embedder through [`refresh`](Self::refresh).
    pub fn attach(editor: &Editor) -> Self {
        let inner = Rc::new(ObserverInner {
            editor: editor.clone(),
            descriptor: RefCell::new(SelectionDescriptor::none()),
            subscribers: RefCell::new(Vec::new()),
            next_subscriber: Cell::new(0),
        });

        let update_listener = editor.register_update_listener({
            let weak = Rc::downgrade(&inner);
            move |_editor| {
                if let Some(inner) = weak.upgrade() {
                    Self::refresh_inner(&inner, RefreshTrigger::UpdateNotification);
                }
            }
        });

        let selection_command = editor.register_command(
            CommandKind::SelectionChange,
            CommandPriority::Low,
            Rc::new({
                let weak = Rc::downgrade(&inner);
                move |_editor, _payload| {
                    if let Some(inner) = weak.upgrade() {
                        Self::refresh_inner(&inner, RefreshTrigger::SelectionChange);
                    }
                    false
                }
            }),
        );

        let observer = Self {
            inner,
            _update_listener: update_listener,
            _selection_command: selection_command,
        };
        observer.refresh(RefreshTrigger::UpdateNotification);
        observer
    }

    /// Recompute now. Skipped wholesale during an IME composition so
    /// composing text never makes the overlays flicker.
    pub fn refresh(&self, trigger: RefreshTrigger) {
        Self::refresh_inner(&self.inner, trigger);
    }

    fn refresh_inner(inner: &Rc<ObserverInner>, trigger: RefreshTrigger) {
        if inner.editor.is_composing() {
            trace!(?trigger, "composition in progress, skipping refresh");
            return;
        }
        let descriptor = Self::compute(&inner.editor);
        *inner.descriptor.borrow_mut() = descriptor.clone();

        let subscribers: Vec<Subscriber> = inner
            .subscribers
            .borrow()
            .iter()
            .map(|(_, subscriber)| Rc::clone(subscriber))
            .collect();
        for subscriber in subscribers {
            subscriber(&descriptor);
        }
    }

    fn compute(editor: &Editor) -> SelectionDescriptor {
        let elements = editor.elements();
        editor
            .run_read(|scope| {
                let native = scope.native();
                let inside_root = match (editor.root_element(), native.anchor_element) {
                    (Some(root), Some(anchor)) => elements.borrow().contains(root, anchor),
                    _ => false,
                };
                if !inside_root || !editor.is_editable() {
                    return SelectionDescriptor::none();
                }

                match scope.selection() {
                    Selection::None => SelectionDescriptor::none(),
                    Selection::Node(_) => SelectionDescriptor {
                        kind: SelectionKind::Node,
                        anchor_rect: native.rect,
                        ..SelectionDescriptor::none()
                    },
                    Selection::Range(range) => {
                        // A rect lookup that failed means the native
                        // selection no longer maps to the tree
                        let Some(rect) = native.rect else {
                            return SelectionDescriptor::none();
                        };
                        let doc = scope.doc();
                        SelectionDescriptor {
                            kind: if range.is_collapsed() {
                                SelectionKind::Collapsed
                            } else {
                                SelectionKind::Range
                            },
                            anchor_rect: Some(rect),
                            containing_link_url: range.containing_link_url(doc),
                            active_style: range.shared_style(doc),
                            block_type: range.anchor_block_kind(doc),
                            is_text: range.is_text_anchor(doc),
                            text_content: range.text_content(doc),
                        }
                    }
                }
            })
            .unwrap_or_else(|_| SelectionDescriptor::none())
    }

    /// Current descriptor snapshot
    pub fn descriptor(&self) -> SelectionDescriptor {
        self.inner.descriptor.borrow().clone()
    }

    /// Be notified after every recomputation. Dropping the subscription
    /// unsubscribes.
    pub fn subscribe(&self, subscriber: impl Fn(&SelectionDescriptor) + 'static) -> Subscription {
        let id = self.inner.next_subscriber.get();
        self.inner.next_subscriber.set(id + 1);
        self.inner
            .subscribers
            .borrow_mut()
            .push((id, Rc::new(subscriber)));
        Subscription {
            observer: Rc::downgrade(&self.inner),
            id,
        }
    }
}

/// RAII descriptor subscription
pub struct Subscription {
    observer: Weak<ObserverInner>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.observer.upgrade() {
            inner
                .subscribers
                .borrow_mut()
                .retain(|(id, _)| *id != self.id);
        }
    }
}
