//! # Editor Engine
//!
//! Reference in-memory host: a committed document plus the transactional
//! read/update discipline every plugin calls through.
//!
//! ## Transaction model
//!
//! - `run_update` is the only way to mutate committed state. It executes the
//!   closure with an [`UpdateScope`], bumps the version on commit, runs the
//!   optional completion callback, then notifies update listeners inside a
//!   read boundary. Listeners never observe a partially-applied mutation.
//! - `run_read` executes over the committed snapshot; the scope only hands
//!   out shared references, so mutation inside a read is unrepresentable.
//! - Entering `run_update` while any scope is active is
//!   [`EngineError::ReentrantUpdate`]. Hard rule, not an optimization.
//!
//! Single-threaded by construction: the handle is an `Rc`, nothing is
//! `Send`, and there is no locking because there is no preemption.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::{Rc, Weak};

use scribe_common::dom::{ElementId, ElementTree};
use scribe_doc::Document;
use tracing::{debug, warn};

use crate::commands::{
    CommandBus, CommandHandle, CommandHandler, CommandKind, CommandPayload, CommandPriority,
};
use crate::error::EngineError;
use crate::mutations::{self, MutationError};
use crate::selection::{NativeSelection, RangeSelection, Selection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Read,
    Update,
}

type UpdateListener = Rc<dyn Fn(&Editor)>;

struct EditorInner {
    doc: RefCell<Document>,
    selection: RefCell<Selection>,
    native: RefCell<NativeSelection>,
    bus: CommandBus,
    listeners: RefCell<Vec<(u64, UpdateListener)>>,
    next_listener: Cell<u64>,
    phase: Cell<Phase>,
    composing: Cell<bool>,
    editable: Cell<bool>,
    version: Cell<u64>,
    root_element: Cell<Option<ElementId>>,
    elements: Rc<RefCell<ElementTree>>,
    // Keeps the engine's own command handlers registered for the editor's
    // lifetime
    builtin: RefCell<Vec<CommandHandle>>,
}

/// Cheap-to-clone handle to one editor instance
#[derive(Clone)]
pub struct Editor {
    inner: Rc<EditorInner>,
}

/// Mutation access granted only inside `run_update`
pub struct UpdateScope<'a> {
    doc: RefMut<'a, Document>,
    selection: RefMut<'a, Selection>,
}

impl UpdateScope<'_> {
    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn doc_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn set_selection(&mut self, selection: Selection) {
        *self.selection = selection;
    }
}

/// Read access over the committed snapshot
pub struct ReadScope<'a> {
    doc: Ref<'a, Document>,
    selection: Ref<'a, Selection>,
    native: Ref<'a, NativeSelection>,
}

impl ReadScope<'_> {
    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn native(&self) -> &NativeSelection {
        &self.native
    }
}

impl Editor {
    pub fn new() -> Self {
        Self::with_document(Document::new())
    }

    pub fn with_document(doc: Document) -> Self {
        let editor = Self {
            inner: Rc::new(EditorInner {
                doc: RefCell::new(doc),
                selection: RefCell::new(Selection::None),
                native: RefCell::new(NativeSelection::default()),
                bus: CommandBus::new(),
                listeners: RefCell::new(Vec::new()),
                next_listener: Cell::new(0),
                phase: Cell::new(Phase::Idle),
                composing: Cell::new(false),
                editable: Cell::new(true),
                version: Cell::new(0),
                root_element: Cell::new(None),
                elements: Rc::new(RefCell::new(ElementTree::new())),
                builtin: RefCell::new(Vec::new()),
            }),
        };
        editor.install_builtin_handlers();
        editor
    }

    // --- transactional boundaries ---

    /// Execute a mutation inside the transactional update boundary.
    ///
    /// Every entered update commits: the version bumps and listeners fire
    /// even when the closure changed nothing. Listeners derive their state
    /// from the committed snapshot, so an extra notification is a no-op for
    /// them; whether anything was applied travels in the closure's return
    /// value, not in the notification.
    pub fn run_update<R>(&self, f: impl FnOnce(&mut UpdateScope) -> R) -> Result<R, EngineError> {
        self.run_update_with(f, |_| {})
    }

    /// Like [`run_update`](Self::run_update), with a completion callback
    /// that runs after commit but before update listeners — the hook for
    /// DOM fixes like caret restoration after a re-render.
    pub fn run_update_with<R>(
        &self,
        f: impl FnOnce(&mut UpdateScope) -> R,
        on_update: impl FnOnce(&Editor),
    ) -> Result<R, EngineError> {
        match self.inner.phase.get() {
            Phase::Idle => {}
            Phase::Read => return Err(EngineError::ReentrantUpdate("read")),
            Phase::Update => return Err(EngineError::ReentrantUpdate("update")),
        }

        self.inner.phase.set(Phase::Update);
        let result = {
            let mut scope = UpdateScope {
                doc: self.inner.doc.borrow_mut(),
                selection: self.inner.selection.borrow_mut(),
            };
            f(&mut scope)
        };
        self.inner.version.set(self.inner.version.get() + 1);
        self.inner.phase.set(Phase::Idle);

        on_update(self);
        self.notify_update_listeners();
        Ok(result)
    }

    /// Execute a read over the committed state. Nested reads are fine;
    /// reading while an update scope is open is not.
    pub fn run_read<R>(&self, f: impl FnOnce(&ReadScope) -> R) -> Result<R, EngineError> {
        if self.inner.phase.get() == Phase::Update {
            return Err(EngineError::ReentrantUpdate("update"));
        }
        let previous = self.inner.phase.get();
        self.inner.phase.set(Phase::Read);
        let scope = ReadScope {
            doc: self.inner.doc.borrow(),
            selection: self.inner.selection.borrow(),
            native: self.inner.native.borrow(),
        };
        let result = f(&scope);
        drop(scope);
        self.inner.phase.set(previous);
        Ok(result)
    }

    fn notify_update_listeners(&self) {
        let listeners: Vec<UpdateListener> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        debug!(
            version = self.inner.version.get(),
            listeners = listeners.len(),
            "update committed"
        );
        self.inner.phase.set(Phase::Read);
        for listener in listeners {
            listener(self);
        }
        self.inner.phase.set(Phase::Idle);
    }

    /// Called once per committed mutation, inside a read boundary.
    /// Dropping the handle unregisters.
    pub fn register_update_listener(&self, listener: impl Fn(&Editor) + 'static) -> ListenerHandle {
        let id = self.inner.next_listener.get();
        self.inner.next_listener.set(id + 1);
        self.inner
            .listeners
            .borrow_mut()
            .push((id, Rc::new(listener)));
        ListenerHandle {
            editor: Rc::downgrade(&self.inner),
            id,
        }
    }

    // --- commands ---

    pub fn register_command(
        &self,
        kind: CommandKind,
        priority: CommandPriority,
        handler: CommandHandler,
    ) -> CommandHandle {
        self.inner.bus.register(kind, priority, handler)
    }

    pub fn dispatch(&self, kind: CommandKind, payload: &CommandPayload) -> bool {
        self.inner.bus.dispatch(self, kind, payload)
    }

    // --- selection ---

    /// Commit a new selection (engine side plus the native snapshot), then
    /// fire the selection-change command.
    pub fn update_selection(
        &self,
        selection: Selection,
        native: NativeSelection,
    ) -> Result<(), EngineError> {
        *self.inner.native.borrow_mut() = native;
        self.run_update(|scope| scope.set_selection(selection))?;
        self.dispatch(CommandKind::SelectionChange, &CommandPayload::None);
        Ok(())
    }

    // --- flags and surroundings ---

    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    pub fn is_composing(&self) -> bool {
        self.inner.composing.get()
    }

    /// IME session flag; while set, overlays skip descriptor recomputation
    pub fn set_composing(&self, composing: bool) {
        self.inner.composing.set(composing);
    }

    pub fn is_editable(&self) -> bool {
        self.inner.editable.get()
    }

    pub fn set_editable(&self, editable: bool) {
        self.inner.editable.set(editable);
    }

    pub fn root_element(&self) -> Option<ElementId> {
        self.inner.root_element.get()
    }

    pub fn set_root_element(&self, root: Option<ElementId>) {
        self.inner.root_element.set(root);
    }

    /// Shared handle to the element registry the embedder keeps in sync
    pub fn elements(&self) -> Rc<RefCell<ElementTree>> {
        Rc::clone(&self.inner.elements)
    }

    // --- built-in command handling (the host engine's own behavior) ---

    fn install_builtin_handlers(&self) {
        let mut builtin = self.inner.builtin.borrow_mut();

        builtin.push(self.inner.bus.register(
            CommandKind::FormatText,
            CommandPriority::Editor,
            Rc::new(|editor, payload| {
                let CommandPayload::Format(format) = payload else {
                    return false;
                };
                let format = *format;
                editor.apply_to_range(move |doc, range| mutations::toggle_format(doc, range, format))
            }),
        ));

        builtin.push(self.inner.bus.register(
            CommandKind::ToggleLink,
            CommandPriority::Editor,
            Rc::new(|editor, payload| {
                let CommandPayload::Link(url) = payload else {
                    return false;
                };
                let url = url.clone();
                editor.apply_to_range(move |doc, range| mutations::toggle_link(doc, range, url))
            }),
        ));

        builtin.push(self.inner.bus.register(
            CommandKind::InsertList,
            CommandPriority::Editor,
            Rc::new(|editor, payload| {
                let CommandPayload::List(tag) = payload else {
                    return false;
                };
                let tag = *tag;
                editor.apply_to_range(move |doc, range| mutations::insert_list(doc, range, tag))
            }),
        ));

        builtin.push(self.inner.bus.register(
            CommandKind::RemoveList,
            CommandPriority::Editor,
            Rc::new(|editor, _| {
                editor.apply_to_range(mutations::remove_list)
            }),
        ));

        builtin.push(self.inner.bus.register(
            CommandKind::SetBlock,
            CommandPriority::Editor,
            Rc::new(|editor, payload| {
                let CommandPayload::Block(kind) = payload else {
                    return false;
                };
                let kind = *kind;
                editor.apply_to_range(move |doc, range| mutations::set_block_kind(doc, range, kind))
            }),
        ));
    }

    /// Run a range-scoped mutation inside an update; `false` when there is
    /// no range selection or the mutation failed.
    fn apply_to_range(
        &self,
        f: impl FnOnce(&mut Document, &RangeSelection) -> Result<(), MutationError>,
    ) -> bool {
        let outcome = self
            .run_update(|scope| {
                let Selection::Range(range) = scope.selection().clone() else {
                    return Ok(false);
                };
                f(scope.doc_mut(), &range).map(|_| true)
            })
            .and_then(|inner| inner.map_err(EngineError::from));

        match outcome {
            Ok(applied) => applied,
            Err(err) => {
                warn!(error = %err, "mutation rejected");
                false
            }
        }
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII update-listener registration
pub struct ListenerHandle {
    editor: Weak<EditorInner>,
    id: u64,
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        if let Some(inner) = self.editor.upgrade() {
            inner.listeners.borrow_mut().retain(|(id, _)| *id != self.id);
        }
    }
}
