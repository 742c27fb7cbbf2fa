//! # Priority Command Bus
//!
//! Commands fan out to registered handlers in strict priority order, highest
//! first, and stop at the first handler that reports the command consumed.
//!
//! ## Design
//!
//! - Handlers live in an explicit ordered list of `(priority, seq)` pairs per
//!   command kind; registration order is only the tie-break within one
//!   priority, never an implicit priority of its own.
//! - Delivery within a single dispatch is serialized: the handler list is
//!   snapshotted up front, so handlers registered or dropped mid-dispatch
//!   take effect on the next dispatch, and handlers never race.
//! - Registration returns an RAII handle; dropping it unregisters.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use scribe_common::dom::ElementId;
use scribe_doc::{BlockKind, ListTag, TextFormat};
use tracing::trace;

use crate::editor::Editor;

/// Everything that travels over the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    SelectionChange,
    KeyEscape,
    KeyEnter,
    KeyDelete,
    KeyBackspace,
    Click,
    FormatText,
    ToggleLink,
    InsertList,
    RemoveList,
    SetBlock,
}

/// A pointer click as the embedder observed it
#[derive(Debug, Clone, PartialEq)]
pub struct ClickEvent {
    /// Element the click landed on, when the embedder could resolve one
    pub target: Option<ElementId>,
    pub shift: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandPayload {
    None,
    Click(ClickEvent),
    Format(TextFormat),
    /// `Some(url)` toggles a link on, `None` removes it
    Link(Option<String>),
    List(ListTag),
    Block(BlockKind),
}

/// Dispatch priorities, highest wins. `Editor` is the host engine's own
/// built-in handling and always runs last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CommandPriority {
    Editor = 0,
    Low = 1,
    Normal = 2,
    High = 3,
    Critical = 4,
}

pub type CommandHandler = Rc<dyn Fn(&Editor, &CommandPayload) -> bool>;

struct Entry {
    priority: CommandPriority,
    seq: u64,
    id: u64,
    handler: CommandHandler,
}

#[derive(Default)]
struct BusState {
    handlers: HashMap<CommandKind, Vec<Entry>>,
    next_seq: u64,
    next_id: u64,
}

/// Priority-ordered command bus with short-circuit dispatch
#[derive(Clone, Default)]
pub struct CommandBus {
    state: Rc<RefCell<BusState>>,
}

impl CommandBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. The returned handle unregisters on drop.
    pub fn register(
        &self,
        kind: CommandKind,
        priority: CommandPriority,
        handler: CommandHandler,
    ) -> CommandHandle {
        let mut state = self.state.borrow_mut();
        let seq = state.next_seq;
        state.next_seq += 1;
        let id = state.next_id;
        state.next_id += 1;

        state.handlers.entry(kind).or_default().push(Entry {
            priority,
            seq,
            id,
            handler,
        });

        CommandHandle {
            state: Rc::downgrade(&self.state),
            kind,
            id,
        }
    }

    /// Deliver a command: highest priority first, stop at the first `true`.
    /// Returns whether any handler consumed it.
    pub fn dispatch(&self, editor: &Editor, kind: CommandKind, payload: &CommandPayload) -> bool {
        // Snapshot so handlers may register/unregister without racing this
        // delivery.
        let mut snapshot: Vec<(CommandPriority, u64, CommandHandler)> = {
            let state = self.state.borrow();
            match state.handlers.get(&kind) {
                Some(list) => list
                    .iter()
                    .map(|e| (e.priority, e.seq, Rc::clone(&e.handler)))
                    .collect(),
                None => return false,
            }
        };
        // Descending priority; registration order breaks ties within one
        snapshot.sort_by_key(|(priority, seq, _)| (std::cmp::Reverse(*priority), *seq));

        for (priority, _, handler) in snapshot {
            if handler(editor, payload) {
                trace!(?kind, ?priority, "command consumed");
                return true;
            }
        }
        false
    }

    fn unregister(state: &Rc<RefCell<BusState>>, kind: CommandKind, id: u64) {
        let mut state = state.borrow_mut();
        if let Some(list) = state.handlers.get_mut(&kind) {
            list.retain(|e| e.id != id);
        }
    }
}

/// RAII registration: dropping it removes the handler
pub struct CommandHandle {
    state: Weak<RefCell<BusState>>,
    kind: CommandKind,
    id: u64,
}

impl Drop for CommandHandle {
    fn drop(&mut self) {
        if let Some(state) = self.state.upgrade() {
            CommandBus::unregister(&state, self.kind, self.id);
        }
    }
}

/// Bundle of registrations torn down together when an overlay unmounts
#[derive(Default)]
pub struct Registrations {
    handles: Vec<CommandHandle>,
}

impl Registrations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, handle: CommandHandle) {
        self.handles.push(handle);
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
