//! # Scribe Host Engine
//!
//! The host-engine interface the overlay plugins are written against:
//! a priority-ordered command bus with short-circuit dispatch, selection
//! types, and a reference in-memory editor enforcing the transactional
//! read/update discipline.
//!
//! ## Capability contracts
//!
//! - [`Editor::register_update_listener`] — called once per committed
//!   mutation, inside a read boundary.
//! - [`Editor::register_command`] — priority-ordered dispatch,
//!   short-circuiting on a `true` return; RAII unregistration.
//! - [`Editor::run_update`] / [`Editor::run_update_with`] — transactional
//!   mutation boundary, with an optional completion callback.
//! - [`Editor::run_read`] — read-only boundary over committed state.
//! - Selection queries live on [`RangeSelection`] / [`Selection`].

mod commands;
mod editor;
mod error;
mod mutations;
mod selection;

pub use commands::{
    ClickEvent, CommandBus, CommandHandle, CommandHandler, CommandKind, CommandPayload,
    CommandPriority, Registrations,
};
pub use editor::{Editor, ListenerHandle, ReadScope, UpdateScope};
pub use error::EngineError;
pub use mutations::{
    insert_list, remove_list, set_block_kind, toggle_format, toggle_link, MutationError,
};
pub use selection::{NativeSelection, RangeSelection, Selection, TextPoint};
