//! # Scribe Poll
//!
//! Controller for the embedded poll widget: binds one poll block and one
//! local participant to the host engine, routing votes and option edits
//! through the transactional update boundary and claiming the clicks and
//! delete keys that select or remove the widget.

mod controller;

pub use controller::PollController;
