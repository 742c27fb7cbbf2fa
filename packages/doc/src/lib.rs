//! # Scribe Document Model
//!
//! Value types for the document tree the host engine commits: text blocks
//! with styled inline runs and links, plus embedded poll widgets.
//!
//! Everything here is plain data. Transactional access (who may mutate,
//! and when) is the host engine's concern (`scribe-host`); this crate only
//! enforces the structural invariants that must hold regardless of caller.

pub mod node;
pub mod poll;
pub mod style;

pub use node::*;
pub use poll::*;
pub use style::*;
