//! Error types for the host engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// `run_update` was entered while a read or update scope was already
    /// active on this editor. Mutating from inside a read-phase callback
    /// corrupts the transactional invariant, so this is refused outright.
    #[error("Update started inside an active {0} scope")]
    ReentrantUpdate(&'static str),

    #[error("Mutation error: {0}")]
    Mutation(#[from] crate::mutations::MutationError),
}
