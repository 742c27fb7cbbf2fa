//! # Poll Node
//!
//! The embedded poll widget's data: a question and an ordered list of
//! options, each with a set of votes keyed by participant.
//!
//! ## Design
//!
//! - All edits happen inside the host engine's update boundary; callers
//!   outside it never get a `&mut PollNode`.
//! - Every edit reports an outcome (`Applied` / `Noop` / `Rejected`) so the
//!   store can double-check invariants the UI is expected to enforce.
//! - Vote toggling is an idempotent symmetric difference: convergence comes
//!   from the host's own synchronization, not from a CRDT here.
//! - A poll never drops below two options.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Minimum number of options a poll retains
pub const MIN_OPTIONS: usize = 2;

/// Identifies a collaborating editor for vote attribution
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipantId(pub String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

static UID_SEQ: AtomicU64 = AtomicU64::new(0);

/// Unique-per-creation option id; never reused, even across deletions
fn fresh_uid() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    let seq = UID_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("{:x}-{:x}", nanos, seq)
}

/// One votable option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOption {
    pub uid: String,
    pub text: String,
    pub votes: BTreeSet<ParticipantId>,
}

impl PollOption {
    pub fn new() -> Self {
        Self {
            uid: fresh_uid(),
            text: String::new(),
            votes: BTreeSet::new(),
        }
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::new()
        }
    }
}

impl Default for PollOption {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of a poll edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEdit {
    /// Edit was applied
    Applied,
    /// Edit had no effect (option already deleted by a concurrent edit)
    Noop { reason: String },
    /// Edit violates an invariant and was refused
    Rejected { reason: String },
}

impl PollEdit {
    pub fn noop(reason: impl Into<String>) -> Self {
        PollEdit::Noop {
            reason: reason.into(),
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        PollEdit::Rejected {
            reason: reason.into(),
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, PollEdit::Applied)
    }
}

/// The poll: question plus ordered options. Order is display order and is
/// preserved across edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollNode {
    pub question: String,
    pub options: Vec<PollOption>,
}

impl PollNode {
    /// New poll seeded with the minimum two empty options
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            options: vec![PollOption::new(), PollOption::new()],
        }
    }

    pub fn option(&self, uid: &str) -> Option<&PollOption> {
        self.options.iter().find(|o| o.uid == uid)
    }

    fn option_mut(&mut self, uid: &str) -> Option<&mut PollOption> {
        self.options.iter_mut().find(|o| o.uid == uid)
    }

    /// Symmetric-difference vote toggle: present → removed, absent → added.
    /// Voting on an option deleted by a concurrent edit is a no-op.
    pub fn toggle_vote(&mut self, uid: &str, participant: &ParticipantId) -> PollEdit {
        let Some(option) = self.option_mut(uid) else {
            return PollEdit::noop(format!("option {} no longer exists", uid));
        };
        if !option.votes.remove(participant) {
            option.votes.insert(participant.clone());
        }
        PollEdit::Applied
    }

    /// Atomic text replacement
    pub fn set_option_text(&mut self, uid: &str, text: impl Into<String>) -> PollEdit {
        let Some(option) = self.option_mut(uid) else {
            return PollEdit::noop(format!("option {} no longer exists", uid));
        };
        option.text = text.into();
        PollEdit::Applied
    }

    /// Append a fresh empty option
    pub fn add_option(&mut self) -> &PollOption {
        self.options.push(PollOption::new());
        self.options.last().unwrap()
    }

    /// Remove an option. Refused at the two-option floor; the UI disables
    /// the control there, and the store double-checks regardless.
    pub fn delete_option(&mut self, uid: &str) -> PollEdit {
        if self.options.len() <= MIN_OPTIONS {
            return PollEdit::rejected(format!("a poll keeps at least {} options", MIN_OPTIONS));
        }
        let Some(index) = self.options.iter().position(|o| o.uid == uid) else {
            return PollEdit::noop(format!("option {} no longer exists", uid));
        };
        self.options.remove(index);
        PollEdit::Applied
    }

    /// Derived total across all options; recomputed, never stored
    pub fn total_votes(&self) -> usize {
        self.options.iter().map(|o| o.votes.len()).sum()
    }
}
