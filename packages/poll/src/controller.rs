//! # Poll Widget Controller
//!
//! Fronts one embedded poll block: vote toggles, option edits, and the
//! widget's node-selection behavior (click to select, Delete/Backspace to
//! remove the whole block).
//!
//! Every edit goes through the host's update boundary against the
//! committed poll node, so concurrent edits from collaborators converge —
//! an edit against an option a peer already deleted degrades to a no-op,
//! never a panic.

use std::cell::Cell;
use std::rc::Rc;

use scribe_common::dom::ElementId;
use scribe_doc::{NodeKey, ParticipantId, PollEdit, PollNode, PollOption, MIN_OPTIONS};
use scribe_host::{
    CommandKind, CommandPayload, CommandPriority, Editor, NativeSelection, Registrations,
    Selection,
};
use tracing::{debug, warn};

struct PollState {
    key: NodeKey,
    participant: ParticipantId,
    root: Cell<Option<ElementId>>,
}

/// Controller bound to one poll block and one local participant
pub struct PollController {
    editor: Editor,
    state: Rc<PollState>,
    _registrations: Registrations,
}

impl PollController {
    pub fn attach(editor: &Editor, key: NodeKey, participant: ParticipantId) -> Self {
        let state = Rc::new(PollState {
            key,
            participant,
            root: Cell::new(None),
        });

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
                    let Some(state) = weak.upgrade() else {
                        return false;
                    };
                    Self::handle_click(editor, &state, click.target, click.shift)
                }
            }),
        ));
        for kind in [CommandKind::KeyDelete, CommandKind::KeyBackspace] {
            registrations.push(editor.register_command(
                kind,
                CommandPriority::Low,
                Rc::new({
                    let weak = Rc::downgrade(&state);
                    move |editor, _payload| {
                        let Some(state) = weak.upgrade() else {
                            return false;
                        };
                        Self::handle_delete_key(editor, &state)
                    }
                }),
            ));
        }

        Self {
            editor: editor.clone(),
            state,
            _registrations: registrations,
        }
    }

    /// Element rendering this poll, used to claim clicks
    pub fn set_root_element(&self, root: Option<ElementId>) {
        self.state.root.set(root);
    }

    fn handle_click(
        editor: &Editor,
        state: &PollState,
        target: Option<ElementId>,
        shift: bool,
    ) -> bool {
        let Some(root) = state.root.get() else {
            return false;
        };
        let Some(target) = target else {
            return false;
        };
        if !editor.elements().borrow().contains(root, target) {
            return false;
        }
        // Shift-click is the host's additive selection, not ours to claim
        if shift {
            return false;
        }
        let rect = editor.elements().borrow().rect(root);
        if let Err(err) = editor.update_selection(
            Selection::Node(state.key),
            NativeSelection {
                anchor_element: Some(target),
                rect,
                collapsed: false,
            },
        ) {
            warn!(error = %err, "poll click could not update selection");
            return false;
        }
        true
    }

    fn handle_delete_key(editor: &Editor, state: &PollState) -> bool {
        let selected = editor
            .run_read(|scope| scope.selection() == &Selection::Node(state.key))
            .unwrap_or(false);
        if !selected {
            return false;
        }
        let removed = editor.run_update(|scope| {
            let removed = scope.doc_mut().remove_block(state.key).is_some();
            if removed {
                scope.set_selection(Selection::None);
            }
            removed
        });
        match removed {
            Ok(removed) => removed,
            Err(err) => {
                warn!(error = %err, "poll block removal failed");
                false
            }
        }
    }

    /// Whether this widget is the current node selection
    pub fn is_selected(&self) -> bool {
        self.editor
            .run_read(|scope| scope.selection() == &Selection::Node(self.state.key))
            .unwrap_or(false)
    }

    // --- poll edits ---

    pub fn toggle_vote(&self, uid: &str) -> PollEdit {
        let participant = self.state.participant.clone();
        self.with_poll(move |poll| poll.toggle_vote(uid, &participant))
    }

    /// Rewrite one option's text. The completion callback runs after the
    /// commit and before update listeners — the slot for putting the caret
    /// back into the re-rendered input.
    pub fn set_option_text(
        &self,
        uid: &str,
        text: &str,
        restore_focus: impl FnOnce(&Editor),
    ) -> PollEdit {
        self.with_poll_and(
            move |poll| poll.set_option_text(uid, text),
            restore_focus,
        )
    }

    /// Append a fresh empty option; its uid, for focusing the new input
    pub fn add_option(&self) -> Option<String> {
        let key = self.state.key;
        let outcome = self.editor.run_update(|scope| {
            scope
                .doc_mut()
                .poll_mut(key)
                .map(|poll| poll.add_option().uid.clone())
        });
        match outcome {
            Ok(uid) => uid,
            Err(err) => {
                warn!(error = %err, "could not add poll option");
                None
            }
        }
    }

    pub fn delete_option(&self, uid: &str) -> PollEdit {
        self.with_poll(move |poll| poll.delete_option(uid))
    }

    /// The trash buttons render only while the poll is above its floor
    pub fn can_delete_options(&self) -> bool {
        self.read_poll(|poll| poll.options.len() > MIN_OPTIONS)
            .unwrap_or(false)
    }

    // --- snapshots for rendering ---

    pub fn question(&self) -> String {
        self.read_poll(|poll| poll.question.clone())
            .unwrap_or_default()
    }

    pub fn options(&self) -> Vec<PollOption> {
        self.read_poll(|poll| poll.options.clone())
            .unwrap_or_default()
    }

    pub fn total_votes(&self) -> usize {
        self.read_poll(PollNode::total_votes).unwrap_or(0)
    }

    fn read_poll<R>(&self, f: impl FnOnce(&PollNode) -> R) -> Option<R> {
        let key = self.state.key;
        self.editor
            .run_read(|scope| scope.doc().poll(key).map(f))
            .ok()
            .flatten()
    }

    fn with_poll(&self, f: impl FnOnce(&mut PollNode) -> PollEdit) -> PollEdit {
        self.with_poll_and(f, |_| {})
    }

    fn with_poll_and(
        &self,
        f: impl FnOnce(&mut PollNode) -> PollEdit,
        on_update: impl FnOnce(&Editor),
    ) -> PollEdit {
        let key = self.state.key;
        let outcome = self.editor.run_update_with(
            |scope| match scope.doc_mut().poll_mut(key) {
                Some(poll) => f(poll),
                None => PollEdit::noop(format!("poll block {:?} no longer exists", key)),
            },
            on_update,
        );
        match outcome {
            Ok(edit) => {
                if !edit.is_applied() {
                    debug!(?edit, "poll edit did not apply");
                }
                edit
            }
            Err(err) => {
                warn!(error = %err, "poll edit refused by the engine");
                PollEdit::noop(err.to_string())
            }
        }
    }
}
