//! Transactional discipline and built-in mutation handling

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;
use scribe_doc::{
    Block, BlockKind, Document, HeadingTag, InlineNode, ListTag, NodeKey, TextFormat, TextRun,
};
use scribe_host::{
    CommandKind, CommandPayload, NativeSelection, RangeSelection, Selection, Editor, EngineError,
};

fn one_paragraph(text: &str) -> (Document, NodeKey) {
    let block = Block::paragraph(vec![InlineNode::Text(TextRun::new(text))]);
    let key = block.key();
    let doc = Document {
        blocks: vec![block],
    };
    (doc, key)
}

fn select_all(editor: &Editor, key: NodeKey, len: usize) {
    editor
        .update_selection(
            Selection::Range(RangeSelection::within_block(key, 0, 0, 0, len)),
            NativeSelection::default(),
        )
        .unwrap();
}

#[test]
fn update_commits_and_bumps_version() -> Result<()> {
    let (doc, key) = one_paragraph("hello");
    let editor = Editor::with_document(doc);
    assert_eq!(editor.version(), 0);

    editor.run_update(|scope| {
        scope.doc_mut().remove_block(key);
    })?;

    assert_eq!(editor.version(), 1);
    let blocks = editor.run_read(|scope| scope.doc().blocks.len())?;
    assert_eq!(blocks, 0);
    Ok(())
}

#[test]
fn listeners_observe_only_committed_state() -> Result<()> {
    let (doc, key) = one_paragraph("hello");
    let editor = Editor::with_document(doc);

    let seen = Rc::new(RefCell::new(Vec::new()));
    let _listener = editor.register_update_listener({
        let seen = Rc::clone(&seen);
        move |editor| {
            let text = editor
                .run_read(|scope| {
                    scope
                        .doc()
                        .block(key)
                        .map(|b| b.text_content())
                        .unwrap_or_default()
                })
                .unwrap();
            seen.borrow_mut().push(text);
        }
    });

    editor.run_update(|scope| {
        if let Some(children) = scope.doc_mut().block_mut(key).and_then(Block::children_mut) {
            children.push(InlineNode::Text(TextRun::new(" world")));
        }
    })?;

    assert_eq!(*seen.borrow(), vec!["hello world".to_string()]);
    Ok(())
}

#[test]
fn empty_update_still_commits_and_notifies() -> Result<()> {
    let (doc, _) = one_paragraph("hello");
    let editor = Editor::with_document(doc);

    let notified = Rc::new(RefCell::new(0));
    let _listener = editor.register_update_listener({
        let notified = Rc::clone(&notified);
        move |_| *notified.borrow_mut() += 1
    });

    // A declined mutation is still an entered update: version moves and
    // listeners recompute from the (unchanged) committed snapshot
    let applied = editor.run_update(|scope| scope.doc_mut().remove_block(NodeKey(u64::MAX)))?;
    assert!(applied.is_none());
    assert_eq!(editor.version(), 1);
    assert_eq!(*notified.borrow(), 1);
    Ok(())
}

#[test]
fn update_inside_read_is_refused() -> Result<()> {
    let (doc, key) = one_paragraph("hello");
    let editor = Editor::with_document(doc);

    let attempted = editor.run_read(|_scope| {
        editor.run_update(|scope| {
            scope.doc_mut().remove_block(key);
        })
    })?;

    assert!(matches!(attempted, Err(EngineError::ReentrantUpdate(_))));
    // The refused mutation must not have leaked through
    let blocks = editor.run_read(|scope| scope.doc().blocks.len())?;
    assert_eq!(blocks, 1);
    Ok(())
}

#[test]
fn update_inside_listener_is_refused() -> Result<()> {
    let (doc, key) = one_paragraph("hello");
    let editor = Editor::with_document(doc);

    let refused = Rc::new(RefCell::new(false));
    let _listener = editor.register_update_listener({
        let refused = Rc::clone(&refused);
        move |editor| {
            let attempt = editor.run_update(|scope| {
                scope.doc_mut().remove_block(key);
            });
            if matches!(attempt, Err(EngineError::ReentrantUpdate(_))) {
                *refused.borrow_mut() = true;
            }
        }
    });

    editor.run_update(|_| {})?;
    assert!(*refused.borrow());
    Ok(())
}

#[test]
fn on_update_runs_before_listeners() -> Result<()> {
    let (doc, _) = one_paragraph("hello");
    let editor = Editor::with_document(doc);

    let order = Rc::new(RefCell::new(Vec::new()));
    let _listener = editor.register_update_listener({
        let order = Rc::clone(&order);
        move |_| order.borrow_mut().push("listener")
    });

    let order_for_callback = Rc::clone(&order);
    editor.run_update_with(
        |_| {},
        move |_| order_for_callback.borrow_mut().push("on_update"),
    )?;

    assert_eq!(*order.borrow(), vec!["on_update", "listener"]);
    Ok(())
}

#[test]
fn format_text_command_toggles_marks() -> Result<()> {
    let (doc, key) = one_paragraph("hello");
    let editor = Editor::with_document(doc);
    select_all(&editor, key, 5);

    assert!(editor.dispatch(
        CommandKind::FormatText,
        &CommandPayload::Format(TextFormat::Bold)
    ));
    let style = editor.run_read(|scope| {
        scope
            .selection()
            .as_range()
            .unwrap()
            .shared_style(scope.doc())
    })?;
    assert!(style.has(TextFormat::Bold));

    // Toggling again removes the mark everywhere
    editor.dispatch(
        CommandKind::FormatText,
        &CommandPayload::Format(TextFormat::Bold),
    );
    let style = editor.run_read(|scope| {
        scope
            .selection()
            .as_range()
            .unwrap()
            .shared_style(scope.doc())
    })?;
    assert!(!style.has(TextFormat::Bold));
    Ok(())
}

#[test]
fn toggle_link_wraps_retargets_and_unwraps() -> Result<()> {
    let (doc, key) = one_paragraph("click here");
    let editor = Editor::with_document(doc);
    select_all(&editor, key, 10);

    editor.dispatch(
        CommandKind::ToggleLink,
        &CommandPayload::Link(Some("https://example.com/".into())),
    );
    let url = |editor: &Editor| {
        editor
            .run_read(|scope| {
                scope
                    .selection()
                    .as_range()
                    .unwrap()
                    .containing_link_url(scope.doc())
            })
            .unwrap()
    };
    assert_eq!(url(&editor).as_deref(), Some("https://example.com/"));

    editor.dispatch(
        CommandKind::ToggleLink,
        &CommandPayload::Link(Some("https://example.org/".into())),
    );
    assert_eq!(url(&editor).as_deref(), Some("https://example.org/"));

    editor.dispatch(CommandKind::ToggleLink, &CommandPayload::Link(None));
    assert_eq!(url(&editor), None);
    // The text itself survives unwrapping
    let text = editor.run_read(|scope| scope.doc().block(key).unwrap().text_content())?;
    assert_eq!(text, "click here");
    Ok(())
}

#[test]
fn block_kind_commands_rewrite_touched_blocks() -> Result<()> {
    let (doc, key) = one_paragraph("title");
    let editor = Editor::with_document(doc);
    select_all(&editor, key, 5);

    editor.dispatch(
        CommandKind::SetBlock,
        &CommandPayload::Block(BlockKind::Heading(HeadingTag::H2)),
    );
    let kind = editor.run_read(|scope| scope.doc().block(key).and_then(Block::kind))?;
    assert_eq!(kind, Some(BlockKind::Heading(HeadingTag::H2)));

    editor.dispatch(
        CommandKind::InsertList,
        &CommandPayload::List(ListTag::Ul),
    );
    let kind = editor.run_read(|scope| scope.doc().block(key).and_then(Block::kind))?;
    assert_eq!(kind, Some(BlockKind::List(ListTag::Ul)));

    editor.dispatch(CommandKind::RemoveList, &CommandPayload::None);
    let kind = editor.run_read(|scope| scope.doc().block(key).and_then(Block::kind))?;
    assert_eq!(kind, Some(BlockKind::Paragraph));
    Ok(())
}

#[test]
fn selection_update_fires_selection_change() -> Result<()> {
    let (doc, key) = one_paragraph("hello");
    let editor = Editor::with_document(doc);

    let fired = Rc::new(RefCell::new(0));
    let _handle = editor.register_command(
        CommandKind::SelectionChange,
        scribe_host::CommandPriority::Low,
        Rc::new({
            let fired = Rc::clone(&fired);
            move |_, _| {
                *fired.borrow_mut() += 1;
                false
            }
        }),
    );

    select_all(&editor, key, 5);
    assert_eq!(*fired.borrow(), 1);
    Ok(())
}

#[test]
fn mutation_on_missing_block_is_not_consumed() -> Result<()> {
    // Surface the engine's rejection warning in test output
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let (doc, key) = one_paragraph("hello");
    let editor = Editor::with_document(doc);
    select_all(&editor, key, 5);
    editor.run_update(|scope| {
        scope.doc_mut().remove_block(key);
    })?;

    // The selection now points at a dead block; the built-in handler logs
    // and declines instead of panicking
    let consumed = editor.dispatch(
        CommandKind::FormatText,
        &CommandPayload::Format(TextFormat::Bold),
    );
    assert!(!consumed);
    Ok(())
}
