use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;
use scribe_common::dom::ElementId;
use scribe_common::geometry::{OverlayPosition, Rect};
use scribe_doc::{
    Block, BlockKind, Document, HeadingTag, InlineNode, LinkNode, ListTag, NodeKey, TextFormat,
    TextRun,
};
use scribe_host::{
    ClickEvent, CommandKind, CommandPayload, Editor, NativeSelection, RangeSelection, Selection,
};
use scribe_overlay::{
    FormatToolbar, OverlaySurface, RecordingSurface, RefreshTrigger, SelectionObserver,
};

fn text_document(text: &str) -> (Document, NodeKey) {
    let block = Block::paragraph(vec![InlineNode::Text(TextRun::new(text))]);
    let key = block.key();
    let mut doc = Document::new();
    doc.blocks.push(block);
    (doc, key)
}

fn mount(editor: &Editor) -> (ElementId, ElementId) {
    let elements = editor.elements();
    let mut tree = elements.borrow_mut();
    let root = tree.insert_root(Rect::new(0.0, 0.0, 800.0, 600.0));
    let anchor = tree.insert(root, Rect::new(300.0, 250.0, 120.0, 18.0));
    editor.set_root_element(Some(root));
    (root, anchor)
}

fn surface() -> Rc<RefCell<RecordingSurface>> {
    Rc::new(RefCell::new(RecordingSurface::new(
        Rect::new(0.0, 0.0, 200.0, 40.0),
        Rect::new(0.0, 0.0, 800.0, 600.0),
    )))
}

fn setup(
    text: &str,
) -> (
    Editor,
    SelectionObserver,
    FormatToolbar,
    Rc<RefCell<RecordingSurface>>,
    NodeKey,
    ElementId,
) {
    let (doc, block) = text_document(text);
    let editor = Editor::with_document(doc);
    let (_root, anchor) = mount(&editor);
    let observer = SelectionObserver::attach(&editor);
    let surface = surface();
    let dyn_surface: Rc<RefCell<dyn OverlaySurface>> = surface.clone();
    let toolbar = FormatToolbar::attach(&editor, &observer, dyn_surface);
    (editor, observer, toolbar, surface, block, anchor)
}

fn select(editor: &Editor, block: NodeKey, from: usize, to: usize, anchor: ElementId) {
    editor
        .update_selection(
            Selection::Range(RangeSelection::within_block(block, 0, from, 0, to)),
            NativeSelection {
                anchor_element: Some(anchor),
                rect: Some(Rect::new(300.0, 250.0, 120.0, 18.0)),
                collapsed: from == to,
            },
        )
        .unwrap();
}

#[test]
fn shows_above_a_text_range_selection() {
    let (editor, _observer, toolbar, surface, block, anchor) = setup("hello toolbar");
    assert!(!toolbar.visible());

    select(&editor, block, 0, 5, anchor);

    assert!(toolbar.visible());
    let position = surface.borrow().last_position().unwrap();
    assert_eq!(position.opacity, 1.0);
    // Above the selection rect: 300 - 40 - 10
    assert_eq!(position.top, 250.0);
}

#[test]
fn hides_on_collapsed_selection() {
    let (editor, _observer, toolbar, surface, block, anchor) = setup("hello toolbar");
    select(&editor, block, 0, 5, anchor);
    assert!(toolbar.visible());

    select(&editor, block, 3, 3, anchor);

    assert!(!toolbar.visible());
    assert_eq!(
        surface.borrow().last_position().unwrap(),
        OverlayPosition::PARKED
    );
}

#[test]
fn hides_inside_a_code_block() {
    let block = Block::Text {
        key: NodeKey::next(),
        kind: BlockKind::Code,
        children: vec![InlineNode::Text(TextRun::new("let x = 1;"))],
    };
    let key = block.key();
    let mut doc = Document::new();
    doc.blocks.push(block);
    let editor = Editor::with_document(doc);
    let (_root, anchor) = mount(&editor);
    let observer = SelectionObserver::attach(&editor);
    let surface = surface();
    let dyn_surface: Rc<RefCell<dyn OverlaySurface>> = surface.clone();
    let toolbar = FormatToolbar::attach(&editor, &observer, dyn_surface);

    select(&editor, key, 0, 5, anchor);
    assert!(!toolbar.visible());
}

#[test]
fn hides_when_a_link_is_under_the_selection() {
    let block = Block::paragraph(vec![InlineNode::Link(LinkNode {
        url: "https://example.com/".to_string(),
        children: vec![TextRun::new("linked")],
    })]);
    let key = block.key();
    let mut doc = Document::new();
    doc.blocks.push(block);
    let editor = Editor::with_document(doc);
    let (_root, anchor) = mount(&editor);
    let observer = SelectionObserver::attach(&editor);
    let surface = surface();
    let dyn_surface: Rc<RefCell<dyn OverlaySurface>> = surface.clone();
    let toolbar = FormatToolbar::attach(&editor, &observer, dyn_surface);

    select(&editor, key, 0, 4, anchor);
    assert!(!toolbar.visible());
    assert!(toolbar.link_active());
}

#[test]
fn hides_when_selected_text_is_only_line_breaks() {
    let (editor, _observer, toolbar, _surface, block, anchor) = setup("\n\n");
    select(&editor, block, 0, 2, anchor);
    assert!(!toolbar.visible());
}

#[test]
fn format_button_toggles_the_mark_and_highlights() -> Result<()> {
    let (editor, _observer, toolbar, _surface, block, anchor) = setup("hello toolbar");
    select(&editor, block, 0, 13, anchor);
    assert!(!toolbar.active_style().bold);

    toolbar.toggle_format(TextFormat::Bold);

    assert!(toolbar.active_style().bold);
    editor.run_read(|scope| {
        let children = scope.doc().block(block).unwrap().children().to_vec();
        assert!(matches!(&children[0], InlineNode::Text(run) if run.style.bold));
    })?;

    toolbar.toggle_format(TextFormat::Bold);
    assert!(!toolbar.active_style().bold);
    Ok(())
}

#[test]
fn link_button_wraps_then_hides_the_toolbar() -> Result<()> {
    let (editor, _observer, toolbar, _surface, block, anchor) = setup("hello toolbar");
    select(&editor, block, 0, 5, anchor);
    assert!(!toolbar.link_active());

    toolbar.toggle_link();

    editor.run_read(|scope| {
        let children = scope.doc().block(block).unwrap().children().to_vec();
        match &children[0] {
            InlineNode::Link(link) => assert_eq!(link.url, "https://google.com/"),
            other => panic!("expected link, got {other:?}"),
        }
    })?;
    // Link under the selection now; the toolbar yields to the link editor
    assert!(toolbar.link_active());
    assert!(!toolbar.visible());
    Ok(())
}

#[test]
fn block_pick_applies_and_closes_the_dropdown() {
    let (editor, _observer, toolbar, _surface, block, anchor) = setup("hello toolbar");
    select(&editor, block, 0, 5, anchor);

    assert!(toolbar.toggle_dropdown());
    toolbar.apply_block(BlockKind::Heading(HeadingTag::H2));

    assert!(!toolbar.dropdown_open());
    assert_eq!(toolbar.block_type(), Some(BlockKind::Heading(HeadingTag::H2)));
}

#[test]
fn repicking_the_active_type_is_a_noop_but_still_closes() {
    let (editor, _observer, toolbar, _surface, block, anchor) = setup("hello toolbar");
    select(&editor, block, 0, 5, anchor);

    toolbar.toggle_dropdown();
    let version = editor.version();
    toolbar.apply_block(BlockKind::Paragraph);

    assert!(!toolbar.dropdown_open());
    assert_eq!(editor.version(), version);
}

#[test]
fn repicking_the_active_list_type_unwraps_it() {
    let (editor, _observer, toolbar, _surface, block, anchor) = setup("hello toolbar");
    select(&editor, block, 0, 5, anchor);

    toolbar.apply_block(BlockKind::List(ListTag::Ul));
    assert_eq!(toolbar.block_type(), Some(BlockKind::List(ListTag::Ul)));

    toolbar.apply_block(BlockKind::List(ListTag::Ul));
    assert_eq!(toolbar.block_type(), Some(BlockKind::Paragraph));
}

#[test]
fn outside_click_closes_the_dropdown_but_not_the_toolbar() {
    let (editor, _observer, toolbar, surface, block, anchor) = setup("hello toolbar");
    select(&editor, block, 0, 5, anchor);

    let (toolbar_root, dropdown_root, menu_item) = {
        let elements = editor.elements();
        let mut tree = elements.borrow_mut();
        let toolbar_root = tree.insert_root(Rect::new(250.0, 210.0, 200.0, 40.0));
        let dropdown_root = tree.insert_root(Rect::new(290.0, 210.0, 160.0, 220.0));
        let menu_item = tree.insert(dropdown_root, Rect::new(295.0, 215.0, 150.0, 24.0));
        (toolbar_root, dropdown_root, menu_item)
    };
    surface.borrow_mut().root = Some(toolbar_root);
    toolbar.set_dropdown_root(Some(dropdown_root));
    toolbar.toggle_dropdown();

    let inside = CommandPayload::Click(ClickEvent {
        target: Some(menu_item),
        shift: false,
    });
    assert!(!editor.dispatch(CommandKind::Click, &inside));
    assert!(toolbar.dropdown_open());

    let outside = CommandPayload::Click(ClickEvent {
        target: Some(anchor),
        shift: false,
    });
    assert!(!editor.dispatch(CommandKind::Click, &outside));
    assert!(!toolbar.dropdown_open());
    assert!(toolbar.visible());
}

#[test]
fn drag_selection_across_the_page_suspends_pointer_capture() {
    let (editor, _observer, toolbar, surface, block, anchor) = setup("hello toolbar");
    select(&editor, block, 0, 5, anchor);

    let toolbar_root = {
        let elements = editor.elements();
        let mut tree = elements.borrow_mut();
        tree.insert_root(Rect::new(250.0, 210.0, 200.0, 40.0))
    };
    surface.borrow_mut().root = Some(toolbar_root);

    // Hovering without buttons changes nothing
    toolbar.on_pointer_move(0, 400.0, 500.0);
    assert!(surface.borrow().pointer_capture);

    // Primary-button drag over the document text
    toolbar.on_pointer_move(1, 500.0, 500.0);
    assert!(!surface.borrow().pointer_capture);

    toolbar.on_pointer_up();
    assert!(surface.borrow().pointer_capture);

    // A drag that stays over the toolbar keeps capture
    toolbar.on_pointer_move(1, 260.0, 270.0);
    assert!(surface.borrow().pointer_capture);
}

#[test]
fn composition_freezes_the_toolbar() {
    let (editor, observer, toolbar, _surface, block, anchor) = setup("hello toolbar");
    select(&editor, block, 0, 5, anchor);
    assert!(toolbar.visible());

    editor.set_composing(true);
    select(&editor, block, 2, 2, anchor);
    // Collapsed now, but the descriptor is frozen mid-composition
    assert!(toolbar.visible());

    editor.set_composing(false);
    observer.refresh(RefreshTrigger::SelectionChange);
    assert!(!toolbar.visible());
}
