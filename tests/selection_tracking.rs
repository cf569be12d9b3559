use redraft::document::FormatCommand;
use redraft::editor::Editor;

#[test]
fn capture_returns_none_without_a_selection() {
    let editor = Editor::with_text("some text");
    assert!(editor.capture().is_none());
}

#[test]
fn capture_and_restore_round_trip() {
    let mut editor = Editor::with_text("The quick brown fox");
    editor.select_str("quick").expect("selection should be found");
    let range = editor.capture().expect("capture should succeed");

    editor.clear_selection();
    assert!(editor.restore(&range), "restore should succeed");
    assert_eq!(editor.selected_text(), "quick");
}

#[test]
fn restore_survives_edits_elsewhere() {
    let mut editor = Editor::with_text("first\nsecond\nthird");
    editor.select_str("second").expect("selection should be found");
    let range = editor.capture().expect("capture should succeed");

    // The user keeps editing another block during the async call.
    editor.select_str("third").expect("selection should be found");
    editor
        .insert_at_cursor(" and more")
        .expect("insert should succeed");
    assert_eq!(editor.text(), "first\nsecond\nthird and more");

    assert!(editor.restore(&range), "restore should still succeed");
    assert_eq!(editor.selected_text(), "second");
}

#[test]
fn restore_is_skipped_after_wholesale_replacement() {
    let mut editor = Editor::with_text("before");
    editor.select_str("before").expect("selection should be found");
    let range = editor.capture().expect("capture should succeed");

    editor.set_content("after");
    assert!(!editor.restore(&range), "epoch change must skip restore");
}

#[test]
fn restore_fails_once_the_anchored_span_is_deleted() {
    let mut editor = Editor::with_text("abc\ndef\nghi");
    editor.select_str("def").expect("selection should be found");
    let inner = editor.capture().expect("capture should succeed");

    editor
        .select_str("bc\ndef\ngh")
        .expect("selection should be found");
    let wide = editor.capture().expect("capture should succeed");
    editor
        .replace_range(&wide, "X")
        .expect("replace should succeed");
    assert_eq!(editor.text(), "aXi");

    assert!(!editor.restore(&inner), "deleted span must not restore");
}

#[test]
fn collapse_to_end_yields_a_zero_width_range() {
    let mut editor = Editor::with_text("Hello world");
    editor.select_str("Hello").expect("selection should be found");
    let range = editor.capture().expect("capture should succeed");

    let collapsed = range.collapse_to_end();
    assert!(collapsed.is_collapsed());
    assert!(!range.is_collapsed());
    assert_eq!(
        collapsed
            .preceding_context(editor.document())
            .as_deref(),
        Some("Hello")
    );
}

#[test]
fn preceding_context_walks_the_block_structure() {
    let mut editor = Editor::with_text("Hello\nworld wide");
    editor.select_str("world").expect("selection should be found");
    let range = editor.capture().expect("capture should succeed").collapse_to_end();

    assert_eq!(
        range.preceding_context(editor.document()).as_deref(),
        Some("Hello\nworld")
    );
}

#[test]
fn preceding_context_is_none_after_wholesale_replacement() {
    let mut editor = Editor::with_text("context");
    editor.select_str("context").expect("selection should be found");
    let range = editor.capture().expect("capture should succeed");

    editor.set_content("replaced");
    assert!(range.preceding_context(editor.document()).is_none());
}

#[test]
fn replace_range_mutates_exactly_the_captured_range() {
    let mut editor = Editor::with_text("Alpha beta gamma");
    editor.select_str("beta").expect("selection should be found");
    let range = editor.capture().expect("capture should succeed");

    editor
        .replace_range(&range, "BETA")
        .expect("replace should succeed");
    assert_eq!(editor.text(), "Alpha BETA gamma");
    assert_eq!(editor.word_count(), 3);
}

#[test]
fn insert_at_cursor_appends_at_the_selection_end() {
    let mut editor = Editor::with_text("Hello world");
    editor.select_str("world").expect("selection should be found");
    editor.insert_at_cursor("!").expect("insert should succeed");
    assert_eq!(editor.text(), "Hello world!");
}

#[test]
fn insert_at_cursor_falls_back_to_the_document_end() {
    let mut editor = Editor::with_text("Hello");
    editor.insert_at_cursor(" there").expect("insert should succeed");
    assert_eq!(editor.text(), "Hello there");
}

#[test]
fn format_without_a_selection_is_an_error() {
    let mut editor = Editor::with_text("The quick brown fox");
    let err = editor.format(&FormatCommand::Bold).unwrap_err();
    assert!(
        err.to_string().contains("no selection"),
        "unexpected error: {err:?}"
    );
}

#[test]
fn format_styles_the_live_selection_in_place() {
    let mut editor = Editor::with_text("The quick brown fox");
    editor.select_str("quick").expect("selection should be found");
    editor.format(&FormatCommand::Bold).expect("format should succeed");

    let inside = editor.document().anchor_at(6).expect("anchor inside the word");
    let outside = editor.document().anchor_at(1).expect("anchor outside the word");
    assert!(editor.document().style_at(inside).expect("style should resolve").bold);
    assert!(!editor.document().style_at(outside).expect("style should resolve").bold);

    // Formatting never changes the text itself.
    assert_eq!(editor.text(), "The quick brown fox");
    assert_eq!(editor.word_count(), 4);
}

#[test]
fn select_range_drives_the_live_selection_from_anchors() {
    let mut editor = Editor::with_text("Alpha beta gamma");
    let start = editor.document().anchor_at(6).expect("start anchor");
    let end = editor.document().anchor_at(10).expect("end anchor");

    editor.select_range(start, end);
    assert_eq!(editor.selected_text(), "beta");
}
