use redraft::document::{BlockKind, Document, FormatCommand};

#[test]
fn plain_text_round_trips_through_blocks() {
    let doc = Document::from_text("First line.\n\nThird line.");
    assert_eq!(doc.text(), "First line.\n\nThird line.");
    assert_eq!(doc.word_count(), 4);
}

#[test]
fn empty_document_has_an_end_anchor() {
    let doc = Document::new();
    assert!(doc.is_empty());
    let end = doc.end_anchor();
    assert!(doc.contains(end));
    assert_eq!(doc.text_before(end).as_deref(), Some(""));
}

#[test]
fn insert_in_the_middle_of_a_span() {
    let mut doc = Document::from_text("Hello world");
    let at = doc.anchor_at(5).expect("offset 5 should resolve");
    let caret = doc.insert(at, ", dear").expect("insert should succeed");
    assert_eq!(doc.text(), "Hello, dear world");
    assert_eq!(doc.text_before(caret).as_deref(), Some("Hello, dear"));
}

#[test]
fn anchors_survive_edits_elsewhere_in_the_document() {
    let mut doc = Document::from_text("abc\ndef");
    let saved = doc.anchor_at(4).expect("start of second block");

    // Edit the first block; the saved anchor names a different span and must
    // keep pointing at the start of "def".
    let front = doc.anchor_at(0).expect("document start");
    doc.insert(front, "XY").expect("insert should succeed");
    assert_eq!(doc.text(), "XYabc\ndef");

    doc.insert(saved, "!").expect("stale-free anchor should still resolve");
    assert_eq!(doc.text(), "XYabc\n!def");
}

#[test]
fn replace_within_one_span() {
    let mut doc = Document::from_text("The cat sat.");
    let start = doc.anchor_at(8).expect("start of 'sat.'");
    let end = doc.anchor_at(12).expect("end of 'sat.'");
    doc.replace(start, end, "was sitting quietly.")
        .expect("replace should succeed");
    assert_eq!(doc.text(), "The cat was sitting quietly.");
}

#[test]
fn replace_across_blocks_merges_the_tail() {
    let mut doc = Document::from_text("one two\nthree four\nfive six");
    let start = doc.anchor_at(4).expect("inside first block");
    let end = doc.anchor_at(18).expect("end of second block");
    doc.replace(start, end, "TWO-FOUR").expect("replace should succeed");
    assert_eq!(doc.text(), "one TWO-FOUR\nfive six");
}

#[test]
fn replacement_text_with_newlines_starts_new_blocks() {
    let mut doc = Document::from_text("head tail");
    let start = doc.anchor_at(4).expect("after 'head'");
    let end = doc.anchor_at(5).expect("before 'tail'");
    let caret = doc
        .replace(start, end, "\nmiddle\n")
        .expect("replace should succeed");
    assert_eq!(doc.text(), "head\nmiddle\ntail");
    assert_eq!(doc.text_before(caret).as_deref(), Some("head\nmiddle\n"));
}

#[test]
fn replace_tolerates_swapped_anchor_order() {
    let mut doc = Document::from_text("alpha beta");
    let start = doc.anchor_at(6).expect("start of 'beta'");
    let end = doc.anchor_at(10).expect("end of 'beta'");
    doc.replace(end, start, "BETA").expect("replace should succeed");
    assert_eq!(doc.text(), "alpha BETA");
}

#[test]
fn set_content_bumps_the_epoch_and_invalidates_anchors() {
    let mut doc = Document::from_text("old content");
    let saved = doc.anchor_at(4).expect("offset 4 should resolve");
    let epoch = doc.epoch();

    doc.set_content("entirely new content");
    assert_eq!(doc.epoch(), epoch + 1);
    assert!(!doc.contains(saved));
}

#[test]
fn inline_format_splits_spans_and_toggles() {
    let mut doc = Document::from_text("make this bold");
    let start = doc.anchor_at(5).expect("start of 'this'");
    let end = doc.anchor_at(9).expect("end of 'this'");

    doc.apply_format(start, end, &FormatCommand::Bold)
        .expect("format should succeed");
    assert_eq!(doc.text(), "make this bold");

    let mid = doc.anchor_at(6).expect("inside 'this'");
    assert!(doc.style_at(mid).expect("style should resolve").bold);
    let outside = doc.anchor_at(1).expect("inside 'make'");
    assert!(!doc.style_at(outside).expect("style should resolve").bold);

    // Toggling again clears the bit.
    let start = doc.anchor_at(5).expect("start of 'this'");
    let end = doc.anchor_at(9).expect("end of 'this'");
    doc.apply_format(start, end, &FormatCommand::Bold)
        .expect("format should succeed");
    let mid = doc.anchor_at(6).expect("inside 'this'");
    assert!(!doc.style_at(mid).expect("style should resolve").bold);
}

#[test]
fn block_format_retags_touched_blocks() {
    let mut doc = Document::from_text("Title\nBody text");
    let start = doc.anchor_at(0).expect("document start");
    let end = doc.anchor_at(3).expect("inside the title");

    doc.apply_format(start, end, &FormatCommand::Block(BlockKind::Heading1))
        .expect("format should succeed");

    assert_eq!(doc.block_kind_at(start), Some(BlockKind::Heading1));
    let body = doc.anchor_at(8).expect("inside the body");
    assert_eq!(doc.block_kind_at(body), Some(BlockKind::Paragraph));
}

#[test]
fn color_format_applies_to_the_covered_spans() {
    let mut doc = Document::from_text("red letters");
    let start = doc.anchor_at(0).expect("document start");
    let end = doc.anchor_at(3).expect("end of 'red'");

    doc.apply_format(start, end, &FormatCommand::Color("#ff0000".to_string()))
        .expect("format should succeed");

    let inside = doc.anchor_at(1).expect("inside 'red'");
    assert_eq!(
        doc.style_at(inside).expect("style should resolve").color.as_deref(),
        Some("#ff0000")
    );
    let outside = doc.anchor_at(5).expect("inside 'letters'");
    assert_eq!(doc.style_at(outside).expect("style should resolve").color, None);
}

#[test]
fn text_between_is_order_insensitive() {
    let doc = Document::from_text("one\ntwo\nthree");
    let a = doc.anchor_at(2).expect("inside 'one'");
    let b = doc.anchor_at(9).expect("inside 'three'");
    assert_eq!(doc.text_between(a, b).as_deref(), Some("e\ntwo\nt"));
    assert_eq!(doc.text_between(b, a).as_deref(), Some("e\ntwo\nt"));
}

#[test]
fn stale_anchor_offsets_clamp_to_the_span_end() {
    let mut doc = Document::from_text("abcdef");
    let late = doc.anchor_at(6).expect("document end");

    let start = doc.anchor_at(2).expect("offset 2");
    let end = doc.anchor_at(6).expect("offset 6");
    doc.replace(start, end, "").expect("delete should succeed");
    assert_eq!(doc.text(), "ab");

    // The anchor's span still exists; its offset clamps instead of erroring.
    doc.insert(late, "!").expect("clamped insert should succeed");
    assert_eq!(doc.text(), "ab!");
}
