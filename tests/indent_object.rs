use vim_modal::{Action, IndentObject, OperatorId, Range, SelectionKind, TextObject};

mod support;
use support::mock_buffer::{Session, operators};

const BLOCK: &str = "a\n  b\n  c\n d\n";

fn chars(s: &str) -> Vec<char> {
    s.chars().collect()
}

fn text_of(s: &str, range: Range) -> String {
    s.chars().skip(range.start).take(range.len()).collect()
}

#[test]
fn inner_above_and_below_variants() {
    let text = chars(BLOCK);
    // Cursor on `b`.
    let inner = IndentObject::INNER.resolve(&text, 4);
    let above = IndentObject::WITH_ABOVE.resolve(&text, 4);
    let both = IndentObject::WITH_ABOVE_AND_BELOW.resolve(&text, 4);

    assert_eq!(inner, Range::line_wise(2, 10));
    assert_eq!(text_of(BLOCK, inner), "  b\n  c\n");
    assert_eq!(text_of(BLOCK, above), "a\n  b\n  c\n");
    assert_eq!(text_of(BLOCK, both), BLOCK);
}

#[test]
fn cursor_inside_indentation_uses_line_indent() {
    let text = chars(BLOCK);
    for cursor in [2, 3, 4, 5] {
        assert_eq!(IndentObject::INNER.resolve(&text, cursor), Range::line_wise(2, 10), "cursor {cursor}");
    }
}

#[test]
fn less_indented_line_spans_to_buffer_end() {
    let text = chars(BLOCK);
    // Cursor on ` d`: nothing below is less indented.
    assert_eq!(IndentObject::INNER.resolve(&text, 11), Range::line_wise(2, 13));
}

#[test]
fn zero_indent_selects_whole_buffer() {
    let text = chars(BLOCK);
    assert_eq!(IndentObject::INNER.resolve(&text, 0), Range::line_wise(0, 13));
    assert_eq!(IndentObject::WITH_ABOVE_AND_BELOW.resolve(&text, 0), Range::line_wise(0, 13));
}

#[test]
fn single_line_buffer_selects_the_line() {
    let text = chars("hello");
    assert_eq!(IndentObject::INNER.resolve(&text, 2), Range::line_wise(0, 5));

    let text = chars("    hello\n");
    assert_eq!(IndentObject::INNER.resolve(&text, 6), Range::line_wise(0, 10));
    assert_eq!(IndentObject::WITH_ABOVE.resolve(&text, 6), Range::line_wise(0, 10));
}

#[test]
fn empty_buffer_resolves_to_empty_range() {
    let text: Vec<char> = Vec::new();
    assert_eq!(IndentObject::INNER.resolve(&text, 0), Range::line_wise(0, 0));
}

#[test]
fn blank_lines_inside_block_are_kept() {
    let src = "def f():\n    x\n\n    y\nz\n";
    let text = chars(src);
    let inner = IndentObject::INNER.resolve(&text, 13);
    assert_eq!(text_of(src, inner), "    x\n\n    y\n");
    let both = IndentObject::WITH_ABOVE_AND_BELOW.resolve(&text, 13);
    assert_eq!(text_of(src, both), src);
}

#[test]
fn inner_skips_blank_lines_after_boundary() {
    let src = "a\n\n\n  b\n";
    let text = chars(src);
    let inner = IndentObject::INNER.resolve(&text, 6);
    assert_eq!(inner, Range::line_wise(4, 8));
    let above = IndentObject::WITH_ABOVE.resolve(&text, 6);
    assert_eq!(above, Range::line_wise(0, 8));
}

#[test]
fn cursor_past_end_is_clamped() {
    let text = chars(BLOCK);
    let range = IndentObject::INNER.resolve(&text, 500);
    assert!(range.end <= text.len());
}

#[test]
fn object_is_linewise() {
    assert_eq!(IndentObject::INNER.visual_type(), SelectionKind::Line);
    let text = chars(BLOCK);
    assert_eq!(IndentObject::WITH_ABOVE.range(&text, 4, 7), Some(Range::line_wise(0, 10)));
}

#[test]
fn delete_inner_indent() {
    let mut session = Session::new(BLOCK).at(4);
    let actions = session.keys("dii");
    assert_eq!(
        operators(&actions),
        vec![&Action::ApplyOperator {
            operator: OperatorId::Delete,
            range: Range::line_wise(2, 10),
            kind: SelectionKind::Line,
            count: 1,
            register: None,
        }]
    );
    assert_eq!(session.text(), "a\n d\n");
    assert_eq!(session.buffer.register.as_deref(), Some("  b\n  c\n"));
    assert_eq!(session.cursor, 2);
}

#[test]
fn inner_synonym_and_outer_variants_through_keys() {
    let mut session = Session::new(BLOCK).at(4);
    session.keys("yiI");
    assert_eq!(session.buffer.register.as_deref(), Some("  b\n  c\n"));

    let mut session = Session::new(BLOCK).at(4);
    session.keys("yai");
    assert_eq!(session.buffer.register.as_deref(), Some("a\n  b\n  c\n"));

    let mut session = Session::new(BLOCK).at(4);
    session.keys("daI");
    assert_eq!(session.text(), "");
}

#[test]
fn count_is_accepted_and_ignored() {
    let mut session = Session::new(BLOCK).at(4);
    let actions = session.keys("d3ii");
    let ops = operators(&actions);
    let [Action::ApplyOperator { range, count, .. }] = ops.as_slice() else {
        panic!("expected one operator");
    };
    assert_eq!(*range, Range::line_wise(2, 10));
    assert_eq!(*count, 3);
}

#[test]
fn visual_selection_becomes_linewise() {
    let mut session = Session::new(BLOCK).at(4);
    session.keys("vai");
    assert_eq!(
        session.engine.mode().selection_kind(),
        Some(SelectionKind::Line)
    );
    assert_eq!(session.selected().as_deref(), Some("a\n  b\n  c\n"));
    assert_eq!(session.cursor, 9);

    session.keys("d");
    assert_eq!(session.text(), " d\n");
    assert!(session.buffer.selection.is_none());
}

#[test]
fn change_inner_indent_enters_insert() {
    let mut session = Session::new(BLOCK).at(8);
    session.keys("cii");
    assert_eq!(session.engine.mode(), vim_modal::Mode::Insert);
    session.keys("x");
    assert_eq!(session.text(), "a\nx d\n");
}
