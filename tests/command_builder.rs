use vim_modal::{Action, Mode, OperatorId, PendingCommand, Range, ReturnTo, SelectionKind};

mod support;
use support::mock_buffer::{Session, operators};

fn single_operator(actions: &[Action]) -> Action {
    let ops = operators(actions);
    assert_eq!(ops.len(), 1, "expected exactly one operator in {actions:?}");
    ops[0].clone()
}

#[test]
fn composite_count_multiplies() {
    let mut session = Session::new("one two three four five six seven eight\n");
    let actions = session.keys("3d2w");
    assert_eq!(
        single_operator(&actions),
        Action::ApplyOperator {
            operator: OperatorId::Delete,
            range: Range::char_wise(0, 28),
            kind: SelectionKind::Character,
            count: 6,
            register: None,
        }
    );
    assert_eq!(session.text(), "seven eight\n");
    assert_eq!(session.engine.mode(), Mode::Normal);
}

#[test]
fn pending_command_is_visible() {
    let mut session = Session::new("text\n");
    session.keys("\"a2d");
    let snapshot = session.engine.snapshot();
    assert_eq!(
        snapshot.mode,
        Mode::OperatorPending {
            return_to: ReturnTo::Normal
        }
    );
    assert_eq!(
        snapshot.command,
        PendingCommand {
            count: Some(2),
            register: Some('a'),
            operator: Some(OperatorId::Delete),
            awaiting_argument: true,
        }
    );
}

#[test]
fn escape_aborts_to_empty() {
    let mut session = Session::new("text\n");
    let actions = session.keys("\"a2d<Esc>");
    assert!(actions.is_empty());
    let snapshot = session.engine.snapshot();
    assert!(snapshot.command.is_empty());
    assert!(snapshot.pending_keys.is_empty());
    assert_eq!(snapshot.mode, Mode::Normal);

    // Mode is left alone when aborting a count in Visual mode.
    session.keys("v3<Esc>");
    assert!(session.engine.mode().is_visual());
    assert!(session.engine.snapshot().command.is_empty());
}

#[test]
fn escape_drops_partial_key_sequence() {
    let mut session = Session::new("text\n");
    session.keys("g");
    assert!(session.engine.has_pending_keys());
    let actions = session.keys("<Esc>");
    assert!(actions.is_empty());
    assert!(!session.engine.has_pending_keys());
}

#[test]
fn doubled_operator_acts_on_lines() {
    let mut session = Session::new("one\ntwo\nthree\nfour\n").at(5);
    session.keys("dd");
    assert_eq!(session.text(), "one\nthree\nfour\n");
    assert_eq!(session.cursor, 4);

    session.keys("d2d");
    assert_eq!(session.text(), "one\n");

    let mut session = Session::new("one\ntwo\n");
    let actions = session.keys("\"byy");
    let Action::ApplyOperator { kind, register, .. } = single_operator(&actions) else {
        unreachable!();
    };
    assert_eq!(kind, SelectionKind::Line);
    assert_eq!(register, Some('b'));
    assert_eq!(session.buffer.register.as_deref(), Some("one\n"));
}

#[test]
fn mismatched_operator_aborts() {
    let mut session = Session::new("one\n");
    let actions = session.keys("dc");
    assert_eq!(actions, vec![Action::Bell]);
    assert_eq!(session.engine.mode(), Mode::Normal);
    assert_eq!(session.text(), "one\n");
}

#[test]
fn invalid_register_rings_bell() {
    let mut session = Session::new("one\n");
    let actions = session.keys("\"!");
    assert_eq!(actions, vec![Action::Bell]);
    session.keys("dd");
    assert_eq!(session.buffer.register.as_deref(), Some("one\n"));
}

#[test]
fn operator_without_range_aborts() {
    let mut session = Session::new("abc\n");
    let actions = session.keys("dh");
    assert_eq!(actions, vec![Action::Bell]);
    assert_eq!(session.engine.mode(), Mode::Normal);
}

#[test]
fn unknown_key_aborts_pending_operator() {
    let mut session = Session::new("abc\n");
    let actions = session.keys("dQ");
    assert_eq!(actions, vec![Action::Bell]);
    assert_eq!(session.engine.mode(), Mode::Normal);
    assert!(session.engine.snapshot().command.is_empty());
}

#[test]
fn inclusive_and_linewise_operators() {
    let mut session = Session::new("abc\n").at(1);
    session.keys("d$");
    assert_eq!(session.text(), "a\n");

    let mut session = Session::new("abcdef\nab\nabcdef\n");
    session.keys("dj");
    assert_eq!(session.text(), "abcdef\n");
}

#[test]
fn change_enters_insert() {
    let mut session = Session::new("foo bar\n");
    session.keys("cwbaz");
    assert_eq!(session.text(), "baz bar\n");
    assert_eq!(session.engine.mode(), Mode::Insert);
}

#[test]
fn counted_motions() {
    let mut session = Session::new("0123456789abc\n");
    session.keys("10l");
    assert_eq!(session.cursor, 10);
    session.keys("0");
    assert_eq!(session.cursor, 0);
    session.keys("3l2h");
    assert_eq!(session.cursor, 1);
}

#[test]
fn file_motions() {
    let mut session = Session::new("one\n  two\nthree\n");
    session.keys("G");
    assert_eq!(session.cursor, 10);
    session.keys("gg");
    assert_eq!(session.cursor, 0);
    session.keys("2G");
    assert_eq!(session.cursor, 6);
}

#[test]
fn vertical_motion_keeps_column() {
    let mut session = Session::new("abcdef\nab\nabcdef\n").at(4);
    session.keys("j");
    assert_eq!(session.cursor, 8);
    session.keys("j");
    assert_eq!(session.cursor, 14);

    let mut session = Session::new("abc\nabcdef\n");
    session.keys("$j");
    assert_eq!(session.cursor, 9);
}

#[test]
fn failed_motion_rings_bell() {
    let mut session = Session::new("abc\n");
    assert_eq!(session.keys("h"), vec![Action::Bell]);
    assert_eq!(session.cursor, 0);
}

#[test]
fn huge_counts_stop_at_buffer_edge() {
    let mut session = Session::new("foo bar baz\n");
    session.keys("999999999w");
    assert_eq!(session.cursor, 11);
    session.keys("999999999b");
    assert_eq!(session.cursor, 0);
    session.keys("999999999e");
    assert_eq!(session.cursor, 10);

    let mut session = Session::new("foo bar baz\n");
    session.keys("d999999999w");
    assert_eq!(session.text(), "");
    assert_eq!(session.engine.mode(), Mode::Normal);
}
