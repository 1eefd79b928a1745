//! Editing modes and the transitions between them.
//!
//! [`Mode`] is a plain value: every mode that is entered temporarily carries
//! the mode to go back to, and [`Mode::on`] is a pure transition function.
//! [`ModeMachine`] wraps it with the selection anchor and the one-character
//! cursor adjustments needed when Visual and Select trade places.

use tracing::debug;

use crate::scan;
use crate::traits::TextView;
use crate::types::{Range, Selection, SelectionBehavior, SelectionKind};

/// Mode restored when a transient mode ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ReturnTo {
    #[default]
    Normal,
    Insert,
    Replace,
}

impl From<ReturnTo> for Mode {
    fn from(value: ReturnTo) -> Self {
        match value {
            ReturnTo::Normal => Mode::Normal,
            ReturnTo::Insert => Mode::Insert,
            ReturnTo::Replace => Mode::Replace,
        }
    }
}

/// The current mode of the engine.
///
/// Vim is a modal editor where the same keys perform different
/// actions depending on the current mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Normal mode - for navigation and operators.
    #[default]
    Normal,
    /// Insert mode - for typing text.
    Insert,
    /// Replace mode - typed text overwrites.
    Replace,
    /// Visual mode - selecting text for a command.
    Visual {
        kind: SelectionKind,
        return_to: ReturnTo,
        /// Entered from Select for a single command (`<C-o>`).
        one_shot: bool,
    },
    /// Select mode - typing replaces the selection.
    Select {
        kind: SelectionKind,
        return_to: ReturnTo,
    },
    /// An operator is waiting for its motion or text object.
    OperatorPending { return_to: ReturnTo },
}

/// Inputs to [`Mode::on`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeEvent {
    EnterInsert,
    EnterReplace,
    EnterVisual {
        kind: SelectionKind,
        return_to: ReturnTo,
    },
    ToggleVisual(SelectionKind),
    EnterSelect(SelectionKind),
    ToggleSelectVisual,
    SingleVisualCommand,
    EnterOperatorPending,
    /// A motion or text object finished running.
    CommandDone,
    /// Escape, or an operator consumed the selection.
    Exit,
}

impl Mode {
    /// The mode a transient mode falls back to. Normal, Insert and Replace
    /// return to themselves.
    pub fn base(self) -> ReturnTo {
        match self {
            Mode::Normal => ReturnTo::Normal,
            Mode::Insert => ReturnTo::Insert,
            Mode::Replace => ReturnTo::Replace,
            Mode::Visual { return_to, .. }
            | Mode::Select { return_to, .. }
            | Mode::OperatorPending { return_to } => return_to,
        }
    }

    pub fn is_visual(self) -> bool {
        matches!(self, Mode::Visual { .. })
    }

    pub fn is_select(self) -> bool {
        matches!(self, Mode::Select { .. })
    }

    /// Visual or Select.
    pub fn has_selection(self) -> bool {
        self.selection_kind().is_some()
    }

    pub fn selection_kind(self) -> Option<SelectionKind> {
        match self {
            Mode::Visual { kind, .. } | Mode::Select { kind, .. } => Some(kind),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Normal => "NORMAL",
            Mode::Insert => "INSERT",
            Mode::Replace => "REPLACE",
            Mode::Visual { kind: SelectionKind::Character, .. } => "VISUAL",
            Mode::Visual { kind: SelectionKind::Line, .. } => "VISUAL LINE",
            Mode::Visual { kind: SelectionKind::Block, .. } => "VISUAL BLOCK",
            Mode::Select { kind: SelectionKind::Character, .. } => "SELECT",
            Mode::Select { kind: SelectionKind::Line, .. } => "SELECT LINE",
            Mode::Select { kind: SelectionKind::Block, .. } => "SELECT BLOCK",
            Mode::OperatorPending { .. } => "OPERATOR-PENDING",
        }
    }

    /// Pure transition function.
    pub fn on(self, event: ModeEvent) -> Mode {
        match (self, event) {
            (_, ModeEvent::EnterInsert) => Mode::Insert,
            (_, ModeEvent::EnterReplace) => Mode::Replace,
            (_, ModeEvent::EnterVisual { kind, return_to }) => Mode::Visual {
                kind,
                return_to,
                one_shot: false,
            },

            (
                Mode::Visual {
                    kind: current,
                    return_to,
                    one_shot,
                },
                ModeEvent::ToggleVisual(kind),
            ) => {
                if current == kind {
                    return_to.into()
                } else {
                    Mode::Visual {
                        kind,
                        return_to,
                        one_shot,
                    }
                }
            }
            (mode, ModeEvent::ToggleVisual(kind)) => Mode::Visual {
                kind,
                return_to: mode.base(),
                one_shot: false,
            },

            (mode, ModeEvent::EnterSelect(kind)) => Mode::Select {
                kind,
                return_to: mode.base(),
            },

            (Mode::Visual { kind, return_to, .. }, ModeEvent::ToggleSelectVisual) => {
                Mode::Select { kind, return_to }
            }
            (Mode::Select { kind, return_to }, ModeEvent::ToggleSelectVisual) => Mode::Visual {
                kind,
                return_to,
                one_shot: false,
            },
            (mode, ModeEvent::ToggleSelectVisual) => mode,

            (Mode::Select { kind, return_to }, ModeEvent::SingleVisualCommand) => Mode::Visual {
                kind,
                return_to,
                one_shot: true,
            },
            (
                Mode::Visual {
                    kind,
                    return_to,
                    one_shot: true,
                },
                ModeEvent::SingleVisualCommand | ModeEvent::CommandDone,
            ) => Mode::Select { kind, return_to },
            (mode, ModeEvent::SingleVisualCommand) => mode,

            (mode, ModeEvent::EnterOperatorPending) => Mode::OperatorPending {
                return_to: mode.base(),
            },
            (Mode::OperatorPending { return_to }, ModeEvent::CommandDone) => return_to.into(),
            (mode, ModeEvent::CommandDone) => mode,

            (Mode::Insert | Mode::Replace, ModeEvent::Exit) => Mode::Normal,
            (mode, ModeEvent::Exit) => mode.base().into(),
        }
    }
}

/// Mode plus the selection anchor, for one cursor.
#[derive(Debug, Clone)]
pub struct ModeMachine {
    mode: Mode,
    anchor: Option<usize>,
    behavior: SelectionBehavior,
}

impl Default for ModeMachine {
    fn default() -> Self {
        Self::new(Mode::Normal, SelectionBehavior::default())
    }
}

impl ModeMachine {
    pub fn new(mode: Mode, behavior: SelectionBehavior) -> Self {
        Self {
            mode,
            anchor: None,
            behavior,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn anchor(&self) -> Option<usize> {
        self.anchor
    }

    pub fn behavior(&self) -> SelectionBehavior {
        self.behavior
    }

    /// Apply a transition that does not touch the selection anchor.
    pub fn transition(&mut self, event: ModeEvent) -> Mode {
        let next = self.mode.on(event);
        if next != self.mode {
            debug!(from = ?self.mode, to = ?next, ?event, "mode transition");
        }
        self.mode = next;
        if !next.has_selection() {
            self.anchor = None;
        }
        next
    }

    /// Enter Visual mode anchored at `cursor`.
    pub fn enter_visual_mode(&mut self, kind: SelectionKind, return_to: ReturnTo, cursor: usize) {
        self.transition(ModeEvent::EnterVisual { kind, return_to });
        self.anchor = Some(cursor);
    }

    /// `v`, `V`, `<C-v>`: enter Visual, switch its kind, or leave it.
    pub fn toggle_visual(&mut self, kind: SelectionKind, cursor: usize) {
        let had_selection = self.mode.has_selection();
        self.transition(ModeEvent::ToggleVisual(kind));
        if self.mode.is_visual() && !had_selection {
            self.anchor = Some(cursor);
        }
    }

    /// `gh`, `gH`, `g<C-h>`: enter Select, remembering the mode it came
    /// from so that leaving Select returns there.
    pub fn enter_select_mode(&mut self, kind: SelectionKind, cursor: usize) {
        let had_selection = self.mode.has_selection();
        self.transition(ModeEvent::EnterSelect(kind));
        if !had_selection {
            self.anchor = Some(cursor);
        }
    }

    /// `<C-g>`: swap Visual and Select. Returns the adjusted cursor.
    ///
    /// With an inclusive Visual selection the far end moves one character so
    /// the covered text stays the same once Select makes it exclusive, and
    /// moves back on the return trip.
    pub fn toggle_select_visual<T: TextView + ?Sized>(&mut self, text: &T, cursor: usize) -> usize {
        self.switch(ModeEvent::ToggleSelectVisual, text, cursor)
    }

    /// `<C-o>` in Select: Visual for exactly one command, or straight back
    /// to Select if already there. Adjusts the cursor like
    /// [`toggle_select_visual`](Self::toggle_select_visual).
    pub fn process_single_visual_command<T: TextView + ?Sized>(
        &mut self,
        text: &T,
        cursor: usize,
    ) -> usize {
        self.switch(ModeEvent::SingleVisualCommand, text, cursor)
    }

    /// A motion or text object finished. Ends a one-shot Visual command and
    /// leaves Operator-pending.
    pub fn finish_command<T: TextView + ?Sized>(&mut self, text: &T, cursor: usize) -> usize {
        self.switch(ModeEvent::CommandDone, text, cursor)
    }

    fn switch<T: TextView + ?Sized>(&mut self, event: ModeEvent, text: &T, cursor: usize) -> usize {
        let before = self.mode;
        self.transition(event);
        let shift = self.behavior == SelectionBehavior::Inclusive
            && before.selection_kind().is_some_and(|k| k != SelectionKind::Line);
        let Some(anchor) = self.anchor.filter(|_| shift) else {
            return cursor;
        };
        let len = text.len_chars();
        match (before, self.mode) {
            (Mode::Visual { .. }, Mode::Select { .. }) => {
                if cursor >= anchor {
                    (cursor + 1).min(len)
                } else {
                    self.anchor = Some((anchor + 1).min(len));
                    cursor
                }
            }
            (Mode::Select { .. }, Mode::Visual { .. }) => {
                if cursor > anchor {
                    cursor - 1
                } else {
                    if anchor > cursor {
                        self.anchor = Some(anchor - 1);
                    }
                    cursor
                }
            }
            _ => cursor,
        }
    }

    /// Swap anchor and cursor (`o` in Visual). Returns the new cursor.
    pub fn swap_ends(&mut self, cursor: usize) -> usize {
        match self.anchor.replace(cursor) {
            Some(anchor) => anchor,
            None => {
                self.anchor = None;
                cursor
            }
        }
    }

    /// Place the selection explicitly (text objects in Visual mode).
    pub fn set_selection(&mut self, anchor: usize, kind: SelectionKind) {
        if let Mode::Visual {
            return_to,
            one_shot,
            ..
        } = self.mode
        {
            self.mode = Mode::Visual {
                kind,
                return_to,
                one_shot,
            };
        }
        self.anchor = Some(anchor);
    }

    /// The live selection, if the mode has one.
    pub fn selection(&self, cursor: usize) -> Option<Selection> {
        let kind = self.mode.selection_kind()?;
        let anchor = self.anchor.unwrap_or(cursor);
        let exclusive =
            self.mode.is_select() || self.behavior == SelectionBehavior::Exclusive;
        Some(Selection {
            anchor,
            head: cursor,
            kind,
            exclusive,
        })
    }
}

/// Derive the selection shape from what the host currently shows: block if
/// the host reports a column selection, line if the range starts at a line
/// start and ends just past a newline (or at the buffer end), character
/// otherwise.
pub fn detect_selection_type<T: TextView + ?Sized>(
    text: &T,
    range: Range,
    block: bool,
) -> SelectionKind {
    if block {
        return SelectionKind::Block;
    }
    let len = text.len_chars();
    let range = range.clamped(len);
    if range.is_empty() {
        return SelectionKind::Character;
    }
    let starts_line = scan::scan_line_start(text, range.start).offset == range.start;
    let ends_line = range.end == len || text.char_at(range.end - 1).is_some_and(scan::is_newline);
    if starts_line && ends_line {
        SelectionKind::Line
    } else {
        SelectionKind::Character
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAR: SelectionKind = SelectionKind::Character;
    const LINE: SelectionKind = SelectionKind::Line;

    fn visual(kind: SelectionKind, return_to: ReturnTo) -> Mode {
        Mode::Visual {
            kind,
            return_to,
            one_shot: false,
        }
    }

    #[test]
    fn toggle_visual_enters_switches_and_exits() {
        let mode = Mode::Normal.on(ModeEvent::ToggleVisual(CHAR));
        assert_eq!(mode, visual(CHAR, ReturnTo::Normal));
        let mode = mode.on(ModeEvent::ToggleVisual(LINE));
        assert_eq!(mode, visual(LINE, ReturnTo::Normal));
        assert_eq!(mode.on(ModeEvent::ToggleVisual(LINE)), Mode::Normal);
    }

    #[test]
    fn select_from_insert_returns_to_insert() {
        let mode = Mode::Insert.on(ModeEvent::EnterSelect(CHAR));
        assert_eq!(
            mode,
            Mode::Select {
                kind: CHAR,
                return_to: ReturnTo::Insert
            }
        );
        assert_eq!(mode.on(ModeEvent::Exit), Mode::Insert);
        let mode = mode.on(ModeEvent::ToggleSelectVisual);
        assert_eq!(mode, visual(CHAR, ReturnTo::Insert));
        assert_eq!(mode.on(ModeEvent::Exit), Mode::Insert);
    }

    #[test]
    fn single_visual_command_round_trip() {
        let select = Mode::Select {
            kind: LINE,
            return_to: ReturnTo::Normal,
        };
        let one_shot = select.on(ModeEvent::SingleVisualCommand);
        assert_eq!(
            one_shot,
            Mode::Visual {
                kind: LINE,
                return_to: ReturnTo::Normal,
                one_shot: true
            }
        );
        assert_eq!(one_shot.on(ModeEvent::CommandDone), select);
        assert_eq!(one_shot.on(ModeEvent::SingleVisualCommand), select);
        // A regular Visual mode is not affected by command completion.
        let plain = visual(LINE, ReturnTo::Normal);
        assert_eq!(plain.on(ModeEvent::CommandDone), plain);
    }

    #[test]
    fn operator_pending_returns_after_command() {
        let pending = Mode::Normal.on(ModeEvent::EnterOperatorPending);
        assert_eq!(
            pending,
            Mode::OperatorPending {
                return_to: ReturnTo::Normal
            }
        );
        assert_eq!(pending.on(ModeEvent::CommandDone), Mode::Normal);
        assert_eq!(pending.on(ModeEvent::Exit), Mode::Normal);
    }

    #[test]
    fn toggle_select_visual_shifts_cursor() {
        let text: Vec<char> = "hello world".chars().collect();
        let mut machine = ModeMachine::default();
        machine.enter_visual_mode(CHAR, ReturnTo::Normal, 2);
        let cursor = machine.toggle_select_visual(&text, 6);
        assert_eq!(cursor, 7);
        assert!(machine.mode().is_select());
        let cursor = machine.toggle_select_visual(&text, cursor);
        assert_eq!(cursor, 6);
        assert!(machine.mode().is_visual());
    }

    #[test]
    fn toggle_select_visual_moves_anchor_for_backward_selection() {
        let text: Vec<char> = "hello world".chars().collect();
        let mut machine = ModeMachine::default();
        machine.enter_visual_mode(CHAR, ReturnTo::Normal, 6);
        let before = machine.selection(2).unwrap().range(&text);
        let cursor = machine.toggle_select_visual(&text, 2);
        assert_eq!(cursor, 2);
        assert_eq!(machine.anchor(), Some(7));
        assert_eq!(machine.selection(cursor).unwrap().range(&text), before);
    }

    #[test]
    fn exclusive_behaviour_needs_no_shift() {
        let text: Vec<char> = "hello".chars().collect();
        let mut machine = ModeMachine::new(Mode::Normal, SelectionBehavior::Exclusive);
        machine.enter_visual_mode(CHAR, ReturnTo::Normal, 0);
        assert_eq!(machine.toggle_select_visual(&text, 3), 3);
    }

    #[test]
    fn detects_selection_shapes() {
        let text: Vec<char> = "ab\ncd\n".chars().collect();
        assert_eq!(detect_selection_type(&text, Range::char_wise(0, 3), false), LINE);
        assert_eq!(detect_selection_type(&text, Range::char_wise(0, 6), false), LINE);
        assert_eq!(detect_selection_type(&text, Range::char_wise(1, 3), false), CHAR);
        assert_eq!(detect_selection_type(&text, Range::char_wise(3, 3), false), CHAR);
        assert_eq!(detect_selection_type(&text, Range::char_wise(0, 0), false), CHAR);
        assert_eq!(detect_selection_type(&text, Range::char_wise(6, 6), false), CHAR);
        let empty: Vec<char> = Vec::new();
        assert_eq!(detect_selection_type(&empty, Range::char_wise(0, 0), false), CHAR);
        assert_eq!(
            detect_selection_type(&text, Range::char_wise(1, 2), true),
            SelectionKind::Block
        );
    }
}
