use serde::{Deserialize, Serialize};

use crate::command::OperatorId;
use crate::scan;
use crate::traits::TextView;

/// A span of text between two char offsets.
///
/// Ranges are half-open intervals `[start, end)`. Callers that need
/// inclusive semantics (Visual mode with `selection=inclusive`) convert at
/// the edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    /// The start offset (inclusive).
    pub start: usize,
    /// The end offset (exclusive).
    pub end: usize,
    /// Whether the range is semantically aligned to whole lines.
    pub line_wise: bool,
}

impl Range {
    pub fn char_wise(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "range start {start} past end {end}");
        Self {
            start,
            end,
            line_wise: false,
        }
    }

    pub fn line_wise(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "range start {start} past end {end}");
        Self {
            start,
            end,
            line_wise: true,
        }
    }

    /// Range spanning `a` and `b` in either order.
    pub fn between(a: usize, b: usize) -> Self {
        Self::char_wise(a.min(b), a.max(b))
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    /// True if `other` lies entirely within `self`.
    pub fn covers(&self, other: &Range) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Clamp both ends into `0..=len`.
    pub fn clamped(self, len: usize) -> Self {
        let end = self.end.min(len);
        Self {
            start: self.start.min(end),
            end,
            line_wise: self.line_wise,
        }
    }
}

/// The shape of a Visual or Select selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionKind {
    /// Character-wise selection (`v`, `gh`).
    #[default]
    Character,
    /// Line-wise selection (`V`, `gH`).
    Line,
    /// Block-wise selection (`<C-v>`, `g<C-h>`).
    Block,
}

/// Whether the character under the cursor belongs to a Visual selection
/// (Vim's `selection` option). Select mode ignores this and is always
/// exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionBehavior {
    #[default]
    Inclusive,
    Exclusive,
}

/// A selection as tracked by the engine.
///
/// `anchor` is where the selection started, `head` is the cursor. Use
/// [`Selection::range`] to get the text actually covered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: usize,
    pub head: usize,
    pub kind: SelectionKind,
    /// Whether the character at the far end is left out.
    pub exclusive: bool,
}

impl Selection {
    /// The span of text covered by this selection.
    pub fn range<T: TextView + ?Sized>(&self, text: &T) -> Range {
        let len = text.len_chars();
        let lo = self.anchor.min(self.head).min(len);
        let hi = self.anchor.max(self.head).min(len);
        match self.kind {
            SelectionKind::Line => {
                let start = scan::scan_line_start(text, lo).offset;
                let end = scan::scan_line_end(text, hi);
                Range::line_wise(start, end)
            }
            SelectionKind::Character | SelectionKind::Block => {
                let end = if self.exclusive { hi } else { (hi + 1).min(len) };
                Range::char_wise(lo, end)
            }
        }
    }
}

/// Actions emitted by the engine for the host to execute.
///
/// The engine never touches the buffer; the host applies these to its
/// text storage, cursor and selection rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Move the cursor.
    SetCursor(usize),
    /// Set or clear the current selection.
    SetSelection(Option<Selection>),
    /// Run an operator over a range.
    ApplyOperator {
        operator: OperatorId,
        range: Range,
        kind: SelectionKind,
        count: u32,
        register: Option<char>,
    },
    /// Insert text at the given offset.
    InsertText { at: usize, text: String },
    /// Overwrite text starting at the given offset (Replace mode).
    ReplaceText { at: usize, text: String },
    /// The input was not understood; the host may beep or ignore it.
    Bell,
}
