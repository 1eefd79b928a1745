//! Built-in cursor motions.
//!
//! A motion yields a destination offset. When it is the argument of an
//! operator, [`Motion::range`] turns that destination into the span the
//! operator acts on, following the motion's [`MotionKind`].

use crate::scan;
use crate::traits::TextView;
use crate::types::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Motion {
    /// `h`
    Left,
    /// `l`
    Right,
    /// `k`
    Up,
    /// `j`
    Down,
    /// `0`
    LineStart,
    /// `^`
    FirstNonBlank,
    /// `$`
    LineEnd,
    /// `gg`
    FileStart,
    /// `G`
    FileEnd,
    /// `w`
    WordForward,
    /// `b`
    WordBackward,
    /// `e`
    WordEnd,
}

/// How the end of a motion relates to the span an operator receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionKind {
    /// The character at the destination is left out.
    Exclusive,
    /// The character at the destination is included.
    Inclusive,
    /// Whole lines between the cursor and the destination.
    LineWise,
}

/// Count and column state a motion runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionContext {
    /// Effective count, at least 1.
    pub count: u32,
    /// The count as typed, if any. `G` and `gg` treat it as a line number.
    pub raw_count: Option<u32>,
    /// Column `j`/`k` try to keep.
    pub preferred_col: Option<usize>,
}

impl MotionContext {
    pub fn with_count(count: u32) -> Self {
        Self {
            count: count.max(1),
            raw_count: None,
            preferred_col: None,
        }
    }
}

impl Default for MotionContext {
    fn default() -> Self {
        Self::with_count(1)
    }
}

impl Motion {
    pub fn kind(self) -> MotionKind {
        match self {
            Motion::Left
            | Motion::Right
            | Motion::LineStart
            | Motion::FirstNonBlank
            | Motion::WordForward
            | Motion::WordBackward => MotionKind::Exclusive,
            Motion::LineEnd | Motion::WordEnd => MotionKind::Inclusive,
            Motion::Up | Motion::Down | Motion::FileStart | Motion::FileEnd => MotionKind::LineWise,
        }
    }

    /// Whether the motion moves between lines and should keep the
    /// preferred column.
    pub fn is_vertical(self) -> bool {
        matches!(self, Motion::Up | Motion::Down)
    }

    /// Where the cursor lands in Normal or Visual mode. `None` when the
    /// motion cannot move (for example `h` in the first column).
    pub fn target<T: TextView + ?Sized>(
        self,
        text: &T,
        cursor: usize,
        ctx: MotionContext,
    ) -> Option<usize> {
        let cursor = cursor.min(text.len_chars());
        let count = ctx.count.max(1) as usize;
        let line_start = scan::scan_line_start(text, cursor).offset;
        match self {
            Motion::Left => {
                let target = cursor.saturating_sub(count).max(line_start);
                (target != cursor).then_some(target)
            }
            Motion::Right => {
                let last = last_char(text, line_start);
                let target = (cursor + count).min(last);
                (target > cursor).then_some(target)
            }
            Motion::Up | Motion::Down => {
                let target_line = step_lines(text, line_start, count, self == Motion::Down)?;
                let col = ctx.preferred_col.unwrap_or(cursor - line_start);
                Some(column_on_line(text, target_line, col))
            }
            Motion::LineStart => Some(line_start),
            Motion::FirstNonBlank => Some(scan::first_non_blank(text, line_start)),
            Motion::LineEnd => {
                let line = if count > 1 {
                    step_lines(text, line_start, count - 1, true).unwrap_or(line_start)
                } else {
                    line_start
                };
                Some(last_char(text, line))
            }
            Motion::FileStart => {
                let line = nth_line_start(text, ctx.raw_count.unwrap_or(1));
                Some(scan::first_non_blank(text, line))
            }
            Motion::FileEnd => {
                let line = match ctx.raw_count {
                    Some(n) => nth_line_start(text, n),
                    None => last_line_start(text),
                };
                Some(scan::first_non_blank(text, line))
            }
            Motion::WordForward => {
                let pos = repeat_step(text, cursor, count, next_word_start);
                // Normal mode never rests past the last character.
                let pos = pos.min(text.len_chars().saturating_sub(1));
                (pos != cursor).then_some(pos)
            }
            Motion::WordBackward => {
                let pos = repeat_step(text, cursor, count, prev_word_start);
                (pos != cursor).then_some(pos)
            }
            Motion::WordEnd => {
                let pos = repeat_step(text, cursor, count, next_word_end);
                (pos != cursor).then_some(pos)
            }
        }
    }

    /// The span an operator acts on when this motion is its argument.
    pub fn range<T: TextView + ?Sized>(
        self,
        text: &T,
        cursor: usize,
        ctx: MotionContext,
    ) -> Option<Range> {
        let len = text.len_chars();
        let cursor = cursor.min(len);
        let count = ctx.count.max(1) as usize;
        match self.kind() {
            MotionKind::LineWise => {
                let target = self.target(text, cursor, ctx)?;
                let lo = scan::scan_line_start(text, cursor.min(target)).offset;
                let hi = scan::scan_line_start(text, cursor.max(target)).offset;
                Some(Range::line_wise(lo, scan::scan_line_end(text, hi)))
            }
            MotionKind::Inclusive => {
                let target = self.target(text, cursor, ctx).unwrap_or(cursor);
                let lo = cursor.min(target);
                let hi = cursor.max(target);
                let end = (hi + 1).min(scan::line_content_end(text, hi).max(lo));
                let range = Range::char_wise(lo, end.max(lo));
                (!range.is_empty()).then_some(range)
            }
            MotionKind::Exclusive => {
                let target = match self {
                    // `dl` may take the last character of the line.
                    Motion::Right => {
                        let end = scan::line_content_end(text, cursor);
                        (cursor + count).min(end)
                    }
                    Motion::WordForward => repeat_step(text, cursor, count, next_word_start),
                    _ => self.target(text, cursor, ctx)?,
                };
                let mut range = Range::between(cursor, target);
                // An exclusive span ending in column 0 of a later line stops
                // at the end of the previous line instead.
                if range.end > range.start
                    && range.end < len
                    && scan::scan_line_start(text, range.end).offset == range.end
                    && scan::scan_line_start(text, range.start).offset < range.end
                    && range.end - 1 > range.start
                {
                    range.end -= 1;
                }
                (!range.is_empty()).then_some(range)
            }
        }
    }

    /// Current line plus `count - 1` lines below it (`dd`, `yy`, `>>`).
    pub fn current_lines<T: TextView + ?Sized>(text: &T, cursor: usize, count: u32) -> Range {
        let start = scan::scan_line_start(text, cursor).offset;
        let mut last = start;
        for _ in 1..count.max(1) {
            match scan::next_line_start(text, last) {
                Some(next) => last = next,
                None => break,
            }
        }
        Range::line_wise(start, scan::scan_line_end(text, last))
    }
}

/// Offset of the last character on the line starting at `line_start`, or
/// the line start itself for an empty line.
fn last_char<T: TextView + ?Sized>(text: &T, line_start: usize) -> usize {
    let end = scan::line_content_end(text, line_start);
    if end > line_start { end - 1 } else { line_start }
}

fn column_on_line<T: TextView + ?Sized>(text: &T, line_start: usize, col: usize) -> usize {
    let last = last_char(text, line_start);
    line_start.saturating_add(col).min(last)
}

fn step_lines<T: TextView + ?Sized>(
    text: &T,
    line_start: usize,
    count: usize,
    down: bool,
) -> Option<usize> {
    let mut line = line_start;
    for _ in 0..count {
        let next = if down {
            scan::next_line_start(text, line)
        } else {
            scan::prev_line_start(text, line)
        };
        match next {
            Some(next) => line = next,
            None => break,
        }
    }
    (line != line_start).then_some(line)
}

/// Start of 1-based line `n`, clamped to the last line.
fn nth_line_start<T: TextView + ?Sized>(text: &T, n: u32) -> usize {
    let mut line = 0;
    for _ in 1..n.max(1) {
        match scan::next_line_start(text, line) {
            Some(next) => line = next,
            None => break,
        }
    }
    line
}

fn last_line_start<T: TextView + ?Sized>(text: &T) -> usize {
    let len = text.len_chars();
    let mut start = scan::scan_line_start(text, len).offset;
    // A trailing newline does not open a new line.
    if start == len && len > 0 {
        start = scan::scan_line_start(text, len - 1).offset;
    }
    start
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Space,
    Word,
    Punct,
}

fn class_at<T: TextView + ?Sized>(text: &T, offset: usize) -> Option<CharClass> {
    text.char_at(offset).map(|c| {
        if c.is_whitespace() {
            CharClass::Space
        } else if c.is_alphanumeric() || c == '_' {
            CharClass::Word
        } else {
            CharClass::Punct
        }
    })
}

fn is_empty_line<T: TextView + ?Sized>(text: &T, offset: usize) -> bool {
    text.char_at(offset).is_some_and(scan::is_newline)
        && (offset == 0 || text.char_at(offset - 1).is_some_and(scan::is_newline))
}

/// Apply `step` up to `count` times, stopping once it no longer moves.
fn repeat_step<T: TextView + ?Sized>(
    text: &T,
    from: usize,
    count: usize,
    step: fn(&T, usize) -> usize,
) -> usize {
    let mut pos = from;
    for _ in 0..count {
        let next = step(text, pos);
        if next == pos {
            break;
        }
        pos = next;
    }
    pos
}

fn next_word_start<T: TextView + ?Sized>(text: &T, from: usize) -> usize {
    let len = text.len_chars();
    let mut pos = from;
    if let Some(class) = class_at(text, pos)
        && class != CharClass::Space
    {
        while class_at(text, pos) == Some(class) {
            pos += 1;
        }
    } else if is_empty_line(text, pos) {
        pos += 1;
    }
    while pos < len && class_at(text, pos) == Some(CharClass::Space) {
        // An empty line counts as a word.
        if is_empty_line(text, pos) {
            break;
        }
        pos += 1;
    }
    pos
}

fn prev_word_start<T: TextView + ?Sized>(text: &T, from: usize) -> usize {
    let mut pos = from;
    if pos == 0 {
        return 0;
    }
    pos -= 1;
    while pos > 0 && class_at(text, pos) == Some(CharClass::Space) && !is_empty_line(text, pos) {
        pos -= 1;
    }
    if let Some(class) = class_at(text, pos)
        && class != CharClass::Space
    {
        while pos > 0 && class_at(text, pos - 1) == Some(class) {
            pos -= 1;
        }
    }
    pos
}

fn next_word_end<T: TextView + ?Sized>(text: &T, from: usize) -> usize {
    let len = text.len_chars();
    let mut pos = from + 1;
    while pos < len && class_at(text, pos) == Some(CharClass::Space) {
        pos += 1;
    }
    if pos >= len {
        return from;
    }
    if let Some(class) = class_at(text, pos) {
        while class_at(text, pos + 1) == Some(class) {
            pos += 1;
        }
    }
    pos
}
