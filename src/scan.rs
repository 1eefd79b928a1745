//! Character-class scanning over a [`TextView`].
//!
//! Everything here is a pure read. Offsets at the buffer boundaries (`0` and
//! `len`) are accepted; nothing reads past the end.

use crate::traits::TextView;

#[inline]
pub fn is_blank(ch: char) -> bool {
    ch == ' ' || ch == '\t'
}

#[inline]
pub fn is_newline(ch: char) -> bool {
    ch == '\n'
}

/// Result of [`scan_line_start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineStart {
    /// First offset of the line.
    pub offset: usize,
    /// Blank characters at the start of the line that lie before the scan
    /// origin. Equals the full indentation when a non-blank character was
    /// seen on the way back.
    pub leading_blanks: usize,
}

/// Walk backward from `offset` to the first position after the preceding
/// newline (or the buffer start).
pub fn scan_line_start<T: TextView + ?Sized>(text: &T, offset: usize) -> LineStart {
    let mut pos = offset.min(text.len_chars());
    let mut leading_blanks = 0;
    while pos > 0 {
        match text.char_at(pos - 1) {
            Some(ch) if is_newline(ch) => break,
            Some(ch) if is_blank(ch) => leading_blanks += 1,
            _ => leading_blanks = 0,
        }
        pos -= 1;
    }
    LineStart {
        offset: pos,
        leading_blanks,
    }
}

/// Position just past the next newline at or after `offset`, or the buffer
/// length if there is none.
pub fn scan_line_end<T: TextView + ?Sized>(text: &T, offset: usize) -> usize {
    let len = text.len_chars();
    let mut pos = offset.min(len);
    while let Some(ch) = text.char_at(pos) {
        pos += 1;
        if is_newline(ch) {
            break;
        }
    }
    pos
}

/// Offset of the newline ending the line that contains `offset`, or the
/// buffer length for an unterminated last line.
pub fn line_content_end<T: TextView + ?Sized>(text: &T, offset: usize) -> usize {
    let end = scan_line_end(text, offset);
    if end > offset && text.char_at(end - 1).is_some_and(is_newline) {
        end - 1
    } else {
        end
    }
}

/// Number of contiguous blank characters starting at `line_start`.
pub fn indent_width<T: TextView + ?Sized>(text: &T, line_start: usize) -> usize {
    let mut pos = line_start;
    while text.char_at(pos).is_some_and(is_blank) {
        pos += 1;
    }
    pos - line_start
}

/// Offset of the first non-blank character on the line starting at
/// `line_start`, or the line's newline if it has none.
pub fn first_non_blank<T: TextView + ?Sized>(text: &T, line_start: usize) -> usize {
    line_start + indent_width(text, line_start)
}

/// Start of the line before the one starting at `line_start`.
pub fn prev_line_start<T: TextView + ?Sized>(text: &T, line_start: usize) -> Option<usize> {
    (line_start > 0).then(|| scan_line_start(text, line_start - 1).offset)
}

/// Start of the line after the one containing `offset`. A trailing newline
/// does not open another line.
pub fn next_line_start<T: TextView + ?Sized>(text: &T, offset: usize) -> Option<usize> {
    let end = scan_line_end(text, offset);
    (end < text.len_chars()).then_some(end)
}

/// Where the indentation scanner is relative to the current line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// At the first character of a line.
    AfterNewline,
    /// Inside the leading blanks of a line.
    InBlank,
    /// Past the indentation, waiting for the newline.
    InText,
}

/// What a single scanner step learned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStep {
    Continue,
    /// A line holding only blanks (or nothing) ended.
    BlankLine { line_start: usize },
    /// A line's first non-blank character was reached.
    Indented { line_start: usize, width: usize },
}

/// Forward state machine that classifies lines by indentation, one
/// character at a time.
#[derive(Debug, Clone, Copy)]
pub struct IndentScan {
    state: ScanState,
    line_start: usize,
    width: usize,
}

impl IndentScan {
    /// Start scanning at `line_start`, which must be the first offset of a line.
    pub fn new(line_start: usize) -> Self {
        Self {
            state: ScanState::AfterNewline,
            line_start,
            width: 0,
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Feed the character at `offset`.
    pub fn step(&mut self, offset: usize, ch: char) -> ScanStep {
        match (self.state, ch) {
            (ScanState::AfterNewline | ScanState::InBlank, c) if is_newline(c) => {
                let line_start = self.line_start;
                self.restart(offset + 1);
                ScanStep::BlankLine { line_start }
            }
            (ScanState::AfterNewline | ScanState::InBlank, c) if is_blank(c) => {
                self.state = ScanState::InBlank;
                self.width += 1;
                ScanStep::Continue
            }
            (ScanState::AfterNewline | ScanState::InBlank, _) => {
                self.state = ScanState::InText;
                ScanStep::Indented {
                    line_start: self.line_start,
                    width: self.width,
                }
            }
            (ScanState::InText, c) if is_newline(c) => {
                self.restart(offset + 1);
                ScanStep::Continue
            }
            (ScanState::InText, _) => ScanStep::Continue,
        }
    }

    fn restart(&mut self, line_start: usize) {
        self.state = ScanState::AfterNewline;
        self.line_start = line_start;
        self.width = 0;
    }
}

/// Indentation class of a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    /// Empty or blanks only.
    Blank,
    /// Has text after `width` blanks.
    Indented(usize),
}

pub fn classify_line<T: TextView + ?Sized>(text: &T, line_start: usize) -> LineClass {
    let mut scan = IndentScan::new(line_start);
    let mut pos = line_start;
    while let Some(ch) = text.char_at(pos) {
        match scan.step(pos, ch) {
            ScanStep::Continue => pos += 1,
            ScanStep::BlankLine { .. } => return LineClass::Blank,
            ScanStep::Indented { width, .. } => return LineClass::Indented(width),
        }
    }
    LineClass::Blank
}

/// Start of the first non-blank line at or after `from` (a line start) whose
/// indentation satisfies `pred`.
pub fn find_line_forward<T, P>(text: &T, from: usize, pred: P) -> Option<usize>
where
    T: TextView + ?Sized,
    P: Fn(usize) -> bool,
{
    let mut scan = IndentScan::new(from);
    let mut pos = from;
    while let Some(ch) = text.char_at(pos) {
        if let ScanStep::Indented { line_start, width } = scan.step(pos, ch)
            && pred(width)
        {
            return Some(line_start);
        }
        pos += 1;
    }
    None
}

/// Start of the nearest non-blank line strictly above the line starting at
/// `line_start` whose indentation satisfies `pred`.
pub fn find_line_backward<T, P>(text: &T, line_start: usize, pred: P) -> Option<usize>
where
    T: TextView + ?Sized,
    P: Fn(usize) -> bool,
{
    let mut probe = line_start;
    while let Some(prev) = prev_line_start(text, probe) {
        if let LineClass::Indented(width) = classify_line(text, prev)
            && pred(width)
        {
            return Some(prev);
        }
        probe = prev;
    }
    None
}
