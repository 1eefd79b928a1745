//! Indentation text objects (`ii`, `iI`, `ai`, `aI`).
//!
//! The object covers the run of lines around the cursor whose indentation is
//! at least the cursor line's. The "a" variants add the less indented line
//! above the block and, for `aI`, the one below it as well.

use std::sync::Arc;

use tracing::trace;

use super::TextObject;
use crate::key::KeySequence;
use crate::keymap::{Extension, ExternalHandler, Handler, KeymapBuilder, ModeMask};
use crate::scan::{self, LineClass};
use crate::traits::TextView;
use crate::types::{Range, SelectionKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndentObject {
    pub include_above: bool,
    pub include_below: bool,
}

impl IndentObject {
    /// `ii` and `iI`.
    pub const INNER: Self = Self::new(false, false);
    /// `ai`.
    pub const WITH_ABOVE: Self = Self::new(true, false);
    /// `aI`.
    pub const WITH_ABOVE_AND_BELOW: Self = Self::new(true, true);

    pub const fn new(include_above: bool, include_below: bool) -> Self {
        Self {
            include_above,
            include_below,
        }
    }

    /// Resolve the object for the line containing `cursor`.
    ///
    /// Always succeeds: when no less indented line exists in a direction the
    /// range runs to that end of the buffer. A cursor line without
    /// indentation therefore selects the whole buffer.
    pub fn resolve<T: TextView + ?Sized>(&self, text: &T, cursor: usize) -> Range {
        let len = text.len_chars();
        let cursor = cursor.min(len);

        let line = scan::scan_line_start(text, cursor);
        let indent = if line.leading_blanks < cursor - line.offset {
            line.leading_blanks
        } else {
            scan::indent_width(text, line.offset)
        };

        let above = scan::find_line_backward(text, line.offset, |width| width < indent);
        let start = match above {
            None => 0,
            Some(boundary) if self.include_above => boundary,
            Some(boundary) => {
                let mut start = scan::scan_line_end(text, boundary);
                while start < line.offset && scan::classify_line(text, start) == LineClass::Blank {
                    start = scan::scan_line_end(text, start);
                }
                start
            }
        };

        let below = scan::next_line_start(text, line.offset)
            .and_then(|next| scan::find_line_forward(text, next, |width| width < indent));
        let end = match below {
            None => len,
            Some(boundary) if self.include_below => scan::scan_line_end(text, boundary),
            Some(boundary) => boundary,
        };

        trace!(cursor, indent, ?above, ?below, start, end, "indent object");
        Range::line_wise(start, end)
    }
}

impl TextObject for IndentObject {
    fn range(&self, text: &dyn TextView, cursor: usize, _count: u32) -> Option<Range> {
        Some(self.resolve(text, cursor))
    }

    fn visual_type(&self) -> SelectionKind {
        SelectionKind::Line
    }
}

/// Registers the indentation objects under `<Plug>textobj-indent-*` and maps
/// `ai`, `aI`, `ii` and `iI` onto them in Visual and Operator-pending modes.
#[derive(Debug, Default, Clone, Copy)]
pub struct IndentObjectExtension;

impl IndentObjectExtension {
    pub const NAME: &'static str = "textobj-indent";
}

impl Extension for IndentObjectExtension {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn init(&self, keymap: &mut KeymapBuilder) {
        let handlers = [
            ("textobj-indent-ai", IndentObject::WITH_ABOVE),
            ("textobj-indent-aI", IndentObject::WITH_ABOVE_AND_BELOW),
            ("textobj-indent-ii", IndentObject::INNER),
        ];
        for (plug, object) in handlers {
            keymap.register_handler(
                ModeMask::XO,
                KeySequence::plug(plug),
                Handler::External(ExternalHandler::TextObject(Arc::new(object))),
            );
        }

        let mappings = [
            ("ai", "textobj-indent-ai"),
            ("aI", "textobj-indent-aI"),
            ("ii", "textobj-indent-ii"),
            ("iI", "textobj-indent-ii"),
        ];
        for (keys, plug) in mappings {
            keymap.register_key_mapping(
                ModeMask::XO,
                KeySequence::from_chars(keys),
                KeySequence::plug(plug),
                true,
            );
        }
    }
}
