//! Text objects: handlers that turn a cursor offset into a span of text.

pub mod indent;

use std::fmt;

use crate::traits::TextView;
use crate::types::{Range, SelectionKind};

pub use indent::{IndentObject, IndentObjectExtension};

/// A text object an extension can plug into the command pipeline.
///
/// The same object serves as an operator argument (`dai`), as a Visual
/// selection (`vai`) and as a cursor jump in Normal mode.
pub trait TextObject: fmt::Debug + Send + Sync {
    /// Resolve the object around `cursor`. `None` means nothing was found
    /// and the pending command is dropped.
    fn range(&self, text: &dyn TextView, cursor: usize, count: u32) -> Option<Range>;

    /// Selection shape used when the object is applied in Visual mode.
    fn visual_type(&self) -> SelectionKind {
        SelectionKind::Character
    }
}
