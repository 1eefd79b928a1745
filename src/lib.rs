pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod key;
pub mod keymap;
pub mod mode;
pub mod motion;
pub mod scan;
pub mod textobj;
pub mod traits;
pub mod types;

pub use crate::command::{Argument, Command, CommandBuilder, OperatorId, PendingCommand};
pub use crate::config::EngineConfig;
pub use crate::engine::{Engine, EngineBuilder, EngineSnapshot};
pub use crate::error::{EngineError, Result};
pub use crate::key::{InputEvent, KeyCode, KeyEvent, KeySequence, Modifiers};
pub use crate::keymap::{Extension, Keymap, KeymapBuilder, ModeMask};
pub use crate::mode::{Mode, ModeMachine, ReturnTo, detect_selection_type};
pub use crate::motion::Motion;
pub use crate::textobj::{IndentObject, IndentObjectExtension, TextObject};
pub use crate::traits::TextView;
pub use crate::types::{Action, Range, Selection, SelectionBehavior, SelectionKind};
