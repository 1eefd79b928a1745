//! Key mappings, handlers and extensions.
//!
//! A [`KeymapBuilder`] collects mappings in registration order, then
//! [`KeymapBuilder::build`] freezes them into a [`Keymap`] that dispatch
//! borrows. Each entry maps a key sequence either to more keys (a remap,
//! expanded again by the engine) or to a [`Handler`] that does the work.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::command::{Argument, OperatorId};
use crate::error::{EngineError, Result};
use crate::key::{KeyEvent, KeySequence};
use crate::mode::{Mode, ModeMachine};
use crate::motion::Motion;
use crate::textobj::TextObject;
use crate::traits::TextView;
use crate::types::{Action, SelectionKind};

bitflags::bitflags! {
    /// Modes a mapping applies to, one flag per Vim map-mode letter.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ModeMask: u8 {
        /// `n`
        const NORMAL     = 0b0_0001;
        /// `x`
        const VISUAL     = 0b0_0010;
        /// `s`
        const SELECT     = 0b0_0100;
        /// `o`
        const OP_PENDING = 0b0_1000;
        /// `i` (Insert and Replace)
        const INSERT     = 0b1_0000;

        /// `xo`, where text objects live.
        const XO = Self::VISUAL.bits() | Self::OP_PENDING.bits();
        /// `v`: Visual and Select.
        const VS = Self::VISUAL.bits() | Self::SELECT.bits();
        /// The empty mode string: `:map`.
        const MAP = Self::NORMAL.bits()
            | Self::VISUAL.bits()
            | Self::SELECT.bits()
            | Self::OP_PENDING.bits();
    }
}

impl From<Mode> for ModeMask {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Normal => ModeMask::NORMAL,
            Mode::Insert | Mode::Replace => ModeMask::INSERT,
            Mode::Visual { .. } => ModeMask::VISUAL,
            Mode::Select { .. } => ModeMask::SELECT,
            Mode::OperatorPending { .. } => ModeMask::OP_PENDING,
        }
    }
}

impl FromStr for ModeMask {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Ok(ModeMask::MAP);
        }
        let mut mask = ModeMask::empty();
        for c in s.chars() {
            mask |= match c {
                'n' => ModeMask::NORMAL,
                'x' => ModeMask::VISUAL,
                's' => ModeMask::SELECT,
                'o' => ModeMask::OP_PENDING,
                'i' => ModeMask::INSERT,
                'v' => ModeMask::VS,
                _ => return Err(EngineError::InvalidModeMask(s.to_string())),
            };
        }
        Ok(mask)
    }
}

/// Engine commands that are not motions or operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinCommand {
    /// `i`
    EnterInsert,
    /// `a`
    Append,
    /// `I`
    InsertAtLineStart,
    /// `A`
    AppendAtLineEnd,
    /// `R`
    EnterReplace,
    /// `v`, `V`, `<C-v>`
    ToggleVisual(SelectionKind),
    /// `gh`, `gH`, `g<C-h>`
    EnterSelect(SelectionKind),
    /// `<C-g>`
    ToggleSelectVisual,
    /// `<C-o>` in Select mode.
    SingleVisualCommand,
    /// `o` in Visual mode.
    SwapSelectionEnds,
}

/// State handed to an [`ExtensionCommand`].
pub struct CommandContext<'a> {
    pub text: &'a dyn TextView,
    pub modes: &'a mut ModeMachine,
    pub cursor: usize,
    pub count: u32,
    pub register: Option<char>,
    /// Actions to hand back to the host along with the new cursor.
    pub actions: Vec<Action>,
}

impl fmt::Debug for CommandContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandContext")
            .field("mode", &self.modes.mode())
            .field("cursor", &self.cursor)
            .field("count", &self.count)
            .field("register", &self.register)
            .finish_non_exhaustive()
    }
}

/// A command supplied by an extension that changes mode or selection.
pub trait ExtensionCommand: fmt::Debug + Send + Sync {
    fn execute(&self, ctx: &mut CommandContext<'_>);
}

/// Handlers registered by extensions.
#[derive(Debug, Clone)]
pub enum ExternalHandler {
    TextObject(Arc<dyn TextObject>),
    Command(Arc<dyn ExtensionCommand>),
}

/// What a mapping ultimately runs.
#[derive(Debug, Clone)]
pub enum Handler {
    Motion(Motion),
    Operator(OperatorId),
    Command(BuiltinCommand),
    External(ExternalHandler),
}

impl Handler {
    /// The operator argument this handler supplies, if it is a motion or
    /// text object.
    pub fn as_argument(&self) -> Option<Argument> {
        match self {
            Handler::Motion(motion) => Some(Argument::Motion(*motion)),
            Handler::External(ExternalHandler::TextObject(object)) => {
                Some(Argument::TextObject(Arc::clone(object)))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum MappingTarget {
    Keys(KeySequence),
    Handler(Handler),
}

/// A single entry in the keymap.
#[derive(Debug, Clone)]
pub struct KeyMapping {
    pub modes: ModeMask,
    pub from: KeySequence,
    pub to: MappingTarget,
    /// Whether `to` keys are themselves subject to mapping.
    pub remap: bool,
    /// Extension that registered the entry, `None` for built-ins and user
    /// mappings.
    pub owner: Option<&'static str>,
}

impl KeyMapping {
    pub fn handler(&self) -> Option<&Handler> {
        match &self.to {
            MappingTarget::Handler(handler) => Some(handler),
            MappingTarget::Keys(_) => None,
        }
    }
}

/// A bundle of mappings registered under one name.
pub trait Extension {
    fn name(&self) -> &'static str;
    fn init(&self, keymap: &mut KeymapBuilder);
}

/// Collects mappings. Later entries shadow earlier ones with the same keys.
#[derive(Debug, Default)]
pub struct KeymapBuilder {
    mappings: Vec<KeyMapping>,
    extensions: Vec<&'static str>,
    owner: Option<&'static str>,
}

impl KeymapBuilder {
    /// An empty builder, without even the built-in commands.
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder preloaded with the built-in motions, operators and mode
    /// commands.
    pub fn with_builtins() -> Self {
        let mut builder = Self::new();
        builder.register_builtins();
        builder
    }

    pub fn register_key_mapping(
        &mut self,
        modes: ModeMask,
        from: KeySequence,
        to: KeySequence,
        remap: bool,
    ) -> &mut Self {
        trace!(%from, %to, ?modes, remap, "register mapping");
        self.push(modes, from, MappingTarget::Keys(to), remap)
    }

    pub fn register_handler(&mut self, modes: ModeMask, keys: KeySequence, handler: Handler) -> &mut Self {
        trace!(%keys, ?modes, "register handler");
        self.push(modes, keys, MappingTarget::Handler(handler), false)
    }

    /// Run an extension's `init`, tagging what it registers with its name.
    pub fn register_extension(&mut self, extension: &dyn Extension) -> Result<&mut Self> {
        let name = extension.name();
        if self.extensions.contains(&name) {
            return Err(EngineError::DuplicateExtension(name.to_string()));
        }
        self.extensions.push(name);
        let before = self.mappings.len();
        self.owner = Some(name);
        extension.init(self);
        self.owner = None;
        debug!(extension = name, mappings = self.mappings.len() - before, "extension registered");
        Ok(self)
    }

    pub fn extensions(&self) -> &[&'static str] {
        &self.extensions
    }

    pub fn build(self) -> Keymap {
        let mut first_key: HashMap<KeyEvent, Vec<usize>> = HashMap::new();
        for (idx, mapping) in self.mappings.iter().enumerate() {
            if let Some(key) = mapping.from.keys().first() {
                first_key.entry(*key).or_default().push(idx);
            }
        }
        Keymap {
            mappings: self.mappings,
            first_key,
        }
    }

    fn push(&mut self, modes: ModeMask, from: KeySequence, to: MappingTarget, remap: bool) -> &mut Self {
        if from.is_empty() {
            return self;
        }
        let from = KeySequence::new(from.keys().iter().map(|k| k.normalized()).collect());
        self.mappings.push(KeyMapping {
            modes,
            from,
            to,
            remap,
            owner: self.owner,
        });
        self
    }

    fn register_builtins(&mut self) {
        let nx = ModeMask::NORMAL | ModeMask::VISUAL;
        let nxo = nx | ModeMask::OP_PENDING;

        let motions = [
            ('h', Motion::Left),
            ('l', Motion::Right),
            ('k', Motion::Up),
            ('j', Motion::Down),
            ('0', Motion::LineStart),
            ('^', Motion::FirstNonBlank),
            ('$', Motion::LineEnd),
            ('G', Motion::FileEnd),
            ('w', Motion::WordForward),
            ('b', Motion::WordBackward),
            ('e', Motion::WordEnd),
        ];
        for (key, motion) in motions {
            self.register_handler(nxo, KeySequence::from(KeyEvent::char(key)), Handler::Motion(motion));
        }
        self.register_handler(nxo, KeySequence::from_chars("gg"), Handler::Motion(Motion::FileStart));

        let operators = [
            ('d', OperatorId::Delete),
            ('c', OperatorId::Change),
            ('y', OperatorId::Yank),
            ('>', OperatorId::ShiftRight),
            ('<', OperatorId::ShiftLeft),
        ];
        for (key, operator) in operators {
            self.register_handler(nxo, KeySequence::from(KeyEvent::char(key)), Handler::Operator(operator));
        }

        let normal = [
            ("i", BuiltinCommand::EnterInsert),
            ("a", BuiltinCommand::Append),
            ("I", BuiltinCommand::InsertAtLineStart),
            ("A", BuiltinCommand::AppendAtLineEnd),
            ("R", BuiltinCommand::EnterReplace),
            ("gh", BuiltinCommand::EnterSelect(SelectionKind::Character)),
            ("gH", BuiltinCommand::EnterSelect(SelectionKind::Line)),
        ];
        for (keys, command) in normal {
            self.register_handler(ModeMask::NORMAL, KeySequence::from_chars(keys), Handler::Command(command));
        }
        self.register_handler(
            ModeMask::NORMAL,
            KeySequence::new(vec![KeyEvent::char('g'), KeyEvent::ctrl('h')]),
            Handler::Command(BuiltinCommand::EnterSelect(SelectionKind::Block)),
        );

        let visual_toggles = [
            (KeyEvent::char('v'), SelectionKind::Character),
            (KeyEvent::char('V'), SelectionKind::Line),
            (KeyEvent::ctrl('v'), SelectionKind::Block),
        ];
        for (key, kind) in visual_toggles {
            self.register_handler(nx, KeySequence::from(key), Handler::Command(BuiltinCommand::ToggleVisual(kind)));
        }

        self.register_handler(
            ModeMask::VS,
            KeySequence::from(KeyEvent::ctrl('g')),
            Handler::Command(BuiltinCommand::ToggleSelectVisual),
        );
        // In the one-shot Visual state `<C-o>` goes straight back to Select.
        self.register_handler(
            ModeMask::VS,
            KeySequence::from(KeyEvent::ctrl('o')),
            Handler::Command(BuiltinCommand::SingleVisualCommand),
        );
        self.register_handler(
            ModeMask::VISUAL,
            KeySequence::from(KeyEvent::char('o')),
            Handler::Command(BuiltinCommand::SwapSelectionEnds),
        );
    }
}

/// Outcome of looking up typed keys.
#[derive(Debug, Clone, Copy)]
pub enum Lookup<'a> {
    /// The first `consumed` keys resolve to `mapping`.
    Matched { mapping: &'a KeyMapping, consumed: usize },
    /// The keys are a proper prefix of at least one mapping.
    Pending,
    /// The keys match exactly but also prefix a longer mapping. Resolved
    /// by more input or by the host's timeout.
    Ambiguous,
    NoMatch,
}

/// Frozen mapping table, indexed by first key.
#[derive(Debug, Clone)]
pub struct Keymap {
    mappings: Vec<KeyMapping>,
    first_key: HashMap<KeyEvent, Vec<usize>>,
}

impl Default for Keymap {
    fn default() -> Self {
        KeymapBuilder::with_builtins().build()
    }
}

impl Keymap {
    pub fn builder() -> KeymapBuilder {
        KeymapBuilder::with_builtins()
    }

    pub fn mappings(&self) -> &[KeyMapping] {
        &self.mappings
    }

    /// Resolve `keys` typed in a mode covered by `mode`. With
    /// `handlers_only`, key-to-key mappings are ignored.
    pub fn lookup(&self, mode: ModeMask, keys: &[KeyEvent], handlers_only: bool) -> Lookup<'_> {
        let Some(first) = keys.first() else {
            return Lookup::NoMatch;
        };
        let Some(indices) = self.first_key.get(first) else {
            return Lookup::NoMatch;
        };
        let candidates = || {
            indices
                .iter()
                .rev()
                .map(|&idx| &self.mappings[idx])
                .filter(|m| m.modes.intersects(mode))
                .filter(|m| !handlers_only || m.handler().is_some())
        };

        let exact = candidates().find(|m| m.from.keys() == keys);
        let longer = candidates().any(|m| m.from.len() > keys.len() && m.from.starts_with(keys));

        match (exact, longer) {
            (Some(_), true) => Lookup::Ambiguous,
            (None, true) => Lookup::Pending,
            (Some(mapping), false) => Lookup::Matched {
                mapping,
                consumed: keys.len(),
            },
            (None, false) => self.longest_match(mode, keys, handlers_only),
        }
    }

    /// The longest mapping that is a prefix of `keys`, ignoring any
    /// longer mapping still in reach. Used when input stops arriving.
    pub fn longest_match(&self, mode: ModeMask, keys: &[KeyEvent], handlers_only: bool) -> Lookup<'_> {
        let Some(indices) = keys.first().and_then(|first| self.first_key.get(first)) else {
            return Lookup::NoMatch;
        };
        // Ties go to the newest entry: `max_by_key` keeps the last maximum.
        indices
            .iter()
            .map(|&idx| &self.mappings[idx])
            .filter(|m| m.modes.intersects(mode))
            .filter(|m| !handlers_only || m.handler().is_some())
            .filter(|m| m.from.len() <= keys.len() && keys.starts_with(m.from.keys()))
            .max_by_key(|m| m.from.len())
            .map_or(Lookup::NoMatch, |mapping| Lookup::Matched {
                mapping,
                consumed: mapping.from.len(),
            })
    }
}
