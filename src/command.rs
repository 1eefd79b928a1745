//! Accumulates counts, a register, an operator and its argument into a
//! [`Command`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EngineError;
use crate::motion::{Motion, MotionContext};
use crate::textobj::TextObject;
use crate::traits::TextView;
use crate::types::Range;

/// Operators that act on the range supplied by their argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorId {
    /// `d`
    Delete,
    /// `c`
    Change,
    /// `y`
    Yank,
    /// `>`
    ShiftRight,
    /// `<`
    ShiftLeft,
}

#[derive(Debug, Default, Clone)]
struct Counts {
    current: Option<u32>,
}

impl Counts {
    fn push_digit(&mut self, d: u32) {
        let next = self
            .current
            .unwrap_or(0)
            .saturating_mul(10)
            .saturating_add(d);
        self.current = Some(next);
    }
}

/// Where the builder is in the grammar `["x] [count] [operator [count]] argument`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BuilderState {
    #[default]
    Empty,
    /// Saw `"`, the next key names the register.
    AwaitingRegister,
    AccumulatingCount,
    AwaitingOperatorArgument,
}

/// Read-only view of a command that is still being typed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingCommand {
    /// Product of all counts typed so far, `None` if no digit was typed.
    pub count: Option<u32>,
    pub register: Option<char>,
    pub operator: Option<OperatorId>,
    pub awaiting_argument: bool,
}

impl PendingCommand {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// What an operator acts on, or where a bare motion goes.
#[derive(Debug, Clone)]
pub enum Argument {
    Motion(Motion),
    /// `count` whole lines starting at the cursor line (doubled operators).
    CurrentLine,
    TextObject(Arc<dyn TextObject>),
}

impl PartialEq for Argument {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Argument::Motion(a), Argument::Motion(b)) => a == b,
            (Argument::CurrentLine, Argument::CurrentLine) => true,
            (Argument::TextObject(a), Argument::TextObject(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Argument {
    /// The range an operator receives.
    pub fn range<T: TextView>(&self, text: &T, cursor: usize, ctx: MotionContext) -> Option<Range> {
        match self {
            Argument::Motion(motion) => motion.range(text, cursor, ctx),
            Argument::CurrentLine => Some(Motion::current_lines(text, cursor, ctx.count)),
            Argument::TextObject(object) => object
                .range(text, cursor, ctx.count)
                .map(|range| range.clamped(text.len_chars())),
        }
    }
}

/// A complete command. Built once by [`CommandBuilder`] and executed once.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    /// Effective repetition, at least 1.
    pub count: u32,
    /// The count as typed, if any digit was typed.
    pub raw_count: Option<u32>,
    pub register: Option<char>,
    pub operator: Option<OperatorId>,
    pub argument: Option<Argument>,
}

/// Outcome of feeding an operator key to the builder.
#[derive(Debug, Clone, PartialEq)]
pub enum OperatorStep {
    /// Waiting for a motion or text object.
    Pending,
    /// The operator was doubled (`dd`) and the command is complete.
    Complete(Command),
}

/// Incremental parser for `["x] [count] [operator [count]] argument`.
#[derive(Debug, Default, Clone)]
pub struct CommandBuilder {
    state: BuilderState,
    counts: Counts,
    operator_count: Option<u32>,
    register: Option<char>,
    operator: Option<OperatorId>,
}

impl CommandBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> BuilderState {
        self.state
    }

    pub fn is_empty(&self) -> bool {
        self.state == BuilderState::Empty && self.register.is_none()
    }

    pub fn is_awaiting_register(&self) -> bool {
        self.state == BuilderState::AwaitingRegister
    }

    pub fn operator(&self) -> Option<OperatorId> {
        self.operator
    }

    pub fn pending(&self) -> PendingCommand {
        PendingCommand {
            count: self.combined_count(),
            register: self.register,
            operator: self.operator,
            awaiting_argument: self.state == BuilderState::AwaitingOperatorArgument,
        }
    }

    /// Feed a digit. A leading `0` is refused so it can act as a motion.
    pub fn push_digit(&mut self, digit: u32) -> bool {
        if digit > 9 || (digit == 0 && self.counts.current.is_none()) {
            return false;
        }
        self.counts.push_digit(digit);
        if self.state != BuilderState::AwaitingOperatorArgument {
            self.state = BuilderState::AccumulatingCount;
        }
        true
    }

    /// `"` was typed. Only valid before an operator.
    pub fn start_register(&mut self) -> bool {
        if self.operator.is_some() || self.state == BuilderState::AwaitingRegister {
            return false;
        }
        self.state = BuilderState::AwaitingRegister;
        true
    }

    pub fn set_register(&mut self, name: char) -> Result<(), EngineError> {
        if !is_register_name(name) {
            return Err(EngineError::InvalidRegister(name));
        }
        self.register = Some(name);
        self.state = if self.counts.current.is_some() {
            BuilderState::AccumulatingCount
        } else {
            BuilderState::Empty
        };
        Ok(())
    }

    pub fn set_operator(&mut self, operator: OperatorId) -> Result<OperatorStep, EngineError> {
        match self.operator {
            None => {
                self.operator = Some(operator);
                self.operator_count = self.counts.current.take();
                self.state = BuilderState::AwaitingOperatorArgument;
                Ok(OperatorStep::Pending)
            }
            Some(pending) if pending == operator => {
                Ok(OperatorStep::Complete(self.complete(Argument::CurrentLine)))
            }
            Some(pending) => Err(EngineError::OperatorMismatch {
                pending,
                got: operator,
            }),
        }
    }

    /// Supply the argument and take the finished command, leaving the
    /// builder empty.
    pub fn complete(&mut self, argument: Argument) -> Command {
        let raw_count = self.combined_count();
        let command = Command {
            count: raw_count.unwrap_or(1).max(1),
            raw_count,
            register: self.register,
            operator: self.operator,
            argument: Some(argument),
        };
        debug!(
            count = command.count,
            operator = ?command.operator,
            register = ?command.register,
            "command complete"
        );
        self.reset();
        command
    }

    /// Count and register for a command that takes no argument (Visual
    /// operators, mode changes). Leaves the builder empty.
    pub fn take_prefix(&mut self) -> (Option<u32>, Option<char>) {
        let prefix = (self.combined_count(), self.register);
        self.reset();
        prefix
    }

    /// Drop everything typed so far.
    pub fn abort(&mut self) {
        if !self.is_empty() {
            debug!(pending = ?self.pending(), "command aborted");
        }
        self.reset();
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn combined_count(&self) -> Option<u32> {
        match (self.operator_count, self.counts.current) {
            (None, None) => None,
            (a, b) => Some(a.unwrap_or(1).saturating_mul(b.unwrap_or(1))),
        }
    }
}

fn is_register_name(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '"' | '-' | '*' | '+' | '_' | '/' | '.')
}

impl fmt::Display for OperatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match self {
            OperatorId::Delete => "d",
            OperatorId::Change => "c",
            OperatorId::Yank => "y",
            OperatorId::ShiftRight => ">",
            OperatorId::ShiftLeft => "<",
        };
        f.write_str(key)
    }
}
