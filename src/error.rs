use thiserror::Error;

use crate::command::OperatorId;

/// Errors raised while configuring the engine or building a command.
///
/// Dispatch never hands these to the host: a failure in the middle of a key
/// sequence aborts the pending command and surfaces as [`Action::Bell`].
///
/// [`Action::Bell`]: crate::types::Action::Bell
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid key notation: {0}")]
    InvalidKeyNotation(String),

    #[error("invalid mode mask: {0:?}")]
    InvalidModeMask(String),

    #[error("invalid register name: {0:?}")]
    InvalidRegister(char),

    #[error("operator {got:?} entered while {pending:?} is pending")]
    OperatorMismatch { pending: OperatorId, got: OperatorId },

    #[error("mapping expansion exceeded depth {0}")]
    RecursiveMapping(usize),

    #[error("unknown extension: {0}")]
    UnknownExtension(String),

    #[error("extension already registered: {0}")]
    DuplicateExtension(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
