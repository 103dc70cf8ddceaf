//! Error types for score evaluation.
//!
//! Every failure aborts evaluation of the current score; callers discard
//! whatever was produced before the error surfaced.

use thiserror::Error;

/// Result type alias for evaluation operations.
pub type Result<T> = std::result::Result<T, EvalError>;

/// An error raised while evaluating a score.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// Attribute name or alias is not registered.
    #[error("unknown attribute: '{0}'")]
    UnknownAttribute(String),

    /// A transform rejected its input.
    #[error("value {value} is out of range for attribute '{attribute}'")]
    OutOfRange { attribute: String, value: String },

    /// Two attribute definitions claim the same name or alias.
    #[error("attribute alias '{0}' is already registered")]
    DuplicateAlias(String),

    /// An instrument reference names no known instrument or nickname.
    #[error("cannot resolve instrument '{0}'")]
    Resolution(String),

    /// Unrecognized pitch letter or accidental.
    #[error("invalid pitch: {0}")]
    InvalidPitch(String),

    /// Jump to a marker that was never placed.
    #[error("unknown marker: '{0}'")]
    UnknownMarker(String),
}

impl EvalError {
    pub fn out_of_range(attribute: impl Into<String>, value: impl ToString) -> Self {
        Self::OutOfRange {
            attribute: attribute.into(),
            value: value.to_string(),
        }
    }
}
