use std::path::PathBuf;

use predicate_core::CoreError;
use thiserror::Error;

/// Structural reason attached to a malformed predicate rejection.
///
/// Every variant reports the same contract-level failure; the reason only
/// exists to help callers explain which part of the filter was wrong.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("expected an object, found {found}")]
    NotAnObject { found: &'static str },
    #[error("`{combinator}` cannot be combined with other keys")]
    MixedCombinator { combinator: String },
    #[error("`{combinator}` expects an array of predicates")]
    CombinatorNotArray { combinator: String },
    #[error("`{combinator}` requires at least one predicate")]
    EmptyCombinator { combinator: String },
    #[error("field path must not be empty")]
    EmptyFieldPath,
    #[error("unknown key `{0}`")]
    UnknownKey(String),
    #[error("null is not a valid value")]
    NullValue,
    #[error("element {index} is not a string, number or boolean")]
    NonScalarElement { index: usize },
    #[error("operator object must contain exactly one operator, found {count} keys")]
    OperatorArity { count: usize },
    #[error("unknown operator `{0}`")]
    UnknownOperator(String),
    #[error("`{operator}` expects {expected}")]
    InvalidOperand {
        operator: &'static str,
        expected: &'static str,
    },
    #[error("nesting exceeds the maximum depth of {max}")]
    DepthExceeded { max: usize },
}

/// Errors returned when reading or validating predicates.
#[derive(Debug, Error)]
pub enum PredicateError {
    #[error("malformed predicate at {path}: {reason}")]
    Malformed { path: String, reason: Violation },
    #[error("invalid predicate syntax: {0}")]
    Syntax(String),
    #[error("predicate path does not exist: {0}")]
    MissingPath(String),
    #[error("failed to read predicate from {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse predicate from {path}: {message}")]
    Parse { path: String, message: String },
    #[error("duplicate predicate name detected: {name}")]
    DuplicateName { name: String },
}

impl PredicateError {
    pub fn malformed(path: impl Into<String>, reason: Violation) -> Self {
        PredicateError::Malformed {
            path: path.into(),
            reason,
        }
    }

    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PredicateError::Io {
            path: path.into().display().to_string(),
            source,
        }
    }

    pub fn parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        PredicateError::Parse {
            path: path.into().display().to_string(),
            message: message.into(),
        }
    }

    /// Whether the input was readable but does not conform to the grammar.
    pub fn is_malformed(&self) -> bool {
        matches!(self, PredicateError::Malformed { .. })
    }

    pub fn violation(&self) -> Option<&Violation> {
        match self {
            PredicateError::Malformed { reason, .. } => Some(reason),
            _ => None,
        }
    }

    /// Location of the first mismatch, rendered as `$and[0].kind.$in[1]`.
    pub fn path(&self) -> Option<&str> {
        match self {
            PredicateError::Malformed { path, .. } => Some(path),
            _ => None,
        }
    }
}

impl From<PredicateError> for CoreError {
    fn from(value: PredicateError) -> Self {
        match value {
            PredicateError::Io { source, .. } => CoreError::IoError(source),
            PredicateError::MissingPath(_) | PredicateError::DuplicateName { .. } => {
                CoreError::GeneralError(value.to_string())
            }
            other => CoreError::InvalidFilter(other.to_string()),
        }
    }
}
