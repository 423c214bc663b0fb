//! Parse errors for free-form coordinate input.

use thiserror::Error;

/// Errors produced while parsing coordinate strings.
///
/// A parse failure never aborts the caller's flow: the offending input is
/// reported and discarded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("coordinate has no numeric fields")]
    Empty,

    #[error("coordinate has {0} numeric fields, at most 3 allowed")]
    TooManyFields(usize),

    #[error("unrecognized hemisphere suffix: {0:?}")]
    UnknownSuffix(String),

    #[error("invalid number: {0:?}")]
    InvalidNumber(String),

    #[error("expected a \"latitude, longitude\" pair: {0:?}")]
    MissingPair(String),
}
