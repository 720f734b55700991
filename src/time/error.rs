use thiserror::Error;

/// An error that occurred while parsing a duration value.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("{0}")]
    Syntax(String),
    #[error("{0}")]
    UnitNotSupported(String),
    #[error("Duration value '{0}' is out of range")]
    Overflow(String),
}
