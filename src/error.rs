use trackable::error::{ErrorKind as TrackableErrorKind, ErrorKindExt};
use trackable::error::{Failure, TrackableError};

/// This crate specific `Error` type.
#[derive(Debug, Clone, TrackableError)]
pub struct Error(TrackableError<ErrorKind>);
impl From<Failure> for Error {
    fn from(f: Failure) -> Self {
        ErrorKind::Other.takes_over(f).into()
    }
}
impl From<statrs::StatsError> for Error {
    fn from(f: statrs::StatsError) -> Self {
        ErrorKind::InvalidConfig.cause(f.to_string()).into()
    }
}

/// Possible error kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid configuration was given.
    ///
    /// Unknown model families, spacings or distributions, and malformed limits or steps,
    /// are reported with this kind. An engine is never built from such a configuration.
    InvalidConfig,

    /// Invalid input was given to an already built engine.
    ///
    /// E.g., an outcome other than `0` or `1`, or a response to a trial that was never asked.
    InvalidInput,

    /// A normalization step had no probability mass to normalize.
    NumericalDegeneracy,

    /// Implementation bug.
    Bug,

    /// Other error.
    Other,
}
impl TrackableErrorKind for ErrorKind {}
