use std::fmt;

/// Errors returned by the construction and parsing APIs.
///
/// The training hot path never returns errors: degenerate numerics produce
/// neutral values and out-of-range settings are clamped.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    InvalidData(String),
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidData(msg) => write!(f, "invalid data: {msg}"),
            Error::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}
