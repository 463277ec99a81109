//! Front-end Error Types

use b2_booru::error::ErrorKind as BooruErrorKind;
use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    #[display("could not open source {_0}")]
    Open(#[error(not(source))] String),
    #[display("{}", _0.description())]
    Booru(#[error(not(source))] BooruErrorKind),
}

impl ErrorKind {
    /// What the user can try next, when there's anything to suggest.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Config => Some("Check the configuration file and any B2_ environment variables."),
            Self::Open(_) => None,
            Self::Booru(kind) => Some(kind.recovery_suggestion()),
        }
    }
}

/// Wrap a booru error, keeping its kind visible at the top level.
pub fn booru(err: b2_booru::error::Error) -> Error {
    let kind = ErrorKind::Booru((*err).clone());
    err.raise(kind)
}
