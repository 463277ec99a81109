//! Hydrus Error Types
//!
//! Internal to the backend. Everything raised here reaches callers as
//! [`QueryFailed`](b2_booru::error::ErrorKind::QueryFailed), with the
//! original kind kept as a child frame.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A Hydrus database error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for Hydrus database operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("database error")]
    Database,
    #[display("database file not found: {}", _0.display())]
    MissingFile(#[error(not(source))] PathBuf),
    #[display("service not found: {_0}")]
    ServiceNotFound(#[error(not(source))] String),
    #[display("invalid database data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database)
    }
}
