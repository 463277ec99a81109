//! Booru Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Backends raise their own internal
//! errors into one of these kinds at the [`Booru`](crate::Booru) boundary, so
//! the original cause stays attached as a child frame.

use derive_more::{Display, Error};

/// A booru error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for booru operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A search could not complete (transport, parsing or database failure).
    #[display("query failed")]
    QueryFailed,
    /// The configured base address of a remote booru is unusable.
    #[display("invalid booru endpoint: {_0}")]
    InvalidEndpoint(#[error(not(source))] String),
    /// Authentication was rejected or is missing.
    #[display("invalid booru credentials")]
    InvalidCredentials,
    /// A single asset could not be fetched; scoped to one post.
    #[display("failed to load preview: {_0}")]
    PreviewLoadFailed(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::QueryFailed | Self::PreviewLoadFailed(_))
    }

    /// Short, user-facing description for a dismissible notice.
    pub fn description(&self) -> &'static str {
        match self {
            Self::QueryFailed => "Couldn't load posts from the booru.",
            Self::InvalidEndpoint(_) => "Couldn't connect to the booru.",
            Self::InvalidCredentials => "Couldn't authenticate with the booru.",
            Self::PreviewLoadFailed(_) => "Couldn't load the image.",
        }
    }

    /// What the user can try next.
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::QueryFailed => "Try making the query again.",
            Self::InvalidEndpoint(_) => "Make sure that the booru's URL is correct.",
            Self::InvalidCredentials => "Make sure that your booru credentials are correct.",
            Self::PreviewLoadFailed(_) => {
                "Make sure your booru credentials are correct, or try loading the image again."
            },
        }
    }
}
