//! Backend-agnostic access to tag-indexed media.
//!
//! Every source of posts, local or remote, implements [`Booru`]. A
//! [`Listing`] accumulates the paginated results of one query against one
//! booru, advancing with whichever [`Offset`] strategy the booru prefers.

mod booru;
pub mod error;
mod listing;
mod models;
mod pagination;

use std::sync::Arc;

#[cfg(any(test, feature = "mock"))]
pub use crate::booru::MockBooru;
pub use crate::booru::{Booru, Identity, NullBooru, search_from_start};
pub use crate::listing::Listing;
pub use crate::models::{Dimensions, GlobalId, Mime, Post, PostDetails, Resolved, Tag, placeholder_url};
pub use crate::pagination::{Offset, PaginationType};

/// Shared, type-erased handle to a booru.
pub type BooruHandle = Arc<dyn Booru>;
