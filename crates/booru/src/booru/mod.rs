//! Booru trait and the backend-independent implementations.
//!
//! This module defines the [`Booru`] trait, the one query interface every
//! source of posts implements: the local database, the remote HTTP APIs, and
//! the [`NullBooru`] placeholder used when no source is selected.

#[cfg(any(test, feature = "mock"))]
mod mock;
mod null;

#[cfg(any(test, feature = "mock"))]
pub use self::mock::MockBooru;
pub use self::null::NullBooru;
use crate::error::Result;
use crate::models::{GlobalId, Post};
use crate::pagination::{Offset, PaginationType};
use async_trait::async_trait;
use std::collections::BTreeSet;
use uuid::Uuid;

/// Who a booru is and what it can do.
///
/// Created once per backend instance; the random `id` is what keeps
/// [`GlobalId`]s from different backends apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    /// Machine-friendly name (the configuration key).
    pub name: String,
    /// Name shown to the user.
    pub human_name: String,
    pub pagination: BTreeSet<PaginationType>,
}
impl Identity {
    pub fn new(
        name: impl Into<String>,
        human_name: impl Into<String>,
        pagination: impl IntoIterator<Item = PaginationType>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            human_name: human_name.into(),
            pagination: pagination.into_iter().collect(),
        }
    }

    /// The most preferred pagination type this booru supports.
    pub fn preferred_pagination(&self) -> PaginationType {
        self.pagination.last().copied().unwrap_or(PaginationType::None)
    }

    pub fn supports_pagination(&self) -> bool {
        self.preferred_pagination() != PaginationType::None
    }

    pub fn global_id(&self, local_id: i64) -> GlobalId {
        GlobalId::new(self.id, local_id)
    }
}

/// Unified interface for tag-indexed media sources.
///
/// Every call is independent: a booru keeps no per-query cursor state, that
/// lives in the [`Listing`](crate::Listing). Calls may come from any task or
/// thread, and a caller that loses interest simply drops the result; nothing
/// is cancelled.
///
/// # Examples
///
/// ```
/// use b2_booru::{Booru, NullBooru, Offset, error::Result, search_from_start};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<()> {
/// let booru = NullBooru::default();
/// assert!(booru.initial_posts().await?.is_empty());
/// assert!(booru.search(&["solo".to_string()], &Offset::None).await?.is_empty());
/// assert!(search_from_start(&booru, &["solo".to_string()]).await?.is_empty());
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait Booru: Send + Sync {
    fn identity(&self) -> &Identity;

    /// Posts to show before the user has searched for anything.
    ///
    /// Defaults to an unfiltered search from the start.
    async fn initial_posts(&self) -> Result<Vec<Post>> {
        search_from_start(self, &[]).await
    }

    /// Posts that have all of `tags`, resuming at `offset`.
    async fn search(&self, tags: &[String], offset: &Offset) -> Result<Vec<Post>>;
}

/// Search a booru from its first page, using the initial offset of its
/// preferred pagination type.
pub async fn search_from_start<B: Booru + ?Sized>(booru: &B, tags: &[String]) -> Result<Vec<Post>> {
    let offset = Offset::initial(booru.identity().preferred_pagination());
    booru.search(tags, &offset).await
}
