//! Chunked pagination over a single booru query.

use crate::BooruHandle;
use crate::booru::Booru;
use crate::error::Result;
use crate::models::Post;
use crate::pagination::{Offset, PaginationType};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::{debug, info};

struct State {
    chunks: Vec<Vec<Post>>,
    /// Offset of the most recent successful fetch.
    offset: Offset,
    exhausted: bool,
}

/// Clears the in-flight flag however `load_more` exits.
struct Loading<'a>(&'a AtomicBool);
impl Drop for Loading<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The accumulated results of one query against one booru.
///
/// A listing is a sequence of chunks, one per fetch, none of them empty. It
/// only ever grows by appending a chunk or by becoming exhausted. The booru is
/// held weakly: a listing outliving its source simply stops loading.
///
/// `load_more` takes `&self` and can be called from several tasks at once.
/// Only one fetch runs at a time; a call made while another is in flight
/// returns nothing.
///
/// # Examples
///
/// ```
/// use b2_booru::{BooruHandle, Listing, MockBooru, PaginationType, search_from_start};
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let booru: BooruHandle = Arc::new(MockBooru::with_ids([PaginationType::Pages], 1..=3).with_page_size(2));
/// let first = search_from_start(booru.as_ref(), &[]).await.unwrap();
/// let listing = Listing::start(first, &booru).expect("first page has posts");
/// assert_eq!(listing.load_more(&[]).await.unwrap().len(), 1);
/// assert!(listing.load_more(&[]).await.unwrap().is_empty());
/// assert!(listing.is_exhausted());
/// assert_eq!(listing.count(), 3);
/// # Ok(())
/// # }
/// ```
pub struct Listing {
    source: Weak<dyn Booru>,
    source_name: String,
    pagination: PaginationType,
    state: Mutex<State>,
    loading: AtomicBool,
}

impl Listing {
    /// Create a listing from chunks already fetched from `source`.
    ///
    /// # Panics
    ///
    /// If `chunks` is empty or any chunk is empty.
    pub fn new(chunks: Vec<Vec<Post>>, source: &BooruHandle) -> Self {
        assert!(!chunks.is_empty(), "a listing needs at least one chunk");
        assert!(chunks.iter().all(|chunk| !chunk.is_empty()), "a listing cannot hold an empty chunk");
        let identity = source.identity();
        let pagination = identity.preferred_pagination();
        let offset = match pagination {
            PaginationType::None => Offset::None,
            PaginationType::Pages => Offset::Page(u32::try_from(chunks.len() - 1).unwrap_or(u32::MAX)),
            PaginationType::RelativeToLowestId => Offset::PreviousChunk(chunks[0].clone()),
        };
        Self {
            source: Arc::downgrade(source),
            source_name: identity.name.clone(),
            pagination,
            state: Mutex::new(State { chunks, offset, exhausted: false }),
            loading: AtomicBool::new(false),
        }
    }

    /// Create a listing from a first page, or nothing if the page is empty.
    pub fn start(posts: Vec<Post>, source: &BooruHandle) -> Option<Self> {
        if posts.is_empty() {
            return None;
        }
        Some(Self::new(vec![posts], source))
    }

    /// Fetch the next chunk and append it.
    ///
    /// Returns the new chunk, or nothing if the source has no pagination, the
    /// listing is exhausted, the source is gone, or another fetch is in
    /// flight. An empty fetch marks the listing exhausted. On failure nothing
    /// changes, and the next call requests the same offset again.
    pub async fn load_more(&self, tags: &[String]) -> Result<Vec<Post>> {
        let Some(source) = self.source.upgrade() else {
            info!(source = %self.source_name, "source is gone, not loading more");
            return Ok(Vec::new());
        };
        if self.pagination == PaginationType::None {
            return Ok(Vec::new());
        }
        if self.loading.swap(true, Ordering::AcqRel) {
            debug!(source = %self.source_name, "dropping load_more while another is in flight");
            return Ok(Vec::new());
        }
        let _loading = Loading(&self.loading);

        let offset = {
            let state = self.state();
            if state.exhausted {
                return Ok(Vec::new());
            }
            let last = state.chunks.last().map(Vec::as_slice).unwrap_or_default();
            state.offset.advance(last)
        };
        debug!(source = %self.source_name, ?tags, ?offset, "loading more posts");
        let posts = source.search(tags, &offset).await?;

        let mut state = self.state();
        if posts.is_empty() {
            info!(source = %self.source_name, chunks = state.chunks.len(), "listing exhausted");
            state.exhausted = true;
        } else {
            state.chunks.push(posts.clone());
            state.offset = offset;
        }
        Ok(posts)
    }

    /// Total number of posts across all chunks.
    pub fn count(&self) -> usize {
        self.state().chunks.iter().map(Vec::len).sum()
    }

    /// All posts in fetch order.
    pub fn posts(&self) -> Vec<Post> {
        self.state().chunks.iter().flatten().cloned().collect()
    }

    pub fn chunks(&self) -> Vec<Vec<Post>> {
        self.state().chunks.clone()
    }

    pub fn is_exhausted(&self) -> bool {
        self.state().exhausted
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// The pagination type this listing advances with.
    pub fn pagination(&self) -> PaginationType {
        self.pagination
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
