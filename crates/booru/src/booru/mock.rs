//! In-memory booru for testing.

use crate::booru::{Booru, Identity};
use crate::error::{ErrorKind, Result};
use crate::models::{Mime, Post, Resolved, Tag};
use crate::pagination::{Offset, PaginationType};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use time::OffsetDateTime;
use tokio::sync::Notify;
use url::Url;

const DEFAULT_PAGE_SIZE: usize = 10;

/// In-memory booru for testing.
///
/// Holds a fixed set of posts, ordered by descending ID like most boorus, and
/// honours every [`Offset`] variant so listings can be driven against it.
/// Every requested offset is recorded, and failures or a blocking gate can be
/// injected to exercise error and concurrency paths.
///
/// # Examples
///
/// ```
/// use b2_booru::{Booru, MockBooru, Offset, PaginationType};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let booru = MockBooru::with_posts([PaginationType::Pages], [
///     (1, vec!["solo"]),
///     (2, vec!["solo", "outdoors"]),
/// ]);
/// let posts = booru.search(&["outdoors".to_string()], &Offset::Page(0)).await.unwrap();
/// assert_eq!(posts.len(), 1);
/// assert_eq!(posts[0].id, 2);
/// # Ok(())
/// # }
/// ```
pub struct MockBooru {
    identity: Identity,
    posts: Vec<Post>,
    tags: Vec<Vec<String>>,
    page_size: usize,
    requests: Mutex<Vec<Offset>>,
    failures: AtomicUsize,
    gate: Option<Arc<Notify>>,
}

impl MockBooru {
    /// Create a mock booru pre-populated with tagged posts.
    pub fn with_posts<T: Into<String>>(
        pagination: impl IntoIterator<Item = PaginationType>,
        posts: impl IntoIterator<Item = (i64, Vec<T>)>,
    ) -> Self {
        let identity = Identity::new("mock", "Mock", pagination);
        let mut entries: Vec<(i64, Vec<String>)> =
            posts.into_iter().map(|(id, tags)| (id, tags.into_iter().map(Into::into).collect())).collect();
        entries.sort_by(|(a, _), (b, _)| b.cmp(a));
        let (posts, tags) = entries
            .into_iter()
            .map(|(id, tags)| (Self::post(&identity, id, &tags), tags))
            .unzip();
        Self {
            identity,
            posts,
            tags,
            page_size: DEFAULT_PAGE_SIZE,
            requests: Mutex::new(Vec::new()),
            failures: AtomicUsize::new(0),
            gate: None,
        }
    }

    /// Create a mock booru of untagged posts.
    pub fn with_ids(pagination: impl IntoIterator<Item = PaginationType>, ids: impl IntoIterator<Item = i64>) -> Self {
        Self::with_posts(pagination, ids.into_iter().map(|id| (id, Vec::<String>::new())))
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Make every search wait for a notification before answering.
    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Make the next `count` searches fail with
    /// [`QueryFailed`](ErrorKind::QueryFailed).
    pub fn fail_next(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    /// Every offset searched so far, in call order.
    pub fn requested_offsets(&self) -> Vec<Offset> {
        self.requests.lock().map(|requests| requests.clone()).unwrap_or_default()
    }

    fn post(identity: &Identity, id: i64, tags: &[String]) -> Post {
        let url = Url::parse(&format!("mock://posts/{id}.png")).unwrap_or_else(|_| crate::placeholder_url());
        let details = Resolved {
            thumbnail_url: url.clone(),
            image_url: url,
            tags: tags.iter().map(|tag| Tag::parse(tag)).collect(),
        };
        Post::new(identity.id, id, OffsetDateTime::UNIX_EPOCH, 0, Mime::Png, details)
    }

    fn matching(&self, tags: &[String]) -> impl Iterator<Item = &Post> {
        self.posts
            .iter()
            .zip(&self.tags)
            .filter(move |(_, post_tags)| tags.iter().all(|tag| post_tags.contains(tag)))
            .map(|(post, _)| post)
    }
}

#[async_trait]
impl Booru for MockBooru {
    fn identity(&self) -> &Identity {
        &self.identity
    }

    async fn search(&self, tags: &[String], offset: &Offset) -> Result<Vec<Post>> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(offset.clone());
        }
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let failures = self.failures.load(Ordering::SeqCst);
        if failures > 0 {
            self.failures.store(failures - 1, Ordering::SeqCst);
            exn::bail!(ErrorKind::QueryFailed);
        }
        let matching = self.matching(tags);
        let posts = match offset {
            Offset::None => matching.cloned().collect(),
            Offset::Page(page) => {
                matching.skip(*page as usize * self.page_size).take(self.page_size).cloned().collect()
            },
            Offset::PreviousChunk(_) => match offset.lowest_id() {
                Some(lowest) => matching.filter(|post| post.id < lowest).take(self.page_size).cloned().collect(),
                None => matching.take(self.page_size).cloned().collect(),
            },
        };
        Ok(posts)
    }
}
