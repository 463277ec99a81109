use crate::models::{Mime, Tag};
use async_trait::async_trait;
use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::sync::{Arc, LazyLock};
use time::OffsetDateTime;
use url::Url;
use uuid::Uuid;

static PLACEHOLDER: LazyLock<Url> =
    LazyLock::new(|| Url::parse("b2-asset:///failed-to-load-image.png").expect("placeholder URL literal"));

/// URL of the fixed placeholder asset shown in place of media that could not
/// be located or loaded.
pub fn placeholder_url() -> Url {
    PLACEHOLDER.clone()
}

/// Identifier of a post that is unique across every source in one running
/// session: `<source id>.<local id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlobalId(String);
impl GlobalId {
    pub fn new(source: Uuid, local_id: i64) -> Self {
        Self(format!("{source}.{local_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl Display for GlobalId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// Pixel dimensions of a post's media, when the source reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Backend-specific parts of a post that may need the backend to resolve.
///
/// Remote backends know everything up front and use [`Resolved`]; the local
/// database backend resolves paths and tags against its store on demand.
#[async_trait]
pub trait PostDetails: Debug + Send + Sync {
    /// Location of the full-resolution media.
    fn image_url(&self) -> Url;

    /// Location of the thumbnail. Defaults to the full-resolution media.
    fn thumbnail_url(&self) -> Url {
        self.image_url()
    }

    /// Tags attached to the post. Never fails: a post whose tags cannot be
    /// resolved has no tags.
    async fn tags(&self) -> Vec<Tag>;
}

/// Post details that were fully known when the post was fetched.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub image_url: Url,
    pub thumbnail_url: Url,
    pub tags: Vec<Tag>,
}

#[async_trait]
impl PostDetails for Resolved {
    fn image_url(&self) -> Url {
        self.image_url.clone()
    }

    fn thumbnail_url(&self) -> Url {
        self.thumbnail_url.clone()
    }

    async fn tags(&self) -> Vec<Tag> {
        self.tags.clone()
    }
}

/// One media item from a booru, plus its metadata.
///
/// Posts are immutable and cheap to clone. Two posts are equal when their
/// [`GlobalId`]s are.
#[derive(Debug, Clone)]
pub struct Post {
    /// Booru-local identifier.
    pub id: i64,
    pub global_id: GlobalId,
    pub created_at: OffsetDateTime,
    /// Size of the full-resolution media in bytes.
    pub size: u64,
    pub mime: Mime,
    pub dimensions: Option<Dimensions>,
    details: Arc<dyn PostDetails>,
}
impl Post {
    pub fn new(
        source: Uuid,
        id: i64,
        created_at: OffsetDateTime,
        size: u64,
        mime: Mime,
        details: impl PostDetails + 'static,
    ) -> Self {
        Self {
            id,
            global_id: GlobalId::new(source, id),
            created_at,
            size,
            mime,
            dimensions: None,
            details: Arc::new(details),
        }
    }

    pub fn with_dimensions(mut self, dimensions: Option<Dimensions>) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn image_url(&self) -> Url {
        self.details.image_url()
    }

    pub fn thumbnail_url(&self) -> Url {
        self.details.thumbnail_url()
    }

    pub async fn tags(&self) -> Vec<Tag> {
        self.details.tags().await
    }
}
impl PartialEq for Post {
    fn eq(&self, other: &Self) -> bool {
        self.global_id == other.global_id
    }
}
impl Eq for Post {}
