use crate::request;
use async_trait::async_trait;
use b2_booru::error::Result;
use b2_booru::{Booru, Dimensions, Identity, Mime, Offset, PaginationType, Post, Resolved, Tag};
use reqwest::Client;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::{debug, instrument, warn};
use url::Url;

#[derive(Debug, Deserialize)]
struct Timestamp {
    s: i64,
}

#[derive(Debug, Deserialize)]
struct PostResponse {
    id: i64,
    file_url: Url,
    preview_url: Option<Url>,
    file_ext: String,
    file_size: u64,
    created_at: Timestamp,
    /// Space separated.
    tags: String,
    #[serde(default)]
    artist: Vec<String>,
    width: Option<u32>,
    height: Option<u32>,
}

/// Booru with a `/post/index.json` API paginated by page number.
///
/// Tags come back as one space separated string with no namespaces, except
/// artists, which are listed separately.
#[derive(Debug)]
pub struct PagedBooru {
    identity: Identity,
    client: Client,
    base: Url,
    limit: u32,
}

impl PagedBooru {
    pub fn new(name: impl Into<String>, human_name: impl Into<String>, base: Url, limit: u32) -> Result<Self> {
        request::validate_base(&base)?;
        Ok(Self {
            identity: Identity::new(name, human_name, [PaginationType::None, PaginationType::Pages]),
            client: request::client(HeaderMap::new())?,
            base,
            limit,
        })
    }

    fn post(&self, response: PostResponse) -> Option<Post> {
        let Some(mime) = Mime::from_extension(&response.file_ext) else {
            debug!(id = response.id, ext = %response.file_ext, "skipping post that can't be displayed");
            return None;
        };
        let Ok(created_at) = OffsetDateTime::from_unix_timestamp(response.created_at.s) else {
            warn!(id = response.id, timestamp = response.created_at.s, "skipping post with invalid timestamp");
            return None;
        };
        let tags = response
            .tags
            .split_whitespace()
            .map(Tag::plain)
            .chain(response.artist.into_iter().map(|artist| Tag::new(Some("artist"), artist)))
            .collect();
        let details = Resolved {
            thumbnail_url: response.preview_url.unwrap_or_else(|| response.file_url.clone()),
            image_url: response.file_url,
            tags,
        };
        let dimensions = response.width.zip(response.height).map(|(width, height)| Dimensions { width, height });
        Some(
            Post::new(self.identity.id, response.id, created_at, response.file_size, mime, details)
                .with_dimensions(dimensions),
        )
    }
}

#[async_trait]
impl Booru for PagedBooru {
    fn identity(&self) -> &Identity {
        &self.identity
    }

    #[instrument(skip(self), fields(source = %self.identity.name), level = "debug")]
    async fn search(&self, tags: &[String], offset: &Offset) -> Result<Vec<Post>> {
        let url = request::endpoint(&self.base, &["post", "index.json"])?;
        let mut query = vec![("limit", self.limit.to_string())];
        if !tags.is_empty() {
            query.push(("tags", tags.join(" ")));
        }
        if let Offset::Page(page) = offset {
            query.push(("page", (u64::from(*page) + 1).to_string()));
        }
        let posts: Vec<PostResponse> = request::fetch_json(self.client.get(url).query(&query)).await?;
        let posts: Vec<Post> = posts.into_iter().filter_map(|post| self.post(post)).collect();
        debug!(count = posts.len(), "search complete");
        Ok(posts)
    }
}
