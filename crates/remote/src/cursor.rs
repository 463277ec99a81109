use crate::request;
use async_trait::async_trait;
use b2_booru::error::{ErrorKind, Result};
use b2_booru::{Booru, Dimensions, Identity, Mime, Offset, PaginationType, Post, Resolved, Tag};
use exn::OptionExt;
use reqwest::Client;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use std::collections::BTreeMap;
use time::OffsetDateTime;
use tracing::{debug, instrument};
use url::Url;

/// Namespace the API uses for tags that have none.
const GENERAL: &str = "general";

#[derive(Debug, Deserialize)]
struct PostsResponse {
    posts: Vec<PostResponse>,
}

#[derive(Debug, Deserialize)]
struct PostResponse {
    id: i64,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
    file: FileResponse,
    #[serde(default)]
    preview: PreviewResponse,
    #[serde(default)]
    tags: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct FileResponse {
    ext: String,
    size: u64,
    md5: Option<String>,
    url: Option<Url>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct PreviewResponse {
    url: Option<Url>,
}

/// Login and API key, sent as HTTP basic authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub login: String,
    pub api_key: String,
}

/// Booru with a `/posts.json` API that can page by number or by cursor.
///
/// Cursor pagination asks for everything below the lowest post ID of the
/// previous chunk, so results stay stable while new posts are uploaded.
///
/// Anonymous requests may get posts without media URLs. Those are rebuilt
/// from the file's MD5 using the layout of the API host's static server,
/// which only holds for that host.
#[derive(Debug)]
pub struct CursorBooru {
    identity: Identity,
    client: Client,
    base: Url,
    host: String,
    limit: u32,
    credentials: Option<Credentials>,
}

impl CursorBooru {
    pub fn new(
        name: impl Into<String>,
        human_name: impl Into<String>,
        base: Url,
        limit: u32,
        credentials: Option<Credentials>,
    ) -> Result<Self> {
        request::validate_base(&base)?;
        let host = base.host_str().ok_or_raise(|| ErrorKind::InvalidEndpoint(base.to_string()))?.to_string();
        Ok(Self {
            identity: Identity::new(name, human_name, [PaginationType::Pages, PaginationType::RelativeToLowestId]),
            client: request::client(HeaderMap::new())?,
            base,
            host,
            limit,
            credentials,
        })
    }

    fn post(&self, response: PostResponse) -> Option<Post> {
        let Some(mime) = Mime::from_extension(&response.file.ext) else {
            debug!(id = response.id, ext = %response.file.ext, "skipping post that can't be displayed");
            return None;
        };
        let md5 = response.file.md5.as_deref();
        let image_url =
            response.file.url.clone().or_else(|| synthesize_url(&self.host, md5?, &response.file.ext, false));
        let thumbnail_url =
            response.preview.url.clone().or_else(|| synthesize_url(&self.host, md5?, "jpg", true));
        let (Some(image_url), Some(thumbnail_url)) = (image_url, thumbnail_url) else {
            debug!(id = response.id, "skipping post without a locatable file");
            return None;
        };
        let tags = response
            .tags
            .into_iter()
            .flat_map(|(namespace, subtags)| {
                let namespace = (namespace != GENERAL).then_some(namespace);
                subtags.into_iter().map(move |subtag| Tag::new(namespace.clone(), subtag))
            })
            .collect();
        let dimensions =
            response.file.width.zip(response.file.height).map(|(width, height)| Dimensions { width, height });
        let details = Resolved { image_url, thumbnail_url, tags };
        Some(
            Post::new(self.identity.id, response.id, response.created_at, response.file.size, mime, details)
                .with_dimensions(dimensions),
        )
    }
}

/// Rebuild a media URL from an MD5: `https://static1.<host>/data/[preview/]<ab>/<cd>/<md5>.<ext>`.
fn synthesize_url(host: &str, md5: &str, ext: &str, preview: bool) -> Option<Url> {
    let (first, second) = (md5.get(..2)?, md5.get(2..4)?);
    let preview = if preview { "preview/" } else { "" };
    Url::parse(&format!("https://static1.{host}/data/{preview}{first}/{second}/{md5}.{ext}")).ok()
}

#[async_trait]
impl Booru for CursorBooru {
    fn identity(&self) -> &Identity {
        &self.identity
    }

    #[instrument(skip(self, offset), fields(source = %self.identity.name), level = "debug")]
    async fn search(&self, tags: &[String], offset: &Offset) -> Result<Vec<Post>> {
        let url = request::endpoint(&self.base, &["posts.json"])?;
        let mut query = vec![("limit", self.limit.to_string())];
        if !tags.is_empty() {
            query.push(("tags", tags.join(" ")));
        }
        match offset {
            Offset::Page(page) => query.push(("page", (u64::from(*page) + 1).to_string())),
            Offset::PreviousChunk(_) => {
                if let Some(lowest) = offset.lowest_id() {
                    query.push(("page", format!("b{lowest}")));
                }
            },
            Offset::None => {},
        }
        let mut request = self.client.get(url).query(&query);
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.login, Some(&credentials.api_key));
        }
        let response: PostsResponse = request::fetch_json(request).await?;
        let posts: Vec<Post> = response.posts.into_iter().filter_map(|post| self.post(post)).collect();
        debug!(count = posts.len(), "search complete");
        Ok(posts)
    }
}
