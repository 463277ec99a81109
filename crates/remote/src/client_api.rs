use crate::request;
use async_trait::async_trait;
use b2_booru::error::{ErrorKind, Result};
use b2_booru::{Booru, Dimensions, Identity, Mime, Offset, PaginationType, Post, Resolved, Tag};
use exn::ResultExt;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use time::OffsetDateTime;
use tracing::{debug, instrument};
use url::Url;

const ACCESS_KEY: &str = "Hydrus-Client-API-Access-Key";

/// Tag status for tags currently applied to a file.
const CURRENT: &str = "0";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    file_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
struct MetadataResponse {
    metadata: Vec<Metadata>,
}

#[derive(Debug, Deserialize)]
struct Metadata {
    file_id: i64,
    size: Option<u64>,
    mime: String,
    ext: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    /// Service name, then tag status, then display tags.
    #[serde(default)]
    service_names_to_statuses_to_display_tags: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl Metadata {
    fn mime(&self) -> Option<Mime> {
        Mime::from_mime_type(&self.mime)
            .or_else(|| self.ext.as_deref().and_then(|ext| Mime::from_extension(ext.trim_start_matches('.'))))
    }

    /// Current tags across every service, first occurrence wins.
    fn tags(&self) -> Vec<Tag> {
        let mut seen = HashSet::new();
        self.service_names_to_statuses_to_display_tags
            .values()
            .filter_map(|statuses| statuses.get(CURRENT))
            .flatten()
            .filter(|tag| seen.insert(*tag))
            .map(|tag| Tag::parse(tag))
            .collect()
    }
}

/// A running Hydrus client, searched through its client API.
///
/// Searching takes two requests: one for the matching file IDs and one for
/// their metadata. Media is served by the client itself, so every URL carries
/// the access key.
#[derive(Debug)]
pub struct ClientApiBooru {
    identity: Identity,
    client: Client,
    base: Url,
    access_key: String,
    search_inbox: bool,
    search_archive: bool,
}

impl ClientApiBooru {
    pub fn new(
        name: impl Into<String>,
        human_name: impl Into<String>,
        base: Url,
        access_key: impl Into<String>,
        search_inbox: bool,
        search_archive: bool,
    ) -> Result<Self> {
        request::validate_base(&base)?;
        let access_key = access_key.into();
        let mut value = HeaderValue::from_str(&access_key).or_raise(|| ErrorKind::InvalidCredentials)?;
        value.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static("hydrus-client-api-access-key"), value);
        Ok(Self {
            identity: Identity::new(name, human_name, [PaginationType::None]),
            client: request::client(headers)?,
            base,
            access_key,
            search_inbox,
            search_archive,
        })
    }

    fn asset_url(&self, asset: &str, file_id: i64) -> Result<Url> {
        let mut url = request::endpoint(&self.base, &["get_files", asset])?;
        url.query_pairs_mut().append_pair("file_id", &file_id.to_string()).append_pair(ACCESS_KEY, &self.access_key);
        Ok(url)
    }

    async fn file_ids(&self, tags: &[String]) -> Result<Vec<i64>> {
        // Spaces separate search terms, so tags are typed with underscores.
        let tags: Vec<String> = tags.iter().map(|tag| tag.replace('_', " ")).collect();
        let tags = serde_json::to_string(&tags).or_raise(|| ErrorKind::QueryFailed)?;
        let url = request::endpoint(&self.base, &["get_files", "search_files"])?;
        let query = [
            ("tags", tags),
            ("system_inbox", self.search_inbox.to_string()),
            ("system_archive", self.search_archive.to_string()),
        ];
        let response: SearchResponse = request::fetch_json(self.client.get(url).query(&query)).await?;
        Ok(response.file_ids)
    }

    async fn metadata(&self, file_ids: &[i64]) -> Result<Vec<Metadata>> {
        let file_ids = serde_json::to_string(file_ids).or_raise(|| ErrorKind::QueryFailed)?;
        let url = request::endpoint(&self.base, &["get_files", "file_metadata"])?;
        let response: MetadataResponse =
            request::fetch_json(self.client.get(url).query(&[("file_ids", file_ids)])).await?;
        Ok(response.metadata)
    }

    fn post(&self, metadata: Metadata) -> Result<Option<Post>> {
        let Some(mime) = metadata.mime() else {
            debug!(id = metadata.file_id, mime = %metadata.mime, "skipping file that can't be displayed");
            return Ok(None);
        };
        let details = Resolved {
            image_url: self.asset_url("file", metadata.file_id)?,
            thumbnail_url: self.asset_url("thumbnail", metadata.file_id)?,
            tags: metadata.tags(),
        };
        let dimensions = metadata.width.zip(metadata.height).map(|(width, height)| Dimensions { width, height });
        // The API doesn't report when a file was imported.
        let post = Post::new(
            self.identity.id,
            metadata.file_id,
            OffsetDateTime::UNIX_EPOCH,
            metadata.size.unwrap_or_default(),
            mime,
            details,
        );
        Ok(Some(post.with_dimensions(dimensions)))
    }
}

#[async_trait]
impl Booru for ClientApiBooru {
    fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Offsets are ignored: every search returns all matches at once.
    #[instrument(skip(self, _offset), fields(source = %self.identity.name), level = "debug")]
    async fn search(&self, tags: &[String], _offset: &Offset) -> Result<Vec<Post>> {
        let file_ids = self.file_ids(tags).await?;
        if file_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut posts = Vec::with_capacity(file_ids.len());
        for metadata in self.metadata(&file_ids).await? {
            posts.extend(self.post(metadata)?);
        }
        debug!(count = posts.len(), "search complete");
        Ok(posts)
    }
}
