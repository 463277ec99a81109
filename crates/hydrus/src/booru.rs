use crate::db::Database;
use crate::error::{Error, ErrorKind, Result};
use crate::file::{FileRecord, FileRow, HydrusFile};
use crate::tags::{self, Namespaces};
use async_trait::async_trait;
use b2_booru::error::{Error as BooruError, ErrorKind as BooruErrorKind, Result as BooruResult};
use b2_booru::{Booru, Identity, Offset, PaginationType, Post, Tag};
use exn::{OptionExt, ResultExt};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Arc, Weak};
use tracing::{debug, info, instrument, trace, warn};

const ALL_LOCAL_FILES: &str = "all local files";

/// Report a backend failure to callers as a failed query.
fn query_failed(err: Error) -> BooruError {
    warn!(retryable = err.is_retryable(), error = %*err, "hydrus query failed");
    err.raise(BooruErrorKind::QueryFailed)
}

/// Statements that name the tag service's mapping table, which is only
/// known once the database is open.
#[derive(Debug)]
struct Queries {
    search: String,
    file_tags: String,
}
impl Queries {
    fn for_tag_service(service_id: i64) -> Self {
        let table = format!("current_mappings_{service_id}");
        Self {
            search: include_str!("../queries/search_by_tags.sql").replace("{mappings}", &table),
            file_tags: include_str!("../queries/file_tags.sql").replace("{mappings}", &table),
        }
    }
}

/// Everything a [`HydrusFile`] may need to reach back for.
#[derive(Debug)]
pub(crate) struct Shared {
    identity: Identity,
    pub(crate) db: Database,
    file_service: Option<i64>,
    namespaces: Namespaces,
    queries: Queries,
}

impl Shared {
    /// Tags mapped to a file in the local tag service.
    pub(crate) async fn file_tags(&self, hash_id: i64) -> Result<Vec<Tag>> {
        let rows: Vec<(i64, String)> = sqlx::query_as(&self.queries.file_tags)
            .bind(hash_id)
            .fetch_all(self.db.pool())
            .await
            .or_raise(|| ErrorKind::Database)?;
        trace!(hash_id, count = rows.len(), "resolved file tags");
        Ok(rows.into_iter().map(|(namespace_id, subtag)| self.namespaces.tag(namespace_id, subtag)).collect())
    }

    /// Turn file rows into posts, dropping rows that are inconsistent or
    /// can't be displayed.
    fn posts(self: &Arc<Self>, rows: Vec<FileRow>) -> Vec<Post> {
        let owner = Arc::downgrade(self);
        rows.into_iter()
            .filter_map(|row| {
                let hash_id = row.hash_id;
                let record = match FileRecord::try_from(row) {
                    Ok(record) => record,
                    Err(err) => {
                        warn!(hash_id, error = %*err, "dropping inconsistent file");
                        return None;
                    },
                };
                let Some(mime) = record.mime.display_mime() else {
                    trace!(hash_id, mime = ?record.mime, "skipping file that can't be displayed");
                    return None;
                };
                let details = HydrusFile::new(&record, Weak::clone(&owner));
                let post = Post::new(self.identity.id, hash_id, record.created_at, record.size, mime, details)
                    .with_dimensions(record.dimensions);
                Some(post)
            })
            .collect()
    }
}

/// Booru backed by a local Hydrus client database.
///
/// Opens the four database files read-only and answers searches against the
/// local tag service. Every file the "all local files" service knows about is
/// listed, newest first; there is no pagination.
#[derive(Debug, Clone)]
pub struct HydrusBooru {
    inner: Arc<Shared>,
}

impl HydrusBooru {
    /// Open the database in directory `path`.
    ///
    /// Fails if any of the database files is missing or if the local tag
    /// service can't be found, since no search could work without it.
    #[instrument(skip(name, human_name), level = "debug")]
    pub async fn open(name: impl Into<String>, human_name: impl Into<String>, path: &Path) -> Result<Self> {
        let db = Database::open(path).await?;
        let mut conn = db.pool().acquire().await.or_raise(|| ErrorKind::Database)?;
        let tag_service: Option<i64> = sqlx::query_scalar(include_str!("../queries/find_tag_service.sql"))
            .fetch_optional(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let tag_service = tag_service.ok_or_raise(|| ErrorKind::ServiceNotFound("local tags".to_string()))?;
        let file_service: Option<i64> = sqlx::query_scalar(include_str!("../queries/find_service_by_name.sql"))
            .bind(ALL_LOCAL_FILES)
            .fetch_optional(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        if file_service.is_none() {
            warn!(service = ALL_LOCAL_FILES, "service not found, initial listing will be empty");
        }
        let namespaces = Namespaces::load(&mut conn).await?;
        drop(conn);
        info!(tag_service, namespaces = namespaces.len(), "loaded hydrus database");

        let identity = Identity::new(name, human_name, [PaginationType::None]);
        let inner = Shared { identity, db, file_service, namespaces, queries: Queries::for_tag_service(tag_service) };
        Ok(Self { inner: Arc::new(inner) })
    }

    async fn all_files(&self) -> Result<Vec<Post>> {
        let Some(service) = self.inner.file_service else {
            debug!(service = ALL_LOCAL_FILES, "no file service, nothing to list");
            return Ok(Vec::new());
        };
        let mut tx = self.inner.db.snapshot().await?;
        let rows: Vec<FileRow> = sqlx::query_as(include_str!("../queries/all_files.sql"))
            .bind(service)
            .fetch_all(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(self.inner.posts(rows))
    }

    async fn find(&self, tags: &[String]) -> Result<Vec<Post>> {
        if tags.is_empty() {
            return self.all_files().await;
        }
        let wanted: BTreeSet<String> = tags.iter().map(|tag| tags::normalize(tag)).collect();
        let mut tx = self.inner.db.snapshot().await?;
        let Some(tag_ids) = tags::lookup_ids(&mut tx, &wanted).await? else {
            debug!(?tags, "search includes an unknown tag, no matches");
            return Ok(Vec::new());
        };
        let count = i64::try_from(tag_ids.len()).or_raise(|| ErrorKind::InvalidData("tag count"))?;
        let tag_ids = serde_json::to_string(&tag_ids).or_raise(|| ErrorKind::InvalidData("tag ids"))?;
        let rows: Vec<FileRow> = sqlx::query_as(&self.inner.queries.search)
            .bind(tag_ids)
            .bind(count)
            .fetch_all(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(self.inner.posts(rows))
    }
}

#[async_trait]
impl Booru for HydrusBooru {
    fn identity(&self) -> &Identity {
        &self.inner.identity
    }

    #[instrument(skip(self), fields(source = %self.inner.identity.name), level = "debug")]
    async fn initial_posts(&self) -> BooruResult<Vec<Post>> {
        let posts = self.all_files().await.map_err(query_failed)?;
        debug!(count = posts.len(), "listed all files");
        Ok(posts)
    }

    #[instrument(skip(self, _offset), fields(source = %self.inner.identity.name), level = "debug")]
    async fn search(&self, tags: &[String], _offset: &Offset) -> BooruResult<Vec<Post>> {
        let posts = self.find(tags).await.map_err(query_failed)?;
        debug!(count = posts.len(), "search complete");
        Ok(posts)
    }
}
