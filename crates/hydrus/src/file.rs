//! Files in the database and the posts built from them.

use crate::booru::Shared;
use crate::error::{Error, ErrorKind};
use crate::mime::HydrusMime;
use async_trait::async_trait;
use b2_booru::{Dimensions, PostDetails, Tag, placeholder_url};
use exn::{OptionExt, ResultExt};
use std::path::{Path, PathBuf};
use std::sync::Weak;
use time::OffsetDateTime;
use tokio::sync::OnceCell;
use tracing::{trace, warn};
use url::Url;

/// One row of a file query. Every column but the ID comes from a LEFT join
/// and is missing when the database is inconsistent.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct FileRow {
    pub hash_id: i64,
    pub hash: Option<Vec<u8>>,
    pub timestamp: Option<i64>,
    pub mime: Option<i64>,
    pub size: Option<i64>,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

/// A file whose cross-references all resolved.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FileRecord {
    pub hash_id: i64,
    /// Lowercase hex.
    pub hash: String,
    pub created_at: OffsetDateTime,
    pub mime: HydrusMime,
    pub size: u64,
    pub dimensions: Option<Dimensions>,
}
impl TryFrom<FileRow> for FileRecord {
    type Error = Error;
    fn try_from(row: FileRow) -> Result<Self, Self::Error> {
        let hash = row.hash.ok_or_raise(|| ErrorKind::InvalidData("hash"))?;
        let timestamp = row.timestamp.ok_or_raise(|| ErrorKind::InvalidData("timestamp"))?;
        let mime = row.mime.ok_or_raise(|| ErrorKind::InvalidData("metadata"))?;
        let size = row.size.ok_or_raise(|| ErrorKind::InvalidData("metadata"))?;
        let dimensions = match (row.width, row.height) {
            (Some(width), Some(height)) => match (u32::try_from(width), u32::try_from(height)) {
                (Ok(width), Ok(height)) => Some(Dimensions { width, height }),
                _ => None,
            },
            _ => None,
        };
        Ok(Self {
            hash_id: row.hash_id,
            hash: hex::encode(hash),
            created_at: OffsetDateTime::from_unix_timestamp(timestamp)
                .or_raise(|| ErrorKind::InvalidData("timestamp"))?,
            mime: HydrusMime::from_code(mime),
            size: u64::try_from(size).or_raise(|| ErrorKind::InvalidData("size"))?,
            dimensions,
        })
    }
}

/// Which copy of a file to locate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Asset {
    Original,
    Thumbnail,
}

/// Where a file's asset lives: `client_files/<f|t><first two hex>/<hash>.<ext>`.
///
/// Thumbnails always end in `.thumbnail`, whatever the original type.
pub(crate) fn asset_path(base: &Path, hash: &str, mime: HydrusMime, asset: Asset) -> PathBuf {
    let prefix = hash.get(..2).unwrap_or(hash);
    let (shard, name) = match asset {
        Asset::Original => (format!("f{prefix}"), format!("{hash}.{}", mime.extension())),
        Asset::Thumbnail => (format!("t{prefix}"), format!("{hash}.thumbnail")),
    };
    base.join("client_files").join(shard).join(name)
}

/// Post details that resolve against the database that produced them.
///
/// Holds its backend weakly: once the backend is gone, assets resolve to the
/// placeholder and tags to nothing.
#[derive(Debug)]
pub(crate) struct HydrusFile {
    hash_id: i64,
    hash: String,
    mime: HydrusMime,
    owner: Weak<Shared>,
    tags: OnceCell<Vec<Tag>>,
}

impl HydrusFile {
    pub fn new(record: &FileRecord, owner: Weak<Shared>) -> Self {
        Self {
            hash_id: record.hash_id,
            hash: record.hash.clone(),
            mime: record.mime,
            owner,
            tags: OnceCell::new(),
        }
    }

    fn url(&self, asset: Asset) -> Url {
        let Some(owner) = self.owner.upgrade() else {
            warn!(hash_id = self.hash_id, "file outlived its database, using placeholder");
            return placeholder_url();
        };
        let path = asset_path(owner.db.base(), &self.hash, self.mime, asset);
        Url::from_file_path(&path).unwrap_or_else(|()| placeholder_url())
    }
}

#[async_trait]
impl PostDetails for HydrusFile {
    fn image_url(&self) -> Url {
        self.url(Asset::Original)
    }

    fn thumbnail_url(&self) -> Url {
        self.url(Asset::Thumbnail)
    }

    async fn tags(&self) -> Vec<Tag> {
        if let Some(tags) = self.tags.get() {
            return tags.clone();
        }
        let Some(owner) = self.owner.upgrade() else {
            trace!(hash_id = self.hash_id, "file outlived its database, no tags");
            return Vec::new();
        };
        match self.tags.get_or_try_init(|| owner.file_tags(self.hash_id)).await {
            Ok(tags) => tags.clone(),
            Err(err) => {
                warn!(hash_id = self.hash_id, error = ?err, "could not resolve tags");
                Vec::new()
            },
        }
    }
}
