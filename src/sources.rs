use crate::error::{self, ErrorKind, Result};
use b2_booru::{BooruHandle, NullBooru};
use b2_config::SourceConfig;
use b2_hydrus::HydrusBooru;
use b2_remote::{ClientApiBooru, Credentials, CursorBooru, PagedBooru};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Name used for the null source when nothing is configured.
pub const UNCONFIGURED: &str = "none";

/// Open a configured source.
#[instrument(skip(source), fields(kind = source.kind()))]
pub async fn open(name: &str, source: &SourceConfig) -> Result<BooruHandle> {
    let human_name = source.display_name().unwrap_or(name).to_string();
    let booru: BooruHandle = match source {
        SourceConfig::Hydrus { path, .. } => {
            let booru = HydrusBooru::open(name, human_name, path).await;
            Arc::new(booru.map_err(|err| err.raise(ErrorKind::Open(name.to_string())))?)
        },
        SourceConfig::Paged { url, limit, .. } => {
            Arc::new(PagedBooru::new(name, human_name, url.clone(), *limit).map_err(error::booru)?)
        },
        SourceConfig::Cursor { url, limit, login, api_key, .. } => {
            let credentials = login
                .clone()
                .zip(api_key.clone())
                .map(|(login, api_key)| Credentials { login, api_key });
            Arc::new(CursorBooru::new(name, human_name, url.clone(), *limit, credentials).map_err(error::booru)?)
        },
        SourceConfig::ClientApi { url, access_key, search_inbox, search_archive, .. } => Arc::new(
            ClientApiBooru::new(name, human_name, url.clone(), access_key.as_str(), *search_inbox, *search_archive)
                .map_err(error::booru)?,
        ),
        SourceConfig::None => Arc::new(NullBooru::new(name)),
    };
    debug!(id = %booru.identity().id, "opened source");
    Ok(booru)
}

/// The null source, for when there is nothing to browse.
pub fn unconfigured() -> BooruHandle {
    Arc::new(NullBooru::new(UNCONFIGURED))
}
