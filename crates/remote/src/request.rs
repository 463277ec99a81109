//! Plumbing shared by every remote booru.

use b2_booru::error::{ErrorKind, Result};
use exn::{Exn, ResultExt};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

pub(crate) const USER_AGENT: &str = concat!("b2/", env!("CARGO_PKG_VERSION"));

/// An HTTP client that asks for JSON and identifies itself, plus any
/// backend-specific headers.
pub(crate) fn client(mut headers: HeaderMap) -> Result<Client> {
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .build()
        .or_raise(|| ErrorKind::QueryFailed)
}

/// Check that a configured address can have API paths appended to it.
pub(crate) fn validate_base(base: &Url) -> Result<()> {
    if base.cannot_be_a_base() || base.host_str().is_none() {
        exn::bail!(ErrorKind::InvalidEndpoint(base.to_string()));
    }
    Ok(())
}

/// `base` with `segments` appended to its path.
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| Exn::from(ErrorKind::InvalidEndpoint(base.to_string())))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Send a request and decode its JSON body.
///
/// 401 and 403 mean the credentials are wrong; any other failure to get or
/// read a successful response is a failed query.
pub(crate) async fn fetch_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
    let response = request.send().await.or_raise(|| ErrorKind::QueryFailed)?;
    let status = response.status();
    debug!(url = %response.url(), %status, "received response");
    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        warn!(%status, "booru rejected credentials");
        exn::bail!(ErrorKind::InvalidCredentials);
    }
    let response = response.error_for_status().or_raise(|| ErrorKind::QueryFailed)?;
    let body = response.bytes().await.or_raise(|| ErrorKind::QueryFailed)?;
    serde_json::from_slice(&body).or_raise(|| ErrorKind::QueryFailed)
}
