use reqwest::{RequestBuilder, Response};
use serde::Deserialize;
use url::Url;

use crate::error::CatalogError;

pub mod playlist;
pub mod search;

/// Docs:
/// https://developer.plex.tv/pms/#section/API-Info/Authenticating-with-Plex
pub const PLEX_TOKEN_HEADER: &str = "X-Plex-Token";

/* ---------- Core response envelope ---------- */

#[derive(Debug, Clone, Deserialize)]
pub struct PlexResponse<T> {
    #[serde(rename = "MediaContainer")]
    pub media_container: PlexMediaContainer<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlexMediaContainer<T> {
    #[serde(default)]
    pub size: Option<u32>,

    #[serde(rename = "Metadata", default = "Vec::new")]
    pub metadata: Vec<T>,
}

/// Resolve `path` (which may carry a query) against the server url.
pub fn endpoint(base_url: &Url, path: &str) -> Result<Url, CatalogError> {
    Ok(base_url.join(path)?)
}

/// Send an authenticated request, mapping failures to [`CatalogError`].
pub async fn send(request: RequestBuilder, user_token: &str) -> Result<Response, CatalogError> {
    let response = request
        .header("Accept", "application/json")
        .header(PLEX_TOKEN_HEADER, user_token)
        .send()
        .await
        .map_err(CatalogError::Connection)?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to get error text".to_string());
    Err(CatalogError::from_status(status, body))
}

/// Send and deserialize the JSON body.
pub async fn send_json<T: serde::de::DeserializeOwned>(
    request: RequestBuilder,
    user_token: &str,
) -> Result<T, CatalogError> {
    send(request, user_token)
        .await?
        .json::<T>()
        .await
        .map_err(CatalogError::Decode)
}
