use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::error::CatalogError;
use crate::matching::CandidateTrack;
use crate::plex_rs::{endpoint, send_json};

/* ---------- Hub search ---------- */

#[derive(Debug, Clone, Deserialize)]
pub struct PlexHubSearchResponse {
    #[serde(rename = "MediaContainer")]
    pub media_container: PlexHubContainer,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlexHubContainer {
    #[serde(rename = "Hub", default)]
    pub hubs: Vec<PlexHub>,
}

/// One group of search results; `hub_type` is `track`, `album`, `artist`, ...
///
/// Entries of every hub are read leniently since only `track` hubs are used.
#[derive(Debug, Clone, Deserialize)]
pub struct PlexHub {
    #[serde(rename = "type")]
    pub hub_type: String,

    #[serde(rename = "Metadata", default)]
    pub metadata: Vec<PlexSearchTrack>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlexSearchTrack {
    #[serde(rename = "ratingKey", default)]
    pub rating_key: String,

    #[serde(default)]
    pub title: String,

    #[serde(rename = "grandparentTitle", default)]
    pub artist: Option<String>,

    #[serde(rename = "parentTitle", default)]
    pub album: Option<String>,
}

impl From<PlexSearchTrack> for CandidateTrack {
    fn from(track: PlexSearchTrack) -> Self {
        CandidateTrack::new(track.rating_key, track.title, track.artist, track.album)
    }
}

impl PlexHubSearchResponse {
    /// Tracks from the `track` hub, in server order.
    pub fn into_tracks(self) -> Vec<PlexSearchTrack> {
        self.media_container
            .hubs
            .into_iter()
            .filter(|hub| hub.hub_type == "track")
            .flat_map(|hub| hub.metadata)
            .collect()
    }
}

/// Search the library for tracks.
///
/// Endpoint
/// - `GET /hubs/search?query={query}&limit={limit}`
///
/// `limit` applies per hub, so at most `limit` tracks come back.
pub async fn search_tracks(
    client: &Client,
    base_url: &Url,
    user_token: &str,
    query: &str,
    limit: u32,
) -> Result<Vec<PlexSearchTrack>, CatalogError> {
    let mut url = endpoint(base_url, "hubs/search")?;
    url.query_pairs_mut()
        .append_pair("query", query)
        .append_pair("limit", &limit.to_string());

    let res: PlexHubSearchResponse = send_json(client.get(url), user_token).await?;
    Ok(res.into_tracks())
}
