use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::error::CatalogError;
use crate::plex_rs::{PlexResponse, endpoint, send, send_json};

/* ---------- Identity (machineIdentifier) ---------- */

#[derive(Debug, Clone, Deserialize)]
pub struct PlexIdentityResponse {
    #[serde(rename = "MediaContainer")]
    pub media_container: PlexIdentity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlexIdentity {
    #[serde(rename = "machineIdentifier")]
    pub machine_identifier: String,
}

pub async fn get_machine_identifier(
    client: &Client,
    base_url: &Url,
    user_token: &str,
) -> Result<String, CatalogError> {
    let url = endpoint(base_url, "identity")?;
    let res: PlexIdentityResponse = send_json(client.get(url), user_token).await?;
    Ok(res.media_container.machine_identifier)
}

/* ---------- Playlists ---------- */

#[derive(Debug, Clone, Deserialize)]
pub struct PlexPlaylist {
    #[serde(rename = "ratingKey")]
    pub rating_key: String,

    pub title: String,

    #[serde(rename = "playlistType", default)]
    pub playlist_type: Option<String>,

    #[serde(default)]
    pub smart: Option<bool>,

    #[serde(rename = "leafCount", default)]
    pub leaf_count: Option<u32>,

    #[serde(default)]
    pub summary: Option<String>,
}

pub async fn get_audio_playlists(
    client: &Client,
    base_url: &Url,
    user_token: &str,
) -> Result<Vec<PlexPlaylist>, CatalogError> {
    let url = endpoint(base_url, "playlists?playlistType=audio")?;
    let res: PlexResponse<PlexPlaylist> = send_json(client.get(url), user_token).await?;
    Ok(res.media_container.metadata)
}

/// Library item uri understood by the playlist endpoints.
///
/// Several rating keys may be joined with commas to address many tracks in
/// one request.
pub fn library_items_uri(machine_identifier: &str, rating_keys: &[&str]) -> String {
    format!(
        "server://{}/com.plexapp.plugins.library/library/metadata/{}",
        machine_identifier,
        rating_keys.join(",")
    )
}

/* ---------- Create playlist ---------- */

pub async fn create_audio_playlist(
    client: &Client,
    base_url: &Url,
    user_token: &str,
    title: &str,
    items_uri: Option<&str>,
) -> Result<PlexPlaylist, CatalogError> {
    let mut url = endpoint(base_url, "playlists")?;
    url.query_pairs_mut()
        .append_pair("title", title)
        .append_pair("type", "audio")
        .append_pair("smart", "0");
    if let Some(items_uri) = items_uri {
        url.query_pairs_mut().append_pair("uri", items_uri);
    }

    let res: PlexResponse<PlexPlaylist> = send_json(client.post(url), user_token).await?;

    res.media_container
        .metadata
        .into_iter()
        .next()
        .ok_or_else(|| CatalogError::Unexpected("Create playlist response had no Metadata".into()))
}

/* ---------- Items ---------- */

pub async fn add_items(
    client: &Client,
    base_url: &Url,
    user_token: &str,
    playlist_id: &str,
    items_uri: &str,
) -> Result<(), CatalogError> {
    let mut url = endpoint(base_url, &format!("playlists/{}/items", playlist_id))?;
    url.query_pairs_mut().append_pair("uri", items_uri);

    send(client.put(url), user_token).await?;
    Ok(())
}

pub async fn clear_playlist(
    client: &Client,
    base_url: &Url,
    user_token: &str,
    playlist_id: &str,
) -> Result<(), CatalogError> {
    let url = endpoint(base_url, &format!("playlists/{}/items", playlist_id))?;
    send(client.delete(url), user_token).await?;
    Ok(())
}

pub async fn delete_playlist(
    client: &Client,
    base_url: &Url,
    user_token: &str,
    playlist_id: &str,
) -> Result<(), CatalogError> {
    let url = endpoint(base_url, &format!("playlists/{}", playlist_id))?;
    send(client.delete(url), user_token).await?;
    Ok(())
}

/* ---------- Metadata ---------- */

pub async fn edit_summary(
    client: &Client,
    base_url: &Url,
    user_token: &str,
    playlist_id: &str,
    summary: &str,
) -> Result<(), CatalogError> {
    let mut url = endpoint(base_url, &format!("playlists/{}", playlist_id))?;
    url.query_pairs_mut().append_pair("summary", summary);

    send(client.put(url), user_token).await?;
    Ok(())
}

/// Have the server download a poster from `poster_url`.
pub async fn upload_poster_from_url(
    client: &Client,
    base_url: &Url,
    user_token: &str,
    playlist_id: &str,
    poster_url: &str,
) -> Result<(), CatalogError> {
    let mut url = endpoint(base_url, &format!("playlists/{}/posters", playlist_id))?;
    url.query_pairs_mut().append_pair("url", poster_url);

    send(client.post(url), user_token).await?;
    Ok(())
}

pub fn is_audio_playlist(p: &PlexPlaylist) -> bool {
    p.playlist_type.as_deref() == Some("audio") && !p.smart.unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_items_uri() {
        assert_eq!(
            library_items_uri("abc123", &["1", "22", "333"]),
            "server://abc123/com.plexapp.plugins.library/library/metadata/1,22,333"
        );
    }

    #[test]
    fn test_parse_playlists() {
        let json = r#"{
            "MediaContainer": {
                "size": 2,
                "Metadata": [
                    {"ratingKey": "100", "title": "Mix - Spotify", "playlistType": "audio", "smart": false, "leafCount": 12},
                    {"ratingKey": "101", "title": "All Music", "playlistType": "audio", "smart": true}
                ]
            }
        }"#;
        let res: PlexResponse<PlexPlaylist> = serde_json::from_str(json).unwrap();
        let playlists = res.media_container.metadata;

        assert_eq!(playlists.len(), 2);
        assert!(is_audio_playlist(&playlists[0]));
        assert!(!is_audio_playlist(&playlists[1]));
    }

    #[test]
    fn test_parse_identity() {
        let json = r#"{"MediaContainer": {"size": 0, "machineIdentifier": "abc", "version": "1.40"}}"#;
        let res: PlexIdentityResponse = serde_json::from_str(json).unwrap();
        assert_eq!(res.media_container.machine_identifier, "abc");
    }
}
