use std::time::Duration;

use color_eyre::Result;
use serde::Deserialize;

use crate::spotify_rs::types::{SpotifyPlaylist, SpotifyTrack};

const SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";

/// Spotify API client
pub struct SpotifyClient {
    access_token: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct Page<T> {
    items: Vec<T>,
    next: Option<String>,
}

#[derive(Deserialize)]
struct PlaylistTrackObject {
    track: Option<SpotifyTrack>,
}

impl SpotifyClient {
    pub fn new(client: reqwest::Client, access_token: String) -> Self {
        Self {
            access_token,
            client,
        }
    }

    /// Get all playlists for the current user
    pub async fn get_user_playlists(&self) -> Result<Vec<SpotifyPlaylist>> {
        self.get_all(format!("{}/me/playlists?limit=50", SPOTIFY_API_URL))
            .await
    }

    /// Get all tracks in a playlist. Removed and local-only entries come
    /// back as `null` and are skipped.
    pub async fn get_playlist_tracks(&self, playlist_id: &str) -> Result<Vec<SpotifyTrack>> {
        let items: Vec<PlaylistTrackObject> = self
            .get_all(format!(
                "{}/playlists/{}/tracks?limit=100",
                SPOTIFY_API_URL, playlist_id
            ))
            .await?;
        Ok(items.into_iter().filter_map(|item| item.track).collect())
    }

    /// Follow `next` links until the last page.
    async fn get_all<T>(&self, first_url: String) -> Result<Vec<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        let mut all_items = Vec::new();
        let mut next_url = Some(first_url);

        while let Some(url) = next_url {
            let response = self
                .client
                .get(&url)
                .bearer_auth(&self.access_token)
                .timeout(Duration::from_secs(10))
                .send()
                .await?
                .error_for_status()?;

            let page: Page<T> = response.json().await?;
            all_items.extend(page.items);
            next_url = page.next;
        }

        Ok(all_items)
    }
}
