use std::time::Duration;

use color_eyre::Result;
use serde::de::DeserializeOwned;

use crate::deezer_rs::types::{DeezerPage, DeezerPlaylist, DeezerResponse, DeezerTrack};

const DEEZER_API_URL: &str = "https://api.deezer.com";

/// Client for the public, unauthenticated Deezer API.
pub struct DeezerClient {
    client: reqwest::Client,
}

impl DeezerClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub async fn get_user_playlists(&self, user_id: &str) -> Result<Vec<DeezerPlaylist>> {
        self.get_all(format!("{}/user/{}/playlists", DEEZER_API_URL, user_id))
            .await
    }

    pub async fn get_playlist(&self, playlist_id: &str) -> Result<DeezerPlaylist> {
        self.get(&format!("{}/playlist/{}", DEEZER_API_URL, playlist_id))
            .await
    }

    pub async fn get_playlist_tracks(&self, playlist_id: &str) -> Result<Vec<DeezerTrack>> {
        self.get_all(format!("{}/playlist/{}/tracks", DEEZER_API_URL, playlist_id))
            .await
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .timeout(Duration::from_secs(10))
            .send()
            .await?
            .error_for_status()?;

        match response.json::<DeezerResponse<T>>().await? {
            DeezerResponse::Ok(value) => Ok(value),
            DeezerResponse::Error { error } => Err(error.into()),
        }
    }

    async fn get_all<T: DeserializeOwned>(&self, first_url: String) -> Result<Vec<T>> {
        let mut all_items = Vec::new();
        let mut next_url = Some(first_url);

        while let Some(url) = next_url {
            let page: DeezerPage<T> = self.get(&url).await?;
            all_items.extend(page.data);
            next_url = page.next;
        }

        Ok(all_items)
    }
}
