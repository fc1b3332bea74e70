use serde::Deserialize;

/// Deezer answers API errors with status 200 and an `error` object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum DeezerResponse<T> {
    Error { error: DeezerApiError },
    Ok(T),
}

#[derive(Debug, Clone, Deserialize, thiserror::Error)]
#[error("Deezer API error {code}: {message}")]
pub struct DeezerApiError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct DeezerPage<T> {
    pub data: Vec<T>,
    pub next: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeezerPlaylist {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub picture_big: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeezerTrack {
    pub title: String,
    #[serde(default)]
    pub link: Option<String>,
    pub artist: DeezerArtist,
    pub album: DeezerAlbum,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeezerArtist {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeezerAlbum {
    pub title: String,
}
