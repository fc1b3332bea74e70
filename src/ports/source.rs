use color_eyre::eyre::Result;

use crate::matching::TargetTrack;

/// A playlist on a streaming service, decoupled from any one API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePlaylist {
    pub id: String,
    /// Name the Plex playlist will carry, service suffix included.
    pub name: String,
    pub description: Option<String>,
    /// Cover image url.
    pub poster: Option<String>,
}

/// Port trait for a streaming service whose playlists are mirrored to Plex.
///
/// Implementations live in `spotify_rs::source` and `deezer_rs::source`.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PlaylistSource: Send + Sync {
    fn service_name(&self) -> &'static str;

    async fn playlists(&self) -> Result<Vec<SourcePlaylist>>;

    async fn playlist_tracks(&self, playlist: &SourcePlaylist) -> Result<Vec<TargetTrack>>;
}

/// Suffix appended to playlist names so each service's copies stay apart.
pub fn service_suffix(service_name: &str, enabled: bool) -> String {
    if enabled {
        format!(" - {}", service_name)
    } else {
        String::new()
    }
}

/// Treat blank strings from the APIs as absent.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
