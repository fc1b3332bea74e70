use crate::error::CatalogError;
use crate::matching::{CandidateRef, CandidateTrack};

/// A playlist that exists on the Plex server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistHandle {
    pub rating_key: String,
    pub title: String,
}

/// Port trait wrapping the Plex API capabilities used by the sync logic.
///
/// Implementations live in `services::plex::client` (production),
/// `services::retry` (retry decorator) or test mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PlexCatalog: Send + Sync {
    /// Cheap liveness probe, returns the server's machine identifier.
    async fn server_identity(&self) -> Result<String, CatalogError>;

    /// Full-text search over the music library, tracks only.
    async fn search_tracks(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<CandidateTrack>, CatalogError>;

    /// Look up an audio playlist by title. `Ok(None)` when it does not exist.
    async fn get_playlist(&self, name: &str) -> Result<Option<PlaylistHandle>, CatalogError>;

    async fn create_playlist(
        &self,
        name: &str,
        items: &[CandidateRef],
    ) -> Result<PlaylistHandle, CatalogError>;

    /// Clear the playlist, then add `items` in order.
    async fn replace_items(
        &self,
        playlist: &PlaylistHandle,
        items: &[CandidateRef],
    ) -> Result<(), CatalogError>;

    async fn add_items(
        &self,
        playlist: &PlaylistHandle,
        items: &[CandidateRef],
    ) -> Result<(), CatalogError>;

    async fn delete_playlist(&self, playlist: &PlaylistHandle) -> Result<(), CatalogError>;

    async fn set_description(
        &self,
        playlist: &PlaylistHandle,
        text: &str,
    ) -> Result<(), CatalogError>;

    async fn set_artwork(&self, playlist: &PlaylistHandle, url: &str) -> Result<(), CatalogError>;
}
