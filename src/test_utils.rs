use std::sync::Mutex;

use crate::error::CatalogError;
use crate::matching::{CandidateRef, CandidateTrack};
use crate::ports::plex::{PlaylistHandle, PlexCatalog};
use crate::ports::source::SourcePlaylist;

#[derive(Debug, Clone)]
pub struct StoredPlaylist {
    pub handle: PlaylistHandle,
    pub items: Vec<String>,
    pub description: Option<String>,
    pub poster: Option<String>,
}

/// In-memory Plex library.
///
/// Search matches a track when either its title contains the query or the
/// query contains its title, case-insensitively, in library order.
pub struct FakeLibrary {
    tracks: Vec<CandidateTrack>,
    playlists: Mutex<Vec<StoredPlaylist>>,
    next_key: Mutex<u32>,
}

impl FakeLibrary {
    pub fn new(tracks: Vec<CandidateTrack>) -> Self {
        Self {
            tracks,
            playlists: Mutex::new(Vec::new()),
            next_key: Mutex::new(1000),
        }
    }

    pub fn with_playlist(self, title: &str, items: &[&str]) -> Self {
        let handle = self.new_handle(title);
        self.playlists.lock().unwrap().push(StoredPlaylist {
            handle,
            items: items.iter().map(|s| s.to_string()).collect(),
            description: None,
            poster: None,
        });
        self
    }

    pub fn playlist(&self, title: &str) -> Option<StoredPlaylist> {
        self.playlists
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.handle.title == title)
            .cloned()
    }

    pub fn playlist_count(&self) -> usize {
        self.playlists.lock().unwrap().len()
    }

    fn new_handle(&self, title: &str) -> PlaylistHandle {
        let mut next_key = self.next_key.lock().unwrap();
        *next_key += 1;
        PlaylistHandle {
            rating_key: next_key.to_string(),
            title: title.to_string(),
        }
    }

    fn update<F>(&self, playlist: &PlaylistHandle, f: F) -> Result<(), CatalogError>
    where
        F: FnOnce(&mut StoredPlaylist),
    {
        let mut playlists = self.playlists.lock().unwrap();
        let stored = playlists
            .iter_mut()
            .find(|p| p.handle.rating_key == playlist.rating_key)
            .ok_or_else(|| CatalogError::NotFound(playlist.rating_key.clone()))?;
        f(stored);
        Ok(())
    }
}

fn keys(items: &[CandidateRef]) -> Vec<String> {
    items.iter().map(|r| r.as_str().to_string()).collect()
}

#[async_trait::async_trait]
impl PlexCatalog for FakeLibrary {
    async fn server_identity(&self) -> Result<String, CatalogError> {
        Ok("fake-machine".to_string())
    }

    async fn search_tracks(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<CandidateTrack>, CatalogError> {
        let query = query.to_lowercase();
        Ok(self
            .tracks
            .iter()
            .filter(|t| {
                let title = t.title.to_lowercase();
                title.contains(&query) || query.contains(&title)
            })
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn get_playlist(&self, name: &str) -> Result<Option<PlaylistHandle>, CatalogError> {
        Ok(self.playlist(name).map(|p| p.handle))
    }

    async fn create_playlist(
        &self,
        name: &str,
        items: &[CandidateRef],
    ) -> Result<PlaylistHandle, CatalogError> {
        let handle = self.new_handle(name);
        self.playlists.lock().unwrap().push(StoredPlaylist {
            handle: handle.clone(),
            items: keys(items),
            description: None,
            poster: None,
        });
        Ok(handle)
    }

    async fn replace_items(
        &self,
        playlist: &PlaylistHandle,
        items: &[CandidateRef],
    ) -> Result<(), CatalogError> {
        self.update(playlist, |p| p.items = keys(items))
    }

    async fn add_items(
        &self,
        playlist: &PlaylistHandle,
        items: &[CandidateRef],
    ) -> Result<(), CatalogError> {
        self.update(playlist, |p| p.items.extend(keys(items)))
    }

    async fn delete_playlist(&self, playlist: &PlaylistHandle) -> Result<(), CatalogError> {
        let mut playlists = self.playlists.lock().unwrap();
        let before = playlists.len();
        playlists.retain(|p| p.handle.rating_key != playlist.rating_key);
        if playlists.len() == before {
            return Err(CatalogError::NotFound(playlist.rating_key.clone()));
        }
        Ok(())
    }

    async fn set_description(
        &self,
        playlist: &PlaylistHandle,
        text: &str,
    ) -> Result<(), CatalogError> {
        self.update(playlist, |p| p.description = Some(text.to_string()))
    }

    async fn set_artwork(&self, playlist: &PlaylistHandle, url: &str) -> Result<(), CatalogError> {
        self.update(playlist, |p| p.poster = Some(url.to_string()))
    }
}

pub fn source_playlist(name: &str) -> SourcePlaylist {
    SourcePlaylist {
        id: "pl-1".to_string(),
        name: name.to_string(),
        description: Some("Songs for the road".to_string()),
        poster: Some("https://img.example/cover.jpg".to_string()),
    }
}

pub fn track(rating_key: &str, title: &str, artist: &str, album: &str) -> CandidateTrack {
    CandidateTrack::new(
        rating_key,
        title,
        Some(artist.to_string()),
        Some(album.to_string()),
    )
}
