use reqwest::Client;
use tokio::sync::OnceCell;
use url::Url;

use crate::error::CatalogError;
use crate::matching::{CandidateRef, CandidateTrack};
use crate::plex_rs::playlist::{
    add_items, clear_playlist, create_audio_playlist, delete_playlist, edit_summary,
    get_audio_playlists, get_machine_identifier, is_audio_playlist, library_items_uri,
    upload_poster_from_url,
};
use crate::plex_rs::search::search_tracks;
use crate::ports::plex::{PlaylistHandle, PlexCatalog};

/// Rating keys sent per playlist request, keeps the uri a sane length.
const ITEMS_PER_REQUEST: usize = 100;

pub struct PlexHttpAdapter {
    client: Client,
    server_url: Url,
    token: String,
    machine_identifier: OnceCell<String>,
}

impl PlexHttpAdapter {
    pub fn new(server_url: Url, token: String) -> Self {
        Self {
            client: Client::new(),
            server_url,
            token,
            machine_identifier: OnceCell::new(),
        }
    }

    async fn machine_identifier(&self) -> Result<&str, CatalogError> {
        let id = self
            .machine_identifier
            .get_or_try_init(|| get_machine_identifier(&self.client, &self.server_url, &self.token))
            .await?;
        Ok(id.as_str())
    }

    async fn item_uris(&self, items: &[CandidateRef]) -> Result<Vec<String>, CatalogError> {
        let machine_identifier = self.machine_identifier().await?;
        Ok(chunk_item_uris(machine_identifier, items))
    }
}

/// One library uri per [`ITEMS_PER_REQUEST`] items, in item order.
fn chunk_item_uris(machine_identifier: &str, items: &[CandidateRef]) -> Vec<String> {
    items
        .chunks(ITEMS_PER_REQUEST)
        .map(|chunk| {
            let keys: Vec<&str> = chunk.iter().map(CandidateRef::as_str).collect();
            library_items_uri(machine_identifier, &keys)
        })
        .collect()
}

#[async_trait::async_trait]
impl PlexCatalog for PlexHttpAdapter {
    async fn server_identity(&self) -> Result<String, CatalogError> {
        get_machine_identifier(&self.client, &self.server_url, &self.token).await
    }

    async fn search_tracks(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<CandidateTrack>, CatalogError> {
        let tracks =
            search_tracks(&self.client, &self.server_url, &self.token, query, limit).await?;
        Ok(tracks
            .into_iter()
            .take(limit as usize)
            .map(CandidateTrack::from)
            .collect())
    }

    async fn get_playlist(&self, name: &str) -> Result<Option<PlaylistHandle>, CatalogError> {
        let playlists = get_audio_playlists(&self.client, &self.server_url, &self.token).await?;
        Ok(playlists
            .into_iter()
            .filter(is_audio_playlist)
            .find(|p| p.title == name)
            .map(|p| PlaylistHandle {
                rating_key: p.rating_key,
                title: p.title,
            }))
    }

    async fn create_playlist(
        &self,
        name: &str,
        items: &[CandidateRef],
    ) -> Result<PlaylistHandle, CatalogError> {
        let uris = self.item_uris(items).await?;
        let mut uris = uris.iter();

        let created = create_audio_playlist(
            &self.client,
            &self.server_url,
            &self.token,
            name,
            uris.next().map(String::as_str),
        )
        .await?;

        for uri in uris {
            add_items(
                &self.client,
                &self.server_url,
                &self.token,
                &created.rating_key,
                uri,
            )
            .await?;
        }

        Ok(PlaylistHandle {
            rating_key: created.rating_key,
            title: created.title,
        })
    }

    async fn replace_items(
        &self,
        playlist: &PlaylistHandle,
        items: &[CandidateRef],
    ) -> Result<(), CatalogError> {
        clear_playlist(
            &self.client,
            &self.server_url,
            &self.token,
            &playlist.rating_key,
        )
        .await?;
        self.add_items(playlist, items).await
    }

    async fn add_items(
        &self,
        playlist: &PlaylistHandle,
        items: &[CandidateRef],
    ) -> Result<(), CatalogError> {
        for uri in self.item_uris(items).await? {
            add_items(
                &self.client,
                &self.server_url,
                &self.token,
                &playlist.rating_key,
                &uri,
            )
            .await?;
        }
        Ok(())
    }

    async fn delete_playlist(&self, playlist: &PlaylistHandle) -> Result<(), CatalogError> {
        delete_playlist(
            &self.client,
            &self.server_url,
            &self.token,
            &playlist.rating_key,
        )
        .await
    }

    async fn set_description(
        &self,
        playlist: &PlaylistHandle,
        text: &str,
    ) -> Result<(), CatalogError> {
        edit_summary(
            &self.client,
            &self.server_url,
            &self.token,
            &playlist.rating_key,
            text,
        )
        .await
    }

    async fn set_artwork(&self, playlist: &PlaylistHandle, url: &str) -> Result<(), CatalogError> {
        upload_poster_from_url(
            &self.client,
            &self.server_url,
            &self.token,
            &playlist.rating_key,
            url,
        )
        .await
    }
}
