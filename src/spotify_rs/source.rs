use color_eyre::Result;

use crate::matching::TargetTrack;
use crate::ports::source::{PlaylistSource, SourcePlaylist, non_empty, service_suffix};
use crate::spotify_rs::auth::SpotifyAuthenticator;
use crate::spotify_rs::client::SpotifyClient;
use crate::spotify_rs::types::{SpotifyPlaylist, SpotifyTrack};

pub struct SpotifySource {
    client: reqwest::Client,
    auth: SpotifyAuthenticator,
    append_suffix: bool,
}

impl SpotifySource {
    pub fn new(client: reqwest::Client, auth: SpotifyAuthenticator, append_suffix: bool) -> Self {
        Self {
            client,
            auth,
            append_suffix,
        }
    }

    async fn api(&self) -> Result<SpotifyClient> {
        let token = self.auth.access_token().await?;
        Ok(SpotifyClient::new(self.client.clone(), token))
    }
}

#[async_trait::async_trait]
impl PlaylistSource for SpotifySource {
    fn service_name(&self) -> &'static str {
        "Spotify"
    }

    async fn playlists(&self) -> Result<Vec<SourcePlaylist>> {
        let playlists = self.api().await?.get_user_playlists().await?;
        Ok(playlists
            .into_iter()
            .map(|p| to_source_playlist(p, self.append_suffix))
            .collect())
    }

    async fn playlist_tracks(&self, playlist: &SourcePlaylist) -> Result<Vec<TargetTrack>> {
        let tracks = self.api().await?.get_playlist_tracks(&playlist.id).await?;
        Ok(tracks.into_iter().map(to_target_track).collect())
    }
}

fn to_source_playlist(playlist: SpotifyPlaylist, append_suffix: bool) -> SourcePlaylist {
    let poster = playlist
        .images
        .and_then(|images| images.into_iter().next())
        .map(|image| image.url);

    SourcePlaylist {
        name: format!(
            "{}{}",
            playlist.name,
            service_suffix("Spotify", append_suffix)
        ),
        id: playlist.id,
        description: non_empty(playlist.description),
        poster,
    }
}

fn to_target_track(track: SpotifyTrack) -> TargetTrack {
    let artist = track
        .artists
        .into_iter()
        .next()
        .map(|a| a.name)
        .unwrap_or_default();
    TargetTrack::new(track.name, artist, track.album.name, track.external_urls.spotify)
}
