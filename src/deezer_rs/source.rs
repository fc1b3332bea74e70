use color_eyre::Result;

use crate::deezer_rs::client::DeezerClient;
use crate::deezer_rs::types::{DeezerPlaylist, DeezerTrack};
use crate::matching::TargetTrack;
use crate::ports::source::{PlaylistSource, SourcePlaylist, non_empty, service_suffix};

/// Public playlists of a Deezer user plus any explicitly listed playlists.
pub struct DeezerSource {
    client: DeezerClient,
    user_id: Option<String>,
    playlist_ids: Vec<String>,
    append_suffix: bool,
}

impl DeezerSource {
    pub fn new(
        client: reqwest::Client,
        user_id: Option<String>,
        playlist_ids: Vec<String>,
        append_suffix: bool,
    ) -> Self {
        Self {
            client: DeezerClient::new(client),
            user_id,
            playlist_ids,
            append_suffix,
        }
    }
}

/// `DEEZER_PLAYLIST_ID` holds whitespace separated ids.
pub fn parse_playlist_ids(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

#[async_trait::async_trait]
impl PlaylistSource for DeezerSource {
    fn service_name(&self) -> &'static str {
        "Deezer"
    }

    async fn playlists(&self) -> Result<Vec<SourcePlaylist>> {
        let mut playlists = Vec::new();

        if let Some(user_id) = &self.user_id {
            playlists.extend(self.client.get_user_playlists(user_id).await?);
        }

        for id in &self.playlist_ids {
            if playlists.iter().any(|p| p.id.to_string() == *id) {
                continue;
            }
            playlists.push(self.client.get_playlist(id).await?);
        }

        Ok(playlists
            .into_iter()
            .map(|p| to_source_playlist(p, self.append_suffix))
            .collect())
    }

    async fn playlist_tracks(&self, playlist: &SourcePlaylist) -> Result<Vec<TargetTrack>> {
        let tracks = self.client.get_playlist_tracks(&playlist.id).await?;
        Ok(tracks.into_iter().map(to_target_track).collect())
    }
}

fn to_source_playlist(playlist: DeezerPlaylist, append_suffix: bool) -> SourcePlaylist {
    SourcePlaylist {
        id: playlist.id.to_string(),
        name: format!(
            "{}{}",
            playlist.title,
            service_suffix("Deezer", append_suffix)
        ),
        description: non_empty(playlist.description),
        poster: non_empty(playlist.picture_big),
    }
}

fn to_target_track(track: DeezerTrack) -> TargetTrack {
    TargetTrack::new(track.title, track.artist.name, track.album.title, track.link)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_playlist_ids() {
        assert_eq!(parse_playlist_ids(" 123  456\n789 "), vec!["123", "456", "789"]);
        assert!(parse_playlist_ids("").is_empty());
    }

    #[test]
    fn test_to_source_playlist() {
        let playlist: DeezerPlaylist = serde_json::from_str(
            r#"{"id": 908622995, "title": "Electro", "description": "",
                "picture_big": "https://e-cdns-images.dzcdn.net/images/playlist/x/500x500.jpg"}"#,
        )
        .unwrap();

        let source = to_source_playlist(playlist, true);
        assert_eq!(source.id, "908622995");
        assert_eq!(source.name, "Electro - Deezer");
        assert!(source.description.is_none());
        assert!(source.poster.is_some());
    }

    #[test]
    fn test_to_target_track() {
        let track: DeezerTrack = serde_json::from_str(
            r#"{"title": "One More Time", "link": "https://www.deezer.com/track/3135553",
                "artist": {"name": "Daft Punk"}, "album": {"title": "Discovery"}}"#,
        )
        .unwrap();

        let target = to_target_track(track);
        assert_eq!(target.title, "One More Time");
        assert_eq!(target.artist, "Daft Punk");
        assert_eq!(target.album, "Discovery");
        assert_eq!(target.url.as_deref(), Some("https://www.deezer.com/track/3135553"));
    }
}
