use crate::error::CandidateError;

/// A track from a source playlist that should exist on the Plex server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetTrack {
    pub title: String,
    pub artist: String,
    pub album: String,
    /// Link back to the track on the streaming service, when known.
    pub url: Option<String>,
}

impl TargetTrack {
    pub fn new(
        title: impl Into<String>,
        artist: impl Into<String>,
        album: impl Into<String>,
        url: Option<String>,
    ) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            album: album.into(),
            url,
        }
    }
}

/// One search hit from the Plex library.
///
/// Plex omits the parent/grandparent titles for some malformed entries, so
/// artist and album are only reachable through fallible accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateTrack {
    pub rating_key: String,
    pub title: String,
    artist: Option<String>,
    album: Option<String>,
}

impl CandidateTrack {
    pub fn new(
        rating_key: impl Into<String>,
        title: impl Into<String>,
        artist: Option<String>,
        album: Option<String>,
    ) -> Self {
        Self {
            rating_key: rating_key.into(),
            title: title.into(),
            artist,
            album,
        }
    }

    pub fn artist(&self) -> Result<&str, CandidateError> {
        self.artist
            .as_deref()
            .ok_or_else(|| CandidateError::MissingField {
                field: "artist",
                rating_key: self.rating_key.clone(),
            })
    }

    pub fn album(&self) -> Result<&str, CandidateError> {
        self.album
            .as_deref()
            .ok_or_else(|| CandidateError::MissingField {
                field: "album",
                rating_key: self.rating_key.clone(),
            })
    }

    /// The opaque reference used to add this track to a playlist.
    pub fn reference(&self) -> CandidateRef {
        CandidateRef(self.rating_key.clone())
    }
}

/// Plex rating key of a library track.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CandidateRef(pub String);

impl CandidateRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CandidateRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of matching one target track against its candidate pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    Matched(CandidateRef),
    Unmatched,
}
