use std::fs;
use std::path::{Path, PathBuf};

use color_eyre::{Result, eyre::Context};

use crate::matching::TargetTrack;

/// Writes the tracks of a playlist that could not be found on Plex to
/// `<dir>/<playlist name>.csv`.
pub struct MissingTracksWriter {
    dir: PathBuf,
}

impl MissingTracksWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, playlist_name: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", sanitize_file_name(playlist_name)))
    }

    /// Write the csv, or remove an old one when nothing is missing any more.
    ///
    /// Failures are logged; a missing-tracks report never fails a sync.
    pub fn record(&self, playlist_name: &str, missing: &[TargetTrack]) {
        let result = if missing.is_empty() {
            self.delete_stale(playlist_name)
        } else {
            self.write(playlist_name, missing).map(|_| ())
        };

        if let Err(e) = result {
            log::error!(
                "Failed to record missing tracks for playlist '{}': {:?}",
                playlist_name,
                e
            );
        }
    }

    pub fn write(&self, playlist_name: &str, missing: &[TargetTrack]) -> Result<PathBuf> {
        let path = self.path_for(playlist_name);
        write_tracks_csv(&path, missing)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!(
            "Wrote {} missing tracks for playlist '{}' to {}",
            missing.len(),
            playlist_name,
            path.display()
        );
        Ok(path)
    }

    /// Remove the csv for `playlist_name` if there is one.
    pub fn delete_stale(&self, playlist_name: &str) -> Result<()> {
        let path = self.path_for(playlist_name);
        if !path.exists() {
            return Ok(());
        }
        fs::remove_file(&path)
            .with_context(|| format!("Failed to remove {}", path.display()))?;
        log::info!("Removed missing tracks file {}", path.display());
        Ok(())
    }
}

fn write_tracks_csv(path: &Path, tracks: &[TargetTrack]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .quote_style(csv::QuoteStyle::Necessary)
        .from_path(path)?;
    writer.write_record(["title", "artist", "album", "url"])?;
    for track in tracks {
        writer.write_record([
            track.title.as_str(),
            track.artist.as_str(),
            track.album.as_str(),
            track.url.as_deref().unwrap_or(""),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Path separators in playlist names would escape the output directory.
fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c => c,
        })
        .collect()
}
