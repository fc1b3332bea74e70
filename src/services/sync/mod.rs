pub mod missing_tracks;
pub mod reconcile;

use color_eyre::{Result, eyre::Context};

pub use missing_tracks::MissingTracksWriter;
pub use reconcile::{Reconciler, SyncAction, SyncOutcome, SyncPolicy, TargetPlaylist, WriteMode};

use crate::ports::plex::PlexCatalog;
use crate::ports::source::{PlaylistSource, SourcePlaylist};

/// Everything a sync pass needs besides the two endpoints.
pub struct SyncSettings {
    pub policy: SyncPolicy,
    /// Set when unmatched tracks should be written out as csv.
    pub missing_tracks: Option<MissingTracksWriter>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncSummary {
    pub playlists: usize,
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
    pub matched_tracks: usize,
    pub missing_tracks: usize,
}

/// Mirror every playlist of `source` to the Plex server.
///
/// Listing the playlists is the only step that fails the pass. A playlist
/// whose tracks cannot be fetched or written is logged and counted as
/// failed; the remaining playlists still sync.
pub async fn sync_source<S, C>(
    source: &S,
    catalog: &C,
    settings: &SyncSettings,
) -> Result<SyncSummary>
where
    S: PlaylistSource + ?Sized,
    C: PlexCatalog + ?Sized,
{
    let service = source.service_name();
    let playlists = source
        .playlists()
        .await
        .with_context(|| format!("Failed to list {} playlists", service))?;

    log::info!("Syncing {} playlists from {}", playlists.len(), service);

    let reconciler = Reconciler::new(catalog);
    let mut summary = SyncSummary {
        playlists: playlists.len(),
        ..SyncSummary::default()
    };

    for playlist in playlists {
        match sync_playlist(source, &reconciler, &playlist, settings).await {
            Ok(outcome) => {
                if outcome.action == SyncAction::Skipped {
                    summary.skipped += 1;
                } else {
                    summary.written += 1;
                }
                summary.matched_tracks += outcome.matched_count;
                summary.missing_tracks += outcome.unmatched_tracks.len();
            }
            Err(e) => {
                log::error!("Failed to sync playlist '{}': {:?}", playlist.name, e);
                summary.failed += 1;
            }
        }
    }

    log::info!(
        "{} sync finished: {} written, {} skipped, {} failed, {} tracks missing",
        service,
        summary.written,
        summary.skipped,
        summary.failed,
        summary.missing_tracks
    );

    Ok(summary)
}

async fn sync_playlist<S, C>(
    source: &S,
    reconciler: &Reconciler<'_, C>,
    playlist: &SourcePlaylist,
    settings: &SyncSettings,
) -> Result<SyncOutcome>
where
    S: PlaylistSource + ?Sized,
    C: PlexCatalog + ?Sized,
{
    let tracks = source
        .playlist_tracks(playlist)
        .await
        .with_context(|| format!("Failed to fetch tracks of '{}'", playlist.name))?;

    let target = TargetPlaylist {
        info: playlist.clone(),
        tracks,
    };
    let plan = reconciler.reconcile(&target).await;
    let outcome = reconciler
        .apply(&plan, &settings.policy)
        .await
        .with_context(|| format!("Failed to write playlist '{}' to Plex", playlist.name))?;

    if let Some(writer) = &settings.missing_tracks {
        writer.record(&playlist.name, &outcome.unmatched_tracks);
    }

    Ok(outcome)
}
