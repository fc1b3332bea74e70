use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::matching::{CandidateRef, CandidateRetriever, MatchResult, TargetTrack, decide};
use crate::ports::plex::{PlaylistHandle, PlexCatalog};
use crate::ports::source::SourcePlaylist;

/// A source playlist together with its tracks, in playlist order.
#[derive(Debug, Clone)]
pub struct TargetPlaylist {
    pub info: SourcePlaylist,
    pub tracks: Vec<TargetTrack>,
}

/// What one reconciliation pass decided for one playlist.
#[derive(Debug, Clone)]
pub struct PlaylistSyncPlan {
    pub playlist: SourcePlaylist,
    /// One reference per matched target track, in target order.
    pub matched: Vec<CandidateRef>,
    /// Target tracks with no match, in target order.
    pub unmatched: Vec<TargetTrack>,
}

/// How an existing Plex playlist is brought in line with the plan.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Clear the playlist and add the matched tracks.
    #[default]
    Replace,
    /// Add the matched tracks after the current contents.
    Append,
    /// Delete the playlist and create it again.
    Recreate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncPolicy {
    pub write_mode: WriteMode,
    /// The playlist is only written when at least this many tracks matched.
    pub min_match_count: usize,
    pub sync_description: bool,
    pub sync_artwork: bool,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            write_mode: WriteMode::Replace,
            min_match_count: 1,
            sync_description: true,
            sync_artwork: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Created,
    Replaced,
    Appended,
    Recreated,
    /// Too few matches, Plex was left untouched.
    Skipped,
}

#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub action: SyncAction,
    pub matched_count: usize,
    pub unmatched_tracks: Vec<TargetTrack>,
}

/// Matches source playlists against the Plex library and writes the result.
pub struct Reconciler<'a, C: PlexCatalog + ?Sized> {
    catalog: &'a C,
}

impl<'a, C: PlexCatalog + ?Sized> Reconciler<'a, C> {
    pub fn new(catalog: &'a C) -> Self {
        Self { catalog }
    }

    /// Match every track of `target`, one at a time, in order.
    pub async fn reconcile(&self, target: &TargetPlaylist) -> PlaylistSyncPlan {
        let retriever = CandidateRetriever::new(self.catalog);
        let mut matched = Vec::new();
        let mut unmatched = Vec::new();

        for track in &target.tracks {
            let candidates = retriever.retrieve(track).await;
            match decide(track, &candidates) {
                MatchResult::Matched(reference) => matched.push(reference),
                MatchResult::Unmatched => unmatched.push(track.clone()),
            }
        }

        log::info!(
            "Matched {} of {} tracks for playlist '{}'",
            matched.len(),
            target.tracks.len(),
            target.info.name
        );

        PlaylistSyncPlan {
            playlist: target.info.clone(),
            matched,
            unmatched,
        }
    }

    /// Write `plan` to Plex according to `policy`.
    ///
    /// A failed playlist write is returned. Description and poster updates
    /// are best-effort: their failures are logged and never undo or fail the
    /// track sync.
    pub async fn apply(
        &self,
        plan: &PlaylistSyncPlan,
        policy: &SyncPolicy,
    ) -> Result<SyncOutcome, CatalogError> {
        let name = &plan.playlist.name;

        if plan.matched.len() < policy.min_match_count {
            log::info!(
                "Only {} of {} required songs for playlist '{}' were found on plex, skipping the playlist update",
                plan.matched.len(),
                policy.min_match_count,
                name
            );
            return Ok(self.outcome(plan, SyncAction::Skipped));
        }

        let (handle, action) = self.write_tracks(plan, policy.write_mode).await?;
        self.sync_metadata(&handle, &plan.playlist, policy).await;

        Ok(self.outcome(plan, action))
    }

    async fn write_tracks(
        &self,
        plan: &PlaylistSyncPlan,
        write_mode: WriteMode,
    ) -> Result<(PlaylistHandle, SyncAction), CatalogError> {
        let name = &plan.playlist.name;

        let Some(existing) = self.catalog.get_playlist(name).await? else {
            let created = self.catalog.create_playlist(name, &plan.matched).await?;
            log::info!("Created playlist '{}'", name);
            return Ok((created, SyncAction::Created));
        };

        match write_mode {
            WriteMode::Replace => {
                self.catalog.replace_items(&existing, &plan.matched).await?;
                log::info!("Updated playlist '{}'", name);
                Ok((existing, SyncAction::Replaced))
            }
            WriteMode::Append => {
                self.catalog.add_items(&existing, &plan.matched).await?;
                log::info!("Appended {} tracks to playlist '{}'", plan.matched.len(), name);
                Ok((existing, SyncAction::Appended))
            }
            WriteMode::Recreate => {
                self.catalog.delete_playlist(&existing).await?;
                let created = self.catalog.create_playlist(name, &plan.matched).await?;
                log::info!("Recreated playlist '{}'", name);
                Ok((created, SyncAction::Recreated))
            }
        }
    }

    async fn sync_metadata(
        &self,
        handle: &PlaylistHandle,
        playlist: &SourcePlaylist,
        policy: &SyncPolicy,
    ) {
        if policy.sync_description {
            if let Some(description) = playlist.description.as_deref() {
                if let Err(e) = self.catalog.set_description(handle, description).await {
                    log::warn!(
                        "Failed to update description for playlist '{}': {}",
                        playlist.name,
                        e
                    );
                }
            }
        }

        if policy.sync_artwork {
            if let Some(poster) = playlist.poster.as_deref() {
                if let Err(e) = self.catalog.set_artwork(handle, poster).await {
                    log::warn!(
                        "Failed to update poster for playlist '{}': {}",
                        playlist.name,
                        e
                    );
                }
            }
        }
    }

    fn outcome(&self, plan: &PlaylistSyncPlan, action: SyncAction) -> SyncOutcome {
        SyncOutcome {
            action,
            matched_count: if action == SyncAction::Skipped {
                0
            } else {
                plan.matched.len()
            },
            unmatched_tracks: plan.unmatched.clone(),
        }
    }
}
