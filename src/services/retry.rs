use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};

use crate::error::CatalogError;
use crate::matching::{CandidateRef, CandidateTrack};
use crate::ports::plex::{PlaylistHandle, PlexCatalog};

/// When and how often a failed catalog call is repeated.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, the first call included.
    pub max_attempts: usize,
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub jitter: bool,
    /// Which failures are worth another attempt.
    pub retryable: fn(&CatalogError) -> bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            min_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(16),
            jitter: true,
            retryable: CatalogError::is_transient,
        }
    }
}

impl RetryPolicy {
    pub fn backoff(&self) -> ExponentialBuilder {
        let builder = ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_attempts.saturating_sub(1));
        if self.jitter {
            builder.with_jitter()
        } else {
            builder
        }
    }
}

/// Applies a [`RetryPolicy`] to the calls of the wrapped catalog.
///
/// Appending is never repeated: a failed request may have been applied
/// before the connection dropped.
pub struct RetryingCatalog<C: PlexCatalog> {
    inner: C,
    policy: RetryPolicy,
}

impl<C: PlexCatalog> RetryingCatalog<C> {
    pub fn new(inner: C, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

fn notify(operation: &'static str) -> impl Fn(&CatalogError, Duration) {
    move |err: &CatalogError, delay: Duration| {
        log::warn!(
            "Plex {} failed: {}. Retrying in {:.2} seconds...",
            operation,
            err,
            delay.as_secs_f64()
        );
    }
}

#[async_trait::async_trait]
impl<C: PlexCatalog> PlexCatalog for RetryingCatalog<C> {
    async fn server_identity(&self) -> Result<String, CatalogError> {
        (|| self.inner.server_identity())
            .retry(self.policy.backoff())
            .when(self.policy.retryable)
            .notify(notify("identity check"))
            .await
    }

    async fn search_tracks(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<CandidateTrack>, CatalogError> {
        (|| self.inner.search_tracks(query, limit))
            .retry(self.policy.backoff())
            .when(self.policy.retryable)
            .notify(notify("search"))
            .await
    }

    async fn get_playlist(&self, name: &str) -> Result<Option<PlaylistHandle>, CatalogError> {
        (|| self.inner.get_playlist(name))
            .retry(self.policy.backoff())
            .when(self.policy.retryable)
            .notify(notify("playlist lookup"))
            .await
    }

    /// After a failed attempt the playlist may exist anyway, so later
    /// attempts fill a playlist found under `name` instead of creating one.
    async fn create_playlist(
        &self,
        name: &str,
        items: &[CandidateRef],
    ) -> Result<PlaylistHandle, CatalogError> {
        let attempts = &AtomicUsize::new(0);
        let inner = &self.inner;
        (move || async move {
            if attempts.fetch_add(1, Ordering::SeqCst) > 0 {
                if let Some(existing) = inner.get_playlist(name).await? {
                    inner.replace_items(&existing, items).await?;
                    return Ok(existing);
                }
            }
            inner.create_playlist(name, items).await
        })
        .retry(self.policy.backoff())
        .when(self.policy.retryable)
        .notify(notify("playlist creation"))
        .await
    }

    async fn replace_items(
        &self,
        playlist: &PlaylistHandle,
        items: &[CandidateRef],
    ) -> Result<(), CatalogError> {
        (|| self.inner.replace_items(playlist, items))
            .retry(self.policy.backoff())
            .when(self.policy.retryable)
            .notify(notify("playlist replace"))
            .await
    }

    async fn add_items(
        &self,
        playlist: &PlaylistHandle,
        items: &[CandidateRef],
    ) -> Result<(), CatalogError> {
        self.inner.add_items(playlist, items).await
    }

    async fn delete_playlist(&self, playlist: &PlaylistHandle) -> Result<(), CatalogError> {
        (|| self.inner.delete_playlist(playlist))
            .retry(self.policy.backoff())
            .when(self.policy.retryable)
            .notify(notify("playlist deletion"))
            .await
    }

    async fn set_description(
        &self,
        playlist: &PlaylistHandle,
        text: &str,
    ) -> Result<(), CatalogError> {
        (|| self.inner.set_description(playlist, text))
            .retry(self.policy.backoff())
            .when(self.policy.retryable)
            .notify(notify("description update"))
            .await
    }

    async fn set_artwork(&self, playlist: &PlaylistHandle, url: &str) -> Result<(), CatalogError> {
        (|| self.inner.set_artwork(playlist, url))
            .retry(self.policy.backoff())
            .when(self.policy.retryable)
            .notify(notify("poster upload"))
            .await
    }
}

/// Block until the catalog answers, checking every `delay`.
///
/// Only transient failures are waited out; anything else (a bad token, say)
/// is returned.
pub async fn wait_for_connection<C: PlexCatalog + ?Sized>(
    catalog: &C,
    delay: Duration,
) -> Result<String, CatalogError> {
    loop {
        match catalog.server_identity().await {
            Ok(identity) => return Ok(identity),
            Err(e) if e.is_transient() => {
                log::error!("Plex connection failed: {}", e);
                log::info!("Retrying in {} seconds...", delay.as_secs());
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
