use std::collections::HashSet;

use crate::matching::normalize::truncate_at;
use crate::matching::types::{CandidateTrack, TargetTrack};
use crate::ports::plex::PlexCatalog;

/// Result limit for the main queries.
pub const SEARCH_LIMIT: u32 = 15;
/// Result limit for the parenthesis-stripped fallback query.
pub const PAREN_SEARCH_LIMIT: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub limit: u32,
}

impl SearchQuery {
    fn new(text: &str, limit: u32) -> Self {
        Self {
            text: text.trim().to_string(),
            limit,
        }
    }
}

/// The always-issued queries, in order: exact title, artist + title, title
/// cut at the first `-`, title cut at the first `'`.
pub fn primary_queries(target: &TargetTrack) -> Vec<SearchQuery> {
    vec![
        SearchQuery::new(&target.title, SEARCH_LIMIT),
        SearchQuery::new(
            &format!("{} {}", target.artist, target.title),
            SEARCH_LIMIT,
        ),
        SearchQuery::new(truncate_at(&target.title, '-'), SEARCH_LIMIT),
        SearchQuery::new(truncate_at(&target.title, '\''), SEARCH_LIMIT),
    ]
}

/// The title cut at the first `(`, issued when the primary queries found
/// nothing or the title carries a parenthetical.
pub fn paren_query(target: &TargetTrack) -> SearchQuery {
    SearchQuery::new(truncate_at(&target.title, '('), PAREN_SEARCH_LIMIT)
}

/// Builds the candidate pool for a target track from broadened searches.
pub struct CandidateRetriever<'a, C: PlexCatalog + ?Sized> {
    catalog: &'a C,
}

impl<'a, C: PlexCatalog + ?Sized> CandidateRetriever<'a, C> {
    pub fn new(catalog: &'a C) -> Self {
        Self { catalog }
    }

    /// Candidates in query order, each query's hits in catalog order.
    ///
    /// A query text is sent at most once and a catalog entry appears at most
    /// once. Failed queries contribute nothing; this never fails.
    pub async fn retrieve(&self, target: &TargetTrack) -> Vec<CandidateTrack> {
        let mut pool = CandidatePool::default();

        for query in primary_queries(target) {
            self.run_query(&query, target, &mut pool).await;
        }

        if pool.is_empty() || target.title.contains('(') {
            let query = paren_query(target);
            log::debug!(
                "Retrying search for '{}' as '{}'",
                target.title,
                query.text
            );
            self.run_query(&query, target, &mut pool).await;
        }

        pool.into_candidates()
    }

    async fn run_query(&self, query: &SearchQuery, target: &TargetTrack, pool: &mut CandidatePool) {
        if query.text.is_empty() || !pool.mark_issued(&query.text) {
            return;
        }

        log::debug!("Searching Plex server for '{}'", query.text);
        match self.catalog.search_tracks(&query.text, query.limit).await {
            Ok(results) => {
                log::debug!(
                    "Search for '{}' returned {} candidates",
                    query.text,
                    results.len()
                );
                pool.extend(results);
            }
            Err(e) if e.is_missing() => {
                log::info!("'{}' not found on plex server: {}", target.title, e);
            }
            Err(e) => {
                log::warn!(
                    "Failed to search '{}' on plex for '{}': {}",
                    query.text,
                    target.title,
                    e
                );
            }
        }
    }
}

#[derive(Default)]
struct CandidatePool {
    issued: HashSet<String>,
    seen: HashSet<String>,
    candidates: Vec<CandidateTrack>,
}

impl CandidatePool {
    /// Returns false when the query text was already sent.
    fn mark_issued(&mut self, text: &str) -> bool {
        self.issued.insert(text.to_string())
    }

    fn extend(&mut self, results: Vec<CandidateTrack>) {
        for candidate in results {
            if self.seen.insert(candidate.rating_key.clone()) {
                self.candidates.push(candidate);
            }
        }
    }

    fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    fn into_candidates(self) -> Vec<CandidateTrack> {
        self.candidates
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::error::CatalogError;
    use crate::ports::plex::MockPlexCatalog;

    fn track(rating_key: &str, title: &str) -> CandidateTrack {
        CandidateTrack::new(rating_key, title, Some("Artist".into()), Some("Album".into()))
    }

    type SearchResult = Result<Vec<CandidateTrack>, CatalogError>;

    /// Records every query and answers from `respond`.
    fn recording_catalog(
        respond: impl Fn(&str, u32) -> SearchResult + Send + Sync + 'static,
    ) -> (MockPlexCatalog, Arc<Mutex<Vec<(String, u32)>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let recorded = calls.clone();
        let mut catalog = MockPlexCatalog::new();
        catalog.expect_search_tracks().returning(move |query, limit| {
            recorded.lock().unwrap().push((query.to_string(), limit));
            respond(query, limit)
        });
        (catalog, calls)
    }

    #[test]
    fn test_primary_queries() {
        let target = TargetTrack::new("Don't Stop - 2011 Remaster", "Queen", "Jazz", None);
        let texts: Vec<String> = primary_queries(&target)
            .into_iter()
            .map(|q| q.text)
            .collect();
        assert_eq!(
            texts,
            vec![
                "Don't Stop - 2011 Remaster",
                "Queen Don't Stop - 2011 Remaster",
                "Don't Stop",
                "Don",
            ]
        );
        assert!(primary_queries(&target).iter().all(|q| q.limit == SEARCH_LIMIT));
    }

    #[test]
    fn test_paren_query() {
        let target = TargetTrack::new("Song (Live at Home)", "Artist", "", None);
        assert_eq!(
            paren_query(&target),
            SearchQuery {
                text: "Song".to_string(),
                limit: PAREN_SEARCH_LIMIT
            }
        );
    }

    #[tokio::test]
    async fn test_issues_queries_in_order() {
        let (catalog, calls) = recording_catalog(|_, _| Ok(vec![]));
        let target = TargetTrack::new("It's Over - Remastered (2009)", "Roy", "", None);

        CandidateRetriever::new(&catalog).retrieve(&target).await;

        let calls = calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![
                ("It's Over - Remastered (2009)".to_string(), SEARCH_LIMIT),
                ("Roy It's Over - Remastered (2009)".to_string(), SEARCH_LIMIT),
                ("It's Over".to_string(), SEARCH_LIMIT),
                ("It".to_string(), SEARCH_LIMIT),
                ("It's Over - Remastered".to_string(), PAREN_SEARCH_LIMIT),
            ]
        );
    }

    #[tokio::test]
    async fn test_skips_repeated_query_text() {
        let (catalog, calls) = recording_catalog(|_, _| Ok(vec![track("1", "Yellow")]));
        let target = TargetTrack::new("Yellow", "Coldplay", "", None);

        let candidates = CandidateRetriever::new(&catalog).retrieve(&target).await;

        // "Yellow" truncated at '-' and '\'' is still "Yellow"
        let calls = calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 2);
        assert_eq!(candidates.len(), 1);
    }

    #[tokio::test]
    async fn test_paren_query_only_when_needed() {
        let (catalog, calls) = recording_catalog(|_, _| Ok(vec![track("1", "Yellow")]));
        let target = TargetTrack::new("Yellow", "Coldplay", "", None);
        CandidateRetriever::new(&catalog).retrieve(&target).await;
        assert!(
            calls
                .lock()
                .unwrap()
                .iter()
                .all(|(_, limit)| *limit == SEARCH_LIMIT)
        );
    }

    #[tokio::test]
    async fn test_deduplicates_candidates_keeping_first() {
        let (catalog, _calls) = recording_catalog(|query, _| match query {
            "Hello - Radio Edit" => Ok(vec![track("1", "Hello - Radio Edit"), track("2", "Hello")]),
            "Adele Hello - Radio Edit" => Ok(vec![track("2", "Hello"), track("3", "Hello Again")]),
            _ => Ok(vec![track("3", "Hello Again"), track("4", "Hello")]),
        });
        let target = TargetTrack::new("Hello - Radio Edit", "Adele", "", None);

        let candidates = CandidateRetriever::new(&catalog).retrieve(&target).await;

        let keys: Vec<&str> = candidates.iter().map(|c| c.rating_key.as_str()).collect();
        assert_eq!(keys, vec!["1", "2", "3", "4"]);
    }

    #[tokio::test]
    async fn test_query_failures_are_swallowed() {
        let (catalog, calls) = recording_catalog(|query, _| match query {
            "Creep" => Err(CatalogError::BadRequest("bad".into())),
            "Radiohead Creep" => Err(CatalogError::Unauthorized),
            _ => Ok(vec![track("9", "Creep")]),
        });
        let target = TargetTrack::new("Creep", "Radiohead", "", None);

        let candidates = CandidateRetriever::new(&catalog).retrieve(&target).await;

        // Both primary queries failed, so the pool was empty and the
        // fallback ran; its text repeats the title though, so nothing more
        // is sent and nothing is found.
        assert!(candidates.is_empty());
        assert_eq!(calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_fallback_after_failures() {
        let (catalog, _calls) = recording_catalog(|query, _| match query {
            "Song" => Ok(vec![track("5", "Song")]),
            _ => Err(CatalogError::NotFound("missing".into())),
        });
        let target = TargetTrack::new("Song (feat. Someone)", "Artist", "", None);

        let candidates = CandidateRetriever::new(&catalog).retrieve(&target).await;

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].rating_key, "5");
    }

    #[tokio::test]
    async fn test_empty_query_not_issued() {
        let (catalog, calls) = recording_catalog(|_, _| Ok(vec![]));
        let target = TargetTrack::new("(Intro)", "", "", None);

        let candidates = CandidateRetriever::new(&catalog).retrieve(&target).await;

        assert!(candidates.is_empty());
        let calls = calls.lock().unwrap().clone();
        assert_eq!(calls, vec![("(Intro)".to_string(), SEARCH_LIMIT)]);
    }
}
