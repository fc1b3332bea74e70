use crate::error::CandidateError;
use crate::matching::normalize::{NormalizeMode, normalize};
use crate::matching::similarity::similarity;
use crate::matching::types::{CandidateTrack, MatchResult, TargetTrack};
use crate::matching::variant::is_compatible_variant;

/// Minimum artist similarity, with or without "the" removed.
pub const ARTIST_SIMILARITY_THRESHOLD: f64 = 0.85;
/// Minimum similarity for at least one of the title pairings.
pub const TITLE_SIMILARITY_THRESHOLD: f64 = 0.65;

/// Acceptance thresholds, defaulting to the constants above.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchThresholds {
    pub artist: f64,
    pub title: f64,
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self {
            artist: ARTIST_SIMILARITY_THRESHOLD,
            title: TITLE_SIMILARITY_THRESHOLD,
        }
    }
}

/// Similarities computed for one candidate against one target.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateScore {
    pub artist: f64,
    pub artist_without_the: f64,
    /// Full, target cut at `-`, target cut at `'`, target cut at `(`,
    /// both cut at `(`, both cut at `-`.
    pub titles: [f64; 6],
    /// False when the candidate is a different edition (live, remix, ...).
    pub compatible_variant: bool,
}

impl CandidateScore {
    pub fn best_title(&self) -> f64 {
        self.titles.iter().copied().fold(0.0, f64::max)
    }

    pub fn is_accepted(&self, thresholds: &MatchThresholds) -> bool {
        let artist_ok =
            self.artist >= thresholds.artist || self.artist_without_the >= thresholds.artist;
        let title_ok = self.titles.iter().any(|score| *score >= thresholds.title);
        artist_ok && title_ok && self.compatible_variant
    }
}

/// Score `candidate` against `target`. Fails only when the candidate's
/// metadata can't be read.
pub fn score_candidate(
    target: &TargetTrack,
    candidate: &CandidateTrack,
) -> Result<CandidateScore, CandidateError> {
    let candidate_artist = candidate.artist()?;

    let artist = similarity(
        &normalize(candidate_artist, NormalizeMode::Full),
        &normalize(&target.artist, NormalizeMode::Full),
    );
    let artist_without_the = similarity(
        &normalize(candidate_artist, NormalizeMode::StripThe),
        &normalize(&target.artist, NormalizeMode::StripThe),
    );

    let candidate_title = |mode| normalize(&candidate.title, mode);
    let target_title = |mode| normalize(&target.title, mode);
    let candidate_full = candidate_title(NormalizeMode::Full);

    let titles = [
        similarity(&candidate_full, &target_title(NormalizeMode::Full)),
        similarity(&candidate_full, &target_title(NormalizeMode::BeforeDash)),
        similarity(&candidate_full, &target_title(NormalizeMode::BeforeApostrophe)),
        similarity(&candidate_full, &target_title(NormalizeMode::BeforeParen)),
        similarity(
            &candidate_title(NormalizeMode::BeforeParen),
            &target_title(NormalizeMode::BeforeParen),
        ),
        similarity(
            &candidate_title(NormalizeMode::BeforeDash),
            &target_title(NormalizeMode::BeforeDash),
        ),
    ];

    Ok(CandidateScore {
        artist,
        artist_without_the,
        titles,
        compatible_variant: is_compatible_variant(&candidate.title, &target.title),
    })
}

/// Pick the first acceptable candidate, using the default thresholds.
pub fn decide(target: &TargetTrack, candidates: &[CandidateTrack]) -> MatchResult {
    decide_with(target, candidates, &MatchThresholds::default())
}

/// Pick the first candidate, in retrieval order, whose artist and title are
/// close enough and which is not a different edition of the target.
///
/// Candidates with unreadable metadata are skipped.
pub fn decide_with(
    target: &TargetTrack,
    candidates: &[CandidateTrack],
    thresholds: &MatchThresholds,
) -> MatchResult {
    for candidate in candidates {
        let score = match score_candidate(target, candidate) {
            Ok(score) => score,
            Err(e) => {
                log::info!(
                    "Looks like plex mismatched '{}', retrying with next result: {}",
                    target.title,
                    e
                );
                continue;
            }
        };

        if score.is_accepted(thresholds) {
            log::info!(
                "Found track in Plex: '{}' by '{}' for '{}' by '{}'",
                candidate.title,
                candidate.artist().unwrap_or_default(),
                target.title,
                target.artist
            );
            return MatchResult::Matched(candidate.reference());
        }

        log::debug!(
            "Rejected '{}' by '{}' for '{}' by '{}': artist {:.2}/{:.2}, title {:.2}, same edition {}",
            candidate.title,
            candidate.artist().unwrap_or_default(),
            target.title,
            target.artist,
            score.artist,
            score.artist_without_the,
            score.best_title(),
            score.compatible_variant
        );
    }

    log::info!(
        "No suitable match found for '{}' by '{}' in Plex",
        target.title,
        target.artist
    );
    MatchResult::Unmatched
}
