//! Fuzzy matching of streaming-service tracks against the Plex library.
//!
//! Matching is purely textual: titles and artists are lower-cased and cut at
//! common delimiters, compared with a character-multiset ratio, and
//! candidates that are a different edition (live, remix, ...) of the wanted
//! track are rejected. The first acceptable candidate wins.

pub mod decision;
pub mod normalize;
pub mod retriever;
pub mod similarity;
pub mod types;
pub mod variant;

pub use decision::decide;
pub use retriever::CandidateRetriever;
pub use types::{CandidateRef, CandidateTrack, MatchResult, TargetTrack};
