/// Words that mark a distinct edition of a recording.
///
/// Matched as case-insensitive substrings, so `"mix"` also fires on
/// `"remix"` and `"mixed"`.
pub const VARIANT_MARKERS: &[&str] = &[
    "acoustic",
    "live",
    "remix",
    "instrumental",
    "orchestral",
    "bootleg",
    "mix",
];

/// Returns the first marker present in `candidate_title` but absent from
/// `target_title`, if any.
pub fn vetoing_marker(candidate_title: &str, target_title: &str) -> Option<&'static str> {
    let candidate = candidate_title.to_lowercase();
    let target = target_title.to_lowercase();

    VARIANT_MARKERS
        .iter()
        .copied()
        .find(|marker| candidate.contains(marker) && !target.contains(marker))
}

/// Whether `candidate_title` may stand in for `target_title`.
///
/// A candidate carrying a marker the target lacks (a live cut offered for a
/// studio track) is rejected. Markers shared by both titles, or missing from
/// the candidate, never reject.
pub fn is_compatible_variant(candidate_title: &str, target_title: &str) -> bool {
    vetoing_marker(candidate_title, target_title).is_none()
}
