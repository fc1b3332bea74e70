/// How a title or artist string is cut down before comparison.
///
/// Every mode lower-cases first. The truncating modes keep everything before
/// the first delimiter (the whole string when the delimiter is absent).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeMode {
    /// Lower-case only.
    Full,
    /// Cut at the first `(`, e.g. `"Song (Remastered 2011)"` -> `"song "`.
    BeforeParen,
    /// Cut at the first `-`, e.g. `"Song - Radio Edit"` -> `"song "`.
    BeforeDash,
    /// Cut at the first `'`, e.g. `"Don't Stop"` -> `"don"`.
    BeforeApostrophe,
    /// Remove every occurrence of `the`, including inside words
    /// (`"The Weather"` -> `" wear"`).
    StripThe,
}

impl NormalizeMode {
    fn delimiter(self) -> Option<char> {
        match self {
            NormalizeMode::BeforeParen => Some('('),
            NormalizeMode::BeforeDash => Some('-'),
            NormalizeMode::BeforeApostrophe => Some('\''),
            NormalizeMode::Full | NormalizeMode::StripThe => None,
        }
    }
}

/// Canonicalize `s` for comparison under `mode`.
pub fn normalize(s: &str, mode: NormalizeMode) -> String {
    let lowered = s.to_lowercase();

    if mode == NormalizeMode::StripThe {
        return lowered.replace("the", "");
    }

    match mode.delimiter() {
        Some(delimiter) => truncate_at(&lowered, delimiter).to_string(),
        None => lowered,
    }
}

/// Everything before the first `delimiter`, or all of `s`.
pub fn truncate_at(s: &str, delimiter: char) -> &str {
    s.split(delimiter).next().unwrap_or(s)
}
