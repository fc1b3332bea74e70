use std::collections::HashMap;

/// Character-multiset similarity in `[0, 1]`.
///
/// Counts the characters the two strings share (with multiplicity, ignoring
/// position) and returns `2 * shared / (len(a) + len(b))`. This is the
/// "quick ratio" of a sequence matcher: an upper bound on the alignment
/// ratio that is cheap, symmetric and deterministic. Two empty strings are
/// considered identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    let len_a = a.chars().count();
    let len_b = b.chars().count();
    let total = len_a + len_b;
    if total == 0 {
        return 1.0;
    }

    let mut available: HashMap<char, usize> = HashMap::new();
    for c in b.chars() {
        *available.entry(c).or_insert(0) += 1;
    }

    let mut matches = 0usize;
    for c in a.chars() {
        if let Some(count) = available.get_mut(&c) {
            if *count > 0 {
                *count -= 1;
                matches += 1;
            }
        }
    }

    (2 * matches) as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_strings() {
        for s in ["yellow", "the beatles", "a", "ünïcödé"] {
            assert_eq!(similarity(s, s), 1.0);
        }
    }

    #[test]
    fn test_disjoint_strings() {
        assert_eq!(similarity("abc", "xyz"), 0.0);
        assert_eq!(similarity("abc", ""), 0.0);
    }

    #[test]
    fn test_both_empty() {
        assert_eq!(similarity("", ""), 1.0);
    }

    #[test]
    fn test_symmetry() {
        let pairs = [
            ("coldplay", "cold play"),
            ("the beatles", "beatles"),
            ("hey jude", "hey jude (remastered 2015)"),
            ("aab", "abb"),
            ("", "x"),
        ];
        for (a, b) in pairs {
            assert_eq!(similarity(a, b), similarity(b, a), "{a:?} vs {b:?}");
        }
    }

    #[test]
    fn test_counts_multiplicity() {
        // a: {a:2, b:1}, b: {a:1, b:2} -> shared a + b = 2
        assert!((similarity("aab", "abb") - 4.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_ignores_order() {
        assert_eq!(similarity("listen", "silent"), 1.0);
    }

    #[test]
    fn test_known_value() {
        // "beatles" (7) fully contained in "the beatles" (11): 2*7/18
        let expected = 14.0 / 18.0;
        assert!((similarity("the beatles", "beatles") - expected).abs() < 1e-9);
    }

    #[test]
    fn test_bounded() {
        let pairs = [("abc", "abcd"), ("zzz", "z"), ("hello world", "world")];
        for (a, b) in pairs {
            let score = similarity(a, b);
            assert!((0.0..=1.0).contains(&score));
        }
    }
}
