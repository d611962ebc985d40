//! Approximate string similarity
//!
//! Ratios are on a 0-100 scale derived from the indel distance (insertions and deletions
//! only): `100 * 2 * lcs / (len_a + len_b)`. The partial ratio slides the shorter string
//! over every same-length window of the longer one and keeps the best window.
//!
//! Each window costs one LCS over `m` characters, so a partial ratio is O(n·m) for a
//! haystack of `n` characters and a needle of `m`. Needles of up to 64 characters use the
//! bit-parallel LCS (Hyyrö), one word operation per window character; longer needles fall
//! back to the O(m²) table per window.

use std::collections::HashMap;
use unicode_normalization::UnicodeNormalization;

/// Similarity scorer with a pass/fail floor
#[derive(Debug, Clone)]
pub struct FuzzyMatcher {
    threshold: f64,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl FuzzyMatcher {
    /// Matcher with the default floor of 60
    pub fn new() -> Self {
        Self::with_threshold(60)
    }

    pub fn with_threshold(threshold: u8) -> Self {
        Self {
            threshold: f64::from(threshold.min(100)),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Whether a 0-100 similarity clears the floor
    pub fn passes(&self, similarity: f64) -> bool {
        similarity >= self.threshold
    }

    /// Full-string similarity (0-100), case-insensitive
    pub fn ratio(&self, a: &str, b: &str) -> f64 {
        let a = Self::normalize_for_matching(a);
        let b = Self::normalize_for_matching(b);
        if a.is_empty() && b.is_empty() {
            return 100.0;
        }
        let lcs = Pattern::new(&a).lcs(&b);
        indel_similarity(lcs, a.len(), b.len())
    }

    /// Best similarity (0-100) between the shorter string and any equally long window of
    /// the longer one, case-insensitive
    pub fn partial_ratio(&self, a: &str, b: &str) -> f64 {
        let a = Self::normalize_for_matching(a);
        let b = Self::normalize_for_matching(b);
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }

        let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
        let pattern = Pattern::new(&short);
        let m = short.len();

        let mut best = 0.0f64;
        for start in 0..=(long.len() - m) {
            let window = &long[start..start + m];
            let score = indel_similarity(pattern.lcs(window), m, m);
            if score > best {
                best = score;
                if best >= 100.0 {
                    break;
                }
            }
        }
        best
    }

    /// Check for exact substring match (case-insensitive)
    pub fn exact_match(&self, haystack: &str, needle: &str) -> bool {
        if needle.is_empty() {
            return false;
        }

        let haystack_lower = haystack.to_lowercase();
        let needle_lower = needle.to_lowercase();

        haystack_lower.contains(&needle_lower)
    }

    /// Lower-case and NFC-normalize, returned as chars so windows align on characters
    fn normalize_for_matching(text: &str) -> Vec<char> {
        text.nfc().flat_map(char::to_lowercase).collect()
    }
}

fn indel_similarity(lcs: usize, len_a: usize, len_b: usize) -> f64 {
    let total = len_a + len_b;
    if total == 0 {
        return 100.0;
    }
    100.0 * (2 * lcs) as f64 / total as f64
}

/// Precomputed match masks for the pattern side of an LCS computation
struct Pattern<'a> {
    chars: &'a [char],
    masks: Option<HashMap<char, u64>>,
}

impl<'a> Pattern<'a> {
    fn new(chars: &'a [char]) -> Self {
        let masks = (chars.len() <= 64).then(|| {
            let mut masks: HashMap<char, u64> = HashMap::new();
            for (i, c) in chars.iter().enumerate() {
                *masks.entry(*c).or_insert(0) |= 1u64 << i;
            }
            masks
        });
        Self { chars, masks }
    }

    /// Length of the longest common subsequence between the pattern and `text`
    fn lcs(&self, text: &[char]) -> usize {
        if self.chars.is_empty() || text.is_empty() {
            return 0;
        }
        match &self.masks {
            Some(masks) => {
                let m = self.chars.len();
                let mut v = u64::MAX;
                for c in text {
                    let u = v & masks.get(c).copied().unwrap_or(0);
                    v = v.wrapping_add(u) | (v - u);
                }
                let live = if m == 64 { u64::MAX } else { (1u64 << m) - 1 };
                m - (v & live).count_ones() as usize
            }
            None => lcs_table(self.chars, text),
        }
    }
}

/// Two-row dynamic-programming LCS for patterns longer than a word
fn lcs_table(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        let matcher = FuzzyMatcher::new();
        assert!(matcher.exact_match("hello world", "hello"));
        assert!(matcher.exact_match("hello world", "o w"));
        assert!(!matcher.exact_match("hello world", "xyz"));
        assert!(!matcher.exact_match("hello", ""));
    }

    #[test]
    fn test_exact_match_case_insensitive() {
        let matcher = FuzzyMatcher::new();
        assert!(matcher.exact_match("Hello World", "hello"));
        assert!(matcher.exact_match("HELLO WORLD", "world"));
    }

    #[test]
    fn test_ratio() {
        let matcher = FuzzyMatcher::new();
        assert_eq!(matcher.ratio("foo", "foo"), 100.0);
        assert_eq!(matcher.ratio("FOO", "foo"), 100.0);
        assert_eq!(matcher.ratio("abc", "xyz"), 0.0);
        // lcs("foo", "foobar") = 3 -> 6 / 9
        assert!((matcher.ratio("foo", "foobar") - 66.666).abs() < 0.01);
        assert_eq!(matcher.ratio("", ""), 100.0);
    }

    #[test]
    fn test_partial_ratio() {
        let matcher = FuzzyMatcher::new();
        assert_eq!(matcher.partial_ratio("fo", "def foo(): pass"), 100.0);
        assert_eq!(matcher.partial_ratio("def foo(): pass", "fo"), 100.0);
        assert!(matcher.partial_ratio("fo", "hello world") < 60.0);
        assert_eq!(matcher.partial_ratio("", "abc"), 0.0);
        // one substitution in a four-letter window: lcs 3 -> 75
        assert_eq!(matcher.partial_ratio("prnt", "x = print(y)"), 75.0);
    }

    #[test]
    fn test_unicode_normalization() {
        let matcher = FuzzyMatcher::new();
        // café with combining accent vs. precomposed
        assert_eq!(matcher.ratio("cafe\u{301}", "café"), 100.0);
    }

    #[test]
    fn test_bit_parallel_matches_table() {
        let a: Vec<char> = "the quick brown fox".chars().collect();
        let b: Vec<char> = "a quick brown dog jumps".chars().collect();
        assert_eq!(Pattern::new(&a).lcs(&b), lcs_table(&a, &b));

        let long: Vec<char> = "ab".repeat(40).chars().collect();
        let other: Vec<char> = "ba".repeat(30).chars().collect();
        assert_eq!(Pattern::new(&long).lcs(&other), lcs_table(&long, &other));
    }

    #[test]
    fn test_partial_ratio_long_needle() {
        let needle = "abcdefghij".repeat(7);
        let haystack = format!("{}{}{}", "z".repeat(20), needle, "y".repeat(20));
        let matcher = FuzzyMatcher::new();
        assert_eq!(matcher.partial_ratio(&needle, &haystack), 100.0);

        let mut near = needle.clone();
        near.replace_range(0..1, "q");
        let score = matcher.partial_ratio(&near, &haystack);
        assert!(score < 100.0 && score > 95.0, "score {}", score);
    }

    #[test]
    fn test_threshold() {
        let matcher = FuzzyMatcher::new();
        assert!(matcher.passes(60.0));
        assert!(!matcher.passes(59.9));
        assert_eq!(FuzzyMatcher::with_threshold(200).threshold(), 100.0);
    }
}
