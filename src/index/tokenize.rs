//! Word tokenization shared by index construction and query matching

use std::collections::HashSet;

/// Stop words excluded from both the index and queries (English and Hebrew)
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "from", "has", "in", "is",
    "it", "its", "of", "on", "or", "that", "the", "to", "was", "will", "with", "את", "של", "על",
    "עם", "אל", "מן", "כל", "זה", "זו", "הוא", "היא", "גם", "או", "אם", "כי", "לא",
];

/// Minimum token length (in characters) kept by the index
pub const MIN_TOKEN_CHARS: usize = 2;

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Byte spans of every word (`\w+`) in `text`
pub fn word_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start: Option<usize> = None;

    for (i, c) in text.char_indices() {
        match (is_word_char(c), start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                spans.push((s, i));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push((s, text.len()));
    }

    spans
}

/// Lower-cased words of `text`, without filtering
pub fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !is_word_char(c))
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
}

pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}

/// Whether a lower-cased word is kept as an index or query term
pub fn is_index_term(word: &str) -> bool {
    word.chars().count() >= MIN_TOKEN_CHARS && !is_stop_word(word)
}

/// Lower-cased, stop-word-free terms of `text`, deduplicated in first-seen order
pub fn index_terms(text: &str) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    words(text)
        .filter(|w| is_index_term(w) && seen.insert(w.clone()))
        .collect()
}
