//! Preview snippets and highlight ranges
//!
//! Context widths are counted in grapheme clusters so previews never split a visible
//! character. Highlight ranges are byte offsets into the returned preview.

use regex::RegexBuilder;
use unicode_segmentation::UnicodeSegmentation;

const ELLIPSIS: &str = "...";

/// Preview text plus the ranges to highlight inside it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preview {
    pub text: String,
    pub highlights: Vec<(usize, usize)>,
}

/// Cut `context` graphemes on each side of `content[start..end]` and mark that span
pub fn around(content: &str, start: usize, end: usize, context: usize) -> Preview {
    let start = start.min(content.len());
    let end = end.clamp(start, content.len());

    let from = back_graphemes(content, start, context);
    let to = forward_graphemes(content, end, context);

    let mut text = String::new();
    if from > 0 {
        text.push_str(ELLIPSIS);
    }
    let offset = text.len();
    text.push_str(&content[from..to]);
    if to < content.len() {
        text.push_str(ELLIPSIS);
    }

    Preview {
        text,
        highlights: vec![(offset + start - from, offset + end - from)],
    }
}

/// The first `width` graphemes of `content`
pub fn leading(content: &str, width: usize) -> Preview {
    let to = forward_graphemes(content, 0, width);
    let mut text = content[..to].to_string();
    if to < content.len() {
        text.push_str(ELLIPSIS);
    }
    Preview {
        text,
        highlights: Vec::new(),
    }
}

/// Every case-insensitive occurrence of any term in `text`, merged
pub fn term_ranges(text: &str, terms: &[String]) -> Vec<(usize, usize)> {
    let mut terms: Vec<&str> = terms
        .iter()
        .map(String::as_str)
        .filter(|t| !t.is_empty())
        .collect();
    if terms.is_empty() {
        return Vec::new();
    }

    // Longest first so the alternation prefers the widest term at each position
    terms.sort_by_key(|t| std::cmp::Reverse(t.len()));
    let pattern = terms
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|");

    let Ok(re) = RegexBuilder::new(&pattern).case_insensitive(true).build() else {
        return Vec::new();
    };

    let ranges = re.find_iter(text).map(|m| (m.start(), m.end())).collect();
    merge_ranges(ranges)
}

/// Sort and merge overlapping or touching ranges
pub fn merge_ranges(mut ranges: Vec<(usize, usize)>) -> Vec<(usize, usize)> {
    ranges.sort_by_key(|r| r.0);
    let mut merged: Vec<(usize, usize)> = Vec::new();
    for (s, e) in ranges {
        if let Some(last) = merged.last_mut() {
            if s <= last.1 {
                if e > last.1 {
                    last.1 = e;
                }
                continue;
            }
        }
        merged.push((s, e));
    }
    merged
}

fn back_graphemes(text: &str, end: usize, count: usize) -> usize {
    if count == 0 {
        return end;
    }
    text[..end]
        .grapheme_indices(true)
        .rev()
        .take(count)
        .last()
        .map_or(end, |(i, _)| i)
}

fn forward_graphemes(text: &str, start: usize, count: usize) -> usize {
    text[start..]
        .grapheme_indices(true)
        .nth(count)
        .map_or(text.len(), |(i, _)| start + i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_around_whole_text() {
        let content = "def foo(): pass";
        let preview = around(content, 4, 7, 50);
        assert_eq!(preview.text, content);
        assert_eq!(preview.highlights, vec![(4, 7)]);
        let (s, e) = preview.highlights[0];
        assert_eq!(&preview.text[s..e], "foo");
    }

    #[test]
    fn test_around_truncates_with_ellipsis() {
        let content = format!("{}needle{}", "a".repeat(100), "b".repeat(100));
        let preview = around(&content, 100, 106, 10);
        assert_eq!(
            preview.text,
            format!("...{}needle{}...", "a".repeat(10), "b".repeat(10))
        );
        let (s, e) = preview.highlights[0];
        assert_eq!(&preview.text[s..e], "needle");
    }

    #[test]
    fn test_around_counts_graphemes() {
        let content = "ééééé|x|ééééé";
        let start = content.find('x').unwrap();
        let preview = around(content, start, start + 1, 2);
        assert_eq!(preview.text, "...é|x|é...");
    }

    #[test]
    fn test_leading() {
        assert_eq!(leading("short", 10).text, "short");
        assert_eq!(leading("abcdefghij", 4).text, "abcd...");
    }

    #[test]
    fn test_term_ranges_case_insensitive_and_merged() {
        let text = "Print(x); print_all(); PRINT";
        let ranges = term_ranges(text, &["print".to_string()]);
        assert_eq!(ranges, vec![(0, 5), (10, 15), (23, 28)]);

        let overlapping = term_ranges("foobar", &["foo".to_string(), "oba".to_string()]);
        assert_eq!(overlapping, vec![(0, 3)]);
        assert!(term_ranges("abc", &[]).is_empty());
    }

    #[test]
    fn test_term_ranges_beyond_ascii() {
        let ranges = term_ranges("Привет мир, ПРИВЕТ", &["привет".to_string()]);
        assert_eq!(ranges, vec![(0, 12), (21, 33)]);

        let ranges = term_ranges("Ärger ärger", &["ärger".to_string()]);
        assert_eq!(ranges, vec![(0, 6), (7, 13)]);
    }

    #[test]
    fn test_term_ranges_prefers_longer_term() {
        let ranges = term_ranges("printer", &["print".to_string(), "printer".to_string()]);
        assert_eq!(ranges, vec![(0, 7)]);
    }

    #[test]
    fn test_merge_ranges() {
        assert_eq!(
            merge_ranges(vec![(5, 8), (0, 2), (2, 4), (7, 10)]),
            vec![(0, 4), (5, 10)]
        );
    }
}
