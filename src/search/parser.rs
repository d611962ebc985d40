//! Query Parser
//!
//! Splits a free-text query into search terms, boolean operator tokens and `key:value`
//! filter directives. Double-quoted phrases stay together as a single term.
//!
//! Recognised directives:
//! - `lang:python`, `tag:utils` add to the language / tag filters
//! - `func:parse` records a function name
//! - `size:>100`, `size:<2000`, `size:100-2000` set byte bounds
//! - `date:>2024-01-01`, `date:<2024-12-31`, `date:2024-01-01..2024-06-30`, `date:2024-03-05`

use super::types::SearchFilter;
use crate::error::AppError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::debug;

/// Parsed search query
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedQuery {
    /// Original unmodified query
    pub original: String,
    /// Free-text terms, in query order, case preserved
    pub terms: Vec<String>,
    /// Constraints collected from directives
    pub filters: SearchFilter,
    /// `AND` / `OR` / `NOT`, upper-cased, in query order
    pub operators: Vec<String>,
    /// Function names from `func:` directives
    pub functions: Vec<String>,
}

impl ParsedQuery {
    /// Terms joined back into a single query string
    pub fn text(&self) -> String {
        self.terms.join(" ")
    }
}

#[derive(Debug, PartialEq)]
enum Token {
    Word(String),
    Phrase(String),
}

/// Query parser
pub struct QueryParser;

impl QueryParser {
    /// Parse a search query into its components
    pub fn parse(query: &str) -> ParsedQuery {
        let mut parsed = ParsedQuery {
            original: query.to_string(),
            ..Default::default()
        };

        for token in Self::split_tokens(query) {
            let word = match token {
                Token::Phrase(phrase) => {
                    parsed.terms.push(phrase);
                    continue;
                }
                Token::Word(word) => word,
            };

            if let Some(op) = Self::operator(&word) {
                parsed.operators.push(op.to_string());
                continue;
            }

            if let Some((key, value)) = word.split_once(':') {
                if Self::apply_directive(&mut parsed, &key.to_lowercase(), value) {
                    continue;
                }
            }

            parsed.terms.push(word);
        }

        parsed
    }

    fn operator(word: &str) -> Option<&'static str> {
        ["AND", "OR", "NOT"]
            .into_iter()
            .find(|op| word.eq_ignore_ascii_case(op))
    }

    /// Apply a `key:value` directive. Returns false when the key is not a directive.
    fn apply_directive(parsed: &mut ParsedQuery, key: &str, value: &str) -> bool {
        let value = value.trim();
        match key {
            "lang" | "tag" | "func" if value.is_empty() => {
                debug!("Dropping empty {}: directive", key);
            }
            "lang" => parsed.filters.languages.push(value.to_lowercase()),
            "tag" => parsed.filters.tags.push(value.to_lowercase()),
            "func" => parsed.functions.push(value.to_string()),
            "size" => {
                if !Self::apply_size(&mut parsed.filters, value) {
                    debug!("Dropping malformed size directive {:?}", value);
                }
            }
            "date" => {
                if !Self::apply_date(&mut parsed.filters, value) {
                    debug!("Dropping malformed date directive {:?}", value);
                }
            }
            _ => return false,
        }
        true
    }

    fn apply_size(filters: &mut SearchFilter, value: &str) -> bool {
        let bytes = |s: &str| s.trim().parse::<usize>().ok();

        if let Some(min) = value.strip_prefix('>') {
            let Some(min) = bytes(min) else { return false };
            filters.min_size = Some(min);
        } else if let Some(max) = value.strip_prefix('<') {
            let Some(max) = bytes(max) else { return false };
            filters.max_size = Some(max);
        } else if let Some((lo, hi)) = value.split_once('-') {
            let (Some(lo), Some(hi)) = (bytes(lo), bytes(hi)) else {
                return false;
            };
            filters.min_size = Some(lo);
            filters.max_size = Some(hi);
        } else {
            return false;
        }
        true
    }

    fn apply_date(filters: &mut SearchFilter, value: &str) -> bool {
        if let Some(from) = value.strip_prefix('>') {
            let Some(day) = parse_day(from) else { return false };
            filters.date_from = Some(start_of(day));
        } else if let Some(to) = value.strip_prefix('<') {
            let Some(day) = parse_day(to) else { return false };
            filters.date_to = Some(end_of(day));
        } else if let Some((from, to)) = value.split_once("..") {
            let (Some(from), Some(to)) = (parse_day(from), parse_day(to)) else {
                return false;
            };
            filters.date_from = Some(start_of(from));
            filters.date_to = Some(end_of(to));
        } else {
            let Some(day) = parse_day(value) else { return false };
            filters.date_from = Some(start_of(day));
            filters.date_to = Some(end_of(day));
        }
        true
    }

    /// Split on whitespace, keeping double-quoted phrases whole
    fn split_tokens(query: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut word = String::new();
        let mut chars = query.chars();

        let flush = |word: &mut String, tokens: &mut Vec<Token>| {
            if !word.is_empty() {
                tokens.push(Token::Word(std::mem::take(word)));
            }
        };

        while let Some(ch) = chars.next() {
            if ch == '"' {
                let mut phrase = String::new();
                let mut closed = false;

                while let Some(c) = chars.next() {
                    match c {
                        '"' => {
                            closed = true;
                            break;
                        }
                        '\\' => {
                            if let Some(escaped) = chars.next() {
                                phrase.push(escaped);
                            }
                        }
                        _ => phrase.push(c),
                    }
                }

                if closed {
                    flush(&mut word, &mut tokens);
                    if !phrase.trim().is_empty() {
                        tokens.push(Token::Phrase(phrase));
                    }
                } else {
                    // Unclosed quote - treat the quote literally
                    word.push('"');
                    for c in phrase.chars() {
                        if c.is_whitespace() {
                            flush(&mut word, &mut tokens);
                        } else {
                            word.push(c);
                        }
                    }
                }
            } else if ch.is_whitespace() {
                flush(&mut word, &mut tokens);
            } else {
                word.push(ch);
            }
        }
        flush(&mut word, &mut tokens);

        tokens
    }
}

fn parse_day(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

fn start_of(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(chrono::NaiveTime::MIN).and_utc()
}

fn end_of(day: NaiveDate) -> DateTime<Utc> {
    match day.and_hms_nano_opt(23, 59, 59, 999_999_999) {
        Some(end) => end.and_utc(),
        None => start_of(day),
    }
}

/// Boolean combination of parsed queries.
///
/// Operator precedence and short-circuit rules are undecided, so every combinator reports
/// [`AppError::NotImplemented`].
pub struct QueryCombinator;

impl QueryCombinator {
    pub fn combine_and(_parts: &[ParsedQuery]) -> Result<ParsedQuery, AppError> {
        Err(AppError::NotImplemented("AND query combination".to_string()))
    }

    pub fn combine_or(_parts: &[ParsedQuery]) -> Result<ParsedQuery, AppError> {
        Err(AppError::NotImplemented("OR query combination".to_string()))
    }

    pub fn apply_not(_query: &ParsedQuery) -> Result<ParsedQuery, AppError> {
        Err(AppError::NotImplemented("NOT query negation".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_basic_parsing() {
        let parsed = QueryParser::parse("hello world");
        assert_eq!(parsed.original, "hello world");
        assert_eq!(parsed.terms, vec!["hello", "world"]);
        assert!(parsed.operators.is_empty());
        assert!(parsed.filters.is_empty());
        assert_eq!(parsed.text(), "hello world");
    }

    #[test]
    fn test_operators_any_case() {
        let parsed = QueryParser::parse("foo and bar NOT baz Or qux");
        assert_eq!(parsed.terms, vec!["foo", "bar", "baz", "qux"]);
        assert_eq!(parsed.operators, vec!["AND", "NOT", "OR"]);
    }

    #[test]
    fn test_lang_tag_func_directives() {
        let parsed = QueryParser::parse("parse lang:Python tag:utils func:load_config");
        assert_eq!(parsed.terms, vec!["parse"]);
        assert_eq!(parsed.filters.languages, vec!["python"]);
        assert_eq!(parsed.filters.tags, vec!["utils"]);
        assert_eq!(parsed.functions, vec!["load_config"]);
    }

    #[test]
    fn test_size_directive() {
        let parsed = QueryParser::parse("size:>100");
        assert_eq!(parsed.filters.min_size, Some(100));
        assert_eq!(parsed.filters.max_size, None);

        let parsed = QueryParser::parse("size:<2000");
        assert_eq!(parsed.filters.max_size, Some(2000));

        let parsed = QueryParser::parse("size:100-2000");
        assert_eq!(parsed.filters.min_size, Some(100));
        assert_eq!(parsed.filters.max_size, Some(2000));
    }

    #[test]
    fn test_malformed_directive_is_dropped() {
        let parsed = QueryParser::parse("foo size:big date:yesterday lang:");
        assert_eq!(parsed.terms, vec!["foo"]);
        assert!(parsed.filters.is_empty());
    }

    #[test]
    fn test_date_directive() {
        let parsed = QueryParser::parse("date:2024-03-05");
        assert_eq!(
            parsed.filters.date_from,
            Some(Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap())
        );
        let to = parsed.filters.date_to.unwrap();
        assert!(to > Utc.with_ymd_and_hms(2024, 3, 5, 23, 59, 59).unwrap());
        assert!(to < Utc.with_ymd_and_hms(2024, 3, 6, 0, 0, 0).unwrap());

        let parsed = QueryParser::parse("date:2024-01-01..2024-06-30");
        assert_eq!(
            parsed.filters.date_from,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
        assert!(parsed.filters.date_to.is_some());

        let parsed = QueryParser::parse("date:>2024-01-01");
        assert!(parsed.filters.date_from.is_some());
        assert!(parsed.filters.date_to.is_none());
    }

    #[test]
    fn test_unknown_key_is_a_term() {
        let parsed = QueryParser::parse("https://example.com std::fs");
        assert_eq!(parsed.terms, vec!["https://example.com", "std::fs"]);
    }

    #[test]
    fn test_quoted_phrases() {
        let parsed = QueryParser::parse(r#"hello "exact match" AND world"#);
        assert_eq!(parsed.terms, vec!["hello", "exact match", "world"]);
        assert_eq!(parsed.operators, vec!["AND"]);
    }

    #[test]
    fn test_quoted_operator_is_a_term() {
        let parsed = QueryParser::parse(r#""and""#);
        assert_eq!(parsed.terms, vec!["and"]);
        assert!(parsed.operators.is_empty());
    }

    #[test]
    fn test_escaped_quotes() {
        let parsed = QueryParser::parse(r#""quote with \" inside""#);
        assert_eq!(parsed.terms, vec![r#"quote with " inside"#]);
    }

    #[test]
    fn test_unclosed_quote() {
        let parsed = QueryParser::parse(r#"hello "unclosed world"#);
        assert_eq!(parsed.terms, vec!["hello", "\"unclosed", "world"]);
    }

    #[test]
    fn test_empty_query() {
        let parsed = QueryParser::parse("   ");
        assert!(parsed.terms.is_empty());
        assert!(parsed.operators.is_empty());
    }

    #[test]
    fn test_combinators_not_implemented() {
        let parsed = QueryParser::parse("foo");
        let parts = vec![parsed.clone(), parsed.clone()];

        for result in [
            QueryCombinator::combine_and(&parts),
            QueryCombinator::combine_or(&parts),
            QueryCombinator::apply_not(&parsed),
        ] {
            let err = result.unwrap_err();
            assert_eq!(err.error_code(), "not_implemented");
        }
    }
}
