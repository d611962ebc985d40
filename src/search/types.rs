//! Request and response types for the search engine

use crate::document::Document;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Matching strategy requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    #[default]
    Text,
    Regex,
    Fuzzy,
    Function,
    Content,
    /// Reserved; no strategy is registered for it
    Semantic,
}

impl SearchType {
    pub const ALL: [SearchType; 6] = [
        SearchType::Text,
        SearchType::Regex,
        SearchType::Fuzzy,
        SearchType::Function,
        SearchType::Content,
        SearchType::Semantic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::Text => "text",
            SearchType::Regex => "regex",
            SearchType::Fuzzy => "fuzzy",
            SearchType::Function => "function",
            SearchType::Content => "content",
            SearchType::Semantic => "semantic",
        }
    }

    /// Parse a type name; anything unrecognised falls back to `Text`
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "regex" | "re" => SearchType::Regex,
            "fuzzy" => SearchType::Fuzzy,
            "function" | "func" | "functions" => SearchType::Function,
            "content" => SearchType::Content,
            "semantic" => SearchType::Semantic,
            _ => SearchType::Text,
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

/// Result ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Relevance,
    /// Most recently updated first
    DateDesc,
    DateAsc,
    NameAsc,
    NameDesc,
    /// Largest content first
    SizeDesc,
    SizeAsc,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "relevance" => Ok(SortOrder::Relevance),
            "date_desc" | "newest" => Ok(SortOrder::DateDesc),
            "date_asc" | "oldest" => Ok(SortOrder::DateAsc),
            "name_asc" | "name" => Ok(SortOrder::NameAsc),
            "name_desc" => Ok(SortOrder::NameDesc),
            "size_desc" | "largest" => Ok(SortOrder::SizeDesc),
            "size_asc" | "smallest" => Ok(SortOrder::SizeAsc),
            other => Err(format!("unknown sort order: {}", other)),
        }
    }
}

/// Conjunctive constraints applied after matching. Unset fields do not constrain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFilter {
    /// Any-of, compared case-insensitively
    pub languages: Vec<String>,
    /// Any-of, compared case-insensitively
    pub tags: Vec<String>,
    /// Inclusive lower bound on `updated_at`
    pub date_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `updated_at`
    pub date_to: Option<DateTime<Utc>>,
    /// Content size bounds in bytes, inclusive
    pub min_size: Option<usize>,
    pub max_size: Option<usize>,
    pub has_functions: Option<bool>,
    pub has_classes: Option<bool>,
    /// Regex matched against the document name
    pub file_pattern: Option<String>,
}

impl SearchFilter {
    pub fn is_empty(&self) -> bool {
        *self == SearchFilter::default()
    }

    pub fn with_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages = languages.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// One located match inside a document's content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextMatch {
    /// Byte offsets into the content
    pub start: usize,
    pub end: usize,
    pub text: String,
    /// 1-based line of `start`
    pub line: usize,
}

/// A scored document returned from a search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub name: String,
    pub content: String,
    pub language: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u32,
    /// Strategy-specific scale; only comparable within one search type
    pub relevance_score: f64,
    pub matches: Vec<TextMatch>,
    pub preview_snippet: String,
    /// Byte ranges into `preview_snippet`
    pub highlight_ranges: Vec<(usize, usize)>,
}

impl SearchResult {
    pub fn from_document(doc: Document, relevance_score: f64) -> Self {
        Self {
            name: doc.name,
            content: doc.content,
            language: doc.language,
            tags: doc.tags,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
            version: doc.version,
            relevance_score,
            matches: Vec::new(),
            preview_snippet: String::new(),
            highlight_ranges: Vec::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.content.len()
    }
}
