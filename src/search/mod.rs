//! Search over tenant indexes
//!
//! [`SearchEngine`] is the entry point. Strategies live in [`matchers`], filtering and
//! ordering in [`ranking`], and query directive parsing in [`parser`].

pub mod engine;
pub mod fuzzy;
pub mod matchers;
pub mod parser;
pub mod preview;
pub mod ranking;
pub mod types;


pub use engine::SearchEngine;
pub use fuzzy::FuzzyMatcher;
pub use parser::{ParsedQuery, QueryCombinator, QueryParser};
pub use types::{SearchFilter, SearchResult, SearchType, SortOrder, TextMatch};
