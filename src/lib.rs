//! snippet-search
//!
//! Multi-tenant search over stored code snippets. Each tenant gets an inverted index
//! (tokens, function names, languages, tags) built from a full snapshot of its documents
//! and cached until it goes stale. Queries run one of five matching strategies (text,
//! regex, fuzzy, function, content) followed by conjunctive filtering and sorting.

pub mod analysis;
pub mod config;
pub mod document;
pub mod error;
pub mod index;
pub mod search;
pub mod store;

pub use analysis::{CodeAnalyzer, PatternAnalyzer};
pub use config::EngineConfig;
pub use document::{Document, DocumentKey, FunctionInfo};
pub use error::AppError;
pub use search::{SearchEngine, SearchFilter, SearchResult, SearchType, SortOrder};
pub use store::{DocumentStore, MemoryStore};
