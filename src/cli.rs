//! CLI mode implementation
//!
//! Runs the engine over a JSON corpus file and prints results as JSON

use clap::{Args, Parser, Subcommand};
use snippet_search::{SearchFilter, SearchType, SortOrder};
use std::path::PathBuf;

/// Snippet search CLI
#[derive(Parser)]
#[command(name = "snippet-search")]
#[command(about = "Multi-tenant code snippet search", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output (no short flag to avoid conflicts)
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Engine config file (defaults to the user config directory)
    #[arg(long, global = true, env = "SNIPPET_SEARCH_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search a tenant's snippets
    Search(SearchArgs),
    /// Complete a partial query from the tenant's index
    Suggest(SuggestArgs),
    /// Show index statistics for a tenant
    Stats(StatsArgs),
    /// Show how a query is split into terms, operators and filters
    Parse(ParseArgs),
}

/// Corpus and tenant selection shared by the engine commands
#[derive(Args, Clone, Debug)]
pub struct CorpusArgs {
    /// JSON corpus: {"tenants": {"<id>": [document, ...]}}
    #[arg(short = 'c', long)]
    pub corpus: PathBuf,

    /// Tenant id
    #[arg(short = 't', long)]
    pub tenant: String,
}

/// Search command arguments
#[derive(Args, Clone, Debug)]
pub struct SearchArgs {
    #[command(flatten)]
    pub corpus: CorpusArgs,

    /// Query text
    #[arg(short = 'q', long)]
    pub query: String,

    /// text, regex, fuzzy, function, content or semantic (unknown names search text)
    #[arg(long = "type", default_value = "text")]
    pub search_type: SearchType,

    /// relevance, date_desc, date_asc, name_asc, name_desc, size_desc or size_asc
    #[arg(short = 's', long, default_value = "relevance")]
    pub sort: SortOrder,

    /// Maximum number of results (defaults to the configured limit)
    #[arg(short = 'l', long)]
    pub limit: Option<usize>,

    /// Only these languages (repeatable)
    #[arg(long = "lang")]
    pub languages: Vec<String>,

    /// Only documents carrying one of these tags (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Minimum content size in bytes
    #[arg(long)]
    pub min_size: Option<usize>,

    /// Maximum content size in bytes
    #[arg(long)]
    pub max_size: Option<usize>,

    /// Regex the document name must match
    #[arg(long)]
    pub file_pattern: Option<String>,

    /// Require (true) or exclude (false) documents defining functions
    #[arg(long)]
    pub has_functions: Option<bool>,

    /// Require (true) or exclude (false) documents defining classes
    #[arg(long)]
    pub has_classes: Option<bool>,

    /// Apply lang:/tag:/func:/size:/date: directives found in the query
    #[arg(long)]
    pub parse: bool,
}

impl SearchArgs {
    /// Filter built from the explicit flags
    pub fn filter(&self) -> SearchFilter {
        SearchFilter {
            languages: self.languages.clone(),
            tags: self.tags.clone(),
            min_size: self.min_size,
            max_size: self.max_size,
            file_pattern: self.file_pattern.clone(),
            has_functions: self.has_functions,
            has_classes: self.has_classes,
            ..Default::default()
        }
    }
}

/// Suggest command arguments
#[derive(Args, Clone, Debug)]
pub struct SuggestArgs {
    #[command(flatten)]
    pub corpus: CorpusArgs,

    /// Partial query (at least two characters)
    #[arg(short = 'p', long)]
    pub prefix: String,

    /// Maximum number of suggestions (defaults to the configured limit)
    #[arg(short = 'l', long)]
    pub limit: Option<usize>,
}

/// Stats command arguments
#[derive(Args, Clone, Debug)]
pub struct StatsArgs {
    #[command(flatten)]
    pub corpus: CorpusArgs,
}

/// Parse command arguments
#[derive(Args, Clone, Debug)]
pub struct ParseArgs {
    /// Query text
    #[arg(short = 'q', long)]
    pub query: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_args() {
        let cli = Cli::try_parse_from([
            "snippet-search",
            "search",
            "-c",
            "corpus.json",
            "-t",
            "u1",
            "-q",
            "foo",
            "--type",
            "function",
            "--sort",
            "name-desc",
            "--lang",
            "python",
            "--lang",
            "rust",
            "--has-functions",
            "true",
        ])
        .unwrap();

        let Commands::Search(args) = cli.command else {
            panic!("expected search command");
        };
        assert_eq!(args.corpus.tenant, "u1");
        assert_eq!(args.search_type, SearchType::Function);
        assert_eq!(args.sort, SortOrder::NameDesc);
        assert_eq!(args.limit, None);

        let filter = args.filter();
        assert_eq!(filter.languages, vec!["python", "rust"]);
        assert_eq!(filter.has_functions, Some(true));
        assert!(filter.tags.is_empty());
    }

    #[test]
    fn test_unknown_type_falls_back_to_text() {
        let cli = Cli::try_parse_from([
            "snippet-search", "search", "-c", "x.json", "-t", "u1", "-q", "foo", "--type", "vector",
        ])
        .unwrap();
        let Commands::Search(args) = cli.command else {
            panic!("expected search command");
        };
        assert_eq!(args.search_type, SearchType::Text);
        assert!(args.filter().is_empty());
    }

    #[test]
    fn test_bad_sort_rejected() {
        let result = Cli::try_parse_from([
            "snippet-search", "search", "-c", "x.json", "-t", "u1", "-q", "foo", "--sort", "random",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from(["snippet-search", "parse", "-q", "lang:rust", "--verbose"])
            .unwrap();
        assert!(cli.verbose);
        assert!(!cli.quiet);
        assert!(matches!(cli.command, Commands::Parse(_)));
    }
}
