//! snippet-search CLI
//!
//! Loads a JSON corpus into an in-process store and runs one engine operation against it:
//! - `search` - run a query for a tenant
//! - `suggest` - complete a partial query from the tenant's index
//! - `stats` - summarize the tenant's index
//! - `parse` - show how a query string is interpreted

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, CorpusArgs};
use snippet_search::config::{load_config, load_config_from};
use snippet_search::search::QueryParser;
use snippet_search::{AppError, EngineConfig, MemoryStore, PatternAnalyzer, SearchEngine, SearchType};
use std::sync::Arc;
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity flags
    let log_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr) // Log to stderr to keep stdout clean
        .init();

    match run(cli).await {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(get_exit_code(&e));
        }
    }
}

async fn run(cli: Cli) -> Result<String> {
    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    match cli.command {
        Commands::Search(args) => execute_search(args, config).await,
        Commands::Suggest(args) => {
            let engine = open_engine(&args.corpus, config)?;
            let limit = args.limit.unwrap_or(engine.config().suggestion_limit);
            let suggestions = engine
                .suggest_completions(&args.corpus.tenant, &args.prefix, limit)
                .await?;
            Ok(serde_json::to_string_pretty(&suggestions)?)
        }
        Commands::Stats(args) => {
            let engine = open_engine(&args.corpus, config)?;
            let stats = engine.statistics(&args.corpus.tenant).await?;
            Ok(serde_json::to_string_pretty(&stats)?)
        }
        Commands::Parse(args) => {
            let parsed = QueryParser::parse(&args.query);
            Ok(serde_json::to_string_pretty(&parsed)?)
        }
    }
}

async fn execute_search(args: cli::SearchArgs, config: EngineConfig) -> Result<String> {
    let engine = open_engine(&args.corpus, config)?;
    let limit = args.limit.unwrap_or(engine.config().default_limit);
    let mut filter = args.filter();
    let mut query = args.query.clone();
    let mut search_type = args.search_type;

    if args.parse {
        let parsed = QueryParser::parse(&args.query);
        debug!("Parsed query: {:?}", parsed);

        filter.languages.extend(parsed.filters.languages);
        filter.tags.extend(parsed.filters.tags);
        filter.min_size = parsed.filters.min_size.or(filter.min_size);
        filter.max_size = parsed.filters.max_size.or(filter.max_size);
        filter.date_from = parsed.filters.date_from.or(filter.date_from);
        filter.date_to = parsed.filters.date_to.or(filter.date_to);

        query = parsed.terms.join(" ");
        if query.trim().is_empty() && !parsed.functions.is_empty() {
            query = parsed.functions.join(" ");
            search_type = SearchType::Function;
        }
    }

    let filter = (!filter.is_empty()).then_some(filter);
    let results = engine
        .search(
            &args.corpus.tenant,
            &query,
            search_type,
            filter.as_ref(),
            args.sort,
            limit,
        )
        .await?;

    Ok(serde_json::to_string_pretty(&results)?)
}

fn open_engine(args: &CorpusArgs, config: EngineConfig) -> Result<SearchEngine> {
    let store = MemoryStore::from_json_file(&args.corpus)
        .with_context(|| format!("Failed to load corpus {}", args.corpus.display()))?;
    let analyzer = PatternAnalyzer::new()?;
    Ok(SearchEngine::new(Arc::new(store), Arc::new(analyzer), config))
}

/// Map AppError to exit code
fn get_exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<AppError>() {
        Some(AppError::InvalidInput(_)) | Some(AppError::Config(_)) => 1, // Invalid arguments or usage error
        Some(AppError::StorageUnavailable(_)) | Some(AppError::IndexUnavailable { .. }) => 2, // Storage error
        Some(AppError::NotImplemented(_)) => 3,
        _ => 5, // Other application errors
    }
}
