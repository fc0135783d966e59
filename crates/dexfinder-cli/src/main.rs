//! Dexfinder CLI - incremental Pokédex search and filtering

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dexfinder_core::catalog::{CatalogClient, HttpCatalogClient, StaticCatalog};
use dexfinder_core::config::Config;
use dexfinder_core::domain::{
    Entity, FilterCriteria, SearchResult, StatName, ValueRange, filter_entities, generation_info,
};
use dexfinder_core::loader::IncrementalLoader;
use dexfinder_core::search::{Debouncer, SearchCoordinator, SearchOptions};
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use tracing::{debug, warn};

#[derive(Parser)]
#[command(name = "dexfinder")]
#[command(author, version, about = "Incremental Pokédex search and filtering", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Serve the catalog from a JSON file of detail records instead of the network
    #[arg(long, global = true, value_name = "PATH")]
    fixture: Option<PathBuf>,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Search Pokémon whose name contains QUERY
    Search {
        query: String,
        /// Maximum number of results (defaults to search.default_limit)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show one Pokémon by dex number or name
    Show { id_or_name: String },

    /// Page through the catalog
    Browse {
        /// Number of pages to load
        #[arg(short, long, default_value_t = 1)]
        pages: usize,
    },

    /// Load the catalog and filter it
    Filter {
        /// Keep Pokémon having any of these types
        #[arg(short = 't', long = "type", value_name = "TYPE")]
        types: Vec<String>,
        /// Keep one generation (1-9)
        #[arg(short, long)]
        generation: Option<u8>,
        /// Stat range, e.g. speed=90..110 or hp=100..
        #[arg(short, long = "stat", value_name = "STAT=MIN..MAX")]
        stats: Vec<StatBound>,
        /// Base stat total range
        #[arg(long, value_name = "MIN..MAX")]
        total: Option<ValueRange>,
        /// Height range in decimetres
        #[arg(long, value_name = "MIN..MAX")]
        height: Option<ValueRange>,
        /// Weight range in hectograms
        #[arg(long, value_name = "MIN..MAX")]
        weight: Option<ValueRange>,
        /// Pages to load before filtering (defaults to the whole catalog)
        #[arg(short, long)]
        pages: Option<usize>,
    },

    /// Type queries and get debounced suggestions
    Interactive {
        /// Maximum number of results per query
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration values
    List,
    /// Reset configuration to defaults
    Reset,
    /// Show config file path
    Path,
}

/// `STAT=MIN..MAX` argument
#[derive(Debug, Clone, Copy)]
struct StatBound {
    stat: StatName,
    range: ValueRange,
}

impl FromStr for StatBound {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (stat, range) = s
            .split_once('=')
            .ok_or_else(|| format!("expected STAT=MIN..MAX, got '{}'", s))?;
        Ok(Self {
            stat: stat.parse().map_err(|e| format!("{}", e))?,
            range: range.parse().map_err(|e| format!("{}", e))?,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let directive = if cli.quiet { "dexfinder=warn" } else { "dexfinder=info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(directive.parse()?),
        )
        .init();

    let format = cli.format;
    let quiet = cli.quiet;
    let fixture = cli.fixture.as_deref();

    match cli.command {
        Commands::Search { query, limit } => cmd_search(fixture, &query, limit, format).await,

        Commands::Show { id_or_name } => cmd_show(fixture, &id_or_name, format).await,

        Commands::Browse { pages } => cmd_browse(fixture, pages, format, quiet).await,

        Commands::Filter {
            types,
            generation,
            stats,
            total,
            height,
            weight,
            pages,
        } => {
            let mut criteria = FilterCriteria::new().with_types(&types);
            if let Some(generation) = generation {
                criteria = criteria.with_generation(generation);
            }
            for bound in stats {
                criteria = criteria.with_stat(bound.stat, bound.range);
            }
            if let Some(total) = total {
                criteria = criteria.with_total(total);
            }
            if let Some(height) = height {
                criteria = criteria.with_height(height);
            }
            if let Some(weight) = weight {
                criteria = criteria.with_weight(weight);
            }
            cmd_filter(fixture, criteria, pages, format, quiet).await
        }

        Commands::Interactive { limit } => cmd_interactive(fixture, limit, quiet).await,

        Commands::Config { action } => cmd_config(action, format, quiet),
    }
}

/// Open the catalog named by `--fixture`, or PokeAPI per configuration
fn open_catalog(fixture: Option<&Path>, config: &Config) -> anyhow::Result<Arc<dyn CatalogClient>> {
    match fixture {
        Some(path) => {
            let catalog = StaticCatalog::from_json_file(path)
                .with_context(|| format!("Failed to load fixture: {}", path.display()))?;
            debug!(records = catalog.records().len(), "Using fixture catalog");
            Ok(Arc::new(catalog))
        }
        None => Ok(Arc::new(HttpCatalogClient::new(&config.catalog)?)),
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn cmd_search(
    fixture: Option<&Path>,
    query: &str,
    limit: Option<usize>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let config = Config::load()?;
    let catalog = open_catalog(fixture, &config)?;
    let options = SearchOptions::from_config(&config);
    let min_query_len = options.min_query_len;
    let coordinator = SearchCoordinator::with_options(catalog, options);

    let limit = limit.unwrap_or(config.search.default_limit);
    let results = coordinator.search(query, limit).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
        OutputFormat::Text => {
            if results.is_empty() {
                if query.trim().chars().count() < min_query_len {
                    println!("Type at least {} characters to search.", min_query_len);
                } else {
                    println!("No Pokémon matching '{}'.", query.trim());
                }
            }
            for result in &results {
                println!("{}", suggestion_row(result));
            }
        }
    }
    Ok(())
}

async fn cmd_show(fixture: Option<&Path>, id_or_name: &str, format: OutputFormat) -> anyhow::Result<()> {
    let config = Config::load()?;
    let catalog = open_catalog(fixture, &config)?;
    let coordinator = SearchCoordinator::new(catalog);

    let entity = coordinator.get_entity(id_or_name).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entity)?),
        OutputFormat::Text => print_details(&entity),
    }
    Ok(())
}

async fn cmd_browse(
    fixture: Option<&Path>,
    pages: usize,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let config = Config::load()?;
    let catalog = open_catalog(fixture, &config)?;
    let loader = IncrementalLoader::new(catalog, &config.loader);

    loader.load_pages(pages).await?;
    let entities = loader.entities().await;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entities)?),
        OutputFormat::Text => {
            for entity in &entities {
                println!("{}", entity_row(entity));
            }
            if !quiet {
                println!(
                    "\n{} loaded ({}, next offset {})",
                    entities.len(),
                    loader.state().await,
                    loader.offset().await
                );
            }
        }
    }
    Ok(())
}

async fn cmd_filter(
    fixture: Option<&Path>,
    criteria: FilterCriteria,
    pages: Option<usize>,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    // Reject bad criteria before loading anything
    criteria.validate()?;

    let config = Config::load()?;
    let catalog = open_catalog(fixture, &config)?;
    let loader = IncrementalLoader::new(catalog, &config.loader);

    loader.load_pages(pages.unwrap_or(usize::MAX)).await?;
    let entities = loader.entities().await;
    let matched = filter_entities(&entities, &criteria)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&matched)?),
        OutputFormat::Text => {
            for entity in &matched {
                println!("{}", entity_row(entity));
            }
            if !quiet {
                println!("\nMatched {} of {}", matched.len(), entities.len());
            }
        }
    }
    Ok(())
}

type SearchReply = (String, dexfinder_core::Result<Vec<SearchResult>>);

async fn cmd_interactive(fixture: Option<&Path>, limit: Option<usize>, quiet: bool) -> anyhow::Result<()> {
    let config = Config::load()?;
    let catalog = open_catalog(fixture, &config)?;
    let coordinator = Arc::new(SearchCoordinator::with_options(
        catalog,
        SearchOptions::from_config(&config),
    ));
    let limit = limit.unwrap_or(config.search.default_limit);

    if !quiet {
        println!("Type part of a name to search. `:clear` empties the cache, `:quit` exits.");
    }

    let (reply_tx, mut replies) = mpsc::unbounded_channel::<SearchReply>();
    let mut debouncer = {
        let coordinator = Arc::clone(&coordinator);
        Debouncer::new(config.search.debounce_delay(), move |query: String| {
            let coordinator = Arc::clone(&coordinator);
            let reply_tx = reply_tx.clone();
            async move {
                let results = coordinator.search(&query, limit).await;
                let _ = reply_tx.send((query, results));
            }
        })
    };

    // Blocking line editor on a plain thread, detached from runtime shutdown
    let (line_tx, mut lines) = mpsc::unbounded_channel::<String>();
    let prompt = if quiet { "" } else { "dex> " };
    let reader = std::thread::spawn(move || -> rustyline::Result<()> {
        let mut editor = rustyline::DefaultEditor::new()?;
        loop {
            match editor.readline(prompt) {
                Ok(line) => {
                    let _ = editor.add_history_entry(line.as_str());
                    if line_tx.send(line).is_err() {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    });

    let mut input_closed = false;
    loop {
        tokio::select! {
            line = lines.recv() => {
                let Some(line) = line else {
                    input_closed = true;
                    break;
                };
                match line.trim() {
                    ":quit" | ":q" => break,
                    ":clear" => {
                        coordinator.clear_cache().await;
                        if !quiet {
                            println!("Cache cleared.");
                        }
                    }
                    _ => debouncer.call(line),
                }
            }
            Some((query, results)) = replies.recv() => print_replies(&query, results),
        }
    }

    // Let the last debounced query fire, then drain what is still in flight
    while debouncer.is_pending() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    drop(debouncer);
    while let Some((query, results)) = replies.recv().await {
        print_replies(&query, results);
    }

    if input_closed {
        match reader.join() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(error = %e, "Line editor failed");
                return Err(e.into());
            }
            Err(_) => anyhow::bail!("Line editor thread panicked"),
        }
    }
    Ok(())
}

fn print_replies(query: &str, results: dexfinder_core::Result<Vec<SearchResult>>) {
    match results {
        Ok(results) if results.is_empty() => {
            debug!(query = %query.trim(), "No suggestions");
        }
        Ok(results) => {
            println!("-- {}", query.trim());
            for result in &results {
                println!("{}", suggestion_row(result));
            }
        }
        Err(e) => {
            eprintln!("Error [{}]: {}", e.code(), e);
            if let Some(hint) = e.suggestion() {
                eprintln!("  Try: {}", hint);
            }
        }
    }
}

fn cmd_config(action: ConfigAction, format: OutputFormat, quiet: bool) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key)?;
            println!("{}", value);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            if !quiet {
                println!("Set {} = {}", key, config.get(&key)?);
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let items = config.list()?;
            match format {
                OutputFormat::Json => {
                    let map: serde_json::Map<String, serde_json::Value> = items
                        .into_iter()
                        .map(|(key, value)| (key, serde_json::Value::String(value)))
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&map)?);
                }
                OutputFormat::Text => {
                    for (key, value) in items {
                        println!("{} = {}", key, value);
                    }
                }
            }
        }
        ConfigAction::Reset => {
            Config::reset()?;
            if !quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

// ============================================================================
// Formatting
// ============================================================================

fn suggestion_row(result: &SearchResult) -> String {
    format!("#{:04} {} [{}]", result.id, result.name, result.types.join("/"))
}

fn entity_row(entity: &Entity) -> String {
    format!(
        "#{:04} {:<14} {:<18} total {:>3}  gen {}",
        entity.id,
        entity.name,
        entity.types.join("/"),
        entity.total_stats,
        entity.generation
    )
}

fn print_details(entity: &Entity) {
    println!("#{:04} {}", entity.id, entity.name);
    println!("  Types: {}", entity.types.join(", "));
    match generation_info(entity.generation) {
        Some(info) => println!("  Generation: {} ({})", info.number, info.region),
        None => println!("  Generation: {}", entity.generation),
    }
    println!("  Height: {:.1} m", f64::from(entity.height) / 10.0);
    println!("  Weight: {:.1} kg", f64::from(entity.weight) / 10.0);
    if let Some(experience) = entity.base_experience {
        println!("  Base experience: {}", experience);
    }
    println!("  Stats:");
    for stat in StatName::ALL {
        println!("    {:<16} {:>3}", stat.as_str(), entity.stats.get(stat));
    }
    println!("    {:<16} {:>3}", "total", entity.total_stats);
    if let Some(image) = &entity.image {
        println!("  Image: {}", image);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_stat_bound_parsing() {
        let bound: StatBound = "speed=90..110".parse().unwrap();
        assert_eq!(bound.stat, StatName::Speed);
        assert_eq!(bound.range, ValueRange { min: 90, max: 110 });

        let bound: StatBound = "spatk=100..".parse().unwrap();
        assert_eq!(bound.stat, StatName::SpecialAttack);
        assert_eq!(bound.range.max, u32::MAX);

        assert!("speed".parse::<StatBound>().is_err());
        assert!("luck=1..2".parse::<StatBound>().is_err());
        assert!("hp=10..5".parse::<StatBound>().is_err());
    }

    #[test]
    fn test_filter_arguments_parse() {
        let cli = Cli::try_parse_from([
            "dexfinder",
            "filter",
            "--type",
            "fire",
            "-t",
            "water",
            "--stat",
            "speed=60..",
            "--total",
            "300..400",
            "--generation",
            "1",
        ])
        .unwrap();

        match cli.command {
            Commands::Filter {
                types,
                stats,
                total,
                generation,
                ..
            } => {
                assert_eq!(types, vec!["fire", "water"]);
                assert_eq!(stats.len(), 1);
                assert_eq!(total, Some(ValueRange { min: 300, max: 400 }));
                assert_eq!(generation, Some(1));
            }
            _ => panic!("expected filter command"),
        }
    }

    #[test]
    fn test_rows() {
        let result = SearchResult {
            id: 6,
            name: "charizard".into(),
            image: String::new(),
            types: vec!["fire".into(), "flying".into()],
        };
        assert_eq!(suggestion_row(&result), "#0006 charizard [fire/flying]");
    }
}
