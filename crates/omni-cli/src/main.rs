//! OmniContext CLI.
//!
//! Command-line interface for indexing, searching, and managing
//! OmniContext indexes. Thin collaborator over `omni-core::Engine`: no
//! query or indexing logic lives here, only argument parsing, process
//! exit codes (spec.md §6), and text/JSON rendering.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use omni_core::config::Config;
use omni_core::error::OmniError;
use omni_core::pipeline::{Engine, IndexMode};
use omni_core::{paths, types};

/// OmniContext - Universal Code Context Engine
#[derive(Parser, Debug)]
#[command(name = "omnicontext", version, about = "Universal code context engine for AI coding agents")]
struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Commands,

    /// Log level.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Name of the index to operate on. When omitted, auto-detects the
    /// ready index whose root is the deepest ancestor of the current
    /// directory (spec.md §4.6).
    #[arg(long, global = true)]
    index: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Index a repository, creating the named index if it doesn't exist.
    Index {
        /// Path to the repository root.
        #[arg(default_value = ".")]
        path: String,
    },

    /// Search the indexed codebase.
    Search {
        /// Search query (natural language or keywords).
        query: String,

        /// Maximum number of results.
        #[arg(short, long, default_value_t = 10)]
        limit: usize,

        /// MMR diversity weight in [0, 1]; 0 disables diversification.
        #[arg(long, default_value_t = 0.0)]
        diversity: f64,
    },

    /// List callers of a symbol.
    Callers {
        /// Symbol name.
        symbol: String,
    },

    /// Files transitively affected by a change to a symbol.
    Impact {
        /// Symbol name.
        symbol: String,

        /// Traversal depth.
        #[arg(long, default_value_t = 3)]
        depth: usize,
    },

    /// List symbols with zero incoming calls.
    Dead {
        /// Restrict to a symbol kind (function, class, ...).
        #[arg(long)]
        kind: Option<String>,
    },

    /// List symbols semantically similar to each other.
    Similar {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// List simple cycles in the file dependency graph.
    Cycles,

    /// Show engine status and index statistics.
    Status,

    /// Parse a free-text query into a `{command, args}` pair, without
    /// running it.
    Ask {
        /// The free-text query, e.g. "what calls awardBadge".
        query: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(&cli.log_level)
        .init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(error) => {
            eprintln!("error: failed to start async runtime: {error}");
            return ExitCode::from(2);
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code() as u8)
        }
    }
}

async fn run(cli: Cli) -> Result<(), OmniError> {
    let data_root = paths::data_root();

    match cli.command {
        Commands::Index { path } => {
            let root_path = canonicalize(&path)?;
            let config = Config::load(&data_root)?;
            let index_name = cli.index.unwrap_or_else(|| "default".to_string());
            let mut engine = Engine::open(&data_root, &index_name, &root_path, config)?;
            let report = engine.run_index(IndexMode::Update).await?;
            println!(
                "processed={} skipped={} added={} updated={} deleted={} chunks={}",
                report.files_processed,
                report.files_skipped,
                report.files_added,
                report.files_updated,
                report.files_deleted,
                report.chunks_created
            );
            Ok(())
        }
        Commands::Search { query, limit, diversity } => {
            let engine = open_existing(&data_root, cli.index.as_deref())?;
            let results = engine.search(&query, limit, diversity)?;
            print_json(&results)
        }
        Commands::Callers { symbol } => {
            let engine = open_existing(&data_root, cli.index.as_deref())?;
            let results = engine.callers(&symbol)?;
            print_json(&results)
        }
        Commands::Impact { symbol, depth } => {
            let engine = open_existing(&data_root, cli.index.as_deref())?;
            let result = engine.impact(&symbol, depth)?;
            print_json(&result)
        }
        Commands::Dead { kind } => {
            let engine = open_existing(&data_root, cli.index.as_deref())?;
            let kind = kind.map(|k| types::SymbolKind::from_str_lossy(&k));
            let results = engine.dead(kind)?;
            print_json(&results)
        }
        Commands::Similar { limit } => {
            let engine = open_existing(&data_root, cli.index.as_deref())?;
            let results = engine.similar(limit)?;
            print_json(&results)
        }
        Commands::Cycles => {
            let engine = open_existing(&data_root, cli.index.as_deref())?;
            let cycles = engine.cycles()?;
            print_json(&cycles)
        }
        Commands::Status => {
            let engine = open_existing(&data_root, cli.index.as_deref())?;
            let stats = engine.status()?;
            print_json(&stats)
        }
        Commands::Ask { query } => {
            let parsed = omni_core::search::command::parse(&query);
            print_json(&parsed)
        }
    }
}

/// Resolve the index name: an explicit `--index` wins outright; otherwise
/// auto-detect from the current directory (spec.md §4.6, §8 scenario 2).
fn resolve_index_name(data_root: &Path, index: Option<&str>) -> Result<String, OmniError> {
    if let Some(name) = index {
        return Ok(name.to_string());
    }
    let cwd = std::env::current_dir().map_err(|error| OmniError::InvalidInput {
        details: format!("cannot resolve current directory: {error}"),
    })?;
    omni_core::index::auto_detect_index(data_root, &cwd)?
        .ok_or_else(|| OmniError::NotFound { entity: "index (auto-detect found none)".to_string() })
}

fn open_existing(data_root: &Path, index: Option<&str>) -> Result<Engine, OmniError> {
    let index_name = resolve_index_name(data_root, index)?;
    let db_path = paths::index_db_path(data_root, &index_name);
    if !db_path.exists() {
        return Err(OmniError::NotFound { entity: format!("index {index_name}") });
    }
    let store = omni_core::index::MetadataIndex::open(&db_path)?;
    let meta = store
        .get_metadata()?
        .ok_or_else(|| OmniError::NotFound { entity: format!("index {index_name}") })?;
    let config = Config::load(data_root)?;
    Engine::open(data_root, &index_name, &meta.root_path, config)
}

fn canonicalize(path: &str) -> Result<PathBuf, OmniError> {
    std::fs::canonicalize(path).map_err(|error| OmniError::InvalidInput {
        details: format!("cannot resolve path {path:?}: {error}"),
    })
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), OmniError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|error| OmniError::Serialization(error.to_string()))?;
    println!("{text}");
    Ok(())
}
