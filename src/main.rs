//! memvault CLI entry point

use chrono::Local;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use memvault::{
    commands::{
        cmd_get, cmd_index, cmd_init, cmd_intent, cmd_related, cmd_search, cmd_similar,
        cmd_status, cmd_store, print_document, print_index_stats, print_init, print_search_report,
        print_status, print_stored, print_turn, IndexOptions, StoreOptions, StoreSource,
    },
    config::Config,
    error::{Error, Result},
    memory::{Memory, SearchOptions},
    progress::LogWriterFactory,
    store::DocumentType,
};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "memvault")]
#[command(version, about = "Semantic document memory with booking-intent extraction", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "MEMVAULT_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize memvault configuration, database and blob directory
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Store a single document from a file or inline text
    Store {
        /// File to store
        #[arg(required_unless_present = "text", conflicts_with = "text")]
        path: Option<PathBuf>,

        /// Inline text to store instead of a file
        #[arg(long)]
        text: Option<String>,

        /// Explicit document id (generated when omitted)
        #[arg(long)]
        id: Option<String>,

        /// Document type
        #[arg(long = "type", default_value = "documentation", value_parser = parse_doc_type)]
        doc_type: DocumentType,

        /// Tag to attach (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Id of a related document (repeatable)
        #[arg(long)]
        related: Vec<String>,
    },

    /// Store every text file under a directory
    ///
    /// Files whose content, type and tags are unchanged since the last run are skipped.
    Index {
        /// Directory to index
        path: PathBuf,

        /// Document type for every file (inferred per file when omitted)
        #[arg(long = "type", value_parser = parse_doc_type)]
        doc_type: Option<DocumentType>,

        /// Tag to attach to every file (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// Show a stored document
    Get {
        /// Document id
        id: String,

        /// Load relocated content from blob storage
        #[arg(long)]
        full: bool,
    },

    /// Semantic search over stored documents
    Search {
        /// The search query
        query: String,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,

        /// Only documents of this type
        #[arg(long = "type", value_parser = parse_doc_type)]
        doc_type: Option<DocumentType>,

        /// Only documents at or above this quality score (0-1)
        #[arg(long)]
        min_quality: Option<f32>,

        /// Minimum similarity score (-1 to 1)
        #[arg(short, long)]
        min_score: Option<f32>,

        /// Only documents in this language
        #[arg(long)]
        language: Option<String>,

        /// Append documents linked to the results
        #[arg(long)]
        expand: bool,
    },

    /// Documents most similar to a stored document
    Similar {
        /// Document id
        id: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// Documents directly linked to a stored document
    Related {
        /// Document id
        id: String,
    },

    /// Detect intent and entities in a chat message
    Intent {
        /// The message to analyze
        text: String,

        /// The previous message in the conversation
        #[arg(long)]
        previous: Option<String>,
    },

    /// Show system status
    Status,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_doc_type(s: &str) -> Result<DocumentType> {
    DocumentType::from_str(s)
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(LogWriterFactory::default()))
        .with(filter)
        .init();

    match cli.command {
        Commands::Init { force } => {
            let report = cmd_init(init_base_dir(cli.config.as_deref()), force).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_init(&report);
            }
            return Ok(());
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "memvault", &mut std::io::stdout());
            return Ok(());
        }

        // Intent analysis needs configuration but no database
        Commands::Intent { text, previous } => {
            let config = load_config(cli.config.as_deref())?;
            let today = Local::now().date_naive();
            let turn = cmd_intent(&config.intent, &text, previous.as_deref(), today)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&turn)?);
            } else {
                print_turn(&turn);
            }
            return Ok(());
        }

        _ => {}
    }

    let config = load_config(cli.config.as_deref())?;
    if !config.is_initialized() {
        return Err(Error::NotInitialized);
    }
    let memory = Memory::from_config(&config).await?;

    match cli.command {
        Commands::Store {
            path,
            text,
            id,
            doc_type,
            tags,
            related,
        } => {
            let source = match (path, text) {
                (Some(path), _) => StoreSource::File(path),
                (None, Some(text)) => StoreSource::Text(text),
                (None, None) => {
                    return Err(Error::Other("Provide a file path or --text".to_string()))
                }
            };
            let options = StoreOptions {
                id,
                doc_type,
                tags,
                related,
            };

            let stored = cmd_store(&memory, source, options).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stored)?);
            } else {
                print_stored(&stored);
            }
        }

        Commands::Index {
            path,
            doc_type,
            tags,
        } => {
            let stats = cmd_index(&memory, &path, IndexOptions { doc_type, tags }).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_index_stats(&stats);
            }
        }

        Commands::Get { id, full } => {
            let document = cmd_get(&memory, &id, full).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&document)?);
            } else {
                print_document(&document);
            }
        }

        Commands::Search {
            query,
            limit,
            doc_type,
            min_quality,
            min_score,
            language,
            expand,
        } => {
            let options = SearchOptions {
                k: limit,
                doc_type,
                min_quality,
                language,
                min_score,
                expand: expand.then_some(true),
            };

            let report = cmd_search(&memory, &query, options).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_search_report("Search", &report);
            }
        }

        Commands::Similar { id, limit } => {
            let report = cmd_similar(&memory, &id, limit).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_search_report("Similar to", &report);
            }
        }

        Commands::Related { id } => {
            let report = cmd_related(&memory, &id).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_search_report("Related to", &report);
            }
        }

        Commands::Status => {
            let status = cmd_status(&config, &memory).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print_status(&status);
            }
        }

        Commands::Init { .. } | Commands::Completions { .. } | Commands::Intent { .. } => {
            unreachable!()
        }
    }

    Ok(())
}

/// Base directory for `init`: the parent of a `.toml` path, or the path itself
fn init_base_dir(path: Option<&Path>) -> Option<PathBuf> {
    let path = path?;
    if path.extension().is_some_and(|e| e == "toml") {
        path.parent().map(PathBuf::from)
    } else {
        Some(path.to_path_buf())
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) if path.extension().is_some_and(|e| e == "toml") => Config::load(path),
        Some(dir) => Config::load_from(Some(dir.to_path_buf())),
        None => Config::load_from(None),
    }
}
