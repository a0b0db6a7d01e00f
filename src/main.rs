//! # Ingest Console CLI (`ingestctl`)
//!
//! Connects to a vector store through the ingestion service, uploads
//! documents, and manages indexes and their documents.
//!
//! ## Usage
//!
//! ```bash
//! ingestctl --config ./config/ingest.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ingestctl health` | Check that the ingestion service is up |
//! | `ingestctl connect` | Test the vector-store connection and list collections |
//! | `ingestctl collections` | List collection names |
//! | `ingestctl indexes` | List indexes with document counts |
//! | `ingestctl documents <index>` | List the documents of one index |
//! | `ingestctl upload <file>` | Upload a document into a collection |
//! | `ingestctl delete-document <index> <id>` | Delete one document |
//! | `ingestctl delete-index <name>` | Delete an index and all its documents |
//! | `ingestctl search <index> "<query>"` | Search inside an index |
//! | `ingestctl shell` | Interactive session |
//!
//! ## Examples
//!
//! ```bash
//! # Upload into an existing collection
//! ingestctl upload ./report.pdf --collection docs-a
//!
//! # Create a collection on first upload, sentence chunking
//! ingestctl upload ./notes.md --new-collection notes --method sentence --chunk-size 600
//!
//! # Delete an index without the confirmation prompt
//! ingestctl delete-index notes --yes
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use ingest_console::commands::{self, UploadArgs};
use ingest_console::config;
use ingest_console::models::ChunkingMethod;
use ingest_console::progress::ProgressMode;

/// Ingest Console CLI: upload documents into a vector-store ingestion
/// service and manage its indexes.
///
/// Settings come from an optional TOML file, then `INGEST_API_URL`,
/// `QDRANT_URL` and `QDRANT_API_KEY`, then the flags below.
#[derive(Parser)]
#[command(
    name = "ingestctl",
    about = "Ingest Console: upload documents into a vector-store ingestion service and manage its indexes",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/ingest.toml`; when that file does not exist the
    /// built-in defaults are used.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Base URL of the ingestion service (overrides config and `INGEST_API_URL`).
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Vector-store URL to connect with (overrides config and `QDRANT_URL`).
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Upload progress on stderr. `auto` shows it when stderr is a terminal.
    #[arg(long, global = true, value_enum, default_value = "auto")]
    progress: ProgressArg,

    /// Enable debug logging on stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ProgressArg {
    Auto,
    Human,
    Json,
    Off,
}

impl ProgressArg {
    fn mode(self) -> ProgressMode {
        match self {
            ProgressArg::Auto => ProgressMode::default_for_tty(),
            ProgressArg::Human => ProgressMode::Human,
            ProgressArg::Json => ProgressMode::Json,
            ProgressArg::Off => ProgressMode::Off,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the ingestion service is reachable.
    Health,

    /// Test the vector-store connection and list its collections.
    Connect,

    /// List collection names visible under the configured credential.
    Collections,

    /// List indexes with their document counts.
    Indexes,

    /// List the documents stored in one index.
    Documents {
        /// Index name.
        index: String,
    },

    /// Upload a document (.pdf, .docx, .xlsx, .xls, .txt, .md; at most 20 MB).
    Upload {
        /// File to upload.
        file: PathBuf,

        /// Existing collection to upload into.
        #[arg(long, conflicts_with = "new_collection")]
        collection: Option<String>,

        /// Name of a collection to create with this upload.
        #[arg(long)]
        new_collection: Option<String>,

        /// Short description of the document.
        #[arg(long)]
        description: Option<String>,

        /// Chunk size in characters (100..=4000).
        #[arg(long)]
        chunk_size: Option<u32>,

        /// Overlap between chunks (0..=1000, smaller than chunk size).
        #[arg(long)]
        chunk_overlap: Option<u32>,

        /// Chunking method: `recursive` or `sentence`.
        #[arg(long)]
        method: Option<ChunkingMethod>,
    },

    /// Delete one document from an index.
    DeleteDocument {
        /// Index name.
        index: String,
        /// Document id.
        id: String,
    },

    /// Delete an index and every document in it.
    DeleteIndex {
        /// Index name.
        name: String,

        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },

    /// Search inside an index.
    Search {
        /// Index name.
        index: String,

        /// The search query string.
        query: String,

        /// Maximum number of results to return.
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },

    /// Start an interactive session that keeps the connection and upload
    /// form between commands.
    Shell,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let (config_path, required) = match &cli.config {
        Some(path) => (path.clone(), true),
        None => (PathBuf::from("./config/ingest.toml"), false),
    };
    let mut cfg = config::load_config(&config_path, required)?;
    if let Some(url) = cli.api_url {
        cfg.api.base_url = url;
    }
    if let Some(endpoint) = cli.endpoint {
        cfg.vector_store.url = endpoint;
    }
    cfg.validate()?;

    let progress = cli.progress.mode();

    match cli.command {
        Commands::Health => commands::run_health(&cfg).await?,
        Commands::Connect => commands::run_connect(&cfg).await?,
        Commands::Collections => commands::run_collections(&cfg).await?,
        Commands::Indexes => commands::run_indexes(&cfg).await?,
        Commands::Documents { index } => commands::run_documents(&cfg, &index).await?,
        Commands::Upload {
            file,
            collection,
            new_collection,
            description,
            chunk_size,
            chunk_overlap,
            method,
        } => {
            let args = UploadArgs {
                collection,
                new_collection,
                description,
                chunk_size,
                chunk_overlap,
                method,
            };
            commands::run_upload(&cfg, &file, args, progress).await?;
        }
        Commands::DeleteDocument { index, id } => {
            commands::run_delete_document(&cfg, &index, &id).await?
        }
        Commands::DeleteIndex { name, yes } => {
            commands::run_delete_index(&cfg, &name, yes).await?
        }
        Commands::Search {
            index,
            query,
            limit,
        } => commands::run_search(&cfg, &index, &query, limit).await?,
        Commands::Shell => commands::run_shell(&cfg, progress).await?,
    }

    Ok(())
}
