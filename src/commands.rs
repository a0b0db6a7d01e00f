//! One-shot CLI commands.
//!
//! Each `run_*` function builds a fresh [`Console`], performs one operation
//! and prints the result. Commands that act on the vector store connect
//! first. A failed operation prints the banner on stderr and exits with
//! status 1.

use anyhow::Result;
use std::io::{BufRead, Write};
use std::path::Path;

use crate::backend::{Backend, HttpBackend};
use crate::config::Config;
use crate::console::{
    Banner, ConnectOutcome, Console, DeleteOutcome, SearchOutcome, UploadOutcome,
};
use crate::models::{ChunkingMethod, SelectedFile};
use crate::progress::ProgressMode;
use crate::report;
use crate::shell;
use crate::upload::CollectionChoice;

/// Upload form values given on the command line.
#[derive(Debug, Clone)]
pub struct UploadArgs {
    pub collection: Option<String>,
    pub new_collection: Option<String>,
    pub description: Option<String>,
    pub chunk_size: Option<u32>,
    pub chunk_overlap: Option<u32>,
    pub method: Option<ChunkingMethod>,
}

fn fail(message: &str) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

fn fail_with_banner(console: &Console, fallback: &str) -> ! {
    match console.banner() {
        Some(Banner::Error(text)) => fail(text),
        _ => fail(fallback),
    }
}

/// Connect or exit.
async fn connect(console: &mut Console, backend: &dyn Backend) {
    match console.test_connection(backend).await {
        ConnectOutcome::Connected { .. } => {}
        ConnectOutcome::Failed => fail_with_banner(console, "Failed to connect to Qdrant"),
        ConnectOutcome::Ignored => fail("no vector-store endpoint configured"),
    }
}

pub async fn run_health(config: &Config) -> Result<()> {
    let backend = HttpBackend::new(&config.api)?;
    match backend.health().await {
        Ok(()) => println!("ok: {} is up", backend.base_url()),
        Err(e) => fail(&format!("{} is not healthy: {}", backend.base_url(), e)),
    }
    Ok(())
}

pub async fn run_connect(config: &Config) -> Result<()> {
    let backend = HttpBackend::new(&config.api)?;
    let mut console = Console::new(config);
    connect(&mut console, &backend).await;

    let mut out = std::io::stdout().lock();
    report::write_banner(&mut out, console.banner())?;
    writeln!(out, "--- Collections ---")?;
    report::write_collections(&mut out, console.connection().collections())?;
    Ok(())
}

pub async fn run_collections(config: &Config) -> Result<()> {
    let backend = HttpBackend::new(&config.api)?;
    let mut console = Console::new(config);
    connect(&mut console, &backend).await;
    report::write_collections(&mut std::io::stdout().lock(), console.connection().collections())?;
    Ok(())
}

pub async fn run_indexes(config: &Config) -> Result<()> {
    let backend = HttpBackend::new(&config.api)?;
    let mut console = Console::new(config);
    if console.refresh_indexes(&backend).await.is_err() {
        fail_with_banner(&console, "Failed to fetch indexes");
    }
    report::write_indexes(&mut std::io::stdout().lock(), console.catalog().indexes())?;
    Ok(())
}

pub async fn run_documents(config: &Config, index: &str) -> Result<()> {
    let backend = HttpBackend::new(&config.api)?;
    let mut console = Console::new(config);
    if console.select_index(&backend, index).await.is_err() {
        fail_with_banner(&console, "Failed to fetch documents");
    }
    report::write_documents(
        &mut std::io::stdout().lock(),
        index,
        console.catalog().documents(),
    )?;
    Ok(())
}

pub async fn run_upload(
    config: &Config,
    path: &Path,
    args: UploadArgs,
    progress: ProgressMode,
) -> Result<()> {
    let mut console = Console::new(config).with_progress(progress.reporter());

    // File checks happen before any request is sent.
    let file = match SelectedFile::from_path(path).await {
        Ok(file) => file,
        Err(e) => fail(&format!("cannot open {}: {}", path.display(), e)),
    };
    if let Err(rejection) = console.select_file(file) {
        fail(&rejection.to_string());
    }

    let form = console.upload_form();
    match (args.collection, args.new_collection) {
        (Some(name), None) => form.choose_collection(CollectionChoice::Existing(name)),
        (None, Some(name)) => {
            form.choose_collection(CollectionChoice::CreateNew);
            form.set_new_collection_name(name);
        }
        _ => {}
    }
    if let Some(description) = args.description {
        form.set_description(description);
    }
    if let Some(size) = args.chunk_size {
        form.set_chunk_size(size);
    }
    if let Some(overlap) = args.chunk_overlap {
        form.set_chunk_overlap(overlap);
    }
    if let Some(method) = args.method {
        form.set_chunking_method(method);
    }
    if console.resolve_target_collection().is_none() {
        fail("a target collection is required (--collection or --new-collection)");
    }
    if let Err(e) = crate::upload::validate_chunking(
        console.upload().metadata().chunk_size,
        console.upload().metadata().chunk_overlap,
    ) {
        fail(&e.to_string());
    }

    let backend = HttpBackend::new(&config.api)?;
    connect(&mut console, &backend).await;

    match console.submit(&backend).await {
        UploadOutcome::Uploaded(receipt) => {
            println!(
                "Document uploaded successfully! Processed {} chunks.",
                receipt.chunks_processed
            );
            if let Some(id) = receipt.document_id {
                println!("document_id: {}", id);
            }
        }
        UploadOutcome::Failed(message) => fail(&message),
        UploadOutcome::Blocked(reason) => fail(&format!("upload blocked: {}", reason)),
        UploadOutcome::Ignored => fail("an upload is already running"),
    }
    Ok(())
}

pub async fn run_delete_document(config: &Config, index: &str, document_id: &str) -> Result<()> {
    let backend = HttpBackend::new(&config.api)?;
    let mut console = Console::new(config);
    connect(&mut console, &backend).await;
    match console.delete_document(&backend, index, document_id).await {
        DeleteOutcome::Deleted => println!("Document deleted successfully"),
        DeleteOutcome::Failed(message) => fail(&message),
        DeleteOutcome::Blocked | DeleteOutcome::Cancelled => fail("not connected"),
    }
    Ok(())
}

/// Ask on the terminal; anything but `y`/`yes` declines.
fn confirm_on_stdin(prompt: &str) -> bool {
    eprint!("{} [y/N] ", prompt);
    let _ = std::io::stderr().flush();
    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

pub async fn run_delete_index(config: &Config, name: &str, yes: bool) -> Result<()> {
    let backend = HttpBackend::new(&config.api)?;
    let mut console = Console::new(config);
    connect(&mut console, &backend).await;

    let assume_yes = |_: &str| true;
    let outcome = if yes {
        console.delete_index(&backend, name, &assume_yes).await
    } else {
        console.delete_index(&backend, name, &confirm_on_stdin).await
    };
    match outcome {
        DeleteOutcome::Deleted => println!("Index deleted successfully"),
        DeleteOutcome::Cancelled => println!("Cancelled."),
        DeleteOutcome::Failed(message) => fail(&message),
        DeleteOutcome::Blocked => fail("not connected"),
    }
    Ok(())
}

pub async fn run_search(config: &Config, index: &str, query: &str, limit: u32) -> Result<()> {
    if query.trim().is_empty() {
        fail("query must not be empty");
    }
    let backend = HttpBackend::new(&config.api)?;
    let mut console = Console::new(config);
    connect(&mut console, &backend).await;
    match console.search(&backend, index, query, limit).await {
        SearchOutcome::Hits(hits) => {
            report::write_search_hits(&mut std::io::stdout().lock(), &hits)?
        }
        SearchOutcome::Failed(message) => fail(&message),
        SearchOutcome::Blocked => fail("not connected"),
    }
    Ok(())
}

pub async fn run_shell(config: &Config, progress: ProgressMode) -> Result<()> {
    let backend = HttpBackend::new(&config.api)?;
    let mut console = Console::new(config).with_progress(progress.reporter());
    let input = tokio::io::BufReader::new(tokio::io::stdin());
    let mut out = std::io::stdout();
    shell::run_shell(&mut console, &backend, input, &mut out).await
}
