//! Interactive session over one [`Console`].
//!
//! `ingestctl shell` reads commands line by line, so the connection, the
//! upload form and the selected index persist between commands the way they
//! do in a long-lived UI.
//!
//! ```text
//! > connect
//! ok: Connected to Qdrant successfully!
//! > use docs-a
//! > file ./report.pdf
//! > upload
//! ok: Document uploaded successfully! Processed 7 chunks.
//! ```

use anyhow::Result;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::backend::Backend;
use crate::console::{delete_index_prompt, Console, DeleteOutcome, SearchOutcome, UploadOutcome};
use crate::models::{ChunkingMethod, Credential, SelectedFile};
use crate::report;
use crate::upload::{CollectionChoice, SubmitBlocked};

const HELP: &str = "\
Connection
  endpoint <url>          set the vector-store URL
  credential <key>        set the vector-store API key (empty to clear)
  connect                 test the connection and list collections
  collections             refresh and list collections
Upload
  use <collection>        upload into an existing collection
  new <name>              upload into a new collection
  description <text>      set the document description
  chunk-size <n>          100..=4000
  overlap <n>             0..=1000, smaller than chunk size
  method <name>           recursive | sentence
  file <path>             pick the file to upload
  upload                  send the selected file
Indexes
  indexes                 list indexes
  select <index>          select an index and list its documents
  docs                    list documents of the selected index
  rm-doc <id>             delete a document from the selected index
  rm-index <name>         delete an index (asks for confirmation)
  search <index> <query>  search inside an index
Other
  status                  show the console state
  help                    show this text
  quit                    leave the shell";

/// One parsed shell line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Help,
    Status,
    Quit,
    Endpoint(String),
    Credential(String),
    Connect,
    Collections,
    Use(String),
    New(String),
    Description(String),
    ChunkSize(u32),
    Overlap(u32),
    Method(ChunkingMethod),
    File(PathBuf),
    Upload,
    Indexes,
    Select(String),
    Docs,
    RemoveDocument(String),
    RemoveIndex(String),
    Search { index: String, query: String },
}

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<ShellCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };

    let required = |what: &str| -> Result<String, String> {
        if rest.is_empty() {
            Err(format!("{} requires {}", word, what))
        } else {
            Ok(rest.to_string())
        }
    };
    let number = |what: &str| -> Result<u32, String> {
        rest.parse::<u32>()
            .map_err(|_| format!("{} requires {} (a non-negative integer)", word, what))
    };

    let command = match word {
        "help" | "?" => ShellCommand::Help,
        "status" => ShellCommand::Status,
        "quit" | "exit" => ShellCommand::Quit,
        "endpoint" => ShellCommand::Endpoint(required("a URL")?),
        "credential" => ShellCommand::Credential(rest.to_string()),
        "connect" => ShellCommand::Connect,
        "collections" => ShellCommand::Collections,
        "use" => ShellCommand::Use(required("a collection name")?),
        "new" => ShellCommand::New(required("a collection name")?),
        "description" => ShellCommand::Description(rest.to_string()),
        "chunk-size" => ShellCommand::ChunkSize(number("a size")?),
        "overlap" => ShellCommand::Overlap(number("an overlap")?),
        "method" => ShellCommand::Method(rest.parse()?),
        "file" => ShellCommand::File(PathBuf::from(required("a path")?)),
        "upload" => ShellCommand::Upload,
        "indexes" => ShellCommand::Indexes,
        "select" => ShellCommand::Select(required("an index name")?),
        "docs" => ShellCommand::Docs,
        "rm-doc" => ShellCommand::RemoveDocument(required("a document id")?),
        "rm-index" => ShellCommand::RemoveIndex(required("an index name")?),
        "search" => {
            let (index, query) = rest
                .split_once(char::is_whitespace)
                .ok_or_else(|| "search requires an index and a query".to_string())?;
            ShellCommand::Search {
                index: index.to_string(),
                query: query.trim().to_string(),
            }
        }
        other => return Err(format!("unknown command '{}', try 'help'", other)),
    };
    Ok(Some(command))
}

/// Read commands from `input` until EOF or `quit`.
pub async fn run_shell<R, W>(
    console: &mut Console,
    backend: &dyn Backend,
    mut input: R,
    out: &mut W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(out, "Type 'help' for commands.")?;
    let _ = console.refresh_indexes(backend).await;

    loop {
        write!(out, "> ")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line).await? == 0 {
            break;
        }

        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                writeln!(out, "{}", message)?;
                continue;
            }
        };

        if command == ShellCommand::Quit {
            break;
        }

        // The confirmation is read from the same input as commands, so ask
        // only when the delete can actually run.
        let answer = match &command {
            ShellCommand::RemoveIndex(name) if console.connection().is_connected() => {
                write!(out, "{} [y/N] ", delete_index_prompt(name))?;
                out.flush()?;
                let mut answer = String::new();
                input.read_line(&mut answer).await?;
                matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
            }
            _ => false,
        };

        execute(console, backend, command, answer, out).await?;
    }
    Ok(())
}

async fn execute<W: Write>(
    console: &mut Console,
    backend: &dyn Backend,
    command: ShellCommand,
    confirmed: bool,
    out: &mut W,
) -> Result<()> {
    let before = console.banner().cloned();
    let mut always_show = false;

    match command {
        ShellCommand::Help => writeln!(out, "{}", HELP)?,
        ShellCommand::Status => report::write_status(out, console)?,
        ShellCommand::Quit => {}
        ShellCommand::Endpoint(url) => console.set_endpoint(url),
        ShellCommand::Credential(key) => console.set_credential(Credential::new(key)),
        ShellCommand::Connect => {
            console.test_connection(backend).await;
            always_show = true;
            if console.connection().is_connected() {
                report::write_collections(out, console.connection().collections())?;
            }
        }
        ShellCommand::Collections => {
            if !console.connection().is_connected() {
                writeln!(out, "not connected; run 'connect' first")?;
            } else {
                match console.list_collections(backend).await {
                    Ok(names) => report::write_collections(out, &names)?,
                    Err(e) => writeln!(out, "error: could not list collections: {}", e)?,
                }
            }
        }
        ShellCommand::Use(name) => {
            if !console.connection().is_connected() {
                writeln!(out, "not connected; run 'connect' first")?;
            } else {
                if !console.connection().collections().contains(&name) {
                    writeln!(out, "note: '{}' is not among the known collections", name)?;
                }
                console
                    .upload_form()
                    .choose_collection(CollectionChoice::Existing(name));
            }
        }
        ShellCommand::New(name) => {
            if !console.connection().is_connected() {
                writeln!(out, "not connected; run 'connect' first")?;
            } else {
                let form = console.upload_form();
                form.choose_collection(CollectionChoice::CreateNew);
                form.set_new_collection_name(name);
            }
        }
        ShellCommand::Description(text) => console.upload_form().set_description(text),
        ShellCommand::ChunkSize(n) => console.upload_form().set_chunk_size(n),
        ShellCommand::Overlap(n) => console.upload_form().set_chunk_overlap(n),
        ShellCommand::Method(method) => console.upload_form().set_chunking_method(method),
        ShellCommand::File(path) => match SelectedFile::from_path(&path).await {
            Ok(file) => {
                if console.select_file(file).is_ok() {
                    writeln!(out, "selected {}", path.display())?;
                }
            }
            Err(e) => writeln!(out, "error: cannot open {}: {}", path.display(), e)?,
        },
        ShellCommand::Upload => match console.submit(backend).await {
            UploadOutcome::Uploaded(_) | UploadOutcome::Failed(_) => always_show = true,
            UploadOutcome::Blocked(reason) => {
                writeln!(out, "upload blocked: {}", reason)?;
                if let Some(hint) = blocked_hint(&reason) {
                    writeln!(out, "{}", hint)?;
                }
            }
            UploadOutcome::Ignored => writeln!(out, "an upload is already running")?,
        },
        ShellCommand::Indexes => {
            if console.refresh_indexes(backend).await.is_ok() {
                report::write_indexes(out, console.catalog().indexes())?;
            }
        }
        ShellCommand::Select(name) => {
            if console.select_index(backend, &name).await.is_ok() {
                report::write_documents(out, &name, console.catalog().documents())?;
            }
        }
        ShellCommand::Docs => match console.catalog().selected().map(str::to_string) {
            Some(index) => {
                if console.refresh_documents(backend, &index).await.is_ok() {
                    report::write_documents(out, &index, console.catalog().documents())?;
                }
            }
            None => writeln!(out, "no index selected; run 'select <index>' first")?,
        },
        ShellCommand::RemoveDocument(id) => match console.catalog().selected().map(str::to_string) {
            Some(index) => {
                match console.delete_document(backend, &index, &id).await {
                    DeleteOutcome::Blocked => writeln!(out, "not connected; run 'connect' first")?,
                    _ => always_show = true,
                }
            }
            None => writeln!(out, "no index selected; run 'select <index>' first")?,
        },
        ShellCommand::RemoveIndex(name) => {
            let confirm = move |_: &str| confirmed;
            match console.delete_index(backend, &name, &confirm).await {
                DeleteOutcome::Blocked => writeln!(out, "not connected; run 'connect' first")?,
                DeleteOutcome::Cancelled => writeln!(out, "cancelled")?,
                _ => always_show = true,
            }
        }
        ShellCommand::Search { index, query } => {
            match console.search(backend, &index, &query, 10).await {
                SearchOutcome::Hits(hits) => report::write_search_hits(out, &hits)?,
                SearchOutcome::Blocked => writeln!(out, "not connected; run 'connect' first")?,
                SearchOutcome::Failed(_) => always_show = true,
            }
        }
    }

    if always_show || console.banner() != before.as_ref() {
        report::write_banner(out, console.banner())?;
    }
    Ok(())
}

/// Which shell command clears a blocked upload.
fn blocked_hint(reason: &SubmitBlocked) -> Option<&'static str> {
    match reason {
        SubmitBlocked::NoFile => Some("run 'file <path>' first"),
        SubmitBlocked::NotConnected => Some("run 'connect' first"),
        SubmitBlocked::NoTargetCollection => Some("run 'use <collection>' or 'new <name>'"),
        SubmitBlocked::InvalidChunking(_) => None,
    }
}
