//! The orchestration context.
//!
//! [`Console`] owns the three sub-states ([`ConnectionState`],
//! [`UploadState`], [`CatalogState`]) and the single user-visible
//! [`Banner`]. Each public operation runs one transition against a
//! [`Backend`], then hands the [`Effect`]s that transition produced to
//! [`Console::run_effects`].
//!
//! ```text
//!   test_connection ──▶ ConnectionState ──────────────┐
//!   submit ───────────▶ UploadState ── effects ──┐    │
//!   delete_* ─────────▶ CatalogState ── effects ─┤    │
//!                                                ▼    ▼
//!                                           run_effects()
//!                                RefreshIndexes / RefreshCollections /
//!                                RefreshDocuments(index)
//! ```
//!
//! No operation returns an error past its boundary: each resolves to an
//! outcome value and, where the user should see something, a banner.

use tracing::{info, warn};

use crate::backend::Backend;
use crate::catalog::CatalogState;
use crate::config::Config;
use crate::connection::ConnectionState;
use crate::error::{BackendError, FileRejection};
use crate::models::{Credential, SearchHit, SearchQuery, SelectedFile, UploadReceipt};
use crate::progress::{NoProgress, UploadProgressEvent, UploadProgressReporter};
use crate::upload::{SubmitBlocked, SubmitGate, UploadState};

/// Follow-up work a transition asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    RefreshIndexes,
    RefreshCollections,
    RefreshDocuments(String),
}

/// The one message shown to the user. A new message always replaces the
/// previous one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Banner {
    Success(String),
    Error(String),
}

impl Banner {
    pub fn text(&self) -> &str {
        match self {
            Banner::Success(t) | Banner::Error(t) => t,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Banner::Error(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// Handshake succeeded. `collections_listed` is false when the
    /// follow-up collection listing failed.
    Connected { collections_listed: bool },
    Failed,
    /// A connect attempt was already running or no endpoint was set.
    Ignored,
}

#[derive(Debug)]
pub enum UploadOutcome {
    Uploaded(UploadReceipt),
    /// The service rejected the upload or could not be reached.
    Failed(String),
    /// Preconditions did not hold; nothing was sent.
    Blocked(SubmitBlocked),
    /// An upload was already in flight.
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Failed(String),
    Cancelled,
    /// Not connected; nothing was sent.
    Blocked,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Hits(Vec<SearchHit>),
    Failed(String),
    /// Not connected or empty query; nothing was sent.
    Blocked,
}

/// Asks the user to confirm an irreversible action.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Question put to the user before an index is deleted.
pub fn delete_index_prompt(name: &str) -> String {
    format!(
        "Are you sure you want to delete the index \"{}\"? This will delete all documents in the index.",
        name
    )
}

pub struct Console {
    connection: ConnectionState,
    upload: UploadState,
    catalog: CatalogState,
    banner: Option<Banner>,
    progress: Box<dyn UploadProgressReporter>,
}

impl Console {
    pub fn new(config: &Config) -> Self {
        Self {
            connection: ConnectionState::new(
                config.vector_store.url.clone(),
                config.vector_store.api_key.clone(),
            ),
            upload: UploadState::new(config.upload.metadata()),
            catalog: CatalogState::new(),
            banner: None,
            progress: Box::new(NoProgress),
        }
    }

    pub fn with_progress(mut self, reporter: Box<dyn UploadProgressReporter>) -> Self {
        self.progress = reporter;
        self
    }

    pub fn connection(&self) -> &ConnectionState {
        &self.connection
    }

    pub fn upload(&self) -> &UploadState {
        &self.upload
    }

    /// Form fields of the upload workflow (collection choice, description,
    /// chunking parameters).
    pub fn upload_form(&mut self) -> &mut UploadState {
        &mut self.upload
    }

    pub fn catalog(&self) -> &CatalogState {
        &self.catalog
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    pub fn set_endpoint(&mut self, endpoint: impl Into<String>) {
        self.connection.set_endpoint(endpoint);
    }

    pub fn set_credential(&mut self, credential: Credential) {
        self.connection.set_credential(credential);
    }

    fn set_success(&mut self, text: impl Into<String>) {
        self.banner = Some(Banner::Success(text.into()));
    }

    fn set_error(&mut self, text: impl Into<String>) {
        self.banner = Some(Banner::Error(text.into()));
    }

    // ── Connection ──────────────────────────────────────────────────

    /// Two-phase connect: validate the endpoint and credential, then
    /// enumerate collections. A listing failure after a good handshake is
    /// logged and does not fail the connection.
    pub async fn test_connection(&mut self, backend: &dyn Backend) -> ConnectOutcome {
        let Some(target) = self.connection.begin_connect() else {
            return ConnectOutcome::Ignored;
        };

        match backend.test_connection(&target).await {
            Ok(()) => {
                let collections = match backend.list_collections(&target).await {
                    Ok(names) => Some(names),
                    Err(e) => {
                        warn!(error = %e, "connected, but listing collections failed");
                        None
                    }
                };
                let collections_listed = collections.is_some();
                self.connection.connect_succeeded(collections);
                self.set_success("Connected to Qdrant successfully!");
                ConnectOutcome::Connected { collections_listed }
            }
            Err(e) => {
                warn!(error = %e, "connection test failed");
                self.connection.connect_failed();
                self.set_error("Failed to connect to Qdrant");
                ConnectOutcome::Failed
            }
        }
    }

    /// Re-read the collection names under the current endpoint/credential.
    pub async fn list_collections(
        &mut self,
        backend: &dyn Backend,
    ) -> Result<Vec<String>, BackendError> {
        let target = self.connection.target();
        let names = backend.list_collections(&target).await?;
        self.connection.replace_collections(names.clone());
        Ok(names)
    }

    // ── Upload ──────────────────────────────────────────────────────

    /// Pick the file to upload. Rejections are reported on the banner and
    /// leave the current selection alone.
    pub fn select_file(&mut self, file: SelectedFile) -> Result<(), FileRejection> {
        match self.upload.select_file(file) {
            Ok(()) => {
                if self.banner.as_ref().is_some_and(Banner::is_error) {
                    self.banner = None;
                }
                Ok(())
            }
            Err(rejection) => {
                self.set_error(rejection.to_string());
                Err(rejection)
            }
        }
    }

    pub fn resolve_target_collection(&self) -> Option<String> {
        self.upload.target_collection()
    }

    /// Send the selected file to the resolved collection.
    pub async fn submit(&mut self, backend: &dyn Backend) -> UploadOutcome {
        let connection = self
            .connection
            .is_connected()
            .then(|| self.connection.target());
        let prepared = match self.upload.begin_submit(connection) {
            SubmitGate::Ready(prepared) => prepared,
            SubmitGate::AlreadyUploading => return UploadOutcome::Ignored,
            SubmitGate::Blocked(reason) => {
                if let SubmitBlocked::InvalidChunking(e) = &reason {
                    self.set_error(e.to_string());
                }
                return UploadOutcome::Blocked(reason);
            }
        };

        self.banner = None;
        let file = prepared.file.name.clone();
        self.progress.report(UploadProgressEvent::Started {
            file: file.clone(),
            size: prepared.file.size,
        });
        self.progress.report(UploadProgressEvent::Progress {
            file: file.clone(),
            percent: self.upload.progress(),
        });

        match backend.upload(&prepared).await {
            Ok(receipt) => {
                self.upload.set_progress(100);
                self.progress.report(UploadProgressEvent::Progress {
                    file: file.clone(),
                    percent: self.upload.progress(),
                });
                let effects = self.upload.complete_success();
                self.progress
                    .report(UploadProgressEvent::Finished { file, ok: true });
                info!(
                    collection = %prepared.metadata.index_name,
                    chunks = receipt.chunks_processed,
                    "upload finished"
                );
                self.set_success(format!(
                    "Document uploaded successfully! Processed {} chunks.",
                    receipt.chunks_processed
                ));
                self.run_effects(backend, effects).await;
                UploadOutcome::Uploaded(receipt)
            }
            Err(e) => {
                self.upload.complete_failure();
                self.progress
                    .report(UploadProgressEvent::Finished { file, ok: false });
                warn!(error = %e, "upload failed");
                let message = match &e {
                    BackendError::Status {
                        detail: Some(detail),
                        ..
                    } => format!("Upload failed: {}", detail),
                    BackendError::Status { status, .. } => {
                        format!("Upload failed: HTTP {}", status)
                    }
                    BackendError::Network(_) => "Network error occurred during upload".to_string(),
                    BackendError::Decode(_) => {
                        "Upload failed: unexpected response from service".to_string()
                    }
                    BackendError::Io(err) => format!("Upload failed: {}", err),
                };
                self.set_error(message.clone());
                UploadOutcome::Failed(message)
            }
        }
    }

    // ── Catalog ─────────────────────────────────────────────────────

    /// Replace the index list with the service's current one.
    pub async fn refresh_indexes(&mut self, backend: &dyn Backend) -> Result<(), BackendError> {
        match backend.list_indexes().await {
            Ok(indexes) => {
                self.catalog.replace_indexes(indexes);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "fetching indexes failed");
                self.set_error(if e.is_network() {
                    "Network error while fetching indexes"
                } else {
                    "Failed to fetch indexes"
                });
                Err(e)
            }
        }
    }

    /// Select `name` and load its documents.
    pub async fn select_index(
        &mut self,
        backend: &dyn Backend,
        name: &str,
    ) -> Result<(), BackendError> {
        let Effect::RefreshDocuments(index) = self.catalog.select_index(name) else {
            return Ok(());
        };
        self.refresh_documents(backend, &index).await
    }

    pub async fn refresh_documents(
        &mut self,
        backend: &dyn Backend,
        index: &str,
    ) -> Result<(), BackendError> {
        match backend.list_documents(index).await {
            Ok(documents) => {
                self.catalog.replace_documents(index, documents);
                Ok(())
            }
            Err(e) => {
                warn!(index, error = %e, "fetching documents failed");
                self.set_error(if e.is_network() {
                    "Network error while fetching documents"
                } else {
                    "Failed to fetch documents"
                });
                Err(e)
            }
        }
    }

    pub async fn delete_document(
        &mut self,
        backend: &dyn Backend,
        index: &str,
        document_id: &str,
    ) -> DeleteOutcome {
        if !self.connection.is_connected() {
            return DeleteOutcome::Blocked;
        }
        let target = self.connection.target();
        match backend.delete_document(&target, index, document_id).await {
            Ok(()) => {
                info!(index, document_id, "document deleted");
                self.set_success("Document deleted successfully");
                let effects = self.catalog.document_deleted(index);
                self.run_effects(backend, effects).await;
                DeleteOutcome::Deleted
            }
            Err(e) => {
                warn!(index, document_id, error = %e, "document delete failed");
                let message = if e.is_network() {
                    "Error deleting document"
                } else {
                    "Failed to delete document"
                };
                self.set_error(message);
                DeleteOutcome::Failed(message.to_string())
            }
        }
    }

    /// Delete an index and all its documents after `confirm` agrees.
    pub async fn delete_index(
        &mut self,
        backend: &dyn Backend,
        name: &str,
        confirm: &dyn Confirm,
    ) -> DeleteOutcome {
        if !self.connection.is_connected() {
            return DeleteOutcome::Blocked;
        }
        if !confirm.confirm(&delete_index_prompt(name)) {
            return DeleteOutcome::Cancelled;
        }

        let target = self.connection.target();
        match backend.delete_index(&target, name).await {
            Ok(()) => {
                info!(index = name, "index deleted");
                self.set_success("Index deleted successfully");
                let effects = self.catalog.index_deleted(name);
                self.run_effects(backend, effects).await;
                DeleteOutcome::Deleted
            }
            Err(e) => {
                warn!(index = name, error = %e, "index delete failed");
                let message = if e.is_network() {
                    "Error deleting index"
                } else {
                    "Failed to delete index"
                };
                self.set_error(message);
                DeleteOutcome::Failed(message.to_string())
            }
        }
    }

    /// Semantic search inside one index.
    pub async fn search(
        &mut self,
        backend: &dyn Backend,
        index: &str,
        query: &str,
        limit: u32,
    ) -> SearchOutcome {
        if !self.connection.is_connected() || query.trim().is_empty() {
            return SearchOutcome::Blocked;
        }
        let target = self.connection.target();
        let query = SearchQuery {
            query: query.trim().to_string(),
            limit: limit.max(1),
        };
        match backend.search(&target, index, &query).await {
            Ok(hits) => SearchOutcome::Hits(hits),
            Err(e) => {
                warn!(index, error = %e, "search failed");
                let message = match e.detail() {
                    Some(detail) => format!("Search failed: {}", detail),
                    None if e.is_network() => "Network error while searching".to_string(),
                    None => "Search failed".to_string(),
                };
                self.set_error(message.clone());
                SearchOutcome::Failed(message)
            }
        }
    }

    // ── Effects ──────────────────────────────────────────────────────

    /// Execute follow-up refreshes in order.
    ///
    /// Effects run after a transition that already succeeded and set its
    /// banner, so a failed refresh is logged and leaves that banner alone.
    /// The lists stay as they were until the next refresh.
    pub async fn run_effects(&mut self, backend: &dyn Backend, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::RefreshIndexes => match backend.list_indexes().await {
                    Ok(indexes) => self.catalog.replace_indexes(indexes),
                    Err(e) => warn!(error = %e, "refreshing indexes failed"),
                },
                Effect::RefreshDocuments(index) => {
                    // Only the selected index has a document list to keep fresh.
                    if self.catalog.selected() != Some(index.as_str()) {
                        continue;
                    }
                    match backend.list_documents(&index).await {
                        Ok(documents) => {
                            self.catalog.replace_documents(&index, documents);
                        }
                        Err(e) => warn!(index = %index, error = %e, "refreshing documents failed"),
                    }
                }
                Effect::RefreshCollections => {
                    if let Err(e) = self.list_collections(backend).await {
                        warn!(error = %e, "refreshing collections failed");
                    }
                }
            }
        }
    }
}
