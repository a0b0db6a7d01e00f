//! Index list, the selected index and its documents.
//!
//! Lists are always replaced wholesale from server responses; nothing is
//! removed optimistically. Delete transitions return the refreshes the
//! effect runner has to perform afterwards.

use tracing::debug;

use crate::console::Effect;
use crate::models::{DocumentSummary, IndexSummary};

#[derive(Debug, Clone, Default)]
pub struct CatalogState {
    indexes: Vec<IndexSummary>,
    selected: Option<String>,
    documents: Vec<DocumentSummary>,
}

impl CatalogState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn indexes(&self) -> &[IndexSummary] {
        &self.indexes
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn documents(&self) -> &[DocumentSummary] {
        &self.documents
    }

    pub fn index(&self, name: &str) -> Option<&IndexSummary> {
        self.indexes.iter().find(|i| i.name == name)
    }

    pub fn replace_indexes(&mut self, indexes: Vec<IndexSummary>) {
        self.indexes = indexes;
    }

    /// Make `name` the selected index. The previous document list is
    /// dropped until the fetch for `name` comes back.
    pub fn select_index(&mut self, name: &str) -> Effect {
        if self.selected.as_deref() != Some(name) {
            self.documents.clear();
        }
        self.selected = Some(name.to_string());
        Effect::RefreshDocuments(name.to_string())
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
        self.documents.clear();
    }

    /// Store a document list fetched for `index`.
    ///
    /// Returns false and keeps the current list when `index` is no longer
    /// the selected one.
    pub fn replace_documents(&mut self, index: &str, documents: Vec<DocumentSummary>) -> bool {
        if self.selected.as_deref() != Some(index) {
            debug!(index, "discarding documents for unselected index");
            return false;
        }
        self.documents = documents;
        true
    }

    pub fn document_deleted(&mut self, index: &str) -> Vec<Effect> {
        vec![
            Effect::RefreshDocuments(index.to_string()),
            Effect::RefreshIndexes,
        ]
    }

    pub fn index_deleted(&mut self, name: &str) -> Vec<Effect> {
        if self.selected.as_deref() == Some(name) {
            self.clear_selection();
        }
        vec![Effect::RefreshIndexes, Effect::RefreshCollections]
    }
}
