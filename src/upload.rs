//! Upload form state and submission gating.
//!
//! [`UploadState`] holds the selected file, the metadata form, the
//! collection choice and the in-flight flag. A submission goes through
//! [`UploadState::begin_submit`], which either hands back a
//! [`PreparedUpload`] ready for the collaborator or explains why nothing was
//! sent. [`UploadState::complete_success`] and
//! [`UploadState::complete_failure`] close the attempt.

use thiserror::Error;
use tracing::{debug, info};

use crate::connection::ConnectionTarget;
use crate::console::Effect;
use crate::error::{ChunkingError, FileRejection};
use crate::models::{ChunkingMethod, SelectedFile, UploadMetadata};

/// Hard cap on upload size, checked before any request is sent.
pub const MAX_UPLOAD_BYTES: u64 = 20 * 1024 * 1024;

/// Extensions the service can parse.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["pdf", "docx", "xlsx", "xls", "txt", "md"];

pub const MIN_CHUNK_SIZE: u32 = 100;
pub const MAX_CHUNK_SIZE: u32 = 4000;
pub const MAX_CHUNK_OVERLAP: u32 = 1000;

/// Check chunk size and overlap bounds, and that overlap < size.
pub fn validate_chunking(chunk_size: u32, chunk_overlap: u32) -> Result<(), ChunkingError> {
    if !(MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE).contains(&chunk_size) {
        return Err(ChunkingError::SizeOutOfRange {
            value: chunk_size,
            min: MIN_CHUNK_SIZE,
            max: MAX_CHUNK_SIZE,
        });
    }
    if chunk_overlap > MAX_CHUNK_OVERLAP {
        return Err(ChunkingError::OverlapOutOfRange {
            value: chunk_overlap,
            max: MAX_CHUNK_OVERLAP,
        });
    }
    if chunk_overlap >= chunk_size {
        return Err(ChunkingError::OverlapNotSmaller {
            overlap: chunk_overlap,
            size: chunk_size,
        });
    }
    Ok(())
}

/// Collection picker value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CollectionChoice {
    #[default]
    Unselected,
    Existing(String),
    /// The "create new collection" entry; the name comes from a separate input.
    CreateNew,
}

/// Effective target collection for a choice, or `None` when submission must
/// be blocked.
pub fn resolve_target_collection(choice: &CollectionChoice, new_name: &str) -> Option<String> {
    match choice {
        CollectionChoice::Unselected => None,
        CollectionChoice::Existing(name) if name.is_empty() => None,
        CollectionChoice::Existing(name) => Some(name.clone()),
        CollectionChoice::CreateNew => {
            let name = new_name.trim();
            if name.is_empty() {
                None
            } else {
                Some(name.to_string())
            }
        }
    }
}

/// Why a submission was not sent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitBlocked {
    #[error("no file selected")]
    NoFile,
    #[error("not connected to the vector store")]
    NotConnected,
    #[error("no target collection selected")]
    NoTargetCollection,
    #[error("invalid chunking parameters: {0}")]
    InvalidChunking(ChunkingError),
}

/// Everything needed for one upload request.
#[derive(Debug, Clone)]
pub struct PreparedUpload {
    pub file: SelectedFile,
    /// Form metadata with `index_name` set to the resolved collection.
    pub metadata: UploadMetadata,
    pub target: ConnectionTarget,
}

/// Result of trying to start a submission.
#[derive(Debug)]
pub enum SubmitGate {
    Ready(PreparedUpload),
    /// An upload is already in flight; nothing changed.
    AlreadyUploading,
    Blocked(SubmitBlocked),
}

#[derive(Debug, Clone)]
pub struct UploadState {
    selected_file: Option<SelectedFile>,
    metadata: UploadMetadata,
    defaults: UploadMetadata,
    choice: CollectionChoice,
    new_collection_name: String,
    uploading: bool,
    progress: u8,
}

impl UploadState {
    pub fn new(defaults: UploadMetadata) -> Self {
        Self {
            selected_file: None,
            metadata: defaults.clone(),
            defaults,
            choice: CollectionChoice::Unselected,
            new_collection_name: String::new(),
            uploading: false,
            progress: 0,
        }
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.selected_file.as_ref()
    }

    pub fn metadata(&self) -> &UploadMetadata {
        &self.metadata
    }

    pub fn defaults(&self) -> &UploadMetadata {
        &self.defaults
    }

    pub fn choice(&self) -> &CollectionChoice {
        &self.choice
    }

    pub fn new_collection_name(&self) -> &str {
        &self.new_collection_name
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    /// Accept `candidate` as the file to upload.
    ///
    /// On rejection the previous selection is left as it was.
    pub fn select_file(&mut self, candidate: SelectedFile) -> Result<(), FileRejection> {
        if candidate.size > MAX_UPLOAD_BYTES {
            debug!(file = %candidate.name, size = candidate.size, "file over size cap");
            return Err(FileRejection::SizeExceeded {
                size: candidate.size,
            });
        }
        let accepted = candidate
            .extension()
            .map(|ext| ACCEPTED_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false);
        if !accepted {
            return Err(FileRejection::UnsupportedType {
                name: candidate.name,
            });
        }
        self.selected_file = Some(candidate);
        Ok(())
    }

    pub fn clear_file(&mut self) {
        self.selected_file = None;
    }

    pub fn choose_collection(&mut self, choice: CollectionChoice) {
        self.choice = choice;
    }

    pub fn set_new_collection_name(&mut self, name: impl Into<String>) {
        self.new_collection_name = name.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.metadata.description = description.into();
    }

    pub fn set_chunk_size(&mut self, size: u32) {
        self.metadata.chunk_size = size;
    }

    pub fn set_chunk_overlap(&mut self, overlap: u32) {
        self.metadata.chunk_overlap = overlap;
    }

    pub fn set_chunking_method(&mut self, method: ChunkingMethod) {
        self.metadata.chunking_method = method;
    }

    pub fn target_collection(&self) -> Option<String> {
        resolve_target_collection(&self.choice, &self.new_collection_name)
    }

    /// Check preconditions and, when they hold, mark the upload in flight.
    pub fn begin_submit(&mut self, connection: Option<ConnectionTarget>) -> SubmitGate {
        if self.uploading {
            return SubmitGate::AlreadyUploading;
        }
        let Some(file) = self.selected_file.clone() else {
            return SubmitGate::Blocked(SubmitBlocked::NoFile);
        };
        let Some(target) = connection else {
            return SubmitGate::Blocked(SubmitBlocked::NotConnected);
        };
        let Some(collection) = self.target_collection() else {
            return SubmitGate::Blocked(SubmitBlocked::NoTargetCollection);
        };
        if let Err(e) = validate_chunking(self.metadata.chunk_size, self.metadata.chunk_overlap) {
            return SubmitGate::Blocked(SubmitBlocked::InvalidChunking(e));
        }

        self.uploading = true;
        self.progress = 0;

        let metadata = UploadMetadata {
            index_name: collection,
            ..self.metadata.clone()
        };
        info!(
            file = %file.name,
            collection = %metadata.index_name,
            chunk_size = metadata.chunk_size,
            chunk_overlap = metadata.chunk_overlap,
            method = %metadata.chunking_method,
            "submitting upload"
        );
        SubmitGate::Ready(PreparedUpload {
            file,
            metadata,
            target,
        })
    }

    /// Record transport progress for the in-flight upload.
    pub fn set_progress(&mut self, percent: u8) {
        if self.uploading {
            self.progress = percent.min(100);
        }
    }

    /// The upload went through: reset the form and ask for refreshes, since
    /// a new collection may now exist and document counts changed.
    pub fn complete_success(&mut self) -> Vec<Effect> {
        self.uploading = false;
        self.progress = 0;
        self.selected_file = None;
        self.metadata = self.defaults.clone();
        vec![Effect::RefreshIndexes, Effect::RefreshCollections]
    }

    /// The upload failed: keep file and metadata so the user can retry.
    pub fn complete_failure(&mut self) {
        self.uploading = false;
        self.progress = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Credential;

    fn target() -> Option<ConnectionTarget> {
        Some(ConnectionTarget {
            endpoint: "http://qdrant:6333".into(),
            credential: Credential::new("k"),
        })
    }

    fn pdf(size: usize) -> SelectedFile {
        SelectedFile {
            name: "report.pdf".into(),
            size: size as u64,
            payload: crate::models::FilePayload::Bytes(vec![0; 4]),
        }
    }

    #[test]
    fn oversized_file_is_rejected_and_selection_stays_unset() {
        let mut s = UploadState::new(UploadMetadata::default());
        let err = s.select_file(pdf(25 * 1024 * 1024)).unwrap_err();
        assert!(matches!(err, FileRejection::SizeExceeded { .. }));
        assert!(s.selected_file().is_none());
    }

    #[test]
    fn exactly_at_cap_is_accepted() {
        let mut s = UploadState::new(UploadMetadata::default());
        s.select_file(pdf(MAX_UPLOAD_BYTES as usize)).unwrap();
        assert!(s.selected_file().is_some());
    }

    #[test]
    fn rejection_keeps_previous_selection_and_acceptance_replaces_it() {
        let mut s = UploadState::new(UploadMetadata::default());
        s.select_file(SelectedFile::from_bytes("a.txt", b"hello".to_vec()))
            .unwrap();
        assert!(s
            .select_file(SelectedFile::from_bytes("b.exe", b"MZ".to_vec()))
            .is_err());
        assert_eq!(s.selected_file().unwrap().name, "a.txt");
        s.select_file(SelectedFile::from_bytes("c.MD", b"# c".to_vec()))
            .unwrap();
        assert_eq!(s.selected_file().unwrap().name, "c.MD");
    }

    #[test]
    fn resolve_target_rules() {
        assert_eq!(resolve_target_collection(&CollectionChoice::Unselected, "x"), None);
        assert_eq!(
            resolve_target_collection(&CollectionChoice::Existing("docs-a".into()), "ignored"),
            Some("docs-a".to_string())
        );
        assert_eq!(resolve_target_collection(&CollectionChoice::CreateNew, ""), None);
        assert_eq!(resolve_target_collection(&CollectionChoice::CreateNew, "   "), None);
        assert_eq!(
            resolve_target_collection(&CollectionChoice::CreateNew, " fresh "),
            Some("fresh".to_string())
        );
    }

    #[test]
    fn create_new_with_empty_name_blocks_submission() {
        let mut s = UploadState::new(UploadMetadata::default());
        s.select_file(pdf(10)).unwrap();
        s.choose_collection(CollectionChoice::CreateNew);
        assert!(matches!(
            s.begin_submit(target()),
            SubmitGate::Blocked(SubmitBlocked::NoTargetCollection)
        ));
        assert!(!s.is_uploading());
    }

    #[test]
    fn submit_requires_file_and_connection() {
        let mut s = UploadState::new(UploadMetadata::default());
        s.choose_collection(CollectionChoice::Existing("docs-a".into()));
        assert!(matches!(
            s.begin_submit(target()),
            SubmitGate::Blocked(SubmitBlocked::NoFile)
        ));
        s.select_file(pdf(10)).unwrap();
        assert!(matches!(
            s.begin_submit(None),
            SubmitGate::Blocked(SubmitBlocked::NotConnected)
        ));
    }

    #[test]
    fn overlap_must_be_smaller_than_size() {
        assert!(validate_chunking(1000, 200).is_ok());
        assert_eq!(
            validate_chunking(500, 500),
            Err(ChunkingError::OverlapNotSmaller {
                overlap: 500,
                size: 500
            })
        );
        assert!(matches!(
            validate_chunking(50, 0),
            Err(ChunkingError::SizeOutOfRange { .. })
        ));
        assert!(matches!(
            validate_chunking(4000, 1001),
            Err(ChunkingError::OverlapOutOfRange { .. })
        ));

        let mut s = UploadState::new(UploadMetadata::default());
        s.select_file(pdf(10)).unwrap();
        s.choose_collection(CollectionChoice::Existing("docs-a".into()));
        s.set_chunk_size(300);
        s.set_chunk_overlap(300);
        assert!(matches!(
            s.begin_submit(target()),
            SubmitGate::Blocked(SubmitBlocked::InvalidChunking(_))
        ));
    }

    #[test]
    fn second_submit_while_uploading_is_ignored() {
        let mut s = UploadState::new(UploadMetadata::default());
        s.select_file(pdf(10)).unwrap();
        s.choose_collection(CollectionChoice::Existing("docs-a".into()));
        let SubmitGate::Ready(prepared) = s.begin_submit(target()) else {
            panic!("expected ready");
        };
        assert_eq!(prepared.metadata.index_name, "docs-a");
        assert!(s.is_uploading());
        assert!(matches!(s.begin_submit(target()), SubmitGate::AlreadyUploading));
    }

    #[test]
    fn success_resets_form_and_requests_refreshes() {
        let mut s = UploadState::new(UploadMetadata::default());
        s.select_file(pdf(10)).unwrap();
        s.choose_collection(CollectionChoice::Existing("docs-a".into()));
        s.set_description("quarterly");
        s.set_chunking_method(ChunkingMethod::Sentence);
        assert!(matches!(s.begin_submit(target()), SubmitGate::Ready(_)));
        s.set_progress(100);
        let effects = s.complete_success();
        assert_eq!(effects, vec![Effect::RefreshIndexes, Effect::RefreshCollections]);
        assert_eq!(s.metadata(), &UploadMetadata::default());
        assert!(s.selected_file().is_none());
        assert_eq!(s.progress(), 0);
        assert!(!s.is_uploading());
    }

    #[test]
    fn failure_keeps_file_and_metadata() {
        let mut s = UploadState::new(UploadMetadata::default());
        s.select_file(pdf(10)).unwrap();
        s.choose_collection(CollectionChoice::Existing("docs-a".into()));
        s.set_chunk_size(1500);
        assert!(matches!(s.begin_submit(target()), SubmitGate::Ready(_)));
        s.complete_failure();
        assert!(s.selected_file().is_some());
        assert_eq!(s.metadata().chunk_size, 1500);
        assert!(!s.is_uploading());
        assert_eq!(s.progress(), 0);
    }

    #[test]
    fn blocked_reasons_read_as_sentences() {
        let mut s = UploadState::new(UploadMetadata::default());
        let SubmitGate::Blocked(reason) = s.begin_submit(target()) else {
            panic!("expected a blocked submission");
        };
        assert_eq!(reason.to_string(), "no file selected");

        s.select_file(pdf(10)).unwrap();
        s.choose_collection(CollectionChoice::Existing("docs-a".into()));
        s.set_chunk_overlap(1000);
        let SubmitGate::Blocked(reason) = s.begin_submit(target()) else {
            panic!("expected a blocked submission");
        };
        assert!(reason
            .to_string()
            .starts_with("invalid chunking parameters: chunk overlap (1000)"));
    }
}
