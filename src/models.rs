//! Core data models exchanged with the ingestion service.
//!
//! These types mirror the JSON shapes returned by the backend (indexes,
//! documents, upload receipts, search hits) plus the client-side values the
//! console builds before a request is sent (upload metadata, selected files,
//! the vector-store credential).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Opaque secret used to authenticate against the vector store.
///
/// `Debug` and `Display` never reveal the value; the only way to read it is
/// [`Credential::expose`], which is called when building collaborator
/// requests.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The secret, or `None` when no credential is configured.
    pub fn as_option(&self) -> Option<&str> {
        if self.0.is_empty() {
            None
        } else {
            Some(&self.0)
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("Credential(<none>)")
        } else {
            f.write_str("Credential(<redacted>)")
        }
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("<none>")
        } else {
            f.write_str("<redacted>")
        }
    }
}

/// An index (vector-store collection) known to the ingestion service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSummary {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub document_count: u64,
    pub created_at: String, // ISO8601
}

impl IndexSummary {
    /// Description, treating an empty string the same as a missing one.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref().filter(|d| !d.trim().is_empty())
    }
}

/// A processed document stored inside one index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: String,
    pub filename: String,
    pub file_type: String,
    pub size: u64,
    pub chunks_count: u64,
    pub uploaded_at: String, // ISO8601
}

/// Algorithm the service uses to split a document into chunks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkingMethod {
    #[default]
    Recursive,
    Sentence,
}

impl ChunkingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkingMethod::Recursive => "recursive",
            ChunkingMethod::Sentence => "sentence",
        }
    }
}

impl std::str::FromStr for ChunkingMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recursive" => Ok(ChunkingMethod::Recursive),
            "sentence" => Ok(ChunkingMethod::Sentence),
            other => Err(format!(
                "unknown chunking method '{}': expected recursive or sentence",
                other
            )),
        }
    }
}

impl fmt::Display for ChunkingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata envelope sent alongside an uploaded file.
///
/// `index_name` is left empty in the form state and filled with the resolved
/// target collection when a submission is prepared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadMetadata {
    pub index_name: String,
    pub description: String,
    pub chunk_size: u32,
    pub chunk_overlap: u32,
    pub chunking_method: ChunkingMethod,
}

impl Default for UploadMetadata {
    fn default() -> Self {
        Self {
            index_name: String::new(),
            description: String::new(),
            chunk_size: 1000,
            chunk_overlap: 200,
            chunking_method: ChunkingMethod::Recursive,
        }
    }
}

/// Where the bytes of a selected file come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilePayload {
    /// Read from disk when the upload is sent.
    Path(PathBuf),
    /// Already in memory.
    Bytes(Vec<u8>),
}

/// A file picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub size: u64,
    pub payload: FilePayload,
}

impl SelectedFile {
    /// Describe a file on disk without reading its contents.
    pub async fn from_path(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let meta = tokio::fs::metadata(&path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            name,
            size: meta.len(),
            payload: FilePayload::Path(path),
        })
    }

    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            payload: FilePayload::Bytes(bytes),
        }
    }

    /// Lowercased extension without the dot, if the name has one.
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    /// Load the file contents for sending.
    pub async fn read_payload(&self) -> std::io::Result<Vec<u8>> {
        match &self.payload {
            FilePayload::Path(path) => tokio::fs::read(path).await,
            FilePayload::Bytes(bytes) => Ok(bytes.clone()),
        }
    }
}

/// Successful upload response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadReceipt {
    pub chunks_processed: u64,
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

/// Query sent to the per-index search endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SearchQuery {
    pub query: String,
    pub limit: u32,
}

/// One ranked chunk returned by a search.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchHit {
    /// Point id; the vector store uses either integers or UUID strings.
    pub id: serde_json::Value,
    pub score: f64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub document_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_is_redacted() {
        let key = Credential::new("super-secret");
        assert_eq!(format!("{:?}", key), "Credential(<redacted>)");
        assert_eq!(key.to_string(), "<redacted>");
        assert_eq!(key.expose(), "super-secret");
        assert_eq!(Credential::default().as_option(), None);
    }

    #[test]
    fn chunking_method_wire_names() {
        let json = serde_json::to_string(&ChunkingMethod::Sentence).unwrap();
        assert_eq!(json, "\"sentence\"");
        assert_eq!(
            "Recursive".parse::<ChunkingMethod>().unwrap(),
            ChunkingMethod::Recursive
        );
        assert!("semantic".parse::<ChunkingMethod>().is_err());
    }

    #[test]
    fn extension_is_lowercased() {
        let f = SelectedFile::from_bytes("Report.PDF", vec![1]);
        assert_eq!(f.extension().as_deref(), Some("pdf"));
        assert_eq!(SelectedFile::from_bytes("README", vec![1]).extension(), None);
        assert_eq!(SelectedFile::from_bytes(".md", vec![1]).extension(), None);
    }

    #[test]
    fn index_summary_accepts_service_shape() {
        let index: IndexSummary = serde_json::from_value(serde_json::json!({
            "name": "docs-a",
            "description": "",
            "document_count": 3,
            "created_at": "2024-05-01T10:00:00.123456"
        }))
        .unwrap();
        assert_eq!(index.description(), None);
        assert_eq!(index.document_count, 3);
    }
}
