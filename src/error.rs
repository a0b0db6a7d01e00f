//! Error types for collaborator calls and client-side validation.

use thiserror::Error;

/// Failure of a call to the ingestion service.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Transport failure: connection refused, timeout, aborted body.
    #[error("network error: {0}")]
    Network(String),

    /// The service answered with a non-success status.
    #[error("service returned HTTP {status}")]
    Status {
        status: u16,
        /// The `detail` field of the error body, when the service sent one.
        detail: Option<String>,
    },

    /// The response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// The selected file could not be read.
    #[error("could not read file: {0}")]
    Io(#[from] std::io::Error),
}

impl BackendError {
    pub fn is_network(&self) -> bool {
        matches!(self, BackendError::Network(_))
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            BackendError::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        // Delete and search URLs carry the credential in the query string.
        let err = err.without_url();
        if err.is_decode() {
            BackendError::Decode(err.to_string())
        } else {
            BackendError::Network(err.to_string())
        }
    }
}

/// Why a candidate file was not accepted for upload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FileRejection {
    #[error("File size exceeds 20MB limit")]
    SizeExceeded { size: u64 },

    #[error("Unsupported file type: {name}")]
    UnsupportedType { name: String },
}

/// Invalid chunking parameters, caught before submission.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChunkingError {
    #[error("chunk size must be between {min} and {max} (got {value})")]
    SizeOutOfRange { value: u32, min: u32, max: u32 },

    #[error("chunk overlap must be at most {max} (got {value})")]
    OverlapOutOfRange { value: u32, max: u32 },

    #[error("chunk overlap ({overlap}) must be smaller than chunk size ({size})")]
    OverlapNotSmaller { overlap: u32, size: u32 },
}
