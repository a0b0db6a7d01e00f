use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::models::{ChunkingMethod, Credential, UploadMetadata};
use crate::upload::validate_chunking;

/// Environment variable overriding `api.base_url`.
pub const API_URL_ENV: &str = "INGEST_API_URL";
/// Environment variable overriding `vector_store.url`.
pub const QDRANT_URL_ENV: &str = "QDRANT_URL";
/// Environment variable overriding `vector_store.api_key`.
pub const QDRANT_API_KEY_ENV: &str = "QDRANT_API_KEY";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub vector_store: VectorStoreConfig,
    #[serde(default)]
    pub upload: UploadDefaults,
}

/// Location of the ingestion service.
#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8001".to_string()
}
fn default_timeout_secs() -> u64 {
    120
}

/// Connection the console starts with; both fields can be edited at runtime.
#[derive(Debug, Deserialize, Clone)]
pub struct VectorStoreConfig {
    #[serde(default = "default_vector_store_url")]
    pub url: String,
    #[serde(default)]
    pub api_key: Credential,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            url: default_vector_store_url(),
            api_key: Credential::default(),
        }
    }
}

fn default_vector_store_url() -> String {
    "http://localhost:6333".to_string()
}

/// Values the upload form is filled with, and reset to after a success.
#[derive(Debug, Deserialize, Clone)]
pub struct UploadDefaults {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u32,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: u32,
    #[serde(default)]
    pub chunking_method: ChunkingMethod,
}

impl Default for UploadDefaults {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            chunking_method: ChunkingMethod::default(),
        }
    }
}

fn default_chunk_size() -> u32 {
    1000
}
fn default_chunk_overlap() -> u32 {
    200
}

impl UploadDefaults {
    pub fn metadata(&self) -> UploadMetadata {
        UploadMetadata {
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
            chunking_method: self.chunking_method,
            ..UploadMetadata::default()
        }
    }
}

/// Load configuration from `path`.
///
/// A missing file is not an error when `required` is false; the built-in
/// defaults are used instead. Environment overrides are applied on top of
/// whatever was loaded, then the result is validated.
pub fn load_config(path: &Path, required: bool) -> Result<Config> {
    let mut config = if path.exists() || required {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content).with_context(|| "Failed to parse config file")?
    } else {
        Config::default()
    };

    config.apply_env(|key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Apply `INGEST_API_URL`, `QDRANT_URL` and `QDRANT_API_KEY` overrides.
    ///
    /// Takes a lookup function so tests do not have to touch the process
    /// environment.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(API_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.api.base_url = url;
        }
        if let Some(url) = lookup(QDRANT_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.vector_store.url = url;
        }
        if let Some(key) = lookup(QDRANT_API_KEY_ENV) {
            self.vector_store.api_key = Credential::new(key);
        }
    }

    pub fn validate(&self) -> Result<()> {
        let base = self.api.base_url.trim();
        if base.is_empty() {
            anyhow::bail!("api.base_url must not be empty");
        }
        let parsed = reqwest::Url::parse(base)
            .with_context(|| format!("api.base_url is not a valid URL: {}", base))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("api.base_url must use http or https, got '{}'", parsed.scheme());
        }

        if self.api.timeout_secs == 0 {
            anyhow::bail!("api.timeout_secs must be > 0");
        }

        validate_chunking(self.upload.chunk_size, self.upload.chunk_overlap)
            .with_context(|| "Invalid [upload] defaults")?;

        Ok(())
    }
}
