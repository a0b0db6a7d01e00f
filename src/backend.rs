//! Collaborator contract for the ingestion service.
//!
//! The console never talks to the vector store directly. Every operation
//! goes through a [`Backend`], which the service implements over HTTP
//! ([`HttpBackend`]). Tests substitute in-memory implementations.
//!
//! # Endpoints used by [`HttpBackend`]
//!
//! | Method | Path | Purpose |
//! |--------|------|---------|
//! | `GET`    | `/healthz` | Service liveness |
//! | `POST`   | `/qdrant/test-connection` | Validate vector-store reachability and auth |
//! | `POST`   | `/qdrant/collections` | List collection names |
//! | `GET`    | `/indexes` | List indexes |
//! | `GET`    | `/indexes/{name}/documents` | List documents of one index |
//! | `POST`   | `/upload` | Multipart upload (`file`, `metadata`, `qdrant_url`, `qdrant_api_key`) |
//! | `DELETE` | `/indexes/{name}/documents/{id}` | Delete one document |
//! | `DELETE` | `/indexes/{name}` | Delete an index and all its documents |
//! | `POST`   | `/search/{name}` | Semantic search inside one index |
//!
//! Error responses carry `{"detail": "..."}`; the detail is kept in
//! [`BackendError::Status`] so the upload flow can show it verbatim.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::ApiConfig;
use crate::connection::ConnectionTarget;
use crate::error::BackendError;
use crate::models::{
    DocumentSummary, IndexSummary, SearchHit, SearchQuery, UploadReceipt,
};
use crate::upload::PreparedUpload;

/// Operations the console expects from the ingestion service.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Check that the service itself is up.
    async fn health(&self) -> Result<(), BackendError>;

    /// Validate reachability of and authentication against the vector store.
    async fn test_connection(&self, target: &ConnectionTarget) -> Result<(), BackendError>;

    /// Collection names visible under the target's credential.
    async fn list_collections(&self, target: &ConnectionTarget)
        -> Result<Vec<String>, BackendError>;

    async fn list_indexes(&self) -> Result<Vec<IndexSummary>, BackendError>;

    async fn list_documents(&self, index: &str) -> Result<Vec<DocumentSummary>, BackendError>;

    /// Send one file with its metadata envelope.
    async fn upload(&self, upload: &PreparedUpload) -> Result<UploadReceipt, BackendError>;

    async fn delete_document(
        &self,
        target: &ConnectionTarget,
        index: &str,
        document_id: &str,
    ) -> Result<(), BackendError>;

    /// Delete an index and every document in it.
    async fn delete_index(&self, target: &ConnectionTarget, index: &str)
        -> Result<(), BackendError>;

    async fn search(
        &self,
        target: &ConnectionTarget,
        index: &str,
        query: &SearchQuery,
    ) -> Result<Vec<SearchHit>, BackendError>;
}

/// [`Backend`] over the service's HTTP API.
pub struct HttpBackend {
    base: Url,
    client: reqwest::Client,
}

/// Body of the two vector-store endpoints.
#[derive(Serialize)]
struct ConnectionBody<'a> {
    url: &'a str,
    api_key: Option<&'a str>,
}

#[derive(Deserialize)]
struct CollectionsResponse {
    collections: Vec<String>,
}

#[derive(Deserialize)]
struct SearchResponse {
    results: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

impl HttpBackend {
    pub fn new(config: &ApiConfig) -> anyhow::Result<Self> {
        let base = Url::parse(config.base_url.trim())
            .with_context(|| format!("Invalid API base URL: {}", config.base_url))?;
        if base.cannot_be_a_base() {
            anyhow::bail!("API base URL cannot carry paths: {}", config.base_url);
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { base, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Base URL with `segments` appended, each percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn store_query(target: &ConnectionTarget) -> [(&'static str, &str); 2] {
        [
            ("qdrant_url", target.endpoint.as_str()),
            ("qdrant_api_key", target.credential.expose()),
        ]
    }

    fn connection_body(target: &ConnectionTarget) -> ConnectionBody<'_> {
        ConnectionBody {
            url: &target.endpoint,
            api_key: target.credential.as_option(),
        }
    }
}

/// Turn a non-success response into [`BackendError::Status`], pulling out
/// the `detail` field when the body has one.
async fn check(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .map(|b| match b.detail {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        });
    debug!(status = status.as_u16(), ?detail, "service returned an error");
    Err(BackendError::Status {
        status: status.as_u16(),
        detail,
    })
}

async fn json<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let response = check(response).await?;
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| BackendError::Decode(e.to_string()))
}

fn mime_for(extension: Option<&str>) -> &'static str {
    match extension {
        Some("pdf") => "application/pdf",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("xls") => "application/vnd.ms-excel",
        Some("md") => "text/markdown",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn health(&self) -> Result<(), BackendError> {
        let response = self.client.get(self.endpoint(&["healthz"])).send().await?;
        check(response).await.map(|_| ())
    }

    async fn test_connection(&self, target: &ConnectionTarget) -> Result<(), BackendError> {
        debug!(endpoint = %target.endpoint, "POST /qdrant/test-connection");
        let response = self
            .client
            .post(self.endpoint(&["qdrant", "test-connection"]))
            .json(&Self::connection_body(target))
            .send()
            .await?;
        check(response).await.map(|_| ())
    }

    async fn list_collections(
        &self,
        target: &ConnectionTarget,
    ) -> Result<Vec<String>, BackendError> {
        debug!(endpoint = %target.endpoint, "POST /qdrant/collections");
        let response = self
            .client
            .post(self.endpoint(&["qdrant", "collections"]))
            .json(&Self::connection_body(target))
            .send()
            .await?;
        let body: CollectionsResponse = json(response).await?;
        Ok(body.collections)
    }

    async fn list_indexes(&self) -> Result<Vec<IndexSummary>, BackendError> {
        debug!("GET /indexes");
        let response = self.client.get(self.endpoint(&["indexes"])).send().await?;
        json(response).await
    }

    async fn list_documents(&self, index: &str) -> Result<Vec<DocumentSummary>, BackendError> {
        debug!(index, "GET /indexes/{{name}}/documents");
        let response = self
            .client
            .get(self.endpoint(&["indexes", index, "documents"]))
            .send()
            .await?;
        json(response).await
    }

    async fn upload(&self, upload: &PreparedUpload) -> Result<UploadReceipt, BackendError> {
        let bytes = upload.file.read_payload().await?;
        let extension = upload.file.extension();
        let part = Part::bytes(bytes)
            .file_name(upload.file.name.clone())
            .mime_str(mime_for(extension.as_deref()))?;
        let metadata = serde_json::to_string(&upload.metadata)
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        let mut form = Form::new()
            .part("file", part)
            .text("metadata", metadata)
            .text("qdrant_url", upload.target.endpoint.clone());
        if let Some(key) = upload.target.credential.as_option() {
            form = form.text("qdrant_api_key", key.to_string());
        }

        debug!(
            file = %upload.file.name,
            size = upload.file.size,
            collection = %upload.metadata.index_name,
            "POST /upload"
        );
        let response = self
            .client
            .post(self.endpoint(&["upload"]))
            .multipart(form)
            .send()
            .await?;
        json(response).await
    }

    async fn delete_document(
        &self,
        target: &ConnectionTarget,
        index: &str,
        document_id: &str,
    ) -> Result<(), BackendError> {
        debug!(index, document_id, "DELETE /indexes/{{name}}/documents/{{id}}");
        let response = self
            .client
            .delete(self.endpoint(&["indexes", index, "documents", document_id]))
            .query(&Self::store_query(target))
            .send()
            .await?;
        check(response).await.map(|_| ())
    }

    async fn delete_index(
        &self,
        target: &ConnectionTarget,
        index: &str,
    ) -> Result<(), BackendError> {
        debug!(index, "DELETE /indexes/{{name}}");
        let response = self
            .client
            .delete(self.endpoint(&["indexes", index]))
            .query(&Self::store_query(target))
            .send()
            .await?;
        check(response).await.map(|_| ())
    }

    async fn search(
        &self,
        target: &ConnectionTarget,
        index: &str,
        query: &SearchQuery,
    ) -> Result<Vec<SearchHit>, BackendError> {
        debug!(index, limit = query.limit, "POST /search/{{name}}");
        let response = self
            .client
            .post(self.endpoint(&["search", index]))
            .query(&Self::store_query(target))
            .json(query)
            .send()
            .await?;
        let body: SearchResponse = json(response).await?;
        Ok(body.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base: &str) -> HttpBackend {
        HttpBackend::new(&ApiConfig {
            base_url: base.to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn endpoint_joins_and_encodes_segments() {
        let b = backend("http://localhost:8001");
        assert_eq!(
            b.endpoint(&["indexes", "my docs", "documents"]).as_str(),
            "http://localhost:8001/indexes/my%20docs/documents"
        );
        let b = backend("http://localhost:8001/api/");
        assert_eq!(
            b.endpoint(&["indexes", "a/b"]).as_str(),
            "http://localhost:8001/api/indexes/a%2Fb"
        );
    }

    #[test]
    fn rejects_non_base_urls() {
        assert!(HttpBackend::new(&ApiConfig {
            base_url: "mailto:ops@example.com".to_string(),
            timeout_secs: 5,
        })
        .is_err());
    }

    #[test]
    fn mime_types_follow_extension() {
        assert_eq!(mime_for(Some("pdf")), "application/pdf");
        assert_eq!(mime_for(Some("md")), "text/markdown");
        assert_eq!(mime_for(None), "application/octet-stream");
    }
}
