use axum::extract::Multipart;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn ingestctl_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("ingestctl");
    path
}

/// Write a config that points at `api_url` and return its path.
fn setup_test_env(api_url: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let config_dir = tmp.path().join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[api]
base_url = "{}"
timeout_secs = 5

[vector_store]
url = "http://localhost:6333"

[upload]
chunk_size = 1000
chunk_overlap = 200
chunking_method = "recursive"
"#,
        api_url
    );
    let config_path = config_dir.join("ingest.toml");
    fs::write(&config_path, config_content).unwrap();
    (tmp, config_path)
}

/// A port nothing listens on, so any request fails to connect.
fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    format!("http://127.0.0.1:{}", port)
}

fn run_ingestctl(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = ingestctl_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .arg("--progress")
        .arg("off")
        .args(args)
        .env_remove("INGEST_API_URL")
        .env_remove("QDRANT_URL")
        .env_remove("QDRANT_API_KEY")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run ingestctl binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_help_lists_commands() {
    let output = Command::new(ingestctl_binary())
        .arg("--help")
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    for cmd in ["connect", "upload", "indexes", "delete-index", "shell"] {
        assert!(stdout.contains(cmd), "help is missing {}: {}", cmd, stdout);
    }
}

#[test]
fn test_oversized_file_rejected_before_any_request() {
    let (tmp, config) = setup_test_env(&closed_port_url());
    let big = tmp.path().join("big.pdf");
    let file = fs::File::create(&big).unwrap();
    file.set_len(21 * 1024 * 1024).unwrap();

    let (_, stderr, success) = run_ingestctl(
        &config,
        &["upload", big.to_str().unwrap(), "--collection", "docs-a"],
    );

    assert!(!success);
    assert!(stderr.contains("File size exceeds 20MB limit"), "stderr: {}", stderr);
    // The service is unreachable; reaching it would have failed differently.
    assert!(!stderr.contains("Qdrant"));
}

#[test]
fn test_unsupported_file_type_rejected() {
    let (tmp, config) = setup_test_env(&closed_port_url());
    let image = tmp.path().join("photo.png");
    fs::write(&image, b"\x89PNG").unwrap();

    let (_, stderr, success) = run_ingestctl(
        &config,
        &["upload", image.to_str().unwrap(), "--collection", "docs-a"],
    );

    assert!(!success);
    assert!(stderr.contains("Unsupported file type: photo.png"), "stderr: {}", stderr);
}

#[test]
fn test_upload_requires_target_collection() {
    let (tmp, config) = setup_test_env(&closed_port_url());
    let notes = tmp.path().join("notes.md");
    fs::write(&notes, "# Notes").unwrap();

    let (_, stderr, success) = run_ingestctl(&config, &["upload", notes.to_str().unwrap()]);

    assert!(!success);
    assert!(stderr.contains("target collection is required"), "stderr: {}", stderr);
}

#[test]
fn test_upload_rejects_overlap_not_smaller_than_size() {
    let (tmp, config) = setup_test_env(&closed_port_url());
    let notes = tmp.path().join("notes.md");
    fs::write(&notes, "# Notes").unwrap();

    let (_, stderr, success) = run_ingestctl(
        &config,
        &[
            "upload",
            notes.to_str().unwrap(),
            "--new-collection",
            "notes",
            "--chunk-size",
            "300",
            "--chunk-overlap",
            "300",
        ],
    );

    assert!(!success);
    assert!(stderr.contains("must be smaller than chunk size"), "stderr: {}", stderr);
}

#[test]
fn test_collection_flags_conflict() {
    let (tmp, config) = setup_test_env(&closed_port_url());
    let notes = tmp.path().join("notes.md");
    fs::write(&notes, "# Notes").unwrap();

    let (_, _, success) = run_ingestctl(
        &config,
        &[
            "upload",
            notes.to_str().unwrap(),
            "--collection",
            "a",
            "--new-collection",
            "b",
        ],
    );
    assert!(!success);
}

#[test]
fn test_unknown_chunking_method() {
    let (tmp, config) = setup_test_env(&closed_port_url());
    let notes = tmp.path().join("notes.md");
    fs::write(&notes, "# Notes").unwrap();

    let (_, stderr, success) = run_ingestctl(
        &config,
        &[
            "upload",
            notes.to_str().unwrap(),
            "--collection",
            "a",
            "--method",
            "semantic",
        ],
    );
    assert!(!success);
    assert!(stderr.contains("unknown chunking method"), "stderr: {}", stderr);
}

#[test]
fn test_missing_explicit_config_errors() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("nope.toml");
    let (_, stderr, success) = run_ingestctl(&missing, &["indexes"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"), "stderr: {}", stderr);
}

#[test]
fn test_invalid_base_url_errors() {
    let (_tmp, config) = setup_test_env("ftp://files.example.com");
    let (_, stderr, success) = run_ingestctl(&config, &["indexes"]);
    assert!(!success);
    assert!(stderr.contains("http or https"), "stderr: {}", stderr);
}

#[test]
fn test_connect_to_unreachable_service() {
    let (_tmp, config) = setup_test_env(&closed_port_url());
    let (_, stderr, success) = run_ingestctl(&config, &["connect"]);
    assert!(!success);
    assert!(stderr.contains("Failed to connect to Qdrant"), "stderr: {}", stderr);
}

#[test]
fn test_indexes_on_unreachable_service() {
    let (_tmp, config) = setup_test_env(&closed_port_url());
    let (_, stderr, success) = run_ingestctl(&config, &["indexes"]);
    assert!(!success);
    assert!(
        stderr.contains("Network error while fetching indexes"),
        "stderr: {}",
        stderr
    );
}

/// Minimal service for an end-to-end upload through the binary.
fn upload_service() -> Router {
    Router::new()
        .route(
            "/qdrant/test-connection",
            post(|| async { Json(json!({"status": "success"})) }),
        )
        .route(
            "/qdrant/collections",
            post(|| async { Json(json!({"collections": ["docs-a"]})) }),
        )
        .route(
            "/indexes",
            get(|| async {
                Json(json!([{
                    "name": "docs-a",
                    "document_count": 1,
                    "created_at": "2024-05-01T10:00:00"
                }]))
            }),
        )
        .route(
            "/upload",
            post(|mut multipart: Multipart| async move {
                let mut filename = String::new();
                while let Some(field) = multipart.next_field().await.unwrap() {
                    if field.name() == Some("file") {
                        filename = field.file_name().unwrap_or_default().to_string();
                    }
                }
                Json(json!({
                    "document_id": "9b2e",
                    "filename": filename,
                    "chunks_processed": 7,
                    "status": "success"
                }))
            }),
        )
}

#[tokio::test(flavor = "multi_thread")]
async fn test_upload_end_to_end() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server_handle = tokio::spawn(async move {
        axum::serve(listener, upload_service()).await.unwrap();
    });

    let (tmp, config) = setup_test_env(&format!("http://{}", addr));
    let report = tmp.path().join("report.txt");
    fs::write(&report, "Quarterly numbers.").unwrap();

    let (stdout, stderr, success) = tokio::task::spawn_blocking(move || {
        let result = run_ingestctl(
            &config,
            &["upload", report.to_str().unwrap(), "--collection", "docs-a"],
        );
        drop(tmp);
        result
    })
    .await
    .unwrap();

    assert!(success, "stderr: {}", stderr);
    assert!(
        stdout.contains("Document uploaded successfully! Processed 7 chunks."),
        "stdout: {}",
        stdout
    );
    assert!(stdout.contains("document_id: 9b2e"));

    server_handle.abort();
}
