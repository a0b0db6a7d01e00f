//! # Ingest Console
//!
//! A terminal console for a document-ingestion service backed by a vector
//! store (Qdrant). It connects to a vector-store instance, uploads documents
//! into new or existing collections with chunking parameters, and lists or
//! deletes indexes and their documents.
//!
//! The service does the heavy lifting (parsing, chunking, embedding,
//! vector-store writes). This crate owns the client-side state machine that
//! keeps the console consistent with it.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────── Console ────────────────────────────┐
//! │ ConnectionState      UploadState         CatalogState     Banner │
//! │ (connect, list       (file, form,        (indexes, selected,     │
//! │  collections)         submit, progress)   documents, deletes)    │
//! └──────────────┬───────────────────────────────────┬──────────────┘
//!                │ transitions → Vec<Effect>          │ run_effects()
//!                ▼                                    ▼
//!           ┌─────────────────── Backend ───────────────────┐
//!           │        HttpBackend (reqwest) │ test doubles    │
//!           └───────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! ingestctl connect                                   # test the vector store
//! ingestctl upload report.pdf --collection docs-a     # upload into a collection
//! ingestctl indexes                                   # list indexes
//! ingestctl documents docs-a                          # list one index's documents
//! ingestctl delete-index docs-a                       # asks for confirmation
//! ingestctl shell                                     # interactive session
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and environment overrides |
//! | [`models`] | Wire types and client-side values |
//! | [`error`] | Backend and validation errors |
//! | [`backend`] | Collaborator trait and HTTP implementation |
//! | [`connection`] | Connection lifecycle |
//! | [`upload`] | Upload form, validation and submission gating |
//! | [`catalog`] | Index and document lists |
//! | [`console`] | Orchestration context and effect runner |
//! | [`progress`] | Upload progress reporters |
//! | [`report`] | Terminal rendering of listings |
//! | [`commands`] | One-shot CLI commands |
//! | [`shell`] | Interactive session |

pub mod backend;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod connection;
pub mod console;
pub mod error;
pub mod models;
pub mod progress;
pub mod report;
pub mod shell;
pub mod upload;
