//! Textbook Core Library
//!
//! This library resolves and retrieves PDF textbooks published through a
//! sharded remote catalog. A book can be named by identifier, by its global
//! sequence number across all shards, by a range of sequence numbers, or by a
//! legacy shard/item cursor; each book is resolved to a ranked set of mirror
//! endpoints and stored once a response passes content validation.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`catalog`] - Shard listing, shard fetching and global-sequence arithmetic
//! - [`resolver`] - Per-book detail documents and candidate endpoints
//! - [`download`] - Ranked-fallback artifact retrieval and local persistence
//! - [`orchestrator`] - Locators, batch runs and the per-book report
//! - [`export`] - CSV export of the whole catalog
//! - [`config`] - Run-level defaults
//! - [`http_client`] - Shared HTTP client construction

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod config;
pub mod download;
pub mod export;
pub mod http_client;
pub mod orchestrator;
pub mod resolver;
mod user_agent;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use catalog::{BookSummary, CatalogClient, CatalogError, ShardEntry, ShardSource};
pub use config::RetrievalConfig;
pub use download::{ArtifactFetcher, ArtifactPolicy, DownloadError};
pub use export::{ExportError, ExportSummary, write_catalog_csv};
pub use orchestrator::{
    BatchReport, BookFailure, BookRef, BookSuccess, Cursor, FailureReason, Locator, LocatorError,
    OrchestratorError, RetrievalOrchestrator, RetrievalOutcome,
};
pub use resolver::{BookMetadata, MetadataResolver, ResolveError};
