//! Artifact download: rank-ordered endpoint fallback with validation.
//!
//! # Features
//!
//! - Strict rank order, stop at first acceptance, no concurrent racing
//! - Status, `Content-Type` and minimum-size validation per candidate
//! - Streaming to a `.part` file renamed into place only when accepted
//! - Readable file names derived from the book's display name
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use textbook_core::download::{ArtifactFetcher, ArtifactPolicy};
//! use textbook_core::http_client::HttpTimeouts;
//! use textbook_core::resolver::ArtifactCandidateSet;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = ArtifactFetcher::new(HttpTimeouts::default(), ArtifactPolicy::default())?;
//! let candidates = ArtifactCandidateSet::from_urls(["https://r1-ndr-oversea.example/a.pdf"]);
//! let stored = fetcher.fetch(&candidates, Path::new("./downloads/book.pdf")).await?;
//! println!("stored {} bytes from rank {}", stored.bytes, stored.rank);
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod error;
mod filename;

pub use client::{ArtifactFetcher, ArtifactPolicy, StoredArtifact};
pub use constants::{DEFAULT_CONTENT_TYPE_MARKER, DEFAULT_MIN_ARTIFACT_BYTES};
pub use error::{CandidateRejection, DownloadError, RejectionKind};
pub use filename::{artifact_file_name, sanitize_filename};
