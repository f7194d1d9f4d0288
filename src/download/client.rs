//! Rank-ordered artifact retrieval with content validation.
//!
//! This module provides the [`ArtifactFetcher`], which walks a book's
//! candidate endpoints strictly in rank order, validates each response and
//! persists the first acceptable body through a partial file that is renamed
//! into place only once complete.

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::constants::{DEFAULT_CONTENT_TYPE_MARKER, DEFAULT_MIN_ARTIFACT_BYTES};
use super::error::{CandidateRejection, DownloadError, RejectionKind};
use super::filename::partial_path;
use crate::http_client::{ClientBuildError, HttpTimeouts, build_http_client};
use crate::resolver::ArtifactCandidateSet;

/// Acceptance rules for a candidate response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPolicy {
    /// Bodies smaller than this are rejected.
    pub min_bytes: u64,
    /// Lowercase substring the `Content-Type` header must contain.
    pub content_type_marker: String,
}

impl Default for ArtifactPolicy {
    fn default() -> Self {
        Self {
            min_bytes: DEFAULT_MIN_ARTIFACT_BYTES,
            content_type_marker: DEFAULT_CONTENT_TYPE_MARKER.to_string(),
        }
    }
}

impl ArtifactPolicy {
    /// Creates a policy with a custom minimum size and the default marker.
    #[must_use]
    pub fn with_min_bytes(min_bytes: u64) -> Self {
        Self {
            min_bytes,
            ..Self::default()
        }
    }

    fn accepts_content_type(&self, content_type: &str) -> bool {
        content_type
            .to_ascii_lowercase()
            .contains(&self.content_type_marker.to_ascii_lowercase())
    }
}

/// A persisted artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    /// Final path of the file.
    pub path: PathBuf,
    /// Bytes written.
    pub bytes: u64,
    /// Rank of the candidate that was accepted.
    pub rank: usize,
    /// Candidates rejected before the accepted one.
    pub rejections: Vec<CandidateRejection>,
}

/// Outcome of one candidate attempt that did not produce a file.
enum AttemptError {
    /// Move on to the next candidate.
    Rejected(RejectionKind),
    /// Local persistence failed; the book is abandoned.
    Persist(DownloadError),
}

impl From<RejectionKind> for AttemptError {
    fn from(kind: RejectionKind) -> Self {
        Self::Rejected(kind)
    }
}

fn rejection_from_reqwest(error: &reqwest::Error) -> RejectionKind {
    if error.is_timeout() {
        RejectionKind::Timeout
    } else {
        RejectionKind::Transport(error.to_string())
    }
}

/// Fetches artifacts from ranked candidate endpoints.
///
/// Created once per run and reused across books so connections are pooled.
#[derive(Debug, Clone)]
pub struct ArtifactFetcher {
    client: Client,
    policy: ArtifactPolicy,
}

impl ArtifactFetcher {
    /// Creates a fetcher with the given timeouts and acceptance policy.
    ///
    /// # Errors
    ///
    /// Returns [`ClientBuildError`] if HTTP client construction fails.
    pub fn new(timeouts: HttpTimeouts, policy: ArtifactPolicy) -> Result<Self, ClientBuildError> {
        Ok(Self {
            client: build_http_client("artifact", timeouts)?,
            policy,
        })
    }

    /// Returns the acceptance policy.
    #[must_use]
    pub fn policy(&self) -> &ArtifactPolicy {
        &self.policy
    }

    /// Tries each candidate in rank order and persists the first valid body to
    /// `destination`.
    ///
    /// Transport errors, timeouts, bad statuses and failed validation on one
    /// candidate pass control to the next rank. Nothing is ever left at
    /// `destination` unless a body was fully accepted.
    ///
    /// # Errors
    ///
    /// - [`DownloadError::NoCandidates`] when `candidates` is empty
    /// - [`DownloadError::AllEndpointsFailed`] when every candidate was rejected
    /// - [`DownloadError::Io`] when an accepted body could not be written
    #[instrument(skip(self, candidates), fields(candidates = candidates.len(), destination = %destination.display()))]
    pub async fn fetch(
        &self,
        candidates: &ArtifactCandidateSet,
        destination: &Path,
    ) -> Result<StoredArtifact, DownloadError> {
        let name = destination
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        if candidates.is_empty() {
            return Err(DownloadError::NoCandidates { name });
        }

        let mut rejections = Vec::new();
        for candidate in candidates.iter() {
            debug!(rank = candidate.rank, url = %candidate.url, "trying candidate");
            match self.try_candidate(&candidate.url, destination).await {
                Ok(bytes) => {
                    info!(
                        rank = candidate.rank,
                        bytes,
                        path = %destination.display(),
                        "artifact stored"
                    );
                    return Ok(StoredArtifact {
                        path: destination.to_path_buf(),
                        bytes,
                        rank: candidate.rank,
                        rejections,
                    });
                }
                Err(AttemptError::Rejected(kind)) => {
                    warn!(rank = candidate.rank, url = %candidate.url, reason = %kind, "candidate rejected");
                    rejections.push(CandidateRejection {
                        rank: candidate.rank,
                        url: candidate.url.clone(),
                        kind,
                    });
                }
                Err(AttemptError::Persist(error)) => return Err(error),
            }
        }

        Err(DownloadError::AllEndpointsFailed {
            name,
            attempts: rejections,
        })
    }

    async fn try_candidate(&self, url: &str, destination: &Path) -> Result<u64, AttemptError> {
        let parsed = Url::parse(url).map_err(|_| RejectionKind::InvalidUrl)?;

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| rejection_from_reqwest(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RejectionKind::HttpStatus(status.as_u16()).into());
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !self.policy.accepts_content_type(&content_type) {
            return Err(RejectionKind::ContentType(content_type).into());
        }

        // A declared length is enough to reject without reading the body.
        if let Some(announced) = response.content_length()
            && announced < self.policy.min_bytes
        {
            return Err(RejectionKind::TooSmall {
                bytes: announced,
                min_bytes: self.policy.min_bytes,
            }
            .into());
        }

        let part = partial_path(destination);
        let outcome = self.stream_and_commit(response, &part, destination).await;
        if outcome.is_err() {
            debug!(path = %part.display(), "removing partial file");
            let _ = tokio::fs::remove_file(&part).await;
        }
        outcome
    }

    async fn stream_and_commit(
        &self,
        response: reqwest::Response,
        part: &Path,
        destination: &Path,
    ) -> Result<u64, AttemptError> {
        let bytes = stream_to_file(response, part).await?;
        if bytes < self.policy.min_bytes {
            return Err(RejectionKind::TooSmall {
                bytes,
                min_bytes: self.policy.min_bytes,
            }
            .into());
        }
        tokio::fs::rename(part, destination)
            .await
            .map_err(|e| AttemptError::Persist(DownloadError::io(destination, e)))?;
        Ok(bytes)
    }
}

/// Streams the response body to `path`, returning bytes written.
async fn stream_to_file(response: reqwest::Response, path: &Path) -> Result<u64, AttemptError> {
    let persist = |e| AttemptError::Persist(DownloadError::io(path, e));

    let file = File::create(path).await.map_err(persist)?;
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| rejection_from_reqwest(&e))?;
        writer.write_all(&chunk).await.map_err(persist)?;
        bytes_written += chunk.len() as u64;
    }

    writer.flush().await.map_err(persist)?;
    writer.into_inner().sync_all().await.map_err(persist)?;
    Ok(bytes_written)
}
