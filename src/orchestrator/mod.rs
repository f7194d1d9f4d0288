//! Top-level retrieval driver.
//!
//! [`RetrievalOrchestrator::run`] turns one [`Locator`] into a [`BatchReport`]:
//! it walks the catalog when the locator needs it, resolves each book's
//! metadata, fetches the artifact and records exactly one outcome per book.
//! Books are processed strictly one after another with a fixed pause between
//! attempts; an interrupt request is honored between books only.
//!
//! # Architecture
//!
//! - [`Locator`] / [`Cursor`] - What to retrieve
//! - [`BatchReport`] - Per-book outcomes, skipped shards and resume hint
//! - [`RetryPolicy`] - Backoff for the shard-list fetch

mod locator;
mod report;
mod retry;

pub use locator::{BookRef, Cursor, Locator, LocatorError};
pub use report::{BatchReport, BookFailure, BookSuccess, FailureReason, RetrievalOutcome};
pub use retry::{
    DEFAULT_CATALOG_ATTEMPTS, FailureType, RetryDecision, RetryPolicy, classify_catalog_error,
};

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::catalog::{
    CatalogClient, CatalogError, SequenceError, SequenceResolver, ShardEntry, ShardListing,
    ShardSet, ShardSource, ShardState,
};
use crate::config::RetrievalConfig;
use crate::download::{ArtifactFetcher, artifact_file_name};
use crate::http_client::ClientBuildError;
use crate::resolver::MetadataResolver;

/// Errors that abort a whole run.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The locator violates a precondition; nothing was fetched.
    #[error(transparent)]
    InvalidLocator(#[from] LocatorError),

    /// The shard list could not be obtained and no fallback was enabled.
    #[error(
        "catalog shard list unavailable after {attempts} attempt(s): {source}\n  Suggestion: check network access, or enable the fallback catalog"
    )]
    CatalogUnavailable {
        /// Attempts made.
        attempts: u32,
        /// Last error.
        #[source]
        source: CatalogError,
    },
}

/// Run-level knobs.
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Pause between successive book attempts in batch modes.
    pub pause: Duration,
    /// Backoff for the shard-list fetch.
    pub catalog_retry: RetryPolicy,
    /// Last-known shard list used only when set and the live list is unreachable.
    pub fallback_shards: Option<Vec<String>>,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            pause: Duration::from_secs(1),
            catalog_retry: RetryPolicy::default(),
            fallback_shards: None,
        }
    }
}

/// Composes the catalog, metadata and artifact layers for one locator at a time.
pub struct RetrievalOrchestrator {
    shards: Box<dyn ShardSource>,
    sequence: SequenceResolver,
    metadata: MetadataResolver,
    fetcher: ArtifactFetcher,
    options: OrchestratorOptions,
    interrupt: Arc<AtomicBool>,
}

impl RetrievalOrchestrator {
    /// Assembles an orchestrator from its parts.
    #[must_use]
    pub fn new(
        shards: Box<dyn ShardSource>,
        metadata: MetadataResolver,
        fetcher: ArtifactFetcher,
        options: OrchestratorOptions,
    ) -> Self {
        Self {
            shards,
            sequence: SequenceResolver::new(),
            metadata,
            fetcher,
            options,
            interrupt: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Builds the HTTP-backed layers described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientBuildError`] if any HTTP client cannot be built.
    pub fn from_config(config: &RetrievalConfig) -> Result<Self, ClientBuildError> {
        let shards = CatalogClient::with_version_url(&config.catalog_version_url, config.timeouts)?;
        let metadata = MetadataResolver::with_base_url(&config.detail_base_url, config.timeouts)?;
        let fetcher = ArtifactFetcher::new(config.timeouts, config.artifact_policy.clone())?;
        Ok(Self::new(
            Box::new(shards),
            metadata,
            fetcher,
            config.orchestrator_options(),
        ))
    }

    /// Shares an externally owned interrupt flag (e.g. set by a Ctrl-C watcher).
    #[must_use]
    pub fn with_interrupt_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = flag;
        self
    }

    /// The flag checked between book attempts.
    #[must_use]
    pub fn interrupt_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupt)
    }

    /// The shard source this orchestrator reads.
    #[must_use]
    pub fn shard_source(&self) -> &dyn ShardSource {
        self.shards.as_ref()
    }

    /// Fetches the shard list, retrying transient failures, and falls back to
    /// the configured last-known list only when one is enabled.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::CatalogUnavailable`] once retries are
    /// exhausted and no fallback is configured.
    pub async fn fetch_shard_listing(&self) -> Result<ShardListing, OrchestratorError> {
        let policy = &self.options.catalog_retry;
        let mut attempt = 1;
        loop {
            let error = match self.shards.list_shards().await {
                Ok(listing) => return Ok(listing),
                Err(error) => error,
            };

            match policy.should_retry(classify_catalog_error(&error), attempt) {
                RetryDecision::Retry { delay, attempt: next } => {
                    warn!(attempt, error = %error, delay_ms = delay.as_millis(), "shard list fetch failed; retrying");
                    tokio::time::sleep(delay).await;
                    attempt = next;
                }
                RetryDecision::DoNotRetry { reason } => {
                    if let Some(fallback) = self.options.fallback_shards.as_ref()
                        && !fallback.is_empty()
                    {
                        warn!(
                            error = %error,
                            shards = fallback.len(),
                            "catalog unreachable; using fallback shard list (degraded mode)"
                        );
                        return Ok(ShardListing::fallback(fallback.clone()));
                    }
                    warn!(attempt, reason = %reason, "giving up on shard list");
                    return Err(OrchestratorError::CatalogUnavailable {
                        attempts: attempt,
                        source: error,
                    });
                }
            }
        }
    }

    /// Retrieves every book named by `locator` into `destination_root`.
    ///
    /// Per-book failures are recorded in the report and never abort the run.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::InvalidLocator`] before any network access
    /// when the locator is malformed, and
    /// [`OrchestratorError::CatalogUnavailable`] when the locator needs the
    /// catalog and the shard list cannot be obtained.
    #[instrument(skip(self, destination_root), fields(locator = %locator))]
    pub async fn run(
        &self,
        locator: &Locator,
        destination_root: &Path,
    ) -> Result<BatchReport, OrchestratorError> {
        locator.validate()?;
        let mut report = BatchReport::default();

        match locator {
            Locator::ById(book_id) => {
                let book_id = book_id.trim();
                self.retrieve(
                    &mut report,
                    BookRef::Id(book_id.to_string()),
                    book_id,
                    None,
                    destination_root,
                )
                .await;
            }
            Locator::ByGlobalSequence(sequence) => {
                let mut shards = self.open_shards(&mut report).await?;
                if let Err(error) = self
                    .retrieve_sequence(&mut report, &mut shards, *sequence, destination_root)
                    .await
                {
                    record_lookup_failure(&mut report, BookRef::Sequence(*sequence), &error);
                }
                report.skipped_shards = shards.unreachable_shards();
            }
            Locator::ByRange { start, end } => {
                let (start, end) = ((*start).min(*end), (*start).max(*end));
                let mut shards = self.open_shards(&mut report).await?;
                for sequence in start..=end {
                    if sequence != start {
                        self.pause().await;
                    }
                    if self.is_interrupted() {
                        warn!(next = sequence, "interrupted; stopping range");
                        report.interrupted = true;
                        report.resume = Some(Locator::range(sequence, end));
                        break;
                    }
                    let Err(error) = self
                        .retrieve_sequence(&mut report, &mut shards, sequence, destination_root)
                        .await
                    else {
                        continue;
                    };
                    if error.past_end_total().is_some() && sequence < end {
                        warn!(
                            first = sequence,
                            last = end,
                            "rest of range is past the end of the catalog"
                        );
                        let detail =
                            format!("{error}; every number through {end} is past the end as well");
                        report.record_failure(
                            BookRef::SequenceSpan { start: sequence, end },
                            None,
                            FailureReason::from(&error),
                            detail,
                        );
                        break;
                    }
                    record_lookup_failure(&mut report, BookRef::Sequence(sequence), &error);
                }
                report.skipped_shards = shards.unreachable_shards();
            }
            Locator::ByCursor(cursor) => {
                let mut shards = self.open_shards(&mut report).await?;
                self.walk_cursor(&mut report, &mut shards, cursor, destination_root)
                    .await;
                report.skipped_shards = shards.unreachable_shards();
            }
        }

        info!(
            attempted = report.attempted(),
            succeeded = report.succeeded(),
            failed = report.failures.len(),
            skipped_shards = report.skipped_shards.len(),
            "run finished"
        );
        Ok(report)
    }

    async fn open_shards(&self, report: &mut BatchReport) -> Result<ShardSet<'_>, OrchestratorError> {
        let listing = self.fetch_shard_listing().await?;
        report.degraded = listing.is_degraded();
        Ok(ShardSet::new(self.shards.as_ref(), listing))
    }

    /// Legacy shard-by-shard walk.
    ///
    /// The walk counter starts at the cursor's item offset and is bumped before
    /// each book is considered; only the first visited shard honors the offset.
    /// `max_count` counts successful downloads only.
    async fn walk_cursor(
        &self,
        report: &mut BatchReport,
        shards: &mut ShardSet<'_>,
        cursor: &Cursor,
        destination_root: &Path,
    ) {
        let mut counter = cursor.intra_index as u64;
        let mut stored = 0usize;
        let mut start_item = cursor.intra_index;
        let mut attempted_any = false;
        let mut reached_single = false;

        'walk: for shard_index in cursor.shard_index..shards.shard_count() {
            let entries = match shards.load(shard_index).await {
                Some(ShardState::Loaded(entries)) => entries.clone(),
                Some(ShardState::Unreachable(_)) => {
                    start_item = 0;
                    continue;
                }
                None => break,
            };
            info!(shard_index, books = entries.len(), "walking shard");

            for (intra_index, entry) in entries.iter().enumerate().skip(start_item) {
                counter += 1;
                if let Some(single) = cursor.single_index
                    && counter != single
                {
                    continue;
                }

                // A single filter counts from the original start.
                let resume_here = || {
                    let (shard_index, intra_index) = if cursor.single_index.is_some() {
                        (cursor.shard_index, cursor.intra_index)
                    } else {
                        (shard_index, intra_index)
                    };
                    Locator::ByCursor(Cursor {
                        shard_index,
                        intra_index,
                        ..cursor.clone()
                    })
                };
                if let Some(limit) = cursor.max_count
                    && stored >= limit
                {
                    info!(limit, "download limit reached");
                    report.resume = Some(resume_here());
                    break 'walk;
                }
                if attempted_any {
                    self.pause().await;
                }
                if self.is_interrupted() {
                    warn!(shard_index, intra_index, "interrupted; stopping cursor walk");
                    report.interrupted = true;
                    report.resume = Some(resume_here());
                    break 'walk;
                }

                attempted_any = true;
                let book_ref = BookRef::Position {
                    shard_index,
                    intra_index,
                    counter,
                };
                let stored_now = match entry {
                    ShardEntry::Book(book) => {
                        let name = Some(book.display_name());
                        self.retrieve(report, book_ref, &book.id, name, destination_root)
                            .await
                    }
                    ShardEntry::Malformed { reason } => {
                        warn!(%book_ref, reason = %reason, "skipping malformed catalog entry");
                        report.record_failure(
                            book_ref,
                            None,
                            FailureReason::NotFound,
                            reason.clone(),
                        );
                        false
                    }
                };
                if stored_now {
                    stored += 1;
                }
                if cursor.single_index.is_some() {
                    reached_single = true;
                    break 'walk;
                }
            }
            start_item = 0;
        }

        if let Some(single) = cursor.single_index
            && !reached_single
            && !report.interrupted
        {
            report.record_failure(
                BookRef::Counter(single),
                None,
                FailureReason::NotFound,
                format!("cursor walk ended at #{counter} before reaching #{single}"),
            );
        }
    }

    /// Resolves `sequence` and retrieves the book it names.
    ///
    /// Lookup errors are returned unrecorded so the caller can decide how to
    /// report them; retrieval outcomes are recorded here.
    async fn retrieve_sequence(
        &self,
        report: &mut BatchReport,
        shards: &mut ShardSet<'_>,
        sequence: u64,
        destination_root: &Path,
    ) -> Result<bool, SequenceError> {
        let hit = self.sequence.resolve(shards, sequence).await.inspect_err(|error| {
            warn!(sequence, error = %error, "sequence lookup failed");
        })?;
        let name = hit.book.display_name();
        Ok(self
            .retrieve(
                report,
                BookRef::Sequence(sequence),
                &hit.book.id,
                Some(name),
                destination_root,
            )
            .await)
    }

    /// Metadata lookup plus artifact fetch for one book; returns true when stored.
    async fn retrieve(
        &self,
        report: &mut BatchReport,
        book: BookRef,
        book_id: &str,
        display_name: Option<String>,
        destination_root: &Path,
    ) -> bool {
        let display_name = display_name.filter(|name| !name.trim().is_empty());
        let metadata = match self.metadata.resolve(book_id).await {
            Ok(metadata) => metadata,
            Err(error) => {
                warn!(%book, book_id, error = %error, "metadata resolution failed");
                report.record_failure(
                    book,
                    display_name,
                    FailureReason::from(&error),
                    error.to_string(),
                );
                return false;
            }
        };

        let name = display_name
            .or(metadata.title)
            .unwrap_or_else(|| format!("Book_{book_id}"));
        let destination = destination_root.join(artifact_file_name(&name, book_id));

        match self.fetcher.fetch(&metadata.candidates, &destination).await {
            Ok(stored) => {
                report.record_success(book, name, &stored);
                true
            }
            Err(error) => {
                warn!(%book, book_id, error = %error, "artifact retrieval failed");
                report.record_failure(
                    book,
                    Some(name),
                    FailureReason::from(&error),
                    error.to_string(),
                );
                false
            }
        }
    }

    async fn pause(&self) {
        if !self.options.pause.is_zero() {
            tokio::time::sleep(self.options.pause).await;
        }
    }

    fn is_interrupted(&self) -> bool {
        self.interrupt.load(Ordering::SeqCst)
    }
}

fn record_lookup_failure(report: &mut BatchReport, book: BookRef, error: &SequenceError) {
    report.record_failure(book, None, FailureReason::from(error), error.to_string());
}
