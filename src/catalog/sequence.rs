//! Global sequence number resolution across variably-sized shards.

use thiserror::Error;
use tracing::{debug, instrument, warn};

use super::{BookSummary, ShardEntry, ShardListing, ShardSource};

/// Fetch state of one shard within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShardState {
    /// The shard was fetched; its size is fixed for the rest of the run.
    Loaded(Vec<ShardEntry>),
    /// The shard could not be fetched; its size is unknown.
    Unreachable(String),
}

/// Lazily fetched shards for the duration of one orchestration call.
///
/// Each shard is requested at most once. A shard that fails stays
/// [`ShardState::Unreachable`] for the rest of the run so that numbering stays
/// consistent across every lookup made against the same set.
pub struct ShardSet<'a> {
    source: &'a dyn ShardSource,
    listing: ShardListing,
    states: Vec<Option<ShardState>>,
}

impl<'a> ShardSet<'a> {
    /// Creates an empty cache over the given listing.
    #[must_use]
    pub fn new(source: &'a dyn ShardSource, listing: ShardListing) -> Self {
        let states = vec![None; listing.endpoints.len()];
        Self {
            source,
            listing,
            states,
        }
    }

    /// Number of shards in the listing.
    #[must_use]
    pub fn shard_count(&self) -> usize {
        self.listing.endpoints.len()
    }

    /// The listing this set was built from.
    #[must_use]
    pub fn listing(&self) -> &ShardListing {
        &self.listing
    }

    /// Returns the state of shard `index`, fetching it on first use.
    ///
    /// Returns `None` only when `index` is past the end of the listing.
    #[instrument(skip(self))]
    pub async fn load(&mut self, index: usize) -> Option<&ShardState> {
        let endpoint = self.listing.endpoints.get(index)?;
        if self.states[index].is_none() {
            let state = match self.source.fetch_shard(endpoint).await {
                Ok(books) => ShardState::Loaded(books),
                Err(error) => {
                    warn!(shard_index = index, error = %error, "skipping unreachable shard");
                    ShardState::Unreachable(error.to_string())
                }
            };
            self.states[index] = Some(state);
        }
        self.states[index].as_ref()
    }

    /// Indexes of shards fetched so far that turned out unreachable.
    #[must_use]
    pub fn unreachable_shards(&self) -> Vec<usize> {
        self.states
            .iter()
            .enumerate()
            .filter(|(_, state)| matches!(state, Some(ShardState::Unreachable(_))))
            .map(|(index, _)| index)
            .collect()
    }
}

/// A resolved global sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceHit {
    /// The book at that position.
    pub book: BookSummary,
    /// Zero-based shard index.
    pub shard_index: usize,
    /// Zero-based position within the shard.
    pub intra_index: usize,
    /// Unreachable shards passed over before the hit; their books were not
    /// counted, so numbering after them is shifted.
    pub skipped_shards: Vec<usize>,
}

/// Errors from sequence resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    /// Sequence numbers start at 1; rejected before any network access.
    #[error("invalid sequence number {sequence}: sequence numbers start at 1")]
    InvalidSequence {
        /// The rejected value.
        sequence: u64,
    },

    /// The sequence number is past the end of every reachable shard.
    #[error(
        "sequence number {sequence} not found: reachable shards hold {reachable_total} books{}",
        skipped_note(skipped_shards)
    )]
    NotFound {
        /// The requested sequence number.
        sequence: u64,
        /// Total books across the shards that could be fetched.
        reachable_total: u64,
        /// Shards that could not be fetched.
        skipped_shards: Vec<usize>,
    },

    /// The sequence number lands on a shard element that is not a usable book.
    #[error(
        "sequence number {sequence} is a malformed catalog entry (shard {shard_index}, item {intra_index}): {reason}"
    )]
    MalformedEntry {
        /// The requested sequence number.
        sequence: u64,
        /// Zero-based shard index.
        shard_index: usize,
        /// Zero-based position within the shard.
        intra_index: usize,
        /// Why the entry was rejected.
        reason: String,
    },
}

impl SequenceError {
    /// Total books reachable when `sequence` lies past the end of the catalog.
    ///
    /// Every larger sequence number in the same run fails the same way.
    #[must_use]
    pub fn past_end_total(&self) -> Option<u64> {
        match self {
            Self::NotFound {
                reachable_total, ..
            } => Some(*reachable_total),
            Self::InvalidSequence { .. } | Self::MalformedEntry { .. } => None,
        }
    }
}

fn skipped_note(skipped: &[usize]) -> String {
    if skipped.is_empty() {
        String::new()
    } else {
        format!(" ({} shard(s) unreachable: {skipped:?})", skipped.len())
    }
}

/// Maps 1-based global sequence numbers to books by accumulating shard sizes.
///
/// Walks shards in order with a running base offset starting at 1. Shard `i`
/// covers `base..base + len(i)`. Unreachable shards are skipped without
/// guessing a size, so `base` only ever advances by sizes that were observed.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceResolver;

impl SequenceResolver {
    /// Creates a resolver.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Resolves `sequence` against `shards`.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::InvalidSequence`] for 0 (no shard is fetched),
    /// [`SequenceError::NotFound`] when the reachable shards hold fewer than
    /// `sequence` books and [`SequenceError::MalformedEntry`] when the number
    /// lands on an unusable element.
    #[instrument(skip(self, shards))]
    pub async fn resolve(
        &self,
        shards: &mut ShardSet<'_>,
        sequence: u64,
    ) -> Result<SequenceHit, SequenceError> {
        if sequence < 1 {
            return Err(SequenceError::InvalidSequence { sequence });
        }

        let mut base: u64 = 1;
        let mut skipped_shards = Vec::new();

        for shard_index in 0..shards.shard_count() {
            let entries = match shards.load(shard_index).await {
                Some(ShardState::Loaded(entries)) => entries,
                Some(ShardState::Unreachable(_)) => {
                    skipped_shards.push(shard_index);
                    continue;
                }
                None => break,
            };

            let size = entries.len() as u64;
            if base <= sequence && sequence < base + size {
                let intra_index = usize::try_from(sequence - base).unwrap_or(usize::MAX);
                match entries.get(intra_index) {
                    Some(ShardEntry::Book(book)) => {
                        debug!(shard_index, intra_index, book_id = %book.id, "sequence resolved");
                        return Ok(SequenceHit {
                            book: book.clone(),
                            shard_index,
                            intra_index,
                            skipped_shards,
                        });
                    }
                    Some(ShardEntry::Malformed { reason }) => {
                        return Err(SequenceError::MalformedEntry {
                            sequence,
                            shard_index,
                            intra_index,
                            reason: reason.clone(),
                        });
                    }
                    None => {}
                }
            }
            base += size;
        }

        Err(SequenceError::NotFound {
            sequence,
            reachable_total: base - 1,
            skipped_shards,
        })
    }
}
