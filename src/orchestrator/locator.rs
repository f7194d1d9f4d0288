//! Book locators: what a run is asked to retrieve.

use std::fmt;

use thiserror::Error;

/// Legacy shard-by-shard walk position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    /// Zero-based shard to start at.
    pub shard_index: usize,
    /// Zero-based item to start at inside the first visited shard only.
    pub intra_index: usize,
    /// Only retrieve the book whose walk counter equals this value.
    pub single_index: Option<u64>,
    /// Stop once this many books were stored successfully.
    pub max_count: Option<usize>,
}

impl Cursor {
    /// Cursor starting at `(shard_index, intra_index)` with no filters.
    #[must_use]
    pub fn at(shard_index: usize, intra_index: usize) -> Self {
        Self {
            shard_index,
            intra_index,
            single_index: None,
            max_count: None,
        }
    }
}

/// Exactly one way of naming the books a run should retrieve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// An explicit book identifier; skips the catalog entirely.
    ById(String),
    /// A 1-based global sequence number.
    ByGlobalSequence(u64),
    /// An inclusive range of global sequence numbers, `start <= end`.
    ByRange {
        /// First sequence number.
        start: u64,
        /// Last sequence number (inclusive).
        end: u64,
    },
    /// Legacy pagination cursor.
    ByCursor(Cursor),
}

/// Errors from locator parsing and validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocatorError {
    /// Empty book identifier.
    #[error("book identifier must not be empty")]
    EmptyIdentifier,

    /// A sequence number or bound below 1.
    #[error("sequence numbers start at 1, got {value}")]
    ZeroSequence {
        /// The offending value.
        value: u64,
    },

    /// A range string that is not `N` or `START-END`.
    #[error("invalid range '{input}': expected N or START-END with positive integers")]
    InvalidRange {
        /// The raw input.
        input: String,
    },

    /// A cursor filter that can never match (`--single 0`, `--limit 0`).
    #[error("invalid cursor {field}: must be at least 1")]
    InvalidCursorFilter {
        /// Which filter was rejected.
        field: &'static str,
    },
}

impl Locator {
    /// Builds a range locator, swapping reversed bounds.
    #[must_use]
    pub fn range(start: u64, end: u64) -> Self {
        Self::ByRange {
            start: start.min(end),
            end: start.max(end),
        }
    }

    /// Parses `N` or `START-END` into a normalized range locator.
    ///
    /// # Errors
    ///
    /// Returns [`LocatorError::InvalidRange`] for malformed input and
    /// [`LocatorError::ZeroSequence`] when a bound is 0.
    pub fn parse_range(input: &str) -> Result<Self, LocatorError> {
        let invalid = || LocatorError::InvalidRange {
            input: input.to_string(),
        };
        let parse_bound = |raw: &str| raw.trim().parse::<u64>().map_err(|_| invalid());

        let trimmed = input.trim();
        let (start, end) = match trimmed.split_once('-') {
            Some((start, end)) => (parse_bound(start)?, parse_bound(end)?),
            None => {
                let single = parse_bound(trimmed)?;
                (single, single)
            }
        };
        let locator = Self::range(start, end);
        locator.validate()?;
        Ok(locator)
    }

    /// Checks the variant's preconditions without any network access.
    ///
    /// # Errors
    ///
    /// Returns the first violated precondition.
    pub fn validate(&self) -> Result<(), LocatorError> {
        match self {
            Self::ById(id) if id.trim().is_empty() => Err(LocatorError::EmptyIdentifier),
            Self::ById(_) => Ok(()),
            Self::ByGlobalSequence(n) if *n < 1 => Err(LocatorError::ZeroSequence { value: *n }),
            Self::ByGlobalSequence(_) => Ok(()),
            Self::ByRange { start, end } => {
                let low = (*start).min(*end);
                if low < 1 {
                    Err(LocatorError::ZeroSequence { value: low })
                } else {
                    Ok(())
                }
            }
            Self::ByCursor(cursor) => {
                if cursor.single_index == Some(0) {
                    return Err(LocatorError::InvalidCursorFilter { field: "single" });
                }
                if cursor.max_count == Some(0) {
                    return Err(LocatorError::InvalidCursorFilter { field: "limit" });
                }
                Ok(())
            }
        }
    }
}

/// Renders the locator as the CLI arguments that would reproduce it.
impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ById(id) => write!(f, "id {id}"),
            Self::ByGlobalSequence(n) => write!(f, "seq {n}"),
            Self::ByRange { start, end } if start == end => write!(f, "range {start}"),
            Self::ByRange { start, end } => write!(f, "range {start}-{end}"),
            Self::ByCursor(cursor) => {
                write!(
                    f,
                    "cursor --table {} --item {}",
                    cursor.shard_index, cursor.intra_index
                )?;
                if let Some(single) = cursor.single_index {
                    write!(f, " --single {single}")?;
                }
                if let Some(limit) = cursor.max_count {
                    write!(f, " --limit {limit}")?;
                }
                Ok(())
            }
        }
    }
}

/// How one book inside a run is identified in the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookRef {
    /// Explicit identifier.
    Id(String),
    /// Global sequence number.
    Sequence(u64),
    /// Inclusive run of global sequence numbers reported as one outcome.
    SequenceSpan {
        /// First sequence number.
        start: u64,
        /// Last sequence number (inclusive).
        end: u64,
    },
    /// Cursor walk position.
    Position {
        /// Zero-based shard index.
        shard_index: usize,
        /// Zero-based item index inside the shard.
        intra_index: usize,
        /// Walk counter value.
        counter: u64,
    },
    /// Cursor walk counter that was never reached.
    Counter(u64),
}

impl fmt::Display for BookRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "ID {id}"),
            Self::Sequence(n) => write!(f, "Sequence {n}"),
            Self::SequenceSpan { start, end } => write!(f, "Sequences {start}-{end}"),
            Self::Position {
                shard_index,
                intra_index,
                counter,
            } => write!(f, "#{counter} (shard {shard_index}, item {intra_index})"),
            Self::Counter(counter) => write!(f, "#{counter}"),
        }
    }
}
