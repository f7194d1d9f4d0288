//! Remote catalog access: shard listing, shard contents and sequence lookup.
//!
//! The catalog is split into shards. A catalog-version document names the
//! shard endpoints (comma-joined); each shard is an ordered JSON array of
//! book summaries. A book's *global sequence number* is its 1-based rank across
//! all shards concatenated in order.
//!
//! # Architecture
//!
//! - [`ShardSource`] - Async trait over "list shards" / "fetch one shard"
//! - [`CatalogClient`] - HTTP implementation backed by the version document
//! - [`ShardSet`] - Per-run lazy cache of fetched shards
//! - [`SequenceResolver`] - Maps a global sequence number to a book

mod client;
mod error;
mod sequence;

pub use client::{CatalogClient, DEFAULT_CATALOG_VERSION_URL, ShardListing, ShardListingSource};
pub use error::CatalogError;
pub use sequence::{SequenceError, SequenceHit, SequenceResolver, ShardSet, ShardState};

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};

/// Glyph that marks a tag as naming the publisher edition (e.g. "人教版").
pub const PUBLISHER_MARKER: char = '版';

/// One tag attached to a book summary.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Tag {
    /// Display name of the tag.
    #[serde(rename = "tag_name", default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// A book as listed inside a catalog shard.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BookSummary {
    /// Opaque identifier used to fetch the book's detail document.
    pub id: String,
    /// Book title.
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    /// Tags in catalog order.
    #[serde(rename = "tag_list", default, deserialize_with = "null_as_default")]
    pub tags: Vec<Tag>,
}

/// Treats an explicit JSON `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl BookSummary {
    /// Returns the first tag whose name carries the publisher marker.
    #[must_use]
    pub fn publisher(&self) -> Option<&str> {
        self.tags
            .iter()
            .map(|tag| tag.name.as_str())
            .find(|name| name.contains(PUBLISHER_MARKER))
    }

    /// Publisher tag (or nothing) followed by the title.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{}{}", self.publisher().unwrap_or_default(), self.title)
    }
}

/// One element of a shard array.
///
/// Every element occupies a sequence number, so an element that does not
/// describe a usable book stays in place as [`ShardEntry::Malformed`] instead
/// of failing the whole shard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShardEntry {
    /// A well-formed book summary.
    Book(BookSummary),
    /// An element that could not be read as a book summary.
    Malformed {
        /// Why the element was rejected.
        reason: String,
    },
}

impl ShardEntry {
    /// Reads one shard element, keeping malformed ones as placeholders.
    #[must_use]
    pub fn from_value(value: serde_json::Value) -> Self {
        match serde_json::from_value::<BookSummary>(value) {
            Ok(book) if book.id.trim().is_empty() => Self::Malformed {
                reason: "catalog entry has an empty id".to_string(),
            },
            Ok(book) => Self::Book(book),
            Err(error) => Self::Malformed {
                reason: format!("malformed catalog entry: {error}"),
            },
        }
    }

    /// The book summary, when the element is well-formed.
    #[must_use]
    pub fn book(&self) -> Option<&BookSummary> {
        match self {
            Self::Book(book) => Some(book),
            Self::Malformed { .. } => None,
        }
    }
}

impl From<BookSummary> for ShardEntry {
    fn from(book: BookSummary) -> Self {
        Self::Book(book)
    }
}

/// Source of catalog shards.
///
/// Implementations perform exactly one request per call and never retry;
/// retry policy belongs to the caller.
#[async_trait]
pub trait ShardSource: Send + Sync {
    /// Returns the ordered shard endpoints for the current catalog.
    async fn list_shards(&self) -> Result<ShardListing, CatalogError>;

    /// Returns the ordered entries stored in one shard.
    async fn fetch_shard(&self, endpoint: &str) -> Result<Vec<ShardEntry>, CatalogError>;
}
