//! Book metadata resolution: book identifier to ranked artifact candidates.
//!
//! The detail document for a book lists file items. Exactly one of them is
//! flagged as the source document; its storage URLs are the replicated
//! locations of the PDF, in rank order.
//!
//! # Architecture
//!
//! - [`MetadataResolver`] - Fetches and interprets the detail document
//! - [`ArtifactCandidateSet`] - Ranked public-access URLs for one book
//! - [`to_public_access_url`] - Private-to-public storage URL rewrite

mod access;
mod error;

pub use access::{PRIVATE_ACCESS_TOKEN, PUBLIC_ACCESS_TOKEN, to_public_access_url};
pub use error::ResolveError;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::http_client::{ClientBuildError, HttpTimeouts, build_http_client};

/// Default base URL for per-book detail documents.
pub const DEFAULT_DETAIL_BASE_URL: &str =
    "https://s-file-1.ykt.cbern.com.cn/zxx/ndrv2/resources/tch_material/details";

/// File-role flag of the downloadable item.
pub const SOURCE_FILE_FLAG: &str = "source";

/// One ranked download location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactCandidate {
    /// 1-based rank; rank 1 is tried first.
    pub rank: usize,
    /// Public-access URL.
    pub url: String,
}

/// Ordered download locations for one book.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactCandidateSet {
    candidates: Vec<ArtifactCandidate>,
}

impl ArtifactCandidateSet {
    /// Builds a set from URLs already in rank order.
    #[must_use]
    pub fn from_urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let candidates = urls
            .into_iter()
            .enumerate()
            .map(|(index, url)| ArtifactCandidate {
                rank: index + 1,
                url: url.into(),
            })
            .collect();
        Self { candidates }
    }

    /// Candidates in rank order.
    pub fn iter(&self) -> impl Iterator<Item = &ArtifactCandidate> {
        self.candidates.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// What the detail document says about one book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookMetadata {
    /// The identifier that was resolved.
    pub book_id: String,
    /// Title from the detail document, when present.
    pub title: Option<String>,
    /// Ranked public-access download locations.
    pub candidates: ArtifactCandidateSet,
}

#[derive(Debug, Deserialize)]
struct DetailDocument {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    ti_items: Vec<DetailItem>,
}

#[derive(Debug, Deserialize)]
struct DetailItem {
    #[serde(default)]
    ti_file_flag: Option<String>,
    #[serde(default)]
    ti_storages: Option<Vec<String>>,
    #[serde(default)]
    ti_storage: Option<String>,
}

impl DetailItem {
    fn is_source(&self) -> bool {
        self.ti_file_flag.as_deref() == Some(SOURCE_FILE_FLAG)
    }

    /// Storage URLs in listed order; the list form wins over the single form.
    fn storage_urls(&self) -> Vec<&str> {
        let listed: Vec<&str> = self
            .ti_storages
            .iter()
            .flatten()
            .map(|url| url.trim())
            .filter(|url| !url.is_empty())
            .collect();
        if !listed.is_empty() {
            return listed;
        }
        self.ti_storage
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .into_iter()
            .collect()
    }
}

/// Derives candidates from a parsed detail document.
fn candidates_from_detail(
    book_id: &str,
    document: &DetailDocument,
) -> Result<ArtifactCandidateSet, ResolveError> {
    let source = document
        .ti_items
        .iter()
        .find(|item| item.is_source())
        .ok_or_else(|| ResolveError::no_source_item(book_id))?;

    let urls = source.storage_urls();
    if urls.is_empty() {
        return Err(ResolveError::no_storage_urls(book_id));
    }
    Ok(ArtifactCandidateSet::from_urls(
        urls.into_iter().map(to_public_access_url),
    ))
}

/// Fetches book detail documents and derives artifact candidates.
#[derive(Debug, Clone)]
pub struct MetadataResolver {
    client: Client,
    base_url: String,
}

impl MetadataResolver {
    /// Creates a resolver for the default detail endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ClientBuildError`] if HTTP client construction fails.
    pub fn new(timeouts: HttpTimeouts) -> Result<Self, ClientBuildError> {
        Self::with_base_url(DEFAULT_DETAIL_BASE_URL, timeouts)
    }

    /// Creates a resolver for a custom detail base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ClientBuildError`] if HTTP client construction fails.
    pub fn with_base_url(
        base_url: impl Into<String>,
        timeouts: HttpTimeouts,
    ) -> Result<Self, ClientBuildError> {
        Ok(Self {
            client: build_http_client("metadata", timeouts)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// URL of the detail document for `book_id`.
    #[must_use]
    pub fn detail_url(&self, book_id: &str) -> String {
        format!("{}/{}.json", self.base_url, urlencoding::encode(book_id))
    }

    /// Fetches the detail document and returns the book's ranked candidates.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::NoSourceItem`] / [`ResolveError::NoStorageUrls`]
    /// when the book has nothing downloadable, and transport, status or format
    /// errors when the detail document itself cannot be read.
    #[instrument(skip(self))]
    pub async fn resolve(&self, book_id: &str) -> Result<BookMetadata, ResolveError> {
        let url = self.detail_url(book_id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ResolveError::from_reqwest(book_id, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::http_status(book_id, status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ResolveError::from_reqwest(book_id, e))?;
        let document: DetailDocument = serde_json::from_slice(&body)
            .map_err(|e| ResolveError::format(book_id, e.to_string()))?;

        let candidates = candidates_from_detail(book_id, &document)?;
        debug!(candidates = candidates.len(), "book metadata resolved");
        Ok(BookMetadata {
            book_id: book_id.to_string(),
            title: document.title.filter(|title| !title.trim().is_empty()),
            candidates,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> DetailDocument {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn test_candidates_follow_storage_order_and_are_rewritten() {
        let doc = parse(
            r#"{"title": "数学", "ti_items": [
                {"ti_file_flag": "thumbnail", "ti_storages": ["https://r1-ndr-private.x/t.jpg"]},
                {"ti_file_flag": "source", "ti_storages": [
                    "https://r1-ndr-private.x/a.pdf",
                    "https://r2-ndr-private.x/a.pdf",
                    "https://r3-ndr-private.x/a.pdf"
                ]}
            ]}"#,
        );
        let set = candidates_from_detail("b1", &doc).unwrap();
        let urls: Vec<_> = set.iter().map(|c| (c.rank, c.url.as_str())).collect();
        assert_eq!(
            urls,
            vec![
                (1, "https://r1-ndr-oversea.x/a.pdf"),
                (2, "https://r2-ndr-oversea.x/a.pdf"),
                (3, "https://r3-ndr-oversea.x/a.pdf"),
            ]
        );
    }

    #[test]
    fn test_single_storage_field_is_accepted() {
        let doc = parse(
            r#"{"ti_items": [{"ti_file_flag": "source", "ti_storage": "https://r1-ndr-private.x/a.pdf"}]}"#,
        );
        let set = candidates_from_detail("b1", &doc).unwrap();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_missing_source_item_does_not_fall_back_to_other_items() {
        let doc = parse(
            r#"{"ti_items": [{"ti_file_flag": "href", "ti_storages": ["https://r1-ndr-private.x/a.pdf"]}]}"#,
        );
        let err = candidates_from_detail("b1", &doc).unwrap_err();
        assert!(matches!(err, ResolveError::NoSourceItem { .. }));
    }

    #[test]
    fn test_source_flag_match_is_case_sensitive() {
        let doc = parse(r#"{"ti_items": [{"ti_file_flag": "Source", "ti_storage": "u"}]}"#);
        assert!(candidates_from_detail("b1", &doc).is_err());
    }

    #[test]
    fn test_source_item_without_urls_is_distinguished() {
        let doc = parse(r#"{"ti_items": [{"ti_file_flag": "source", "ti_storages": []}]}"#);
        let err = candidates_from_detail("b1", &doc).unwrap_err();
        assert!(matches!(err, ResolveError::NoStorageUrls { .. }));
    }

    #[test]
    fn test_detail_url_encodes_identifier() {
        let resolver =
            MetadataResolver::with_base_url("http://host/details/", HttpTimeouts::default())
                .unwrap();
        assert_eq!(resolver.detail_url("a b"), "http://host/details/a%20b.json");
    }
}
