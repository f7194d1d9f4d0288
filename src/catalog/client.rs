//! HTTP catalog client backed by the remote catalog-version document.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::http_client::{ClientBuildError, HttpTimeouts, build_http_client};

use super::{CatalogError, ShardEntry, ShardSource};

/// Default catalog-version document URL.
pub const DEFAULT_CATALOG_VERSION_URL: &str =
    "https://s-file-1.ykt.cbern.com.cn/zxx/ndrs/resources/tch_material/version/data_version.json";

/// Where a shard listing came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShardListingSource {
    /// Parsed from the live catalog-version document.
    Authoritative,
    /// Taken from a configured last-known list because the live document was
    /// unreachable (degraded mode).
    Fallback,
}

/// Ordered shard endpoints plus their provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardListing {
    /// Shard endpoint URIs in catalog order.
    pub endpoints: Vec<String>,
    /// Whether the list is authoritative or a degraded fallback.
    pub source: ShardListingSource,
}

impl ShardListing {
    /// Creates a listing parsed from the live catalog.
    #[must_use]
    pub fn authoritative(endpoints: Vec<String>) -> Self {
        Self {
            endpoints,
            source: ShardListingSource::Authoritative,
        }
    }

    /// Creates a degraded-mode listing from a last-known list.
    #[must_use]
    pub fn fallback(endpoints: Vec<String>) -> Self {
        Self {
            endpoints,
            source: ShardListingSource::Fallback,
        }
    }

    /// Returns true when this listing is a degraded fallback.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.source == ShardListingSource::Fallback
    }
}

/// The catalog-version document. Only `urls` is consumed.
#[derive(Debug, Deserialize)]
struct VersionDocument {
    urls: String,
}

/// Splits the comma-joined shard list, dropping blanks.
pub(crate) fn split_shard_urls(joined: &str) -> Vec<String> {
    joined
        .split(',')
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .collect()
}

/// Fetches the shard list and shard contents over HTTP.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    version_url: String,
}

impl CatalogClient {
    /// Creates a client for the default catalog-version URL.
    ///
    /// # Errors
    ///
    /// Returns [`ClientBuildError`] if HTTP client construction fails.
    pub fn new(timeouts: HttpTimeouts) -> Result<Self, ClientBuildError> {
        Self::with_version_url(DEFAULT_CATALOG_VERSION_URL, timeouts)
    }

    /// Creates a client for a custom catalog-version URL (mirrors, wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ClientBuildError`] if HTTP client construction fails.
    pub fn with_version_url(
        version_url: impl Into<String>,
        timeouts: HttpTimeouts,
    ) -> Result<Self, ClientBuildError> {
        Ok(Self {
            client: build_http_client("catalog", timeouts)?,
            version_url: version_url.into(),
        })
    }

    /// Returns the catalog-version URL this client reads.
    #[must_use]
    pub fn version_url(&self) -> &str {
        &self.version_url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, CatalogError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CatalogError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::http_status(url, status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| CatalogError::from_reqwest(url, e))?;
        serde_json::from_slice(&body).map_err(|e| CatalogError::format(url, e.to_string()))
    }
}

#[async_trait]
impl ShardSource for CatalogClient {
    #[instrument(skip(self), fields(version_url = %self.version_url))]
    async fn list_shards(&self) -> Result<ShardListing, CatalogError> {
        let document: VersionDocument = self.get_json(&self.version_url).await?;
        let endpoints = split_shard_urls(&document.urls);
        if endpoints.is_empty() {
            return Err(CatalogError::format(
                &self.version_url,
                "catalog-version document lists no shards",
            ));
        }
        debug!(shards = endpoints.len(), "catalog shard list fetched");
        Ok(ShardListing::authoritative(endpoints))
    }

    #[instrument(skip(self))]
    async fn fetch_shard(&self, endpoint: &str) -> Result<Vec<ShardEntry>, CatalogError> {
        let elements: Vec<serde_json::Value> = self.get_json(endpoint).await?;
        let entries: Vec<ShardEntry> = elements.into_iter().map(ShardEntry::from_value).collect();
        let malformed = entries.iter().filter(|entry| entry.book().is_none()).count();
        if malformed > 0 {
            warn!(malformed, "catalog shard contains malformed entries");
        }
        debug!(books = entries.len(), "catalog shard fetched");
        Ok(entries)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_split_shard_urls_trims_and_drops_blanks() {
        let urls = split_shard_urls(" https://a/part_1.json,https://a/part_2.json,, ");
        assert_eq!(urls, vec!["https://a/part_1.json", "https://a/part_2.json"]);
    }

    #[test]
    fn test_version_document_parses_comma_joined_urls() {
        let doc: VersionDocument =
            serde_json::from_str(r#"{"urls": "https://a/1.json,https://a/2.json", "version": 7}"#)
                .unwrap();
        assert_eq!(split_shard_urls(&doc.urls).len(), 2);
    }

    #[test]
    fn test_shard_listing_provenance() {
        assert!(!ShardListing::authoritative(vec![]).is_degraded());
        assert!(ShardListing::fallback(vec![]).is_degraded());
    }
}
