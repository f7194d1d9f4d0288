//! Library-level retrieval settings.
//!
//! [`RetrievalConfig`] gathers every tunable of a run with the defaults the
//! remote service is known to work with. The binary layers its config file and
//! CLI flags on top; the library never reads the environment itself.

use std::time::Duration;

use crate::catalog::DEFAULT_CATALOG_VERSION_URL;
use crate::download::ArtifactPolicy;
use crate::http_client::HttpTimeouts;
use crate::orchestrator::{DEFAULT_CATALOG_ATTEMPTS, OrchestratorOptions, RetryPolicy};
use crate::resolver::DEFAULT_DETAIL_BASE_URL;

/// Default pause between book attempts in batch modes.
pub const DEFAULT_PAUSE: Duration = Duration::from_secs(1);

/// Everything a [`crate::orchestrator::RetrievalOrchestrator`] needs to know.
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Catalog-version document URL.
    pub catalog_version_url: String,
    /// Base URL of per-book detail documents.
    pub detail_base_url: String,
    /// Timeouts for every HTTP request.
    pub timeouts: HttpTimeouts,
    /// Artifact acceptance rules.
    pub artifact_policy: ArtifactPolicy,
    /// Pause between book attempts.
    pub pause: Duration,
    /// Attempts for the shard-list fetch, including the first.
    pub catalog_attempts: u32,
    /// Use `fallback_shards` when the live shard list is unreachable.
    pub allow_fallback_catalog: bool,
    /// Last-known shard endpoints for degraded mode.
    pub fallback_shards: Vec<String>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            catalog_version_url: DEFAULT_CATALOG_VERSION_URL.to_string(),
            detail_base_url: DEFAULT_DETAIL_BASE_URL.to_string(),
            timeouts: HttpTimeouts::default(),
            artifact_policy: ArtifactPolicy::default(),
            pause: DEFAULT_PAUSE,
            catalog_attempts: DEFAULT_CATALOG_ATTEMPTS,
            allow_fallback_catalog: false,
            fallback_shards: Vec::new(),
        }
    }
}

impl RetrievalConfig {
    /// Orchestrator options derived from this config.
    #[must_use]
    pub fn orchestrator_options(&self) -> OrchestratorOptions {
        OrchestratorOptions {
            pause: self.pause,
            catalog_retry: RetryPolicy::with_max_attempts(self.catalog_attempts),
            fallback_shards: self
                .allow_fallback_catalog
                .then(|| self.fallback_shards.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_remote_service_expectations() {
        let config = RetrievalConfig::default();
        assert_eq!(config.timeouts.request, Duration::from_secs(30));
        assert_eq!(config.artifact_policy.min_bytes, 1_000_000);
        assert_eq!(config.artifact_policy.content_type_marker, "pdf");
        assert_eq!(config.pause, Duration::from_secs(1));
        assert_eq!(config.catalog_attempts, 3);
        assert!(!config.allow_fallback_catalog);
    }

    #[test]
    fn test_fallback_list_is_ignored_unless_enabled() {
        let mut config = RetrievalConfig {
            fallback_shards: vec!["https://mirror/part_1.json".into()],
            ..RetrievalConfig::default()
        };
        assert!(config.orchestrator_options().fallback_shards.is_none());

        config.allow_fallback_catalog = true;
        assert_eq!(
            config.orchestrator_options().fallback_shards,
            Some(vec!["https://mirror/part_1.json".to_string()])
        );
    }
}
