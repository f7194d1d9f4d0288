use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::catalog::{BookSummary, CatalogError, ShardEntry, ShardListing, ShardSource};

/// In-memory shards named `shard-{index}`; book ids are `{shard}:{position}`.
pub(crate) struct FakeShards {
    sizes: Vec<usize>,
    failing: HashSet<usize>,
    malformed: HashSet<(usize, usize)>,
    pub(crate) fetches: AtomicUsize,
}

impl FakeShards {
    pub(crate) fn new(sizes: &[usize]) -> Self {
        Self {
            sizes: sizes.to_vec(),
            failing: HashSet::new(),
            malformed: HashSet::new(),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Makes shard `index` fail with HTTP 503.
    pub(crate) fn failing(mut self, index: usize) -> Self {
        self.failing.insert(index);
        self
    }

    /// Replaces item `position` of shard `index` with a malformed entry.
    pub(crate) fn malformed(mut self, index: usize, position: usize) -> Self {
        self.malformed.insert((index, position));
        self
    }

    pub(crate) fn listing(&self) -> ShardListing {
        ShardListing::authoritative((0..self.sizes.len()).map(|i| format!("shard-{i}")).collect())
    }
}

#[async_trait]
impl ShardSource for FakeShards {
    async fn list_shards(&self) -> Result<ShardListing, CatalogError> {
        Ok(self.listing())
    }

    async fn fetch_shard(&self, endpoint: &str) -> Result<Vec<ShardEntry>, CatalogError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let index: usize = endpoint
            .trim_start_matches("shard-")
            .parse()
            .map_err(|_| CatalogError::format(endpoint, "unknown fake shard"))?;
        if self.failing.contains(&index) {
            return Err(CatalogError::http_status(endpoint, 503));
        }
        Ok((0..self.sizes[index])
            .map(|pos| {
                if self.malformed.contains(&(index, pos)) {
                    return ShardEntry::Malformed {
                        reason: "malformed catalog entry: missing field `id`".to_string(),
                    };
                }
                ShardEntry::Book(BookSummary {
                    id: format!("{index}:{pos}"),
                    title: format!("book {index}/{pos}"),
                    tags: Vec::new(),
                })
            })
            .collect())
    }
}
