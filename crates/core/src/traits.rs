use crate::error::{DiscoveryError, FetchError, GenerationError, StoreError};
use crate::models::{ContentRecord, ScanFilter};
use crate::store::RankedRow;
use async_trait::async_trait;

/// Durable url-keyed content table. The only shared mutable resource; every write goes
/// through `upsert`.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Insert or update the record for `url` atomically and mark it vectorized.
    async fn upsert(
        &self,
        url: &str,
        content: &str,
        quality_score: u32,
        embedding: &[f32],
    ) -> Result<(), StoreError>;

    /// Records in insertion order.
    async fn scan(&self, filter: ScanFilter) -> Result<Vec<ContentRecord>, StoreError>;

    /// Cheap native distance call between two zero vectors. An error means the backend
    /// cannot rank by vector distance.
    async fn probe_native_distance(&self) -> Result<(), StoreError>;

    /// Records with an embedding ordered by ascending L2 distance, then insertion order.
    async fn nearest(&self, query: &[f32], limit: usize) -> Result<Vec<RankedRow>, StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Visible text of the page. Never returns an empty string.
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}

#[async_trait]
pub trait CompetitorFinder: Send + Sync {
    async fn find_competitors(
        &self,
        keyword: &str,
        limit: usize,
    ) -> Result<Vec<String>, DiscoveryError>;
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn name(&self) -> &str;

    /// `texts` is never empty.
    async fn generate_strategy(&self, texts: &[String]) -> Result<String, GenerationError>;
}
