use crate::embeddings::EMBED_DIM;
use crate::error::StoreError;
use crate::models::{ContentRecord, RecordStatus, ScanFilter};
use crate::store::{l2_distance, RankedRow};
use crate::traits::ContentStore;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Table {
    records: Vec<ContentRecord>,
    next_id: i64,
}

/// Process-local store. The write lock makes each upsert atomic; `native_distance`
/// decides whether the capability probe succeeds.
pub struct MemoryContentStore {
    table: RwLock<Table>,
    native_distance: bool,
    dimensions: usize,
}

impl MemoryContentStore {
    pub fn new(native_distance: bool) -> Self {
        Self {
            table: RwLock::new(Table::default()),
            native_distance,
            dimensions: EMBED_DIM,
        }
    }

    pub fn with_native_distance() -> Self {
        Self::new(true)
    }

    pub fn without_native_distance() -> Self {
        Self::new(false)
    }

    fn check_dimensions(&self, vector: &[f32]) -> Result<(), StoreError> {
        if vector.len() != self.dimensions {
            return Err(StoreError::Dimension {
                expected: self.dimensions,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

impl Default for MemoryContentStore {
    fn default() -> Self {
        Self::with_native_distance()
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn upsert(
        &self,
        url: &str,
        content: &str,
        quality_score: u32,
        embedding: &[f32],
    ) -> Result<(), StoreError> {
        self.check_dimensions(embedding)?;

        let mut table = self.table.write().await;
        let now = Utc::now();

        if let Some(existing) = table.records.iter_mut().find(|record| record.url == url) {
            existing.content = Some(content.to_string());
            existing.quality_score = quality_score;
            existing.embedding = Some(embedding.to_vec());
            existing.status = RecordStatus::Vectorized;
            existing.scraped_at = now;
            return Ok(());
        }

        table.next_id += 1;
        let id = table.next_id;
        table.records.push(ContentRecord {
            id,
            url: url.to_string(),
            content: Some(content.to_string()),
            quality_score,
            embedding: Some(embedding.to_vec()),
            status: RecordStatus::Vectorized,
            scraped_at: now,
        });

        Ok(())
    }

    async fn scan(&self, filter: ScanFilter) -> Result<Vec<ContentRecord>, StoreError> {
        let table = self.table.read().await;
        Ok(table
            .records
            .iter()
            .filter(|record| !filter.embedding_present || record.embedding.is_some())
            .cloned()
            .collect())
    }

    async fn probe_native_distance(&self) -> Result<(), StoreError> {
        if !self.native_distance {
            return Err(StoreError::Unsupported(
                "memory store configured without vector distance".to_string(),
            ));
        }
        Ok(())
    }

    async fn nearest(&self, query: &[f32], limit: usize) -> Result<Vec<RankedRow>, StoreError> {
        if !self.native_distance {
            return Err(StoreError::Unsupported(
                "memory store configured without vector distance".to_string(),
            ));
        }
        self.check_dimensions(query)?;

        let table = self.table.read().await;
        let mut ranked = table
            .records
            .iter()
            .filter_map(|record| {
                record.embedding.as_ref().map(|embedding| RankedRow {
                    url: record.url.clone(),
                    content: record.content.clone(),
                    quality_score: record.quality_score,
                    distance: l2_distance(query, embedding),
                })
            })
            .collect::<Vec<_>>();

        // Stable sort keeps insertion order for equal distances.
        ranked.sort_by(|left, right| left.distance.total_cmp(&right.distance));
        ranked.truncate(limit);
        Ok(ranked)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.table.read().await.records.len() as u64)
    }
}
