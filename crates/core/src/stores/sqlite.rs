use crate::codec::{decode_embedding, encode_embedding};
use crate::embeddings::{zero_vector, EMBED_DIM};
use crate::error::StoreError;
use crate::models::{ContentRecord, RecordStatus, ScanFilter};
use crate::store::RankedRow;
use crate::traits::ContentStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS scraped_pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    content TEXT,
    scraped_at TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'scraped',
    qae_score INTEGER NOT NULL DEFAULT 0,
    content_embedding BLOB
)";

const CREATE_STATUS_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_scraped_pages_status ON scraped_pages (status)";

const UPSERT: &str = "INSERT INTO scraped_pages (url, content, scraped_at, status, qae_score, content_embedding)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    ON CONFLICT (url) DO UPDATE SET
        content = excluded.content,
        scraped_at = excluded.scraped_at,
        status = excluded.status,
        qae_score = excluded.qae_score,
        content_embedding = excluded.content_embedding";

const SELECT_COLUMNS: &str =
    "SELECT id, url, content, scraped_at, status, qae_score, content_embedding FROM scraped_pages";

/// `scraped_pages` in SQLite. Native distance comes from sqlite-vec's `vec_distance_l2`,
/// which is only present when the extension was loaded into every pooled connection.
pub struct SqliteContentStore {
    pool: SqlitePool,
    dimensions: usize,
}

impl SqliteContentStore {
    pub async fn connect(
        database_url: &str,
        vector_extension: Option<&str>,
    ) -> Result<Self, StoreError> {
        let mut options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(10));

        if let Some(extension) = vector_extension {
            info!(extension = %extension, "loading sqlite vector extension");
            options = options.extension(extension.to_string());
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            dimensions: EMBED_DIM,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        sqlx::query(CREATE_STATUS_INDEX).execute(&self.pool).await?;
        Ok(())
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

    fn record_from_row(&self, row: &SqliteRow) -> Result<ContentRecord, StoreError> {
        let status: String = row.try_get("status")?;
        let blob: Option<Vec<u8>> = row.try_get("content_embedding")?;
        let embedding = blob
            .map(|bytes| decode_embedding(&bytes, self.dimensions))
            .transpose()?;
        let scraped_at: DateTime<Utc> = row.try_get("scraped_at")?;

        Ok(ContentRecord {
            id: row.try_get("id")?,
            url: row.try_get("url")?,
            content: row.try_get("content")?,
            quality_score: score_from_column(row.try_get("qae_score")?),
            embedding,
            status: status.parse()?,
            scraped_at,
        })
    }
}

fn score_from_column(value: i64) -> u32 {
    value.clamp(0, i64::from(u32::MAX)) as u32
}

#[async_trait]
impl ContentStore for SqliteContentStore {
    async fn upsert(
        &self,
        url: &str,
        content: &str,
        quality_score: u32,
        embedding: &[f32],
    ) -> Result<(), StoreError> {
        self.check_dimensions(embedding)?;

        let mut tx = self.pool.begin().await?;
        sqlx::query(UPSERT)
            .bind(url)
            .bind(content)
            .bind(Utc::now())
            .bind(RecordStatus::Vectorized.as_str())
            .bind(i64::from(quality_score))
            .bind(encode_embedding(embedding))
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        debug!(url = %url, quality_score, "upserted content record");
        Ok(())
    }

    async fn scan(&self, filter: ScanFilter) -> Result<Vec<ContentRecord>, StoreError> {
        let sql = if filter.embedding_present {
            format!("{SELECT_COLUMNS} WHERE content_embedding IS NOT NULL ORDER BY id ASC")
        } else {
            format!("{SELECT_COLUMNS} ORDER BY id ASC")
        };

        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(|row| self.record_from_row(row)).collect()
    }

    async fn probe_native_distance(&self) -> Result<(), StoreError> {
        let zero = encode_embedding(&zero_vector(self.dimensions));
        sqlx::query_scalar::<_, f64>("SELECT vec_distance_l2(?1, ?2)")
            .bind(zero.clone())
            .bind(zero)
            .fetch_one(&self.pool)
            .await
            .map_err(|error| StoreError::Unsupported(error.to_string()))?;
        Ok(())
    }

    async fn nearest(&self, query: &[f32], limit: usize) -> Result<Vec<RankedRow>, StoreError> {
        self.check_dimensions(query)?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows = sqlx::query(
            "SELECT url, content, qae_score, vec_distance_l2(content_embedding, ?1) AS distance
             FROM scraped_pages
             WHERE content_embedding IS NOT NULL
             ORDER BY distance ASC, id ASC
             LIMIT ?2",
        )
        .bind(encode_embedding(query))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let distance: f64 = row.try_get("distance")?;
                Ok(RankedRow {
                    url: row.try_get("url")?,
                    content: row.try_get("content")?,
                    quality_score: score_from_column(row.try_get("qae_score")?),
                    distance: distance as f32,
                })
            })
            .collect()
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM scraped_pages")
            .fetch_one(&self.pool)
            .await?;
        Ok(total.max(0) as u64)
    }
}
