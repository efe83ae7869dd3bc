use crate::chunking::DEFAULT_CHUNK_SIZE;
use crate::error::StoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Scraped,
    Vectorized,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scraped => "scraped",
            Self::Vectorized => "vectorized",
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordStatus {
    type Err = StoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "scraped" => Ok(Self::Scraped),
            "vectorized" => Ok(Self::Vectorized),
            other => Err(StoreError::UnknownStatus(other.to_string())),
        }
    }
}

/// One row per distinct url.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: i64,
    pub url: String,
    pub content: Option<String>,
    pub quality_score: u32,
    pub embedding: Option<Vec<f32>>,
    pub status: RecordStatus,
    pub scraped_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanFilter {
    pub embedding_present: bool,
}

impl ScanFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_embedding() -> Self {
        Self {
            embedding_present: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    Native,
    Keyword,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub url: String,
    pub content: Option<String>,
    pub quality_score: u32,
    /// L2 distance in native mode, `None` for keyword matches.
    pub distance: Option<f32>,
    pub mode: SearchMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub mode: SearchMode,
    pub hits: Vec<SearchHit>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalysisSummary {
    pub url: String,
    pub quality_score: u32,
    pub status: RecordStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityReport {
    pub search_target: String,
    pub mode: SearchMode,
    pub hits: Vec<SearchHit>,
}

/// Which tier of the strategy cascade supplied the generation context.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContextSource {
    StoredNeighbors,
    KeywordMatches,
    CompetitorTexts,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyReport {
    pub keyword: String,
    pub strategy: String,
    pub context_source: ContextSource,
    pub competitor_urls: Vec<String>,
    pub suggested_article: Option<SearchHit>,
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub chunk_size: usize,
    pub similar_limit: usize,
    pub competitor_limit: usize,
    pub strategy_context_limit: usize,
    pub keyword_match_limit: usize,
    pub raw_fallback_limit: usize,
    pub fetch_timeout: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            similar_limit: 5,
            competitor_limit: 3,
            strategy_context_limit: 5,
            keyword_match_limit: 3,
            raw_fallback_limit: 3,
            fetch_timeout: Duration::from_secs(15),
        }
    }
}
