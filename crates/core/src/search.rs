//! Nearest-neighbour retrieval over the content store.
//!
//! Every search starts with a capability probe. When the backend can compute vector
//! distances the results are ranked natively; otherwise stored content is filtered by a
//! case-insensitive keyword. Searching never writes to the store.

use crate::embeddings::is_zero_vector;
use crate::error::SearchError;
use crate::models::{ScanFilter, SearchHit, SearchMode, SearchOutcome};
use crate::store::contains_keyword;
use crate::traits::ContentStore;
use tracing::{debug, warn};

pub struct SimilaritySearch<'a, S: ContentStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: ContentStore + ?Sized> SimilaritySearch<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Probe first, then rank natively or fall back to keyword filtering. A query error
    /// after a successful probe is returned, not masked as a missing capability.
    pub async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
        keyword: Option<&str>,
    ) -> Result<SearchOutcome, SearchError> {
        match self.search_native(query_embedding, limit).await {
            Ok(hits) => Ok(SearchOutcome {
                mode: SearchMode::Native,
                hits,
            }),
            Err(SearchError::CapabilityUnavailable(reason)) => {
                debug!(reason = %reason, "falling back to keyword search");
                let hits = self.search_keyword(keyword.unwrap_or_default(), limit).await?;
                Ok(SearchOutcome {
                    mode: SearchMode::Keyword,
                    hits,
                })
            }
            Err(error) => Err(error),
        }
    }

    /// Native distance ranking only. Fails with `CapabilityUnavailable` when the probe
    /// fails or the query vector carries no signal.
    pub async fn search_native(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchHit>, SearchError> {
        if is_zero_vector(query_embedding) {
            return Err(SearchError::CapabilityUnavailable(
                "query embedding is the zero sentinel".to_string(),
            ));
        }

        if let Err(error) = self.store.probe_native_distance().await {
            warn!(error = %error, "native vector distance probe failed");
            return Err(SearchError::CapabilityUnavailable(error.to_string()));
        }

        let rows = self.store.nearest(query_embedding, limit).await?;
        Ok(rows.into_iter().map(|row| row.into_hit()).collect())
    }

    /// First `limit` records in storage order whose content contains `keyword`. An
    /// empty keyword returns the first `limit` records unfiltered.
    pub async fn search_keyword(
        &self,
        keyword: &str,
        limit: usize,
    ) -> Result<Vec<SearchHit>, SearchError> {
        let unfiltered = keyword.trim().is_empty();
        let records = self.store.scan(ScanFilter::all()).await?;
        Ok(records
            .into_iter()
            .filter(|record| {
                unfiltered
                    || record
                        .content
                        .as_deref()
                        .is_some_and(|content| contains_keyword(content, keyword))
            })
            .take(limit)
            .map(SearchHit::from)
            .collect())
    }
}
