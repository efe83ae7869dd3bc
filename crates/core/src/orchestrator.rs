use crate::embeddings::{ensure_dimensions, quality_score, Embedder};
use crate::error::{EmbeddingError, FetchError, PipelineError, SearchError};
use crate::models::{
    AnalysisSummary, ContextSource, PipelineOptions, RecordStatus, SearchHit, SimilarityReport,
    StrategyReport,
};
use crate::search::SimilaritySearch;
use crate::store::contains_keyword;
use crate::traits::{CompetitorFinder, ContentStore, PageFetcher, TextGenerator};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Composes fetch, embedding, storage, search and generation into the three workflows.
/// Cheap to clone; every collaborator is shared.
#[derive(Clone)]
pub struct ContentPipeline {
    store: Arc<dyn ContentStore>,
    embedder: Arc<dyn Embedder>,
    fetcher: Arc<dyn PageFetcher>,
    finder: Arc<dyn CompetitorFinder>,
    generator: Arc<dyn TextGenerator>,
    options: PipelineOptions,
}

impl ContentPipeline {
    pub fn new(
        store: Arc<dyn ContentStore>,
        embedder: Arc<dyn Embedder>,
        fetcher: Arc<dyn PageFetcher>,
        finder: Arc<dyn CompetitorFinder>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            store,
            embedder,
            fetcher,
            finder,
            generator,
            options: PipelineOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn store(&self) -> &Arc<dyn ContentStore> {
        &self.store
    }

    /// Fetch, score, embed and upsert one url. Nothing is written if the fetch fails.
    pub async fn analyze_and_store(&self, url: &str) -> Result<AnalysisSummary, PipelineError> {
        let content = self.fetch(url).await?;
        let score = quality_score(&content);
        let embedding = self.embed(content.clone()).await?;

        self.store.upsert(url, &content, score, &embedding).await?;
        info!(url = %url, quality_score = score, "content analyzed and stored");

        Ok(AnalysisSummary {
            url: url.to_string(),
            quality_score: score,
            status: RecordStatus::Vectorized,
        })
    }

    /// Stored documents closest to the page at `url`.
    pub async fn find_similar(&self, url: &str) -> Result<SimilarityReport, PipelineError> {
        let content = self.fetch(url).await?;
        let embedding = self.embed(content).await?;

        let outcome = SimilaritySearch::new(self.store.as_ref())
            .search(&embedding, self.options.similar_limit, None)
            .await?;
        info!(url = %url, mode = ?outcome.mode, hits = outcome.hits.len(), "similarity search done");

        Ok(SimilarityReport {
            search_target: url.to_string(),
            mode: outcome.mode,
            hits: outcome.hits,
        })
    }

    /// Competitor discovery, tolerant fetching, then a three-tier context cascade
    /// (stored neighbours, keyword matches, raw competitor texts) feeding generation.
    pub async fn full_strategy(&self, keyword: &str) -> Result<StrategyReport, PipelineError> {
        let candidates = match self
            .finder
            .find_competitors(keyword, self.options.competitor_limit)
            .await
        {
            Ok(urls) => urls,
            Err(error) => {
                warn!(keyword = %keyword, error = %error, "competitor discovery failed");
                Vec::new()
            }
        };
        if candidates.is_empty() {
            return Err(PipelineError::NoCandidatesFound(keyword.to_string()));
        }

        let mut fetched: Vec<(String, String)> = Vec::new();
        for url in candidates.iter().take(self.options.competitor_limit) {
            match self.fetch(url).await {
                Ok(text) => fetched.push((url.clone(), text)),
                Err(error) => warn!(url = %url, error = %error, "skipping competitor"),
            }
        }
        let Some((_, first_text)) = fetched.first() else {
            return Err(PipelineError::NoContentAvailable);
        };

        let embedding = self.embed(first_text.clone()).await?;
        let neighbours = match SimilaritySearch::new(self.store.as_ref())
            .search_native(&embedding, self.options.strategy_context_limit)
            .await
        {
            Ok(hits) => hits,
            Err(SearchError::CapabilityUnavailable(reason)) => {
                debug!(reason = %reason, "native search unavailable for strategy context");
                Vec::new()
            }
            Err(error) => {
                warn!(error = %error, "native search failed for strategy context");
                Vec::new()
            }
        };

        let (context_source, texts) =
            select_context(keyword, &neighbours, &fetched, &self.options);
        if texts.is_empty() {
            return Err(PipelineError::NoContentAvailable);
        }
        info!(keyword = %keyword, source = ?context_source, texts = texts.len(), "strategy context selected");

        let strategy = match self.generator.generate_strategy(&texts).await {
            Ok(strategy) => strategy,
            Err(error) => {
                warn!(error = %error, "strategy generation failed");
                format!("Strategy generation failed: {error}")
            }
        };

        Ok(StrategyReport {
            keyword: keyword.to_string(),
            strategy,
            context_source,
            competitor_urls: fetched.into_iter().map(|(url, _)| url).collect(),
            suggested_article: neighbours.into_iter().next(),
        })
    }

    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let text = self.fetcher.fetch_text(url).await?;
        if text.trim().is_empty() {
            return Err(FetchError::EmptyBody {
                url: url.to_string(),
            });
        }
        Ok(text)
    }

    /// Embedding is CPU-bound, so it runs on the blocking pool.
    async fn embed(&self, text: String) -> Result<Vec<f32>, EmbeddingError> {
        let embedder = Arc::clone(&self.embedder);
        let chunk_size = self.options.chunk_size;
        let vector = tokio::task::spawn_blocking(move || embedder.embed_long(&text, chunk_size))
            .await
            .map_err(|error| EmbeddingError::Backend(format!("embedding task failed: {error}")))??;
        ensure_dimensions(&vector, self.embedder.dimensions())?;
        Ok(vector)
    }
}

/// First non-empty tier wins.
fn select_context(
    keyword: &str,
    neighbours: &[SearchHit],
    fetched: &[(String, String)],
    options: &PipelineOptions,
) -> (ContextSource, Vec<String>) {
    let stored = neighbours
        .iter()
        .filter_map(|hit| hit.content.clone())
        .filter(|content| !content.trim().is_empty())
        .collect::<Vec<_>>();
    if !stored.is_empty() {
        return (ContextSource::StoredNeighbors, stored);
    }

    if !keyword.trim().is_empty() {
        let matches = fetched
            .iter()
            .filter(|(_, text)| contains_keyword(text, keyword))
            .take(options.keyword_match_limit)
            .map(|(_, text)| text.clone())
            .collect::<Vec<_>>();
        if !matches.is_empty() {
            return (ContextSource::KeywordMatches, matches);
        }
    }

    let raw = fetched
        .iter()
        .take(options.raw_fallback_limit)
        .map(|(_, text)| text.clone())
        .collect();
    (ContextSource::CompetitorTexts, raw)
}
