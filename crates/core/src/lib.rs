pub mod chunking;
pub mod codec;
pub mod discovery;
pub mod embeddings;
pub mod error;
#[cfg(feature = "fastembed")]
pub mod fastembed_model;
pub mod fetcher;
pub mod generators;
pub mod models;
pub mod orchestrator;
pub mod search;
pub mod store;
pub mod stores;
pub mod traits;

pub use chunking::{normalize_whitespace, split_fixed, DEFAULT_CHUNK_SIZE};
pub use codec::{decode_embedding, encode_embedding};
pub use discovery::{extract_competitor_urls, BrightDataSerp, UnconfiguredFinder};
pub use embeddings::{
    quality_score, CharacterNgramEmbedder, DisabledEmbedder, Embedder, EmbeddingBackend,
    EMBED_DIM,
};
pub use error::{
    DiscoveryError, EmbeddingError, FetchError, GenerationError, PipelineError, SearchError,
    StoreError,
};
#[cfg(feature = "fastembed")]
pub use fastembed_model::FastEmbedder;
pub use fetcher::{FetcherConfig, HttpFetcher};
pub use generators::{
    AnthropicGenerator, GeneratorChain, OpenAiCompatibleGenerator, StaticStrategyGenerator,
};
pub use models::{
    AnalysisSummary, ContentRecord, ContextSource, PipelineOptions, RecordStatus, ScanFilter,
    SearchHit, SearchMode, SearchOutcome, SimilarityReport, StrategyReport,
};
pub use orchestrator::ContentPipeline;
pub use search::SimilaritySearch;
pub use stores::{MemoryContentStore, SqliteContentStore};
pub use traits::{CompetitorFinder, ContentStore, PageFetcher, TextGenerator};
