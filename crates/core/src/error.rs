use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("{url} returned no readable text")]
    EmptyBody { url: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding backend failed: {0}")]
    Backend(String),

    #[error("embedding has {actual} components, expected {expected}")]
    Dimension { expected: usize, actual: usize },

    #[error("invalid chunk size: {0}")]
    InvalidChunkSize(usize),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("embedding has {actual} components, expected {expected}")]
    Dimension { expected: usize, actual: usize },

    #[error("stored embedding is corrupt: {0}")]
    CorruptEmbedding(String),

    #[error("unknown record status: {0}")]
    UnknownStatus(String),

    #[error("native vector distance is not supported: {0}")]
    Unsupported(String),
}

#[derive(Debug, Error)]
pub enum SearchError {
    /// The backend cannot rank by vector distance. Callers degrade instead of failing.
    #[error("native vector search unavailable: {0}")]
    CapabilityUnavailable(String),

    #[error("search query failed: {0}")]
    Query(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("competitor discovery is not configured")]
    NotConfigured,

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("{provider} returned {status}: {body}")]
    Provider {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("{provider} returned an empty completion")]
    EmptyCompletion { provider: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("no text generation provider succeeded: {0}")]
    Exhausted(String),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to fetch content: {0}")]
    Fetch(#[from] FetchError),

    #[error("failed to embed content: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("failed to persist content: {0}")]
    Store(#[from] StoreError),

    #[error("similarity search failed: {0}")]
    Search(#[from] SearchError),

    #[error("no competitor urls found for keyword {0:?}")]
    NoCandidatesFound(String),

    #[error("could not fetch content from any competitor url")]
    NoContentAvailable,
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
