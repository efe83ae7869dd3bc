mod server;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use content_intel_core::{
    AnthropicGenerator, BrightDataSerp, CharacterNgramEmbedder, CompetitorFinder, ContentPipeline,
    ContentStore, DisabledEmbedder, Embedder, EmbeddingBackend, FetcherConfig, GeneratorChain,
    HttpFetcher, MemoryContentStore, OpenAiCompatibleGenerator, PipelineOptions,
    SqliteContentStore, StaticStrategyGenerator, TextGenerator, UnconfiguredFinder,
    DEFAULT_CHUNK_SIZE,
};
use serde::Serialize;
use server::{AnalyzeResponse, SearchResponse, StrategyResponse, DEFAULT_CORS_ORIGINS};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "content-intel", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// SQLite url, or `memory` for a process-local store
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://content_intel.db")]
    database_url: String,

    /// Path to the sqlite-vec loadable extension
    #[arg(long, env = "SQLITE_VEC_EXTENSION")]
    sqlite_vec_extension: Option<String>,

    /// ngram, fastembed or disabled
    #[arg(long, env = "EMBEDDING_BACKEND", default_value = "ngram")]
    embedding_backend: EmbeddingBackend,

    #[arg(long, env = "EMBEDDING_MODEL", default_value = "all-MiniLM-L6-v2")]
    embedding_model: String,

    #[arg(long, env = "EMBEDDING_CACHE_DIR")]
    embedding_cache_dir: Option<PathBuf>,

    /// Characters per chunk when embedding long documents
    #[arg(long, env = "CHUNK_SIZE", default_value_t = DEFAULT_CHUNK_SIZE, value_parser = parse_chunk_size)]
    chunk_size: usize,

    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value_t = 15)]
    fetch_timeout_secs: u64,

    #[arg(long, env = "USER_AGENT")]
    user_agent: Option<String>,

    #[arg(long, env = "BRIGHTDATA_API_TOKEN", hide_env_values = true)]
    brightdata_api_token: Option<String>,

    #[arg(long, env = "BRIGHTDATA_ZONE", default_value = "serp_api1")]
    brightdata_zone: String,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    /// Any OpenAI-compatible chat completions endpoint
    #[arg(long, env = "OPENAI_BASE_URL")]
    openai_base_url: Option<String>,

    #[arg(long, env = "OPENAI_MODEL", default_value = "gpt-4o-mini")]
    openai_model: String,

    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    anthropic_api_key: Option<String>,

    #[arg(long, env = "ANTHROPIC_MODEL", default_value = "claude-3-5-haiku-latest")]
    anthropic_model: String,

    /// Used when RUST_LOG is not set
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Command {
    /// Create the content table if it does not exist.
    InitDb,
    /// Fetch a page, score it and store its embedding.
    Analyze {
        #[arg(long)]
        url: String,
    },
    /// List stored pages closest to the page at the given url.
    Similar {
        #[arg(long)]
        url: String,
        /// Number of neighbours to return.
        #[arg(long, default_value = "5")]
        limit: usize,
    },
    /// Discover competitors for a keyword and generate a content strategy.
    Strategy {
        #[arg(long)]
        keyword: String,
    },
    /// Serve the JSON API.
    Serve {
        #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8000")]
        bind: SocketAddr,
        /// Comma separated list of allowed origins
        #[arg(long, env = "CORS_ORIGINS", value_delimiter = ',')]
        cors_origins: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        started_at = %Utc::now().to_rfc3339(),
        "content-intel boot"
    );

    let store = build_store(&cli).await?;
    if let Command::InitDb = cli.command {
        println!("schema ready ({} records)", store.count().await?);
        return Ok(());
    }

    let mut pipeline = build_pipeline(&cli, store)?;

    match cli.command {
        Command::InitDb => {}
        Command::Analyze { url } => {
            let summary = pipeline.analyze_and_store(&url).await?;
            print_json(&AnalyzeResponse::from(summary))?;
        }
        Command::Similar { url, limit } => {
            let mut options = pipeline.options().clone();
            options.similar_limit = limit;
            pipeline = pipeline.with_options(options);
            let report = pipeline.find_similar(&url).await?;
            print_json(&SearchResponse::from(report))?;
        }
        Command::Strategy { keyword } => {
            let report = pipeline.full_strategy(&keyword).await?;
            print_json(&StrategyResponse::from(report))?;
        }
        Command::Serve { bind, cors_origins } => {
            let origins = if cors_origins.is_empty() {
                DEFAULT_CORS_ORIGINS.map(String::from).to_vec()
            } else {
                cors_origins
            };
            let app = server::router(pipeline, server::cors_layer(&origins));
            let listener = tokio::net::TcpListener::bind(bind)
                .await
                .with_context(|| format!("binding {bind}"))?;
            info!(address = %bind, origins = ?origins, "listening");
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
    }

    Ok(())
}

async fn build_store(cli: &Cli) -> anyhow::Result<Arc<dyn ContentStore>> {
    if cli.database_url == "memory" {
        info!("using in-memory content store");
        return Ok(Arc::new(MemoryContentStore::default()));
    }

    let store =
        SqliteContentStore::connect(&cli.database_url, cli.sqlite_vec_extension.as_deref())
            .await
            .with_context(|| format!("connecting to {}", cli.database_url))?;
    store.init_schema().await?;
    if cli.sqlite_vec_extension.is_none() {
        warn!("SQLITE_VEC_EXTENSION not set; similarity search will use keyword fallback");
    }
    Ok(Arc::new(store))
}

fn build_pipeline(cli: &Cli, store: Arc<dyn ContentStore>) -> anyhow::Result<ContentPipeline> {
    let embedder = build_embedder(cli)?;

    let options = PipelineOptions {
        chunk_size: cli.chunk_size,
        fetch_timeout: Duration::from_secs(cli.fetch_timeout_secs),
        ..PipelineOptions::default()
    };

    let mut fetcher_config = FetcherConfig::from(&options);
    if let Some(user_agent) = &cli.user_agent {
        fetcher_config.user_agent = user_agent.clone();
    }
    let fetcher = HttpFetcher::new(fetcher_config)?;

    let finder: Arc<dyn CompetitorFinder> = match &cli.brightdata_api_token {
        Some(token) => Arc::new(BrightDataSerp::new(token, &cli.brightdata_zone)?),
        None => Arc::new(UnconfiguredFinder),
    };

    Ok(ContentPipeline::new(
        store,
        embedder,
        Arc::new(fetcher),
        finder,
        build_generator(cli)?,
    )
    .with_options(options))
}

fn build_embedder(cli: &Cli) -> anyhow::Result<Arc<dyn Embedder>> {
    let embedder: Arc<dyn Embedder> = match cli.embedding_backend {
        EmbeddingBackend::Ngram => Arc::new(CharacterNgramEmbedder::default()),
        EmbeddingBackend::Disabled => {
            warn!("embeddings disabled; every document is stored with the zero vector");
            Arc::new(DisabledEmbedder::default())
        }
        #[cfg(feature = "fastembed")]
        EmbeddingBackend::FastEmbed => {
            let model = content_intel_core::FastEmbedder::new(
                &cli.embedding_model,
                cli.embedding_cache_dir.clone(),
            )?;
            info!(model = model.name(), "fastembed model loaded");
            Arc::new(model)
        }
        #[cfg(not(feature = "fastembed"))]
        EmbeddingBackend::FastEmbed => {
            anyhow::bail!(
                "EMBEDDING_BACKEND=fastembed requires building with the `fastembed` feature (model {})",
                cli.embedding_model
            )
        }
    };
    info!(backend = ?cli.embedding_backend, dimensions = embedder.dimensions(), "embedder ready");
    Ok(embedder)
}

/// Configured providers in order. The static blueprint is only used when none are set,
/// so a failing provider surfaces as a failure message.
fn build_generator(cli: &Cli) -> anyhow::Result<Arc<dyn TextGenerator>> {
    let mut providers: Vec<Box<dyn TextGenerator>> = Vec::new();
    if let Some(key) = &cli.openai_api_key {
        providers.push(Box::new(OpenAiCompatibleGenerator::new(
            key,
            cli.openai_base_url.clone(),
            &cli.openai_model,
        )?));
    }
    if let Some(key) = &cli.anthropic_api_key {
        providers.push(Box::new(AnthropicGenerator::new(key, &cli.anthropic_model)?));
    }

    if providers.is_empty() {
        warn!("no generation provider configured; using the basic strategy text");
        return Ok(Arc::new(StaticStrategyGenerator));
    }

    let chain = GeneratorChain::new(providers);
    info!(providers = ?chain.provider_names(), "generation providers ready");
    Ok(Arc::new(chain))
}

fn parse_chunk_size(value: &str) -> Result<usize, String> {
    match value.trim().parse::<usize>() {
        Ok(0) => Err("chunk size must be at least 1".to_string()),
        Ok(size) => Ok(size),
        Err(error) => Err(error.to_string()),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(error = %error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
