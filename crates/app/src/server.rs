use axum::extract::State;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::{Json, Router};
use content_intel_core::{
    AnalysisSummary, ContentPipeline, ContextSource, PipelineError, SearchHit, SearchMode,
    SimilarityReport, StrategyReport,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

pub const DEFAULT_CORS_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://localhost:5173"];

struct AppState {
    pipeline: ContentPipeline,
}

#[derive(Debug, Deserialize)]
pub struct UrlRequest {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct KeywordRequest {
    pub keyword: String,
}

/// Every endpoint answers 200 with either the payload or `{"error": ...}`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ApiResponse<T> {
    Success(T),
    Failure { error: String },
}

impl<T> ApiResponse<T> {
    fn from_result<R>(result: Result<R, PipelineError>, map: impl FnOnce(R) -> T) -> Self {
        match result {
            Ok(value) => Self::Success(map(value)),
            Err(failure) => {
                warn!(error = %failure, "request failed");
                Self::Failure {
                    error: failure.to_string(),
                }
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub url: String,
    pub qae_score: u32,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct SimilarArticle {
    pub url: String,
    pub qae_score: u32,
    /// Four decimals; absent for keyword-mode matches.
    pub distance: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub search_target: String,
    pub mode: SearchMode,
    pub similar_articles: Vec<SimilarArticle>,
}

#[derive(Debug, Serialize)]
pub struct StrategyResponse {
    pub strategy_blueprint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_article: Option<SimilarArticle>,
    pub context_source: ContextSource,
    pub competitor_urls: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<SearchHit> for SimilarArticle {
    fn from(hit: SearchHit) -> Self {
        Self {
            url: hit.url,
            qae_score: hit.quality_score,
            distance: hit.distance.map(|distance| format!("{distance:.4}")),
        }
    }
}

impl From<AnalysisSummary> for AnalyzeResponse {
    fn from(summary: AnalysisSummary) -> Self {
        Self {
            url: summary.url,
            qae_score: summary.quality_score,
            status: summary.status.to_string(),
        }
    }
}

impl From<SimilarityReport> for SearchResponse {
    fn from(report: SimilarityReport) -> Self {
        Self {
            search_target: report.search_target,
            mode: report.mode,
            similar_articles: report.hits.into_iter().map(SimilarArticle::from).collect(),
        }
    }
}

impl From<StrategyReport> for StrategyResponse {
    fn from(report: StrategyReport) -> Self {
        Self {
            strategy_blueprint: report.strategy,
            suggested_article: report.suggested_article.map(SimilarArticle::from),
            context_source: report.context_source,
            competitor_urls: report.competitor_urls,
        }
    }
}

pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn router(pipeline: ContentPipeline, cors: CorsLayer) -> Router {
    let state = Arc::new(AppState { pipeline });

    Router::new()
        .route("/health", get(health))
        .route("/api/analyze", post(analyze))
        .route("/api/search", post(search))
        .route("/api/generate-full-strategy", post(generate_full_strategy))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UrlRequest>,
) -> Json<ApiResponse<AnalyzeResponse>> {
    let result = state.pipeline.analyze_and_store(payload.url.trim()).await;
    Json(ApiResponse::from_result(result, AnalyzeResponse::from))
}

async fn search(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UrlRequest>,
) -> Json<ApiResponse<SearchResponse>> {
    let result = state.pipeline.find_similar(payload.url.trim()).await;
    Json(ApiResponse::from_result(result, SearchResponse::from))
}

async fn generate_full_strategy(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<KeywordRequest>,
) -> Json<ApiResponse<StrategyResponse>> {
    let result = state.pipeline.full_strategy(payload.keyword.trim()).await;
    Json(ApiResponse::from_result(result, StrategyResponse::from))
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    match state.pipeline.store().count().await {
        Ok(records) => Json(HealthResponse {
            status: "ok",
            records: Some(records),
            error: None,
        }),
        Err(failure) => {
            error!(error = %failure, "store health check failed");
            Json(HealthResponse {
                status: "error",
                records: None,
                error: Some(failure.to_string()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use content_intel_core::{
        CharacterNgramEmbedder, CompetitorFinder, DiscoveryError, FetchError, MemoryContentStore,
        PageFetcher, StaticStrategyGenerator,
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct OnePageFetcher;

    #[async_trait]
    impl PageFetcher for OnePageFetcher {
        async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
            match url {
                "http://x.test" => Ok("Is this good? Yes?".to_string()),
                "http://rival.test" => Ok("seo tips for shops".to_string()),
                _ => Err(FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                }),
            }
        }
    }

    struct OneCompetitor;

    #[async_trait]
    impl CompetitorFinder for OneCompetitor {
        async fn find_competitors(
            &self,
            _keyword: &str,
            _limit: usize,
        ) -> Result<Vec<String>, DiscoveryError> {
            Ok(vec!["http://rival.test".to_string()])
        }
    }

    fn app() -> Router {
        let pipeline = ContentPipeline::new(
            Arc::new(MemoryContentStore::default()),
            Arc::new(CharacterNgramEmbedder::default()),
            Arc::new(OnePageFetcher),
            Arc::new(OneCompetitor),
            Arc::new(StaticStrategyGenerator),
        );
        let origins = DEFAULT_CORS_ORIGINS.map(String::from);
        router(pipeline, cors_layer(&origins))
    }

    async fn post_json(app: Router, path: &str, body: Value) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(path)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn analyze_returns_score_and_status() {
        let (status, body) =
            post_json(app(), "/api/analyze", json!({"url": "http://x.test"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"url": "http://x.test", "qae_score": 2, "status": "vectorized"})
        );
    }

    #[tokio::test]
    async fn fetch_failure_is_an_error_body_with_200() {
        let (status, body) =
            post_json(app(), "/api/analyze", json!({"url": "http://down.test"})).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["error"].as_str().unwrap().contains("404"));
    }

    #[tokio::test]
    async fn search_formats_distances_with_four_decimals() {
        let app = app();
        post_json(app.clone(), "/api/analyze", json!({"url": "http://x.test"})).await;

        let (_, body) = post_json(app, "/api/search", json!({"url": "http://x.test"})).await;
        assert_eq!(body["search_target"], "http://x.test");
        assert_eq!(body["mode"], "native");
        assert_eq!(body["similar_articles"][0]["url"], "http://x.test");
        assert_eq!(body["similar_articles"][0]["distance"], "0.0000");
    }

    #[tokio::test]
    async fn strategy_returns_blueprint() {
        let (_, body) = post_json(
            app(),
            "/api/generate-full-strategy",
            json!({"keyword": "seo"}),
        )
        .await;
        assert!(body["strategy_blueprint"]
            .as_str()
            .unwrap()
            .starts_with("Content strategy generation is not configured"));
        assert_eq!(body["context_source"], "keyword_matches");
        assert!(body.get("suggested_article").is_none());
    }

    #[tokio::test]
    async fn health_reports_record_count() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({"status": "ok", "records": 0}));
    }
}
