use crate::error::DiscoveryError;
use crate::traits::CompetitorFinder;
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

const BRIGHTDATA_ENDPOINT: &str = "https://api.brightdata.com/request";

/// Google SERP scraping through the Bright Data request API.
pub struct BrightDataSerp {
    api_token: String,
    zone: String,
    endpoint: String,
    client: Client,
}

impl BrightDataSerp {
    pub fn new(api_token: impl Into<String>, zone: impl Into<String>) -> Result<Self, DiscoveryError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            api_token: api_token.into(),
            zone: zone.into(),
            endpoint: BRIGHTDATA_ENDPOINT.to_string(),
            client,
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl CompetitorFinder for BrightDataSerp {
    async fn find_competitors(
        &self,
        keyword: &str,
        limit: usize,
    ) -> Result<Vec<String>, DiscoveryError> {
        let mut search_url = Url::parse("https://www.google.com/search")
            .map_err(|error| DiscoveryError::BackendResponse {
                backend: "brightdata".to_string(),
                details: error.to_string(),
            })?;
        search_url.query_pairs_mut().append_pair("q", keyword);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_token)
            .json(&json!({
                "zone": self.zone,
                "url": search_url.as_str(),
                "format": "json",
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DiscoveryError::BackendResponse {
                backend: "brightdata".to_string(),
                details: format!("{status}: {body}"),
            });
        }

        let payload: Value = response.json().await?;
        let urls = extract_competitor_urls(&payload, limit);
        info!(keyword = %keyword, found = urls.len(), "competitor urls discovered");
        Ok(urls)
    }
}

/// Used when no discovery credentials are configured.
pub struct UnconfiguredFinder;

#[async_trait]
impl CompetitorFinder for UnconfiguredFinder {
    async fn find_competitors(
        &self,
        _keyword: &str,
        _limit: usize,
    ) -> Result<Vec<String>, DiscoveryError> {
        warn!("competitor discovery called but BRIGHTDATA_API_TOKEN is not set");
        Err(DiscoveryError::NotConfigured)
    }
}

/// Pulls organic result links out of a SERP payload. The payload is either JSON with
/// `organic`/`results` arrays (optionally wrapped in `body`), or `body` holds raw HTML.
pub fn extract_competitor_urls(payload: &Value, limit: usize) -> Vec<String> {
    let body = payload.get("body").unwrap_or(payload);

    let candidates = match body {
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(parsed) if parsed.is_object() => organic_links(&parsed),
            _ => html_links(raw),
        },
        other => organic_links(other),
    };

    select_urls(candidates, limit)
}

fn organic_links(body: &Value) -> Vec<String> {
    let results = body
        .get("organic")
        .and_then(Value::as_array)
        .filter(|items| !items.is_empty())
        .or_else(|| body.get("results").and_then(Value::as_array));

    results
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("link").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn html_links(html: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let document = Html::parse_document(html);
    document
        .select(&selector)
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter(|href| href.starts_with("http") && !href.to_lowercase().contains("google"))
        .map(str::to_string)
        .collect()
}

/// Dedupes, drops results whose domain repeats the previous pick, keeps `limit`.
fn select_urls(candidates: Vec<String>, limit: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut selected: Vec<String> = Vec::new();
    let mut last_domain: Option<String> = None;

    for candidate in candidates {
        if selected.len() >= limit {
            break;
        }
        let Ok(parsed) = Url::parse(&candidate) else {
            continue;
        };
        let domain = parsed.host_str().unwrap_or_default().to_string();
        if last_domain.as_deref() == Some(domain.as_str()) || !seen.insert(candidate.clone()) {
            continue;
        }
        last_domain = Some(domain);
        selected.push(candidate);
    }

    selected
}
