//! Text generation providers for strategy drafting. Providers are tried in order by
//! [`GeneratorChain`]; which ones exist depends on the credentials configured.

pub mod anthropic;
pub mod openai;

pub use anthropic::AnthropicGenerator;
pub use openai::OpenAiCompatibleGenerator;

use crate::error::GenerationError;
use crate::traits::TextGenerator;
use async_trait::async_trait;
use tracing::{info, warn};

const MAX_CHARS_PER_TEXT: usize = 4_000;

pub const SYSTEM_PROMPT: &str = "You are an SEO content strategist. Given competitor articles, produce a content strategy blueprint: target audience, search intent, a recommended outline with H2/H3 headings, topics the competitors miss, and questions the article should answer.";

pub const BASIC_STRATEGY: &str = "Content strategy generation is not configured. Configure an OpenAI-compatible or Anthropic API key for full functionality. Basic strategy: analyze competitor content for key themes and keywords, then structure your content to cover similar topics with better depth and user experience.";

#[derive(Debug, Clone, Copy)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: usize,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.4,
            max_tokens: 1_200,
        }
    }
}

/// User prompt listing each competitor text, truncated to keep the request bounded.
pub fn build_prompt(texts: &[String]) -> String {
    let mut prompt = String::from(
        "Analyze the following competitor content and write a strategy for an article that outranks it.\n",
    );
    for (index, text) in texts.iter().enumerate() {
        let excerpt: String = text.chars().take(MAX_CHARS_PER_TEXT).collect();
        prompt.push_str(&format!("\n--- Competitor {} ---\n{}\n", index + 1, excerpt));
    }
    prompt
}

/// Returns the canned basic strategy. Last entry of a chain with no credentials.
pub struct StaticStrategyGenerator;

#[async_trait]
impl TextGenerator for StaticStrategyGenerator {
    fn name(&self) -> &str {
        "static"
    }

    async fn generate_strategy(&self, _texts: &[String]) -> Result<String, GenerationError> {
        Ok(BASIC_STRATEGY.to_string())
    }
}

pub struct GeneratorChain {
    providers: Vec<Box<dyn TextGenerator>>,
}

impl GeneratorChain {
    pub fn new(providers: Vec<Box<dyn TextGenerator>>) -> Self {
        Self { providers }
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|provider| provider.name()).collect()
    }
}

#[async_trait]
impl TextGenerator for GeneratorChain {
    fn name(&self) -> &str {
        "chain"
    }

    async fn generate_strategy(&self, texts: &[String]) -> Result<String, GenerationError> {
        let mut failures = Vec::new();

        for provider in &self.providers {
            match provider.generate_strategy(texts).await {
                Ok(strategy) => {
                    info!(provider = provider.name(), "strategy generated");
                    return Ok(strategy);
                }
                Err(error) => {
                    warn!(provider = provider.name(), error = %error, "provider failed, trying next");
                    failures.push(format!("{}: {}", provider.name(), error));
                }
            }
        }

        if failures.is_empty() {
            failures.push("no providers configured".to_string());
        }
        Err(GenerationError::Exhausted(failures.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Failing {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl TextGenerator for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn generate_strategy(&self, _texts: &[String]) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(GenerationError::EmptyCompletion {
                provider: "failing".to_string(),
            })
        }
    }

    struct Echo;

    #[async_trait]
    impl TextGenerator for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate_strategy(&self, texts: &[String]) -> Result<String, GenerationError> {
            Ok(texts.join("|"))
        }
    }

    #[tokio::test]
    async fn chain_falls_through_to_first_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = GeneratorChain::new(vec![
            Box::new(Failing {
                calls: Arc::clone(&calls),
            }),
            Box::new(Echo),
            Box::new(StaticStrategyGenerator),
        ]);

        let texts = vec!["a".to_string(), "b".to_string()];
        assert_eq!(chain.generate_strategy(&texts).await.unwrap(), "a|b");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(chain.provider_names(), vec!["failing", "echo", "static"]);
    }

    #[tokio::test]
    async fn exhausted_chain_reports_every_failure() {
        let chain = GeneratorChain::new(vec![Box::new(Failing {
            calls: Arc::new(AtomicUsize::new(0)),
        })]);

        let error = chain
            .generate_strategy(&["x".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(error, GenerationError::Exhausted(ref detail) if detail.contains("failing")));
    }

    #[test]
    fn prompt_numbers_and_truncates_texts() {
        let long = "x".repeat(MAX_CHARS_PER_TEXT + 50);
        let prompt = build_prompt(&["first".to_string(), long]);
        assert!(prompt.contains("--- Competitor 1 ---\nfirst"));
        assert!(prompt.contains("--- Competitor 2 ---"));
        assert!(!prompt.contains(&"x".repeat(MAX_CHARS_PER_TEXT + 1)));
    }
}
