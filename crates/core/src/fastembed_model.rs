//! Sentence-transformer embeddings through fastembed.
//!
//! The model is loaded once and owned by [`FastEmbedder`]; share it behind an `Arc`.
//! Inference is stateless, the mutex only exists because fastembed's `embed` takes
//! `&mut self`.

use crate::embeddings::{ensure_dimensions, zero_vector, Embedder, EMBED_DIM};
use crate::error::EmbeddingError;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::path::PathBuf;
use std::sync::Mutex;

pub struct FastEmbedder {
    model: Mutex<TextEmbedding>,
    model_name: String,
}

impl FastEmbedder {
    pub fn new(model_name: &str, cache_dir: Option<PathBuf>) -> Result<Self, EmbeddingError> {
        let mut options = InitOptions::new(parse_model_name(model_name)?)
            .with_show_download_progress(false);
        if let Some(dir) = cache_dir {
            options = options.with_cache_dir(dir);
        }

        let model =
            TextEmbedding::try_new(options).map_err(|error| EmbeddingError::Backend(error.to_string()))?;

        let embedder = Self {
            model: Mutex::new(model),
            model_name: model_name.to_string(),
        };

        let probe = embedder.embed("probe")?;
        ensure_dimensions(&probe, EMBED_DIM)?;

        Ok(embedder)
    }

    pub fn name(&self) -> &str {
        &self.model_name
    }
}

impl Embedder for FastEmbedder {
    fn dimensions(&self) -> usize {
        EMBED_DIM
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.is_empty() {
            return Ok(zero_vector(EMBED_DIM));
        }

        let mut model = self
            .model
            .lock()
            .map_err(|error| EmbeddingError::Backend(format!("model lock poisoned: {error}")))?;

        let mut vector = model
            .embed(vec![text], None)
            .map_err(|error| EmbeddingError::Backend(error.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::Backend("model returned no embedding".to_string()))?;

        ensure_dimensions(&vector, EMBED_DIM)?;

        let magnitude = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut vector {
                *value /= magnitude;
            }
        }

        Ok(vector)
    }
}

fn parse_model_name(name: &str) -> Result<EmbeddingModel, EmbeddingError> {
    match name.to_lowercase().as_str() {
        "all-minilm-l6-v2" | "allminiml6v2" => Ok(EmbeddingModel::AllMiniLML6V2),
        "all-minilm-l6-v2-q" | "allminiml6v2q" => Ok(EmbeddingModel::AllMiniLML6V2Q),
        "paraphrase-multilingual-minilm-l12-v2" | "paraphrase-minilm" => {
            Ok(EmbeddingModel::ParaphraseMLMiniLML12V2)
        }
        "bge-small-en-v1.5" | "bgesmallenv15" => Ok(EmbeddingModel::BGESmallENV15),
        other => Err(EmbeddingError::Backend(format!(
            "unknown or non-384-dimension model: {other}"
        ))),
    }
}
