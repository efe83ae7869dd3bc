use crate::chunking::split_fixed;
use crate::error::EmbeddingError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const EMBED_DIM: usize = 384;

/// Text to fixed-length vector. Implementations must be deterministic and safe to share
/// across tasks; `embed("")` returns the all-zero sentinel rather than failing.
pub trait Embedder: Send + Sync {
    fn dimensions(&self) -> usize;

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Embeds each `chunk_size`-char slice and averages the slice vectors component-wise.
    fn embed_long(&self, text: &str, chunk_size: usize) -> Result<Vec<f32>, EmbeddingError> {
        let dimensions = self.dimensions();
        let chunks = split_fixed(text, chunk_size)?;
        if chunks.is_empty() {
            return Ok(zero_vector(dimensions));
        }

        let mut sum = zero_vector(dimensions);
        for chunk in &chunks {
            let vector = self.embed(chunk)?;
            ensure_dimensions(&vector, dimensions)?;
            for (total, value) in sum.iter_mut().zip(vector) {
                *total += value;
            }
        }

        let count = chunks.len() as f32;
        for total in &mut sum {
            *total /= count;
        }

        Ok(sum)
    }
}

pub fn zero_vector(dimensions: usize) -> Vec<f32> {
    vec![0f32; dimensions]
}

pub fn is_zero_vector(vector: &[f32]) -> bool {
    vector.iter().all(|value| *value == 0.0)
}

pub fn ensure_dimensions(vector: &[f32], expected: usize) -> Result<(), EmbeddingError> {
    if vector.len() != expected {
        return Err(EmbeddingError::Dimension {
            expected,
            actual: vector.len(),
        });
    }
    Ok(())
}

/// Number of literal `?` characters. Downstream consumers rely on this exact count.
pub fn quality_score(text: &str) -> u32 {
    let count = text.chars().filter(|character| *character == '?').count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    #[default]
    Ngram,
    FastEmbed,
    Disabled,
}

impl FromStr for EmbeddingBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "ngram" => Ok(Self::Ngram),
            "fastembed" => Ok(Self::FastEmbed),
            "disabled" | "off" | "none" => Ok(Self::Disabled),
            other => Err(format!(
                "unknown embedding backend {other:?} (expected ngram, fastembed or disabled)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CharacterNgramEmbedder {
    pub dimensions: usize,
}

impl Default for CharacterNgramEmbedder {
    fn default() -> Self {
        Self {
            dimensions: EMBED_DIM,
        }
    }
}

impl Embedder for CharacterNgramEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vector = zero_vector(self.dimensions.max(1));
        if text.is_empty() {
            return Ok(vector);
        }

        // Pad so one- and two-char inputs still produce a trigram.
        let padded = format!(" {} ", text.to_lowercase());
        let chars: Vec<char> = padded.chars().collect();

        for window in chars.windows(3) {
            let token = window.iter().collect::<String>();
            let mut hash = 1469598103934665603u64;
            for byte in token.bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(1099511628211);
            }
            let bucket = (hash % vector.len() as u64) as usize;
            vector[bucket] += 1.0;
        }

        let magnitude = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut vector {
                *value /= magnitude;
            }
        }

        Ok(vector)
    }
}

/// Embedding switched off by configuration: every input maps to the zero sentinel.
#[derive(Debug, Clone, Copy)]
pub struct DisabledEmbedder {
    pub dimensions: usize,
}

impl Default for DisabledEmbedder {
    fn default() -> Self {
        Self {
            dimensions: EMBED_DIM,
        }
    }
}

impl Embedder for DisabledEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(zero_vector(self.dimensions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::DEFAULT_CHUNK_SIZE;

    fn magnitude(vector: &[f32]) -> f32 {
        vector.iter().map(|value| value * value).sum::<f32>().sqrt()
    }

    /// Maps a chunk to a vector derived from its length and first byte so averages
    /// can be recomputed by hand.
    struct LengthEmbedder;

    impl Embedder for LengthEmbedder {
        fn dimensions(&self) -> usize {
            4
        }

        fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            if text.is_empty() {
                return Ok(zero_vector(4));
            }
            let first = text.as_bytes()[0] as f32;
            Ok(vec![text.len() as f32, first, 1.0, -first])
        }
    }

    struct ZeroEverywhere;

    impl Embedder for ZeroEverywhere {
        fn dimensions(&self) -> usize {
            3
        }

        fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(zero_vector(3))
        }
    }

    struct ShortEmbedder;

    impl Embedder for ShortEmbedder {
        fn dimensions(&self) -> usize {
            8
        }

        fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(vec![1.0; 5])
        }
    }

    #[test]
    fn embedder_is_deterministic() {
        let embedder = CharacterNgramEmbedder::default();
        let first = embedder.embed("Ten link building tips for 2024").unwrap();
        let second = embedder.embed("Ten link building tips for 2024").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn embedder_outputs_unit_vectors_of_fixed_length() {
        let embedder = CharacterNgramEmbedder::default();
        for text in ["a", "ab", "What is SEO?", "Long form content strategy guide"] {
            let vector = embedder.embed(text).unwrap();
            assert_eq!(vector.len(), EMBED_DIM);
            assert!((magnitude(&vector) - 1.0).abs() < 1e-5, "{text}");
        }
    }

    #[test]
    fn empty_text_is_zero_sentinel() {
        let embedder = CharacterNgramEmbedder::default();
        let vector = embedder.embed("").unwrap();
        assert_eq!(vector.len(), EMBED_DIM);
        assert!(is_zero_vector(&vector));

        let long = embedder.embed_long("", 512).unwrap();
        assert_eq!(long, vector);
    }

    #[test]
    fn embed_long_is_mean_of_chunk_vectors() {
        let embedder = LengthEmbedder;
        let text = "abcdefghij";
        let result = embedder.embed_long(text, 4).unwrap();

        let chunks = ["abcd", "efgh", "ij"];
        let mut expected = vec![0f32; 4];
        for chunk in chunks {
            for (total, value) in expected.iter_mut().zip(embedder.embed(chunk).unwrap()) {
                *total += value;
            }
        }
        for value in &mut expected {
            *value /= chunks.len() as f32;
        }

        assert_eq!(result, expected);
    }

    #[test]
    fn embed_long_of_short_text_equals_embed() {
        let embedder = CharacterNgramEmbedder::default();
        let text = "short enough for one chunk";
        assert_eq!(
            embedder.embed_long(text, 512).unwrap(),
            embedder.embed(text).unwrap()
        );
    }

    #[test]
    fn all_zero_chunks_average_to_zero() {
        let vector = ZeroEverywhere.embed_long("abcdefgh", 3).unwrap();
        assert_eq!(vector, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn wrong_length_chunk_vector_is_rejected() {
        let result = ShortEmbedder.embed_long("abcdef", 2);
        assert!(matches!(
            result,
            Err(EmbeddingError::Dimension {
                expected: 8,
                actual: 5
            })
        ));
    }

    #[test]
    fn disabled_embedder_returns_zero_vector() {
        let vector = DisabledEmbedder::default()
            .embed_long("anything", DEFAULT_CHUNK_SIZE)
            .unwrap();
        assert_eq!(vector.len(), EMBED_DIM);
        assert!(is_zero_vector(&vector));
    }

    #[test]
    fn quality_score_counts_question_marks() {
        assert_eq!(quality_score(""), 0);
        assert_eq!(quality_score("a?b?c?"), 3);
        assert_eq!(quality_score("no marks"), 0);
        assert_eq!(quality_score("Is this good? Yes?"), 2);
    }

    #[test]
    fn backend_parses_from_config_strings() {
        assert_eq!("NGRAM".parse::<EmbeddingBackend>(), Ok(EmbeddingBackend::Ngram));
        assert_eq!(
            "disabled".parse::<EmbeddingBackend>(),
            Ok(EmbeddingBackend::Disabled)
        );
        assert!("bert".parse::<EmbeddingBackend>().is_err());
    }
}
