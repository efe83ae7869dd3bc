use crate::models::{ContentRecord, SearchHit, SearchMode};

/// Row returned by a native nearest-neighbour query.
#[derive(Debug, Clone)]
pub struct RankedRow {
    pub url: String,
    pub content: Option<String>,
    pub quality_score: u32,
    pub distance: f32,
}

impl RankedRow {
    pub fn into_hit(self) -> SearchHit {
        SearchHit {
            url: self.url,
            content: self.content,
            quality_score: self.quality_score,
            distance: Some(self.distance),
            mode: SearchMode::Native,
        }
    }
}

impl From<ContentRecord> for SearchHit {
    fn from(record: ContentRecord) -> Self {
        SearchHit {
            url: record.url,
            content: record.content,
            quality_score: record.quality_score,
            distance: None,
            mode: SearchMode::Keyword,
        }
    }
}

pub fn l2_distance(left: &[f32], right: &[f32]) -> f32 {
    left.iter()
        .zip(right)
        .map(|(a, b)| (a - b) * (a - b))
        .sum::<f32>()
        .sqrt()
}

/// Case-insensitive substring test. An empty keyword matches everything.
pub fn contains_keyword(text: &str, keyword: &str) -> bool {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return true;
    }
    text.to_lowercase().contains(&keyword.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn l2_distance_matches_hand_computation() {
        assert_eq!(l2_distance(&[0.0, 0.0], &[3.0, 4.0]), 5.0);
        assert_eq!(l2_distance(&[1.0, 1.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn keyword_match_ignores_case() {
        assert!(contains_keyword("About SEO tips", "seo"));
        assert!(!contains_keyword("cooking recipes", "seo"));
        assert!(contains_keyword("anything", "  "));
    }
}
