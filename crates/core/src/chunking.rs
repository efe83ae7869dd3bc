use crate::error::EmbeddingError;

pub const DEFAULT_CHUNK_SIZE: usize = 512;

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits `text` into contiguous, non-overlapping slices of `chunk_chars` characters.
/// The last slice may be shorter. Slices always end on a char boundary.
pub fn split_fixed(text: &str, chunk_chars: usize) -> Result<Vec<&str>, EmbeddingError> {
    if chunk_chars == 0 {
        return Err(EmbeddingError::InvalidChunkSize(chunk_chars));
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (offset, _) in text.char_indices() {
        if count == chunk_chars {
            chunks.push(&text[start..offset]);
            start = offset;
            count = 0;
        }
        count += 1;
    }

    if start < text.len() {
        chunks.push(&text[start..]);
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_is_normalized() {
        let input = "A  \t  lot\nof   spacing";
        let normalized = normalize_whitespace(input);
        assert_eq!(normalized, "A lot of spacing");
    }

    #[test]
    fn non_breaking_spaces_collapse_like_any_whitespace() {
        assert_eq!(normalize_whitespace("price:\u{a0}\u{a0}10\u{a0}eur"), "price: 10 eur");
    }

    #[test]
    fn slices_are_contiguous_and_bounded() {
        let chunks = split_fixed("abcdefghij", 4).unwrap();
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
        assert_eq!(chunks.concat(), "abcdefghij");
    }

    #[test]
    fn exact_multiple_has_no_trailing_empty_slice() {
        let chunks = split_fixed("abcdef", 3).unwrap();
        assert_eq!(chunks, vec!["abc", "def"]);
    }

    #[test]
    fn multibyte_text_splits_on_char_boundaries() {
        let chunks = split_fixed("héllo wörld", 5).unwrap();
        assert_eq!(chunks, vec!["héllo", " wörl", "d"]);
    }

    #[test]
    fn empty_text_has_no_slices() {
        assert!(split_fixed("", 8).unwrap().is_empty());
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        assert!(matches!(
            split_fixed("abc", 0),
            Err(EmbeddingError::InvalidChunkSize(0))
        ));
    }
}
