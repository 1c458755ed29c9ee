//! Text chunking for the vector store: fixed-size runs of whitespace-separated words.

/// Words per chunk used for profile text and ingested documents.
pub const DEFAULT_CHUNK_WORDS: usize = 500;

/// Split `text` into chunks of at most `chunk_words` words, each joined by single spaces.
pub fn chunk_words(text: &str, chunk_words: usize) -> Vec<String> {
    let chunk_words = chunk_words.max(1);
    let words: Vec<&str> = text.split_whitespace().collect();
    let chunks: Vec<String> = words.chunks(chunk_words).map(|w| w.join(" ")).collect();
    tracing::debug!("Text chunked into {} segments", chunks.len());
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_empty_text() {
        assert!(chunk_words("", 500).is_empty());
        assert!(chunk_words("  \n\t ", 500).is_empty());
    }

    #[test]
    fn test_chunk_short_text_single_chunk() {
        let chunks = chunk_words("name: Asha,\n  email: a@b.c", 500);
        assert_eq!(chunks, vec!["name: Asha, email: a@b.c".to_string()]);
    }

    #[test]
    fn test_chunk_splits_on_word_count() {
        let text: String = (0..1201).map(|i| format!("w{i} ")).collect();
        let chunks = chunk_words(&text, 500);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].split(' ').count(), 500);
        assert_eq!(chunks[1].split(' ').count(), 500);
        assert_eq!(chunks[2], "w1200");
        assert!(chunks[1].starts_with("w500 "));
    }

    #[test]
    fn test_zero_chunk_size_is_treated_as_one() {
        assert_eq!(chunk_words("a b", 0), vec!["a", "b"]);
    }
}
