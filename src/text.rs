//! Tokenizers that turn record text into the token sets the index hashes.

/// Splits on whitespace. This is the tokenizer [`crate::MinHashLSH::from_records`] uses.
pub fn whitespace_tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace()
}

/// Overlapping word n-grams joined by a single space.
///
/// Text with fewer than `size` words yields one shingle holding all of them,
/// so short records still produce a non-empty token set.
pub fn word_shingles(text: &str, size: usize) -> Vec<String> {
    let words: Vec<&str> = whitespace_tokens(text).collect();
    if words.is_empty() {
        return Vec::new();
    }
    let size = size.max(1);
    if words.len() <= size {
        return vec![words.join(" ")];
    }
    words.windows(size).map(|window| window.join(" ")).collect()
}
