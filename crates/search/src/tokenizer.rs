//! Basic tokenizer
//!
//! Lower-case, then split on whitespace. No stemming, no stop-word
//! removal, punctuation stays attached to its token. The same function is
//! applied to passages at build time and to queries at search time, so the
//! two sides always agree on what a term is.

/// Tokenize text into searchable terms
///
/// # Example
///
/// ```
/// use retrieval_search::tokenizer::tokenize;
///
/// let tokens = tokenize("Solar  Panel\tefficiency");
/// assert_eq!(tokens, vec!["solar", "panel", "efficiency"]);
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(String::from)
        .collect()
}

/// Tokenize and deduplicate, keeping first-occurrence order
///
/// # Example
///
/// ```
/// use retrieval_search::tokenizer::tokenize_unique;
///
/// let terms = tokenize_unique("Grid grid GRID frequency");
/// assert_eq!(terms, vec!["grid", "frequency"]);
/// ```
pub fn tokenize_unique(text: &str) -> Vec<String> {
    let mut seen = rustc_hash::FxHashSet::default();
    tokenize(text)
        .into_iter()
        .filter(|t| seen.insert(t.clone()))
        .collect()
}
