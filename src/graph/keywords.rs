use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Tokens shorter than this are not indexed.
const MIN_KEYWORD_LENGTH: usize = 3;

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "had", "her",
        "was", "one", "our", "out", "has", "have", "his", "how", "its", "may", "new", "now",
        "see", "two", "who", "did", "get", "him", "let", "say", "she", "too", "use", "that",
        "with", "this", "from", "they", "will", "would", "there", "their", "what", "about",
        "which", "when", "were", "been", "also", "into", "than", "then", "them", "these",
        "those", "such", "some", "more", "most", "other", "only", "over", "very", "each",
        "where", "while", "because", "between", "both", "being", "does", "here", "shall",
        "should", "could", "upon", "within", "without", "after", "before", "above", "below",
        "under", "same", "your", "yours", "just", "like", "well", "must",
    ]
    .into_iter()
    .collect()
});

/// Splits text into lowercase keywords, dropping stop words, numbers and
/// short tokens. Each keyword appears once, in first-seen order.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut keywords = Vec::new();

    for token in text.split(|c: char| !c.is_alphanumeric()) {
        if token.chars().count() < MIN_KEYWORD_LENGTH {
            continue;
        }
        if token.chars().all(|c| c.is_numeric()) {
            continue;
        }
        let lower = token.to_lowercase();
        if STOP_WORDS.contains(lower.as_str()) {
            continue;
        }
        if seen.insert(lower.clone()) {
            keywords.push(lower);
        }
    }

    keywords
}

