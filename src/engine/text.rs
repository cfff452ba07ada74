//! Text normalization shared by every other component: lowercasing,
//! punctuation stripping, tokenization and stop-word filtering.
//!
//! Two stop-word sets exist on purpose. [`SEARCH_STOP_WORDS`] cleans user
//! queries and filters expansion tokens; [`KEYWORD_STOP_WORDS`] filters
//! entry text during keyword extraction and additionally drops narrative
//! filler ("been", "there", "these", ...) that is harmless in queries but
//! noisy in documents. Membership is observable in matching behavior, so
//! both sets are pinned by tests.

use std::collections::HashSet;

use lazy_static::lazy_static;

lazy_static! {
    pub static ref SEARCH_STOP_WORDS: HashSet<&'static str> = [
        "a", "about", "an", "and", "are", "as", "at", "be", "but", "by", "can", "could", "do",
        "does", "for", "from", "give", "how", "i", "in", "is", "it", "me", "my", "of", "on", "or",
        "please", "show", "tell", "that", "the", "this", "to", "was", "we", "were", "what", "when",
        "where", "which", "who", "will", "with", "would", "you", "your",
    ]
    .into_iter()
    .collect();

    pub static ref KEYWORD_STOP_WORDS: HashSet<&'static str> = [
        "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be", "been",
        "before", "but", "by", "can", "could", "did", "do", "does", "each", "for", "from", "had",
        "has", "have", "how", "i", "if", "in", "into", "is", "it", "its", "may", "more", "most",
        "my", "not", "of", "on", "or", "other", "our", "over", "shall", "should", "so", "some",
        "such", "than", "that", "the", "their", "them", "then", "there", "these", "they", "this",
        "to", "under", "was", "we", "were", "what", "when", "where", "which", "who", "will",
        "with", "would", "you", "your",
    ]
    .into_iter()
    .collect();
}

/// Lowercases, replaces every non-word character with a space, collapses
/// whitespace and splits. Empty input yields an empty vec.
pub fn normalize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let cleaned: String = lowered
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    cleaned.split_whitespace().map(str::to_string).collect()
}

/// [`normalize`] plus minimum-length and optional stop-word filtering.
pub fn tokens(
    text: &str,
    min_len: usize,
    stop_words: Option<&HashSet<&'static str>>,
) -> Vec<String> {
    normalize(text)
        .into_iter()
        .filter(|t| t.chars().count() >= min_len)
        .filter(|t| stop_words.is_none_or(|set| !set.contains(t.as_str())))
        .collect()
}

/// Cleans a user query for scoring: punctuation stripped, search stop words
/// removed, rejoined with single spaces.
pub fn clean_query(query: &str) -> String {
    tokens(query, 1, Some(&SEARCH_STOP_WORDS)).join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_punctuation() {
        assert_eq!(normalize("Hello, World!!"), vec!["hello", "world"]);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize("Fee   structure:  2024-25!");
        let twice = normalize(&once.join(" "));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_normalize_empty_input() {
        assert!(normalize("").is_empty());
        assert!(normalize("   \t\n").is_empty());
    }

    #[test]
    fn test_tokens_min_length_and_stop_words() {
        let toks = tokens(
            "The library is open to all students",
            3,
            Some(&KEYWORD_STOP_WORDS),
        );
        assert_eq!(toks, vec!["library", "open", "students"]);
    }

    #[test]
    fn test_clean_query_removes_question_scaffolding() {
        assert_eq!(clean_query("How do I apply for admission?"), "apply admission");
    }

    #[test]
    fn test_clean_query_whitespace_only() {
        assert_eq!(clean_query("   "), "");
    }

    #[test]
    fn test_stop_word_sets_differ_as_documented() {
        assert!(KEYWORD_STOP_WORDS.contains("been"));
        assert!(!SEARCH_STOP_WORDS.contains("been"));
        assert!(SEARCH_STOP_WORDS.contains("please"));
        assert!(!KEYWORD_STOP_WORDS.contains("please"));
    }
}
