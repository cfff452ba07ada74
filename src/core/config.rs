use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Default number of entries returned by a search.
    pub default_search_limit: usize,
    /// Upper bound on the corpus slice fetched per search (most recent first).
    pub corpus_fetch_limit: usize,

    /// Cap on the keyword set derived per entry.
    pub max_keywords_per_entry: usize,
    /// Minimum token length admitted into keyword sets and expansions.
    pub min_keyword_len: usize,

    /// Corpus-wide co-occurrence count required before a synonym edge exists.
    pub cooccurrence_threshold: usize,
    /// Jaccard similarity below which entry relations are discarded.
    pub similarity_threshold: f64,
    /// Jaccard similarity above which a relation is "similar" instead of "related".
    pub strong_similarity_threshold: f64,
    /// Cap on stored similarity neighbors per entry.
    pub max_related_per_entry: usize,

    /// Entries updated within this many days get the recency score bonus.
    pub recency_window_days: i64,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self {
            default_search_limit: crate::DEFAULT_SEARCH_LIMIT,
            corpus_fetch_limit: crate::DEFAULT_CORPUS_FETCH_LIMIT,

            max_keywords_per_entry: crate::MAX_KEYWORDS_PER_ENTRY,
            min_keyword_len: 3,

            cooccurrence_threshold: crate::COOCCURRENCE_THRESHOLD,
            similarity_threshold: 0.2,
            strong_similarity_threshold: 0.5,
            max_related_per_entry: 5,

            recency_window_days: crate::RECENCY_WINDOW_DAYS,
        }
    }

    pub fn from_env() -> Self {
        let mut config = Self::new();

        if let Ok(limit) = std::env::var("CAMPUS_SEARCH_LIMIT") {
            if let Ok(limit) = limit.parse() {
                config.default_search_limit = limit;
            }
        }
        if let Ok(limit) = std::env::var("CAMPUS_CORPUS_FETCH_LIMIT") {
            if let Ok(limit) = limit.parse() {
                config.corpus_fetch_limit = limit;
            }
        }
        if let Ok(threshold) = std::env::var("CAMPUS_COOCCURRENCE_THRESHOLD") {
            if let Ok(threshold) = threshold.parse() {
                config.cooccurrence_threshold = threshold;
            }
        }
        if let Ok(days) = std::env::var("CAMPUS_RECENCY_WINDOW_DAYS") {
            if let Ok(days) = days.parse() {
                config.recency_window_days = days;
            }
        }

        config
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::new();
        assert_eq!(config.default_search_limit, 5);
        assert_eq!(config.corpus_fetch_limit, 200);
        assert_eq!(config.max_keywords_per_entry, 15);
        assert_eq!(config.cooccurrence_threshold, 2);
        assert!(config.similarity_threshold < config.strong_similarity_threshold);
    }
}
