//! Deterministic additive relevance scoring. Every weight here is
//! observable behavior; tests pin the bonuses individually.

use chrono::{DateTime, Duration, Utc};
use regex::Regex;

use super::models::KnowledgeEntry;

const PHRASE_BONUS: f64 = 50.0;
const NAME_BONUS: f64 = 10.0;
const TEXT_MATCH_WEIGHT: f64 = 3.0;
const SOURCE_KIND_BONUS: f64 = 2.0;
const EXPANDED_TERM_BONUS: f64 = 1.0;
const RECENCY_BONUS: f64 = 5.0;
const COVERAGE_BONUS: f64 = 10.0;
const COVERAGE_FLOOR: f64 = 0.5;

/// One query, prepared for scoring a whole corpus slice: the cleaned query
/// words with their whole-word patterns compiled once, plus the loose
/// expanded term set. Scoring hundreds of entries reuses these patterns
/// instead of recompiling per entry.
pub struct QueryTerms {
    words: Vec<QueryWord>,
    expanded: Vec<String>,
}

struct QueryWord {
    word: String,
    whole_word: Option<Regex>,
}

impl QueryTerms {
    pub fn new(query_words: &[String], expanded_terms: &[String]) -> Self {
        let words = query_words
            .iter()
            .map(|word| QueryWord {
                word: word.clone(),
                whole_word: Regex::new(&format!(r"\b{}\b", regex::escape(word))).ok(),
            })
            .collect();

        Self {
            words,
            expanded: expanded_terms.to_vec(),
        }
    }
}

/// Scores one entry against a prepared query. The words are the cleaned
/// query tokens (length > 2); the expansion is the loose synonym superset.
/// Always >= 0; ranking ties are broken by `updated_at` outside.
pub fn score(
    entry: &KnowledgeEntry,
    terms: &QueryTerms,
    now: DateTime<Utc>,
    recency_window_days: i64,
) -> f64 {
    let name = entry.name.to_lowercase();
    let text = entry.text.to_lowercase();
    let source = entry.source.to_lowercase();
    let kind = entry.kind.to_lowercase();
    let haystack = format!("{} {} {} {}", name, text, source, kind);

    let mut score = 0.0;

    // exact phrase hit, evaluated once for the whole query
    let phrase = terms
        .words
        .iter()
        .map(|w| w.word.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    if !phrase.is_empty() && haystack.contains(&phrase) {
        score += PHRASE_BONUS;
    }

    let mut matched_words = 0usize;
    for query_word in terms.words.iter().filter(|w| w.word.chars().count() >= 2) {
        let word = query_word.word.as_str();
        let mut hit = false;

        if name.contains(word) {
            score += NAME_BONUS;
            hit = true;
        }

        if let Some(whole_word) = &query_word.whole_word {
            let occurrences = whole_word.find_iter(&text).count();
            if occurrences > 0 {
                score += TEXT_MATCH_WEIGHT * occurrences as f64;
                hit = true;
            }
        }

        if source.contains(word) || kind.contains(word) {
            score += SOURCE_KIND_BONUS;
        }

        if hit {
            matched_words += 1;
        }
    }

    for term in terms.expanded.iter().filter(|t| t.chars().count() >= 2) {
        if haystack.contains(term.as_str()) {
            score += EXPANDED_TERM_BONUS;
        }
    }

    if now.signed_duration_since(entry.updated_at) <= Duration::days(recency_window_days) {
        score += RECENCY_BONUS;
    }

    if !terms.words.is_empty()
        && matched_words as f64 / terms.words.len() as f64 >= COVERAGE_FLOOR
    {
        score += COVERAGE_BONUS;
    }

    score
}
