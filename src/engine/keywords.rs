//! Per-entry keyword extraction: frequency counting over the normalized
//! name + body, boosted by membership in the entry's name.

use std::collections::{HashMap, HashSet};

use super::text::{self, KEYWORD_STOP_WORDS};

/// Derives the ranked keyword set for one entry. A token qualifies when it
/// is at least `min_len` chars, occurs at least twice in the combined
/// name + text, or is itself a token of the name. Ranked by frequency
/// descending, stable on ties in first-seen order, capped at
/// `max_keywords`. Pure and deterministic; empty inputs yield an empty
/// set.
pub fn extract(name: &str, text: &str, max_keywords: usize, min_len: usize) -> Vec<String> {
    let combined = format!("{} {}", name, text);
    let tokens = text::tokens(&combined, min_len, Some(&KEYWORD_STOP_WORDS));

    let mut seen_order: Vec<String> = Vec::new();
    let mut freq: HashMap<String, usize> = HashMap::new();
    for token in tokens {
        if !freq.contains_key(&token) {
            seen_order.push(token.clone());
        }
        *freq.entry(token).or_insert(0) += 1;
    }

    // name tokens skip stop-word filtering on purpose: a name like
    // "About The Campus" still contributes "about" and "the" is too short
    // to matter either way
    let name_tokens: HashSet<String> = text::tokens(name, min_len, None)
        .into_iter()
        .collect();

    let mut selected: Vec<(String, usize)> = seen_order
        .into_iter()
        .filter_map(|token| {
            let count = freq[&token];
            if count >= 2 || name_tokens.contains(&token) {
                Some((token, count))
            } else {
                None
            }
        })
        .collect();

    // sort_by is stable, so ties keep discovery order
    selected.sort_by(|a, b| b.1.cmp(&a.1));
    selected.truncate(max_keywords);
    selected.into_iter().map(|(token, _)| token).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_and_frequency_both_qualify() {
        let keywords = extract(
            "Library Hours",
            "The library hours are 8am to 8pm library library",
            15,
            3,
        );
        assert!(keywords.contains(&"library".to_string()));
        assert!(keywords.contains(&"hours".to_string()));
        assert!(keywords.len() <= 15);
    }

    #[test]
    fn test_frequency_ranking() {
        let keywords = extract(
            "Hostel",
            "mess mess mess wifi wifi curfew curfew curfew curfew",
            15,
            3,
        );
        assert_eq!(keywords[0], "curfew");
        assert_eq!(keywords[1], "mess");
    }

    #[test]
    fn test_singleton_non_name_tokens_dropped() {
        // none of the body words repeat or appear in the name
        let keywords = extract("Fees", "tuition is payable online once", 15, 3);
        assert_eq!(keywords, vec!["fees"]);
    }

    #[test]
    fn test_cap_respected() {
        let body: String = (0..40)
            .map(|i| format!("word{i} word{i}"))
            .collect::<Vec<_>>()
            .join(" ");
        let keywords = extract("Everything", &body, 15, 3);
        assert_eq!(keywords.len(), 15);
    }

    #[test]
    fn test_missing_fields_do_not_panic() {
        assert!(extract("", "", 15, 3).is_empty());
        assert!(!extract("Admission", "", 15, 3).is_empty());
    }

    #[test]
    fn test_deterministic() {
        let a = extract("Exam Cell", "revaluation forms revaluation hall tickets hall", 15, 3);
        let b = extract("Exam Cell", "revaluation forms revaluation hall tickets hall", 15, 3);
        assert_eq!(a, b);
    }

    #[test]
    fn test_min_len_filters_short_tokens() {
        // "bus" repeats and sits in the name, but falls under the floor
        let keywords = extract("Bus Pass", "bus pass forms bus", 15, 4);
        assert!(!keywords.contains(&"bus".to_string()));
        assert!(keywords.contains(&"pass".to_string()));
    }
}
