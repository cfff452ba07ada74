//! Query expansion against two synonym layers: a curated static table of
//! campus vocabulary and the dynamic co-occurrence graph rebuilt by each
//! learning pass. The expansion is a loose superset of the query, consumed
//! only for the small per-term scoring bonus.

use std::collections::HashMap;

use lazy_static::lazy_static;

use super::text::{self, SEARCH_STOP_WORDS};

lazy_static! {
    /// Curated domain synonyms. Lookup is bidirectional: a token matching
    /// either the key or any value pulls in the key plus all values.
    static ref STATIC_SYNONYMS: Vec<(&'static str, &'static [&'static str])> = vec![
        ("fee", &["fees", "tuition", "payment", "cost", "price", "charges", "amount"][..]),
        ("faculty", &["staff", "teacher", "professor", "lecturer", "instructor"][..]),
        ("cse", &["computer science", "cs"][..]),
        ("ece", &["electronics", "electronics and communication"][..]),
        ("eee", &["electrical", "electrical engineering"][..]),
        ("mech", &["mechanical", "mechanical engineering"][..]),
        ("civil", &["civil engineering"][..]),
        ("admission", &["apply", "application", "enrollment", "entrance"][..]),
        ("exam", &["examination", "test", "assessment", "results"][..]),
        ("timetable", &["schedule", "timings", "periods"][..]),
        ("hostel", &["accommodation", "dormitory", "lodging"][..]),
        ("library", &["books", "reading room"][..]),
        ("scholarship", &["financial aid", "stipend", "waiver"][..]),
        ("event", &["events", "fest", "seminar", "workshop"][..]),
        ("room", &["hall", "venue", "classroom"][..]),
    ];
}

/// Static synonyms for one lowercase token, both directions.
pub fn static_synonyms(token: &str) -> Vec<String> {
    let mut out = Vec::new();
    for (key, values) in STATIC_SYNONYMS.iter() {
        if *key == token || values.contains(&token) {
            push_unique(&mut out, (*key).to_string());
            for value in values.iter() {
                push_unique(&mut out, (*value).to_string());
            }
        }
    }
    out
}

/// Expands a query into a deduplicated term set: the whole lowercased query
/// first, then for every token (length > 2, not a search stop word) the
/// token itself, its static synonyms and its learned co-occurrence
/// neighbors.
pub fn expand_query(query: &str, graph: &HashMap<String, Vec<String>>) -> Vec<String> {
    let mut expanded = Vec::new();

    let lowered = query.trim().to_lowercase();
    if lowered.is_empty() {
        return expanded;
    }
    expanded.push(lowered.clone());

    for token in text::tokens(&lowered, 3, Some(&SEARCH_STOP_WORDS)) {
        for synonym in static_synonyms(&token) {
            push_unique(&mut expanded, synonym);
        }
        if let Some(learned) = graph.get(&token) {
            for synonym in learned {
                push_unique(&mut expanded, synonym.clone());
            }
        }
        push_unique(&mut expanded, token);
    }

    expanded
}

fn push_unique(terms: &mut Vec<String>, term: String) {
    if !terms.contains(&term) {
        terms.push(term);
    }
}
