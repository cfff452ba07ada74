//! Corpus learner: one pass over the whole knowledge corpus rebuilds the
//! learned pattern map, the co-occurrence synonym graph and the pairwise
//! similarity graph from scratch. No model training, no persistence; the
//! output is swapped in wholesale by the engine.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use tracing::{debug, info};

use super::keywords;
use super::models::{
    EntryRelation, KnowledgeEntry, LearnedPattern, LearningSnapshot, LearningSummary,
    RelationKind,
};
use crate::core::config::EngineConfig;

pub struct CorpusLearner {
    config: EngineConfig,
}

impl CorpusLearner {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Runs one full learning pass. Pure apart from timestamps: an
    /// unchanged corpus yields identical graphs. `previous` supplies the
    /// usage carry-forward; `generation` tags the snapshot.
    pub fn learn(
        &self,
        entries: &[KnowledgeEntry],
        previous: &HashMap<String, LearnedPattern>,
        generation: u64,
    ) -> (LearningSnapshot, HashMap<String, LearnedPattern>, LearningSummary) {
        let keyword_sets: Vec<Vec<String>> = entries
            .iter()
            .map(|e| {
                keywords::extract(
                    &e.name,
                    &e.text,
                    self.config.max_keywords_per_entry,
                    self.config.min_keyword_len,
                )
            })
            .collect();

        let patterns = self.build_patterns(entries, &keyword_sets, previous);
        let synonyms = self.build_synonym_graph(&keyword_sets);
        let related = self.build_similarity_graph(entries, &keyword_sets);

        let summary = LearningSummary {
            patterns_learned: patterns.len(),
            relationships_found: related.values().map(Vec::len).sum(),
            terms_learned: synonyms.len(),
        };

        let snapshot = LearningSnapshot {
            synonyms,
            related,
            entries: entries.iter().map(|e| (e.id.clone(), e.clone())).collect(),
            generation,
            learned_at: Some(Utc::now()),
        };

        info!(
            "Learning pass {} complete: {} patterns, {} relationships, {} synonym terms",
            generation, summary.patterns_learned, summary.relationships_found,
            summary.terms_learned
        );

        (snapshot, patterns, summary)
    }

    /// One pattern per `(type, name)` composite key; entries sharing the
    /// key merge their ids and keywords. Usage counters and accumulated
    /// related terms survive rebuilds via the previous generation.
    fn build_patterns(
        &self,
        entries: &[KnowledgeEntry],
        keyword_sets: &[Vec<String>],
        previous: &HashMap<String, LearnedPattern>,
    ) -> HashMap<String, LearnedPattern> {
        let mut patterns: HashMap<String, LearnedPattern> = HashMap::new();

        for (entry, keywords) in entries.iter().zip(keyword_sets) {
            let key = entry.pattern_key();
            let pattern = patterns.entry(key.clone()).or_insert_with(|| {
                let carried = previous.get(&key);
                LearnedPattern {
                    keywords: Vec::new(),
                    related_terms: carried.map(|p| p.related_terms.clone()).unwrap_or_default(),
                    knowledge_ids: Vec::new(),
                    usage_count: carried.map(|p| p.usage_count).unwrap_or(0),
                    last_used: carried.map(|p| p.last_used).unwrap_or_else(Utc::now),
                }
            });

            if !pattern.knowledge_ids.contains(&entry.id) {
                pattern.knowledge_ids.push(entry.id.clone());
            }
            for keyword in keywords {
                if !pattern.keywords.contains(keyword) {
                    pattern.keywords.push(keyword.clone());
                }
            }
        }

        patterns
    }

    /// Undirected co-occurrence graph over keyword-set members. The
    /// threshold is cumulative across the whole corpus, not per entry
    /// pair, so a term pair seen once in each of two entries still earns
    /// an edge at threshold 2.
    fn build_synonym_graph(&self, keyword_sets: &[Vec<String>]) -> HashMap<String, Vec<String>> {
        let mut pair_counts: HashMap<(String, String), usize> = HashMap::new();

        for keywords in keyword_sets {
            for i in 0..keywords.len() {
                for j in (i + 1)..keywords.len() {
                    if keywords[i] == keywords[j] {
                        continue;
                    }
                    let (a, b) = if keywords[i] < keywords[j] {
                        (keywords[i].clone(), keywords[j].clone())
                    } else {
                        (keywords[j].clone(), keywords[i].clone())
                    };
                    *pair_counts.entry((a, b)).or_insert(0) += 1;
                }
            }
        }

        let mut graph: HashMap<String, Vec<String>> = HashMap::new();
        for ((a, b), count) in &pair_counts {
            if *count < self.config.cooccurrence_threshold {
                continue;
            }
            // symmetric insert: one direction crossing the threshold
            // records both
            let forward = graph.entry(a.clone()).or_default();
            if !forward.contains(b) {
                forward.push(b.clone());
            }
            let backward = graph.entry(b.clone()).or_default();
            if !backward.contains(a) {
                backward.push(a.clone());
            }
        }

        // deterministic adjacency order regardless of map iteration
        for neighbors in graph.values_mut() {
            neighbors.sort();
        }

        debug!("Synonym graph: {} terms", graph.len());
        graph
    }

    /// Pairwise Jaccard over keyword sets, O(n^2) across the corpus.
    /// Neighbors below the similarity threshold are dropped, the rest
    /// sorted by strength and capped.
    fn build_similarity_graph(
        &self,
        entries: &[KnowledgeEntry],
        keyword_sets: &[Vec<String>],
    ) -> HashMap<String, Vec<EntryRelation>> {
        let sets: Vec<HashSet<&str>> = keyword_sets
            .iter()
            .map(|ks| ks.iter().map(String::as_str).collect())
            .collect();

        let mut graph: HashMap<String, Vec<EntryRelation>> = HashMap::new();

        for i in 0..entries.len() {
            let mut neighbors: Vec<EntryRelation> = Vec::new();
            for j in 0..entries.len() {
                if i == j {
                    continue;
                }
                let strength = jaccard(&sets[i], &sets[j]);
                if strength <= self.config.similarity_threshold {
                    continue;
                }
                let relationship = if strength > self.config.strong_similarity_threshold {
                    RelationKind::Similar
                } else {
                    RelationKind::Related
                };
                neighbors.push(EntryRelation {
                    target_id: entries[j].id.clone(),
                    relationship,
                    strength,
                });
            }

            neighbors.sort_by(|a, b| {
                b.strength
                    .total_cmp(&a.strength)
                    .then_with(|| a.target_id.cmp(&b.target_id))
            });
            neighbors.truncate(self.config.max_related_per_entry);

            if !neighbors.is_empty() {
                graph.insert(entries[i].id.clone(), neighbors);
            }
        }

        debug!("Similarity graph: {} entries with neighbors", graph.len());
        graph
    }
}

fn jaccard(a: &HashSet<&str>, b: &HashSet<&str>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f64 / union as f64
}
