//! The `KnowledgeEngine` façade: query expansion, corpus scoring, ranked
//! retrieval with learned-pattern and recency fallbacks, similarity
//! backfill, and lazy single-flight initialization of the learned state.

pub mod intent;
pub mod keywords;
pub mod learning;
pub mod models;
pub mod scoring;
pub mod synonyms;
pub mod text;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::core::config::EngineConfig;
use crate::core::error::Result;
use crate::storage::{KnowledgeFilter, KnowledgeStore};
use crate::utils::safe_truncate_ellipsis;
use self::intent::Intent;
use self::learning::CorpusLearner;
use self::models::{
    EntryRelation, KnowledgeEntry, LearnedPattern, LearningSnapshot, LearningSummary,
};

/// Lifecycle of the lazily initialized learned state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InitPhase {
    Uninitialized,
    Initializing,
    Ready,
}

pub struct KnowledgeEngine {
    config: EngineConfig,
    store: Arc<dyn KnowledgeStore>,
    learner: CorpusLearner,

    /// Output of the latest learning pass, replaced wholesale so readers
    /// never observe graphs from different generations.
    snapshot: RwLock<Arc<LearningSnapshot>>,
    /// Live usage-pattern map; retrievals mutate it between passes.
    /// Lost-update races on the counters are acceptable.
    patterns: Mutex<HashMap<String, LearnedPattern>>,

    /// Single-flight guard for the first learning pass. Failure leaves the
    /// phase at `Uninitialized` so a later caller retries.
    init: tokio::sync::Mutex<InitPhase>,
    ready: AtomicBool,
    generation: AtomicU64,
}

impl KnowledgeEngine {
    pub fn new(store: Arc<dyn KnowledgeStore>, config: EngineConfig) -> Self {
        info!("KnowledgeEngine initialized");
        Self {
            learner: CorpusLearner::new(config.clone()),
            config,
            store,
            snapshot: RwLock::new(Arc::new(LearningSnapshot::empty())),
            patterns: Mutex::new(HashMap::new()),
            init: tokio::sync::Mutex::new(InitPhase::Uninitialized),
            ready: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    pub fn with_defaults(store: Arc<dyn KnowledgeStore>) -> Self {
        Self::new(store, EngineConfig::new())
    }

    /// Classifies an utterance; see [`intent::classify`].
    pub fn classify_intent(&self, utterance: &str) -> Intent {
        intent::classify(utterance)
    }

    /// Ranked knowledge retrieval. Storage failures on the corpus fetch
    /// propagate; everything past the fetch is in-memory and infallible.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<KnowledgeEntry>> {
        self.ensure_ready().await;

        if query.trim().is_empty() {
            return self.recent_entries(limit).await;
        }

        let cleaned = text::clean_query(query);
        if cleaned.is_empty() {
            return self.recent_entries(limit).await;
        }

        let corpus = self
            .store
            .list_knowledge(KnowledgeFilter::recent(self.config.corpus_fetch_limit))
            .await?;

        let query_words: Vec<String> = cleaned
            .split_whitespace()
            .filter(|w| w.chars().count() > 2)
            .map(str::to_string)
            .collect();

        let snapshot = self.snapshot.read().await.clone();
        let expanded = synonyms::expand_query(query, &snapshot.synonyms);
        // word patterns compile once here, not per corpus entry
        let terms = scoring::QueryTerms::new(&query_words, &expanded);

        let now = Utc::now();
        let mut scored: Vec<(f64, &KnowledgeEntry)> = corpus
            .iter()
            .map(|entry| {
                (
                    scoring::score(entry, &terms, now, self.config.recency_window_days),
                    entry,
                )
            })
            .filter(|(score, _)| *score > 0.0)
            .collect();

        scored.sort_by(|a, b| {
            b.0.total_cmp(&a.0)
                .then_with(|| b.1.updated_at.cmp(&a.1.updated_at))
        });

        let mut results: Vec<KnowledgeEntry> = scored
            .iter()
            .take(limit)
            .map(|(_, entry)| (*entry).clone())
            .collect();

        if results.is_empty() {
            results = self.pattern_fallback(query, &corpus, &snapshot, limit);
            if results.is_empty() {
                // corpus is already ordered by recency
                results = corpus.iter().take(limit).cloned().collect();
                debug!("No scored or pattern hits, falling back to recency");
            }
        } else {
            self.record_hits(&results, query, now);
        }

        if results.len() < limit {
            self.backfill_related(&mut results, &corpus, &snapshot, limit);
        }
        results.truncate(limit);

        info!(
            "Search '{}' returned {} entries",
            safe_truncate_ellipsis(query, 50),
            results.len()
        );
        Ok(results)
    }

    /// [`Self::search`] with the configured default result limit.
    pub async fn search_default(&self, query: &str) -> Result<Vec<KnowledgeEntry>> {
        self.search(query, self.config.default_search_limit).await
    }

    /// Full learning pass over the store's corpus. Storage failures are
    /// swallowed: background learning is best effort and must not crash
    /// the triggering context.
    pub async fn relearn(&self) -> Option<LearningSummary> {
        match self.relearn_from_store().await {
            Ok(summary) => summary,
            Err(e) => {
                warn!("Learning pass skipped: {}", e);
                None
            }
        }
    }

    /// Reinforces the pattern behind one entry after an independently
    /// confirmed relevant retrieval.
    pub async fn record_usage(&self, entry_id: &str, query: &str) {
        let snapshot = self.snapshot.read().await.clone();
        let Some(entry) = snapshot.entries.get(entry_id) else {
            debug!("record_usage: unknown entry {}", entry_id);
            return;
        };
        self.record_pattern_use(&entry.pattern_key(), query, Utc::now());
    }

    /// Similarity-graph neighbors of one entry, strongest first.
    pub async fn related_entries(&self, entry_id: &str) -> Vec<EntryRelation> {
        let snapshot = self.snapshot.read().await;
        snapshot.related.get(entry_id).cloned().unwrap_or_default()
    }

    pub async fn stats(&self) -> EngineStats {
        let snapshot = self.snapshot.read().await;
        EngineStats {
            patterns: self.patterns.lock().len(),
            synonym_terms: snapshot.synonyms.len(),
            related_entries: snapshot.related.len(),
            generation: snapshot.generation,
            learned_at: snapshot.learned_at,
            ready: self.ready.load(Ordering::Acquire),
        }
    }

    /// First caller triggers the initial learning pass; concurrent callers
    /// await the same pass behind the init mutex. A failed pass leaves the
    /// engine uninitialized for a later retry instead of wedging it.
    async fn ensure_ready(&self) {
        if self.ready.load(Ordering::Acquire) {
            return;
        }

        let mut phase = self.init.lock().await;
        if *phase == InitPhase::Ready {
            return;
        }

        *phase = InitPhase::Initializing;
        match self.relearn_from_store().await {
            Ok(_) => {
                *phase = InitPhase::Ready;
                self.ready.store(true, Ordering::Release);
            }
            Err(e) => {
                *phase = InitPhase::Uninitialized;
                warn!("Initial learning pass failed, will retry: {}", e);
            }
        }
    }

    async fn relearn_from_store(&self) -> Result<Option<LearningSummary>> {
        let entries = self.store.list_knowledge(KnowledgeFilter::default()).await?;
        if entries.is_empty() {
            info!("Nothing to learn from, knowledge corpus is empty");
            return Ok(None);
        }

        let previous = self.patterns.lock().clone();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let (snapshot, patterns, summary) = self.learner.learn(&entries, &previous, generation);

        {
            let mut current = self.snapshot.write().await;
            *current = Arc::new(snapshot);
        }
        *self.patterns.lock() = patterns;

        Ok(Some(summary))
    }

    async fn recent_entries(&self, limit: usize) -> Result<Vec<KnowledgeEntry>> {
        debug!("Empty query, returning {} most recent entries", limit);
        Ok(self
            .store
            .list_knowledge(KnowledgeFilter::recent(limit))
            .await?)
    }

    /// Zero-hit fallback: learned patterns whose keywords or accumulated
    /// related terms fuzzy-match (substring either direction) any token of
    /// the original, uncleaned query.
    fn pattern_fallback(
        &self,
        raw_query: &str,
        corpus: &[KnowledgeEntry],
        snapshot: &LearningSnapshot,
        limit: usize,
    ) -> Vec<KnowledgeEntry> {
        let tokens = text::normalize(raw_query);
        if tokens.is_empty() {
            return Vec::new();
        }

        let by_id: HashMap<&str, &KnowledgeEntry> =
            corpus.iter().map(|e| (e.id.as_str(), e)).collect();

        let mut results: Vec<KnowledgeEntry> = Vec::new();
        let patterns = self.patterns.lock();
        for pattern in patterns.values() {
            let matches = tokens.iter().any(|token| {
                pattern
                    .keywords
                    .iter()
                    .chain(pattern.related_terms.iter())
                    .any(|term| term.contains(token.as_str()) || token.contains(term.as_str()))
            });
            if !matches {
                continue;
            }

            for id in &pattern.knowledge_ids {
                if results.len() >= limit {
                    break;
                }
                if results.iter().any(|e| e.id == *id) {
                    continue;
                }
                let found = by_id
                    .get(id.as_str())
                    .copied()
                    .or_else(|| snapshot.entries.get(id.as_str()));
                if let Some(entry) = found {
                    results.push(entry.clone());
                }
            }
            if results.len() >= limit {
                break;
            }
        }

        if !results.is_empty() {
            debug!("Pattern fallback produced {} entries", results.len());
        }
        results
    }

    fn record_hits(&self, results: &[KnowledgeEntry], query: &str, now: DateTime<Utc>) {
        for entry in results {
            self.record_pattern_use(&entry.pattern_key(), query, now);
        }
    }

    fn record_pattern_use(&self, pattern_key: &str, query: &str, now: DateTime<Utc>) {
        let mut patterns = self.patterns.lock();
        let Some(pattern) = patterns.get_mut(pattern_key) else {
            return;
        };

        pattern.usage_count += 1;
        pattern.last_used = now;
        for token in text::tokens(query, 3, None) {
            if !pattern.related_terms.contains(&token) {
                pattern.related_terms.push(token);
            }
        }
    }

    /// Tops up a short result list with the similarity neighbors of the
    /// top-ranked hit.
    fn backfill_related(
        &self,
        results: &mut Vec<KnowledgeEntry>,
        corpus: &[KnowledgeEntry],
        snapshot: &LearningSnapshot,
        limit: usize,
    ) {
        let Some(top) = results.first() else {
            return;
        };
        let Some(neighbors) = snapshot.related.get(&top.id) else {
            return;
        };

        let by_id: HashMap<&str, &KnowledgeEntry> =
            corpus.iter().map(|e| (e.id.as_str(), e)).collect();

        for relation in neighbors {
            if results.len() >= limit {
                break;
            }
            if results.iter().any(|e| e.id == relation.target_id) {
                continue;
            }
            let found = by_id
                .get(relation.target_id.as_str())
                .copied()
                .or_else(|| snapshot.entries.get(relation.target_id.as_str()));
            if let Some(entry) = found {
                debug!(
                    "Backfilling {} ({} to top hit, strength {:.2})",
                    entry.id, relation.relationship, relation.strength
                );
                results.push(entry.clone());
            }
        }
    }
}

impl std::fmt::Debug for KnowledgeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeEngine")
            .field("ready", &self.ready.load(Ordering::Acquire))
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .finish()
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct EngineStats {
    pub patterns: usize,
    pub synonym_terms: usize,
    pub related_entries: usize,
    pub generation: u64,
    pub learned_at: Option<DateTime<Utc>>,
    pub ready: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{InMemoryStore, StoreError};
    use async_trait::async_trait;
    use chrono::Duration;
    use std::sync::atomic::AtomicUsize;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("campus_brain=debug")
            .with_test_writer()
            .try_init();
    }

    fn entry(id: &str, name: &str, text: &str, days_ago: i64) -> KnowledgeEntry {
        KnowledgeEntry::new(id, name, text)
            .with_kind("FAQ")
            .with_source("Student Handbook")
            .with_updated_at(Utc::now() - Duration::days(days_ago))
    }

    fn engine_with(entries: Vec<KnowledgeEntry>) -> KnowledgeEngine {
        init_tracing();
        let store = Arc::new(InMemoryStore::with_entries(entries));
        KnowledgeEngine::with_defaults(store)
    }

    #[tokio::test]
    async fn test_search_ranks_matching_entry_first() {
        let engine = engine_with(vec![
            entry(
                "adm",
                "Admission Process",
                "Admission starts in June. Apply online.",
                1,
            ),
            entry("lib", "Library Hours", "Open 8am to 8pm on weekdays", 2),
        ]);

        let results = engine
            .search("how do I apply for admission", 5)
            .await
            .expect("search succeeds");
        assert_eq!(results[0].id, "adm");

        // the successful retrieval reinforced the pattern
        let snapshot_key = results[0].pattern_key();
        let usage = engine.patterns.lock()[&snapshot_key].usage_count;
        assert_eq!(usage, 1);
        assert!(
            engine.patterns.lock()[&snapshot_key]
                .related_terms
                .contains(&"admission".to_string())
        );
    }

    #[tokio::test]
    async fn test_whitespace_query_returns_recency_order() {
        let engine = engine_with(vec![
            entry("old", "Old Notice", "archived content", 40),
            entry("new", "New Notice", "fresh content", 0),
            entry("mid", "Mid Notice", "recent content", 10),
        ]);

        let results = engine.search("   ", 2).await.expect("search succeeds");
        let ids: Vec<&str> = results.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid"]);
    }

    #[tokio::test]
    async fn test_search_default_uses_configured_limit() {
        init_tracing();
        let mut config = EngineConfig::new();
        config.default_search_limit = 2;
        let store = Arc::new(InMemoryStore::with_entries(vec![
            entry("a", "Notice One", "first notice", 0),
            entry("b", "Notice Two", "second notice", 1),
            entry("c", "Notice Three", "third notice", 2),
        ]));
        let engine = KnowledgeEngine::new(store, config);

        let results = engine.search_default("notice").await.expect("search succeeds");
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_pattern_fallback_rescues_zero_score_query() {
        let engine = engine_with(vec![entry(
            "adm",
            "Admission Process",
            "admission starts in june apply online",
            40,
        )]);

        // "admissions" never appears verbatim and the entry is too old for
        // a recency score, so the scored pass comes up empty; the learned
        // keyword "admission" still substring-matches the query token
        let results = engine.search("admissions", 5).await.expect("search succeeds");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "adm");

        // fallback hits do not reinforce usage
        {
            let patterns = engine.patterns.lock();
            assert_eq!(patterns["faq::admission process"].usage_count, 0);
        }

        // accumulated related terms feed the same fallback
        engine.record_usage("adm", "jee counselling").await;
        let results = engine.search("counselling", 5).await.expect("search succeeds");
        assert_eq!(results[0].id, "adm");
    }

    #[tokio::test]
    async fn test_concurrent_first_searches_share_one_learning_pass() {
        init_tracing();
        let store = Arc::new(InMemoryStore::with_entries(vec![entry(
            "adm",
            "Admission Process",
            "admission starts in june apply online",
            1,
        )]));
        let engine = Arc::new(KnowledgeEngine::with_defaults(store));

        let first = tokio::spawn({
            let engine = engine.clone();
            async move { engine.search("admission", 5).await }
        });
        let second = tokio::spawn({
            let engine = engine.clone();
            async move { engine.search("admission", 5).await }
        });

        assert_eq!(first.await.expect("join").expect("search")[0].id, "adm");
        assert_eq!(second.await.expect("join").expect("search")[0].id, "adm");

        let stats = engine.stats().await;
        assert!(stats.ready);
        assert_eq!(stats.generation, 1, "initial learning pass ran exactly once");
    }

    #[tokio::test]
    async fn test_backfill_adds_similarity_neighbors_without_duplicates() {
        // two library entries share keywords, so they relate to each other;
        // the stale ones sit outside the recency window and only "lib"
        // scores against the query
        let engine = engine_with(vec![
            entry(
                "lib",
                "Library Hours",
                "library hours library weekday reading reading",
                1,
            ),
            entry(
                "lib2",
                "Library Fines",
                "library fines library overdue reading reading",
                40,
            ),
            entry("adm", "Admission Process", "admission starts in june", 40),
        ]);

        let results = engine
            .search("weekday timings", 3)
            .await
            .expect("search succeeds");

        assert_eq!(results[0].id, "lib");
        let ids: Vec<&str> = results.iter().map(|e| e.id.as_str()).collect();
        assert!(ids.contains(&"lib2"), "neighbor backfilled into {ids:?}");
        assert!(!ids.contains(&"adm"), "unrelated entry stays out of {ids:?}");
        let unique: std::collections::HashSet<&&str> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len(), "no duplicates in {ids:?}");
        assert!(results.len() <= 3);
    }

    #[tokio::test]
    async fn test_empty_corpus_degrades_gracefully() {
        let engine = engine_with(Vec::new());
        assert!(engine.relearn().await.is_none());
        let results = engine.search("anything at all", 5).await.expect("search");
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_relearn_summary_counts() {
        let engine = engine_with(vec![
            entry("a", "Library Hours", "library hours library reading reading", 1),
            entry("b", "Library Fines", "library fines library reading reading", 2),
        ]);

        let summary = engine.relearn().await.expect("summary");
        assert_eq!(summary.patterns_learned, 2);
        assert!(summary.relationships_found > 0);
        assert!(summary.terms_learned > 0);

        let stats = engine.stats().await;
        assert_eq!(stats.patterns, 2);
        assert_eq!(stats.generation, 1);
    }

    #[tokio::test]
    async fn test_record_usage_standalone() {
        let engine = engine_with(vec![entry(
            "adm",
            "Admission Process",
            "admission starts in june apply online",
            1,
        )]);
        engine.relearn().await.expect("learn");

        engine.record_usage("adm", "june intake dates").await;
        let key = "faq::admission process".to_string();
        let patterns = engine.patterns.lock();
        assert_eq!(patterns[&key].usage_count, 1);
        assert!(patterns[&key].related_terms.contains(&"june".to_string()));
    }

    struct FlakyStore {
        inner: InMemoryStore,
        failures_left: AtomicUsize,
    }

    #[async_trait]
    impl KnowledgeStore for FlakyStore {
        async fn list_knowledge(
            &self,
            filter: KnowledgeFilter,
        ) -> std::result::Result<Vec<KnowledgeEntry>, StoreError> {
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(StoreError::Unavailable("database down".to_string()));
            }
            self.inner.list_knowledge(filter).await
        }
    }

    #[tokio::test]
    async fn test_storage_failure_propagates_from_search() {
        init_tracing();
        let store = Arc::new(FlakyStore {
            inner: InMemoryStore::new(),
            failures_left: AtomicUsize::new(usize::MAX),
        });
        let engine = KnowledgeEngine::with_defaults(store);

        let err = engine.search("fees", 5).await.expect_err("must fail");
        assert!(matches!(err, crate::core::error::EngineError::Storage(_)));

        // relearn swallows the same failure
        assert!(engine.relearn().await.is_none());
    }

    #[tokio::test]
    async fn test_failed_init_retries_on_next_call() {
        init_tracing();
        let inner = InMemoryStore::new();
        inner.upsert(entry("adm", "Admission Process", "admission apply online", 1));
        let store = Arc::new(FlakyStore {
            inner,
            failures_left: AtomicUsize::new(2),
        });
        let engine = KnowledgeEngine::with_defaults(store);

        // first two fetches fail: init pass and the search's own fetch
        assert!(engine.search("admission", 5).await.is_err());
        assert!(!engine.stats().await.ready);

        // next call retries initialization and succeeds
        let results = engine.search("admission", 5).await.expect("retry works");
        assert_eq!(results[0].id, "adm");
        assert!(engine.stats().await.ready);
    }
}
