use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{KnowledgeFilter, KnowledgeStore, StoreError};
use crate::engine::models::KnowledgeEntry;

/// Process-local knowledge store. The production deployment talks to a real
/// database behind the same trait; this implementation backs tests and
/// embedded setups.
#[derive(Default)]
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, KnowledgeEntry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<KnowledgeEntry>) -> Self {
        let store = Self::new();
        for entry in entries {
            store.upsert(entry);
        }
        store
    }

    /// Inserts or replaces an entry; mints an id when the entry has none.
    /// Returns the id under which the entry was stored.
    pub fn upsert(&self, mut entry: KnowledgeEntry) -> String {
        if entry.id.is_empty() {
            entry.id = Uuid::new_v4().to_string();
        }
        let id = entry.id.clone();
        self.entries.write().insert(id.clone(), entry);
        debug!("Stored knowledge entry {}", id);
        id
    }

    pub fn remove(&self, id: &str) -> Option<KnowledgeEntry> {
        self.entries.write().remove(id)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl KnowledgeStore for InMemoryStore {
    async fn list_knowledge(
        &self,
        filter: KnowledgeFilter,
    ) -> Result<Vec<KnowledgeEntry>, StoreError> {
        let mut entries: Vec<KnowledgeEntry> = {
            let guard = self.entries.read();
            guard
                .values()
                .filter(|e| {
                    filter
                        .kind
                        .as_deref()
                        .is_none_or(|k| e.kind.eq_ignore_ascii_case(k))
                })
                .filter(|e| {
                    filter
                        .source
                        .as_deref()
                        .is_none_or(|s| e.source.eq_ignore_ascii_case(s))
                })
                .cloned()
                .collect()
        };

        entries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        if let Some(take) = filter.take {
            entries.truncate(take);
        }

        Ok(entries)
    }
}
