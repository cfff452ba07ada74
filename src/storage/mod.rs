//! Seam to the external storage collaborator. The engine only ever needs
//! bulk knowledge fetches ordered by recency; structured lookups (staff,
//! fees, rooms, timetables) belong to the surrounding product.

pub mod memory;

pub use memory::InMemoryStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::engine::models::KnowledgeEntry;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Query failed: {0}")]
    Query(String),
}

#[derive(Debug, Clone, Default)]
pub struct KnowledgeFilter {
    /// Cap on returned entries; `None` fetches the full corpus.
    pub take: Option<usize>,
    pub kind: Option<String>,
    pub source: Option<String>,
}

impl KnowledgeFilter {
    /// The `take` most-recently-updated entries.
    pub fn recent(take: usize) -> Self {
        Self {
            take: Some(take),
            ..Self::default()
        }
    }
}

#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Entries matching `filter`, ordered by `updated_at` descending.
    async fn list_knowledge(&self, filter: KnowledgeFilter)
    -> Result<Vec<KnowledgeEntry>, StoreError>;
}
