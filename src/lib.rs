//! Knowledge retrieval and adaptive learning engine for a campus
//! information assistant. The engine classifies utterances into intents,
//! searches a free-text knowledge corpus with synonym expansion, and
//! mines the corpus itself for synonym and similarity relationships.

pub mod core;
pub mod engine;
pub mod storage;
pub mod utils;

pub use utils::{safe_truncate, safe_truncate_ellipsis};

pub use crate::core::config::EngineConfig;
pub use crate::core::error::{EngineError, Result};
pub use engine::intent::{Intent, classify};
pub use engine::models::{EntryRelation, KnowledgeEntry, LearningSummary, RelationKind};
pub use engine::{EngineStats, KnowledgeEngine};
pub use storage::{InMemoryStore, KnowledgeFilter, KnowledgeStore, StoreError};

pub const DEFAULT_SEARCH_LIMIT: usize = 5;

pub const DEFAULT_CORPUS_FETCH_LIMIT: usize = 200;

pub const MAX_KEYWORDS_PER_ENTRY: usize = 15;

pub const COOCCURRENCE_THRESHOLD: usize = 2;

pub const RECENCY_WINDOW_DAYS: i64 = 30;
