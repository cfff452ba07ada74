use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

/// One admin-authored free-text record in the knowledge base. Immutable from
/// the engine's point of view; the CRUD layer retriggers learning on change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub id: String,
    #[serde(default)]
    pub source: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub text: String,

    /// Attached visual, inert to retrieval, carried through unchanged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_description: Option<String>,

    pub updated_at: DateTime<Utc>,
}

impl KnowledgeEntry {
    pub fn new(id: &str, name: &str, text: &str) -> Self {
        Self {
            id: id.to_string(),
            source: String::new(),
            kind: String::new(),
            name: name.to_string(),
            text: text.to_string(),
            image_url: None,
            image_description: None,
            updated_at: Utc::now(),
        }
    }

    pub fn with_kind(mut self, kind: &str) -> Self {
        self.kind = kind.to_string();
        self
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.source = source.to_string();
        self
    }

    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = updated_at;
        self
    }

    /// Composite key grouping entries into one learned pattern.
    pub fn pattern_key(&self) -> String {
        format!("{}::{}", self.kind.to_lowercase(), self.name.to_lowercase())
    }
}

/// Aggregated usage and keyword record per `(type, name)` group, reinforced
/// every time a retrieval matches one of its entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnedPattern {
    pub keywords: Vec<String>,
    /// Query terms that successfully matched this pattern, accumulated
    /// across learning generations.
    pub related_terms: Vec<String>,
    pub knowledge_ids: Vec<String>,
    pub usage_count: u64,
    pub last_used: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RelationKind {
    Similar,
    Related,
}

/// One edge of the similarity graph, from an implicit source entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryRelation {
    pub target_id: String,
    pub relationship: RelationKind,
    pub strength: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningSummary {
    pub patterns_learned: usize,
    pub relationships_found: usize,
    pub terms_learned: usize,
}

/// Immutable output of one learning pass. Swapped in wholesale so readers
/// never pair a synonym graph with a similarity graph from another
/// generation. The live pattern map is kept separately because retrievals
/// mutate it between passes.
#[derive(Debug, Clone, Default)]
pub struct LearningSnapshot {
    /// Dynamic synonym graph: lowercase term -> co-occurring terms.
    pub synonyms: HashMap<String, Vec<String>>,
    /// Similarity graph: entry id -> strongest neighbors, capped.
    pub related: HashMap<String, Vec<EntryRelation>>,
    /// The corpus the graphs were built from, keyed by entry id.
    pub entries: HashMap<String, KnowledgeEntry>,
    pub generation: u64,
    pub learned_at: Option<DateTime<Utc>>,
}

impl LearningSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_serializes_kind_as_type() {
        let entry = KnowledgeEntry::new("k1", "Library Hours", "Open 8am to 8pm")
            .with_kind("FAQ")
            .with_source("Student Handbook");

        let json = serde_json::to_value(&entry).expect("serializes");
        assert_eq!(json["type"], "FAQ");
        assert!(json.get("kind").is_none());
        assert!(json.get("image_url").is_none());
    }

    #[test]
    fn test_pattern_key_is_case_insensitive() {
        let a = KnowledgeEntry::new("1", "Library Hours", "x").with_kind("FAQ");
        let b = KnowledgeEntry::new("2", "LIBRARY HOURS", "y").with_kind("faq");
        assert_eq!(a.pattern_key(), b.pattern_key());
    }

    #[test]
    fn test_relation_kind_display() {
        assert_eq!(RelationKind::Similar.to_string(), "similar");
        assert_eq!(RelationKind::Related.to_string(), "related");
    }
}
