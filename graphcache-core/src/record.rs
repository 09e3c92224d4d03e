//! Persisted record types for the cache indices.
//!
//! Three indices live in the KV store:
//!
//! - query index: `short_id(query)` → [`QueryEntry`]
//! - graph index: `short_id(graph_uri)` → [`GraphEntry`]
//! - pattern index: `graphId_sHash_pHash_oHash` → owning query ID (a bare
//!   JSON string; no record type needed)
//!
//! plus [`RelatedGroup`] records linking queries memoized in the same
//! transaction. Set-valued fields are `BTreeSet`/`BTreeMap` so records
//! serialize canonically.

use crate::error::Result;
use crate::hash;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// One memoized query: its text, its result payload, and back-references to
/// every graph and pattern record installed on its behalf.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryEntry {
    /// Original SPARQL text
    pub query: String,
    /// Opaque result payload
    pub result: Value,
    /// Graph-hash IDs this query reads from (its FROM set)
    #[serde(default)]
    pub graph_ids: BTreeSet<String>,
    /// Pattern keys installed for this query, grouped by graph ID
    #[serde(default)]
    pub triple_patterns: BTreeMap<String, BTreeSet<String>>,
    /// ID of the related group this query was committed with; empty if none
    #[serde(default)]
    pub related_group_id: String,
}

impl QueryEntry {
    /// Create a fresh entry with no index back-references yet.
    pub fn new(query: impl Into<String>, result: Value) -> Self {
        Self {
            query: query.into(),
            result,
            ..Default::default()
        }
    }

    /// All pattern keys installed for this query, across every graph.
    pub fn pattern_keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.triple_patterns
            .values()
            .flatten()
            .map(String::as_str)
    }

    /// Serialize for persistence.
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Deserialize a persisted entry.
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

/// One graph with at least one memoized query referencing it.
///
/// A graph entry with an empty `query_ids` set is never persisted; the
/// engine deletes it instead.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphEntry {
    /// Short ID of the graph URI
    pub graph_id: String,
    /// Query entry IDs referencing this graph
    #[serde(default)]
    pub query_ids: BTreeSet<String>,
}

impl GraphEntry {
    /// Create an entry for a graph with no referencing queries yet.
    pub fn new(graph_id: impl Into<String>) -> Self {
        Self {
            graph_id: graph_id.into(),
            query_ids: BTreeSet::new(),
        }
    }

    /// Serialize for persistence.
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Deserialize a persisted entry.
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

/// The set of queries memoized together within one transaction.
///
/// Content-addressed: the ID is the short ID of the canonical JSON of the
/// member set, so identical transactions produce identical groups. Groups
/// are never deleted once written; invalidating a member invalidates the
/// rest but leaves the group record behind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelatedGroup {
    /// Content-addressed group ID
    pub id: String,
    /// Query entry IDs memoized during the transaction
    pub members: BTreeSet<String>,
}

impl RelatedGroup {
    /// Form a group from a member set, deriving its content-addressed ID.
    pub fn new(members: BTreeSet<String>) -> Self {
        let id = hash::related_group_id(&members);
        Self { id, members }
    }

    /// Serialize for persistence.
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Deserialize a persisted group.
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_entry_roundtrip() {
        let mut entry = QueryEntry::new("SELECT * WHERE { ?s ?p ?o }", json!([{"s": "x"}]));
        entry.graph_ids.insert("qc-abc".to_string());
        entry
            .triple_patterns
            .entry("qc-abc".to_string())
            .or_default()
            .insert("qc-abc_*_*_*".to_string());

        let value = entry.to_value().unwrap();
        let back = QueryEntry::from_value(value).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_query_entry_defaults() {
        // Records written by an older engine may omit optional fields
        let value = json!({"query": "ASK { ?s ?p ?o }", "result": true});
        let entry = QueryEntry::from_value(value).unwrap();
        assert!(entry.graph_ids.is_empty());
        assert!(entry.triple_patterns.is_empty());
        assert_eq!(entry.related_group_id, "");
    }

    #[test]
    fn test_pattern_keys_flatten() {
        let mut entry = QueryEntry::new("q", Value::Null);
        entry
            .triple_patterns
            .entry("g1".to_string())
            .or_default()
            .insert("g1_a_*_*".to_string());
        entry
            .triple_patterns
            .entry("g2".to_string())
            .or_default()
            .insert("g2_a_*_*".to_string());
        let keys: Vec<&str> = entry.pattern_keys().collect();
        assert_eq!(keys, vec!["g1_a_*_*", "g2_a_*_*"]);
    }

    #[test]
    fn test_graph_entry_roundtrip() {
        let mut entry = GraphEntry::new("qc-graph");
        entry.query_ids.insert("qc-q1".to_string());
        let back = GraphEntry::from_value(entry.to_value().unwrap()).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_related_group_id_is_content_addressed() {
        let members: BTreeSet<String> = ["qc-q1", "qc-q2"].iter().map(|s| s.to_string()).collect();
        let a = RelatedGroup::new(members.clone());
        let b = RelatedGroup::new(members);
        assert_eq!(a.id, b.id);
        assert_eq!(a, b);
    }
}
