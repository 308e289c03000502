//! Cluster record

use serde::{Deserialize, Serialize};

/// A group of papers produced by community detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    pub id: Option<i64>,
    /// Method tag, e.g. "louvain_citation"
    pub method: String,
    /// Top-terms label, or "Cluster <community_id>" when terms are empty
    pub name: Option<String>,
    pub description: Option<String>,
    /// Stats blob: member count and the underlying community id
    pub stats: serde_json::Value,
    /// Member paper ids, persisted through the paper_clusters junction
    pub members: Vec<i64>,
}

impl Cluster {
    pub fn new(method: &str, community_id: i64, name: Option<String>, members: Vec<i64>) -> Self {
        let stats = serde_json::json!({
            "community_id": community_id,
            "member_count": members.len(),
        });
        Self {
            id: None,
            method: method.to_string(),
            name,
            description: None,
            stats,
            members,
        }
    }
}
