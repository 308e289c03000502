//! Entity records

use serde::{Deserialize, Serialize};

/// A canonical dataset/method/task/metric name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: Option<i64>,
    pub name: String,
    /// "dataset", "method", "task", or "metric"
    pub entity_type: String,
    pub aliases: Vec<String>,
}

/// Junction row linking a paper to an entity with a role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperEntityLink {
    pub paper_id: i64,
    /// Index into the batch's entity list until ids are assigned
    pub entity_index: usize,
    /// "uses", "applies", or "evaluates" for dictionary extraction
    pub role: String,
}
