//! Run record

use serde::{Deserialize, Serialize};

/// One row per build invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: Option<i64>,
    /// ISO-8601 wall-clock start time
    pub started_at: String,
    /// Tool version that produced the run
    pub version: String,
    /// JSON snapshot of the effective configuration (secrets omitted)
    pub config: serde_json::Value,
    pub source: String,
    pub spine: String,
    pub depth: usize,
    /// JSON snapshot of the final store stats
    pub stats: serde_json::Value,
}
