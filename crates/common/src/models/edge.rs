//! Edge record and the closed edge-type vocabulary

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed vocabulary of edge types.
///
/// Core types are emitted deterministically by the build engine;
/// enrichment types are reserved for the external LLM labeler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeType {
    // Core
    Cites,
    CitedBy,
    CoCited,
    BibCoupled,
    SimilarText,
    SharedKeywords,
    SameAuthor,
    SameVenue,
    // Enrichment
    Extends,
    Improves,
    Surveys,
    Contradicts,
    UsesMethod,
    IntroducesMethod,
    UsesDataset,
    IntroducesDataset,
}

impl EdgeType {
    /// All sixteen members, in declaration order
    pub const ALL: [EdgeType; 16] = [
        EdgeType::Cites,
        EdgeType::CitedBy,
        EdgeType::CoCited,
        EdgeType::BibCoupled,
        EdgeType::SimilarText,
        EdgeType::SharedKeywords,
        EdgeType::SameAuthor,
        EdgeType::SameVenue,
        EdgeType::Extends,
        EdgeType::Improves,
        EdgeType::Surveys,
        EdgeType::Contradicts,
        EdgeType::UsesMethod,
        EdgeType::IntroducesMethod,
        EdgeType::UsesDataset,
        EdgeType::IntroducesDataset,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeType::Cites => "CITES",
            EdgeType::CitedBy => "CITED_BY",
            EdgeType::CoCited => "CO_CITED",
            EdgeType::BibCoupled => "BIB_COUPLED",
            EdgeType::SimilarText => "SIMILAR_TEXT",
            EdgeType::SharedKeywords => "SHARED_KEYWORDS",
            EdgeType::SameAuthor => "SAME_AUTHOR",
            EdgeType::SameVenue => "SAME_VENUE",
            EdgeType::Extends => "EXTENDS",
            EdgeType::Improves => "IMPROVES",
            EdgeType::Surveys => "SURVEYS",
            EdgeType::Contradicts => "CONTRADICTS",
            EdgeType::UsesMethod => "USES_METHOD",
            EdgeType::IntroducesMethod => "INTRODUCES_METHOD",
            EdgeType::UsesDataset => "USES_DATASET",
            EdgeType::IntroducesDataset => "INTRODUCES_DATASET",
        }
    }

    /// Deterministic types emitted by the engine itself
    pub fn is_core(&self) -> bool {
        matches!(
            self,
            EdgeType::Cites
                | EdgeType::CitedBy
                | EdgeType::CoCited
                | EdgeType::BibCoupled
                | EdgeType::SimilarText
                | EdgeType::SharedKeywords
                | EdgeType::SameAuthor
                | EdgeType::SameVenue
        )
    }

    /// Symmetric analytic relations stored once per unordered pair
    /// with `src < dst`
    pub fn is_symmetric(&self) -> bool {
        matches!(
            self,
            EdgeType::CoCited | EdgeType::BibCoupled | EdgeType::SimilarText
        )
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EdgeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EdgeType::ALL
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown edge type '{}'", s))
    }
}

/// A directed edge between two stored papers.
///
/// CITES edges run citer -> cited. Symmetric types are normalized to
/// `src < dst` at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub id: Option<i64>,
    pub src: i64,
    pub dst: i64,
    pub edge_type: EdgeType,
    /// Weight in [0, 1]; interpretation depends on the type
    pub weight: f64,
    /// Confidence in [0, 1]; deterministic edges carry 1.0
    pub confidence: f64,
    pub rationale: Option<String>,
    pub evidence: Option<String>,
    /// "algo" for engine-emitted edges, "llm" for labeler output
    pub created_by: String,
    pub provenance: Option<serde_json::Value>,
}

impl Edge {
    /// A traversal CITES edge with full confidence
    pub fn cites(src: i64, dst: i64, provenance: serde_json::Value) -> Self {
        Self {
            id: None,
            src,
            dst,
            edge_type: EdgeType::Cites,
            weight: 1.0,
            confidence: 1.0,
            rationale: None,
            evidence: None,
            created_by: "algo".to_string(),
            provenance: Some(provenance),
        }
    }

    /// A symmetric analytic edge; endpoints are reordered so `src < dst`
    pub fn symmetric(
        a: i64,
        b: i64,
        edge_type: EdgeType,
        weight: f64,
        confidence: f64,
        provenance: serde_json::Value,
    ) -> Self {
        debug_assert!(edge_type.is_symmetric());
        let (src, dst) = if a < b { (a, b) } else { (b, a) };
        Self {
            id: None,
            src,
            dst,
            edge_type,
            weight,
            confidence,
            rationale: None,
            evidence: None,
            created_by: "algo".to_string(),
            provenance: Some(provenance),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabulary_is_closed() {
        assert_eq!(EdgeType::ALL.len(), 16);
        let core = EdgeType::ALL.iter().filter(|t| t.is_core()).count();
        assert_eq!(core, 8);
    }

    #[test]
    fn test_roundtrip_tags() {
        for t in EdgeType::ALL {
            assert_eq!(t.as_str().parse::<EdgeType>().unwrap(), t);
        }
        assert!("FRIENDS_WITH".parse::<EdgeType>().is_err());
    }

    #[test]
    fn test_symmetric_edge_orders_endpoints() {
        let edge = Edge::symmetric(
            9,
            4,
            EdgeType::CoCited,
            0.5,
            1.0,
            serde_json::json!({"count": 2}),
        );
        assert_eq!((edge.src, edge.dst), (4, 9));
    }

    #[test]
    fn test_cites_edge_defaults() {
        let edge = Edge::cites(1, 2, serde_json::json!({"depth": 0}));
        assert_eq!(edge.weight, 1.0);
        assert_eq!(edge.confidence, 1.0);
        assert_eq!(edge.created_by, "algo");
    }
}
