//! End-to-end build scenarios against a scripted in-process adapter.
//! No network: the mock resolves topic searches and reference fetches
//! from a fixed citation graph.

use async_trait::async_trait;
use papergraph_common::config::{AppConfig, Spine};
use papergraph_common::errors::Result;
use papergraph_common::http::Transport;
use papergraph_common::models::{EdgeType, Paper};
use papergraph_common::store::Store;
use papergraph_engine::builder::{BuildRequest, GraphBuilder};
use papergraph_engine::sources::SourceAdapter;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

struct MockAdapter {
    /// Returned by topic search, in order
    seeds: Vec<String>,
    /// source_id -> referenced source_ids
    references: HashMap<String, Vec<String>>,
    papers: HashMap<String, Paper>,
}

impl MockAdapter {
    fn paper(&self, source_id: &str) -> Paper {
        self.papers
            .get(source_id)
            .cloned()
            .unwrap_or_else(|| make_paper(source_id, &format!("Paper {source_id}"), None))
    }
}

fn make_paper(source_id: &str, title: &str, abstract_text: Option<&str>) -> Paper {
    Paper {
        source: "openalex".to_string(),
        source_id: source_id.to_string(),
        title: title.to_string(),
        abstract_text: abstract_text.map(|s| s.to_string()),
        ..Paper::default()
    }
}

#[async_trait]
impl SourceAdapter for MockAdapter {
    fn name(&self) -> &'static str {
        "openalex"
    }

    async fn search_by_topic(&self, _query: &str, limit: usize) -> Result<Vec<Paper>> {
        Ok(self
            .seeds
            .iter()
            .take(limit)
            .map(|id| self.paper(id))
            .collect())
    }

    async fn search_by_title(&self, title: &str, limit: usize) -> Result<Vec<Paper>> {
        Ok(self
            .papers
            .values()
            .filter(|p| p.title == title)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn fetch_paper(&self, id: &str) -> Result<Option<Paper>> {
        Ok(self.papers.get(id).cloned())
    }

    async fn fetch_references(&self, paper_id: &str, limit: usize) -> Result<Vec<Paper>> {
        Ok(self
            .references
            .get(paper_id)
            .map(|refs| refs.iter().take(limit).map(|id| self.paper(id)).collect())
            .unwrap_or_default())
    }

    async fn fetch_citations(&self, _paper_id: &str, _limit: usize) -> Result<Vec<Paper>> {
        Ok(Vec::new())
    }
}

fn test_config(out: &Path, spine: Spine) -> AppConfig {
    AppConfig {
        out: out.to_path_buf(),
        spine,
        ..AppConfig::default()
    }
}

fn builder_for(adapter: MockAdapter, config: AppConfig) -> GraphBuilder {
    let transport = Arc::new(
        Transport::new(config.http.clone(), &config.contact_email, None).unwrap(),
    );
    GraphBuilder::new(config, Arc::new(adapter), transport)
}

/// A dense 30-paper citation graph: every paper references the next
/// five (mod 30).
fn dense_adapter() -> MockAdapter {
    let ids: Vec<String> = (0..30).map(|i| format!("P{i}")).collect();
    let papers = ids
        .iter()
        .map(|id| {
            (
                id.clone(),
                make_paper(id, &format!("Study {id}"), Some("citation graphs")),
            )
        })
        .collect();
    let references = (0..30)
        .map(|i| {
            let refs = (1..=5).map(|d| format!("P{}", (i + d) % 30)).collect();
            (format!("P{i}"), refs)
        })
        .collect();
    MockAdapter {
        seeds: (0..5).map(|i| format!("P{i}")).collect(),
        references,
        papers,
    }
}

#[tokio::test]
async fn traversal_respects_paper_cap() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("graph.db");

    let mut config = test_config(&out, Spine::Citation);
    config.depth = 2;
    config.max_papers = 10;
    config.max_refs_per_paper = 5;

    let builder = builder_for(dense_adapter(), config);
    let request = BuildRequest {
        topic: Some("citation graphs".to_string()),
        ..BuildRequest::default()
    };
    builder.build(&request).await.unwrap();

    let store = Store::open(&out).unwrap();
    let stats = store.stats().unwrap();
    assert_eq!(stats.papers, 10);
    assert!(stats.edges > 0);
    assert_eq!(stats.runs, 1);

    // every edge endpoint is a stored paper: no dangling edges past the cap
    let stored_ids: HashSet<i64> = store
        .all_papers()
        .unwrap()
        .iter()
        .filter_map(|p| p.id)
        .collect();
    for edge in store.edges(None).unwrap() {
        assert!(stored_ids.contains(&edge.src));
        assert!(stored_ids.contains(&edge.dst));
        assert_ne!(edge.src, edge.dst, "self-citation persisted");
    }
}

#[tokio::test]
async fn similarity_spine_links_related_papers_only() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("graph.db");

    let papers: HashMap<String, Paper> = [
        make_paper(
            "p1",
            "Speech Recognition with Deep Neural Networks",
            Some("Deep neural networks for robust speech recognition"),
        ),
        make_paper(
            "p2",
            "End-to-End Speech Recognition",
            Some("Neural networks enable end-to-end speech recognition systems"),
        ),
        make_paper(
            "p3",
            "Image Classification with CNNs",
            Some("Convolutional architectures classify image collections"),
        ),
    ]
    .into_iter()
    .map(|p| (p.source_id.clone(), p))
    .collect();

    let adapter = MockAdapter {
        seeds: vec!["p1".to_string(), "p2".to_string(), "p3".to_string()],
        references: HashMap::new(),
        papers,
    };

    let mut config = test_config(&out, Spine::Similarity);
    config.similarity.top_k = 5;
    config.similarity.threshold = 0.1;

    let builder = builder_for(adapter, config);
    let request = BuildRequest {
        topic: Some("speech".to_string()),
        ..BuildRequest::default()
    };
    builder.build(&request).await.unwrap();

    let store = Store::open(&out).unwrap();
    let id_of: HashMap<String, i64> = store
        .all_papers()
        .unwrap()
        .iter()
        .map(|p| (p.source_id.clone(), p.id.unwrap()))
        .collect();

    let similar = store.edges(Some(EdgeType::SimilarText)).unwrap();
    assert!(!similar.is_empty());
    assert!(similar
        .iter()
        .any(|e| (e.src, e.dst) == (id_of["p1"], id_of["p2"])));
    for edge in &similar {
        assert!(edge.weight >= 0.1);
        assert_ne!(edge.src, id_of["p3"]);
        assert_ne!(edge.dst, id_of["p3"]);
    }
}

#[tokio::test]
async fn hybrid_spine_emits_coupling_and_co_citation() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("graph.db");

    // A and B each cite {C, D, E, F}
    let shared: Vec<String> = ["C", "D", "E", "F"].iter().map(|s| s.to_string()).collect();
    let papers: HashMap<String, Paper> = ["A", "B", "C", "D", "E", "F"]
        .iter()
        .map(|id| {
            (
                id.to_string(),
                make_paper(id, &format!("Survey {id}"), Some("shared references")),
            )
        })
        .collect();
    let adapter = MockAdapter {
        seeds: vec!["A".to_string(), "B".to_string()],
        references: [
            ("A".to_string(), shared.clone()),
            ("B".to_string(), shared.clone()),
        ]
        .into(),
        papers,
    };

    let mut config = test_config(&out, Spine::Hybrid);
    config.depth = 1;
    config.max_refs_per_paper = 10;

    let builder = builder_for(adapter, config);
    let request = BuildRequest {
        topic: Some("surveys".to_string()),
        ..BuildRequest::default()
    };
    builder.build(&request).await.unwrap();

    let store = Store::open(&out).unwrap();
    let id_of: HashMap<String, i64> = store
        .all_papers()
        .unwrap()
        .iter()
        .map(|p| (p.source_id.clone(), p.id.unwrap()))
        .collect();

    let coupled = store.edges(Some(EdgeType::BibCoupled)).unwrap();
    assert_eq!(coupled.len(), 1);
    assert_eq!(coupled[0].weight, 1.0);
    let (a, b) = (id_of["A"], id_of["B"]);
    assert_eq!((coupled[0].src, coupled[0].dst), (a.min(b), a.max(b)));

    // {C,D,E,F} co-cited by both A and B: C(4,2)=6 pairs, all count 2
    let co_cited = store.edges(Some(EdgeType::CoCited)).unwrap();
    assert_eq!(co_cited.len(), 6);
    for edge in &co_cited {
        assert_eq!(edge.weight, 1.0);
        assert!(edge.src < edge.dst);
    }
}

#[tokio::test]
async fn empty_seed_set_records_empty_run() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("graph.db");

    let adapter = MockAdapter {
        seeds: Vec::new(),
        references: HashMap::new(),
        papers: HashMap::new(),
    };
    let builder = builder_for(adapter, test_config(&out, Spine::Citation));
    let request = BuildRequest {
        topic: Some("nonexistent topic".to_string()),
        ..BuildRequest::default()
    };
    builder.build(&request).await.unwrap();

    let store = Store::open(&out).unwrap();
    let stats = store.stats().unwrap();
    assert_eq!(stats.papers, 0);
    assert_eq!(stats.edges, 0);
    assert_eq!(stats.runs, 1);
}

#[tokio::test]
async fn pagerank_scores_persist_and_papers_cluster() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("graph.db");

    let mut config = test_config(&out, Spine::Citation);
    config.depth = 2;
    config.max_papers = 30;

    let builder = builder_for(dense_adapter(), config);
    let request = BuildRequest {
        topic: Some("citation graphs".to_string()),
        ..BuildRequest::default()
    };
    builder.build(&request).await.unwrap();

    let store = Store::open(&out).unwrap();
    let papers = store.all_papers().unwrap();
    // normalized PageRank: positive everywhere, max exactly 1
    let max_score = papers
        .iter()
        .map(|p| p.influence_score)
        .fold(0.0f64, f64::max);
    assert!((max_score - 1.0).abs() < 1e-9);
    for paper in &papers {
        assert!(paper.influence_score > 0.0);
    }

    // every paper belongs to exactly one cluster
    let stats = store.stats().unwrap();
    assert!(stats.clusters > 0);
}

#[tokio::test]
async fn consecutive_builds_are_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let request = BuildRequest {
        topic: Some("citation graphs".to_string()),
        ..BuildRequest::default()
    };

    let mut snapshots = Vec::new();
    for name in ["first.db", "second.db"] {
        let out = dir.path().join(name);
        let mut config = test_config(&out, Spine::Hybrid);
        config.depth = 2;
        config.max_papers = 15;
        let builder = builder_for(dense_adapter(), config);
        builder.build(&request).await.unwrap();

        let store = Store::open(&out).unwrap();
        let papers: Vec<(String, f64)> = store
            .all_papers()
            .unwrap()
            .iter()
            .map(|p| (p.source_id.clone(), p.influence_score))
            .collect();
        let edges: Vec<(i64, i64, String, f64)> = store
            .edges(None)
            .unwrap()
            .iter()
            .map(|e| (e.src, e.dst, e.edge_type.to_string(), e.weight))
            .collect();
        snapshots.push((papers, edges));
    }

    assert_eq!(snapshots[0], snapshots[1]);
}

#[tokio::test]
async fn resumed_build_does_not_duplicate_papers() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("graph.db");
    let request = BuildRequest {
        topic: Some("citation graphs".to_string()),
        ..BuildRequest::default()
    };

    for _ in 0..2 {
        let mut config = test_config(&out, Spine::Citation);
        config.depth = 1;
        config.max_papers = 12;
        let builder = builder_for(dense_adapter(), config);
        builder.build(&request).await.unwrap();
    }

    let store = Store::open(&out).unwrap();
    let stats = store.stats().unwrap();
    // 5 seeds plus the 5 new references P5..P9 at depth 1, both runs
    assert_eq!(stats.papers, 10);
    assert_eq!(stats.runs, 2);

    // CITES edges did not duplicate across the two runs
    let cites = store.edges(Some(EdgeType::Cites)).unwrap();
    let unique: HashSet<(i64, i64)> = cites.iter().map(|e| (e.src, e.dst)).collect();
    assert_eq!(unique.len(), cites.len());
}
