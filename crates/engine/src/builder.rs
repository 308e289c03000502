//! Build orchestrator
//!
//! Sequences the whole pipeline: seed resolution, capped breadth-first
//! citation traversal, corpus construction, analytic edge emission,
//! PageRank and Louvain, cluster naming, score writes, and the run
//! record. Execution is strictly sequential; all remote I/O funnels
//! through the shared transport.

use crate::analytics::{build_similarity_edges, co_citation_edges, coupling_edges};
use crate::entities::EntityExtractor;
use crate::graph::{louvain, CitationGraph, LouvainConfig, PageRankConfig, PageRankScorer, UndirectedGraph};
use crate::scoring;
use crate::sources::SourceAdapter;
use crate::text::Corpus;
use chrono::Datelike;
use papergraph_common::config::AppConfig;
use papergraph_common::errors::Result;
use papergraph_common::http::Transport;
use papergraph_common::models::{Cluster, Edge, EdgeType, Paper, RunRecord};
use papergraph_common::store::Store;
use papergraph_common::VERSION;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Seed inputs for one build
#[derive(Debug, Clone, Default)]
pub struct BuildRequest {
    pub topic: Option<String>,
    pub titles: Vec<String>,
    pub dois: Vec<String>,
}

/// Drives one full graph build against a single store
pub struct GraphBuilder {
    config: AppConfig,
    adapter: Arc<dyn SourceAdapter>,
    transport: Arc<Transport>,
}

impl GraphBuilder {
    pub fn new(
        config: AppConfig,
        adapter: Arc<dyn SourceAdapter>,
        transport: Arc<Transport>,
    ) -> Self {
        Self {
            config,
            adapter,
            transport,
        }
    }

    /// Run the build and return the output database path.
    ///
    /// The store commits incrementally, so everything gathered before a
    /// failure survives; the handle closes on every exit path.
    pub async fn build(&self, request: &BuildRequest) -> Result<PathBuf> {
        let started_at = chrono::Utc::now().to_rfc3339();
        let start = Instant::now();
        let mut store = Store::open(&self.config.out)?;

        let mut seeds = self.collect_seeds(request).await?;
        if seeds.is_empty() {
            warn!("No seed papers found; recording an empty run");
            self.record_run(&store, &started_at)?;
            store.close()?;
            return Ok(self.config.out.clone());
        }
        info!(seeds = seeds.len(), "Seed set resolved");

        store.insert_papers(&mut seeds)?;
        self.expand(&mut store, seeds).await?;

        let papers = store.all_papers()?;
        let corpus = Corpus::build(&papers);
        let paper_ids: HashMap<String, i64> = papers
            .iter()
            .filter_map(|p| p.id.map(|id| (p.source_id.clone(), id)))
            .collect();

        self.emit_analytic_edges(&mut store, &corpus, &paper_ids)?;

        let all_edges = store.edges(None)?;
        let pagerank = self.run_algorithms(&mut store, &papers, &all_edges, &corpus)?;

        let normalized = scoring::normalized_pagerank(&pagerank);
        for paper in &papers {
            if let Some(id) = paper.id {
                store.update_paper_score(id, normalized.get(&id).copied().unwrap_or(0.0))?;
            }
        }

        let composite = scoring::composite_scores(
            &papers,
            &pagerank,
            &corpus,
            request.topic.as_deref(),
            &self.config.ranking,
            chrono::Utc::now().year(),
        );
        debug!(scored = composite.len(), "Composite scores computed");

        if self.config.entities.enabled {
            let (mut entities, links) = EntityExtractor::new().extract_batch(&papers);
            store.insert_entities(&mut entities, &links)?;
        }

        self.record_run(&store, &started_at)?;

        let stats = store.stats()?;
        info!(
            papers = stats.papers,
            edges = stats.edges,
            clusters = stats.clusters,
            entities = stats.entities,
            elapsed_secs = start.elapsed().as_secs_f64(),
            requests = ?self.transport.request_counts(),
            "Build complete"
        );

        store.close()?;
        Ok(self.config.out.clone())
    }

    /// Resolve seeds from topic search, title searches, and DOI
    /// fetches, deduplicated by natural key and capped at the seed
    /// limit. Search failures propagate; the build cannot start
    /// without seeds.
    async fn collect_seeds(&self, request: &BuildRequest) -> Result<Vec<Paper>> {
        let seed_limit = self.config.seed_limit();
        let mut seeds: Vec<Paper> = Vec::new();
        let mut seen: HashSet<(String, String)> = HashSet::new();

        if let Some(topic) = request.topic.as_deref().filter(|t| !t.is_empty()) {
            for paper in self.adapter.search_by_topic(topic, seed_limit).await? {
                if self.within_year_window(&paper) && seen.insert(paper.key()) {
                    seeds.push(paper);
                }
            }
        }

        for title in &request.titles {
            if let Some(paper) = self
                .adapter
                .search_by_title(title, 1)
                .await?
                .into_iter()
                .next()
            {
                if self.within_year_window(&paper) && seen.insert(paper.key()) {
                    seeds.push(paper);
                }
            }
        }

        for doi in &request.dois {
            if let Some(paper) = self.adapter.fetch_paper(doi).await? {
                if self.within_year_window(&paper) && seen.insert(paper.key()) {
                    seeds.push(paper);
                }
            }
        }

        seeds.truncate(seed_limit);
        Ok(seeds)
    }

    /// Bounded BFS over references. New papers insert until the paper
    /// cap closes; once closed, neither nodes nor dangling edges are
    /// created. CITES edges persist immediately.
    async fn expand(&self, store: &mut Store, seeds: Vec<Paper>) -> Result<()> {
        let max_papers = self.config.max_papers;
        let mut paper_count = store.paper_count()? as usize;
        let mut visited: HashSet<(String, String)> =
            seeds.iter().map(|p| p.key()).collect();
        // resumed builds must not duplicate already persisted citations
        let mut edge_seen: HashSet<(i64, i64)> = store
            .edges(Some(EdgeType::Cites))?
            .iter()
            .map(|e| (e.src, e.dst))
            .collect();

        let mut frontier = seeds;
        for depth in 0..self.config.depth {
            let at_capacity = paper_count >= max_papers;
            debug!(
                depth,
                frontier = frontier.len(),
                paper_count,
                at_capacity,
                "Expanding frontier"
            );

            let mut next_frontier = Vec::new();
            for paper in &frontier {
                let Some(citer_id) = paper.id else { continue };

                let references = self
                    .adapter
                    .fetch_references(&paper.source_id, self.config.max_refs_per_paper)
                    .await?;

                for referenced in references {
                    let key = referenced.key();
                    if let Some(dst) = store.find_paper_id(&key.0, &key.1)? {
                        if dst != citer_id && edge_seen.insert((citer_id, dst)) {
                            let mut edge = [self.cites_edge(citer_id, dst, depth)];
                            store.insert_edges(&mut edge)?;
                        }
                    } else if !visited.contains(&key)
                        && paper_count < max_papers
                        && self.within_year_window(&referenced)
                    {
                        let mut batch = [referenced];
                        let ids = store.insert_papers(&mut batch)?;
                        paper_count += 1;
                        visited.insert(key);
                        let dst = ids[0];
                        if dst != citer_id && edge_seen.insert((citer_id, dst)) {
                            let mut edge = [self.cites_edge(citer_id, dst, depth)];
                            store.insert_edges(&mut edge)?;
                        }
                        let [inserted] = batch;
                        next_frontier.push(inserted);
                    }
                    // new paper at capacity: no insert, no dangling edge
                }
            }

            if next_frontier.is_empty() {
                break;
            }
            frontier = next_frontier;
        }

        Ok(())
    }

    fn cites_edge(&self, src: i64, dst: i64, depth: usize) -> Edge {
        Edge::cites(
            src,
            dst,
            serde_json::json!({
                "source": self.adapter.name(),
                "depth": depth,
            }),
        )
    }

    fn within_year_window(&self, paper: &Paper) -> bool {
        let Some(year) = paper.year else { return true };
        if let Some(from) = self.config.year_from {
            if year < from {
                return false;
            }
        }
        if let Some(to) = self.config.year_to {
            if year > to {
                return false;
            }
        }
        true
    }

    /// Similarity / co-citation / coupling edges per the configured spine
    fn emit_analytic_edges(
        &self,
        store: &mut Store,
        corpus: &Corpus,
        paper_ids: &HashMap<String, i64>,
    ) -> Result<()> {
        let spine = self.config.spine;

        if spine.wants_similarity() && self.config.similarity.enabled {
            let mut edges = build_similarity_edges(
                corpus,
                paper_ids,
                self.config.similarity.top_k,
                self.config.similarity.threshold,
            );
            info!(count = edges.len(), "Similarity edges computed");
            store.insert_edges(&mut edges)?;
        }

        if spine.wants_co_citation() || spine.wants_coupling() {
            let cites: Vec<(i64, i64)> = store
                .edges(Some(EdgeType::Cites))?
                .iter()
                .map(|e| (e.src, e.dst))
                .collect();

            if spine.wants_co_citation() {
                let mut edges = co_citation_edges(&cites);
                info!(count = edges.len(), "Co-citation edges computed");
                store.insert_edges(&mut edges)?;
            }
            if spine.wants_coupling() {
                let mut edges = coupling_edges(&cites);
                info!(count = edges.len(), "Coupling edges computed");
                store.insert_edges(&mut edges)?;
            }
        }

        Ok(())
    }

    /// PageRank on the directed citation view, Louvain on the
    /// undirected projection of all edges, clusters named from TF-IDF
    /// top terms.
    fn run_algorithms(
        &self,
        store: &mut Store,
        papers: &[Paper],
        all_edges: &[Edge],
        corpus: &Corpus,
    ) -> Result<HashMap<i64, f64>> {
        let ids: Vec<i64> = papers.iter().filter_map(|p| p.id).collect();

        let mut citation_graph = CitationGraph::new();
        for id in &ids {
            citation_graph.add_node(*id);
        }
        for edge in all_edges.iter().filter(|e| e.edge_type == EdgeType::Cites) {
            citation_graph.add_edge(edge.src, edge.dst);
        }
        let pagerank = PageRankScorer::new(PageRankConfig::default()).compute(&citation_graph);

        if self.config.clustering.enabled {
            let triples: Vec<(i64, i64, f64)> = all_edges
                .iter()
                .map(|e| (e.src, e.dst, e.weight))
                .collect();
            let undirected = UndirectedGraph::project(ids.iter().copied(), &triples);
            let communities = louvain(&undirected, &LouvainConfig::default());

            let id_to_source: HashMap<i64, &str> = papers
                .iter()
                .filter_map(|p| p.id.map(|id| (id, p.source_id.as_str())))
                .collect();

            let mut community_ids: Vec<i64> = communities.keys().copied().collect();
            community_ids.sort_unstable();

            let mut clusters: Vec<Cluster> = community_ids
                .into_iter()
                .map(|community_id| {
                    let members = communities[&community_id].clone();
                    let member_sources: Vec<String> = members
                        .iter()
                        .filter_map(|id| id_to_source.get(id).map(|s| s.to_string()))
                        .collect();
                    let terms = corpus.top_terms(&member_sources, 3);
                    let name = if terms.is_empty() {
                        format!("Cluster {}", community_id)
                    } else {
                        terms.join(", ")
                    };
                    Cluster::new(
                        &self.config.clustering.method,
                        community_id,
                        Some(name),
                        members,
                    )
                })
                .collect();
            info!(count = clusters.len(), "Clusters detected");
            store.insert_clusters(&mut clusters)?;
        }

        Ok(pagerank)
    }

    fn record_run(&self, store: &Store, started_at: &str) -> Result<()> {
        let stats = store.stats()?;
        let run = RunRecord {
            id: None,
            started_at: started_at.to_string(),
            version: VERSION.to_string(),
            config: self.config.snapshot(),
            source: self.config.source.clone(),
            spine: self.config.spine.to_string(),
            depth: self.config.depth,
            stats: serde_json::to_value(&stats)?,
        };
        store.insert_run(&run)?;
        Ok(())
    }
}
