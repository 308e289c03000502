//! In-memory graph views over the persisted edge set
//!
//! The store keeps directed edges only. PageRank runs on the directed
//! citation view; Louvain runs on an undirected projection derived on
//! the fly. Stored edges are never mutated.

mod louvain;
mod pagerank;

pub use louvain::{louvain, LouvainConfig};
pub use pagerank::{PageRankConfig, PageRankScorer};

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Directed citation graph with deduplicated edges
pub struct CitationGraph {
    /// All nodes, ordered for deterministic iteration
    nodes: BTreeSet<i64>,
    /// paper -> papers it cites
    outgoing: HashMap<i64, Vec<i64>>,
    /// paper -> papers citing it
    incoming: HashMap<i64, Vec<i64>>,
    edge_seen: HashSet<(i64, i64)>,
}

impl CitationGraph {
    pub fn new() -> Self {
        Self {
            nodes: BTreeSet::new(),
            outgoing: HashMap::new(),
            incoming: HashMap::new(),
            edge_seen: HashSet::new(),
        }
    }

    /// Register a node with no edges yet
    pub fn add_node(&mut self, id: i64) {
        self.nodes.insert(id);
    }

    /// Add a citing -> cited edge; duplicates and self-loops are ignored
    pub fn add_edge(&mut self, citing: i64, cited: i64) {
        if citing == cited || !self.edge_seen.insert((citing, cited)) {
            return;
        }
        self.nodes.insert(citing);
        self.nodes.insert(cited);
        self.outgoing.entry(citing).or_default().push(cited);
        self.incoming.entry(cited).or_default().push(citing);
    }

    /// Papers cited by this paper
    pub fn references(&self, id: i64) -> &[i64] {
        self.outgoing.get(&id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Papers citing this paper
    pub fn citations(&self, id: i64) -> &[i64] {
        self.incoming.get(&id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Nodes in ascending id order
    pub fn nodes(&self) -> impl Iterator<Item = &i64> {
        self.nodes.iter()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn reference_count(&self, id: i64) -> usize {
        self.outgoing.get(&id).map(|v| v.len()).unwrap_or(0)
    }

    pub fn citation_count(&self, id: i64) -> usize {
        self.incoming.get(&id).map(|v| v.len()).unwrap_or(0)
    }
}

impl Default for CitationGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Weighted undirected projection used by Louvain.
///
/// Each directed pair `(u, v)` / `(v, u)` merges into one undirected
/// edge whose weight is the sum of directed weights. Self-loops are
/// dropped.
pub struct UndirectedGraph {
    nodes: BTreeSet<i64>,
    /// (min, max) -> merged weight
    weights: BTreeMap<(i64, i64), f64>,
}

impl UndirectedGraph {
    /// Project directed `(src, dst, weight)` triples onto nodes
    pub fn project(nodes: impl IntoIterator<Item = i64>, edges: &[(i64, i64, f64)]) -> Self {
        let mut graph = Self {
            nodes: nodes.into_iter().collect(),
            weights: BTreeMap::new(),
        };
        for (src, dst, weight) in edges {
            if src == dst {
                continue;
            }
            let key = if src < dst { (*src, *dst) } else { (*dst, *src) };
            *graph.weights.entry(key).or_insert(0.0) += weight;
            graph.nodes.insert(*src);
            graph.nodes.insert(*dst);
        }
        graph
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &i64> {
        self.nodes.iter()
    }

    /// Undirected edges as ((min, max), weight), in key order
    pub fn edges(&self) -> impl Iterator<Item = (&(i64, i64), &f64)> {
        self.weights.iter()
    }

    /// Sum of undirected edge weights
    pub fn total_weight(&self) -> f64 {
        self.weights.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_construction() {
        let mut graph = CitationGraph::new();
        graph.add_edge(1, 2);
        graph.add_edge(2, 3);

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.references(1), &[2]);
        assert_eq!(graph.citations(2), &[1]);
        assert_eq!(graph.references(2), &[3]);
    }

    #[test]
    fn test_duplicate_and_self_edges_ignored() {
        let mut graph = CitationGraph::new();
        graph.add_edge(1, 2);
        graph.add_edge(1, 2);
        graph.add_edge(1, 1);

        assert_eq!(graph.reference_count(1), 1);
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn test_isolated_nodes_kept() {
        let mut graph = CitationGraph::new();
        graph.add_node(7);
        graph.add_edge(1, 2);
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.reference_count(7), 0);
    }

    #[test]
    fn test_undirected_projection_merges_reciprocal_edges() {
        let edges = vec![(1, 2, 1.0), (2, 1, 0.5), (2, 3, 1.0), (3, 3, 9.0)];
        let graph = UndirectedGraph::project([1, 2, 3], &edges);

        let weights: Vec<_> = graph.edges().collect();
        assert_eq!(weights.len(), 2);
        assert_eq!(*weights[0].0, (1, 2));
        assert_eq!(*weights[0].1, 1.5);
        assert_eq!(graph.total_weight(), 2.5);
    }
}
