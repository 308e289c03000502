//! PageRank over the directed citation graph

use super::CitationGraph;
use std::collections::HashMap;

/// PageRank configuration
#[derive(Debug, Clone)]
pub struct PageRankConfig {
    /// Damping factor (typically 0.85)
    pub damping: f64,

    /// Maximum iterations
    pub max_iterations: usize,

    /// Convergence tolerance on the L1 norm of the score delta
    pub tolerance: f64,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            damping: 0.85,
            max_iterations: 100,
            tolerance: 1e-6,
        }
    }
}

/// PageRank scorer for papers
pub struct PageRankScorer {
    config: PageRankConfig,
}

impl PageRankScorer {
    pub fn new(config: PageRankConfig) -> Self {
        Self { config }
    }

    /// Compute PageRank for every node. Scores are positive and sum to
    /// 1; dangling mass is redistributed uniformly so isolated papers
    /// keep the `(1 - d) / N` teleportation baseline.
    pub fn compute(&self, graph: &CitationGraph) -> HashMap<i64, f64> {
        let n = graph.node_count();
        if n == 0 {
            return HashMap::new();
        }

        let n_f64 = n as f64;
        let damping = self.config.damping;
        let teleport = (1.0 - damping) / n_f64;

        let nodes: Vec<i64> = graph.nodes().copied().collect();
        let out_counts: HashMap<i64, usize> = nodes
            .iter()
            .map(|&id| (id, graph.reference_count(id)))
            .collect();

        let mut scores: HashMap<i64, f64> =
            nodes.iter().map(|&id| (id, 1.0 / n_f64)).collect();

        for _ in 0..self.config.max_iterations {
            // mass parked on nodes with no outgoing references
            let dangling: f64 = nodes
                .iter()
                .filter(|id| out_counts[id] == 0)
                .map(|id| scores[id])
                .sum();

            let mut new_scores: HashMap<i64, f64> = HashMap::with_capacity(n);
            let mut l1_delta = 0.0f64;

            for &node in &nodes {
                let citation_sum: f64 = graph
                    .citations(node)
                    .iter()
                    .map(|&citing| scores[&citing] / out_counts[&citing] as f64)
                    .sum();

                let new_score = teleport + damping * (citation_sum + dangling / n_f64);
                l1_delta += (new_score - scores[&node]).abs();
                new_scores.insert(node, new_score);
            }

            scores = new_scores;
            if l1_delta < self.config.tolerance {
                break;
            }
        }

        scores
    }
}
