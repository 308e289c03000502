//! Louvain community detection
//!
//! Runs on the weighted undirected projection of all persisted edges.
//! Fully deterministic: node sweeps iterate in ascending id order, ties
//! prefer the lowest community index, and no RNG is involved, so
//! repeated runs over the same graph partition identically.

use super::UndirectedGraph;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone)]
pub struct LouvainConfig {
    /// Modularity resolution; 1.0 is the classic objective
    pub resolution: f64,
    /// Aggregation levels before giving up
    pub max_levels: usize,
    /// Local-moving sweeps per level
    pub max_sweeps: usize,
}

impl Default for LouvainConfig {
    fn default() -> Self {
        Self {
            resolution: 1.0,
            max_levels: 10,
            max_sweeps: 50,
        }
    }
}

/// Detect communities; returns community id -> member paper ids.
///
/// Community ids are renumbered 0..k in order of each community's
/// first member (ascending node id). A graph with no edges yields one
/// singleton community per node.
pub fn louvain(graph: &UndirectedGraph, config: &LouvainConfig) -> HashMap<i64, Vec<i64>> {
    let node_ids: Vec<i64> = graph.nodes().copied().collect();
    let n = node_ids.len();
    if n == 0 {
        return HashMap::new();
    }

    let index: HashMap<i64, usize> = node_ids
        .iter()
        .enumerate()
        .map(|(i, id)| (*id, i))
        .collect();

    let m = graph.total_weight();
    // membership of each original node in the current super-graph
    let mut membership: Vec<usize> = (0..n).collect();

    if m > 0.0 {
        let mut adj: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
        let mut self_loops: Vec<f64> = vec![0.0; n];
        for ((a, b), w) in graph.edges() {
            let (i, j) = (index[a], index[b]);
            adj[i].push((j, *w));
            adj[j].push((i, *w));
        }

        for _level in 0..config.max_levels {
            let size = adj.len();
            let k: Vec<f64> = (0..size)
                .map(|i| adj[i].iter().map(|(_, w)| w).sum::<f64>() + 2.0 * self_loops[i])
                .collect();
            let mut comm: Vec<usize> = (0..size).collect();
            let mut sigma_tot: Vec<f64> = k.clone();

            let mut level_moved = false;
            for _sweep in 0..config.max_sweeps {
                let mut sweep_moved = false;
                for i in 0..size {
                    let current = comm[i];

                    // weight from i into each neighboring community
                    let mut links: BTreeMap<usize, f64> = BTreeMap::new();
                    for (j, w) in &adj[i] {
                        if *j != i {
                            *links.entry(comm[*j]).or_insert(0.0) += w;
                        }
                    }

                    sigma_tot[current] -= k[i];

                    let gain_of = |c: usize, w_in: f64| {
                        w_in - config.resolution * sigma_tot[c] * k[i] / (2.0 * m)
                    };
                    let mut best_comm = current;
                    let mut best_gain =
                        gain_of(current, links.get(&current).copied().unwrap_or(0.0));
                    // ascending community order makes ties deterministic
                    for (&c, &w_in) in &links {
                        if c == current {
                            continue;
                        }
                        let gain = gain_of(c, w_in);
                        if gain > best_gain {
                            best_gain = gain;
                            best_comm = c;
                        }
                    }

                    sigma_tot[best_comm] += k[i];
                    if best_comm != current {
                        comm[i] = best_comm;
                        sweep_moved = true;
                        level_moved = true;
                    }
                }
                if !sweep_moved {
                    break;
                }
            }

            if !level_moved {
                break;
            }

            // renumber surviving communities by first appearance
            let mut renumber: HashMap<usize, usize> = HashMap::new();
            let mut next = 0usize;
            let mut new_comm: Vec<usize> = vec![0; size];
            for (i, item) in new_comm.iter_mut().enumerate() {
                *item = *renumber.entry(comm[i]).or_insert_with(|| {
                    let v = next;
                    next += 1;
                    v
                });
            }
            let n_comm = next;

            for entry in membership.iter_mut() {
                *entry = new_comm[*entry];
            }

            if n_comm == size {
                break;
            }

            // aggregate into the community super-graph
            let mut new_self: Vec<f64> = vec![0.0; n_comm];
            let mut merged: BTreeMap<(usize, usize), f64> = BTreeMap::new();
            for i in 0..size {
                new_self[new_comm[i]] += self_loops[i];
                for (j, w) in &adj[i] {
                    if *j < i {
                        continue;
                    }
                    let (ci, cj) = (new_comm[i], new_comm[*j]);
                    if ci == cj {
                        new_self[ci] += *w;
                    } else {
                        let key = if ci < cj { (ci, cj) } else { (cj, ci) };
                        *merged.entry(key).or_insert(0.0) += *w;
                    }
                }
            }

            adj = vec![Vec::new(); n_comm];
            for ((a, b), w) in merged {
                adj[a].push((b, w));
                adj[b].push((a, w));
            }
            self_loops = new_self;
        }
    }

    // group original nodes, renumbering by first member
    let mut renumber: HashMap<usize, i64> = HashMap::new();
    let mut next = 0i64;
    let mut result: HashMap<i64, Vec<i64>> = HashMap::new();
    for (i, id) in node_ids.iter().enumerate() {
        let cid = *renumber.entry(membership[i]).or_insert_with(|| {
            let v = next;
            next += 1;
            v
        });
        result.entry(cid).or_default().push(*id);
    }
    result
}
