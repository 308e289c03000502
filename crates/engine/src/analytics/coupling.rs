//! Bibliographic-coupling edges
//!
//! Two citing papers sharing references are related. The weight is the
//! overlap size normalized by the smaller reference set.

use super::pair_key;
use papergraph_common::models::{Edge, EdgeType};
use std::collections::{BTreeMap, BTreeSet};

/// Compute BIB_COUPLED edges from the persisted CITES pairs
/// (`(citer, cited)` tuples).
pub fn coupling_edges(cites: &[(i64, i64)]) -> Vec<Edge> {
    let mut references: BTreeMap<i64, BTreeSet<i64>> = BTreeMap::new();
    for (citer, cited) in cites {
        references.entry(*citer).or_default().insert(*cited);
    }

    let citers: Vec<i64> = references.keys().copied().collect();
    let mut edges = Vec::new();

    for i in 0..citers.len() {
        for j in (i + 1)..citers.len() {
            let refs_a = &references[&citers[i]];
            let refs_b = &references[&citers[j]];
            let overlap = refs_a.intersection(refs_b).count();
            if overlap == 0 {
                continue;
            }
            let weight = overlap as f64 / refs_a.len().min(refs_b.len()) as f64;
            let (a, b) = pair_key(citers[i], citers[j]);
            edges.push(Edge::symmetric(
                a,
                b,
                EdgeType::BibCoupled,
                weight,
                1.0,
                serde_json::json!({
                    "overlap": overlap,
                    "refs_a": refs_a.len(),
                    "refs_b": refs_b.len(),
                }),
            ));
        }
    }

    edges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_reference_sets_weight_one() {
        // A and B each cite {C, D, E, F}
        let mut cites = Vec::new();
        for cited in [30, 31, 32, 33] {
            cites.push((1, cited));
            cites.push((2, cited));
        }
        let edges = coupling_edges(&cites);
        assert_eq!(edges.len(), 1);
        assert_eq!((edges[0].src, edges[0].dst), (1, 2));
        assert_eq!(edges[0].weight, 1.0);
        assert_eq!(edges[0].edge_type, EdgeType::BibCoupled);
        assert_eq!(edges[0].provenance.as_ref().unwrap()["overlap"], 4);
    }

    #[test]
    fn test_partial_overlap_normalized_by_smaller_set() {
        // A cites {10, 11, 12, 13}, B cites {12, 13}: overlap 2, min 2
        let cites = vec![(1, 10), (1, 11), (1, 12), (1, 13), (2, 12), (2, 13)];
        let edges = coupling_edges(&cites);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].weight, 1.0);

        // C cites {10, 20}: overlap with A is 1, min set size 2
        let cites = vec![(1, 10), (1, 11), (3, 10), (3, 20)];
        let edges = coupling_edges(&cites);
        assert_eq!(edges[0].weight, 0.5);
    }

    #[test]
    fn test_disjoint_sets_produce_nothing() {
        let cites = vec![(1, 10), (2, 20)];
        assert!(coupling_edges(&cites).is_empty());
    }
}
