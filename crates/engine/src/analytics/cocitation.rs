//! Co-citation edges
//!
//! Two papers cited together by the same citer are related. Pair
//! counts are normalized by the maximum count so weights land in
//! (0, 1].

use super::pair_key;
use papergraph_common::models::{Edge, EdgeType};
use std::collections::{BTreeMap, BTreeSet};

/// Compute CO_CITED edges from the persisted CITES pairs
/// (`(citer, cited)` tuples).
pub fn co_citation_edges(cites: &[(i64, i64)]) -> Vec<Edge> {
    // citer -> distinct reference set, in stable order
    let mut references: BTreeMap<i64, BTreeSet<i64>> = BTreeMap::new();
    for (citer, cited) in cites {
        references.entry(*citer).or_default().insert(*cited);
    }

    let mut counts: BTreeMap<(i64, i64), u64> = BTreeMap::new();
    for refs in references.values() {
        let refs: Vec<i64> = refs.iter().copied().collect();
        for i in 0..refs.len() {
            for j in (i + 1)..refs.len() {
                *counts.entry(pair_key(refs[i], refs[j])).or_insert(0) += 1;
            }
        }
    }

    let max_count = counts.values().copied().max().unwrap_or(0);
    if max_count == 0 {
        return Vec::new();
    }

    counts
        .into_iter()
        .map(|((a, b), count)| {
            Edge::symmetric(
                a,
                b,
                EdgeType::CoCited,
                count as f64 / max_count as f64,
                1.0,
                serde_json::json!({ "count": count }),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_citer_pairs() {
        // citer 1 references {10, 11, 12}: three pairs, all count 1
        let cites = vec![(1, 10), (1, 11), (1, 12)];
        let edges = co_citation_edges(&cites);
        assert_eq!(edges.len(), 3);
        for edge in &edges {
            assert_eq!(edge.weight, 1.0);
            assert!(edge.src < edge.dst);
            assert_eq!(edge.edge_type, EdgeType::CoCited);
        }
    }

    #[test]
    fn test_counts_normalize_to_max() {
        // {10,11} co-cited by two citers, {10,12} by one
        let cites = vec![(1, 10), (1, 11), (2, 10), (2, 11), (3, 10), (3, 12)];
        let edges = co_citation_edges(&cites);

        let pair_10_11 = edges.iter().find(|e| (e.src, e.dst) == (10, 11)).unwrap();
        let pair_10_12 = edges.iter().find(|e| (e.src, e.dst) == (10, 12)).unwrap();
        assert_eq!(pair_10_11.weight, 1.0);
        assert_eq!(pair_10_12.weight, 0.5);
        assert_eq!(pair_10_11.provenance.as_ref().unwrap()["count"], 2);
    }

    #[test]
    fn test_no_pairs_from_single_references() {
        let cites = vec![(1, 10), (2, 11)];
        assert!(co_citation_edges(&cites).is_empty());
        assert!(co_citation_edges(&[]).is_empty());
    }

    #[test]
    fn test_duplicate_cites_do_not_inflate_counts() {
        let cites = vec![(1, 10), (1, 10), (1, 11)];
        let edges = co_citation_edges(&cites);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].provenance.as_ref().unwrap()["count"], 1);
    }
}
