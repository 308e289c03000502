//! Text-similarity edges
//!
//! Top-K cosine neighbors per document above a threshold, one
//! SIMILAR_TEXT edge per unordered pair.

use super::pair_key;
use crate::text::Corpus;
use papergraph_common::models::{Edge, EdgeType};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Cosine of two sparse vectors; 0 when either norm is zero
pub fn cosine(u: &BTreeMap<String, f64>, v: &BTreeMap<String, f64>) -> f64 {
    let (small, large) = if u.len() <= v.len() { (u, v) } else { (v, u) };
    let dot: f64 = small
        .iter()
        .filter_map(|(term, a)| large.get(term).map(|b| a * b))
        .sum();

    let norm_u: f64 = u.values().map(|a| a * a).sum::<f64>().sqrt();
    let norm_v: f64 = v.values().map(|b| b * b).sum::<f64>().sqrt();
    if norm_u == 0.0 || norm_v == 0.0 {
        return 0.0;
    }
    dot / (norm_u * norm_v)
}

/// For each document keep the top-K neighbors with cosine >= threshold
/// and emit one edge per unordered pair. `paper_ids` maps source_id to
/// the internal store id; documents without a mapping are skipped.
pub fn build_similarity_edges(
    corpus: &Corpus,
    paper_ids: &HashMap<String, i64>,
    top_k: usize,
    threshold: f64,
) -> Vec<Edge> {
    let doc_ids = corpus.doc_ids();
    let mut seen: HashSet<(i64, i64)> = HashSet::new();
    let mut edges = Vec::new();

    for (i, doc_a) in doc_ids.iter().enumerate() {
        let Some(&id_a) = paper_ids.get(doc_a) else {
            continue;
        };
        let Some(vec_a) = corpus.vector(doc_a) else {
            continue;
        };

        let mut neighbors: Vec<(usize, f64)> = Vec::new();
        for (j, doc_b) in doc_ids.iter().enumerate() {
            if i == j {
                continue;
            }
            let Some(vec_b) = corpus.vector(doc_b) else {
                continue;
            };
            let similarity = cosine(vec_a, vec_b);
            if similarity >= threshold {
                neighbors.push((j, similarity));
            }
        }

        // stable sort: equal similarities keep document order
        neighbors.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        neighbors.truncate(top_k);

        for (j, similarity) in neighbors {
            let Some(&id_b) = paper_ids.get(&doc_ids[j]) else {
                continue;
            };
            if id_a == id_b || !seen.insert(pair_key(id_a, id_b)) {
                continue;
            }
            edges.push(Edge::symmetric(
                id_a,
                id_b,
                EdgeType::SimilarText,
                similarity,
                similarity,
                serde_json::json!({
                    "algorithm": "tfidf_cosine",
                    "version": papergraph_common::VERSION,
                    "top_k": top_k,
                    "threshold": threshold,
                }),
            ));
        }
    }

    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use papergraph_common::models::Paper;

    fn vec_of(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
        entries
            .iter()
            .map(|(term, weight)| (term.to_string(), *weight))
            .collect()
    }

    fn paper(source_id: &str, title: &str, abstract_text: &str) -> Paper {
        Paper {
            source: "openalex".to_string(),
            source_id: source_id.to_string(),
            title: title.to_string(),
            abstract_text: Some(abstract_text.to_string()),
            ..Paper::default()
        }
    }

    #[test]
    fn test_cosine_self_is_one() {
        let v = vec_of(&[("speech", 0.4), ("neural", 0.2)]);
        assert!((cosine(&v, &v) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cosine_zero_norm() {
        let v = vec_of(&[("speech", 0.4)]);
        let zero = BTreeMap::new();
        assert_eq!(cosine(&v, &zero), 0.0);
        assert_eq!(cosine(&zero, &zero), 0.0);
    }

    #[test]
    fn test_cosine_orthogonal() {
        let u = vec_of(&[("speech", 1.0)]);
        let v = vec_of(&[("image", 1.0)]);
        assert_eq!(cosine(&u, &v), 0.0);
    }

    #[test]
    fn test_related_pair_gets_edge_unrelated_does_not() {
        let papers = vec![
            paper(
                "p1",
                "Speech Recognition with Deep Neural Networks",
                "Deep neural networks for robust speech recognition",
            ),
            paper(
                "p2",
                "End-to-End Speech Recognition",
                "Neural networks enable end-to-end speech recognition systems",
            ),
            paper(
                "p3",
                "Image Classification with CNNs",
                "Convolutional architectures classify image collections",
            ),
        ];
        let corpus = Corpus::build(&papers);
        let ids: HashMap<String, i64> =
            [("p1".to_string(), 1), ("p2".to_string(), 2), ("p3".to_string(), 3)].into();

        let edges = build_similarity_edges(&corpus, &ids, 5, 0.1);

        assert!(edges
            .iter()
            .any(|e| (e.src, e.dst) == (1, 2)), "expected p1-p2 edge: {edges:?}");
        assert!(edges.iter().all(|e| e.src != 3 && e.dst != 3));
        for edge in &edges {
            assert!(edge.weight >= 0.1);
            assert!(edge.src < edge.dst);
            assert_eq!(edge.weight, edge.confidence);
        }
    }

    #[test]
    fn test_no_duplicate_pairs() {
        let papers = vec![
            paper("p1", "Speech recognition systems", "speech recognition transformers"),
            paper("p2", "Speech recognition systems", "speech recognition transformers"),
            paper("p3", "Protein folding structures", "amino acid chains fold"),
        ];
        let corpus = Corpus::build(&papers);
        let ids: HashMap<String, i64> =
            [("p1".to_string(), 1), ("p2".to_string(), 2), ("p3".to_string(), 3)].into();

        // both directions of the p1/p2 pair collapse to one edge
        let edges = build_similarity_edges(&corpus, &ids, 5, 0.3);
        assert_eq!(edges.len(), 1);
        assert_eq!((edges[0].src, edges[0].dst), (1, 2));
    }
}
