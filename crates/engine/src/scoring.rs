//! Composite paper scoring
//!
//! Weighted blend of normalized PageRank, topic relevance, and recency.
//! Computed for reporting; the store persists normalized PageRank, not
//! this composite.

use crate::text::{tokenize, Corpus};
use papergraph_common::config::RankingConfig;
use papergraph_common::models::Paper;
use std::collections::HashMap;

/// Floor applied to the PageRank maximum before normalizing
const MIN_PAGERANK_MAX: f64 = 1e-3;

/// Years before this are treated as metadata noise for recency
const MIN_PLAUSIBLE_YEAR: i32 = 1900;

/// Compute the composite score for every paper with an assigned id.
pub fn composite_scores(
    papers: &[Paper],
    pagerank: &HashMap<i64, f64>,
    corpus: &Corpus,
    topic: Option<&str>,
    weights: &RankingConfig,
    current_year: i32,
) -> HashMap<i64, f64> {
    let (w_pagerank, w_relevance, w_recency) = weights.weights();

    let max_pagerank = pagerank
        .values()
        .cloned()
        .fold(0.0f64, f64::max)
        .max(MIN_PAGERANK_MAX);

    let year_min = papers
        .iter()
        .filter_map(|p| p.year)
        .filter(|y| *y > MIN_PLAUSIBLE_YEAR)
        .min()
        .unwrap_or(current_year);
    let year_span = (current_year - year_min).max(1) as f64;

    let query_tokens: Vec<String> = topic.map(tokenize).unwrap_or_default();

    let mut scores = HashMap::with_capacity(papers.len());
    for paper in papers {
        let Some(id) = paper.id else { continue };

        let normalized_pagerank =
            pagerank.get(&id).copied().unwrap_or(0.0) / max_pagerank;

        let relevance = if query_tokens.is_empty() {
            0.0
        } else {
            corpus.relevance(&paper.source_id, &query_tokens)
        };

        let year = paper.year.unwrap_or(current_year);
        let recency = ((year - year_min) as f64 / year_span).clamp(0.0, 1.0);

        let composite = (normalized_pagerank * w_pagerank
            + relevance * w_relevance
            + recency * w_recency)
            .min(1.0);
        scores.insert(id, composite);
    }
    scores
}

/// Max-normalized PageRank, the value persisted as `influence_score`
pub fn normalized_pagerank(pagerank: &HashMap<i64, f64>) -> HashMap<i64, f64> {
    let max = pagerank
        .values()
        .cloned()
        .fold(0.0f64, f64::max)
        .max(MIN_PAGERANK_MAX);
    pagerank.iter().map(|(id, s)| (*id, s / max)).collect()
}
