//! TF-IDF corpus over the fetched paper set
//!
//! Term weights use augmented frequency (`tf / max_tf`) scaled by
//! `ln(N / df)`. Documents are keyed by `source_id` and iterated in
//! paper-list order, so consecutive builds over the same list are
//! bit-identical.

use super::tokenize;
use papergraph_common::models::Paper;
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// Document vectors, document frequencies, and corpus size
pub struct Corpus {
    /// source_id -> term -> tf-idf weight
    vectors: HashMap<String, BTreeMap<String, f64>>,
    /// Document ids in insertion (paper-list) order
    doc_order: Vec<String>,
    /// term -> number of documents containing it
    df: HashMap<String, usize>,
    /// Number of documents with a non-empty token list
    n_docs: usize,
}

impl Corpus {
    /// Build the corpus over the full paper list, in list order.
    ///
    /// Document text is title + abstract; when the abstract is missing
    /// the decoded keyword list stands in, and failing that the title
    /// alone. Papers tokenizing to nothing are skipped.
    pub fn build(papers: &[Paper]) -> Self {
        let mut vectors: HashMap<String, BTreeMap<String, f64>> = HashMap::new();
        let mut doc_order = Vec::new();
        let mut df: HashMap<String, usize> = HashMap::new();
        let mut missing_abstracts = 0usize;

        let mut raw_counts: Vec<(String, BTreeMap<String, f64>)> = Vec::new();

        for paper in papers {
            let text = match paper.abstract_text.as_deref() {
                Some(abstract_text) => format!("{} {}", paper.title, abstract_text),
                None => {
                    missing_abstracts += 1;
                    let keywords = paper.keyword_list();
                    if keywords.is_empty() {
                        paper.title.clone()
                    } else {
                        format!("{} {}", paper.title, keywords.join(" "))
                    }
                }
            };

            let tokens = tokenize(&text);
            if tokens.is_empty() {
                continue;
            }

            let mut counts: BTreeMap<String, f64> = BTreeMap::new();
            for token in &tokens {
                *counts.entry(token.clone()).or_insert(0.0) += 1.0;
            }

            let max_tf = counts.values().cloned().fold(0.0f64, f64::max).max(1.0);
            for value in counts.values_mut() {
                *value /= max_tf;
            }

            for term in counts.keys() {
                *df.entry(term.clone()).or_insert(0) += 1;
            }

            raw_counts.push((paper.source_id.clone(), counts));
        }

        if !papers.is_empty() && missing_abstracts > 0 {
            let percent = missing_abstracts as f64 / papers.len() as f64 * 100.0;
            warn!(
                missing = missing_abstracts,
                total = papers.len(),
                percent = (percent * 10.0).round() / 10.0,
                "Papers without abstracts; corpus falls back to titles/keywords"
            );
        }

        let n_docs = raw_counts.len();
        for (doc_id, mut counts) in raw_counts {
            for (term, value) in counts.iter_mut() {
                let term_df = df.get(term).copied().unwrap_or(1).max(1);
                *value *= (n_docs as f64 / term_df as f64).ln();
            }
            doc_order.push(doc_id.clone());
            vectors.insert(doc_id, counts);
        }

        Self {
            vectors,
            doc_order,
            df,
            n_docs,
        }
    }

    /// Number of documents with non-empty token lists
    pub fn doc_count(&self) -> usize {
        self.n_docs
    }

    /// Document ids in corpus-build order
    pub fn doc_ids(&self) -> &[String] {
        &self.doc_order
    }

    /// TF-IDF vector for one document
    pub fn vector(&self, doc_id: &str) -> Option<&BTreeMap<String, f64>> {
        self.vectors.get(doc_id)
    }

    /// Documents containing `term`
    pub fn df(&self, term: &str) -> usize {
        self.df.get(term).copied().unwrap_or(0)
    }

    /// Sum the vectors of the given documents and return the k terms
    /// with greatest total weight. Ties keep first-seen order; terms
    /// whose sum is zero are dropped.
    pub fn top_terms(&self, doc_ids: &[String], k: usize) -> Vec<String> {
        let mut order: Vec<String> = Vec::new();
        let mut sums: HashMap<String, f64> = HashMap::new();

        for doc_id in doc_ids {
            let Some(vector) = self.vectors.get(doc_id) else {
                continue;
            };
            for (term, weight) in vector {
                if !sums.contains_key(term) {
                    order.push(term.clone());
                }
                *sums.entry(term.clone()).or_insert(0.0) += weight;
            }
        }

        let mut ranked: Vec<(String, f64)> = order
            .into_iter()
            .map(|term| {
                let sum = sums[&term];
                (term, sum)
            })
            .filter(|(_, sum)| *sum > 0.0)
            .collect();
        // stable sort keeps insertion order for equal sums
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(k);
        ranked.into_iter().map(|(term, _)| term).collect()
    }

    /// Mean query-token weight inside the document vector, capped at 1
    pub fn relevance(&self, doc_id: &str, query_tokens: &[String]) -> f64 {
        if query_tokens.is_empty() {
            return 0.0;
        }
        let Some(vector) = self.vectors.get(doc_id) else {
            return 0.0;
        };
        let sum: f64 = query_tokens
            .iter()
            .filter_map(|token| vector.get(token))
            .sum();
        (sum / query_tokens.len() as f64).min(1.0)
    }
}
