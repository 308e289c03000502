//! Semantic Scholar adapter
//!
//! Graph API under https://api.semanticscholar.org/graph/v1 with a
//! fixed field list. Batch fetches POST at most 500 ids per request;
//! larger lists split into sequential batches. The API key, when
//! present, travels in the `x-api-key` header.

use super::{json_str, strip_doi_prefix, SourceAdapter};
use async_trait::async_trait;
use papergraph_common::errors::Result;
use papergraph_common::http::Transport;
use papergraph_common::models::Paper;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

const SOURCE: &str = "s2";
const BASE_URL: &str = "https://api.semanticscholar.org/graph/v1";

/// Fields requested on every paper-shaped response
const FIELDS: &str = "paperId,title,abstract,year,venue,url,citationCount,externalIds,fieldsOfStudy";

/// The batch endpoint rejects more than 500 ids per request
const BATCH_LIMIT: usize = 500;

pub struct SemanticScholarAdapter {
    transport: Arc<Transport>,
    base: String,
    api_key: Option<String>,
}

impl SemanticScholarAdapter {
    pub fn new(transport: Arc<Transport>, api_key: Option<String>) -> Self {
        Self {
            transport,
            base: BASE_URL.to_string(),
            api_key,
        }
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        match self.api_key.as_deref() {
            Some(key) => vec![("x-api-key", key)],
            None => Vec::new(),
        }
    }

    /// The server treats `-` and `+` as query operators; strip them
    fn sanitize_query(query: &str) -> String {
        query.replace(['-', '+'], " ")
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Paper>> {
        let url = format!(
            "{}/paper/search?query={}&limit={}&fields={}",
            self.base,
            urlencoding::encode(&Self::sanitize_query(query)),
            limit,
            FIELDS
        );
        let response = self
            .transport
            .get_with_headers(SOURCE, &url, &self.headers())
            .await?;
        let body = response.json()?;
        let data = body
            .get("data")
            .and_then(|d| d.as_array())
            .cloned()
            .unwrap_or_default();
        let mut papers: Vec<Paper> = data.iter().map(normalize_paper).collect();
        papers.truncate(limit);
        Ok(papers)
    }

    /// POST id batches of at most 500, in order; failed batches are
    /// logged and skipped, unknown ids arrive as nulls and are dropped
    async fn fetch_batch(&self, ids: &[String]) -> Vec<Paper> {
        let url = format!("{}/paper/batch?fields={}", self.base, FIELDS);
        let mut papers = Vec::with_capacity(ids.len());
        for body in batch_bodies(ids) {
            match self
                .transport
                .post_json_with_headers(SOURCE, &url, &body, &self.headers())
                .await
            {
                Ok(response) => {
                    if let Ok(Value::Array(entries)) = response.json().map(|v| v.clone()) {
                        papers.extend(
                            entries
                                .iter()
                                .filter(|e| !e.is_null())
                                .map(normalize_paper),
                        );
                    }
                }
                Err(e) => {
                    warn!(source = SOURCE, error = %e, "Batch fetch failed; skipping batch");
                }
            }
        }
        papers
    }
}

/// Split ids into `{"ids": [...]}` bodies of at most 500 each
fn batch_bodies(ids: &[String]) -> Vec<Value> {
    ids.chunks(BATCH_LIMIT)
        .map(|chunk| serde_json::json!({ "ids": chunk }))
        .collect()
}

#[async_trait]
impl SourceAdapter for SemanticScholarAdapter {
    fn name(&self) -> &'static str {
        SOURCE
    }

    async fn search_by_topic(&self, query: &str, limit: usize) -> Result<Vec<Paper>> {
        self.search(query, limit).await
    }

    async fn search_by_title(&self, title: &str, limit: usize) -> Result<Vec<Paper>> {
        self.search(title, limit).await
    }

    async fn fetch_paper(&self, id: &str) -> Result<Option<Paper>> {
        let url = format!("{}/paper/{}?fields={}", self.base, id, FIELDS);
        match self
            .transport
            .get_with_headers(SOURCE, &url, &self.headers())
            .await
        {
            Ok(response) => Ok(response.json().ok().map(normalize_paper)),
            Err(e) => {
                warn!(source = SOURCE, id, error = %e, "Paper fetch failed");
                Ok(None)
            }
        }
    }

    async fn fetch_references(&self, paper_id: &str, limit: usize) -> Result<Vec<Paper>> {
        let url = format!(
            "{}/paper/{}/references?fields=paperId&limit={}",
            self.base, paper_id, limit
        );
        let ids: Vec<String> = match self
            .transport
            .get_with_headers(SOURCE, &url, &self.headers())
            .await
        {
            Ok(response) => response
                .json()
                .ok()
                .and_then(|body| body.get("data").and_then(|d| d.as_array()).cloned())
                .map(|entries| {
                    entries
                        .iter()
                        .filter_map(|e| e.get("citedPaper"))
                        .filter_map(|p| json_str(p, "paperId"))
                        .take(limit)
                        .collect()
                })
                .unwrap_or_default(),
            Err(e) => {
                warn!(source = SOURCE, paper_id, error = %e, "Reference fetch failed");
                return Ok(Vec::new());
            }
        };
        Ok(self.fetch_batch(&ids).await)
    }

    async fn fetch_citations(&self, paper_id: &str, limit: usize) -> Result<Vec<Paper>> {
        let url = format!(
            "{}/paper/{}/citations?fields={}&limit={}",
            self.base, paper_id, FIELDS, limit
        );
        match self
            .transport
            .get_with_headers(SOURCE, &url, &self.headers())
            .await
        {
            Ok(response) => {
                let papers = response
                    .json()
                    .ok()
                    .and_then(|body| body.get("data").and_then(|d| d.as_array()).cloned())
                    .map(|entries| {
                        entries
                            .iter()
                            .filter_map(|e| e.get("citingPaper"))
                            .map(normalize_paper)
                            .take(limit)
                            .collect()
                    })
                    .unwrap_or_default();
                Ok(papers)
            }
            Err(e) => {
                warn!(source = SOURCE, paper_id, error = %e, "Citation fetch failed");
                Ok(Vec::new())
            }
        }
    }
}

/// Normalize one Semantic Scholar paper into the canonical record
pub fn normalize_paper(paper: &Value) -> Paper {
    let external_ids = paper.get("externalIds");
    let doi = external_ids
        .and_then(|ids| json_str(ids, "DOI"))
        .map(|d| strip_doi_prefix(&d));
    let arxiv_id = external_ids.and_then(|ids| json_str(ids, "ArXiv"));

    let keywords: Vec<String> = paper
        .get("fieldsOfStudy")
        .and_then(|f| f.as_array())
        .map(|fields| {
            fields
                .iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default();

    Paper {
        id: None,
        source: SOURCE.to_string(),
        source_id: json_str(paper, "paperId").unwrap_or_default(),
        doi,
        arxiv_id,
        title: json_str(paper, "title").unwrap_or_else(|| "Untitled".to_string()),
        abstract_text: json_str(paper, "abstract"),
        year: paper.get("year").and_then(|y| y.as_i64()).map(|y| y as i32),
        venue: json_str(paper, "venue"),
        url: json_str(paper, "url"),
        citation_count: paper
            .get("citationCount")
            .and_then(|c| c.as_i64())
            .unwrap_or(0),
        influence_score: 0.0,
        keywords: (!keywords.is_empty())
            .then(|| serde_json::to_string(&keywords).unwrap_or_default()),
        concepts: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sanitize_query() {
        assert_eq!(
            SemanticScholarAdapter::sanitize_query("self-supervised + contrastive"),
            "self supervised   contrastive"
        );
    }

    #[test]
    fn test_batch_bodies_split_at_500() {
        let ids: Vec<String> = (0..600).map(|i| format!("id{}", i)).collect();
        let bodies = batch_bodies(&ids);
        assert_eq!(bodies.len(), 2);
        assert_eq!(bodies[0]["ids"].as_array().unwrap().len(), 500);
        assert_eq!(bodies[1]["ids"].as_array().unwrap().len(), 100);

        let small: Vec<String> = (0..10).map(|i| format!("id{}", i)).collect();
        assert_eq!(batch_bodies(&small).len(), 1);
    }

    #[test]
    fn test_normalize_paper_full() {
        let raw = json!({
            "paperId": "649def34f8be52c8b66281af98ae884c09aef38b",
            "title": "BERT: Pre-training of Deep Bidirectional Transformers",
            "abstract": "We introduce a new language representation model.",
            "year": 2019,
            "venue": "NAACL",
            "url": "https://www.semanticscholar.org/paper/649def34",
            "citationCount": 80000,
            "externalIds": {"DOI": "10.18653/v1/N19-1423", "ArXiv": "1810.04805"},
            "fieldsOfStudy": ["Computer Science"]
        });
        let paper = normalize_paper(&raw);
        assert_eq!(paper.source, "s2");
        assert_eq!(paper.source_id, "649def34f8be52c8b66281af98ae884c09aef38b");
        assert_eq!(paper.doi.as_deref(), Some("10.18653/v1/N19-1423"));
        assert_eq!(paper.arxiv_id.as_deref(), Some("1810.04805"));
        assert_eq!(paper.year, Some(2019));
        assert_eq!(paper.citation_count, 80000);
        assert!(paper.keywords.as_deref().unwrap().contains("Computer Science"));
    }

    #[test]
    fn test_normalize_paper_defaults() {
        let paper = normalize_paper(&json!({"paperId": "abc"}));
        assert_eq!(paper.title, "Untitled");
        assert!(paper.abstract_text.is_none());
        assert_eq!(paper.citation_count, 0);
    }
}
