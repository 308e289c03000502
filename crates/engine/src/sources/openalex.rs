//! OpenAlex adapter
//!
//! Works API under https://api.openalex.org. Abstracts arrive as an
//! inverted index and are reconstructed into plain text. An API key and
//! a polite-pool mailto are appended as query parameters when set.

use super::{extract_arxiv_id, json_str, strip_doi_prefix, SourceAdapter};
use async_trait::async_trait;
use papergraph_common::errors::Result;
use papergraph_common::http::Transport;
use papergraph_common::models::Paper;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

const SOURCE: &str = "openalex";
const BASE_URL: &str = "https://api.openalex.org";

/// OpenAlex caps id-filter batches at 50 works per request
const BATCH_SIZE: usize = 50;

pub struct OpenAlexAdapter {
    transport: Arc<Transport>,
    base: String,
    api_key: Option<String>,
    mailto: Option<String>,
}

impl OpenAlexAdapter {
    pub fn new(
        transport: Arc<Transport>,
        api_key: Option<String>,
        mailto: Option<String>,
    ) -> Self {
        Self {
            transport,
            base: BASE_URL.to_string(),
            api_key,
            mailto,
        }
    }

    /// Join query params, appending api_key and mailto when configured
    fn url(&self, path: &str, params: Vec<String>) -> String {
        let mut params = params;
        if let Some(ref key) = self.api_key {
            params.push(format!("api_key={}", key));
        }
        if let Some(ref mailto) = self.mailto {
            params.push(format!("mailto={}", mailto));
        }
        if params.is_empty() {
            format!("{}/{}", self.base, path)
        } else {
            format!("{}/{}?{}", self.base, path, params.join("&"))
        }
    }

    /// Bare ids become full OpenAlex URLs; URLs pass through
    fn normalized_id(id: &str) -> String {
        if id.starts_with("https://") || id.starts_with("http://") {
            id.to_string()
        } else {
            format!("https://openalex.org/{}", id)
        }
    }

    /// Trailing path segment of an OpenAlex URL ("W123...")
    fn short_id(raw: &str) -> &str {
        raw.rsplit('/').next().unwrap_or(raw)
    }

    async fn search(&self, params: Vec<String>) -> Result<Vec<Paper>> {
        let url = self.url("works", params);
        let response = self.transport.get(SOURCE, &url).await?;
        let body = response.json()?;
        let results = body
            .get("results")
            .and_then(|r| r.as_array())
            .cloned()
            .unwrap_or_default();
        Ok(results.iter().map(normalize_work).collect())
    }

    /// Fetch the raw work JSON; transport failures degrade to None
    async fn fetch_work(&self, id: &str) -> Option<Value> {
        let path = format!("works/{}", Self::normalized_id(id));
        let url = self.url(&path, Vec::new());
        match self.transport.get(SOURCE, &url).await {
            Ok(response) => response.json().ok().cloned(),
            Err(e) => {
                warn!(source = SOURCE, id, error = %e, "Paper fetch failed");
                None
            }
        }
    }

    /// Fetch works by id in batches of 50 using the id filter.
    /// Per-batch failures are logged and skipped.
    async fn batch_fetch(&self, ids: &[String]) -> Vec<Paper> {
        let mut papers = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(BATCH_SIZE) {
            let filter = format!("filter=openalex:{}", chunk.join("|"));
            let params = vec![filter, format!("per_page={}", BATCH_SIZE)];
            let url = self.url("works", params);
            match self.transport.get(SOURCE, &url).await {
                Ok(response) => {
                    if let Ok(body) = response.json() {
                        if let Some(results) = body.get("results").and_then(|r| r.as_array()) {
                            papers.extend(results.iter().map(normalize_work));
                        }
                    }
                }
                Err(e) => {
                    warn!(
                        source = SOURCE,
                        batch = chunk.len(),
                        error = %e,
                        "Batch fetch failed; skipping batch"
                    );
                }
            }
        }
        papers
    }
}

#[async_trait]
impl SourceAdapter for OpenAlexAdapter {
    fn name(&self) -> &'static str {
        SOURCE
    }

    async fn search_by_topic(&self, query: &str, limit: usize) -> Result<Vec<Paper>> {
        let params = vec![
            format!("search={}", urlencoding::encode(query)),
            "sort=cited_by_count:desc".to_string(),
            format!("per_page={}", limit.min(200)),
        ];
        let mut papers = self.search(params).await?;
        papers.truncate(limit);
        Ok(papers)
    }

    async fn search_by_title(&self, title: &str, limit: usize) -> Result<Vec<Paper>> {
        let params = vec![
            format!("filter=title.search:{}", urlencoding::encode(title)),
            format!("per_page={}", limit.min(200)),
        ];
        let mut papers = self.search(params).await?;
        if papers.is_empty() {
            // exact-ish title filter missed; fall back to general search
            papers = self.search_by_topic(title, limit).await?;
        }
        papers.truncate(limit);
        Ok(papers)
    }

    async fn fetch_paper(&self, id: &str) -> Result<Option<Paper>> {
        Ok(self.fetch_work(id).await.as_ref().map(normalize_work))
    }

    async fn fetch_references(&self, paper_id: &str, limit: usize) -> Result<Vec<Paper>> {
        let Some(work) = self.fetch_work(paper_id).await else {
            return Ok(Vec::new());
        };
        let ids: Vec<String> = work
            .get("referenced_works")
            .and_then(|r| r.as_array())
            .map(|refs| {
                refs.iter()
                    .filter_map(|v| v.as_str())
                    .take(limit)
                    .map(|url| Self::short_id(url).to_string())
                    .collect()
            })
            .unwrap_or_default();
        Ok(self.batch_fetch(&ids).await)
    }

    async fn fetch_citations(&self, paper_id: &str, limit: usize) -> Result<Vec<Paper>> {
        let params = vec![
            format!("filter=cites:{}", Self::normalized_id(paper_id)),
            "sort=cited_by_count:desc".to_string(),
            format!("per_page={}", limit.min(200)),
        ];
        let url = self.url("works", params);
        match self.transport.get(SOURCE, &url).await {
            Ok(response) => {
                let mut papers: Vec<Paper> = response
                    .json()
                    .ok()
                    .and_then(|body| body.get("results").and_then(|r| r.as_array()).cloned())
                    .map(|results| results.iter().map(normalize_work).collect())
                    .unwrap_or_default();
                papers.truncate(limit);
                Ok(papers)
            }
            Err(e) => {
                warn!(source = SOURCE, paper_id, error = %e, "Citation fetch failed");
                Ok(Vec::new())
            }
        }
    }
}

/// Rebuild an abstract from OpenAlex's `{word: [positions...]}` form.
///
/// Entries whose positions are not an array are ignored, as are
/// non-numeric or negative positions. An empty or null index yields
/// None. Duplicate positions are preserved.
pub fn reconstruct_abstract(index: &Value) -> Option<String> {
    let map = index.as_object()?;
    let mut positioned: Vec<(u64, &str)> = Vec::new();
    for (word, positions) in map {
        let Some(positions) = positions.as_array() else {
            continue;
        };
        for position in positions {
            if let Some(p) = position.as_u64() {
                positioned.push((p, word.as_str()));
            }
        }
    }
    if positioned.is_empty() {
        return None;
    }
    positioned.sort_by_key(|(p, _)| *p);
    Some(
        positioned
            .iter()
            .map(|(_, w)| *w)
            .collect::<Vec<_>>()
            .join(" "),
    )
}

/// Normalize one OpenAlex work into the canonical Paper record
pub fn normalize_work(work: &Value) -> Paper {
    let source_id = json_str(work, "id")
        .map(|id| OpenAlexAdapter::short_id(&id).to_string())
        .unwrap_or_default();

    let title = json_str(work, "display_name")
        .or_else(|| json_str(work, "title"))
        .unwrap_or_else(|| "Untitled".to_string());

    let doi = json_str(work, "doi").map(|d| strip_doi_prefix(&d));

    let primary_location = work.get("primary_location");
    let venue = primary_location
        .and_then(|loc| loc.get("source"))
        .and_then(|s| json_str(s, "display_name"));
    let landing_url = primary_location
        .and_then(|loc| json_str(loc, "landing_page_url"))
        .or_else(|| json_str(work, "id"));
    let pdf_url = primary_location.and_then(|loc| json_str(loc, "pdf_url"));

    let arxiv_id = [landing_url.as_deref(), pdf_url.as_deref(), doi.as_deref()]
        .iter()
        .flatten()
        .find_map(|candidate| extract_arxiv_id(candidate));

    let abstract_text = work
        .get("abstract_inverted_index")
        .and_then(reconstruct_abstract);

    let keywords: Vec<String> = work
        .get("keywords")
        .and_then(|k| k.as_array())
        .map(|entries| {
            entries
                .iter()
                .filter_map(|e| json_str(e, "display_name"))
                .collect()
        })
        .unwrap_or_default();

    let concepts: Vec<Value> = work
        .get("concepts")
        .and_then(|c| c.as_array())
        .map(|entries| {
            entries
                .iter()
                .filter_map(|e| {
                    let name = json_str(e, "display_name")?;
                    let score = e.get("score").and_then(|s| s.as_f64()).unwrap_or(0.0);
                    Some(serde_json::json!({"name": name, "score": score}))
                })
                .collect()
        })
        .unwrap_or_default();

    Paper {
        id: None,
        source: SOURCE.to_string(),
        source_id,
        doi,
        arxiv_id,
        title,
        abstract_text,
        year: work
            .get("publication_year")
            .and_then(|y| y.as_i64())
            .map(|y| y as i32),
        venue,
        url: landing_url,
        citation_count: work
            .get("cited_by_count")
            .and_then(|c| c.as_i64())
            .unwrap_or(0),
        influence_score: 0.0,
        keywords: (!keywords.is_empty())
            .then(|| serde_json::to_string(&keywords).unwrap_or_default()),
        concepts: (!concepts.is_empty())
            .then(|| serde_json::to_string(&concepts).unwrap_or_default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reconstruct_simple() {
        let index = json!({"This": [0], "is": [1], "a": [2], "test": [3]});
        assert_eq!(
            reconstruct_abstract(&index),
            Some("This is a test".to_string())
        );
    }

    #[test]
    fn test_reconstruct_duplicate_positions() {
        let index = json!({"the": [0, 3], "cat": [1], "chased": [2], "mouse": [4]});
        assert_eq!(
            reconstruct_abstract(&index),
            Some("the cat chased the mouse".to_string())
        );
    }

    #[test]
    fn test_reconstruct_null_and_empty() {
        assert_eq!(reconstruct_abstract(&Value::Null), None);
        assert_eq!(reconstruct_abstract(&json!({})), None);
    }

    #[test]
    fn test_reconstruct_ignores_malformed_entries() {
        let index = json!({
            "good": [0],
            "bad-positions": "not-an-array",
            "negative": [-3],
            "fractional": [1.5],
            "fine": [1]
        });
        assert_eq!(reconstruct_abstract(&index), Some("good fine".to_string()));
    }

    #[test]
    fn test_normalize_work_full() {
        let work = json!({
            "id": "https://openalex.org/W2036113194",
            "display_name": "Attention Is All You Need",
            "doi": "https://doi.org/10.48550/arxiv.1706.03762",
            "publication_year": 2017,
            "cited_by_count": 100000,
            "primary_location": {
                "landing_page_url": "https://arxiv.org/abs/1706.03762",
                "source": {"display_name": "NeurIPS"}
            },
            "abstract_inverted_index": {"Attention": [0], "works": [1]},
            "keywords": [{"display_name": "transformers"}],
            "concepts": [{"display_name": "Deep learning", "score": 0.9}]
        });
        let paper = normalize_work(&work);
        assert_eq!(paper.source, "openalex");
        assert_eq!(paper.source_id, "W2036113194");
        assert_eq!(paper.doi.as_deref(), Some("10.48550/arxiv.1706.03762"));
        assert_eq!(paper.arxiv_id.as_deref(), Some("1706.03762"));
        assert_eq!(paper.year, Some(2017));
        assert_eq!(paper.venue.as_deref(), Some("NeurIPS"));
        assert_eq!(paper.citation_count, 100000);
        assert_eq!(paper.abstract_text.as_deref(), Some("Attention works"));
        assert!(paper.keywords.as_deref().unwrap().contains("transformers"));
    }

    #[test]
    fn test_normalize_work_defaults() {
        let paper = normalize_work(&json!({"id": "https://openalex.org/W1"}));
        assert_eq!(paper.title, "Untitled");
        assert_eq!(paper.citation_count, 0);
        assert!(paper.abstract_text.is_none());
        assert!(paper.keywords.is_none());
    }

    #[test]
    fn test_normalized_id_forms() {
        assert_eq!(
            OpenAlexAdapter::normalized_id("W123"),
            "https://openalex.org/W123"
        );
        assert_eq!(
            OpenAlexAdapter::normalized_id("https://openalex.org/W123"),
            "https://openalex.org/W123"
        );
        assert_eq!(
            OpenAlexAdapter::short_id("https://openalex.org/W123"),
            "W123"
        );
    }
}
