//! Source adapters
//!
//! An adapter maps one remote bibliographic API onto the canonical
//! Paper record and exposes five operations. Search failures propagate
//! (the build cannot start without seeds); single-fetch failures are
//! logged and degrade to empty results so traversal continues.

mod openalex;
mod s2;

pub use openalex::OpenAlexAdapter;
pub use s2::SemanticScholarAdapter;

use async_trait::async_trait;
use papergraph_common::config::AppConfig;
use papergraph_common::errors::{AppError, Result};
use papergraph_common::http::Transport;
use papergraph_common::models::Paper;
use regex::Regex;
use std::sync::{Arc, OnceLock};

/// A remote bibliographic source normalized to Paper records
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Adapter tag, also written into `Paper::source`
    fn name(&self) -> &'static str;

    /// Relevance-ordered topic search. Errors propagate.
    async fn search_by_topic(&self, query: &str, limit: usize) -> Result<Vec<Paper>>;

    /// Title search, exact-ish first. Errors propagate.
    async fn search_by_title(&self, title: &str, limit: usize) -> Result<Vec<Paper>>;

    /// Fetch one paper by a source id or DOI. Transport failures are
    /// logged and yield None.
    async fn fetch_paper(&self, id: &str) -> Result<Option<Paper>>;

    /// Outgoing references of a paper, up to `limit`. Transport
    /// failures are logged and yield an empty list.
    async fn fetch_references(&self, paper_id: &str, limit: usize) -> Result<Vec<Paper>>;

    /// Incoming citations of a paper, up to `limit`. Transport
    /// failures are logged and yield an empty list.
    async fn fetch_citations(&self, paper_id: &str, limit: usize) -> Result<Vec<Paper>>;
}

/// Select an adapter by source tag
pub fn create_adapter(
    source: &str,
    transport: Arc<Transport>,
    config: &AppConfig,
) -> Result<Arc<dyn SourceAdapter>> {
    match source {
        "openalex" => Ok(Arc::new(OpenAlexAdapter::new(
            transport,
            config.keys.openalex.clone(),
            Some(config.contact_email.clone()),
        ))),
        "s2" => Ok(Arc::new(SemanticScholarAdapter::new(
            transport,
            config.keys.s2.clone(),
        ))),
        other => Err(AppError::InvalidSource {
            source_name: other.to_string(),
        }),
    }
}

/// Strip DOI URL prefixes down to the bare `10.x/...` form
pub fn strip_doi_prefix(raw: &str) -> String {
    raw.trim()
        .trim_start_matches("https://doi.org/")
        .trim_start_matches("http://doi.org/")
        .trim_start_matches("https://dx.doi.org/")
        .trim_start_matches("http://dx.doi.org/")
        .to_string()
}

fn arxiv_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)arxiv\.org/abs/(\d{4}\.\d{4,5}(?:v\d+)?)").expect("arxiv url regex")
    })
}

fn arxiv_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)arxiv:(\d{4}\.\d{4,5}(?:v\d+)?)").expect("arxiv prefix regex")
    })
}

fn arxiv_bare_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}\.\d{4,5}(?:v\d+)?$").expect("arxiv bare regex"))
}

/// Extract an arXiv id from a URL, an `arXiv:` prefix, or a bare id
pub fn extract_arxiv_id(value: &str) -> Option<String> {
    let value = value.trim();
    if let Some(caps) = arxiv_url_re().captures(value) {
        return Some(caps[1].to_string());
    }
    if let Some(caps) = arxiv_prefix_re().captures(value) {
        return Some(caps[1].to_string());
    }
    if arxiv_bare_re().is_match(value) {
        return Some(value.to_string());
    }
    None
}

/// Non-empty JSON string field, or None
pub(crate) fn json_str(value: &serde_json::Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}
