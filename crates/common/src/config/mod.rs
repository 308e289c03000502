//! Configuration management for PaperGraph
//!
//! Supports loading configuration from (highest precedence first):
//! - CLI flags (applied by the binary after loading)
//! - Environment variables (`OPENALEX_API_KEY`, `S2_API_KEY`,
//!   `OPENAI_API_KEY`)
//! - A `papergraph.json` file discovered from the working directory upward
//! - Built-in defaults

use crate::errors::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Config file name searched for from the working directory upward
pub const CONFIG_FILE_NAME: &str = "papergraph.json";

/// Which edge classes a build emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Spine {
    Citation,
    Similarity,
    CoCitation,
    Coupling,
    Hybrid,
}

impl Spine {
    /// Whether this spine emits SIMILAR_TEXT edges
    pub fn wants_similarity(&self) -> bool {
        matches!(self, Spine::Similarity | Spine::Hybrid)
    }

    /// Whether this spine emits CO_CITED edges
    pub fn wants_co_citation(&self) -> bool {
        matches!(self, Spine::CoCitation | Spine::Hybrid)
    }

    /// Whether this spine emits BIB_COUPLED edges
    pub fn wants_coupling(&self) -> bool {
        matches!(self, Spine::Coupling | Spine::Hybrid)
    }
}

impl fmt::Display for Spine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Spine::Citation => "citation",
            Spine::Similarity => "similarity",
            Spine::CoCitation => "co-citation",
            Spine::Coupling => "coupling",
            Spine::Hybrid => "hybrid",
        };
        f.write_str(tag)
    }
}

impl FromStr for Spine {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "citation" => Ok(Spine::Citation),
            "similarity" => Ok(Spine::Similarity),
            "co-citation" => Ok(Spine::CoCitation),
            "coupling" => Ok(Spine::Coupling),
            "hybrid" => Ok(Spine::Hybrid),
            other => Err(AppError::InvalidSpine {
                spine: other.to_string(),
            }),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    /// Bibliographic source: "openalex" or "s2"
    pub source: String,

    /// Edge classes to emit
    pub spine: Spine,

    /// BFS traversal depth
    pub depth: usize,

    /// Hard cap on papers persisted per build
    pub max_papers: usize,

    /// References fetched per paper during traversal
    pub max_refs_per_paper: usize,

    /// Citations fetched per paper (citation-direction expansion)
    pub max_cites_per_paper: usize,

    /// Inclusive publication-year window (None = unbounded)
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,

    /// Output database path
    pub out: PathBuf,

    /// Contact email for the OpenAlex polite pool User-Agent
    pub contact_email: String,

    /// Text-similarity edge settings
    pub similarity: SimilarityConfig,

    /// Community-detection settings
    pub clustering: ClusteringConfig,

    /// Composite-score weights
    pub ranking: RankingConfig,

    /// Entity dictionary extraction
    pub entities: EntitiesConfig,

    /// LLM edge labeling (recognized but not wired by the core)
    pub llm: LlmConfig,

    /// HTTP response cache
    pub cache: CacheSettings,

    /// HTTP transport tuning
    pub http: HttpSettings,

    /// API keys, populated from the environment only
    #[serde(skip)]
    pub keys: ApiKeys,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimilarityConfig {
    pub enabled: bool,
    pub top_k: usize,
    pub threshold: f64,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            top_k: 10,
            threshold: 0.25,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusteringConfig {
    pub enabled: bool,
    /// Community-detection method tag recorded on cluster rows
    pub method: String,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            method: "louvain_citation".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RankingConfig {
    pub pagerank_weight: f64,
    pub relevance_weight: f64,
    pub recency_weight: f64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            pagerank_weight: 0.5,
            relevance_weight: 0.3,
            recency_weight: 0.2,
        }
    }
}

impl RankingConfig {
    /// Weights as a tuple, in (pagerank, relevance, recency) order
    pub fn weights(&self) -> (f64, f64, f64) {
        (
            self.pagerank_weight,
            self.relevance_weight,
            self.recency_weight,
        )
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EntitiesConfig {
    pub enabled: bool,
}

impl Default for EntitiesConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct LlmConfig {
    pub enabled: bool,
    pub provider: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheSettings {
    pub enabled: bool,
    pub dir: PathBuf,
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from("./.papergraph-cache"),
            ttl_secs: 24 * 60 * 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub initial_backoff_secs: u64,
    pub max_backoff_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 3,
            initial_backoff_secs: 1,
            max_backoff_secs: 30,
        }
    }
}

impl HttpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// API keys read from the environment; never serialized
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    pub openalex: Option<String>,
    pub s2: Option<String>,
    pub openai: Option<String>,
}

impl ApiKeys {
    fn from_env() -> Self {
        Self {
            openalex: std::env::var("OPENALEX_API_KEY").ok(),
            s2: std::env::var("S2_API_KEY").ok(),
            openai: std::env::var("OPENAI_API_KEY").ok(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source: "openalex".to_string(),
            spine: Spine::Citation,
            depth: 2,
            max_papers: 100,
            max_refs_per_paper: 20,
            max_cites_per_paper: 20,
            year_from: None,
            year_to: None,
            out: PathBuf::from("papergraph.db"),
            contact_email: "papergraph@example.org".to_string(),
            similarity: SimilarityConfig::default(),
            clustering: ClusteringConfig::default(),
            ranking: RankingConfig::default(),
            entities: EntitiesConfig::default(),
            llm: LlmConfig::default(),
            cache: CacheSettings::default(),
            http: HttpSettings::default(),
            keys: ApiKeys::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration: built-in defaults overlaid by the discovered
    /// JSON file, then API keys from the environment.
    ///
    /// `explicit_file` bypasses discovery; a missing explicit file is a
    /// configuration error, a missing discovered file is fine.
    pub fn load(explicit_file: Option<&Path>) -> Result<Self> {
        let file = match explicit_file {
            Some(path) => {
                if !path.exists() {
                    return Err(AppError::Configuration {
                        message: format!("config file not found: {}", path.display()),
                    });
                }
                Some(path.to_path_buf())
            }
            None => discover_config_file(&std::env::current_dir()?),
        };

        let mut cfg = match file {
            Some(path) => {
                let raw = std::fs::read_to_string(&path)?;
                serde_json::from_str::<AppConfig>(&raw).map_err(|e| AppError::Configuration {
                    message: format!("malformed config {}: {}", path.display(), e),
                })?
            }
            None => AppConfig::default(),
        };

        cfg.keys = ApiKeys::from_env();
        Ok(cfg)
    }

    /// Validate the effective configuration before any I/O
    pub fn validate(&self) -> Result<()> {
        match self.source.as_str() {
            "openalex" | "s2" => {}
            "mixed" => {
                return Err(AppError::Configuration {
                    message: "source 'mixed' is not a defined selection policy; \
                              pick 'openalex' or 's2'"
                        .to_string(),
                })
            }
            other => {
                return Err(AppError::InvalidSource {
                    source_name: other.to_string(),
                })
            }
        }

        if self.max_papers == 0 {
            return Err(AppError::Configuration {
                message: "maxPapers must be at least 1".to_string(),
            });
        }

        let (wp, wr, wy) = self.ranking.weights();
        if (wp + wr + wy - 1.0).abs() > 1e-6 {
            return Err(AppError::Configuration {
                message: format!(
                    "ranking weights must sum to 1.0 (got {})",
                    wp + wr + wy
                ),
            });
        }

        if !(0.0..=1.0).contains(&self.similarity.threshold) {
            return Err(AppError::Configuration {
                message: "similarity.threshold must be within [0, 1]".to_string(),
            });
        }

        if let (Some(from), Some(to)) = (self.year_from, self.year_to) {
            if from > to {
                return Err(AppError::Configuration {
                    message: format!("yearFrom {} exceeds yearTo {}", from, to),
                });
            }
        }

        Ok(())
    }

    /// Seed cap: 40% of the paper cap, clamped to [10, 200]
    pub fn seed_limit(&self) -> usize {
        ((self.max_papers as f64 * 0.4).floor() as usize).clamp(10, 200)
    }

    /// Effective config snapshot for the run row, with secrets nulled
    pub fn snapshot(&self) -> serde_json::Value {
        // ApiKeys is #[serde(skip)], so the snapshot never sees key material
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Walk from `start` upward looking for the nearest config file
fn discover_config_file(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(d) = dir {
        let candidate = d.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        dir = d.parent();
    }
    None
}
