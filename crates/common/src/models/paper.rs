//! Paper record

use serde::{Deserialize, Serialize};

/// The canonical record for one academic paper.
///
/// `(source, source_id)` is the natural key; `id` is assigned by the
/// store on first insert and is `None` until then.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Paper {
    /// Internal store id (rowid), assigned on insert
    pub id: Option<i64>,

    /// Adapter tag that produced this record ("openalex" or "s2")
    pub source: String,

    /// Adapter-native identifier
    pub source_id: String,

    /// DOI with any URL prefix stripped
    pub doi: Option<String>,

    /// arXiv identifier, e.g. "2106.09685" or "2106.09685v2"
    pub arxiv_id: Option<String>,

    /// Title; adapters default this to "Untitled" when absent
    pub title: String,

    /// Abstract; publishers withhold many recent ones
    pub abstract_text: Option<String>,

    pub year: Option<i32>,

    pub venue: Option<String>,

    /// Landing URL
    pub url: Option<String>,

    /// Citation count as reported by the source
    pub citation_count: i64,

    /// Overwritten with normalized PageRank after each build
    pub influence_score: f64,

    /// Keywords as a stable JSON array string, when the source has them
    pub keywords: Option<String>,

    /// Concept/topic annotations as a stable JSON string
    pub concepts: Option<String>,
}

impl Paper {
    /// Natural key for dedup sets and store lookups
    pub fn key(&self) -> (String, String) {
        (self.source.clone(), self.source_id.clone())
    }

    /// Decode the keywords JSON array, tolerating malformed blobs
    pub fn keyword_list(&self) -> Vec<String> {
        self.keywords
            .as_deref()
            .and_then(|raw| serde_json::from_str::<Vec<String>>(raw).ok())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_list_decoding() {
        let paper = Paper {
            keywords: Some(r#"["speech","transformers"]"#.to_string()),
            ..Paper::default()
        };
        assert_eq!(paper.keyword_list(), vec!["speech", "transformers"]);
    }

    #[test]
    fn test_keyword_list_tolerates_garbage() {
        let paper = Paper {
            keywords: Some("not json".to_string()),
            ..Paper::default()
        };
        assert!(paper.keyword_list().is_empty());

        let paper = Paper::default();
        assert!(paper.keyword_list().is_empty());
    }
}
