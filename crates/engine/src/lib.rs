//! PaperGraph build engine
//!
//! Everything between the HTTP transport and the persisted artifact:
//! - Source adapters normalizing remote bibliographic APIs
//! - Deterministic tokenizer and TF-IDF corpus
//! - Similarity, co-citation, and bibliographic-coupling edge builders
//! - PageRank and Louvain over the citation graph
//! - Composite scoring and entity dictionary extraction
//! - The build orchestrator sequencing all of the above

pub mod analytics;
pub mod builder;
pub mod entities;
pub mod graph;
pub mod scoring;
pub mod sources;
pub mod text;

pub use builder::{BuildRequest, GraphBuilder};
pub use sources::{create_adapter, SourceAdapter};
pub use text::Corpus;
