//! PaperGraph Common Library
//!
//! Shared code for the PaperGraph build engine and CLI including:
//! - Canonical data model (papers, edges, clusters, entities, runs)
//! - Embedded relational store and schema migrations
//! - Rate-limited HTTP transport with retry and response caching
//! - Error types and handling
//! - Configuration management

pub mod config;
pub mod errors;
pub mod http;
pub mod models;
pub mod store;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::{AppError, Result};
pub use models::{Cluster, Edge, EdgeType, Paper, RunRecord};
pub use store::Store;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent required by the OpenAlex polite pool
pub fn user_agent(contact_email: &str) -> String {
    format!("PaperGraph/{} (mailto:{})", VERSION, contact_email)
}
