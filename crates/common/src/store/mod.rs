//! Embedded relational store for PaperGraph
//!
//! Provides:
//! - Schema migration gated on SQLite's `user_version` counter
//! - Transactional bulk inserts for papers, edges, clusters, entities
//! - Idempotent paper upsert keyed by `(source, source_id)`
//! - Aggregate statistics for `inspect` and run records

mod schema;

use crate::errors::{AppError, Result};
use crate::models::{Cluster, Edge, EdgeType, EntityRecord, Paper, PaperEntityLink, RunRecord};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

/// Aggregate counts over the whole store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    pub papers: i64,
    pub edges: i64,
    pub clusters: i64,
    pub entities: i64,
    pub runs: i64,
    /// Edge counts keyed by type tag, sorted for stable serialization
    pub edges_by_type: BTreeMap<String, i64>,
}

/// Embedded store handle. One per build; not shared across threads.
pub struct Store {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Store {
    /// Open (or create) the store at `path` and migrate to the current
    /// schema version.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path)?;
        let mut store = Self {
            conn,
            path: Some(path),
        };
        store.initialize()?;
        Ok(store)
    }

    /// In-memory store for tests
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let mut store = Self { conn, path: None };
        store.initialize()?;
        Ok(store)
    }

    /// Database path (None for in-memory)
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn initialize(&mut self) -> Result<()> {
        // journal_mode reports the resulting mode ("memory" for
        // in-memory handles); treat it as advisory
        let _ = self.conn.pragma_update(None, "journal_mode", "WAL");
        self.conn.pragma_update(None, "foreign_keys", "ON")?;

        let version: i64 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?;

        if version < 1 {
            info!(from = version, to = 1, "Migrating store schema");
            let tx = self.conn.transaction()?;
            tx.execute_batch(schema::V1_MIGRATION)
                .map_err(|e| AppError::Migration {
                    message: e.to_string(),
                })?;
            tx.pragma_update(None, "user_version", 1)?;
            tx.commit()?;
        }

        Ok(())
    }

    // ========================================================================
    // Paper operations
    // ========================================================================

    /// Insert papers in one transaction, returning internal ids in input
    /// order. Rows colliding on `(source, source_id)` keep the existing
    /// row and resolve its id through a secondary lookup. Assigned ids
    /// are also written back into the given records.
    pub fn insert_papers(&mut self, papers: &mut [Paper]) -> Result<Vec<i64>> {
        let tx = self.conn.transaction()?;
        let mut ids = Vec::with_capacity(papers.len());
        {
            let mut insert = tx.prepare(
                "INSERT INTO papers (source, source_id, doi, arxiv_id, title, abstract,
                                     year, venue, url, citation_count, influence_score,
                                     keywords, concepts)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                 ON CONFLICT(source, source_id) DO NOTHING",
            )?;
            let mut lookup =
                tx.prepare("SELECT id FROM papers WHERE source = ?1 AND source_id = ?2")?;

            for paper in papers.iter_mut() {
                let changed = insert.execute(params![
                    paper.source,
                    paper.source_id,
                    paper.doi,
                    paper.arxiv_id,
                    paper.title,
                    paper.abstract_text,
                    paper.year,
                    paper.venue,
                    paper.url,
                    paper.citation_count,
                    paper.influence_score,
                    paper.keywords,
                    paper.concepts,
                ])?;

                let id = if changed > 0 {
                    tx.last_insert_rowid()
                } else {
                    lookup.query_row(params![paper.source, paper.source_id], |row| row.get(0))?
                };
                paper.id = Some(id);
                ids.push(id);
            }
        }
        tx.commit()?;
        Ok(ids)
    }

    /// Upsert one paper: title replaced, nullable fields coalesced
    /// toward the newest non-null value, citation_count kept at the max.
    pub fn upsert_paper(&self, paper: &Paper) -> Result<i64> {
        let id = self.conn.query_row(
            "INSERT INTO papers (source, source_id, doi, arxiv_id, title, abstract,
                                 year, venue, url, citation_count, influence_score,
                                 keywords, concepts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
             ON CONFLICT(source, source_id) DO UPDATE SET
                 title = excluded.title,
                 doi = COALESCE(excluded.doi, papers.doi),
                 arxiv_id = COALESCE(excluded.arxiv_id, papers.arxiv_id),
                 abstract = COALESCE(excluded.abstract, papers.abstract),
                 year = COALESCE(excluded.year, papers.year),
                 venue = COALESCE(excluded.venue, papers.venue),
                 url = COALESCE(excluded.url, papers.url),
                 citation_count = MAX(papers.citation_count, excluded.citation_count),
                 keywords = COALESCE(excluded.keywords, papers.keywords),
                 concepts = COALESCE(excluded.concepts, papers.concepts)
             RETURNING id",
            params![
                paper.source,
                paper.source_id,
                paper.doi,
                paper.arxiv_id,
                paper.title,
                paper.abstract_text,
                paper.year,
                paper.venue,
                paper.url,
                paper.citation_count,
                paper.influence_score,
                paper.keywords,
                paper.concepts,
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Resolve the internal id for a natural key
    pub fn find_paper_id(&self, source: &str, source_id: &str) -> Result<Option<i64>> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM papers WHERE source = ?1 AND source_id = ?2",
                params![source, source_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// All papers in insertion (id) order
    pub fn all_papers(&self) -> Result<Vec<Paper>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, source, source_id, doi, arxiv_id, title, abstract, year,
                    venue, url, citation_count, influence_score, keywords, concepts
             FROM papers ORDER BY id",
        )?;
        let rows = stmt.query_map([], row_to_paper)?;
        let mut papers = Vec::new();
        for row in rows {
            papers.push(row?);
        }
        Ok(papers)
    }

    pub fn paper_count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM papers", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Overwrite influence_score for a single paper
    pub fn update_paper_score(&self, paper_id: i64, score: f64) -> Result<()> {
        self.conn.execute(
            "UPDATE papers SET influence_score = ?1 WHERE id = ?2",
            params![score, paper_id],
        )?;
        Ok(())
    }

    // ========================================================================
    // Edge operations
    // ========================================================================

    /// Insert edges in one transaction, writing back assigned ids
    pub fn insert_edges(&mut self, edges: &mut [Edge]) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO edges (src, dst, type, weight, confidence, rationale,
                                    evidence, created_by, provenance)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for edge in edges.iter_mut() {
                let provenance = edge
                    .provenance
                    .as_ref()
                    .map(|p| serde_json::to_string(p))
                    .transpose()?;
                stmt.execute(params![
                    edge.src,
                    edge.dst,
                    edge.edge_type.as_str(),
                    edge.weight,
                    edge.confidence,
                    edge.rationale,
                    edge.evidence,
                    edge.created_by,
                    provenance,
                ])?;
                edge.id = Some(tx.last_insert_rowid());
            }
        }
        tx.commit()?;
        debug!(count = edges.len(), "Inserted edges");
        Ok(())
    }

    /// All edges, optionally filtered by type, in insertion order
    pub fn edges(&self, edge_type: Option<EdgeType>) -> Result<Vec<Edge>> {
        let mut out = Vec::new();
        match edge_type {
            Some(t) => {
                let mut stmt = self.conn.prepare(
                    "SELECT id, src, dst, type, weight, confidence, rationale,
                            evidence, created_by, provenance
                     FROM edges WHERE type = ?1 ORDER BY id",
                )?;
                let rows = stmt.query_map(params![t.as_str()], row_to_edge)?;
                for row in rows {
                    out.push(row?);
                }
            }
            None => {
                let mut stmt = self.conn.prepare(
                    "SELECT id, src, dst, type, weight, confidence, rationale,
                            evidence, created_by, provenance
                     FROM edges ORDER BY id",
                )?;
                let rows = stmt.query_map([], row_to_edge)?;
                for row in rows {
                    out.push(row?);
                }
            }
        }
        Ok(out)
    }

    // ========================================================================
    // Cluster operations
    // ========================================================================

    /// Insert clusters plus their paper_clusters junction rows in one
    /// transaction.
    pub fn insert_clusters(&mut self, clusters: &mut [Cluster]) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut insert_cluster = tx.prepare(
                "INSERT INTO clusters (method, name, description, stats)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            let mut insert_member =
                tx.prepare("INSERT INTO paper_clusters (paper_id, cluster_id) VALUES (?1, ?2)")?;

            for cluster in clusters.iter_mut() {
                insert_cluster.execute(params![
                    cluster.method,
                    cluster.name,
                    cluster.description,
                    serde_json::to_string(&cluster.stats)?,
                ])?;
                let cluster_id = tx.last_insert_rowid();
                cluster.id = Some(cluster_id);
                for paper_id in &cluster.members {
                    insert_member.execute(params![paper_id, cluster_id])?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }

    // ========================================================================
    // Entity operations
    // ========================================================================

    /// Insert entity rows and paper_entities links in one transaction.
    /// Link rows reference entities by their index into `entities`.
    pub fn insert_entities(
        &mut self,
        entities: &mut [EntityRecord],
        links: &[PaperEntityLink],
    ) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut insert_entity =
                tx.prepare("INSERT INTO entities (name, type, aliases) VALUES (?1, ?2, ?3)")?;
            let mut insert_link = tx.prepare(
                "INSERT OR IGNORE INTO paper_entities (paper_id, entity_id, role)
                 VALUES (?1, ?2, ?3)",
            )?;

            let mut ids = Vec::with_capacity(entities.len());
            for entity in entities.iter_mut() {
                insert_entity.execute(params![
                    entity.name,
                    entity.entity_type,
                    serde_json::to_string(&entity.aliases)?,
                ])?;
                let id = tx.last_insert_rowid();
                entity.id = Some(id);
                ids.push(id);
            }

            for link in links {
                let entity_id = ids.get(link.entity_index).ok_or_else(|| {
                    AppError::Internal {
                        message: format!("entity link index {} out of range", link.entity_index),
                    }
                })?;
                insert_link.execute(params![link.paper_id, entity_id, link.role])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    // ========================================================================
    // Run and statistics
    // ========================================================================

    pub fn insert_run(&self, run: &RunRecord) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO runs (started_at, version, config, source, spine, depth, stats)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                run.started_at,
                run.version,
                serde_json::to_string(&run.config)?,
                run.source,
                run.spine,
                run.depth as i64,
                serde_json::to_string(&run.stats)?,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Aggregate counts in a single call
    pub fn stats(&self) -> Result<StoreStats> {
        let count = |sql: &str| -> Result<i64> {
            Ok(self.conn.query_row(sql, [], |row| row.get(0))?)
        };

        let mut edges_by_type = BTreeMap::new();
        let mut stmt = self
            .conn
            .prepare("SELECT type, COUNT(*) FROM edges GROUP BY type ORDER BY type")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (tag, n) = row?;
            edges_by_type.insert(tag, n);
        }

        Ok(StoreStats {
            papers: count("SELECT COUNT(*) FROM papers")?,
            edges: count("SELECT COUNT(*) FROM edges")?,
            clusters: count("SELECT COUNT(*) FROM clusters")?,
            entities: count("SELECT COUNT(*) FROM entities")?,
            runs: count("SELECT COUNT(*) FROM runs")?,
            edges_by_type,
        })
    }

    /// Close the handle explicitly; also happens on drop
    pub fn close(self) -> Result<()> {
        self.conn
            .close()
            .map_err(|(_, e)| AppError::Store(e))?;
        Ok(())
    }
}

fn row_to_paper(row: &Row<'_>) -> rusqlite::Result<Paper> {
    Ok(Paper {
        id: Some(row.get(0)?),
        source: row.get(1)?,
        source_id: row.get(2)?,
        doi: row.get(3)?,
        arxiv_id: row.get(4)?,
        title: row.get(5)?,
        abstract_text: row.get(6)?,
        year: row.get(7)?,
        venue: row.get(8)?,
        url: row.get(9)?,
        citation_count: row.get(10)?,
        influence_score: row.get(11)?,
        keywords: row.get(12)?,
        concepts: row.get(13)?,
    })
}

fn row_to_edge(row: &Row<'_>) -> rusqlite::Result<Edge> {
    let type_tag: String = row.get(3)?;
    let provenance: Option<String> = row.get(9)?;
    Ok(Edge {
        id: Some(row.get(0)?),
        src: row.get(1)?,
        dst: row.get(2)?,
        edge_type: EdgeType::from_str(&type_tag).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                rusqlite::types::Type::Text,
                e.into(),
            )
        })?,
        weight: row.get(4)?,
        confidence: row.get(5)?,
        rationale: row.get(6)?,
        evidence: row.get(7)?,
        created_by: row.get(8)?,
        provenance: provenance.and_then(|raw| serde_json::from_str(&raw).ok()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_paper(source_id: &str, title: &str) -> Paper {
        Paper {
            source: "openalex".to_string(),
            source_id: source_id.to_string(),
            title: title.to_string(),
            ..Paper::default()
        }
    }

    #[test]
    fn test_migration_sets_user_version() {
        let store = Store::in_memory().unwrap();
        let version: i64 = store
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, 1);
    }

    #[test]
    fn test_insert_papers_returns_ids_in_order() {
        let mut store = Store::in_memory().unwrap();
        let mut papers = vec![sample_paper("W1", "First"), sample_paper("W2", "Second")];
        let ids = store.insert_papers(&mut papers).unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(papers[0].id, Some(ids[0]));
        assert_eq!(papers[1].id, Some(ids[1]));
    }

    #[test]
    fn test_insert_collision_substitutes_existing_id() {
        let mut store = Store::in_memory().unwrap();
        let mut first = vec![sample_paper("W1", "First")];
        let ids = store.insert_papers(&mut first).unwrap();

        let mut again = vec![sample_paper("W1", "First again"), sample_paper("W3", "New")];
        let ids2 = store.insert_papers(&mut again).unwrap();

        assert_eq!(ids2[0], ids[0]);
        assert_ne!(ids2[1], ids[0]);
        assert_eq!(store.paper_count().unwrap(), 2);
    }

    #[test]
    fn test_upsert_is_idempotent_and_keeps_max_citations() {
        let store = Store::in_memory().unwrap();
        let mut paper = sample_paper("W1", "Original");
        paper.citation_count = 10;
        let id = store.upsert_paper(&paper).unwrap();

        paper.title = "Updated".to_string();
        paper.citation_count = 4;
        paper.abstract_text = Some("now present".to_string());
        let id2 = store.upsert_paper(&paper).unwrap();

        assert_eq!(id, id2);
        let papers = store.all_papers().unwrap();
        assert_eq!(papers.len(), 1);
        assert_eq!(papers[0].title, "Updated");
        assert_eq!(papers[0].citation_count, 10);
        assert_eq!(papers[0].abstract_text.as_deref(), Some("now present"));
    }

    #[test]
    fn test_edges_roundtrip_and_stats() {
        let mut store = Store::in_memory().unwrap();
        let mut papers = vec![sample_paper("W1", "A"), sample_paper("W2", "B")];
        let ids = store.insert_papers(&mut papers).unwrap();

        let mut edges = vec![
            Edge::cites(ids[0], ids[1], serde_json::json!({"depth": 0})),
            Edge::symmetric(
                ids[1],
                ids[0],
                EdgeType::SimilarText,
                0.8,
                0.8,
                serde_json::json!({"algo": "tfidf_cosine"}),
            ),
        ];
        store.insert_edges(&mut edges).unwrap();

        let cites = store.edges(Some(EdgeType::Cites)).unwrap();
        assert_eq!(cites.len(), 1);
        assert_eq!((cites[0].src, cites[0].dst), (ids[0], ids[1]));

        let sim = store.edges(Some(EdgeType::SimilarText)).unwrap();
        assert!(sim[0].src < sim[0].dst);

        let stats = store.stats().unwrap();
        assert_eq!(stats.papers, 2);
        assert_eq!(stats.edges, 2);
        assert_eq!(stats.edges_by_type.get("CITES"), Some(&1));
    }

    #[test]
    fn test_clusters_and_junction() {
        let mut store = Store::in_memory().unwrap();
        let mut papers = vec![sample_paper("W1", "A"), sample_paper("W2", "B")];
        let ids = store.insert_papers(&mut papers).unwrap();

        let mut clusters = vec![Cluster::new(
            "louvain_citation",
            0,
            Some("speech, recognition, neural".to_string()),
            ids.clone(),
        )];
        store.insert_clusters(&mut clusters).unwrap();
        assert!(clusters[0].id.is_some());

        let members: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM paper_clusters", [], |row| row.get(0))
            .unwrap();
        assert_eq!(members, 2);
    }

    #[test]
    fn test_update_paper_score() {
        let mut store = Store::in_memory().unwrap();
        let mut papers = vec![sample_paper("W1", "A")];
        let ids = store.insert_papers(&mut papers).unwrap();

        store.update_paper_score(ids[0], 0.42).unwrap();
        let papers = store.all_papers().unwrap();
        assert!((papers[0].influence_score - 0.42).abs() < f64::EPSILON);
    }

    #[test]
    fn test_run_record_roundtrip() {
        let store = Store::in_memory().unwrap();
        let run = RunRecord {
            id: None,
            started_at: "2025-06-01T00:00:00Z".to_string(),
            version: "0.3.1".to_string(),
            config: serde_json::json!({"depth": 2}),
            source: "openalex".to_string(),
            spine: "hybrid".to_string(),
            depth: 2,
            stats: serde_json::json!({"papers": 0}),
        };
        let id = store.insert_run(&run).unwrap();
        assert!(id > 0);
        assert_eq!(store.stats().unwrap().runs, 1);
    }

    #[test]
    fn test_open_on_disk_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.db");
        {
            let mut store = Store::open(&path).unwrap();
            let mut papers = vec![sample_paper("W1", "Persisted")];
            store.insert_papers(&mut papers).unwrap();
            store.close().unwrap();
        }
        let store = Store::open(&path).unwrap();
        assert_eq!(store.paper_count().unwrap(), 1);
    }
}
