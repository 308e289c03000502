//! Schema migrations
//!
//! The `user_version` pragma gates migrations; version 1 is the full
//! initial schema. Later versions append ALTER/CREATE statements here.

/// v1: the complete PaperGraph schema
pub const V1_MIGRATION: &str = r#"
CREATE TABLE IF NOT EXISTS runs (
    id          INTEGER PRIMARY KEY,
    started_at  TEXT NOT NULL,
    version     TEXT NOT NULL,
    config      TEXT NOT NULL,
    source      TEXT NOT NULL,
    spine       TEXT NOT NULL,
    depth       INTEGER NOT NULL,
    stats       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS papers (
    id              INTEGER PRIMARY KEY,
    source          TEXT NOT NULL,
    source_id       TEXT NOT NULL,
    doi             TEXT,
    arxiv_id        TEXT,
    title           TEXT NOT NULL,
    abstract        TEXT,
    year            INTEGER,
    venue           TEXT,
    url             TEXT,
    citation_count  INTEGER NOT NULL DEFAULT 0,
    influence_score REAL NOT NULL DEFAULT 0,
    keywords        TEXT,
    concepts        TEXT
);

CREATE TABLE IF NOT EXISTS edges (
    id          INTEGER PRIMARY KEY,
    src         INTEGER NOT NULL REFERENCES papers(id),
    dst         INTEGER NOT NULL REFERENCES papers(id),
    type        TEXT NOT NULL,
    weight      REAL NOT NULL,
    confidence  REAL NOT NULL,
    rationale   TEXT,
    evidence    TEXT,
    created_by  TEXT NOT NULL,
    provenance  TEXT
);

CREATE TABLE IF NOT EXISTS authors (
    id        INTEGER PRIMARY KEY,
    name      TEXT NOT NULL,
    source_id TEXT
);

CREATE TABLE IF NOT EXISTS paper_authors (
    paper_id  INTEGER NOT NULL REFERENCES papers(id),
    author_id INTEGER NOT NULL REFERENCES authors(id),
    position  INTEGER,
    PRIMARY KEY (paper_id, author_id)
);

CREATE TABLE IF NOT EXISTS clusters (
    id          INTEGER PRIMARY KEY,
    method      TEXT NOT NULL,
    name        TEXT,
    description TEXT,
    stats       TEXT
);

CREATE TABLE IF NOT EXISTS paper_clusters (
    paper_id   INTEGER NOT NULL REFERENCES papers(id),
    cluster_id INTEGER NOT NULL REFERENCES clusters(id),
    PRIMARY KEY (paper_id, cluster_id)
);

CREATE TABLE IF NOT EXISTS entities (
    id      INTEGER PRIMARY KEY,
    name    TEXT NOT NULL,
    type    TEXT NOT NULL,
    aliases TEXT
);

CREATE TABLE IF NOT EXISTS paper_entities (
    paper_id  INTEGER NOT NULL REFERENCES papers(id),
    entity_id INTEGER NOT NULL REFERENCES entities(id),
    role      TEXT NOT NULL,
    PRIMARY KEY (paper_id, entity_id, role)
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_papers_source_key ON papers(source, source_id);
CREATE INDEX IF NOT EXISTS idx_papers_doi ON papers(doi);
CREATE INDEX IF NOT EXISTS idx_papers_arxiv ON papers(arxiv_id);
CREATE INDEX IF NOT EXISTS idx_papers_source_id ON papers(source_id);
CREATE INDEX IF NOT EXISTS idx_papers_year ON papers(year);
CREATE INDEX IF NOT EXISTS idx_edges_src ON edges(src);
CREATE INDEX IF NOT EXISTS idx_edges_dst ON edges(dst);
CREATE INDEX IF NOT EXISTS idx_edges_type ON edges(type);
"#;
