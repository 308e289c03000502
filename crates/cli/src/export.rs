//! File-format exporters
//!
//! All exporters read the same store schema and emit deterministic
//! output: papers ordered by id, edges by id.

use clap::ValueEnum;
use papergraph_common::errors::Result;
use papergraph_common::models::{Edge, Paper};
use papergraph_common::store::Store;
use std::fmt::Write as _;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Json,
    Graphml,
    Gexf,
    Csv,
    Mermaid,
}

impl Format {
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Graphml => "graphml",
            Format::Gexf => "gexf",
            Format::Csv => "csv",
            Format::Mermaid => "mmd",
        }
    }
}

/// Export the store to `out` in the requested format. CSV writes two
/// sibling files (`<stem>.nodes.csv`, `<stem>.edges.csv`).
pub fn export(store: &Store, format: Format, out: &Path) -> Result<()> {
    let papers = store.all_papers()?;
    let edges = store.edges(None)?;

    match format {
        Format::Json => {
            let doc = serde_json::json!({
                "papers": papers,
                "edges": edges,
                "stats": store.stats()?,
            });
            std::fs::write(out, serde_json::to_string_pretty(&doc)?)?;
        }
        Format::Graphml => std::fs::write(out, graphml(&papers, &edges))?,
        Format::Gexf => std::fs::write(out, gexf(&papers, &edges))?,
        Format::Csv => {
            let stem = out.with_extension("");
            std::fs::write(stem.with_extension("nodes.csv"), nodes_csv(&papers))?;
            std::fs::write(stem.with_extension("edges.csv"), edges_csv(&edges))?;
        }
        Format::Mermaid => std::fs::write(out, mermaid(&papers, &edges))?,
    }
    Ok(())
}

fn xml_escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn csv_escape(raw: &str) -> String {
    if raw.contains([',', '"', '\n']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

fn graphml(papers: &[Paper], edges: &[Edge]) -> String {
    let mut doc = String::new();
    doc.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    doc.push_str("<graphml xmlns=\"http://graphml.graphdrawing.org/xmlns\">\n");
    doc.push_str("  <key id=\"title\" for=\"node\" attr.name=\"title\" attr.type=\"string\"/>\n");
    doc.push_str("  <key id=\"year\" for=\"node\" attr.name=\"year\" attr.type=\"int\"/>\n");
    doc.push_str(
        "  <key id=\"influence\" for=\"node\" attr.name=\"influence\" attr.type=\"double\"/>\n",
    );
    doc.push_str("  <key id=\"type\" for=\"edge\" attr.name=\"type\" attr.type=\"string\"/>\n");
    doc.push_str("  <key id=\"weight\" for=\"edge\" attr.name=\"weight\" attr.type=\"double\"/>\n");
    doc.push_str("  <graph id=\"papergraph\" edgedefault=\"directed\">\n");

    for paper in papers {
        let Some(id) = paper.id else { continue };
        let _ = writeln!(doc, "    <node id=\"n{}\">", id);
        let _ = writeln!(
            doc,
            "      <data key=\"title\">{}</data>",
            xml_escape(&paper.title)
        );
        if let Some(year) = paper.year {
            let _ = writeln!(doc, "      <data key=\"year\">{}</data>", year);
        }
        let _ = writeln!(
            doc,
            "      <data key=\"influence\">{}</data>",
            paper.influence_score
        );
        doc.push_str("    </node>\n");
    }

    for edge in edges {
        let Some(id) = edge.id else { continue };
        let _ = writeln!(
            doc,
            "    <edge id=\"e{}\" source=\"n{}\" target=\"n{}\">",
            id, edge.src, edge.dst
        );
        let _ = writeln!(doc, "      <data key=\"type\">{}</data>", edge.edge_type);
        let _ = writeln!(doc, "      <data key=\"weight\">{}</data>", edge.weight);
        doc.push_str("    </edge>\n");
    }

    doc.push_str("  </graph>\n</graphml>\n");
    doc
}

fn gexf(papers: &[Paper], edges: &[Edge]) -> String {
    let mut doc = String::new();
    doc.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    doc.push_str("<gexf xmlns=\"http://gexf.net/1.3\" version=\"1.3\">\n");
    doc.push_str("  <graph defaultedgetype=\"directed\">\n");

    doc.push_str("    <nodes>\n");
    for paper in papers {
        let Some(id) = paper.id else { continue };
        let _ = writeln!(
            doc,
            "      <node id=\"{}\" label=\"{}\"/>",
            id,
            xml_escape(&paper.title)
        );
    }
    doc.push_str("    </nodes>\n");

    doc.push_str("    <edges>\n");
    for edge in edges {
        let Some(id) = edge.id else { continue };
        let _ = writeln!(
            doc,
            "      <edge id=\"{}\" source=\"{}\" target=\"{}\" weight=\"{}\" label=\"{}\"/>",
            id, edge.src, edge.dst, edge.weight, edge.edge_type
        );
    }
    doc.push_str("    </edges>\n");

    doc.push_str("  </graph>\n</gexf>\n");
    doc
}

fn nodes_csv(papers: &[Paper]) -> String {
    let mut doc = String::from(
        "id,source,source_id,doi,title,year,venue,citation_count,influence_score\n",
    );
    for paper in papers {
        let Some(id) = paper.id else { continue };
        let _ = writeln!(
            doc,
            "{},{},{},{},{},{},{},{},{}",
            id,
            csv_escape(&paper.source),
            csv_escape(&paper.source_id),
            csv_escape(paper.doi.as_deref().unwrap_or("")),
            csv_escape(&paper.title),
            paper.year.map(|y| y.to_string()).unwrap_or_default(),
            csv_escape(paper.venue.as_deref().unwrap_or("")),
            paper.citation_count,
            paper.influence_score
        );
    }
    doc
}

fn edges_csv(edges: &[Edge]) -> String {
    let mut doc = String::from("id,src,dst,type,weight,confidence,created_by\n");
    for edge in edges {
        let Some(id) = edge.id else { continue };
        let _ = writeln!(
            doc,
            "{},{},{},{},{},{},{}",
            id, edge.src, edge.dst, edge.edge_type, edge.weight, edge.confidence, edge.created_by
        );
    }
    doc
}

fn mermaid(papers: &[Paper], edges: &[Edge]) -> String {
    let mut doc = String::from("graph TD\n");
    for paper in papers {
        let Some(id) = paper.id else { continue };
        let label = paper.title.replace(['"', '[', ']'], " ");
        let _ = writeln!(doc, "    n{}[\"{}\"]", id, label);
    }
    for edge in edges {
        let _ = writeln!(
            doc,
            "    n{} -->|{}| n{}",
            edge.src, edge.edge_type, edge.dst
        );
    }
    doc
}
