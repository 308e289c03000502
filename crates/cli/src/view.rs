//! Self-contained HTML viewer
//!
//! Embeds the graph JSON into a static template with an inline force
//! layout. No external assets; the file opens directly in a browser.

use papergraph_common::errors::Result;
use papergraph_common::store::Store;
use std::path::Path;

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>PaperGraph</title>
<style>
  body { margin: 0; font: 13px sans-serif; background: #111; color: #ddd; }
  #info { position: fixed; top: 8px; left: 8px; max-width: 360px;
          background: rgba(0,0,0,.7); padding: 8px 12px; border-radius: 4px; }
  canvas { display: block; }
</style>
</head>
<body>
<div id="info">PaperGraph &mdash; drag to pan, scroll to zoom, hover for titles</div>
<canvas id="graph"></canvas>
<script>
const DATA = /*DATA*/;
const canvas = document.getElementById('graph');
const ctx = canvas.getContext('2d');
canvas.width = innerWidth; canvas.height = innerHeight;

const nodes = DATA.papers.map((p, i) => ({
  id: p.id, title: p.title, score: p.influence_score,
  x: Math.cos(i * 2.4) * (40 + i * 3) + innerWidth / 2,
  y: Math.sin(i * 2.4) * (40 + i * 3) + innerHeight / 2,
  vx: 0, vy: 0,
}));
const byId = new Map(nodes.map(n => [n.id, n]));
const links = DATA.edges
  .filter(e => byId.has(e.src) && byId.has(e.dst))
  .map(e => ({ a: byId.get(e.src), b: byId.get(e.dst), type: e.edge_type, w: e.weight }));

let scale = 1, ox = 0, oy = 0, hover = null;

function step() {
  for (const l of links) {
    const dx = l.b.x - l.a.x, dy = l.b.y - l.a.y;
    const d = Math.max(Math.hypot(dx, dy), 1);
    const f = (d - 90) * 0.002 * (0.5 + l.w);
    l.a.vx += f * dx / d; l.a.vy += f * dy / d;
    l.b.vx -= f * dx / d; l.b.vy -= f * dy / d;
  }
  for (const n of nodes) {
    for (const m of nodes) {
      if (n === m) continue;
      const dx = n.x - m.x, dy = n.y - m.y;
      const d2 = Math.max(dx * dx + dy * dy, 40);
      n.vx += 120 * dx / d2 / Math.sqrt(d2);
      n.vy += 120 * dy / d2 / Math.sqrt(d2);
    }
    n.x += n.vx *= 0.85; n.y += n.vy *= 0.85;
  }
}

function draw() {
  ctx.setTransform(1, 0, 0, 1, 0, 0);
  ctx.clearRect(0, 0, canvas.width, canvas.height);
  ctx.setTransform(scale, 0, 0, scale, ox, oy);
  ctx.strokeStyle = 'rgba(120,160,220,0.25)';
  for (const l of links) {
    ctx.beginPath(); ctx.moveTo(l.a.x, l.a.y); ctx.lineTo(l.b.x, l.b.y); ctx.stroke();
  }
  for (const n of nodes) {
    const r = 3 + 8 * (n.score || 0);
    ctx.beginPath(); ctx.arc(n.x, n.y, r, 0, 7);
    ctx.fillStyle = n === hover ? '#ffd166' : '#4ea8de';
    ctx.fill();
  }
  if (hover) {
    ctx.fillStyle = '#fff';
    ctx.fillText(hover.title, hover.x + 8, hover.y - 8);
  }
}

let ticks = 0;
(function loop() {
  if (ticks++ < 400) step();
  draw();
  requestAnimationFrame(loop);
})();

canvas.addEventListener('mousemove', e => {
  const x = (e.clientX - ox) / scale, y = (e.clientY - oy) / scale;
  hover = nodes.find(n => Math.hypot(n.x - x, n.y - y) < 10) || null;
  if (e.buttons === 1) { ox += e.movementX; oy += e.movementY; }
});
canvas.addEventListener('wheel', e => {
  e.preventDefault();
  scale *= e.deltaY < 0 ? 1.1 : 0.9;
});
addEventListener('resize', () => { canvas.width = innerWidth; canvas.height = innerHeight; });
</script>
</body>
</html>
"#;

/// Write the viewer HTML next to the database
pub fn write_viewer(store: &Store, out: &Path) -> Result<()> {
    let doc = serde_json::json!({
        "papers": store.all_papers()?,
        "edges": store.edges(None)?,
    });
    let html = TEMPLATE.replace("/*DATA*/", &serde_json::to_string(&doc)?);
    std::fs::write(out, html)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use papergraph_common::models::Paper;

    #[test]
    fn test_viewer_embeds_graph_data() {
        let mut store = Store::in_memory().unwrap();
        let mut papers = vec![Paper {
            source: "openalex".to_string(),
            source_id: "W1".to_string(),
            title: "Embedded in HTML".to_string(),
            ..Paper::default()
        }];
        store.insert_papers(&mut papers).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("graph.html");
        write_viewer(&store, &out).unwrap();

        let html = std::fs::read_to_string(&out).unwrap();
        assert!(html.contains("<!DOCTYPE html>"));
        assert!(html.contains("Embedded in HTML"));
        assert!(!html.contains("/*DATA*/"));
    }
}
