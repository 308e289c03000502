//! Citation-analytic and text-similarity edge builders
//!
//! All three builders emit symmetric edges stored once per unordered
//! pair with `src < dst`.

mod cocitation;
mod coupling;
mod similarity;

pub use cocitation::co_citation_edges;
pub use coupling::coupling_edges;
pub use similarity::{build_similarity_edges, cosine};

/// Unordered pair key with the smaller id first
pub(crate) fn pair_key(a: i64, b: i64) -> (i64, i64) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}
