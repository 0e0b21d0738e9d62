use crate::catalog::MemeCatalog;
use crate::error::RagError;
use crate::models::ScoredCandidate;

/// Cosine similarity clamped to `[-1, 1]`. Zero-magnitude input scores 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}

/// Score every catalog entry against `query` and keep the best `top_k`.
///
/// Results are ordered by descending similarity; equal scores keep catalog
/// order.
pub fn search<'a>(
    query: &[f32],
    catalog: &'a MemeCatalog,
    top_k: usize,
) -> Result<Vec<ScoredCandidate<'a>>, RagError> {
    let Some(expected) = catalog.dimension() else {
        return Ok(Vec::new());
    };
    if query.len() != expected {
        return Err(RagError::DimensionMismatch {
            expected,
            actual: query.len(),
        });
    }

    let mut scored: Vec<ScoredCandidate<'a>> = catalog
        .entries()
        .iter()
        .map(|entry| ScoredCandidate::new(entry, cosine_similarity(query, &entry.embedding)))
        .collect();
    // sort_by is stable, so ties stay in insertion order
    scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    scored.truncate(top_k);
    Ok(scored)
}
