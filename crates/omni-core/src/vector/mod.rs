//! Flat, brute-force cosine-similarity vector index.
//!
//! Chunk vectors are authoritatively stored in the `chunks.vector` BLOB
//! column of the index database (§4.6: "no ANN/HNSW index -- the spec does
//! not call for one and repository-scale chunk counts make a flat scan
//! adequate"). This module is the in-memory form the query engine scans
//! against: built fresh from `MetadataIndex::list_embedded_chunks` at the
//! start of a query session, same as the dependency graph is rebuilt per
//! query rather than kept as a persistent object.

use crate::error::{OmniError, OmniResult};

/// In-memory flat vector index over a fixed dimensionality.
pub struct VectorIndex {
    dimensions: usize,
    vectors: Vec<(i64, Vec<f32>)>,
}

impl VectorIndex {
    /// Create an empty index for the given embedding dimensionality.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions, vectors: Vec::new() }
    }

    /// Build an index from `(chunk_id, vector)` pairs, e.g. loaded via
    /// `MetadataIndex::list_embedded_chunks`.
    pub fn from_vectors(dimensions: usize, vectors: Vec<(i64, Vec<f32>)>) -> Self {
        Self { dimensions, vectors }
    }

    /// Add a vector to the index. Errors if its length doesn't match
    /// this index's configured dimensionality.
    pub fn add(&mut self, id: i64, vector: &[f32]) -> OmniResult<()> {
        if vector.len() != self.dimensions {
            return Err(OmniError::InvalidInput {
                details: format!(
                    "vector has {} dimensions, index expects {}",
                    vector.len(),
                    self.dimensions
                ),
            });
        }
        self.vectors.retain(|(existing_id, _)| *existing_id != id);
        self.vectors.push((id, vector.to_vec()));
        Ok(())
    }

    /// Search for the K nearest neighbors to the query vector by cosine
    /// similarity, highest similarity first.
    pub fn search(&self, query: &[f32], k: usize) -> OmniResult<Vec<(i64, f32)>> {
        if query.len() != self.dimensions {
            return Err(OmniError::InvalidInput {
                details: format!(
                    "query has {} dimensions, index expects {}",
                    query.len(),
                    self.dimensions
                ),
            });
        }

        let mut scored: Vec<(i64, f32)> = self
            .vectors
            .iter()
            .map(|(id, v)| (*id, cosine_similarity(query, v)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);
        Ok(scored)
    }

    /// Remove a vector by ID. No-op if absent.
    pub fn remove(&mut self, id: i64) {
        self.vectors.retain(|(existing_id, _)| *existing_id != id);
    }

    /// Returns the number of vectors in the index.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Returns true if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Returns the configured dimensions.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Cosine similarity between two equal-length vectors. Assumes neither
/// vector is all-zero; callers that normalize with `l2_normalize` first
/// can treat the result as a plain dot product.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// L2-normalize a vector in place. Embeddings are normalized once at
/// generation time so similarity search can skip renormalizing on every
/// comparison.
pub fn l2_normalize(vector: &mut Vec<f32>) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_index_is_empty() {
        let index = VectorIndex::new(4);
        assert_eq!(index.dimensions(), 4);
        assert!(index.is_empty());
    }

    #[test]
    fn add_rejects_mismatched_dimensions() {
        let mut index = VectorIndex::new(3);
        let result = index.add(1, &[1.0, 0.0]);
        assert!(result.is_err());
    }

    #[test]
    fn add_replaces_existing_id() {
        let mut index = VectorIndex::new(2);
        index.add(1, &[1.0, 0.0]).expect("add");
        index.add(1, &[0.0, 1.0]).expect("re-add");
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn search_returns_closest_vectors_first() {
        let mut index = VectorIndex::new(2);
        index.add(1, &[1.0, 0.0]).expect("add");
        index.add(2, &[0.0, 1.0]).expect("add");
        index.add(3, &[0.9, 0.1]).expect("add");

        let results = index.search(&[1.0, 0.0], 2).expect("search");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, 1);
        assert_eq!(results[1].0, 3);
    }

    #[test]
    fn remove_drops_a_vector() {
        let mut index = VectorIndex::new(2);
        index.add(1, &[1.0, 0.0]).expect("add");
        index.remove(1);
        assert!(index.is_empty());
    }

    #[test]
    fn l2_normalize_produces_unit_vector() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
    }

    #[test]
    fn l2_normalize_leaves_zero_vector_unchanged() {
        let mut v = vec![0.0, 0.0];
        l2_normalize(&mut v);
        assert_eq!(v, vec![0.0, 0.0]);
    }
}
