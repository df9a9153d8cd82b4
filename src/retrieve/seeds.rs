//! Seed lookup against the vector index

use super::params::Seed;
use crate::storage::{GraphStore, StorageResult};

/// The `top_k` indexed nodes nearest to `query`, as seeds scored by similarity.
///
/// Returns no seeds when the store has no vector index.
pub fn seeds_from_index(store: &dyn GraphStore, query: &[f32], top_k: usize) -> StorageResult<Vec<Seed>> {
    Ok(store
        .query_vectors(query, top_k)?
        .into_iter()
        .map(|(id, score)| Seed::new(id, score))
        .collect())
}
