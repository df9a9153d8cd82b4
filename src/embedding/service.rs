//! Batch embedding upsert for the embeddable node type

use super::{Embedder, EmbeddingError};
use crate::config::EmbeddingConfig;
use crate::graph::{NodeId, NodeType};
use crate::storage::{GraphStore, Similarity, VectorIndexSpec};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Why a node id was left out of an embedding batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkippedEmbedding {
    UnknownNode { id: NodeId },
    NotEmbeddable { id: NodeId, node_type: NodeType },
}

/// Outcome of one embedding batch
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmbeddingReport {
    /// Vectors written to the store
    pub written: usize,
    pub skipped: Vec<SkippedEmbedding>,
}

/// Writes embeddings for the configured node type into the vector index.
pub struct EmbeddingService {
    store: Arc<dyn GraphStore>,
    config: EmbeddingConfig,
}

impl EmbeddingService {
    pub fn new(store: Arc<dyn GraphStore>, config: EmbeddingConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &EmbeddingConfig {
        &self.config
    }

    fn index_spec(&self) -> VectorIndexSpec {
        VectorIndexSpec {
            name: self.config.index_name.clone(),
            label: self.config.embeddable_type.clone(),
            dimensions: self.config.dimensions,
            similarity: Similarity::Cosine,
        }
    }

    /// Create the cosine vector index for the embeddable type.
    ///
    /// Idempotent. An existing index with a different definition is reported
    /// as a `DimensionMismatch` against the configured dimensions.
    pub fn ensure_index(&self) -> Result<(), EmbeddingError> {
        let spec = self.index_spec();
        if let Some(existing) = self.store.vector_index()? {
            if existing != spec {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: self.config.dimensions,
                    actual: existing.dimensions,
                });
            }
            return Ok(());
        }
        self.store.create_vector_index(&spec)?;
        info!(index = %spec.name, label = %spec.label, dimensions = spec.dimensions, "created vector index");
        Ok(())
    }

    /// Write `vectors[i]` as the embedding of `node_ids[i]`.
    ///
    /// Length and dimension checks run before anything is written. Unknown
    /// ids and nodes of other types are skipped and listed in the report.
    pub fn upsert_embeddings(
        &self,
        node_ids: &[NodeId],
        vectors: &[Vec<f32>],
    ) -> Result<EmbeddingReport, EmbeddingError> {
        if node_ids.len() != vectors.len() {
            return Err(EmbeddingError::LengthMismatch {
                ids: node_ids.len(),
                vectors: vectors.len(),
            });
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.config.dimensions) {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.config.dimensions,
                actual: bad.len(),
            });
        }
        self.ensure_index()?;

        let mut report = EmbeddingReport::default();
        let mut batch_ids = Vec::with_capacity(node_ids.len());
        let mut batch_vectors = Vec::with_capacity(vectors.len());

        for (id, vector) in node_ids.iter().zip(vectors) {
            match self.check_embeddable(id)? {
                Some(skip) => report.skipped.push(skip),
                None => {
                    batch_ids.push(id.clone());
                    batch_vectors.push(vector.clone());
                }
            }
        }

        if !report.skipped.is_empty() {
            warn!(skipped = report.skipped.len(), "embedding batch contained non-embeddable ids");
        }

        report.written = self.store.upsert_vectors(&batch_ids, &batch_vectors)?;
        debug!(written = report.written, "embedding batch written");
        Ok(report)
    }

    /// Embed nodes through `embedder` and write the vectors.
    ///
    /// Each node is embedded from its name, aliases and description.
    pub async fn embed_nodes(
        &self,
        embedder: &dyn Embedder,
        node_ids: &[NodeId],
    ) -> Result<EmbeddingReport, EmbeddingError> {
        let mut skipped = Vec::new();
        let mut ids = Vec::new();
        let mut texts = Vec::new();

        for id in node_ids {
            if let Some(skip) = self.check_embeddable(id)? {
                skipped.push(skip);
                continue;
            }
            if let Some(node) = self.store.get_node(id)? {
                texts.push(node.embedding_text());
                ids.push(node.id);
            }
        }

        let mut report = if texts.is_empty() {
            EmbeddingReport::default()
        } else {
            let vectors = embedder.embed_batch(&texts).await?;
            if vectors.len() != texts.len() {
                return Err(EmbeddingError::Model(format!(
                    "embedder returned {} vectors for {} texts",
                    vectors.len(),
                    texts.len()
                )));
            }
            self.upsert_embeddings(&ids, &vectors)?
        };

        skipped.append(&mut report.skipped);
        report.skipped = skipped;
        Ok(report)
    }

    fn check_embeddable(&self, id: &NodeId) -> Result<Option<SkippedEmbedding>, EmbeddingError> {
        Ok(match self.store.get_node(id)? {
            None => Some(SkippedEmbedding::UnknownNode { id: id.clone() }),
            Some(node) if node.node_type != self.config.embeddable_type => Some(SkippedEmbedding::NotEmbeddable {
                id: node.id,
                node_type: node.node_type,
            }),
            Some(_) => None,
        })
    }
}
