//! Graph store adapter: the contract every backing store implements

use crate::embedding::cosine_similarity;
use crate::graph::{Edge, EdgeId, EdgeKind, Node, NodeId, NodeType};
use crate::query::{enumerate_paths, PathError, PathSet, PathSpec};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("{kind} cannot run from {source_type} to {target_type}")]
    InvalidEndpoints {
        kind: EdgeKind,
        source_type: NodeType,
        target_type: NodeType,
    },

    #[error("Vector index conflict: {0}")]
    VectorIndexConflict(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Date parsing error: {0}")]
    DateParse(String),

    /// A stored row holds a value this build cannot read back
    #[error("Corrupt stored data: {0}")]
    Corrupt(String),

    #[error("Store lock poisoned")]
    Poisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Outcome of an upsert: the key's id, and whether it was newly created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upserted<T> {
    pub id: T,
    pub created: bool,
}

impl<T> Upserted<T> {
    pub fn created(id: T) -> Self {
        Self { id, created: true }
    }

    pub fn existing(id: T) -> Self {
        Self { id, created: false }
    }
}

/// Filter criteria for listing nodes
#[derive(Debug, Clone, Default)]
pub struct NodeFilter {
    /// Only nodes of this type
    pub node_type: Option<NodeType>,
    /// Maximum number of results
    pub limit: Option<usize>,
}

impl NodeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, node_type: NodeType) -> Self {
        self.node_type = Some(node_type);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Similarity function of a vector index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Similarity {
    #[default]
    Cosine,
}

impl Similarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Similarity::Cosine => "cosine",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cosine" => Some(Similarity::Cosine),
            _ => None,
        }
    }

    /// Higher is more similar
    pub fn score(&self, a: &[f32], b: &[f32]) -> f64 {
        match self {
            Similarity::Cosine => cosine_similarity(a, b),
        }
    }
}

/// Description of the (single) vector index over one node label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorIndexSpec {
    pub name: String,
    pub label: NodeType,
    pub dimensions: usize,
    pub similarity: Similarity,
}

/// Trait for graph storage backends
///
/// Implementations must be thread-safe (Send + Sync) so that retrievals can
/// run concurrently. Listing operations return items in creation order.
///
/// Upserts are keyed: nodes by `(type, name)`, edges by
/// `(kind, source, target)`. Re-running an upsert fills in a missing
/// description and appends new aliases but never overwrites content, which
/// makes every write safe to retry.
pub trait GraphStore: Send + Sync {
    // === Node Operations ===

    /// Load a node by id
    fn get_node(&self, id: &NodeId) -> StorageResult<Option<Node>>;

    /// Look a node up by its `(type, name)` key
    fn find_node(&self, node_type: &NodeType, name: &str) -> StorageResult<Option<Node>>;

    /// List nodes matching the filter, in creation order
    fn nodes(&self, filter: &NodeFilter) -> StorageResult<Vec<Node>>;

    /// Insert or replace a node by id
    fn save_node(&self, node: &Node) -> StorageResult<()>;

    /// Delete a node and every incident edge
    fn delete_node(&self, id: &NodeId) -> StorageResult<bool>;

    // === Edge Operations ===

    fn get_edge(&self, id: &EdgeId) -> StorageResult<Option<Edge>>;

    /// Look an edge up by its `(kind, source, target)` key
    fn find_edge(&self, kind: EdgeKind, source: &NodeId, target: &NodeId) -> StorageResult<Option<Edge>>;

    /// All edges, in creation order
    fn edges(&self) -> StorageResult<Vec<Edge>>;

    /// Edges originating from a node
    fn edges_from(&self, id: &NodeId) -> StorageResult<Vec<Edge>>;

    /// Edges targeting a node
    fn edges_to(&self, id: &NodeId) -> StorageResult<Vec<Edge>>;

    /// Insert or replace an edge by id
    fn save_edge(&self, edge: &Edge) -> StorageResult<()>;

    fn delete_edge(&self, id: &EdgeId) -> StorageResult<bool>;

    // === Vector Index ===

    /// Create the vector index. Creating an identical index again is a no-op;
    /// a different one is a `VectorIndexConflict`.
    fn create_vector_index(&self, spec: &VectorIndexSpec) -> StorageResult<()>;

    fn vector_index(&self) -> StorageResult<Option<VectorIndexSpec>>;

    /// Remove all nodes, edges and the vector index
    fn clear(&self) -> StorageResult<()>;

    // === Provided Operations ===

    /// Create or merge a node by `(type, name)`.
    fn upsert_node(
        &self,
        node_type: &NodeType,
        name: &str,
        description: Option<&str>,
        aliases: &[String],
    ) -> StorageResult<Upserted<NodeId>> {
        match self.find_node(node_type, name)? {
            Some(mut node) => {
                let described = node.coalesce_description(description);
                let aliased = node.add_aliases(aliases);
                if described || aliased {
                    self.save_node(&node)?;
                }
                Ok(Upserted::existing(node.id))
            }
            None => {
                let mut node = Node::new(node_type.clone(), name);
                node.coalesce_description(description);
                node.add_aliases(aliases);
                self.save_node(&node)?;
                Ok(Upserted::created(node.id))
            }
        }
    }

    /// Create or merge an edge by `(kind, source, target)`.
    ///
    /// Both endpoints must exist and their types must be allowed by `kind`.
    fn upsert_edge(
        &self,
        kind: EdgeKind,
        source: &NodeId,
        target: &NodeId,
        description: Option<&str>,
    ) -> StorageResult<Upserted<EdgeId>> {
        let source_node = self
            .get_node(source)?
            .ok_or_else(|| StorageError::NodeNotFound(source.to_string()))?;
        let target_node = self
            .get_node(target)?
            .ok_or_else(|| StorageError::NodeNotFound(target.to_string()))?;

        if !kind.allows(&source_node.node_type, &target_node.node_type) {
            return Err(StorageError::InvalidEndpoints {
                kind,
                source_type: source_node.node_type,
                target_type: target_node.node_type,
            });
        }

        match self.find_edge(kind, source, target)? {
            Some(mut edge) => {
                if edge.coalesce_description(description) {
                    self.save_edge(&edge)?;
                }
                Ok(Upserted::existing(edge.id))
            }
            None => {
                let mut edge = Edge::new(kind, source.clone(), target.clone());
                edge.coalesce_description(description);
                self.save_edge(&edge)?;
                Ok(Upserted::created(edge.id))
            }
        }
    }

    /// Number of edges incident to a node
    fn degree(&self, id: &NodeId) -> StorageResult<usize> {
        Ok(self.edges_from(id)?.len() + self.edges_to(id)?.len())
    }

    /// Attach vectors to nodes. Ids that no longer exist are skipped.
    ///
    /// Callers validate lengths and dimensions; see `EmbeddingService`.
    fn upsert_vectors(&self, ids: &[NodeId], vectors: &[Vec<f32>]) -> StorageResult<usize> {
        let mut written = 0;
        for (id, vector) in ids.iter().zip(vectors) {
            if let Some(mut node) = self.get_node(id)? {
                node.embedding = Some(vector.clone());
                self.save_node(&node)?;
                written += 1;
            }
        }
        Ok(written)
    }

    /// Top-k nodes of the indexed label by similarity to `query`.
    ///
    /// Returns an empty list when no index exists.
    fn query_vectors(&self, query: &[f32], top_k: usize) -> StorageResult<Vec<(NodeId, f64)>> {
        let Some(index) = self.vector_index()? else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<(NodeId, f64)> = self
            .nodes(&NodeFilter::new().with_type(index.label.clone()))?
            .into_iter()
            .filter_map(|node| {
                let score = index.similarity.score(query, node.embedding.as_deref()?);
                Some((node.id, score))
            })
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k);
        Ok(scored)
    }

    /// Enumerate bounded paths from a seed.
    ///
    /// The default walks the graph through `edges_from`/`edges_to`; a store
    /// with native traversal can override it.
    fn find_paths(&self, seed: &NodeId, spec: &PathSpec) -> Result<PathSet, PathError> {
        enumerate_paths(self, seed, spec)
    }
}

/// Extension trait for opening stores from paths
pub trait OpenStore: GraphStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
