//! Mythograph: a semiotic knowledge graph for cultural artifacts
//!
//! Depicted **Forms** connote **Concepts**, which combine into **Myths**.
//! The crate builds that graph from extracted records and retrieves a
//! ranked, bounded subgraph for a query.
//!
//! # Pipeline
//!
//! - [`Ingestor`]: entity and relation records into canonical, upserted nodes and edges
//! - [`EmbeddingService`]: vectors for the embeddable node type, written as one batch
//! - [`Resolver`]: offline exact-then-fuzzy duplicate merging
//! - [`HybridRetriever`]: path-ranking retrieval around seed nodes
//! - [`format_context`]: the ranked subgraph as text for a generator
//!
//! # Example
//!
//! ```
//! use mythograph::{EntityRecord, Ingestor, MemoryStore, MythographConfig, RelationRecord};
//! use std::sync::Arc;
//!
//! let config = MythographConfig::default();
//! let store = Arc::new(MemoryStore::new());
//! let ingestor = Ingestor::new(store.clone(), &config.embedding);
//!
//! let report = ingestor
//!     .ingest(
//!         &[EntityRecord::new("Form", "Magpie"), EntityRecord::new("Concept", "Good News")],
//!         &[RelationRecord::new("CONNOTES", "Magpie", "Good News")],
//!     )
//!     .unwrap();
//! assert_eq!(report.edges_created, 1);
//! ```

pub mod config;
pub mod embedding;
mod graph;
pub mod ingest;
pub mod query;
pub mod resolve;
pub mod retrieve;
pub mod storage;

pub use config::{ConfigError, EmbeddingConfig, MythographConfig, ResolverConfig, RetrievalConfig};
pub use embedding::{cosine_similarity, Embedder, EmbeddingError, EmbeddingReport, EmbeddingService};
pub use graph::{
    canonical_name, joint_concept_name, normalized_name, sanitize_label, Edge, EdgeId, EdgeKind,
    Node, NodeId, NodeType, JOINT_SEPARATOR, LABEL_PREFIX,
};
pub use ingest::{
    CoverageViolation, EntityRecord, ExtractionBatch, IngestIssue, IngestReport, Ingestor,
    RelationRecord,
};
pub use query::{CancellationToken, Direction, TargetPattern};
pub use resolve::{ResolveError, ResolveReport, Resolver};
pub use retrieve::{
    format_context, seeds_from_index, HybridRetriever, RankedEdge, RankedNode, RankedSubgraph,
    RetrievalError, RetrievalQuery, Seed,
};
pub use storage::{GraphStore, MemoryStore, OpenStore, SqliteStore, StorageError, StorageResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
