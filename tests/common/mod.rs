//! Shared fixtures for the integration tests
//!
//! The fixture is a Korean folk painting of a magpie and a tiger under a pine:
//!
//! ```text
//! Magpie    -CONNOTES-> Good News  -PART_OF-> Good News+Protection -GENERATES_MYTH-> New Year Blessing
//! Tiger     -CONNOTES-> Protection -PART_OF-> Good News+Protection
//! Pine Tree -CONNOTES-> Longevity  -GENERATES_MYTH-> New Year Blessing
//!                       Protection -GENERATES_MYTH-> Authority Mocked
//! ```

#![allow(dead_code)]

use mythograph::{
    ExtractionBatch, GraphStore, IngestReport, Ingestor, MemoryStore, MythographConfig, NodeId,
    NodeType,
};
use std::sync::Arc;

pub const PAINTING_JSON: &str = r#"{
  "entities": [
    {"type": "Form", "name": "magpie", "description": "A black and white bird perched on a pine branch"},
    {"type": "Form", "name": "Tiger", "aliases": ["호랑이"], "description": "A comical tiger beneath the pine"},
    {"type": "Form", "name": "pine tree"},
    {"type": "Concept", "name": "Good News", "description": "Tidings of joy"},
    {"type": "Concept", "name": "protection", "description": "Warding off evil spirits"},
    {"type": "Concept", "name": "Longevity"},
    {"type": "Myth", "name": "New Year Blessing", "description": "Hung at the new year for luck"},
    {"type": "Myth", "name": "Authority Mocked"}
  ],
  "relations": [
    {"type": "CONNOTES", "source": "Magpie", "target": "Good News", "description": "The magpie brings visitors"},
    {"type": "CONNOTES", "source": "Tiger", "target": "Protection"},
    {"type": "CONNOTES", "source": "Pine Tree", "target": "Longevity"},
    {"type": "GENERATES_MYTH", "sourceConcepts": ["Protection", "Good News"], "target": "New Year Blessing"},
    {"type": "GENERATES_MYTH", "source": "longevity", "target": "New Year Blessing"},
    {"type": "generates myth", "source": "Protection", "target": "Authority Mocked"}
  ]
}"#;

pub const JOINT_NAME: &str = "Good News+Protection";

pub fn painting_batch() -> ExtractionBatch {
    ExtractionBatch::from_json(PAINTING_JSON).expect("fixture parses")
}

/// Ingest the painting into `store` with default configuration.
pub fn ingest_painting(store: Arc<dyn GraphStore>) -> IngestReport {
    let config = MythographConfig::default();
    Ingestor::new(store, &config.embedding)
        .ingest_batch(&painting_batch())
        .expect("ingest succeeds")
}

pub fn painted_memory_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    ingest_painting(store.clone());
    store
}

pub fn node_id(store: &dyn GraphStore, node_type: NodeType, name: &str) -> NodeId {
    store
        .find_node(&node_type, name)
        .expect("lookup succeeds")
        .unwrap_or_else(|| panic!("{node_type} '{name}' exists"))
        .id
}

/// Write an embedding straight onto a node, bypassing the vector index.
pub fn set_embedding(store: &dyn GraphStore, id: &NodeId, vector: &[f32]) {
    let mut node = store.get_node(id).expect("lookup succeeds").expect("node exists");
    node.embedding = Some(vector.to_vec());
    store.save_node(&node).expect("save succeeds");
}

pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
