//! Storage backends for the semiotic graph
//!
//! Every backend implements the `GraphStore` trait. `MemoryStore` keeps the
//! graph in an in-process arena; `SqliteStore` persists it to a database file.

mod memory;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{
    GraphStore, NodeFilter, OpenStore, Similarity, StorageError, StorageResult, Upserted,
    VectorIndexSpec,
};
