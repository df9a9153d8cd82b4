//! Ingestion of extracted records into the semiotic graph
//!
//! Entity records become nodes keyed by `(type, canonical name)`. Relation
//! records are dispatched by kind to a handler; multi-concept myths get a
//! deterministic JointConcept node. After each batch the coverage invariants
//! are checked and any violations reported.

pub mod coverage;
mod handlers;
mod ingestor;
mod records;
mod report;

pub use coverage::CoverageViolation;
pub use handlers::{Applied, ConnotesHandler, GeneratesMythHandler, RelationHandler};
pub use ingestor::Ingestor;
pub use records::{EntityRecord, ExtractionBatch, RelationRecord};
pub use report::{IngestIssue, IngestReport, RecordIssue, RecordRef};
