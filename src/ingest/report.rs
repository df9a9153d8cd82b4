//! Ingestion outcome: counts, per-record issues, coverage violations

use super::coverage::CoverageViolation;
use crate::graph::NodeId;
use crate::storage::StorageError;
use serde::Serialize;
use thiserror::Error;

/// Which input record an issue belongs to (index into its input list)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum RecordRef {
    Entity(usize),
    Relation(usize),
}

impl std::fmt::Display for RecordRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordRef::Entity(i) => write!(f, "entity #{i}"),
            RecordRef::Relation(i) => write!(f, "relation #{i}"),
        }
    }
}

/// Why a record was skipped. Never aborts the batch.
#[derive(Debug, Error)]
pub enum IngestIssue {
    #[error("unsupported relation kind '{0}'")]
    UnsupportedRelationKind(String),

    #[error("{node_type} '{name}' does not exist")]
    DanglingReference { node_type: String, name: String },

    #[error("GENERATES_MYTH relation names no source concepts")]
    EmptyConceptSet,

    #[error("entity name is empty after canonicalization")]
    EmptyName,

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl Serialize for IngestIssue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One skipped record and why
#[derive(Debug, Serialize)]
pub struct RecordIssue {
    pub record: RecordRef,
    pub issue: IngestIssue,
}

/// Outcome of one ingestion batch
#[derive(Debug, Default, Serialize)]
pub struct IngestReport {
    pub nodes_created: usize,
    pub nodes_merged: usize,
    pub edges_created: usize,
    pub edges_merged: usize,
    /// JointConcept nodes newly created for multi-concept myths
    pub joint_concepts_created: usize,
    pub issues: Vec<RecordIssue>,
    /// Coverage check over the whole graph after the batch
    pub coverage: Vec<CoverageViolation>,
    /// Nodes of the embeddable type touched by the batch, first-seen order
    pub embeddable: Vec<NodeId>,
}

impl IngestReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty() && self.coverage.is_empty()
    }

    pub(crate) fn push_issue(&mut self, record: RecordRef, issue: IngestIssue) {
        self.issues.push(RecordIssue { record, issue });
    }
}
