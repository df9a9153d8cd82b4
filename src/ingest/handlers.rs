//! Per-kind relation handlers
//!
//! Each accepted relation kind has one handler, registered with the
//! `Ingestor` at construction time. PART_OF has none: those edges are only
//! synthesized by the GENERATES_MYTH handler.

use super::records::RelationRecord;
use super::report::IngestIssue;
use crate::graph::{canonical_name, joint_concept_name, EdgeId, EdgeKind, NodeId, NodeType};
use crate::storage::{GraphStore, Upserted};

/// Writes performed by one relation
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Applied {
    pub edges_created: usize,
    pub edges_merged: usize,
    pub joint_concepts_created: usize,
}

impl Applied {
    fn edge(&mut self, upserted: Upserted<EdgeId>) {
        if upserted.created {
            self.edges_created += 1;
        } else {
            self.edges_merged += 1;
        }
    }
}

/// Applies relations of one kind to the store
pub trait RelationHandler: Send + Sync {
    fn kind(&self) -> EdgeKind;

    fn apply(&self, store: &dyn GraphStore, relation: &RelationRecord) -> Result<Applied, IngestIssue>;
}

/// Resolve a relation endpoint by type and canonical name
fn lookup(store: &dyn GraphStore, node_type: NodeType, raw_name: &str) -> Result<NodeId, IngestIssue> {
    let name = canonical_name(raw_name);
    match store.find_node(&node_type, &name)? {
        Some(node) => Ok(node.id),
        None => Err(IngestIssue::DanglingReference {
            node_type: node_type.to_string(),
            name: if name.is_empty() { raw_name.to_string() } else { name },
        }),
    }
}

/// CONNOTES: Form → Concept
pub struct ConnotesHandler;

impl RelationHandler for ConnotesHandler {
    fn kind(&self) -> EdgeKind {
        EdgeKind::Connotes
    }

    fn apply(&self, store: &dyn GraphStore, relation: &RelationRecord) -> Result<Applied, IngestIssue> {
        let source = lookup(store, NodeType::Form, relation.source.as_deref().unwrap_or(""))?;
        let target = lookup(store, NodeType::Concept, &relation.target)?;

        let mut applied = Applied::default();
        applied.edge(store.upsert_edge(
            EdgeKind::Connotes,
            &source,
            &target,
            relation.description.as_deref(),
        )?);
        Ok(applied)
    }
}

/// GENERATES_MYTH: Concept → Myth, or via a JointConcept for 2+ concepts
pub struct GeneratesMythHandler;

impl GeneratesMythHandler {
    /// Distinct canonical concept names, sorted
    fn concepts(relation: &RelationRecord) -> Vec<String> {
        let listed = relation.source_concepts.as_deref().unwrap_or_default();
        let raw: Vec<&str> = if listed.is_empty() {
            relation.source.as_deref().into_iter().collect()
        } else {
            listed.iter().map(String::as_str).collect()
        };

        let mut names: Vec<String> = raw
            .into_iter()
            .map(canonical_name)
            .filter(|n| !n.is_empty())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

impl RelationHandler for GeneratesMythHandler {
    fn kind(&self) -> EdgeKind {
        EdgeKind::GeneratesMyth
    }

    fn apply(&self, store: &dyn GraphStore, relation: &RelationRecord) -> Result<Applied, IngestIssue> {
        let concepts = Self::concepts(relation);
        if concepts.is_empty() {
            return Err(IngestIssue::EmptyConceptSet);
        }

        // Resolve everything before writing, so a dangling concept leaves no
        // orphan JointConcept behind.
        let myth = lookup(store, NodeType::Myth, &relation.target)?;
        let concept_ids = concepts
            .iter()
            .map(|name| lookup(store, NodeType::Concept, name))
            .collect::<Result<Vec<_>, _>>()?;

        let description = relation.description.as_deref();
        let mut applied = Applied::default();

        if let [single] = concept_ids.as_slice() {
            applied.edge(store.upsert_edge(EdgeKind::GeneratesMyth, single, &myth, description)?);
            return Ok(applied);
        }

        let joint = store.upsert_node(
            &NodeType::JointConcept,
            &joint_concept_name(&concepts),
            Some(&format!("Joint form of concepts: {}", concepts.join(", "))),
            &[],
        )?;
        if joint.created {
            applied.joint_concepts_created += 1;
        }

        for concept in &concept_ids {
            applied.edge(store.upsert_edge(EdgeKind::PartOf, concept, &joint.id, None)?);
        }
        applied.edge(store.upsert_edge(EdgeKind::GeneratesMyth, &joint.id, &myth, description)?);
        Ok(applied)
    }
}
