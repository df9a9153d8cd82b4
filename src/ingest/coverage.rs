//! Coverage invariants over the whole graph
//!
//! Every Concept is connoted by at least one Form, and every Myth is
//! generated by at least one non-empty concept set. Violations are reported,
//! never repaired.

use crate::graph::{EdgeKind, Node, NodeId, NodeType};
use crate::storage::{GraphStore, NodeFilter, StorageResult};
use serde::Serialize;

/// A node that breaks a coverage invariant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "violation", rename_all = "snake_case")]
pub enum CoverageViolation {
    /// No CONNOTES edge from a Form reaches this Concept
    UnconnotedConcept { id: NodeId, name: String },
    /// No GENERATES_MYTH edge from a grounded concept set reaches this Myth
    UngeneratedMyth { id: NodeId, name: String },
}

impl std::fmt::Display for CoverageViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoverageViolation::UnconnotedConcept { name, .. } => {
                write!(f, "Concept '{name}' is not connoted by any Form")
            }
            CoverageViolation::UngeneratedMyth { name, .. } => {
                write!(f, "Myth '{name}' is not generated by any concept set")
            }
        }
    }
}

/// Check every Concept and Myth in the store.
pub fn check(store: &dyn GraphStore) -> StorageResult<Vec<CoverageViolation>> {
    let mut violations = Vec::new();

    for concept in store.nodes(&NodeFilter::new().with_type(NodeType::Concept))? {
        if !has_source(store, &concept, EdgeKind::Connotes, &NodeType::Form)? {
            violations.push(CoverageViolation::UnconnotedConcept {
                id: concept.id,
                name: concept.name,
            });
        }
    }

    for myth in store.nodes(&NodeFilter::new().with_type(NodeType::Myth))? {
        if !is_generated(store, &myth)? {
            violations.push(CoverageViolation::UngeneratedMyth {
                id: myth.id,
                name: myth.name,
            });
        }
    }

    Ok(violations)
}

fn has_source(store: &dyn GraphStore, node: &Node, kind: EdgeKind, source_type: &NodeType) -> StorageResult<bool> {
    for edge in store.edges_to(&node.id)? {
        if edge.kind != kind {
            continue;
        }
        if let Some(source) = store.get_node(&edge.source)? {
            if &source.node_type == source_type {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

fn is_generated(store: &dyn GraphStore, myth: &Node) -> StorageResult<bool> {
    for edge in store.edges_to(&myth.id)? {
        if edge.kind != EdgeKind::GeneratesMyth {
            continue;
        }
        let Some(source) = store.get_node(&edge.source)? else {
            continue;
        };
        let grounded = match source.node_type {
            NodeType::Concept => true,
            NodeType::JointConcept => has_source(store, &source, EdgeKind::PartOf, &NodeType::Concept)?,
            _ => false,
        };
        if grounded {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn clean_graph_has_no_violations() {
        let store = MemoryStore::new();
        let form = store.upsert_node(&NodeType::Form, "Magpie", None, &[]).unwrap().id;
        let concept = store.upsert_node(&NodeType::Concept, "Good News", None, &[]).unwrap().id;
        let myth = store.upsert_node(&NodeType::Myth, "New Year", None, &[]).unwrap().id;
        store.upsert_edge(EdgeKind::Connotes, &form, &concept, None).unwrap();
        store.upsert_edge(EdgeKind::GeneratesMyth, &concept, &myth, None).unwrap();

        assert!(check(&store).unwrap().is_empty());
    }

    #[test]
    fn reports_unconnoted_concept_and_ungenerated_myth() {
        let store = MemoryStore::new();
        let concept = store.upsert_node(&NodeType::Concept, "Protection", None, &[]).unwrap().id;
        let myth = store.upsert_node(&NodeType::Myth, "Guardian", None, &[]).unwrap().id;

        let violations = check(&store).unwrap();
        assert_eq!(
            violations,
            vec![
                CoverageViolation::UnconnotedConcept {
                    id: concept,
                    name: "Protection".into()
                },
                CoverageViolation::UngeneratedMyth {
                    id: myth,
                    name: "Guardian".into()
                },
            ]
        );
    }

    #[test]
    fn joint_concept_without_parts_does_not_ground_a_myth() {
        let store = MemoryStore::new();
        let joint = store
            .upsert_node(&NodeType::JointConcept, "A+B", None, &[])
            .unwrap()
            .id;
        let myth = store.upsert_node(&NodeType::Myth, "Guardian", None, &[]).unwrap().id;
        store.upsert_edge(EdgeKind::GeneratesMyth, &joint, &myth, None).unwrap();

        let violations = check(&store).unwrap();
        assert!(matches!(
            violations.as_slice(),
            [CoverageViolation::UngeneratedMyth { .. }]
        ));
    }
}
