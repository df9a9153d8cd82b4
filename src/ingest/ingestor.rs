//! Batch ingestion of extracted entities and relations

use super::coverage;
use super::handlers::{ConnotesHandler, GeneratesMythHandler, RelationHandler};
use super::records::{EntityRecord, ExtractionBatch, RelationRecord};
use super::report::{IngestIssue, IngestReport, RecordRef};
use crate::config::EmbeddingConfig;
use crate::graph::{canonical_name, EdgeKind, NodeId, NodeType};
use crate::storage::{GraphStore, StorageResult};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Turns extraction records into graph nodes and edges.
///
/// Entities are applied first, in input order, then relations. Every write
/// is an idempotent upsert, so a failed batch can simply be re-run.
pub struct Ingestor {
    store: Arc<dyn GraphStore>,
    embeddable_type: NodeType,
    handlers: HashMap<EdgeKind, Box<dyn RelationHandler>>,
}

impl Ingestor {
    /// Create an ingestor with the CONNOTES and GENERATES_MYTH handlers
    pub fn new(store: Arc<dyn GraphStore>, config: &EmbeddingConfig) -> Self {
        let mut ingestor = Self {
            store,
            embeddable_type: config.embeddable_type.clone(),
            handlers: HashMap::new(),
        };
        ingestor.register(Box::new(ConnotesHandler));
        ingestor.register(Box::new(GeneratesMythHandler));
        ingestor
    }

    /// Install a handler, replacing any existing one for its kind
    pub fn register(&mut self, handler: Box<dyn RelationHandler>) {
        self.handlers.insert(handler.kind(), handler);
    }

    pub fn ingest_batch(&self, batch: &ExtractionBatch) -> StorageResult<IngestReport> {
        self.ingest(&batch.entities, &batch.relations)
    }

    /// Apply a batch and check coverage over the resulting graph.
    ///
    /// Per-record problems are collected in the report. Only a failure of the
    /// final coverage scan is returned as an error.
    pub fn ingest(&self, entities: &[EntityRecord], relations: &[RelationRecord]) -> StorageResult<IngestReport> {
        let mut report = IngestReport::default();

        for (index, entity) in entities.iter().enumerate() {
            if let Err(issue) = self.apply_entity(entity, &mut report) {
                warn!(record = %RecordRef::Entity(index), name = %entity.name, error = %issue, "skipping entity");
                report.push_issue(RecordRef::Entity(index), issue);
            }
        }

        for (index, relation) in relations.iter().enumerate() {
            if let Err(issue) = self.apply_relation(relation, &mut report) {
                warn!(
                    record = %RecordRef::Relation(index),
                    kind = %relation.relation_type,
                    target = %relation.target,
                    error = %issue,
                    "skipping relation"
                );
                report.push_issue(RecordRef::Relation(index), issue);
            }
        }

        report.coverage = coverage::check(self.store.as_ref())?;
        for violation in &report.coverage {
            warn!(%violation, "coverage violation");
        }

        info!(
            nodes_created = report.nodes_created,
            nodes_merged = report.nodes_merged,
            edges_created = report.edges_created,
            edges_merged = report.edges_merged,
            joint_concepts = report.joint_concepts_created,
            issues = report.issues.len(),
            coverage_violations = report.coverage.len(),
            "ingested batch"
        );
        Ok(report)
    }

    fn apply_entity(&self, entity: &EntityRecord, report: &mut IngestReport) -> Result<(), IngestIssue> {
        let name = canonical_name(&entity.name);
        if name.is_empty() {
            return Err(IngestIssue::EmptyName);
        }
        let node_type = NodeType::parse(&entity.entity_type);

        let upserted = self.store.upsert_node(
            &node_type,
            &name,
            entity.description.as_deref(),
            &entity.aliases,
        )?;

        if upserted.created {
            report.nodes_created += 1;
        } else {
            report.nodes_merged += 1;
        }
        if node_type == self.embeddable_type {
            track(&mut report.embeddable, upserted.id);
        }
        Ok(())
    }

    fn apply_relation(&self, relation: &RelationRecord, report: &mut IngestReport) -> Result<(), IngestIssue> {
        let handler = EdgeKind::parse(&relation.relation_type)
            .and_then(|kind| self.handlers.get(&kind))
            .ok_or_else(|| IngestIssue::UnsupportedRelationKind(relation.relation_type.clone()))?;

        let applied = handler.apply(self.store.as_ref(), relation)?;
        report.edges_created += applied.edges_created;
        report.edges_merged += applied.edges_merged;
        report.joint_concepts_created += applied.joint_concepts_created;
        Ok(())
    }
}

fn track(ids: &mut Vec<NodeId>, id: NodeId) {
    if !ids.contains(&id) {
        ids.push(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, NodeFilter};

    fn create_test_ingestor() -> (Arc<MemoryStore>, Ingestor) {
        let store = Arc::new(MemoryStore::new());
        let ingestor = Ingestor::new(store.clone(), &EmbeddingConfig::default());
        (store, ingestor)
    }

    #[test]
    fn entities_are_canonicalized_and_merged() {
        let (store, ingestor) = create_test_ingestor();
        let entities = vec![
            EntityRecord::new("Form", "  magpie ").with_aliases(&["까치"]),
            EntityRecord::new("form", "Magpie").with_description("A black and white bird"),
        ];

        let report = ingestor.ingest(&entities, &[]).unwrap();
        assert_eq!(report.nodes_created, 1);
        assert_eq!(report.nodes_merged, 1);
        assert_eq!(report.embeddable.len(), 1);

        let node = store.find_node(&NodeType::Form, "Magpie").unwrap().unwrap();
        assert_eq!(node.aliases, vec!["까치"]);
        assert_eq!(node.description.as_deref(), Some("A black and white bird"));
    }

    #[test]
    fn empty_name_is_reported() {
        let (_, ingestor) = create_test_ingestor();
        let report = ingestor.ingest(&[EntityRecord::new("Form", " ... ")], &[]).unwrap();
        assert_eq!(report.nodes_created, 0);
        assert!(matches!(
            report.issues.as_slice(),
            [issue] if issue.record == RecordRef::Entity(0) && matches!(issue.issue, IngestIssue::EmptyName)
        ));
    }

    #[test]
    fn custom_types_are_sanitized_labels() {
        let (store, ingestor) = create_test_ingestor();
        ingestor
            .ingest(&[EntityRecord::new("symbolic motif", "Peony")], &[])
            .unwrap();
        let custom = store
            .nodes(&NodeFilter::new().with_type(NodeType::Custom("SymbolicMotif".into())))
            .unwrap();
        assert_eq!(custom.len(), 1);
    }

    #[test]
    fn unsupported_and_synthesized_kinds_are_rejected() {
        let (store, ingestor) = create_test_ingestor();
        let entities = vec![
            EntityRecord::new("Concept", "Good News"),
            EntityRecord::new("JointConcept", "Good News+Protection"),
        ];
        let relations = vec![
            RelationRecord::new("DEPICTS", "Magpie", "Good News"),
            RelationRecord::new("PART_OF", "Good News", "Good News+Protection"),
        ];

        let report = ingestor.ingest(&entities, &relations).unwrap();
        assert_eq!(report.issues.len(), 2);
        assert!(report
            .issues
            .iter()
            .all(|i| matches!(i.issue, IngestIssue::UnsupportedRelationKind(_))));
        assert!(store.edges().unwrap().is_empty());
    }

    #[test]
    fn relation_kinds_parse_loosely() {
        let (store, ingestor) = create_test_ingestor();
        let entities = vec![
            EntityRecord::new("Form", "Magpie"),
            EntityRecord::new("Concept", "Good News"),
        ];
        let relations = vec![RelationRecord::new("connotes", "Magpie", "Good News")];

        let report = ingestor.ingest(&entities, &relations).unwrap();
        assert!(report.issues.is_empty());
        assert_eq!(report.edges_created, 1);
        assert_eq!(store.edges().unwrap().len(), 1);
    }

    #[test]
    fn single_concept_myth_links_directly() {
        let (store, ingestor) = create_test_ingestor();
        let entities = vec![
            EntityRecord::new("Form", "Magpie"),
            EntityRecord::new("Concept", "Good News"),
            EntityRecord::new("Myth", "New Year"),
        ];
        let relations = vec![
            RelationRecord::new("CONNOTES", "Magpie", "Good News"),
            RelationRecord::myth_from(&["Good News"], "New Year"),
        ];

        let report = ingestor.ingest(&entities, &relations).unwrap();
        assert!(report.is_clean(), "{:?}", report);
        assert_eq!(report.joint_concepts_created, 0);
        assert!(store
            .nodes(&NodeFilter::new().with_type(NodeType::JointConcept))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn empty_concept_set_is_rejected() {
        let (_, ingestor) = create_test_ingestor();
        let relation = RelationRecord {
            relation_type: "GENERATES_MYTH".into(),
            source: None,
            target: "New Year".into(),
            description: None,
            source_concepts: Some(Vec::new()),
        };
        let report = ingestor
            .ingest(&[EntityRecord::new("Myth", "New Year")], &[relation])
            .unwrap();
        assert!(matches!(
            report.issues.as_slice(),
            [issue] if matches!(issue.issue, IngestIssue::EmptyConceptSet)
        ));
    }
}
