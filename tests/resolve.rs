//! Duplicate resolution over an ingested graph

mod common;

use common::{ingest_painting, node_id, painted_memory_store};
use mythograph::ingest::coverage;
use mythograph::resolve::{PhaseStats, ResolveWarning};
use mythograph::{
    EdgeKind, EntityRecord, GraphStore, Ingestor, MemoryStore, MythographConfig, NodeType,
    RelationRecord, ResolverConfig, Resolver,
};
use std::sync::Arc;

const CLASS: &str = "Tiger Ridicules The Yangban Class";
const CLAS: &str = "Tiger Ridicules The Yangban Clas";

/// The painting plus one exact and one near duplicate, each with edges
fn painting_with_duplicates() -> Arc<MemoryStore> {
    let store = painted_memory_store();
    let config = MythographConfig::default();
    let report = Ingestor::new(store.clone(), &config.embedding)
        .ingest(
            &[
                EntityRecord::new("Form", "pine-tree").with_aliases(&["소나무"]),
                EntityRecord::new("Myth", CLASS),
                EntityRecord::new("Myth", CLAS).with_description("Satire of the aristocracy"),
            ],
            &[
                RelationRecord::new("CONNOTES", "Pine-Tree", "Longevity"),
                RelationRecord::new("CONNOTES", "Pine-Tree", "Good News"),
                RelationRecord::new("GENERATES_MYTH", "Protection", CLASS),
                RelationRecord::new("GENERATES_MYTH", "Protection", CLAS).with_description("Paper tiger"),
            ],
        )
        .unwrap();
    assert_eq!(report.nodes_created, 3);
    store
}

#[test]
fn exact_then_fuzzy_merges_duplicates() {
    let store = painting_with_duplicates();
    let pine = node_id(store.as_ref(), NodeType::Form, "Pine Tree");
    let satire = node_id(store.as_ref(), NodeType::Myth, CLASS);

    let report = Resolver::new(store.clone(), &ResolverConfig::default()).resolve().unwrap();

    assert_eq!(report.exact, PhaseStats { groups_merged: 1, nodes_removed: 1 });
    assert_eq!(report.fuzzy, Some(PhaseStats { groups_merged: 1, nodes_removed: 1 }));
    assert!(report.warnings.is_empty());
    // Pine-Tree→Good News moves; Pine-Tree→Longevity and the second satire edge collide
    assert_eq!(report.edges_repointed, 1);
    assert_eq!(report.edges_folded, 2);
    assert_eq!(report.edges_dropped, 0);

    assert!(store.find_node(&NodeType::Form, "Pine-Tree").unwrap().is_none());
    assert!(store.find_node(&NodeType::Myth, CLAS).unwrap().is_none());

    let pine_node = store.get_node(&pine).unwrap().unwrap();
    assert_eq!(pine_node.aliases, vec!["Pine-Tree", "소나무"]);
    let targets: Vec<String> = store
        .edges_from(&pine)
        .unwrap()
        .into_iter()
        .map(|e| store.get_node(&e.target).unwrap().unwrap().name)
        .collect();
    assert_eq!(targets.len(), 2);
    assert!(targets.contains(&"Longevity".to_string()));
    assert!(targets.contains(&"Good News".to_string()));

    let satire_node = store.get_node(&satire).unwrap().unwrap();
    assert_eq!(satire_node.description.as_deref(), Some("Satire of the aristocracy"));
    let protection = node_id(store.as_ref(), NodeType::Concept, "Protection");
    let generates = store
        .find_edge(EdgeKind::GeneratesMyth, &protection, &satire)
        .unwrap()
        .unwrap();
    assert_eq!(generates.description.as_deref(), Some("Paper tiger"));

    assert!(coverage::check(store.as_ref()).unwrap().is_empty());
}

#[test]
fn no_edge_is_left_dangling() {
    let store = painting_with_duplicates();
    Resolver::new(store.clone(), &ResolverConfig::default()).resolve().unwrap();

    for edge in store.edges().unwrap() {
        assert!(store.get_node(&edge.source).unwrap().is_some(), "dangling source on {}", edge.id);
        assert!(store.get_node(&edge.target).unwrap().is_some(), "dangling target on {}", edge.id);
    }
}

#[test]
fn resolving_twice_changes_nothing() {
    let store = painting_with_duplicates();
    let resolver = Resolver::new(store.clone(), &ResolverConfig::default());
    resolver.resolve().unwrap();
    let nodes = store.nodes(&Default::default()).unwrap().len();
    let edges = store.edges().unwrap().len();

    let report = resolver.resolve().unwrap();
    assert_eq!(report.exact, PhaseStats::default());
    assert_eq!(report.fuzzy, Some(PhaseStats::default()));
    assert_eq!(store.nodes(&Default::default()).unwrap().len(), nodes);
    assert_eq!(store.edges().unwrap().len(), edges);
}

#[test]
fn disabled_fuzzy_phase_is_reported() {
    let store = painting_with_duplicates();
    let config = ResolverConfig {
        fuzzy_enabled: false,
        ..ResolverConfig::default()
    };

    let report = Resolver::new(store.clone(), &config).resolve().unwrap();

    assert_eq!(report.exact.nodes_removed, 1);
    assert_eq!(report.fuzzy, None);
    assert!(matches!(
        report.warnings.as_slice(),
        [ResolveWarning::ResolverCapabilityUnavailable(_)]
    ));
    assert!(store.find_node(&NodeType::Myth, CLAS).unwrap().is_some());
}

#[test]
fn types_never_merge_across_each_other() {
    let store = Arc::new(MemoryStore::new());
    ingest_painting(store.clone());
    let config = MythographConfig::default();
    Ingestor::new(store.clone(), &config.embedding)
        .ingest(&[EntityRecord::new("Concept", "Tiger")], &[])
        .unwrap();

    let report = Resolver::new(store.clone(), &ResolverConfig::default()).resolve().unwrap();

    assert_eq!(report.exact.nodes_removed, 0);
    assert!(store.find_node(&NodeType::Form, "Tiger").unwrap().is_some());
    assert!(store.find_node(&NodeType::Concept, "Tiger").unwrap().is_some());
}
