//! Hybrid path-ranking retrieval over the ingested painting

mod common;

use async_trait::async_trait;
use common::{approx_eq, node_id, painted_memory_store, set_embedding, JOINT_NAME};
use mythograph::{
    format_context, Direction, EdgeKind, Embedder, EmbeddingConfig, EmbeddingError,
    EmbeddingService, GraphStore, HybridRetriever, MemoryStore, NodeId, NodeType,
    RetrievalConfig, RetrievalError, Seed, TargetPattern,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const Q: [f32; 2] = [1.0, 0.0];

struct Painting {
    store: Arc<MemoryStore>,
    retriever: HybridRetriever,
    tiger: NodeId,
}

/// Only "New Year Blessing" resembles the query
fn painting() -> Painting {
    let store = painted_memory_store();
    let blessing = node_id(store.as_ref(), NodeType::Myth, "New Year Blessing");
    set_embedding(store.as_ref(), &blessing, &Q);

    let tiger = node_id(store.as_ref(), NodeType::Form, "Tiger");
    let config = RetrievalConfig {
        max_hops: 3,
        ..RetrievalConfig::default()
    };
    Painting {
        retriever: HybridRetriever::new(store.clone(), config),
        store,
        tiger,
    }
}

fn rank_of(result: &mythograph::RankedSubgraph, name: &str) -> Option<f64> {
    result.nodes.iter().find(|n| n.name == name).map(|n| n.rank)
}

#[test]
fn intermediate_nodes_take_their_best_path() {
    let p = painting();
    let query = p.retriever.query(vec![Seed::new(p.tiger.clone(), 1.0)], Q.to_vec());
    let result = p.retriever.retrieve(&query).unwrap();

    // Tiger→Protection→Joint→Blessing scores 0.5×1 + 0.5×1 = 1.0, and every
    // node on it inherits that; dead ends score 0.5×1 + 0.5×0 = 0.5.
    assert!(approx_eq(rank_of(&result, "New Year Blessing").unwrap(), 1.0));
    assert!(approx_eq(rank_of(&result, JOINT_NAME).unwrap(), 1.0));
    assert!(approx_eq(rank_of(&result, "Protection").unwrap(), 1.0));
    assert!(approx_eq(rank_of(&result, "Authority Mocked").unwrap(), 0.5));
    assert!(approx_eq(rank_of(&result, "Good News").unwrap(), 0.5));
    assert_eq!(rank_of(&result, "Magpie"), None);

    // Ties break by name
    let names: Vec<&str> = result.nodes.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            JOINT_NAME,
            "New Year Blessing",
            "Protection",
            "Tiger",
            "Authority Mocked",
            "Good News"
        ]
    );
}

#[test]
fn hop_decay_discounts_long_paths() {
    let p = painting();
    let query = p
        .retriever
        .query(vec![Seed::new(p.tiger.clone(), 1.0)], Q.to_vec())
        .hop_decay(Some(0.5));
    let result = p.retriever.retrieve(&query).unwrap();

    // 3 hops: 0.25 × 1.0; 2 hops: 0.5 × 0.5; 1 hop: 1 × 0.5
    assert!(approx_eq(rank_of(&result, "New Year Blessing").unwrap(), 0.25));
    assert!(approx_eq(rank_of(&result, "Authority Mocked").unwrap(), 0.25));
    assert!(approx_eq(rank_of(&result, "Protection").unwrap(), 0.5));
    assert!(approx_eq(rank_of(&result, JOINT_NAME).unwrap(), 0.25));
    assert!(approx_eq(rank_of(&result, "Good News").unwrap(), 0.125));
}

#[test]
fn per_seed_limit_keeps_only_the_best_paths() {
    let p = painting();
    let query = p
        .retriever
        .query(vec![Seed::new(p.tiger.clone(), 1.0)], Q.to_vec())
        .per_seed_limit(1);
    let result = p.retriever.retrieve(&query).unwrap();

    let names: Vec<&str> = result.nodes.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, vec![JOINT_NAME, "New Year Blessing", "Protection", "Tiger"]);
    assert_eq!(result.edges.len(), 3);
}

#[test]
fn seeds_rank_at_least_the_floor() {
    let p = painting();
    let query = p
        .retriever
        .query(vec![Seed::new(p.tiger.clone(), 0.2)], Q.to_vec())
        .max_hops(1);
    let result = p.retriever.retrieve(&query).unwrap();

    let tiger = result.node(&p.tiger).unwrap();
    assert!(tiger.is_seed);
    assert_eq!(tiger.rank, mythograph::retrieve::SEED_RANK_FLOOR);
    assert_eq!(tiger.degree, 1);
    assert!(approx_eq(rank_of(&result, "Protection").unwrap(), 0.1));
}

#[test]
fn isolated_seed_is_returned_alone() {
    let p = painting();
    let lonely = p
        .store
        .upsert_node(&NodeType::Form, "Crane", None, &[])
        .unwrap()
        .id;
    let result = p
        .retriever
        .retrieve(&p.retriever.query(vec![Seed::new(lonely.clone(), 0.3)], Q.to_vec()))
        .unwrap();

    assert_eq!(result.nodes.len(), 1);
    assert_eq!(result.nodes[0].id, lonely);
    assert_eq!(result.nodes[0].degree, 0);
    assert!(result.edges.is_empty());
}

#[test]
fn outgoing_walks_follow_edge_direction() {
    let p = painting();
    let query = p
        .retriever
        .query(vec![Seed::new(p.tiger.clone(), 1.0)], Q.to_vec())
        .direction(Direction::Outgoing);
    let result = p.retriever.retrieve(&query).unwrap();

    // Good News only connects into the JointConcept, so it is unreachable
    assert_eq!(rank_of(&result, "Good News"), None);
    assert!(rank_of(&result, "New Year Blessing").is_some());
}

#[test]
fn target_pattern_limits_path_endpoints() {
    let p = painting();
    let query = p
        .retriever
        .query(vec![Seed::new(p.tiger.clone(), 1.0)], Q.to_vec())
        .target(TargetPattern::only(NodeType::Myth));
    let result = p.retriever.retrieve(&query).unwrap();

    assert_eq!(rank_of(&result, "Good News"), None);
    assert!(approx_eq(rank_of(&result, "Authority Mocked").unwrap(), 0.5));
    assert!(result
        .edges
        .iter()
        .all(|e| e.kind != EdgeKind::PartOf || e.target_name == JOINT_NAME));
}

#[test]
fn multiple_seeds_share_one_subgraph() {
    let p = painting();
    let magpie = node_id(p.store.as_ref(), NodeType::Form, "Magpie");
    let query = p.retriever.query(
        vec![Seed::new(p.tiger.clone(), 1.0), Seed::new(magpie.clone(), 0.4)],
        Q.to_vec(),
    );
    let result = p.retriever.retrieve(&query).unwrap();

    // The JointConcept is reached from both seeds; the better path wins
    assert!(approx_eq(rank_of(&result, JOINT_NAME).unwrap(), 1.0));
    assert!(result.node(&magpie).unwrap().is_seed);
    let ids: std::collections::HashSet<_> = result.nodes.iter().map(|n| n.id.clone()).collect();
    assert_eq!(ids.len(), result.nodes.len());
}

#[test]
fn non_finite_parameters_are_rejected() {
    let p = painting();
    let query = p
        .retriever
        .query(vec![Seed::new(p.tiger.clone(), 1.0)], Q.to_vec())
        .lambda(f64::NAN);
    assert!(matches!(
        p.retriever.retrieve(&query),
        Err(RetrievalError::InvalidQueryParameter(_))
    ));
}

#[test]
fn expired_deadline_times_out() {
    let p = painting();
    let query = p
        .retriever
        .query(vec![Seed::new(p.tiger.clone(), 1.0)], Q.to_vec())
        .timeout(Duration::ZERO);
    assert!(matches!(p.retriever.retrieve(&query), Err(RetrievalError::TimedOut)));
}

#[test]
fn formatted_context_lists_nodes_then_edges() {
    let p = painting();
    let query = p
        .retriever
        .query(vec![Seed::new(p.tiger.clone(), 1.0)], Q.to_vec())
        .max_hops(1);
    let text = format_context(&p.retriever.retrieve(&query).unwrap());

    assert_eq!(
        text,
        "NODES:\n\
         Form: Tiger (rank=1.0000)\n\
         - A comical tiger beneath the pine\n\
         Concept: Protection (rank=0.5000)\n\
         - Warding off evil spirits\n\
         RELATIONSHIPS:\n\
         Tiger -[CONNOTES]-> Protection (rank=0.0000)\n\
         -\n"
    );
}

/// Query axis for the hand-built chains below
const AXIS: [f32; 4] = [1.0, 0.0, 0.0, 0.0];
/// Cosine 0.4 against `AXIS` (norm 5)
const SIM_04: [f32; 4] = [2.0, 4.0, 2.0, 1.0];
/// Cosine 0.9 against `AXIS` (norm 10)
const SIM_09: [f32; 4] = [9.0, 3.0, 3.0, 1.0];
/// Cosine -0.7 against `AXIS` (norm 10)
const SIM_NEG_07: [f32; 4] = [-7.0, 7.0, 1.0, 1.0];

/// Crane →CONNOTES→ Longevity →PART_OF→ Longevity+Purity →GENERATES_MYTH→ Immortal Crane
struct Chain {
    store: Arc<MemoryStore>,
    form: NodeId,
    concept: NodeId,
    joint: NodeId,
    myth: NodeId,
}

fn chain() -> Chain {
    let store = Arc::new(MemoryStore::new());
    let upsert = |node_type: NodeType, name: &str| store.upsert_node(&node_type, name, None, &[]).unwrap().id;
    let form = upsert(NodeType::Form, "Crane");
    let concept = upsert(NodeType::Concept, "Longevity");
    let joint = upsert(NodeType::JointConcept, "Longevity+Purity");
    let myth = upsert(NodeType::Myth, "Immortal Crane");
    store.upsert_edge(EdgeKind::Connotes, &form, &concept, None).unwrap();
    store.upsert_edge(EdgeKind::PartOf, &concept, &joint, None).unwrap();
    store.upsert_edge(EdgeKind::GeneratesMyth, &joint, &myth, None).unwrap();
    Chain { store, form, concept, joint, myth }
}

fn rank_by_id(result: &mythograph::RankedSubgraph, id: &NodeId) -> f64 {
    result.node(id).map(|n| n.rank).unwrap_or_else(|| panic!("{id} missing from result"))
}

#[test]
fn ranking_arithmetic_mixes_seed_score_and_text_similarity() {
    let c = chain();
    set_embedding(c.store.as_ref(), &c.concept, &SIM_04);
    let retriever = HybridRetriever::new(c.store.clone(), RetrievalConfig::default());
    let query = retriever
        .query(vec![Seed::new(c.form.clone(), 0.9)], AXIS.to_vec())
        .lambda(0.5)
        .hop_decay(None)
        .max_hops(1);
    let result = retriever.retrieve(&query).unwrap();

    // 0.5 × 0.9 + 0.5 × 0.4
    assert!(approx_eq(rank_by_id(&result, &c.concept), 0.65));
}

#[test]
fn ranking_arithmetic_decays_per_extra_hop() {
    let c = chain();
    set_embedding(c.store.as_ref(), &c.myth, &SIM_04);
    let retriever = HybridRetriever::new(c.store.clone(), RetrievalConfig::default());
    let query = retriever
        .query(vec![Seed::new(c.form.clone(), 0.9)], AXIS.to_vec())
        .lambda(0.5)
        .hop_decay(Some(0.8))
        .max_hops(3);
    let result = retriever.retrieve(&query).unwrap();

    // Three hops weigh 0.8² = 0.64; 0.64 × 0.65
    assert!(approx_eq(rank_by_id(&result, &c.myth), 0.416));
    // The JointConcept's best path is the long one (two hops alone: 0.8 × 0.45)
    assert!(approx_eq(rank_by_id(&result, &c.joint), 0.416));
    // One hop with no text similarity still beats it: 0.5 × 0.9
    assert!(approx_eq(rank_by_id(&result, &c.concept), 0.45));
}

#[test]
fn best_path_wins_for_a_shared_intermediate() {
    let c = chain();
    let good = c
        .store
        .upsert_node(&NodeType::Myth, "Crane Of Heaven", None, &[])
        .unwrap()
        .id;
    c.store.upsert_edge(EdgeKind::GeneratesMyth, &c.concept, &good, None).unwrap();
    set_embedding(c.store.as_ref(), &good, &SIM_09);
    set_embedding(c.store.as_ref(), &c.joint, &SIM_NEG_07);

    let retriever = HybridRetriever::new(c.store.clone(), RetrievalConfig::default());
    let query = retriever
        .query(vec![Seed::new(c.form.clone(), 0.9)], AXIS.to_vec())
        .lambda(0.5)
        .hop_decay(None)
        .max_hops(2);
    let result = retriever.retrieve(&query).unwrap();

    // Crane→Longevity→Crane Of Heaven: 0.45 + 0.45 = 0.9
    // Crane→Longevity→Longevity+Purity: 0.45 - 0.35 = 0.1
    assert!(approx_eq(rank_by_id(&result, &good), 0.9));
    assert!(approx_eq(rank_by_id(&result, &c.joint), 0.1));
    assert!(approx_eq(rank_by_id(&result, &c.concept), 0.9));
}

#[test]
fn json_output_marks_seeds_with_is_seed_key() {
    let p = painting();
    let query = p.retriever.query(vec![Seed::new(p.tiger.clone(), 1.0)], Q.to_vec());
    let json: serde_json::Value =
        serde_json::from_str(&p.retriever.retrieve(&query).unwrap().to_json().unwrap()).unwrap();

    let nodes = json["nodes"].as_array().unwrap();
    let tiger = nodes.iter().find(|n| n["name"] == "Tiger").unwrap();
    assert_eq!(tiger["isSeed"], true);
    assert!(nodes.iter().all(|n| n["isSeed"].is_boolean()));
    assert!(nodes.iter().all(|n| n.get("is_seed").is_none()));
    assert_eq!(nodes.iter().filter(|n| n["isSeed"] == true).count(), 1);
}

/// Maps embedding text prefixes to fixed vectors
struct KeywordEmbedder(HashMap<&'static str, Vec<f32>>);

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts
            .iter()
            .map(|text| {
                self.0
                    .iter()
                    .find(|(key, _)| text.starts_with(*key))
                    .map(|(_, v)| v.clone())
                    .unwrap_or_else(|| vec![0.0, 0.0])
            })
            .collect())
    }
}

#[tokio::test]
async fn embedded_forms_seed_retrieval() {
    let store = painted_memory_store();
    let embedding = EmbeddingConfig {
        dimensions: 2,
        ..EmbeddingConfig::default()
    };
    let service = EmbeddingService::new(store.clone(), embedding);
    let embedder = KeywordEmbedder(HashMap::from([
        ("Magpie", vec![1.0, 0.0]),
        ("Tiger", vec![0.0, 1.0]),
        ("Pine Tree", vec![0.6, 0.8]),
    ]));

    let forms: Vec<NodeId> = store
        .nodes(&mythograph::storage::NodeFilter::new().with_type(NodeType::Form))
        .unwrap()
        .into_iter()
        .map(|n| n.id)
        .collect();
    let report = service.embed_nodes(&embedder, &forms).await.unwrap();
    assert_eq!(report.written, 3);

    let retriever = HybridRetriever::new(
        store.clone(),
        RetrievalConfig {
            top_k: 1,
            ..RetrievalConfig::default()
        },
    );
    let result = retriever.retrieve_for_embedding(Q.to_vec()).unwrap();

    // Magpie is the only seed; Good News and the JointConcept lie within 2 hops
    let names: Vec<&str> = result.nodes.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, vec!["Magpie", "Good News", JOINT_NAME]);
    assert!(result.nodes[0].is_seed);
    assert!(approx_eq(result.nodes[1].rank, 0.5));

    let connotes = &result.edges[0];
    assert_eq!(connotes.kind, EdgeKind::Connotes);
    assert!(approx_eq(connotes.rank, 0.5));
}

#[tokio::test]
async fn concurrent_queries_see_the_same_graph() {
    let p = painting();
    let retriever = Arc::new(p.retriever);
    let expected = retriever
        .retrieve(&retriever.query(vec![Seed::new(p.tiger.clone(), 1.0)], Q.to_vec()))
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let retriever = retriever.clone();
        let tiger = p.tiger.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            retriever.retrieve(&retriever.query(vec![Seed::new(tiger, 1.0)], Q.to_vec()))
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), expected);
    }
}
