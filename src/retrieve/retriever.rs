//! Hybrid path-ranking retrieval
//!
//! Enumerates bounded paths from each seed, scores each path by a
//! decay-weighted mix of seed relevance and query similarity of its
//! terminal node, keeps the best paths per seed, and aggregates the
//! survivors into per-node and per-edge ranks.

use super::params::{hop_weight, path_score, Params, RetrievalQuery, Seed};
use super::result::{RankedEdge, RankedNode, RankedSubgraph};
use super::seeds::seeds_from_index;
use super::{RetrievalError, RetrievalResult};
use crate::config::RetrievalConfig;
use crate::embedding::cosine_similarity;
use crate::graph::{EdgeId, Node, NodeId};
use crate::query::{Path, PathSpec};
use crate::storage::GraphStore;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// Seeds always rank at least this high
pub const SEED_RANK_FLOOR: f64 = 1.0;

/// Read-only retriever over a shared store.
///
/// Stateless per call, so one retriever can serve concurrent queries.
pub struct HybridRetriever {
    store: Arc<dyn GraphStore>,
    config: RetrievalConfig,
}

impl HybridRetriever {
    pub fn new(store: Arc<dyn GraphStore>, config: RetrievalConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// A query carrying this retriever's configured defaults
    pub fn query(&self, seeds: Vec<Seed>, query_embedding: Vec<f32>) -> RetrievalQuery {
        RetrievalQuery::from_config(&self.config, seeds, query_embedding)
    }

    /// Seed from the vector index (`top_k` nearest embeddable nodes), then retrieve.
    pub fn retrieve_for_embedding(&self, query_embedding: Vec<f32>) -> RetrievalResult<RankedSubgraph> {
        let seeds = seeds_from_index(self.store.as_ref(), &query_embedding, self.config.top_k)?;
        self.retrieve(&self.query(seeds, query_embedding))
    }

    /// Rank the subgraph around the query's seeds.
    pub fn retrieve(&self, query: &RetrievalQuery) -> RetrievalResult<RankedSubgraph> {
        let params = query.resolve()?;
        if query.seeds.is_empty() {
            return Ok(RankedSubgraph::default());
        }

        let mut run = Run::new(self.store.as_ref(), &query.query_embedding);

        for seed in &query.seeds {
            if run.node(&seed.id)?.is_none() {
                warn!(seed = %seed.id, "unknown seed, skipping");
                continue;
            }
            run.seeds.insert(seed.id.clone());
            run.touch_node(&seed.id, None);
            self.rank_seed(&mut run, seed, query, &params)?;
        }

        let subgraph = run.finish()?;
        debug!(
            seeds = query.seeds.len(),
            nodes = subgraph.nodes.len(),
            edges = subgraph.edges.len(),
            "retrieval complete"
        );
        Ok(subgraph)
    }

    fn rank_seed(&self, run: &mut Run<'_>, seed: &Seed, query: &RetrievalQuery, params: &Params) -> RetrievalResult<()> {
        let spec = PathSpec::new(params.max_hops)
            .direction(query.direction)
            .target(query.target.clone())
            .max_paths(params.max_paths_per_seed)
            .interrupt(params.interrupt.clone());

        let set = self.store.find_paths(&seed.id, &spec)?;
        if set.truncated {
            warn!(
                seed = %seed.id,
                cap = params.max_paths_per_seed,
                "path enumeration hit the per-seed cap"
            );
        }

        let mut scored: Vec<(f64, Path)> = Vec::with_capacity(set.paths.len());
        for path in set.paths {
            let similarity = run.similarity(path.terminal())?;
            let weight = hop_weight(params.hop_decay, path.hops());
            scored.push((path_score(weight, params.lambda, seed.score, similarity), path));
        }

        // Stable: equal scores keep enumeration order
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(params.per_seed_limit);

        for (score, path) in &scored {
            for node in path.nodes() {
                run.touch_node(node, Some(*score));
            }
            for edge in path.edges() {
                run.touch_edge(edge);
            }
        }
        Ok(())
    }
}

/// State of one retrieval call
struct Run<'a> {
    store: &'a dyn GraphStore,
    query: &'a [f32],
    nodes: HashMap<NodeId, Option<Node>>,
    similarities: HashMap<NodeId, f64>,
    seeds: HashSet<NodeId>,
    /// Candidate nodes with their best path score so far
    ranks: HashMap<NodeId, Option<f64>>,
    node_order: Vec<NodeId>,
    edges: Vec<EdgeId>,
    edge_set: HashSet<EdgeId>,
}

impl<'a> Run<'a> {
    fn new(store: &'a dyn GraphStore, query: &'a [f32]) -> Self {
        Self {
            store,
            query,
            nodes: HashMap::new(),
            similarities: HashMap::new(),
            seeds: HashSet::new(),
            ranks: HashMap::new(),
            node_order: Vec::new(),
            edges: Vec::new(),
            edge_set: HashSet::new(),
        }
    }

    fn node(&mut self, id: &NodeId) -> RetrievalResult<Option<&Node>> {
        if !self.nodes.contains_key(id) {
            let node = self.store.get_node(id)?;
            self.nodes.insert(id.clone(), node);
        }
        Ok(self.nodes.get(id).and_then(Option::as_ref))
    }

    /// Query similarity of a node's embedding; 0.0 without one
    fn similarity(&mut self, id: &NodeId) -> RetrievalResult<f64> {
        if let Some(&cached) = self.similarities.get(id) {
            return Ok(cached);
        }
        let query = self.query;
        let similarity = self
            .node(id)?
            .and_then(|n| n.embedding.as_deref())
            .map_or(0.0, |e| cosine_similarity(query, e));
        self.similarities.insert(id.clone(), similarity);
        Ok(similarity)
    }

    fn touch_node(&mut self, id: &NodeId, score: Option<f64>) {
        match self.ranks.get_mut(id) {
            Some(best) => {
                if let Some(score) = score {
                    *best = Some(best.map_or(score, |b| b.max(score)));
                }
            }
            None => {
                self.ranks.insert(id.clone(), score);
                self.node_order.push(id.clone());
            }
        }
    }

    fn touch_edge(&mut self, id: &EdgeId) {
        if self.edge_set.insert(id.clone()) {
            self.edges.push(id.clone());
        }
    }

    fn finish(mut self) -> RetrievalResult<RankedSubgraph> {
        let mut subgraph = RankedSubgraph::default();

        for id in std::mem::take(&mut self.node_order) {
            let computed = self.ranks.get(&id).copied().flatten();
            let is_seed = self.seeds.contains(&id);
            let rank = match (computed, is_seed) {
                (Some(r), true) => r.max(SEED_RANK_FLOOR),
                (None, true) => SEED_RANK_FLOOR,
                (Some(r), false) => r,
                (None, false) => continue,
            };
            let degree = self.store.degree(&id)?;
            let Some(node) = self.node(&id)?.cloned() else {
                continue;
            };
            subgraph.nodes.push(RankedNode {
                id: node.id,
                node_type: node.node_type,
                name: node.name,
                description: node.description,
                aliases: node.aliases,
                rank,
                is_seed,
                degree,
            });
        }

        for id in std::mem::take(&mut self.edges) {
            let Some(edge) = self.store.get_edge(&id)? else {
                continue;
            };
            let source_sim = self.similarity(&edge.source)?;
            let target_sim = self.similarity(&edge.target)?;
            let source_name = self.node(&edge.source)?.map(|n| n.name.clone()).unwrap_or_default();
            let target_name = self.node(&edge.target)?.map(|n| n.name.clone()).unwrap_or_default();
            subgraph.edges.push(RankedEdge {
                id: edge.id,
                kind: edge.kind,
                source: edge.source,
                target: edge.target,
                source_name,
                target_name,
                description: edge.description,
                rank: (source_sim + target_sim) / 2.0,
            });
        }

        subgraph.nodes.sort_by(|a, b| {
            b.rank
                .total_cmp(&a.rank)
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.id.cmp(&b.id))
        });
        subgraph.edges.sort_by(|a, b| {
            b.rank
                .total_cmp(&a.rank)
                .then_with(|| a.source_name.cmp(&b.source_name))
                .then_with(|| a.target_name.cmp(&b.target_name))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(subgraph)
    }
}
