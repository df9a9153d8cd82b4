//! Bounded path enumeration
//!
//! Depth-first walk from a seed that records every path of 1..=max_hops
//! edges ending on a node matching the target pattern. A path never reuses
//! an edge (nodes may repeat), so undirected walks cannot bounce back and
//! forth along one edge.

use super::types::{Direction, Path, PathError, PathSet, PathSpec};
use crate::graph::{EdgeId, NodeId, NodeType};
use crate::storage::GraphStore;
use std::collections::HashMap;

/// Enumerate all paths from `seed` permitted by `spec`.
///
/// Paths come out in depth-first order following the store's edge order,
/// so results are deterministic for a given graph. An unknown seed yields
/// an empty set.
pub fn enumerate_paths<S: GraphStore + ?Sized>(
    store: &S,
    seed: &NodeId,
    spec: &PathSpec,
) -> Result<PathSet, PathError> {
    let mut walker = Walker {
        store,
        spec,
        adjacency: HashMap::new(),
        types: HashMap::new(),
        out: PathSet::default(),
    };

    if spec.max_hops == 0 || store.get_node(seed)?.is_none() {
        return Ok(walker.out);
    }

    let mut steps = Vec::new();
    walker.walk(seed, &mut steps)?;
    Ok(walker.out)
}

struct Walker<'a, S: GraphStore + ?Sized> {
    store: &'a S,
    spec: &'a PathSpec,
    /// Neighbor lists fetched so far, per node
    adjacency: HashMap<NodeId, Vec<(EdgeId, NodeId)>>,
    /// Node types fetched so far; `None` for dangling ids
    types: HashMap<NodeId, Option<NodeType>>,
    out: PathSet,
}

impl<'a, S: GraphStore + ?Sized> Walker<'a, S> {
    fn walk(&mut self, origin: &NodeId, steps: &mut Vec<(EdgeId, NodeId)>) -> Result<(), PathError> {
        self.spec.interrupt.check()?;

        let current = steps.last().map(|(_, n)| n.clone()).unwrap_or_else(|| origin.clone());
        let neighbors = self.neighbors(&current)?;

        for (edge_id, next) in neighbors {
            if steps.iter().any(|(e, _)| *e == edge_id) {
                continue;
            }
            let Some(next_type) = self.node_type(&next)? else {
                continue;
            };

            steps.push((edge_id, next));

            if self.spec.target.matches(&next_type) {
                if self.out.paths.len() >= self.spec.max_paths {
                    self.out.truncated = true;
                    steps.pop();
                    return Ok(());
                }
                self.out.paths.push(Path::new(origin.clone(), steps.clone()));
            }

            if steps.len() < self.spec.max_hops {
                self.walk(origin, steps)?;
            }
            steps.pop();

            if self.out.truncated {
                return Ok(());
            }
        }
        Ok(())
    }

    fn neighbors(&mut self, node: &NodeId) -> Result<Vec<(EdgeId, NodeId)>, PathError> {
        if let Some(cached) = self.adjacency.get(node) {
            return Ok(cached.clone());
        }

        let mut neighbors = Vec::new();
        if matches!(self.spec.direction, Direction::Outgoing | Direction::Both) {
            neighbors.extend(
                self.store
                    .edges_from(node)?
                    .into_iter()
                    .map(|e| (e.id, e.target)),
            );
        }
        if matches!(self.spec.direction, Direction::Incoming | Direction::Both) {
            neighbors.extend(
                self.store
                    .edges_to(node)?
                    .into_iter()
                    .map(|e| (e.id, e.source)),
            );
        }

        self.adjacency.insert(node.clone(), neighbors.clone());
        Ok(neighbors)
    }

    fn node_type(&mut self, node: &NodeId) -> Result<Option<NodeType>, PathError> {
        if let Some(cached) = self.types.get(node) {
            return Ok(cached.clone());
        }
        let node_type = self.store.get_node(node)?.map(|n| n.node_type);
        self.types.insert(node.clone(), node_type.clone());
        Ok(node_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EdgeKind;
    use crate::query::{CancellationToken, Interrupt, TargetPattern};
    use crate::storage::MemoryStore;

    struct Fixture {
        store: MemoryStore,
        magpie: NodeId,
        tiger: NodeId,
        good_news: NodeId,
        protection: NodeId,
        joint: NodeId,
        myth: NodeId,
    }

    // Magpie -CONNOTES-> GoodNews -GENERATES_MYTH-> Myth
    // Tiger  -CONNOTES-> Protection
    // GoodNews, Protection -PART_OF-> Joint -GENERATES_MYTH-> Myth
    fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let node = |t: NodeType, name: &str| store.upsert_node(&t, name, None, &[]).unwrap().id;

        let magpie = node(NodeType::Form, "Magpie");
        let tiger = node(NodeType::Form, "Tiger");
        let good_news = node(NodeType::Concept, "Good News");
        let protection = node(NodeType::Concept, "Protection");
        let joint = node(NodeType::JointConcept, "Good News+Protection");
        let myth = node(NodeType::Myth, "Auspicious New Year");

        let edge = |k: EdgeKind, s: &NodeId, t: &NodeId| {
            store.upsert_edge(k, s, t, None).unwrap();
        };
        edge(EdgeKind::Connotes, &magpie, &good_news);
        edge(EdgeKind::Connotes, &tiger, &protection);
        edge(EdgeKind::GeneratesMyth, &good_news, &myth);
        edge(EdgeKind::PartOf, &good_news, &joint);
        edge(EdgeKind::PartOf, &protection, &joint);
        edge(EdgeKind::GeneratesMyth, &joint, &myth);

        Fixture { store, magpie, tiger, good_news, protection, joint, myth }
    }

    #[test]
    fn one_hop_outgoing() {
        let f = fixture();
        let spec = PathSpec::new(1).direction(Direction::Outgoing);
        let set = enumerate_paths(&f.store, &f.magpie, &spec).unwrap();

        assert_eq!(set.paths.len(), 1);
        assert_eq!(set.paths[0].terminal(), &f.good_news);
        assert!(!set.truncated);
    }

    #[test]
    fn outgoing_paths_to_myth() {
        let f = fixture();
        let spec = PathSpec::new(3)
            .direction(Direction::Outgoing)
            .target(TargetPattern::only(NodeType::Myth));
        let set = enumerate_paths(&f.store, &f.magpie, &spec).unwrap();

        // Magpie→GoodNews→Myth and Magpie→GoodNews→Joint→Myth
        assert_eq!(set.paths.len(), 2);
        assert!(set.paths.iter().all(|p| p.terminal() == &f.myth));
        let mut hops: Vec<usize> = set.paths.iter().map(Path::hops).collect();
        hops.sort();
        assert_eq!(hops, vec![2, 3]);
    }

    #[test]
    fn respects_max_hops() {
        let f = fixture();
        let spec = PathSpec::new(2)
            .direction(Direction::Outgoing)
            .target(TargetPattern::only(NodeType::Myth));
        let set = enumerate_paths(&f.store, &f.magpie, &spec).unwrap();
        assert_eq!(set.paths.len(), 1);
        assert_eq!(set.paths[0].hops(), 2);
    }

    #[test]
    fn undirected_walk_reaches_other_forms() {
        let f = fixture();
        let spec = PathSpec::new(4).target(TargetPattern::only(NodeType::Form));
        let set = enumerate_paths(&f.store, &f.magpie, &spec).unwrap();

        // Magpie-GoodNews-Joint-Protection-Tiger
        assert!(set.paths.iter().any(|p| p.terminal() == &f.tiger && p.hops() == 4));
        // The seed is never reported as its own 0-hop path
        assert!(set.paths.iter().all(|p| p.hops() >= 1));
    }

    #[test]
    fn edges_are_never_reused() {
        let f = fixture();
        let spec = PathSpec::new(6);
        let set = enumerate_paths(&f.store, &f.protection, &spec).unwrap();
        for path in &set.paths {
            let mut edges: Vec<&EdgeId> = path.edges().collect();
            let before = edges.len();
            edges.sort();
            edges.dedup();
            assert_eq!(edges.len(), before, "edge reused in {:?}", path);
        }
        assert!(set.paths.iter().any(|p| p.terminal() == &f.joint));
    }

    #[test]
    fn max_paths_truncates() {
        let f = fixture();
        let spec = PathSpec::new(6).max_paths(2);
        let set = enumerate_paths(&f.store, &f.magpie, &spec).unwrap();
        assert_eq!(set.paths.len(), 2);
        assert!(set.truncated);
    }

    #[test]
    fn unknown_seed_yields_nothing() {
        let f = fixture();
        let spec = PathSpec::new(3);
        let set = enumerate_paths(&f.store, &NodeId::from_string("missing"), &spec).unwrap();
        assert!(set.paths.is_empty());
    }

    #[test]
    fn cancelled_enumeration_errors() {
        let f = fixture();
        let token = CancellationToken::new();
        token.cancel();
        let spec = PathSpec::new(3).interrupt(Interrupt::none().with_token(token));
        let result = enumerate_paths(&f.store, &f.magpie, &spec);
        assert!(matches!(result, Err(PathError::Cancelled)));
    }
}
