//! In-memory graph store
//!
//! An arena of nodes and edges addressed by their string handles, with
//! secondary maps for the upsert keys and per-node adjacency lists. Insertion
//! order is tracked so listings match the SQLite store's rowid order.

use super::traits::{GraphStore, NodeFilter, StorageError, StorageResult, VectorIndexSpec};
use crate::graph::{Edge, EdgeId, EdgeKind, Node, NodeId, NodeType};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

type EdgeKey = (EdgeKind, NodeId, NodeId);

#[derive(Debug, Default)]
struct Arena {
    nodes: HashMap<NodeId, Node>,
    node_order: Vec<NodeId>,
    node_keys: HashMap<(NodeType, String), NodeId>,
    edges: HashMap<EdgeId, Edge>,
    edge_order: Vec<EdgeId>,
    edge_keys: HashMap<EdgeKey, EdgeId>,
    outgoing: HashMap<NodeId, Vec<EdgeId>>,
    incoming: HashMap<NodeId, Vec<EdgeId>>,
    vector_index: Option<VectorIndexSpec>,
}

impl Arena {
    fn edge_list(&self, ids: Option<&Vec<EdgeId>>) -> Vec<Edge> {
        ids.map(|ids| ids.iter().filter_map(|id| self.edges.get(id).cloned()).collect())
            .unwrap_or_default()
    }

    /// Drop an edge's key and adjacency entries, keeping its arena slot
    fn detach(&mut self, edge: &Edge) {
        self.edge_keys
            .remove(&(edge.kind, edge.source.clone(), edge.target.clone()));
        if let Some(list) = self.outgoing.get_mut(&edge.source) {
            list.retain(|e| e != &edge.id);
        }
        if let Some(list) = self.incoming.get_mut(&edge.target) {
            list.retain(|e| e != &edge.id);
        }
    }

    fn unlink_edge(&mut self, id: &EdgeId) -> Option<Edge> {
        let edge = self.edges.remove(id)?;
        self.edge_order.retain(|e| e != id);
        self.detach(&edge);
        Some(edge)
    }
}

/// Thread-safe in-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    arena: RwLock<Arena>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, Arena>> {
        self.arena.read().map_err(|_| StorageError::Poisoned)
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, Arena>> {
        self.arena.write().map_err(|_| StorageError::Poisoned)
    }
}

impl GraphStore for MemoryStore {
    fn get_node(&self, id: &NodeId) -> StorageResult<Option<Node>> {
        Ok(self.read()?.nodes.get(id).cloned())
    }

    fn find_node(&self, node_type: &NodeType, name: &str) -> StorageResult<Option<Node>> {
        let arena = self.read()?;
        Ok(arena
            .node_keys
            .get(&(node_type.clone(), name.to_string()))
            .and_then(|id| arena.nodes.get(id))
            .cloned())
    }

    fn nodes(&self, filter: &NodeFilter) -> StorageResult<Vec<Node>> {
        let arena = self.read()?;
        let matching = arena
            .node_order
            .iter()
            .filter_map(|id| arena.nodes.get(id))
            .filter(|n| filter.node_type.as_ref().map_or(true, |t| &n.node_type == t))
            .cloned();
        Ok(match filter.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        })
    }

    fn save_node(&self, node: &Node) -> StorageResult<()> {
        let mut guard = self.write()?;
        let arena = &mut *guard;
        match arena.nodes.get(&node.id) {
            Some(previous) => {
                let old_key = (previous.node_type.clone(), previous.name.clone());
                arena.node_keys.remove(&old_key);
            }
            None => arena.node_order.push(node.id.clone()),
        }
        arena
            .node_keys
            .insert((node.node_type.clone(), node.name.clone()), node.id.clone());
        arena.nodes.insert(node.id.clone(), node.clone());
        Ok(())
    }

    fn delete_node(&self, id: &NodeId) -> StorageResult<bool> {
        let mut arena = self.write()?;
        let Some(node) = arena.nodes.remove(id) else {
            return Ok(false);
        };
        arena.node_order.retain(|n| n != id);
        arena.node_keys.remove(&(node.node_type, node.name));

        let incident: Vec<EdgeId> = arena
            .outgoing
            .remove(id)
            .into_iter()
            .chain(arena.incoming.remove(id))
            .flatten()
            .collect();
        for edge_id in incident {
            arena.unlink_edge(&edge_id);
        }
        Ok(true)
    }

    fn get_edge(&self, id: &EdgeId) -> StorageResult<Option<Edge>> {
        Ok(self.read()?.edges.get(id).cloned())
    }

    fn find_edge(&self, kind: EdgeKind, source: &NodeId, target: &NodeId) -> StorageResult<Option<Edge>> {
        let arena = self.read()?;
        Ok(arena
            .edge_keys
            .get(&(kind, source.clone(), target.clone()))
            .and_then(|id| arena.edges.get(id))
            .cloned())
    }

    fn edges(&self) -> StorageResult<Vec<Edge>> {
        let arena = self.read()?;
        Ok(arena
            .edge_order
            .iter()
            .filter_map(|id| arena.edges.get(id))
            .cloned()
            .collect())
    }

    fn edges_from(&self, id: &NodeId) -> StorageResult<Vec<Edge>> {
        let arena = self.read()?;
        Ok(arena.edge_list(arena.outgoing.get(id)))
    }

    fn edges_to(&self, id: &NodeId) -> StorageResult<Vec<Edge>> {
        let arena = self.read()?;
        Ok(arena.edge_list(arena.incoming.get(id)))
    }

    fn save_edge(&self, edge: &Edge) -> StorageResult<()> {
        let mut arena = self.write()?;
        match arena.edges.get(&edge.id).cloned() {
            Some(previous) => arena.detach(&previous),
            None => arena.edge_order.push(edge.id.clone()),
        }
        arena
            .edge_keys
            .insert((edge.kind, edge.source.clone(), edge.target.clone()), edge.id.clone());
        arena
            .outgoing
            .entry(edge.source.clone())
            .or_default()
            .push(edge.id.clone());
        arena
            .incoming
            .entry(edge.target.clone())
            .or_default()
            .push(edge.id.clone());
        arena.edges.insert(edge.id.clone(), edge.clone());
        Ok(())
    }

    fn delete_edge(&self, id: &EdgeId) -> StorageResult<bool> {
        Ok(self.write()?.unlink_edge(id).is_some())
    }

    fn create_vector_index(&self, spec: &VectorIndexSpec) -> StorageResult<()> {
        let mut guard = self.write()?;
        let arena = &mut *guard;
        match &arena.vector_index {
            Some(existing) if existing == spec => Ok(()),
            Some(existing) => Err(StorageError::VectorIndexConflict(format!(
                "index '{}' on {} has {} dimensions ({})",
                existing.name,
                existing.label,
                existing.dimensions,
                existing.similarity.as_str()
            ))),
            None => {
                arena.vector_index = Some(spec.clone());
                Ok(())
            }
        }
    }

    fn vector_index(&self) -> StorageResult<Option<VectorIndexSpec>> {
        Ok(self.read()?.vector_index.clone())
    }

    fn clear(&self) -> StorageResult<()> {
        *self.write()? = Arena::default();
        Ok(())
    }
}
