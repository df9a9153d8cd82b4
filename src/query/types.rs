//! Path query types and result structures

use super::cancel::Interrupt;
use crate::graph::{EdgeId, NodeId, NodeType};
use crate::storage::StorageError;
use serde::{Deserialize, Serialize};
use std::iter;
use thiserror::Error;

/// Direction for edge traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Follow outgoing edges (source -> target)
    Outgoing,
    /// Follow incoming edges (target <- source)
    Incoming,
    /// Follow edges in both directions
    #[default]
    Both,
}

/// Which terminal nodes a path may end on
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetPattern {
    /// Any node
    #[default]
    Any,
    /// Nodes of one of the listed types
    Types(Vec<NodeType>),
}

impl TargetPattern {
    pub fn only(node_type: NodeType) -> Self {
        TargetPattern::Types(vec![node_type])
    }

    pub fn matches(&self, node_type: &NodeType) -> bool {
        match self {
            TargetPattern::Any => true,
            TargetPattern::Types(types) => types.contains(node_type),
        }
    }
}

/// A walk from a seed: the seed plus one `(edge, node)` step per hop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    origin: NodeId,
    steps: Vec<(EdgeId, NodeId)>,
}

impl Path {
    pub fn new(origin: NodeId, steps: Vec<(EdgeId, NodeId)>) -> Self {
        Self { origin, steps }
    }

    /// Number of edges traversed
    pub fn hops(&self) -> usize {
        self.steps.len()
    }

    pub fn origin(&self) -> &NodeId {
        &self.origin
    }

    /// Last node on the path (the origin for an empty path)
    pub fn terminal(&self) -> &NodeId {
        self.steps.last().map(|(_, n)| n).unwrap_or(&self.origin)
    }

    /// All nodes, origin first. A node may repeat; edges never do.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeId> {
        iter::once(&self.origin).chain(self.steps.iter().map(|(_, n)| n))
    }

    pub fn edges(&self) -> impl Iterator<Item = &EdgeId> {
        self.steps.iter().map(|(e, _)| e)
    }
}

/// Bounds and filters for path enumeration from one seed
#[derive(Debug, Clone)]
pub struct PathSpec {
    /// Maximum path length in hops (paths have 1..=max_hops edges)
    pub max_hops: usize,
    pub direction: Direction,
    pub target: TargetPattern,
    /// Enumeration stops once this many paths were collected
    pub max_paths: usize,
    /// Cancellation and deadline checks
    pub interrupt: Interrupt,
}

impl PathSpec {
    pub fn new(max_hops: usize) -> Self {
        Self {
            max_hops,
            direction: Direction::default(),
            target: TargetPattern::default(),
            max_paths: usize::MAX,
            interrupt: Interrupt::none(),
        }
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn target(mut self, target: TargetPattern) -> Self {
        self.target = target;
        self
    }

    pub fn max_paths(mut self, max_paths: usize) -> Self {
        self.max_paths = max_paths;
        self
    }

    pub fn interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }
}

/// Paths found from one seed
#[derive(Debug, Clone, Default)]
pub struct PathSet {
    pub paths: Vec<Path>,
    /// True if enumeration stopped at `max_paths`
    pub truncated: bool,
}

/// Why path enumeration stopped early
#[derive(Debug, Error)]
pub enum PathError {
    #[error("path enumeration cancelled")]
    Cancelled,

    #[error("path enumeration exceeded its deadline")]
    TimedOut,

    #[error("storage error during path enumeration: {0}")]
    Storage(#[from] StorageError),
}
