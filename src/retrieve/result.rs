//! Ranked retrieval output

use crate::graph::{EdgeId, EdgeKind, NodeId, NodeType};
use serde::Serialize;

/// A retrieved node with its rank
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedNode {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub name: String,
    pub description: Option<String>,
    pub aliases: Vec<String>,
    pub rank: f64,
    #[serde(rename = "isSeed")]
    pub is_seed: bool,
    /// Incident edges in the whole graph, not just the result
    pub degree: usize,
}

/// A retrieved edge with its rank
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEdge {
    pub id: EdgeId,
    pub kind: EdgeKind,
    pub source: NodeId,
    pub target: NodeId,
    pub source_name: String,
    pub target_name: String,
    pub description: Option<String>,
    pub rank: f64,
}

/// Nodes and edges, each sorted by rank descending
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RankedSubgraph {
    pub nodes: Vec<RankedNode>,
    pub edges: Vec<RankedEdge>,
}

impl RankedSubgraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn node(&self, id: &NodeId) -> Option<&RankedNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
