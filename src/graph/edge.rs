//! Edge representation: typed semiotic relations between nodes

use super::node::{NodeId, NodeType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(String);

impl EdgeId {
    /// Create a new random EdgeId
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EdgeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The closed set of relation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeKind {
    /// Form → Concept
    Connotes,
    /// Concept or JointConcept → Myth
    GeneratesMyth,
    /// Concept → JointConcept
    PartOf,
}

impl EdgeKind {
    pub const ALL: [EdgeKind; 3] = [EdgeKind::Connotes, EdgeKind::GeneratesMyth, EdgeKind::PartOf];

    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Connotes => "CONNOTES",
            EdgeKind::GeneratesMyth => "GENERATES_MYTH",
            EdgeKind::PartOf => "PART_OF",
        }
    }

    /// Parse a relation type string: case-insensitive, spaces and
    /// hyphens read as underscores. Unknown kinds yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        Self::ALL.into_iter().find(|k| k.as_str() == normalized)
    }

    /// Whether an edge of this kind may run from `source` to `target`.
    pub fn allows(&self, source: &NodeType, target: &NodeType) -> bool {
        match self {
            EdgeKind::Connotes => *source == NodeType::Form && *target == NodeType::Concept,
            EdgeKind::GeneratesMyth => source.is_concept_like() && *target == NodeType::Myth,
            EdgeKind::PartOf => *source == NodeType::Concept && *target == NodeType::JointConcept,
        }
    }
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directed, typed edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Unique identifier
    pub id: EdgeId,
    /// Relation kind
    pub kind: EdgeKind,
    /// Source node
    pub source: NodeId,
    /// Target node
    pub target: NodeId,
    /// Free-text description; `None` until some record supplies one
    #[serde(default)]
    pub description: Option<String>,
    /// When the edge was created
    pub created_at: DateTime<Utc>,
}

impl Edge {
    /// Create a new edge
    pub fn new(kind: EdgeKind, source: NodeId, target: NodeId) -> Self {
        Self {
            id: EdgeId::new(),
            kind,
            source,
            target,
            description: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.coalesce_description(Some(&description.into()));
        self
    }

    /// Set the description only if none is present yet. Returns true if changed.
    pub fn coalesce_description(&mut self, description: Option<&str>) -> bool {
        if self.description.is_some() {
            return false;
        }
        match description.map(str::trim).filter(|d| !d.is_empty()) {
            Some(d) => {
                self.description = Some(d.to_string());
                true
            }
            None => false,
        }
    }

    /// True if `node` is either endpoint
    pub fn touches(&self, node: &NodeId) -> bool {
        &self.source == node || &self.target == node
    }

    /// The endpoint opposite `node`, if `node` is an endpoint
    pub fn other_end(&self, node: &NodeId) -> Option<&NodeId> {
        if &self.source == node {
            Some(&self.target)
        } else if &self.target == node {
            Some(&self.source)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_loose_spelling() {
        assert_eq!(EdgeKind::parse("connotes"), Some(EdgeKind::Connotes));
        assert_eq!(EdgeKind::parse("generates myth"), Some(EdgeKind::GeneratesMyth));
        assert_eq!(EdgeKind::parse("Generates-Myth"), Some(EdgeKind::GeneratesMyth));
        assert_eq!(EdgeKind::parse("PART_OF"), Some(EdgeKind::PartOf));
        assert_eq!(EdgeKind::parse("depicts"), None);
    }

    #[test]
    fn endpoint_table() {
        use NodeType::*;
        assert!(EdgeKind::Connotes.allows(&Form, &Concept));
        assert!(!EdgeKind::Connotes.allows(&Concept, &Form));
        assert!(EdgeKind::GeneratesMyth.allows(&Concept, &Myth));
        assert!(EdgeKind::GeneratesMyth.allows(&JointConcept, &Myth));
        assert!(!EdgeKind::GeneratesMyth.allows(&Form, &Myth));
        assert!(EdgeKind::PartOf.allows(&Concept, &JointConcept));
        assert!(!EdgeKind::PartOf.allows(&JointConcept, &Concept));
    }

    #[test]
    fn kind_serializes_screaming_snake() {
        let json = serde_json::to_string(&EdgeKind::GeneratesMyth).unwrap();
        assert_eq!(json, "\"GENERATES_MYTH\"");
    }

    #[test]
    fn other_end_of_edge() {
        let a = NodeId::from_string("a");
        let b = NodeId::from_string("b");
        let edge = Edge::new(EdgeKind::Connotes, a.clone(), b.clone());
        assert_eq!(edge.other_end(&a), Some(&b));
        assert_eq!(edge.other_end(&b), Some(&a));
        assert_eq!(edge.other_end(&NodeId::from_string("c")), None);
    }
}
