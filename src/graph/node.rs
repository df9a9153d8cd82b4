//! Node representation in the semiotic graph

use super::label::sanitize_label;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a node
///
/// Opaque string handle issued by the store. Retrieval only ever holds
/// handles; node data stays owned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a new random NodeId
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create a NodeId from an existing string handle
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Node type: the four semiotic kinds, plus sanitized labels for anything else.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum NodeType {
    /// A depictable element of an artifact
    Form,
    /// An immediate symbolic meaning connoted by a Form
    Concept,
    /// A higher-order meaning generated by one or more Concepts
    Myth,
    /// Synthetic combination of 2+ Concepts that jointly generate a Myth
    JointConcept,
    /// Any other type, stored under its sanitized label
    Custom(String),
}

impl NodeType {
    /// Parse a free-text type string.
    ///
    /// The four fixed kinds match case-insensitively (also after
    /// sanitizing, so "joint concept" is a JointConcept). Anything else
    /// becomes a [`NodeType::Custom`] carrying the sanitized label.
    pub fn parse(raw: &str) -> Self {
        if let Some(fixed) = Self::fixed(raw.trim()) {
            return fixed;
        }
        let label = sanitize_label(raw);
        Self::fixed(&label).unwrap_or(NodeType::Custom(label))
    }

    fn fixed(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "form" => Some(NodeType::Form),
            "concept" => Some(NodeType::Concept),
            "myth" => Some(NodeType::Myth),
            "jointconcept" => Some(NodeType::JointConcept),
            _ => None,
        }
    }

    /// The graph label for this type
    pub fn as_str(&self) -> &str {
        match self {
            NodeType::Form => "Form",
            NodeType::Concept => "Concept",
            NodeType::Myth => "Myth",
            NodeType::JointConcept => "JointConcept",
            NodeType::Custom(label) => label,
        }
    }

    /// True for Concept and JointConcept, the types that may generate a Myth
    pub fn is_concept_like(&self) -> bool {
        matches!(self, NodeType::Concept | NodeType::JointConcept)
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<NodeType> for String {
    fn from(t: NodeType) -> Self {
        t.as_str().to_string()
    }
}

impl From<String> for NodeType {
    fn from(s: String) -> Self {
        NodeType::parse(&s)
    }
}

/// A node in the semiotic graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier
    pub id: NodeId,
    /// Node type (graph label)
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Canonical name, unique within `node_type`
    pub name: String,
    /// Alternative names, in first-seen order
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Free-text description; `None` until some record supplies one
    #[serde(default)]
    pub description: Option<String>,
    /// Embedding vector, attached by the embedding upsert step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    /// When the node was created
    pub created_at: DateTime<Utc>,
}

impl Node {
    /// Create a new node with the given type and canonical name
    pub fn new(node_type: NodeType, name: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            node_type,
            name: name.into(),
            aliases: Vec::new(),
            description: None,
            embedding: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.coalesce_description(Some(&description.into()));
        self
    }

    pub fn with_aliases<S: AsRef<str>>(mut self, aliases: &[S]) -> Self {
        self.add_aliases(aliases);
        self
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Set the description only if none is present yet.
    ///
    /// Blank descriptions count as absent. Returns true if the node changed.
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

    /// Append aliases not already present (and not equal to the name).
    ///
    /// Returns true if any alias was added.
    pub fn add_aliases<S: AsRef<str>>(&mut self, aliases: &[S]) -> bool {
        let mut changed = false;
        for alias in aliases {
            let alias = alias.as_ref().trim();
            if alias.is_empty() || alias == self.name || self.aliases.iter().any(|a| a == alias) {
                continue;
            }
            self.aliases.push(alias.to_string());
            changed = true;
        }
        changed
    }

    /// Fold a duplicate into this node.
    ///
    /// The survivor keeps its id, type and name. The duplicate's name and
    /// aliases become aliases; distinct non-empty descriptions are joined
    /// with a space, survivor first; the survivor's embedding wins when present.
    pub fn absorb(&mut self, duplicate: &Node) {
        self.add_aliases(&[duplicate.name.as_str()]);
        self.add_aliases(&duplicate.aliases);

        if let Some(other) = duplicate.description.as_deref() {
            match self.description.as_mut() {
                Some(own) if own.contains(other) => {}
                Some(own) => {
                    own.push(' ');
                    own.push_str(other);
                }
                None => self.description = Some(other.to_string()),
            }
        }

        if self.embedding.is_none() {
            self.embedding = duplicate.embedding.clone();
        }
    }

    /// Text handed to the embedder: name, aliases, then description.
    pub fn embedding_text(&self) -> String {
        let mut text = self.name.clone();
        for alias in &self.aliases {
            text.push_str(". ");
            text.push_str(alias);
        }
        if let Some(description) = &self.description {
            text.push_str(". ");
            text.push_str(description);
        }
        text
    }
}
