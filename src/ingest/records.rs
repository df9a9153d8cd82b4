//! Extracted entity and relation records, as they arrive from extraction

use serde::{Deserialize, Serialize};

/// An extracted entity: a Form, Concept, Myth, or any other typed thing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Free-text type, parsed into a `NodeType`
    #[serde(rename = "type")]
    pub entity_type: String,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl EntityRecord {
    pub fn new(entity_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            name: name.into(),
            aliases: Vec::new(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_aliases<S: AsRef<str>>(mut self, aliases: &[S]) -> Self {
        self.aliases = aliases.iter().map(|a| a.as_ref().to_string()).collect();
        self
    }
}

/// An extracted relation between named entities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationRecord {
    /// Relation kind, e.g. "CONNOTES" or "generates myth"
    #[serde(rename = "type")]
    pub relation_type: String,
    /// Source entity name; for GENERATES_MYTH a fallback for `source_concepts`
    #[serde(default)]
    pub source: Option<String>,
    pub target: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Concepts that jointly generate a myth
    #[serde(default, alias = "sourceConcepts")]
    pub source_concepts: Option<Vec<String>>,
}

impl RelationRecord {
    pub fn new(relation_type: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            relation_type: relation_type.into(),
            source: Some(source.into()),
            target: target.into(),
            description: None,
            source_concepts: None,
        }
    }

    /// A GENERATES_MYTH relation from a set of concepts
    pub fn myth_from<S: AsRef<str>>(concepts: &[S], myth: impl Into<String>) -> Self {
        Self {
            relation_type: "GENERATES_MYTH".to_string(),
            source: None,
            target: myth.into(),
            description: None,
            source_concepts: Some(concepts.iter().map(|c| c.as_ref().to_string()).collect()),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// One extraction output document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionBatch {
    #[serde(default)]
    pub entities: Vec<EntityRecord>,
    #[serde(default)]
    pub relations: Vec<RelationRecord>,
}

impl ExtractionBatch {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
