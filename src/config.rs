//! Pipeline configuration
//!
//! One explicit object, loaded from YAML and handed to each component's
//! constructor. Every field has a default, so an empty file is a valid config.

use crate::graph::NodeType;
use crate::query::{Direction, TargetPattern};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MythographConfig {
    pub embedding: EmbeddingConfig,
    pub resolver: ResolverConfig,
    pub retrieval: RetrievalConfig,
}

impl MythographConfig {
    /// Parse and validate a YAML document
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.embedding.dimensions == 0 {
            return Err(ConfigError::Invalid("embedding.dimensions must be positive".into()));
        }
        if self.embedding.index_name.trim().is_empty() {
            return Err(ConfigError::Invalid("embedding.index_name must not be empty".into()));
        }
        let threshold = self.resolver.similarity_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "resolver.similarity_threshold must be in (0, 1], got {threshold}"
            )));
        }
        if !self.retrieval.lambda.is_finite() {
            return Err(ConfigError::Invalid("retrieval.lambda must be finite".into()));
        }
        if self.retrieval.hop_decay.is_some_and(|d| !d.is_finite()) {
            return Err(ConfigError::Invalid("retrieval.hop_decay must be finite".into()));
        }
        Ok(())
    }
}

/// Vector index settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Vector length every embedding must have
    pub dimensions: usize,
    /// The only node type that receives embeddings
    pub embeddable_type: NodeType,
    pub index_name: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dimensions: 3072,
            embeddable_type: NodeType::Form,
            index_name: "form_embeddings".to_string(),
        }
    }
}

/// Duplicate resolver settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Run the fuzzy phase after exact matching
    pub fuzzy_enabled: bool,
    /// Minimum normalized name similarity for a fuzzy merge
    pub similarity_threshold: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            fuzzy_enabled: true,
            similarity_threshold: 0.95,
        }
    }
}

/// Default retrieval parameters, applied where a query leaves them unset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub max_hops: usize,
    /// Weight of the seed score against query similarity
    pub lambda: f64,
    /// Per-hop decay; unset or non-positive disables decay
    pub hop_decay: Option<f64>,
    /// Paths kept per seed after scoring
    pub per_seed_limit: usize,
    /// Seeds taken from the vector index when none are supplied
    pub top_k: usize,
    pub target: TargetPattern,
    pub direction: Direction,
    /// Enumeration stops after this many candidate paths per seed
    pub max_paths_per_seed: usize,
    pub timeout_ms: Option<u64>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_hops: 2,
            lambda: 0.5,
            hop_decay: None,
            per_seed_limit: 10,
            top_k: 5,
            target: TargetPattern::Any,
            direction: Direction::Both,
            max_paths_per_seed: 10_000,
            timeout_ms: None,
        }
    }
}
