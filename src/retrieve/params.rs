//! Retrieval query parameters and their normalization

use super::RetrievalError;
use crate::config::RetrievalConfig;
use crate::graph::NodeId;
use crate::query::{CancellationToken, Direction, Interrupt, TargetPattern};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

pub const MAX_HOPS_LIMIT: usize = 10;
pub const PER_SEED_LIMIT_MAX: usize = 1000;

/// A node supplied to retrieval with an external relevance score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seed {
    pub id: NodeId,
    pub score: f64,
}

impl Seed {
    pub fn new(id: NodeId, score: f64) -> Self {
        Self { id, score }
    }
}

/// One retrieval request
#[derive(Debug, Clone)]
pub struct RetrievalQuery {
    pub seeds: Vec<Seed>,
    pub query_embedding: Vec<f32>,
    pub target: TargetPattern,
    pub max_hops: usize,
    /// Weight of the seed score; `1 - lambda` weighs query similarity
    pub lambda: f64,
    /// Per-hop decay; `None` or non-positive disables decay
    pub hop_decay: Option<f64>,
    /// Paths kept per seed after scoring
    pub per_seed_limit: usize,
    pub direction: Direction,
    /// Enumeration cap per seed
    pub max_paths_per_seed: usize,
    pub timeout: Option<Duration>,
    pub cancel: Option<CancellationToken>,
}

impl RetrievalQuery {
    pub fn new(seeds: Vec<Seed>, query_embedding: Vec<f32>) -> Self {
        Self::from_config(&RetrievalConfig::default(), seeds, query_embedding)
    }

    /// A query carrying the configured defaults
    pub fn from_config(config: &RetrievalConfig, seeds: Vec<Seed>, query_embedding: Vec<f32>) -> Self {
        Self {
            seeds,
            query_embedding,
            target: config.target.clone(),
            max_hops: config.max_hops,
            lambda: config.lambda,
            hop_decay: config.hop_decay,
            per_seed_limit: config.per_seed_limit,
            direction: config.direction,
            max_paths_per_seed: config.max_paths_per_seed,
            timeout: config.timeout_ms.map(Duration::from_millis),
            cancel: None,
        }
    }

    pub fn target(mut self, target: TargetPattern) -> Self {
        self.target = target;
        self
    }

    pub fn max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = max_hops;
        self
    }

    pub fn lambda(mut self, lambda: f64) -> Self {
        self.lambda = lambda;
        self
    }

    pub fn hop_decay(mut self, hop_decay: Option<f64>) -> Self {
        self.hop_decay = hop_decay;
        self
    }

    pub fn per_seed_limit(mut self, per_seed_limit: usize) -> Self {
        self.per_seed_limit = per_seed_limit;
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn max_paths_per_seed(mut self, max_paths_per_seed: usize) -> Self {
        self.max_paths_per_seed = max_paths_per_seed;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Validate and clamp into the parameters the ranking runs with.
    ///
    /// Non-finite numbers are rejected; out-of-range numbers are clamped.
    pub(crate) fn resolve(&self) -> Result<Params, RetrievalError> {
        if !self.lambda.is_finite() {
            return Err(RetrievalError::InvalidQueryParameter(format!(
                "lambda must be finite, got {}",
                self.lambda
            )));
        }
        if let Some(decay) = self.hop_decay.filter(|d| !d.is_finite()) {
            return Err(RetrievalError::InvalidQueryParameter(format!(
                "hop_decay must be finite, got {decay}"
            )));
        }
        if let Some(seed) = self.seeds.iter().find(|s| !s.score.is_finite()) {
            return Err(RetrievalError::InvalidQueryParameter(format!(
                "seed {} has non-finite score {}",
                seed.id, seed.score
            )));
        }

        let max_hops = clamped("max_hops", self.max_hops, 1, MAX_HOPS_LIMIT);
        let per_seed_limit = clamped("per_seed_limit", self.per_seed_limit, 1, PER_SEED_LIMIT_MAX);

        let lambda = self.lambda.clamp(0.0, 1.0);
        if lambda != self.lambda {
            warn!(requested = self.lambda, used = lambda, "clamped lambda");
        }

        let hop_decay = match self.hop_decay {
            Some(d) if d <= 0.0 => None,
            Some(d) if d > 1.0 => {
                warn!(requested = d, used = 1.0, "clamped hop_decay");
                Some(1.0)
            }
            other => other,
        };

        let mut interrupt = Interrupt::none();
        if let Some(token) = &self.cancel {
            interrupt = interrupt.with_token(token.clone());
        }
        if let Some(timeout) = self.timeout {
            interrupt = interrupt.with_timeout(timeout);
        }

        Ok(Params {
            max_hops,
            lambda,
            hop_decay,
            per_seed_limit,
            max_paths_per_seed: self.max_paths_per_seed.max(1),
            interrupt,
        })
    }
}

fn clamped(name: &str, value: usize, min: usize, max: usize) -> usize {
    let used = value.clamp(min, max);
    if used != value {
        warn!(parameter = name, requested = value, used, "clamped retrieval parameter");
    }
    used
}

/// Normalized parameters for one retrieval call
#[derive(Debug, Clone)]
pub(crate) struct Params {
    pub max_hops: usize,
    pub lambda: f64,
    pub hop_decay: Option<f64>,
    pub per_seed_limit: usize,
    pub max_paths_per_seed: usize,
    /// Deadline starts when the query is resolved
    pub interrupt: Interrupt,
}

/// Decay weight of a path with `hops` edges: `decay^(hops-1)`, or 1.0
/// when decay is disabled.
pub fn hop_weight(hop_decay: Option<f64>, hops: usize) -> f64 {
    match hop_decay {
        Some(decay) if decay > 0.0 => decay.powi(hops.saturating_sub(1) as i32),
        _ => 1.0,
    }
}

/// `hop_weight × (λ × seed_score + (1-λ) × text_similarity)`
pub fn path_score(hop_weight: f64, lambda: f64, seed_score: f64, text_similarity: f64) -> f64 {
    hop_weight * (lambda * seed_score + (1.0 - lambda) * text_similarity)
}
