//! Query-time retrieval: seeds in, ranked subgraph out

pub mod format;
mod params;
mod result;
mod retriever;
mod seeds;

pub use format::format_context;
pub use params::{hop_weight, path_score, RetrievalQuery, Seed, MAX_HOPS_LIMIT, PER_SEED_LIMIT_MAX};
pub use result::{RankedEdge, RankedNode, RankedSubgraph};
pub use retriever::{HybridRetriever, SEED_RANK_FLOOR};
pub use seeds::seeds_from_index;

use crate::query::PathError;
use crate::storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("invalid query parameter: {0}")]
    InvalidQueryParameter(String),

    #[error("retrieval cancelled")]
    Cancelled,

    #[error("retrieval timed out")]
    TimedOut,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<PathError> for RetrievalError {
    fn from(err: PathError) -> Self {
        match err {
            PathError::Cancelled => RetrievalError::Cancelled,
            PathError::TimedOut => RetrievalError::TimedOut,
            PathError::Storage(e) => RetrievalError::Storage(e),
        }
    }
}

pub type RetrievalResult<T> = Result<T, RetrievalError>;
