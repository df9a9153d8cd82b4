//! Bounded path enumeration over a graph store
//!
//! Provides the traversal primitive the retriever ranks: all paths of a
//! bounded number of hops from a seed, filtered by terminal node type, with
//! cooperative cancellation and a deadline.

mod cancel;
mod path;
mod types;

pub use cancel::{CancellationToken, Interrupt};
pub use path::enumerate_paths;
pub use types::{Direction, Path, PathError, PathSet, PathSpec, TargetPattern};
