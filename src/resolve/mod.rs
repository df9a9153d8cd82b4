//! Duplicate resolution
//!
//! Offline maintenance pass that merges nodes naming the same thing. The
//! exact phase always runs; the fuzzy phase runs when a fuzzy strategy is
//! configured and is otherwise skipped with a warning.

mod resolver;
mod strategy;

pub use resolver::{PhaseStats, ResolveError, ResolveReport, ResolveWarning, Resolver};
pub use strategy::{name_similarity, DedupStrategy, ExactMatch, FuzzyMatch};
