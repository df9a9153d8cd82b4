//! Two-phase duplicate resolution: exact, then fuzzy

use super::strategy::{DedupStrategy, ExactMatch, FuzzyMatch};
use crate::config::ResolverConfig;
use crate::graph::{Node, NodeId, NodeType};
use crate::storage::{GraphStore, NodeFilter, StorageError};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Non-fatal conditions noted during a resolve pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "warning", content = "detail", rename_all = "snake_case")]
pub enum ResolveWarning {
    /// A phase's strategy is not configured; the phase was skipped
    ResolverCapabilityUnavailable(String),
}

/// Merges performed by one phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PhaseStats {
    pub groups_merged: usize,
    pub nodes_removed: usize,
}

/// Outcome of a resolve pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolveReport {
    pub exact: PhaseStats,
    /// `None` when the fuzzy phase did not run
    pub fuzzy: Option<PhaseStats>,
    /// Edges moved onto a survivor
    pub edges_repointed: usize,
    /// Re-pointed edges that collided with an existing edge and were folded in
    pub edges_folded: usize,
    /// Edges that would have become self-loops
    pub edges_dropped: usize,
    pub warnings: Vec<ResolveWarning>,
}

/// Offline duplicate merger.
///
/// Must not run while queries are being served: merges delete nodes and
/// re-point edges in place.
pub struct Resolver {
    store: Arc<dyn GraphStore>,
    exact: Box<dyn DedupStrategy>,
    fuzzy: Option<Box<dyn DedupStrategy>>,
}

impl Resolver {
    pub fn new(store: Arc<dyn GraphStore>, config: &ResolverConfig) -> Self {
        let fuzzy: Option<Box<dyn DedupStrategy>> = if config.fuzzy_enabled {
            Some(Box::new(FuzzyMatch::new(config.similarity_threshold)))
        } else {
            None
        };
        Self::with_strategies(store, Box::new(ExactMatch), fuzzy)
    }

    pub fn with_strategies(
        store: Arc<dyn GraphStore>,
        exact: Box<dyn DedupStrategy>,
        fuzzy: Option<Box<dyn DedupStrategy>>,
    ) -> Self {
        Self { store, exact, fuzzy }
    }

    /// Run the exact phase, then the fuzzy phase if available.
    pub fn resolve(&self) -> Result<ResolveReport, ResolveError> {
        let mut report = ResolveReport::default();

        report.exact = self.run_phase(self.exact.as_ref(), &mut report)?;

        match &self.fuzzy {
            Some(fuzzy) => {
                let stats = self.run_phase(fuzzy.as_ref(), &mut report)?;
                report.fuzzy = Some(stats);
            }
            None => {
                warn!("fuzzy duplicate matching unavailable, skipping fuzzy phase");
                report.warnings.push(ResolveWarning::ResolverCapabilityUnavailable(
                    "fuzzy name matching is not configured".to_string(),
                ));
            }
        }

        info!(
            exact_groups = report.exact.groups_merged,
            fuzzy_groups = report.fuzzy.map(|s| s.groups_merged).unwrap_or(0),
            edges_repointed = report.edges_repointed,
            edges_dropped = report.edges_dropped,
            "resolved duplicates"
        );
        Ok(report)
    }

    fn run_phase(&self, strategy: &dyn DedupStrategy, report: &mut ResolveReport) -> Result<PhaseStats, ResolveError> {
        let mut stats = PhaseStats::default();

        for node_type in self.node_types()? {
            let nodes = self.store.nodes(&NodeFilter::new().with_type(node_type))?;
            for group in strategy.group(&nodes) {
                let members: Vec<&Node> = group.iter().map(|&i| &nodes[i]).collect();
                stats.nodes_removed += self.merge_group(&members, report)?;
                stats.groups_merged += 1;
            }
        }

        debug!(phase = strategy.name(), groups = stats.groups_merged, "phase complete");
        Ok(stats)
    }

    /// Distinct node types, in first-seen order
    fn node_types(&self) -> Result<Vec<NodeType>, ResolveError> {
        let mut seen = HashSet::new();
        Ok(self
            .store
            .nodes(&NodeFilter::new())?
            .into_iter()
            .map(|n| n.node_type)
            .filter(|t| seen.insert(t.clone()))
            .collect())
    }

    /// Merge a group into its earliest member. Returns the number of nodes removed.
    fn merge_group(&self, members: &[&Node], report: &mut ResolveReport) -> Result<usize, ResolveError> {
        // Earliest created_at wins; `min_by_key` keeps the first on ties, i.e. store order
        let Some(survivor) = members.iter().min_by_key(|n| n.created_at) else {
            return Ok(0);
        };
        let Some(mut merged) = self.store.get_node(&survivor.id)? else {
            return Ok(0);
        };

        let group: HashSet<&NodeId> = members.iter().map(|n| &n.id).collect();
        let duplicates: Vec<&Node> = members
            .iter()
            .copied()
            .filter(|n| n.id != merged.id)
            .collect();

        for duplicate in &duplicates {
            merged.absorb(duplicate);
        }
        self.store.save_node(&merged)?;

        for duplicate in &duplicates {
            self.repoint_edges(&duplicate.id, &merged.id, &group, report)?;
            self.store.delete_node(&duplicate.id)?;
            debug!(survivor = %merged.name, duplicate = %duplicate.name, "merged duplicate");
        }
        Ok(duplicates.len())
    }

    fn repoint_edges(
        &self,
        duplicate: &NodeId,
        survivor: &NodeId,
        group: &HashSet<&NodeId>,
        report: &mut ResolveReport,
    ) -> Result<(), ResolveError> {
        let remap = |id: &NodeId| if group.contains(id) { survivor.clone() } else { id.clone() };

        let mut incident = self.store.edges_from(duplicate)?;
        incident.extend(self.store.edges_to(duplicate)?);

        for mut edge in incident {
            // A self-loop on the duplicate shows up in both lists
            if self.store.get_edge(&edge.id)?.is_none() {
                continue;
            }

            let source = remap(&edge.source);
            let target = remap(&edge.target);

            if source == target {
                self.store.delete_edge(&edge.id)?;
                report.edges_dropped += 1;
                continue;
            }

            match self.store.find_edge(edge.kind, &source, &target)? {
                Some(mut existing) if existing.id != edge.id => {
                    if existing.coalesce_description(edge.description.as_deref()) {
                        self.store.save_edge(&existing)?;
                    }
                    self.store.delete_edge(&edge.id)?;
                    report.edges_folded += 1;
                }
                _ => {
                    edge.source = source;
                    edge.target = target;
                    self.store.save_edge(&edge)?;
                    report.edges_repointed += 1;
                }
            }
        }
        Ok(())
    }
}
