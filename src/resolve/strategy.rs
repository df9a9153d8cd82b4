//! Duplicate detection strategies
//!
//! A strategy partitions nodes of one type into groups of duplicates. The
//! resolver decides which member survives and how the rest are merged.

use crate::graph::{normalized_name, Node};
use std::collections::HashMap;

/// Finds duplicate groups among nodes of a single type
pub trait DedupStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// Groups of 2+ indices into `nodes`. Each group lists indices in
    /// ascending order; groups are ordered by their first index.
    fn group(&self, nodes: &[Node]) -> Vec<Vec<usize>>;
}

/// Same normalized name (case, spacing and punctuation ignored)
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatch;

impl DedupStrategy for ExactMatch {
    fn name(&self) -> &str {
        "exact"
    }

    fn group(&self, nodes: &[Node]) -> Vec<Vec<usize>> {
        let mut by_key: HashMap<String, Vec<usize>> = HashMap::new();
        let mut keys = Vec::new();
        for (index, node) in nodes.iter().enumerate() {
            let key = normalized_name(&node.name);
            let members = by_key.entry(key.clone()).or_default();
            if members.is_empty() {
                keys.push(key);
            }
            members.push(index);
        }

        keys.into_iter()
            .filter_map(|key| by_key.remove(&key))
            .filter(|group| group.len() > 1)
            .collect()
    }
}

/// Single-link clustering on normalized Levenshtein similarity
#[derive(Debug, Clone, Copy)]
pub struct FuzzyMatch {
    threshold: f64,
}

impl FuzzyMatch {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl DedupStrategy for FuzzyMatch {
    fn name(&self) -> &str {
        "fuzzy"
    }

    /// Two names link when their similarity is at or above the threshold
    /// (`>=`), so a pair scoring exactly the threshold merges.
    fn group(&self, nodes: &[Node]) -> Vec<Vec<usize>> {
        let names: Vec<Vec<char>> = nodes
            .iter()
            .map(|n| n.name.to_lowercase().chars().collect())
            .collect();

        let mut sets = DisjointSets::new(nodes.len());
        for i in 0..names.len() {
            for j in (i + 1)..names.len() {
                if chars_similarity(&names[i], &names[j]) >= self.threshold {
                    sets.union(i, j);
                }
            }
        }
        sets.groups()
    }
}

/// Normalized Levenshtein similarity of two names, case-insensitive:
/// `1 - distance / max(len_a, len_b)`, and 1.0 for two empty names.
pub fn name_similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    chars_similarity(&a, &b)
}

fn chars_similarity(a: &[char], b: &[char]) -> f64 {
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / longest as f64
}

/// Edit distance with two DP rows
fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr: Vec<usize> = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for j in 1..=b.len() {
            let cost = usize::from(*ca != b[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Union-find over node indices
struct DisjointSets {
    parent: Vec<usize>,
}

impl DisjointSets {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            // Lower index as root keeps group order stable
            let (root, child) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[child] = root;
        }
    }

    fn groups(mut self) -> Vec<Vec<usize>> {
        let mut by_root: HashMap<usize, Vec<usize>> = HashMap::new();
        let mut roots = Vec::new();
        for i in 0..self.parent.len() {
            let root = self.find(i);
            let members = by_root.entry(root).or_default();
            if members.is_empty() {
                roots.push(root);
            }
            members.push(i);
        }
        roots
            .into_iter()
            .filter_map(|root| by_root.remove(&root))
            .filter(|group| group.len() > 1)
            .collect()
    }
}
