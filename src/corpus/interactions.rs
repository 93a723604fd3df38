//! Unordered-pair interaction index

use std::collections::HashMap;

use crate::model::{DrugId, DrugPair, InteractionEdge, InteractionSeverity};

/// At most one edge per unordered pair. Duplicate source records merge to the
/// maximum severity, keeping the mechanism text of the edge that won.
#[derive(Debug, Default)]
pub struct InteractionIndex {
    edges: HashMap<DrugPair, InteractionEdge>,
}

impl InteractionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, edge: InteractionEdge) {
        match self.edges.get_mut(&edge.pair) {
            Some(existing) => {
                if edge.severity > existing.severity {
                    *existing = edge;
                }
            }
            None => {
                self.edges.insert(edge.pair.clone(), edge);
            }
        }
    }

    pub fn get(&self, pair: &DrugPair) -> Option<&InteractionEdge> {
        self.edges.get(pair)
    }

    /// Recorded edges among every unordered pair of `ids`, in the pairs'
    /// normalized sort order. Symmetric by construction: the pair (a, b) is
    /// the pair (b, a).
    pub fn lookup_pairs(&self, ids: &[DrugId]) -> Vec<InteractionEdge> {
        let mut found = Vec::new();
        for pair in all_pairs(ids) {
            if let Some(edge) = self.edges.get(&pair) {
                found.push(edge.clone());
            }
        }
        found
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Every unordered pair of distinct ids, deduplicated and sorted. Determines
/// the order pairs appear in payloads.
pub fn all_pairs(ids: &[DrugId]) -> Vec<DrugPair> {
    let mut pairs = Vec::new();
    for (i, a) in ids.iter().enumerate() {
        for b in ids.iter().skip(i + 1) {
            if a == b {
                continue;
            }
            pairs.push(DrugPair::new(a.clone(), b.clone()));
        }
    }
    pairs.sort();
    pairs.dedup();
    pairs
}

/// Merge provider-returned edges under the same max-severity rule the index
/// applies at load time.
pub fn merge_duplicate_pairs(edges: Vec<InteractionEdge>) -> Vec<InteractionEdge> {
    let mut index = InteractionIndex::new();
    for edge in edges {
        index.insert(edge);
    }
    let mut merged: Vec<InteractionEdge> = index.edges.into_values().collect();
    merged.sort_by(|a, b| a.pair.cmp(&b.pair));
    merged
}

/// Maximum severity over a set of edges; `SAFE` when there are none. The
/// caller distinguishes "no recorded edges" from "confirmed safe" via the
/// payload's recorded flags.
pub fn aggregate_severity(edges: &[InteractionEdge]) -> InteractionSeverity {
    InteractionSeverity::aggregate(edges.iter().map(|e| &e.severity))
}
