//! Differences between two graphs
//!
//! Ground triples are compared directly. Triples with blank nodes are
//! correlated through the matcher so that renamed blank nodes do not show
//! up as changes.

use std::fmt;

use fnv::FnvHashSet;
use serde::Serialize;
use tracing::debug;

use super::matcher::{equality_mapping, subgraph_mapping, NodeMapping};
use crate::term::{Node, Triple};

/// Triples to remove from and add to graph A to obtain graph B
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GraphDiffReport {
    /// Triples only in B
    pub added: Vec<Triple>,
    /// Triples only in A
    pub removed: Vec<Triple>,
    /// Blank node correlation from A to B, when one was found
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping: Option<NodeMapping>,
}

impl GraphDiffReport {
    /// Compute the difference from `a` to `b`
    pub fn compute<'a>(
        a: impl IntoIterator<Item = &'a Triple>,
        b: impl IntoIterator<Item = &'a Triple>,
    ) -> Self {
        let (ground_a, non_ground_a) = partition(a);
        let (ground_b, non_ground_b) = partition(b);

        let mut removed: Vec<Triple> =
            ground_a.iter().filter(|t| !ground_b.contains(*t)).map(|t| (*t).clone()).collect();
        let mut added: Vec<Triple> =
            ground_b.iter().filter(|t| !ground_a.contains(*t)).map(|t| (*t).clone()).collect();

        let mapping = if non_ground_a.is_empty() && non_ground_b.is_empty() {
            None
        } else if let Some(m) = equality_mapping(non_ground_a.iter().copied(), non_ground_b.iter().copied()) {
            Some(m)
        } else if non_ground_a.len() <= non_ground_b.len() {
            subgraph_mapping(non_ground_a.iter().copied(), non_ground_b.iter().copied())
        } else {
            subgraph_mapping(non_ground_b.iter().copied(), non_ground_a.iter().copied())
                .map(|m| m.inverse())
        };

        match &mapping {
            Some(m) => {
                // A triple with an unmapped blank node has no counterpart in B
                let image: FnvHashSet<Triple> = non_ground_a
                    .iter()
                    .filter(|t| is_mapped(m, t))
                    .map(|t| m.map_triple(t))
                    .collect();
                let b_set: FnvHashSet<&Triple> = non_ground_b.iter().copied().collect();
                removed.extend(
                    non_ground_a
                        .iter()
                        .filter(|t| !is_mapped(m, t) || !b_set.contains(&m.map_triple(t)))
                        .map(|t| (*t).clone()),
                );
                added.extend(
                    non_ground_b.iter().filter(|t| !image.contains(**t)).map(|t| (*t).clone()),
                );
            }
            None => {
                if !non_ground_a.is_empty() || !non_ground_b.is_empty() {
                    debug!("no blank node correlation, reporting all non-ground triples");
                }
                removed.extend(non_ground_a.iter().map(|t| (*t).clone()));
                added.extend(non_ground_b.iter().map(|t| (*t).clone()));
            }
        }

        removed.sort();
        added.sort();
        GraphDiffReport { added, removed, mapping }
    }

    /// Whether the graphs are the same up to blank node renaming
    pub fn are_equal(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

fn is_mapped(mapping: &NodeMapping, triple: &Triple) -> bool {
    triple.blank_nodes().all(|b| mapping.get(&Node::Blank(b.clone())).is_some())
}

fn partition<'a>(triples: impl IntoIterator<Item = &'a Triple>) -> (FnvHashSet<&'a Triple>, Vec<&'a Triple>) {
    let mut ground = FnvHashSet::default();
    let mut non_ground = Vec::new();
    for triple in triples {
        if triple.is_ground() {
            ground.insert(triple);
        } else {
            non_ground.push(triple);
        }
    }
    non_ground.sort();
    non_ground.dedup();
    (ground, non_ground)
}

impl fmt::Display for GraphDiffReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for triple in &self.removed {
            writeln!(f, "- {}", triple)?;
        }
        for triple in &self.added {
            writeln!(f, "+ {}", triple)?;
        }
        Ok(())
    }
}
