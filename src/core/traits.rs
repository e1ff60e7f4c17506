//! Core trait abstractions for n3graph
//!
//! This module defines the seams the rest of the crate is built on:
//! - Swappable triple store backends (`TripleStore`)
//! - Observable graph events (`GraphListener`)
//! - Variable extraction helpers for patterns

use std::fmt::Debug;

use crate::term::{Node, Triple, Variable};

// ============================================================================
// Triple Store Abstraction
// ============================================================================

/// A triple store abstraction for storing and querying RDF triples
///
/// Stores have set semantics: asserting a present triple or retracting an
/// absent one is a no-op reported by the `false` return value.
/// This trait is dyn-compatible for use with trait objects.
pub trait TripleStore: Send + Sync + Debug {
    /// Add a triple, returning `true` if it was not already present
    fn assert(&mut self, triple: Triple) -> bool;

    /// Add multiple triples (boxed iterator for dyn-compatibility)
    fn assert_all(&mut self, triples: Box<dyn Iterator<Item = Triple> + '_>) -> usize {
        let mut added = 0;
        for triple in triples {
            if self.assert(triple) {
                added += 1;
            }
        }
        added
    }

    /// Remove a triple, returning `true` if it was present
    fn retract(&mut self, triple: &Triple) -> bool;

    /// Check if a triple exists in the store
    fn contains(&self, triple: &Triple) -> bool;

    /// Find triples matching a pattern; `None` positions are wildcards
    fn find<'a>(
        &'a self,
        subject: Option<&Node>,
        predicate: Option<&Node>,
        object: Option<&Node>,
    ) -> Box<dyn Iterator<Item = &'a Triple> + 'a>;

    /// Get the number of triples
    fn len(&self) -> usize;

    /// Check if the store is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over all triples
    fn iter(&self) -> Box<dyn Iterator<Item = &Triple> + '_>;

    /// Clear all triples
    fn clear(&mut self);

    /// Clone all triples to a Vec
    fn to_vec(&self) -> Vec<Triple> {
        self.iter().cloned().collect()
    }
}

/// Extension trait for convenience methods on TripleStore
///
/// This provides ergonomic methods that can't be in the main trait
/// due to dyn-compatibility requirements.
pub trait TripleStoreExt: TripleStore {
    /// Add multiple triples from any iterator
    fn assert_iter<I: IntoIterator<Item = Triple>>(&mut self, triples: I) -> usize {
        let mut added = 0;
        for triple in triples {
            if self.assert(triple) {
                added += 1;
            }
        }
        added
    }

    /// Triples in the store's total order
    fn sorted(&self) -> Vec<Triple> {
        let mut triples = self.to_vec();
        triples.sort();
        triples
    }
}

// Blanket implementation for all TripleStore implementors
impl<T: TripleStore + ?Sized> TripleStoreExt for T {}

// ============================================================================
// Graph Events (Observer Pattern)
// ============================================================================

/// Answer from a cancellable pre-event handler
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EventOutcome {
    /// Let the operation run
    #[default]
    Proceed,
    /// Cancel the operation; later handlers are not consulted
    Abort,
}

/// A change that has been applied to a graph
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GraphEvent {
    Asserted(Triple),
    Retracted(Triple),
    Cleared { removed: usize },
    Merged { added: usize },
}

/// Hook for observing graph mutations
///
/// Handlers run synchronously inside the mutating call. For every change
/// the specific handler runs first, then `on_changed`. The two
/// `*_requested` handlers may veto destructive operations.
pub trait GraphListener: Send + Sync {
    /// Called after a triple was added
    fn on_triple_asserted(&self, _triple: &Triple) {}

    /// Called after a triple was removed
    fn on_triple_retracted(&self, _triple: &Triple) {}

    /// Called before a clear; `Abort` leaves the graph untouched
    fn on_clear_requested(&self, _len: usize) -> EventOutcome {
        EventOutcome::Proceed
    }

    /// Called after a clear
    fn on_cleared(&self, _removed: usize) {}

    /// Called before a merge; `Abort` leaves the graph untouched
    fn on_merge_requested(&self, _incoming: usize) -> EventOutcome {
        EventOutcome::Proceed
    }

    /// Called after a merge
    fn on_merged(&self, _added: usize) {}

    /// Called after every change, following the specific handler
    fn on_changed(&self, _event: &GraphEvent) {}
}

// ============================================================================
// Variable Handling
// ============================================================================

/// Extract variables from a node
pub fn node_variables(node: &Node) -> Vec<Variable> {
    match node {
        Node::Variable(v) => vec![v.clone()],
        Node::GraphLiteral(g) => g.triples().iter().flat_map(triple_variables).collect(),
        _ => vec![],
    }
}

/// Extract variables from a triple
pub fn triple_variables(triple: &Triple) -> Vec<Variable> {
    triple.nodes().into_iter().flat_map(node_variables).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_outcome_default() {
        assert_eq!(EventOutcome::default(), EventOutcome::Proceed);
    }

    #[test]
    fn test_triple_variables() {
        let t = Triple::new(
            Node::variable("s"),
            Node::uri("http://example.org/p"),
            Node::variable("o"),
        )
        .unwrap();
        let vars = triple_variables(&t);
        assert_eq!(vars, vec![Variable::new("s"), Variable::new("o")]);
    }

    #[test]
    fn test_listener_defaults_proceed() {
        struct Quiet;
        impl GraphListener for Quiet {}

        assert_eq!(Quiet.on_clear_requested(3), EventOutcome::Proceed);
        assert_eq!(Quiet.on_merge_requested(3), EventOutcome::Proceed);
    }
}
