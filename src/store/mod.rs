//! In-memory triple storage
//!
//! `IndexedTripleStore` holds a set of triples with six partial-key
//! indexes. `Graph` wraps it with blank node scoping, prefixes and events.

use std::fmt;

use fnv::FnvHashMap;
use indexmap::IndexSet;
use tracing::trace;

use crate::core::TripleStore;
use crate::term::{Node, Triple};

pub mod codec;
pub mod dataset;
pub mod diff;
pub mod graph;
pub mod matcher;

pub use dataset::{merge_graphs, Dataset, InMemoryDataset, Quad};
pub use diff::GraphDiffReport;
pub use graph::Graph;
pub use matcher::NodeMapping;

/// Which structure answers a `find` call
///
/// The choice depends only on which positions are bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexKind {
    /// All three bound: containment check
    Exact,
    SubjectPredicate,
    SubjectObject,
    PredicateObject,
    Subject,
    Predicate,
    Object,
    /// Nothing bound: full enumeration
    Scan,
}

impl IndexKind {
    /// Pick the index for a combination of bound positions
    pub fn select(subject: bool, predicate: bool, object: bool) -> Self {
        match (subject, predicate, object) {
            (true, true, true) => IndexKind::Exact,
            (true, true, false) => IndexKind::SubjectPredicate,
            (true, false, true) => IndexKind::SubjectObject,
            (false, true, true) => IndexKind::PredicateObject,
            (true, false, false) => IndexKind::Subject,
            (false, true, false) => IndexKind::Predicate,
            (false, false, true) => IndexKind::Object,
            (false, false, false) => IndexKind::Scan,
        }
    }
}

type Bucket = IndexSet<Triple>;

/// A set of triples with subject/predicate/object indexes
#[derive(Clone, Default)]
pub struct IndexedTripleStore {
    /// The triples in this store
    triples: IndexSet<Triple>,
    by_subject: FnvHashMap<Node, Bucket>,
    by_predicate: FnvHashMap<Node, Bucket>,
    by_object: FnvHashMap<Node, Bucket>,
    by_subject_predicate: FnvHashMap<(Node, Node), Bucket>,
    by_subject_object: FnvHashMap<(Node, Node), Bucket>,
    by_predicate_object: FnvHashMap<(Node, Node), Bucket>,
}

fn index_insert<K: std::hash::Hash + Eq>(index: &mut FnvHashMap<K, Bucket>, key: K, triple: &Triple) {
    index.entry(key).or_default().insert(triple.clone());
}

fn index_remove<K: std::hash::Hash + Eq>(index: &mut FnvHashMap<K, Bucket>, key: K, triple: &Triple) {
    if let Some(bucket) = index.get_mut(&key) {
        bucket.swap_remove(triple);
        if bucket.is_empty() {
            index.remove(&key);
        }
    }
}

fn bucket_iter<'a, K: std::hash::Hash + Eq>(
    index: &'a FnvHashMap<K, Bucket>,
    key: &K,
) -> Box<dyn Iterator<Item = &'a Triple> + 'a> {
    match index.get(key) {
        Some(bucket) => Box::new(bucket.iter()),
        None => Box::new(std::iter::empty()),
    }
}

impl IndexedTripleStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct keys in each single-position index
    pub fn index_sizes(&self) -> (usize, usize, usize) {
        (self.by_subject.len(), self.by_predicate.len(), self.by_object.len())
    }

    fn index(&mut self, triple: &Triple) {
        let (s, p, o) = (triple.subject(), triple.predicate(), triple.object());
        index_insert(&mut self.by_subject, s.clone(), triple);
        index_insert(&mut self.by_predicate, p.clone(), triple);
        index_insert(&mut self.by_object, o.clone(), triple);
        index_insert(&mut self.by_subject_predicate, (s.clone(), p.clone()), triple);
        index_insert(&mut self.by_subject_object, (s.clone(), o.clone()), triple);
        index_insert(&mut self.by_predicate_object, (p.clone(), o.clone()), triple);
    }

    fn unindex(&mut self, triple: &Triple) {
        let (s, p, o) = (triple.subject(), triple.predicate(), triple.object());
        index_remove(&mut self.by_subject, s.clone(), triple);
        index_remove(&mut self.by_predicate, p.clone(), triple);
        index_remove(&mut self.by_object, o.clone(), triple);
        index_remove(&mut self.by_subject_predicate, (s.clone(), p.clone()), triple);
        index_remove(&mut self.by_subject_object, (s.clone(), o.clone()), triple);
        index_remove(&mut self.by_predicate_object, (p.clone(), o.clone()), triple);
    }
}

impl TripleStore for IndexedTripleStore {
    fn assert(&mut self, triple: Triple) -> bool {
        if self.triples.contains(&triple) {
            return false;
        }
        self.index(&triple);
        self.triples.insert(triple);
        true
    }

    fn retract(&mut self, triple: &Triple) -> bool {
        if !self.triples.swap_remove(triple) {
            return false;
        }
        self.unindex(triple);
        true
    }

    fn contains(&self, triple: &Triple) -> bool {
        self.triples.contains(triple)
    }

    fn find<'a>(
        &'a self,
        subject: Option<&Node>,
        predicate: Option<&Node>,
        object: Option<&Node>,
    ) -> Box<dyn Iterator<Item = &'a Triple> + 'a> {
        let kind = IndexKind::select(subject.is_some(), predicate.is_some(), object.is_some());
        trace!(?kind, "find");
        match (subject, predicate, object) {
            (Some(s), Some(p), Some(o)) => {
                let key = Triple::new_unchecked(s.clone(), p.clone(), o.clone());
                Box::new(self.triples.get(&key).into_iter())
            }
            (Some(s), Some(p), None) => {
                bucket_iter(&self.by_subject_predicate, &(s.clone(), p.clone()))
            }
            (Some(s), None, Some(o)) => bucket_iter(&self.by_subject_object, &(s.clone(), o.clone())),
            (None, Some(p), Some(o)) => {
                bucket_iter(&self.by_predicate_object, &(p.clone(), o.clone()))
            }
            (Some(s), None, None) => bucket_iter(&self.by_subject, s),
            (None, Some(p), None) => bucket_iter(&self.by_predicate, p),
            (None, None, Some(o)) => bucket_iter(&self.by_object, o),
            (None, None, None) => Box::new(self.triples.iter()),
        }
    }

    fn len(&self) -> usize {
        self.triples.len()
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &Triple> + '_> {
        Box::new(self.triples.iter())
    }

    fn clear(&mut self) {
        self.triples.clear();
        self.by_subject.clear();
        self.by_predicate.clear();
        self.by_object.clear();
        self.by_subject_predicate.clear();
        self.by_subject_object.clear();
        self.by_predicate_object.clear();
    }
}

impl fmt::Debug for IndexedTripleStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "IndexedTripleStore {{")?;
        for triple in &self.triples {
            writeln!(f, "  {:?}", triple)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(s: &str) -> Node {
        Node::uri(format!("http://example.org/{}", s))
    }

    fn t(s: &str, p: &str, o: Node) -> Triple {
        Triple::new(uri(s), uri(p), o).unwrap()
    }

    fn sample() -> IndexedTripleStore {
        let mut store = IndexedTripleStore::new();
        store.assert(t("alice", "knows", uri("bob")));
        store.assert(t("alice", "knows", uri("carol")));
        store.assert(t("alice", "name", Node::literal("Alice")));
        store.assert(t("bob", "knows", uri("carol")));
        store.assert(t("bob", "name", Node::literal("Bob")));
        store
    }

    fn count(store: &IndexedTripleStore, s: Option<&Node>, p: Option<&Node>, o: Option<&Node>) -> usize {
        store.find(s, p, o).count()
    }

    #[test]
    fn test_add_and_contains() {
        let mut store = IndexedTripleStore::new();
        let triple = t("s", "p", Node::literal("o"));

        assert!(store.assert(triple.clone()));
        assert!(store.contains(&triple));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_no_duplicates() {
        let mut store = IndexedTripleStore::new();
        let triple = t("s", "p", Node::literal("o"));

        assert!(store.assert(triple.clone()));
        assert!(!store.assert(triple.clone()));
        assert_eq!(store.len(), 1);
        assert_eq!(count(&store, Some(&uri("s")), None, None), 1);
    }

    #[test]
    fn test_retract_is_idempotent() {
        let mut store = sample();
        let triple = t("alice", "knows", uri("bob"));

        assert!(store.retract(&triple));
        assert!(!store.retract(&triple));
        assert!(!store.contains(&triple));
        assert_eq!(store.len(), 4);
        assert_eq!(count(&store, Some(&uri("alice")), Some(&uri("knows")), None), 1);
        assert_eq!(count(&store, None, None, Some(&uri("bob"))), 0);
    }

    #[test]
    fn test_index_selection() {
        assert_eq!(IndexKind::select(true, true, true), IndexKind::Exact);
        assert_eq!(IndexKind::select(true, true, false), IndexKind::SubjectPredicate);
        assert_eq!(IndexKind::select(true, false, true), IndexKind::SubjectObject);
        assert_eq!(IndexKind::select(false, true, true), IndexKind::PredicateObject);
        assert_eq!(IndexKind::select(true, false, false), IndexKind::Subject);
        assert_eq!(IndexKind::select(false, true, false), IndexKind::Predicate);
        assert_eq!(IndexKind::select(false, false, true), IndexKind::Object);
        assert_eq!(IndexKind::select(false, false, false), IndexKind::Scan);
    }

    #[test]
    fn test_find_every_combination() {
        let store = sample();
        let (alice, knows, carol) = (uri("alice"), uri("knows"), uri("carol"));

        assert_eq!(count(&store, Some(&alice), Some(&knows), Some(&carol)), 1);
        assert_eq!(count(&store, Some(&alice), Some(&knows), None), 2);
        assert_eq!(count(&store, Some(&alice), None, Some(&carol)), 1);
        assert_eq!(count(&store, None, Some(&knows), Some(&carol)), 2);
        assert_eq!(count(&store, Some(&alice), None, None), 3);
        assert_eq!(count(&store, None, Some(&knows), None), 3);
        assert_eq!(count(&store, None, None, Some(&carol)), 2);
        assert_eq!(count(&store, None, None, None), 5);
    }

    #[test]
    fn test_find_misses() {
        let store = sample();
        let nobody = uri("nobody");
        assert_eq!(count(&store, Some(&nobody), None, None), 0);
        assert_eq!(count(&store, Some(&uri("alice")), Some(&uri("knows")), Some(&nobody)), 0);
    }

    #[test]
    fn test_clear() {
        let mut store = sample();
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.index_sizes(), (0, 0, 0));
        assert_eq!(count(&store, None, Some(&uri("knows")), None), 0);
    }
}
