//! RDF graphs
//!
//! A `Graph` owns a triple store, a prefix map and the blank node scope.
//! Every mutation notifies the registered listeners in-line.

use std::fmt;
use std::sync::Arc;

use fnv::FnvHashMap;
use tracing::debug;

use super::diff::GraphDiffReport;
use super::matcher::{equality_mapping, subgraph_mapping, NodeMapping};
use super::IndexedTripleStore;
use crate::config::GraphConfig;
use crate::core::{EventOutcome, GraphEvent, GraphListener, NamespaceMap, TripleStore};
use crate::error::Result;
use crate::term::{
    BlankNode, BlankNodeAllocator, BlankNodeIdGenerator, CounterIdGenerator, Node, Triple,
};

/// A set of triples with its own blank node scope
pub struct Graph {
    store: IndexedTripleStore,
    namespaces: NamespaceMap,
    blanks: BlankNodeAllocator,
    listeners: Vec<Arc<dyn GraphListener>>,
}

impl Graph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::with_id_generator(Box::new(CounterIdGenerator::default()))
    }

    /// Create a graph whose blank node ids come from `generator`
    pub fn with_id_generator(generator: Box<dyn BlankNodeIdGenerator>) -> Self {
        Graph {
            store: IndexedTripleStore::new(),
            namespaces: NamespaceMap::new(),
            blanks: BlankNodeAllocator::with_generator(generator),
            listeners: Vec::new(),
        }
    }

    /// Create a graph from configuration
    pub fn with_config(config: &GraphConfig) -> Self {
        let mut graph =
            Self::with_id_generator(Box::new(CounterIdGenerator::new(config.blank_node_prefix.as_str())));
        if config.default_prefixes {
            graph.namespaces = NamespaceMap::with_defaults();
        }
        graph
    }

    pub fn namespaces(&self) -> &NamespaceMap {
        &self.namespaces
    }

    pub fn namespaces_mut(&mut self) -> &mut NamespaceMap {
        &mut self.namespaces
    }

    // ------------------------------------------------------------------
    // Node factory
    // ------------------------------------------------------------------

    /// Mint a blank node that is fresh in this graph
    pub fn create_blank_node(&mut self) -> Node {
        Node::Blank(self.blanks.mint())
    }

    /// Blank node with a chosen id; the id is reserved in this graph
    pub fn create_blank_node_with_id(&mut self, id: &str) -> Node {
        Node::Blank(self.blanks.register(id))
    }

    pub fn create_literal_node(&self, value: impl Into<String>) -> Node {
        Node::literal(value)
    }

    pub fn create_language_literal_node(&self, value: impl Into<String>, lang: impl Into<String>) -> Node {
        Node::lang_literal(value, lang)
    }

    pub fn create_typed_literal_node(&self, value: impl Into<String>, datatype: impl Into<String>) -> Node {
        Node::typed_literal(value, datatype)
    }

    pub fn create_uri_node(&self, uri: impl Into<String>) -> Node {
        Node::uri(uri)
    }

    /// Resolve a prefixed name against this graph's prefixes
    pub fn create_qname_node(&self, prefixed: &str) -> Result<Node> {
        Ok(Node::from(self.namespaces.resolve(prefixed)?))
    }

    pub fn create_variable_node(&self, name: impl Into<String>) -> Node {
        Node::variable(name)
    }

    /// Quote the current contents of another graph
    pub fn create_graph_literal_node(&self, graph: &Graph) -> Node {
        Node::graph_literal(graph.iter().cloned())
    }

    // ------------------------------------------------------------------
    // Listeners
    // ------------------------------------------------------------------

    pub fn add_listener(&mut self, listener: Arc<dyn GraphListener>) {
        self.listeners.push(listener);
    }

    /// Remove a listener previously added (compared by pointer)
    pub fn remove_listener(&mut self, listener: &Arc<dyn GraphListener>) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| !Arc::ptr_eq(l, listener));
        self.listeners.len() != before
    }

    fn request(&self, ask: impl Fn(&dyn GraphListener) -> EventOutcome) -> EventOutcome {
        for listener in &self.listeners {
            if ask(listener.as_ref()) == EventOutcome::Abort {
                return EventOutcome::Abort;
            }
        }
        EventOutcome::Proceed
    }

    fn notify(&self, event: GraphEvent) {
        for listener in &self.listeners {
            match &event {
                GraphEvent::Asserted(t) => listener.on_triple_asserted(t),
                GraphEvent::Retracted(t) => listener.on_triple_retracted(t),
                GraphEvent::Cleared { removed } => listener.on_cleared(*removed),
                GraphEvent::Merged { added } => listener.on_merged(*added),
            }
            listener.on_changed(&event);
        }
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Add a triple; returns `false` if it was already present
    pub fn assert(&mut self, triple: Triple) -> bool {
        for blank in triple.blank_nodes() {
            if !self.blanks.is_issued(blank.id()) {
                self.blanks.register(blank.id());
            }
        }
        if !self.store.assert(triple.clone()) {
            return false;
        }
        if !self.listeners.is_empty() {
            self.notify(GraphEvent::Asserted(triple));
        }
        true
    }

    /// Add triples; returns how many were new
    pub fn assert_all(&mut self, triples: impl IntoIterator<Item = Triple>) -> usize {
        triples.into_iter().map(|t| self.assert(t)).filter(|added| *added).count()
    }

    /// Remove a triple; returns `false` if it was absent
    pub fn retract(&mut self, triple: &Triple) -> bool {
        if !self.store.retract(triple) {
            return false;
        }
        if !self.listeners.is_empty() {
            self.notify(GraphEvent::Retracted(triple.clone()));
        }
        true
    }

    /// Remove triples; returns how many were present
    pub fn retract_all<'a>(&mut self, triples: impl IntoIterator<Item = &'a Triple>) -> usize {
        triples.into_iter().map(|t| self.retract(t)).filter(|removed| *removed).count()
    }

    /// Remove every triple
    ///
    /// Returns `false` when a listener vetoed the clear.
    pub fn clear(&mut self) -> bool {
        let len = self.store.len();
        if self.request(|l| l.on_clear_requested(len)) == EventOutcome::Abort {
            debug!(triples = len, "clear aborted by listener");
            return false;
        }
        self.store.clear();
        self.notify(GraphEvent::Cleared { removed: len });
        true
    }

    /// Copy another graph's triples into this one
    ///
    /// Incoming blank nodes are renamed to ids that are fresh in this
    /// graph; prefixes not defined here are imported. Only the merged
    /// and changed events fire. Returns `false` when a listener vetoed.
    pub fn merge(&mut self, other: &Graph) -> bool {
        if self.request(|l| l.on_merge_requested(other.len())) == EventOutcome::Abort {
            debug!(triples = other.len(), "merge aborted by listener");
            return false;
        }

        let mut renamed: FnvHashMap<BlankNode, BlankNode> = FnvHashMap::default();
        let mut added = 0;
        for triple in other.iter() {
            let mapped = triple.map_blank_nodes(|b| {
                renamed.entry(b.clone()).or_insert_with(|| self.blanks.mint()).clone()
            });
            if self.store.assert(mapped) {
                added += 1;
            }
        }
        self.namespaces.import(&other.namespaces);

        self.notify(GraphEvent::Merged { added });
        true
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn contains(&self, triple: &Triple) -> bool {
        self.store.contains(triple)
    }

    /// Triples matching a pattern; `None` positions are wildcards
    pub fn find<'a>(
        &'a self,
        subject: Option<&Node>,
        predicate: Option<&Node>,
        object: Option<&Node>,
    ) -> impl Iterator<Item = &'a Triple> + 'a {
        self.store.find(subject, predicate, object)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.store.iter()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// The underlying store
    pub fn store(&self) -> &IndexedTripleStore {
        &self.store
    }

    /// Triples in sorted order
    pub fn sorted_triples(&self) -> Vec<Triple> {
        let mut triples: Vec<Triple> = self.iter().cloned().collect();
        triples.sort();
        triples
    }

    // ------------------------------------------------------------------
    // Comparison
    // ------------------------------------------------------------------

    /// Equal up to blank node renaming
    pub fn equals(&self, other: &Graph) -> bool {
        self.equals_with_mapping(other).is_some()
    }

    /// Equality check returning the blank node mapping from `self` to `other`
    pub fn equals_with_mapping(&self, other: &Graph) -> Option<NodeMapping> {
        equality_mapping(self.iter(), other.iter())
    }

    /// Whether this graph maps into `other`
    pub fn is_sub_graph_of(&self, other: &Graph) -> bool {
        subgraph_mapping(self.iter(), other.iter()).is_some()
    }

    /// Whether `other` maps into this graph
    pub fn has_sub_graph(&self, other: &Graph) -> bool {
        other.is_sub_graph_of(self)
    }

    /// Changes that turn this graph into `other`
    pub fn difference(&self, other: &Graph) -> GraphDiffReport {
        GraphDiffReport::compute(self.iter(), other.iter())
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

/// Clones carry triples, prefixes and the blank node scope but no listeners
impl Clone for Graph {
    fn clone(&self) -> Self {
        Graph {
            store: self.store.clone(),
            namespaces: self.namespaces.clone(),
            blanks: self.blanks.clone(),
            listeners: Vec::new(),
        }
    }
}

impl PartialEq for Graph {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Graph {{")?;
        for triple in self.sorted_triples() {
            writeln!(f, "  {:?}", triple)?;
        }
        write!(f, "}}")
    }
}

impl FromIterator<Triple> for Graph {
    fn from_iter<I: IntoIterator<Item = Triple>>(iter: I) -> Self {
        let mut graph = Graph::new();
        graph.assert_all(iter);
        graph
    }
}
