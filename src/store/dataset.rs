//! RDF Dataset Implementation
//!
//! An RDF Dataset consists of a default graph and zero or more named graphs.
//! Update commands reach their graphs only through the `Dataset` trait;
//! `InMemoryDataset` is the implementation used by the CLI and tests.
//!
//! # Active graphs
//!
//! A USING clause narrows what a WHERE pattern sees without changing where
//! triples are written. `set_active_graph` pushes a set of graph names and
//! `reset_active_graph` pops it, so nested scopes restore correctly.

use std::fmt;

use indexmap::IndexMap;

use super::Graph;
use crate::config::GraphConfig;
use crate::error::{Error, Result};
use crate::term::{Triple, Uri};

/// A quad is a triple with an associated graph name
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Quad {
    pub triple: Triple,
    /// The graph this quad belongs to. None means the default graph.
    pub graph: Option<Uri>,
}

impl Quad {
    /// Create a new quad with an explicit graph
    pub fn new(triple: Triple, graph: Option<Uri>) -> Self {
        Quad { triple, graph }
    }

    /// Create a quad in the default graph
    pub fn in_default(triple: Triple) -> Self {
        Quad { triple, graph: None }
    }

    /// Check if this quad is in the default graph
    pub fn is_default_graph(&self) -> bool {
        self.graph.is_none()
    }
}

impl fmt::Debug for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = &self.triple;
        match &self.graph {
            Some(g) => write!(f, "{} {} {} {} .", t.subject(), t.predicate(), t.object(), g),
            None => write!(f, "{}", t),
        }
    }
}

/// Graph access for update commands
pub trait Dataset {
    /// Read access to a graph (`None` = default graph)
    fn graph(&self, name: Option<&Uri>) -> Option<&Graph>;

    /// Write access to a graph
    ///
    /// Whether a missing graph is created is up to the implementation.
    fn get_modifiable_graph(&mut self, name: Option<&Uri>) -> Result<&mut Graph>;

    /// Names of all named graphs
    fn graph_names(&self) -> Vec<Uri>;

    /// Graphs forming the default graph during WHERE evaluation;
    /// `None` means the plain default graph
    fn active_graphs(&self) -> Option<&[Uri]>;

    /// Restrict WHERE evaluation to the given graphs
    fn set_active_graph(&mut self, graphs: &[Uri]);

    /// Undo the most recent `set_active_graph`
    fn reset_active_graph(&mut self);

    fn has_graph(&self, name: &Uri) -> bool {
        self.graph(Some(name)).is_some()
    }
}

/// A dataset held entirely in memory
///
/// Named graphs are created on first write access.
#[derive(Clone, Default)]
pub struct InMemoryDataset {
    default_graph: Graph,
    named_graphs: IndexMap<Uri, Graph>,
    active: Vec<Vec<Uri>>,
    graph_config: Option<GraphConfig>,
}

impl InMemoryDataset {
    /// Create a new empty dataset
    pub fn new() -> Self {
        Self::default()
    }

    /// Dataset whose graphs are built from `config`
    pub fn with_config(config: &GraphConfig) -> Self {
        InMemoryDataset {
            default_graph: Graph::with_config(config),
            named_graphs: IndexMap::new(),
            active: Vec::new(),
            graph_config: Some(config.clone()),
        }
    }

    /// Create a dataset around an existing default graph
    pub fn with_default(default_graph: Graph) -> Self {
        InMemoryDataset {
            default_graph,
            ..Self::default()
        }
    }

    fn new_graph(&self) -> Graph {
        match &self.graph_config {
            Some(config) => Graph::with_config(config),
            None => Graph::new(),
        }
    }

    pub fn default_graph(&self) -> &Graph {
        &self.default_graph
    }

    pub fn default_graph_mut(&mut self) -> &mut Graph {
        &mut self.default_graph
    }

    /// Get a named graph
    pub fn named_graph(&self, name: &Uri) -> Option<&Graph> {
        self.named_graphs.get(name)
    }

    /// Get or create a named graph
    pub fn named_graph_mut(&mut self, name: &Uri) -> &mut Graph {
        if !self.named_graphs.contains_key(name) {
            let graph = self.new_graph();
            self.named_graphs.insert(name.clone(), graph);
        }
        &mut self.named_graphs[name]
    }

    /// Add or replace a named graph
    pub fn insert_graph(&mut self, name: Uri, graph: Graph) -> Option<Graph> {
        self.named_graphs.insert(name, graph)
    }

    /// Remove a named graph
    pub fn remove_graph(&mut self, name: &Uri) -> Option<Graph> {
        self.named_graphs.shift_remove(name)
    }

    pub fn named_graph_count(&self) -> usize {
        self.named_graphs.len()
    }

    /// Add a quad to its graph
    pub fn add_quad(&mut self, quad: Quad) -> bool {
        match &quad.graph {
            None => self.default_graph.assert(quad.triple),
            Some(name) => self.named_graph_mut(name).assert(quad.triple),
        }
    }

    /// Get total triple count across all graphs
    pub fn total_triple_count(&self) -> usize {
        self.default_graph.len() + self.named_graphs.values().map(Graph::len).sum::<usize>()
    }

    /// Iterate over all quads in the dataset
    pub fn iter_quads(&self) -> impl Iterator<Item = Quad> + '_ {
        let default_quads = self.default_graph.iter().map(|t| Quad::in_default(t.clone()));
        let named_quads = self.named_graphs.iter().flat_map(|(name, graph)| {
            graph.iter().map(move |t| Quad::new(t.clone(), Some(name.clone())))
        });
        default_quads.chain(named_quads)
    }
}

impl Dataset for InMemoryDataset {
    fn graph(&self, name: Option<&Uri>) -> Option<&Graph> {
        match name {
            None => Some(&self.default_graph),
            Some(name) => self.named_graphs.get(name),
        }
    }

    fn get_modifiable_graph(&mut self, name: Option<&Uri>) -> Result<&mut Graph> {
        Ok(match name {
            None => &mut self.default_graph,
            Some(name) => self.named_graph_mut(name),
        })
    }

    fn graph_names(&self) -> Vec<Uri> {
        self.named_graphs.keys().cloned().collect()
    }

    fn active_graphs(&self) -> Option<&[Uri]> {
        self.active.last().map(Vec::as_slice)
    }

    fn set_active_graph(&mut self, graphs: &[Uri]) {
        self.active.push(graphs.to_vec());
    }

    fn reset_active_graph(&mut self) {
        self.active.pop();
    }
}

impl fmt::Debug for InMemoryDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "InMemoryDataset {{ default_graph: {} triples, named_graphs: {} }}",
            self.default_graph.len(),
            self.named_graph_count()
        )
    }
}

/// Merge the graph named `source` into the graph named `target`
///
/// A graph cannot be merged into itself. A missing source graph merges
/// as empty. Returns `false` when a listener on the target vetoed.
pub fn merge_graphs(dataset: &mut dyn Dataset, target: Option<&Uri>, source: Option<&Uri>) -> Result<bool> {
    if target == source {
        return Err(Error::SelfMerge);
    }
    let incoming = dataset.graph(source).cloned().unwrap_or_default();
    Ok(dataset.get_modifiable_graph(target)?.merge(&incoming))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Node;

    fn g(name: &str) -> Uri {
        Uri::new(format!("http://example.org/graph/{}", name))
    }

    fn t(s: &str, o: &str) -> Triple {
        Triple::new(
            Node::uri(format!("http://example.org/{}", s)),
            Node::uri("http://example.org/p"),
            Node::literal(o),
        )
        .unwrap()
    }

    #[test]
    fn test_default_and_named_graphs() {
        let mut ds = InMemoryDataset::new();
        ds.get_modifiable_graph(None).unwrap().assert(t("a", "1"));
        ds.get_modifiable_graph(Some(&g("one"))).unwrap().assert(t("b", "2"));

        assert_eq!(ds.default_graph().len(), 1);
        assert!(ds.has_graph(&g("one")));
        assert!(!ds.has_graph(&g("two")));
        assert_eq!(ds.graph_names(), vec![g("one")]);
        assert_eq!(ds.total_triple_count(), 2);
    }

    #[test]
    fn test_iter_quads() {
        let mut ds = InMemoryDataset::new();
        ds.add_quad(Quad::in_default(t("a", "1")));
        ds.add_quad(Quad::new(t("b", "2"), Some(g("one"))));

        let quads: Vec<Quad> = ds.iter_quads().collect();
        assert_eq!(quads.len(), 2);
        assert!(quads[0].is_default_graph());
        assert_eq!(quads[1].graph, Some(g("one")));
    }

    #[test]
    fn test_active_graph_stack() {
        let mut ds = InMemoryDataset::new();
        assert!(ds.active_graphs().is_none());

        ds.set_active_graph(&[g("one")]);
        ds.set_active_graph(&[g("two"), g("three")]);
        assert_eq!(ds.active_graphs().unwrap().len(), 2);

        ds.reset_active_graph();
        assert_eq!(ds.active_graphs(), Some(&[g("one")][..]));
        ds.reset_active_graph();
        assert!(ds.active_graphs().is_none());
    }

    #[test]
    fn test_self_merge_rejected() {
        let mut ds = InMemoryDataset::new();
        let err = merge_graphs(&mut ds, Some(&g("one")), Some(&g("one"))).unwrap_err();
        assert!(matches!(err, Error::SelfMerge));
        assert!(merge_graphs(&mut ds, None, None).is_err());
    }

    #[test]
    fn test_merge_named_into_default() {
        let mut ds = InMemoryDataset::new();
        ds.named_graph_mut(&g("one")).assert(t("a", "1"));
        assert!(merge_graphs(&mut ds, None, Some(&g("one"))).unwrap());
        assert_eq!(ds.default_graph().len(), 1);
        assert_eq!(ds.named_graph(&g("one")).unwrap().len(), 1);
    }

    #[test]
    fn test_configured_graphs() {
        let config = GraphConfig { blank_node_prefix: "x".into(), default_prefixes: false };
        let mut ds = InMemoryDataset::with_config(&config);
        let node = ds.named_graph_mut(&g("one")).create_blank_node();
        assert_eq!(node, Node::blank("x0"));
        assert!(ds.default_graph().namespaces().is_empty());
    }
}
