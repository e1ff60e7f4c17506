//! RDF/N3 node representations
//!
//! This module defines the core data types for representing RDF and N3 nodes:
//! - URIs (named nodes)
//! - Blank nodes (graph-scoped anonymous nodes)
//! - Literals (with optional datatype or language tag)
//! - Variables (for patterns and templates)
//! - Graph literals (quoted graphs / N3 cited formulas)
//!
//! `Node` has a single total order, `Variable < Blank < Uri < Literal <
//! GraphLiteral`, used wherever triples are sorted.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use fnv::FnvHashMap;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};
use serde::{Serialize, Serializer};

use crate::error::{Error, Position, Result};

pub mod uri;
mod literal;
mod blank;
mod variable;

pub use uri::Uri;
pub use literal::{Literal, Datatype, TypedValue};
pub use blank::{BlankNode, BlankNodeAllocator, BlankNodeIdGenerator, CounterIdGenerator};
pub use variable::Variable;

/// Bytes percent-escaped when blank node ids and variable names are written
pub(crate) const LABEL_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'_').remove(b'-');

/// A node in RDF/N3
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Node {
    /// A variable (for patterns and templates)
    Variable(Variable),
    /// A blank node (anonymous)
    Blank(BlankNode),
    /// A URI reference (named node)
    Uri(Arc<Uri>),
    /// A literal value
    Literal(Arc<Literal>),
    /// A quoted graph
    GraphLiteral(GraphLiteral),
}

/// A quoted graph embedded as a node
///
/// Holds a sorted, duplicate-free snapshot of the embedded triples.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphLiteral {
    triples: Arc<[Triple]>,
}

impl GraphLiteral {
    /// Create a graph literal from any collection of triples
    pub fn new(triples: impl IntoIterator<Item = Triple>) -> Self {
        let mut triples: Vec<Triple> = triples.into_iter().collect();
        triples.sort();
        triples.dedup();
        GraphLiteral { triples: triples.into() }
    }

    /// Get the triples in this graph literal
    pub fn triples(&self) -> &[Triple] {
        &self.triples
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }
}

impl Node {
    /// Create a URI node
    pub fn uri(s: impl Into<String>) -> Self {
        Node::Uri(Arc::new(Uri::new(s)))
    }

    /// Create a plain literal
    pub fn literal(s: impl Into<String>) -> Self {
        Node::Literal(Arc::new(Literal::plain(s)))
    }

    /// Create a typed literal
    pub fn typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Node::Literal(Arc::new(Literal::typed(value, datatype)))
    }

    /// Create a language-tagged literal
    pub fn lang_literal(value: impl Into<String>, lang: impl Into<String>) -> Self {
        Node::Literal(Arc::new(Literal::with_language(value, lang)))
    }

    /// Create a blank node with the given id
    ///
    /// Prefer `Graph::create_blank_node` so the id is reserved in the graph.
    pub fn blank(id: impl AsRef<str>) -> Self {
        Node::Blank(BlankNode::new(id))
    }

    /// Create a variable
    pub fn variable(name: impl Into<String>) -> Self {
        Node::Variable(Variable::new(name))
    }

    /// Create a graph literal from triples
    pub fn graph_literal(triples: impl IntoIterator<Item = Triple>) -> Self {
        Node::GraphLiteral(GraphLiteral::new(triples))
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Node::Variable(_))
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Node::Blank(_))
    }

    pub fn is_uri(&self) -> bool {
        matches!(self, Node::Uri(_))
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Node::Literal(_))
    }

    /// Get the URI if this is a URI node
    pub fn as_uri(&self) -> Option<&Uri> {
        match self {
            Node::Uri(u) => Some(u),
            _ => None,
        }
    }

    /// Get the literal if this is a literal node
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Node::Literal(l) => Some(l),
            _ => None,
        }
    }

    /// Get the blank node if this is one
    pub fn as_blank(&self) -> Option<&BlankNode> {
        match self {
            Node::Blank(b) => Some(b),
            _ => None,
        }
    }

    /// Get the variable if this is one
    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            Node::Variable(v) => Some(v),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Node::Variable(_) => 0,
            Node::Blank(_) => 1,
            Node::Uri(_) => 2,
            Node::Literal(_) => 3,
            Node::GraphLiteral(_) => 4,
        }
    }
}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Node::Variable(a), Node::Variable(b)) => a.cmp(b),
            (Node::Blank(a), Node::Blank(b)) => a.cmp(b),
            (Node::Uri(a), Node::Uri(b)) => a.cmp(b),
            (Node::Literal(a), Node::Literal(b)) => a.cmp(b),
            (Node::GraphLiteral(a), Node::GraphLiteral(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Uri(u) => write!(f, "{}", u),
            Node::Literal(l) => write!(f, "{}", l),
            Node::Blank(b) => write!(f, "{}", b),
            Node::Variable(v) => write!(f, "{}", v),
            Node::GraphLiteral(g) => {
                if g.is_empty() {
                    return write!(f, "{{ }}");
                }
                write!(f, "{{ ")?;
                for (i, triple) in g.triples.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", triple)?;
                }
                write!(f, " }}")
            }
        }
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<Uri> for Node {
    fn from(u: Uri) -> Self {
        Node::Uri(Arc::new(u))
    }
}

impl From<Literal> for Node {
    fn from(l: Literal) -> Self {
        Node::Literal(Arc::new(l))
    }
}

impl From<BlankNode> for Node {
    fn from(b: BlankNode) -> Self {
        Node::Blank(b)
    }
}

impl From<Variable> for Node {
    fn from(v: Variable) -> Self {
        Node::Variable(v)
    }
}

/// A triple (statement) in RDF
///
/// Immutable once built. The subject is a URI, blank node or variable; the
/// predicate a URI or variable; the object any node.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Triple {
    subject: Node,
    predicate: Node,
    object: Node,
}

impl Triple {
    /// Build a triple, checking each node is allowed in its position
    pub fn new(subject: Node, predicate: Node, object: Node) -> Result<Self> {
        if !matches!(subject, Node::Uri(_) | Node::Blank(_) | Node::Variable(_)) {
            return Err(Error::InvalidTriple {
                position: Position::Subject,
                node: subject.to_string(),
            });
        }
        if !matches!(predicate, Node::Uri(_) | Node::Variable(_)) {
            return Err(Error::InvalidTriple {
                position: Position::Predicate,
                node: predicate.to_string(),
            });
        }
        Ok(Triple { subject, predicate, object })
    }

    /// Build a triple from parts that already satisfy the position rules
    pub(crate) fn new_unchecked(subject: Node, predicate: Node, object: Node) -> Self {
        Triple { subject, predicate, object }
    }

    pub fn subject(&self) -> &Node {
        &self.subject
    }

    pub fn predicate(&self) -> &Node {
        &self.predicate
    }

    pub fn object(&self) -> &Node {
        &self.object
    }

    /// The three nodes in subject, predicate, object order
    pub fn nodes(&self) -> [&Node; 3] {
        [&self.subject, &self.predicate, &self.object]
    }

    /// Check if this triple contains any variables
    pub fn has_variables(&self) -> bool {
        self.nodes().iter().any(|n| n.is_variable())
    }

    /// A ground triple has no blank node in subject or object position
    ///
    /// Blank nodes inside a graph literal are scoped to that formula. They
    /// do not make the enclosing triple non-ground, and the formula is
    /// compared as a whole.
    pub fn is_ground(&self) -> bool {
        !self.subject.is_blank() && !self.object.is_blank()
    }

    /// Blank nodes in subject/object position
    pub fn blank_nodes(&self) -> impl Iterator<Item = &BlankNode> {
        [&self.subject, &self.object].into_iter().filter_map(Node::as_blank)
    }

    /// Check whether a node occurs in any position
    pub fn involves(&self, node: &Node) -> bool {
        self.nodes().iter().any(|n| *n == node)
    }

    /// Replace nodes, keeping the kind of each position
    ///
    /// `f` must map blank nodes to blank nodes; other nodes are passed
    /// through unchanged by all callers in this crate. Graph literals are
    /// left as they are, since their blank nodes belong to the formula.
    pub(crate) fn map_blank_nodes(&self, mut f: impl FnMut(&BlankNode) -> BlankNode) -> Triple {
        let mut map = |n: &Node| match n {
            Node::Blank(b) => Node::Blank(f(b)),
            other => other.clone(),
        };
        Triple::new_unchecked(map(&self.subject), self.predicate.clone(), map(&self.object))
    }
}

impl fmt::Debug for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}

impl Serialize for Triple {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Bindings from variables to nodes (one solution row)
pub type Bindings = FnvHashMap<Variable, Node>;

/// Apply bindings to a node, substituting variables
pub fn substitute(node: &Node, bindings: &Bindings) -> Node {
    match node {
        Node::Variable(v) => bindings.get(v).cloned().unwrap_or_else(|| node.clone()),
        _ => node.clone(),
    }
}

/// Apply bindings to a triple
///
/// Fails when a binding puts a node in a position it is not allowed in.
pub fn substitute_triple(triple: &Triple, bindings: &Bindings) -> Result<Triple> {
    Triple::new(
        substitute(&triple.subject, bindings),
        substitute(&triple.predicate, bindings),
        substitute(&triple.object, bindings),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: Node, p: Node, o: Node) -> Triple {
        Triple::new(s, p, o).unwrap()
    }

    #[test]
    fn test_formula_blank_nodes_stay_inside_formula() {
        let p = Node::uri("http://example.org/p");
        let quoted = Node::graph_literal(vec![t(Node::blank("q"), p.clone(), Node::literal("o"))]);
        let triple = t(Node::uri("http://example.org/s"), p.clone(), quoted);
        assert!(triple.is_ground());
        assert_eq!(triple.blank_nodes().count(), 0);
        assert_eq!(triple.map_blank_nodes(|_| BlankNode::new("other")), triple);

        let outer = t(Node::blank("q"), p, Node::literal("o"));
        assert_eq!(outer.map_blank_nodes(|_| BlankNode::new("other")).subject(), &Node::blank("other"));
    }

    #[test]
    fn test_node_creation() {
        assert!(Node::uri("http://example.org/foo").is_uri());
        assert!(Node::literal("hello").is_literal());
        assert!(Node::blank("b1").is_blank());
        assert!(Node::variable("x").is_variable());
    }

    #[test]
    fn test_total_order() {
        let mut nodes = vec![
            Node::graph_literal(Vec::new()),
            Node::literal("a"),
            Node::uri("http://example.org/"),
            Node::blank("b"),
            Node::variable("v"),
        ];
        nodes.sort();
        assert!(nodes[0].is_variable());
        assert!(nodes[1].is_blank());
        assert!(nodes[2].is_uri());
        assert!(nodes[3].is_literal());
        assert!(matches!(nodes[4], Node::GraphLiteral(_)));
    }

    #[test]
    fn test_literal_equality() {
        assert_eq!(Node::lang_literal("a", "EN"), Node::lang_literal("a", "en"));
        assert_ne!(Node::literal("a"), Node::lang_literal("a", "en"));
        assert_ne!(
            Node::typed_literal("1", "http://example.org/a"),
            Node::typed_literal("1", "http://example.org/b")
        );
    }

    #[test]
    fn test_triple_positions() {
        let p = Node::uri("http://example.org/p");
        assert!(Triple::new(Node::literal("x"), p.clone(), Node::literal("y")).is_err());
        assert!(Triple::new(Node::uri("http://example.org/s"), Node::blank("b"), Node::literal("y")).is_err());
        assert!(Triple::new(Node::blank("b"), p.clone(), Node::blank("c")).is_ok());
        assert!(Triple::new(Node::variable("s"), Node::variable("p"), Node::variable("o")).is_ok());
    }

    #[test]
    fn test_ground_check() {
        let p = Node::uri("http://example.org/p");
        assert!(t(Node::uri("http://example.org/s"), p.clone(), Node::literal("o")).is_ground());
        assert!(!t(Node::blank("b"), p.clone(), Node::literal("o")).is_ground());
        assert!(t(Node::variable("x"), p, Node::literal("o")).has_variables());
    }

    #[test]
    fn test_graph_literal_is_sorted_set() {
        let p = Node::uri("http://example.org/p");
        let a = t(Node::uri("http://example.org/a"), p.clone(), Node::literal("1"));
        let b = t(Node::uri("http://example.org/b"), p, Node::literal("2"));
        let g1 = Node::graph_literal(vec![b.clone(), a.clone(), b.clone()]);
        let g2 = Node::graph_literal(vec![a, b]);
        assert_eq!(g1, g2);
        assert_eq!(
            format!("{}", g1),
            "{ <http://example.org/a> <http://example.org/p> \"1\" . <http://example.org/b> <http://example.org/p> \"2\" . }"
        );
    }

    #[test]
    fn test_substitute_triple() {
        let mut bindings = Bindings::default();
        bindings.insert(Variable::new("s"), Node::uri("http://example.org/s"));
        bindings.insert(Variable::new("o"), Node::literal("o"));

        let pattern = t(Node::variable("s"), Node::uri("http://example.org/p"), Node::variable("o"));
        let ground = substitute_triple(&pattern, &bindings).unwrap();
        assert!(!ground.has_variables());

        // A literal bound into subject position is a type mismatch
        let swapped = t(Node::variable("o"), Node::uri("http://example.org/p"), Node::variable("s"));
        assert!(substitute_triple(&swapped, &bindings).is_err());
    }
}
