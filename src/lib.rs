//! n3graph - an N3/RDF graph store
//!
//! An in-memory store for RDF/N3 graphs with indexed pattern lookup, graph
//! equality and sub-graph matching up to blank-node renaming, graph diffs,
//! and SPARQL-style INSERT/DELETE update commands over a dataset.
//!
//! # Architecture
//!
//! - [`core::TripleStore`] - Abstraction for triple storage backends
//! - [`core::GraphListener`] - Observer for graph change events
//! - [`store::Graph`] - A triple store plus node factory, namespaces and events
//! - [`store::Dataset`] - Default graph plus named graphs, as seen by updates
//! - [`sparql::AlgebraEvaluator`] - Turns a WHERE pattern into solution rows
//!
//! # Example
//!
//! ```rust,ignore
//! use n3graph::{Graph, Node, Triple};
//!
//! let mut a = Graph::new();
//! let b0 = a.create_blank_node();
//! a.assert(Triple::new(b0, Node::uri("http://example.org/p"), Node::literal("x"))?);
//!
//! let mut b = Graph::new();
//! let b1 = b.create_blank_node_with_id("other");
//! b.assert(Triple::new(b1, Node::uri("http://example.org/p"), Node::literal("x"))?);
//!
//! assert!(a.equals(&b));
//! ```

pub mod core;
pub mod config;
pub mod error;
pub mod term;
pub mod store;
pub mod sparql;

// Re-export core traits and types
pub use crate::core::{
    EventOutcome, GraphEvent, GraphListener, NamespaceMap, TripleStore, TripleStoreExt,
    node_variables, triple_variables, ns,
};

// Re-export term types
pub use term::{
    BlankNode, BlankNodeAllocator, BlankNodeIdGenerator, Bindings, CounterIdGenerator, Datatype,
    GraphLiteral, Literal, Node, Triple, Uri, Variable, substitute, substitute_triple,
};

// Re-export store types
pub use store::{
    merge_graphs, Dataset, Graph, GraphDiffReport, IndexedTripleStore, InMemoryDataset,
    NodeMapping, Quad,
};

// Re-export update types
pub use sparql::{
    AlgebraEvaluator, BgpEvaluator, CommandKind, GraphPattern, UpdateCommand, UpdateContext,
    UpdateResult,
};

// Re-export configuration types
pub use config::{Config, GeneralConfig, GraphConfig, LogLevel, UpdateConfig};

// Re-export error types
pub use error::{Error, ErrorCode, Result};
