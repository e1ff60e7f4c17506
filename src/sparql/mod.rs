//! Graph patterns and their evaluation
//!
//! A `GraphPattern` is an ordered list of triple patterns plus nested child
//! patterns, each child scoped to a graph through a specifier node. The
//! same structure serves as WHERE clause and as insert/delete template.
//!
//! Evaluation goes through the `AlgebraEvaluator` trait so a full query
//! engine can be plugged in; `BgpEvaluator` covers conjunctive triple
//! patterns and GRAPH scoping, which is all update commands need.

use std::fmt;

use indexmap::IndexSet;
use tracing::trace;

use crate::core::triple_variables;
use crate::error::{Error, Result};
use crate::store::{Dataset, Graph};
use crate::term::{substitute, Bindings, Node, Triple, Uri, Variable};

pub mod update;

pub use update::{CommandKind, UpdateCommand, UpdateContext, UpdateResult};

/// A triple whose positions may hold variables
pub type TriplePattern = Triple;

/// Number of positions in a pattern that are not variables
pub fn bound_count(pattern: &TriplePattern) -> usize {
    pattern.nodes().iter().filter(|n| !n.is_variable()).count()
}

/// Triple patterns plus graph-scoped child patterns
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GraphPattern {
    triple_patterns: Vec<TriplePattern>,
    children: Vec<GraphPattern>,
    graph_specifier: Option<Node>,
}

impl GraphPattern {
    /// Create an empty pattern
    pub fn new() -> Self {
        Self::default()
    }

    /// Pattern over the enclosing graph
    pub fn with_triples(triples: impl IntoIterator<Item = TriplePattern>) -> Self {
        GraphPattern {
            triple_patterns: triples.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Pattern scoped to the graph named by `specifier` (`GRAPH spec { .. }`)
    pub fn in_graph(specifier: Node, triples: impl IntoIterator<Item = TriplePattern>) -> Self {
        GraphPattern {
            triple_patterns: triples.into_iter().collect(),
            children: Vec::new(),
            graph_specifier: Some(specifier),
        }
    }

    pub fn push_triple(&mut self, pattern: TriplePattern) {
        self.triple_patterns.push(pattern);
    }

    pub fn push_child(&mut self, child: GraphPattern) {
        self.children.push(child);
    }

    /// Builder form of `push_child`
    pub fn with_child(mut self, child: GraphPattern) -> Self {
        self.children.push(child);
        self
    }

    pub fn triple_patterns(&self) -> &[TriplePattern] {
        &self.triple_patterns
    }

    pub fn children(&self) -> &[GraphPattern] {
        &self.children
    }

    pub fn graph_specifier(&self) -> Option<&Node> {
        self.graph_specifier.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.triple_patterns.is_empty() && self.children.is_empty()
    }

    /// All variables used, including graph specifiers, in first-use order
    pub fn variables(&self) -> Vec<Variable> {
        let mut vars = IndexSet::new();
        self.collect_variables(&mut vars);
        vars.into_iter().collect()
    }

    fn collect_variables(&self, vars: &mut IndexSet<Variable>) {
        if let Some(Node::Variable(v)) = &self.graph_specifier {
            vars.insert(v.clone());
        }
        for pattern in &self.triple_patterns {
            vars.extend(triple_variables(pattern));
        }
        for child in &self.children {
            child.collect_variables(vars);
        }
    }

    /// Whether any pattern at any depth contains a blank node
    pub fn has_blank_nodes(&self) -> bool {
        self.triple_patterns.iter().any(|t| !t.is_ground())
            || self.children.iter().any(GraphPattern::has_blank_nodes)
    }

    /// Order triple patterns most selective first, recursively
    ///
    /// Patterns with more bound positions come first; ties keep their
    /// original order.
    pub fn reorder_by_selectivity(&mut self) {
        self.triple_patterns.sort_by_key(|p| std::cmp::Reverse(bound_count(p)));
        for child in &mut self.children {
            child.reorder_by_selectivity();
        }
    }
}

impl fmt::Display for GraphPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "{{ }}");
        }
        write!(f, "{{")?;
        for pattern in &self.triple_patterns {
            write!(f, " {}", pattern)?;
        }
        for child in &self.children {
            match &child.graph_specifier {
                Some(spec) => write!(f, " GRAPH {} {}", spec, child)?,
                None => write!(f, " {}", child)?,
            }
        }
        write!(f, " }}")
    }
}

/// Turns a graph pattern into solution rows
pub trait AlgebraEvaluator {
    /// Evaluate `pattern` against `dataset`
    ///
    /// Top-level patterns see the dataset's active graphs (or its default
    /// graph when none are active).
    fn evaluate(&self, pattern: &GraphPattern, dataset: &dyn Dataset) -> Result<Vec<Bindings>>;
}

/// Evaluator for conjunctive triple patterns with GRAPH scoping
///
/// A variable graph specifier that is unbound ranges over every named
/// graph. Blank nodes in patterns match literally.
#[derive(Clone, Copy, Debug, Default)]
pub struct BgpEvaluator;

impl BgpEvaluator {
    pub fn new() -> Self {
        BgpEvaluator
    }

    fn default_sources<'d>(dataset: &'d dyn Dataset) -> Vec<&'d Graph> {
        match dataset.active_graphs() {
            Some(names) => names.iter().filter_map(|n| dataset.graph(Some(n))).collect(),
            None => dataset.graph(None).into_iter().collect(),
        }
    }

    fn eval_group(
        &self,
        pattern: &GraphPattern,
        sources: &[&Graph],
        dataset: &dyn Dataset,
        rows: Vec<Bindings>,
    ) -> Result<Vec<Bindings>> {
        let mut rows = rows;
        for triple in &pattern.triple_patterns {
            rows = rows.iter().flat_map(|row| match_pattern(sources, triple, row)).collect();
            if rows.is_empty() {
                return Ok(rows);
            }
        }
        for child in &pattern.children {
            rows = self.eval_child(child, sources, dataset, rows)?;
        }
        Ok(rows)
    }

    fn eval_child(
        &self,
        child: &GraphPattern,
        sources: &[&Graph],
        dataset: &dyn Dataset,
        rows: Vec<Bindings>,
    ) -> Result<Vec<Bindings>> {
        match &child.graph_specifier {
            None => self.eval_group(child, sources, dataset, rows),
            Some(Node::Uri(uri)) => {
                let graphs: Vec<&Graph> = dataset.graph(Some(&**uri)).into_iter().collect();
                self.eval_group(child, &graphs, dataset, rows)
            }
            Some(Node::Variable(var)) => {
                let mut out = Vec::new();
                for row in rows {
                    match row.get(var) {
                        Some(Node::Uri(uri)) => {
                            let graphs: Vec<&Graph> = dataset.graph(Some(&**uri)).into_iter().collect();
                            out.extend(self.eval_group(child, &graphs, dataset, vec![row.clone()])?);
                        }
                        Some(_) => {}
                        None => {
                            for name in dataset.graph_names() {
                                let graphs: Vec<&Graph> = dataset.graph(Some(&name)).into_iter().collect();
                                let mut bound = row.clone();
                                bound.insert(var.clone(), Node::from(name.clone()));
                                out.extend(self.eval_group(child, &graphs, dataset, vec![bound])?);
                            }
                        }
                    }
                }
                Ok(out)
            }
            Some(other) => Err(Error::Evaluation(format!("unsupported graph specifier {}", other))),
        }
    }
}

impl AlgebraEvaluator for BgpEvaluator {
    fn evaluate(&self, pattern: &GraphPattern, dataset: &dyn Dataset) -> Result<Vec<Bindings>> {
        let sources = Self::default_sources(dataset);
        let rows = self.eval_group(pattern, &sources, dataset, vec![Bindings::default()])?;
        trace!(rows = rows.len(), "pattern evaluated");
        Ok(rows)
    }
}

/// Extend `row` with every match of `pattern` in `sources`
fn match_pattern(sources: &[&Graph], pattern: &TriplePattern, row: &Bindings) -> Vec<Bindings> {
    let s = substitute(pattern.subject(), row);
    let p = substitute(pattern.predicate(), row);
    let o = substitute(pattern.object(), row);
    let bound = |n: &Node| if n.is_variable() { None } else { Some(n.clone()) };
    let (bs, bp, bo) = (bound(&s), bound(&p), bound(&o));

    let mut matches: IndexSet<&Triple> = IndexSet::new();
    for graph in sources {
        matches.extend(graph.find(bs.as_ref(), bp.as_ref(), bo.as_ref()));
    }

    matches
        .into_iter()
        .filter_map(|triple| {
            let mut extended = row.clone();
            let ok = unify(&s, triple.subject(), &mut extended)
                && unify(&p, triple.predicate(), &mut extended)
                && unify(&o, triple.object(), &mut extended);
            ok.then_some(extended)
        })
        .collect()
}

fn unify(pattern: &Node, value: &Node, bindings: &mut Bindings) -> bool {
    match pattern {
        Node::Variable(var) => match bindings.get(var) {
            Some(existing) => existing == value,
            None => {
                bindings.insert(var.clone(), value.clone());
                true
            }
        },
        _ => pattern == value,
    }
}
