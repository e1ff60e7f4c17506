//! SPARQL-style update commands
//!
//! An `UpdateCommand` evaluates its WHERE pattern into solution rows, then
//! instantiates its delete and insert templates once per row and applies
//! the resulting triples to the dataset.
//!
//! # Supported Operations
//!
//! - `INSERT { template } WHERE { pattern }`
//! - `DELETE { template } WHERE { pattern }`
//! - `DELETE { template } INSERT { template } WHERE { pattern }`
//!
//! each with an optional `WITH <graph>` target and `USING <graph>` clauses.
//!
//! # Row failures
//!
//! A row that cannot be instantiated (unbound variable, node in a position
//! it is not allowed in, blank node in a delete template) drops only that
//! row's contribution to the affected group. Child groups whose graph
//! specifier does not resolve to a URI are skipped for that row.
//!
//! # Example
//!
//! ```ignore
//! use n3graph::sparql::{BgpEvaluator, GraphPattern, UpdateCommand, UpdateContext};
//! use n3graph::store::InMemoryDataset;
//!
//! let mut dataset = InMemoryDataset::new();
//! let mut command = UpdateCommand::insert(template, where_pattern);
//! let mut ctx = UpdateContext::new(&mut dataset, &BgpEvaluator);
//! let result = command.evaluate(&mut ctx)?;
//! ```

use std::collections::BTreeSet;
use std::fmt;

use fnv::FnvHashMap;
use serde::Serialize;
use tracing::{debug, info};

use super::{AlgebraEvaluator, GraphPattern};
use crate::config::UpdateConfig;
use crate::error::{Error, Result};
use crate::store::Dataset;
use crate::term::{BlankNode, Bindings, Node, Triple, Uri};

/// Update command types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CommandKind {
    /// INSERT { template } WHERE { pattern }
    Insert,
    /// DELETE { template } WHERE { pattern }
    Delete,
    /// DELETE { template } INSERT { template } WHERE { pattern }
    Modify,
}

/// Outcome of evaluating an update command
///
/// `inserted` and `deleted` count actual store changes; re-asserting a
/// present triple or retracting an absent one is not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpdateResult {
    /// Solution rows produced by the WHERE pattern
    pub rows: usize,
    pub inserted: usize,
    pub deleted: usize,
    /// Row contributions dropped by construction failures or unresolved graph specifiers
    pub skipped: usize,
}

/// Where an update command reads and writes
pub struct UpdateContext<'a> {
    dataset: &'a mut dyn Dataset,
    evaluator: &'a dyn AlgebraEvaluator,
    auto_optimise: bool,
}

impl<'a> UpdateContext<'a> {
    pub fn new(dataset: &'a mut dyn Dataset, evaluator: &'a dyn AlgebraEvaluator) -> Self {
        UpdateContext { dataset, evaluator, auto_optimise: false }
    }

    /// Context honouring the `[update]` config section
    pub fn with_config(
        dataset: &'a mut dyn Dataset,
        evaluator: &'a dyn AlgebraEvaluator,
        config: &UpdateConfig,
    ) -> Self {
        UpdateContext { dataset, evaluator, auto_optimise: config.auto_optimise }
    }

    /// Optimise every command before it is evaluated
    pub fn auto_optimise(mut self, enabled: bool) -> Self {
        self.auto_optimise = enabled;
        self
    }

    pub fn dataset(&self) -> &dyn Dataset {
        &*self.dataset
    }
}

impl fmt::Debug for UpdateContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateContext")
            .field("active_graphs", &self.dataset.active_graphs())
            .field("auto_optimise", &self.auto_optimise)
            .finish()
    }
}

/// A single INSERT, DELETE or DELETE/INSERT command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCommand {
    kind: CommandKind,
    with_graph: Option<Uri>,
    delete_template: Option<GraphPattern>,
    insert_template: Option<GraphPattern>,
    where_pattern: GraphPattern,
    using: Vec<Uri>,
    optimised: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TemplateMode {
    Delete,
    Insert,
}

impl UpdateCommand {
    fn build(
        kind: CommandKind,
        delete_template: Option<GraphPattern>,
        insert_template: Option<GraphPattern>,
        where_pattern: GraphPattern,
    ) -> Self {
        UpdateCommand {
            kind,
            with_graph: None,
            delete_template,
            insert_template,
            where_pattern,
            using: Vec::new(),
            optimised: false,
        }
    }

    /// INSERT { template } WHERE { pattern }
    pub fn insert(template: GraphPattern, where_pattern: GraphPattern) -> Self {
        Self::build(CommandKind::Insert, None, Some(template), where_pattern)
    }

    /// DELETE { template } WHERE { pattern }
    pub fn delete(template: GraphPattern, where_pattern: GraphPattern) -> Self {
        Self::build(CommandKind::Delete, Some(template), None, where_pattern)
    }

    /// DELETE { delete } INSERT { insert } WHERE { pattern }
    pub fn modify(delete: GraphPattern, insert: GraphPattern, where_pattern: GraphPattern) -> Self {
        Self::build(CommandKind::Modify, Some(delete), Some(insert), where_pattern)
    }

    /// Set the graph written to by top-level template triples
    pub fn with_graph(mut self, graph: Uri) -> Self {
        self.with_graph = Some(graph);
        self
    }

    /// Add a graph to the set the WHERE pattern is evaluated against
    pub fn using(mut self, graph: Uri) -> Self {
        self.using.push(graph);
        self
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn target_graph(&self) -> Option<&Uri> {
        self.with_graph.as_ref()
    }

    pub fn delete_template(&self) -> Option<&GraphPattern> {
        self.delete_template.as_ref()
    }

    pub fn insert_template(&self) -> Option<&GraphPattern> {
        self.insert_template.as_ref()
    }

    pub fn where_pattern(&self) -> &GraphPattern {
        &self.where_pattern
    }

    pub fn using_graphs(&self) -> &[Uri] {
        &self.using
    }

    pub fn is_optimised(&self) -> bool {
        self.optimised
    }

    /// Reorder the WHERE pattern most selective first
    ///
    /// Runs at most once per command.
    pub fn optimise(&mut self) {
        if self.optimised {
            return;
        }
        self.where_pattern.reorder_by_selectivity();
        self.optimised = true;
    }

    /// Evaluate the command against the context's dataset
    ///
    /// Row-level failures are logged and counted in `skipped`; only
    /// evaluator and dataset failures are returned as errors.
    pub fn evaluate(&mut self, ctx: &mut UpdateContext<'_>) -> Result<UpdateResult> {
        if ctx.auto_optimise {
            self.optimise();
        }

        let rows = self.evaluate_where(ctx)?;
        ctx.dataset.get_modifiable_graph(self.with_graph.as_ref())?;

        let mut result = UpdateResult { rows: rows.len(), ..UpdateResult::default() };
        let mut deletions = Vec::new();
        let mut insertions = Vec::new();

        for row in &rows {
            if let Some(template) = &self.delete_template {
                let mut builder = RowBuilder::new(row, TemplateMode::Delete, &mut deletions, &mut result.skipped);
                builder.construct(template, self.with_graph.as_ref(), &mut *ctx.dataset)?;
            }
            if let Some(template) = &self.insert_template {
                let mut builder = RowBuilder::new(row, TemplateMode::Insert, &mut insertions, &mut result.skipped);
                builder.construct(template, self.with_graph.as_ref(), &mut *ctx.dataset)?;
            }
        }

        // All deletions land before any insertion
        for (graph, triple) in &deletions {
            if ctx.dataset.get_modifiable_graph(graph.as_ref())?.retract(triple) {
                result.deleted += 1;
            }
        }
        for (graph, triple) in insertions {
            if ctx.dataset.get_modifiable_graph(graph.as_ref())?.assert(triple) {
                result.inserted += 1;
            }
        }

        info!(
            kind = ?self.kind,
            rows = result.rows,
            inserted = result.inserted,
            deleted = result.deleted,
            skipped = result.skipped,
            "update evaluated"
        );
        Ok(result)
    }

    /// USING graphs, else the WITH graph, replace the default graph for WHERE
    fn evaluate_where(&self, ctx: &mut UpdateContext<'_>) -> Result<Vec<Bindings>> {
        let sources: &[Uri] = match (&self.with_graph, self.using.is_empty()) {
            (_, false) => &self.using,
            (Some(with), true) => std::slice::from_ref(with),
            (None, true) => return ctx.evaluator.evaluate(&self.where_pattern, &*ctx.dataset),
        };
        ctx.dataset.set_active_graph(sources);
        let rows = ctx.evaluator.evaluate(&self.where_pattern, &*ctx.dataset);
        ctx.dataset.reset_active_graph();
        rows
    }

    // ------------------------------------------------------------------
    // Static analysis
    // ------------------------------------------------------------------

    /// Whether evaluating the command may change `graph` (`None` = default graph)
    ///
    /// Variable graph specifiers may resolve to any named graph.
    pub fn affects_graph(&self, graph: Option<&Uri>) -> bool {
        self.affected(false).map(|t| t.includes(graph)).unwrap_or(true)
    }

    /// Like `affects_graph`, but fails on specifiers that are neither URIs nor variables
    pub fn affects_graph_strict(&self, graph: Option<&Uri>) -> Result<bool> {
        Ok(self.affected(true)?.includes(graph))
    }

    /// Whether at most one graph can be changed
    ///
    /// False as soon as a variable specifier appears in a template.
    pub fn affects_single_graph(&self) -> bool {
        self.affected(false).map(|t| !t.unknown && t.graphs.len() <= 1).unwrap_or(false)
    }

    fn affected(&self, strict: bool) -> Result<AffectedGraphs> {
        let mut affected = AffectedGraphs::default();
        for template in self.delete_template.iter().chain(&self.insert_template) {
            affected.collect(template, self.with_graph.as_ref(), strict)?;
        }
        Ok(affected)
    }
}

impl fmt::Display for UpdateCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(graph) = &self.with_graph {
            write!(f, "WITH {} ", graph)?;
        }
        if let Some(template) = &self.delete_template {
            write!(f, "DELETE {} ", template)?;
        }
        if let Some(template) = &self.insert_template {
            write!(f, "INSERT {} ", template)?;
        }
        for graph in &self.using {
            write!(f, "USING {} ", graph)?;
        }
        write!(f, "WHERE {}", self.where_pattern)
    }
}

/// Graphs a command's templates can write to
#[derive(Debug, Default)]
struct AffectedGraphs {
    graphs: BTreeSet<Option<Uri>>,
    unknown: bool,
}

impl AffectedGraphs {
    fn collect(&mut self, pattern: &GraphPattern, target: Option<&Uri>, strict: bool) -> Result<()> {
        if !pattern.triple_patterns().is_empty() {
            self.graphs.insert(target.cloned());
        }
        for child in pattern.children() {
            match child.graph_specifier() {
                None => self.collect(child, target, strict)?,
                Some(Node::Uri(uri)) => self.collect(child, Some(&**uri), strict)?,
                Some(Node::Variable(_)) => self.unknown = true,
                Some(other) if strict => return Err(Error::UnsupportedGraphSpecifier(other.to_string())),
                Some(_) => {}
            }
        }
        Ok(())
    }

    fn includes(&self, graph: Option<&Uri>) -> bool {
        (self.unknown && graph.is_some()) || self.graphs.contains(&graph.cloned())
    }
}

/// Instantiates templates for one solution row
struct RowBuilder<'r> {
    row: &'r Bindings,
    mode: TemplateMode,
    out: &'r mut Vec<(Option<Uri>, Triple)>,
    skipped: &'r mut usize,
}

impl<'r> RowBuilder<'r> {
    fn new(
        row: &'r Bindings,
        mode: TemplateMode,
        out: &'r mut Vec<(Option<Uri>, Triple)>,
        skipped: &'r mut usize,
    ) -> Self {
        RowBuilder { row, mode, out, skipped }
    }

    /// Instantiate `pattern` into `target`, then each child into its own graph
    fn construct(&mut self, pattern: &GraphPattern, target: Option<&Uri>, dataset: &mut dyn Dataset) -> Result<()> {
        match self.instantiate(pattern, target, dataset) {
            Ok(triples) => self.out.extend(triples.into_iter().map(|t| (target.cloned(), t))),
            Err(e) if e.is_row_scoped() => {
                debug!(error = %e, graph = ?target, "template discarded for row");
                *self.skipped += 1;
            }
            Err(e) => return Err(e),
        }

        for child in pattern.children() {
            let child_target = match child.graph_specifier() {
                None => target.cloned(),
                Some(Node::Uri(uri)) => Some((**uri).clone()),
                Some(Node::Variable(var)) => match self.row.get(var) {
                    Some(Node::Uri(uri)) => Some((**uri).clone()),
                    Some(other) => {
                        debug!(variable = %var, value = %other, "graph variable not bound to a URI, child skipped");
                        *self.skipped += 1;
                        continue;
                    }
                    None => {
                        debug!(variable = %var, "graph variable unbound, child skipped");
                        *self.skipped += 1;
                        continue;
                    }
                },
                Some(other) => {
                    debug!(specifier = %other, "unsupported graph specifier, child skipped");
                    *self.skipped += 1;
                    continue;
                }
            };
            self.construct(child, child_target.as_ref(), dataset)?;
        }
        Ok(())
    }

    /// Substitute the row into the group's own triple patterns
    ///
    /// Blank nodes in an insert template are replaced by nodes minted in
    /// the target graph, one per template label.
    fn instantiate(&self, pattern: &GraphPattern, target: Option<&Uri>, dataset: &mut dyn Dataset) -> Result<Vec<Triple>> {
        let mut fresh: FnvHashMap<BlankNode, Node> = FnvHashMap::default();
        let mut triples = Vec::with_capacity(pattern.triple_patterns().len());
        for template in pattern.triple_patterns() {
            let s = self.node(template.subject(), target, dataset, &mut fresh)?;
            let p = self.node(template.predicate(), target, dataset, &mut fresh)?;
            let o = self.node(template.object(), target, dataset, &mut fresh)?;
            triples.push(Triple::new(s, p, o)?);
        }
        Ok(triples)
    }

    fn node(
        &self,
        node: &Node,
        target: Option<&Uri>,
        dataset: &mut dyn Dataset,
        fresh: &mut FnvHashMap<BlankNode, Node>,
    ) -> Result<Node> {
        match node {
            Node::Variable(var) => self
                .row
                .get(var)
                .cloned()
                .ok_or_else(|| Error::UnboundVariable(var.name().to_string())),
            Node::Blank(label) => match self.mode {
                TemplateMode::Delete => Err(Error::BlankNodeInDeleteTemplate(label.to_string())),
                TemplateMode::Insert => {
                    if let Some(minted) = fresh.get(label) {
                        return Ok(minted.clone());
                    }
                    let minted = dataset.get_modifiable_graph(target)?.create_blank_node();
                    fresh.insert(label.clone(), minted.clone());
                    Ok(minted)
                }
            },
            other => Ok(other.clone()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
