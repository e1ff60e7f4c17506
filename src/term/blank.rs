//! Blank node representation and per-graph id allocation

use std::fmt;
use std::sync::Arc;

use fnv::FnvHashSet;
use percent_encoding::utf8_percent_encode;

use super::LABEL_ESCAPE;

/// A blank node (anonymous node)
///
/// The id is only meaningful inside the graph that minted it.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlankNode {
    id: Arc<str>,
}

impl BlankNode {
    /// Create a blank node with the given id
    pub fn new(id: impl AsRef<str>) -> Self {
        BlankNode { id: Arc::from(id.as_ref()) }
    }

    /// Get the id
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Debug for BlankNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_:{}", self.id)
    }
}

impl fmt::Display for BlankNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_:{}", utf8_percent_encode(&self.id, LABEL_ESCAPE))
    }
}

/// Source of candidate blank node ids
///
/// Implementations need not guarantee uniqueness; the allocator skips any
/// id that was already issued in the graph.
pub trait BlankNodeIdGenerator: Send + Sync + fmt::Debug {
    /// Produce the next candidate id
    fn next_id(&mut self) -> String;

    /// Clone into a box (for cloning graphs)
    fn clone_box(&self) -> Box<dyn BlankNodeIdGenerator>;
}

/// Monotonic counter producing `{prefix}{n}`
#[derive(Clone, Debug)]
pub struct CounterIdGenerator {
    prefix: String,
    next: u64,
}

impl CounterIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        CounterIdGenerator { prefix: prefix.into(), next: 0 }
    }
}

impl Default for CounterIdGenerator {
    fn default() -> Self {
        CounterIdGenerator::new("b")
    }
}

impl BlankNodeIdGenerator for CounterIdGenerator {
    fn next_id(&mut self) -> String {
        let id = format!("{}{}", self.prefix, self.next);
        self.next += 1;
        id
    }

    fn clone_box(&self) -> Box<dyn BlankNodeIdGenerator> {
        Box::new(self.clone())
    }
}

/// Consecutive repeated candidates tolerated before suffixing
const MAX_COLLISIONS: usize = 64;

/// Per-graph blank node allocator
///
/// Ids are never reused within the allocator's lifetime, including ids
/// that were registered explicitly rather than minted.
#[derive(Debug)]
pub struct BlankNodeAllocator {
    generator: Box<dyn BlankNodeIdGenerator>,
    issued: FnvHashSet<Arc<str>>,
}

impl BlankNodeAllocator {
    /// Allocator using the default counter
    pub fn new() -> Self {
        Self::with_generator(Box::new(CounterIdGenerator::default()))
    }

    /// Allocator using a custom id generator
    pub fn with_generator(generator: Box<dyn BlankNodeIdGenerator>) -> Self {
        BlankNodeAllocator {
            generator,
            issued: FnvHashSet::default(),
        }
    }

    /// Mint a fresh blank node
    ///
    /// After `MAX_COLLISIONS` repeated candidates in a row the last one is
    /// suffixed with a counter, so a generator that cycles cannot stall.
    pub fn mint(&mut self) -> BlankNode {
        let mut candidate = self.generator.next_id();
        let mut collisions = 0;
        while self.issued.contains(candidate.as_str()) {
            collisions += 1;
            if collisions >= MAX_COLLISIONS {
                return self.mint_suffixed(&candidate);
            }
            candidate = self.generator.next_id();
        }
        self.register(&candidate)
    }

    fn mint_suffixed(&mut self, base: &str) -> BlankNode {
        let mut k = self.issued.len();
        loop {
            let candidate = format!("{}-{}", base, k);
            if !self.issued.contains(candidate.as_str()) {
                return self.register(&candidate);
            }
            k += 1;
        }
    }

    /// Record an externally chosen id so it will not be minted later
    pub fn register(&mut self, id: &str) -> BlankNode {
        let node = BlankNode::new(id);
        self.issued.insert(node.id.clone());
        node
    }

    /// Whether an id has been issued or registered
    pub fn is_issued(&self, id: &str) -> bool {
        self.issued.contains(id)
    }

    /// Number of ids issued so far
    pub fn issued_count(&self) -> usize {
        self.issued.len()
    }
}

impl Default for BlankNodeAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for BlankNodeAllocator {
    fn clone(&self) -> Self {
        BlankNodeAllocator {
            generator: self.generator.clone_box(),
            issued: self.issued.clone(),
        }
    }
}
