//! Blank-node-aware graph matching
//!
//! Two triple sets are equal when some bijection over their blank nodes
//! makes them identical; every other node must match literally. A
//! sub-graph match relaxes this to an injective mapping whose image is
//! contained in the larger set.
//!
//! The search partitions blank nodes by signature before backtracking:
//! a blank node can only map to a blank node with a compatible signature,
//! and blank nodes with the fewest candidates are assigned first.

use std::collections::BTreeMap;
use std::fmt;

use fnv::{FnvHashMap, FnvHashSet};
use serde::Serialize;
use tracing::trace;

use crate::term::{BlankNode, Node, Triple};

/// Mapping from the nodes of one graph onto another
///
/// Blank nodes map to blank nodes; the non-blank nodes of the ground
/// triples map to themselves.
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NodeMapping {
    entries: BTreeMap<Node, Node>,
}

impl NodeMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, from: Node, to: Node) {
        self.entries.insert(from, to);
    }

    /// Look up the image of a node
    pub fn get(&self, node: &Node) -> Option<&Node> {
        self.entries.get(node)
    }

    /// Map a node; nodes without an entry map to themselves
    pub fn map_node(&self, node: &Node) -> Node {
        self.entries.get(node).cloned().unwrap_or_else(|| node.clone())
    }

    /// Apply the blank node part of the mapping to a triple
    pub fn map_triple(&self, triple: &Triple) -> Triple {
        triple.map_blank_nodes(|b| match self.entries.get(&Node::Blank(b.clone())) {
            Some(Node::Blank(target)) => target.clone(),
            _ => b.clone(),
        })
    }

    /// Blank node pairs only
    pub fn blank_pairs(&self) -> impl Iterator<Item = (&BlankNode, &BlankNode)> {
        self.entries.iter().filter_map(|(k, v)| match (k, v) {
            (Node::Blank(a), Node::Blank(b)) => Some((a, b)),
            _ => None,
        })
    }

    /// Whether every entry maps a node to itself
    pub fn is_identity(&self) -> bool {
        self.entries.iter().all(|(k, v)| k == v)
    }

    /// The same mapping in the opposite direction
    pub fn inverse(&self) -> NodeMapping {
        NodeMapping {
            entries: self.entries.iter().map(|(k, v)| (v.clone(), k.clone())).collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Node, &Node)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for NodeMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

/// Find a bijection making `source` and `target` identical
pub fn equality_mapping<'a>(
    source: impl IntoIterator<Item = &'a Triple>,
    target: impl IntoIterator<Item = &'a Triple>,
) -> Option<NodeMapping> {
    Matcher::new(source, target, Mode::Equal).run()
}

/// Find an injective mapping of `sub` into `sup`
pub fn subgraph_mapping<'a>(
    sub: impl IntoIterator<Item = &'a Triple>,
    sup: impl IntoIterator<Item = &'a Triple>,
) -> Option<NodeMapping> {
    Matcher::new(sub, sup, Mode::Subgraph).run()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Equal,
    Subgraph,
}

/// Role of a blank node in a triple
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Role {
    Subject,
    Object,
}

/// One participation of a blank node: predicate, role and the other end
/// (`None` when the other end is a blank node)
type SignatureEntry = (Node, Role, Option<Node>);

/// Sorted multiset of participations
type Signature = Vec<SignatureEntry>;

struct Side<'a> {
    ground: FnvHashSet<&'a Triple>,
    non_ground: Vec<&'a Triple>,
    non_ground_set: FnvHashSet<&'a Triple>,
}

impl<'a> Side<'a> {
    fn new(triples: impl IntoIterator<Item = &'a Triple>) -> Self {
        let mut side = Side {
            ground: FnvHashSet::default(),
            non_ground: Vec::new(),
            non_ground_set: FnvHashSet::default(),
        };
        for triple in triples {
            if triple.is_ground() {
                side.ground.insert(triple);
            } else if side.non_ground_set.insert(triple) {
                side.non_ground.push(triple);
            }
        }
        side.non_ground.sort();
        side
    }

    fn len(&self) -> usize {
        self.ground.len() + self.non_ground.len()
    }

    fn contains(&self, triple: &Triple) -> bool {
        self.ground.contains(triple) || self.non_ground_set.contains(triple)
    }

    /// Signature of every blank node, keyed in id order
    fn signatures(&self) -> BTreeMap<BlankNode, Signature> {
        let mut signatures: BTreeMap<BlankNode, Signature> = BTreeMap::new();
        for triple in &self.non_ground {
            let predicate = triple.predicate();
            let (s, o) = (triple.subject(), triple.object());
            let other = |n: &Node| if n.is_blank() { None } else { Some(n.clone()) };
            if let Node::Blank(b) = s {
                signatures
                    .entry(b.clone())
                    .or_default()
                    .push((predicate.clone(), Role::Subject, other(o)));
            }
            if let Node::Blank(b) = o {
                signatures
                    .entry(b.clone())
                    .or_default()
                    .push((predicate.clone(), Role::Object, other(s)));
            }
        }
        for signature in signatures.values_mut() {
            signature.sort();
        }
        signatures
    }

    /// Triples each blank node takes part in
    fn involving(&self) -> FnvHashMap<BlankNode, Vec<&'a Triple>> {
        let mut involving: FnvHashMap<BlankNode, Vec<&'a Triple>> = FnvHashMap::default();
        for &triple in &self.non_ground {
            let mut seen: Option<&BlankNode> = None;
            for blank in triple.blank_nodes() {
                if seen == Some(blank) {
                    continue;
                }
                involving.entry(blank.clone()).or_default().push(triple);
                seen = Some(blank);
            }
        }
        involving
    }
}

/// Whether `small` is a sub-multiset of `large` (both sorted)
fn is_sub_multiset(small: &[SignatureEntry], large: &[SignatureEntry]) -> bool {
    let mut rest = large.iter();
    'outer: for entry in small {
        for candidate in rest.by_ref() {
            match candidate.cmp(entry) {
                std::cmp::Ordering::Less => continue,
                std::cmp::Ordering::Equal => continue 'outer,
                std::cmp::Ordering::Greater => return false,
            }
        }
        return false;
    }
    true
}

struct Matcher<'a> {
    source: Side<'a>,
    target: Side<'a>,
    mode: Mode,
}

impl<'a> Matcher<'a> {
    fn new(
        source: impl IntoIterator<Item = &'a Triple>,
        target: impl IntoIterator<Item = &'a Triple>,
        mode: Mode,
    ) -> Self {
        Matcher {
            source: Side::new(source),
            target: Side::new(target),
            mode,
        }
    }

    fn run(&self) -> Option<NodeMapping> {
        let (s, t) = (&self.source, &self.target);
        match self.mode {
            Mode::Equal if s.len() != t.len() => return None,
            Mode::Subgraph if s.len() > t.len() => return None,
            _ => {}
        }

        // Ground partition: no search needed
        let ground_ok = match self.mode {
            Mode::Equal => s.ground == t.ground,
            Mode::Subgraph => s.ground.iter().all(|tr| t.ground.contains(tr)),
        };
        if !ground_ok {
            trace!("ground triples differ");
            return None;
        }

        // Identical triple sets need no renaming
        if s.non_ground.iter().all(|tr| t.non_ground_set.contains(tr)) {
            let mut mapping = self.identity_entries();
            for triple in &s.non_ground {
                for blank in triple.blank_nodes() {
                    let node = Node::Blank(blank.clone());
                    mapping.insert(node.clone(), node);
                }
            }
            return Some(mapping);
        }

        let source_sigs = s.signatures();
        let target_sigs = t.signatures();
        if self.mode == Mode::Equal && source_sigs.len() != target_sigs.len() {
            return None;
        }

        let candidates = self.candidates(&source_sigs, &target_sigs)?;

        // Most constrained first, ties broken by signature then id
        let mut order: Vec<(&BlankNode, Vec<BlankNode>)> = candidates.into_iter().collect();
        order.sort_by(|(a, ca), (b, cb)| {
            ca.len()
                .cmp(&cb.len())
                .then_with(|| source_sigs[*a].cmp(&source_sigs[*b]))
                .then_with(|| a.cmp(b))
        });

        let mut search = Search {
            order: order.iter().map(|(b, _)| (*b).clone()).collect(),
            candidates: order.into_iter().map(|(_, c)| c).collect(),
            involving: s.involving(),
            target: t,
            assigned: FnvHashMap::default(),
            used: FnvHashSet::default(),
        };

        if !search.solve(0) {
            trace!("no consistent blank node assignment");
            return None;
        }

        let mut mapping = self.identity_entries();
        for (from, to) in search.assigned {
            mapping.insert(Node::Blank(from), Node::Blank(to));
        }
        Some(mapping)
    }

    /// Candidate targets per source blank node, or `None` if some blank
    /// node has no candidate at all
    fn candidates<'s>(
        &self,
        source_sigs: &'s BTreeMap<BlankNode, Signature>,
        target_sigs: &BTreeMap<BlankNode, Signature>,
    ) -> Option<BTreeMap<&'s BlankNode, Vec<BlankNode>>> {
        let mut result = BTreeMap::new();
        match self.mode {
            Mode::Equal => {
                let mut groups: BTreeMap<&Signature, (Vec<&BlankNode>, Vec<BlankNode>)> =
                    BTreeMap::new();
                for (blank, sig) in source_sigs {
                    groups.entry(sig).or_default().0.push(blank);
                }
                for (blank, sig) in target_sigs {
                    groups.entry(sig).or_default().1.push(blank.clone());
                }
                for (sources, targets) in groups.into_values() {
                    if sources.len() != targets.len() {
                        return None;
                    }
                    for source in sources {
                        result.insert(source, prefer_same_id(source, targets.clone()));
                    }
                }
            }
            Mode::Subgraph => {
                if source_sigs.len() > target_sigs.len() {
                    return None;
                }
                for (blank, sig) in source_sigs {
                    let targets: Vec<BlankNode> = target_sigs
                        .iter()
                        .filter(|(_, tsig)| is_sub_multiset(sig, tsig))
                        .map(|(b, _)| b.clone())
                        .collect();
                    if targets.is_empty() {
                        return None;
                    }
                    result.insert(blank, prefer_same_id(blank, targets));
                }
            }
        }
        Some(result)
    }

    fn identity_entries(&self) -> NodeMapping {
        let mut mapping = NodeMapping::new();
        for triple in &self.source.ground {
            for node in triple.nodes() {
                mapping.insert(node.clone(), node.clone());
            }
        }
        mapping
    }
}

fn prefer_same_id(source: &BlankNode, mut targets: Vec<BlankNode>) -> Vec<BlankNode> {
    if let Some(pos) = targets.iter().position(|t| t == source) {
        let same = targets.remove(pos);
        targets.insert(0, same);
    }
    targets
}

struct Search<'a, 'm> {
    order: Vec<BlankNode>,
    candidates: Vec<Vec<BlankNode>>,
    involving: FnvHashMap<BlankNode, Vec<&'a Triple>>,
    target: &'m Side<'a>,
    assigned: FnvHashMap<BlankNode, BlankNode>,
    used: FnvHashSet<BlankNode>,
}

impl Search<'_, '_> {
    fn solve(&mut self, depth: usize) -> bool {
        if depth == self.order.len() {
            return true;
        }
        let source = self.order[depth].clone();
        for i in 0..self.candidates[depth].len() {
            let candidate = self.candidates[depth][i].clone();
            if self.used.contains(&candidate) {
                continue;
            }
            self.assigned.insert(source.clone(), candidate.clone());
            self.used.insert(candidate.clone());
            if self.consistent(&source) && self.solve(depth + 1) {
                return true;
            }
            self.assigned.remove(&source);
            self.used.remove(&candidate);
        }
        false
    }

    /// Every fully assigned triple involving `blank` must exist in the target
    fn consistent(&self, blank: &BlankNode) -> bool {
        let Some(triples) = self.involving.get(blank) else {
            return true;
        };
        triples.iter().all(|triple| {
            let mut complete = true;
            let mapped = triple.map_blank_nodes(|b| match self.assigned.get(b) {
                Some(target) => target.clone(),
                None => {
                    complete = false;
                    b.clone()
                }
            });
            !complete || self.target.contains(&mapped)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(s: &str) -> Node {
        Node::uri(format!("http://example.org/{}", s))
    }

    fn t(s: Node, p: &str, o: Node) -> Triple {
        Triple::new(s, uri(p), o).unwrap()
    }

    fn verify(mapping: &NodeMapping, source: &[Triple], target: &[Triple]) -> bool {
        source.iter().all(|tr| target.contains(&mapping.map_triple(tr)))
    }

    #[test]
    fn test_reflexive_identity() {
        let g = vec![
            t(Node::blank("a"), "p", uri("x")),
            t(uri("s"), "q", Node::literal("v")),
        ];
        let mapping = equality_mapping(&g, &g).unwrap();
        assert!(mapping.is_identity());
        assert_eq!(mapping.get(&Node::blank("a")), Some(&Node::blank("a")));
        assert_eq!(mapping.get(&uri("s")), Some(&uri("s")));
    }

    #[test]
    fn test_renamed_blank_nodes_are_equal() {
        let a = vec![
            t(Node::blank("x"), "knows", Node::blank("y")),
            t(Node::blank("y"), "name", Node::literal("Bob")),
            t(Node::blank("x"), "name", Node::literal("Alice")),
        ];
        let b = vec![
            t(Node::blank("n1"), "name", Node::literal("Alice")),
            t(Node::blank("n2"), "name", Node::literal("Bob")),
            t(Node::blank("n1"), "knows", Node::blank("n2")),
        ];
        let mapping = equality_mapping(&a, &b).unwrap();
        assert_eq!(mapping.get(&Node::blank("x")), Some(&Node::blank("n1")));
        assert_eq!(mapping.get(&Node::blank("y")), Some(&Node::blank("n2")));
        assert!(verify(&mapping, &a, &b));
    }

    #[test]
    fn test_ground_mismatch_rejected() {
        let a = vec![t(uri("s"), "p", Node::literal("1")), t(Node::blank("b"), "p", uri("o"))];
        let b = vec![t(uri("s"), "p", Node::literal("2")), t(Node::blank("b"), "p", uri("o"))];
        assert!(equality_mapping(&a, &b).is_none());
    }

    #[test]
    fn test_count_mismatch_rejected() {
        let a = vec![t(Node::blank("b"), "p", uri("o"))];
        let b = vec![t(Node::blank("b"), "p", uri("o")), t(Node::blank("c"), "p", uri("o"))];
        assert!(equality_mapping(&a, &b).is_none());
    }

    #[test]
    fn test_symmetric_structure_needs_backtracking() {
        // Two cycles of length two: any pairing of same-signature nodes must
        // respect the cycle structure.
        let a = vec![
            t(Node::blank("a1"), "next", Node::blank("a2")),
            t(Node::blank("a2"), "next", Node::blank("a1")),
            t(Node::blank("a3"), "next", Node::blank("a4")),
            t(Node::blank("a4"), "next", Node::blank("a3")),
        ];
        let b = vec![
            t(Node::blank("b1"), "next", Node::blank("b3")),
            t(Node::blank("b3"), "next", Node::blank("b1")),
            t(Node::blank("b2"), "next", Node::blank("b4")),
            t(Node::blank("b4"), "next", Node::blank("b2")),
        ];
        let mapping = equality_mapping(&a, &b).unwrap();
        assert!(verify(&mapping, &a, &b));
        assert_eq!(mapping.blank_pairs().count(), 4);
    }

    #[test]
    fn test_cycle_lengths_differ() {
        // One 4-cycle against two 2-cycles: same signatures, not isomorphic
        let a = vec![
            t(Node::blank("a1"), "next", Node::blank("a2")),
            t(Node::blank("a2"), "next", Node::blank("a3")),
            t(Node::blank("a3"), "next", Node::blank("a4")),
            t(Node::blank("a4"), "next", Node::blank("a1")),
        ];
        let b = vec![
            t(Node::blank("b1"), "next", Node::blank("b2")),
            t(Node::blank("b2"), "next", Node::blank("b1")),
            t(Node::blank("b3"), "next", Node::blank("b4")),
            t(Node::blank("b4"), "next", Node::blank("b3")),
        ];
        assert!(equality_mapping(&a, &b).is_none());
    }

    #[test]
    fn test_subgraph() {
        let sub = vec![t(Node::blank("x"), "name", Node::literal("Alice"))];
        let sup = vec![
            t(Node::blank("p"), "name", Node::literal("Alice")),
            t(Node::blank("p"), "age", Node::literal("30")),
            t(uri("s"), "p", uri("o")),
        ];
        let mapping = subgraph_mapping(&sub, &sup).unwrap();
        assert_eq!(mapping.get(&Node::blank("x")), Some(&Node::blank("p")));
        assert!(subgraph_mapping(&sup, &sub).is_none());
    }

    #[test]
    fn test_empty_is_subgraph_of_anything() {
        let empty: Vec<Triple> = Vec::new();
        let g = vec![t(Node::blank("x"), "p", uri("o"))];
        assert!(subgraph_mapping(&empty, &g).is_some());
        assert!(subgraph_mapping(&empty, &empty).is_some());
        assert!(subgraph_mapping(&g, &g).is_some());
    }

    #[test]
    fn test_subgraph_is_injective() {
        // Two distinct blank nodes cannot both map onto the single one
        let sub = vec![
            t(Node::blank("a"), "p", uri("o")),
            t(Node::blank("b"), "p", uri("o")),
        ];
        let sup = vec![t(Node::blank("c"), "p", uri("o")), t(uri("s"), "p", uri("o"))];
        assert!(subgraph_mapping(&sub, &sup).is_none());
    }

    #[test]
    fn test_sub_multiset() {
        let p = uri("p");
        let e1 = (p.clone(), Role::Subject, None);
        let e2 = (p.clone(), Role::Object, Some(uri("x")));
        assert!(is_sub_multiset(&[e1.clone()], &[e1.clone(), e2.clone()]));
        assert!(!is_sub_multiset(&[e1.clone(), e1.clone()], &[e1.clone(), e2.clone()]));
        assert!(is_sub_multiset(&[], &[e2.clone()]));
        assert!(!is_sub_multiset(&[e2], &[e1]));
    }

    #[test]
    fn test_inverse_mapping() {
        let mut mapping = NodeMapping::new();
        mapping.insert(Node::blank("a"), Node::blank("b"));
        let inverse = mapping.inverse();
        assert_eq!(inverse.get(&Node::blank("b")), Some(&Node::blank("a")));
    }
}
