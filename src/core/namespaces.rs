//! Namespace URI constants and prefix maps
//!
//! `ns` holds the well-known vocabularies; `NamespaceMap` resolves
//! prefixed names (`ex:thing`) for a graph.

use std::fmt;
use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::error::{Error, Result};
use crate::term::Uri;

/// Standard namespace URI constants
pub mod ns {
    /// RDF namespace
    pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
    /// RDF Schema namespace
    pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
    /// XML Schema Datatypes namespace
    pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";
    /// OWL Web Ontology Language namespace
    pub const OWL: &str = "http://www.w3.org/2002/07/owl#";
    /// N3 Logic namespace (log:)
    pub const LOG: &str = "http://www.w3.org/2000/10/swap/log#";

    /// Helper to construct a full URI from namespace and local name
    #[inline]
    pub fn uri(namespace: &str, local: &str) -> String {
        format!("{}{}", namespace, local)
    }

    /// Check if a URI belongs to a namespace
    #[inline]
    pub fn in_namespace(uri: &str, namespace: &str) -> bool {
        uri.starts_with(namespace)
    }

    /// Extract local name from a URI given its namespace
    #[inline]
    pub fn local_name<'a>(uri: &'a str, namespace: &str) -> Option<&'a str> {
        uri.strip_prefix(namespace)
    }
}

fn prefixed_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([A-Za-z][A-Za-z0-9_\-.]*)?:([^\s<>]*)$")
            .expect("prefixed name pattern is valid")
    })
}

/// Ordered prefix → namespace URI map
#[derive(Clone, Default, PartialEq, Eq)]
pub struct NamespaceMap {
    prefixes: IndexMap<String, Uri>,
}

impl NamespaceMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Map with `rdf`, `rdfs`, `xsd` and `owl` predefined
    pub fn with_defaults() -> Self {
        let mut map = Self::new();
        map.add("rdf", ns::RDF);
        map.add("rdfs", ns::RDFS);
        map.add("xsd", ns::XSD);
        map.add("owl", ns::OWL);
        map
    }

    /// Add or replace a prefix
    pub fn add(&mut self, prefix: impl Into<String>, namespace: impl Into<Uri>) {
        self.prefixes.insert(prefix.into(), namespace.into());
    }

    /// Remove a prefix
    pub fn remove(&mut self, prefix: &str) -> Option<Uri> {
        self.prefixes.shift_remove(prefix)
    }

    /// Look up a prefix
    pub fn get(&self, prefix: &str) -> Option<&Uri> {
        self.prefixes.get(prefix)
    }

    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.prefixes.contains_key(prefix)
    }

    /// Find a prefix bound to the given namespace
    pub fn prefix_for(&self, namespace: &str) -> Option<&str> {
        self.prefixes
            .iter()
            .find(|(_, uri)| uri.as_str() == namespace)
            .map(|(prefix, _)| prefix.as_str())
    }

    /// Import every prefix from another map
    ///
    /// Prefixes already defined here keep their existing namespace.
    pub fn import(&mut self, other: &NamespaceMap) {
        for (prefix, uri) in &other.prefixes {
            if !self.prefixes.contains_key(prefix) {
                self.prefixes.insert(prefix.clone(), uri.clone());
            }
        }
    }

    /// Resolve a prefixed name such as `ex:thing` to a full URI
    pub fn resolve(&self, prefixed: &str) -> Result<Uri> {
        let caps = prefixed_name_regex()
            .captures(prefixed)
            .ok_or_else(|| Error::InvalidPrefixedName(prefixed.to_string()))?;
        let prefix = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        let local = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        let namespace = self.prefixes.get(prefix).ok_or_else(|| Error::NamespaceResolution {
            prefix: prefix.to_string(),
        })?;
        Ok(Uri::new(ns::uri(namespace.as_str(), local)))
    }

    /// Iterate prefixes in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Uri)> {
        self.prefixes.iter().map(|(p, u)| (p.as_str(), u))
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    pub fn clear(&mut self) {
        self.prefixes.clear();
    }
}

impl fmt::Debug for NamespaceMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.prefixes.iter().map(|(p, u)| (p, u.as_str()))).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uri_construction() {
        assert_eq!(
            ns::uri(ns::RDF, "type"),
            "http://www.w3.org/1999/02/22-rdf-syntax-ns#type"
        );
        assert!(ns::in_namespace("http://www.w3.org/2001/XMLSchema#int", ns::XSD));
        assert_eq!(ns::local_name("http://www.w3.org/2001/XMLSchema#int", ns::XSD), Some("int"));
        assert_eq!(ns::local_name("http://www.w3.org/2001/XMLSchema#int", ns::RDF), None);
    }

    #[test]
    fn test_resolve_prefixed_name() {
        let mut map = NamespaceMap::new();
        map.add("ex", "http://example.org/");
        map.add("", "http://default.org/");

        assert_eq!(map.resolve("ex:thing").unwrap().as_str(), "http://example.org/thing");
        assert_eq!(map.resolve(":local").unwrap().as_str(), "http://default.org/local");
    }

    #[test]
    fn test_undefined_prefix() {
        let map = NamespaceMap::with_defaults();
        match map.resolve("foaf:name") {
            Err(Error::NamespaceResolution { prefix }) => assert_eq!(prefix, "foaf"),
            other => panic!("expected resolution error, got {:?}", other),
        }
        assert!(matches!(map.resolve("not a name"), Err(Error::InvalidPrefixedName(_))));
    }

    #[test]
    fn test_import_keeps_existing() {
        let mut a = NamespaceMap::new();
        a.add("ex", "http://a.org/");
        let mut b = NamespaceMap::new();
        b.add("ex", "http://b.org/");
        b.add("other", "http://other.org/");

        a.import(&b);
        assert_eq!(a.get("ex").unwrap().as_str(), "http://a.org/");
        assert_eq!(a.get("other").unwrap().as_str(), "http://other.org/");
        assert_eq!(a.prefix_for("http://other.org/"), Some("other"));
    }
}
