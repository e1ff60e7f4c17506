//! Core abstractions and common definitions for n3graph
//!
//! This module provides:
//! - `traits`: Core trait abstractions (TripleStore, GraphListener)
//! - `namespaces`: Standard namespace constants and the prefix map

pub mod traits;
pub mod namespaces;

pub use traits::*;
pub use namespaces::{ns, NamespaceMap};
