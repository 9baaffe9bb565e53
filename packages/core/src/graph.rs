use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::{Term, Triple};

/// An in-memory set of [`Triple`]s.
///
/// The graph is not a storage engine. Load statements from wherever you keep
/// them, add them here, and hand the graph to a
/// [`RenderPipeline`](crate::RenderPipeline).
///
/// Duplicate statements collapse into one. Iteration is in sorted order
/// (subject, predicate, object), which keeps serialization deterministic.
/// Triples are never modified in place: filtering builds a new graph.
///
/// Serialises as a JSON array of triples.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Graph {
    triples: BTreeSet<Triple>,
}

impl Graph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from an iterator of triples.
    pub fn from_triples(iter: impl IntoIterator<Item = Triple>) -> Self {
        Self {
            triples: iter.into_iter().collect(),
        }
    }

    /// Insert a statement. Returns `false` if it was already present.
    pub fn insert(&mut self, triple: Triple) -> bool {
        self.triples.insert(triple)
    }

    pub fn contains(&self, triple: &Triple) -> bool {
        self.triples.contains(triple)
    }

    /// Total number of statements in the graph.
    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// Iterate over all statements in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    /// All statements whose predicate is the IRI `predicate`.
    pub fn with_predicate<'a>(&'a self, predicate: &'a str) -> impl Iterator<Item = &'a Triple> {
        self.triples.iter().filter(move |t| t.has_predicate(predicate))
    }

    /// All statements about `subject`.
    pub fn about<'a>(&'a self, subject: &'a Term) -> impl Iterator<Item = &'a Triple> {
        self.triples.iter().filter(move |t| &t.subject == subject)
    }

    /// Distinct subjects, in sorted order.
    pub fn subjects(&self) -> BTreeSet<&Term> {
        self.triples.iter().map(|t| &t.subject).collect()
    }
}

impl FromIterator<Triple> for Graph {
    fn from_iter<I: IntoIterator<Item = Triple>>(iter: I) -> Self {
        Self::from_triples(iter)
    }
}

impl<'a> IntoIterator for &'a Graph {
    type Item = &'a Triple;
    type IntoIter = std::collections::btree_set::Iter<'a, Triple>;

    fn into_iter(self) -> Self::IntoIter {
        self.triples.iter()
    }
}

// --- tests -------------------------------------------------------------------
