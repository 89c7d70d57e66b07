//! Metavariable bindings.
//!
//! A [`MetaVarEnv`] maps metavariable names to the nodes they matched during
//! one match attempt. Binding a name a second time succeeds only when the new
//! content is structurally identical to the first binding.

use std::collections::BTreeMap;
use std::ops::Range;

use crate::metavariables::is_capturing_name;
use crate::tree::Node;

/// A capture for a multiple-node metavariable (`$$$NAME`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedNodes<'r> {
    nodes: Vec<Node<'r>>,
    text: &'r str,
    byte_range: Range<usize>,
}

impl<'r> CapturedNodes<'r> {
    pub(crate) const fn new(nodes: Vec<Node<'r>>, text: &'r str, byte_range: Range<usize>) -> Self {
        Self {
            nodes,
            text,
            byte_range,
        }
    }

    /// Returns the captured named nodes in order.
    #[must_use]
    pub fn nodes(&self) -> &[Node<'r>] {
        &self.nodes
    }

    /// Returns the source text spanned by the whole run, separators
    /// included.
    #[must_use]
    pub const fn text(&self) -> &'r str {
        self.text
    }

    /// Returns the byte range spanned by the whole run. An empty run has an
    /// empty range at the position where it was matched.
    #[must_use]
    pub fn byte_range(&self) -> Range<usize> {
        self.byte_range.clone()
    }
}

/// Captured metavariable value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapturedValue<'r> {
    /// A single-node capture (`$NAME`).
    Single(Node<'r>),
    /// A multi-node capture (`$$$NAME`).
    Multiple(CapturedNodes<'r>),
}

impl<'r> CapturedValue<'r> {
    /// Returns the captured text.
    #[must_use]
    pub fn text(&self) -> &'r str {
        match self {
            Self::Single(node) => node.text(),
            Self::Multiple(nodes) => nodes.text(),
        }
    }

    /// Returns the byte range of the capture.
    #[must_use]
    pub fn byte_range(&self) -> Range<usize> {
        match self {
            Self::Single(node) => node.byte_range(),
            Self::Multiple(nodes) => nodes.byte_range(),
        }
    }

    /// Returns the captured nodes: one for a single capture, the named
    /// nodes of the run for a multiple capture.
    #[must_use]
    pub fn nodes(&self) -> &[Node<'r>] {
        match self {
            Self::Single(node) => std::slice::from_ref(node),
            Self::Multiple(nodes) => nodes.nodes(),
        }
    }

    /// Returns the capture as a single node, if applicable.
    #[must_use]
    pub const fn as_single(&self) -> Option<Node<'r>> {
        match self {
            Self::Single(node) => Some(*node),
            Self::Multiple(_) => None,
        }
    }

    /// Returns the capture as multiple nodes, if applicable.
    #[must_use]
    pub const fn as_multiple(&self) -> Option<&CapturedNodes<'r>> {
        match self {
            Self::Multiple(nodes) => Some(nodes),
            Self::Single(_) => None,
        }
    }

    fn same_content(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Single(a), Self::Single(b)) => same_structure(*a, *b),
            (Self::Multiple(a), Self::Multiple(b)) => {
                a.nodes.len() == b.nodes.len()
                    && a
                        .nodes
                        .iter()
                        .zip(&b.nodes)
                        .all(|(left, right)| same_structure(*left, *right))
            }
            _ => false,
        }
    }
}

/// Metavariable bindings for one match attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaVarEnv<'r> {
    bindings: BTreeMap<String, CapturedValue<'r>>,
}

impl<'r> MetaVarEnv<'r> {
    /// Creates an empty environment.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bindings: BTreeMap::new(),
        }
    }

    /// Returns the binding for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CapturedValue<'r>> {
        self.bindings.get(name)
    }

    /// Returns the node bound to a single metavariable.
    #[must_use]
    pub fn get_match(&self, name: &str) -> Option<Node<'r>> {
        self.get(name).and_then(CapturedValue::as_single)
    }

    /// Returns the named nodes bound to a variadic metavariable, or an empty
    /// list when `name` is unbound or single.
    #[must_use]
    pub fn get_multiple_matches(&self, name: &str) -> Vec<Node<'r>> {
        self.get(name)
            .and_then(CapturedValue::as_multiple)
            .map(|nodes| nodes.nodes().to_vec())
            .unwrap_or_default()
    }

    /// Iterates over bindings in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CapturedValue<'r>)> {
        self.bindings
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Returns the number of bound names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns whether nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Binds `name` to a single node.
    ///
    /// Returns `false`, leaving the environment unchanged, if `name` is
    /// already bound to different content.
    pub fn insert_single(&mut self, name: &str, node: Node<'r>) -> bool {
        self.insert_consistent(name, CapturedValue::Single(node))
    }

    /// Binds `name` to a run of nodes. See [`MetaVarEnv::insert_single`].
    pub fn insert_multiple(&mut self, name: &str, nodes: CapturedNodes<'r>) -> bool {
        self.insert_consistent(name, CapturedValue::Multiple(nodes))
    }

    /// Adds every binding of `other`, failing on the first conflict.
    ///
    /// On failure the environment is left unchanged.
    pub fn merge(&mut self, other: &Self) -> bool {
        let mut trial = self.clone();
        for (name, value) in &other.bindings {
            if !trial.insert_consistent(name, value.clone()) {
                return false;
            }
        }
        *self = trial;
        true
    }

    fn insert_consistent(&mut self, name: &str, next: CapturedValue<'r>) -> bool {
        if !is_capturing_name(name) {
            return true;
        }
        match self.bindings.get(name) {
            Some(existing) => existing.same_content(&next),
            None => {
                self.bindings.insert(name.to_owned(), next);
                true
            }
        }
    }
}

impl<'a, 'r> IntoIterator for &'a MetaVarEnv<'r> {
    type Item = (&'a String, &'a CapturedValue<'r>);
    type IntoIter = std::collections::btree_map::Iter<'a, String, CapturedValue<'r>>;

    fn into_iter(self) -> Self::IntoIter {
        self.bindings.iter()
    }
}

/// Compares two subtrees by kind and token text, ignoring extras such as
/// comments. Positions and whitespace do not matter.
pub(crate) fn same_structure(left: Node<'_>, right: Node<'_>) -> bool {
    if left.kind_id() != right.kind_id() {
        return false;
    }
    if left.is_leaf() || right.is_leaf() {
        return left.text() == right.text();
    }

    let mut left_children = left.children().filter(|child| !child.is_extra());
    let mut right_children = right.children().filter(|child| !child.is_extra());
    loop {
        match (left_children.next(), right_children.next()) {
            (None, None) => return true,
            (Some(a), Some(b)) if same_structure(a, b) => {}
            _ => return false,
        }
    }
}
