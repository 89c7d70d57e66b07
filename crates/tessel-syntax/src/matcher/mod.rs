//! Pattern matching engine for finding code structures.
//!
//! The [`Matcher`] trait is the seam between compiled queries and the node
//! model. [`Pattern`] and [`KindMatcher`] implement it here; structured rules
//! implement it in their own crate. The query methods on [`Node`] (`matches`,
//! `has`, `inside`, `find_all`, ...) accept any matcher.

mod capture;
mod matching;

use std::collections::BTreeMap;
use std::ops::Range as ByteRange;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::SyntaxError;
use crate::language::SupportedLanguage;
use crate::pattern::Pattern;
use crate::position::{Position, Range};
use crate::tree::{Node, NodeId, Root, RootId};

pub use capture::{CapturedNodes, CapturedValue, MetaVarEnv};

/// A compiled query that can be tested against a single node.
///
/// Implementations must not mutate shared state; a matcher is compiled once
/// and then used concurrently against many trees.
pub trait Matcher {
    /// Tests `node`, recording bindings in `env` on success.
    ///
    /// On failure `env` is left as it was.
    fn match_node_with_env<'r>(&self, node: Node<'r>, env: &mut MetaVarEnv<'r>) -> bool;

    /// Tests `node` with a fresh environment.
    fn match_node<'r>(&self, node: Node<'r>) -> Option<MatchResult<'r>> {
        let mut env = MetaVarEnv::new();
        self.match_node_with_env(node, &mut env)
            .then(|| MatchResult::new(node, env))
    }
}

impl<M: Matcher + ?Sized> Matcher for &M {
    fn match_node_with_env<'r>(&self, node: Node<'r>, env: &mut MetaVarEnv<'r>) -> bool {
        (**self).match_node_with_env(node, env)
    }
}

impl<M: Matcher + ?Sized> Matcher for Box<M> {
    fn match_node_with_env<'r>(&self, node: Node<'r>, env: &mut MetaVarEnv<'r>) -> bool {
        (**self).match_node_with_env(node, env)
    }
}

impl<M: Matcher + ?Sized> Matcher for Arc<M> {
    fn match_node_with_env<'r>(&self, node: Node<'r>, env: &mut MetaVarEnv<'r>) -> bool {
        (**self).match_node_with_env(node, env)
    }
}

impl Matcher for Pattern {
    fn match_node_with_env<'r>(&self, node: Node<'r>, env: &mut MetaVarEnv<'r>) -> bool {
        if node.language() != self.language() {
            return false;
        }
        if self
            .potential_kind()
            .is_some_and(|kind| kind != node.kind_id())
        {
            return false;
        }

        let mut trial = env.clone();
        if matching::match_node(self.node(), node, &mut trial) {
            *env = trial;
            true
        } else {
            false
        }
    }
}

/// Matches nodes of one grammar kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindMatcher {
    language: SupportedLanguage,
    kind_id: u16,
}

impl KindMatcher {
    /// Creates a matcher for the named kind `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError::UnknownKind`] if the grammar has no such kind.
    pub fn new(kind: &str, language: SupportedLanguage) -> Result<Self, SyntaxError> {
        let kind_id = language
            .kind_id(kind)
            .ok_or_else(|| SyntaxError::unknown_kind(language, kind))?;
        Ok(Self { language, kind_id })
    }

    /// Returns the grammar id of the matched kind.
    #[must_use]
    pub const fn kind_id(&self) -> u16 {
        self.kind_id
    }

    /// Returns the language of the matched kind.
    #[must_use]
    pub const fn language(&self) -> SupportedLanguage {
        self.language
    }
}

impl Matcher for KindMatcher {
    fn match_node_with_env<'r>(&self, node: Node<'r>, _env: &mut MetaVarEnv<'r>) -> bool {
        node.language() == self.language && node.kind_id() == self.kind_id
    }
}

/// Whether `find_all` reports matches nested inside other matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlapPolicy {
    /// Report every matching node, nested ones included.
    #[default]
    All,
    /// Do not look inside a node once it has matched.
    Outermost,
}

/// Result of a successful match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult<'r> {
    node: Node<'r>,
    env: MetaVarEnv<'r>,
}

impl<'r> MatchResult<'r> {
    /// Creates a result from a matched node and its bindings.
    #[must_use]
    pub const fn new(node: Node<'r>, env: MetaVarEnv<'r>) -> Self {
        Self { node, env }
    }

    /// Returns the matched node.
    #[must_use]
    pub const fn node(&self) -> Node<'r> {
        self.node
    }

    /// Returns the root the match was found in.
    #[must_use]
    pub const fn root(&self) -> &'r Root {
        self.node.root()
    }

    /// Returns the text of the matched region.
    #[must_use]
    pub fn text(&self) -> &'r str {
        self.node.text()
    }

    /// Returns the range of the matched region.
    #[must_use]
    pub fn range(&self) -> Range {
        self.node.range()
    }

    /// Returns the byte range of the matched region.
    #[must_use]
    pub fn byte_range(&self) -> ByteRange<usize> {
        self.node.byte_range()
    }

    /// Returns the start position of the match.
    #[must_use]
    pub fn start_position(&self) -> Position {
        self.node.start_position()
    }

    /// Returns the end position of the match.
    #[must_use]
    pub fn end_position(&self) -> Position {
        self.node.end_position()
    }

    /// Returns all metavariable bindings.
    #[must_use]
    pub const fn captures(&self) -> &MetaVarEnv<'r> {
        &self.env
    }

    /// Gets a captured metavariable by name.
    #[must_use]
    pub fn capture(&self, name: &str) -> Option<&CapturedValue<'r>> {
        self.env.get(name)
    }

    /// Returns the node bound to a single metavariable.
    #[must_use]
    pub fn get_match(&self, name: &str) -> Option<Node<'r>> {
        self.env.get_match(name)
    }

    /// Returns the nodes bound to a variadic metavariable.
    #[must_use]
    pub fn get_multiple_matches(&self, name: &str) -> Vec<Node<'r>> {
        self.env.get_multiple_matches(name)
    }

    /// Consumes the result, returning its bindings.
    #[must_use]
    pub fn into_env(self) -> MetaVarEnv<'r> {
        self.env
    }

    /// Converts the result into a form that does not borrow the root.
    #[must_use]
    pub fn detach(&self) -> DetachedMatch {
        let captures = self
            .env
            .iter()
            .map(|(name, value)| {
                let detached = match value {
                    CapturedValue::Single(node) => DetachedCapture::Single(node.id()),
                    CapturedValue::Multiple(nodes) => DetachedCapture::Multiple {
                        nodes: nodes.nodes().iter().map(Node::id).collect(),
                        byte_range: nodes.byte_range(),
                    },
                };
                (name.to_owned(), detached)
            })
            .collect();

        DetachedMatch {
            root: self.root().id(),
            node: self.node.id(),
            captures,
        }
    }
}

/// A match stored as arena ids, independent of the root's lifetime.
///
/// Re-attach it to the root it came from to get a [`MatchResult`] back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetachedMatch {
    root: RootId,
    node: NodeId,
    captures: BTreeMap<String, DetachedCapture>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum DetachedCapture {
    Single(NodeId),
    Multiple {
        nodes: Vec<NodeId>,
        byte_range: ByteRange<usize>,
    },
}

impl DetachedMatch {
    /// Returns the id of the root the match was found in.
    #[must_use]
    pub const fn root_id(&self) -> RootId {
        self.root
    }

    /// Returns the id of the matched node.
    #[must_use]
    pub const fn node_id(&self) -> NodeId {
        self.node
    }

    /// Rebuilds the match against `root`.
    ///
    /// Returns `None` if `root` is not the tree the match was taken from.
    #[must_use]
    pub fn attach<'r>(&self, root: &'r Root) -> Option<MatchResult<'r>> {
        if root.id() != self.root {
            return None;
        }

        let node = root.node(self.node)?;
        let mut env = MetaVarEnv::new();
        for (name, capture) in &self.captures {
            let bound = match capture {
                DetachedCapture::Single(id) => env.insert_single(name, root.node(*id)?),
                DetachedCapture::Multiple { nodes, byte_range } => {
                    let nodes = nodes
                        .iter()
                        .map(|id| root.node(*id))
                        .collect::<Option<Vec<_>>>()?;
                    let text = root.source().get(byte_range.clone())?;
                    env.insert_multiple(name, CapturedNodes::new(nodes, text, byte_range.clone()))
                }
            };
            if !bound {
                return None;
            }
        }
        Some(MatchResult::new(node, env))
    }
}

impl<'r> Node<'r> {
    /// Returns whether this node matches `matcher`.
    #[must_use]
    pub fn matches<M: Matcher + ?Sized>(&self, matcher: &M) -> bool {
        matcher.match_node(*self).is_some()
    }

    /// Returns whether some ancestor matches `matcher`.
    #[must_use]
    pub fn inside<M: Matcher + ?Sized>(&self, matcher: &M) -> bool {
        self.ancestors().any(|node| node.matches(matcher))
    }

    /// Returns whether some descendant, excluding this node, matches
    /// `matcher`.
    #[must_use]
    pub fn has<M: Matcher + ?Sized>(&self, matcher: &M) -> bool {
        self.descendants().skip(1).any(|node| node.matches(matcher))
    }

    /// Returns whether some following sibling matches `matcher`.
    #[must_use]
    pub fn precedes<M: Matcher + ?Sized>(&self, matcher: &M) -> bool {
        self.next_all().any(|node| node.matches(matcher))
    }

    /// Returns whether some preceding sibling matches `matcher`.
    #[must_use]
    pub fn follows<M: Matcher + ?Sized>(&self, matcher: &M) -> bool {
        self.prev_all().any(|node| node.matches(matcher))
    }

    /// Returns the first match in this subtree, in pre-order.
    #[must_use]
    pub fn find<M: Matcher + ?Sized>(&self, matcher: &M) -> Option<MatchResult<'r>> {
        self.descendants().find_map(|node| matcher.match_node(node))
    }

    /// Returns every match in this subtree, in pre-order, nested matches
    /// included.
    #[must_use]
    pub fn find_all<M: Matcher + ?Sized>(&self, matcher: &M) -> Vec<MatchResult<'r>> {
        self.find_all_with(matcher, OverlapPolicy::All)
    }

    /// Returns the matches in this subtree, in pre-order, under `policy`.
    #[must_use]
    pub fn find_all_with<M: Matcher + ?Sized>(
        &self,
        matcher: &M,
        policy: OverlapPolicy,
    ) -> Vec<MatchResult<'r>> {
        let mut results = Vec::new();
        let mut walk = self.descendants();
        while let Some(node) = walk.next() {
            if let Some(found) = matcher.match_node(node) {
                results.push(found);
                if policy == OverlapPolicy::Outermost {
                    walk.skip_subtree(node);
                }
            }
        }
        results
    }
}

#[cfg(test)]
mod tests;
