//! Parent, child, sibling and field traversal over the node arena.
//!
//! Every walk is a read of the immutable arena, so the iterators here are
//! cheap to clone and can be restarted at will. Absent relationships yield
//! `None` or an empty iterator.

use std::iter::FusedIterator;
use std::slice;

use crate::tree::{Node, NodeId, Root};

impl<'r> Node<'r> {
    /// Returns the parent node, or `None` at the tree root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.parent_id().map(|id| self.with_id(id))
    }

    /// Returns all children in order, named or not.
    #[must_use]
    pub fn children(&self) -> Children<'r> {
        Children {
            root: self.root(),
            ids: self.child_ids().iter(),
        }
    }

    /// Returns the named children in order.
    pub fn named_children(&self) -> impl DoubleEndedIterator<Item = Self> + Clone + use<'r> {
        self.children().filter(Node::is_named)
    }

    /// Returns the number of children.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.child_ids().len()
    }

    /// Returns the `n`th child, counting unnamed tokens.
    #[must_use]
    pub fn child(&self, n: usize) -> Option<Self> {
        self.child_ids().get(n).map(|id| self.with_id(*id))
    }

    /// Returns the `n`th named child.
    #[must_use]
    pub fn named_child(&self, n: usize) -> Option<Self> {
        self.named_children().nth(n)
    }

    /// Returns the first child attached under the grammar field `name`.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<Self> {
        self.field_children(name).next()
    }

    /// Returns every child attached under the grammar field `name`.
    pub fn field_children<'a>(
        &self,
        name: &'a str,
    ) -> impl Iterator<Item = Self> + Clone + use<'r, 'a> {
        self.children()
            .filter(move |child| child.field_name() == Some(name))
    }

    /// Returns the ancestors from the parent outwards to the tree root.
    #[must_use]
    pub fn ancestors(&self) -> Ancestors<'r> {
        Ancestors {
            next: self.parent(),
        }
    }

    /// Returns the immediately following sibling.
    #[must_use]
    pub fn next(&self) -> Option<Self> {
        self.next_all().next()
    }

    /// Returns the immediately preceding sibling.
    #[must_use]
    pub fn prev(&self) -> Option<Self> {
        self.prev_all().next()
    }

    /// Returns the following siblings, nearest first.
    #[must_use]
    pub fn next_all(&self) -> Children<'r> {
        let siblings = self.siblings();
        let after = siblings
            .get(self.index_in_parent() + 1..)
            .unwrap_or_default();
        Children {
            root: self.root(),
            ids: after.iter(),
        }
    }

    /// Returns the preceding siblings, nearest first.
    #[must_use]
    pub fn prev_all(&self) -> std::iter::Rev<Children<'r>> {
        let siblings = self.siblings();
        let before = siblings.get(..self.index_in_parent()).unwrap_or_default();
        Children {
            root: self.root(),
            ids: before.iter(),
        }
        .rev()
    }

    /// Returns the nearest following named sibling.
    #[must_use]
    pub fn next_named(&self) -> Option<Self> {
        self.next_all().find(Node::is_named)
    }

    /// Returns the nearest preceding named sibling.
    #[must_use]
    pub fn prev_named(&self) -> Option<Self> {
        self.prev_all().find(Node::is_named)
    }

    /// Returns this node and all of its descendants in pre-order.
    #[must_use]
    pub fn descendants(&self) -> Descendants<'r> {
        Descendants {
            root: self.root(),
            next: self.id().index(),
            end: self.subtree_end() as usize,
        }
    }

    /// Depth-first pre-order walk; an alias of [`Node::descendants`].
    #[must_use]
    pub fn dfs(&self) -> Descendants<'r> {
        self.descendants()
    }

    /// Returns whether `other` lies in this node's subtree, itself included.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        self.root().id() == other.root().id()
            && (self.id().index()..self.subtree_end() as usize).contains(&other.id().index())
    }

    fn siblings(&self) -> &'r [NodeId] {
        self.parent()
            .map(|parent| parent.child_ids())
            .unwrap_or_default()
    }
}

/// Ordered iterator over a run of sibling nodes.
#[derive(Clone)]
pub struct Children<'r> {
    root: &'r Root,
    ids: slice::Iter<'r, NodeId>,
}

impl<'r> Iterator for Children<'r> {
    type Item = Node<'r>;

    fn next(&mut self) -> Option<Self::Item> {
        self.ids.next().and_then(|id| self.root.node(*id))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.ids.size_hint()
    }
}

impl DoubleEndedIterator for Children<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.ids.next_back().and_then(|id| self.root.node(*id))
    }
}

impl ExactSizeIterator for Children<'_> {}

impl FusedIterator for Children<'_> {}

/// Iterator from a node's parent outwards to the tree root.
#[derive(Clone)]
pub struct Ancestors<'r> {
    next: Option<Node<'r>>,
}

impl<'r> Iterator for Ancestors<'r> {
    type Item = Node<'r>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent();
        Some(current)
    }
}

impl FusedIterator for Ancestors<'_> {}

/// Pre-order iterator over a subtree.
///
/// Arena ids are assigned in pre-order, so a subtree is a contiguous id
/// range and the walk needs no stack.
#[derive(Clone)]
pub struct Descendants<'r> {
    root: &'r Root,
    next: usize,
    end: usize,
}

impl Descendants<'_> {
    /// Skips the remaining descendants of `node`, which must have been
    /// yielded by this walk.
    pub fn skip_subtree(&mut self, node: Node<'_>) {
        self.next = self.next.max(node.subtree_end() as usize);
    }
}

impl<'r> Iterator for Descendants<'r> {
    type Item = Node<'r>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let id = u32::try_from(self.next).ok()?;
        self.next += 1;
        self.root.node(NodeId::from_raw(id))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end.saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl FusedIterator for Descendants<'_> {}
