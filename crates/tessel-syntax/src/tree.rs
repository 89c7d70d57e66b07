//! Arena-backed syntax trees.
//!
//! A [`Root`] flattens the Tree-sitter tree for one source file into a
//! vector of node records, numbered in pre-order. A [`Node`] is a copyable
//! view made of a reference to its root and a [`NodeId`]; it owns nothing
//! and cannot outlive the root it was taken from.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::SyntaxError;
use crate::language::SupportedLanguage;
use crate::parser::{Parser, SyntaxErrorInfo};
use crate::position::{Position, Range};

/// Filename recorded for roots parsed from in-memory text.
pub const ANONYMOUS_FILENAME: &str = "anonymous";

static NEXT_ROOT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a [`Root`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RootId(u64);

impl RootId {
    fn next() -> Self {
        Self(NEXT_ROOT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Index of a node inside its root's arena.
///
/// Ids follow pre-order, so a node's descendants occupy the ids directly
/// after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// Returns the arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub(crate) const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    fn from_index(index: usize) -> Result<Self, SyntaxError> {
        u32::try_from(index)
            .map(Self)
            .map_err(|_| SyntaxError::internal_error("syntax tree exceeds u32::MAX nodes"))
    }
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    kind: &'static str,
    kind_id: u16,
    named: bool,
    extra: bool,
    error: bool,
    missing: bool,
    start: Position,
    end: Position,
    parent: Option<NodeId>,
    field: Option<&'static str>,
    index_in_parent: u32,
    first_edge: u32,
    child_count: u32,
    subtree_end: u32,
}

/// An owned, immutable syntax tree for one source file.
///
/// The root owns the source text and every node record. Nodes handed out by
/// [`Root::root`] and the navigation methods borrow from it.
pub struct Root {
    id: RootId,
    language: SupportedLanguage,
    filename: String,
    source: String,
    nodes: Vec<NodeData>,
    edges: Vec<NodeId>,
}

impl Root {
    /// Parses `source` as `language` with the anonymous filename.
    ///
    /// # Errors
    ///
    /// Returns an error if the grammar cannot be loaded or produces no tree.
    /// Syntactically invalid source still yields a tree with error nodes.
    pub fn parse(source: &str, language: SupportedLanguage) -> Result<Self, SyntaxError> {
        Parser::new(language)?.parse(source)
    }

    pub(crate) fn from_tree(
        tree: &tree_sitter::Tree,
        source: String,
        language: SupportedLanguage,
        filename: String,
    ) -> Result<Self, SyntaxError> {
        let (nodes, edges) = flatten(tree, &source)?;
        let root = Self {
            id: RootId::next(),
            language,
            filename,
            source,
            nodes,
            edges,
        };
        root.validate()?;
        Ok(root)
    }

    /// Returns the identifier of this root.
    #[must_use]
    pub const fn id(&self) -> RootId {
        self.id
    }

    /// Returns the language the source was parsed as.
    #[must_use]
    pub const fn language(&self) -> SupportedLanguage {
        self.language
    }

    /// Returns the filename recorded at parse time.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Returns the source code that was parsed.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the top node of the tree. Its range spans the whole source.
    #[must_use]
    pub const fn root(&self) -> Node<'_> {
        Node {
            root: self,
            id: NodeId(0),
        }
    }

    /// Returns the node with the given id, if it belongs to this arena.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<Node<'_>> {
        (id.index() < self.nodes.len()).then_some(Node { root: self, id })
    }

    /// Returns the number of nodes in the tree.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether the tree contains error or missing nodes.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.nodes.iter().any(|data| data.error || data.missing)
    }

    /// Collects all syntax errors found in the tree, in document order.
    #[must_use]
    pub fn errors(&self) -> Vec<SyntaxErrorInfo> {
        self.root()
            .descendants()
            .filter(|node| node.is_error() || node.is_missing())
            .map(SyntaxErrorInfo::from_node)
            .collect()
    }

    fn validate(&self) -> Result<(), SyntaxError> {
        for (index, data) in self.nodes.iter().enumerate() {
            let (start, end) = (data.start.byte_offset, data.end.byte_offset);
            let well_formed = start <= end
                && end <= self.source.len()
                && self.source.is_char_boundary(start)
                && self.source.is_char_boundary(end);
            if !well_formed {
                return Err(SyntaxError::internal_error(format!(
                    "node {index} ({}) has invalid byte range {start}..{end} for source of {} bytes",
                    data.kind,
                    self.source.len()
                )));
            }
            let parent = data.parent.and_then(|id| self.nodes.get(id.index()));
            if let Some(parent) = parent {
                let nested = parent.start.byte_offset <= start && end <= parent.end.byte_offset;
                if !nested {
                    return Err(SyntaxError::internal_error(format!(
                        "node {index} ({}) escapes its parent {}",
                        data.kind, parent.kind
                    )));
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Root")
            .field("id", &self.id)
            .field("language", &self.language)
            .field("filename", &self.filename)
            .field("nodes", &self.nodes.len())
            .finish_non_exhaustive()
    }
}

/// Flattens a Tree-sitter tree into pre-order node records plus a child
/// edge list.
fn flatten(
    tree: &tree_sitter::Tree,
    source: &str,
) -> Result<(Vec<NodeData>, Vec<NodeId>), SyntaxError> {
    let mut nodes: Vec<NodeData> = Vec::new();
    let mut child_lists: Vec<Vec<NodeId>> = Vec::new();
    let mut parents: Vec<NodeId> = Vec::new();
    let mut cursor = tree.walk();

    'walk: loop {
        let node = cursor.node();
        let id = NodeId::from_index(nodes.len())?;
        let parent = parents.last().copied();
        let index_in_parent = match parent.and_then(|p| child_lists.get_mut(p.index())) {
            Some(siblings) => {
                siblings.push(id);
                siblings.len() - 1
            }
            None => 0,
        };

        nodes.push(NodeData {
            kind: node.kind(),
            kind_id: node.kind_id(),
            named: node.is_named(),
            extra: node.is_extra(),
            error: node.is_error(),
            missing: node.is_missing(),
            start: Position::from_point(node.start_position(), node.start_byte()),
            end: Position::from_point(node.end_position(), node.end_byte()),
            parent,
            field: cursor.field_name(),
            index_in_parent: to_u32(index_in_parent)?,
            first_edge: 0,
            child_count: 0,
            subtree_end: 0,
        });
        child_lists.push(Vec::new());

        if cursor.goto_first_child() {
            parents.push(id);
            continue;
        }

        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                break 'walk;
            }
            parents.pop();
        }
    }

    let mut edges = Vec::with_capacity(nodes.len().saturating_sub(1));
    for (data, children) in nodes.iter_mut().zip(&child_lists) {
        data.first_edge = to_u32(edges.len())?;
        data.child_count = to_u32(children.len())?;
        edges.extend_from_slice(children);
    }

    // Children always carry larger ids than their parent, so a reverse sweep
    // sees every child's subtree end before the parent needs it.
    for index in (0..nodes.len()).rev() {
        let own_end = to_u32(index + 1)?;
        let last_child_end = child_lists
            .get(index)
            .and_then(|children| children.last())
            .and_then(|last| nodes.get(last.index()))
            .map(|child| child.subtree_end);
        if let Some(data) = nodes.get_mut(index) {
            data.subtree_end = last_child_end.unwrap_or(own_end);
        }
    }

    if let Some(top) = nodes.first_mut() {
        top.start = Position::new(1, 1, 0);
        top.end = Position::end_of(source);
    }

    Ok((nodes, edges))
}

fn to_u32(value: usize) -> Result<u32, SyntaxError> {
    u32::try_from(value)
        .map_err(|_| SyntaxError::internal_error("syntax tree exceeds u32::MAX entries"))
}

/// A lightweight view of one node in a [`Root`].
#[derive(Clone, Copy)]
pub struct Node<'r> {
    root: &'r Root,
    id: NodeId,
}

impl<'r> Node<'r> {
    #[expect(
        clippy::indexing_slicing,
        reason = "node ids are minted by the arena they index and checked on re-entry"
    )]
    pub(crate) fn data(&self) -> &'r NodeData {
        &self.root.nodes[self.id.index()]
    }

    pub(crate) fn child_ids(&self) -> &'r [NodeId] {
        let data = self.data();
        let start = data.first_edge as usize;
        let end = start + data.child_count as usize;
        self.root.edges.get(start..end).unwrap_or_default()
    }

    pub(crate) const fn with_id(&self, id: NodeId) -> Self {
        Self {
            root: self.root,
            id,
        }
    }

    pub(crate) fn parent_id(&self) -> Option<NodeId> {
        self.data().parent
    }

    pub(crate) fn index_in_parent(&self) -> usize {
        self.data().index_in_parent as usize
    }

    pub(crate) fn subtree_end(&self) -> u32 {
        self.data().subtree_end
    }

    /// Returns the arena id of this node.
    #[must_use]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// Returns the root this node belongs to.
    #[must_use]
    pub const fn root(&self) -> &'r Root {
        self.root
    }

    /// Returns the language tag of the owning root.
    #[must_use]
    pub const fn language(&self) -> SupportedLanguage {
        self.root.language
    }

    /// Returns the grammar kind name.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.data().kind
    }

    /// Returns the grammar kind id.
    #[must_use]
    pub fn kind_id(&self) -> u16 {
        self.data().kind_id
    }

    /// Returns whether the node is a named grammar production.
    #[must_use]
    pub fn is_named(&self) -> bool {
        self.data().named
    }

    /// Returns whether the node is an extra, such as a comment.
    #[must_use]
    pub fn is_extra(&self) -> bool {
        self.data().extra
    }

    /// Returns whether the node is an error node.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.data().error
    }

    /// Returns whether the node was inserted by error recovery.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        self.data().missing
    }

    /// Returns whether the node has no children at all.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.data().child_count == 0
    }

    /// Returns whether the node has no named children.
    ///
    /// String literals and similar tokens made of punctuation plus one text
    /// fragment are named leaves even though they have children.
    #[must_use]
    pub fn is_named_leaf(&self) -> bool {
        self.child_ids()
            .iter()
            .all(|id| !self.with_id(*id).is_named())
    }

    /// Returns the source text covered by the node.
    #[must_use]
    pub fn text(&self) -> &'r str {
        self.root
            .source
            .get(self.byte_range())
            .unwrap_or_default()
    }

    /// Returns the byte range covered by the node.
    #[must_use]
    pub fn byte_range(&self) -> std::ops::Range<usize> {
        let data = self.data();
        data.start.byte_offset..data.end.byte_offset
    }

    /// Returns the start position.
    #[must_use]
    pub fn start_position(&self) -> Position {
        self.data().start
    }

    /// Returns the end position.
    #[must_use]
    pub fn end_position(&self) -> Position {
        self.data().end
    }

    /// Returns the range covered by the node.
    #[must_use]
    pub fn range(&self) -> Range {
        let data = self.data();
        Range {
            start: data.start,
            end: data.end,
        }
    }

    /// Returns the field under which this node hangs from its parent.
    #[must_use]
    pub fn field_name(&self) -> Option<&'static str> {
        self.data().field
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.root.id == other.root.id && self.id == other.id
    }
}

impl Eq for Node<'_> {}

impl std::hash::Hash for Node<'_> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.root.id.hash(state);
        self.id.hash(state);
    }
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:?}", self.kind(), self.byte_range())
    }
}
