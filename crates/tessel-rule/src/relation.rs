//! Relational predicates: `has`, `inside`, `precedes` and `follows`.

use tessel_syntax::{Matcher, MetaVarEnv, Node};

use crate::config::{Relation, SerializableStopBy};
use crate::error::RuleError;
use crate::rule::{Rule, RuleCompiler};

/// Direction of a relational walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RelationKind {
    /// Named descendants.
    Has,
    /// Ancestors, innermost first.
    Inside,
    /// Named following siblings.
    Precedes,
    /// Named preceding siblings, nearest first.
    Follows,
}

#[derive(Debug)]
enum StopBy {
    Neighbor,
    End,
    Rule(Rule),
}

/// A compiled relational predicate.
#[derive(Debug)]
pub(crate) struct Relational {
    kind: RelationKind,
    rule: Rule,
    stop_by: StopBy,
    field: Option<String>,
}

impl Relational {
    pub(crate) fn compile(
        kind: RelationKind,
        relation: &Relation,
        compiler: &mut RuleCompiler<'_, '_>,
    ) -> Result<Self, RuleError> {
        let rule = compiler.compile(&relation.rule)?;
        let stop_by = match &relation.stop_by {
            SerializableStopBy::Neighbor => StopBy::Neighbor,
            SerializableStopBy::End => StopBy::End,
            SerializableStopBy::Rule(stop) => StopBy::Rule(compiler.compile(stop)?),
        };
        Ok(Self {
            kind,
            rule,
            stop_by,
            field: relation.field.clone(),
        })
    }

    /// Nodes visited by a linear walk, in order, each paired with whether
    /// the sub-rule is tried against it. `stopBy` may cut the walk short.
    /// `has` only walks this way for `neighbor`.
    fn candidates<'r>(&self, node: Node<'r>) -> Vec<(Node<'r>, bool)> {
        let neighbor_only = matches!(self.stop_by, StopBy::Neighbor);
        let nodes = match self.kind {
            RelationKind::Has => self.has_candidates(node),
            RelationKind::Inside => return self.inside_candidates(node, neighbor_only),
            RelationKind::Precedes => {
                let following = node.next_all().filter(Node::is_named);
                if neighbor_only {
                    following.take(1).collect()
                } else {
                    following.collect()
                }
            }
            RelationKind::Follows => {
                let preceding = node.prev_all().filter(Node::is_named);
                if neighbor_only {
                    preceding.take(1).collect()
                } else {
                    preceding.collect()
                }
            }
        };
        nodes.into_iter().map(|node| (node, true)).collect()
    }

    fn has_roots<'r>(&self, node: Node<'r>) -> Vec<Node<'r>> {
        match &self.field {
            Some(field) => node.field_children(field).collect(),
            None => node.children().collect(),
        }
    }

    fn has_candidates<'r>(&self, node: Node<'r>) -> Vec<Node<'r>> {
        self.has_roots(node).into_iter().filter(Node::is_named).collect()
    }

    /// Pre-order search below `node`. A stop node is still tried, but the
    /// walk does not descend into it.
    fn has_descendant<'r>(&self, node: Node<'r>, env: &mut MetaVarEnv<'r>) -> bool {
        for child in self.has_roots(node) {
            let mut walk = child.descendants();
            while let Some(candidate) = walk.next() {
                if !candidate.is_named() {
                    continue;
                }
                if self.rule.match_node_with_env(candidate, env) {
                    return true;
                }
                if self.stops_at(candidate) {
                    walk.skip_subtree(candidate);
                }
            }
        }
        false
    }

    /// Ancestors paired with whether the field restriction admits them.
    fn inside_candidates<'r>(&self, node: Node<'r>, neighbor_only: bool) -> Vec<(Node<'r>, bool)> {
        let mut candidates = Vec::new();
        let mut child = node;
        while let Some(parent) = child.parent() {
            let admitted = self
                .field
                .as_deref()
                .is_none_or(|field| child.field_name() == Some(field));
            candidates.push((parent, admitted));
            if neighbor_only {
                break;
            }
            child = parent;
        }
        candidates
    }

    fn stops_at(&self, node: Node<'_>) -> bool {
        match &self.stop_by {
            StopBy::Rule(stop) => stop.match_node_with_env(node, &mut MetaVarEnv::new()),
            StopBy::Neighbor | StopBy::End => false,
        }
    }
}

impl Matcher for Relational {
    fn match_node_with_env<'r>(&self, node: Node<'r>, env: &mut MetaVarEnv<'r>) -> bool {
        if self.kind == RelationKind::Has && !matches!(self.stop_by, StopBy::Neighbor) {
            return self.has_descendant(node, env);
        }
        for (candidate, admitted) in self.candidates(node) {
            if admitted && self.rule.match_node_with_env(candidate, env) {
                return true;
            }
            if self.stops_at(candidate) {
                return false;
            }
        }
        false
    }
}
