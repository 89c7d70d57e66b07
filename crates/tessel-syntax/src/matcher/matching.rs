//! Structural matching of compiled pattern trees against syntax nodes.

use crate::matcher::capture::{CapturedNodes, MetaVarEnv};
use crate::metavariables::MetaVarKind;
use crate::pattern::PatternNode;
use crate::tree::Node;

/// Matches `pattern` against `candidate`, extending `env`.
///
/// Bindings made before a failure may remain in `env`; callers that need the
/// environment untouched on failure run this against a copy.
pub(super) fn match_node<'r>(
    pattern: &PatternNode,
    candidate: Node<'r>,
    env: &mut MetaVarEnv<'r>,
) -> bool {
    match pattern {
        PatternNode::MetaVar {
            name,
            kind: MetaVarKind::Single,
        } => candidate.is_named() && env.insert_single(name, candidate),
        PatternNode::MetaVar {
            name,
            kind: MetaVarKind::Multiple,
        } => {
            candidate.is_named()
                && env.insert_multiple(
                    name,
                    CapturedNodes::new(vec![candidate], candidate.text(), candidate.byte_range()),
                )
        }
        PatternNode::Terminal { kind_id, text, .. } => {
            candidate.kind_id() == *kind_id && candidate.text() == text
        }
        PatternNode::Internal { kind_id, children } => {
            if candidate.kind_id() != *kind_id {
                return false;
            }
            let sequence = Sequence {
                parent: candidate,
                patterns: children,
                candidates: candidate
                    .children()
                    .filter(|child| !child.is_extra())
                    .collect(),
            };
            sequence.matches(0, 0, env)
        }
    }
}

/// Unnamed tokens in the candidate may be passed over when the pattern has
/// nothing to pair them with.
fn is_skippable(node: Node<'_>) -> bool {
    !node.is_named()
}

/// Aligns a pattern's children with a candidate's children.
struct Sequence<'p, 'r> {
    parent: Node<'r>,
    patterns: &'p [PatternNode],
    candidates: Vec<Node<'r>>,
}

impl<'r> Sequence<'_, 'r> {
    fn matches(&self, pattern_idx: usize, candidate_idx: usize, env: &mut MetaVarEnv<'r>) -> bool {
        let Some(pattern) = self.patterns.get(pattern_idx) else {
            return self
                .candidates
                .get(candidate_idx..)
                .unwrap_or_default()
                .iter()
                .all(|node| is_skippable(*node));
        };

        match pattern {
            PatternNode::MetaVar {
                name,
                kind: MetaVarKind::Multiple,
            } => self.matches_multiple(name, pattern_idx, candidate_idx, env),
            _ => self.matches_one(pattern, pattern_idx, candidate_idx, env),
        }
    }

    /// Tries the longest run of remaining candidates first, shrinking until
    /// the rest of the pattern matches.
    fn matches_multiple(
        &self,
        name: &str,
        pattern_idx: usize,
        start: usize,
        env: &mut MetaVarEnv<'r>,
    ) -> bool {
        let Some(remaining) = self.candidates.get(start..) else {
            return false;
        };

        for len in (0..=remaining.len()).rev() {
            let Some(run) = remaining.get(..len) else {
                continue;
            };
            let mut trial = env.clone();
            if trial.insert_multiple(name, self.capture(run, start))
                && self.matches(pattern_idx + 1, start + len, &mut trial)
            {
                *env = trial;
                return true;
            }
        }

        false
    }

    /// Pairs one pattern child with the next candidate that matches it,
    /// passing over unnamed candidates in between.
    fn matches_one(
        &self,
        pattern: &PatternNode,
        pattern_idx: usize,
        start: usize,
        env: &mut MetaVarEnv<'r>,
    ) -> bool {
        let remaining = self.candidates.get(start..).unwrap_or_default();
        for (offset, candidate) in remaining.iter().enumerate() {
            let mut trial = env.clone();
            if match_node(pattern, *candidate, &mut trial)
                && self.matches(pattern_idx + 1, start + offset + 1, &mut trial)
            {
                *env = trial;
                return true;
            }
            if !is_skippable(*candidate) {
                return false;
            }
        }

        false
    }

    fn capture(&self, run: &[Node<'r>], start: usize) -> CapturedNodes<'r> {
        let named = run.iter().copied().filter(Node::is_named).collect();
        let byte_range = match (run.first(), run.last()) {
            (Some(first), Some(last)) => first.byte_range().start..last.byte_range().end,
            _ => {
                let at = self.empty_anchor(start);
                at..at
            }
        };
        let text = self
            .parent
            .root()
            .source()
            .get(byte_range.clone())
            .unwrap_or_default();
        CapturedNodes::new(named, text, byte_range)
    }

    /// Position recorded for an empty run: the start of the next candidate,
    /// else the end of the previous one, else the start of the parent.
    fn empty_anchor(&self, start: usize) -> usize {
        if let Some(next) = self.candidates.get(start) {
            return next.byte_range().start;
        }
        start
            .checked_sub(1)
            .and_then(|prev| self.candidates.get(prev))
            .map_or(self.parent.byte_range().start, |prev| prev.byte_range().end)
    }
}
