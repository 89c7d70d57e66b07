//! Pattern compilation for structural code matching.
//!
//! A pattern is a code fragment in the target language with metavariables in
//! place of the parts that may vary:
//!
//! - `$VAR` matches any single named node and captures it as `VAR`
//! - `$_` matches any single named node without capturing
//! - `$$$VAR` matches zero or more sibling nodes and captures them as `VAR`
//! - `$$$` matches zero or more sibling nodes without capturing
//!
//! Metavariable names must start with an uppercase letter or underscore,
//! followed by uppercase letters, digits, or underscores. Names starting with
//! `_` never capture.
//!
//! Compilation parses the fragment, picks the node the fragment stands for
//! (its anchor) and copies that subtree into an owned tree of pattern nodes,
//! so a compiled pattern holds no reference to the tree it came from.

use crate::error::{PatternError, SyntaxError};
use crate::language::SupportedLanguage;
use crate::metavariables::{MetaVarKind, MetaVariable, normalise, parse_placeholder};
use crate::parser::Parser;
use crate::tree::{Node, Root};

const WRAPPER_NAME: &str = "__tessel_pattern__";

/// A compiled structural pattern.
///
/// Patterns are immutable once compiled and can be shared between threads
/// and reused against any number of trees of the same language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    language: SupportedLanguage,
    metavariables: Vec<MetaVariable>,
    node: PatternNode,
}

/// One node of a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PatternNode {
    /// A metavariable placeholder.
    MetaVar { name: String, kind: MetaVarKind },
    /// A token compared by kind and text.
    Terminal {
        kind_id: u16,
        text: String,
        is_named: bool,
    },
    /// A production compared child by child.
    Internal {
        kind_id: u16,
        children: Vec<PatternNode>,
    },
}

impl PatternNode {
    fn from_node(node: Node<'_>) -> Self {
        if let Some((kind, name)) = parse_placeholder(node.text()) {
            return Self::MetaVar {
                name: name.to_owned(),
                kind,
            };
        }

        if node.is_leaf() {
            return Self::Terminal {
                kind_id: node.kind_id(),
                text: node.text().to_owned(),
                is_named: node.is_named(),
            };
        }

        Self::Internal {
            kind_id: node.kind_id(),
            children: node
                .children()
                .filter(|child| !child.is_extra())
                .map(Self::from_node)
                .collect(),
        }
    }

    fn terminals(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        match self {
            Self::MetaVar { .. } => Box::new(std::iter::empty()),
            Self::Terminal { text, .. } => Box::new(std::iter::once(text.as_str())),
            Self::Internal { children, .. } => {
                Box::new(children.iter().flat_map(Self::terminals))
            }
        }
    }
}

impl Pattern {
    /// Compiles a pattern string for the given language.
    ///
    /// When the bare fragment does not parse cleanly it is retried inside a
    /// per-language wrapper (a function body or rule block), so statements
    /// and declarations can be written on their own.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError::InvalidMetavariable`] for malformed
    /// metavariables and [`SyntaxError::PatternCompileError`] when the
    /// fragment does not parse or does not consist of exactly one node.
    ///
    /// # Examples
    ///
    /// ```
    /// use tessel_syntax::{Pattern, SupportedLanguage};
    ///
    /// let pattern = Pattern::compile("console.log($$$ARGS)", SupportedLanguage::JavaScript)?;
    /// assert!(pattern.has_metavariables());
    /// # Ok::<(), tessel_syntax::SyntaxError>(())
    /// ```
    pub fn compile(source: &str, language: SupportedLanguage) -> Result<Self, SyntaxError> {
        let normalised = normalise(source)?;
        let fail = |reason| SyntaxError::pattern_compile(language, source, reason);

        let mut parser = Parser::new(language)?;
        let root = parse_clean(&mut parser, &normalised.text)?
            .ok_or_else(|| fail(PatternError::SyntaxErrors))?;
        let anchor = find_anchor(&root.tree, root.body_kind).map_err(fail)?;

        Ok(Self {
            source: source.to_owned(),
            language,
            metavariables: normalised.metavariables,
            node: PatternNode::from_node(anchor),
        })
    }

    /// Compiles a contextual pattern.
    ///
    /// `context` is parsed as a larger fragment and the pattern is anchored
    /// on the first node of kind `selector` inside it. This disambiguates
    /// fragments that parse differently on their own, such as object
    /// properties or class members.
    ///
    /// # Errors
    ///
    /// As [`Pattern::compile`], plus [`PatternError::UnknownSelector`] and
    /// [`PatternError::NoSelectorInContext`].
    pub fn contextual(
        context: &str,
        selector: &str,
        language: SupportedLanguage,
    ) -> Result<Self, SyntaxError> {
        let normalised = normalise(context)?;
        let fail = |reason| SyntaxError::pattern_compile(language, context, reason);

        let selector_id = language.kind_id(selector).ok_or_else(|| {
            fail(PatternError::UnknownSelector {
                selector: selector.to_owned(),
            })
        })?;

        let mut parser = Parser::new(language)?;
        let root = parse_clean(&mut parser, &normalised.text)?
            .ok_or_else(|| fail(PatternError::SyntaxErrors))?;
        let search_from = match root.body_kind {
            Some(kind) => find_kind(root.tree.root(), kind).unwrap_or_else(|| root.tree.root()),
            None => root.tree.root(),
        };
        let anchor = search_from
            .descendants()
            .find(|node| node.kind_id() == selector_id)
            .ok_or_else(|| {
                fail(PatternError::NoSelectorInContext {
                    selector: selector.to_owned(),
                })
            })?;

        Ok(Self {
            source: context.to_owned(),
            language,
            metavariables: normalised.metavariables,
            node: PatternNode::from_node(anchor),
        })
    }

    /// Returns the original pattern source.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the language this pattern is compiled for.
    #[must_use]
    pub const fn language(&self) -> SupportedLanguage {
        self.language
    }

    /// Returns the metavariable occurrences in source order.
    #[must_use]
    pub fn metavariables(&self) -> &[MetaVariable] {
        &self.metavariables
    }

    /// Returns whether this pattern has any metavariables.
    #[must_use]
    pub fn has_metavariables(&self) -> bool {
        !self.metavariables.is_empty()
    }

    /// Returns the longest literal token of the pattern.
    ///
    /// Any source the pattern matches contains this text, so it can be used
    /// to skip files cheaply before parsing them.
    #[must_use]
    pub fn fixed_string(&self) -> &str {
        self.node
            .terminals()
            .fold("", |longest, text| {
                if text.len() > longest.len() {
                    text
                } else {
                    longest
                }
            })
    }

    /// Returns the kind id every match must have, if the anchor is not a
    /// metavariable.
    #[must_use]
    pub const fn potential_kind(&self) -> Option<u16> {
        match &self.node {
            PatternNode::MetaVar { .. } => None,
            PatternNode::Terminal { kind_id, .. } | PatternNode::Internal { kind_id, .. } => {
                Some(*kind_id)
            }
        }
    }

    pub(crate) const fn node(&self) -> &PatternNode {
        &self.node
    }
}

struct PatternTree {
    tree: Root,
    body_kind: Option<&'static str>,
}

/// Parses the fragment bare, then inside each wrapper, returning the first
/// parse without errors.
fn parse_clean(parser: &mut Parser, text: &str) -> Result<Option<PatternTree>, SyntaxError> {
    let bare = parser.parse(text)?;
    if !bare.has_errors() {
        return Ok(Some(PatternTree {
            tree: bare,
            body_kind: None,
        }));
    }

    for (wrapped, body_kind) in wrap_pattern_for_parse(parser.language(), text) {
        let tree = parser.parse(&wrapped)?;
        if !tree.has_errors() {
            return Ok(Some(PatternTree {
                tree,
                body_kind: Some(body_kind),
            }));
        }
    }
    Ok(None)
}

/// Returns wrapped variants of `pattern` with the kind of the node that
/// holds the fragment.
fn wrap_pattern_for_parse(
    language: SupportedLanguage,
    pattern: &str,
) -> Vec<(String, &'static str)> {
    match language {
        SupportedLanguage::Rust => {
            let trimmed = pattern.trim_end();
            let mut out = vec![(format!("fn {WRAPPER_NAME}() {{ {trimmed} }}"), "block")];
            if !trimmed.ends_with(';') && !trimmed.ends_with('}') {
                out.push((format!("fn {WRAPPER_NAME}() {{ {trimmed}; }}"), "block"));
            }
            out
        }
        SupportedLanguage::Python => {
            let mut out = format!("def {WRAPPER_NAME}():\n");
            for line in pattern.lines() {
                out.push_str("    ");
                out.push_str(line);
                out.push('\n');
            }
            vec![(out, "block")]
        }
        SupportedLanguage::JavaScript
        | SupportedLanguage::Jsx
        | SupportedLanguage::TypeScript
        | SupportedLanguage::Tsx => vec![(
            format!("function {WRAPPER_NAME}() {{ {pattern} }}"),
            "statement_block",
        )],
        SupportedLanguage::Css => vec![(format!("{WRAPPER_NAME} {{ {pattern} }}"), "block")],
        SupportedLanguage::Html => Vec::new(),
    }
}

fn find_kind<'r>(top: Node<'r>, kind: &str) -> Option<Node<'r>> {
    top.descendants().find(|node| node.kind() == kind)
}

fn find_anchor<'r>(tree: &'r Root, body_kind: Option<&str>) -> Result<Node<'r>, PatternError> {
    let top = match body_kind {
        Some(kind) => find_kind(tree.root(), kind).ok_or(PatternError::NoContent)?,
        None => tree.root(),
    };

    let mut candidates = top
        .named_children()
        .filter(|child| !child.is_extra());
    match (candidates.next(), candidates.next()) {
        (None, _) => Err(PatternError::NoContent),
        (Some(only), None) => Ok(descend_single(only)),
        (Some(_), Some(_)) => Err(PatternError::MultipleNodes),
    }
}

/// Descends while the node wraps a single child, ignoring a trailing
/// missing or empty node.
fn descend_single(start: Node<'_>) -> Node<'_> {
    let mut node = start;
    while let Some(child) = single_child(node) {
        node = child;
    }
    node
}

fn single_child(node: Node<'_>) -> Option<Node<'_>> {
    let mut children = node.children().filter(|child| !child.is_extra());
    let first = children.next()?;
    match children.next() {
        None => Some(first),
        Some(second) => {
            let ignorable = second.is_missing() || second.kind().is_empty();
            (ignorable && children.next().is_none()).then_some(first)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn kind_name(pattern: &Pattern) -> Option<&'static str> {
        pattern
            .potential_kind()
            .and_then(|id| pattern.language().kind_name(id))
    }

    #[test]
    fn compile_records_metavariables() {
        let pattern =
            Pattern::compile("$FUNC($ARG, $$$REST)", SupportedLanguage::JavaScript).expect("compile");
        let names: Vec<&str> = pattern
            .metavariables()
            .iter()
            .map(|mv| mv.name.as_str())
            .collect();
        assert_eq!(names, vec!["FUNC", "ARG", "REST"]);
        assert_eq!(pattern.source(), "$FUNC($ARG, $$$REST)");
    }

    #[rstest]
    #[case(SupportedLanguage::JavaScript, "foo()", "call_expression")]
    #[case(SupportedLanguage::JavaScript, "foo();", "expression_statement")]
    #[case(SupportedLanguage::TypeScript, "let x: number = 1", "lexical_declaration")]
    #[case(SupportedLanguage::Css, "color: $C;", "declaration")]
    #[case(SupportedLanguage::Html, "<p>$TEXT</p>", "element")]
    #[case(SupportedLanguage::Python, "print($X)", "call")]
    fn anchor_descends_to_the_fragment(
        #[case] language: SupportedLanguage,
        #[case] source: &str,
        #[case] expected: &str,
    ) {
        let pattern = Pattern::compile(source, language).expect("compile");
        assert_eq!(kind_name(&pattern), Some(expected));
    }

    #[test]
    fn lone_metavariable_has_no_kind() {
        let pattern = Pattern::compile("$A", SupportedLanguage::Tsx).expect("compile");
        assert_eq!(pattern.potential_kind(), None);
    }

    #[test]
    fn rust_expression_is_wrapped_in_a_block() {
        let pattern = Pattern::compile("$A + 1", SupportedLanguage::Rust).expect("compile");
        assert_eq!(kind_name(&pattern), Some("binary_expression"));
    }

    #[rstest]
    #[case("", PatternError::NoContent)]
    #[case("   ", PatternError::NoContent)]
    #[case("a; b;", PatternError::MultipleNodes)]
    #[case("function (", PatternError::SyntaxErrors)]
    fn compile_rejects_unusable_fragments(#[case] source: &str, #[case] expected: PatternError) {
        let err = Pattern::compile(source, SupportedLanguage::JavaScript).expect_err("reject");
        match err {
            SyntaxError::PatternCompileError { reason, .. } => assert_eq!(reason, expected),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn compile_rejects_bad_metavariables() {
        let err = Pattern::compile("f($$X)", SupportedLanguage::JavaScript).expect_err("reject");
        assert!(matches!(err, SyntaxError::InvalidMetavariable { .. }));
    }

    #[test]
    fn contextual_pattern_anchors_on_selector() {
        let pattern = Pattern::contextual(
            "class A { $NAME = $VALUE }",
            "public_field_definition",
            SupportedLanguage::TypeScript,
        )
        .expect("compile");
        assert_eq!(kind_name(&pattern), Some("public_field_definition"));
    }

    #[rstest]
    #[case("no_such_kind", PatternError::UnknownSelector { selector: "no_such_kind".to_owned() })]
    #[case("class_declaration", PatternError::NoSelectorInContext { selector: "class_declaration".to_owned() })]
    fn contextual_pattern_reports_selector_problems(
        #[case] selector: &str,
        #[case] expected: PatternError,
    ) {
        let err = Pattern::contextual("a = 1", selector, SupportedLanguage::JavaScript)
            .expect_err("reject");
        match err {
            SyntaxError::PatternCompileError { reason, .. } => assert_eq!(reason, expected),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn fixed_string_is_longest_literal() {
        let pattern =
            Pattern::compile("logger.warning($MSG)", SupportedLanguage::JavaScript).expect("compile");
        assert_eq!(pattern.fixed_string(), "warning");
    }

    #[test]
    fn pattern_is_shareable() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<Pattern>();
    }
}
