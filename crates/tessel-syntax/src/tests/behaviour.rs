//! Behaviour-driven development (BDD) step definitions for tessel-syntax scenarios.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::str::FromStr;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use crate::{MatchResult, Pattern, Root, SupportedLanguage, SyntaxError};

// =============================================================================
// Test World
// =============================================================================

/// State shared across BDD steps.
#[derive(Default)]
struct TestWorld {
    /// Language for current operations.
    language: Option<SupportedLanguage>,
    /// Source text as written in the scenario.
    source: Option<String>,
    /// Parsed source.
    root: Option<Root>,
    /// Compiled pattern for matching.
    pattern: Option<Pattern>,
    /// Error from the most recent compile attempt.
    compile_error: Option<SyntaxError>,
    /// Owned snapshots of match results.
    matches: Vec<MatchSnapshot>,
}

/// Snapshot of match result data (owned, not borrowed).
#[derive(Debug)]
struct MatchSnapshot {
    text: String,
    captures: BTreeMap<String, String>,
}

impl From<&MatchResult<'_>> for MatchSnapshot {
    fn from(found: &MatchResult<'_>) -> Self {
        Self {
            text: found.text().to_owned(),
            captures: found
                .captures()
                .iter()
                .map(|(name, value)| (name.to_owned(), value.text().to_owned()))
                .collect(),
        }
    }
}

#[fixture]
fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::default())
}

/// Strips surrounding double quotes from a string if present.
fn strip_quotes(s: &str) -> &str {
    s.trim_matches('"')
}

/// Expands the `\n` escapes scenarios use for multi-line sources.
fn unescape(s: &str) -> String {
    strip_quotes(s).replace("\\n", "\n")
}

// =============================================================================
// Given Steps
// =============================================================================

#[given("language {language}")]
fn given_language(world: &RefCell<TestWorld>, language: String) {
    let mut w = world.borrow_mut();
    w.language = Some(SupportedLanguage::from_str(strip_quotes(&language)).expect("language"));
}

#[given("source code {code}")]
fn given_source(world: &RefCell<TestWorld>, code: String) {
    let mut w = world.borrow_mut();
    let language = w.language.expect("language should be set");
    let source = unescape(&code);
    w.root = Some(Root::parse(&source, language).expect("parse"));
    w.source = Some(source);
}

#[given("a pattern {pattern}")]
fn given_pattern(world: &RefCell<TestWorld>, pattern: String) {
    let mut w = world.borrow_mut();
    let language = w.language.expect("language should be set");
    let compiled = Pattern::compile(&unescape(&pattern), language).expect("pattern compile");
    w.pattern = Some(compiled);
}

#[given("the query {pattern} for language {language}")]
fn given_foreign_pattern(world: &RefCell<TestWorld>, pattern: String, language: String) {
    let mut w = world.borrow_mut();
    let language = SupportedLanguage::from_str(strip_quotes(&language)).expect("language");
    let compiled = Pattern::compile(&unescape(&pattern), language).expect("pattern compile");
    w.pattern = Some(compiled);
}

// =============================================================================
// When Steps
// =============================================================================

#[when("the pattern is matched against the source")]
fn when_match_pattern(world: &RefCell<TestWorld>) {
    let mut w = world.borrow_mut();
    let root = w
        .root
        .as_ref()
        .expect("source should be parsed before matching");
    let pattern = w
        .pattern
        .as_ref()
        .expect("pattern should be set before matching");

    let snapshots: Vec<MatchSnapshot> = root
        .root()
        .find_all(pattern)
        .iter()
        .map(MatchSnapshot::from)
        .collect();
    w.matches = snapshots;
}

#[when("the pattern {pattern} is compiled")]
fn when_compile_pattern(world: &RefCell<TestWorld>, pattern: String) {
    let mut w = world.borrow_mut();
    let language = w.language.expect("language should be set");
    match Pattern::compile(strip_quotes(&pattern), language) {
        Ok(compiled) => w.pattern = Some(compiled),
        Err(err) => w.compile_error = Some(err),
    }
}

// =============================================================================
// Then Steps
// =============================================================================

#[then("the root text equals the source")]
fn then_root_round_trips(world: &RefCell<TestWorld>) {
    let w = world.borrow();
    let root = w.root.as_ref().expect("root");
    assert_eq!(Some(root.root().text()), w.source.as_deref());
}

#[then("the tree reports syntax errors")]
fn then_tree_has_errors(world: &RefCell<TestWorld>) {
    let w = world.borrow();
    let root = w.root.as_ref().expect("root");
    assert!(root.has_errors());
    assert!(!root.errors().is_empty());
    assert!(root.root().descendants().count() > 1, "tree should stay navigable");
}

#[then("the match count is {count}")]
fn then_match_count(world: &RefCell<TestWorld>, count: usize) {
    let w = world.borrow();
    assert_eq!(w.matches.len(), count, "matches: {:?}", w.matches);
}

#[then("no matches are found")]
fn then_no_matches(world: &RefCell<TestWorld>) {
    let w = world.borrow();
    assert!(
        w.matches.is_empty(),
        "Expected no matches, got {:?}",
        w.matches
    );
}

#[then("the first match text is {text}")]
fn then_first_match_text(world: &RefCell<TestWorld>, text: String) {
    let w = world.borrow();
    let first = w.matches.first().expect("at least one match");
    assert_eq!(first.text, unescape(&text));
}

#[then("capture {name} is {expected}")]
fn then_capture_is(world: &RefCell<TestWorld>, name: String, expected: String) {
    let w = world.borrow();
    let capture_name = strip_quotes(&name);
    let first = w.matches.first().expect("at least one match");
    assert_eq!(
        first.captures.get(capture_name).map(String::as_str),
        Some(strip_quotes(&expected)),
        "captures: {:?}",
        first.captures
    );
}

#[then("compilation fails with an invalid metavariable")]
fn then_invalid_metavariable(world: &RefCell<TestWorld>) {
    let w = world.borrow();
    assert!(
        matches!(w.compile_error, Some(SyntaxError::InvalidMetavariable { .. })),
        "unexpected outcome: {:?}",
        w.compile_error
    );
}

// =============================================================================
// Scenario Bindings
// =============================================================================

#[scenario(
    path = "tests/features/tessel_syntax.feature",
    name = "Parsing preserves the source text"
)]
fn parse_round_trip(world: RefCell<TestWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/tessel_syntax.feature",
    name = "Syntax errors leave a navigable tree"
)]
fn syntax_errors_navigable(world: RefCell<TestWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/tessel_syntax.feature",
    name = "Pattern captures metavariable values"
)]
fn pattern_captures_metavars(world: RefCell<TestWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/tessel_syntax.feature",
    name = "Repeated metavariables must agree"
)]
fn repeated_metavars_agree(world: RefCell<TestWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/tessel_syntax.feature",
    name = "Variadic metavariable captures every argument"
)]
fn variadic_captures_arguments(world: RefCell<TestWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/tessel_syntax.feature",
    name = "Patterns never match another language"
)]
fn no_cross_language_matches(world: RefCell<TestWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/tessel_syntax.feature",
    name = "Malformed metavariables are rejected"
)]
fn malformed_metavariable_rejected(world: RefCell<TestWorld>) {
    let _ = world;
}
