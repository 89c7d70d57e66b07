//! Behaviour-driven tests for rule compilation and evaluation.

use std::collections::BTreeMap;
use std::str::FromStr;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::{Value, json};

use tessel_syntax::{Root, SupportedLanguage};

use crate::{GlobalRules, RuleConfig, RuleCore, RuleError};

// ---------------------------------------------------------------------------
// Typed wrappers for Gherkin step parameters
// ---------------------------------------------------------------------------

/// A double-quoted string value from a Gherkin feature file.
#[derive(Debug, Clone, PartialEq, Eq)]
struct QuotedString(String);

impl FromStr for QuotedString {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim_matches('"').replace("\\n", "\n")))
    }
}

impl QuotedString {
    fn as_str(&self) -> &str {
        &self.0
    }
}

/// A single-quoted JSON document from a Gherkin feature file.
#[derive(Debug, Clone, PartialEq)]
struct JsonDocument(Value);

impl FromStr for JsonDocument {
    type Err = serde_json::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(s.trim_matches('\'')).map(Self)
    }
}

// ---------------------------------------------------------------------------
// Test world
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Found {
    text: String,
    line: u32,
    captures: BTreeMap<String, String>,
}

#[derive(Default)]
struct TestWorld {
    root: Option<Root>,
    rule_language: Option<SupportedLanguage>,
    rule: Option<Value>,
    constraints: Option<Value>,
    local_utils: Option<Value>,
    global_utils: Option<Value>,
    outcome: Option<Result<Vec<Found>, RuleError>>,
}

impl TestWorld {
    fn found(&self) -> &[Found] {
        match self.outcome.as_ref().expect("rule should have run") {
            Ok(found) => found,
            Err(err) => panic!("rule failed to compile: {err}"),
        }
    }
}

#[fixture]
fn world() -> TestWorld {
    TestWorld::default()
}

fn compile(world: &TestWorld, language: SupportedLanguage) -> Result<RuleCore, RuleError> {
    let config: RuleConfig = serde_json::from_value(json!({
        "id": "behaviour",
        "language": language.to_string(),
        "rule": world.rule.clone().expect("rule should be set"),
        "constraints": world.constraints.clone().unwrap_or_else(|| json!({})),
        "utils": world.local_utils.clone().unwrap_or_else(|| json!({})),
    }))
    .expect("valid rule document");

    let globals = match &world.global_utils {
        Some(utils) => GlobalRules::try_new(
            language,
            &serde_json::from_value(utils.clone()).expect("valid utilities"),
        )?,
        None => GlobalRules::default(),
    };
    RuleCore::try_new(&config, &globals)
}

// ---------------------------------------------------------------------------
// Given steps
// ---------------------------------------------------------------------------

#[given("the {language} source {code}")]
fn given_source(world: &mut TestWorld, language: SupportedLanguage, code: QuotedString) {
    world.root = Some(Root::parse(code.as_str(), language).expect("parse source"));
}

#[given("the rule {rule}")]
fn given_rule(world: &mut TestWorld, rule: JsonDocument) {
    world.rule = Some(rule.0);
}

#[given("a {language} rule {rule}")]
fn given_rule_for_language(world: &mut TestWorld, language: SupportedLanguage, rule: JsonDocument) {
    world.rule_language = Some(language);
    world.rule = Some(rule.0);
}

#[given("the constraints {constraints}")]
fn given_constraints(world: &mut TestWorld, constraints: JsonDocument) {
    world.constraints = Some(constraints.0);
}

#[given("the local utilities {utils}")]
fn given_local_utils(world: &mut TestWorld, utils: JsonDocument) {
    world.local_utils = Some(utils.0);
}

#[given("the global utilities {utils}")]
fn given_global_utils(world: &mut TestWorld, utils: JsonDocument) {
    world.global_utils = Some(utils.0);
}

// ---------------------------------------------------------------------------
// When steps
// ---------------------------------------------------------------------------

#[when("the rule is compiled and run")]
fn when_rule_runs(world: &mut TestWorld) {
    let root = world.root.as_ref().expect("source should be set");
    let language = world.rule_language.unwrap_or_else(|| root.language());
    let outcome = compile(world, language).map(|rule| {
        root.root()
            .find_all(&rule)
            .iter()
            .map(|found| Found {
                text: found.text().to_owned(),
                line: found.start_position().line,
                captures: found
                    .captures()
                    .iter()
                    .map(|(name, value)| (name.to_owned(), value.text().to_owned()))
                    .collect(),
            })
            .collect()
    });
    world.outcome = Some(outcome);
}

// ---------------------------------------------------------------------------
// Then steps
// ---------------------------------------------------------------------------

#[then("the matched texts are {texts}")]
fn then_matched_texts(world: &mut TestWorld, texts: QuotedString) {
    let actual: Vec<&str> = world.found().iter().map(|found| found.text.as_str()).collect();
    let expected: Vec<&str> = texts.as_str().split('|').collect();
    assert_eq!(actual, expected);
}

#[then("match {index} starts on line {line}")]
fn then_match_line(world: &mut TestWorld, index: usize, line: u32) {
    let found = world.found().get(index - 1).expect("match index in range");
    assert_eq!(found.line, line);
}

#[then("capture {name} of match {index} is {expected}")]
fn then_capture(world: &mut TestWorld, name: QuotedString, index: usize, expected: QuotedString) {
    let found = world.found().get(index - 1).expect("match index in range");
    assert_eq!(
        found.captures.get(name.as_str()).map(String::as_str),
        Some(expected.as_str())
    );
}

#[then("nothing matches")]
fn then_nothing_matches(world: &mut TestWorld) {
    assert!(world.found().is_empty());
}

#[then("compilation fails with {variant}")]
fn then_compilation_fails(world: &mut TestWorld, variant: QuotedString) {
    let err = match world.outcome.as_ref().expect("rule should have run") {
        Ok(found) => panic!("expected a compile error, found {} matches", found.len()),
        Err(err) => err,
    };
    let name = match err {
        RuleError::EmptyRule => "EmptyRule",
        RuleError::CyclicUtil { .. } => "CyclicUtil",
        RuleError::UndefinedUtil { .. } => "UndefinedUtil",
        RuleError::LanguageMismatch { .. } => "LanguageMismatch",
        other => panic!("unexpected error: {other}"),
    };
    assert_eq!(name, variant.as_str());
}

// ---------------------------------------------------------------------------
// Scenario bindings
// ---------------------------------------------------------------------------

#[scenario(path = "tests/features/tessel_rule.feature")]
fn tessel_rule_behaviour(world: TestWorld) {
    let _ = world;
}
