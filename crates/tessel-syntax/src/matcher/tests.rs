use super::*;

use rstest::rstest;

use crate::language::SupportedLanguage;
use crate::parser::Parser;

fn parse(source: &str, language: SupportedLanguage) -> Root {
    Parser::new(language)
        .expect("parser")
        .parse(source)
        .expect("parse")
}

fn pattern(source: &str, language: SupportedLanguage) -> Pattern {
    Pattern::compile(source, language).expect("pattern")
}

fn texts<'r>(matches: &[MatchResult<'r>]) -> Vec<&'r str> {
    matches.iter().map(MatchResult::text).collect()
}

#[test]
fn find_literal_pattern() {
    let root = parse("foo(); bar(); foo();", SupportedLanguage::JavaScript);
    let matches = root
        .root()
        .find_all(&pattern("foo()", SupportedLanguage::JavaScript));
    assert_eq!(texts(&matches), vec!["foo()", "foo()"]);
}

#[rstest]
#[case(SupportedLanguage::JavaScript, "console.log(message)", "console.log($MSG)", "message")]
#[case(SupportedLanguage::Python, "print(total)", "print($MSG)", "total")]
#[case(SupportedLanguage::Rust, "fn main() { let count = 1; }", "let $MSG = 1;", "count")]
#[case(SupportedLanguage::Tsx, "const el = <Button onClick={handle} />;", "<Button onClick={$MSG} />", "handle")]
#[case(SupportedLanguage::Html, "<ul><li>one</li></ul>", "<li>$MSG</li>", "one")]
#[case(SupportedLanguage::Css, "a { color: red; }", "color: $MSG;", "red")]
fn capture_metavariable_text(
    #[case] language: SupportedLanguage,
    #[case] source: &str,
    #[case] query: &str,
    #[case] expected: &str,
) {
    let root = parse(source, language);
    let found = root
        .root()
        .find(&pattern(query, language))
        .expect("should find a match");
    assert_eq!(found.capture("MSG").map(CapturedValue::text), Some(expected));
}

#[rstest]
#[case("a == a", true)]
#[case("a == b", false)]
#[case("f(x) == f( x )", true)]
#[case("f(x) == f(y)", false)]
fn repeated_metavariables_unify(#[case] source: &str, #[case] expected: bool) {
    let root = parse(source, SupportedLanguage::JavaScript);
    let query = pattern("$X == $X", SupportedLanguage::JavaScript);
    assert_eq!(root.root().find(&query).is_some(), expected);
}

#[test]
fn variadic_takes_every_argument() {
    let root = parse("foo(1, 2, 3)", SupportedLanguage::JavaScript);
    let found = root
        .root()
        .find(&pattern("foo($$$ARGS)", SupportedLanguage::JavaScript))
        .expect("match");

    let args: Vec<&str> = found
        .get_multiple_matches("ARGS")
        .iter()
        .map(Node::text)
        .collect();
    assert_eq!(args, vec!["1", "2", "3"]);
    assert_eq!(found.capture("ARGS").map(CapturedValue::text), Some("1, 2, 3"));
}

#[test]
fn variadic_may_be_empty() {
    let root = parse("foo()", SupportedLanguage::JavaScript);
    let found = root
        .root()
        .find(&pattern("foo($$$ARGS)", SupportedLanguage::JavaScript))
        .expect("match");

    assert!(found.get_multiple_matches("ARGS").is_empty());
    let capture = found.capture("ARGS").expect("empty run is still bound");
    assert_eq!(capture.text(), "");
    assert_eq!(capture.byte_range(), 4..4);
}

#[test]
fn variadic_leaves_room_for_following_pattern() {
    let root = parse("foo(1, 2, 3)", SupportedLanguage::JavaScript);
    let found = root
        .root()
        .find(&pattern("foo($$$HEAD, $LAST)", SupportedLanguage::JavaScript))
        .expect("match");

    let head: Vec<&str> = found
        .get_multiple_matches("HEAD")
        .iter()
        .map(Node::text)
        .collect();
    assert_eq!(head, vec!["1", "2"]);
    assert_eq!(found.get_match("LAST").map(|node| node.text()), Some("3"));
}

#[rstest]
#[case("f()", false)]
#[case("f(a)", true)]
#[case("f(a,)", true)]
#[case("f(a, b)", false)]
#[case("f(/* note */ a)", true)]
fn single_metavariable_binds_one_named_node(#[case] source: &str, #[case] expected: bool) {
    let root = parse(source, SupportedLanguage::JavaScript);
    let query = pattern("f($A)", SupportedLanguage::JavaScript);
    assert_eq!(root.root().find(&query).is_some(), expected);
}

#[test]
fn anonymous_variadic_binds_nothing() {
    let root = parse("if (ready) { start(); stop(); }", SupportedLanguage::JavaScript);
    let found = root
        .root()
        .find(&pattern("if ($_) { $$$ }", SupportedLanguage::JavaScript))
        .expect("match");
    assert!(found.captures().is_empty());
}

#[rstest]
#[case(SupportedLanguage::Jsx)]
#[case(SupportedLanguage::TypeScript)]
#[case(SupportedLanguage::Tsx)]
fn matchers_ignore_other_languages(#[case] other: SupportedLanguage) {
    let root = parse("foo()", other);
    let query = pattern("foo()", SupportedLanguage::JavaScript);
    assert!(root.root().find_all(&query).is_empty());

    let kind = KindMatcher::new("call_expression", SupportedLanguage::JavaScript).expect("kind");
    assert!(root.root().find(&kind).is_none());
}

#[test]
fn matching_twice_is_idempotent() {
    let root = parse("sum(a, b)", SupportedLanguage::JavaScript);
    let query = pattern("sum($$$ARGS)", SupportedLanguage::JavaScript);
    let node = root.root().find(&query).expect("match").node();
    assert_eq!(query.match_node(node), query.match_node(node));
}

#[test]
fn failed_match_leaves_environment_untouched() {
    let root = parse("b; a == c;", SupportedLanguage::JavaScript);
    let b = root
        .root()
        .descendants()
        .find(|node| node.kind() == "identifier" && node.text() == "b")
        .expect("identifier");
    let comparison = root
        .root()
        .descendants()
        .find(|node| node.kind() == "binary_expression")
        .expect("comparison");

    let mut env = MetaVarEnv::new();
    assert!(env.insert_single("X", b));
    let query = pattern("$X == $Y", SupportedLanguage::JavaScript);
    assert!(!query.match_node_with_env(comparison, &mut env));
    assert_eq!(env.len(), 1);
    assert!(env.get("Y").is_none());
}

#[rstest]
#[case(OverlapPolicy::All, vec!["f(f(1))", "f(1)"])]
#[case(OverlapPolicy::Outermost, vec!["f(f(1))"])]
fn overlap_policy_controls_nested_matches(
    #[case] policy: OverlapPolicy,
    #[case] expected: Vec<&str>,
) {
    let root = parse("f(f(1))", SupportedLanguage::JavaScript);
    let query = pattern("f($A)", SupportedLanguage::JavaScript);
    let matches = root.root().find_all_with(&query, policy);
    assert_eq!(texts(&matches), expected);
}

#[test]
fn detached_matches_reattach_only_to_their_root() {
    let root = parse("foo(1, 2)", SupportedLanguage::JavaScript);
    let query = pattern("foo($A, $$$REST)", SupportedLanguage::JavaScript);
    let found = root.root().find(&query).expect("match");

    let detached = found.detach();
    assert_eq!(detached.attach(&root), Some(found));

    let other = parse("foo(1, 2)", SupportedLanguage::JavaScript);
    assert!(detached.attach(&other).is_none());
}

#[test]
fn kind_matcher_rejects_unknown_kinds() {
    let err = KindMatcher::new("no_such_kind", SupportedLanguage::Css).expect_err("unknown");
    assert!(matches!(err, SyntaxError::UnknownKind { .. }));
}

#[test]
fn relational_queries_follow_tree_shape() {
    let root = parse(
        "function run() { if (cond) { foo(); } bar(); }",
        SupportedLanguage::JavaScript,
    );
    let call = root
        .root()
        .find(&pattern("foo()", SupportedLanguage::JavaScript))
        .expect("call")
        .node();

    assert!(call.inside(&pattern("if ($_) { $$$ }", SupportedLanguage::JavaScript)));
    assert!(!call.inside(&pattern("while ($_) { $$$ }", SupportedLanguage::JavaScript)));

    let if_statement = root
        .root()
        .find(&KindMatcher::new("if_statement", SupportedLanguage::JavaScript).expect("kind"))
        .expect("if")
        .node();
    assert!(if_statement.has(&pattern("foo()", SupportedLanguage::JavaScript)));
    assert!(if_statement.precedes(&pattern("bar();", SupportedLanguage::JavaScript)));
    assert!(!if_statement.follows(&pattern("bar();", SupportedLanguage::JavaScript)));
}

#[test]
fn boxed_and_shared_matchers_delegate() {
    let root = parse("foo()", SupportedLanguage::JavaScript);
    let boxed: Box<dyn Matcher> = Box::new(pattern("foo()", SupportedLanguage::JavaScript));
    let shared = Arc::new(pattern("foo()", SupportedLanguage::JavaScript));
    assert!(root.root().find(&boxed).is_some());
    assert!(root.root().find(&shared).is_some());
}
