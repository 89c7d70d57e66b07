//! Snapshot tests for the `tessel-syntax` end-to-end suite.
//!
//! These tests use `insta` to validate stable, user-facing outputs.

use insta::assert_snapshot;

use tessel_syntax::{Pattern, Root, SupportedLanguage};

fn describe_matches(language: SupportedLanguage, source: &str, pattern: &str) -> String {
    let root = Root::parse(source, language).unwrap_or_else(|err| panic!("parse: {err}"));
    let compiled =
        Pattern::compile(pattern, language).unwrap_or_else(|err| panic!("pattern: {err}"));

    root.root()
        .find_all(&compiled)
        .iter()
        .map(|found| {
            let captures: Vec<String> = found
                .captures()
                .iter()
                .map(|(name, value)| format!("{name}={:?}", value.text()))
                .collect();
            let start = found.start_position();
            format!("{}:{}: {}", start.line, start.column, captures.join(" "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn snapshot_language_detection() {
    let extensions = ["rs", "py", "pyi", "ts", "tsx", "mjs", "htm", "css", "json"];
    let results: Vec<_> = extensions
        .iter()
        .map(|ext| {
            let lang = SupportedLanguage::from_extension(ext);
            format!("{ext}: {lang:?}")
        })
        .collect();

    assert_snapshot!(results.join("\n"), @r"
    rs: Some(Rust)
    py: Some(Python)
    pyi: Some(Python)
    ts: Some(TypeScript)
    tsx: Some(Tsx)
    mjs: Some(JavaScript)
    htm: Some(Html)
    css: Some(Css)
    json: None
    ");
}

#[test]
fn snapshot_function_captures() {
    let output = describe_matches(
        SupportedLanguage::JavaScript,
        "function greet(name) { console.log(name); }\nfunction other() {}",
        "function $NAME($$$ARGS) { $$$BODY }",
    );

    assert_snapshot!(output, @r#"
    1:1: ARGS="name" BODY="console.log(name);" NAME="greet"
    2:1: ARGS="" BODY="" NAME="other"
    "#);
}

#[test]
fn snapshot_call_arguments() {
    let output = describe_matches(
        SupportedLanguage::TypeScript,
        "emit('a', 1, 2);\nemit(\"b\");\nemit();",
        "emit($EVENT, $$$REST)",
    );

    assert_snapshot!(output, @r#"
    1:1: EVENT="'a'" REST="1, 2"
    "#);
}
