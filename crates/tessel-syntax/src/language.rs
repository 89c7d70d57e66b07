//! Language detection and Tree-sitter grammar selection.
//!
//! This module provides the [`SupportedLanguage`] enum for identifying
//! languages and mapping them to their Tree-sitter grammars and node-kind
//! tables.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Languages supported for structural search.
///
/// Each variant is a distinct language tag. Two tags may share a grammar
/// (`JavaScript` and `Jsx`), but trees and matchers never mix across tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SupportedLanguage {
    /// HTML markup (`.html`, `.htm`).
    Html,
    /// JavaScript (`.js`, `.mjs`, `.cjs`).
    JavaScript,
    /// JavaScript with embedded markup (`.jsx`).
    Jsx,
    /// TypeScript (`.ts`, `.mts`, `.cts`).
    TypeScript,
    /// TypeScript with embedded markup (`.tsx`).
    #[default]
    Tsx,
    /// Cascading style sheets (`.css`).
    Css,
    /// Rust source files (`.rs`).
    Rust,
    /// Python source files (`.py`, `.pyi`).
    Python,
}

impl SupportedLanguage {
    /// Detects the language from a file extension.
    ///
    /// Returns `None` if the extension is not recognised.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        let normalised = ext.to_ascii_lowercase();
        match normalised.as_str() {
            "html" | "htm" => Some(Self::Html),
            "js" | "mjs" | "cjs" => Some(Self::JavaScript),
            "jsx" => Some(Self::Jsx),
            "ts" | "mts" | "cts" => Some(Self::TypeScript),
            "tsx" => Some(Self::Tsx),
            "css" => Some(Self::Css),
            "rs" => Some(Self::Rust),
            "py" | "pyi" => Some(Self::Python),
            _ => None,
        }
    }

    /// Detects the language from a file path by examining its extension.
    ///
    /// Returns `None` if the path has no extension or the extension is not
    /// recognised.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Returns the Tree-sitter language grammar for this language.
    #[must_use]
    pub fn tree_sitter_language(self) -> tree_sitter::Language {
        match self {
            Self::Html => tree_sitter_html::LANGUAGE.into(),
            // The JavaScript grammar parses JSX natively.
            Self::JavaScript | Self::Jsx => tree_sitter_javascript::LANGUAGE.into(),
            Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Self::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            Self::Css => tree_sitter_css::LANGUAGE.into(),
            Self::Rust => tree_sitter_rust::LANGUAGE.into(),
            Self::Python => tree_sitter_python::LANGUAGE.into(),
        }
    }

    /// Looks up the grammar id of a named node kind.
    ///
    /// Returns `None` when the grammar has no named kind called `name`.
    #[must_use]
    pub fn kind_id(self, name: &str) -> Option<u16> {
        let id = self.tree_sitter_language().id_for_node_kind(name, true);
        (id != 0).then_some(id)
    }

    /// Returns the kind name for a grammar id.
    #[must_use]
    pub fn kind_name(self, id: u16) -> Option<&'static str> {
        self.tree_sitter_language().node_kind_for_id(id)
    }

    /// Returns the lower-case identifier for this language.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::JavaScript => "javascript",
            Self::Jsx => "jsx",
            Self::TypeScript => "typescript",
            Self::Tsx => "tsx",
            Self::Css => "css",
            Self::Rust => "rust",
            Self::Python => "python",
        }
    }

    /// Returns all supported languages.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Html,
            Self::JavaScript,
            Self::Jsx,
            Self::TypeScript,
            Self::Tsx,
            Self::Css,
            Self::Rust,
            Self::Python,
        ]
    }
}

impl fmt::Display for SupportedLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised when parsing a language identifier fails.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unsupported language: '{0}'")]
pub struct LanguageParseError(String);

impl LanguageParseError {
    /// Returns the input that failed to parse.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.0
    }
}

impl FromStr for SupportedLanguage {
    type Err = LanguageParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let normalised = input.trim().to_ascii_lowercase();
        match normalised.as_str() {
            "html" => Ok(Self::Html),
            "javascript" | "js" => Ok(Self::JavaScript),
            "jsx" => Ok(Self::Jsx),
            "typescript" | "ts" => Ok(Self::TypeScript),
            "tsx" => Ok(Self::Tsx),
            "css" => Ok(Self::Css),
            "rust" | "rs" => Ok(Self::Rust),
            "python" | "py" => Ok(Self::Python),
            other => Err(LanguageParseError(other.to_owned())),
        }
    }
}

impl TryFrom<String> for SupportedLanguage {
    type Error = LanguageParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SupportedLanguage> for String {
    fn from(language: SupportedLanguage) -> Self {
        language.as_str().to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("html", SupportedLanguage::Html)]
    #[case("htm", SupportedLanguage::Html)]
    #[case("js", SupportedLanguage::JavaScript)]
    #[case("mjs", SupportedLanguage::JavaScript)]
    #[case("jsx", SupportedLanguage::Jsx)]
    #[case("ts", SupportedLanguage::TypeScript)]
    #[case("cts", SupportedLanguage::TypeScript)]
    #[case("tsx", SupportedLanguage::Tsx)]
    #[case("css", SupportedLanguage::Css)]
    #[case("rs", SupportedLanguage::Rust)]
    #[case("pyi", SupportedLanguage::Python)]
    fn from_extension_recognises_supported_languages(
        #[case] ext: &str,
        #[case] expected: SupportedLanguage,
    ) {
        assert_eq!(SupportedLanguage::from_extension(ext), Some(expected));
    }

    #[rstest]
    #[case("json")]
    #[case("md")]
    fn from_extension_returns_none_for_unknown(#[case] ext: &str) {
        assert_eq!(SupportedLanguage::from_extension(ext), None);
    }

    #[rstest]
    #[case("src/App.TSX", SupportedLanguage::Tsx)]
    #[case("static/site.css", SupportedLanguage::Css)]
    fn from_path_extracts_extension(#[case] path_str: &str, #[case] expected: SupportedLanguage) {
        assert_eq!(
            SupportedLanguage::from_path(Path::new(path_str)),
            Some(expected)
        );
    }

    #[test]
    fn from_path_returns_none_for_no_extension() {
        assert_eq!(SupportedLanguage::from_path(Path::new("Makefile")), None);
    }

    #[rstest]
    #[case("JavaScript", SupportedLanguage::JavaScript)]
    #[case("ts", SupportedLanguage::TypeScript)]
    #[case(" HTML ", SupportedLanguage::Html)]
    fn from_str_parses_language_names(#[case] input: &str, #[case] expected: SupportedLanguage) {
        assert_eq!(SupportedLanguage::from_str(input), Ok(expected));
    }

    #[test]
    fn from_str_returns_error_for_unknown() {
        let result: Result<SupportedLanguage, _> = "ocaml".parse();
        assert_eq!(result.map_err(|err| err.input().to_owned()), Err("ocaml".to_owned()));
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for language in SupportedLanguage::all() {
            assert_eq!(language.to_string().parse::<SupportedLanguage>(), Ok(*language));
        }
    }

    #[test]
    fn serde_uses_lower_case_names() {
        let json = serde_json::to_string(&SupportedLanguage::TypeScript).expect("serialize");
        assert_eq!(json, "\"typescript\"");
        let parsed: SupportedLanguage = serde_json::from_str("\"Tsx\"").expect("deserialize");
        assert_eq!(parsed, SupportedLanguage::Tsx);
    }

    #[rstest]
    #[case(SupportedLanguage::JavaScript, "call_expression")]
    #[case(SupportedLanguage::Css, "declaration")]
    #[case(SupportedLanguage::Html, "element")]
    fn kind_id_resolves_known_kinds(#[case] language: SupportedLanguage, #[case] kind: &str) {
        let id = language.kind_id(kind).expect("kind should exist");
        assert_eq!(language.kind_name(id), Some(kind));
    }

    #[test]
    fn kind_id_rejects_unknown_kinds() {
        assert_eq!(SupportedLanguage::Tsx.kind_id("no_such_kind"), None);
    }
}
