//! Tree-sitter powered structural code search.
//!
//! This crate provides the syntax layer of the tessel search engine:
//!
//! - **Parsing** via [`Parser`] into an owned, arena-backed [`Root`]
//! - **Navigation** over borrowed [`Node`] views (parents, children,
//!   siblings, grammar fields)
//! - **Pattern matching** via [`Pattern`] and the [`Matcher`] trait, with
//!   metavariable capture and unification
//!
//! # Supported Languages
//!
//! - HTML (`.html`, `.htm`)
//! - JavaScript (`.js`, `.mjs`, `.cjs`) and JSX (`.jsx`)
//! - TypeScript (`.ts`, `.mts`, `.cts`) and TSX (`.tsx`)
//! - CSS (`.css`)
//! - Rust (`.rs`)
//! - Python (`.py`, `.pyi`)
//!
//! # Pattern Language
//!
//! The pattern language is inspired by [ast-grep](https://ast-grep.github.io/)
//! and supports metavariables for capturing code elements:
//!
//! - `$VAR` - Matches any single named node and captures it
//! - `$_` - Matches any single named node without capturing (wildcard)
//! - `$$$VAR` - Matches zero or more sibling nodes
//!
//! # Example
//!
//! ```
//! use tessel_syntax::{Pattern, Root, SupportedLanguage};
//!
//! let root = Root::parse("if (ready) { start(1, 2); }", SupportedLanguage::JavaScript)?;
//! let pattern = Pattern::compile("start($$$ARGS)", SupportedLanguage::JavaScript)?;
//!
//! for found in root.root().find_all(&pattern) {
//!     let args: Vec<&str> = found
//!         .get_multiple_matches("ARGS")
//!         .iter()
//!         .map(|node| node.text())
//!         .collect();
//!     assert_eq!(args, ["1", "2"]);
//! }
//! # Ok::<(), tessel_syntax::SyntaxError>(())
//! ```

mod error;
mod language;
mod matcher;
mod metavariables;
mod navigation;
mod parser;
mod pattern;
mod position;
mod tree;

pub use error::{PatternError, SyntaxError};
pub use language::{LanguageParseError, SupportedLanguage};
pub use matcher::{
    CapturedNodes, CapturedValue, DetachedMatch, KindMatcher, MatchResult, Matcher, MetaVarEnv,
    OverlapPolicy,
};
pub use metavariables::{MetaVarKind, MetaVariable};
pub use navigation::{Ancestors, Children, Descendants};
pub use parser::{Parser, SyntaxErrorInfo};
pub use pattern::Pattern;
pub use position::{Position, Range};
pub use tree::{ANONYMOUS_FILENAME, Node, NodeId, Root, RootId};

#[cfg(test)]
mod tests;
