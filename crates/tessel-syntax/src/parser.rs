//! Tree-sitter parsing wrapper with error recovery.
//!
//! [`Parser`] is the adapter between a grammar and the node model: it runs
//! the Tree-sitter parser and hands the resulting tree to [`Root`], which
//! flattens it into its own arena. Tree-sitter is error-tolerant, so source
//! with syntax errors still produces a navigable tree.

use std::ops::Range;
use std::path::Path;

use crate::error::SyntaxError;
use crate::language::SupportedLanguage;
use crate::tree::{ANONYMOUS_FILENAME, Node, Root};

const CONTEXT_LIMIT: usize = 50;

/// Information about a syntax error found during parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxErrorInfo {
    /// Byte range of the error in the source.
    pub byte_range: Range<usize>,
    /// Line number (one-based) where the error starts.
    pub line: u32,
    /// Column number (one-based) where the error starts.
    pub column: u32,
    /// A snippet of the problematic source text.
    pub context: String,
    /// Human-readable description of the error.
    pub message: String,
}

impl SyntaxErrorInfo {
    pub(crate) fn from_node(node: Node<'_>) -> Self {
        let text = node.text();
        let context = if text.len() > CONTEXT_LIMIT {
            let truncated: String = text.chars().take(CONTEXT_LIMIT - 3).collect();
            format!("{truncated}...")
        } else {
            text.to_owned()
        };

        let message = if node.is_missing() {
            format!("missing {}", node.kind())
        } else {
            "syntax error".to_owned()
        };

        let start = node.start_position();
        Self {
            byte_range: node.byte_range(),
            line: start.line,
            column: start.column,
            context,
            message,
        }
    }
}

/// Tree-sitter parser wrapper for a specific language.
///
/// Each parser instance is configured for a single language and can be
/// reused for any number of sources.
pub struct Parser {
    inner: tree_sitter::Parser,
    language: SupportedLanguage,
}

impl Parser {
    /// Creates a new parser for the given language.
    ///
    /// # Errors
    ///
    /// Returns an error if the Tree-sitter parser cannot be initialised
    /// with the language grammar.
    pub fn new(language: SupportedLanguage) -> Result<Self, SyntaxError> {
        let mut inner = tree_sitter::Parser::new();
        inner
            .set_language(&language.tree_sitter_language())
            .map_err(|e| SyntaxError::parser_init(language, e.to_string()))?;

        Ok(Self { inner, language })
    }

    /// Creates a parser for the language implied by `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError::UnknownLanguage`] when the extension is not
    /// recognised, or a parser initialisation error.
    pub fn for_path(path: &Path) -> Result<Self, SyntaxError> {
        let language = SupportedLanguage::from_path(path)
            .ok_or_else(|| SyntaxError::unknown_language(path.to_path_buf()))?;
        Self::new(language)
    }

    /// Returns the language this parser is configured for.
    #[must_use]
    pub const fn language(&self) -> SupportedLanguage {
        self.language
    }

    /// Parses in-memory source code.
    ///
    /// # Errors
    ///
    /// Returns an error if the parser fails to produce a syntax tree, which
    /// only happens when the parser itself is misconfigured.
    pub fn parse(&mut self, source: &str) -> Result<Root, SyntaxError> {
        self.parse_file(source, ANONYMOUS_FILENAME)
    }

    /// Parses source code and records `filename` on the resulting root.
    ///
    /// # Errors
    ///
    /// See [`Parser::parse`].
    pub fn parse_file(&mut self, source: &str, filename: &str) -> Result<Root, SyntaxError> {
        let tree = self
            .inner
            .parse(source, None)
            .ok_or_else(|| SyntaxError::parse(self.language, "parsing failed"))?;

        Root::from_tree(&tree, source.to_owned(), self.language, filename.to_owned())
    }
}

impl std::fmt::Debug for Parser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("language", &self.language)
            .finish_non_exhaustive()
    }
}
