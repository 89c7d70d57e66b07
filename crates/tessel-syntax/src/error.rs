//! Error types for syntax tree and pattern operations.
//!
//! This module provides structured error types for all operations in the
//! `tessel-syntax` crate, including parser setup, parsing and pattern
//! compilation.

use std::path::PathBuf;

use thiserror::Error;

use crate::language::SupportedLanguage;

/// Errors from syntax tree and pattern operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SyntaxError {
    /// Failed to initialise the Tree-sitter parser for a language.
    #[error("failed to initialise parser for {language}: {message}")]
    ParserInitError {
        /// The language that failed to initialise.
        language: SupportedLanguage,
        /// Description of the failure.
        message: String,
    },

    /// Failed to determine language from file path.
    #[error("could not determine language for path: {}", path.display())]
    UnknownLanguage {
        /// The path that could not be mapped to a language.
        path: PathBuf,
    },

    /// The grammar engine produced no tree at all.
    #[error("failed to parse {language}: {message}")]
    ParseError {
        /// The language that failed to parse.
        language: SupportedLanguage,
        /// Description of the failure.
        message: String,
    },

    /// Pattern compilation failed.
    #[error("invalid pattern `{pattern}` for {language}: {reason}")]
    PatternCompileError {
        /// The language the pattern was compiled for.
        language: SupportedLanguage,
        /// The pattern source as written by the caller.
        pattern: String,
        /// Why the pattern was rejected.
        #[source]
        reason: PatternError,
    },

    /// A node kind name is not part of the language's grammar.
    #[error("unknown node kind `{kind}` for {language}")]
    UnknownKind {
        /// The language whose grammar was consulted.
        language: SupportedLanguage,
        /// The kind name that was looked up.
        kind: String,
    },

    /// Pattern contains invalid metavariable syntax.
    #[error("invalid metavariable syntax: {message}")]
    InvalidMetavariable {
        /// Description of the metavariable error.
        message: String,
    },

    /// A tree violated a node model invariant.
    #[error("internal error: {message}")]
    InternalError {
        /// Description of the internal error.
        message: String,
    },
}

/// Reasons a pattern fails to compile.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PatternError {
    /// The pattern still has syntax errors after wrapping.
    #[error("pattern contains syntax errors")]
    SyntaxErrors,
    /// The pattern parsed to an empty tree.
    #[error("no syntax node found in pattern")]
    NoContent,
    /// The pattern has more than one top-level node.
    #[error("pattern has multiple top-level nodes")]
    MultipleNodes,
    /// The selector of a contextual pattern is not a kind of the grammar.
    #[error("unknown selector kind `{selector}`")]
    UnknownSelector {
        /// The selector kind name.
        selector: String,
    },
    /// The selector of a contextual pattern matched nothing in its context.
    #[error("selector `{selector}` matches no node in the context")]
    NoSelectorInContext {
        /// The selector kind name.
        selector: String,
    },
}

impl SyntaxError {
    /// Creates a parser initialisation error.
    #[must_use]
    pub fn parser_init(language: SupportedLanguage, message: impl Into<String>) -> Self {
        Self::ParserInitError {
            language,
            message: message.into(),
        }
    }

    /// Creates an unknown language error.
    #[must_use]
    pub const fn unknown_language(path: PathBuf) -> Self {
        Self::UnknownLanguage { path }
    }

    /// Creates a parse error.
    #[must_use]
    pub fn parse(language: SupportedLanguage, message: impl Into<String>) -> Self {
        Self::ParseError {
            language,
            message: message.into(),
        }
    }

    /// Creates a pattern compilation error.
    #[must_use]
    pub fn pattern_compile(
        language: SupportedLanguage,
        pattern: impl Into<String>,
        reason: PatternError,
    ) -> Self {
        Self::PatternCompileError {
            language,
            pattern: pattern.into(),
            reason,
        }
    }

    /// Creates an unknown kind error.
    #[must_use]
    pub fn unknown_kind(language: SupportedLanguage, kind: impl Into<String>) -> Self {
        Self::UnknownKind {
            language,
            kind: kind.into(),
        }
    }

    /// Creates an invalid metavariable error.
    #[must_use]
    pub fn invalid_metavariable(message: impl Into<String>) -> Self {
        Self::InvalidMetavariable {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }

    /// Returns whether this error means no grammar could be set up at all.
    ///
    /// Such errors abort a whole batch, while the others only concern the
    /// input at hand.
    #[must_use]
    pub const fn is_setup_failure(&self) -> bool {
        matches!(self, Self::ParserInitError { .. })
    }
}
