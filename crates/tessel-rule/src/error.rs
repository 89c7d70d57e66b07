//! Error types for rule compilation.

use thiserror::Error;

use tessel_syntax::{SupportedLanguage, SyntaxError};

/// Errors raised while compiling a rule or a utility table.
///
/// Every variant is reported before any matching starts; a compiled rule
/// never fails at match time.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RuleError {
    /// A `pattern` entry failed to compile.
    #[error("invalid pattern `{pattern}`")]
    InvalidPattern {
        /// The pattern text as written in the rule.
        pattern: String,
        /// The underlying compile failure.
        #[source]
        source: SyntaxError,
    },

    /// A `kind` entry names no node kind of the rule's language.
    #[error("unknown node kind `{kind}` for {language}")]
    UnknownKind {
        /// The rule's language.
        language: SupportedLanguage,
        /// The kind name that was looked up.
        kind: String,
    },

    /// A `regex` entry is not a valid regular expression.
    #[error("invalid regex `{regex}`")]
    InvalidRegex {
        /// The expression as written in the rule.
        regex: String,
        /// The parser's complaint.
        #[source]
        source: regex::Error,
    },

    /// A rule object has a key that names no predicate.
    #[error("unknown rule key `{key}`")]
    UnknownKey {
        /// The key as written.
        key: String,
    },

    /// A rule object has no keys at all.
    #[error("rule must contain at least one key")]
    EmptyRule,

    /// `matches` refers to a utility that is defined nowhere.
    #[error("undefined utility rule `{name}`")]
    UndefinedUtil {
        /// The referenced name.
        name: String,
    },

    /// Utilities reference each other in a cycle.
    #[error("utility rules form a cycle: {}", cycle.join(" -> "))]
    CyclicUtil {
        /// The names along the cycle, ending with the repeated name.
        cycle: Vec<String>,
    },

    /// A utility's own rule failed to compile.
    #[error("invalid utility rule `{name}`")]
    InvalidUtil {
        /// The utility name.
        name: String,
        /// Why the utility was rejected.
        #[source]
        source: Box<RuleError>,
    },

    /// A constraint's rule failed to compile.
    #[error("invalid constraint on `{name}`")]
    InvalidConstraint {
        /// The constrained metavariable.
        name: String,
        /// Why the constraint was rejected.
        #[source]
        source: Box<RuleError>,
    },

    /// The rule targets a different language than its global utilities.
    #[error("rule language {rule} does not match global utilities language {global}")]
    LanguageMismatch {
        /// The rule's language.
        rule: SupportedLanguage,
        /// The language the global utilities were compiled for.
        global: SupportedLanguage,
    },
}

impl RuleError {
    /// Wraps a pattern compile failure.
    #[must_use]
    pub fn invalid_pattern(pattern: impl Into<String>, source: SyntaxError) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            source,
        }
    }

    /// Wraps a utility compile failure, keeping cycle and lookup errors
    /// unwrapped so they stay easy to match on.
    #[must_use]
    pub fn invalid_util(name: impl Into<String>, source: Self) -> Self {
        match source {
            Self::CyclicUtil { .. } | Self::UndefinedUtil { .. } | Self::InvalidUtil { .. } => {
                source
            }
            other => Self::InvalidUtil {
                name: name.into(),
                source: Box::new(other),
            },
        }
    }

    /// Wraps a constraint compile failure.
    #[must_use]
    pub fn invalid_constraint(name: impl Into<String>, source: Self) -> Self {
        Self::InvalidConstraint {
            name: name.into(),
            source: Box::new(source),
        }
    }
}
