//! Decoded rule objects.
//!
//! These types mirror the rule documents callers hand to the engine after
//! decoding them from whatever file format they use. Keys are camelCase and
//! every key of [`SerializableRule`] is optional; several keys in one object
//! form an implicit conjunction.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use tessel_syntax::SupportedLanguage;

use crate::error::RuleError;
use crate::rule_core::RuleCore;
use crate::utils::GlobalRules;

/// Id given to rules built with [`RuleConfig::pattern`].
pub const PATTERN_RULE_ID: &str = "pattern";

/// A rule object as decoded from a rule document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializableRule {
    /// Structural pattern, plain or contextual.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<PatternStyle>,
    /// Node kind name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Regular expression tested against the node text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    /// Rule applied to the child under a grammar field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<Box<FieldRule>>,
    /// Some descendant must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has: Option<Box<Relation>>,
    /// Some ancestor must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inside: Option<Box<Relation>>,
    /// Some following sibling must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precedes: Option<Box<Relation>>,
    /// Some preceding sibling must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follows: Option<Box<Relation>>,
    /// Every sub-rule must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all: Option<Vec<SerializableRule>>,
    /// At least one sub-rule must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub any: Option<Vec<SerializableRule>>,
    /// The sub-rule must not match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<SerializableRule>>,
    /// Name of a utility rule that must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matches: Option<String>,
    /// Keys that name no predicate; compilation rejects them.
    #[serde(flatten)]
    pub unknown: BTreeMap<String, serde_json::Value>,
}

impl SerializableRule {
    /// Builds a rule holding only `pattern`.
    #[must_use]
    pub fn from_pattern(pattern: impl Into<String>) -> Self {
        Self {
            pattern: Some(PatternStyle::Str(pattern.into())),
            ..Self::default()
        }
    }

    /// Returns whether no predicate key is set. Unknown keys are not
    /// counted.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.pattern.is_none()
            && self.kind.is_none()
            && self.regex.is_none()
            && self.field.is_none()
            && self.has.is_none()
            && self.inside.is_none()
            && self.precedes.is_none()
            && self.follows.is_none()
            && self.all.is_none()
            && self.any.is_none()
            && self.not.is_none()
            && self.matches.is_none()
    }
}

/// The two spellings of a `pattern` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatternStyle {
    /// A bare pattern string.
    Str(String),
    /// A pattern parsed inside `context`, anchored on the first node of kind
    /// `selector`.
    Contextual {
        /// Surrounding code that makes the pattern parse.
        context: String,
        /// Kind of the node to anchor on.
        selector: String,
    },
}

/// A `field` entry: the child under grammar field `name` must exist and
/// match the flattened rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRule {
    /// Grammar field name.
    pub name: String,
    /// Rule the field child must satisfy.
    #[serde(flatten)]
    pub rule: SerializableRule,
}

/// A relational entry (`has`, `inside`, `precedes`, `follows`).
///
/// Inside a relation the `field` key names the grammar field the relation is
/// restricted to. A nested field rule can still be written under `all`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    /// Rule the related node must satisfy.
    #[serde(flatten)]
    pub rule: SerializableRule,
    /// How far the walk goes.
    #[serde(default)]
    pub stop_by: SerializableStopBy,
    /// Grammar field the relation is restricted to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl Relation {
    /// Builds a relation that walks to the end with no field restriction.
    #[must_use]
    pub fn new(rule: SerializableRule) -> Self {
        Self {
            rule,
            stop_by: SerializableStopBy::End,
            field: None,
        }
    }
}

/// Where a relational walk stops.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StopByRepr", into = "StopByRepr")]
pub enum SerializableStopBy {
    /// Only the immediate neighbour is considered.
    Neighbor,
    /// The walk continues to the end of the tree or sibling list.
    #[default]
    End,
    /// The walk ends at, and includes, the first node matching the rule.
    Rule(Box<SerializableRule>),
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum StopByRepr {
    Keyword(StopKeyword),
    Rule(Box<SerializableRule>),
}

#[derive(Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum StopKeyword {
    Neighbor,
    End,
}

impl From<StopByRepr> for SerializableStopBy {
    fn from(repr: StopByRepr) -> Self {
        match repr {
            StopByRepr::Keyword(StopKeyword::Neighbor) => Self::Neighbor,
            StopByRepr::Keyword(StopKeyword::End) => Self::End,
            StopByRepr::Rule(rule) => Self::Rule(rule),
        }
    }
}

impl From<SerializableStopBy> for StopByRepr {
    fn from(stop_by: SerializableStopBy) -> Self {
        match stop_by {
            SerializableStopBy::Neighbor => Self::Keyword(StopKeyword::Neighbor),
            SerializableStopBy::End => Self::Keyword(StopKeyword::End),
            SerializableStopBy::Rule(rule) => Self::Rule(rule),
        }
    }
}

/// A complete rule: the main rule plus its constraints and local utilities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleConfig {
    /// Identifier reported with every match.
    pub id: String,
    /// Language the rule is compiled for.
    pub language: SupportedLanguage,
    /// The main rule.
    pub rule: SerializableRule,
    /// Extra filters on metavariables bound by the main rule.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub constraints: BTreeMap<String, SerializableRule>,
    /// Utility rules visible only to this rule.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub utils: BTreeMap<String, SerializableRule>,
}

impl RuleConfig {
    /// Builds the rule form of a bare pattern.
    #[must_use]
    pub fn pattern(language: SupportedLanguage, pattern: impl Into<String>) -> Self {
        Self {
            id: PATTERN_RULE_ID.to_owned(),
            language,
            rule: SerializableRule::from_pattern(pattern),
            constraints: BTreeMap::new(),
            utils: BTreeMap::new(),
        }
    }

    /// Compiles this rule without global utilities.
    ///
    /// # Errors
    ///
    /// Returns a [`RuleError`] describing the first part of the rule that
    /// failed to compile.
    pub fn compile(&self) -> Result<RuleCore, RuleError> {
        RuleCore::try_new(self, &GlobalRules::default())
    }
}
