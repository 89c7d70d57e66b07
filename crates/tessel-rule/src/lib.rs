//! Structured rules for the tessel search engine.
//!
//! A rule combines atomic predicates (`pattern`, `kind`, `regex`) with
//! structural relations (`has`, `inside`, `precedes`, `follows`), grammar
//! field access and the logical combinators `all`, `any` and `not`. Rules
//! arrive already decoded as [`RuleConfig`] values and compile into a
//! [`RuleCore`], which implements [`tessel_syntax::Matcher`] and can be used
//! anywhere a pattern can.
//!
//! # Semantics
//!
//! - `all` matches when every sub-rule matches the same node; bindings from
//!   all sub-rules are merged and must agree on shared names.
//! - `any` matches on the first sub-rule that matches and keeps only that
//!   sub-rule's bindings.
//! - `not` matches when its sub-rule fails and never binds anything.
//! - Constraints filter metavariables bound by the main rule; unbound names
//!   are skipped.
//! - Utilities are named sub-rules reached through `matches`. Local
//!   utilities shadow [`GlobalRules`]; cycles are compile errors.
//!
//! # Example
//!
//! ```
//! use tessel_rule::{RuleConfig, SerializableRule, Relation};
//! use tessel_syntax::{Root, SupportedLanguage};
//!
//! let mut config = RuleConfig::pattern(SupportedLanguage::JavaScript, "foo()");
//! config.rule.inside = Some(Box::new(Relation::new(SerializableRule::from_pattern(
//!     "if ($_) { $$$ }",
//! ))));
//! let rule = config.compile()?;
//!
//! let root = Root::parse("if (cond) { foo(); } foo();", SupportedLanguage::JavaScript)?;
//! assert_eq!(root.root().find_all(&rule).len(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod config;
mod error;
mod relation;
mod rule;
mod rule_core;
mod utils;

pub use config::{
    FieldRule, PATTERN_RULE_ID, PatternStyle, Relation, RuleConfig, SerializableRule,
    SerializableStopBy,
};
pub use error::RuleError;
pub use rule_core::RuleCore;
pub use utils::GlobalRules;

#[cfg(test)]
mod tests;
