//! Compiled predicate tree and its evaluation.
//!
//! [`Rule`] is the executable form of a [`SerializableRule`]. Evaluation is
//! a recursive descent over the variants. Every variant honours the
//! [`Matcher`] contract: on failure the environment is left unchanged.

use std::sync::Arc;

use regex::Regex;

use tessel_syntax::{KindMatcher, Matcher, MetaVarEnv, Node, Pattern, SupportedLanguage};

use crate::config::{PatternStyle, SerializableRule};
use crate::error::RuleError;
use crate::relation::{RelationKind, Relational};
use crate::utils::UtilResolver;

/// A compiled rule.
#[derive(Debug)]
pub(crate) enum Rule {
    Pattern(Pattern),
    Kind(KindMatcher),
    Regex(Regex),
    Field { name: String, rule: Box<Rule> },
    Relational(Box<Relational>),
    All(Vec<Rule>),
    Any(Vec<Rule>),
    Not(Box<Rule>),
    Matches(Arc<Rule>),
}

impl Matcher for Rule {
    fn match_node_with_env<'r>(&self, node: Node<'r>, env: &mut MetaVarEnv<'r>) -> bool {
        match self {
            Self::Pattern(pattern) => pattern.match_node_with_env(node, env),
            Self::Kind(kind) => kind.match_node_with_env(node, env),
            Self::Regex(regex) => regex.is_match(node.text()),
            Self::Field { name, rule } => node
                .field(name)
                .is_some_and(|child| rule.match_node_with_env(child, env)),
            Self::Relational(relational) => relational.match_node_with_env(node, env),
            Self::All(rules) => {
                let mut trial = env.clone();
                let matched = rules
                    .iter()
                    .all(|rule| rule.match_node_with_env(node, &mut trial));
                if matched {
                    *env = trial;
                }
                matched
            }
            Self::Any(rules) => rules
                .iter()
                .any(|rule| rule.match_node_with_env(node, env)),
            Self::Not(rule) => {
                let mut scratch = env.clone();
                !rule.match_node_with_env(node, &mut scratch)
            }
            Self::Matches(util) => util.match_node_with_env(node, env),
        }
    }
}

/// Compiles rule objects for one language against a utility resolver.
pub(crate) struct RuleCompiler<'a, 'u> {
    language: SupportedLanguage,
    utils: &'a mut UtilResolver<'u>,
}

impl<'a, 'u> RuleCompiler<'a, 'u> {
    pub(crate) const fn new(language: SupportedLanguage, utils: &'a mut UtilResolver<'u>) -> Self {
        Self { language, utils }
    }

    /// Compiles `rule`. Several keys become an implicit `all`, ordered atomic
    /// keys first, then `field`, relational keys and composite keys.
    pub(crate) fn compile(&mut self, rule: &SerializableRule) -> Result<Rule, RuleError> {
        if let Some(key) = rule.unknown.keys().next() {
            return Err(RuleError::UnknownKey { key: key.clone() });
        }
        let mut parts = Vec::new();

        if let Some(pattern) = &rule.pattern {
            parts.push(self.compile_pattern(pattern)?);
        }
        if let Some(kind) = &rule.kind {
            let matcher = KindMatcher::new(kind, self.language).map_err(|_| {
                RuleError::UnknownKind {
                    language: self.language,
                    kind: kind.clone(),
                }
            })?;
            parts.push(Rule::Kind(matcher));
        }
        if let Some(regex) = &rule.regex {
            let compiled = Regex::new(regex).map_err(|source| RuleError::InvalidRegex {
                regex: regex.clone(),
                source,
            })?;
            parts.push(Rule::Regex(compiled));
        }
        if let Some(field) = &rule.field {
            parts.push(Rule::Field {
                name: field.name.clone(),
                rule: Box::new(self.compile(&field.rule)?),
            });
        }
        self.compile_relations(rule, &mut parts)?;
        if let Some(all) = &rule.all {
            parts.push(Rule::All(self.compile_each(all)?));
        }
        if let Some(any) = &rule.any {
            parts.push(Rule::Any(self.compile_each(any)?));
        }
        if let Some(not) = &rule.not {
            parts.push(Rule::Not(Box::new(self.compile(not)?)));
        }
        if let Some(name) = &rule.matches {
            parts.push(Rule::Matches(self.utils.resolve(name, self.language)?));
        }

        if parts.len() > 1 {
            return Ok(Rule::All(parts));
        }
        parts.pop().ok_or(RuleError::EmptyRule)
    }

    fn compile_each(&mut self, rules: &[SerializableRule]) -> Result<Vec<Rule>, RuleError> {
        rules.iter().map(|rule| self.compile(rule)).collect()
    }

    fn compile_relations(
        &mut self,
        rule: &SerializableRule,
        parts: &mut Vec<Rule>,
    ) -> Result<(), RuleError> {
        let relations = [
            (RelationKind::Has, &rule.has),
            (RelationKind::Inside, &rule.inside),
            (RelationKind::Precedes, &rule.precedes),
            (RelationKind::Follows, &rule.follows),
        ];
        for (kind, relation) in relations {
            if let Some(relation) = relation {
                let compiled = Relational::compile(kind, relation, self)?;
                parts.push(Rule::Relational(Box::new(compiled)));
            }
        }
        Ok(())
    }

    fn compile_pattern(&self, pattern: &PatternStyle) -> Result<Rule, RuleError> {
        let compiled = match pattern {
            PatternStyle::Str(text) => Pattern::compile(text, self.language)
                .map_err(|err| RuleError::invalid_pattern(text.as_str(), err)),
            PatternStyle::Contextual { context, selector } => {
                Pattern::contextual(context, selector, self.language)
                    .map_err(|err| RuleError::invalid_pattern(context.as_str(), err))
            }
        }?;
        Ok(Rule::Pattern(compiled))
    }
}
