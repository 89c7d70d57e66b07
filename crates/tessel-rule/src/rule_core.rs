//! The executable form of a [`RuleConfig`].

use std::collections::BTreeMap;

use tracing::debug;

use tessel_syntax::{Matcher, MetaVarEnv, Node, SupportedLanguage};

use crate::config::RuleConfig;
use crate::error::RuleError;
use crate::rule::{Rule, RuleCompiler};
use crate::utils::{GlobalRules, UtilResolver};

const COMPILE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::compile");

/// A compiled rule with its constraints.
///
/// Immutable after compilation and safe to share between threads.
#[derive(Debug)]
pub struct RuleCore {
    id: String,
    language: SupportedLanguage,
    rule: Rule,
    constraints: BTreeMap<String, Rule>,
}

impl RuleCore {
    /// Compiles `config`, resolving `matches` against the rule's own utilities
    /// first and `globals` second. Every local utility is compiled, whether
    /// or not anything refers to it.
    ///
    /// # Errors
    ///
    /// Returns a [`RuleError`] for the first part of the rule that fails to
    /// compile, or [`RuleError::LanguageMismatch`] when `globals` were
    /// compiled for another language.
    pub fn try_new(config: &RuleConfig, globals: &GlobalRules) -> Result<Self, RuleError> {
        globals.check_language(config.language)?;

        let mut resolver = UtilResolver::new(&config.utils, globals);
        for name in config.utils.keys() {
            resolver.resolve(name, config.language)?;
        }
        let rule = RuleCompiler::new(config.language, &mut resolver).compile(&config.rule)?;
        let constraints = config
            .constraints
            .iter()
            .map(|(name, constraint)| {
                RuleCompiler::new(config.language, &mut resolver)
                    .compile(constraint)
                    .map(|compiled| (name.clone(), compiled))
                    .map_err(|err| RuleError::invalid_constraint(name.as_str(), err))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        debug!(
            target: COMPILE_TARGET,
            rule = config.id.as_str(),
            language = %config.language,
            constraints = constraints.len(),
            local_utils = config.utils.len(),
            "compiled rule"
        );

        Ok(Self {
            id: config.id.clone(),
            language: config.language,
            rule,
            constraints,
        })
    }

    /// Returns the rule id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the language the rule was compiled for.
    #[must_use]
    pub const fn language(&self) -> SupportedLanguage {
        self.language
    }

    /// Returns the constrained metavariable names.
    pub fn constrained_names(&self) -> impl Iterator<Item = &str> {
        self.constraints.keys().map(String::as_str)
    }

    /// Every bound constrained metavariable must satisfy its constraint;
    /// unbound names are skipped.
    fn satisfies_constraints(&self, env: &MetaVarEnv<'_>) -> bool {
        self.constraints.iter().all(|(name, constraint)| {
            env.get(name).is_none_or(|value| {
                value
                    .nodes()
                    .iter()
                    .all(|node| constraint.match_node_with_env(*node, &mut MetaVarEnv::new()))
            })
        })
    }
}

impl Matcher for RuleCore {
    fn match_node_with_env<'r>(&self, node: Node<'r>, env: &mut MetaVarEnv<'r>) -> bool {
        if node.language() != self.language {
            return false;
        }
        let mut trial = env.clone();
        if !self.rule.match_node_with_env(node, &mut trial) || !self.satisfies_constraints(&trial) {
            return false;
        }
        *env = trial;
        true
    }
}
