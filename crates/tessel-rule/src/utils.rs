//! Utility rules: named sub-rules referenced through `matches`.
//!
//! Utilities are compiled on first reference in depth-first order, so every
//! compiled `matches` holds the utility's compiled rule directly and
//! evaluation never looks names up. A reference to a utility that is still
//! being compiled is a cycle.

use std::collections::BTreeMap;
use std::sync::Arc;

use tessel_syntax::SupportedLanguage;

use crate::config::SerializableRule;
use crate::error::RuleError;
use crate::rule::{Rule, RuleCompiler};

/// Utilities compiled once for a language and shared by every rule compiled
/// against them.
///
/// Cloning is cheap; clones share the compiled table.
#[derive(Debug, Clone, Default)]
pub struct GlobalRules {
    language: Option<SupportedLanguage>,
    rules: Arc<BTreeMap<String, Arc<Rule>>>,
}

impl GlobalRules {
    /// Compiles `utils` for `language`.
    ///
    /// Utilities may reference each other by name.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::UndefinedUtil`] or [`RuleError::CyclicUtil`] for
    /// broken references, or [`RuleError::InvalidUtil`] when a utility's own
    /// rule fails to compile.
    pub fn try_new(
        language: SupportedLanguage,
        utils: &BTreeMap<String, SerializableRule>,
    ) -> Result<Self, RuleError> {
        let empty = Self::default();
        let mut resolver = UtilResolver::new(utils, &empty);
        for name in utils.keys() {
            resolver.resolve(name, language)?;
        }
        Ok(Self {
            language: Some(language),
            rules: Arc::new(resolver.into_compiled()),
        })
    }

    /// Returns the language the utilities were compiled for, or `None` for
    /// the empty table.
    #[must_use]
    pub const fn language(&self) -> Option<SupportedLanguage> {
        self.language
    }

    /// Returns whether a utility called `name` exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    /// Returns the utility names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// Returns the number of utilities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns whether there are no utilities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Checks that a rule for `language` may use these utilities.
    pub(crate) fn check_language(&self, language: SupportedLanguage) -> Result<(), RuleError> {
        match self.language {
            Some(global) if global != language => Err(RuleError::LanguageMismatch {
                rule: language,
                global,
            }),
            _ => Ok(()),
        }
    }

    fn get(&self, name: &str) -> Option<Arc<Rule>> {
        self.rules.get(name).map(Arc::clone)
    }
}

/// Resolves `matches` references: local utilities first, then globals.
pub(crate) struct UtilResolver<'u> {
    local: &'u BTreeMap<String, SerializableRule>,
    global: &'u GlobalRules,
    compiled: BTreeMap<String, Arc<Rule>>,
    in_progress: Vec<String>,
}

impl<'u> UtilResolver<'u> {
    pub(crate) const fn new(
        local: &'u BTreeMap<String, SerializableRule>,
        global: &'u GlobalRules,
    ) -> Self {
        Self {
            local,
            global,
            compiled: BTreeMap::new(),
            in_progress: Vec::new(),
        }
    }

    /// Returns the compiled utility `name`, compiling it on first use.
    pub(crate) fn resolve(
        &mut self,
        name: &str,
        language: SupportedLanguage,
    ) -> Result<Arc<Rule>, RuleError> {
        if let Some(rule) = self.compiled.get(name) {
            return Ok(Arc::clone(rule));
        }
        let local = self.local;
        let Some(definition) = local.get(name) else {
            return self.global.get(name).ok_or_else(|| RuleError::UndefinedUtil {
                name: name.to_owned(),
            });
        };
        if let Some(start) = self.in_progress.iter().position(|pending| pending == name) {
            let mut cycle: Vec<String> = self.in_progress.iter().skip(start).cloned().collect();
            cycle.push(name.to_owned());
            return Err(RuleError::CyclicUtil { cycle });
        }

        self.in_progress.push(name.to_owned());
        let compiled = RuleCompiler::new(language, self).compile(definition);
        self.in_progress.pop();

        let rule = Arc::new(compiled.map_err(|err| RuleError::invalid_util(name, err))?);
        self.compiled.insert(name.to_owned(), Arc::clone(&rule));
        Ok(rule)
    }

    /// Returns every utility compiled so far.
    pub(crate) fn into_compiled(self) -> BTreeMap<String, Arc<Rule>> {
        self.compiled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn utils(value: serde_json::Value) -> BTreeMap<String, SerializableRule> {
        serde_json::from_value(value).expect("decode utils")
    }

    #[test]
    fn utilities_may_reference_each_other() {
        let table = utils(json!({
            "call": { "kind": "call_expression" },
            "logged": { "all": [{ "matches": "call" }, { "regex": "^console" }] },
        }));
        let globals = GlobalRules::try_new(SupportedLanguage::JavaScript, &table).expect("globals");

        assert_eq!(globals.len(), 2);
        assert_eq!(globals.names().collect::<Vec<_>>(), vec!["call", "logged"]);
        assert_eq!(globals.language(), Some(SupportedLanguage::JavaScript));
    }

    #[test]
    fn cycles_are_reported_with_their_path() {
        let table = utils(json!({
            "a": { "matches": "b" },
            "b": { "any": [{ "kind": "identifier" }, { "matches": "a" }] },
        }));
        let err = GlobalRules::try_new(SupportedLanguage::JavaScript, &table).expect_err("cycle");

        let RuleError::CyclicUtil { cycle } = err else {
            panic!("expected a cycle");
        };
        assert_eq!(cycle, vec!["a", "b", "a"]);
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let table = utils(json!({ "loop": { "not": { "matches": "loop" } } }));
        let err = GlobalRules::try_new(SupportedLanguage::Css, &table).expect_err("cycle");
        assert!(matches!(err, RuleError::CyclicUtil { .. }));
    }

    #[test]
    fn undefined_reference_is_reported() {
        let table = utils(json!({ "a": { "matches": "missing" } }));
        let err = GlobalRules::try_new(SupportedLanguage::Html, &table).expect_err("undefined");
        assert!(matches!(err, RuleError::UndefinedUtil { ref name } if name == "missing"));
    }

    #[test]
    fn broken_utility_names_the_utility() {
        let table = utils(json!({ "bad": { "regex": "(" } }));
        let err = GlobalRules::try_new(SupportedLanguage::JavaScript, &table).expect_err("regex");
        assert!(matches!(err, RuleError::InvalidUtil { ref name, .. } if name == "bad"));
    }

    #[test]
    fn empty_table_accepts_every_language() {
        let globals = GlobalRules::default();
        assert!(globals.is_empty());
        assert!(globals.check_language(SupportedLanguage::Tsx).is_ok());

        let js = GlobalRules::try_new(SupportedLanguage::JavaScript, &BTreeMap::new())
            .expect("globals");
        assert!(matches!(
            js.check_language(SupportedLanguage::TypeScript),
            Err(RuleError::LanguageMismatch { .. })
        ));
    }
}
