//! Versioned registry of compiled rule sets
//!
//! A `RuleSet` is immutable once compiled and shared through `Arc`. Every
//! `KnowledgeBase` carries its own activation vector over a rule set, so
//! sessions never observe each other's retractions.

use crate::ast::Span;
use crate::error::{FerruleError, FerruleResult};
use crate::parser::{self, Source};
use crate::resource_limits::ResourceLimits;
use crate::semantic::Rule;
use crate::validator::Validator;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// An ordered, name-unique collection of compiled rules
#[derive(Debug)]
pub struct RuleSet {
    name: String,
    version: String,
    source: Source,
    rules: Vec<Rule>,
    index: HashMap<String, usize>,
}

impl RuleSet {
    fn new(name: &str, version: &str, source: Source, rules: Vec<Rule>) -> Self {
        let index = rules
            .iter()
            .enumerate()
            .map(|(i, rule)| (rule.name.clone(), i))
            .collect();
        Self {
            name: name.to_string(),
            version: version.to_string(),
            source,
            rules,
            index,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Identifier used in error messages, `name@version`
    pub fn source_id(&self) -> &str {
        &self.source.id
    }

    pub fn source_text(&self) -> &Arc<str> {
        &self.source.text
    }

    pub(crate) fn source(&self) -> &Source {
        &self.source
    }

    /// Rules in declaration order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.position(name).map(|i| &self.rules[i])
    }

    /// Declaration index of a rule
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Per-session working copy of a rule set's activation state
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    rule_set: Arc<RuleSet>,
    active: Vec<bool>,
}

impl KnowledgeBase {
    pub fn new(rule_set: Arc<RuleSet>) -> Self {
        let active = vec![true; rule_set.len()];
        Self { rule_set, active }
    }

    pub fn name(&self) -> &str {
        self.rule_set.name()
    }

    pub fn version(&self) -> &str {
        self.rule_set.version()
    }

    pub fn rule_set(&self) -> &Arc<RuleSet> {
        &self.rule_set
    }

    pub fn rules(&self) -> &[Rule] {
        self.rule_set.rules()
    }

    /// `false` for retracted rules and for names not in the rule set
    pub fn is_active(&self, name: &str) -> bool {
        self.rule_set
            .position(name)
            .is_some_and(|i| self.active[i])
    }

    /// Deactivate a rule. Returns `false` if the rule does not exist.
    pub fn retract(&mut self, name: &str) -> bool {
        match self.rule_set.position(name) {
            Some(i) => {
                self.active[i] = false;
                true
            }
            None => false,
        }
    }

    /// Reactivate every rule
    pub fn reset(&mut self) {
        self.active.iter_mut().for_each(|flag| *flag = true);
    }

    /// Active rules in declaration order
    pub fn active_rules(&self) -> impl Iterator<Item = &Rule> + '_ {
        self.rule_set
            .rules()
            .iter()
            .zip(self.active.iter())
            .filter(|(_, active)| **active)
            .map(|(rule, _)| rule)
    }

    pub(crate) fn activation(&self) -> &[bool] {
        &self.active
    }

    pub(crate) fn activation_mut(&mut self) -> &mut [bool] {
        &mut self.active
    }
}

/// Registry of compiled rule sets keyed by (name, version)
#[derive(Debug, Default)]
pub struct KnowledgeLibrary {
    rule_sets: HashMap<(String, String), Arc<RuleSet>>,
    validator: Validator,
    limits: ResourceLimits,
}

impl KnowledgeLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a library with custom compile limits
    pub fn with_limits(limits: ResourceLimits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    pub fn limits(&self) -> &ResourceLimits {
        &self.limits
    }

    /// Compile rule source and install it under (name, version).
    ///
    /// Replaces an existing rule set with the same key for future
    /// instantiations; knowledge bases already created keep the old one.
    /// Nothing is installed when compilation fails.
    pub fn compile(
        &mut self,
        name: &str,
        version: &str,
        source: &[u8],
    ) -> FerruleResult<Arc<RuleSet>> {
        let source_id = format!("{}@{}", name, version);
        let text = std::str::from_utf8(source).map_err(|e| {
            let valid = &source[..e.valid_up_to()];
            // The prefix is valid UTF-8 by construction
            let prefix = String::from_utf8_lossy(valid);
            let span = Span::at_offset(&prefix, prefix.len());
            FerruleError::lex(Source::new(source_id.clone(), prefix.as_ref()).details(
                format!("invalid UTF-8 at byte {}", e.valid_up_to()),
                span,
            ))
        })?;

        let rules = parser::parse(text, &source_id, &self.limits)?;
        let source = Source::new(source_id, text);
        self.validator.validate(&rules, &source)?;

        let rule_set = Arc::new(RuleSet::new(name, version, source, rules));
        debug!(
            rule_set = name,
            version,
            rules = rule_set.len(),
            "compiled rule set"
        );
        self.rule_sets.insert(
            (name.to_string(), version.to_string()),
            Arc::clone(&rule_set),
        );
        Ok(rule_set)
    }

    /// Create a fresh knowledge base with every rule active
    pub fn new_knowledge_base(&self, name: &str, version: &str) -> FerruleResult<KnowledgeBase> {
        self.get(name, version)
            .map(|rule_set| KnowledgeBase::new(Arc::clone(rule_set)))
            .ok_or_else(|| {
                FerruleError::Engine(format!("Rule set '{}@{}' not found", name, version))
            })
    }

    pub fn get(&self, name: &str, version: &str) -> Option<&Arc<RuleSet>> {
        self.rule_sets.get(&(name.to_string(), version.to_string()))
    }

    pub fn contains(&self, name: &str, version: &str) -> bool {
        self.get(name, version).is_some()
    }

    /// Remove a rule set. Existing knowledge bases are unaffected.
    pub fn remove(&mut self, name: &str, version: &str) -> Option<Arc<RuleSet>> {
        self.rule_sets.remove(&(name.to_string(), version.to_string()))
    }

    /// All (name, version) keys, sorted
    pub fn list(&self) -> Vec<(String, String)> {
        let mut keys: Vec<_> = self.rule_sets.keys().cloned().collect();
        keys.sort();
        keys
    }
}
