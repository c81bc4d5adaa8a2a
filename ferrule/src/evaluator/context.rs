//! Working memory and per-session evaluation state

use super::functions::Intrinsic;
use crate::ast::Span;
use crate::error::{FerruleError, FerruleResult};
use crate::host::{Fact, HostError};
use crate::library::RuleSet;
use crate::value::Value;
use std::collections::BTreeMap;

/// A host function callable from rules with bare call syntax, `Name(args)`
pub type HostFunction<'f> = Box<dyn FnMut(&[Value]) -> Result<Value, HostError> + 'f>;

/// Named facts and host functions for one execution session.
///
/// Facts are borrowed mutably for `'f`; the caller regains access to them
/// once the context is dropped.
///
/// ```
/// use ferrule::{DataContext, Value};
/// use std::collections::HashMap;
///
/// let mut payload: HashMap<String, i64> = HashMap::new();
/// let mut ctx = DataContext::new();
/// ctx.add("AO", &mut payload).unwrap();
/// ctx.add_function("Double", |args: &[Value]| {
///     Ok(Value::Integer(args[0].as_i64().unwrap_or(0) * 2))
/// })
/// .unwrap();
/// assert!(ctx.contains("AO"));
/// ```
#[derive(Default)]
pub struct DataContext<'f> {
    facts: BTreeMap<String, &'f mut dyn Fact>,
    functions: BTreeMap<String, HostFunction<'f>>,
}

impl<'f> DataContext<'f> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a fact. Fails with `DuplicateFact` if the name is already bound.
    pub fn add(&mut self, name: impl Into<String>, fact: &'f mut dyn Fact) -> FerruleResult<()> {
        let name = name.into();
        if self.facts.contains_key(&name) {
            return Err(FerruleError::DuplicateFact(name));
        }
        self.facts.insert(name, fact);
        Ok(())
    }

    /// Unbind a fact, returning whether it was bound
    pub fn remove(&mut self, name: &str) -> bool {
        self.facts.remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.facts.contains_key(name)
    }

    /// Bound fact names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.facts.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Register a host function.
    ///
    /// Intrinsic names (`Log`, `Retract`, `Complete`) are reserved and a name
    /// can only be registered once.
    pub fn add_function<F>(&mut self, name: impl Into<String>, function: F) -> FerruleResult<()>
    where
        F: FnMut(&[Value]) -> Result<Value, HostError> + 'f,
    {
        let name = name.into();
        if Intrinsic::from_name(&name).is_some() {
            return Err(FerruleError::Engine(format!(
                "'{}' is an intrinsic function and cannot be redefined",
                name
            )));
        }
        if self.functions.contains_key(&name) {
            return Err(FerruleError::Engine(format!(
                "Function '{}' is already registered",
                name
            )));
        }
        self.functions.insert(name, Box::new(function));
        Ok(())
    }

    /// Snapshot of a bound fact
    pub fn value_of(&self, name: &str) -> Option<Value> {
        self.facts.get(name).map(|fact| fact.to_value())
    }

    pub(crate) fn fact_mut(&mut self, name: &str) -> Option<&mut (dyn Fact + 'f)> {
        self.facts.get_mut(name).map(|fact| &mut **fact)
    }

    pub(crate) fn function_mut(&mut self, name: &str) -> Option<&mut HostFunction<'f>> {
        self.functions.get_mut(name)
    }
}

/// Session state: cycle counter, completion flag and retractions
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub cycle: u64,
    pub complete: bool,
    pub retracted: Vec<String>,
}

/// Everything an expression needs while being evaluated
pub struct EvaluationContext<'c, 'f> {
    pub facts: &'c mut DataContext<'f>,
    pub rule_set: &'c RuleSet,
    /// Activation flags, indexed like `rule_set.rules()`
    pub active: &'c mut [bool],
    pub session: &'c mut Session,
    /// Index of the rule whose condition or actions are being evaluated
    pub current_rule: Option<usize>,
}

impl<'c, 'f> EvaluationContext<'c, 'f> {
    pub fn new(
        facts: &'c mut DataContext<'f>,
        rule_set: &'c RuleSet,
        active: &'c mut [bool],
        session: &'c mut Session,
    ) -> Self {
        Self {
            facts,
            rule_set,
            active,
            session,
            current_rule: None,
        }
    }

    pub fn rule_name(&self) -> Option<&str> {
        self.current_rule
            .and_then(|i| self.rule_set.rules().get(i))
            .map(|rule| rule.name.as_str())
    }

    /// Deactivate a rule for the rest of the session.
    ///
    /// Returns `false` if no rule has that name. Retracting twice is a no-op.
    pub fn retract(&mut self, name: &str) -> bool {
        let Some(i) = self.rule_set.position(name) else {
            return false;
        };
        if self.active[i] {
            self.active[i] = false;
            self.session.retracted.push(name.to_string());
        }
        true
    }

    /// Evaluation error located in the rule set source
    pub fn error(&self, message: impl Into<String>, span: &Span) -> FerruleError {
        let mut details = self.rule_set.source().details(message, span.clone());
        if let Some(rule) = self.rule_name() {
            details = details.in_rule(rule);
        }
        FerruleError::eval(details)
    }
}
