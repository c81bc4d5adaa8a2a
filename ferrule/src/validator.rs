//! Compile-time checks on parsed rules
//!
//! Runs after parsing and before a rule set is installed in the library.
//! Every problem found is reported; nothing is installed if any check fails.

use crate::ast::Span;
use crate::error::{FerruleError, FerruleResult};
use crate::evaluator::functions::Intrinsic;
use crate::parser::Source;
use crate::semantic::{Expression, ExpressionKind, Literal, Rule};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
pub struct Validator;

impl Validator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, rules: &[Rule], source: &Source) -> FerruleResult<()> {
        let mut errors = Vec::new();

        self.validate_duplicates(rules, source, &mut errors);

        let names: HashSet<&str> = rules.iter().map(|r| r.name.as_str()).collect();
        for rule in rules {
            self.validate_condition(rule, source, &mut errors);
            for action in &rule.actions {
                for expr in action.expressions() {
                    expr.walk(&mut |e| {
                        self.validate_intrinsic_call(e, rule, &names, source, &mut errors)
                    });
                }
            }
        }

        match FerruleError::from_many(errors) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn validate_duplicates(
        &self,
        rules: &[Rule],
        source: &Source,
        errors: &mut Vec<FerruleError>,
    ) {
        let mut seen: HashMap<&str, &Span> = HashMap::new();
        for rule in rules {
            if let Some(first) = seen.get(rule.name.as_str()) {
                errors.push(FerruleError::compile(
                    source
                        .details(
                            format!("Duplicate rule definition: '{}'", rule.name),
                            rule.span.clone(),
                        )
                        .in_rule(rule.name.clone())
                        .with_suggestion(format!(
                            "rule '{}' was already defined at line {}; rule names must be unique within a rule set",
                            rule.name, first.line
                        )),
                ));
            } else {
                seen.insert(&rule.name, &rule.span);
            }
        }
    }

    /// `Retract` and `Complete` change session state and are only allowed in actions
    fn validate_condition(&self, rule: &Rule, source: &Source, errors: &mut Vec<FerruleError>) {
        rule.condition.walk(&mut |expr| {
            if let ExpressionKind::Call {
                receiver: None,
                name,
                ..
            } = &expr.kind
            {
                if let Some(intrinsic) = Intrinsic::from_name(name) {
                    if intrinsic != Intrinsic::Log {
                        errors.push(FerruleError::compile(
                            source
                                .details(
                                    format!("'{}' cannot be used in a condition", name),
                                    expr.span.clone(),
                                )
                                .in_rule(rule.name.clone()),
                        ));
                    }
                }
            }
        });
    }

    fn validate_intrinsic_call(
        &self,
        expr: &Expression,
        rule: &Rule,
        names: &HashSet<&str>,
        source: &Source,
        errors: &mut Vec<FerruleError>,
    ) {
        let ExpressionKind::Call {
            receiver: None,
            name,
            args,
        } = &expr.kind
        else {
            return;
        };
        let Some(intrinsic) = Intrinsic::from_name(name) else {
            return;
        };

        let error = |message: String| {
            FerruleError::compile(
                source
                    .details(message, expr.span.clone())
                    .in_rule(rule.name.clone()),
            )
        };

        if let Some(expected) = intrinsic.arity() {
            if args.len() != expected {
                errors.push(error(format!(
                    "'{}' expects {} argument(s), found {}",
                    name,
                    expected,
                    args.len()
                )));
                return;
            }
        }

        if intrinsic == Intrinsic::Retract {
            match &args[0].kind {
                ExpressionKind::Literal(Literal::Text(target)) => {
                    if !names.contains(target.as_str()) {
                        errors.push(error(format!(
                            "Retract target '{}' is not a rule in this rule set",
                            target
                        )));
                    }
                }
                ExpressionKind::Literal(other) => {
                    errors.push(error(format!(
                        "Retract expects a rule name string, found {}",
                        other
                    )));
                }
                // Computed names are checked when the action runs
                _ => {}
            }
        }
    }
}
