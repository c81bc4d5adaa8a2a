//! Rule evaluation
//!
//! Conditions must produce a boolean. Actions run in order; an error aborts
//! the remaining actions but keeps the ones already applied.

use super::context::EvaluationContext;
use super::expression::{assign, evaluate_expression};
use crate::error::FerruleResult;
use crate::semantic::{Rule, StatementKind};
use crate::value::Value;

pub fn evaluate_condition(rule: &Rule, context: &mut EvaluationContext) -> FerruleResult<bool> {
    match evaluate_expression(&rule.condition, context)? {
        Value::Boolean(matched) => Ok(matched),
        other => Err(context.error(
            format!(
                "condition must evaluate to a boolean, found {} ({})",
                other.type_name(),
                other
            ),
            &rule.condition.span,
        )),
    }
}

pub fn execute_actions(rule: &Rule, context: &mut EvaluationContext) -> FerruleResult<()> {
    for action in &rule.actions {
        match &action.kind {
            StatementKind::Assignment { target, value } => {
                let value = evaluate_expression(value, context)?;
                assign(target, value, context)?;
            }
            StatementKind::Call(call) => {
                evaluate_expression(call, context)?;
            }
        }
    }
    Ok(())
}
