//! Expression evaluation
//!
//! Recursively evaluates expressions to runtime values. Member, index and
//! call chains rooted at a fact are resolved by walking the fact through the
//! `Fact` trait; chains rooted at a plain value walk maps and lists.

use super::context::EvaluationContext;
use super::functions::call_function;
use super::operations::{arithmetic_operation, comparison_operation, negate, not};
use crate::ast::Span;
use crate::error::{FerruleError, FerruleResult};
use crate::host::{Fact, HostError};
use crate::semantic::{Expression, ExpressionKind, UnaryOperator};
use crate::value::Value;

/// Evaluate an expression against the session's facts
pub fn evaluate_expression(
    expr: &Expression,
    context: &mut EvaluationContext,
) -> FerruleResult<Value> {
    match &expr.kind {
        ExpressionKind::Literal(lit) => Ok(Value::from(lit)),

        ExpressionKind::Identifier(_)
        | ExpressionKind::Member { .. }
        | ExpressionKind::Index { .. }
        | ExpressionKind::Call {
            receiver: Some(_), ..
        } => evaluate_chain(expr, context),

        ExpressionKind::Call {
            receiver: None,
            name,
            args,
        } => {
            let args = evaluate_arguments(args, context)?;
            call_function(name, args, &expr.span, context)
        }

        ExpressionKind::Unary(op, operand) => {
            let value = evaluate_expression(operand, context)?;
            let result = match op {
                UnaryOperator::Negate => negate(&value),
                UnaryOperator::Not => not(&value),
            };
            result.map_err(|msg| context.error(msg, &expr.span))
        }

        ExpressionKind::Arithmetic(left, op, right) => {
            let l = evaluate_expression(left, context)?;
            let r = evaluate_expression(right, context)?;
            arithmetic_operation(&l, *op, &r).map_err(|msg| context.error(msg, &expr.span))
        }

        ExpressionKind::Comparison(left, op, right) => {
            let l = evaluate_expression(left, context)?;
            let r = evaluate_expression(right, context)?;
            comparison_operation(&l, *op, &r).map_err(|msg| context.error(msg, &expr.span))
        }

        ExpressionKind::LogicalAnd(left, right) => {
            // Short-circuit: the right side is skipped when the left is false
            if !evaluate_boolean(left, "&&", context)? {
                return Ok(Value::Boolean(false));
            }
            Ok(Value::Boolean(evaluate_boolean(right, "&&", context)?))
        }

        ExpressionKind::LogicalOr(left, right) => {
            if evaluate_boolean(left, "||", context)? {
                return Ok(Value::Boolean(true));
            }
            Ok(Value::Boolean(evaluate_boolean(right, "||", context)?))
        }
    }
}

fn evaluate_boolean(
    expr: &Expression,
    operator: &str,
    context: &mut EvaluationContext,
) -> FerruleResult<bool> {
    match evaluate_expression(expr, context)? {
        Value::Boolean(b) => Ok(b),
        other => Err(context.error(
            format!(
                "'{}' requires boolean operands, found {} ({})",
                operator,
                other.type_name(),
                expr
            ),
            &expr.span,
        )),
    }
}

fn evaluate_arguments(
    args: &[Expression],
    context: &mut EvaluationContext,
) -> FerruleResult<Vec<Value>> {
    args.iter()
        .map(|arg| evaluate_expression(arg, context))
        .collect()
}

/// Assign `value` to the member or element named by `target`
pub fn assign(
    target: &Expression,
    value: Value,
    context: &mut EvaluationContext,
) -> FerruleResult<()> {
    let (base, links) = split_chain(target);
    let ExpressionKind::Identifier(name) = &base.kind else {
        return Err(context.error(
            format!("cannot assign to '{}': target must start with a fact name", target),
            &target.span,
        ));
    };
    if links.is_empty() {
        return Err(context.error(
            format!("cannot assign to fact '{}' itself", name),
            &target.span,
        ));
    }

    let steps = resolve_steps(&links, context)?;
    let result = match context.facts.fact_mut(name) {
        Some(fact) => write_fact(fact, &steps, value),
        None => return Err(unknown_fact(name, &base.span, context)),
    };
    result.map_err(|e| step_error(e, context))
}

/// One resolved link of a member chain
struct Step {
    kind: StepKind,
    span: Span,
}

enum StepKind {
    Member(String),
    Index(Value),
    Call(String, Vec<Value>),
}

/// A host failure at a particular link of a chain
struct StepError {
    error: HostError,
    span: Span,
}

/// Split `A.B[k].C(x)` into its base `A` and the links from the base outward
fn split_chain(expr: &Expression) -> (&Expression, Vec<&Expression>) {
    let mut links = Vec::new();
    let mut current = expr;
    loop {
        match &current.kind {
            ExpressionKind::Member { object, .. } | ExpressionKind::Index { object, .. } => {
                links.push(current);
                current = object;
            }
            ExpressionKind::Call {
                receiver: Some(receiver),
                ..
            } => {
                links.push(current);
                current = receiver;
            }
            _ => break,
        }
    }
    links.reverse();
    (current, links)
}

/// Evaluate index keys and call arguments, left to right
fn resolve_steps(
    links: &[&Expression],
    context: &mut EvaluationContext,
) -> FerruleResult<Vec<Step>> {
    let mut steps = Vec::with_capacity(links.len());
    for link in links {
        let kind = match &link.kind {
            ExpressionKind::Member { name, .. } => StepKind::Member(name.clone()),
            ExpressionKind::Index { key, .. } => {
                StepKind::Index(evaluate_expression(key, context)?)
            }
            ExpressionKind::Call { name, args, .. } => {
                StepKind::Call(name.clone(), evaluate_arguments(args, context)?)
            }
            _ => return Err(context.error("malformed member chain", &link.span)),
        };
        steps.push(Step {
            kind,
            span: link.span.clone(),
        });
    }
    Ok(steps)
}

fn evaluate_chain(expr: &Expression, context: &mut EvaluationContext) -> FerruleResult<Value> {
    let (base, links) = split_chain(expr);

    if let ExpressionKind::Identifier(name) = &base.kind {
        let steps = resolve_steps(&links, context)?;
        let result = match context.facts.fact_mut(name) {
            Some(fact) => read_fact(fact, &steps),
            None => return Err(unknown_fact(name, &base.span, context)),
        };
        return result.map_err(|e| step_error(e, context));
    }

    let value = evaluate_expression(base, context)?;
    let steps = resolve_steps(&links, context)?;
    read_value(value, &steps).map_err(|e| step_error(e, context))
}

fn unknown_fact(name: &str, span: &Span, context: &EvaluationContext) -> FerruleError {
    let bound = context.facts.names();
    let error = context.error(format!("Unknown fact '{}'", name), span);
    if bound.is_empty() {
        error.with_suggestion("no facts are bound in the data context")
    } else {
        error.with_suggestion(format!("bound facts: {}", bound.join(", ")))
    }
}

fn step_error(e: StepError, context: &EvaluationContext) -> FerruleError {
    context.error(e.error.to_string(), &e.span)
}

/// Resolve the remaining links against a host object.
///
/// A member resolves as a nested object when more links follow, else as a
/// field, else as a zero-argument accessor method.
fn read_fact(fact: &mut dyn Fact, steps: &[Step]) -> Result<Value, StepError> {
    let Some((step, rest)) = steps.split_first() else {
        return Ok(fact.to_value());
    };
    let fail = |error| StepError {
        error,
        span: step.span.clone(),
    };

    match &step.kind {
        StepKind::Member(name) => {
            if !rest.is_empty() {
                if let Some(child) = fact.member_mut(name) {
                    return read_fact(child, rest);
                }
            }
            if let Some(value) = fact.get(name) {
                return read_value(value, rest);
            }
            match fact.call(name, &[]) {
                Ok(value) => read_value(value, rest),
                Err(HostError::UnknownMethod { .. }) => Err(fail(HostError::UnknownMember {
                    type_name: fact.type_name().to_string(),
                    member: name.clone(),
                })),
                Err(e) => Err(fail(e)),
            }
        }
        StepKind::Index(key) => {
            if !rest.is_empty() {
                if let Some(child) = fact.element_mut(key) {
                    return read_fact(child, rest);
                }
            }
            let value = fact.index(key).map_err(fail)?;
            read_value(value, rest)
        }
        StepKind::Call(name, args) => {
            let value = fact.call(name, args).map_err(fail)?;
            read_value(value, rest)
        }
    }
}

/// Resolve the remaining links against a plain value
fn read_value(value: Value, steps: &[Step]) -> Result<Value, StepError> {
    let Some((step, rest)) = steps.split_first() else {
        return Ok(value);
    };
    let fail = |error| StepError {
        error,
        span: step.span.clone(),
    };

    let next = match (&step.kind, value) {
        (StepKind::Member(name), Value::Map(mut entries)) => {
            entries.remove(name).ok_or_else(|| {
                fail(HostError::UnknownMember {
                    type_name: "map".to_string(),
                    member: name.clone(),
                })
            })?
        }
        (StepKind::Member(name), other) => {
            return Err(fail(HostError::UnknownMember {
                type_name: other.type_name().to_string(),
                member: name.clone(),
            }));
        }
        (StepKind::Index(key), Value::Map(mut entries)) => {
            let Some(k) = key.as_str() else {
                return Err(fail(HostError::TypeMismatch {
                    expected: "string key".to_string(),
                    found: key.type_name().to_string(),
                }));
            };
            entries.remove(k).ok_or_else(|| {
                fail(HostError::MissingKey {
                    key: format!("{:?}", k),
                })
            })?
        }
        (StepKind::Index(key), Value::List(mut items)) => {
            let Value::Integer(index) = key else {
                return Err(fail(HostError::TypeMismatch {
                    expected: "integer index".to_string(),
                    found: key.type_name().to_string(),
                }));
            };
            let len = items.len();
            match usize::try_from(*index).ok().filter(|i| *i < len) {
                Some(i) => items.swap_remove(i),
                None => {
                    return Err(fail(HostError::IndexOutOfBounds { index: *index, len }));
                }
            }
        }
        (StepKind::Index(_), other) => {
            return Err(fail(HostError::NotIndexable {
                type_name: other.type_name().to_string(),
            }));
        }
        (StepKind::Call(name, _), other) => {
            return Err(fail(HostError::UnknownMethod {
                type_name: other.type_name().to_string(),
                method: name.clone(),
            }));
        }
    };
    read_value(next, rest)
}

/// Navigate to the owner of the last link and assign through it
fn write_fact(fact: &mut dyn Fact, steps: &[Step], value: Value) -> Result<(), StepError> {
    let Some((step, rest)) = steps.split_first() else {
        return Err(StepError {
            error: HostError::Custom("nothing to assign".to_string()),
            span: Span::default(),
        });
    };
    let fail = |error| StepError {
        error,
        span: step.span.clone(),
    };

    if rest.is_empty() {
        return match &step.kind {
            StepKind::Member(name) => fact.set(name, value),
            StepKind::Index(key) => fact.set_index(key, value),
            StepKind::Call(name, _) => Err(HostError::Custom(format!(
                "cannot assign to the result of '{}'",
                name
            ))),
        }
        .map_err(fail);
    }

    match &step.kind {
        StepKind::Member(name) => {
            if let Some(child) = fact.member_mut(name) {
                return write_fact(child, rest, value);
            }
            let error = if fact.get(name).is_some() {
                HostError::Custom(format!(
                    "field '{}' of {} cannot be navigated for assignment",
                    name,
                    fact.type_name()
                ))
            } else {
                HostError::UnknownMember {
                    type_name: fact.type_name().to_string(),
                    member: name.clone(),
                }
            };
            Err(fail(error))
        }
        StepKind::Index(key) => {
            if let Some(child) = fact.element_mut(key) {
                return write_fact(child, rest, value);
            }
            let error = match fact.index(key) {
                Err(e) => e,
                Ok(_) => HostError::Custom(format!(
                    "element {} of {} cannot be navigated for assignment",
                    key,
                    fact.type_name()
                )),
            };
            Err(fail(error))
        }
        StepKind::Call(name, _) => Err(fail(HostError::Custom(format!(
            "cannot assign through method call '{}'",
            name
        )))),
    }
}
