//! Bare function calls: intrinsics first, then host functions
//!
//! `Log`, `Retract` and `Complete` are resolved against a fixed table before
//! the data context's registered functions are consulted.

use super::context::EvaluationContext;
use crate::ast::Span;
use crate::error::FerruleResult;
use crate::value::Value;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intrinsic {
    /// `Log(args...)`: emit the arguments at info level
    Log,
    /// `Retract("Rule")`: deactivate a rule for the rest of the session
    Retract,
    /// `Complete()`: stop the session once the current rule's actions finish
    Complete,
}

impl Intrinsic {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Log" => Some(Intrinsic::Log),
            "Retract" => Some(Intrinsic::Retract),
            "Complete" => Some(Intrinsic::Complete),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Intrinsic::Log => "Log",
            Intrinsic::Retract => "Retract",
            Intrinsic::Complete => "Complete",
        }
    }

    /// Exact argument count, `None` when variadic
    pub fn arity(self) -> Option<usize> {
        match self {
            Intrinsic::Log => None,
            Intrinsic::Retract => Some(1),
            Intrinsic::Complete => Some(0),
        }
    }
}

pub fn call_function(
    name: &str,
    args: Vec<Value>,
    span: &Span,
    context: &mut EvaluationContext,
) -> FerruleResult<Value> {
    let Some(intrinsic) = Intrinsic::from_name(name) else {
        return call_host_function(name, args, span, context);
    };

    if let Some(expected) = intrinsic.arity() {
        if args.len() != expected {
            return Err(context.error(
                format!(
                    "'{}' expects {} argument(s), found {}",
                    intrinsic.name(),
                    expected,
                    args.len()
                ),
                span,
            ));
        }
    }

    match intrinsic {
        Intrinsic::Log => {
            let message = args
                .iter()
                .map(Value::to_string)
                .collect::<Vec<_>>()
                .join(" ");
            info!(
                target: "ferrule::grl",
                rule = context.rule_name().unwrap_or("<none>"),
                "{}",
                message
            );
        }
        Intrinsic::Retract => {
            let Value::Text(rule) = &args[0] else {
                return Err(context.error(
                    format!(
                        "Retract expects a rule name string, found {}",
                        args[0].type_name()
                    ),
                    span,
                ));
            };
            if !context.retract(rule) {
                return Err(context.error(
                    format!(
                        "Retract target '{}' is not a rule in rule set '{}'",
                        rule,
                        context.rule_set.name()
                    ),
                    span,
                ));
            }
        }
        Intrinsic::Complete => context.session.complete = true,
    }
    Ok(Value::Nil)
}

fn call_host_function(
    name: &str,
    args: Vec<Value>,
    span: &Span,
    context: &mut EvaluationContext,
) -> FerruleResult<Value> {
    let result = match context.facts.function_mut(name) {
        Some(function) => (**function)(&args),
        None => {
            return Err(context
                .error(format!("Unknown function '{}'", name), span)
                .with_suggestion(
                    "host functions must be registered with DataContext::add_function",
                ));
        }
    };
    result.map_err(|e| context.error(format!("{}: {}", name, e), span))
}
