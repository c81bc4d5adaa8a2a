//! Rule evaluation over a data context
//!
//! One cycle of the engine is:
//! 1. Evaluate the condition of every active rule, in declaration order
//! 2. Order the matches by salience, highest first, keeping declaration
//!    order between equal saliences
//! 3. Fire the first match

pub mod context;
pub mod expression;
pub mod functions;
pub mod operations;
pub mod rules;

use crate::error::FerruleResult;
use context::EvaluationContext;

/// Evaluates rule conditions and fires rule actions
#[derive(Debug, Default, Clone, Copy)]
pub struct Evaluator;

impl Evaluator {
    pub fn new() -> Self {
        Self
    }

    /// Indices of active rules whose condition holds, in firing order
    pub fn matching_rules(&self, context: &mut EvaluationContext) -> FerruleResult<Vec<usize>> {
        let rule_set = context.rule_set;
        let mut matches = Vec::new();

        for (index, rule) in rule_set.rules().iter().enumerate() {
            if !context.active[index] {
                continue;
            }
            context.current_rule = Some(index);
            let matched = rules::evaluate_condition(rule, context);
            context.current_rule = None;
            if matched? {
                matches.push(index);
            }
        }

        // Stable sort: equal saliences stay in declaration order
        let all = rule_set.rules();
        matches.sort_by(|a, b| all[*b].salience.cmp(&all[*a].salience));
        Ok(matches)
    }

    /// Run the actions of the rule at `index`
    pub fn fire(&self, index: usize, context: &mut EvaluationContext) -> FerruleResult<()> {
        let rule_set = context.rule_set;
        let Some(rule) = rule_set.rules().get(index) else {
            return Err(crate::FerruleError::Engine(format!(
                "Rule index {} out of range for rule set '{}'",
                index,
                rule_set.name()
            )));
        };
        context.current_rule = Some(index);
        let result = rules::execute_actions(rule, context);
        context.current_rule = None;
        result
    }
}
