use crate::error::{FerruleError, FerruleResult};
use crate::evaluator::context::{DataContext, EvaluationContext, Session};
use crate::evaluator::Evaluator;
use crate::library::{KnowledgeBase, RuleSet};
use crate::report::{ExecutionReport, Outcome};
use crate::semantic::Rule;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn};

/// Cycle bound used by `Engine::new`
pub const DEFAULT_MAX_CYCLES: u64 = 5000;

/// The forward-chaining execution engine.
///
/// Each `execute` call is one session: every rule of the knowledge base is
/// reactivated, then the engine fires one matching rule per cycle until no
/// rule matches, a rule calls `Complete()`, or the cycle bound is hit.
#[derive(Debug, Clone)]
pub struct Engine {
    max_cycles: u64,
    evaluator: Evaluator,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            max_cycles: DEFAULT_MAX_CYCLES,
            evaluator: Evaluator,
        }
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine that gives up after `max_cycles` fired rules
    pub fn with_max_cycles(max_cycles: u64) -> Self {
        Self {
            max_cycles,
            ..Self::default()
        }
    }

    pub fn max_cycles(&self) -> u64 {
        self.max_cycles
    }

    /// Run rules against the facts until quiescence or completion.
    ///
    /// Facts are mutated in place. On error, mutations made by rules that
    /// already fired are kept.
    pub fn execute(
        &self,
        facts: &mut DataContext,
        knowledge_base: &mut KnowledgeBase,
    ) -> FerruleResult<ExecutionReport> {
        let rule_set = Arc::clone(knowledge_base.rule_set());
        let _span = info_span!(
            "execute",
            rule_set = rule_set.name(),
            version = rule_set.version()
        )
        .entered();

        knowledge_base.reset();
        let mut session = Session::default();
        let mut fired: Vec<String> = Vec::new();
        let mut context = EvaluationContext::new(
            facts,
            &rule_set,
            knowledge_base.activation_mut(),
            &mut session,
        );

        let outcome = loop {
            let matches = self.evaluator.matching_rules(&mut context)?;
            let Some(&selected) = matches.first() else {
                break Outcome::Quiescent;
            };

            if context.session.cycle >= self.max_cycles {
                let last_rule = fired.last().cloned().unwrap_or_default();
                warn!(
                    max_cycles = self.max_cycles,
                    last_rule = last_rule.as_str(),
                    "cycle limit exceeded"
                );
                return Err(FerruleError::CycleLimitExceeded {
                    max_cycles: self.max_cycles,
                    last_rule,
                });
            }

            let rule = &rule_set.rules()[selected];
            debug!(
                cycle = context.session.cycle + 1,
                matched = matches.len(),
                rule = rule.name.as_str(),
                salience = rule.salience,
                "firing rule"
            );
            self.evaluator.fire(selected, &mut context)?;
            context.session.cycle += 1;
            fired.push(rule.name.clone());

            if context.session.complete {
                break Outcome::Completed;
            }
        };

        let cycles = context.session.cycle;
        let retracted = std::mem::take(&mut context.session.retracted);
        info!(?outcome, cycles, fired = fired.len(), "session finished");

        Ok(ExecutionReport {
            rule_set: rule_set.name().to_string(),
            version: rule_set.version().to_string(),
            outcome,
            cycles,
            fired,
            retracted,
        })
    }

    /// Rules whose condition currently holds, in the order they would fire.
    ///
    /// Runs no actions and leaves the knowledge base untouched; retracted
    /// rules are skipped.
    pub fn fetch_matching_rules<'k>(
        &self,
        facts: &mut DataContext,
        knowledge_base: &'k KnowledgeBase,
    ) -> FerruleResult<Vec<&'k Rule>> {
        let rule_set: &RuleSet = knowledge_base.rule_set();
        let mut active = knowledge_base.activation().to_vec();
        let mut session = Session::default();
        let mut context = EvaluationContext::new(facts, rule_set, &mut active, &mut session);

        let matches = self.evaluator.matching_rules(&mut context)?;
        Ok(matches
            .into_iter()
            .map(|index| &rule_set.rules()[index])
            .collect())
    }
}
