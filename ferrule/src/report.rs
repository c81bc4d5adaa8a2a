use serde::Serialize;

/// How a successful execution ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// No active rule matched
    Quiescent,
    /// A rule called `Complete()`
    Completed,
}

/// Summary of one `Engine::execute` call
///
/// Facts are mutated in place; the report only records what happened.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionReport {
    pub rule_set: String,
    pub version: String,
    pub outcome: Outcome,
    /// Number of rules fired
    pub cycles: u64,
    /// Names of fired rules, in firing order
    pub fired: Vec<String>,
    /// Names of rules retracted during the session, in retraction order
    pub retracted: Vec<String>,
}

impl ExecutionReport {
    pub fn has_fired(&self, rule: &str) -> bool {
        self.fired.iter().any(|name| name == rule)
    }
}
