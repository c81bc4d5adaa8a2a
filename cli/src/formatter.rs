use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, Row, Table};
use ferrule::{ExecutionReport, KnowledgeBase, Outcome, Rule, RuleSet};
use std::collections::BTreeMap;

pub struct Formatter {}

impl Default for Formatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter {
    pub fn new() -> Self {
        Self {}
    }

    /// Fired rules in firing order, followed by how the session ended
    pub fn format_report(&self, report: &ExecutionReport, kb: &KnowledgeBase) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "Rule set: {}@{}\n\n",
            report.rule_set, report.version
        ));

        if report.fired.is_empty() {
            output.push_str("No rules fired.\n");
        } else {
            let mut table = rule_table(&["Cycle", "Rule", "Salience"]);
            for (cycle, name) in report.fired.iter().enumerate() {
                let salience = kb
                    .rule_set()
                    .rule(name)
                    .map(|rule| rule.salience.to_string())
                    .unwrap_or_default();
                table.add_row(vec![
                    Cell::new(cycle + 1).set_alignment(CellAlignment::Right),
                    Cell::new(name),
                    Cell::new(salience).set_alignment(CellAlignment::Right),
                ]);
            }
            output.push_str(&table.to_string());
            output.push('\n');
        }

        let outcome = match report.outcome {
            Outcome::Quiescent => "quiescent",
            Outcome::Completed => "completed",
        };
        output.push_str(&format!(
            "\nOutcome: {} after {} cycle(s)\n",
            outcome, report.cycles
        ));
        if !report.retracted.is_empty() {
            output.push_str(&format!("Retracted: {}\n", report.retracted.join(", ")));
        }
        output.push('\n');
        output
    }

    /// Final facts as pretty-printed JSON, one key per fact
    pub fn format_facts(&self, facts: &BTreeMap<String, serde_json::Value>) -> String {
        let object: serde_json::Map<String, serde_json::Value> = facts
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        format!("{:#}", serde_json::Value::Object(object))
    }

    pub fn format_matching(&self, rules: &[&Rule]) -> String {
        if rules.is_empty() {
            return "No rules match.\n".to_string();
        }

        let mut table = rule_table(&["#", "Rule", "Salience", "Description"]);
        for (position, rule) in rules.iter().enumerate() {
            table.add_row(vec![
                Cell::new(position + 1).set_alignment(CellAlignment::Right),
                Cell::new(&rule.name),
                Cell::new(rule.salience).set_alignment(CellAlignment::Right),
                Cell::new(rule.description()),
            ]);
        }
        format!("{}\n", table)
    }

    pub fn format_rule_set(&self, rule_set: &RuleSet) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "Rule set: {}@{}\n\n",
            rule_set.name(),
            rule_set.version()
        ));
        output.push_str(&format!("rules ({}):\n", rule_set.len()));
        for rule in rule_set.rules() {
            output.push_str(&format!("\n{}\n", rule));
        }
        output
    }

    pub fn format_workspace_summary(&self, file_count: usize, stats: &[(String, usize)]) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "Workspace contains {} files, {} rule sets\n\n",
            file_count,
            stats.len()
        ));
        for (name, rules) in stats {
            output.push_str(&format!("{}: {} rules\n", name, rules));
        }
        output
    }
}

fn rule_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(Row::from(
        headers
            .iter()
            .map(|header| Cell::new(header).set_alignment(CellAlignment::Left))
            .collect::<Vec<_>>(),
    ));
    table
}
