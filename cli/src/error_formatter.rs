use ariadne::{Color, Label, Report, ReportKind, Source};
use ferrule::{ErrorDetails, FerruleError};

/// Format a FerruleError for the terminal, with a source excerpt when the error has a location
pub fn format_error(error: &FerruleError) -> String {
    match error {
        FerruleError::Lex(details)
        | FerruleError::Parse(details)
        | FerruleError::Compile(details)
        | FerruleError::Eval(details) => {
            let error_type = match error {
                FerruleError::Lex(_) => "Lex error",
                FerruleError::Parse(_) => "Parse error",
                FerruleError::Compile(_) => "Compile error",
                _ => "Evaluation error",
            };
            render_located(error_type, details).unwrap_or_else(|| error.to_string())
        }
        FerruleError::CycleLimitExceeded {
            max_cycles,
            last_rule,
        } => {
            let mut result = format!(
                "Cycle limit exceeded: rules still matching after {} cycles",
                max_cycles
            );
            if !last_rule.is_empty() {
                result.push_str(&format!("\n  Last fired rule: {}", last_rule));
            }
            result.push_str("\n  Retract rules once they have fired, or raise --max-cycles");
            result
        }
        FerruleError::ResourceLimitExceeded {
            limit_name,
            limit_value,
            actual_value,
            suggestion,
        } => format!(
            "Resource limit exceeded: {}\n  Limit: {}\n  Actual: {}\n  {}",
            limit_name, limit_value, actual_value, suggestion
        ),
        FerruleError::DuplicateFact(_) | FerruleError::Engine(_) => error.to_string(),
        FerruleError::MultipleErrors(errors) => {
            let mut result = format!("{} errors occurred:\n\n", errors.len());
            for error in errors {
                result.push_str(&format_error(error));
                result.push_str("\n\n");
            }
            result
        }
    }
}

fn render_located(error_type: &str, details: &ErrorDetails) -> Option<String> {
    let mut message = format!("{}: {}", error_type, details.message);
    match &details.rule_name {
        Some(rule) => message.push_str(&format!(
            " (in rule '{}', {}:{}:{})",
            rule, details.source_id, details.span.line, details.span.col
        )),
        None => message.push_str(&format!(
            " ({}:{}:{})",
            details.source_id, details.span.line, details.span.col
        )),
    }

    let source_id = details.source_id.as_str();
    let end = details.span.end.max(details.span.start + 1);
    let mut report = Report::build(ReportKind::Error, source_id, details.span.start)
        .with_message(message)
        .with_label(
            Label::new((source_id, details.span.start..end))
                .with_message("")
                .with_color(Color::Red),
        );

    if let Some(suggestion) = &details.suggestion {
        report = report.with_help(suggestion);
    }

    let mut output = Vec::new();
    report
        .finish()
        .write(
            (source_id, Source::from(details.source_text.as_ref())),
            &mut output,
        )
        .ok()?;
    Some(String::from_utf8_lossy(&output).to_string())
}
