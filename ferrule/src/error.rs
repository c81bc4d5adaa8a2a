use crate::ast::Span;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Detailed error information with source location
#[derive(Debug, Clone)]
pub struct ErrorDetails {
    pub message: String,
    pub span: Span,
    pub source_id: String,
    pub source_text: Arc<str>,
    /// Rule the error belongs to, when it could be attributed to one
    pub rule_name: Option<String>,
    pub suggestion: Option<String>,
}

impl ErrorDetails {
    pub fn new(
        message: impl Into<String>,
        span: Span,
        source_id: impl Into<String>,
        source_text: Arc<str>,
    ) -> Self {
        Self {
            message: message.into(),
            span,
            source_id: source_id.into(),
            source_text,
            rule_name: None,
            suggestion: None,
        }
    }

    pub fn in_rule(mut self, rule_name: impl Into<String>) -> Self {
        self.rule_name = Some(rule_name.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " (suggestion: {})", suggestion)?;
        }
        if let Some(rule) = &self.rule_name {
            write!(f, " in rule '{}'", rule)?;
        }
        write!(
            f,
            " at {}:{}:{}",
            self.source_id, self.span.line, self.span.col
        )
    }
}

/// Result type for Ferrule operations
pub type FerruleResult<T> = Result<T, FerruleError>;

/// Error types for the Ferrule rule engine with source location tracking
#[derive(Debug, Clone, Error)]
pub enum FerruleError {
    /// Malformed token or unrecognized character in rule source
    #[error("Lex error: {0}")]
    Lex(Box<ErrorDetails>),

    /// Grammar violation while building the AST
    #[error("Parse error: {0}")]
    Parse(Box<ErrorDetails>),

    /// Rule set is well-formed but cannot be compiled (duplicate names, bad salience, ...)
    #[error("Compile error: {0}")]
    Compile(Box<ErrorDetails>),

    /// Failure while evaluating a condition or executing an action
    #[error("Evaluation error: {0}")]
    Eval(Box<ErrorDetails>),

    /// The fixpoint loop did not converge within the configured bound
    #[error(
        "Cycle limit exceeded: rules still matching after {max_cycles} cycles (last fired rule: '{last_rule}')"
    )]
    CycleLimitExceeded { max_cycles: u64, last_rule: String },

    /// A fact with this name is already bound in the data context
    #[error("Fact '{0}' is already bound in this data context")]
    DuplicateFact(String),

    #[error("Resource limit exceeded: {limit_name} (limit: {limit_value}, actual: {actual_value}). {suggestion}")]
    ResourceLimitExceeded {
        limit_name: String,
        limit_value: String,
        actual_value: String,
        suggestion: String,
    },

    /// Engine error without specific source location
    #[error("Engine error: {0}")]
    Engine(String),

    /// Multiple errors collected together
    #[error("{}", format_multiple(.0))]
    MultipleErrors(Vec<FerruleError>),
}

fn format_multiple(errors: &[FerruleError]) -> String {
    let mut out = String::from("Multiple errors:");
    for (i, error) in errors.iter().enumerate() {
        out.push_str(&format!("\n  {}. {}", i + 1, error));
    }
    out
}

impl FerruleError {
    pub fn lex(details: ErrorDetails) -> Self {
        Self::Lex(Box::new(details))
    }

    pub fn parse(details: ErrorDetails) -> Self {
        Self::Parse(Box::new(details))
    }

    pub fn compile(details: ErrorDetails) -> Self {
        Self::Compile(Box::new(details))
    }

    pub fn eval(details: ErrorDetails) -> Self {
        Self::Eval(Box::new(details))
    }

    /// Source-located details, if this error carries any
    pub fn details(&self) -> Option<&ErrorDetails> {
        match self {
            FerruleError::Lex(details)
            | FerruleError::Parse(details)
            | FerruleError::Compile(details)
            | FerruleError::Eval(details) => Some(details),
            _ => None,
        }
    }

    /// Attach a suggestion to a source-located error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        if let FerruleError::Lex(details)
        | FerruleError::Parse(details)
        | FerruleError::Compile(details)
        | FerruleError::Eval(details) = &mut self
        {
            details.suggestion = Some(suggestion.into());
        }
        self
    }

    /// Collapse a list of errors: one error stays itself, more become `MultipleErrors`
    pub(crate) fn from_many(mut errors: Vec<FerruleError>) -> Option<FerruleError> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(FerruleError::MultipleErrors(errors)),
        }
    }
}

impl From<std::fmt::Error> for FerruleError {
    fn from(err: std::fmt::Error) -> Self {
        FerruleError::Engine(format!("Format error: {}", err))
    }
}
