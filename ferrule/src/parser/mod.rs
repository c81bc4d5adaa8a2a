use crate::ast::{DepthTracker, Span};
use crate::error::{ErrorDetails, FerruleError, FerruleResult};
use crate::resource_limits::ResourceLimits;
use crate::semantic::Rule;
use std::sync::Arc;

pub mod expressions;
pub mod lexer;
pub mod literals;
pub mod rules;

pub use lexer::{tokenize, Token, TokenKind};

/// Rule source text together with the identifier used in error messages
#[derive(Debug, Clone)]
pub struct Source {
    pub id: String,
    pub text: Arc<str>,
}

impl Source {
    pub fn new(id: impl Into<String>, text: impl Into<Arc<str>>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }

    pub fn details(&self, message: impl Into<String>, span: Span) -> ErrorDetails {
        ErrorDetails::new(message, span, self.id.clone(), Arc::clone(&self.text))
    }
}

/// Parse rule source into rules.
///
/// Every `rule` block is parsed independently. When a block fails the parser
/// skips ahead to the next `rule` keyword, so all broken rules are reported
/// together.
pub fn parse(content: &str, source_id: &str, limits: &ResourceLimits) -> FerruleResult<Vec<Rule>> {
    if content.len() > limits.max_source_bytes {
        return Err(FerruleError::ResourceLimitExceeded {
            limit_name: "max_source_bytes".to_string(),
            limit_value: format!(
                "{} bytes ({} MB)",
                limits.max_source_bytes,
                limits.max_source_bytes / (1024 * 1024)
            ),
            actual_value: format!(
                "{} bytes ({:.2} MB)",
                content.len(),
                content.len() as f64 / (1024.0 * 1024.0)
            ),
            suggestion: "Reduce source size or split rules into multiple rule sets".to_string(),
        });
    }

    let source = Source::new(source_id, content);
    let tokens = lexer::tokenize(&source)?;
    let mut parser = Parser::new(&tokens, &source, limits.max_expression_depth);
    parser.parse_rule_set()
}

/// Cursor over the token stream
pub(crate) struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    source: &'a Source,
    depth: DepthTracker,
    current_rule: Option<String>,
}

impl<'a> Parser<'a> {
    /// `tokens` must end with an `Eof` token, as produced by `tokenize`
    pub(crate) fn new(tokens: &'a [Token], source: &'a Source, max_depth: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            source,
            depth: DepthTracker::with_max_depth(max_depth),
            current_rule: None,
        }
    }

    fn parse_rule_set(&mut self) -> FerruleResult<Vec<Rule>> {
        let mut rules = Vec::new();
        let mut errors = Vec::new();

        while !self.at_eof() {
            self.current_rule = None;
            let result = if self.peek().is_keyword("rule") {
                rules::parse_rule(self)
            } else {
                Err(self.error_here("expected `rule`"))
            };
            match result {
                Ok(rule) => rules.push(rule),
                Err(e @ FerruleError::ResourceLimitExceeded { .. }) => return Err(e),
                Err(e) => {
                    errors.push(e);
                    self.recover();
                }
            }
        }

        match FerruleError::from_many(errors) {
            Some(err) => Err(err),
            None => Ok(rules),
        }
    }

    /// Skip to the next `rule` keyword that starts a block
    fn recover(&mut self) {
        self.advance();
        while !self.at_eof() {
            let previous_is_dot = self.tokens[self.pos - 1].is_punctuation(".");
            if self.peek().is_keyword("rule") && !previous_is_dot {
                return;
            }
            self.advance();
        }
    }

    pub(crate) fn peek(&self) -> &'a Token {
        self.peek_at(0)
    }

    pub(crate) fn peek_at(&self, offset: usize) -> &'a Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[(self.pos + offset).min(last)]
    }

    pub(crate) fn advance(&mut self) -> &'a Token {
        let token = self.peek();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn at_eof(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    /// Span of the most recently consumed token
    pub(crate) fn previous_span(&self) -> Span {
        match self.pos.checked_sub(1) {
            Some(i) => self.tokens[i].span.clone(),
            None => self.peek().span.clone(),
        }
    }

    pub(crate) fn eat_punctuation(&mut self, punct: &str) -> bool {
        if self.peek().is_punctuation(punct) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn eat_operator(&mut self, op: &str) -> bool {
        if self.peek().is_operator(op) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect_punctuation(&mut self, punct: &str) -> FerruleResult<&'a Token> {
        if self.peek().is_punctuation(punct) {
            Ok(self.advance())
        } else {
            Err(self.error_here(format!("expected `{}`", punct)))
        }
    }

    pub(crate) fn expect_keyword(&mut self, keyword: &str) -> FerruleResult<&'a Token> {
        if self.peek().is_keyword(keyword) {
            Ok(self.advance())
        } else {
            Err(self.error_here(format!("expected `{}`", keyword)))
        }
    }

    pub(crate) fn expect_identifier(&mut self, construct: &str) -> FerruleResult<&'a Token> {
        if self.peek().kind == TokenKind::Identifier {
            Ok(self.advance())
        } else {
            Err(self.error_here(format!("expected {}", construct)))
        }
    }

    pub(crate) fn set_current_rule(&mut self, name: &str) {
        self.current_rule = Some(name.to_string());
    }

    /// Parse error at the current token: "expected X, found Y"
    pub(crate) fn error_here(&self, expected: impl Into<String>) -> FerruleError {
        let token = self.peek();
        let message = format!("{}, found {}", expected.into(), token);
        self.error_at(message, token.span.clone())
    }

    pub(crate) fn error_at(&self, message: impl Into<String>, span: Span) -> FerruleError {
        let mut details = self.source.details(message, span);
        if let Some(rule) = &self.current_rule {
            details = details.in_rule(rule.clone());
        }
        FerruleError::parse(details)
    }

    pub(crate) fn compile_error_at(&self, message: impl Into<String>, span: Span) -> FerruleError {
        let mut details = self.source.details(message, span);
        if let Some(rule) = &self.current_rule {
            details = details.in_rule(rule.clone());
        }
        FerruleError::compile(details)
    }

    /// Enter one level of expression nesting
    pub(crate) fn push_depth(&mut self) -> FerruleResult<()> {
        self.depth
            .push_depth()
            .map_err(|reached| FerruleError::ResourceLimitExceeded {
                limit_name: "max_expression_depth".to_string(),
                limit_value: self.depth.max_depth().to_string(),
                actual_value: reached.to_string(),
                suggestion: "Simplify nested expressions to reduce depth".to_string(),
            })
    }

    pub(crate) fn pop_depth(&mut self) {
        self.depth.pop_depth();
    }
}
