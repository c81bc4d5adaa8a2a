//! Tokenizer for the rule language
//!
//! The pest grammar in `grl.pest` recognises tokens; this module turns the
//! resulting pairs into a flat `Vec<Token>` terminated by an `Eof` token and
//! reports malformed input as `FerruleError::Lex`.

use super::literals;
use super::Source;
use crate::ast::{LineColumns, Span};
use crate::error::{FerruleError, FerruleResult};
use crate::semantic::Literal;
use pest::Parser;
use pest_derive::Parser;
use std::fmt;

#[derive(Parser)]
#[grammar = "src/parser/grl.pest"]
pub struct GrlLexer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    /// `rule`, `when`, `then`, `salience` (case-insensitive)
    Keyword,
    /// Numbers, strings, `true`, `false`, `nil`
    Literal,
    Operator,
    Punctuation,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Raw source text of the token
    pub text: String,
    /// Decoded value for literal tokens
    pub literal: Option<Literal>,
    pub span: Span,
}

impl Token {
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text.eq_ignore_ascii_case(keyword)
    }

    pub fn is_operator(&self, op: &str) -> bool {
        self.kind == TokenKind::Operator && self.text == op
    }

    pub fn is_punctuation(&self, punct: &str) -> bool {
        self.kind == TokenKind::Punctuation && self.text == punct
    }

    /// Identifier text, also accepting keywords (usable as member names after `.`)
    pub fn as_name(&self) -> Option<&str> {
        match self.kind {
            TokenKind::Identifier | TokenKind::Keyword => Some(&self.text),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => write!(f, "end of input"),
            TokenKind::Identifier => write!(f, "identifier `{}`", self.text),
            TokenKind::Keyword => write!(f, "keyword `{}`", self.text),
            TokenKind::Literal => write!(f, "literal `{}`", self.text),
            TokenKind::Operator | TokenKind::Punctuation => write!(f, "`{}`", self.text),
        }
    }
}

/// Split rule source into tokens
pub fn tokenize(source: &Source) -> FerruleResult<Vec<Token>> {
    let text: &str = &source.text;
    let pairs = GrlLexer::parse(Rule::tokens, text).map_err(|e| {
        let offset = match e.location {
            pest::error::InputLocation::Pos(pos) => pos,
            pest::error::InputLocation::Span((start, _)) => start,
        };
        let span = Span::at_offset(text, offset);
        FerruleError::lex(source.details(describe_bad_input(text, offset), span))
    })?;

    let mut lines = LineColumns::new(text);
    let mut tokens = Vec::new();
    for pair in pairs.flatten() {
        let span = lines.span(pair.as_span());
        let raw = pair.as_str().to_string();
        let token = match pair.as_rule() {
            Rule::identifier => Token {
                kind: TokenKind::Identifier,
                text: raw,
                literal: None,
                span,
            },
            Rule::keyword => {
                let literal = match raw.as_str() {
                    "true" => Some(Literal::Boolean(true)),
                    "false" => Some(Literal::Boolean(false)),
                    "nil" => Some(Literal::Nil),
                    _ => None,
                };
                let kind = if literal.is_some() {
                    TokenKind::Literal
                } else {
                    TokenKind::Keyword
                };
                Token {
                    kind,
                    text: raw,
                    literal,
                    span,
                }
            }
            Rule::integer => {
                let value = literals::parse_integer(&raw)
                    .map_err(|msg| FerruleError::lex(source.details(msg, span.clone())))?;
                Token {
                    kind: TokenKind::Literal,
                    text: raw,
                    literal: Some(Literal::Integer(value)),
                    span,
                }
            }
            Rule::float => {
                let value = literals::parse_float(&raw)
                    .map_err(|msg| FerruleError::lex(source.details(msg, span.clone())))?;
                Token {
                    kind: TokenKind::Literal,
                    text: raw,
                    literal: Some(Literal::Float(value)),
                    span,
                }
            }
            Rule::string => {
                let inner = &raw[1..raw.len() - 1];
                let value = literals::unescape_string(inner).map_err(|(msg, at)| {
                    // +1 skips the opening quote
                    let offset = span.start + 1 + at;
                    FerruleError::lex(source.details(msg, Span::at_offset(text, offset)))
                })?;
                Token {
                    kind: TokenKind::Literal,
                    text: raw,
                    literal: Some(Literal::Text(value)),
                    span,
                }
            }
            Rule::operator => Token {
                kind: TokenKind::Operator,
                text: raw,
                literal: None,
                span,
            },
            Rule::punctuation => Token {
                kind: TokenKind::Punctuation,
                text: raw,
                literal: None,
                span,
            },
            _ => continue,
        };
        tokens.push(token);
    }

    let end = Span::at_offset(text, text.len());
    tokens.push(Token {
        kind: TokenKind::Eof,
        text: String::new(),
        literal: None,
        span: end,
    });
    Ok(tokens)
}

fn describe_bad_input(text: &str, offset: usize) -> String {
    let rest = &text[offset.min(text.len())..];
    match rest.chars().next() {
        None => "unexpected end of input".to_string(),
        Some('"') => "unterminated string literal".to_string(),
        Some(c) if c.is_ascii_digit() => {
            let literal: String = rest
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '.')
                .collect();
            format!("malformed numeric literal '{}'", literal)
        }
        Some(c) => format!("unrecognized character '{}'", c),
    }
}
