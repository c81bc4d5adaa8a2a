use super::expressions::{parse_expression, parse_member_chain};
use super::lexer::TokenKind;
use super::Parser;
use crate::error::FerruleResult;
use crate::semantic::*;

/// `rule NAME "description"? (salience INT)? { When expr Then stmt+ }`
pub(crate) fn parse_rule(p: &mut Parser) -> FerruleResult<Rule> {
    let start = p.expect_keyword("rule")?.span.clone();
    let name = p.expect_identifier("rule name")?.text.clone();
    p.set_current_rule(&name);

    let description = match &p.peek().literal {
        Some(Literal::Text(text)) => {
            p.advance();
            Some(text.clone())
        }
        _ => None,
    };

    let salience = if p.peek().is_keyword("salience") {
        p.advance();
        parse_salience(p)?
    } else {
        DEFAULT_SALIENCE
    };

    p.expect_punctuation("{")?;
    p.expect_keyword("when")?;
    let condition = parse_expression(p)?;
    p.expect_keyword("then")?;

    let mut actions = Vec::new();
    while !p.peek().is_punctuation("}") && !p.at_eof() {
        actions.push(parse_statement(p)?);
    }
    if actions.is_empty() {
        return Err(p.error_here("expected at least one action after `Then`"));
    }
    let end = p.expect_punctuation("}")?;

    Ok(Rule {
        name,
        description,
        salience,
        condition,
        actions,
        span: start.to(&end.span),
    })
}

fn parse_salience(p: &mut Parser) -> FerruleResult<i64> {
    let negative = p.eat_operator("-");
    let token = p.peek();
    let value = match (&token.kind, &token.literal) {
        (TokenKind::Literal, Some(Literal::Integer(n))) => *n,
        (TokenKind::Literal, Some(other)) => {
            let kind = match other {
                Literal::Float(_) => "float",
                Literal::Text(_) => "string",
                Literal::Boolean(_) => "boolean",
                _ => "nil",
            };
            return Err(p.compile_error_at(
                format!("salience must be an integer, found {} {}", kind, token.text),
                token.span.clone(),
            ));
        }
        _ => return Err(p.error_here("expected integer salience")),
    };
    p.advance();
    // A lexed integer is never negative, so negation cannot overflow
    Ok(if negative { -value } else { value })
}

/// `target = expr;` or `call(args);`
fn parse_statement(p: &mut Parser) -> FerruleResult<Statement> {
    if p.peek().kind != TokenKind::Identifier {
        return Err(p.error_here("expected assignment or call statement"));
    }
    let target = parse_member_chain(p)?;

    let kind = if p.peek().is_operator("=") {
        match &target.kind {
            ExpressionKind::Member { .. } | ExpressionKind::Index { .. } => {}
            ExpressionKind::Identifier(name) => {
                return Err(p.error_at(
                    format!(
                        "cannot assign to fact '{}' itself; assign to one of its fields",
                        name
                    ),
                    target.span.clone(),
                ));
            }
            _ => {
                return Err(p.error_at(
                    format!("cannot assign to the result of a call '{}'", target),
                    target.span.clone(),
                ));
            }
        }
        p.advance();
        let value = parse_expression(p)?;
        StatementKind::Assignment { target, value }
    } else if matches!(target.kind, ExpressionKind::Call { .. }) {
        StatementKind::Call(target)
    } else {
        return Err(p.error_here("expected `=` or a call"));
    };

    let end = p.expect_punctuation(";")?;
    let span = match &kind {
        StatementKind::Assignment { target, .. } => target.span.to(&end.span),
        StatementKind::Call(call) => call.span.to(&end.span),
    };
    Ok(Statement { kind, span })
}
