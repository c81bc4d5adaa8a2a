use super::lexer::{Token, TokenKind};
use super::Parser;
use crate::error::FerruleResult;
use crate::semantic::*;

/// Parse a full expression: `||` binds loosest, unary operators tightest
pub(crate) fn parse_expression(p: &mut Parser) -> FerruleResult<Expression> {
    p.push_depth()?;
    let result = parse_or_expression(p);
    p.pop_depth();
    result
}

/// Parse `operand (op operand)*` into a left-leaning tree.
///
/// Every folded operator adds a level to the tree, so each one counts
/// against the depth limit until the whole chain is built.
fn fold_left<O>(
    p: &mut Parser,
    operand: fn(&mut Parser) -> FerruleResult<Expression>,
    next_operator: fn(&mut Parser) -> Option<O>,
    build: fn(Box<Expression>, O, Box<Expression>) -> ExpressionKind,
) -> FerruleResult<Expression> {
    let mut left = operand(p)?;
    let mut folded = 0;
    let result = loop {
        let Some(op) = next_operator(p) else {
            break Ok(left);
        };
        if let Err(e) = p.push_depth() {
            break Err(e);
        }
        folded += 1;
        let right = match operand(p) {
            Ok(right) => right,
            Err(e) => break Err(e),
        };
        let span = left.span.to(&right.span);
        left = Expression::new(build(Box::new(left), op, Box::new(right)), span);
    };
    for _ in 0..folded {
        p.pop_depth();
    }
    result
}

fn parse_or_expression(p: &mut Parser) -> FerruleResult<Expression> {
    fold_left(
        p,
        parse_and_expression,
        |p| p.eat_operator("||").then_some(()),
        |left, (), right| ExpressionKind::LogicalOr(left, right),
    )
}

fn parse_and_expression(p: &mut Parser) -> FerruleResult<Expression> {
    fold_left(
        p,
        parse_comparison,
        |p| p.eat_operator("&&").then_some(()),
        |left, (), right| ExpressionKind::LogicalAnd(left, right),
    )
}

fn comparison_operator(token: &Token) -> Option<ComparisonOperator> {
    if token.kind != TokenKind::Operator {
        return None;
    }
    match token.text.as_str() {
        "==" => Some(ComparisonOperator::Equal),
        "!=" => Some(ComparisonOperator::NotEqual),
        ">" => Some(ComparisonOperator::GreaterThan),
        "<" => Some(ComparisonOperator::LessThan),
        ">=" => Some(ComparisonOperator::GreaterThanOrEqual),
        "<=" => Some(ComparisonOperator::LessThanOrEqual),
        _ => None,
    }
}

fn parse_comparison(p: &mut Parser) -> FerruleResult<Expression> {
    let left = parse_additive(p)?;
    let Some(op) = comparison_operator(p.peek()) else {
        return Ok(left);
    };
    p.advance();
    let right = parse_additive(p)?;

    let next = p.peek();
    if comparison_operator(next).is_some() {
        return Err(p.error_at(
            format!(
                "comparison operators cannot be chained, found `{}` after `{}`; use parentheses or `&&`",
                next.text,
                op.symbol()
            ),
            next.span.clone(),
        ));
    }

    let span = left.span.to(&right.span);
    Ok(Expression::new(
        ExpressionKind::Comparison(Box::new(left), op, Box::new(right)),
        span,
    ))
}

fn parse_additive(p: &mut Parser) -> FerruleResult<Expression> {
    fold_left(
        p,
        parse_multiplicative,
        |p| {
            if p.eat_operator("+") {
                Some(ArithmeticOperation::Add)
            } else if p.eat_operator("-") {
                Some(ArithmeticOperation::Subtract)
            } else {
                None
            }
        },
        ExpressionKind::Arithmetic,
    )
}

fn parse_multiplicative(p: &mut Parser) -> FerruleResult<Expression> {
    fold_left(
        p,
        parse_unary,
        |p| {
            if p.eat_operator("*") {
                Some(ArithmeticOperation::Multiply)
            } else if p.eat_operator("/") {
                Some(ArithmeticOperation::Divide)
            } else if p.eat_operator("%") {
                Some(ArithmeticOperation::Modulo)
            } else {
                None
            }
        },
        ExpressionKind::Arithmetic,
    )
}

fn parse_unary(p: &mut Parser) -> FerruleResult<Expression> {
    let op = if p.peek().is_operator("-") {
        UnaryOperator::Negate
    } else if p.peek().is_operator("!") {
        UnaryOperator::Not
    } else {
        return parse_primary(p);
    };
    let start = p.advance().span.clone();

    p.push_depth()?;
    let operand = parse_unary(p);
    p.pop_depth();
    let operand = operand?;
    let span = start.to(&operand.span);

    // Fold `-5` and `-2.5` into literals
    if op == UnaryOperator::Negate {
        match &operand.kind {
            ExpressionKind::Literal(Literal::Integer(n)) => {
                if let Some(negated) = n.checked_neg() {
                    return Ok(Expression::new(
                        ExpressionKind::Literal(Literal::Integer(negated)),
                        span,
                    ));
                }
            }
            ExpressionKind::Literal(Literal::Float(n)) => {
                return Ok(Expression::new(
                    ExpressionKind::Literal(Literal::Float(-n)),
                    span,
                ));
            }
            _ => {}
        }
    }

    Ok(Expression::new(
        ExpressionKind::Unary(op, Box::new(operand)),
        span,
    ))
}

fn parse_primary(p: &mut Parser) -> FerruleResult<Expression> {
    let token = p.peek();
    match token.kind {
        TokenKind::Literal => {
            p.advance();
            let literal = token.literal.clone().unwrap_or(Literal::Nil);
            Ok(Expression::new(
                ExpressionKind::Literal(literal),
                token.span.clone(),
            ))
        }
        TokenKind::Identifier => parse_member_chain(p),
        TokenKind::Punctuation if token.text == "(" => {
            p.advance();
            let inner = parse_expression(p)?;
            let close = p.expect_punctuation(")")?;
            Ok(Expression::new(inner.kind, token.span.to(&close.span)))
        }
        _ => Err(p.error_here("expected expression")),
    }
}

/// `IDENT ("." IDENT | "[" expr "]" | "(" args ")")*`
///
/// A call is only recognised directly after a name, so `Retract("x")` and
/// `A.B.Touch()` are calls while `A[0](1)` is not. Every `.` or `[` link
/// nests the expression one level deeper.
pub(crate) fn parse_member_chain(p: &mut Parser) -> FerruleResult<Expression> {
    let mut links = 0;
    let result = parse_chain_links(p, &mut links);
    for _ in 0..links {
        p.pop_depth();
    }
    result
}

fn parse_chain_links(p: &mut Parser, links: &mut usize) -> FerruleResult<Expression> {
    let head = p.expect_identifier("identifier")?;
    let mut expr = if p.peek().is_punctuation("(") {
        let args = parse_arguments(p)?;
        Expression::new(
            ExpressionKind::Call {
                receiver: None,
                name: head.text.clone(),
                args,
            },
            head.span.to(&p.previous_span()),
        )
    } else {
        Expression::new(
            ExpressionKind::Identifier(head.text.clone()),
            head.span.clone(),
        )
    };

    loop {
        if p.eat_punctuation(".") {
            p.push_depth()?;
            *links += 1;
            let member = p.peek();
            let Some(name) = member.as_name() else {
                return Err(p.error_here("expected member name after `.`"));
            };
            p.advance();
            let name = name.to_string();
            if p.peek().is_punctuation("(") {
                let args = parse_arguments(p)?;
                let span = expr.span.to(&p.previous_span());
                expr = Expression::new(
                    ExpressionKind::Call {
                        receiver: Some(Box::new(expr)),
                        name,
                        args,
                    },
                    span,
                );
            } else {
                let span = expr.span.to(&member.span);
                expr = Expression::new(
                    ExpressionKind::Member {
                        object: Box::new(expr),
                        name,
                    },
                    span,
                );
            }
        } else if p.eat_punctuation("[") {
            p.push_depth()?;
            *links += 1;
            let key = parse_expression(p)?;
            let close = p.expect_punctuation("]")?;
            let span = expr.span.to(&close.span);
            expr = Expression::new(
                ExpressionKind::Index {
                    object: Box::new(expr),
                    key: Box::new(key),
                },
                span,
            );
        } else {
            return Ok(expr);
        }
    }
}

fn parse_arguments(p: &mut Parser) -> FerruleResult<Vec<Expression>> {
    p.expect_punctuation("(")?;
    let mut args = Vec::new();
    if p.eat_punctuation(")") {
        return Ok(args);
    }
    loop {
        args.push(parse_expression(p)?);
        if p.eat_punctuation(",") {
            continue;
        }
        if p.peek().is_punctuation(")") {
            p.advance();
            return Ok(args);
        }
        return Err(p.error_here("expected `,` or `)` in argument list"));
    }
}
