use crate::parser::parse;
use crate::semantic::*;
use crate::ResourceLimits;

fn parse_ok(code: &str) -> Vec<Rule> {
    parse(code, "test.grl", &ResourceLimits::default()).unwrap()
}

fn condition_of(code: &str) -> String {
    parse_ok(code)[0].condition.to_string()
}

#[test]
fn test_parse_simple_rule() {
    let rules = parse_ok(
        r#"rule HondaRule1 "Expensive Hondas" {
    When
        Item.Discount == 0
    Then
        Item.Discount = 30;
}"#,
    );
    assert_eq!(rules.len(), 1);
    let rule = &rules[0];
    assert_eq!(rule.name, "HondaRule1");
    assert_eq!(rule.description(), "Expensive Hondas");
    assert_eq!(rule.salience, DEFAULT_SALIENCE);
    assert_eq!(rule.actions.len(), 1);
    assert_eq!(rule.span.line, 1);
}

#[test]
fn test_parse_rule_without_description() {
    let rules = parse_ok("rule R1 { when A.X < 4 then A.Y = 1; }");
    assert_eq!(rules[0].description, None);
    assert_eq!(rules[0].description(), "");
}

#[test]
fn test_parse_negative_salience() {
    let rules = parse_ok(
        r#"rule Low "low" salience -8 { When A.B Then A.C = 1; }
rule High salience 10 { When A.B Then A.C = 2; }"#,
    );
    assert_eq!(rules[0].salience, -8);
    assert_eq!(rules[1].salience, 10);
}

#[test]
fn test_parse_multiple_rules_keep_declaration_order() {
    let rules = parse_ok(
        r#"
rule First { when A.X == 1 then A.X = 2; }
rule Second { when A.X == 2 then A.X = 3; }
rule Third { when A.X == 3 then A.X = 4; }
"#,
    );
    let names: Vec<_> = rules.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["First", "Second", "Third"]);
}

#[test]
fn test_empty_source_has_no_rules() {
    assert!(parse_ok("").is_empty());
    assert!(parse_ok("  // nothing here\n/* still nothing */ ").is_empty());
}

#[test]
fn test_operator_precedence() {
    assert_eq!(
        condition_of("rule R { when a.X + b.Y * 2 > 3 && !c.Z || d.W then a.X = 1; }"),
        "((((a.X + (b.Y * 2)) > 3) && !c.Z) || d.W)"
    );
}

#[test]
fn test_arithmetic_is_left_associative() {
    assert_eq!(
        condition_of("rule R { when A.X - 1 - 2 == A.Y / 2 / 3 then A.X = 1; }"),
        "(((A.X - 1) - 2) == ((A.Y / 2) / 3))"
    );
}

#[test]
fn test_parentheses_override_precedence() {
    assert_eq!(
        condition_of(
            r#"rule R { when Item.Discount == 0 && (Item.Name == "Hero" || Item.Name == "Suziki") then Item.Discount = 40; }"#
        ),
        r#"((Item.Discount == 0) && ((Item.Name == "Hero") || (Item.Name == "Suziki")))"#
    );
}

#[test]
fn test_negative_literals_are_folded() {
    let rules = parse_ok("rule R { when A.X > -5 && A.Y < -2.5 then A.X = -A.Y; }");
    let ExpressionKind::LogicalAnd(left, right) = &rules[0].condition.kind else {
        panic!("expected &&");
    };
    let ExpressionKind::Comparison(_, _, five) = &left.kind else {
        panic!("expected comparison");
    };
    assert_eq!(five.kind, ExpressionKind::Literal(Literal::Integer(-5)));
    let ExpressionKind::Comparison(_, _, half) = &right.kind else {
        panic!("expected comparison");
    };
    assert_eq!(half.kind, ExpressionKind::Literal(Literal::Float(-2.5)));

    let StatementKind::Assignment { value, .. } = &rules[0].actions[0].kind else {
        panic!("expected assignment");
    };
    assert!(matches!(
        value.kind,
        ExpressionKind::Unary(UnaryOperator::Negate, _)
    ));
}

#[test]
fn test_member_index_and_call_chains() {
    let rules = parse_ok(
        r#"rule R {
    when
        UserInputs.ClientRestrictions["Include Geography"] && Pogo.GetStringLength(Pogo.InVal) < 4
    then
        Pogo.OutVal = Pogo.AppendString(Pogo.InVal, "Grooling");
        Complete();
}"#,
    );
    let rule = &rules[0];
    assert_eq!(
        rule.condition.to_string(),
        r#"(UserInputs.ClientRestrictions["Include Geography"] && (Pogo.GetStringLength(Pogo.InVal) < 4))"#
    );
    assert_eq!(
        rule.actions[0].to_string(),
        r#"Pogo.OutVal = Pogo.AppendString(Pogo.InVal, "Grooling");"#
    );

    let StatementKind::Call(call) = &rule.actions[1].kind else {
        panic!("expected call statement");
    };
    assert!(matches!(
        &call.kind,
        ExpressionKind::Call { receiver: None, name, args } if name == "Complete" && args.is_empty()
    ));
}

#[test]
fn test_keywords_allowed_as_member_names() {
    let rules = parse_ok("rule R { when Order.when == 1 then Order.then = Order.rule; }");
    assert_eq!(rules[0].condition.to_string(), "(Order.when == 1)");
    assert_eq!(rules[0].actions[0].to_string(), "Order.then = Order.rule;");
}

#[test]
fn test_index_assignment_target() {
    let rules = parse_ok(r#"rule R { when true then AO["total"] = AO["a"] + AO["b"]; }"#);
    let StatementKind::Assignment { target, .. } = &rules[0].actions[0].kind else {
        panic!("expected assignment");
    };
    assert!(matches!(target.kind, ExpressionKind::Index { .. }));
    assert_eq!(target.root_identifier(), Some("AO"));
}

#[test]
fn test_keywords_are_case_insensitive() {
    let rules = parse_ok("RULE R SALIENCE 3 { WHEN A.X THEN A.Y = true; }");
    assert_eq!(rules[0].salience, 3);
}

#[test]
fn test_comments_between_tokens() {
    let rules = parse_ok(
        r#"
// leading comment
rule R /* inline */ "desc" {
    when
        A.X == 1 // trailing
    then
        /* before action */ A.X = 2;
}
"#,
    );
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].span.line, 3);
}

#[test]
fn test_rule_display_round_trips() {
    let code = r#"rule Addition "Should perform addition" salience 2 {
    When
        ((AO.Result == 0) && (AO.Operation == "addition"))
    Then
        AO.Result = (AO.OperandA + AO.OperandB);
}"#;
    let rules = parse_ok(code);
    assert_eq!(rules[0].to_string(), code);

    let again = parse_ok(&rules[0].to_string());
    assert_eq!(again[0].condition, rules[0].condition);
}

#[test]
fn test_string_escapes_in_rules() {
    let rules = parse_ok(r#"rule R { when A.S == "say \"hi\"\n" then A.S = "a\\b"; }"#);
    let ExpressionKind::Comparison(_, _, right) = &rules[0].condition.kind else {
        panic!("expected comparison");
    };
    assert_eq!(
        right.kind,
        ExpressionKind::Literal(Literal::Text("say \"hi\"\n".to_string()))
    );
}
