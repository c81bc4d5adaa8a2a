use ferrule::{
    arg, expect_arity, impl_fact, DataContext, Engine, ExecutionReport, FerruleError, HostError,
    KnowledgeLibrary, Outcome, Value,
};

#[derive(Default)]
struct MyPoGo {
    in_val: String,
    out_val: String,
}

fn pogo_methods(_pogo: &mut MyPoGo, method: &str, args: &[Value]) -> Result<Value, HostError> {
    match method {
        "GetStringLength" => {
            expect_arity(method, args, 1)?;
            let text: String = arg(args, 0)?;
            Ok(Value::Integer(text.len() as i64))
        }
        "AppendString" => {
            expect_arity(method, args, 2)?;
            let head: String = arg(args, 0)?;
            let tail: String = arg(args, 1)?;
            Ok(Value::Text(format!("{}{}", head, tail)))
        }
        _ => Err(HostError::UnknownMethod {
            type_name: "MyPoGo".to_string(),
            method: method.to_string(),
        }),
    }
}

impl_fact!(MyPoGo {
    "InVal" => in_val,
    "OutVal" => out_val,
} methods = pogo_methods);

const FUNCTIONS_GRL: &str = r#"
rule Rule1 {
    when
        Pogo.GetStringLength(Pogo.InVal) < 4
    then
        Pogo.OutVal = Pogo.AppendString(Pogo.InVal, "Grooling");
        Complete();
}

rule Rule2 {
    when
        Pogo.GetStringLength(Pogo.InVal) > 4
    then
        Pogo.OutVal = Pogo.InVal;
        Complete();
}
"#;

#[test]
fn test_functions() {
    let cases = vec![("Go", "GoGrooling", "Rule1"), ("Google", "Google", "Rule2")];

    let mut library = KnowledgeLibrary::new();
    library
        .compile("FunctionOperationsTutorial", "0.0.1", FUNCTIONS_GRL.as_bytes())
        .unwrap();
    let engine = Engine::with_max_cycles(10);
    let mut kb = library
        .new_knowledge_base("FunctionOperationsTutorial", "0.0.1")
        .unwrap();

    for (input, want, rule) in cases {
        let mut pogo = MyPoGo {
            in_val: input.to_string(),
            ..Default::default()
        };
        let mut facts = DataContext::new();
        facts.add("Pogo", &mut pogo).unwrap();
        let report = engine.execute(&mut facts, &mut kb).unwrap();
        drop(facts);

        assert_eq!(report.outcome, Outcome::Completed);
        assert_eq!(report.fired, vec![rule]);
        assert_eq!(pogo.out_val, want);
    }
}

#[test]
fn test_no_rule_matches_four_letter_input() {
    let mut library = KnowledgeLibrary::new();
    library
        .compile("FunctionOperationsTutorial", "0.0.1", FUNCTIONS_GRL.as_bytes())
        .unwrap();
    let mut kb = library
        .new_knowledge_base("FunctionOperationsTutorial", "0.0.1")
        .unwrap();

    let mut pogo = MyPoGo {
        in_val: "Rust".to_string(),
        ..Default::default()
    };
    let mut facts = DataContext::new();
    facts.add("Pogo", &mut pogo).unwrap();
    let report = Engine::new().execute(&mut facts, &mut kb).unwrap();
    drop(facts);

    assert_eq!(report.outcome, Outcome::Quiescent);
    assert!(pogo.out_val.is_empty());
}

#[test]
fn test_method_errors_surface_as_eval_errors() {
    let mut library = KnowledgeLibrary::new();
    library
        .compile(
            "calls",
            "0.0.1",
            br#"rule Bad { when true then Pogo.OutVal = Pogo.AppendString(Pogo.InVal); }"#,
        )
        .unwrap();
    let mut kb = library.new_knowledge_base("calls", "0.0.1").unwrap();

    let mut pogo = MyPoGo::default();
    let mut facts = DataContext::new();
    facts.add("Pogo", &mut pogo).unwrap();
    let err = Engine::new().execute(&mut facts, &mut kb).unwrap_err();

    let details = err.details().unwrap();
    assert_eq!(
        details.message,
        "'AppendString' expects 2 argument(s), found 1"
    );
    assert_eq!(details.rule_name.as_deref(), Some("Bad"));
}

#[test]
fn test_unknown_method_is_reported() {
    let mut library = KnowledgeLibrary::new();
    library
        .compile(
            "calls",
            "0.0.1",
            br#"rule Bad { when Pogo.Reverse(Pogo.InVal) == "" then Complete(); }"#,
        )
        .unwrap();
    let mut kb = library.new_knowledge_base("calls", "0.0.1").unwrap();

    let mut pogo = MyPoGo::default();
    let mut facts = DataContext::new();
    facts.add("Pogo", &mut pogo).unwrap();
    let err = Engine::new().execute(&mut facts, &mut kb).unwrap_err();
    assert_eq!(
        err.details().unwrap().message,
        "no method 'Reverse' on MyPoGo"
    );
}

#[derive(Default)]
struct Basket {
    price: i64,
    quantity: i64,
    label: String,
    flagged: bool,
}

fn basket_methods(basket: &mut Basket, method: &str, args: &[Value]) -> Result<Value, HostError> {
    match method {
        "Total" => {
            expect_arity(method, args, 0)?;
            Ok(Value::Integer(basket.price * basket.quantity))
        }
        "Label" => {
            expect_arity(method, args, 0)?;
            Ok(Value::Text("from accessor".to_string()))
        }
        _ => Err(HostError::UnknownMethod {
            type_name: "Basket".to_string(),
            method: method.to_string(),
        }),
    }
}

impl_fact!(Basket {
    "Price" => price,
    "Quantity" => quantity,
    "Label" => label,
    "Flagged" => flagged,
} methods = basket_methods);

fn run_basket(code: &str, basket: &mut Basket) -> Result<ExecutionReport, FerruleError> {
    let mut library = KnowledgeLibrary::new();
    library.compile("basket", "0.0.1", code.as_bytes())?;
    let mut kb = library.new_knowledge_base("basket", "0.0.1")?;

    let mut facts = DataContext::new();
    facts.add("Basket", basket)?;
    Engine::with_max_cycles(10).execute(&mut facts, &mut kb)
}

#[test]
fn test_member_without_parens_falls_back_to_accessor() {
    let code = r#"
        rule BigBasket {
            when Basket.Total > 100
            then
                Basket.Flagged = true;
                Basket.Label = "big " + Basket.Total;
                Retract("BigBasket");
        }
    "#;

    let mut basket = Basket {
        price: 30,
        quantity: 4,
        ..Default::default()
    };
    let report = run_basket(code, &mut basket).unwrap();
    assert_eq!(report.fired, vec!["BigBasket"]);
    assert!(basket.flagged);
    assert_eq!(basket.label, "big 120");

    let mut small = Basket {
        price: 30,
        quantity: 2,
        ..Default::default()
    };
    let report = run_basket(code, &mut small).unwrap();
    assert_eq!(report.outcome, Outcome::Quiescent);
    assert!(!small.flagged);
}

#[test]
fn test_field_takes_precedence_over_accessor_of_same_name() {
    let code = r#"
        rule ByField {
            when Basket.Label == "from field"
            then Basket.Flagged = true; Complete();
        }
    "#;

    let mut basket = Basket {
        label: "from field".to_string(),
        ..Default::default()
    };
    let report = run_basket(code, &mut basket).unwrap();
    assert_eq!(report.outcome, Outcome::Completed);
    assert!(basket.flagged);

    // The accessor is still reachable with explicit call syntax
    let code = r#"
        rule ByCall {
            when Basket.Label() == "from accessor"
            then Basket.Flagged = true; Complete();
        }
    "#;
    let mut basket = Basket {
        label: "from field".to_string(),
        ..Default::default()
    };
    let report = run_basket(code, &mut basket).unwrap();
    assert_eq!(report.fired, vec!["ByCall"]);
    assert!(basket.flagged);
}

#[test]
fn test_missing_member_and_accessor_is_unknown_member() {
    let code = r#"rule Bad { when Basket.Weight > 0 then Complete(); }"#;
    let mut basket = Basket::default();
    let err = run_basket(code, &mut basket).unwrap_err();
    assert_eq!(
        err.details().unwrap().message,
        "no field or accessor 'Weight' on Basket"
    );
}
