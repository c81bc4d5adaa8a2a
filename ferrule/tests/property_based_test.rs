use ferrule::{parse, DataContext, Engine, FerruleError, KnowledgeLibrary, ResourceLimits};
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};

fn counter(pairs: &[(&str, i64)]) -> HashMap<String, i64> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

/// Self-retracting rules, one per salience, declared in the given order
fn self_retracting_rules(saliences: &[i64]) -> String {
    saliences
        .iter()
        .enumerate()
        .map(|(i, s)| {
            format!(
                "rule R{i} salience {s} {{ when true then Retract(\"R{i}\"); Log(\"R{i}\"); }}\n"
            )
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        ..ProptestConfig::default()
    })]

    #[test]
    fn prop_rules_fire_in_descending_salience(
        saliences in prop::collection::btree_set(-50i64..50, 1..8)
            .prop_map(|set: BTreeSet<i64>| set.into_iter().collect::<Vec<_>>())
            .prop_shuffle()
    ) {
        let mut library = KnowledgeLibrary::new();
        library.compile("salience", "1", self_retracting_rules(&saliences).as_bytes()).unwrap();
        let mut kb = library.new_knowledge_base("salience", "1").unwrap();

        let mut facts = DataContext::new();
        let report = Engine::new().execute(&mut facts, &mut kb).unwrap();

        let mut expected: Vec<(usize, i64)> = saliences.iter().copied().enumerate().collect();
        expected.sort_by(|a, b| b.1.cmp(&a.1));
        let expected: Vec<String> = expected.iter().map(|(i, _)| format!("R{i}")).collect();

        prop_assert_eq!(report.cycles, saliences.len() as u64);
        prop_assert_eq!(&report.fired, &expected);
    }

    #[test]
    fn prop_equal_salience_keeps_declaration_order(salience in -20i64..20, n in 1usize..8) {
        let saliences = vec![salience; n];
        let mut library = KnowledgeLibrary::new();
        library.compile("ties", "1", self_retracting_rules(&saliences).as_bytes()).unwrap();
        let mut kb = library.new_knowledge_base("ties", "1").unwrap();

        let mut facts = DataContext::new();
        let report = Engine::new().execute(&mut facts, &mut kb).unwrap();

        let expected: Vec<String> = (0..n).map(|i| format!("R{i}")).collect();
        prop_assert_eq!(report.fired, expected);
    }

    #[test]
    fn prop_retracted_rules_never_fire_again(n in 1usize..6) {
        let saliences = vec![0; n];
        let mut library = KnowledgeLibrary::new();
        library.compile("retract", "1", self_retracting_rules(&saliences).as_bytes()).unwrap();
        let mut kb = library.new_knowledge_base("retract", "1").unwrap();

        let mut facts = DataContext::new();
        let report = Engine::with_max_cycles(100).execute(&mut facts, &mut kb).unwrap();

        let unique: BTreeSet<&String> = report.fired.iter().collect();
        prop_assert_eq!(unique.len(), report.fired.len());
        prop_assert_eq!(&report.retracted, &report.fired);
        prop_assert_eq!(kb.active_rules().count(), 0);
    }

    #[test]
    fn prop_counter_converges_in_exact_cycles(start in 0i64..30, target in 0i64..30) {
        let mut library = KnowledgeLibrary::new();
        library.compile(
            "count",
            "1",
            br#"rule Inc { when C["n"] < C["target"] then C["n"] = C["n"] + 1; }"#,
        ).unwrap();
        let mut kb = library.new_knowledge_base("count", "1").unwrap();

        let mut c = counter(&[("n", start), ("target", target)]);
        let mut facts = DataContext::new();
        facts.add("C", &mut c).unwrap();
        let report = Engine::with_max_cycles(100).execute(&mut facts, &mut kb).unwrap();
        drop(facts);

        prop_assert_eq!(report.cycles, (target - start).max(0) as u64);
        prop_assert_eq!(c["n"], start.max(target));
    }

    #[test]
    fn prop_cycle_bound_is_exact(max_cycles in 1u64..40) {
        let mut library = KnowledgeLibrary::new();
        library.compile(
            "loop",
            "1",
            br#"rule Loop { when C["n"] >= 0 then C["n"] = C["n"] + 1; }"#,
        ).unwrap();
        let mut kb = library.new_knowledge_base("loop", "1").unwrap();

        let mut c = counter(&[("n", 0)]);
        let mut facts = DataContext::new();
        facts.add("C", &mut c).unwrap();
        let result = Engine::with_max_cycles(max_cycles).execute(&mut facts, &mut kb);
        drop(facts);

        let is_cycle_limit = matches!(
            result,
            Err(FerruleError::CycleLimitExceeded { max_cycles: m, .. }) if m == max_cycles
        );
        prop_assert!(is_cycle_limit);
        prop_assert_eq!(c["n"], max_cycles as i64);
    }

    #[test]
    fn prop_integer_arithmetic_matches_host(a in -1_000_000i64..1_000_000, b in -1_000_000i64..1_000_000) {
        let mut library = KnowledgeLibrary::new();
        library.compile(
            "arith",
            "1",
            br#"rule Sum { when C["done"] == 0 then C["sum"] = C["a"] + C["b"]; C["product"] = C["a"] * C["b"]; C["done"] = 1; }"#,
        ).unwrap();
        let mut kb = library.new_knowledge_base("arith", "1").unwrap();

        let mut c = counter(&[("a", a), ("b", b), ("sum", 0), ("product", 0), ("done", 0)]);
        let mut facts = DataContext::new();
        facts.add("C", &mut c).unwrap();
        Engine::new().execute(&mut facts, &mut kb).unwrap();
        drop(facts);

        prop_assert_eq!(c["sum"], a + b);
        prop_assert_eq!(c["product"], a * b);
    }

    #[test]
    fn prop_parser_never_panics(input in "\\PC{0,200}") {
        let _ = parse(&input, "fuzz", &ResourceLimits::default());
    }

    #[test]
    fn prop_rule_shaped_input_never_panics(
        name in "[A-Za-z][A-Za-z0-9_]{0,10}",
        body in "[A-Za-z0-9_ .()\\[\\]\"=<>!&|+*/%-]{0,60}",
    ) {
        let code = format!("rule {name} {{ when {body} then {body}; }}");
        let _ = parse(&code, "fuzz", &ResourceLimits::default());
    }
}
