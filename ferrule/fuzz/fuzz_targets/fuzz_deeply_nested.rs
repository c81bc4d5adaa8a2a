#![no_main]

use ferrule::{DataContext, Engine, KnowledgeLibrary};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (u8, u16, u8)| {
    let (nesting, chain_len, op) = input;

    let mut nested = String::from("1");
    for _ in 0..(nesting as usize % 200) + 1 {
        nested = format!("({} + 1)", nested);
    }

    // Flat chains build trees as deep as they are long
    let op = ["&&", "||", "+", "*", "."][op as usize % 5];
    let chain = if op == "." {
        format!("Doc{}", ".X".repeat(chain_len as usize % 4000))
    } else {
        let term = if op == "&&" || op == "||" { "true" } else { "1" };
        vec![term; (chain_len as usize % 4000) + 1].join(&format!(" {} ", op))
    };

    let code = format!(
        "rule Nested {{ when {} > 0 then Complete(); }}\nrule Chain {{ when ({}) != nil then Complete(); }}",
        nested, chain
    );

    let mut library = KnowledgeLibrary::new();
    if library.compile("fuzz_nested", "0.0.1", code.as_bytes()).is_err() {
        return;
    }
    let Ok(mut kb) = library.new_knowledge_base("fuzz_nested", "0.0.1") else {
        return;
    };
    let mut doc = serde_json::json!({"X": {"X": 1}});
    let mut facts = DataContext::new();
    if facts.add("Doc", &mut doc).is_ok() {
        let _ = Engine::with_max_cycles(4).execute(&mut facts, &mut kb);
    }
});
