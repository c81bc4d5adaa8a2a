#![no_main]

use ferrule::{DataContext, Engine, KnowledgeLibrary};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let code = format!(
            r#"
rule Check {{
    when {}
    then Doc.Hits = Doc.Hits + 1; Retract("Check");
}}
"#,
            s
        );

        let mut library = KnowledgeLibrary::new();
        if library.compile("fuzz_cond", "0.0.1", code.as_bytes()).is_ok() {
            let Ok(mut kb) = library.new_knowledge_base("fuzz_cond", "0.0.1") else {
                return;
            };
            let mut doc = serde_json::json!({"X": 100, "Y": 0.5, "Name": "Honda", "Hits": 0});
            let mut facts = DataContext::new();
            if facts.add("Doc", &mut doc).is_ok() {
                let _ = Engine::with_max_cycles(16).execute(&mut facts, &mut kb);
            }
        }
    }
});
