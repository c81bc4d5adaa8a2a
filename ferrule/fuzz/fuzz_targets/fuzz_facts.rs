#![no_main]

use ferrule::{DataContext, Engine, KnowledgeLibrary};
use libfuzzer_sys::fuzz_target;

const RULES: &[u8] = br#"
rule Discount salience 10 {
    when Item.Name == "Honda" && Item.Discount == 0
    then Item.Discount = Item.Price / 10; Retract("Discount");
}
rule Label {
    when Item.Tags[0] != nil && Item.Label == nil
    then Item.Label = "tagged " + Item.Tags[0];
}
"#;

fuzz_target!(|data: &[u8]| {
    let Ok(mut item) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };

    let mut library = KnowledgeLibrary::new();
    if library.compile("fuzz_facts", "0.0.1", RULES).is_err() {
        return;
    }
    let Ok(mut kb) = library.new_knowledge_base("fuzz_facts", "0.0.1") else {
        return;
    };

    let mut facts = DataContext::new();
    if facts.add("Item", &mut item).is_ok() {
        let _ = Engine::with_max_cycles(16).execute(&mut facts, &mut kb);
    }
});
