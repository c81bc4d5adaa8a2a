#![no_main]

use ferrule::KnowledgeLibrary;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut library = KnowledgeLibrary::new();
    let _ = library.compile("fuzz_input", "0.0.1", data);
});
