#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    let engine = nonhaml::Engine::new();
    if let Ok(template) = engine.compile(data) {
        let _ = template.program().to_string();
    }
});
