#![no_main]

use std::collections::BTreeMap;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use serde::Serialize;

#[derive(Debug, Serialize, Arbitrary)]
#[serde(untagged)]
enum Value {
    None,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

fuzz_target!(|data: (&str, Vec<(&str, &str)>, BTreeMap<String, Value>)| {
    let (root, includes, ctx) = data;
    let mut loader = nonhaml::MemoryLoader::new();
    for (name, source) in includes {
        loader.insert(name, source);
    }
    let mut engine = nonhaml::Engine::new();
    engine.set_loader(loader);
    engine.set_max_include_depth(8);
    if let Ok(template) = engine.compile(root) {
        let _ = template.render(&ctx);
    }
});
