use std::thread;

use nonhaml::{value, Engine, ErrorKind};

#[test]
fn engine_debug() {
    let s = format!("{:?}", Engine::new());
    assert!(s.starts_with("Engine {"));
    assert!(s.contains("max_include_depth: 64"));
}

#[test]
fn engine_send_and_sync() {
    let engine = Engine::new();
    thread::spawn(move || {
        let result = engine
            .compile("= lorem")
            .unwrap()
            .render(value! { lorem: "ipsum" })
            .unwrap();
        assert_eq!(result, "ipsum\n");
    })
    .join()
    .unwrap();
}

#[test]
fn engine_compile_non_static_source() -> nonhaml::Result<()> {
    let engine = Engine::new();
    let source = String::from("= lorem");
    let template = engine.compile(&source)?;
    drop(source);
    let result = template.render(value! { lorem: "ipsum" })?;
    assert_eq!(result, "ipsum\n");
    Ok(())
}

#[test]
fn engine_template_debug() {
    let engine = Engine::new();
    let template = engine.compile_named("test", "lorem").unwrap();
    let s = format!("{template:?}");
    assert!(s.starts_with("Template { name: \"test\""));
}

#[test]
fn engine_load_err_missing() {
    let engine = Engine::new();
    let err = engine.load("this/does/not/exist.nhaml").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn engine_add_function_replaces_builtin() {
    let mut engine = Engine::new();
    engine.add_function("upper", |s: String| format!("<{s}>"));
    let result = engine
        .compile("= 'x'.upper()")
        .unwrap()
        .render(value! {})
        .unwrap();
    assert_eq!(result, "<x>\n");
}

#[test]
fn engine_verbose_is_configurable() {
    let mut engine = Engine::new();
    engine.set_verbose(true);
    assert!(format!("{engine:?}").contains("verbose: true"));
}
