use std::collections::BTreeMap;

use nonhaml::{value, Engine, ErrorKind, Value};

fn render(engine: &Engine<'_>, source: &str, ctx: Value) -> nonhaml::Result<String> {
    engine.compile(source)?.render_from(&ctx)
}

#[test]
fn function_call_styles() {
    let mut engine = Engine::new();
    engine.add_function("add", |a: i64, b: i64| a + b);
    let result = render(&engine, "= add(1, 2)\n= 1.add(2)", value! {}).unwrap();
    assert_eq!(result, "3\n3\n");
}

#[test]
fn function_zero_args_as_variable() {
    let mut engine = Engine::new();
    engine.add_function("answer", || 42);
    let result = render(&engine, "= answer\n= answer()", value! {}).unwrap();
    assert_eq!(result, "42\n42\n");
}

#[test]
fn function_variable_shadows_function() {
    let mut engine = Engine::new();
    engine.add_function("answer", || 42);
    let result = render(&engine, "= answer", value! { answer: 7 }).unwrap();
    assert_eq!(result, "7\n");
}

#[test]
fn function_member_without_parentheses() {
    let engine = Engine::new();
    let result = render(&engine, "= name.upper", value! { name: "john" }).unwrap();
    assert_eq!(result, "JOHN\n");
}

#[test]
fn function_map_key_before_function() {
    let engine = Engine::new();
    let result = render(&engine, "= m.keys", value! { m: { keys: "own" } }).unwrap();
    assert_eq!(result, "own\n");
    let result = render(&engine, "= m.keys.join(',')", value! { m: { a: 1, b: 2 } }).unwrap();
    assert_eq!(result, "a,b\n");
}

#[test]
fn function_returns_result() {
    let mut engine = Engine::new();
    engine.add_function("check", |n: i64| {
        if n > 0 {
            Ok(n)
        } else {
            Err(format!("expected a positive number, found {n}"))
        }
    });
    assert_eq!(render(&engine, "= check(1)", value! {}).unwrap(), "1\n");
    let err = render(&engine, "= check(-1)", value! {}).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Render);
    assert_eq!(err.message(), "expected a positive number, found -1");
}

#[test]
fn function_owned_args() {
    fn describe(m: BTreeMap<String, Value>, xs: Vec<Value>, f: f64) -> String {
        format!("{} {} {f}", m.len(), xs.len())
    }

    let mut engine = Engine::new();
    engine.add_function("describe", describe);
    let result = render(&engine, "= describe(m, [1, 2], 1)", value! { m: { a: 1 } }).unwrap();
    assert_eq!(result, "1 2 1\n");
}

#[test]
fn function_err_unknown() {
    let engine = Engine::new();
    let err = render(&engine, "= nope(1)", value! {}).unwrap_err();
    assert_eq!(err.message(), "unknown function `nope`");
}

#[test]
fn function_err_arg_count() {
    let engine = Engine::new();
    let err = render(&engine, "= upper('a', 'b')", value! {}).unwrap_err();
    assert_eq!(err.message(), "function expected 1 arguments, found 2");
}

#[test]
fn function_err_arg_type() {
    let engine = Engine::new();
    let err = render(&engine, "= replace('a', 1, 'b')", value! {}).unwrap_err();
    assert_eq!(
        err.message(),
        "function expected string for argument 2, found integer"
    );
}

#[test]
fn function_err_int_out_of_range() {
    let mut engine = Engine::new();
    engine.add_function("byte", |b: u8| b);
    let err = render(&engine, "= byte(256)", value! {}).unwrap_err();
    assert_eq!(
        err.message(),
        "function expected u8 for argument 1, found out of range integer 256"
    );
}

#[cfg(feature = "builtins")]
#[test]
fn builtins() {
    let engine = Engine::new();
    let ctx = value! {
        name: "  John Smith ",
        xs: [1, 2, 3],
        m: { b: 2, a: 1 },
        missing: None,
    };
    let source = "\
= name.trim().lower()
= name.trim().upper()
= name.trim().replace(' ', '_')
= xs.len()
= name.trim().len()
= m.len()
= xs.first()
= xs.last()
= m.keys().join(' ')
= m.values().join(' ')
= xs.reverse().join('')
= 'abc'.reverse()
= missing.default('none')
= 1.5.to_s() + '!'";
    let result = render(&engine, source, ctx).unwrap();
    assert_eq!(
        result,
        "john smith\nJOHN SMITH\nJohn_Smith\n3\n10\n2\n1\n3\na b\n1 2\n321\ncba\nnone\n1.5!\n"
    );
}

#[cfg(feature = "builtins")]
#[test]
fn builtins_err_unsupported() {
    let engine = Engine::new();
    let err = render(&engine, "= len(1)", value! {}).unwrap_err();
    assert_eq!(err.message(), "unsupported value `integer`");
}
