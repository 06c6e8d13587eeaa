//! Benchmark template compilation and rendering time.

use criterion::{criterion_group, criterion_main, Criterion};

use benches::{context, engine, PAGE};

criterion_main! { benches }
criterion_group! { benches, bench_init, bench_compile, bench_render }

/// Benchmarks the time taken to create a new instance of the engine.
fn bench_init(c: &mut Criterion) {
    c.bench_function("init", |b| {
        b.iter(nonhaml::Engine::new);
    });
}

/// Benchmarks the time taken to compile a template.
fn bench_compile(c: &mut Criterion) {
    let source = repeat(PAGE, 50);
    let engine = engine();
    c.bench_function("compile", |b| {
        b.iter(|| engine.compile(&source).unwrap());
    });
}

/// Benchmarks the time taken to render a template as a string.
fn bench_render(c: &mut Criterion) {
    let mut g = c.benchmark_group("render");

    let ctx = context::random(150);
    let engine = engine();
    let template = engine.compile(&repeat(PAGE, 20)).unwrap();

    g.bench_function("serde", |b| {
        b.iter(|| template.render(&ctx).unwrap());
    });

    let value = nonhaml::to_value(&ctx).unwrap();
    g.bench_function("value", |b| {
        b.iter(|| template.render_from(&value).unwrap());
    });
}

fn repeat(source: &str, n: usize) -> String {
    let mut s = String::new();
    for _ in 0..n {
        s.push_str(source);
    }
    s
}
