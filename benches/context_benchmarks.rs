//! Benchmarks for context construction and the per-call accessors.
//!
//! Run with: cargo bench

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sandbox_context_rs::prelude::*;
use sandbox_context_rs::apply_variables;

fn record_with_headers(count: usize) -> RequestRecord {
    RequestRecord {
        url: "https://{{host}}/api".to_string(),
        method: None,
        body: Some("{}".to_string()),
        headers: (0..count)
            .map(|i| HeaderRecord::new(format!("X-H{i}"), format!("{i}"), i % 2 == 0))
            .collect(),
    }
}

/// Context construction, dominated by header flattening.
fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");

    for headers in [0usize, 8, 64] {
        let record = record_with_headers(headers);
        group.bench_with_input(BenchmarkId::new("headers", headers), &record, |b, record| {
            b.iter(|| {
                let mut variables = Variables::new();
                let ctx = SandboxContext::builder(
                    ScriptIdentity::new("p1", "v1", "e1", "staging"),
                    &mut variables,
                )
                .request_record(record.clone())
                .build();
                black_box(ctx.request().map(|r| r.headers.len()))
            });
        });
    }

    group.finish();
}

/// Library gate and variable access as a script would hit them.
fn bench_accessors(c: &mut Criterion) {
    let libraries: HashMap<String, PathBuf> = (0..100)
        .map(|i| (format!("lib{i}"), PathBuf::from(format!("/libs/lib{i}.js"))))
        .collect();
    let mut variables: Variables = (0..100)
        .map(|i| (format!("var{i}"), format!("value{i}")))
        .collect();

    let mut ctx = SandboxContext::builder(
        ScriptIdentity::new("p1", "v1", "e1", "staging"),
        &mut variables,
    )
    .library_index(libraries)
    .loader(|path: &Path| -> Result<usize> { Ok(path.as_os_str().len()) })
    .build();

    let mut group = c.benchmark_group("accessors");
    group.bench_function("load_library", |b| {
        b.iter(|| black_box(ctx.load_library(black_box("lib42")).ok()))
    });
    group.bench_function("resolve_project_file_path", |b| {
        b.iter(|| black_box(ctx.resolve_project_file_path(black_box("a.js"), "scripts")))
    });
    group.bench_function("set_get_variable", |b| {
        b.iter(|| {
            ctx.set_variable("k", "v");
            black_box(ctx.get_variable("k").map(str::len))
        })
    });
    group.finish();
}

fn bench_templating(c: &mut Criterion) {
    let variables: HashMap<String, String> = (0..20)
        .map(|i| (format!("var{i}"), format!("value{i}")))
        .collect();
    let template = "https://{{var1}}/{{var5}}?q={{var19}}&missing={{nope}}";

    c.bench_function("apply_variables", |b| {
        b.iter(|| black_box(apply_variables(black_box(template), &variables)))
    });
}

criterion_group!(benches, bench_build, bench_accessors, bench_templating);
criterion_main!(benches);
