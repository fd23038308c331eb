use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rcompile_core::config::CompilerOptions;
use rcompile_core::fs::MockFileSystem;
use rcompile_core::{scan_requires, Compiler};
use std::path::PathBuf;
use std::sync::Arc;

/// `size` modules in a chain, each also requiring the shared leaf.
fn chain_file_system(size: usize) -> MockFileSystem {
    let mut fs = MockFileSystem::new();
    for i in 0..size {
        let mut source = format!("exports.index = {};\nrequire(\"./leaf\");\n", i);
        if i + 1 < size {
            source.push_str(&format!("require(\"./m{}\");\n", i + 1));
        }
        fs.add_file(format!("/bench/m{}.js", i), source);
    }
    fs.add_file("/bench/leaf.js", "exports.leaf = true;\n");
    fs
}

fn bench_scan_requires(c: &mut Criterion) {
    let source = (0..200)
        .map(|i| format!("var dep{} = require(\"./deps/dep{}\");\nloader.require(\"skip\");", i, i))
        .collect::<Vec<_>>()
        .join("\n");

    c.bench_function("scan_requires", |b| {
        b.iter(|| scan_requires(black_box(&source)).len())
    });
}

fn bench_compile_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile_scaling");

    for size in [10, 50, 200].iter() {
        let fs = Arc::new(chain_file_system(*size));
        let options = CompilerOptions {
            base: Some(PathBuf::from("/bench")),
            ..Default::default()
        };

        group.bench_with_input(BenchmarkId::from_parameter(size), &fs, |b, fs| {
            b.iter(|| {
                let mut compiler = Compiler::new(options.clone(), fs.clone());
                compiler
                    .compile(black_box("m0.js"))
                    .map(|compiler| compiler.result_code().len())
                    .unwrap_or(0)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_scan_requires, bench_compile_scaling);
criterion_main!(benches);
