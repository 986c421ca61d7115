use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use codeflow_core::{CodeflowConfig, CodeflowRuntime};

const CONTROL_FLOW: &str = include_str!("../tests/fixtures/control_flow.js");
const TYPED_USER: &str = include_str!("../tests/fixtures/typed_user.ts");

/// A program with `count` functions, each looping over its own locals.
///
/// Locals get distinct names: the declared-variable set is program wide, so a
/// reused name would be read in its temporal dead zone.
fn generated_program(count: usize) -> String {
    let mut source = String::new();
    for index in 0..count {
        source.push_str(&format!(
            "function step{index}(limit) {{\n  let acc{index} = 0;\n  for (let i{index} = 0; i{index} < limit; i{index}++) {{\n    let next{index} = acc{index} + i{index};\n    acc{index} = next{index};\n  }}\n  return acc{index};\n}}\nlet result{index} = step{index}(10);\n"
        ));
    }
    source
}

fn quiet_runtime() -> CodeflowRuntime {
    CodeflowRuntime::new(CodeflowConfig::default().with_mirror_to_log(false))
        .expect("default configuration is valid")
}

fn bench_instrument(c: &mut Criterion) {
    let runtime = quiet_runtime();
    let mut group = c.benchmark_group("instrument");

    group.bench_function("control_flow", |b| {
        b.iter(|| runtime.instrument(black_box(CONTROL_FLOW)).unwrap())
    });
    group.bench_function("typed_user", |b| {
        b.iter(|| runtime.instrument(black_box(TYPED_USER)).unwrap())
    });

    for size in [10, 50, 200] {
        let source = generated_program(size);
        group.bench_with_input(BenchmarkId::new("generated", size), &source, |b, source| {
            b.iter(|| runtime.instrument(black_box(source)).unwrap())
        });
    }
    group.finish();
}

fn bench_instrument_and_run(c: &mut Criterion) {
    let runtime = quiet_runtime();
    let mut group = c.benchmark_group("instrument_and_run");

    group.bench_function("control_flow", |b| {
        b.iter(|| runtime.instrument_and_run(black_box(CONTROL_FLOW)))
    });

    for size in [10, 50] {
        let source = generated_program(size);
        group.bench_with_input(BenchmarkId::new("generated", size), &source, |b, source| {
            b.iter(|| {
                let result = runtime.instrument_and_run(black_box(source));
                assert!(result.is_success());
                result.log.len()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_instrument, bench_instrument_and_run);
criterion_main!(benches);
