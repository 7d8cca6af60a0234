//! Benchmarks for step lookup and direct execution.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sheetflow::prelude::*;

fn lookup_benchmark(c: &mut Criterion) {
    c.bench_function("step_from_str", |b| {
        b.iter(|| black_box("horizontals").parse::<Step>())
    });

    c.bench_function("step_lookup_all", |b| {
        b.iter(|| {
            for step in Step::ALL {
                black_box(Step::lookup(step.id()));
            }
        })
    });
}

fn execution_benchmark(c: &mut Criterion) {
    let runner = StepRunner::new(Arc::new(MemorySheetLoader::new()))
        .with_config(RunnerConfig::new().with_diagnostics(false));

    c.bench_function("run_until_score", |b| {
        b.iter(|| {
            let slot = SheetSlot::new();
            black_box(runner.run_until(Step::Score, &slot, Some(StepParam::source("bench.png"))))
        })
    });

    let slot = SheetSlot::new();
    runner.perform(Step::Load, &slot, Some(StepParam::source("bench.png")));
    runner.perform(Step::Scale, &slot, None);
    c.bench_function("perform_memoized_step", |b| {
        b.iter(|| black_box(runner.perform(Step::Scale, &slot, None)))
    });
}

criterion_group!(benches, lookup_benchmark, execution_benchmark);
criterion_main!(benches);
