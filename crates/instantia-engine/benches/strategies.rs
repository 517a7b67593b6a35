use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use instantia_engine::{ConstructionSpec, EmitterKind, ObjectFactory, StrategyKind, TypeMetadata, TypeRegistry, Visibility};
use instantia_sdk::{ParamType, Value};

struct ValueHolder {
    value: String,
}

fn factories() -> ObjectFactory {
    let registry = TypeRegistry::new();
    registry.register(
        TypeMetadata::builder("ValueHolder")
            .constructor(Visibility::Public, |(value,): (String,)| ValueHolder { value })
            .field::<ValueHolder, _>("value", |h| Value::str(&h.value))
            .build(),
    );
    ObjectFactory::new(Arc::new(registry))
}

const STRATEGIES: [StrategyKind; 4] = [
    StrategyKind::ReflectiveGeneric,
    StrategyKind::ReflectiveDirect,
    StrategyKind::GeneratedCallable(EmitterKind::Instructions),
    StrategyKind::GeneratedCallable(EmitterKind::Expression),
];

fn bench_direct(c: &mut Criterion) {
    c.bench_function("construct_direct", |b| {
        b.iter(|| ValueHolder {
            value: black_box("hello").to_string(),
        });
    });
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    let factories = factories();
    let spec = ConstructionSpec::new("ValueHolder", [ParamType::Str]);

    for strategy in STRATEGIES {
        group.bench_with_input(BenchmarkId::from_parameter(strategy), &strategy, |b, strategy| {
            b.iter(|| factories.build(black_box(&spec), *strategy).unwrap());
        });
    }

    group.finish();
}

fn bench_invoke(c: &mut Criterion) {
    let mut group = c.benchmark_group("invoke");
    let factories = factories();
    let spec = ConstructionSpec::new("ValueHolder", [ParamType::Str]);
    let args = [Value::str("hello")];

    for strategy in STRATEGIES {
        let factory = factories.build(&spec, strategy).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(strategy), &factory, |b, factory| {
            b.iter(|| factory.invoke(black_box(&args)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_direct, bench_build, bench_invoke);
criterion_main!(benches);
