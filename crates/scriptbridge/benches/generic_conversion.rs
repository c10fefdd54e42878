use std::collections::HashMap;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use scriptbridge::convert::geometry::{point_to_value, to_point};
use scriptbridge::convert::Point;
use scriptbridge::{BridgeOptions, MapContainer, TaggedConverter, TaggedValue};
use scriptbridge_engine::Engine;

fn nested(depth: usize) -> TaggedValue {
    let mut value = TaggedValue::List(
        (0..8)
            .map(|i| TaggedValue::String(format!("item{i}")))
            .collect(),
    );
    for level in 0..depth {
        let mut map = HashMap::new();
        map.insert("level".to_string(), TaggedValue::Int(level as i32));
        map.insert("ratio".to_string(), TaggedValue::Double(level as f64 / 3.0));
        map.insert("child".to_string(), value);
        value = TaggedValue::Map(map);
    }
    value
}

fn bench_tagged(c: &mut Criterion) {
    let mut group = c.benchmark_group("tagged");
    let engine = Engine::new();
    let options = BridgeOptions::default().with_map_container(MapContainer::Object);

    for depth in [1usize, 8, 32] {
        let value = nested(depth);
        group.bench_with_input(BenchmarkId::new("from_tagged", depth), &value, |b, value| {
            let converter = TaggedConverter::new(&engine, &options);
            b.iter(|| converter.from_tagged(black_box(value)).unwrap());
        });

        let script = TaggedConverter::new(&engine, &options)
            .from_tagged(&value)
            .unwrap();
        engine.root(script);
        group.bench_with_input(BenchmarkId::new("to_tagged", depth), &script, |b, script| {
            let converter = TaggedConverter::new(&engine, &options);
            b.iter(|| converter.to_tagged(black_box(*script)).unwrap());
        });
        engine.unroot(script);
        engine.collect_garbage();
    }

    group.finish();
}

fn bench_point(c: &mut Criterion) {
    let engine = Engine::new();
    let value = point_to_value(&engine, &Point::new(3.5, -2.0)).unwrap();

    c.bench_function("to_point", |b| {
        b.iter(|| to_point(&engine, black_box(value)).unwrap());
    });
}

criterion_group!(benches, bench_tagged, bench_point);
criterion_main!(benches);
