use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

use query_state::codec::{decode, encode_state};
use query_state::{FieldSchema, MemoryStore, QueryParams, Schema, TypedQueryState};

fn schema_with(fields: usize) -> Schema {
    let mut builder = Schema::builder();
    for i in 0..fields {
        let field = match i % 3 {
            0 => FieldSchema::number().required().default_value(1),
            1 => FieldSchema::string().array(),
            _ => FieldSchema::boolean().default_value(true),
        };
        builder = builder.field(format!("f{i}"), field);
    }
    builder.build().unwrap()
}

fn query_for(fields: usize) -> String {
    let mut params = QueryParams::new();
    for i in 0..fields {
        match i % 3 {
            0 => params.append(format!("f{i}"), i.to_string()),
            1 => {
                params.append(format!("f{i}"), "a");
                params.append(format!("f{i}"), "b");
            }
            _ => params.append(format!("f{i}"), "false"),
        }
    }
    params.to_query_string()
}

fn query_parse_benchmark(c: &mut Criterion) {
    let raw = query_for(30);
    c.bench_function("query_parse", |b| {
        b.iter(|| QueryParams::parse(black_box(&raw)));
    });
}

fn decode_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for fields in [3, 10, 30] {
        let schema = schema_with(fields);
        let store = MemoryStore::from_query(&query_for(fields));
        group.bench_with_input(BenchmarkId::from_parameter(fields), &fields, |b, _| {
            b.iter(|| decode(black_box(&schema), &store, false));
        });
    }

    group.finish();
}

fn encode_benchmark(c: &mut Criterion) {
    let schema = schema_with(30);
    let store = MemoryStore::from_query(&query_for(30));
    let state = decode(&schema, &store, false);

    c.bench_function("encode_state", |b| {
        b.iter(|| encode_state(black_box(&state)));
    });
}

fn cached_state_benchmark(c: &mut Criterion) {
    let query = TypedQueryState::new(schema_with(30), MemoryStore::from_query(&query_for(30)));

    c.bench_function("cached_state_read", |b| {
        b.iter(|| black_box(query.with_state(|state| state.len())));
    });
}

fn update_benchmark(c: &mut Criterion) {
    let query = TypedQueryState::new(schema_with(30), MemoryStore::from_query(&query_for(30)));

    c.bench_function("update_and_rederive", |b| {
        let mut i: i32 = 0;
        b.iter(|| {
            query.update("f0", black_box(i)).unwrap();
            black_box(query.state());
            // Stepping back keeps the history at two entries
            query.store().back();
            i += 1;
        });
    });
}

criterion_group!(
    benches,
    query_parse_benchmark,
    decode_benchmark,
    encode_benchmark,
    cached_state_benchmark,
    update_benchmark,
);
criterion_main!(benches);
