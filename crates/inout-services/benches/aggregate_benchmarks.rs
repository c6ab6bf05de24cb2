//! Benchmarks for metrics aggregation
//!
//! Run with: cargo bench --package inout-services
//!
//! These measure row ingestion, the aggregation pass and summary rendering
//! (no network).

use chrono::{Duration, TimeZone, Utc};
use chrono_tz::America::Sao_Paulo;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use inout_core::models::{LeadBatch, LeadRecord, PeriodSelection};
use inout_services::{comparative_summary, executive_summary, MetricsAggregator};
use serde_json::{json, Value};

/// Create a raw row as the external project returns it
fn create_mock_row(i: i64) -> Value {
    let created = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap() + Duration::minutes(i * 7);
    json!({
        "id": i,
        "cliente_id": format!("5511{:09}", i),
        "created_at": created.to_rfc3339(),
        "qualified": i % 3 == 0,
        "disqualified": i % 5 == 0,
        "converted": i % 4 == 0,
        "data_conversao": (i % 4 == 0).then(|| (created + Duration::minutes(45)).to_rfc3339()),
    })
}

fn create_records(size: i64) -> Vec<LeadRecord> {
    let rows: Vec<Value> = (0..size).map(create_mock_row).collect();
    LeadBatch::from_rows(&rows).records
}

/// Benchmark raw row normalisation
fn bench_ingestion(c: &mut Criterion) {
    let mut group = c.benchmark_group("lead_ingestion");

    for size in [1_000i64, 10_000, 100_000].iter() {
        let rows: Vec<Value> = (0..*size).map(create_mock_row).collect();

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| LeadBatch::from_rows(black_box(&rows)));
        });
    }

    group.finish();
}

/// Benchmark the aggregation pass over current and previous sets
fn bench_aggregate(c: &mut Criterion) {
    let aggregator = MetricsAggregator::new(Sao_Paulo);
    let mut group = c.benchmark_group("aggregate");

    for size in [1_000i64, 10_000, 100_000].iter() {
        let current = create_records(*size);
        let previous = create_records(*size / 2);

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| aggregator.aggregate(black_box(&current), black_box(&previous), 30));
        });
    }

    group.finish();
}

/// Benchmark rendering both summaries from a report
fn bench_summaries(c: &mut Criterion) {
    let aggregator = MetricsAggregator::new(Sao_Paulo);
    let report = aggregator.aggregate(&create_records(5_000), &create_records(4_000), 30);
    let selection = PeriodSelection::default();

    c.bench_function("summaries", |b| {
        b.iter(|| {
            let _exec = executive_summary(black_box(&report), &selection);
            let _cmp = comparative_summary(black_box(&report));
        });
    });
}

criterion_group!(benches, bench_ingestion, bench_aggregate, bench_summaries);
criterion_main!(benches);
