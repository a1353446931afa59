//! 스캐너/매처 벤치마크
//!
//! 로그 크기에 따른 스캔 처리량과 백엔드 풀 크기에 따른 매칭 비용을 측정합니다.

use chrono::{FixedOffset, NaiveDate, TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use logtriage_core::types::{BackendEntry, ErrorCategory, ErrorRecord};
use logtriage_correlator::{
    CorrelationMatcher, DedupScope, ErrorScanner, MatchConfig, ScanConfig, TableBuilder,
};

fn create_log(lines: usize) -> String {
    (0..lines)
        .map(|i| {
            let second = i % 60;
            match i % 10 {
                0 => format!("[01-15 12:00:{second:02}] [E] upload {i} failed request_id: req{i:06}"),
                3 => format!("[01-15 12:00:{second:02}] TypeError: cannot read property of undefined"),
                7 => format!("[01-15 12:00:{second:02}] config error: true"),
                _ => format!("[01-15 12:00:{second:02}] [I] screen {i} rendered"),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn create_pool(size: usize) -> Vec<BackendEntry> {
    (0..size)
        .map(|i| BackendEntry {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 16, (i % 20) as u32, 0).unwrap(),
            message: format!("INFO handled request {i}"),
            request_id: Some(format!("req{i:06}")),
            source_group: "/aws/lambda/api".to_owned(),
            source_stream: "bench".to_owned(),
        })
        .collect()
}

fn create_error() -> ErrorRecord {
    ErrorRecord {
        line_number: 1,
        category: ErrorCategory::LogLevelError,
        raw_segment: "[E] upload failed".to_owned(),
        timestamp: Some("01-15 12:05:00".to_owned()),
        request_ids: vec!["req000042".to_owned()],
        context_before: vec![],
        context_after: vec![],
    }
}

fn match_config() -> MatchConfig {
    MatchConfig::new(FixedOffset::west_opt(4 * 3600).unwrap())
        .with_reference_date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
}

fn bench_scan_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan_scaling");
    let scanner = ErrorScanner::new(ScanConfig::default()).unwrap();

    for lines in [100, 1_000, 10_000] {
        let text = create_log(lines);
        group.throughput(Throughput::Elements(lines as u64));
        group.bench_with_input(BenchmarkId::from_parameter(lines), &text, |b, text| {
            b.iter(|| scanner.scan(black_box(text)))
        });
    }

    group.finish();
}

fn bench_match_pool_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("match_pool_scaling");
    let matcher = CorrelationMatcher::new(match_config()).unwrap();
    let error = create_error();

    for size in [10, 100, 1_000] {
        let pool = create_pool(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &pool, |b, pool| {
            b.iter(|| matcher.match_entries(black_box(&error), black_box(pool)))
        });
    }

    group.finish();
}

fn bench_table_global_dedup(c: &mut Criterion) {
    let mut group = c.benchmark_group("table");
    let scanner = ErrorScanner::new(ScanConfig::default()).unwrap();
    let errors = scanner.scan(&create_log(1_000));
    let pool = create_pool(500);
    let builder = TableBuilder::new(
        CorrelationMatcher::new(match_config()).unwrap(),
        DedupScope::Global,
    );

    group.throughput(Throughput::Elements(errors.len() as u64));
    group.bench_function("global_dedup", |b| {
        b.iter(|| builder.build(black_box(&errors), black_box(&pool)))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_scan_scaling,
    bench_match_pool_scaling,
    bench_table_global_dedup
);
criterion_main!(benches);
