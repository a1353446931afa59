#![no_main]

use std::collections::HashSet;

use arbitrary::Arbitrary;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeDelta, Utc};
use libfuzzer_sys::fuzz_target;

use logtriage_core::types::{BackendEntry, ErrorRecord};
use logtriage_correlator::{CorrelationMatcher, DedupScope, MatchConfig, TableBuilder};

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    errors: Vec<FuzzError>,
    entries: Vec<FuzzEntry>,
    window_minutes: u8,
    max_matches: u8,
    offset_minutes: i16,
    global: bool,
}

#[derive(Arbitrary, Debug)]
struct FuzzError {
    timestamp: Option<String>,
    request_ids: Vec<String>,
}

#[derive(Arbitrary, Debug)]
struct FuzzEntry {
    /// 기준 시각으로부터의 초
    offset_secs: i32,
    message: String,
    request_id: Option<String>,
}

fuzz_target!(|input: FuzzInput| {
    let Some(offset) = FixedOffset::east_opt(i32::from(input.offset_minutes % 1_440) * 60) else {
        return;
    };
    let config = MatchConfig::new(offset)
        .with_time_window_minutes(u64::from(input.window_minutes).max(1))
        .with_max_matches(usize::from(input.max_matches).max(1))
        .with_reference_date(NaiveDate::from_ymd_opt(2024, 1, 15).expect("valid date"));
    let Ok(matcher) = CorrelationMatcher::new(config) else {
        return;
    };
    let scope = if input.global {
        DedupScope::Global
    } else {
        DedupScope::PerError
    };
    let builder = TableBuilder::new(matcher, scope);

    let base: DateTime<Utc> = DateTime::from_timestamp(1_705_334_400, 0).expect("valid epoch");
    let errors: Vec<ErrorRecord> = input
        .errors
        .into_iter()
        .take(16)
        .enumerate()
        .map(|(i, e)| ErrorRecord {
            line_number: i + 1,
            category: "LOG_LEVEL_ERROR".into(),
            raw_segment: format!("[E] fuzz {i}"),
            timestamp: e.timestamp,
            request_ids: e.request_ids,
            context_before: Vec::new(),
            context_after: Vec::new(),
        })
        .collect();
    let pool: Vec<BackendEntry> = input
        .entries
        .into_iter()
        .take(64)
        .map(|e| BackendEntry {
            timestamp: base + TimeDelta::seconds(i64::from(e.offset_secs)),
            message: e.message,
            request_id: e.request_id,
            source_group: "fuzz".to_owned(),
            source_stream: "fuzz".to_owned(),
        })
        .collect();

    let rows = builder.build(&errors, &pool);

    // 모든 에러는 최소 한 행으로 나타나야 함
    let covered: HashSet<usize> = rows.iter().map(|r| r.frontend_line_number).collect();
    for error in &errors {
        assert!(covered.contains(&error.line_number));
    }

    if scope == DedupScope::Global {
        let mut seen = HashSet::new();
        for row in rows.iter().filter(|r| r.is_correlated()) {
            let identity = row
                .backend_message
                .as_deref()
                .map(|m| m.split_whitespace().collect::<Vec<_>>().join(" "));
            assert!(seen.insert(identity));
        }
    }
});
