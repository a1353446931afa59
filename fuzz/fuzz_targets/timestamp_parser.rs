#![no_main]

use chrono::{FixedOffset, NaiveDate};
use libfuzzer_sys::fuzz_target;
use logtriage_correlator::timestamp::{find_in_line, parse_frontend_timestamp};

fuzz_target!(|input: (&str, i32)| {
    let (line, offset_secs) = input;
    let reference = NaiveDate::from_ymd_opt(2024, 2, 29).expect("valid date");
    let offset = FixedOffset::east_opt(offset_secs % 86_400).unwrap_or(FixedOffset::east_opt(0).expect("utc"));

    let _ = parse_frontend_timestamp(line, reference).and_then(|ts| ts.to_utc(offset));

    if let Some((_, raw)) = find_in_line(line) {
        // 추출된 문자열은 항상 입력의 일부
        assert!(line.contains(raw));
        let _ = parse_frontend_timestamp(raw, reference).and_then(|ts| ts.to_utc(offset));
    }
});
