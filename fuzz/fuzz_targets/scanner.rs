#![no_main]

use std::sync::LazyLock;

use libfuzzer_sys::fuzz_target;
use logtriage_correlator::{ErrorScanner, ScanConfig};

static SCANNER: LazyLock<ErrorScanner> =
    LazyLock::new(|| ErrorScanner::new(ScanConfig::default()).expect("default scanner"));

fuzz_target!(|data: &[u8]| {
    // 실제 리포트처럼 잘못된 UTF-8은 대체 문자로 바꿔서 스캔
    let text = String::from_utf8_lossy(data);
    let records = SCANNER.scan(&text);

    let line_count = text.lines().count();
    for pair in records.windows(2) {
        assert!(pair[0].line_number < pair[1].line_number);
    }
    for record in &records {
        assert!(record.line_number >= 1 && record.line_number <= line_count);
    }
});
