//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 단계는 이 상수를 사용하여 `metrics::counter!()`, `metrics::histogram!()`
//! 매크로를 호출합니다. 레코더(exporter) 설치는 이 저장소의 범위 밖이며,
//! 레코더가 없으면 기록은 아무 일도 하지 않습니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `logtriage_`
//! - 단계명: `scanner_`, `correlation_`, `lookup_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(logtriage_core::metrics::SCANNER_LINES_SCANNED_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 에러 카테고리 레이블 키 (LOG_LEVEL_ERROR, TIMEOUT, ...)
pub const LABEL_CATEGORY: &str = "category";

/// 상관 분석 방식 레이블 키 (identifier_match, time_proximity, no_correlation)
pub const LABEL_METHOD: &str = "method";

/// 결과 레이블 키 (success, failure, timeout, cancelled)
pub const LABEL_RESULT: &str = "result";

// ─── Scanner 메트릭 ────────────────────────────────────────────────

/// Scanner: 스캔한 전체 라인 수 (counter)
pub const SCANNER_LINES_SCANNED_TOTAL: &str = "logtriage_scanner_lines_scanned_total";

/// Scanner: 제외 규칙에 걸린 라인 수 (counter)
pub const SCANNER_LINES_EXCLUDED_TOTAL: &str = "logtriage_scanner_lines_excluded_total";

/// Scanner: 탐지된 에러 레코드 수 (counter, label: category)
pub const SCANNER_ERRORS_DETECTED_TOTAL: &str = "logtriage_scanner_errors_detected_total";

/// Scanner: 시그니처 중복으로 버려진 탐지 수 (counter)
pub const SCANNER_DUPLICATES_SUPPRESSED_TOTAL: &str =
    "logtriage_scanner_duplicates_suppressed_total";

/// Scanner: 스캔 한 번의 처리 시간 (histogram, 초)
pub const SCANNER_SCAN_DURATION_SECONDS: &str = "logtriage_scanner_scan_duration_seconds";

// ─── Correlation 메트릭 ────────────────────────────────────────────

/// Correlation: 생성된 상관 분석 행 수 (counter, label: method)
pub const CORRELATION_ROWS_TOTAL: &str = "logtriage_correlation_rows_total";

/// Correlation: global dedup으로 버려진 매칭 수 (counter)
pub const CORRELATION_DEDUP_SKIPPED_TOTAL: &str = "logtriage_correlation_dedup_skipped_total";

// ─── Lookup 메트릭 ─────────────────────────────────────────────────

/// Lookup: 백엔드 조회 수 (counter, label: result)
pub const LOOKUP_REQUESTS_TOTAL: &str = "logtriage_lookup_requests_total";

/// Lookup: 백엔드 조회 한 번의 소요 시간 (histogram, 초)
pub const LOOKUP_DURATION_SECONDS: &str = "logtriage_lookup_duration_seconds";

/// 모든 메트릭 이름 목록 (테스트 및 문서화용)
pub const ALL_METRIC_NAMES: [&str; 9] = [
    SCANNER_LINES_SCANNED_TOTAL,
    SCANNER_LINES_EXCLUDED_TOTAL,
    SCANNER_ERRORS_DETECTED_TOTAL,
    SCANNER_DUPLICATES_SUPPRESSED_TOTAL,
    SCANNER_SCAN_DURATION_SECONDS,
    CORRELATION_ROWS_TOTAL,
    CORRELATION_DEDUP_SKIPPED_TOTAL,
    LOOKUP_REQUESTS_TOTAL,
    LOOKUP_DURATION_SECONDS,
];

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    // Scanner
    describe_counter!(
        SCANNER_LINES_SCANNED_TOTAL,
        "Total number of frontend log lines scanned"
    );
    describe_counter!(
        SCANNER_LINES_EXCLUDED_TOTAL,
        "Lines skipped by an exclusion pattern"
    );
    describe_counter!(
        SCANNER_ERRORS_DETECTED_TOTAL,
        "Error records emitted by the scanner, by category"
    );
    describe_counter!(
        SCANNER_DUPLICATES_SUPPRESSED_TOTAL,
        "Detections dropped because their signature was already seen"
    );
    describe_histogram!(
        SCANNER_SCAN_DURATION_SECONDS,
        "Time spent scanning one log text"
    );

    // Correlation
    describe_counter!(
        CORRELATION_ROWS_TOTAL,
        "Correlation rows emitted, by correlation method"
    );
    describe_counter!(
        CORRELATION_DEDUP_SKIPPED_TOTAL,
        "Matches dropped by global backend deduplication"
    );

    // Lookup
    describe_counter!(
        LOOKUP_REQUESTS_TOTAL,
        "Backend log lookups issued, by result"
    );
    describe_histogram!(
        LOOKUP_DURATION_SECONDS,
        "Duration of a single backend log lookup"
    );
}
