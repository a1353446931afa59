//! 문맥 추출기 -- 에러 라인 주변에서 요청 ID와 타임스탬프 추출
//!
//! 요청 ID 윈도우와 타임스탬프 윈도우는 서로 독립적이며,
//! 둘 다 중심 라인 앞뒤로 `window` 라인씩 (경계 포함) 검사합니다.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::timestamp;

/// `request_id`, `req-id`, `requestId` 키와 값을 인식하는 패턴
///
/// `key: value`, `key=value`, `"key": "value"` 형식을 모두 처리합니다.
static REQUEST_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)(?:"?(?:request[_-]?id|req[_-]?id|requestId)"?)[:=\s]+["']?([a-zA-Z0-9\-_]+)["']?"#,
    )
    .expect("request id pattern must compile")
});

/// 유효하지 않은 요청 ID 값 (소문자)
const PLACEHOLDER_IDS: [&str; 5] = ["null", "none", "undefined", "nil", "empty"];

/// 유효한 요청 ID의 최소 길이
pub const MIN_REQUEST_ID_LEN: usize = 6;

/// 요청 ID 유효성 검사
///
/// 프론트엔드 스캐너와 백엔드 엔트리가 같은 규칙을 사용해야 합니다.
/// - 빈 문자열 거부
/// - `null`, `none`, `undefined`, `nil`, `empty` 거부 (대소문자 무시)
/// - 6자 미만 거부
pub fn is_valid_request_id(candidate: &str) -> bool {
    if candidate.is_empty() {
        return false;
    }
    if PLACEHOLDER_IDS
        .iter()
        .any(|p| candidate.eq_ignore_ascii_case(p))
    {
        return false;
    }
    candidate.chars().count() >= MIN_REQUEST_ID_LEN
}

/// 텍스트 한 줄에서 요청 ID 후보를 순서대로 모두 찾습니다 (검증 전).
pub fn request_id_candidates(text: &str) -> impl Iterator<Item = &str> {
    REQUEST_ID_PATTERN
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
}

/// 텍스트에서 첫 번째 유효한 요청 ID를 찾습니다.
pub fn first_valid_request_id(text: &str) -> Option<&str> {
    request_id_candidates(text).find(|id| is_valid_request_id(id))
}

/// 중심 라인 주변 윈도우의 인덱스 범위 (경계 포함, 파일 범위로 잘림)
fn window_range(len: usize, center: usize, window: usize) -> std::ops::Range<usize> {
    if len == 0 || center >= len {
        return 0..0;
    }
    let start = center.saturating_sub(window);
    let end = center.saturating_add(window).saturating_add(1).min(len);
    start..end
}

/// 중심 라인 주변에서 유효한 요청 ID를 추출합니다.
///
/// 최초 발견 순서를 유지하며, 정확히 같은 문자열은 한 번만 포함합니다.
pub fn extract_identifiers<S: AsRef<str>>(lines: &[S], center: usize, window: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut ids = Vec::new();

    for line in &lines[window_range(lines.len(), center, window)] {
        for candidate in request_id_candidates(line.as_ref()) {
            if is_valid_request_id(candidate) && seen.insert(candidate) {
                ids.push(candidate.to_owned());
            }
        }
    }

    ids
}

/// 중심 라인 주변에서 첫 번째 타임스탬프를 원본 문자열 그대로 추출합니다.
///
/// 라인 순서가 바깥 루프, 형식 순서가 안쪽 루프입니다.
pub fn extract_timestamp<S: AsRef<str>>(
    lines: &[S],
    center: usize,
    narrow_window: usize,
) -> Option<String> {
    lines[window_range(lines.len(), center, narrow_window)]
        .iter()
        .find_map(|line| timestamp::find_in_line(line.as_ref()).map(|(_, raw)| raw.to_owned()))
}

/// 중심 라인 앞뒤의 문맥 라인을 반환합니다.
pub fn extract_context<S: AsRef<str>>(
    lines: &[S],
    center: usize,
    context_lines: usize,
) -> (Vec<String>, Vec<String>) {
    if center >= lines.len() {
        return (Vec::new(), Vec::new());
    }
    let range = window_range(lines.len(), center, context_lines);
    let before = lines[range.start..center]
        .iter()
        .map(|l| l.as_ref().to_owned())
        .collect();
    let after = lines[center + 1..range.end]
        .iter()
        .map(|l| l.as_ref().to_owned())
        .collect();
    (before, after)
}
