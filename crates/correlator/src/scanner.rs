//! 에러 스캐너 -- 로그 텍스트에서 고유한 에러 레코드 추출
//!
//! 라인 순서대로 제외 검사, 분류, 문맥 추출을 수행하고
//! 정규화된 시그니처(`카테고리:정규화된_세그먼트`)로 중복을 제거합니다.
//! 스캔은 단일 스레드의 순수 계산이며 같은 입력과 규칙에 대해 결정적입니다.
//! 어떤 입력 라인도 스캔을 중단시키지 않습니다.

use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Instant;

use regex::Regex;
use tracing::{debug, info};

use logtriage_core::metrics as m;
use logtriage_core::types::{ErrorCategory, ErrorRecord};

use crate::config::ScanConfig;
use crate::context;
use crate::error::CorrelatorError;
use crate::rule::PatternClassifier;

static ISO_TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{4}-\d{2}-\d{2}[T\s]\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:Z|[+-]\d{2}:?\d{2})?")
        .expect("iso timestamp pattern must compile")
});

static BRACKETED_TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\d{2}-\d{2} \d{2}:\d{2}:\d{2}\]")
        .expect("bracketed timestamp pattern must compile")
});

static BARE_INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d+\b").expect("integer pattern must compile"));

static HEX_ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"0x[0-9a-fA-F]+").expect("hex pattern must compile"));

static FILE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[/\\][\w/\\.-]+[/\\](\w+\.\w+)").expect("path pattern must compile")
});

/// 에러 세그먼트를 정규화합니다.
///
/// 1. 타임스탬프 제거
/// 2. 정수 -> `N`
/// 3. 16진 주소 -> `0xADDR`
/// 4. 파일 경로 -> 파일명
/// 5. 공백 정리 후 소문자화
pub fn normalize_segment(segment: &str) -> String {
    let text = ISO_TIMESTAMP.replace_all(segment.trim(), "");
    let text = BRACKETED_TIMESTAMP.replace_all(&text, "");
    let text = BARE_INTEGER.replace_all(&text, "N");
    let text = HEX_ADDRESS.replace_all(&text, "0xADDR");
    let text = FILE_PATH.replace_all(&text, "$1");
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// 에러 시그니처를 생성합니다.
pub fn signature(category: &ErrorCategory, segment: &str) -> String {
    format!("{}:{}", category, normalize_segment(segment))
}

/// 에러 스캐너
///
/// # 사용 예시
/// ```ignore
/// let scanner = ErrorScanner::new(ScanConfig::default())?;
/// let errors = scanner.scan(&log_text);
/// ```
#[derive(Debug, Clone)]
pub struct ErrorScanner {
    classifier: PatternClassifier,
    config: ScanConfig,
}

impl ErrorScanner {
    /// 내장 규칙으로 스캐너를 생성합니다.
    pub fn new(config: ScanConfig) -> Result<Self, CorrelatorError> {
        Self::with_classifier(config, PatternClassifier::new())
    }

    /// 주어진 분류기로 스캐너를 생성합니다.
    pub fn with_classifier(
        config: ScanConfig,
        classifier: PatternClassifier,
    ) -> Result<Self, CorrelatorError> {
        config.validate()?;
        Ok(Self { classifier, config })
    }

    /// 분류기 참조
    pub fn classifier(&self) -> &PatternClassifier {
        &self.classifier
    }

    /// 스캐너 설정 참조
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// 로그 텍스트를 스캔하여 고유한 에러 레코드를 라인 순서대로 반환합니다.
    pub fn scan(&self, text: &str) -> Vec<ErrorRecord> {
        let started = Instant::now();
        let lines: Vec<&str> = text.lines().collect();
        let mut seen = HashSet::new();
        let mut records = Vec::new();
        let mut excluded = 0u64;
        let mut duplicates = 0u64;

        for (index, line) in lines.iter().enumerate() {
            if self.classifier.is_excluded(line) {
                excluded += 1;
                continue;
            }
            let Some(category) = self.classifier.match_rules(line) else {
                continue;
            };

            let line_number = index + 1;
            if !seen.insert(signature(category, line)) {
                duplicates += 1;
                debug!(line = line_number, category = %category, "skipped duplicate error");
                continue;
            }

            let (context_before, context_after) =
                context::extract_context(&lines, index, self.config.context_lines);
            let record = ErrorRecord {
                line_number,
                category: category.clone(),
                raw_segment: (*line).to_owned(),
                timestamp: context::extract_timestamp(&lines, index, self.config.timestamp_window),
                request_ids: context::extract_identifiers(
                    &lines,
                    index,
                    self.config.request_id_window,
                ),
                context_before,
                context_after,
            };

            debug!(
                line = line_number,
                category = %record.category,
                request_ids = record.request_ids.len(),
                has_timestamp = record.timestamp.is_some(),
                "detected error"
            );
            metrics::counter!(m::SCANNER_ERRORS_DETECTED_TOTAL, m::LABEL_CATEGORY => record.category.to_string())
                .increment(1);
            records.push(record);
        }

        metrics::counter!(m::SCANNER_LINES_SCANNED_TOTAL).increment(lines.len() as u64);
        metrics::counter!(m::SCANNER_LINES_EXCLUDED_TOTAL).increment(excluded);
        metrics::counter!(m::SCANNER_DUPLICATES_SUPPRESSED_TOTAL).increment(duplicates);
        metrics::histogram!(m::SCANNER_SCAN_DURATION_SECONDS).record(started.elapsed().as_secs_f64());

        info!(
            lines = lines.len(),
            error_count = records.len(),
            excluded,
            duplicates,
            "scan complete"
        );

        records
    }
}
