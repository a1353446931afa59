//! 분류 규칙 타입 정의 -- 내장 규칙 테이블과 YAML 규칙 파일 구조

use serde::{Deserialize, Serialize};

use logtriage_core::types::ErrorCategory;

use crate::error::CorrelatorError;

/// 내장 분류 규칙 (카테고리 태그, 패턴)
///
/// 순서가 우선순위입니다. 먼저 매칭된 규칙이 이깁니다.
/// 모든 패턴은 대소문자를 구분하지 않고 부분 검색으로 평가됩니다.
pub const BUILTIN_RULES: &[(&str, &str)] = &[
    // 명시적 로그 레벨
    ("LOG_LEVEL_ERROR", r"\[E\]"),
    ("LOG_LEVEL_ERROR", r"\[ERROR\]"),
    ("LOG_LEVEL_FATAL", r"\[FATAL\]"),
    ("LOG_LEVEL_CRITICAL", r"\[CRITICAL\]"),
    // 언어 예외
    ("RANGE_ERROR", r"\bRangeError\b"),
    ("TYPE_ERROR", r"\bTypeError\b"),
    ("REFERENCE_ERROR", r"\bReferenceError\b"),
    ("SYNTAX_ERROR", r"\bSyntaxError\b"),
    ("NETWORK_ERROR", r"\bNetworkError\b"),
    ("EXCEPTION", r"\bException:"),
    ("EXCEPTION", r"^Exception\b"),
    ("ERROR_MESSAGE", r"\bError:"),
    ("ERROR_MESSAGE", r"^Error\b"),
    // 권한/인증
    ("PERMISSION_DENIED", r"permission denied|access denied|\bforbidden\b"),
    (
        "AUTH_FAILURE",
        r"\bunauthori[sz]ed\b|authentication failed|token expired|invalid token",
    ),
    // 파일시스템/스토리지
    (
        "STORAGE_FAILURE",
        r"no such file|no space left|disk full|\bENOENT\b|quota exceeded",
    ),
    // 시스템
    ("FATAL", r"\bFATAL\b"),
    ("CRITICAL", r"\bCRITICAL\b"),
    ("CRASH", r"\bcrash\b"),
    ("FAILURE", r"\bfailed to\b"),
    // 네트워크/API
    (
        "CONNECTION_FAILURE",
        r"cannot connect|connection refused|connection reset",
    ),
    ("UNABLE", r"unable to"),
    ("REQUEST_FAILURE", r"request failed"),
    ("TIMEOUT", r"timeout|timed out"),
];

/// 정보/디버그 레벨 마커 (대소문자 구분)
pub const LEVEL_MARKER_EXCLUSION: &str = r"\[(?:I|INFO|D|DEBUG|TRACE)\]";

/// 에러 단어를 포함하지만 에러가 아닌 문구 (대소문자 무시)
pub const BUILTIN_EXCLUSIONS: &[&str] = &[
    r"receivedatawhenstatuserror",
    // `error: true`, `error=true`, `"hasError": true` 같은 플래그 값
    r#"error["']?\s*[:=]\s*true\b"#,
    r"errorcallback",
    r"error_code\s*[:=]\s*0\b",
    // 줄 끝의 "no error(s)" 요약만
    r"\bno errors?(?: (?:found|detected|reported))?\s*[.!]?\s*$",
    r"\b0 errors\b",
    r"error handling",
    r"error recovery",
];

/// 규칙 파일 하나에 허용되는 최대 규칙 수
pub const MAX_CUSTOM_RULES: usize = 1000;

/// 사용자 정의 분류 규칙
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDefinition {
    /// 정규식 패턴 (대소문자 무시)
    pub pattern: String,
    /// 매칭 시 부여할 카테고리
    pub category: ErrorCategory,
}

impl RuleDefinition {
    /// 규칙 정의의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), CorrelatorError> {
        if self.pattern.trim().is_empty() {
            return Err(CorrelatorError::InvalidPattern {
                pattern: self.pattern.clone(),
                reason: "pattern must not be empty".to_owned(),
            });
        }
        if self.category.as_str().trim().is_empty() {
            return Err(CorrelatorError::InvalidPattern {
                pattern: self.pattern.clone(),
                reason: "category must not be empty".to_owned(),
            });
        }
        Ok(())
    }
}

/// YAML 규칙 파일 구조
///
/// ```yaml
/// rules:
///   - pattern: "PaymentDeclined"
///     category: PAYMENT_FAILURE
/// exclusions:
///   - "healthcheck"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleFile {
    /// 내장 규칙 뒤에 추가될 분류 규칙
    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
    /// 제외 패턴
    #[serde(default)]
    pub exclusions: Vec<String>,
}

impl RuleFile {
    /// 규칙 파일 전체의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), CorrelatorError> {
        if self.rules.len() + self.exclusions.len() > MAX_CUSTOM_RULES {
            return Err(CorrelatorError::InvalidPattern {
                pattern: String::new(),
                reason: format!("too many rules: max {MAX_CUSTOM_RULES}"),
            });
        }
        for rule in &self.rules {
            rule.validate()?;
        }
        if let Some(empty) = self.exclusions.iter().find(|p| p.trim().is_empty()) {
            return Err(CorrelatorError::InvalidPattern {
                pattern: empty.clone(),
                reason: "exclusion pattern must not be empty".to_owned(),
            });
        }
        Ok(())
    }
}
