//! 패턴 분류기 -- 로그 라인을 에러 카테고리로 분류
//!
//! 순서가 있는 규칙 목록을 유지하며, 먼저 매칭된 규칙이 이깁니다 (다중 라벨 없음).
//! 매칭 전에 제외 규칙을 먼저 검사하고, 제외된 라인은 어떤 규칙에 걸리더라도
//! 분류하지 않습니다.
//!
//! # 아키텍처
//! - [`PatternClassifier`]: 컴파일된 규칙/제외 패턴 보관 및 분류
//! - [`loader`]: YAML 규칙 파일 로딩 및 유효성 검증
//! - [`types`]: 내장 규칙 테이블과 규칙 파일 구조

pub mod loader;
pub mod types;

pub use loader::RuleLoader;
pub use types::{RuleDefinition, RuleFile};

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use logtriage_core::types::ErrorCategory;

use crate::error::CorrelatorError;
use types::{BUILTIN_EXCLUSIONS, BUILTIN_RULES, LEVEL_MARKER_EXCLUSION};

/// 컴파일된 분류 규칙
#[derive(Debug, Clone)]
pub struct ClassifierRule {
    /// 부여할 카테고리
    pub category: ErrorCategory,
    regex: Regex,
}

impl ClassifierRule {
    /// 원본 패턴 문자열
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }
}

static BUILTIN_COMPILED: LazyLock<Vec<ClassifierRule>> = LazyLock::new(|| {
    BUILTIN_RULES
        .iter()
        .map(|(tag, pattern)| ClassifierRule {
            category: ErrorCategory::from(*tag),
            regex: compile_case_insensitive(pattern).expect("built-in rule pattern must compile"),
        })
        .collect()
});

static BUILTIN_EXCLUSIONS_COMPILED: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    let mut compiled =
        vec![Regex::new(LEVEL_MARKER_EXCLUSION).expect("level marker pattern must compile")];
    compiled.extend(BUILTIN_EXCLUSIONS.iter().map(|pattern| {
        compile_case_insensitive(pattern).expect("built-in exclusion pattern must compile")
    }));
    compiled
});

fn compile_case_insensitive(pattern: &str) -> Result<Regex, CorrelatorError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| CorrelatorError::InvalidPattern {
            pattern: pattern.to_owned(),
            reason: e.to_string(),
        })
}

/// 패턴 분류기
///
/// 내장 규칙으로 초기화되며, 런타임에 추가된 규칙은 뒤에 붙으므로
/// 내장 규칙의 우선순위가 유지됩니다. 분류 자체는 부수효과가 없습니다.
///
/// # 사용 예시
/// ```ignore
/// let mut classifier = PatternClassifier::new();
/// classifier.add_rule("PaymentDeclined", "PAYMENT_FAILURE".into())?;
///
/// assert!(classifier.classify("[ERROR] boom").is_some());
/// ```
#[derive(Debug, Clone)]
pub struct PatternClassifier {
    rules: Vec<ClassifierRule>,
    exclusions: Vec<Regex>,
}

impl PatternClassifier {
    /// 내장 규칙과 제외 패턴으로 분류기를 생성합니다.
    pub fn new() -> Self {
        Self {
            rules: BUILTIN_COMPILED.clone(),
            exclusions: BUILTIN_EXCLUSIONS_COMPILED.clone(),
        }
    }

    /// 분류 규칙을 추가합니다. 기존 규칙 뒤에 붙습니다.
    pub fn add_rule(
        &mut self,
        pattern: &str,
        category: ErrorCategory,
    ) -> Result<(), CorrelatorError> {
        let regex = compile_case_insensitive(pattern)?;
        tracing::debug!(pattern, category = %category, "added classification rule");
        self.rules.push(ClassifierRule { category, regex });
        Ok(())
    }

    /// 제외 패턴을 추가합니다.
    pub fn add_exclusion(&mut self, pattern: &str) -> Result<(), CorrelatorError> {
        let regex = compile_case_insensitive(pattern)?;
        tracing::debug!(pattern, "added exclusion pattern");
        self.exclusions.push(regex);
        Ok(())
    }

    /// 규칙 파일의 규칙과 제외 패턴을 모두 추가합니다.
    ///
    /// 패턴 하나라도 컴파일에 실패하면 분류기는 변경되지 않습니다.
    pub fn extend(&mut self, file: &RuleFile) -> Result<usize, CorrelatorError> {
        file.validate()?;

        let rules = file
            .rules
            .iter()
            .map(|def| {
                Ok(ClassifierRule {
                    category: def.category.clone(),
                    regex: compile_case_insensitive(&def.pattern)?,
                })
            })
            .collect::<Result<Vec<_>, CorrelatorError>>()?;
        let exclusions = file
            .exclusions
            .iter()
            .map(|p| compile_case_insensitive(p))
            .collect::<Result<Vec<_>, CorrelatorError>>()?;

        let added = rules.len() + exclusions.len();
        self.rules.extend(rules);
        self.exclusions.extend(exclusions);
        Ok(added)
    }

    /// 라인이 제외 대상인지 확인합니다.
    pub fn is_excluded(&self, line: &str) -> bool {
        self.exclusions.iter().any(|re| re.is_match(line))
    }

    /// 라인을 분류합니다.
    ///
    /// 제외 대상이거나 어떤 규칙에도 매칭되지 않으면 `None`을 반환합니다.
    pub fn classify(&self, line: &str) -> Option<&ErrorCategory> {
        if self.is_excluded(line) {
            return None;
        }
        self.match_rules(line)
    }

    /// 제외 검사 없이 규칙만 평가합니다.
    pub(crate) fn match_rules(&self, line: &str) -> Option<&ErrorCategory> {
        self.rules
            .iter()
            .find(|rule| rule.regex.is_match(line))
            .map(|rule| &rule.category)
    }

    /// 현재 규칙 목록 (우선순위 순)
    pub fn rules(&self) -> &[ClassifierRule] {
        &self.rules
    }

    /// 규칙 수
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// 제외 패턴 수
    pub fn exclusion_count(&self) -> usize {
        self.exclusions.len()
    }
}

impl Default for PatternClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_patterns_compile() {
        let classifier = PatternClassifier::new();
        assert_eq!(classifier.rule_count(), BUILTIN_RULES.len());
        assert_eq!(classifier.exclusion_count(), BUILTIN_EXCLUSIONS.len() + 1);
    }

    #[test]
    fn log_level_marker_is_classified() {
        let classifier = PatternClassifier::new();
        assert_eq!(
            classifier.classify("[ERROR] login failed request_id: abc123xyz"),
            Some(&ErrorCategory::LogLevelError)
        );
        assert_eq!(
            classifier.classify("12:00:01 [E] socket closed"),
            Some(&ErrorCategory::LogLevelError)
        );
    }

    #[test]
    fn first_matching_rule_wins() {
        let classifier = PatternClassifier::new();
        // [FATAL]과 FATAL 둘 다 매칭되지만 먼저 나온 규칙이 이김
        assert_eq!(
            classifier.classify("[FATAL] FATAL crash in renderer"),
            Some(&ErrorCategory::LogLevelFatal)
        );
        assert_eq!(
            classifier.classify("Uncaught TypeError: x is undefined"),
            Some(&ErrorCategory::TypeError)
        );
    }

    #[test]
    fn matching_is_case_insensitive() {
        let classifier = PatternClassifier::new();
        assert_eq!(
            classifier.classify("Upload TIMED OUT after 30s"),
            Some(&ErrorCategory::Timeout)
        );
        assert_eq!(
            classifier.classify("Permission Denied for /data"),
            Some(&ErrorCategory::PermissionDenied)
        );
    }

    #[test]
    fn categories_cover_auth_and_storage() {
        let classifier = PatternClassifier::new();
        assert_eq!(
            classifier.classify("HTTP 401 Unauthorized"),
            Some(&ErrorCategory::AuthFailure)
        );
        assert_eq!(
            classifier.classify("write: no space left on device"),
            Some(&ErrorCategory::StorageFailure)
        );
    }

    #[test]
    fn info_marker_excludes_line() {
        let classifier = PatternClassifier::new();
        assert!(classifier.is_excluded("[INFO] request failed but will retry"));
        assert_eq!(classifier.classify("[D] timeout value set"), None);
    }

    #[test]
    fn false_positive_phrases_are_excluded() {
        let classifier = PatternClassifier::new();
        for line in [
            "registering errorCallback for bridge",
            "config loaded: showError: true",
            "flags error=true",
            "sync done, error_code = 0",
            "upload finished with no error",
            "lint: 0 errors, 2 warnings",
            "entering error recovery mode: failed to flush",
            "onReceiveDataWhenStatusError fired",
        ] {
            assert!(classifier.is_excluded(line), "expected exclusion: {line}");
            assert_eq!(classifier.classify(line), None, "expected none: {line}");
        }
    }

    #[test]
    fn nonzero_error_code_is_not_excluded() {
        let classifier = PatternClassifier::new();
        assert!(!classifier.is_excluded("request failed error_code=500"));
        assert!(!classifier.is_excluded("Error: 10 errors occurred"));
    }

    #[test]
    fn flag_exclusion_needs_error_key() {
        let classifier = PatternClassifier::new();
        for line in [
            r#"payload {"hasError": true}"#,
            "state error = TRUE",
        ] {
            assert!(classifier.is_excluded(line), "expected exclusion: {line}");
        }

        let line = "[ERROR] checkout failed: payment gateway returned 502, retryable=true";
        assert!(!classifier.is_excluded(line));
        assert_eq!(
            classifier.classify(line).map(ErrorCategory::as_str),
            Some("LOG_LEVEL_ERROR")
        );
        assert!(!classifier.is_excluded("Error: upload rejected, retry=true"));
    }

    #[test]
    fn no_error_exclusion_only_at_line_end() {
        let classifier = PatternClassifier::new();
        for line in [
            "validation complete: no errors.",
            "sync finished, no errors found",
        ] {
            assert!(classifier.is_excluded(line), "expected exclusion: {line}");
        }

        let line = "[E] upload failed: no errors in payload but constructor threw";
        assert!(!classifier.is_excluded(line));
        assert!(classifier.classify(line).is_some());
    }

    #[test]
    fn plain_lines_are_not_classified() {
        let classifier = PatternClassifier::new();
        assert_eq!(classifier.classify("user tapped checkout button"), None);
        assert_eq!(classifier.classify(""), None);
    }

    #[test]
    fn custom_rule_is_appended_after_builtins() {
        let mut classifier = PatternClassifier::new();
        classifier
            .add_rule("PaymentDeclined", ErrorCategory::from("PAYMENT_FAILURE"))
            .unwrap();
        assert_eq!(
            classifier.classify("PaymentDeclined code=51"),
            Some(&ErrorCategory::Custom("PAYMENT_FAILURE".to_owned()))
        );
        // 내장 규칙이 우선
        assert_eq!(
            classifier.classify("[ERROR] PaymentDeclined"),
            Some(&ErrorCategory::LogLevelError)
        );
    }

    #[test]
    fn custom_exclusion_suppresses_classification() {
        let mut classifier = PatternClassifier::new();
        classifier.add_exclusion("healthcheck").unwrap();
        assert_eq!(classifier.classify("[ERROR] healthcheck timeout"), None);
    }

    #[test]
    fn invalid_custom_pattern_is_rejected() {
        let mut classifier = PatternClassifier::new();
        let err = classifier
            .add_rule("([a-z", ErrorCategory::from("BROKEN"))
            .unwrap_err();
        assert!(matches!(err, CorrelatorError::InvalidPattern { .. }));
        assert_eq!(classifier.rule_count(), BUILTIN_RULES.len());
    }

    #[test]
    fn extend_is_all_or_nothing() {
        let mut classifier = PatternClassifier::new();
        let file = RuleFile {
            rules: vec![
                RuleDefinition {
                    pattern: "good".to_owned(),
                    category: ErrorCategory::from("GOOD"),
                },
                RuleDefinition {
                    pattern: "(bad".to_owned(),
                    category: ErrorCategory::from("BAD"),
                },
            ],
            exclusions: vec![],
        };
        assert!(classifier.extend(&file).is_err());
        assert_eq!(classifier.rule_count(), BUILTIN_RULES.len());
    }
}
