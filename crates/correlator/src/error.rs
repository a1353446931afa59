//! 상관 분석 엔진 에러 타입
//!
//! [`CorrelatorError`]는 엔진을 구성하거나 규칙을 로드할 때 발생하는 에러를 표현합니다.
//! 로그 라인 하나 때문에 발생하는 에러는 없습니다. 잘못된 타임스탬프나 요청 ID는
//! 해당 필드를 비워 두는 것으로 처리됩니다.
//!
//! `From<CorrelatorError> for TriageError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use logtriage_core::error::{ConfigError, LookupError, TriageError};

/// 상관 분석 엔진 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum CorrelatorError {
    /// 규칙 파일 로딩 실패
    #[error("rule load error: {path}: {reason}")]
    RuleLoad {
        /// 규칙 파일 경로
        path: String,
        /// 로딩 실패 사유
        reason: String,
    },

    /// 분류 규칙 또는 제외 패턴의 정규식이 유효하지 않음
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// 문제가 된 패턴
        pattern: String,
        /// 실패 사유
        reason: String,
    },

    /// 설정 에러 (0 윈도우, 0 매칭 한도, 오프셋 누락 등)
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 백엔드 엔트리 파일 로딩 실패
    #[error("backend load error: {source_name}: {reason}")]
    BackendLoad {
        /// 파일 경로 또는 소스 이름
        source_name: String,
        /// 로딩 실패 사유
        reason: String,
    },

    /// 백엔드 조회 에러
    #[error("lookup error: {0}")]
    Lookup(#[from] LookupError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// 정규식 컴파일 에러
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl CorrelatorError {
    /// 설정 에러를 생성합니다.
    pub(crate) fn config(field: &str, reason: impl Into<String>) -> Self {
        Self::Config {
            field: field.to_owned(),
            reason: reason.into(),
        }
    }
}

impl From<ConfigError> for CorrelatorError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::InvalidValue { field, reason } => Self::Config { field, reason },
            other => Self::Config {
                field: "config".to_owned(),
                reason: other.to_string(),
            },
        }
    }
}

impl From<CorrelatorError> for TriageError {
    fn from(err: CorrelatorError) -> Self {
        match err {
            CorrelatorError::Config { field, reason } => {
                TriageError::Config(ConfigError::InvalidValue { field, reason })
            }
            CorrelatorError::Lookup(e) => TriageError::Lookup(e),
            load @ CorrelatorError::BackendLoad { .. } => {
                TriageError::Lookup(LookupError::Unavailable(load.to_string()))
            }
            CorrelatorError::Io(e) => TriageError::Io(e),
            other => TriageError::Config(ConfigError::ParseFailed {
                reason: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_load_error_display() {
        let err = CorrelatorError::RuleLoad {
            path: "/etc/logtriage/rules.yaml".to_owned(),
            reason: "invalid YAML".to_owned(),
        };
        assert!(err.to_string().contains("rules.yaml"));
    }

    #[test]
    fn invalid_pattern_display() {
        let err = CorrelatorError::InvalidPattern {
            pattern: "([a-z".to_owned(),
            reason: "unclosed group".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("([a-z"));
        assert!(msg.contains("unclosed group"));
    }

    #[test]
    fn config_error_converts_to_triage_config_error() {
        let err = CorrelatorError::config("time_window", "must be greater than 0");
        let triage: TriageError = err.into();
        assert!(matches!(
            triage,
            TriageError::Config(ConfigError::InvalidValue { .. })
        ));
        assert!(triage.to_string().contains("time_window"));
    }

    #[test]
    fn lookup_error_keeps_its_variant() {
        let triage: TriageError = CorrelatorError::Lookup(LookupError::Cancelled).into();
        assert!(matches!(triage, TriageError::Lookup(LookupError::Cancelled)));
    }

    #[test]
    fn backend_load_maps_to_unavailable_lookup() {
        let err = CorrelatorError::BackendLoad {
            source_name: "backend.jsonl".to_owned(),
            reason: "line 3: expected value".to_owned(),
        };
        let triage: TriageError = err.into();
        assert!(matches!(
            triage,
            TriageError::Lookup(LookupError::Unavailable(_))
        ));
        assert!(triage.to_string().contains("backend.jsonl"));
    }

    #[test]
    fn core_invalid_value_maps_to_config() {
        let err: CorrelatorError = ConfigError::InvalidValue {
            field: "correlation.client_utc_offset".to_owned(),
            reason: "bad".to_owned(),
        }
        .into();
        assert!(matches!(err, CorrelatorError::Config { .. }));
    }
}
