//! 도메인 타입 -- 시스템 전역에서 사용되는 공통 타입
//!
//! 스캐너가 만드는 [`ErrorRecord`], 외부 조회 컴포넌트가 공급하는 [`BackendEntry`],
//! 매처가 만드는 [`MatchInfo`], 최종 출력 단위인 [`CorrelationRow`]를 정의합니다.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 에러 분류 카테고리
///
/// 내장 카테고리는 닫힌 열거형이고, 런타임에 등록된 규칙은 [`ErrorCategory::Custom`]을 사용합니다.
/// 문자열 표현은 `SCREAMING_SNAKE_CASE`입니다 (예: `LOG_LEVEL_ERROR`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ErrorCategory {
    /// `[E]`, `[ERROR]` 로그 레벨 마커
    LogLevelError,
    /// `[FATAL]` 로그 레벨 마커
    LogLevelFatal,
    /// `[CRITICAL]` 로그 레벨 마커
    LogLevelCritical,
    /// JavaScript `RangeError`
    RangeError,
    /// JavaScript `TypeError`
    TypeError,
    /// JavaScript `ReferenceError`
    ReferenceError,
    /// JavaScript `SyntaxError`
    SyntaxError,
    /// 네트워크 계층 에러
    NetworkError,
    /// 일반 예외 (`Exception:`)
    Exception,
    /// 일반 에러 메시지 (`Error:`)
    ErrorMessage,
    /// 권한 거부
    PermissionDenied,
    /// 인증 실패
    AuthFailure,
    /// 파일시스템/스토리지 실패
    StorageFailure,
    /// 레벨 마커 없는 `FATAL`
    Fatal,
    /// 레벨 마커 없는 `CRITICAL`
    Critical,
    /// 앱 크래시
    Crash,
    /// 연결 실패
    ConnectionFailure,
    /// API 요청 실패
    RequestFailure,
    /// 시간 초과
    Timeout,
    /// `failed to ...`
    Failure,
    /// `unable to ...`
    Unable,
    /// 사용자 정의 카테고리
    Custom(String),
}

impl ErrorCategory {
    /// 카테고리의 문자열 태그를 반환합니다.
    pub fn as_str(&self) -> &str {
        match self {
            Self::LogLevelError => "LOG_LEVEL_ERROR",
            Self::LogLevelFatal => "LOG_LEVEL_FATAL",
            Self::LogLevelCritical => "LOG_LEVEL_CRITICAL",
            Self::RangeError => "RANGE_ERROR",
            Self::TypeError => "TYPE_ERROR",
            Self::ReferenceError => "REFERENCE_ERROR",
            Self::SyntaxError => "SYNTAX_ERROR",
            Self::NetworkError => "NETWORK_ERROR",
            Self::Exception => "EXCEPTION",
            Self::ErrorMessage => "ERROR_MESSAGE",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::AuthFailure => "AUTH_FAILURE",
            Self::StorageFailure => "STORAGE_FAILURE",
            Self::Fatal => "FATAL",
            Self::Critical => "CRITICAL",
            Self::Crash => "CRASH",
            Self::ConnectionFailure => "CONNECTION_FAILURE",
            Self::RequestFailure => "REQUEST_FAILURE",
            Self::Timeout => "TIMEOUT",
            Self::Failure => "FAILURE",
            Self::Unable => "UNABLE",
            Self::Custom(name) => name,
        }
    }

    /// 내장 카테고리인지 확인합니다.
    pub fn is_builtin(&self) -> bool {
        !matches!(self, Self::Custom(_))
    }
}

impl From<String> for ErrorCategory {
    fn from(name: String) -> Self {
        match name.trim() {
            "LOG_LEVEL_ERROR" => Self::LogLevelError,
            "LOG_LEVEL_FATAL" => Self::LogLevelFatal,
            "LOG_LEVEL_CRITICAL" => Self::LogLevelCritical,
            "RANGE_ERROR" => Self::RangeError,
            "TYPE_ERROR" => Self::TypeError,
            "REFERENCE_ERROR" => Self::ReferenceError,
            "SYNTAX_ERROR" => Self::SyntaxError,
            "NETWORK_ERROR" => Self::NetworkError,
            "EXCEPTION" => Self::Exception,
            "ERROR_MESSAGE" => Self::ErrorMessage,
            "PERMISSION_DENIED" => Self::PermissionDenied,
            "AUTH_FAILURE" => Self::AuthFailure,
            "STORAGE_FAILURE" => Self::StorageFailure,
            "FATAL" => Self::Fatal,
            "CRITICAL" => Self::Critical,
            "CRASH" => Self::Crash,
            "CONNECTION_FAILURE" => Self::ConnectionFailure,
            "REQUEST_FAILURE" => Self::RequestFailure,
            "TIMEOUT" => Self::Timeout,
            "FAILURE" => Self::Failure,
            "UNABLE" => Self::Unable,
            other => Self::Custom(other.to_owned()),
        }
    }
}

impl From<&str> for ErrorCategory {
    fn from(name: &str) -> Self {
        Self::from(name.to_owned())
    }
}

impl From<ErrorCategory> for String {
    fn from(category: ErrorCategory) -> Self {
        match category {
            ErrorCategory::Custom(name) => name,
            builtin => builtin.as_str().to_owned(),
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 프론트엔드 로그에서 탐지된 에러 레코드
///
/// 스캔 한 번에서 (카테고리, 정규화된 세그먼트) 시그니처당 하나만 생성되며,
/// 생성 후에는 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// 1부터 시작하는 라인 번호
    pub line_number: usize,
    /// 에러 카테고리
    pub category: ErrorCategory,
    /// 에러가 탐지된 원본 라인
    pub raw_segment: String,
    /// 주변 라인에서 추출한 원본 타임스탬프 문자열 (파싱하지 않음)
    pub timestamp: Option<String>,
    /// 유효성 검증을 통과한 요청 ID (최초 발견 순서, 중복 없음)
    pub request_ids: Vec<String>,
    /// 에러 라인 이전 문맥
    #[serde(default)]
    pub context_before: Vec<String>,
    /// 에러 라인 이후 문맥
    #[serde(default)]
    pub context_after: Vec<String>,
}

impl ErrorRecord {
    /// 앞뒤 공백을 제거한 에러 메시지를 반환합니다.
    pub fn message(&self) -> &str {
        self.raw_segment.trim()
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} [{}] {}", self.line_number, self.category, self.message())
    }
}

/// 원격 백엔드 로그 저장소에서 가져온 로그 엔트리
///
/// 코어는 이 타입을 읽기만 합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendEntry {
    /// 로그 시각 (UTC)
    pub timestamp: DateTime<Utc>,
    /// 로그 메시지
    pub message: String,
    /// 요청 ID
    #[serde(default)]
    pub request_id: Option<String>,
    /// 로그 그룹
    #[serde(default)]
    pub source_group: String,
    /// 로그 스트림
    #[serde(default)]
    pub source_stream: String,
}

impl BackendEntry {
    /// 중복 제거용 식별자를 반환합니다.
    ///
    /// 메시지 내부의 연속 공백을 하나로 합치고 양 끝 공백을 제거한 값입니다.
    pub fn identity(&self) -> String {
        self.message.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

/// 매칭 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    /// 시간 근접 매칭 (낮은 신뢰도)
    TimeProximity,
    /// 요청 ID 일치 (높은 신뢰도)
    IdentifierMatch,
}

impl MatchMethod {
    /// 우선순위 (높을수록 우선)
    pub fn priority(self) -> u8 {
        match self {
            Self::IdentifierMatch => 2,
            Self::TimeProximity => 1,
        }
    }
}

/// (에러 레코드, 백엔드 엔트리) 한 쌍의 매칭 정보
///
/// 방식별 필드를 variant에 담아 모든 소비자가 두 경우를 빠짐없이 처리하도록 합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum MatchInfo {
    /// 요청 ID 일치. 시간 차이는 두 타임스탬프가 모두 있을 때만 채워집니다.
    IdentifierMatch {
        /// 일치한 요청 ID
        matched_request_id: String,
        /// 백엔드 시각 - 프론트엔드 시각 (초)
        time_diff_seconds: Option<f64>,
    },
    /// 시간 근접 매칭
    TimeProximity {
        /// 백엔드 시각 - 프론트엔드 시각 (초)
        time_diff_seconds: f64,
    },
}

impl MatchInfo {
    /// 매칭 방식을 반환합니다.
    pub fn method(&self) -> MatchMethod {
        match self {
            Self::IdentifierMatch { .. } => MatchMethod::IdentifierMatch,
            Self::TimeProximity { .. } => MatchMethod::TimeProximity,
        }
    }

    /// 일치한 요청 ID를 반환합니다.
    pub fn matched_request_id(&self) -> Option<&str> {
        match self {
            Self::IdentifierMatch {
                matched_request_id, ..
            } => Some(matched_request_id),
            Self::TimeProximity { .. } => None,
        }
    }

    /// 부호 있는 시간 차이(초)를 반환합니다.
    pub fn time_diff_seconds(&self) -> Option<f64> {
        match self {
            Self::IdentifierMatch {
                time_diff_seconds, ..
            } => *time_diff_seconds,
            Self::TimeProximity { time_diff_seconds } => Some(*time_diff_seconds),
        }
    }
}

/// 상관 분석 테이블 행의 매칭 방식 컬럼
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationMethod {
    /// 요청 ID 일치
    IdentifierMatch,
    /// 시간 근접
    TimeProximity,
    /// 매칭된 백엔드 로그 없음
    NoCorrelation,
}

impl CorrelationMethod {
    /// 내보내기용 문자열을 반환합니다.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::IdentifierMatch => "identifier_match",
            Self::TimeProximity => "time_proximity",
            Self::NoCorrelation => "no_correlation",
        }
    }
}

impl From<MatchMethod> for CorrelationMethod {
    fn from(method: MatchMethod) -> Self {
        match method {
            MatchMethod::IdentifierMatch => Self::IdentifierMatch,
            MatchMethod::TimeProximity => Self::TimeProximity,
        }
    }
}

impl fmt::Display for CorrelationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 상관 분석 테이블의 한 행
///
/// 에러 레코드 하나와 백엔드 엔트리 최대 하나를 평탄화하여 결합합니다.
/// 입력 데이터의 복사본을 소유하므로 입력보다 오래 살아남을 수 있습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationRow {
    pub frontend_line_number: usize,
    pub frontend_timestamp: Option<String>,
    pub frontend_category: ErrorCategory,
    pub frontend_message: String,
    pub frontend_request_ids: Vec<String>,
    pub backend_timestamp: Option<DateTime<Utc>>,
    pub backend_message: Option<String>,
    pub backend_source_group: Option<String>,
    pub backend_source_stream: Option<String>,
    pub backend_request_id: Option<String>,
    pub matched_request_id: Option<String>,
    pub correlation_method: CorrelationMethod,
    pub time_diff_seconds: Option<f64>,
}

impl CorrelationRow {
    /// 매칭된 백엔드 엔트리와 결합한 행을 생성합니다.
    pub fn matched(error: &ErrorRecord, entry: &BackendEntry, info: &MatchInfo) -> Self {
        Self {
            backend_timestamp: Some(entry.timestamp),
            backend_message: Some(entry.message.trim().to_owned()),
            backend_source_group: Some(entry.source_group.clone()),
            backend_source_stream: Some(entry.source_stream.clone()),
            backend_request_id: entry.request_id.clone(),
            matched_request_id: info.matched_request_id().map(str::to_owned),
            correlation_method: info.method().into(),
            time_diff_seconds: info.time_diff_seconds(),
            ..Self::uncorrelated(error)
        }
    }

    /// 백엔드 필드가 모두 비어 있는 `no_correlation` 행을 생성합니다.
    pub fn uncorrelated(error: &ErrorRecord) -> Self {
        Self {
            frontend_line_number: error.line_number,
            frontend_timestamp: error.timestamp.clone(),
            frontend_category: error.category.clone(),
            frontend_message: error.message().to_owned(),
            frontend_request_ids: error.request_ids.clone(),
            backend_timestamp: None,
            backend_message: None,
            backend_source_group: None,
            backend_source_stream: None,
            backend_request_id: None,
            matched_request_id: None,
            correlation_method: CorrelationMethod::NoCorrelation,
            time_diff_seconds: None,
        }
    }

    /// 백엔드 엔트리가 결합된 행인지 확인합니다.
    pub fn is_correlated(&self) -> bool {
        self.correlation_method != CorrelationMethod::NoCorrelation
    }
}
