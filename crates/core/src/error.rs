//! 에러 타입 -- 도메인별 에러 정의
//!
//! 스캔 대상 로그 라인 하나 때문에 에러가 발생하는 일은 없습니다.
//! 여기 정의된 에러는 설정 오류, 백엔드 조회 실패, 내보내기 실패처럼
//! 호출자가 처리해야 하는 상황만 표현합니다.

/// logtriage 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 백엔드 로그 조회 에러
    #[error("lookup error: {0}")]
    Lookup(#[from] LookupError),

    /// 상관 분석 테이블 내보내기 에러
    #[error("export error: {0}")]
    Export(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 백엔드 로그 조회 에러
///
/// 조회 실패는 치명적이지 않습니다. 엔진은 해당 에러 레코드를
/// 빈 백엔드 풀로 상관 분석하여 `no_correlation` 행으로 강등합니다.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// 백엔드 저장소에 연결할 수 없음
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// 조회 쿼리 실패
    #[error("query failed: {0}")]
    Query(String),

    /// 조회 시간 초과
    #[error("lookup timed out after {secs}s")]
    Timeout { secs: u64 },

    /// 호출자가 조회를 취소함
    #[error("lookup cancelled")]
    Cancelled,
}
