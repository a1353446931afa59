//! 설정 관리 -- logtriage.toml 파싱 및 런타임 설정
//!
//! [`TriageConfig`]는 모든 단계의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`LOGTRIAGE_CORRELATION_TIME_WINDOW_MINUTES=5` 형식)
//! 3. 설정 파일 (`logtriage.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), logtriage_core::error::TriageError> {
//! use logtriage_core::config::TriageConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = TriageConfig::load("logtriage.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = TriageConfig::parse("[scanner]\nrequest_id_window = 3")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use chrono::{FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, TriageError};

/// 허용되는 dedup 범위 값
pub const DEDUP_SCOPES: [&str; 2] = ["per_error", "global"];

/// logtriage 통합 설정
///
/// `logtriage.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 단계는 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriageConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 에러 스캐너 설정
    #[serde(default)]
    pub scanner: ScannerConfig,
    /// 상관 분석 설정
    #[serde(default)]
    pub correlation: CorrelationConfig,
    /// 백엔드 조회 설정
    #[serde(default)]
    pub lookup: LookupConfig,
}

impl TriageConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    /// 3. 유효성 검증
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, TriageError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, TriageError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TriageError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                TriageError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, TriageError> {
        toml::from_str(toml_str).map_err(|e| {
            TriageError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `LOGTRIAGE_{SECTION}_{FIELD}`
    /// 예: `LOGTRIAGE_CORRELATION_CLIENT_UTC_OFFSET=-04:00`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "LOGTRIAGE_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "LOGTRIAGE_GENERAL_LOG_FORMAT");

        // Scanner
        override_usize(
            &mut self.scanner.request_id_window,
            "LOGTRIAGE_SCANNER_REQUEST_ID_WINDOW",
        );
        override_usize(
            &mut self.scanner.timestamp_window,
            "LOGTRIAGE_SCANNER_TIMESTAMP_WINDOW",
        );
        override_usize(
            &mut self.scanner.context_lines,
            "LOGTRIAGE_SCANNER_CONTEXT_LINES",
        );
        override_opt_string(
            &mut self.scanner.custom_rules_path,
            "LOGTRIAGE_SCANNER_CUSTOM_RULES_PATH",
        );

        // Correlation
        override_u64(
            &mut self.correlation.time_window_minutes,
            "LOGTRIAGE_CORRELATION_TIME_WINDOW_MINUTES",
        );
        override_usize(
            &mut self.correlation.max_matches_per_error,
            "LOGTRIAGE_CORRELATION_MAX_MATCHES_PER_ERROR",
        );
        override_string(
            &mut self.correlation.dedup_scope,
            "LOGTRIAGE_CORRELATION_DEDUP_SCOPE",
        );
        override_opt_string(
            &mut self.correlation.client_utc_offset,
            "LOGTRIAGE_CORRELATION_CLIENT_UTC_OFFSET",
        );
        override_opt_string(
            &mut self.correlation.reference_date,
            "LOGTRIAGE_CORRELATION_REFERENCE_DATE",
        );

        // Lookup
        override_usize(
            &mut self.lookup.max_concurrent,
            "LOGTRIAGE_LOOKUP_MAX_CONCURRENT",
        );
        override_u64(&mut self.lookup.timeout_secs, "LOGTRIAGE_LOOKUP_TIMEOUT_SECS");
    }

    /// 설정값의 유효성을 검증합니다.
    ///
    /// `client_utc_offset`가 없는 것은 여기서 에러가 아닙니다.
    /// 스캔만 하는 경우에는 필요 없고, 상관 분석을 시작할 때 검사합니다.
    pub fn validate(&self) -> Result<(), TriageError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        if self.scanner.request_id_window == 0 {
            return Err(invalid(
                "scanner.request_id_window",
                "must be greater than 0".to_owned(),
            ));
        }
        if self.scanner.timestamp_window == 0 {
            return Err(invalid(
                "scanner.timestamp_window",
                "must be greater than 0".to_owned(),
            ));
        }

        if self.correlation.time_window_minutes == 0 {
            return Err(invalid(
                "correlation.time_window_minutes",
                "must be greater than 0".to_owned(),
            ));
        }
        if self.correlation.max_matches_per_error == 0 {
            return Err(invalid(
                "correlation.max_matches_per_error",
                "must be greater than 0".to_owned(),
            ));
        }
        if !DEDUP_SCOPES.contains(&self.correlation.dedup_scope.as_str()) {
            return Err(invalid(
                "correlation.dedup_scope",
                format!("must be one of: {}", DEDUP_SCOPES.join(", ")),
            ));
        }
        if let Some(offset) = &self.correlation.client_utc_offset {
            parse_utc_offset(offset)?;
        }
        if let Some(date) = &self.correlation.reference_date {
            parse_reference_date(date)?;
        }

        if self.lookup.max_concurrent == 0 {
            return Err(invalid(
                "lookup.max_concurrent",
                "must be greater than 0".to_owned(),
            ));
        }
        if self.lookup.timeout_secs == 0 {
            return Err(invalid(
                "lookup.timeout_secs",
                "must be greater than 0".to_owned(),
            ));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: String) -> TriageError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

/// UTC 오프셋 문자열을 파싱합니다.
///
/// 허용 형식: `Z`, `UTC`, `+HH:MM`, `-HH:MM`, `+HHMM`, `-HH`.
/// 범위는 ±23:59 입니다.
pub fn parse_utc_offset(raw: &str) -> Result<FixedOffset, ConfigError> {
    let value = raw.trim();
    let fail = |reason: &str| ConfigError::InvalidValue {
        field: "correlation.client_utc_offset".to_owned(),
        reason: format!("'{value}': {reason}"),
    };

    if value.eq_ignore_ascii_case("z") || value.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or_else(|| fail("out of range"));
    }

    let (sign, rest) = match value.as_bytes().first() {
        Some(b'+') => (1, &value[1..]),
        Some(b'-') => (-1, &value[1..]),
        _ => return Err(fail("expected a leading '+' or '-'")),
    };

    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(fail("expected digits in HH:MM form"));
    }
    let (hours, minutes) = match digits.len() {
        1 | 2 => (digits.as_str(), "0"),
        4 => (&digits[..2], &digits[2..]),
        _ => return Err(fail("expected HH:MM")),
    };
    let hours: i32 = hours.parse().map_err(|_| fail("invalid hours"))?;
    let minutes: i32 = minutes.parse().map_err(|_| fail("invalid minutes"))?;
    if hours > 23 || minutes > 59 {
        return Err(fail("out of range"));
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(|| fail("out of range"))
}

/// 기준 날짜 문자열(`YYYY-MM-DD`)을 파싱합니다.
pub fn parse_reference_date(raw: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| ConfigError::InvalidValue {
        field: "correlation.reference_date".to_owned(),
        reason: format!("'{raw}': {e}"),
    })
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 에러 스캐너 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// 요청 ID 추출 윈도우 (에러 라인 앞뒤 라인 수)
    pub request_id_window: usize,
    /// 타임스탬프 추출 윈도우 (에러 라인 앞뒤 라인 수)
    pub timestamp_window: usize,
    /// 에러 레코드에 첨부할 문맥 라인 수 (앞뒤 각각)
    pub context_lines: usize,
    /// 사용자 정의 규칙 YAML 파일 경로
    pub custom_rules_path: Option<String>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            request_id_window: 5,
            timestamp_window: 2,
            context_lines: 10,
            custom_rules_path: None,
        }
    }
}

/// 상관 분석 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    /// 시간 근접 매칭 윈도우 (분, 대칭)
    pub time_window_minutes: u64,
    /// 에러당 최대 매칭 수
    pub max_matches_per_error: usize,
    /// 백엔드 엔트리 중복 제거 범위 (per_error, global)
    pub dedup_scope: String,
    /// 모바일 클라이언트 로그의 UTC 오프셋 (예: "-04:00")
    ///
    /// 기본값이 없습니다. 상관 분석 시 반드시 지정해야 합니다.
    pub client_utc_offset: Option<String>,
    /// 부분 타임스탬프(`MM-DD`, 시각만 등)를 보완할 기준 날짜 (`YYYY-MM-DD`)
    pub reference_date: Option<String>,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            time_window_minutes: 10,
            max_matches_per_error: 3,
            dedup_scope: "per_error".to_owned(),
            client_utc_offset: None,
            reference_date: None,
        }
    }
}

/// 백엔드 조회 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// 동시 조회 최대 수
    pub max_concurrent: usize,
    /// 조회 하나의 타임아웃 (초)
    pub timeout_secs: u64,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 8,
            timeout_secs: 30,
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_opt_string(target: &mut Option<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = if val.trim().is_empty() { None } else { Some(val) };
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}
