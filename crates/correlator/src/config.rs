//! 상관 분석 엔진 설정
//!
//! [`EngineConfig`]는 core의 [`TriageConfig`](logtriage_core::config::TriageConfig)를
//! 기반으로 엔진 전용 설정을 제공합니다. 문자열 설정값(오프셋, 날짜, dedup 범위)은
//! 여기서 타입 있는 값으로 변환됩니다.
//!
//! # 사용 예시
//! ```ignore
//! use logtriage_core::config::TriageConfig;
//! use logtriage_correlator::config::EngineConfig;
//!
//! let core_config = TriageConfig::default();
//! let config = EngineConfig::from_core(&core_config)?;
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{FixedOffset, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use logtriage_core::config::{TriageConfig, parse_reference_date, parse_utc_offset};

use crate::error::CorrelatorError;

/// 백엔드 엔트리 중복 제거 범위
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupScope {
    /// 에러별로만 중복 제거 (기본값)
    #[default]
    PerError,
    /// 테이블 전체에서 같은 백엔드 엔트리는 한 번만 출력
    Global,
}

impl DedupScope {
    /// 설정 문자열 표현
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PerError => "per_error",
            Self::Global => "global",
        }
    }
}

impl FromStr for DedupScope {
    type Err = CorrelatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per_error" | "per-error" => Ok(Self::PerError),
            "global" => Ok(Self::Global),
            other => Err(CorrelatorError::config(
                "dedup_scope",
                format!("unknown scope '{other}', expected per_error or global"),
            )),
        }
    }
}

impl fmt::Display for DedupScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 스캐너 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// 요청 ID 추출 윈도우
    pub request_id_window: usize,
    /// 타임스탬프 추출 윈도우
    pub timestamp_window: usize,
    /// 문맥 라인 수 (0이면 문맥 없음)
    pub context_lines: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            request_id_window: 5,
            timestamp_window: 2,
            context_lines: 10,
        }
    }
}

impl ScanConfig {
    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), CorrelatorError> {
        if self.request_id_window == 0 {
            return Err(CorrelatorError::config(
                "request_id_window",
                "must be greater than 0",
            ));
        }
        if self.timestamp_window == 0 {
            return Err(CorrelatorError::config(
                "timestamp_window",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// 매처 설정
///
/// 클라이언트 UTC 오프셋은 필수입니다. 기본값으로 추측하지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchConfig {
    /// 시간 근접 매칭 윈도우 (대칭)
    pub time_window: TimeDelta,
    /// 에러당 최대 매칭 수
    pub max_matches: usize,
    /// 프론트엔드 로컬 타임스탬프에 적용할 UTC 오프셋
    pub client_offset: FixedOffset,
    /// 부분 타임스탬프를 보완할 기준 날짜
    pub reference_date: NaiveDate,
}

impl MatchConfig {
    /// 기본 윈도우(10분)와 매칭 한도(3)로 설정을 생성합니다.
    ///
    /// 기준 날짜는 현재 UTC 날짜입니다.
    pub fn new(client_offset: FixedOffset) -> Self {
        Self {
            time_window: TimeDelta::minutes(10),
            max_matches: 3,
            client_offset,
            reference_date: Utc::now().date_naive(),
        }
    }

    /// 시간 윈도우(분)를 설정합니다.
    pub fn with_time_window_minutes(mut self, minutes: u64) -> Self {
        self.time_window = i64::try_from(minutes)
            .ok()
            .and_then(TimeDelta::try_minutes)
            .unwrap_or(TimeDelta::MAX);
        self
    }

    /// 에러당 최대 매칭 수를 설정합니다.
    pub fn with_max_matches(mut self, max: usize) -> Self {
        self.max_matches = max;
        self
    }

    /// 기준 날짜를 설정합니다.
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = date;
        self
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), CorrelatorError> {
        if self.time_window <= TimeDelta::zero() {
            return Err(CorrelatorError::config(
                "time_window_minutes",
                "must be greater than 0",
            ));
        }
        if self.max_matches == 0 {
            return Err(CorrelatorError::config(
                "max_matches_per_error",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// 엔진 설정
///
/// core의 `TriageConfig`에서 파생되며, 문자열 설정값을 파싱한 결과를 보관합니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// 스캐너 설정
    pub scan: ScanConfig,
    /// 시간 근접 매칭 윈도우 (분)
    pub time_window_minutes: u64,
    /// 에러당 최대 매칭 수
    pub max_matches_per_error: usize,
    /// 중복 제거 범위
    pub dedup_scope: DedupScope,
    /// 클라이언트 UTC 오프셋 (상관 분석에 필수)
    pub client_offset: Option<FixedOffset>,
    /// 기준 날짜 (없으면 실행 시점의 UTC 날짜)
    pub reference_date: Option<NaiveDate>,
    /// 동시 백엔드 조회 최대 수
    pub max_concurrent_lookups: usize,
    /// 조회 하나의 타임아웃 (초)
    pub lookup_timeout_secs: u64,
    /// 사용자 정의 규칙 파일 경로
    pub custom_rules_path: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scan: ScanConfig::default(),
            time_window_minutes: 10,
            max_matches_per_error: 3,
            dedup_scope: DedupScope::PerError,
            client_offset: None,
            reference_date: None,
            max_concurrent_lookups: 8,
            lookup_timeout_secs: 30,
            custom_rules_path: None,
        }
    }
}

impl EngineConfig {
    /// core 설정에서 엔진 설정을 생성합니다.
    ///
    /// 오프셋, 날짜, dedup 범위 문자열을 파싱하며 실패하면 에러를 반환합니다.
    pub fn from_core(core: &TriageConfig) -> Result<Self, CorrelatorError> {
        let client_offset = core
            .correlation
            .client_utc_offset
            .as_deref()
            .map(parse_utc_offset)
            .transpose()?;
        let reference_date = core
            .correlation
            .reference_date
            .as_deref()
            .map(parse_reference_date)
            .transpose()?;

        let config = Self {
            scan: ScanConfig {
                request_id_window: core.scanner.request_id_window,
                timestamp_window: core.scanner.timestamp_window,
                context_lines: core.scanner.context_lines,
            },
            time_window_minutes: core.correlation.time_window_minutes,
            max_matches_per_error: core.correlation.max_matches_per_error,
            dedup_scope: core.correlation.dedup_scope.parse()?,
            client_offset,
            reference_date,
            max_concurrent_lookups: core.lookup.max_concurrent,
            lookup_timeout_secs: core.lookup.timeout_secs,
            custom_rules_path: core.scanner.custom_rules_path.clone(),
        };
        config.validate()?;
        Ok(config)
    }

    /// 매처 설정을 생성합니다.
    ///
    /// # Errors
    /// 클라이언트 UTC 오프셋이 지정되지 않은 경우
    pub fn match_config(&self) -> Result<MatchConfig, CorrelatorError> {
        let offset = self.client_offset.ok_or_else(|| {
            CorrelatorError::config(
                "client_utc_offset",
                "correlation requires an explicit client UTC offset (e.g. -04:00)",
            )
        })?;

        let mut config = MatchConfig::new(offset)
            .with_time_window_minutes(self.time_window_minutes)
            .with_max_matches(self.max_matches_per_error);
        if let Some(date) = self.reference_date {
            config = config.with_reference_date(date);
        }
        config.validate()?;
        Ok(config)
    }

    /// 설정값의 유효성을 검증합니다.
    ///
    /// 오프셋 누락은 여기서 검사하지 않습니다 (스캔만 하는 경우 불필요).
    pub fn validate(&self) -> Result<(), CorrelatorError> {
        const MAX_TIME_WINDOW_MINUTES: u64 = 24 * 60;

        self.scan.validate()?;

        if self.time_window_minutes == 0 || self.time_window_minutes > MAX_TIME_WINDOW_MINUTES {
            return Err(CorrelatorError::config(
                "time_window_minutes",
                format!("must be 1-{MAX_TIME_WINDOW_MINUTES}"),
            ));
        }
        if self.max_matches_per_error == 0 {
            return Err(CorrelatorError::config(
                "max_matches_per_error",
                "must be greater than 0",
            ));
        }
        if self.max_concurrent_lookups == 0 {
            return Err(CorrelatorError::config(
                "max_concurrent_lookups",
                "must be greater than 0",
            ));
        }
        if self.lookup_timeout_secs == 0 {
            return Err(CorrelatorError::config(
                "lookup_timeout_secs",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// 엔진 설정 빌더
#[derive(Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 요청 ID 추출 윈도우를 설정합니다.
    pub fn request_id_window(mut self, window: usize) -> Self {
        self.config.scan.request_id_window = window;
        self
    }

    /// 타임스탬프 추출 윈도우를 설정합니다.
    pub fn timestamp_window(mut self, window: usize) -> Self {
        self.config.scan.timestamp_window = window;
        self
    }

    /// 문맥 라인 수를 설정합니다.
    pub fn context_lines(mut self, lines: usize) -> Self {
        self.config.scan.context_lines = lines;
        self
    }

    /// 시간 근접 매칭 윈도우(분)를 설정합니다.
    pub fn time_window_minutes(mut self, minutes: u64) -> Self {
        self.config.time_window_minutes = minutes;
        self
    }

    /// 에러당 최대 매칭 수를 설정합니다.
    pub fn max_matches_per_error(mut self, max: usize) -> Self {
        self.config.max_matches_per_error = max;
        self
    }

    /// 중복 제거 범위를 설정합니다.
    pub fn dedup_scope(mut self, scope: DedupScope) -> Self {
        self.config.dedup_scope = scope;
        self
    }

    /// 클라이언트 UTC 오프셋을 설정합니다.
    pub fn client_offset(mut self, offset: FixedOffset) -> Self {
        self.config.client_offset = Some(offset);
        self
    }

    /// 기준 날짜를 설정합니다.
    pub fn reference_date(mut self, date: NaiveDate) -> Self {
        self.config.reference_date = Some(date);
        self
    }

    /// 동시 조회 수를 설정합니다.
    pub fn max_concurrent_lookups(mut self, max: usize) -> Self {
        self.config.max_concurrent_lookups = max;
        self
    }

    /// 조회 타임아웃(초)을 설정합니다.
    pub fn lookup_timeout_secs(mut self, secs: u64) -> Self {
        self.config.lookup_timeout_secs = secs;
        self
    }

    /// 설정을 검증하고 `EngineConfig`를 생성합니다.
    pub fn build(self) -> Result<EngineConfig, CorrelatorError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
