//! # logtriage-core
//!
//! 모바일 버그 리포트 분류 도구의 공통 타입, trait, 에러, 설정을 정의합니다.
//!
//! - [`types`]: 에러 레코드, 백엔드 엔트리, 매칭 정보, 상관 분석 행
//! - [`error`]: 최상위 에러 타입 [`TriageError`]
//! - [`config`]: `logtriage.toml` 설정과 환경변수 오버라이드
//! - [`pipeline`]: 외부 백엔드 로그 조회 trait [`BackendLogSource`]
//! - [`metrics`]: 메트릭 이름 상수

pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod types;

// --- 주요 타입 re-export ---
// 각 모듈의 핵심 타입을 크레이트 루트에서 바로 사용할 수 있도록 합니다.

// 에러
pub use error::{ConfigError, LookupError, TriageError};

// 설정
pub use config::TriageConfig;

// 파이프라인 trait
pub use pipeline::{BackendLogSource, BackendQuery};

// 도메인 타입
pub use types::{
    BackendEntry, CorrelationMethod, CorrelationRow, ErrorCategory, ErrorRecord, MatchInfo,
    MatchMethod,
};
