//! # logtriage-correlator
//!
//! 모바일 앱 버그 리포트의 프론트엔드 로그에서 에러를 찾아내고,
//! 같은 요청 또는 같은 시간대의 백엔드 로그와 연결합니다.
//!
//! # 모듈 구성
//!
//! - [`rule`]: 패턴 분류기 (내장 규칙, 제외 규칙, YAML 사용자 정의 규칙)
//! - [`context`]: 에러 주변 라인에서 요청 ID, 타임스탬프, 문맥 추출
//! - [`timestamp`]: 프론트엔드 타임스탬프 형식 목록과 파싱
//! - [`scanner`]: 에러 스캔 및 시그니처 기반 중복 제거
//! - [`matcher`]: 에러 하나와 백엔드 풀의 매칭, 정렬, 개수 제한
//! - [`table`]: 평탄한 상관 분석 테이블 생성 (에러별/전역 중복 제거)
//! - [`export`]: CSV 내보내기
//! - [`backend`]: 인메모리 백엔드 로그 소스
//! - [`engine`]: 백엔드 조회를 포함한 전체 실행 (동시성, 타임아웃, 취소)
//! - [`config`]: 엔진 설정 (core 설정 확장)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! log text -> ErrorScanner -> [BackendLogSource] -> CorrelationMatcher -> TableBuilder -> CSV
//!                |                    |                    |                   |
//!        Classifier + Context   요청 ID별 조회     ID 일치 / 시간 근접    에러별 / 전역 dedup
//! ```

pub mod backend;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod export;
pub mod matcher;
pub mod rule;
pub mod scanner;
pub mod table;
pub mod timestamp;

// --- 주요 타입 re-export ---

// 엔진
pub use engine::{TriageEngine, TriageEngineBuilder, TriageReport, TriageSummary};

// 설정
pub use config::{DedupScope, EngineConfig, EngineConfigBuilder, MatchConfig, ScanConfig};

// 에러
pub use error::CorrelatorError;

// 분류 규칙
pub use rule::{ClassifierRule, PatternClassifier, RuleLoader};

// 스캔, 매칭, 테이블
pub use matcher::CorrelationMatcher;
pub use scanner::ErrorScanner;
pub use table::TableBuilder;

// 내보내기
pub use export::{to_csv_string, write_csv};

// 백엔드 소스
pub use backend::StaticBackendSource;
