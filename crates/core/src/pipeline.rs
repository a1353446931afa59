//! 파이프라인 trait -- 외부 백엔드 로그 저장소 확장 포인트 정의
//!
//! 코어는 백엔드 로그를 직접 조회하지 않습니다. 조회는 [`BackendLogSource`]
//! 구현체가 담당하고, 상관 분석 엔진은 그 결과만 소비합니다.

use std::fmt;
use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TriageError;
use crate::types::BackendEntry;

/// 백엔드 로그 조회 요청
///
/// 검증된 요청 ID 하나와 선택적인 시간 범위로 구성됩니다.
/// 같은 실행 안에서 동일한 쿼리는 한 번만 발행됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BackendQuery {
    /// 조회할 요청 ID
    pub request_id: String,
    /// 조회 시작 시각 (포함)
    pub start: Option<DateTime<Utc>>,
    /// 조회 종료 시각 (포함)
    pub end: Option<DateTime<Utc>>,
}

impl BackendQuery {
    /// 시간 범위 없는 쿼리를 생성합니다.
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            start: None,
            end: None,
        }
    }

    /// 시간 범위를 설정합니다.
    pub fn with_range(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    /// 주어진 시각이 쿼리 시간 범위 안에 있는지 확인합니다.
    ///
    /// 범위가 지정되지 않은 쪽은 열린 구간으로 취급합니다.
    pub fn covers(&self, at: DateTime<Utc>) -> bool {
        self.start.is_none_or(|start| at >= start) && self.end.is_none_or(|end| at <= end)
    }
}

impl fmt::Display for BackendQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request_id={}", self.request_id)?;
        if let (Some(start), Some(end)) = (self.start, self.end) {
            write!(f, " [{} .. {}]", start.to_rfc3339(), end.to_rfc3339())?;
        }
        Ok(())
    }
}

/// 백엔드 로그 저장소 조회 trait
///
/// 원격 로그 저장소(예: 클라우드 로그 서비스)의 검색-폴링 컴포넌트가 구현합니다.
/// 조회 실패는 [`TriageError::Lookup`]으로 반환하며, 엔진은 이를 치명적으로
/// 취급하지 않고 해당 에러를 `no_correlation`으로 강등합니다.
///
/// # 구현 예시
/// ```ignore
/// struct MyStore;
///
/// impl BackendLogSource for MyStore {
///     fn name(&self) -> &str { "my-store" }
///
///     async fn search(&self, query: &BackendQuery) -> Result<Vec<BackendEntry>, TriageError> {
///         Ok(vec![])
///     }
/// }
/// ```
pub trait BackendLogSource: Send + Sync {
    /// 소스 이름
    fn name(&self) -> &str;

    /// 쿼리에 해당하는 백엔드 로그 엔트리를 조회합니다.
    fn search(
        &self,
        query: &BackendQuery,
    ) -> impl Future<Output = Result<Vec<BackendEntry>, TriageError>> + Send;
}
