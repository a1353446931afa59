//! 상관 매처 -- 에러 레코드 하나를 백엔드 엔트리 풀과 매칭합니다.
//!
//! # 매칭 규칙 (엔트리별)
//! 1. 백엔드 요청 ID가 에러의 `request_ids`에 있으면 `IdentifierMatch` (시간 무관)
//! 2. 아니면 두 시각이 모두 있고 차이가 윈도우 이내일 때 `TimeProximity`
//! 3. 그 외에는 매칭 없음
//!
//! # 정렬
//! 방식 우선순위 내림차순, 시간 차이 절댓값 오름차순(없으면 가장 뒤),
//! 메시지 심각도 내림차순. 안정 정렬이므로 동점이면 풀 순서를 유지합니다.

use std::cmp::{Ordering, Reverse};
use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::debug;

use logtriage_core::types::{BackendEntry, ErrorRecord, MatchInfo};

use crate::config::MatchConfig;
use crate::context::is_valid_request_id;
use crate::error::CorrelatorError;
use crate::timestamp::parse_frontend_timestamp;

/// 매칭된 백엔드 엔트리와 매칭 정보
pub type RankedMatch<'a> = (&'a BackendEntry, MatchInfo);

/// 메시지 문자열로 추정한 로그 심각도 (높을수록 심각)
///
/// error/fatal/critical > warn > info > debug > 알 수 없음
pub fn severity_rank(message: &str) -> u8 {
    let lower = message.to_lowercase();
    if ["error", "fatal", "critical"]
        .iter()
        .any(|level| lower.contains(level))
    {
        4
    } else if lower.contains("warn") {
        3
    } else if lower.contains("info") {
        2
    } else if lower.contains("debug") {
        1
    } else {
        0
    }
}

/// 부호 있는 시간 차이 (백엔드 - 프론트엔드, 초)
fn diff_seconds(backend: DateTime<Utc>, frontend: DateTime<Utc>) -> f64 {
    (backend - frontend).num_milliseconds() as f64 / 1000.0
}

/// 상관 매처
#[derive(Debug, Clone)]
pub struct CorrelationMatcher {
    config: MatchConfig,
}

impl CorrelationMatcher {
    /// 새 매처를 생성합니다.
    ///
    /// # Errors
    /// 시간 윈도우 또는 매칭 한도가 0인 경우
    pub fn new(config: MatchConfig) -> Result<Self, CorrelatorError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// 매처 설정 참조
    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// 에러 레코드의 타임스탬프를 UTC 시각으로 변환합니다.
    ///
    /// 타임스탬프가 없거나 파싱할 수 없으면 `None`이며,
    /// 이 경우 해당 에러는 시간 근접 매칭을 사용할 수 없습니다.
    pub fn frontend_instant(&self, error: &ErrorRecord) -> Option<DateTime<Utc>> {
        let raw = error.timestamp.as_deref()?;
        parse_frontend_timestamp(raw, self.config.reference_date)?.to_utc(self.config.client_offset)
    }

    /// 엔트리 하나를 평가합니다.
    ///
    /// `frontend_at`은 [`frontend_instant`](Self::frontend_instant)의 결과입니다.
    pub fn evaluate(
        &self,
        error: &ErrorRecord,
        frontend_at: Option<DateTime<Utc>>,
        entry: &BackendEntry,
    ) -> Option<MatchInfo> {
        let time_diff = frontend_at.map(|at| diff_seconds(entry.timestamp, at));

        if let Some(id) = entry.request_id.as_deref().filter(|id| is_valid_request_id(id)) {
            if error.request_ids.iter().any(|known| known == id) {
                return Some(MatchInfo::IdentifierMatch {
                    matched_request_id: id.to_owned(),
                    time_diff_seconds: time_diff,
                });
            }
        }

        let at = frontend_at?;
        let gap = (entry.timestamp - at).abs();
        (gap <= self.config.time_window).then(|| MatchInfo::TimeProximity {
            time_diff_seconds: diff_seconds(entry.timestamp, at),
        })
    }

    /// 매칭되는 모든 엔트리를 정렬하여 반환합니다 (개수 제한 없음).
    ///
    /// 같은 메시지(공백 정규화 기준)의 엔트리는 가장 좋은 매칭 하나만 남깁니다.
    pub fn rank<'a>(&self, error: &ErrorRecord, pool: &'a [BackendEntry]) -> Vec<RankedMatch<'a>> {
        let frontend_at = self.frontend_instant(error);

        let mut candidates: Vec<RankedMatch<'a>> = pool
            .iter()
            .filter_map(|entry| {
                self.evaluate(error, frontend_at, entry)
                    .map(|info| (entry, info))
            })
            .collect();

        candidates.sort_by(|(a_entry, a_info), (b_entry, b_info)| {
            Reverse(a_info.method().priority())
                .cmp(&Reverse(b_info.method().priority()))
                .then_with(|| compare_gap(a_info, b_info))
                .then_with(|| {
                    Reverse(severity_rank(&a_entry.message))
                        .cmp(&Reverse(severity_rank(&b_entry.message)))
                })
        });

        let mut seen = HashSet::new();
        candidates.retain(|(entry, _)| seen.insert(entry.identity()));
        candidates
    }

    /// 에러 하나에 대해 상위 `max_matches`개의 매칭을 반환합니다.
    pub fn match_entries<'a>(
        &self,
        error: &ErrorRecord,
        pool: &'a [BackendEntry],
    ) -> Vec<RankedMatch<'a>> {
        let mut ranked = self.rank(error, pool);
        let candidates = ranked.len();
        ranked.truncate(self.config.max_matches);

        debug!(
            line = error.line_number,
            pool = pool.len(),
            candidates,
            kept = ranked.len(),
            "matched backend entries"
        );
        ranked
    }
}

/// 시간 차이 절댓값 비교 (차이가 없는 쪽이 뒤)
fn compare_gap(a: &MatchInfo, b: &MatchInfo) -> Ordering {
    match (a.time_diff_seconds(), b.time_diff_seconds()) {
        (Some(a), Some(b)) => a.abs().total_cmp(&b.abs()),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
