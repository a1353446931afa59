//! 상관 분석 테이블 빌더
//!
//! 모든 에러 레코드를 매칭 결과와 결합하여 평탄한 [`CorrelationRow`] 목록을 만듭니다.
//! 매칭이 하나도 없는 에러도 `no_correlation` 행 하나로 반드시 포함됩니다.
//!
//! 전역 중복 제거(`DedupScope::Global`)에서 같은 백엔드 메시지는
//! 테이블 전체에서 한 번만 나타납니다. 각 에러의 상위 N개 매칭 중 이미 출력된
//! 엔트리는 건너뛰며, 상위 N개가 모두 출력된 에러는 `no_correlation` 행을 받습니다.

use std::collections::HashSet;

use tracing::debug;

use logtriage_core::metrics as m;
use logtriage_core::types::{BackendEntry, CorrelationMethod, CorrelationRow, ErrorRecord};

use crate::config::DedupScope;
use crate::matcher::CorrelationMatcher;

/// 상관 분석 테이블 빌더
#[derive(Debug, Clone)]
pub struct TableBuilder {
    matcher: CorrelationMatcher,
    dedup_scope: DedupScope,
}

impl TableBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new(matcher: CorrelationMatcher, dedup_scope: DedupScope) -> Self {
        Self {
            matcher,
            dedup_scope,
        }
    }

    /// 매처 참조
    pub fn matcher(&self) -> &CorrelationMatcher {
        &self.matcher
    }

    /// 중복 제거 범위
    pub fn dedup_scope(&self) -> DedupScope {
        self.dedup_scope
    }

    /// 모든 에러를 같은 백엔드 풀과 매칭하여 테이블을 만듭니다.
    pub fn build(&self, errors: &[ErrorRecord], pool: &[BackendEntry]) -> Vec<CorrelationRow> {
        self.build_with(errors, |_| pool)
    }

    /// 에러마다 별도로 조회한 백엔드 풀로 테이블을 만듭니다.
    ///
    /// `pools[i]`가 `errors[i]`의 풀이며, 풀이 없는 에러는 빈 풀로 취급합니다.
    pub fn build_per_error(
        &self,
        errors: &[ErrorRecord],
        pools: &[Vec<BackendEntry>],
    ) -> Vec<CorrelationRow> {
        self.build_with(errors, |index| {
            pools.get(index).map(Vec::as_slice).unwrap_or_default()
        })
    }

    fn build_with<'p>(
        &self,
        errors: &[ErrorRecord],
        pool_for: impl Fn(usize) -> &'p [BackendEntry],
    ) -> Vec<CorrelationRow> {
        let mut emitted = HashSet::new();
        let mut rows = Vec::with_capacity(errors.len());
        let mut skipped = 0u64;

        for (index, error) in errors.iter().enumerate() {
            let pool = pool_for(index);
            let before = rows.len();

            match self.dedup_scope {
                DedupScope::PerError => {
                    for (entry, info) in self.matcher.match_entries(error, pool) {
                        rows.push(CorrelationRow::matched(error, entry, &info));
                    }
                }
                DedupScope::Global => {
                    for (entry, info) in self.matcher.match_entries(error, pool) {
                        if !emitted.insert(entry.identity()) {
                            skipped += 1;
                            continue;
                        }
                        rows.push(CorrelationRow::matched(error, entry, &info));
                    }
                }
            }

            if rows.len() == before {
                rows.push(CorrelationRow::uncorrelated(error));
            }
        }

        for row in &rows {
            metrics::counter!(m::CORRELATION_ROWS_TOTAL, m::LABEL_METHOD => row.correlation_method.as_str())
                .increment(1);
        }
        metrics::counter!(m::CORRELATION_DEDUP_SKIPPED_TOTAL).increment(skipped);

        debug!(
            errors = errors.len(),
            rows = rows.len(),
            uncorrelated = rows
                .iter()
                .filter(|r| r.correlation_method == CorrelationMethod::NoCorrelation)
                .count(),
            dedup_scope = %self.dedup_scope,
            skipped,
            "built correlation table"
        );
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchConfig;
    use chrono::{FixedOffset, NaiveDate, TimeZone, Utc};
    use logtriage_core::types::ErrorCategory;

    fn builder(scope: DedupScope) -> TableBuilder {
        let config = MatchConfig::new(FixedOffset::west_opt(4 * 3600).unwrap())
            .with_reference_date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        TableBuilder::new(CorrelationMatcher::new(config).unwrap(), scope)
    }

    fn error(line: usize, timestamp: Option<&str>, ids: &[&str]) -> ErrorRecord {
        ErrorRecord {
            line_number: line,
            category: ErrorCategory::NetworkError,
            raw_segment: format!("NetworkError on line {line}"),
            timestamp: timestamp.map(str::to_owned),
            request_ids: ids.iter().map(|s| (*s).to_owned()).collect(),
            context_before: vec![],
            context_after: vec![],
        }
    }

    fn entry(min: u32, message: &str, id: Option<&str>) -> BackendEntry {
        BackendEntry {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 16, min, 0).unwrap(),
            message: message.to_owned(),
            request_id: id.map(str::to_owned),
            source_group: "api".to_owned(),
            source_stream: "s1".to_owned(),
        }
    }

    #[test]
    fn unmatched_error_gets_no_correlation_row() {
        let errors = [error(3, None, &[])];
        let rows = builder(DedupScope::PerError).build(&errors, &[entry(1, "x", None)]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].frontend_line_number, 3);
        assert_eq!(rows[0].correlation_method, CorrelationMethod::NoCorrelation);
        assert!(rows[0].backend_message.is_none());
    }

    #[test]
    fn per_error_scope_repeats_shared_entries() {
        let errors = [
            error(1, Some("2024-01-15 12:00:00"), &[]),
            error(2, Some("2024-01-15 12:01:00"), &[]),
        ];
        let pool = [entry(2, "ERROR gateway timeout", None)];
        let rows = builder(DedupScope::PerError).build(&errors, &pool);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(CorrelationRow::is_correlated));
    }

    #[test]
    fn global_scope_emits_shared_entry_once() {
        let errors = [
            error(1, Some("2024-01-15 12:00:00"), &[]),
            error(2, Some("2024-01-15 12:01:00"), &[]),
        ];
        let pool = [entry(2, "ERROR gateway timeout", None)];
        let rows = builder(DedupScope::Global).build(&errors, &pool);

        let with_entry: Vec<_> = rows
            .iter()
            .filter(|r| r.backend_message.as_deref() == Some("ERROR gateway timeout"))
            .collect();
        assert_eq!(with_entry.len(), 1);
        assert_eq!(with_entry[0].frontend_line_number, 1);
        // 두 번째 에러도 완전성을 위해 한 행을 가짐
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].frontend_line_number, 2);
        assert_eq!(rows[1].correlation_method, CorrelationMethod::NoCorrelation);
    }

    #[test]
    fn global_scope_skips_emitted_entries_without_reaching_past_top_n() {
        let errors = [
            error(1, Some("2024-01-15 12:00:00"), &[]),
            error(2, Some("2024-01-15 12:00:00"), &[]),
        ];
        let pool = [
            entry(1, "a", None),
            entry(2, "b", None),
            entry(3, "c", None),
            entry(4, "d", None),
        ];
        let table = builder(DedupScope::Global);
        let top: Vec<_> = table
            .matcher()
            .match_entries(&errors[1], &pool)
            .iter()
            .map(|(e, _)| e.message.clone())
            .collect();
        assert_eq!(top, vec!["a", "b", "c"]);

        let rows = table.build(&errors, &pool);
        let messages: Vec<_> = rows
            .iter()
            .map(|r| (r.frontend_line_number, r.backend_message.clone()))
            .collect();
        assert_eq!(
            messages,
            vec![
                (1, Some("a".to_owned())),
                (1, Some("b".to_owned())),
                (1, Some("c".to_owned())),
                (2, None),
            ]
        );
        assert_eq!(rows[3].correlation_method, CorrelationMethod::NoCorrelation);
    }

    #[test]
    fn global_scope_keeps_unemitted_entries_within_top_n() {
        let errors = [
            error(1, Some("2024-01-15 12:00:00"), &[]),
            error(2, Some("2024-01-15 12:09:00"), &[]),
        ];
        // 에러 2의 상위 3개는 b, c, a 순서이며 a만 이미 출력됨
        let pool = [
            entry(1, "a", None),
            entry(15, "b", None),
            entry(16, "c", None),
        ];
        let rows = builder(DedupScope::Global).build(&errors, &pool);
        let second: Vec<_> = rows
            .iter()
            .filter(|r| r.frontend_line_number == 2)
            .map(|r| r.backend_message.clone())
            .collect();
        assert_eq!(second, vec![Some("b".to_owned()), Some("c".to_owned())]);
    }

    #[test]
    fn per_error_pools_are_isolated() {
        let errors = [error(1, None, &["abc123xyz"]), error(2, None, &["def456uvw"])];
        let pools = vec![
            vec![entry(0, "auth rejected", Some("abc123xyz"))],
            vec![entry(0, "quota exceeded", Some("def456uvw"))],
        ];
        let rows = builder(DedupScope::PerError).build_per_error(&errors, &pools);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].matched_request_id.as_deref(), Some("abc123xyz"));
        assert_eq!(rows[1].matched_request_id.as_deref(), Some("def456uvw"));
    }

    #[test]
    fn missing_pool_is_treated_as_empty() {
        let errors = [error(1, None, &["abc123xyz"]), error(2, None, &[])];
        let pools = vec![vec![entry(0, "auth rejected", Some("abc123xyz"))]];
        let rows = builder(DedupScope::PerError).build_per_error(&errors, &pools);
        assert_eq!(rows.len(), 2);
        assert!(!rows[1].is_correlated());
    }

    #[test]
    fn identifier_rows_carry_matched_id() {
        let errors = [error(1, Some("2024-01-15 12:00:00"), &["abc123xyz"])];
        let pool = [entry(30, "login rejected", Some("abc123xyz"))];
        let rows = builder(DedupScope::PerError).build(&errors, &pool);
        assert_eq!(rows[0].correlation_method, CorrelationMethod::IdentifierMatch);
        assert_eq!(rows[0].matched_request_id.as_deref(), Some("abc123xyz"));
        assert_eq!(rows[0].backend_request_id.as_deref(), Some("abc123xyz"));
    }

    #[test]
    fn empty_error_list_yields_empty_table() {
        assert!(builder(DedupScope::Global).build(&[], &[]).is_empty());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_error() -> impl Strategy<Value = ErrorRecord> {
            (
                1usize..500,
                prop::option::of((0u32..24, 0u32..60)),
                prop::collection::vec(prop::sample::select(vec!["abc123xyz", "def456uvw"]), 0..2),
            )
                .prop_map(|(line, time, ids)| {
                    let timestamp = time.map(|(h, m)| format!("2024-01-15 {h:02}:{m:02}:00"));
                    error(line, timestamp.as_deref(), &ids)
                })
        }

        fn arb_entry() -> impl Strategy<Value = BackendEntry> {
            (
                0u32..60,
                "[a-z]{1,8}",
                prop::option::of(prop::sample::select(vec!["abc123xyz", "def456uvw", "ghi789rst"])),
            )
                .prop_map(|(min, message, id)| entry(min, &message, id))
        }

        proptest! {
            #[test]
            fn every_error_appears_in_table(
                errors in prop::collection::vec(arb_error(), 0..20),
                pool in prop::collection::vec(arb_entry(), 0..30),
                global in any::<bool>(),
            ) {
                let scope = if global { DedupScope::Global } else { DedupScope::PerError };
                let rows = builder(scope).build(&errors, &pool);

                prop_assert!(rows.len() >= errors.len());
                for error in &errors {
                    prop_assert!(rows.iter().any(|r| r.frontend_line_number == error.line_number));
                }
            }

            #[test]
            fn global_scope_never_repeats_backend_messages(
                errors in prop::collection::vec(arb_error(), 0..20),
                pool in prop::collection::vec(arb_entry(), 0..30),
            ) {
                let rows = builder(DedupScope::Global).build(&errors, &pool);
                let mut seen = HashSet::new();
                for message in rows.iter().filter_map(|r| r.backend_message.as_deref()) {
                    prop_assert!(seen.insert(message.to_owned()));
                }
            }

            #[test]
            fn match_fields_follow_method(
                errors in prop::collection::vec(arb_error(), 0..10),
                pool in prop::collection::vec(arb_entry(), 0..20),
            ) {
                for row in builder(DedupScope::PerError).build(&errors, &pool) {
                    match row.correlation_method {
                        CorrelationMethod::IdentifierMatch => {
                            prop_assert!(row.matched_request_id.is_some());
                        }
                        CorrelationMethod::TimeProximity => {
                            prop_assert!(row.matched_request_id.is_none());
                            prop_assert!(row.time_diff_seconds.is_some());
                        }
                        CorrelationMethod::NoCorrelation => {
                            prop_assert!(row.backend_message.is_none());
                        }
                    }
                }
            }
        }
    }
}
