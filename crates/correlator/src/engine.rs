//! 트리아지 엔진 -- 스캔, 백엔드 조회, 상관 분석 전체 흐름
//!
//! 버그 리포트 하나를 독립된 배치 작업으로 처리합니다.
//!
//! ```text
//! log text -> ErrorScanner -> BackendQuery (요청 ID별, 중복 제거)
//!          -> BackendLogSource::search (동시 실행, 타임아웃, 취소)
//!          -> 에러별 풀 -> TableBuilder -> TriageReport
//! ```
//!
//! 조회 실패, 타임아웃, 취소는 치명적이지 않습니다.
//! 해당 쿼리는 엔트리를 하나도 제공하지 않은 것으로 처리되고,
//! 매칭이 없는 에러는 `no_correlation` 행으로 남습니다.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use logtriage_core::error::{LookupError, TriageError};
use logtriage_core::metrics as m;
use logtriage_core::pipeline::{BackendLogSource, BackendQuery};
use logtriage_core::types::{BackendEntry, CorrelationMethod, CorrelationRow, ErrorRecord};

use crate::config::EngineConfig;
use crate::error::CorrelatorError;
use crate::matcher::CorrelationMatcher;
use crate::rule::PatternClassifier;
use crate::scanner::ErrorScanner;
use crate::table::TableBuilder;

/// 실행 요약
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageSummary {
    /// 검출된 에러 수
    pub error_count: usize,
    /// 테이블 행 수
    pub row_count: usize,
    /// 요청 ID 일치 행 수
    pub identifier_matches: usize,
    /// 시간 근접 행 수
    pub time_proximity_matches: usize,
    /// 매칭 없는 행 수
    pub uncorrelated: usize,
    /// 발행한 백엔드 쿼리 수
    pub lookups_issued: usize,
    /// 실패, 타임아웃, 취소된 쿼리 수
    pub lookups_failed: usize,
}

impl TriageSummary {
    fn tally(rows: &[CorrelationRow]) -> Self {
        let count = |method| {
            rows.iter()
                .filter(|r| r.correlation_method == method)
                .count()
        };
        Self {
            row_count: rows.len(),
            identifier_matches: count(CorrelationMethod::IdentifierMatch),
            time_proximity_matches: count(CorrelationMethod::TimeProximity),
            uncorrelated: count(CorrelationMethod::NoCorrelation),
            ..Self::default()
        }
    }
}

/// 리포트 하나의 트리아지 결과
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageReport {
    /// 실행 ID (UUID v4)
    pub report_id: String,
    /// 생성 시각
    pub generated_at: DateTime<Utc>,
    /// 검출된 에러 레코드
    pub errors: Vec<ErrorRecord>,
    /// 상관 분석 테이블
    pub rows: Vec<CorrelationRow>,
    /// 요약
    pub summary: TriageSummary,
}

/// 트리아지 엔진
///
/// # 사용 예시
/// ```ignore
/// let engine = TriageEngineBuilder::new()
///     .config(config)
///     .source(StaticBackendSource::load_file("backend.jsonl").await?)
///     .build()?;
///
/// let report = engine.run(&log_text, CancellationToken::new()).await;
/// ```
pub struct TriageEngine<S> {
    config: EngineConfig,
    scanner: ErrorScanner,
    table: TableBuilder,
    source: Arc<S>,
}

impl<S: BackendLogSource + 'static> TriageEngine<S> {
    /// 엔진 설정 참조
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 스캐너 참조
    pub fn scanner(&self) -> &ErrorScanner {
        &self.scanner
    }

    /// 로그 텍스트를 스캔하고 백엔드 로그와 상관 분석합니다.
    pub async fn run(&self, text: &str, cancel: CancellationToken) -> TriageReport {
        let errors = self.scanner.scan(text);
        self.correlate(errors, cancel).await
    }

    /// 이미 스캔된 에러 레코드를 상관 분석합니다.
    pub async fn correlate(&self, errors: Vec<ErrorRecord>, cancel: CancellationToken) -> TriageReport {
        let report_id = uuid::Uuid::new_v4().to_string();
        let plan = self.plan_queries(&errors);
        let lookups_issued = plan.queries.len();

        let (results, lookups_failed) = self.execute(plan.queries, &cancel).await;
        let pools: Vec<Vec<BackendEntry>> = plan
            .per_error
            .iter()
            .map(|indices| merge_pool(indices.iter().map(|&i| results[i].as_slice())))
            .collect();

        let rows = self.table.build_per_error(&errors, &pools);
        let summary = TriageSummary {
            error_count: errors.len(),
            lookups_issued,
            lookups_failed,
            ..TriageSummary::tally(&rows)
        };

        info!(
            report_id = %report_id,
            error_count = summary.error_count,
            rows = summary.row_count,
            identifier_matches = summary.identifier_matches,
            time_proximity_matches = summary.time_proximity_matches,
            uncorrelated = summary.uncorrelated,
            lookups_failed,
            "triage complete"
        );

        TriageReport {
            report_id,
            generated_at: Utc::now(),
            errors,
            rows,
            summary,
        }
    }

    /// 에러별 쿼리를 만들고 동일한 쿼리는 하나로 합칩니다.
    fn plan_queries(&self, errors: &[ErrorRecord]) -> QueryPlan {
        let matcher: &CorrelationMatcher = self.table.matcher();
        let window = matcher.config().time_window;
        let mut plan = QueryPlan::default();
        let mut index_of: HashMap<BackendQuery, usize> = HashMap::new();

        for error in errors {
            let range = matcher.frontend_instant(error).and_then(|at| {
                Some((at.checked_sub_signed(window)?, at.checked_add_signed(window)?))
            });

            let mut indices = Vec::with_capacity(error.request_ids.len());
            for id in &error.request_ids {
                let mut query = BackendQuery::new(id.clone());
                if let Some((start, end)) = range {
                    query = query.with_range(start, end);
                }
                let index = *index_of.entry(query.clone()).or_insert_with(|| {
                    plan.queries.push(query);
                    plan.queries.len() - 1
                });
                indices.push(index);
            }
            plan.per_error.push(indices);
        }

        debug!(
            errors = errors.len(),
            queries = plan.queries.len(),
            "planned backend lookups"
        );
        plan
    }

    /// 쿼리를 동시에 실행합니다. 실패한 쿼리의 결과는 빈 목록입니다.
    async fn execute(
        &self,
        queries: Vec<BackendQuery>,
        cancel: &CancellationToken,
    ) -> (Vec<Vec<BackendEntry>>, usize) {
        let mut results = vec![Vec::new(); queries.len()];
        let mut failed = 0;
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_lookups));
        let timeout = Duration::from_secs(self.config.lookup_timeout_secs);
        let mut tasks = JoinSet::new();

        for (index, query) in queries.into_iter().enumerate() {
            let source = Arc::clone(&self.source);
            let semaphore = Arc::clone(&semaphore);
            let cancel = cancel.clone();
            tasks.spawn(async move {
                let outcome = lookup(source, semaphore, &query, timeout, cancel).await;
                (index, query, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, _, Ok(entries))) => results[index] = entries,
                Ok((_, query, Err(e))) => {
                    warn!(query = %query, error = %e, "backend lookup failed, continuing without entries");
                    failed += 1;
                }
                Err(e) => {
                    warn!(error = %e, "backend lookup task panicked");
                    failed += 1;
                }
            }
        }

        (results, failed)
    }
}

#[derive(Debug, Default)]
struct QueryPlan {
    /// 중복 없는 쿼리 (발행 순서)
    queries: Vec<BackendQuery>,
    /// 에러별 쿼리 인덱스
    per_error: Vec<Vec<usize>>,
}

/// 조회 하나를 세마포어, 타임아웃, 취소 아래에서 실행합니다.
async fn lookup<S: BackendLogSource>(
    source: Arc<S>,
    semaphore: Arc<Semaphore>,
    query: &BackendQuery,
    timeout: Duration,
    cancel: CancellationToken,
) -> Result<Vec<BackendEntry>, LookupError> {
    let _permit = tokio::select! {
        biased;
        () = cancel.cancelled() => return Err(record_lookup("cancelled", None, LookupError::Cancelled)),
        permit = semaphore.acquire_owned() => permit.map_err(|_| LookupError::Cancelled)?,
    };

    let started = Instant::now();
    let outcome = tokio::select! {
        biased;
        () = cancel.cancelled() => Err(LookupError::Cancelled),
        result = tokio::time::timeout(timeout, source.search(query)) => match result {
            Ok(Ok(entries)) => Ok(entries),
            Ok(Err(TriageError::Lookup(e))) => Err(e),
            Ok(Err(other)) => Err(LookupError::Query(other.to_string())),
            Err(_) => Err(LookupError::Timeout { secs: timeout.as_secs() }),
        },
    };

    match outcome {
        Ok(entries) => {
            metrics::counter!(m::LOOKUP_REQUESTS_TOTAL, m::LABEL_RESULT => "ok").increment(1);
            metrics::histogram!(m::LOOKUP_DURATION_SECONDS).record(started.elapsed().as_secs_f64());
            debug!(source = source.name(), query = %query, found = entries.len(), "backend lookup finished");
            Ok(entries)
        }
        Err(e) => {
            let result = match e {
                LookupError::Timeout { .. } => "timeout",
                LookupError::Cancelled => "cancelled",
                LookupError::Unavailable(_) | LookupError::Query(_) => "error",
            };
            Err(record_lookup(result, Some(started), e))
        }
    }
}

fn record_lookup(result: &'static str, started: Option<Instant>, err: LookupError) -> LookupError {
    metrics::counter!(m::LOOKUP_REQUESTS_TOTAL, m::LABEL_RESULT => result).increment(1);
    if let Some(started) = started {
        metrics::histogram!(m::LOOKUP_DURATION_SECONDS).record(started.elapsed().as_secs_f64());
    }
    err
}

/// 여러 쿼리 결과를 합치고 (시각, 메시지, 스트림) 기준으로 중복을 제거합니다.
fn merge_pool<'a>(parts: impl Iterator<Item = &'a [BackendEntry]>) -> Vec<BackendEntry> {
    let mut seen = HashSet::new();
    let mut pool = Vec::new();
    for entry in parts.flatten() {
        let key = (entry.timestamp, entry.message.as_str(), entry.source_stream.as_str());
        if seen.insert(key) {
            pool.push(entry.clone());
        }
    }
    pool
}

/// 트리아지 엔진 빌더
pub struct TriageEngineBuilder<S> {
    config: EngineConfig,
    classifier: Option<PatternClassifier>,
    source: Option<S>,
}

impl<S> Default for TriageEngineBuilder<S> {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            classifier: None,
            source: None,
        }
    }
}

impl<S: BackendLogSource + 'static> TriageEngineBuilder<S> {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 엔진 설정을 지정합니다.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// 사용자 정의 규칙이 추가된 분류기를 지정합니다.
    pub fn classifier(mut self, classifier: PatternClassifier) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// 백엔드 로그 소스를 지정합니다.
    pub fn source(mut self, source: S) -> Self {
        self.source = Some(source);
        self
    }

    /// 엔진을 생성합니다.
    ///
    /// # Errors
    /// - 설정 검증 실패 (클라이언트 UTC 오프셋 누락 포함)
    /// - 백엔드 소스 미지정
    pub fn build(self) -> Result<TriageEngine<S>, CorrelatorError> {
        self.config.validate()?;
        let source = self
            .source
            .ok_or_else(|| CorrelatorError::config("source", "a backend log source is required"))?;

        let scanner = ErrorScanner::with_classifier(
            self.config.scan.clone(),
            self.classifier.unwrap_or_default(),
        )?;
        let matcher = CorrelationMatcher::new(self.config.match_config()?)?;
        let table = TableBuilder::new(matcher, self.config.dedup_scope);

        info!(
            source = source.name(),
            rules = scanner.classifier().rule_count(),
            dedup_scope = %self.config.dedup_scope,
            "triage engine ready"
        );

        Ok(TriageEngine {
            config: self.config,
            scanner,
            table,
            source: Arc::new(source),
        })
    }
}
