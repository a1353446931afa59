//! 인메모리 백엔드 로그 소스
//!
//! [`StaticBackendSource`]는 미리 받아 둔 백엔드 엔트리 목록으로
//! [`BackendLogSource`]를 구현합니다. CLI의 `--backend` 파일과 테스트에서 사용합니다.
//!
//! 파일 형식은 JSON 배열 또는 JSON Lines(한 줄에 엔트리 하나)입니다.
//! ```json
//! {"timestamp": "2024-01-15T16:04:00Z", "message": "db timeout request_id=abc123xyz",
//!  "source_group": "/aws/lambda/api", "source_stream": "2024/01/15/abc"}
//! ```

use std::path::Path;

use logtriage_core::error::TriageError;
use logtriage_core::pipeline::{BackendLogSource, BackendQuery};
use logtriage_core::types::BackendEntry;

use crate::context::{first_valid_request_id, is_valid_request_id};
use crate::error::CorrelatorError;

/// 백엔드 파일 최대 크기
const MAX_BACKEND_FILE_SIZE: u64 = 64 * 1024 * 1024; // 64MiB

/// 고정된 엔트리 목록을 제공하는 백엔드 소스
#[derive(Debug, Clone, Default)]
pub struct StaticBackendSource {
    name: String,
    entries: Vec<BackendEntry>,
}

impl StaticBackendSource {
    /// 엔트리 목록으로 소스를 생성합니다.
    ///
    /// 요청 ID가 없거나 유효하지 않은 엔트리는 메시지에서 첫 번째 유효한 ID를 추출합니다.
    pub fn new(name: impl Into<String>, entries: Vec<BackendEntry>) -> Self {
        let entries = entries.into_iter().map(fill_request_id).collect();
        Self {
            name: name.into(),
            entries,
        }
    }

    /// JSON 배열 또는 JSON Lines 문자열에서 소스를 생성합니다.
    pub fn from_json_str(name: impl Into<String>, input: &str) -> Result<Self, CorrelatorError> {
        let name = name.into();
        let entries = parse_entries(&name, input)?;
        Ok(Self::new(name, entries))
    }

    /// 파일에서 소스를 로드합니다.
    pub async fn load_file(path: impl AsRef<Path>) -> Result<Self, CorrelatorError> {
        let path = path.as_ref();
        let load_error = |reason: String| CorrelatorError::BackendLoad {
            source_name: path.display().to_string(),
            reason,
        };

        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| load_error(format!("failed to read file metadata: {e}")))?;
        if metadata.len() > MAX_BACKEND_FILE_SIZE {
            return Err(load_error(format!(
                "file too large: {} bytes (max: {MAX_BACKEND_FILE_SIZE})",
                metadata.len()
            )));
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| load_error(format!("failed to read file: {e}")))?;
        let source = Self::from_json_str(path.display().to_string(), &content)?;

        tracing::info!(
            path = %path.display(),
            entries = source.entries.len(),
            "loaded backend entries"
        );
        Ok(source)
    }

    /// 보관 중인 엔트리
    pub fn entries(&self) -> &[BackendEntry] {
        &self.entries
    }

    /// 엔트리 수
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl BackendLogSource for StaticBackendSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, query: &BackendQuery) -> Result<Vec<BackendEntry>, TriageError> {
        let found: Vec<BackendEntry> = self
            .entries
            .iter()
            .filter(|entry| {
                entry.request_id.as_deref() == Some(query.request_id.as_str())
                    || entry.message.contains(&query.request_id)
            })
            .filter(|entry| query.covers(entry.timestamp))
            .cloned()
            .collect();

        tracing::debug!(source = %self.name, query = %query, found = found.len(), "searched static backend");
        Ok(found)
    }
}

fn fill_request_id(mut entry: BackendEntry) -> BackendEntry {
    if !entry.request_id.as_deref().is_some_and(is_valid_request_id) {
        entry.request_id = first_valid_request_id(&entry.message).map(str::to_owned);
    }
    entry
}

fn parse_entries(name: &str, input: &str) -> Result<Vec<BackendEntry>, CorrelatorError> {
    let trimmed = input.trim_start();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).map_err(|e| CorrelatorError::BackendLoad {
            source_name: name.to_owned(),
            reason: format!("invalid JSON array: {e}"),
        });
    }

    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line).map_err(|e| CorrelatorError::BackendLoad {
                source_name: name.to_owned(),
                reason: format!("line {}: {e}", index + 1),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::io::Write;

    const JSON_LINES: &str = r#"
{"timestamp": "2024-01-15T16:04:00Z", "message": "db timeout request_id=abc123xyz", "source_group": "api", "source_stream": "s1"}
{"timestamp": "2024-01-15T16:30:00Z", "message": "login rejected", "request_id": "abc123xyz"}

{"timestamp": "2024-01-15T17:00:00Z", "message": "unrelated"}
"#;

    #[test]
    fn parses_json_lines_and_fills_ids() {
        let source = StaticBackendSource::from_json_str("test", JSON_LINES).unwrap();
        assert_eq!(source.len(), 3);
        assert_eq!(source.entries()[0].request_id.as_deref(), Some("abc123xyz"));
        assert_eq!(source.entries()[1].request_id.as_deref(), Some("abc123xyz"));
        assert_eq!(source.entries()[2].request_id, None);
        assert_eq!(source.entries()[2].source_group, "");
    }

    #[test]
    fn parses_json_array() {
        let input = r#"[{"timestamp": "2024-01-15T16:04:00Z", "message": "x", "request_id": "null"}]"#;
        let source = StaticBackendSource::from_json_str("test", input).unwrap();
        assert_eq!(source.len(), 1);
        // placeholder ID는 버리고 메시지에서도 찾지 못함
        assert_eq!(source.entries()[0].request_id, None);
    }

    #[test]
    fn empty_input_is_empty_source() {
        assert!(StaticBackendSource::from_json_str("test", "  \n").unwrap().is_empty());
    }

    #[test]
    fn bad_line_reports_line_number() {
        let input = "{\"timestamp\": \"2024-01-15T16:04:00Z\", \"message\": \"ok\"}\nnot json";
        let err = StaticBackendSource::from_json_str("backend.jsonl", input).unwrap_err();
        assert!(matches!(err, CorrelatorError::BackendLoad { .. }));
        assert!(err.to_string().contains("line 2"));
    }

    #[tokio::test]
    async fn search_matches_id_or_message_within_range() {
        let source = StaticBackendSource::from_json_str("test", JSON_LINES).unwrap();

        let all = source.search(&BackendQuery::new("abc123xyz")).await.unwrap();
        assert_eq!(all.len(), 2);

        let ranged = BackendQuery::new("abc123xyz").with_range(
            Utc.with_ymd_and_hms(2024, 1, 15, 15, 50, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 15, 16, 10, 0).unwrap(),
        );
        let found = source.search(&ranged).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].message, "db timeout request_id=abc123xyz");

        let none = source.search(&BackendQuery::new("zzz999zzz")).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn load_file_reads_json_lines() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(tmp, "{JSON_LINES}").unwrap();
        let source = StaticBackendSource::load_file(tmp.path()).await.unwrap();
        assert_eq!(source.len(), 3);
        assert_eq!(source.name(), tmp.path().display().to_string());
    }

    #[tokio::test]
    async fn load_missing_file_fails() {
        let err = StaticBackendSource::load_file("/nonexistent/backend.jsonl")
            .await
            .unwrap_err();
        assert!(matches!(err, CorrelatorError::BackendLoad { .. }));
    }
}
