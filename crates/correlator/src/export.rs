//! 상관 분석 테이블 CSV 내보내기
//!
//! 필드에 쉼표, 큰따옴표, CR, LF가 있으면 큰따옴표로 감싸고
//! 내부 큰따옴표는 두 번 씁니다 (RFC 4180 방식).

use std::borrow::Cow;
use std::io::Write;

use chrono::SecondsFormat;

use logtriage_core::error::TriageError;
use logtriage_core::types::CorrelationRow;

/// CSV 헤더 컬럼
pub const CSV_HEADER: [&str; 13] = [
    "frontend_line_number",
    "frontend_timestamp",
    "frontend_category",
    "frontend_message",
    "frontend_request_ids",
    "backend_timestamp",
    "backend_message",
    "backend_source_group",
    "backend_source_stream",
    "backend_request_id",
    "matched_request_id",
    "correlation_method",
    "time_diff_seconds",
];

/// 필드 하나를 CSV 규칙에 맞게 인용합니다.
pub fn escape_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\r', '\n']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

fn row_fields(row: &CorrelationRow) -> [String; 13] {
    [
        row.frontend_line_number.to_string(),
        row.frontend_timestamp.clone().unwrap_or_default(),
        row.frontend_category.to_string(),
        row.frontend_message.clone(),
        row.frontend_request_ids.join(","),
        row.backend_timestamp
            .map(|at| at.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            .unwrap_or_default(),
        row.backend_message.clone().unwrap_or_default(),
        row.backend_source_group.clone().unwrap_or_default(),
        row.backend_source_stream.clone().unwrap_or_default(),
        row.backend_request_id.clone().unwrap_or_default(),
        row.matched_request_id.clone().unwrap_or_default(),
        row.correlation_method.as_str().to_owned(),
        row.time_diff_seconds
            .map(|diff| format!("{diff:.1}"))
            .unwrap_or_default(),
    ]
}

fn write_record<W: Write>(writer: &mut W, fields: &[&str]) -> std::io::Result<()> {
    for (index, field) in fields.iter().enumerate() {
        if index > 0 {
            writer.write_all(b",")?;
        }
        writer.write_all(escape_field(field).as_bytes())?;
    }
    writer.write_all(b"\r\n")
}

/// 헤더와 모든 행을 CSV로 씁니다.
///
/// # Errors
/// 쓰기에 실패하면 `TriageError::Export`
pub fn write_csv<W: Write>(rows: &[CorrelationRow], mut writer: W) -> Result<(), TriageError> {
    let to_export_error = |e: std::io::Error| TriageError::Export(format!("failed to write csv: {e}"));

    write_record(&mut writer, &CSV_HEADER).map_err(to_export_error)?;
    for row in rows {
        let fields = row_fields(row);
        let refs: Vec<&str> = fields.iter().map(String::as_str).collect();
        write_record(&mut writer, &refs).map_err(to_export_error)?;
    }
    writer.flush().map_err(to_export_error)?;

    tracing::debug!(rows = rows.len(), "exported correlation table as csv");
    Ok(())
}

/// CSV 문자열로 변환합니다.
pub fn to_csv_string(rows: &[CorrelationRow]) -> Result<String, TriageError> {
    let mut buffer = Vec::new();
    write_csv(rows, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| TriageError::Export(format!("csv is not utf-8: {e}")))
}
