//! Integration tests for the `logtriage` commands.
//!
//! Drive the commands through `logtriage_cli::run` with real files on disk.

use std::fs;

use clap::Parser;
use tempfile::TempDir;

use logtriage_cli::cli::Cli;
use logtriage_cli::commands;

const REPORT_LOG: &str = "\
[01-15 12:00:00] [I] app launched
[01-15 12:00:02] [E] checkout failed request_id: ord7788abc
[01-15 12:00:03] [I] retry scheduled
[01-15 12:00:04] [I] idle
[01-15 12:00:05] [I] idle
[01-15 12:00:06] [I] idle
[01-15 12:00:07] [I] idle
[01-15 12:00:08] [I] idle
[01-15 12:00:09] [I] idle
[01-15 12:00:10] NetworkError: request to /api/cart timed out";

const BACKEND: &str = r#"[
  {"timestamp": "2024-01-15T16:00:04Z", "message": "ERROR payment gateway rejected", "request_id": "ord7788abc", "source_group": "/aws/lambda/checkout", "source_stream": "s1"},
  {"timestamp": "2024-01-15T16:02:00Z", "message": "WARN cart service slow", "source_group": "/aws/lambda/cart", "source_stream": "s2"}
]"#;

fn write(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("should write fixture");
    path.display().to_string()
}

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).expect("arguments should parse")
}

#[tokio::test]
async fn test_config_validate_valid_toml() {
    let dir = TempDir::new().expect("should create temp dir");
    let config = write(
        &dir,
        "logtriage.toml",
        r#"
[general]
log_level = "info"
log_format = "pretty"

[correlation]
client_utc_offset = "-04:00"
dedup_scope = "global"
"#,
    );

    let cli = parse(&["logtriage", "--config", &config, "config", "validate"]);
    logtriage_cli::run(cli)
        .await
        .expect("valid config should validate");
}

#[tokio::test]
async fn test_config_validate_malformed_toml() {
    let dir = TempDir::new().expect("should create temp dir");
    let config = write(&dir, "bad.toml", "[general\nlog_level = \"info\"\n");

    let cli = parse(&["logtriage", "--config", &config, "config", "validate"]);
    let err = logtriage_cli::run(cli)
        .await
        .expect_err("malformed TOML should fail validation");
    assert_eq!(err.exit_code(), 2);
}

#[tokio::test]
async fn test_config_validate_missing_file() {
    let cli = parse(&[
        "logtriage",
        "--config",
        "/nonexistent/logtriage.toml",
        "config",
        "validate",
    ]);
    let err = logtriage_cli::run(cli)
        .await
        .expect_err("missing file should fail");
    assert_eq!(err.exit_code(), 2);
}

#[tokio::test]
async fn test_config_empty_file_uses_defaults() {
    let dir = TempDir::new().expect("should create temp dir");
    let config = write(&dir, "empty.toml", "");

    let loaded = commands::load_config(Some(std::path::Path::new(&config)))
        .await
        .expect("empty config should load with defaults");
    assert_eq!(loaded.correlation.time_window_minutes, 10);
    assert_eq!(loaded.correlation.max_matches_per_error, 3);
    assert!(loaded.correlation.client_utc_offset.is_none());
}

#[tokio::test]
async fn test_config_zero_window_rejected() {
    let dir = TempDir::new().expect("should create temp dir");
    let config = write(&dir, "zero.toml", "[correlation]\ntime_window_minutes = 0\n");

    let err = commands::load_config(Some(std::path::Path::new(&config)))
        .await
        .expect_err("zero window should be rejected");
    assert!(err.to_string().contains("time_window_minutes"));
}

#[tokio::test]
async fn test_scan_command_runs() {
    let dir = TempDir::new().expect("should create temp dir");
    let log = write(&dir, "report.log", REPORT_LOG);

    let cli = parse(&["logtriage", "--output", "json", "scan", &log]);
    logtriage_cli::run(cli).await.expect("scan should succeed");
}

#[tokio::test]
async fn test_scan_missing_log_is_io_error() {
    let cli = parse(&["logtriage", "scan", "/nonexistent/report.log"]);
    let err = logtriage_cli::run(cli)
        .await
        .expect_err("missing log should fail");
    assert_eq!(err.exit_code(), 10);
}

#[tokio::test]
async fn test_correlate_writes_csv() {
    let dir = TempDir::new().expect("should create temp dir");
    let log = write(&dir, "report.log", REPORT_LOG);
    let backend = write(&dir, "backend.json", BACKEND);
    let csv = dir.path().join("table.csv");
    let csv_arg = csv.display().to_string();

    let cli = parse(&[
        "logtriage",
        "--output",
        "json",
        "correlate",
        &log,
        "--backend",
        &backend,
        "--csv",
        &csv_arg,
        "--client-offset",
        "-04:00",
        "--reference-date",
        "2024-01-15",
    ]);
    logtriage_cli::run(cli)
        .await
        .expect("correlate should succeed");

    let table = fs::read_to_string(&csv).expect("csv should exist");
    let lines: Vec<&str> = table.split("\r\n").filter(|l| !l.is_empty()).collect();
    assert!(lines[0].starts_with("frontend_line_number,frontend_timestamp,"));

    // the network error has no request id, so nothing is looked up for it
    assert_eq!(lines.len(), 3);
    assert!(
        lines[1].starts_with("2,01-15 12:00:00,LOG_LEVEL_ERROR,")
            && lines[1].contains("ERROR payment gateway rejected")
            && lines[1].contains("identifier_match")
    );
    assert!(lines[2].starts_with("10,") && lines[2].contains("no_correlation"));
    assert!(!table.contains("WARN cart service slow"));
}

#[tokio::test]
async fn test_correlate_without_offset_fails_fast() {
    let dir = TempDir::new().expect("should create temp dir");
    let log = write(&dir, "report.log", REPORT_LOG);
    let backend = write(&dir, "backend.json", BACKEND);
    let config = write(&dir, "logtriage.toml", "[general]\nlog_level = \"warn\"\n");

    let cli = parse(&[
        "logtriage",
        "--config",
        &config,
        "correlate",
        &log,
        "--backend",
        &backend,
        "--csv",
        &dir.path().join("out.csv").display().to_string(),
    ]);
    let err = logtriage_cli::run(cli)
        .await
        .expect_err("correlation without client offset should fail");
    assert_eq!(err.exit_code(), 2);
    assert!(err.to_string().contains("client_utc_offset"));
    assert!(!dir.path().join("out.csv").exists());
}

#[tokio::test]
async fn test_rules_validate_rejects_oversized_rule_count() {
    let dir = TempDir::new().expect("should create temp dir");
    let mut yaml = String::from("rules:\n");
    for i in 0..1001 {
        yaml.push_str(&format!("  - pattern: \"Custom{i}\"\n    category: CUSTOM\n"));
    }
    let rules = write(&dir, "many.yaml", &yaml);

    let cli = parse(&["logtriage", "rules", "validate", &rules]);
    let err = logtriage_cli::run(cli)
        .await
        .expect_err("more than 1000 rules should be rejected");
    assert_eq!(err.exit_code(), 1);
}

#[tokio::test]
async fn test_rules_list_with_custom_file() {
    let dir = TempDir::new().expect("should create temp dir");
    let rules = write(
        &dir,
        "rules.yaml",
        "rules:\n  - pattern: \"PaymentDeclined\"\n    category: PAYMENT_FAILURE\n",
    );

    let cli = parse(&["logtriage", "--output", "json", "rules", "list", "--custom", &rules]);
    logtriage_cli::run(cli).await.expect("rules list should succeed");
}
