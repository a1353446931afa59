//! 규칙 파일 로더 -- YAML 분류 규칙 파일을 디스크에서 로드합니다.

use std::path::Path;

use crate::error::CorrelatorError;

use super::PatternClassifier;
use super::types::RuleFile;

/// 규칙 파일 최대 크기
const MAX_RULE_FILE_SIZE: u64 = 1024 * 1024; // 1MiB

/// 규칙 파일 로더
pub struct RuleLoader;

impl RuleLoader {
    /// 단일 YAML 파일에서 규칙을 로드합니다.
    ///
    /// # Errors
    /// - 파일을 읽을 수 없거나 1MiB를 초과하는 경우
    /// - YAML 파싱 또는 유효성 검증에 실패한 경우
    pub async fn load_file(path: impl AsRef<Path>) -> Result<RuleFile, CorrelatorError> {
        let path = path.as_ref();

        // 파일 크기 검증
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| CorrelatorError::RuleLoad {
                path: path.display().to_string(),
                reason: format!("failed to read file metadata: {e}"),
            })?;

        if metadata.len() > MAX_RULE_FILE_SIZE {
            return Err(CorrelatorError::RuleLoad {
                path: path.display().to_string(),
                reason: format!(
                    "file too large: {} bytes (max: {MAX_RULE_FILE_SIZE})",
                    metadata.len()
                ),
            });
        }

        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| CorrelatorError::RuleLoad {
                    path: path.display().to_string(),
                    reason: format!("failed to read file: {e}"),
                })?;

        let file = Self::parse_yaml(&content, &path.display().to_string())?;

        tracing::info!(
            path = %path.display(),
            rules = file.rules.len(),
            exclusions = file.exclusions.len(),
            "loaded custom classification rules"
        );

        Ok(file)
    }

    /// YAML 문자열을 파싱하여 규칙 파일을 생성합니다.
    ///
    /// 구조 검증뿐 아니라 모든 패턴이 정규식으로 컴파일되는지도 확인합니다.
    pub fn parse_yaml(yaml_str: &str, source: &str) -> Result<RuleFile, CorrelatorError> {
        if yaml_str.trim().is_empty() {
            return Ok(RuleFile::default());
        }

        let file: RuleFile =
            serde_yaml::from_str(yaml_str).map_err(|e| CorrelatorError::RuleLoad {
                path: source.to_owned(),
                reason: format!("YAML parse error: {e}"),
            })?;

        // 유효성 검증 (패턴 컴파일 포함)
        PatternClassifier::new().extend(&file)?;

        Ok(file)
    }

    /// 규칙 파일을 로드하여 분류기에 추가합니다.
    pub async fn load_into(
        classifier: &mut PatternClassifier,
        path: impl AsRef<Path>,
    ) -> Result<usize, CorrelatorError> {
        let file = Self::load_file(path).await?;
        classifier.extend(&file)
    }
}
