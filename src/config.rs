use chrono::NaiveDate;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// エクスポート成果物の出力先
#[derive(Debug, Clone)]
pub enum ExportTarget {
    /// ローカルディレクトリへのファイル出力
    Download { output_dir: PathBuf },
    /// GitHubリポジトリへのコミット
    GitHub {
        repo_url: String,
        /// 省略時は`main`
        branch: Option<String>,
        token: String,
    },
}

/// 1回のエクスポート実行の設定
///
/// 実行開始時に確定し、実行中は不変。
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub project_key: String,
    pub include_attachments: bool,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub target: ExportTarget,
}

impl ExportConfig {
    /// デフォルト設定で新しいExportConfigを作成
    pub fn new(project_key: impl Into<String>) -> Self {
        Self {
            project_key: project_key.into(),
            include_attachments: true,
            date_from: None,
            date_to: None,
            target: ExportTarget::Download {
                output_dir: PathBuf::from("."),
            },
        }
    }

    /// 添付ファイルを含めるかどうかを設定
    pub fn include_attachments(mut self, include: bool) -> Self {
        self.include_attachments = include;
        self
    }

    /// 作成日の下限を設定
    pub fn date_from(mut self, date: NaiveDate) -> Self {
        self.date_from = Some(date);
        self
    }

    /// 作成日の上限を設定
    pub fn date_to(mut self, date: NaiveDate) -> Self {
        self.date_to = Some(date);
        self
    }

    /// 出力先を設定
    pub fn target(mut self, target: ExportTarget) -> Self {
        self.target = target;
        self
    }

    /// ディスパッチ前の設定検証
    ///
    /// プロジェクトキーは必須。GitHub出力の場合はリポジトリURLと
    /// トークンが空でないこと。
    pub fn validate(&self) -> Result<()> {
        if self.project_key.trim().is_empty() {
            return Err(Error::MissingProjectKey);
        }

        if let ExportTarget::GitHub {
            repo_url, token, ..
        } = &self.target
        {
            if repo_url.trim().is_empty() {
                return Err(Error::InvalidConfiguration(
                    "GitHub repository URL is required".to_string(),
                ));
            }
            if token.trim().is_empty() {
                return Err(Error::InvalidConfiguration(
                    "GitHub token is required".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_config_defaults() {
        let config = ExportConfig::new("PROJ");

        assert_eq!(config.project_key, "PROJ");
        assert!(config.include_attachments);
        assert!(config.date_from.is_none());
        assert!(config.date_to.is_none());
        match config.target {
            ExportTarget::Download { ref output_dir } => {
                assert_eq!(output_dir, &PathBuf::from("."));
            }
            _ => panic!("Expected Download target"),
        }
    }

    #[test]
    fn test_export_config_builder() {
        let from = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();

        let config = ExportConfig::new("PROJ")
            .include_attachments(false)
            .date_from(from)
            .date_to(to)
            .target(ExportTarget::GitHub {
                repo_url: "https://github.com/acme/proj".to_string(),
                branch: Some("exports".to_string()),
                token: "ghp_token".to_string(),
            });

        assert!(!config.include_attachments);
        assert_eq!(config.date_from, Some(from));
        assert_eq!(config.date_to, Some(to));
    }

    #[test]
    fn test_validate_rejects_empty_project_key() {
        let config = ExportConfig::new("  ");

        match config.validate().unwrap_err() {
            Error::MissingProjectKey => {}
            other => panic!("Expected MissingProjectKey, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_github_target_without_token() {
        // Given: トークンが空のGitHub出力設定
        let config = ExportConfig::new("PROJ").target(ExportTarget::GitHub {
            repo_url: "https://github.com/acme/proj".to_string(),
            branch: None,
            token: "".to_string(),
        });

        // Then: ディスパッチ前に設定エラーになる
        match config.validate().unwrap_err() {
            Error::InvalidConfiguration(msg) => {
                assert!(msg.contains("token"));
            }
            other => panic!("Expected InvalidConfiguration, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_github_target_without_repo() {
        let config = ExportConfig::new("PROJ").target(ExportTarget::GitHub {
            repo_url: "".to_string(),
            branch: None,
            token: "ghp_token".to_string(),
        });

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_download_target() {
        let config = ExportConfig::new("PROJ");
        assert!(config.validate().is_ok());
    }
}
