use std::collections::HashMap;
use std::sync::Arc;

use crate::attachments::AttachmentCollector;
use crate::client::{Credentials, JiraClient};
use crate::config::{ExportConfig, ExportTarget};
use crate::error::{Error, Result};
use crate::export::{ArchiveBuilder, AttachmentRef, to_csv, to_records};
use crate::fetcher::IssueFetcher;
use crate::progress::{ProgressSink, ProgressSnapshot};
use crate::rate_limit::{RateLimitGuard, RateLimitState};
use crate::sink::{ExportBundle, ExportSink, GitHubSink, LocalSink};

/// エクスポート完了時のサマリー
#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub issues_exported: usize,
    pub attachments_archived: usize,
    /// 配送された成果物の識別子一覧
    pub artifacts: Vec<String>,
}

/// エクスポートセッションとパイプラインの編成
///
/// 認証情報はセッション接続中のみ保持され、切断で破棄される。
/// 1回のエクスポートはフェーズ（検索 → Issue取得 → Issue単位の添付
/// 収集 → 組み立て → 配送）を厳密に逐次実行する。フェーズが並行する
/// ことはないため、進捗の書き手は常に1つである。実行途中の中断手段は
/// 提供しない（レート制限による停止か、エラーによる中断のみ）。
#[derive(Debug, Default)]
pub struct ExportService {
    client: Option<JiraClient>,
    guard: Arc<RateLimitGuard>,
}

impl ExportService {
    pub fn new() -> Self {
        Self::default()
    }

    /// JIRAへ接続する
    ///
    /// `/rest/api/2/myself`で認証情報を検証し、成功した場合のみ
    /// セッションに保持する。
    pub async fn connect(&mut self, credentials: Credentials) -> Result<()> {
        let client = JiraClient::with_guard(credentials, Arc::clone(&self.guard))?;
        client.validate_credentials().await?;
        self.client = Some(client);
        Ok(())
    }

    /// セッションを切断し、認証情報を破棄する
    pub fn disconnect(&mut self) {
        self.client = None;
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    /// UI層向け: 現在のレート制限状態
    pub fn rate_limit_state(&self) -> RateLimitState {
        self.guard.state()
    }

    /// UI層向け: レート制限の手動リセット
    pub fn reset_rate_limit(&self) {
        self.guard.reset();
    }

    /// 設定に従って1回のエクスポートを実行する
    pub async fn export(
        &self,
        config: &ExportConfig,
        progress: &dyn ProgressSink,
    ) -> Result<ExportSummary> {
        let sink = sink_for_target(&config.target);
        self.export_to(config, sink.as_ref(), progress).await
    }

    /// 配送先を差し替えてエクスポートを実行する
    pub async fn export_to(
        &self,
        config: &ExportConfig,
        sink: &dyn ExportSink,
        progress: &dyn ProgressSink,
    ) -> Result<ExportSummary> {
        let client = self.client.as_ref().ok_or(Error::MissingCredentials)?;
        config.validate()?;

        // フェーズ1: Issue取得
        progress.update(ProgressSnapshot::new(0, 0, "Fetching issues..."));
        let issues = IssueFetcher::new(client).fetch_all(config, progress).await?;
        let total = issues.len() as u32;

        progress.update(ProgressSnapshot::new(0, total, "Starting export..."));

        // フェーズ2: Issue単位の添付ファイル収集（1件ずつ逐次）
        let collector = AttachmentCollector::new(client);
        let mut archive = ArchiveBuilder::new();
        let mut attachments_by_issue: HashMap<String, Vec<AttachmentRef>> = HashMap::new();

        for (index, issue) in issues.iter().enumerate() {
            let position = (index + 1) as u32;

            if config.include_attachments {
                progress.update(ProgressSnapshot::new(
                    position,
                    total,
                    format!("Fetching attachments for {}...", issue.key),
                ));

                let attachments = collector.list(&issue.key).await?;
                let mut refs = Vec::new();

                for attachment in attachments {
                    if let Some(downloaded) = collector.download(&attachment).await? {
                        refs.push(AttachmentRef {
                            filename: downloaded.filename.clone(),
                            size: downloaded.size,
                            mime_type: downloaded.mime_type.clone(),
                            url: attachment.content.clone(),
                        });
                        archive.add_attachment(&issue.key, downloaded);
                    }
                }

                if !refs.is_empty() {
                    attachments_by_issue.insert(issue.key.clone(), refs);
                }
            }

            progress.update(ProgressSnapshot::new(
                position,
                total,
                format!("Processed {} of {} issues...", position, issues.len()),
            ));
        }

        // フェーズ3: 組み立て
        let records = to_records(&issues, &attachments_by_issue);
        let csv = to_csv(&records);
        let attachments_archived = archive.len();
        let archive_bytes = if config.include_attachments {
            Some(archive.build()?)
        } else {
            None
        };

        let bundle = ExportBundle {
            project_key: config.project_key.clone(),
            csv,
            archive: archive_bytes,
        };

        // フェーズ4: 配送
        if matches!(config.target, ExportTarget::GitHub { .. }) {
            progress.update(ProgressSnapshot::new(
                total,
                total,
                "Preparing GitHub export...",
            ));
        }

        let artifacts = sink.deliver(&bundle).await?;

        tracing::debug!(
            issues = issues.len(),
            attachments = attachments_archived,
            "export completed"
        );

        Ok(ExportSummary {
            issues_exported: issues.len(),
            attachments_archived,
            artifacts,
        })
    }
}

/// 設定の出力先から配送シンクを選択する
pub fn sink_for_target(target: &ExportTarget) -> Box<dyn ExportSink> {
    match target {
        ExportTarget::Download { output_dir } => Box::new(LocalSink::new(output_dir.clone())),
        ExportTarget::GitHub {
            repo_url,
            branch,
            token,
        } => Box::new(GitHubSink::new(repo_url.clone(), branch.clone(), token.clone())),
    }
}
