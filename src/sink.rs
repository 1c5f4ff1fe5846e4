use async_trait::async_trait;
use base64::Engine;
use futures_util::future::join_all;
use std::path::PathBuf;
use url::Url;

use crate::error::{Error, Result};

/// 組み立て済みのエクスポート成果物一式
#[derive(Debug, Clone)]
pub struct ExportBundle {
    pub project_key: String,
    pub csv: String,
    /// 添付ファイルを含める設定の場合のみ存在するZIPバイト列
    pub archive: Option<Vec<u8>>,
}

/// 成果物の配送先
///
/// 戻り値は配送した成果物の識別子（ローカルならパス、GitHubなら
/// リポジトリ内パス）の一覧。
#[async_trait]
pub trait ExportSink: Send + Sync {
    async fn deliver(&self, bundle: &ExportBundle) -> Result<Vec<String>>;
}

/// ローカルディレクトリへのファイル出力
///
/// CSVとZIPは独立した2つの書き込みとして扱う（結合アーカイブは作らない）。
#[derive(Debug, Clone)]
pub struct LocalSink {
    output_dir: PathBuf,
}

impl LocalSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

#[async_trait]
impl ExportSink for LocalSink {
    async fn deliver(&self, bundle: &ExportBundle) -> Result<Vec<String>> {
        let mut artifacts = Vec::new();

        let csv_path = self
            .output_dir
            .join(format!("jira-export-{}.csv", bundle.project_key));
        tokio::fs::write(&csv_path, bundle.csv.as_bytes()).await?;
        artifacts.push(csv_path.display().to_string());

        if let Some(archive) = &bundle.archive {
            let zip_path = self
                .output_dir
                .join(format!("jira-attachments-{}.zip", bundle.project_key));
            tokio::fs::write(&zip_path, archive).await?;
            artifacts.push(zip_path.display().to_string());
        }

        Ok(artifacts)
    }
}

/// GitHubリポジトリへのコンテンツAPI経由アップロード
///
/// ファイルごとに1リクエストのcreate-or-update呼び出しを並行実行する。
/// 1ファイルの失敗はエクスポート全体の失敗として表面化するが、既に
/// アップロード済みのファイルはロールバックされない。
#[derive(Debug, Clone)]
pub struct GitHubSink {
    repo_url: String,
    branch: Option<String>,
    token: String,
    api_base: String,
    client: reqwest::Client,
}

impl GitHubSink {
    pub fn new(
        repo_url: impl Into<String>,
        branch: Option<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            repo_url: repo_url.into(),
            branch,
            token: token.into(),
            api_base: "https://api.github.com".to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// APIベースURLを差し替える（テスト用）
    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    async fn upload_file(&self, owner: &str, repo: &str, path: &str, content: &str) -> Result<()> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base, owner, repo, path
        );
        let branch = self.branch.as_deref().unwrap_or("main");

        let response = self
            .client
            .put(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github.v3+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .header("User-Agent", "jira-export")
            .json(&serde_json::json!({
                "message": format!("Add {} from JIRA export", path),
                "content": content,
                "branch": branch,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::GitHubApi(extract_github_message(&body)));
        }

        Ok(())
    }
}

#[async_trait]
impl ExportSink for GitHubSink {
    async fn deliver(&self, bundle: &ExportBundle) -> Result<Vec<String>> {
        let (owner, repo) = parse_repo_url(&self.repo_url)?;
        let encoder = &base64::engine::general_purpose::STANDARD;

        let mut files = vec![(
            format!("exports/{}/data.csv", bundle.project_key),
            encoder.encode(bundle.csv.as_bytes()),
        )];

        if let Some(archive) = &bundle.archive {
            files.push((
                format!("exports/{}/attachments.zip", bundle.project_key),
                encoder.encode(archive),
            ));
        }

        // ファイルごとのアップロードを並行実行する
        let uploads = files
            .iter()
            .map(|(path, content)| self.upload_file(&owner, &repo, path, content));
        let results = join_all(uploads).await;

        for result in results {
            result?;
        }

        Ok(files.into_iter().map(|(path, _)| path).collect())
    }
}

/// GitHubリポジトリURLからowner/リポジトリ名を抽出する
///
/// 末尾の`.git`は取り除き、空のパスセグメントは無視する。どちらかの
/// セグメントが欠けている場合は`InvalidRepositoryUrl`。
pub fn parse_repo_url(repo_url: &str) -> Result<(String, String)> {
    let url = Url::parse(repo_url)
        .map_err(|_| Error::InvalidRepositoryUrl(repo_url.to_string()))?;

    let path = url.path();
    let path = path.strip_suffix(".git").unwrap_or(path);
    let mut segments = path.split('/').filter(|s| !s.is_empty());

    match (segments.next(), segments.next()) {
        (Some(owner), Some(repo)) => Ok((owner.to_string(), repo.to_string())),
        _ => Err(Error::InvalidRepositoryUrl(repo_url.to_string())),
    }
}

fn extract_github_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = value["message"].as_str() {
            return message.to_string();
        }
    }
    if body.is_empty() {
        "Unknown error".to_string()
    } else {
        body.to_string()
    }
}
