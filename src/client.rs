use crate::error::{Error, Result};
use crate::models::{Attachment, AttachmentListing, CurrentUser, DownloadedAttachment, SearchResult};
use crate::rate_limit::{RateLimitGuard, RateLimitState, cooldown_from_body};
use base64::Engine;
use reqwest::{Client, Response, header};
use std::sync::Arc;
use url::Url;

/// JIRA接続の認証情報
///
/// セッション中は不変。切断時に破棄される。
#[derive(Debug, Clone)]
pub struct Credentials {
    pub domain: String,
    pub email: String,
    pub token: String,
}

impl Credentials {
    pub fn new(
        domain: impl Into<String>,
        email: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self> {
        // 末尾のスラッシュはURL組み立て前に除去する
        let domain = domain.into().trim_end_matches('/').to_string();

        let _ = Url::parse(&domain)
            .map_err(|_| Error::InvalidConfiguration("Invalid JIRA domain URL".to_string()))?;

        Ok(Self {
            domain,
            email: email.into(),
            token: token.into(),
        })
    }

    pub fn from_env() -> Result<Self> {
        use std::env;

        let domain = env::var("JIRA_URL").map_err(|_| {
            Error::ConfigurationMissing("JIRA_URL not found in environment".to_string())
        })?;

        let email = env::var("JIRA_USER").map_err(|_| {
            Error::ConfigurationMissing("JIRA_USER not found in environment".to_string())
        })?;

        let token = env::var("JIRA_API_TOKEN").map_err(|_| {
            Error::ConfigurationMissing("JIRA_API_TOKEN not found in environment".to_string())
        })?;

        Self::new(domain, email, token)
    }
}

/// 認証済みJIRAクライアント
///
/// 全てのリクエストはBasic認証ヘッダー付きで発行され、レスポンスは
/// `handle_response`に集約される。429検出時はガードをLimitedへ遷移させ、
/// 以降の呼び出しは冷却完了まで即座に`RateLimitExceeded`で失敗する。
#[derive(Debug, Clone)]
pub struct JiraClient {
    client: Client,
    credentials: Arc<Credentials>,
    guard: Arc<RateLimitGuard>,
}

impl JiraClient {
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::with_guard(credentials, Arc::new(RateLimitGuard::new()))
    }

    /// 既存のガードを共有してクライアントを作成
    pub fn with_guard(credentials: Credentials, guard: Arc<RateLimitGuard>) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        // Basic認証ヘッダーを追加（email:tokenをbase64エンコード）
        let auth_value = format!("{}:{}", credentials.email, credentials.token);
        let encoded = base64::engine::general_purpose::STANDARD.encode(auth_value.as_bytes());
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Basic {}", encoded))
                .map_err(|_| Error::InvalidConfiguration("Invalid auth header".to_string()))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Unexpected(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            credentials: Arc::new(credentials),
            guard,
        })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn rate_limit(&self) -> &Arc<RateLimitGuard> {
        &self.guard
    }

    pub fn rate_limit_state(&self) -> RateLimitState {
        self.guard.state()
    }

    /// レスポンスステータスの解釈を一元化する
    ///
    /// - 429: 本文から待機時間を抽出してガードを発動し、`RateLimitExceeded`を返す
    /// - その他の非2xx: サーバーメッセージ付きの`ApiError`を返す
    async fn handle_response(&self, response: Response) -> Result<Response> {
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let body = response.text().await.unwrap_or_default();
            let cooldown = cooldown_from_body(&body);
            self.guard.trip(cooldown);
            // 429ごとに1回だけ通知を出す
            tracing::warn!(
                cooldown_seconds = cooldown,
                "JIRA rate limit hit, cooling down"
            );
            return Err(Error::RateLimitExceeded);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::ApiError {
                status: status.as_u16(),
                message: extract_error_message(&body),
            });
        }

        Ok(response)
    }

    async fn get_response(&self, url: &str) -> Result<Response> {
        self.guard.ensure_idle()?;
        let response = self.client.get(url).send().await?;
        self.handle_response(response).await
    }

    async fn get_json<T>(&self, path_and_query: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = format!("{}{}", self.credentials.domain, path_and_query);
        let response = self.get_response(&url).await?;
        let data = response.json::<T>().await?;
        Ok(data)
    }

    /// 検索エンドポイントを1回呼び出す
    pub async fn search(&self, jql: &str, max_results: u32, start_at: u32) -> Result<SearchResult> {
        let path = format!(
            "/rest/api/2/search?jql={}&maxResults={}&startAt={}",
            urlencoding::encode(jql),
            max_results,
            start_at
        );
        self.get_json(&path).await
    }

    /// 検索条件に合致するIssueの総数を取得する（結果0件のカウントクエリ）
    pub async fn count_issues(&self, jql: &str) -> Result<u32> {
        let result = self.search(jql, 0, 0).await?;
        Ok(result.total)
    }

    /// Issueの添付ファイル一覧を取得する
    pub async fn issue_attachments(&self, issue_key: &str) -> Result<Vec<Attachment>> {
        let path = format!("/rest/api/2/issue/{}?fields=attachment", issue_key);
        let listing: AttachmentListing = self.get_json(&path).await?;
        Ok(listing.fields.attachment)
    }

    /// 添付ファイルのバイナリ本体をダウンロードする
    pub async fn download_attachment(&self, attachment: &Attachment) -> Result<DownloadedAttachment> {
        let response = self.get_response(&attachment.content).await?;
        let bytes = response.bytes().await?;
        Ok(DownloadedAttachment {
            filename: attachment.filename.clone(),
            content: bytes.to_vec(),
            mime_type: attachment.mime_type.clone(),
            size: attachment.size,
        })
    }

    /// 認証ユーザー情報を取得する
    pub async fn myself(&self) -> Result<CurrentUser> {
        self.get_json("/rest/api/2/myself").await
    }

    /// 認証情報の有効性を確認する
    ///
    /// `/rest/api/2/myself`の返すメールアドレスが接続時に入力された
    /// メールアドレスと一致することをもって有効とみなす。
    pub async fn validate_credentials(&self) -> Result<()> {
        let me = self.myself().await?;
        if me.email_address.as_deref() != Some(self.credentials.email.as_str()) {
            return Err(Error::AuthenticationFailed(
                "Returned email does not match the submitted email".to_string(),
            ));
        }
        Ok(())
    }
}

/// エラーレスポンス本文からサーバーメッセージを取り出す
///
/// JIRAのエラー形式 `{"errorMessages": ["..."]}` を優先し、
/// 解釈できない場合は本文をそのまま返す。
fn extract_error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = value["errorMessages"][0].as_str() {
            return message.to_string();
        }
    }
    if body.is_empty() {
        "Unknown error".to_string()
    } else {
        body.to_string()
    }
}
