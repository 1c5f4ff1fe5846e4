use crate::client::JiraClient;
use crate::config::ExportConfig;
use crate::error::{Error, Result};
use crate::jql;
use crate::models::Issue;
use crate::progress::{ProgressSink, ProgressSnapshot};

/// 検索エンドポイントの1ページあたりの取得件数
pub const PAGE_SIZE: u32 = 100;

/// ページネーション付きIssue取得
///
/// カウントクエリで総数を確定してから、固定幅100件のストライドで
/// 全ページを取得する。ページの連結はサーバーの返却順をそのまま保持
/// し、重複除去もソートも行わない。いずれかのページが失敗した場合は
/// 取得全体を中断し、途中まで蓄積したIssueは破棄される。
pub struct IssueFetcher<'a> {
    client: &'a JiraClient,
}

impl<'a> IssueFetcher<'a> {
    pub fn new(client: &'a JiraClient) -> Self {
        Self { client }
    }

    pub async fn fetch_all(
        &self,
        config: &ExportConfig,
        progress: &dyn ProgressSink,
    ) -> Result<Vec<Issue>> {
        if config.project_key.trim().is_empty() {
            return Err(Error::MissingProjectKey);
        }

        let jql = jql::build_query(&config.project_key, config.date_from, config.date_to);

        // まず結果0件のカウントクエリで総数を取得する
        let total = self.client.count_issues(&jql).await?;
        tracing::debug!(project_key = %config.project_key, total, "issue count resolved");

        let mut all_issues: Vec<Issue> = Vec::with_capacity(total as usize);
        let mut start_at = 0u32;

        while start_at < total {
            let page = self.client.search(&jql, PAGE_SIZE, start_at).await?;
            let window_end = (start_at + PAGE_SIZE).min(total);

            all_issues.extend(page.issues);

            progress.update(ProgressSnapshot::new(
                all_issues.len() as u32,
                total,
                format!(
                    "Fetching issues {} to {} of {}...",
                    start_at + 1,
                    window_end,
                    total
                ),
            ));

            start_at += PAGE_SIZE;
        }

        Ok(all_issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Credentials;
    use crate::progress::test_support::RecordingProgress;
    use serde_json::{Value, json};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn issue_json(index: u32) -> Value {
        json!({
            "id": format!("{}", 10000 + index),
            "key": format!("PROJ-{}", index),
            "self": format!("https://example.atlassian.net/rest/api/2/issue/{}", 10000 + index),
            "fields": {
                "summary": format!("Issue {}", index),
                "description": "body",
                "status": {"name": "To Do"},
                "created": "2024-01-01T00:00:00.000+0000"
            }
        })
    }

    fn page_json(start: u32, count: u32, total: u32) -> Value {
        let issues: Vec<Value> = (start..start + count).map(issue_json).collect();
        json!({
            "startAt": start,
            "maxResults": PAGE_SIZE,
            "total": total,
            "issues": issues
        })
    }

    async fn client_for(server: &MockServer) -> JiraClient {
        let credentials =
            Credentials::new(server.uri(), "test@example.com", "test_token").unwrap();
        JiraClient::new(credentials).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_all_with_zero_total_issues_no_page_request() {
        // Given: 総数0を返すカウントクエリ
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/api/2/search"))
            .and(query_param("maxResults", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "startAt": 0, "maxResults": 0, "total": 0, "issues": []
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        // ページリクエストは発行されないこと
        Mock::given(method("GET"))
            .and(path("/rest/api/2/search"))
            .and(query_param("maxResults", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_json(0, 0, 0)))
            .expect(0)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let config = ExportConfig::new("PROJ");
        let progress = RecordingProgress::new();

        // When: 全件取得
        let issues = IssueFetcher::new(&client)
            .fetch_all(&config, &progress)
            .await
            .unwrap();

        // Then: 空のリストが返り、進捗更新もない
        assert!(issues.is_empty());
        assert!(progress.snapshots().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_all_paginates_in_strides_of_100() {
        // Given: 総数250のプロジェクト
        let mock_server = MockServer::start().await;
        let total = 250;

        Mock::given(method("GET"))
            .and(path("/rest/api/2/search"))
            .and(query_param("maxResults", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "startAt": 0, "maxResults": 0, "total": total
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        for (start, count) in [(0u32, 100u32), (100, 100), (200, 50)] {
            Mock::given(method("GET"))
                .and(path("/rest/api/2/search"))
                .and(query_param("maxResults", "100"))
                .and(query_param("startAt", start.to_string()))
                .respond_with(
                    ResponseTemplate::new(200).set_body_json(page_json(start, count, total)),
                )
                .expect(1)
                .mount(&mock_server)
                .await;
        }

        let client = client_for(&mock_server).await;
        let config = ExportConfig::new("PROJ");
        let progress = RecordingProgress::new();

        // When: 全件取得
        let issues = IssueFetcher::new(&client)
            .fetch_all(&config, &progress)
            .await
            .unwrap();

        // Then: 250件がサーバー返却順のまま連結される
        assert_eq!(issues.len(), 250);
        assert_eq!(issues[0].key, "PROJ-0");
        assert_eq!(issues[99].key, "PROJ-99");
        assert_eq!(issues[100].key, "PROJ-100");
        assert_eq!(issues[249].key, "PROJ-249");

        // ページごとに進捗が更新され、currentは単調増加する
        let snapshots = progress.snapshots();
        assert_eq!(snapshots.len(), 3);
        assert_eq!(snapshots[0].current, 100);
        assert_eq!(snapshots[0].status, "Fetching issues 1 to 100 of 250...");
        assert_eq!(snapshots[1].current, 200);
        assert_eq!(snapshots[1].status, "Fetching issues 101 to 200 of 250...");
        assert_eq!(snapshots[2].current, 250);
        assert_eq!(snapshots[2].status, "Fetching issues 201 to 250 of 250...");
    }

    #[tokio::test]
    async fn test_fetch_all_rejects_empty_project_key() {
        let mock_server = MockServer::start().await;
        let client = client_for(&mock_server).await;
        let config = ExportConfig::new("");
        let progress = RecordingProgress::new();

        match IssueFetcher::new(&client)
            .fetch_all(&config, &progress)
            .await
            .unwrap_err()
        {
            Error::MissingProjectKey => {}
            other => panic!("Expected MissingProjectKey, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_page_failure_aborts_whole_fetch() {
        // Given: 2ページ目が失敗する
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/api/2/search"))
            .and(query_param("maxResults", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "startAt": 0, "maxResults": 0, "total": 150
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/rest/api/2/search"))
            .and(query_param("maxResults", "100"))
            .and(query_param("startAt", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_json(0, 100, 150)))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/rest/api/2/search"))
            .and(query_param("maxResults", "100"))
            .and(query_param("startAt", "100"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal error"))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let config = ExportConfig::new("PROJ");
        let progress = RecordingProgress::new();

        // When: 全件取得
        let result = IssueFetcher::new(&client).fetch_all(&config, &progress).await;

        // Then: 部分結果は返らずエラーになる
        match result.unwrap_err() {
            Error::ApiError { status, .. } => assert_eq!(status, 500),
            other => panic!("Expected ApiError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_date_bounds_reach_the_jql_parameter() {
        use chrono::NaiveDate;

        // Given: 両側の日付境界付き設定
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/api/2/search"))
            .and(query_param(
                "jql",
                "project = \"PROJ\" AND created >= \"2024-01-01\" AND created <= \"2024-06-30\"",
            ))
            .and(query_param("maxResults", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "startAt": 0, "maxResults": 0, "total": 0
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let config = ExportConfig::new("PROJ")
            .date_from(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
            .date_to(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap());
        let progress = RecordingProgress::new();

        let issues = IssueFetcher::new(&client)
            .fetch_all(&config, &progress)
            .await
            .unwrap();

        assert!(issues.is_empty());
    }
}
