use serde::{Deserialize, Serialize};

use super::Attachment;

/// JIRAから取得するIssue（外部形状、読み取り専用）
///
/// 実行のたびに新規取得され、実行をまたいでキャッシュされることはない。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub key: String,
    #[serde(rename = "self")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
    pub fields: IssueFields,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueFields {
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: Status,
    // JIRA v2の日時表記（+0000形式）はそのまま文字列で持ち回る
    pub created: String,
    #[serde(default)]
    pub attachment: Vec<Attachment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
    pub name: String,
}
