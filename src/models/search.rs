use super::Issue;
use serde::{Deserialize, Serialize};

/// `GET /rest/api/2/search` のレスポンス
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(rename = "startAt")]
    #[serde(default)]
    pub start_at: u32,

    #[serde(rename = "maxResults")]
    #[serde(default)]
    pub max_results: u32,

    pub total: u32,

    #[serde(default)]
    pub issues: Vec<Issue>,
}
