use serde::{Deserialize, Serialize};

/// エクスポート進捗のスナップショット
///
/// `current`は各フェーズ内で単調増加する。フェーズは厳密に逐次実行される
/// ため、書き手は常に1つだけという不変条件が構造的に成り立つ。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub current: u32,
    pub total: u32,
    pub status: String,
}

impl ProgressSnapshot {
    pub fn new(current: u32, total: u32, status: impl Into<String>) -> Self {
        Self {
            current,
            total,
            status: status.into(),
        }
    }
}

/// 進捗の通知先
///
/// 共有可変状態の代わりに、各フェーズへ明示的に渡すインタフェース。
/// UI層はこのトレイトを実装してプログレスバー等へ反映する。
pub trait ProgressSink: Send + Sync {
    fn update(&self, snapshot: ProgressSnapshot);
}

/// 進捗を破棄するシンク
#[derive(Debug, Default)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn update(&self, _snapshot: ProgressSnapshot) {}
}

/// 進捗をログに流すシンク
#[derive(Debug, Default)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn update(&self, snapshot: ProgressSnapshot) {
        tracing::info!(
            current = snapshot.current,
            total = snapshot.total,
            "{}",
            snapshot.status
        );
    }
}
