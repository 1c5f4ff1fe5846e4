use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// 429レスポンス本文から待機時間を抽出できなかった場合のデフォルト冷却時間（秒）
pub const DEFAULT_COOLDOWN_SECONDS: u64 = 60;

static WAITING_TIME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)waiting time[:\s]+(\d+)\s*seconds?").expect("valid regex"));

/// レート制限状態のスナップショット
///
/// UI側のカウントダウン表示に渡す読み取り専用の値。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateLimitState {
    /// 制限中かどうか
    #[serde(rename = "isLimited")]
    pub is_limited: bool,
    /// 解除までの残り秒数（制限中でない場合は0）
    #[serde(rename = "resetTime")]
    pub reset_seconds: u64,
}

impl RateLimitState {
    fn idle() -> Self {
        Self {
            is_limited: false,
            reset_seconds: 0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Deadline {
    until: Instant,
}

/// レート制限ガード
///
/// 状態機械: `Idle → Limited(期限) → Idle`。429を受けた時点で`trip`により
/// Limitedへ遷移し、期限経過の観測または`reset`でIdleへ戻る。制限中は
/// `ensure_idle`が`RateLimitExceeded`を返すため、後続の呼び出しは全て
/// 即座に失敗する。失敗した呼び出し自体の自動リトライは行わない。
#[derive(Debug, Default)]
pub struct RateLimitGuard {
    limited_until: Mutex<Option<Deadline>>,
}

impl RateLimitGuard {
    /// 新しいガードを作成（初期状態はIdle）
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Deadline>> {
        // ロック保持中にpanicする操作はないが、poisonは握り潰して継続する
        self.limited_until
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 429検出時にLimited状態へ遷移させる
    pub fn trip(&self, reset_seconds: u64) {
        let mut guard = self.lock();
        *guard = Some(Deadline {
            until: Instant::now() + Duration::from_secs(reset_seconds),
        });
    }

    /// 手動リセット: 期限を待たずにIdleへ戻す
    pub fn reset(&self) {
        let mut guard = self.lock();
        *guard = None;
    }

    /// 現在の状態を取得する
    ///
    /// 期限を過ぎていた場合はこの観測時点でIdleへ遷移する。
    pub fn state(&self) -> RateLimitState {
        let mut guard = self.lock();
        match *guard {
            None => RateLimitState::idle(),
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline.until {
                    *guard = None;
                    return RateLimitState::idle();
                }
                let remaining = deadline.until.saturating_duration_since(now);
                // 残り1秒未満でも制限中は1秒として報告する（切り上げ）
                let mut seconds = remaining.as_secs();
                if remaining.subsec_nanos() > 0 {
                    seconds += 1;
                }
                RateLimitState {
                    is_limited: true,
                    reset_seconds: seconds,
                }
            }
        }
    }

    /// 制限中かどうか
    pub fn is_limited(&self) -> bool {
        self.state().is_limited
    }

    /// Idle状態であることを確認する
    ///
    /// 制限中の場合は`RateLimitExceeded`を返す。全てのHTTP呼び出しは
    /// リクエスト発行前にこのチェックを通る。
    pub fn ensure_idle(&self) -> Result<()> {
        if self.is_limited() {
            return Err(Error::RateLimitExceeded);
        }
        Ok(())
    }
}

/// 429レスポンス本文から "waiting time: N seconds" パターンを抽出する
pub fn parse_waiting_time(body: &str) -> Option<u64> {
    WAITING_TIME_PATTERN
        .captures(body)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
}

/// レスポンス本文から冷却時間を決定する（抽出失敗時は60秒）
pub fn cooldown_from_body(body: &str) -> u64 {
    parse_waiting_time(body).unwrap_or(DEFAULT_COOLDOWN_SECONDS)
}
