//! バックエンドが返すリソースのモデル。

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// バックエンド側で管理されるジョブ状態。
///
/// 未知の値や欠落した値は `Pending` として扱う。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "serde_json::Value")]
pub enum JobStatus {
    /// キュー待ち。
    #[default]
    Pending,
    /// 処理中。
    Processing,
    /// 正常完了。
    Completed,
    /// 失敗。
    Failed,
}

impl JobStatus {
    /// APIのクエリ等で使う文字列表現。
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// 完了または失敗ならtrue。
    pub fn is_finished(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// 画面表示用のラベル。
    pub fn label(&self) -> &'static str {
        match self {
            JobStatus::Pending => "Queued",
            JobStatus::Processing => "Processing",
            JobStatus::Completed => "Completed",
            JobStatus::Failed => "Failed",
        }
    }
}

impl From<serde_json::Value> for JobStatus {
    fn from(v: serde_json::Value) -> Self {
        // 文字列以外（null・数値・オブジェクト等）はPending扱い。
        let Some(s) = v.as_str() else {
            return JobStatus::Pending;
        };
        // 大文字・前後空白の揺れは吸収する。
        match s.trim().to_ascii_lowercase().as_str() {
            "processing" => JobStatus::Processing,
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            _ => JobStatus::Pending,
        }
    }
}

/// 処理モード（情報表示のみ）。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Quality {
    /// 高速モード。
    Lama,
    /// 高品質モード。
    E2fgviHq,
    /// 未知のモード名はそのまま保持する。
    Other(String),
}

impl Quality {
    /// APIへ送る文字列表現。
    pub fn as_str(&self) -> &str {
        match self {
            Quality::Lama => "lama",
            Quality::E2fgviHq => "e2fgvi_hq",
            Quality::Other(s) => s,
        }
    }

    /// アップロード画面で切り替える次のモード。
    pub fn toggled(&self) -> Self {
        match self {
            Quality::Lama => Quality::E2fgviHq,
            _ => Quality::Lama,
        }
    }
}

impl Serialize for Quality {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Quality {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(match s.as_str() {
            "lama" => Quality::Lama,
            "e2fgvi_hq" => Quality::E2fgviHq,
            _ => Quality::Other(s),
        })
    }
}

/// バックエンドのジョブ1件（読み取り専用）。
#[derive(Clone, Debug, Deserialize)]
pub struct Job {
    /// バックエンドが発行する不透明なID。
    pub id: String,
    /// 現在の状態。欠落時はPending。
    #[serde(default)]
    pub status: JobStatus,
    /// 入力動画のURL。
    #[serde(default)]
    pub input_url: Option<String>,
    /// 出力動画のURL（完了時のみ）。
    #[serde(default)]
    pub output_url: Option<String>,
    /// 処理モード。
    #[serde(default)]
    pub quality: Option<Quality>,
    /// 消費クレジット。
    #[serde(default)]
    pub cost: Option<i64>,
    /// 管理画面の一覧でのみ返る所有ユーザーID。
    #[serde(default)]
    pub user_id: Option<String>,
    /// 進捗推定の基準となる作成時刻。
    #[serde(deserialize_with = "de_timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Job {
    /// ダウンロード可能な出力URL（完了時のみ）。
    pub fn download_url(&self) -> Option<&str> {
        if self.status == JobStatus::Completed {
            self.output_url.as_deref()
        } else {
            None
        }
    }

    /// 一覧表示用の短いID。
    pub fn short_id(&self) -> &str {
        let end = self
            .id
            .char_indices()
            .nth(8)
            .map(|(i, _)| i)
            .unwrap_or(self.id.len());
        &self.id[..end]
    }
}

/// 一覧APIのページ。
#[derive(Clone, Debug, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: 1,
            page_size: 0,
            total_pages: 0,
        }
    }
}

/// ページ応答の受信形式。配列名はエンドポイントごとに異なる。
#[derive(Deserialize)]
#[serde(untagged)]
enum PageRepr<T> {
    Paged {
        #[serde(alias = "jobs", alias = "codes", alias = "users")]
        items: Vec<T>,
        total: u64,
        page: u32,
        page_size: u32,
        total_pages: u32,
    },
    Bare(Vec<T>),
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Page<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match PageRepr::deserialize(deserializer)? {
            PageRepr::Paged {
                items,
                total,
                page,
                page_size,
                total_pages,
            } => Page {
                items,
                total,
                page,
                page_size,
                total_pages,
            },
            // ページングされていない配列は1ページとして包む。
            PageRepr::Bare(items) => {
                let n = items.len() as u64;
                Page {
                    page_size: n as u32,
                    total: n,
                    page: 1,
                    total_pages: u32::from(n > 0),
                    items,
                }
            }
        })
    }
}

/// 引き換えコード。
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RedemptionCode {
    pub code: String,
    pub credits: i64,
    #[serde(deserialize_with = "de_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub redeemed_by: Option<String>,
    #[serde(default, deserialize_with = "de_opt_timestamp")]
    pub redeemed_at: Option<DateTime<Utc>>,
}

impl RedemptionCode {
    /// 引き換え済みならtrue。
    pub fn is_redeemed(&self) -> bool {
        self.redeemed_by.is_some()
    }
}

/// 管理画面のユーザー行。
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct AdminUser {
    pub id: String,
    #[serde(default)]
    pub email: String,
    pub credits: i64,
    #[serde(default)]
    pub is_admin: i64,
    #[serde(deserialize_with = "de_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub total_jobs: u64,
    #[serde(default)]
    pub completed_jobs: u64,
}

/// 管理ダッシュボードの集計値。
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct Stats {
    pub total_users: u64,
    pub total_jobs: u64,
    pub completed_jobs: u64,
    pub pending_codes: u64,
    pub redeemed_codes: u64,
}

/// クレジット残高。
#[derive(Clone, Debug, Deserialize)]
pub struct Balance {
    pub credits: i64,
}

/// コード引き換え結果。
#[derive(Clone, Debug, Deserialize)]
pub struct RedeemResult {
    pub message: String,
    pub credits_added: i64,
    pub new_balance: i64,
}

/// 決済プロバイダのチェックアウトセッション。
#[derive(Clone, Debug, Deserialize)]
pub struct CheckoutSession {
    pub checkout_url: String,
    pub session_id: String,
}

/// 購入可能なクレジットパック。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreditPack {
    Starter,
    Pro,
    Business,
}

impl CreditPack {
    /// 表示順の全パック。
    pub const ALL: [CreditPack; 3] = [CreditPack::Starter, CreditPack::Pro, CreditPack::Business];

    /// APIへ送るパック名。
    pub fn key(&self) -> &'static str {
        match self {
            CreditPack::Starter => "starter",
            CreditPack::Pro => "pro",
            CreditPack::Business => "business",
        }
    }

    /// 付与クレジット数。
    pub fn credits(&self) -> i64 {
        match self {
            CreditPack::Starter => 10,
            CreditPack::Pro => 50,
            CreditPack::Business => 200,
        }
    }

    /// 価格（米ドル、セント単位）。
    pub fn price_cents(&self) -> i64 {
        match self {
            CreditPack::Starter => 499,
            CreditPack::Pro => 1999,
            CreditPack::Business => 5999,
        }
    }
}

/// RFC 3339 とタイムゾーン無しのISO形式の両方を受け付ける。
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // バックエンドはUTCのnaive時刻を返すことがある。
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|n| n.and_utc())
}

fn de_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let s = String::deserialize(deserializer)?;
    parse_timestamp(&s).ok_or_else(|| serde::de::Error::custom(format!("bad timestamp: {s}")))
}

fn de_opt_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let s = Option::<String>::deserialize(deserializer)?;
    match s {
        Some(s) => parse_timestamp(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("bad timestamp: {s}"))),
        None => Ok(None),
    }
}
