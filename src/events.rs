//! 画面遷移用のUI状態と画面種別。

use std::time::{Duration, Instant};

/// トーストの表示時間。
pub const TOAST_TTL: Duration = Duration::from_secs(4);
/// 保持するログの最大行数。
pub const LOG_CAP: usize = 100;

/// TUIで現在表示中の画面。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    /// 初期設定ウィザード画面。
    Setup,
    /// 残高と最近のジョブ。
    Dashboard,
    /// 動画アップロード画面。
    Upload,
    /// 単一ジョブの進捗画面。
    Job,
    /// ジョブ履歴一覧。
    History,
    /// クレジット購入とコード引き換え。
    Pricing,
    /// 管理コンソール。
    Admin,
    /// 設定編集画面。
    Settings,
}

impl Screen {
    /// ステータスバーに出す画面名。
    pub fn name(self) -> &'static str {
        match self {
            Screen::Setup => "Setup",
            Screen::Dashboard => "Dashboard",
            Screen::Upload => "Upload",
            Screen::Job => "Job",
            Screen::History => "History",
            Screen::Pricing => "Pricing",
            Screen::Admin => "Admin",
            Screen::Settings => "Settings",
        }
    }
}

/// 管理コンソールのタブ。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AdminTab {
    #[default]
    Stats,
    Codes,
    Users,
    Jobs,
}

impl AdminTab {
    pub const ALL: [AdminTab; 4] = [AdminTab::Stats, AdminTab::Codes, AdminTab::Users, AdminTab::Jobs];

    pub fn next(self) -> Self {
        match self {
            AdminTab::Stats => AdminTab::Codes,
            AdminTab::Codes => AdminTab::Users,
            AdminTab::Users => AdminTab::Jobs,
            AdminTab::Jobs => AdminTab::Stats,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            AdminTab::Stats => "Stats",
            AdminTab::Codes => "Codes",
            AdminTab::Users => "Users",
            AdminTab::Jobs => "Jobs",
        }
    }
}

/// トーストの種類。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

/// 一定時間で消える通知。
#[derive(Clone, Debug)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
    pub expires_at: Instant,
}

/// 描画側と共有するUI状態。
#[derive(Clone, Debug)]
pub struct UiState {
    /// 現在の画面。
    pub screen: Screen,
    /// 右側パネルに表示するログ。
    pub log: Vec<String>,
    /// 画面下部のステータス文言。
    pub status: String,
    /// 表示中のトースト。
    pub toast: Option<Toast>,
    /// エラーメッセージ（ウィザードで強調表示）。
    pub error: Option<String>,
}

impl UiState {
    pub fn new(screen: Screen) -> Self {
        Self {
            screen,
            log: vec![],
            status: "Ready".into(),
            toast: None,
            error: None,
        }
    }

    /// 成功トーストを出す。
    pub fn toast_success(&mut self, message: impl Into<String>) {
        self.push_toast(ToastKind::Success, message.into());
    }

    /// エラートーストを出す。
    pub fn toast_error(&mut self, message: impl Into<String>) {
        self.push_toast(ToastKind::Error, message.into());
    }

    /// ログに1行追加する。古い行は上限を超えた分だけ捨てる。
    pub fn push_log(&mut self, line: impl Into<String>) {
        self.log.push(line.into());
        if self.log.len() > LOG_CAP {
            let excess = self.log.len() - LOG_CAP;
            self.log.drain(..excess);
        }
    }

    fn push_toast(&mut self, kind: ToastKind, message: String) {
        // 直前のトーストは上書きする。
        self.push_log(message.clone());
        self.toast = Some(Toast {
            kind,
            message,
            expires_at: Instant::now() + TOAST_TTL,
        });
    }

    /// 期限切れのトーストを消す。
    pub fn expire_toast(&mut self, now: Instant) {
        if self.toast.as_ref().is_some_and(|t| t.expires_at <= now) {
            self.toast = None;
        }
    }
}
