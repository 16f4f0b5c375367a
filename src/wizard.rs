//! 初期設定ウィザードのステート管理。

/// ウィザードの各ステップ
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WizardStep {
    /// ウェルカムメッセージ
    Welcome,
    /// APIのベースURL
    ApiUrl,
    /// サインインとトークン入力
    SignIn,
    /// 完了
    Complete,
}

/// ウィザードの状態管理
#[derive(Clone, Debug)]
pub struct WizardState {
    /// 現在のステップ
    pub current_step: WizardStep,
    /// 全ステップ数
    pub total_steps: usize,
    /// 入力済みのAPI URL
    pub api_url: String,
    /// 入力済みのトークン（未入力ならNone）
    pub token: Option<String>,
}

impl WizardState {
    /// 既定のAPI URLを入れてWelcomeから開始する。
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            current_step: WizardStep::Welcome,
            total_steps: 4,
            api_url: api_url.into(),
            token: None,
        }
    }

    /// 次のステップへ進む
    pub fn next_step(&mut self) {
        self.current_step = match self.current_step {
            WizardStep::Welcome => WizardStep::ApiUrl,
            WizardStep::ApiUrl => WizardStep::SignIn,
            WizardStep::SignIn | WizardStep::Complete => WizardStep::Complete,
        };
    }

    /// 現在のステップのプロンプトメッセージを取得
    pub fn get_prompt(&self) -> String {
        match self.current_step {
            WizardStep::Welcome => "Welcome to Vanishly!\n\nThis wizard connects the terminal client to your Vanishly backend.\nPress Enter to start.".to_string(),
            WizardStep::ApiUrl => format!(
                "Backend URL\n\nCurrent: {}\nPress Enter to edit the API base URL.",
                self.api_url
            ),
            WizardStep::SignIn => "Sign in\n\nPress Enter to open the sign-in page in your browser,\nthen paste the access token it shows.".to_string(),
            WizardStep::Complete => {
                let token = if self.token.is_some() { "stored" } else { "not set (sign in later from Settings)" };
                format!(
                    "All set!\n\nAPI: {}\nToken: {}\nPress Enter to open the dashboard.",
                    self.api_url, token
                )
            }
        }
    }

    /// 現在のステップ番号を取得（1始まり）
    pub fn get_step_number(&self) -> usize {
        match self.current_step {
            WizardStep::Welcome => 1,
            WizardStep::ApiUrl => 2,
            WizardStep::SignIn => 3,
            WizardStep::Complete => 4,
        }
    }
}
