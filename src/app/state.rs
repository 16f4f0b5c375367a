//! 画面ごとの表示状態。

use crate::{
    api::admin::GenerateCodes,
    config::{CodesCfg, Config},
    events::{AdminTab, Screen},
    export,
    models::{AdminUser, Job, JobStatus, Page, Quality, RedemptionCode, Stats},
    pagination::{self, CodeFilter, JobFilter, UserFilter},
};

/// ページング付き一覧の状態。
#[derive(Clone, Debug)]
pub struct ListView<T> {
    /// 最後に受け取ったページ。
    pub page: Page<T>,
    /// 要求中または表示中のページ番号（1始まり）。
    pub current: u32,
    /// 選択行。
    pub selected: usize,
    /// 応答待ちならtrue。
    pub loading: bool,
}

impl<T> Default for ListView<T> {
    fn default() -> Self {
        Self {
            page: Page::default(),
            current: 1,
            selected: 0,
            loading: false,
        }
    }
}

impl<T> ListView<T> {
    /// 受け取ったページで置き換える。
    pub fn replace(&mut self, page: Page<T>) {
        self.current = page.page.max(1);
        self.selected = self.selected.min(page.items.len().saturating_sub(1));
        self.page = page;
        self.loading = false;
    }

    /// 応答にページ数が無ければ件数から計算する。
    pub fn total_pages(&self) -> u32 {
        if self.page.total_pages > 0 {
            self.page.total_pages
        } else {
            pagination::total_pages(self.page.total, self.page.page_size)
        }
    }

    /// 次ページへ。移動できたらtrue。
    pub fn next_page(&mut self) -> bool {
        if self.current < self.total_pages() {
            self.current += 1;
            self.selected = 0;
            true
        } else {
            false
        }
    }

    /// 前ページへ。移動できたらtrue。
    pub fn prev_page(&mut self) -> bool {
        if self.current > 1 {
            self.current -= 1;
            self.selected = 0;
            true
        } else {
            false
        }
    }

    /// フィルタ変更時は先頭ページへ戻す。
    pub fn reset(&mut self) {
        self.current = 1;
        self.selected = 0;
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.page.items.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn selected_item(&self) -> Option<&T> {
        self.page.items.get(self.selected)
    }
}

/// ダッシュボードの集計。
#[derive(Clone, Debug, Default)]
pub struct DashboardView {
    /// クレジット残高（未取得ならNone）。
    pub balance: Option<i64>,
    /// 最近のジョブ。
    pub jobs: Vec<Job>,
    /// 全ジョブ数。
    pub total: u64,
    pub selected: usize,
}

impl DashboardView {
    pub fn completed(&self) -> usize {
        self.jobs
            .iter()
            .filter(|j| j.status == JobStatus::Completed)
            .count()
    }

    /// 待機中と処理中の合計。
    pub fn in_progress(&self) -> usize {
        self.jobs
            .iter()
            .filter(|j| !j.status.is_finished())
            .count()
    }
}

/// アップロードフォーム。
#[derive(Clone, Debug)]
pub struct UploadForm {
    pub path: String,
    pub quality: Quality,
    /// アップロード中ならtrue。
    pub busy: bool,
}

impl Default for UploadForm {
    fn default() -> Self {
        Self {
            path: String::new(),
            quality: Quality::Lama,
            busy: false,
        }
    }
}

/// ジョブ画面の状態。
#[derive(Clone, Debug)]
pub struct JobView {
    /// 表示中のジョブID。
    pub job_id: Option<String>,
    /// 最新のスナップショット。
    pub job: Option<Job>,
    /// 404を受け取ったらtrue（以後は読み込み中扱いしない）。
    pub not_found: bool,
    /// 反映済みの最新ポーリング世代。
    pub generation: u64,
    /// Escで戻る画面。
    pub return_to: Screen,
}

impl Default for JobView {
    fn default() -> Self {
        Self {
            job_id: None,
            job: None,
            not_found: false,
            generation: 0,
            return_to: Screen::Dashboard,
        }
    }
}

impl JobView {
    /// 別のジョブを開く。前のジョブの状態は捨てる。
    pub fn open(&mut self, job_id: String, known: Option<Job>, return_to: Screen) {
        self.job_id = Some(job_id);
        self.job = known;
        self.not_found = false;
        self.generation = 0;
        self.return_to = return_to;
    }

    pub fn close(&mut self) {
        self.job_id = None;
        self.job = None;
        self.not_found = false;
        self.generation = 0;
    }

    /// 表示中ジョブ宛てで、反映済みより新しい世代ならtrueを返して記録する。
    pub fn accept(&mut self, job_id: &str, generation: u64) -> bool {
        if self.job_id.as_deref() != Some(job_id) || generation <= self.generation {
            return false;
        }
        self.generation = generation;
        true
    }

    pub fn is_loading(&self) -> bool {
        self.job_id.is_some() && self.job.is_none() && !self.not_found
    }
}

/// 料金画面の状態。
#[derive(Clone, Debug, Default)]
pub struct PricingView {
    /// 選択中のパック位置。
    pub selected: usize,
    /// チェックアウト作成中ならtrue。
    pub busy: bool,
}

/// コード生成モーダル。
#[derive(Clone, Debug)]
pub struct GenerateForm {
    pub credits: i64,
    pub count: u32,
    pub prefix: String,
    pub busy: bool,
    /// 生成結果（成功後のみ）。
    pub result: Option<Vec<RedemptionCode>>,
}

impl GenerateForm {
    pub fn from_defaults(cfg: &CodesCfg) -> Self {
        Self {
            credits: cfg.default_credits,
            count: cfg.default_count,
            prefix: cfg.default_prefix.clone(),
            busy: false,
            result: None,
        }
    }

    pub fn request(&self) -> GenerateCodes {
        GenerateCodes::new(self.credits, self.count, &self.prefix)
    }

    /// パックと同じ 10/50/200 を順に切り替える。
    pub fn cycle_credits(&mut self) {
        self.credits = match self.credits {
            10 => 50,
            50 => 200,
            _ => 10,
        };
    }

    /// コピーとCSV保存が使えるか。
    pub fn can_export(&self) -> bool {
        self.result.as_ref().is_some_and(|r| !r.is_empty())
    }

    /// 生成結果を1行1コードで返す。
    pub fn export_lines(&self) -> Option<String> {
        if !self.can_export() {
            return None;
        }
        self.result.as_deref().map(export::codes_lines)
    }
}

/// 管理画面の状態。
#[derive(Clone, Debug, Default)]
pub struct AdminView {
    pub tab: AdminTab,
    pub stats: Option<Stats>,
    pub codes: ListView<RedemptionCode>,
    pub code_filter: CodeFilter,
    pub users: ListView<AdminUser>,
    pub user_filter: UserFilter,
    pub jobs: ListView<Job>,
    pub job_filter: JobFilter,
    /// 開いているコード生成モーダル。
    pub generate: Option<GenerateForm>,
}

/// 設定画面の編集バッファ。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SettingsForm {
    pub api_url: String,
    pub sign_in_url: String,
    pub poll_interval_ms: u64,
    pub stop_when_finished: bool,
}

impl SettingsForm {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            api_url: cfg.api.base_url.clone(),
            sign_in_url: cfg.api.sign_in_url.clone(),
            poll_interval_ms: cfg.poll.interval_ms,
            stop_when_finished: cfg.poll.stop_when_finished,
        }
    }

    /// 編集内容を設定へ反映する。
    pub fn apply(&self, cfg: &mut Config) {
        cfg.api.base_url = self.api_url.trim().trim_end_matches('/').to_string();
        cfg.api.sign_in_url = self.sign_in_url.trim().to_string();
        cfg.poll.interval_ms = self.poll_interval_ms;
        cfg.poll.stop_when_finished = self.stop_when_finished;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(n: usize, page: u32, total_pages: u32) -> Page<u32> {
        Page {
            items: (0..n as u32).collect(),
            total: u64::from(total_pages) * n as u64,
            page,
            page_size: n as u32,
            total_pages,
        }
    }

    #[test]
    fn test_list_paging_bounds() {
        let mut v: ListView<u32> = ListView::default();
        assert!(!v.prev_page());
        assert!(!v.next_page());
        v.replace(page(3, 1, 2));
        assert!(v.next_page());
        assert_eq!(v.current, 2);
        assert!(!v.next_page());
        assert!(v.prev_page());
    }

    #[test]
    fn test_replace_clamps_selection() {
        let mut v: ListView<u32> = ListView::default();
        v.replace(page(5, 1, 1));
        v.selected = 4;
        v.replace(page(2, 1, 1));
        assert_eq!(v.selected, 1);
        v.replace(page(0, 1, 1));
        assert_eq!(v.selected, 0);
        assert!(v.selected_item().is_none());
    }

    #[test]
    fn test_total_pages_falls_back_to_count() {
        let mut v: ListView<u32> = ListView::default();
        assert_eq!(v.total_pages(), 1);
        v.replace(Page {
            items: vec![1, 2],
            total: 41,
            page: 1,
            page_size: 20,
            total_pages: 0,
        });
        assert_eq!(v.total_pages(), 3);
    }

    #[test]
    fn test_job_view_accepts_only_newer_generations() {
        let mut v = JobView::default();
        assert!(!v.accept("job-1", 1));
        v.open("job-1".into(), None, Screen::Dashboard);
        assert!(v.accept("job-1", 2));
        assert!(!v.accept("job-1", 1));
        assert!(!v.accept("job-1", 2));
        assert!(!v.accept("job-2", 3));
        assert!(v.accept("job-1", 3));
        v.close();
        assert!(!v.accept("job-1", 4));
    }

    #[test]
    fn test_settings_form_round_trip() {
        let mut cfg = Config::default();
        let mut form = SettingsForm::from_config(&cfg);
        form.api_url = " https://api.example.com/ ".into();
        form.stop_when_finished = true;
        form.apply(&mut cfg);
        assert_eq!(cfg.api.base_url, "https://api.example.com");
        assert!(cfg.poll.stop_when_finished);
    }

    #[test]
    fn test_generate_form_credits_cycle() {
        let mut f = GenerateForm::from_defaults(&CodesCfg::default());
        assert_eq!(f.credits, 10);
        f.cycle_credits();
        f.cycle_credits();
        assert_eq!(f.credits, 200);
        f.cycle_credits();
        assert_eq!(f.credits, 10);
        assert!(!f.can_export());
    }
}
