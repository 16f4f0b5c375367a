//! TUIのイベントループ、入力処理、状態管理。

mod handlers;
mod render;
mod state;

use anyhow::Result;
use crossterm::event::{self, Event};
use std::{
    path::PathBuf,
    time::{Duration, Instant},
};
use tokio::sync::mpsc;

use crate::{
    auth::{FileTokenStorage, SessionTokens, TokenProvider},
    config::{self, Config},
    events::{AdminTab, Screen, UiState},
    input::InputBoxState,
    pagination::ListQuery,
    poller::PollEvent,
    shortcuts::Shortcuts,
    ui::Tui,
    wizard,
    worker::{self, WorkerCmd, WorkerEvent},
};

use handlers::{handle_key, handle_paste, is_ctrl_c};
use render::draw;
use state::{
    AdminView, DashboardView, JobView, ListView, PricingView, SettingsForm, UploadForm,
};

/// 入力処理と描画で共有するアプリ状態。
pub struct App {
    /// 永続化された設定ファイルのパス。
    pub cfg_path: PathBuf,
    /// メモリ上の現在設定。
    pub cfg: Config,
    /// 画面やトーストなどUI固有の状態。
    pub ui: UiState,
    /// Workerへのコマンド送信チャネル。
    pub worker_tx: mpsc::Sender<WorkerCmd>,
    /// Workerからのイベント受信チャネル。
    pub worker_rx: mpsc::Receiver<WorkerEvent>,

    /// トークンが保存済みならtrue。
    pub signed_in: bool,
    pub dashboard: DashboardView,
    pub upload: UploadForm,
    pub job: JobView,
    pub history: ListView<crate::models::Job>,
    pub history_filter: crate::pagination::JobFilter,
    pub pricing: PricingView,
    pub admin: AdminView,
    /// 設定画面の編集バッファ。
    pub settings: SettingsForm,

    /// 入力ボックスの状態（入力中はSome）。
    pub input_box: Option<InputBoxState>,
    /// 初期設定ウィザードの状態。
    pub wizard_state: wizard::WizardState,
    /// ショートカットキー設定。
    pub shortcuts: Shortcuts,
}

impl App {
    pub fn new(
        cfg_path: PathBuf,
        cfg: Config,
        shortcuts: Shortcuts,
        worker_tx: mpsc::Sender<WorkerCmd>,
        worker_rx: mpsc::Receiver<WorkerEvent>,
        signed_in: bool,
    ) -> Self {
        // 未サインインまたは接続先未設定ならウィザードから始める。
        let screen = if !signed_in || cfg.needs_setup() {
            Screen::Setup
        } else {
            Screen::Dashboard
        };
        Self {
            cfg_path,
            ui: UiState::new(screen),
            worker_tx,
            worker_rx,
            signed_in,
            dashboard: DashboardView::default(),
            upload: UploadForm::default(),
            job: JobView::default(),
            history: ListView::default(),
            history_filter: Default::default(),
            pricing: PricingView::default(),
            admin: AdminView::default(),
            settings: SettingsForm::from_config(&cfg),
            input_box: None,
            wizard_state: wizard::WizardState::new(cfg.api.base_url.clone()),
            shortcuts,
            cfg,
        }
    }

    /// 入力ボックスを開く。
    pub fn prompt(&mut self, state: InputBoxState) {
        self.input_box = Some(state);
    }

    async fn send(&self, cmd: WorkerCmd) -> Result<()> {
        self.worker_tx.send(cmd).await?;
        Ok(())
    }
}

/// ユーザーが終了するまでメインTUIループを回す。
pub async fn run_app(terminal: &mut Tui) -> Result<()> {
    // 設定ファイルを読み込む（初回はデフォルトを生成）。
    let cfg_path = PathBuf::from("config.toml");
    let cfg = Config::load_or_default(&cfg_path)?
        .with_env_override(std::env::var(config::API_URL_ENV).ok());

    let shortcuts = Shortcuts::load_or_default("shortcut.toml")?;

    // 保存済みトークンの有無で初期画面を決める。
    let storage = FileTokenStorage::new("token.json");
    let signed_in = match SessionTokens::new(storage.clone(), cfg.api.base_url.clone())
        .token()
        .await
    {
        Ok(t) => t.is_some(),
        Err(e) => {
            tracing::warn!("token store unreadable: {e}");
            false
        }
    };

    let (tx_cmd, rx_cmd) = mpsc::channel::<WorkerCmd>(64);
    let (tx_ev, rx_ev) = mpsc::channel::<WorkerEvent>(256);
    tokio::spawn(worker::run(rx_cmd, tx_ev, cfg.clone(), storage));

    let mut app = App::new(cfg_path, cfg, shortcuts, tx_cmd, rx_ev, signed_in);
    if app.ui.screen == Screen::Dashboard {
        go_to(&mut app, Screen::Dashboard).await?;
    }

    loop {
        app.ui.expire_toast(Instant::now());
        terminal.draw(|f| draw(f, &app))?;

        // 入力処理の前にWorkerイベントを消化する。
        while let Ok(ev) = app.worker_rx.try_recv() {
            handle_worker_event(&mut app, ev).await?;
        }

        // UIの応答性確保のため短いタイムアウトで入力をポーリングする。
        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(k) => {
                    // どの画面でもCtrl+Cで終了できるようにする。
                    if is_ctrl_c(&k) {
                        break;
                    }
                    if handle_key(&mut app, k).await? {
                        break;
                    }
                }
                Event::Paste(text) => handle_paste(&mut app, &text),
                _ => {}
            }
        }
    }
    // 画面を閉じる前にポーリングを止める。
    let _ = app.worker_tx.send(WorkerCmd::UnwatchJob).await;
    Ok(())
}

/// WorkerイベントをUI状態へ反映する。
pub(crate) async fn handle_worker_event(app: &mut App, ev: WorkerEvent) -> Result<()> {
    match ev {
        WorkerEvent::SignedIn => {
            app.signed_in = true;
            app.ui.toast_success("Signed in");
            if app.ui.screen == Screen::Dashboard {
                app.send(WorkerCmd::RefreshDashboard).await?;
            }
        }
        WorkerEvent::SignedOut => {
            app.signed_in = false;
            app.dashboard = DashboardView::default();
            app.ui.toast_success("Signed out");
        }
        WorkerEvent::Dashboard { balance, jobs } => {
            app.dashboard.balance = Some(balance);
            app.dashboard.total = jobs.total;
            app.dashboard.jobs = jobs.items;
            app.dashboard.selected = app
                .dashboard
                .selected
                .min(app.dashboard.jobs.len().saturating_sub(1));
            app.ui.status = format!("Loaded {} jobs", app.dashboard.total);
        }
        WorkerEvent::History(mut page) => {
            // 絞り込みを無視する応答でも表示はフィルタに合わせる。
            app.history_filter.retain(&mut page);
            app.history.replace(page);
        }
        WorkerEvent::JobCreated(job) => {
            app.upload.busy = false;
            app.upload.path.clear();
            app.ui.toast_success("Job created! Processing started");
            let id = job.id.clone();
            open_job(app, id, Some(job), Screen::Dashboard).await?;
        }
        WorkerEvent::Poll(update) => {
            // 閉じた画面や別ジョブ宛て、反映済みより古い結果は捨てる。
            if !app.job.accept(&update.job_id, update.generation) {
                tracing::debug!(
                    "ignored poll result for {} #{}",
                    update.job_id,
                    update.generation
                );
                return Ok(());
            }
            match update.event {
                PollEvent::Snapshot(job) => {
                    app.job.job = Some(job);
                    app.job.not_found = false;
                }
                PollEvent::NotFound => {
                    app.job.job = None;
                    app.job.not_found = true;
                }
            }
        }
        WorkerEvent::Redeemed(res) => {
            app.dashboard.balance = Some(res.new_balance);
            app.ui
                .toast_success(format!("{} (+{} credits)", res.message, res.credits_added));
        }
        WorkerEvent::CheckoutOpened(url) => {
            app.pricing.busy = false;
            app.ui.toast_success("Checkout opened in your browser");
            app.ui.push_log(format!("Checkout: {url}"));
        }
        WorkerEvent::Stats(stats) => app.admin.stats = Some(stats),
        WorkerEvent::Codes(page) => app.admin.codes.replace(page),
        WorkerEvent::CodesGenerated(codes) => {
            let n = codes.len();
            if let Some(form) = app.admin.generate.as_mut() {
                form.busy = false;
                form.result = Some(codes);
            }
            app.ui.toast_success(format!("Generated {n} codes"));
            load_admin_tab(app).await?;
        }
        WorkerEvent::Users(page) => app.admin.users.replace(page),
        WorkerEvent::CreditsUpdated {
            user_id,
            new_credits,
        } => {
            if let Some(u) = app
                .admin
                .users
                .page
                .items
                .iter_mut()
                .find(|u| u.id == user_id)
            {
                u.credits = new_credits;
            }
            app.ui
                .toast_success(format!("Credits updated to {new_credits}"));
        }
        WorkerEvent::AdminJobs(mut page) => {
            app.admin.job_filter.retain(&mut page);
            app.admin.jobs.replace(page);
        }
        WorkerEvent::Exported { path, count } => {
            app.ui
                .toast_success(format!("Exported {count} codes to {}", path.display()));
        }
        WorkerEvent::Log(s) => {
            app.ui.status = s.clone();
            app.ui.push_log(s);
        }
        WorkerEvent::Error(s) => {
            // 失敗した操作は以前の表示をそのまま残し、待機フラグだけ戻す。
            app.upload.busy = false;
            app.pricing.busy = false;
            if let Some(form) = app.admin.generate.as_mut() {
                form.busy = false;
            }
            app.history.loading = false;
            app.admin.codes.loading = false;
            app.admin.users.loading = false;
            app.admin.jobs.loading = false;
            app.ui.toast_error(s);
        }
    }
    Ok(())
}

/// 画面を切り替え、必要なデータの取得を依頼する。
pub async fn go_to(app: &mut App, screen: Screen) -> Result<()> {
    if app.ui.screen == Screen::Job && screen != Screen::Job {
        close_job(app).await?;
    }
    app.ui.screen = screen;
    app.ui.error = None;
    match screen {
        Screen::Dashboard | Screen::Pricing => app.send(WorkerCmd::RefreshDashboard).await?,
        Screen::History => load_history(app).await?,
        Screen::Admin => load_admin_tab(app).await?,
        Screen::Settings => app.settings = SettingsForm::from_config(&app.cfg),
        Screen::Setup | Screen::Upload | Screen::Job => {}
    }
    Ok(())
}

/// ジョブ画面を開いてポーリングを始める。
pub async fn open_job(
    app: &mut App,
    job_id: String,
    known: Option<crate::models::Job>,
    return_to: Screen,
) -> Result<()> {
    tracing::info!("open job {job_id}");
    app.job.open(job_id.clone(), known, return_to);
    app.ui.screen = Screen::Job;
    app.send(WorkerCmd::WatchJob(job_id)).await
}

/// ジョブ画面を閉じてポーリングを止める。
async fn close_job(app: &mut App) -> Result<()> {
    app.job.close();
    app.send(WorkerCmd::UnwatchJob).await
}

/// 履歴の現在ページを取得する。
pub async fn load_history(app: &mut App) -> Result<()> {
    let query = app.history_filter.apply(ListQuery::new(
        app.history.current,
        app.cfg.lists.history_page_size,
    ));
    app.history.loading = true;
    app.send(WorkerCmd::LoadHistory(query)).await
}

/// 管理画面の現在タブのデータを取得する。
pub async fn load_admin_tab(app: &mut App) -> Result<()> {
    let size = app.cfg.lists.admin_page_size;
    let cmd = match app.admin.tab {
        AdminTab::Stats => WorkerCmd::LoadStats,
        AdminTab::Codes => {
            app.admin.codes.loading = true;
            WorkerCmd::LoadCodes(
                app.admin
                    .code_filter
                    .apply(ListQuery::new(app.admin.codes.current, size)),
            )
        }
        AdminTab::Users => {
            app.admin.users.loading = true;
            WorkerCmd::LoadUsers(
                app.admin
                    .user_filter
                    .apply(ListQuery::new(app.admin.users.current, size)),
            )
        }
        AdminTab::Jobs => {
            app.admin.jobs.loading = true;
            WorkerCmd::LoadAdminJobs(
                app.admin
                    .job_filter
                    .apply(ListQuery::new(app.admin.jobs.current, size)),
            )
        }
    };
    app.send(cmd).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::state::GenerateForm;
    use crate::{
        models::{Job, JobStatus, RedemptionCode},
        poller::PollUpdate,
    };
    use chrono::Utc;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::{Terminal, backend::TestBackend};

    fn test_app() -> (App, mpsc::Receiver<WorkerCmd>, mpsc::Sender<WorkerEvent>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(64);
        let (ev_tx, ev_rx) = mpsc::channel(64);
        let app = App::new(
            PathBuf::from("unused-config.toml"),
            Config::default(),
            Shortcuts::default(),
            cmd_tx,
            ev_rx,
            true,
        );
        (app, cmd_rx, ev_tx)
    }

    fn job(status: &str, output_url: Option<&str>) -> Job {
        serde_json::from_value(serde_json::json!({
            "id": "job-1",
            "status": status,
            "output_url": output_url,
            "quality": "lama",
            "created_at": Utc::now().to_rfc3339(),
        }))
        .unwrap()
    }

    fn snapshot_at(j: Job, generation: u64) -> WorkerEvent {
        WorkerEvent::Poll(PollUpdate {
            job_id: j.id.clone(),
            generation,
            event: PollEvent::Snapshot(j),
        })
    }

    fn snapshot(j: Job) -> WorkerEvent {
        use std::sync::atomic::{AtomicU64, Ordering};
        static NEXT: AtomicU64 = AtomicU64::new(1);
        snapshot_at(j, NEXT.fetch_add(1, Ordering::SeqCst))
    }

    fn render(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        let buf = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buf.area.height {
            for x in 0..buf.area.width {
                out.push_str(buf[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    fn key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::empty())
    }

    #[tokio::test]
    async fn test_pending_job_renders_floor_progress() {
        let (mut app, mut cmd_rx, _ev) = test_app();
        open_job(&mut app, "job-1".into(), None, Screen::Dashboard)
            .await
            .unwrap();
        assert!(matches!(cmd_rx.recv().await, Some(WorkerCmd::WatchJob(id)) if id == "job-1"));
        assert!(app.job.is_loading());

        handle_worker_event(&mut app, snapshot(job("pending", None)))
            .await
            .unwrap();
        let screen = render(&app);
        assert!(screen.contains("5%"), "{screen}");
        assert!(screen.contains("Queued"));
        assert!(!screen.contains("Download ready"));
    }

    #[tokio::test]
    async fn test_completed_snapshot_shows_download() {
        let (mut app, _cmd_rx, _ev) = test_app();
        open_job(&mut app, "job-1".into(), None, Screen::History)
            .await
            .unwrap();

        handle_worker_event(&mut app, snapshot(job("processing", None)))
            .await
            .unwrap();
        assert!(!render(&app).contains("100%"));

        handle_worker_event(
            &mut app,
            snapshot(job("completed", Some("https://cdn.example/out.mp4"))),
        )
        .await
        .unwrap();
        let screen = render(&app);
        assert!(screen.contains("100%"), "{screen}");
        assert!(screen.contains("Download ready"));
        assert!(screen.contains("https://cdn.example/out.mp4"));
    }

    #[tokio::test]
    async fn test_not_found_is_persistent_panel() {
        let (mut app, _cmd_rx, _ev) = test_app();
        open_job(&mut app, "job-1".into(), None, Screen::Dashboard)
            .await
            .unwrap();
        handle_worker_event(
            &mut app,
            WorkerEvent::Poll(PollUpdate {
                job_id: "job-1".into(),
                generation: 1,
                event: PollEvent::NotFound,
            }),
        )
        .await
        .unwrap();

        assert!(app.job.not_found);
        assert!(!app.job.is_loading());
        let screen = render(&app);
        assert!(screen.contains("Job not found"));
        assert!(!screen.contains("Loading job"));

        // トーストが消えても表示は残る。
        app.ui.expire_toast(Instant::now() + Duration::from_secs(60));
        assert!(render(&app).contains("Job not found"));
    }

    #[tokio::test]
    async fn test_results_for_closed_job_are_ignored() {
        let (mut app, mut cmd_rx, _ev) = test_app();
        open_job(&mut app, "job-1".into(), None, Screen::Dashboard)
            .await
            .unwrap();
        go_to(&mut app, Screen::Dashboard).await.unwrap();
        let _ = cmd_rx.recv().await;
        assert!(matches!(cmd_rx.recv().await, Some(WorkerCmd::UnwatchJob)));

        handle_worker_event(&mut app, snapshot(job("completed", None)))
            .await
            .unwrap();
        assert!(app.job.job.is_none());
    }

    #[tokio::test]
    async fn test_generated_codes_modal_enables_exports() {
        let (mut app, mut cmd_rx, _ev) = test_app();
        app.ui.screen = Screen::Admin;
        app.admin.tab = AdminTab::Codes;
        app.admin.generate = Some(GenerateForm::from_defaults(&app.cfg.codes));

        // count=5, credits=10 で生成を依頼する。
        if let Some(form) = app.admin.generate.as_mut() {
            form.count = 5;
        }
        handle_key(&mut app, KeyEvent::new(KeyCode::Enter, KeyModifiers::empty()))
            .await
            .unwrap();
        match cmd_rx.recv().await {
            Some(WorkerCmd::GenerateCodes(req)) => {
                assert_eq!((req.count, req.credits, req.prefix.as_str()), (5, 10, "TB-"));
            }
            other => panic!("unexpected {other:?}"),
        }

        let codes: Vec<RedemptionCode> = (0..5)
            .map(|i| RedemptionCode {
                code: format!("TB-CODE000{i}"),
                credits: 10,
                created_at: Utc::now(),
                redeemed_by: None,
                redeemed_at: None,
            })
            .collect();
        handle_worker_event(&mut app, WorkerEvent::CodesGenerated(codes))
            .await
            .unwrap();
        // 一覧の再読み込みも依頼される。
        assert!(matches!(cmd_rx.recv().await, Some(WorkerCmd::LoadCodes(_))));

        let form = app.admin.generate.as_ref().unwrap();
        assert_eq!(form.result.as_ref().map(Vec::len), Some(5));
        assert!(form.can_export());

        let screen = render(&app);
        for i in 0..5 {
            assert!(screen.contains(&format!("TB-CODE000{i}")), "{screen}");
        }
        assert!(screen.contains("copy all"));
        assert!(screen.contains("download CSV"));

        handle_key(&mut app, key('w')).await.unwrap();
        match cmd_rx.recv().await {
            Some(WorkerCmd::WriteExport {
                file_name,
                contents,
            }) => {
                assert!(file_name.starts_with("TB_10credits_x5_"));
                assert!(file_name.ends_with(".csv"));
                assert_eq!(contents.lines().count(), 5);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_error_keeps_previous_state() {
        let (mut app, _cmd_rx, _ev) = test_app();
        app.dashboard.balance = Some(42);
        app.upload.busy = true;
        handle_worker_event(&mut app, WorkerEvent::Error("Insufficient credits".into()))
            .await
            .unwrap();
        assert_eq!(app.dashboard.balance, Some(42));
        assert!(!app.upload.busy);
        assert_eq!(
            app.ui.toast.as_ref().map(|t| t.message.as_str()),
            Some("Insufficient credits")
        );
    }

    #[tokio::test]
    async fn test_history_filter_resets_page_and_queries() {
        let (mut app, mut cmd_rx, _ev) = test_app();
        app.ui.screen = Screen::History;
        app.history.current = 3;
        handle_key(&mut app, key('f')).await.unwrap();
        assert_eq!(app.history.current, 1);
        match cmd_rx.recv().await {
            Some(WorkerCmd::LoadHistory(q)) => {
                let pairs = q.to_pairs();
                assert!(pairs.contains(&("status", JobStatus::Completed.as_str().to_string())));
                assert!(pairs.contains(&("page_size", "15".to_string())));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_starts_in_setup_when_signed_out() {
        let (cmd_tx, _cmd_rx) = mpsc::channel(1);
        let (_ev_tx, ev_rx) = mpsc::channel(1);
        let app = App::new(
            PathBuf::from("x.toml"),
            Config::default(),
            Shortcuts::default(),
            cmd_tx,
            ev_rx,
            false,
        );
        assert_eq!(app.ui.screen, Screen::Setup);
        assert!(render(&app).contains("Step 1/4"));
    }

    #[tokio::test]
    async fn test_older_generation_never_overwrites_newer() {
        let (mut app, _cmd_rx, _ev) = test_app();
        open_job(&mut app, "job-1".into(), None, Screen::Dashboard)
            .await
            .unwrap();

        // 世代2が世代1より先にチャネルへ届いた場合。
        handle_worker_event(&mut app, snapshot_at(job("completed", None), 2))
            .await
            .unwrap();
        handle_worker_event(&mut app, snapshot_at(job("processing", None), 1))
            .await
            .unwrap();
        assert_eq!(
            app.job.job.as_ref().map(|j| j.status),
            Some(JobStatus::Completed)
        );
        assert!(render(&app).contains("100%"));
    }

    #[tokio::test]
    async fn test_unfiltered_history_response_is_filtered_locally() {
        let (mut app, _cmd_rx, _ev) = test_app();
        app.ui.screen = Screen::History;
        app.history_filter = crate::pagination::JobFilter::Only(JobStatus::Completed);

        // ページング無しの配列はサーバー側で絞り込まれていない。
        let page: crate::models::Page<Job> = serde_json::from_value(serde_json::json!([
            {"id": "a", "status": "completed", "created_at": "2025-01-01T00:00:00"},
            {"id": "b", "status": "failed", "created_at": "2025-01-01T00:00:00"},
            {"id": "c", "status": "pending", "created_at": "2025-01-01T00:00:00"},
        ]))
        .unwrap();
        handle_worker_event(&mut app, WorkerEvent::History(page))
            .await
            .unwrap();

        let ids: Vec<&str> = app.history.page.items.iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, ["a"]);
        assert_eq!(app.history.page.total, 1);
        assert!(render(&app).contains("Filter: completed"));
    }

    #[tokio::test]
    async fn test_generate_modal_follows_keymap() {
        let (mut app, _cmd_rx, _ev) = test_app();
        app.shortcuts.generate.copy_all = vec!["Y".into()];
        app.shortcuts.generate.download_csv = vec!["F2".into()];
        app.ui.screen = Screen::Admin;
        let mut form = GenerateForm::from_defaults(&app.cfg.codes);
        form.result = Some(vec![RedemptionCode {
            code: "TB-ONLYONE1".into(),
            credits: 10,
            created_at: Utc::now(),
            redeemed_by: None,
            redeemed_at: None,
        }]);
        app.admin.generate = Some(form);

        let screen = render(&app);
        assert!(screen.contains("[Y] copy all"), "{screen}");
        assert!(screen.contains("[F2] download CSV"));
    }

    #[tokio::test]
    async fn test_log_is_capped() {
        let (mut app, _cmd_rx, _ev) = test_app();
        for i in 0..250 {
            handle_worker_event(&mut app, WorkerEvent::Log(format!("line {i}")))
                .await
                .unwrap();
        }
        assert_eq!(app.ui.log.len(), crate::events::LOG_CAP);
        assert_eq!(app.ui.log.last().map(String::as_str), Some("line 249"));
    }
}
