//! キー入力ハンドラー関数。

use anyhow::Result;
use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::path::PathBuf;

use crate::{
    api::jobs::is_video_file,
    events::{AdminTab, Screen},
    export,
    input::{InputBoxState, InputCallbackId},
    models::CreditPack,
    pagination::RoleFilter,
    shortcuts::{ListShortcuts, matches_shortcut},
    ui,
    wizard::WizardStep,
    worker::WorkerCmd,
};

use super::{App, go_to, load_admin_tab, load_history, open_job, state::GenerateForm};

/// キー入力を1件処理し、終了すべきならtrueを返す。
pub async fn handle_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    // 入力ボックスが開いていれば最優先で処理する。
    if app.input_box.is_some() {
        return handle_input_box_key(app, k).await;
    }
    // 次にコード生成モーダル。
    if app.ui.screen == Screen::Admin && app.admin.generate.is_some() {
        handle_generate_key(app, k).await?;
        return Ok(false);
    }
    if app.ui.screen == Screen::Setup {
        handle_wizard_key(app, k).await?;
        return Ok(false);
    }

    // 画面切り替えはどの画面からでも使える。
    let g = &app.shortcuts.global;
    let target = if matches_shortcut(&k, &g.quit) {
        return Ok(true);
    } else if matches_shortcut(&k, &g.dashboard) {
        Some(Screen::Dashboard)
    } else if matches_shortcut(&k, &g.upload) {
        Some(Screen::Upload)
    } else if matches_shortcut(&k, &g.history) {
        Some(Screen::History)
    } else if matches_shortcut(&k, &g.pricing) {
        Some(Screen::Pricing)
    } else if matches_shortcut(&k, &g.admin) {
        Some(Screen::Admin)
    } else if matches_shortcut(&k, &g.settings) {
        Some(Screen::Settings)
    } else {
        None
    };
    if let Some(screen) = target {
        go_to(app, screen).await?;
        return Ok(false);
    }

    match app.ui.screen {
        Screen::Dashboard => handle_dashboard_key(app, k).await?,
        Screen::Upload => handle_upload_key(app, k).await?,
        Screen::Job => handle_job_key(app, k).await?,
        Screen::History => handle_history_key(app, k).await?,
        Screen::Pricing => handle_pricing_key(app, k).await?,
        Screen::Admin => handle_admin_key(app, k).await?,
        Screen::Settings => handle_settings_key(app, k).await?,
        Screen::Setup => {}
    }
    Ok(false)
}

/// Ctrl+Cかどうかを判定する。
pub fn is_ctrl_c(k: &KeyEvent) -> bool {
    k.modifiers.contains(KeyModifiers::CONTROL) && k.code == KeyCode::Char('c')
}

/// 貼り付けは入力ボックスが開いているときだけ受け付ける。
pub fn handle_paste(app: &mut App, text: &str) {
    if let Some(input) = app.input_box.as_mut() {
        input.insert_str(text);
    }
}

/// ダッシュボードのキー処理。
async fn handle_dashboard_key(app: &mut App, k: KeyEvent) -> Result<()> {
    let sc = &app.shortcuts.list;
    if matches_shortcut(&k, &sc.refresh) {
        app.worker_tx.send(WorkerCmd::RefreshDashboard).await?;
        app.ui.status = "Refreshing...".into();
    } else if matches_shortcut(&k, &sc.down) {
        if app.dashboard.selected + 1 < app.dashboard.jobs.len() {
            app.dashboard.selected += 1;
        }
    } else if matches_shortcut(&k, &sc.up) {
        app.dashboard.selected = app.dashboard.selected.saturating_sub(1);
    } else if matches_shortcut(&k, &sc.open)
        && let Some(job) = app.dashboard.jobs.get(app.dashboard.selected).cloned()
    {
        open_job(app, job.id.clone(), Some(job), Screen::Dashboard).await?;
    }
    Ok(())
}

/// アップロード画面のキー処理。
async fn handle_upload_key(app: &mut App, k: KeyEvent) -> Result<()> {
    let sc = &app.shortcuts.upload;
    if matches_shortcut(&k, &sc.choose_file) {
        let state = InputBoxState::new(
            "Video file path:",
            app.upload.path.clone(),
            InputCallbackId::UploadPath,
        );
        app.prompt(state);
    } else if matches_shortcut(&k, &sc.toggle_quality) {
        app.upload.quality = app.upload.quality.toggled();
    } else if matches_shortcut(&k, &sc.submit) {
        if app.upload.busy {
            return Ok(());
        }
        let path = PathBuf::from(app.upload.path.trim());
        if app.upload.path.trim().is_empty() {
            app.ui.toast_error("Choose a video file first");
        } else if !is_video_file(&path) {
            app.ui.toast_error("Please upload a video file");
        } else if !path.is_file() {
            app.ui.toast_error(format!("File not found: {}", path.display()));
        } else {
            app.upload.busy = true;
            app.ui.status = "Uploading...".into();
            app.worker_tx
                .send(WorkerCmd::SubmitVideo {
                    path,
                    quality: app.upload.quality.clone(),
                })
                .await?;
        }
    }
    Ok(())
}

/// ジョブ画面のキー処理。
async fn handle_job_key(app: &mut App, k: KeyEvent) -> Result<()> {
    let sc = &app.shortcuts.job;
    if matches_shortcut(&k, &sc.back) {
        let back = app.job.return_to;
        go_to(app, back).await?;
    } else if matches_shortcut(&k, &sc.download) {
        // 完了済みで出力URLがある場合のみ開ける。
        let url = app
            .job
            .job
            .as_ref()
            .and_then(|j| j.download_url())
            .map(str::to_string);
        match url {
            Some(url) => {
                app.worker_tx.send(WorkerCmd::OpenUrl(url)).await?;
                app.ui.toast_success("Opening download in your browser");
            }
            None => app.ui.toast_error("Output is not ready yet"),
        }
    }
    Ok(())
}

/// 履歴画面のキー処理。
async fn handle_history_key(app: &mut App, k: KeyEvent) -> Result<()> {
    let sc = &app.shortcuts.list;
    if matches_shortcut(&k, &app.shortcuts.history.filter) {
        app.history_filter = app.history_filter.next();
        app.history.reset();
        load_history(app).await?;
    } else if matches_shortcut(&k, &sc.refresh) {
        load_history(app).await?;
    } else if matches_shortcut(&k, &sc.next_page) {
        if app.history.next_page() {
            load_history(app).await?;
        }
    } else if matches_shortcut(&k, &sc.prev_page) {
        if app.history.prev_page() {
            load_history(app).await?;
        }
    } else if matches_shortcut(&k, &sc.down) {
        app.history.select_next();
    } else if matches_shortcut(&k, &sc.up) {
        app.history.select_prev();
    } else if matches_shortcut(&k, &sc.open)
        && let Some(job) = app.history.selected_item().cloned()
    {
        open_job(app, job.id.clone(), Some(job), Screen::History).await?;
    }
    Ok(())
}

/// 料金画面のキー処理。
async fn handle_pricing_key(app: &mut App, k: KeyEvent) -> Result<()> {
    let list = &app.shortcuts.list;
    let sc = &app.shortcuts.pricing;
    if matches_shortcut(&k, &list.down) {
        app.pricing.selected = (app.pricing.selected + 1).min(CreditPack::ALL.len() - 1);
    } else if matches_shortcut(&k, &list.up) {
        app.pricing.selected = app.pricing.selected.saturating_sub(1);
    } else if matches_shortcut(&k, &sc.buy) {
        if app.pricing.busy {
            return Ok(());
        }
        let pack = CreditPack::ALL[app.pricing.selected.min(CreditPack::ALL.len() - 1)];
        app.pricing.busy = true;
        app.worker_tx.send(WorkerCmd::Checkout(pack)).await?;
    } else if matches_shortcut(&k, &sc.redeem) {
        app.prompt(InputBoxState::new(
            "Redemption code:",
            "",
            InputCallbackId::RedeemCode,
        ));
    }
    Ok(())
}

/// 管理画面のキー処理。
async fn handle_admin_key(app: &mut App, k: KeyEvent) -> Result<()> {
    let list = app.shortcuts.list.clone();
    let sc = app.shortcuts.admin.clone();

    if matches_shortcut(&k, &sc.next_tab) {
        app.admin.tab = app.admin.tab.next();
        load_admin_tab(app).await?;
        return Ok(());
    }
    if matches_shortcut(&k, &list.refresh) {
        load_admin_tab(app).await?;
        return Ok(());
    }

    match app.admin.tab {
        AdminTab::Stats => {}
        AdminTab::Codes => {
            if matches_shortcut(&k, &sc.filter) {
                app.admin.code_filter.state = app.admin.code_filter.state.next();
                app.admin.codes.reset();
                load_admin_tab(app).await?;
            } else if matches_shortcut(&k, &sc.credits_filter) {
                app.admin.code_filter.credits = app.admin.code_filter.next_credits();
                app.admin.codes.reset();
                load_admin_tab(app).await?;
            } else if matches_shortcut(&k, &sc.search) {
                app.prompt(InputBoxState::new(
                    "Search codes (empty clears):",
                    app.admin.code_filter.search.clone(),
                    InputCallbackId::CodeSearch,
                ));
            } else if matches_shortcut(&k, &sc.generate) {
                app.admin.generate = Some(GenerateForm::from_defaults(&app.cfg.codes));
            } else if matches_shortcut(&k, &sc.export) {
                app.worker_tx.send(WorkerCmd::ExportUnredeemed).await?;
                app.ui.status = "Exporting unredeemed codes...".into();
            } else {
                page_keys(app, &k, &list, AdminTab::Codes).await?;
            }
        }
        AdminTab::Users => {
            if matches_shortcut(&k, &sc.filter) {
                app.admin.user_filter.role = app.admin.user_filter.role.next();
                app.admin.users.reset();
                load_admin_tab(app).await?;
            } else if matches_shortcut(&k, &sc.search) {
                app.prompt(InputBoxState::new(
                    "Search by email (empty clears):",
                    app.admin.user_filter.search.clone(),
                    InputCallbackId::UserSearch,
                ));
            } else if matches_shortcut(&k, &sc.adjust_credits) {
                if let Some(user) = app.admin.users.selected_item() {
                    let prompt = format!(
                        "Credit change for {} (now {}), e.g. +10 or -5:",
                        user.email, user.credits
                    );
                    let callback_id = InputCallbackId::AdjustCredits {
                        user_id: user.id.clone(),
                        current: user.credits,
                    };
                    app.prompt(InputBoxState::new(prompt, "", callback_id));
                }
            } else {
                page_keys(app, &k, &list, AdminTab::Users).await?;
            }
        }
        AdminTab::Jobs => {
            if matches_shortcut(&k, &sc.filter) {
                app.admin.job_filter = app.admin.job_filter.next();
                app.admin.jobs.reset();
                load_admin_tab(app).await?;
            } else {
                page_keys(app, &k, &list, AdminTab::Jobs).await?;
            }
        }
    }
    Ok(())
}

/// 管理画面一覧の選択とページ移動。
async fn page_keys(
    app: &mut App,
    k: &KeyEvent,
    list: &ListShortcuts,
    tab: AdminTab,
) -> Result<()> {
    macro_rules! paged {
        ($view:expr) => {{
            let view = $view;
            if matches_shortcut(k, &list.down) {
                view.select_next();
                false
            } else if matches_shortcut(k, &list.up) {
                view.select_prev();
                false
            } else if matches_shortcut(k, &list.next_page) {
                view.next_page()
            } else if matches_shortcut(k, &list.prev_page) {
                view.prev_page()
            } else {
                false
            }
        }};
    }
    let reload = match tab {
        AdminTab::Codes => paged!(&mut app.admin.codes),
        AdminTab::Users => paged!(&mut app.admin.users),
        AdminTab::Jobs => paged!(&mut app.admin.jobs),
        AdminTab::Stats => false,
    };
    if reload {
        load_admin_tab(app).await?;
    }
    Ok(())
}

/// コード生成モーダルのキー処理。
async fn handle_generate_key(app: &mut App, k: KeyEvent) -> Result<()> {
    let sc = app.shortcuts.generate.clone();
    let Some(form) = app.admin.generate.as_mut() else {
        return Ok(());
    };

    if matches_shortcut(&k, &sc.close) {
        app.admin.generate = None;
    } else if matches_shortcut(&k, &sc.submit) {
        if form.busy {
            return Ok(());
        }
        form.busy = true;
        form.result = None;
        let req = form.request();
        tracing::info!("generate {} codes x {} credits", req.count, req.credits);
        app.worker_tx.send(WorkerCmd::GenerateCodes(req)).await?;
    } else if matches_shortcut(&k, &sc.credits) {
        form.cycle_credits();
    } else if matches_shortcut(&k, &sc.count) {
        let state = InputBoxState::new(
            "Number of codes (1-100):",
            form.count.to_string(),
            InputCallbackId::GenerateCount,
        );
        app.prompt(state);
    } else if matches_shortcut(&k, &sc.prefix) {
        let state = InputBoxState::new(
            "Code prefix:",
            form.prefix.clone(),
            InputCallbackId::GeneratePrefix,
        );
        app.prompt(state);
    } else if matches_shortcut(&k, &sc.copy_all) {
        let Some(lines) = form.export_lines() else {
            return Ok(());
        };
        match ui::copy_to_clipboard(&lines) {
            Ok(()) => app.ui.toast_success("All codes copied!"),
            Err(e) => {
                tracing::warn!("clipboard copy failed: {e}");
                app.ui.toast_error("Clipboard is not available");
            }
        }
    } else if matches_shortcut(&k, &sc.download_csv) {
        let Some(contents) = form.export_lines() else {
            return Ok(());
        };
        let codes = form.result.as_deref().unwrap_or(&[]);
        let credits = codes.first().map(|c| c.credits).unwrap_or(form.credits);
        let file_name = export::batch_file_name(&form.prefix, credits, codes.len(), Utc::now());
        app.worker_tx
            .send(WorkerCmd::WriteExport {
                file_name,
                contents,
            })
            .await?;
    }
    Ok(())
}

/// 設定画面のキー処理。
async fn handle_settings_key(app: &mut App, k: KeyEvent) -> Result<()> {
    let sc = app.shortcuts.settings.clone();

    if matches_shortcut(&k, &sc.cancel) {
        // 変更を破棄してダッシュボードへ戻る。
        go_to(app, Screen::Dashboard).await?;
    } else if matches_shortcut(&k, &sc.save) {
        app.settings.apply(&mut app.cfg);
        app.cfg.save(&app.cfg_path)?;
        app.worker_tx
            .send(WorkerCmd::SaveSettings(app.cfg.clone()))
            .await?;
        app.ui.toast_success("Saved settings");
        go_to(app, Screen::Dashboard).await?;
    } else if matches_shortcut(&k, &sc.api_url) {
        let state = InputBoxState::new(
            "API base URL:",
            app.settings.api_url.clone(),
            InputCallbackId::SettingsApiUrl,
        );
        app.prompt(state);
    } else if matches_shortcut(&k, &sc.sign_in_url) {
        let state = InputBoxState::new(
            "Sign-in page URL:",
            app.settings.sign_in_url.clone(),
            InputCallbackId::SettingsSignInUrl,
        );
        app.prompt(state);
    } else if matches_shortcut(&k, &sc.poll_interval) {
        let state = InputBoxState::new(
            "Poll interval (ms):",
            app.settings.poll_interval_ms.to_string(),
            InputCallbackId::SettingsPollInterval,
        );
        app.prompt(state);
    } else if matches_shortcut(&k, &sc.stop_when_finished) {
        app.settings.stop_when_finished = !app.settings.stop_when_finished;
    } else if matches_shortcut(&k, &sc.sign_in) {
        app.worker_tx
            .send(WorkerCmd::OpenUrl(app.cfg.api.sign_in_url.clone()))
            .await?;
        app.prompt(
            InputBoxState::new("Paste access token:", "", InputCallbackId::SettingsToken).masked(),
        );
    } else if matches_shortcut(&k, &sc.sign_out) {
        app.worker_tx.send(WorkerCmd::SignOut).await?;
    }
    Ok(())
}

/// 初期設定ウィザード画面のキー処理。
async fn handle_wizard_key(app: &mut App, k: KeyEvent) -> Result<()> {
    let sc = app.shortcuts.wizard.clone();

    if matches_shortcut(&k, &sc.proceed) {
        match app.wizard_state.current_step {
            WizardStep::Welcome => app.wizard_state.next_step(),
            WizardStep::ApiUrl => {
                let state = InputBoxState::new(
                    "API base URL:",
                    app.wizard_state.api_url.clone(),
                    InputCallbackId::WizardApiUrl,
                );
                app.prompt(state);
            }
            WizardStep::SignIn => {
                // ブラウザが開けなくてもトークン入力は続けられる。
                app.worker_tx
                    .send(WorkerCmd::OpenUrl(app.cfg.api.sign_in_url.clone()))
                    .await?;
                app.prompt(
                    InputBoxState::new("Paste access token:", "", InputCallbackId::WizardToken)
                        .masked(),
                );
            }
            WizardStep::Complete => finish_wizard(app).await?,
        }
    } else if matches_shortcut(&k, &sc.skip) {
        app.wizard_state.next_step();
    }
    Ok(())
}

/// ウィザードの内容を保存してダッシュボードへ移る。
async fn finish_wizard(app: &mut App) -> Result<()> {
    if app.wizard_state.api_url.trim().is_empty() {
        app.ui.error = Some("API URL is required.".into());
        app.wizard_state.current_step = WizardStep::ApiUrl;
        return Ok(());
    }

    app.cfg.api.base_url = app
        .wizard_state
        .api_url
        .trim()
        .trim_end_matches('/')
        .to_string();
    app.cfg.save(&app.cfg_path)?;
    app.worker_tx
        .send(WorkerCmd::SaveSettings(app.cfg.clone()))
        .await?;
    if let Some(token) = app.wizard_state.token.take() {
        app.worker_tx.send(WorkerCmd::SignIn(token)).await?;
    }

    app.ui.status = "Setup complete!".into();
    go_to(app, Screen::Dashboard).await
}

/// 入力ボックスのキー処理。
async fn handle_input_box_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    let Some(input_state) = &mut app.input_box else {
        return Ok(false);
    };
    let sc = &app.shortcuts.input_box;

    if is_ctrl_c(&k) {
        return Ok(true);
    }

    if matches_shortcut(&k, &sc.confirm) {
        // 入力ボックスを閉じる前に値とコールバック種別を保存する。
        let value = input_state.value.clone();
        let callback_id = input_state.callback_id.clone();
        app.input_box = None;
        apply_input_callback(app, callback_id, value).await?;
    } else if matches_shortcut(&k, &sc.cancel) {
        app.input_box = None;
    } else if matches_shortcut(&k, &sc.backspace) {
        input_state.backspace();
    } else if matches_shortcut(&k, &sc.delete) {
        input_state.delete();
    } else if matches_shortcut(&k, &sc.left) {
        input_state.move_left();
    } else if matches_shortcut(&k, &sc.right) {
        input_state.move_right();
    } else if matches_shortcut(&k, &sc.home) {
        input_state.move_home();
    } else if matches_shortcut(&k, &sc.end) {
        input_state.move_end();
    } else if matches_shortcut(&k, &sc.clear_line) {
        input_state.clear_line();
    } else if let KeyCode::Char(c) = k.code
        && !k.modifiers.contains(KeyModifiers::CONTROL)
    {
        input_state.insert_char(c);
    }

    Ok(false)
}

/// 入力ボックスのコールバックを適用する。
async fn apply_input_callback(
    app: &mut App,
    callback_id: InputCallbackId,
    value: String,
) -> Result<()> {
    let trimmed = value.trim().to_string();
    match callback_id {
        InputCallbackId::SettingsApiUrl => app.settings.api_url = trimmed,
        InputCallbackId::SettingsSignInUrl => app.settings.sign_in_url = trimmed,
        InputCallbackId::SettingsPollInterval => match trimmed.parse::<u64>() {
            Ok(ms) if ms > 0 => app.settings.poll_interval_ms = ms,
            _ => app.ui.toast_error("Poll interval must be a positive number of milliseconds"),
        },
        InputCallbackId::SettingsToken => {
            if !trimmed.is_empty() {
                app.worker_tx.send(WorkerCmd::SignIn(trimmed)).await?;
            }
        }
        InputCallbackId::WizardApiUrl => {
            if trimmed.is_empty() {
                app.ui.error = Some("API URL is required.".into());
            } else {
                app.ui.error = None;
                app.wizard_state.api_url = trimmed;
                app.wizard_state.next_step();
            }
        }
        InputCallbackId::WizardToken => {
            app.wizard_state.token = (!trimmed.is_empty()).then_some(trimmed);
            app.wizard_state.next_step();
        }
        InputCallbackId::UploadPath => app.upload.path = trimmed,
        InputCallbackId::RedeemCode => {
            if trimmed.is_empty() {
                app.ui.toast_error("Enter a code to redeem");
            } else {
                app.worker_tx.send(WorkerCmd::Redeem(trimmed)).await?;
            }
        }
        InputCallbackId::CodeSearch => {
            app.admin.code_filter.search = trimmed;
            app.admin.codes.reset();
            load_admin_tab(app).await?;
        }
        InputCallbackId::UserSearch => {
            app.admin.user_filter.search = trimmed;
            if app.admin.user_filter.search.is_empty() {
                app.admin.user_filter.role = RoleFilter::All;
            }
            app.admin.users.reset();
            load_admin_tab(app).await?;
        }
        InputCallbackId::GenerateCount => match trimmed.parse::<u32>() {
            Ok(n) if (1..=crate::api::admin::MAX_GENERATE).contains(&n) => {
                if let Some(form) = app.admin.generate.as_mut() {
                    form.count = n;
                }
            }
            _ => app.ui.toast_error("Count must be between 1 and 100"),
        },
        InputCallbackId::GeneratePrefix => {
            if let Some(form) = app.admin.generate.as_mut() {
                form.prefix = trimmed;
            }
        }
        InputCallbackId::AdjustCredits { user_id, current } => {
            match trimmed.trim_start_matches('+').parse::<i64>() {
                Ok(0) => {}
                Ok(delta) => {
                    app.worker_tx
                        .send(WorkerCmd::AdjustCredits {
                            user_id,
                            current,
                            delta,
                        })
                        .await?;
                }
                Err(_) => app.ui.toast_error("Enter a whole number such as +10 or -5"),
            }
        }
    }
    Ok(())
}
