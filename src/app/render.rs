//! TUI描画関連の関数。

use chrono::{DateTime, Local, Utc};
use ratatui::{
    Frame,
    prelude::*,
    widgets::{Block, Borders, Clear, Gauge, Paragraph, Row, Table, TableState, Tabs, Wrap},
};

use crate::{
    events::{AdminTab, Screen, ToastKind},
    input::{self, centered_popup},
    layout,
    models::{CreditPack, Job, JobStatus},
    pagination::format_strip,
    progress,
    shortcuts::{Shortcuts, format_keys},
};

use super::{App, state::ListView};

/// タブに並べる画面（ウィザードとジョブ詳細は除く）。
const TAB_SCREENS: [Screen; 6] = [
    Screen::Dashboard,
    Screen::Upload,
    Screen::History,
    Screen::Pricing,
    Screen::Admin,
    Screen::Settings,
];

/// 画面全体のレイアウトを描画する。
pub fn draw(f: &mut Frame, app: &App) {
    // ウィザード画面は専用描画で処理する。
    if app.ui.screen == Screen::Setup {
        draw_wizard_screen(f, app);
        if let Some(input_state) = &app.input_box {
            input::render_input_box(f, input_state);
        }
        return;
    }

    let main_layout = layout::create_main_layout(f.area());
    draw_tabs(f, app, main_layout.tabs);

    match app.ui.screen {
        Screen::Dashboard => draw_dashboard(f, app, main_layout.body),
        Screen::Upload => draw_upload(f, app, main_layout.body),
        Screen::Job => draw_job(f, app, main_layout.body),
        Screen::History => draw_history(f, app, main_layout.body),
        Screen::Pricing => draw_pricing(f, app, main_layout.body),
        Screen::Admin => draw_admin(f, app, main_layout.body),
        Screen::Settings => draw_settings(f, app, main_layout.body),
        Screen::Setup => {}
    }

    // HELPバー（画面ごとのショートカット）を描画する。
    let help_text = get_help_text(app, &app.shortcuts);
    let help_bar = Paragraph::new(help_text)
        .block(Block::default().borders(Borders::ALL).title("HELP"))
        .wrap(Wrap { trim: true });
    f.render_widget(help_bar, main_layout.help_bar);

    f.render_widget(build_status_bar(app), main_layout.status_bar);

    // モーダル、トースト、入力ボックスの順に重ねる。
    if app.ui.screen == Screen::Admin && app.admin.generate.is_some() {
        draw_generate_modal(f, app);
    }
    draw_toast(f, app);
    if let Some(input_state) = &app.input_box {
        input::render_input_box(f, input_state);
    }
}

/// 画面タブを描画する。
fn draw_tabs(f: &mut Frame, app: &App, area: Rect) {
    let selected = TAB_SCREENS.iter().position(|s| *s == app.ui.screen);
    let titles: Vec<String> = TAB_SCREENS
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{} {}", i + 1, s.name()))
        .collect();
    let tabs = Tabs::new(titles)
        .select(selected)
        .highlight_style(
            Style::default()
                .fg(Color::Rgb(255, 140, 0))
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(tabs, area);
}

/// 一覧テーブルの共通スタイル。
fn styled_table<'a>(
    rows: Vec<Row<'a>>,
    widths: Vec<Constraint>,
    header: Vec<&'a str>,
    title: String,
) -> Table<'a> {
    Table::new(rows, widths)
        .block(Block::default().borders(Borders::ALL).title(title))
        .header(Row::new(header).bold())
        .row_highlight_style(
            Style::default()
                .bg(Color::Rgb(255, 140, 0)) // オレンジ色の背景
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
}

fn job_row(j: &Job) -> Row<'static> {
    Row::new(vec![
        j.short_id().to_string(),
        j.status.label().to_string(),
        j.quality
            .as_ref()
            .map(|q| q.as_str().to_string())
            .unwrap_or_else(|| "-".into()),
        j.cost.map(|c| c.to_string()).unwrap_or_else(|| "-".into()),
        local_time(j.created_at),
    ])
}

fn job_widths() -> Vec<Constraint> {
    vec![
        Constraint::Length(10),
        Constraint::Length(12),
        Constraint::Length(11),
        Constraint::Length(6),
        Constraint::Min(16),
    ]
}

const JOB_HEADER: [&str; 5] = ["id", "status", "quality", "cost", "created"];

fn local_time(t: DateTime<Utc>) -> String {
    t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// ページング付き一覧を描画する。
fn draw_list<T>(
    f: &mut Frame,
    area: Rect,
    view: &ListView<T>,
    filters: String,
    title: &str,
    table: impl FnOnce(Vec<&T>) -> (Vec<Row<'static>>, Vec<Constraint>, Vec<&'static str>),
) {
    let list_layout = layout::create_list_layout(area);
    f.render_widget(
        Paragraph::new(filters).style(Style::default().fg(Color::Cyan)),
        list_layout.filters,
    );

    let (rows, widths, header) = table(view.page.items.iter().collect());
    let title = if view.loading {
        format!("{title} (loading...)")
    } else {
        format!("{title} ({} total)", view.page.total)
    };
    let mut state = TableState::default();
    if !view.page.items.is_empty() {
        state.select(Some(view.selected));
    }
    f.render_stateful_widget(
        styled_table(rows, widths, header, title),
        list_layout.table,
        &mut state,
    );

    let pager = format!(
        "Page {}/{}  {}",
        view.current,
        view.total_pages(),
        format_strip(view.current, view.total_pages())
    );
    f.render_widget(
        Paragraph::new(pager).alignment(Alignment::Center),
        list_layout.pager,
    );
}

/// ダッシュボードを描画する。
fn draw_dashboard(f: &mut Frame, app: &App, area: Rect) {
    let body_layout = layout::create_body_layout(area);
    let rows = app.dashboard.jobs.iter().map(job_row).collect();
    let mut state = TableState::default();
    if !app.dashboard.jobs.is_empty() {
        state.select(Some(app.dashboard.selected));
    }
    f.render_stateful_widget(
        styled_table(rows, job_widths(), JOB_HEADER.to_vec(), "RECENT JOBS".into()),
        body_layout.table,
        &mut state,
    );

    let balance = app
        .dashboard
        .balance
        .map(|b| b.to_string())
        .unwrap_or_else(|| "-".into());
    let info_text = format!(
        "Signed in: {}\nCredits: {}\n\nTotal jobs: {}\nCompleted: {}\nIn progress: {}\n\nLog:\n{}",
        if app.signed_in { "yes" } else { "no" },
        balance,
        app.dashboard.total,
        app.dashboard.completed(),
        app.dashboard.in_progress(),
        recent_log(app),
    );
    let info_panel = Paragraph::new(info_text)
        .block(Block::default().borders(Borders::ALL).title("INFO"))
        .wrap(Wrap { trim: true });
    f.render_widget(info_panel, body_layout.info_panel);
}

fn recent_log(app: &App) -> String {
    let skip = app.ui.log.len().saturating_sub(8);
    app.ui.log[skip..].join("\n")
}

/// アップロードフォームを描画する。
fn draw_upload(f: &mut Frame, app: &App, area: Rect) {
    let path = if app.upload.path.is_empty() {
        "(none)"
    } else {
        app.upload.path.as_str()
    };
    let mode = match app.upload.quality.as_str() {
        "lama" => "lama (fast)",
        "e2fgvi_hq" => "e2fgvi_hq (high quality)",
        other => other,
    };
    let state = if app.upload.busy {
        "Uploading... the job screen opens when the upload finishes."
    } else {
        "Press Enter to upload and start processing."
    };
    let text = format!(
        "File: {path}\nQuality: {mode}\nCredits: {}\n\n{state}",
        app.dashboard
            .balance
            .map(|b| b.to_string())
            .unwrap_or_else(|| "-".into())
    );
    let form = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("UPLOAD"))
        .wrap(Wrap { trim: false });
    f.render_widget(form, area);
}

/// ジョブ詳細を描画する。
fn draw_job(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(format!(
        "JOB {}",
        app.job.job_id.as_deref().unwrap_or("-")
    ));

    // 404は再取得しても変わらないため、トーストではなくパネルで残す。
    if app.job.not_found {
        let panel = Paragraph::new(
            "Job not found\n\nThe job no longer exists or belongs to another account.",
        )
        .block(block)
        .style(Style::default().fg(Color::Red))
        .wrap(Wrap { trim: true });
        f.render_widget(panel, area);
        return;
    }

    if app.job.is_loading() {
        f.render_widget(Paragraph::new("Loading job...").block(block), area);
        return;
    }
    let Some(job) = &app.job.job else {
        f.render_widget(block, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // 詳細
            Constraint::Length(3), // 進捗
            Constraint::Min(1),    // アクティビティ・ダウンロード
        ])
        .split(area);

    let details = format!(
        "Status: {}\nQuality: {}\nCreated: {}\nCost: {}",
        job.status.label(),
        job.quality.as_ref().map(|q| q.as_str()).unwrap_or("-"),
        local_time(job.created_at),
        job.cost.map(|c| c.to_string()).unwrap_or_else(|| "-".into()),
    );
    f.render_widget(Paragraph::new(details).block(block), chunks[0]);

    let now = Utc::now();
    let percent = progress::estimate(job.status, job.created_at, now);
    let color = match job.status {
        JobStatus::Failed => Color::Red,
        JobStatus::Completed => Color::Green,
        _ => Color::Rgb(255, 140, 0),
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("PROGRESS"))
        .gauge_style(Style::default().fg(color))
        .percent(u16::from(percent))
        .label(format!("{percent}%"));
    f.render_widget(gauge, chunks[1]);

    let mut lines = Vec::new();
    if let Some(activity) = progress::activity_line(job.status, job.created_at, now) {
        lines.push(Line::from(activity).italic());
    }
    match (job.status, job.download_url()) {
        (_, Some(url)) => {
            lines.push(Line::from("Download ready (press d):").green().bold());
            lines.push(Line::from(url.to_string()));
        }
        (JobStatus::Failed, _) => {
            lines.push(Line::from("Processing failed. Credits are not refunded automatically.").red());
        }
        (JobStatus::Completed, None) => {
            lines.push(Line::from("Completed, but no output was returned."));
        }
        _ => {}
    }
    f.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }),
        chunks[2].inner(Margin::new(1, 0)),
    );
}

/// 履歴一覧を描画する。
fn draw_history(f: &mut Frame, app: &App, area: Rect) {
    let filters = format!("Filter: {}", app.history_filter.label());
    draw_list(f, area, &app.history, filters, "HISTORY", |items| {
        (
            items.into_iter().map(job_row).collect(),
            job_widths(),
            JOB_HEADER.to_vec(),
        )
    });
}

/// 料金プランを描画する。
fn draw_pricing(f: &mut Frame, app: &App, area: Rect) {
    let body_layout = layout::create_body_layout(area);
    let rows = CreditPack::ALL
        .iter()
        .map(|p| {
            Row::new(vec![
                p.key().to_string(),
                p.credits().to_string(),
                format!("${}.{:02}", p.price_cents() / 100, p.price_cents() % 100),
            ])
        })
        .collect();
    let mut state = TableState::default();
    state.select(Some(app.pricing.selected));
    f.render_stateful_widget(
        styled_table(
            rows,
            vec![
                Constraint::Length(12),
                Constraint::Length(10),
                Constraint::Min(8),
            ],
            vec!["pack", "credits", "price"],
            "CREDIT PACKS".into(),
        ),
        body_layout.table,
        &mut state,
    );

    let info = format!(
        "Credits: {}\n\n{}",
        app.dashboard
            .balance
            .map(|b| b.to_string())
            .unwrap_or_else(|| "-".into()),
        if app.pricing.busy {
            "Creating checkout..."
        } else {
            "Checkout opens in your browser."
        }
    );
    f.render_widget(
        Paragraph::new(info)
            .block(Block::default().borders(Borders::ALL).title("INFO"))
            .wrap(Wrap { trim: true }),
        body_layout.info_panel,
    );
}

/// 管理画面を描画する。
fn draw_admin(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let selected = AdminTab::ALL.iter().position(|t| *t == app.admin.tab);
    let tabs = Tabs::new(AdminTab::ALL.iter().map(|t| t.title()).collect::<Vec<_>>())
        .select(selected.unwrap_or(0))
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, chunks[0]);

    let area = chunks[1];
    match app.admin.tab {
        AdminTab::Stats => {
            let text = match &app.admin.stats {
                Some(s) => format!(
                    "Users: {}\nJobs: {}\nCompleted jobs: {}\nPending codes: {}\nRedeemed codes: {}",
                    s.total_users, s.total_jobs, s.completed_jobs, s.pending_codes, s.redeemed_codes
                ),
                None => "Loading stats...".into(),
            };
            f.render_widget(
                Paragraph::new(text).block(Block::default().borders(Borders::ALL).title("STATS")),
                area,
            );
        }
        AdminTab::Codes => {
            let cf = &app.admin.code_filter;
            let filters = format!(
                "Status: {} | Credits: {} | Search: {}",
                cf.state.label(),
                cf.credits.map(|c| c.to_string()).unwrap_or_else(|| "any".into()),
                if cf.search.is_empty() { "-" } else { &cf.search },
            );
            draw_list(f, area, &app.admin.codes, filters, "CODES", |items| {
                let rows = items
                    .into_iter()
                    .map(|c| {
                        Row::new(vec![
                            c.code.clone(),
                            c.credits.to_string(),
                            if c.is_redeemed() { "redeemed" } else { "pending" }.to_string(),
                            c.redeemed_by.clone().unwrap_or_else(|| "-".into()),
                            local_time(c.created_at),
                        ])
                    })
                    .collect();
                (
                    rows,
                    vec![
                        Constraint::Length(16),
                        Constraint::Length(8),
                        Constraint::Length(10),
                        Constraint::Min(12),
                        Constraint::Length(16),
                    ],
                    vec!["code", "credits", "status", "redeemed by", "created"],
                )
            });
        }
        AdminTab::Users => {
            let uf = &app.admin.user_filter;
            let filters = format!(
                "Role: {} | Search: {}",
                uf.role.label(),
                if uf.search.is_empty() { "-" } else { &uf.search },
            );
            draw_list(f, area, &app.admin.users, filters, "USERS", |items| {
                let rows = items
                    .into_iter()
                    .map(|u| {
                        Row::new(vec![
                            u.email.clone(),
                            u.credits.to_string(),
                            if u.is_admin != 0 { "admin" } else { "user" }.to_string(),
                            format!("{}/{}", u.completed_jobs, u.total_jobs),
                            local_time(u.created_at),
                        ])
                    })
                    .collect();
                (
                    rows,
                    vec![
                        Constraint::Min(20),
                        Constraint::Length(8),
                        Constraint::Length(6),
                        Constraint::Length(10),
                        Constraint::Length(16),
                    ],
                    vec!["email", "credits", "role", "jobs", "joined"],
                )
            });
        }
        AdminTab::Jobs => {
            let filters = format!("Status: {}", app.admin.job_filter.label());
            draw_list(f, area, &app.admin.jobs, filters, "ALL JOBS", |items| {
                let rows = items
                    .into_iter()
                    .map(|j| {
                        Row::new(vec![
                            j.user_id.clone().unwrap_or_else(|| "-".into()),
                            j.short_id().to_string(),
                            j.status.label().to_string(),
                            local_time(j.created_at),
                        ])
                    })
                    .collect();
                (
                    rows,
                    vec![
                        Constraint::Min(12),
                        Constraint::Length(10),
                        Constraint::Length(12),
                        Constraint::Length(16),
                    ],
                    vec!["user", "id", "status", "created"],
                )
            });
        }
    }
}

/// コード生成モーダルを描画する。
fn draw_generate_modal(f: &mut Frame, app: &App) {
    let Some(form) = &app.admin.generate else {
        return;
    };
    let codes = form.result.as_deref().unwrap_or(&[]);
    let height = (10 + codes.len() as u16).min(f.area().height);
    let area = centered_popup(f.area(), 60, height);
    f.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(format!("Credits per code: {}", form.credits)),
        Line::from(format!("Number of codes: {}", form.count)),
        Line::from(format!("Prefix: {}", form.prefix)),
        Line::from(""),
    ];
    if form.busy {
        lines.push(Line::from("Generating...").italic());
    } else if codes.is_empty() {
        lines.push(Line::from("Press Enter to generate."));
    } else {
        lines.push(Line::from(format!("Generated {} codes:", codes.len())).green());
        lines.extend(codes.iter().map(|c| Line::from(c.code.clone()).bold()));
        lines.push(Line::from(""));
        let sc = &app.shortcuts.generate;
        lines.push(
            Line::from(format!(
                "[{}] copy all  [{}] download CSV",
                format_keys(&sc.copy_all),
                format_keys(&sc.download_csv)
            ))
            .cyan(),
        );
    }

    let modal = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Generate codes")
            .style(Style::default().bg(Color::DarkGray)),
    );
    f.render_widget(modal, area);
}

/// 設定画面を描画する。
fn draw_settings(f: &mut Frame, app: &App, area: Rect) {
    let s = &app.settings;
    let sc = &app.shortcuts.settings;
    let text = format!(
        "[{}] API URL: {}\n[{}] Sign-in page: {}\n[{}] Poll interval: {} ms\n[{}] Stop polling when finished: {}\n\nSession: {}  ([{}] sign in, [{}] sign out)\nConfig file: {}",
        format_keys(&sc.api_url),
        s.api_url,
        format_keys(&sc.sign_in_url),
        s.sign_in_url,
        format_keys(&sc.poll_interval),
        s.poll_interval_ms,
        format_keys(&sc.stop_when_finished),
        if s.stop_when_finished { "yes" } else { "no" },
        if app.signed_in { "signed in" } else { "signed out" },
        format_keys(&sc.sign_in),
        format_keys(&sc.sign_out),
        app.cfg_path.display(),
    );
    f.render_widget(
        Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title("SETTINGS"))
            .wrap(Wrap { trim: false }),
        area,
    );
}

/// トーストを右上に重ねる。
fn draw_toast(f: &mut Frame, app: &App) {
    let Some(toast) = &app.ui.toast else {
        return;
    };
    let full = f.area();
    let width = (toast.message.chars().count() as u16 + 4).max(20).min(full.width);
    let area = Rect {
        x: full.x + full.width.saturating_sub(width),
        y: full.y + 1,
        width,
        height: 3.min(full.height),
    };
    let color = match toast.kind {
        ToastKind::Success => Color::Green,
        ToastKind::Error => Color::Red,
    };
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(toast.message.clone())
            .block(Block::default().borders(Borders::ALL))
            .style(Style::default().fg(color)),
        area,
    );
}

/// ステータスバーを構築する。
fn build_status_bar(app: &App) -> Paragraph<'static> {
    let credits = app
        .dashboard
        .balance
        .map(|b| b.to_string())
        .unwrap_or_else(|| "-".into());

    // エラーの有無でステータス文字列を切り替える。
    let status_text = if let Some(err) = &app.ui.error {
        format!("[{}] Credits: {} | ERROR: {}", app.ui.screen.name(), credits, err)
    } else {
        format!("[{}] Credits: {} | {}", app.ui.screen.name(), credits, app.ui.status)
    };

    let mut status_bar = Paragraph::new(status_text)
        .block(Block::default().borders(Borders::ALL).title("STATUS"))
        .wrap(Wrap { trim: true });

    // エラー時は赤色で強調表示する。
    if app.ui.error.is_some() {
        status_bar = status_bar.style(Style::default().fg(Color::Red));
    }

    status_bar
}

/// ウィザード画面を描画する。
fn draw_wizard_screen(f: &mut Frame, app: &App) {
    let outer_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(20), // 上部マージン
            Constraint::Min(10),        // 本文領域
            Constraint::Percentage(20), // 下部マージン
        ])
        .split(f.area());

    let content_text = format!(
        "=== Initial Setup Wizard ===\n\nStep {}/{}\n\n{}\n\nPress {} to proceed, {} to skip step.",
        app.wizard_state.get_step_number(),
        app.wizard_state.total_steps,
        app.wizard_state.get_prompt(),
        format_keys(&app.shortcuts.wizard.proceed),
        format_keys(&app.shortcuts.wizard.skip),
    );

    let content = Paragraph::new(content_text)
        .block(Block::default().borders(Borders::ALL).title("Setup"))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true });
    f.render_widget(content, outer_layout[1]);

    // エラーがあれば下部に表示する。
    if let Some(err) = &app.ui.error {
        let error_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(3)])
            .split(f.area());

        let error_text = Paragraph::new(format!("ERROR: {}", err))
            .block(Block::default().borders(Borders::ALL).title("Error"))
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true });
        f.render_widget(error_text, error_layout[1]);
    }
}

/// 現在画面に応じたヘルプ文字列を返す。
fn get_help_text(app: &App, shortcuts: &Shortcuts) -> String {
    let g = &shortcuts.global;
    let l = &shortcuts.list;
    let nav = format!(
        "{}: quit | {}-{}: screens",
        format_keys(&g.quit),
        format_keys(&g.dashboard),
        format_keys(&g.settings)
    );

    if app.admin.generate.is_some() && app.ui.screen == Screen::Admin {
        let s = &shortcuts.generate;
        return format!(
            "{}: generate | {}: credits | {}: count | {}: prefix | {}: copy all | {}: download CSV | {}: close",
            format_keys(&s.submit),
            format_keys(&s.credits),
            format_keys(&s.count),
            format_keys(&s.prefix),
            format_keys(&s.copy_all),
            format_keys(&s.download_csv),
            format_keys(&s.close)
        );
    }

    let screen_help = match app.ui.screen {
        Screen::Dashboard => format!(
            "{}/{}: navigate | {}: open | {}: refresh",
            format_keys(&l.up),
            format_keys(&l.down),
            format_keys(&l.open),
            format_keys(&l.refresh)
        ),
        Screen::Upload => format!(
            "{}: choose file | {}: quality | {}: upload",
            format_keys(&shortcuts.upload.choose_file),
            format_keys(&shortcuts.upload.toggle_quality),
            format_keys(&shortcuts.upload.submit)
        ),
        Screen::Job => format!(
            "{}: download | {}: back",
            format_keys(&shortcuts.job.download),
            format_keys(&shortcuts.job.back)
        ),
        Screen::History => format!(
            "{}: filter | {}/{}: page | {}: open | {}: refresh",
            format_keys(&shortcuts.history.filter),
            format_keys(&l.prev_page),
            format_keys(&l.next_page),
            format_keys(&l.open),
            format_keys(&l.refresh)
        ),
        Screen::Pricing => format!(
            "{}/{}: select | {}: buy | {}: redeem code",
            format_keys(&l.up),
            format_keys(&l.down),
            format_keys(&shortcuts.pricing.buy),
            format_keys(&shortcuts.pricing.redeem)
        ),
        Screen::Admin => {
            let a = &shortcuts.admin;
            let tab = format!("{}: next tab | {}: refresh", format_keys(&a.next_tab), format_keys(&l.refresh));
            match app.admin.tab {
                AdminTab::Stats => tab,
                AdminTab::Codes => format!(
                    "{tab} | {}: status | {}: credits | {}: search | {}: generate | {}: export unredeemed",
                    format_keys(&a.filter),
                    format_keys(&a.credits_filter),
                    format_keys(&a.search),
                    format_keys(&a.generate),
                    format_keys(&a.export)
                ),
                AdminTab::Users => format!(
                    "{tab} | {}: role | {}: search | {}: adjust credits",
                    format_keys(&a.filter),
                    format_keys(&a.search),
                    format_keys(&a.adjust_credits)
                ),
                AdminTab::Jobs => format!("{tab} | {}: status", format_keys(&a.filter)),
            }
        }
        Screen::Settings => format!(
            "{}: save | {}: cancel",
            format_keys(&shortcuts.settings.save),
            format_keys(&shortcuts.settings.cancel)
        ),
        Screen::Setup => String::new(),
    };
    format!("{nav} | {screen_help}")
}
