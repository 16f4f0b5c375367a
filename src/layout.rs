//! レイアウト計算のヘルパー関数

use ratatui::prelude::*;

/// メインレイアウトの領域
pub struct MainLayout {
    /// 画面タブの領域
    pub tabs: Rect,
    /// 画面本体の領域
    pub body: Rect,
    /// HELPバーの領域
    pub help_bar: Rect,
    /// STATUSバーの領域
    pub status_bar: Rect,
}

/// ボディ部の2つの領域（一覧 + INFO Panel）
pub struct BodyLayout {
    /// 一覧テーブルの領域
    pub table: Rect,
    /// INFO Panelの領域
    pub info_panel: Rect,
}

/// 一覧画面の縦分割（フィルタ行 + テーブル + ページ番号）
pub struct ListLayout {
    pub filters: Rect,
    pub table: Rect,
    pub pager: Rect,
}

/// メイン画面を分割（Tabs + Body + HELP + STATUS）
pub fn create_main_layout(area: Rect) -> MainLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // タブ
            Constraint::Min(1),    // Body
            Constraint::Length(3), // HELPバー
            Constraint::Length(3), // STATUSバー
        ])
        .split(area);

    MainLayout {
        tabs: chunks[0],
        body: chunks[1],
        help_bar: chunks[2],
        status_bar: chunks[3],
    }
}

/// Body領域を2つに分割（一覧 70% + INFO Panel 30%）
pub fn create_body_layout(area: Rect) -> BodyLayout {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(area);

    BodyLayout {
        table: chunks[0],
        info_panel: chunks[1],
    }
}

/// 一覧領域をフィルタ・テーブル・ページ番号に分割
pub fn create_list_layout(area: Rect) -> ListLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

    ListLayout {
        filters: chunks[0],
        table: chunks[1],
        pager: chunks[2],
    }
}
