//! TUI内での文字列入力コンポーネント（InputBox）。

use ratatui::{
    layout::Alignment,
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph},
};

/// InputBox入力状態
#[derive(Clone, Debug)]
pub struct InputBoxState {
    /// プロンプトメッセージ
    pub prompt: String,
    /// 現在の入力値
    pub value: String,
    /// カーソル位置（文字単位）
    pub cursor: usize,
    /// トークンなど、値を伏せて表示するか
    pub masked: bool,
    /// 入力完了時のコールバック識別子
    pub callback_id: InputCallbackId,
}

/// 入力完了時のコールバック識別子
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputCallbackId {
    // Settings画面用
    SettingsApiUrl,
    SettingsSignInUrl,
    SettingsPollInterval,
    SettingsToken,

    // Wizard画面用
    WizardApiUrl,
    WizardToken,

    // Upload画面用
    UploadPath,

    // Pricing画面用
    RedeemCode,

    // Admin画面用
    CodeSearch,
    UserSearch,
    GenerateCount,
    GeneratePrefix,
    AdjustCredits { user_id: String, current: i64 },
}

impl InputBoxState {
    /// 初期値の末尾にカーソルを置いて作成
    pub fn new(prompt: impl Into<String>, value: impl Into<String>, callback_id: InputCallbackId) -> Self {
        let value = value.into();
        Self {
            prompt: prompt.into(),
            cursor: value.chars().count(),
            value,
            masked: false,
            callback_id,
        }
    }

    /// 値を伏せ字で表示する
    pub fn masked(mut self) -> Self {
        self.masked = true;
        self
    }

    /// カーソル位置の文字インデックスをバイト位置へ変換
    fn byte_at(&self, char_idx: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    fn char_count(&self) -> usize {
        self.value.chars().count()
    }

    /// 文字を挿入
    pub fn insert_char(&mut self, c: char) {
        let at = self.byte_at(self.cursor);
        self.value.insert(at, c);
        self.cursor += 1;
    }

    /// 貼り付けられた文字列を挿入（改行は捨てる）
    pub fn insert_str(&mut self, s: &str) {
        for c in s.chars().filter(|c| !c.is_control()) {
            self.insert_char(c);
        }
    }

    /// Backspace（カーソル前の文字を削除）
    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_at(self.cursor);
        self.value.remove(at);
    }

    /// Delete（カーソル位置の文字を削除）
    pub fn delete(&mut self) {
        if self.cursor < self.char_count() {
            let at = self.byte_at(self.cursor);
            self.value.remove(at);
        }
    }

    /// カーソルを左に移動
    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// カーソルを右に移動
    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.char_count());
    }

    /// カーソルを先頭に移動
    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    /// カーソルを末尾に移動
    pub fn move_end(&mut self) {
        self.cursor = self.char_count();
    }

    /// 行全体をクリア
    pub fn clear_line(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    /// 表示用の文字列（伏せ字対応）
    fn display_chars(&self) -> Vec<char> {
        if self.masked {
            vec!['*'; self.char_count()]
        } else {
            self.value.chars().collect()
        }
    }
}

/// InputBoxをポップアップとして描画
pub fn render_input_box(f: &mut Frame, state: &InputBoxState) {
    let popup_area = centered_popup(f.area(), 70, 7);
    f.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Input")
        .style(Style::default().bg(Color::DarkGray));
    f.render_widget(block, popup_area);

    let inner_layout = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1), // プロンプト
            Constraint::Length(1), // 入力フィールド
            Constraint::Length(1), // 空行
            Constraint::Length(1), // ヘルプ
        ])
        .split(popup_area);

    let prompt_widget = Paragraph::new(state.prompt.clone()).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );
    f.render_widget(prompt_widget, inner_layout[0]);

    // カーソルが表示幅を超えたら横にスクロールする。
    let display_width = inner_layout[1].width as usize;
    let scroll_offset = state.cursor.saturating_sub(display_width.saturating_sub(2));

    let chars = state.display_chars();
    let visible: Vec<char> = chars.iter().skip(scroll_offset).take(display_width).copied().collect();
    let split = state.cursor.saturating_sub(scroll_offset).min(visible.len());
    let before: String = visible[..split].iter().collect();
    let after: String = visible[split..].iter().collect();

    let input_widget =
        Paragraph::new(format!("{before}|{after}")).style(Style::default().fg(Color::Green));
    f.render_widget(input_widget, inner_layout[1]);

    let help = Paragraph::new("Enter=confirm | Esc=cancel | Ctrl+U=clear")
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Center);
    f.render_widget(help, inner_layout[3]);
}

/// 中央配置のポップアップ領域を計算
pub fn centered_popup(area: Rect, width_percent: u16, height: u16) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((area.height.saturating_sub(height)) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - width_percent) / 2),
            Constraint::Percentage(width_percent),
            Constraint::Percentage((100 - width_percent) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(v: &str) -> InputBoxState {
        InputBoxState::new("p", v, InputCallbackId::RedeemCode)
    }

    #[test]
    fn test_edit_multibyte() {
        // マルチバイト文字でもカーソル位置がずれない。
        let mut s = state("あいう");
        assert_eq!(s.cursor, 3);
        s.move_left();
        s.insert_char('x');
        assert_eq!(s.value, "あいxう");
        s.backspace();
        s.backspace();
        assert_eq!(s.value, "あう");
        s.move_home();
        s.delete();
        assert_eq!(s.value, "う");
        s.move_end();
        assert_eq!(s.cursor, 1);
    }

    #[test]
    fn test_insert_str_drops_newlines() {
        let mut s = state("");
        s.insert_str("tok\r\nen");
        assert_eq!(s.value, "token");
        s.clear_line();
        assert!(s.value.is_empty());
        assert_eq!(s.cursor, 0);
    }

    #[test]
    fn test_masked_display() {
        let s = state("secret").masked();
        assert_eq!(s.display_chars().iter().collect::<String>(), "******");
    }
}
