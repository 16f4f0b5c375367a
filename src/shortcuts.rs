//! ショートカット設定の管理。

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// ショートカット設定の全体。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Shortcuts {
    pub global: GlobalShortcuts,
    pub list: ListShortcuts,
    pub upload: UploadShortcuts,
    pub job: JobShortcuts,
    pub history: HistoryShortcuts,
    pub pricing: PricingShortcuts,
    pub admin: AdminShortcuts,
    pub generate: GenerateShortcuts,
    pub settings: SettingsShortcuts,
    pub wizard: WizardShortcuts,
    pub input_box: InputBoxShortcuts,
}

/// どの画面からでも使える画面切り替え。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalShortcuts {
    pub quit: Vec<String>,
    pub dashboard: Vec<String>,
    pub upload: Vec<String>,
    pub history: Vec<String>,
    pub pricing: Vec<String>,
    pub admin: Vec<String>,
    pub settings: Vec<String>,
}

/// 一覧系画面で共通の操作。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListShortcuts {
    pub down: Vec<String>,
    pub up: Vec<String>,
    pub next_page: Vec<String>,
    pub prev_page: Vec<String>,
    pub refresh: Vec<String>,
    pub open: Vec<String>,
}

/// アップロード画面のショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadShortcuts {
    pub choose_file: Vec<String>,
    pub toggle_quality: Vec<String>,
    pub submit: Vec<String>,
}

/// ジョブ画面のショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobShortcuts {
    pub back: Vec<String>,
    pub download: Vec<String>,
}

/// 履歴画面のショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryShortcuts {
    pub filter: Vec<String>,
}

/// 料金画面のショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingShortcuts {
    pub buy: Vec<String>,
    pub redeem: Vec<String>,
}

/// 管理画面のショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminShortcuts {
    pub next_tab: Vec<String>,
    pub filter: Vec<String>,
    pub credits_filter: Vec<String>,
    pub search: Vec<String>,
    pub generate: Vec<String>,
    pub export: Vec<String>,
    pub adjust_credits: Vec<String>,
}

/// コード生成モーダルのショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateShortcuts {
    pub close: Vec<String>,
    pub submit: Vec<String>,
    pub credits: Vec<String>,
    pub count: Vec<String>,
    pub prefix: Vec<String>,
    pub copy_all: Vec<String>,
    pub download_csv: Vec<String>,
}

/// 設定画面のショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsShortcuts {
    pub cancel: Vec<String>,
    pub save: Vec<String>,
    pub api_url: Vec<String>,
    pub sign_in_url: Vec<String>,
    pub poll_interval: Vec<String>,
    pub stop_when_finished: Vec<String>,
    pub sign_in: Vec<String>,
    pub sign_out: Vec<String>,
}

/// ウィザード画面のショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WizardShortcuts {
    pub proceed: Vec<String>,
    pub skip: Vec<String>,
}

/// InputBoxのショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputBoxShortcuts {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub backspace: Vec<String>,
    pub delete: Vec<String>,
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub home: Vec<String>,
    pub end: Vec<String>,
    pub clear_line: Vec<String>,
}

impl Shortcuts {
    /// TOMLから読み込み、無ければデフォルトを返す。
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }
}

fn keys(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for Shortcuts {
    fn default() -> Self {
        Self {
            global: GlobalShortcuts {
                quit: keys(&["q"]),
                dashboard: keys(&["1"]),
                upload: keys(&["2"]),
                history: keys(&["3"]),
                pricing: keys(&["4"]),
                admin: keys(&["5"]),
                settings: keys(&["6", "t"]),
            },
            list: ListShortcuts {
                down: keys(&["Down", "j"]),
                up: keys(&["Up", "k"]),
                next_page: keys(&["PageDown", "n"]),
                prev_page: keys(&["PageUp", "p"]),
                refresh: keys(&["r"]),
                open: keys(&["Enter"]),
            },
            upload: UploadShortcuts {
                choose_file: keys(&["f"]),
                toggle_quality: keys(&["m"]),
                submit: keys(&["Enter"]),
            },
            job: JobShortcuts {
                back: keys(&["Esc"]),
                download: keys(&["d"]),
            },
            history: HistoryShortcuts {
                filter: keys(&["f"]),
            },
            pricing: PricingShortcuts {
                buy: keys(&["Enter"]),
                redeem: keys(&["c"]),
            },
            admin: AdminShortcuts {
                next_tab: keys(&["Tab"]),
                filter: keys(&["f"]),
                credits_filter: keys(&["c"]),
                search: keys(&["/"]),
                generate: keys(&["g"]),
                export: keys(&["e"]),
                adjust_credits: keys(&["a"]),
            },
            generate: GenerateShortcuts {
                close: keys(&["Esc"]),
                submit: keys(&["Enter"]),
                credits: keys(&["c"]),
                count: keys(&["n"]),
                prefix: keys(&["x"]),
                copy_all: keys(&["y"]),
                download_csv: keys(&["w"]),
            },
            settings: SettingsShortcuts {
                cancel: keys(&["Esc"]),
                save: keys(&["Enter"]),
                api_url: keys(&["u"]),
                sign_in_url: keys(&["i"]),
                poll_interval: keys(&["v"]),
                stop_when_finished: keys(&["w"]),
                sign_in: keys(&["l"]),
                sign_out: keys(&["o"]),
            },
            wizard: WizardShortcuts {
                proceed: keys(&["Enter"]),
                skip: keys(&["Esc"]),
            },
            input_box: InputBoxShortcuts {
                confirm: keys(&["Enter"]),
                cancel: keys(&["Esc"]),
                backspace: keys(&["Backspace"]),
                delete: keys(&["Delete"]),
                left: keys(&["Left"]),
                right: keys(&["Right"]),
                home: keys(&["Home"]),
                end: keys(&["End"]),
                clear_line: keys(&["Ctrl+u"]),
            },
        }
    }
}

/// KeyEventがいずれかのショートカット文字列と一致するか判定する。
pub fn matches_shortcut(key: &KeyEvent, shortcuts: &[String]) -> bool {
    shortcuts.iter().any(|s| matches_single_shortcut(key, s))
}

/// KeyEventが単一のショートカット文字列と一致するか判定する。
fn matches_single_shortcut(key: &KeyEvent, shortcut: &str) -> bool {
    // "Ctrl+u" のような修飾キー付きの形式を分解する。"+" 単体はキーとして扱う。
    let (modifiers_str, key_str): (Vec<&str>, &str) = match shortcut.rsplit_once('+') {
        Some((mods, k)) if !mods.is_empty() && !k.is_empty() => (mods.split('+').collect(), k),
        _ => (Vec::new(), shortcut),
    };

    let mut expected_modifiers = KeyModifiers::empty();
    for modifier in modifiers_str {
        match modifier.to_ascii_lowercase().as_str() {
            "ctrl" => expected_modifiers |= KeyModifiers::CONTROL,
            "alt" => expected_modifiers |= KeyModifiers::ALT,
            "shift" => expected_modifiers |= KeyModifiers::SHIFT,
            _ => return false,
        }
    }

    // 記号や大文字はSHIFT付きで届く端末があるため、文字キーではSHIFTを無視する。
    let actual_modifiers = match key.code {
        KeyCode::Char(_) if !expected_modifiers.contains(KeyModifiers::SHIFT) => {
            key.modifiers.difference(KeyModifiers::SHIFT)
        }
        _ => key.modifiers,
    };
    if actual_modifiers != expected_modifiers {
        return false;
    }

    match key_str.to_ascii_lowercase().as_str() {
        "enter" => key.code == KeyCode::Enter,
        "esc" => key.code == KeyCode::Esc,
        "tab" => key.code == KeyCode::Tab,
        "backspace" => key.code == KeyCode::Backspace,
        "delete" => key.code == KeyCode::Delete,
        "up" => key.code == KeyCode::Up,
        "down" => key.code == KeyCode::Down,
        "left" => key.code == KeyCode::Left,
        "right" => key.code == KeyCode::Right,
        "home" => key.code == KeyCode::Home,
        "end" => key.code == KeyCode::End,
        "pageup" => key.code == KeyCode::PageUp,
        "pagedown" => key.code == KeyCode::PageDown,
        f if f.len() > 1 && f.starts_with('f') => f[1..]
            .parse::<u8>()
            .is_ok_and(|n| key.code == KeyCode::F(n)),
        // 単一文字は大文字小文字を区別して Char として比較する。
        _ => {
            let mut chars = key_str.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => key.code == KeyCode::Char(c),
                _ => false,
            }
        }
    }
}

/// ショートカットキーの配列を表示用文字列に変換する。
pub fn format_keys(keys: &[String]) -> String {
    keys.join("/")
}
