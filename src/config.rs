//! Config model and persistence helpers.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};

use crate::poller::PollOptions;

/// Environment variable overriding `api.base_url`.
pub const API_URL_ENV: &str = "VANISHLY_API_URL";

/// Top-level configuration stored in `config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend location and HTTP behaviour.
    pub api: ApiCfg,
    /// Job status polling.
    pub poll: PollCfg,
    /// Page sizes for paginated tables.
    pub lists: ListsCfg,
    /// Defaults for the admin code generator.
    pub codes: CodesCfg,
}

/// Backend endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiCfg {
    /// Base URL of the REST API, without a trailing slash.
    pub base_url: String,
    /// Hosted sign-in page that hands out bearer tokens.
    pub sign_in_url: String,
    /// Per-request timeout.
    pub request_timeout_secs: u64,
}

/// Poller settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollCfg {
    /// Delay between status fetches.
    pub interval_ms: u64,
    /// Stop polling once the job is completed or failed.
    pub stop_when_finished: bool,
}

/// Table page sizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListsCfg {
    pub history_page_size: u32,
    pub admin_page_size: u32,
}

/// Code generator defaults and export location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodesCfg {
    pub default_prefix: String,
    pub default_credits: i64,
    pub default_count: u32,
    /// Directory receiving CSV and text exports.
    pub export_dir: String,
}

impl Default for ApiCfg {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".into(),
            sign_in_url: "http://localhost:3000/en/login".into(),
            request_timeout_secs: 60,
        }
    }
}

impl Default for PollCfg {
    fn default() -> Self {
        Self {
            interval_ms: 3000,
            stop_when_finished: false,
        }
    }
}

impl Default for ListsCfg {
    fn default() -> Self {
        Self {
            history_page_size: 15,
            admin_page_size: 20,
        }
    }
}

impl Default for CodesCfg {
    fn default() -> Self {
        Self {
            default_prefix: "TB-".into(),
            default_credits: 10,
            default_count: 1,
            export_dir: ".".into(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiCfg::default(),
            poll: PollCfg::default(),
            lists: ListsCfg::default(),
            codes: CodesCfg::default(),
        }
    }
}

impl Config {
    /// Load from disk or create defaults when missing.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            let s = fs::read_to_string(path)?;
            Ok(toml::from_str(&s)?)
        } else {
            let cfg = Self::default();
            cfg.save(path)?;
            Ok(cfg)
        }
    }

    /// Persist the config as pretty TOML.
    pub fn save(&self, path: &Path) -> Result<()> {
        let s = toml::to_string_pretty(self)?;
        fs::write(path, s)?;
        Ok(())
    }

    /// Apply `VANISHLY_API_URL` when it is set and non-empty.
    pub fn with_env_override(mut self, value: Option<String>) -> Self {
        if let Some(url) = value.map(|v| v.trim().to_string())
            && !url.is_empty()
        {
            tracing::info!("api.base_url overridden by {API_URL_ENV}");
            self.api.base_url = url;
        }
        self
    }

    /// Whether the first-run wizard still has something to ask.
    pub fn needs_setup(&self) -> bool {
        self.api.base_url.trim().is_empty()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_secs.max(1))
    }

    pub fn poll_options(&self) -> PollOptions {
        PollOptions {
            // Sub-second intervals would hammer the backend.
            interval: Duration::from_millis(self.poll.interval_ms.max(500)),
            stop_when_finished: self.poll.stop_when_finished,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.poll.interval_ms, 3000);
        assert!(!cfg.poll.stop_when_finished);
        assert_eq!(cfg.lists.history_page_size, 15);
        assert_eq!(cfg.lists.admin_page_size, 20);
        assert_eq!(cfg.codes.default_prefix, "TB-");
        assert_eq!(cfg.poll_options().interval, Duration::from_millis(3000));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [api]
            base_url = "https://api.example.com"

            [poll]
            stop_when_finished = true
            "#,
        )
        .unwrap();
        assert_eq!(cfg.api.base_url, "https://api.example.com");
        assert_eq!(cfg.api.request_timeout_secs, 60);
        assert_eq!(cfg.poll.interval_ms, 3000);
        assert!(cfg.poll.stop_when_finished);
        assert_eq!(cfg.codes.default_credits, 10);
    }

    #[test]
    fn test_env_override() {
        let cfg = Config::default().with_env_override(Some(" https://prod.example ".into()));
        assert_eq!(cfg.api.base_url, "https://prod.example");
        let cfg = Config::default().with_env_override(Some("  ".into()));
        assert_eq!(cfg.api.base_url, ApiCfg::default().base_url);
        assert!(!cfg.needs_setup());
    }

    #[test]
    fn test_save_and_reload() {
        let path = std::env::temp_dir().join(format!("vanishly-cfg-{}.toml", uuid::Uuid::new_v4()));
        let mut cfg = Config::default();
        cfg.codes.export_dir = "/tmp/exports".into();
        cfg.save(&path).unwrap();
        let loaded = Config::load_or_default(&path).unwrap();
        assert_eq!(loaded, cfg);
        let _ = fs::remove_file(&path);
    }
}
