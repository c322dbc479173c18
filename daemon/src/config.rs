use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const MIN_INTERVAL_SECS: u64 = 5;
pub const MAX_INTERVAL_SECS: u64 = 3600;
pub const DEFAULT_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_BASE_URL: &str = "https://cherp.chat";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_TITLE: &str = "Cherp Notify";
pub const DEFAULT_SUBTITLE: &str = "Cherp Notifier";
pub const DEFAULT_BODY: &str = "You have new prompt replies";

/// Root configuration structure. Deserialized from `config.toml` in the data dir.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub global: GlobalConfig,
    #[serde(default)]
    pub notification: NotificationConfig,
}

/// Polling and transport settings.
#[derive(Debug, Deserialize)]
pub struct GlobalConfig {
    /// Seconds to wait after one cycle completes before starting the next.
    /// Clamped to [5, 3600].
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
    /// Scheme + host of the chat service, without a trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Upper bound on a single HTTP request.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS,
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl GlobalConfig {
    /// Returns the effective poll interval, honouring a CLI override.
    pub fn effective_interval(&self, cli_override: Option<u64>) -> Duration {
        let raw = cli_override.unwrap_or(self.interval_secs);
        Duration::from_secs(raw.clamp(MIN_INTERVAL_SECS, MAX_INTERVAL_SECS))
    }

    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

/// Text of the desktop alert raised on new activity.
#[derive(Debug, Deserialize)]
pub struct NotificationConfig {
    /// Shown as the sending application's name.
    #[serde(default = "default_title")]
    pub title: String,
    /// Headline of the notification.
    #[serde(default = "default_subtitle")]
    pub subtitle: String,
    /// Text under the headline.
    #[serde(default = "default_body")]
    pub body: String,
    /// When false, alerts are only logged.
    #[serde(default = "default_desktop")]
    pub desktop: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            subtitle: DEFAULT_SUBTITLE.to_string(),
            body: DEFAULT_BODY.to_string(),
            desktop: true,
        }
    }
}

/// Loads the config file at `path`, returning `Config::default()` if the file does not exist.
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_SECS
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

fn default_subtitle() -> String {
    DEFAULT_SUBTITLE.to_string()
}

fn default_body() -> String {
    DEFAULT_BODY.to_string()
}

fn default_desktop() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_global(interval_secs: u64) -> GlobalConfig {
        GlobalConfig {
            interval_secs,
            ..GlobalConfig::default()
        }
    }

    // ── defaults ──────────────────────────────────────────────────────────────

    #[test]
    fn global_config_default_values() {
        let g = GlobalConfig::default();
        assert_eq!(g.interval_secs, DEFAULT_INTERVAL_SECS);
        assert_eq!(g.base_url, DEFAULT_BASE_URL);
        assert_eq!(g.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    }

    #[test]
    fn notification_config_default_values() {
        let n = NotificationConfig::default();
        assert_eq!(n.title, DEFAULT_TITLE);
        assert_eq!(n.subtitle, DEFAULT_SUBTITLE);
        assert_eq!(n.body, DEFAULT_BODY);
        assert!(n.desktop);
    }

    // ── effective_interval ────────────────────────────────────────────────────

    #[test]
    fn effective_interval_uses_config_value() {
        assert_eq!(make_global(30).effective_interval(None), Duration::from_secs(30));
    }

    #[test]
    fn effective_interval_prefers_cli_override() {
        assert_eq!(make_global(30).effective_interval(Some(60)), Duration::from_secs(60));
    }

    #[test]
    fn effective_interval_clamps_below_min() {
        assert_eq!(
            make_global(1).effective_interval(None),
            Duration::from_secs(MIN_INTERVAL_SECS)
        );
        assert_eq!(
            make_global(30).effective_interval(Some(0)),
            Duration::from_secs(MIN_INTERVAL_SECS)
        );
    }

    #[test]
    fn effective_interval_clamps_above_max() {
        assert_eq!(
            make_global(999_999).effective_interval(None),
            Duration::from_secs(MAX_INTERVAL_SECS)
        );
    }

    #[test]
    fn base_url_strips_trailing_slash() {
        let g = GlobalConfig {
            base_url: "https://example.test/".to_string(),
            ..GlobalConfig::default()
        };
        assert_eq!(g.base_url(), "https://example.test");
    }

    // ── load_or_default ───────────────────────────────────────────────────────

    #[test]
    fn load_or_default_missing_file_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nonexistent.toml");
        let config = load_or_default(&path).unwrap();
        assert_eq!(config.global.interval_secs, DEFAULT_INTERVAL_SECS);
        assert_eq!(config.notification.title, DEFAULT_TITLE);
    }

    #[test]
    fn load_or_default_parses_valid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[global]
interval_secs = 45
base_url = "http://localhost:8080"
request_timeout_secs = 5

[notification]
title = "Replies"
subtitle = "cherp"
body = "Someone answered"
desktop = false
"#,
        )
        .unwrap();

        let config = load_or_default(&path).unwrap();
        assert_eq!(config.global.interval_secs, 45);
        assert_eq!(config.global.base_url, "http://localhost:8080");
        assert_eq!(config.global.request_timeout_secs, 5);
        assert_eq!(config.notification.title, "Replies");
        assert_eq!(config.notification.subtitle, "cherp");
        assert_eq!(config.notification.body, "Someone answered");
        assert!(!config.notification.desktop);
    }

    #[test]
    fn load_or_default_partial_toml_uses_field_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[global]\ninterval_secs = 60\n").unwrap();

        let config = load_or_default(&path).unwrap();
        assert_eq!(config.global.interval_secs, 60);
        assert_eq!(config.global.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.notification.body, DEFAULT_BODY);
    }

    #[test]
    fn load_or_default_invalid_toml_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is not valid toml ][[[").unwrap();
        assert!(load_or_default(&path).is_err());
    }
}
