/// Canonical file locations for cherp-notify data files.
///
/// Everything lives under one per-user directory (`<data dir>/cherp-notify/`):
///   - config.toml       Written by the user, read once at startup.
///   - notifstate.json   Last observed unread summary, rewritten every cycle.
///   - cookies.txt       Session cookies captured at login.
///   - status.toml       Written by the agent, read by a tray frontend.
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "cherp-notify";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const STATE_FILE_NAME: &str = "notifstate.json";
pub const COOKIE_FILE_NAME: &str = "cookies.txt";
pub const STATUS_FILE_NAME: &str = "status.toml";

/// Resolved set of data-file paths rooted at a single directory.
#[derive(Debug, Clone)]
pub struct AppPaths {
    root: PathBuf,
}

impl AppPaths {
    /// Uses `override_dir` when given, otherwise the platform data directory.
    pub fn resolve(override_dir: Option<&Path>) -> Result<Self> {
        let root = match override_dir {
            Some(dir) => dir.to_path_buf(),
            None => default_app_dir()?,
        };
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE_NAME)
    }

    pub fn state_file(&self) -> PathBuf {
        self.root.join(STATE_FILE_NAME)
    }

    pub fn cookie_file(&self) -> PathBuf {
        self.root.join(COOKIE_FILE_NAME)
    }

    pub fn status_file(&self) -> PathBuf {
        self.root.join(STATUS_FILE_NAME)
    }
}

/// `$XDG_DATA_HOME/cherp-notify`, `%APPDATA%\cherp-notify`, or the macOS
/// Application Support equivalent.
fn default_app_dir() -> Result<PathBuf> {
    let base = dirs::data_dir().context("No per-user data directory on this platform")?;
    Ok(base.join(APP_DIR_NAME))
}
