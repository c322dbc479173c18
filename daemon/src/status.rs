use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Passive unread indicator shown by the tray frontend.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Indicator {
    /// At least one chat has an unread reply.
    Unread,
    /// Nothing is waiting.
    Clear,
}

/// Runtime status written by the agent to `status.toml`.
/// A tray frontend reads this file (read-only) to pick its icon.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AgentStatus {
    /// Agent binary version (set from Cargo.toml at compile time).
    pub version: String,
    /// False once the agent has shut down cleanly.
    pub running: bool,
    pub indicator: Indicator,
    /// Unread chat count from the most recent successful fetch.
    pub unread_chats: usize,
    /// RFC 3339 timestamp of the most recent successful fetch, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<String>,
    /// Human-readable error from the most recent failed cycle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentStatus {
    /// Constructs the initial status on startup.
    pub fn new() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            running: true,
            indicator: Indicator::Clear,
            unread_chats: 0,
            last_checked: None,
            error: None,
        }
    }
}

impl Default for AgentStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializes `status` to TOML and writes it to `path`.
/// Creates the parent directory if it does not exist.
/// Logs errors rather than returning them; a status write failure should
/// never stop the poll loop.
pub fn write_status(path: &Path, status: &AgentStatus) {
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            warn!(dir = %parent.display(), error = %e, "Failed to create status directory");
            return;
        }
    }
    match toml::to_string_pretty(status) {
        Ok(content) => {
            if let Err(e) = std::fs::write(path, content) {
                warn!(error = %e, "Failed to write status file");
            }
        }
        Err(e) => warn!(error = %e, "Failed to serialize status"),
    }
}
