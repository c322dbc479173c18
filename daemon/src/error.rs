use thiserror::Error;

/// Failure to obtain a fresh unread summary. Never fatal: the cycle is
/// skipped and the next tick tries again.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("session rejected by server (HTTP {0}); log in again")]
    Unauthorized(u16),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("malformed unread summary: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Failure reading or writing the persisted notification state.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("state file I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize state: {0}")]
    Serialize(serde_json::Error),

    #[error("state file {path} is not valid JSON: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure while establishing a session. Fatal at startup.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("login request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("login rejected: {0}")]
    Rejected(String),

    #[error("credential prompt failed: {0}")]
    Prompt(String),

    #[error("cookie file: {0}")]
    Cookies(#[from] std::io::Error),
}
