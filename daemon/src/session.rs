/// Authenticated access to the chat service.
///
/// The poll loop only sees [`UnreadSource`]. [`SessionClient`] implements it
/// with a reqwest client whose cookie jar is seeded from `cookies.txt`; the
/// first run (or `login`) prompts for credentials, posts them once and keeps
/// only the resulting cookies. Credentials themselves are never written out.
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::SET_COOKIE;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{AuthError, FetchError};
use crate::state::NotificationState;

const UNREAD_PATH: &str = "/api/chat/list/unread";
const LOGIN_PATH: &str = "/api/user/login";
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Anything that can produce a fresh unread summary.
#[async_trait]
pub trait UnreadSource: Send + Sync {
    async fn fetch_unread_summary(&self) -> Result<NotificationState, FetchError>;
}

pub struct SessionClient {
    http: Client,
    jar: Arc<Jar>,
    base: Url,
    cookie_path: PathBuf,
}

impl SessionClient {
    /// Builds a client for `base_url` and loads any saved session cookies.
    pub fn new(base_url: &str, timeout: Duration, cookie_path: PathBuf) -> anyhow::Result<Self> {
        let base = Url::parse(base_url)?;
        let jar = Arc::new(Jar::default());
        let http = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .user_agent(concat!("cherp-notify/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let client = Self {
            http,
            jar,
            base,
            cookie_path,
        };
        let loaded = client.load_cookies()?;
        debug!(count = loaded, "Loaded saved session cookies");
        Ok(client)
    }

    /// True if the jar holds any cookie for the service.
    pub fn has_session(&self) -> bool {
        self.jar.cookies(&self.base).is_some()
    }

    /// Posts credentials and saves the session cookies the server hands back.
    pub async fn login(&self, user: &str, pass: &str) -> Result<(), AuthError> {
        let url = self.endpoint(LOGIN_PATH);
        let resp = self
            .http
            .post(url)
            .form(&[("username", user), ("password", pass)])
            .send()
            .await?;
        info!(status = %resp.status(), "Login response");

        let cookies: Vec<String> = resp
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect();
        let body = resp.bytes().await?;
        check_login_body(&body)?;

        self.save_cookies(&cookies)?;
        Ok(())
    }

    /// Deletes the saved cookies. Missing file is not an error.
    pub fn forget(&self) -> std::io::Result<()> {
        match std::fs::remove_file(&self.cookie_path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        url.set_path(path);
        url
    }

    fn load_cookies(&self) -> Result<usize, AuthError> {
        let content = match std::fs::read_to_string(&self.cookie_path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        let mut count = 0;
        for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
            self.jar.add_cookie_str(line, &self.base);
            count += 1;
        }
        Ok(count)
    }

    fn save_cookies(&self, cookies: &[String]) -> Result<(), AuthError> {
        if let Some(parent) = self.cookie_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut content = cookies.join("\n");
        content.push('\n');
        std::fs::write(&self.cookie_path, content)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.cookie_path, std::fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }
}

#[async_trait]
impl UnreadSource for SessionClient {
    async fn fetch_unread_summary(&self) -> Result<NotificationState, FetchError> {
        let resp = self.http.get(self.endpoint(UNREAD_PATH)).send().await?;
        check_status(resp.status())?;
        let body = resp.bytes().await?;
        decode_unread(&body)
    }
}

/// Parses an unread-list response body. Anything without a `chats` array,
/// such as an error document served with a 2xx status, is rejected.
pub fn decode_unread(body: &[u8]) -> Result<NotificationState, FetchError> {
    Ok(serde_json::from_slice(body)?)
}

/// Maps a non-success HTTP status onto the fetch error taxonomy.
fn check_status(status: StatusCode) -> Result<(), FetchError> {
    match status {
        s if s.is_success() => Ok(()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(FetchError::Unauthorized(status.as_u16()))
        }
        s => Err(FetchError::Status(s.as_u16())),
    }
}

#[derive(Deserialize)]
struct LoginResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
}

/// The login endpoint answers with `{"status": "success"}` on success.
fn check_login_body(body: &[u8]) -> Result<(), AuthError> {
    let parsed: LoginResponse = serde_json::from_slice(body)
        .map_err(|e| AuthError::Rejected(format!("unreadable response: {e}")))?;
    if parsed.status == "success" {
        Ok(())
    } else {
        Err(AuthError::Rejected(
            parsed.message.unwrap_or(parsed.status),
        ))
    }
}

/// Asks for a username on stdin and a password without echo.
pub fn prompt_credentials() -> Result<(String, String), AuthError> {
    println!("First Time Setup");
    println!("---------------------");
    print!("USER: ");
    std::io::stdout()
        .flush()
        .map_err(|e| AuthError::Prompt(e.to_string()))?;

    let mut user = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut user)
        .map_err(|e| AuthError::Prompt(e.to_string()))?;
    let user = user.trim().to_string();
    if user.is_empty() {
        return Err(AuthError::Prompt("username is empty".into()));
    }

    let pass = dialoguer::Password::new()
        .with_prompt("PASS")
        .interact()
        .map_err(|e| AuthError::Prompt(e.to_string()))?;
    Ok((user, pass))
}

/// Makes sure `client` has a session, prompting and logging in when it has
/// none or when `force` is set.
pub async fn ensure_session(client: &SessionClient, force: bool) -> Result<(), AuthError> {
    if client.has_session() && !force {
        return Ok(());
    }
    let (user, pass) = prompt_credentials()?;
    client.login(&user, &pass).await?;
    info!("Logged in; session cookies saved");
    Ok(())
}
